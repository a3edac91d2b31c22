//! This module defines the shape of a port and the parser for the compact
//! signature grammar `[d0,d1,...]elemtype`.
//!
//! The shape is a tagged variant rather than a list-plus-flag pair, so the
//! single-unbounded-marker invariant is enforced at construction time and
//! cannot be violated downstream.

use serde::{Deserialize, Serialize};

use crate::error::DataportError;
use crate::types::ElementType;

/// The unbounded-dimension marker of the signature grammar.
pub const STREAM_MARKER: char = '~';

//==================================================================================
// 1. The Shape Variant
//==================================================================================

/// The shape of one port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    /// No dimensions: exactly one value.
    Scalar,

    /// One or more finite dimension sizes: a fixed element count.
    FixedArray(Vec<usize>),

    /// One unbounded dimension. `frame` holds the finite sizes describing
    /// the shape of each streamed element (empty for a stream of scalars).
    Stream { frame: Vec<usize> },
}

impl Shape {
    pub fn is_stream(&self) -> bool {
        matches!(self, Shape::Stream { .. })
    }

    /// The total declared element count, or `None` for a stream.
    pub fn element_count(&self) -> Option<u64> {
        match self {
            Shape::Scalar => Some(1),
            Shape::FixedArray(sizes) => Some(sizes.iter().map(|&s| s as u64).product()),
            Shape::Stream { .. } => None,
        }
    }

    /// The number of values in one transfer unit: the whole port for finite
    /// shapes, one streamed element for streams.
    pub fn frame_len(&self) -> usize {
        match self {
            Shape::Scalar => 1,
            Shape::FixedArray(sizes) => sizes.iter().product(),
            Shape::Stream { frame } => frame.iter().product(),
        }
    }

    /// The finite dimension sizes, as listed in the interface report.
    pub fn dimensions(&self) -> &[usize] {
        match self {
            Shape::Scalar => &[],
            Shape::FixedArray(sizes) => sizes,
            Shape::Stream { frame } => frame,
        }
    }
}

//==================================================================================
// 2. The Signature Parser
//==================================================================================

/// Parses a signature like `int`, `[4]int`, `[~]float` or `[2,~]bool` into
/// its element type and shape.
///
/// Whitespace inside the brackets is ignored. At most one unbounded marker
/// is accepted; a second one is a `TypeSyntax` error.
pub fn parse_signature(text: &str) -> Result<(ElementType, Shape), DataportError> {
    let text = text.trim();

    if !text.starts_with('[') {
        // No brackets: a scalar of the given element type.
        let element = ElementType::parse(text)?;
        return Ok((element, Shape::Scalar));
    }

    let close = text.find(']').ok_or_else(|| {
        DataportError::TypeSyntax(format!("missing ']' in '{}'", text))
    })?;

    let dims_str = &text[1..close];
    let elem_str = text[close + 1..].trim();
    let element = ElementType::parse(elem_str)?;

    let mut sizes = Vec::new();
    let mut is_stream = false;

    for item in dims_str.split(',') {
        let item: String = item.chars().filter(|c| !c.is_whitespace()).collect();
        if item.len() == 1 && item.starts_with(STREAM_MARKER) {
            if is_stream {
                return Err(DataportError::TypeSyntax(format!(
                    "more than one '{}' dimension in '{}'",
                    STREAM_MARKER, text
                )));
            }
            is_stream = true;
        } else {
            let size: usize = item.parse().map_err(|_| {
                DataportError::TypeSyntax(format!("invalid dimension '{}' in '{}'", item, text))
            })?;
            sizes.push(size);
        }
    }

    let shape = if is_stream {
        Shape::Stream { frame: sizes }
    } else {
        Shape::FixedArray(sizes)
    };

    Ok((element, shape))
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
