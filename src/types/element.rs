//! This module defines the canonical, type-safe representation of element
//! types flowing through ports, together with the `Element` trait that links
//! each variant to its concrete Rust type.
//!
//! The enum replaces fragile string-based type tags; the trait carries the
//! per-type codec primitives (text token, fixed-width raw bytes) so the
//! codecs themselves stay fully generic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DataportError;

//==================================================================================
// 1. The ElementType Enum
//==================================================================================

/// The canonical representation of a port's element type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Bool,
    Int,
    Float,
}

impl ElementType {
    /// Fixed wire width of one value in the raw format, in bytes.
    /// Native byte order, no padding.
    pub fn width(&self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Int => 4,
            Self::Float => 4,
        }
    }

    /// Parses the element-type identifier of the signature grammar.
    pub fn parse(token: &str) -> Result<Self, DataportError> {
        match token {
            "bool" => Ok(Self::Bool),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            other => Err(DataportError::TypeSyntax(format!(
                "unknown element type '{}'",
                other
            ))),
        }
    }

    /// Returns `true` if the element type is a floating-point number.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float)
    }
}

/// Provides the canonical string representation, as used in signatures and
/// the interface report.
impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
        };
        write!(f, "{}", name)
    }
}

//==================================================================================
// 2. The Element Trait
//==================================================================================

/// Links an `ElementType` variant to its concrete Rust type and carries the
/// per-type codec primitives. The text and raw codecs are generic over this
/// trait and never match on the enum themselves.
pub trait Element: Copy + PartialEq + fmt::Debug + 'static {
    const ELEMENT_TYPE: ElementType;
    /// Must equal `Self::ELEMENT_TYPE.width()`.
    const WIDTH: usize;

    /// Parses one text token. `None` means the token is malformed; the codec
    /// turns that into a `Codec` error naming the channel and token.
    fn decode_text(token: &str) -> Option<Self>;

    /// Appends the text rendering of one value (no separator).
    fn encode_text(&self, out: &mut String);

    /// Reconstructs one value from exactly `WIDTH` bytes in native order.
    fn decode_raw(bytes: &[u8]) -> Self;

    /// Appends exactly `WIDTH` bytes in native order.
    fn encode_raw(&self, out: &mut Vec<u8>);

    /// Appends the raw encoding of a whole slice. Overridden with a
    /// zero-copy `bytemuck` cast for the Pod-backed types.
    fn encode_raw_slice(values: &[Self], out: &mut Vec<u8>) {
        for value in values {
            value.encode_raw(out);
        }
    }

    /// Widens the value to `f64` for the conformance checker's tolerance
    /// comparison. Never used by the codecs themselves.
    fn to_comparable(self) -> f64;
}

// Implement the trait for the numeric element types. Both are Pod, so the
// raw side is a native-order byte cast.
macro_rules! impl_numeric_element {
    ($T:ty, $variant:expr) => {
        impl Element for $T {
            const ELEMENT_TYPE: ElementType = $variant;
            const WIDTH: usize = std::mem::size_of::<$T>();

            fn decode_text(token: &str) -> Option<Self> {
                token.parse::<$T>().ok()
            }

            fn encode_text(&self, out: &mut String) {
                use std::fmt::Write;
                let _ = write!(out, "{}", self);
            }

            fn decode_raw(bytes: &[u8]) -> Self {
                bytemuck::pod_read_unaligned(bytes)
            }

            fn encode_raw(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(bytemuck::bytes_of(self));
            }

            fn encode_raw_slice(values: &[Self], out: &mut Vec<u8>) {
                out.extend_from_slice(bytemuck::cast_slice(values));
            }

            fn to_comparable(self) -> f64 {
                num_traits::cast(self).unwrap_or(f64::NAN)
            }
        }
    };
}

impl_numeric_element!(i32, ElementType::Int);
impl_numeric_element!(f32, ElementType::Float);

// bool is not Pod; its wire form is a single byte, text form is `0`/`1`.
impl Element for bool {
    const ELEMENT_TYPE: ElementType = ElementType::Bool;
    const WIDTH: usize = 1;

    fn decode_text(token: &str) -> Option<Self> {
        match token {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        }
    }

    fn encode_text(&self, out: &mut String) {
        out.push(if *self { '1' } else { '0' });
    }

    fn decode_raw(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        out.push(*self as u8);
    }

    fn to_comparable(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
