//! The wire formats and the per-format codec seams.
//!
//! Two formats exist: `text` (newline-delimited human-readable decimal) and
//! `raw` (fixed-width native binary packing with no delimiters). Both codecs
//! are generic over the `Element` trait; selecting one happens once per
//! channel, behind the `ValueDecoder`/`ValueEncoder` trait objects.

use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DataportError;
use crate::types::Element;

pub mod raw;
pub mod text;

pub use raw::{RawDecoder, RawEncoder};
pub use text::{TextDecoder, TextEncoder};

//==================================================================================
// 1. The Format Enum
//==================================================================================

/// The wire format of one channel.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Newline-delimited decimal tokens; booleans as `0`/`1`.
    Text,
    /// Values packed back-to-back, fixed width per element type, native
    /// byte order.
    Raw,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Text => write!(f, "text"),
            Format::Raw => write!(f, "raw"),
        }
    }
}

impl FromStr for Format {
    type Err = DataportError;

    /// Parses the `:format` suffix of a binding specification.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "raw" => Ok(Format::Raw),
            other => Err(DataportError::BindingResolution(format!(
                "invalid channel format '{}'",
                other
            ))),
        }
    }
}

//==================================================================================
// 2. Codec Seams
//==================================================================================

/// Pulls typed values out of an underlying byte source.
pub trait ValueDecoder<T: Element> {
    /// Decodes the next value. `Ok(None)` is a clean end of input at a value
    /// boundary; malformed input is a `Codec` error.
    fn decode_one(&mut self) -> Result<Option<T>, DataportError>;
}

/// Pushes typed values into an underlying byte sink.
pub trait ValueEncoder<T: Element> {
    fn encode_all(&mut self, values: &[T]) -> Result<(), DataportError>;

    /// Forces everything written so far down to the underlying sink.
    fn flush(&mut self) -> Result<(), DataportError>;
}

/// Selects the decoder for a channel once, at setup time.
///
/// `strict` controls the raw codec's trailing-partial-element rule: finite
/// ports set it (a dangling partial element is a `Codec` error), stream
/// ports do not (a trailing partial value is end-of-stream, so a downstream
/// truncation stays clean).
pub fn make_decoder<T, R>(
    format: Format,
    reader: R,
    channel: &str,
    strict: bool,
) -> Box<dyn ValueDecoder<T>>
where
    T: Element,
    R: BufRead + 'static,
{
    match format {
        Format::Text => Box::new(TextDecoder::new(reader, channel)),
        Format::Raw => Box::new(RawDecoder::new(reader, channel, strict)),
    }
}

/// Selects the encoder for a channel once, at setup time.
pub fn make_encoder<T, W>(format: Format, writer: W) -> Box<dyn ValueEncoder<T>>
where
    T: Element,
    W: Write + 'static,
{
    match format {
        Format::Text => Box::new(TextEncoder::new(writer)),
        Format::Raw => Box::new(RawEncoder::new(writer)),
    }
}
