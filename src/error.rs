// In: src/error.rs

//! This module defines the single, unified error type for the entire dataport
//! runtime. It uses the `thiserror` crate to provide ergonomic, context-aware
//! error handling.

use std::io::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataportError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to this runtime's logic)
    // =========================================================================
    /// A malformed shape/type signature, reported before any I/O happens.
    #[error("Invalid type signature: {0}")]
    TypeSyntax(String),

    /// A binding token that cannot be matched against the declared ports,
    /// reported before the computation starts.
    #[error("Binding resolution failed: {0}")]
    BindingResolution(String),

    /// A malformed text token or a dangling partial raw element on a channel
    /// where one is not expected.
    #[error("Codec error on channel '{channel}': {detail}")]
    Codec { channel: String, detail: String },

    /// A finite or dependent computation needed more input than its source
    /// provided.
    #[error("Premature end of input on channel '{0}'")]
    PrematureEndOfInput(String),

    #[error("Internal logic error (this is a bug): {0}")]
    Internal(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (e.g., a file
    /// that cannot be opened, a pipe that went away).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, raised while writing the
    /// interface report.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl DataportError {
    /// Convenience constructor for codec failures, which always carry the
    /// channel name for the diagnostic.
    pub fn codec(channel: &str, detail: impl Into<String>) -> Self {
        DataportError::Codec {
            channel: channel.to_string(),
            detail: detail.into(),
        }
    }

    /// True when the error is a downstream pipe closing mid-run. The driver
    /// treats this as truncation by the consumer, not as a failure.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, DataportError::Io(e) if e.kind() == ErrorKind::BrokenPipe)
    }
}
