//! This file is the root of the `dataport` Rust crate.
//!
//! The crate is the I/O runtime linked into every compiled dataflow
//! program. Its responsibilities are strictly limited to:
//! 1.  Describing the program's declared ports (`types`).
//! 2.  Resolving the command-line binding grammar into per-port sources,
//!     sinks, formats and buffering (`binding`, `config`, `session`).
//! 3.  Encoding and decoding values in the text and raw wire formats
//!     (`codec`) behind value-granular buffering (`channel`).
//! 4.  Driving the computation kernel until every port reaches a terminal
//!     state (`driver`).
//!
//! The language front-end, type checker and code generator are external
//! collaborators: they declare the ports and generate the kernel; this
//! crate moves the data.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================

pub mod binding;
pub mod channel;
pub mod check;
pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod session;
pub mod types;

// Re-export the types a generated program touches on every line of its
// main, so it needs a single `use dataport::prelude::*`.
pub mod prelude {
    pub use crate::channel::{InputChannel, OutputChannel};
    pub use crate::driver::{run, Kernel, Pump};
    pub use crate::error::DataportError;
    pub use crate::session::{exit_code, init_logging, Session, SessionArgs};
    pub use crate::types::{Direction, ElementType, PortDescriptor, Shape};
}
