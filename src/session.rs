//! The application boundary of a compiled program: command-line surface,
//! resolved bindings, and the channel-opening seam.
//!
//! A generated program's `main` builds its `PortDescriptor` list, parses
//! the command line into a `Session`, opens one typed channel per port and
//! hands its kernel to `driver::run`:
//!
//! ```no_run
//! use dataport::driver::{self, Kernel, Pump};
//! use dataport::error::DataportError;
//! use dataport::session::Session;
//! use dataport::types::{Direction, PortDescriptor};
//!
//! struct Doubler {
//!     x: dataport::channel::InputChannel<i32>,
//!     y: dataport::channel::OutputChannel<i32>,
//! }
//!
//! impl Kernel for Doubler {
//!     fn prelude(&mut self) -> Result<Pump, DataportError> {
//!         Ok(Pump::Continue)
//!     }
//!     fn period(&mut self) -> Result<Pump, DataportError> {
//!         match self.x.next_value()? {
//!             Some(v) => {
//!                 self.y.write_value(v * 2)?;
//!                 Ok(Pump::Continue)
//!             }
//!             None => Ok(Pump::Done),
//!         }
//!     }
//!     fn finish(&mut self) -> Result<(), DataportError> {
//!         self.y.finish()
//!     }
//! }
//!
//! fn main() {
//!     dataport::session::init_logging();
//!     let ports = vec![
//!         PortDescriptor::parse("x", Direction::Input, "[~]int").unwrap(),
//!         PortDescriptor::parse("y", Direction::Output, "[~]int").unwrap(),
//!     ];
//!     let code = dataport::session::exit_code((|| {
//!         let session = Session::from_cli(ports)?;
//!         let mut kernel = Doubler {
//!             x: session.open_input("x")?,
//!             y: session.open_output("y")?,
//!         };
//!         driver::run(&mut kernel)
//!     })());
//!     std::process::exit(code);
//! }
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Write};

use clap::Parser;

use crate::binding::{self, Binding, Locator};
use crate::channel::{InputChannel, OutputChannel};
use crate::codec::{make_decoder, make_encoder, Format};
use crate::config::{BlockPolicy, SessionConfig};
use crate::error::DataportError;
use crate::types::{Direction, Element, PortDescriptor};

//==================================================================================
// 1. Command-Line Surface
//==================================================================================

const BINDING_REFERENCE: &str = "\
Bindings:
  <input>=<value list>
      Feed an input from inline literal values (space/comma separated).
  <port>=<file>[:<format>]
      Use a file as source or destination.
  <port>=pipe[:<format>]
      Read from stdin or write to stdout.
Formats:
  raw:  Values packed back-to-back in native binary, fixed width per type.
  text: One decimal value per line (bools as 0/1).
Unbound inputs read stdin and unbound outputs write stdout, in text format
unless --format says otherwise.";

/// The command-line surface shared by every generated program.
#[derive(Parser, Debug)]
#[command(name = "dataport", version, after_help = BINDING_REFERENCE)]
#[command(about = "Run a compiled dataflow program with the given port bindings")]
pub struct SessionArgs {
    /// Use this format for every port without an explicit format
    #[arg(short = 'f', long = "format", value_enum, value_name = "FORMAT")]
    pub format: Option<Format>,

    /// Buffer size in elements: 0 flushes per element, N groups chunks of N
    /// elements. Fully buffered when absent.
    #[arg(short = 'b', long = "buffer", value_name = "SIZE")]
    pub buffer: Option<usize>,

    /// Port bindings, one per declared port that should not use its default
    #[arg(value_name = "PORT=SPEC")]
    pub bindings: Vec<String>,
}

impl SessionArgs {
    pub fn to_config(&self) -> SessionConfig {
        SessionConfig {
            default_format: self.format,
            block: BlockPolicy::from_flag(self.buffer),
        }
    }
}

//==================================================================================
// 2. The Session
//==================================================================================

/// Process-wide run state: the declared ports and their resolved bindings.
/// Created at start, discarded at exit; nothing persists across runs.
#[derive(Debug)]
pub struct Session {
    ports: HashMap<String, PortDescriptor>,
    bindings: HashMap<String, Binding>,
}

impl Session {
    /// Resolves a session from pre-parsed pieces. Pure: no file or stream
    /// is touched until a channel is opened.
    pub fn new(
        ports: Vec<PortDescriptor>,
        config: &SessionConfig,
        binding_tokens: &[String],
    ) -> Result<Self, DataportError> {
        let bindings = binding::resolve(config, binding_tokens, &ports)?;
        Ok(Self {
            ports: ports.into_iter().map(|p| (p.name.clone(), p)).collect(),
            bindings: bindings.into_iter().map(|b| (b.port.clone(), b)).collect(),
        })
    }

    pub fn from_args(
        ports: Vec<PortDescriptor>,
        args: &SessionArgs,
    ) -> Result<Self, DataportError> {
        Self::new(ports, &args.to_config(), &args.bindings)
    }

    /// Parses the process command line. This is the entry point generated
    /// programs call.
    pub fn from_cli(ports: Vec<PortDescriptor>) -> Result<Self, DataportError> {
        let args = SessionArgs::parse();
        Self::from_args(ports, &args)
    }

    pub fn binding(&self, port: &str) -> Option<&Binding> {
        self.bindings.get(port)
    }

    pub fn port(&self, name: &str) -> Option<&PortDescriptor> {
        self.ports.get(name)
    }

    /// Opens the typed input channel for one port. The element type is
    /// checked against the declaration; a mismatch is a bug in the
    /// generated program, not a user error.
    pub fn open_input<T: Element>(&self, name: &str) -> Result<InputChannel<T>, DataportError> {
        let (port, binding) = self.lookup::<T>(name, Direction::Input)?;
        let strict = !port.is_stream();
        let budget = port.shape.element_count();

        let reader: Box<dyn BufRead> = match &binding.locator {
            Locator::Pipe => Box::new(BufReader::new(io::stdin())),
            Locator::File(path) => {
                let file = File::open(path).map_err(|e| {
                    DataportError::BindingResolution(format!(
                        "failed to open file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Box::new(BufReader::new(file))
            }
            Locator::Literal(text) => Box::new(Cursor::new(text.clone().into_bytes())),
        };

        log::debug!(
            "opening input '{}' ({} {:?})",
            name,
            binding.format,
            binding.block
        );
        let decoder = make_decoder(binding.format, reader, name, strict);
        Ok(InputChannel::new(name, decoder, binding.block, budget))
    }

    /// Opens the typed output channel for one port.
    pub fn open_output<T: Element>(&self, name: &str) -> Result<OutputChannel<T>, DataportError> {
        let (_, binding) = self.lookup::<T>(name, Direction::Output)?;

        let writer: Box<dyn Write> = match (&binding.locator, binding.block) {
            (Locator::Pipe, BlockPolicy::Buffered) => Box::new(BufWriter::new(io::stdout())),
            (Locator::Pipe, _) => Box::new(io::stdout()),
            (Locator::File(path), block) => {
                let file = File::create(path).map_err(|e| {
                    DataportError::BindingResolution(format!(
                        "failed to open file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                match block {
                    BlockPolicy::Buffered => Box::new(BufWriter::new(file)),
                    _ => Box::new(file),
                }
            }
            (Locator::Literal(_), _) => {
                // The resolver rejects literal sinks; reaching one here is a bug.
                return Err(DataportError::Internal(format!(
                    "literal locator on output port '{}'",
                    name
                )));
            }
        };

        log::debug!(
            "opening output '{}' ({} {:?})",
            name,
            binding.format,
            binding.block
        );
        let encoder = make_encoder(binding.format, writer);
        Ok(OutputChannel::new(name, encoder, binding.block))
    }

    fn lookup<T: Element>(
        &self,
        name: &str,
        direction: Direction,
    ) -> Result<(&PortDescriptor, &Binding), DataportError> {
        let port = self.ports.get(name).ok_or_else(|| {
            DataportError::Internal(format!("channel opened for undeclared port '{}'", name))
        })?;
        if port.direction != direction {
            return Err(DataportError::Internal(format!(
                "port '{}' opened in the wrong direction",
                name
            )));
        }
        if port.element != T::ELEMENT_TYPE {
            return Err(DataportError::Internal(format!(
                "port '{}' is declared {} but was opened as {}",
                name,
                port.element,
                T::ELEMENT_TYPE
            )));
        }
        let binding = self.bindings.get(name).ok_or_else(|| {
            DataportError::Internal(format!("no binding resolved for port '{}'", name))
        })?;
        Ok((port, binding))
    }
}

//==================================================================================
// 3. Process Plumbing
//==================================================================================

/// Initializes `env_logger` for a generated program. Diagnostics go to
/// stderr so they never mix with port data on stdout.
pub fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stderr);
    let _ = builder.try_init();
}

/// Maps a run result onto the process exit code, reporting any failure on
/// stderr. All errors are fatal; none are retried.
pub fn exit_code(result: Result<(), DataportError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
