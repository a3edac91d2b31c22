//! End-to-end scenarios: kernels built the way generated programs build
//! them, driven through channels, codecs and bindings.

use std::io::{Cursor, Error, ErrorKind, Write};
use std::sync::{Arc, Mutex};

use clap::Parser;
use dataport::channel::{InputChannel, OutputChannel};
use dataport::codec::{make_decoder, make_encoder, Format};
use dataport::config::BlockPolicy;
use dataport::driver::{self, Kernel, Pump};
use dataport::error::DataportError;
use dataport::session::{Session, SessionArgs};
use dataport::types::{Direction, Element, PortDescriptor};

// Test Helpers

/// A sink whose contents outlive the channel that owns it.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn bytes(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    fn text(&self) -> String {
        String::from_utf8(self.bytes()).unwrap()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A sink that accepts a fixed number of bytes and then behaves like a
/// closed pipe, the way `program | head -c N` does.
struct TruncatingSink {
    data: SharedSink,
    remaining: usize,
}

impl Write for TruncatingSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.remaining == 0 {
            return Err(Error::new(ErrorKind::BrokenPipe, "downstream closed"));
        }
        let accepted = buf.len().min(self.remaining);
        self.data.write_all(&buf[..accepted])?;
        self.remaining -= accepted;
        Ok(accepted)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn text_input<T: Element>(text: &str, policy: BlockPolicy, budget: Option<u64>) -> InputChannel<T> {
    let decoder = make_decoder(
        Format::Text,
        Cursor::new(text.to_string()),
        "x",
        budget.is_some(),
    );
    InputChannel::new("x", decoder, policy, budget)
}

fn raw_input<T: Element>(bytes: Vec<u8>, policy: BlockPolicy) -> InputChannel<T> {
    let decoder = make_decoder(Format::Raw, Cursor::new(bytes), "x", false);
    InputChannel::new("x", decoder, policy, None)
}

fn output<T: Element, W: Write + 'static>(
    format: Format,
    sink: W,
    policy: BlockPolicy,
) -> OutputChannel<T> {
    OutputChannel::new("y", make_encoder(format, sink), policy)
}

fn packed(values: &[i32]) -> Vec<u8> {
    let mut bytes = Vec::new();
    i32::encode_raw_slice(values, &mut bytes);
    bytes
}

/// `y = x * factor` over an unbounded int stream.
struct Scale {
    x: InputChannel<i32>,
    y: OutputChannel<i32>,
    factor: i32,
}

impl Kernel for Scale {
    fn prelude(&mut self) -> Result<Pump, DataportError> {
        Ok(Pump::Continue)
    }

    fn period(&mut self) -> Result<Pump, DataportError> {
        match self.x.next_value()? {
            Some(v) => {
                self.y.write_value(v * self.factor)?;
                Ok(Pump::Continue)
            }
            None => Ok(Pump::Done),
        }
    }

    fn finish(&mut self) -> Result<(), DataportError> {
        self.y.finish()
    }
}

/// `y = !x` over an unbounded bool stream.
struct Negate {
    x: InputChannel<bool>,
    y: OutputChannel<bool>,
}

impl Kernel for Negate {
    fn prelude(&mut self) -> Result<Pump, DataportError> {
        Ok(Pump::Continue)
    }

    fn period(&mut self) -> Result<Pump, DataportError> {
        match self.x.next_value()? {
            Some(v) => {
                self.y.write_value(!v)?;
                Ok(Pump::Continue)
            }
            None => Ok(Pump::Done),
        }
    }

    fn finish(&mut self) -> Result<(), DataportError> {
        self.y.finish()
    }
}

/// `y = x * k` where `k` is a scalar input read in the prelude.
struct ScaleByPort {
    k: InputChannel<i32>,
    x: InputChannel<i32>,
    y: OutputChannel<i32>,
    factor: i32,
}

impl Kernel for ScaleByPort {
    fn prelude(&mut self) -> Result<Pump, DataportError> {
        self.factor = self.k.read_value()?;
        Ok(Pump::Continue)
    }

    fn period(&mut self) -> Result<Pump, DataportError> {
        match self.x.next_value()? {
            Some(v) => {
                self.y.write_value(v * self.factor)?;
                Ok(Pump::Continue)
            }
            None => Ok(Pump::Done),
        }
    }

    fn finish(&mut self) -> Result<(), DataportError> {
        self.y.finish()
    }
}

/// `y = [i] -> i * 3`: an unbounded source with no inputs at all. Runs
/// until the consumer stops accepting values.
struct Counter {
    y: OutputChannel<i32>,
    index: i32,
}

impl Kernel for Counter {
    fn prelude(&mut self) -> Result<Pump, DataportError> {
        Ok(Pump::Continue)
    }

    fn period(&mut self) -> Result<Pump, DataportError> {
        self.y.write_value(self.index * 3)?;
        self.index += 1;
        Ok(Pump::Continue)
    }

    fn finish(&mut self) -> Result<(), DataportError> {
        self.y.finish()
    }
}

/// `y = x * 10` over a finite `[4]int` port, all work in the prelude.
struct ScaleArray {
    x: InputChannel<i32>,
    y: OutputChannel<i32>,
}

impl Kernel for ScaleArray {
    fn prelude(&mut self) -> Result<Pump, DataportError> {
        let mut frame = [0i32; 4];
        if !self.x.read_frame(&mut frame)? {
            return Err(DataportError::PrematureEndOfInput("x".to_string()));
        }
        for v in frame {
            self.y.write_value(v * 10)?;
        }
        Ok(Pump::Done)
    }

    fn finish(&mut self) -> Result<(), DataportError> {
        self.y.finish()
    }
}

// -------- Scenarios --------

#[test]
fn text_stream_doubling() {
    let sink = SharedSink::default();
    let mut kernel = Scale {
        x: text_input("1 3 5", BlockPolicy::Buffered, None),
        y: output(Format::Text, sink.clone(), BlockPolicy::Buffered),
        factor: 2,
    };
    driver::run(&mut kernel).unwrap();
    assert_eq!(sink.text(), "2\n6\n10\n");
}

#[test]
fn text_scalar() {
    let sink = SharedSink::default();
    let mut kernel = Scale {
        x: text_input("7", BlockPolicy::Buffered, Some(1)),
        y: output(Format::Text, sink.clone(), BlockPolicy::Buffered),
        factor: 10,
    };
    driver::run(&mut kernel).unwrap();
    assert_eq!(sink.text(), "70\n");
}

#[test]
fn bool_stream_negation() {
    let sink = SharedSink::default();
    let mut kernel = Negate {
        x: text_input("1 0 0 1 0 1", BlockPolicy::Buffered, None),
        y: output(Format::Text, sink.clone(), BlockPolicy::Buffered),
    };
    driver::run(&mut kernel).unwrap();
    assert_eq!(sink.text(), "0\n1\n1\n0\n1\n0\n");
}

#[test]
fn scalar_port_scales_stream() {
    // k comes from a literal binding, x from standard-input-style text.
    let session = Session::from_args(
        vec![
            PortDescriptor::parse("k", Direction::Input, "int").unwrap(),
            PortDescriptor::parse("x", Direction::Input, "[~]int").unwrap(),
            PortDescriptor::parse("y", Direction::Output, "[~]int").unwrap(),
        ],
        &SessionArgs::parse_from(["prog", "k=10"]),
    )
    .unwrap();

    let sink = SharedSink::default();
    let mut kernel = ScaleByPort {
        k: session.open_input("k").unwrap(),
        x: text_input("0 3 6 9", BlockPolicy::Buffered, None),
        y: output(Format::Text, sink.clone(), BlockPolicy::Buffered),
        factor: 0,
    };
    driver::run(&mut kernel).unwrap();
    assert_eq!(sink.text(), "0\n30\n60\n90\n");
}

#[test]
fn raw_stream_unbuffered() {
    let sink = SharedSink::default();
    let mut kernel = Scale {
        x: raw_input(packed(&[1, 3, 5]), BlockPolicy::PerValue),
        y: output(Format::Raw, sink.clone(), BlockPolicy::PerValue),
        factor: 10,
    };
    driver::run(&mut kernel).unwrap();
    assert_eq!(sink.bytes(), packed(&[10, 30, 50]));
}

#[test]
fn raw_stream_buffered() {
    let input: Vec<i32> = (0..10).map(|i| i * 2 + 1).collect();
    let expected: Vec<i32> = input.iter().map(|v| v * 10).collect();

    let sink = SharedSink::default();
    let mut kernel = Scale {
        x: raw_input(packed(&input), BlockPolicy::Grouped(4)),
        y: output(Format::Raw, sink.clone(), BlockPolicy::Grouped(4)),
        factor: 10,
    };
    driver::run(&mut kernel).unwrap();
    assert_eq!(sink.bytes(), packed(&expected));
}

#[test]
fn counter_truncated_by_consumer() {
    // Raw format, block size 3, consumer takes exactly 10 elements.
    let data = SharedSink::default();
    let sink = TruncatingSink {
        data: data.clone(),
        remaining: 40,
    };
    let mut kernel = Counter {
        y: output(Format::Raw, sink, BlockPolicy::Grouped(3)),
        index: 0,
    };
    driver::run(&mut kernel).unwrap();

    let expected: Vec<i32> = (0..10).map(|i| i * 3).collect();
    assert_eq!(data.bytes(), packed(&expected));
}

#[test]
fn mixed_formats_per_port() {
    // x=pipe:raw y=pipe:text, in-memory: raw in, text out.
    let sink = SharedSink::default();
    let mut kernel = Scale {
        x: raw_input(packed(&[3, 5, 7, 9]), BlockPolicy::Buffered),
        y: output(Format::Text, sink.clone(), BlockPolicy::Buffered),
        factor: 100,
    };
    driver::run(&mut kernel).unwrap();
    assert_eq!(sink.text(), "300\n500\n700\n900\n");
}

#[test]
fn literal_bindings_match_piped_text() {
    // An inline literal list must behave exactly like the same values
    // arriving as text on standard input.
    let ports = || {
        vec![
            PortDescriptor::parse("x", Direction::Input, "[~]int").unwrap(),
            PortDescriptor::parse("y", Direction::Output, "[~]int").unwrap(),
        ]
    };
    let session =
        Session::from_args(ports(), &SessionArgs::parse_from(["prog", "x=2, 4, 6"])).unwrap();

    let from_literal = SharedSink::default();
    let mut kernel = Scale {
        x: session.open_input("x").unwrap(),
        y: output(Format::Text, from_literal.clone(), BlockPolicy::Buffered),
        factor: 10,
    };
    driver::run(&mut kernel).unwrap();

    let from_pipe = SharedSink::default();
    let mut kernel = Scale {
        x: text_input("2 4 6", BlockPolicy::Buffered, None),
        y: output(Format::Text, from_pipe.clone(), BlockPolicy::Buffered),
        factor: 10,
    };
    driver::run(&mut kernel).unwrap();

    assert_eq!(from_literal.text(), "20\n40\n60\n");
    assert_eq!(from_literal.text(), from_pipe.text());
}

#[test]
fn literal_array_binding() {
    let session = Session::from_args(
        vec![
            PortDescriptor::parse("x", Direction::Input, "[4]int").unwrap(),
            PortDescriptor::parse("y", Direction::Output, "[4]int").unwrap(),
        ],
        &SessionArgs::parse_from(["prog", "x=1 3 5 7"]),
    )
    .unwrap();

    let sink = SharedSink::default();
    let mut kernel = ScaleArray {
        x: session.open_input("x").unwrap(),
        y: output(Format::Text, sink.clone(), BlockPolicy::Buffered),
    };
    driver::run(&mut kernel).unwrap();
    assert_eq!(sink.text(), "10\n30\n50\n70\n");
}

#[test]
fn buffering_is_transparent() {
    // The single most important property: for any block size, the decoded
    // output is identical.
    let policies = [
        BlockPolicy::Buffered,
        BlockPolicy::PerValue,
        BlockPolicy::Grouped(1),
        BlockPolicy::Grouped(3),
        BlockPolicy::Grouped(4),
        BlockPolicy::Grouped(7),
    ];

    for format in [Format::Text, Format::Raw] {
        let mut outputs = Vec::new();
        for policy in policies {
            let sink = SharedSink::default();
            let mut kernel = Scale {
                x: raw_input(packed(&[1, 2, 3, 4, 5, 6, 7, 8]), policy),
                y: output(format, sink.clone(), policy),
                factor: -3,
            };
            driver::run(&mut kernel).unwrap();
            outputs.push(sink.bytes());
        }
        for window in outputs.windows(2) {
            assert_eq!(window[0], window[1], "{:?}", format);
        }
    }
}

#[test]
fn file_bindings_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("test-input");
    let out_path = dir.path().join("test-output");
    std::fs::write(&in_path, "1 3 5 2 4 6").unwrap();

    let session = Session::from_args(
        vec![
            PortDescriptor::parse("x", Direction::Input, "[~]int").unwrap(),
            PortDescriptor::parse("y", Direction::Output, "[~]int").unwrap(),
        ],
        &SessionArgs::parse_from([
            "prog".to_string(),
            format!("x={}", in_path.display()),
            format!("y={}", out_path.display()),
        ]),
    )
    .unwrap();

    let mut kernel = Scale {
        x: session.open_input("x").unwrap(),
        y: session.open_output("y").unwrap(),
        factor: 10,
    };
    driver::run(&mut kernel).unwrap();

    assert_eq!(
        std::fs::read_to_string(&out_path).unwrap(),
        "10\n30\n50\n20\n40\n60\n"
    );
}

#[test]
fn raw_file_bindings_with_format_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("in.dat");
    let out_path = dir.path().join("out.dat");
    std::fs::write(&in_path, packed(&[1, 3, 5])).unwrap();

    let session = Session::from_args(
        vec![
            PortDescriptor::parse("x", Direction::Input, "[~]int").unwrap(),
            PortDescriptor::parse("y", Direction::Output, "[~]int").unwrap(),
        ],
        &SessionArgs::parse_from([
            "prog".to_string(),
            "-b=0".to_string(),
            format!("x={}:raw", in_path.display()),
            format!("y={}:raw", out_path.display()),
        ]),
    )
    .unwrap();

    let mut kernel = Scale {
        x: session.open_input("x").unwrap(),
        y: session.open_output("y").unwrap(),
        factor: 10,
    };
    driver::run(&mut kernel).unwrap();

    assert_eq!(std::fs::read(&out_path).unwrap(), packed(&[10, 30, 50]));
}

/// `y = x * 0.5` over floats; the produced values are then checked the way
/// the conformance tooling checks them.
struct Halve {
    x: InputChannel<f32>,
    y: OutputChannel<f32>,
}

impl Kernel for Halve {
    fn prelude(&mut self) -> Result<Pump, DataportError> {
        Ok(Pump::Continue)
    }

    fn period(&mut self) -> Result<Pump, DataportError> {
        match self.x.next_value()? {
            Some(v) => {
                self.y.write_value(v * 0.5)?;
                Ok(Pump::Continue)
            }
            None => Ok(Pump::Done),
        }
    }

    fn finish(&mut self) -> Result<(), DataportError> {
        self.y.finish()
    }
}

#[test]
fn float_output_satisfies_conformance_check() {
    use dataport::check::{self, DEFAULT_TOLERANCE};

    let sink = SharedSink::default();
    let mut kernel = Halve {
        x: text_input("1 3 0.5", BlockPolicy::Buffered, None),
        y: output(Format::Text, sink.clone(), BlockPolicy::Buffered),
    };
    driver::run(&mut kernel).unwrap();

    let produced: Vec<f32> = sink
        .text()
        .split_whitespace()
        .map(|t| t.parse().unwrap())
        .collect();
    let report = check::compare_values(
        &[0.5, 1.5, 0.25],
        &check::comparable(&produced),
        DEFAULT_TOLERANCE,
    );
    assert!(report.is_ok());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn premature_end_of_input_is_fatal() {
    let sink = SharedSink::default();
    let mut kernel = ScaleArray {
        x: text_input("1 2", BlockPolicy::Buffered, Some(4)),
        y: output(Format::Text, sink.clone(), BlockPolicy::Buffered),
    };
    let err = driver::run(&mut kernel).unwrap_err();
    assert!(matches!(err, DataportError::PrematureEndOfInput(_)));
}

#[test]
fn malformed_text_token_is_fatal() {
    let sink = SharedSink::default();
    let mut kernel = Scale {
        x: text_input("1 oops 3", BlockPolicy::Buffered, None),
        y: output(Format::Text, sink.clone(), BlockPolicy::Buffered),
        factor: 2,
    };
    let err = driver::run(&mut kernel).unwrap_err();
    assert!(matches!(err, DataportError::Codec { .. }));
}
