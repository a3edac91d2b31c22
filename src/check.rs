//! The conformance checker: compares a program's declared output contract
//! and produced values against an expectation stated in the type-annotation
//! mini-language.
//!
//! The float tolerance lives here, on the comparison side, and only here —
//! the codecs encode and decode exactly. A conformance run that needs the
//! tolerance therefore gets it from this module, never from `codec`.

use colored::Colorize;

use crate::error::DataportError;
use crate::types::{parse_signature, Element, ElementType, PortDescriptor, Shape};

/// Absolute tolerance for float comparisons. A consumer-side contract for
/// conformance testing, not a codec guarantee.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

//==================================================================================
// 1. Expectations
//==================================================================================

/// The expected output contract: element type plus shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    pub element: ElementType,
    pub shape: Shape,
}

/// Parses an annotation like `[~]float` into an expectation. Same grammar
/// as the port signatures.
pub fn parse_annotation(text: &str) -> Result<Expectation, DataportError> {
    let (element, shape) = parse_signature(text)?;
    Ok(Expectation { element, shape })
}

/// Checks the declared contract of an output port against an expectation.
/// Returns every mismatch message rather than stopping at the first.
pub fn check_contract(expected: &Expectation, actual: &PortDescriptor) -> Vec<String> {
    let mut problems = Vec::new();

    if expected.shape.is_stream() != actual.is_stream() {
        problems.push(if expected.shape.is_stream() {
            "Stream expected.".to_string()
        } else {
            "Stream not expected.".to_string()
        });
    }

    if expected.shape.dimensions() != actual.shape.dimensions() {
        problems.push(format!(
            "Expected dimensions {:?} but program has {:?}",
            expected.shape.dimensions(),
            actual.shape.dimensions()
        ));
    }

    if expected.element != actual.element {
        problems.push(format!(
            "Expected element type {} but program has {}",
            expected.element, actual.element
        ));
    }

    problems
}

//==================================================================================
// 2. Value Comparison
//==================================================================================

/// One element that fell outside the tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementMismatch {
    pub index: usize,
    pub expected: f64,
    pub actual: f64,
}

/// The outcome of one value comparison: best-effort and complete, so a run
/// reports every mismatched element, not just the first.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueReport {
    /// Number of element pairs actually compared.
    pub checked: usize,
    /// Expected elements with no produced counterpart.
    pub missing: usize,
    pub mismatches: Vec<ElementMismatch>,
}

impl ValueReport {
    pub fn is_ok(&self) -> bool {
        self.missing == 0 && self.mismatches.is_empty()
    }

    /// Cumulative exit code: non-zero if any element mismatched.
    pub fn exit_code(&self) -> i32 {
        if self.is_ok() {
            0
        } else {
            1
        }
    }

    /// Prints the per-element report, in the style conformance logs expect.
    pub fn print(&self, actual: &[f64], writer: &mut impl std::io::Write) {
        let mut pending = self.mismatches.iter().peekable();
        for (index, value) in actual.iter().take(self.checked).enumerate() {
            let mismatch = match pending.peek() {
                Some(m) if m.index == index => pending.next(),
                _ => None,
            };
            let verdict = match mismatch {
                Some(m) => format!("Error: Expected {:.3}", m.expected).red(),
                None => "OK".green(),
            };
            let _ = writeln!(writer, "Output[{}] = {:.3} ({})", index, value, verdict);
        }
        if self.missing > 0 {
            let _ = writeln!(
                writer,
                "{}",
                format!("Expected {} more output elements.", self.missing).red()
            );
        }
    }
}

/// Compares produced values against expected ones with an absolute
/// tolerance. Extra produced values are ignored (streams are routinely
/// truncated for comparison); expected values with no counterpart are
/// counted as missing.
pub fn compare_values(expected: &[f64], actual: &[f64], tolerance: f64) -> ValueReport {
    let checked = expected.len().min(actual.len());
    let mut mismatches = Vec::new();

    for index in 0..checked {
        if (expected[index] - actual[index]).abs() > tolerance {
            mismatches.push(ElementMismatch {
                index,
                expected: expected[index],
                actual: actual[index],
            });
        }
    }

    ValueReport {
        checked,
        missing: expected.len() - checked,
        mismatches,
    }
}

/// Widens typed channel values for comparison.
pub fn comparable<T: Element>(values: &[T]) -> Vec<f64> {
    values.iter().map(|v| v.to_comparable()).collect()
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
