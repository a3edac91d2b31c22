//! The stream driver: a single-threaded, synchronous pump loop.
//!
//! The compiled program supplies a `Kernel`; the driver runs its one-off
//! prelude, then repeats its periodic part until some port reaches a
//! terminal state, then finishes (flushing every output). There is no
//! concurrency to overlap — ordinary blocking reads and writes are both
//! sufficient and simplest here.

use crate::error::DataportError;

/// What a kernel step tells the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pump {
    /// More work remains; run the periodic part (again).
    Continue,
    /// Every port reached a terminal state.
    Done,
}

/// The computation kernel, as generated by the compiler. It owns its typed
/// channels; the driver only sequences the calls.
pub trait Kernel {
    /// The one-off part: scalar and finite-array transfers, stream warm-up.
    fn prelude(&mut self) -> Result<Pump, DataportError>;

    /// One period of the streaming part. The default suits programs with no
    /// unbounded ports, whose prelude does all the work.
    fn period(&mut self) -> Result<Pump, DataportError> {
        Ok(Pump::Done)
    }

    /// Terminal flush: every output channel's `finish` belongs here.
    fn finish(&mut self) -> Result<(), DataportError>;
}

/// Drives a kernel to completion.
///
/// A `BrokenPipe` error surfacing from an output channel means the consumer
/// closed its end (e.g. `program | head`); that is downstream truncation,
/// and the run terminates successfully.
pub fn run(kernel: &mut dyn Kernel) -> Result<(), DataportError> {
    match pump(kernel) {
        Ok(()) => {}
        Err(e) if e.is_broken_pipe() => {
            log::debug!("output truncated by consumer; terminating run");
        }
        Err(e) => return Err(e),
    }

    match kernel.finish() {
        Err(e) if e.is_broken_pipe() => Ok(()),
        other => other,
    }
}

fn pump(kernel: &mut dyn Kernel) -> Result<(), DataportError> {
    if kernel.prelude()? == Pump::Done {
        return Ok(());
    }
    let mut periods: u64 = 0;
    loop {
        match kernel.period()? {
            Pump::Continue => periods += 1,
            Pump::Done => {
                log::debug!("kernel done after {} periods", periods);
                return Ok(());
            }
        }
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
