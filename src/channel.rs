//! The buffering engine: typed channels that sit between the computation
//! and a codec, grouping values according to the run's `BlockPolicy`.
//!
//! Buffering only changes the granularity of underlying I/O operations. For
//! any input and any policy, the logical value sequence seen by the kernel
//! (and produced on the sink) is identical — values are never reordered,
//! dropped, duplicated or coalesced.

use std::collections::VecDeque;

use crate::codec::{ValueDecoder, ValueEncoder};
use crate::config::BlockPolicy;
use crate::error::DataportError;
use crate::types::Element;

//==================================================================================
// 1. Input Channels
//==================================================================================

/// A typed input channel: decoder + value-granular read buffering + the
/// port's declared element budget.
pub struct InputChannel<T: Element> {
    name: String,
    decoder: Box<dyn ValueDecoder<T>>,
    queue: VecDeque<T>,
    policy: BlockPolicy,
    /// Declared element count for finite ports; `None` for streams.
    remaining: Option<u64>,
    ended: bool,
}

impl<T: Element> std::fmt::Debug for InputChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputChannel")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("remaining", &self.remaining)
            .field("ended", &self.ended)
            .finish()
    }
}

impl<T: Element> InputChannel<T> {
    pub fn new(
        name: impl Into<String>,
        decoder: Box<dyn ValueDecoder<T>>,
        policy: BlockPolicy,
        budget: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            decoder,
            queue: VecDeque::new(),
            policy,
            remaining: budget,
            ended: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many values one refill may decode. A finite budget caps the
    /// refill so a grouped channel never drains values that belong to
    /// another port sharing the same source.
    fn refill_quota(&self) -> u64 {
        let group = match self.policy {
            BlockPolicy::Grouped(n) => n as u64,
            BlockPolicy::Buffered | BlockPolicy::PerValue => 1,
        };
        match self.remaining {
            Some(remaining) => group.min(remaining.saturating_sub(self.queue.len() as u64)),
            None => group,
        }
    }

    fn refill(&mut self) -> Result<(), DataportError> {
        let quota = self.refill_quota();
        for _ in 0..quota {
            match self.decoder.decode_one()? {
                Some(value) => self.queue.push_back(value),
                None => {
                    self.ended = true;
                    log::debug!("channel '{}': source exhausted", self.name);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Pulls the next value. `Ok(None)` is a terminal state: either the
    /// declared element count has been consumed, or a stream's source is
    /// exhausted. A finite port whose source ends early fails with
    /// `PrematureEndOfInput`.
    pub fn next_value(&mut self) -> Result<Option<T>, DataportError> {
        if self.remaining == Some(0) && self.queue.is_empty() {
            return Ok(None);
        }
        if self.queue.is_empty() && !self.ended {
            self.refill()?;
        }
        match self.queue.pop_front() {
            Some(value) => {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }
                Ok(Some(value))
            }
            None => {
                if matches!(self.remaining, Some(r) if r > 0) {
                    return Err(DataportError::PrematureEndOfInput(self.name.clone()));
                }
                Ok(None)
            }
        }
    }

    /// Pulls a value that must exist (scalars and finite array elements).
    pub fn read_value(&mut self) -> Result<T, DataportError> {
        match self.next_value()? {
            Some(value) => Ok(value),
            None => {
                // next_value already failed if the source ended early, so
                // landing here means the kernel read past the declared count.
                Err(DataportError::Internal(format!(
                    "read past the declared element count of port '{}'",
                    self.name
                )))
            }
        }
    }

    /// Fills one frame (one streamed element, or a whole finite array).
    /// Returns `false` on a clean end of input before the first value; an
    /// end mid-frame is a `PrematureEndOfInput`.
    pub fn read_frame(&mut self, frame: &mut [T]) -> Result<bool, DataportError> {
        for (index, slot) in frame.iter_mut().enumerate() {
            match self.next_value()? {
                Some(value) => *slot = value,
                None if index == 0 => return Ok(false),
                None => return Err(DataportError::PrematureEndOfInput(self.name.clone())),
            }
        }
        Ok(true)
    }
}

//==================================================================================
// 2. Output Channels
//==================================================================================

/// A typed output channel: value-granular write buffering + encoder.
pub struct OutputChannel<T: Element> {
    name: String,
    encoder: Box<dyn ValueEncoder<T>>,
    pending: Vec<T>,
    policy: BlockPolicy,
}

impl<T: Element> OutputChannel<T> {
    pub fn new(
        name: impl Into<String>,
        encoder: Box<dyn ValueEncoder<T>>,
        policy: BlockPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            encoder,
            pending: Vec::new(),
            policy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write_value(&mut self, value: T) -> Result<(), DataportError> {
        match self.policy {
            BlockPolicy::Buffered => self.encoder.encode_all(&[value]),
            BlockPolicy::PerValue => {
                self.encoder.encode_all(&[value])?;
                self.encoder.flush()
            }
            BlockPolicy::Grouped(group) => {
                self.pending.push(value);
                if self.pending.len() >= group {
                    self.flush_pending()?;
                }
                Ok(())
            }
        }
    }

    pub fn write_frame(&mut self, frame: &[T]) -> Result<(), DataportError> {
        match self.policy {
            BlockPolicy::Buffered => self.encoder.encode_all(frame),
            _ => {
                for &value in frame {
                    self.write_value(value)?;
                }
                Ok(())
            }
        }
    }

    /// Encodes the pending group and pushes it down to the sink.
    fn flush_pending(&mut self) -> Result<(), DataportError> {
        if !self.pending.is_empty() {
            self.encoder.encode_all(&self.pending)?;
            self.pending.clear();
        }
        self.encoder.flush()
    }

    /// Flushes the final partial group and the underlying sink. Must be
    /// called when the port reaches its terminal state; a partial group is
    /// flushed, never dropped.
    pub fn finish(&mut self) -> Result<(), DataportError> {
        self.flush_pending()
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
