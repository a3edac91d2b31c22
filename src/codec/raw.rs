//! The raw codec: values packed back-to-back with no delimiters, fixed
//! width per element type, native byte order.
//!
//! Decoding consumes exactly `T::WIDTH` bytes per value. What a trailing
//! partial value means depends on the channel: on a stream it is clean
//! truncation and reads as end-of-stream; on a finite port it is a dangling
//! partial element and therefore a `Codec` error.

use std::io::{ErrorKind, Read, Write};

use crate::codec::{ValueDecoder, ValueEncoder};
use crate::error::DataportError;
use crate::types::Element;

//==================================================================================
// 1. Decoder
//==================================================================================

pub struct RawDecoder<R> {
    reader: R,
    channel: String,
    /// Finite ports are strict: a trailing partial element is an error
    /// rather than end-of-stream.
    strict: bool,
}

impl<R: Read> RawDecoder<R> {
    pub fn new(reader: R, channel: &str, strict: bool) -> Self {
        Self {
            reader,
            channel: channel.to_string(),
            strict,
        }
    }

    /// Fills `buf` from the reader. Returns the number of bytes read, which
    /// is short only at end of input.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, DataportError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read, T: Element> ValueDecoder<T> for RawDecoder<R> {
    fn decode_one(&mut self) -> Result<Option<T>, DataportError> {
        let mut buf = [0u8; 8];
        let buf = &mut buf[..T::WIDTH];

        let filled = self.read_full(buf)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < T::WIDTH {
            if self.strict {
                return Err(DataportError::codec(
                    &self.channel,
                    format!(
                        "dangling partial element ({} of {} bytes)",
                        filled,
                        T::WIDTH
                    ),
                ));
            }
            log::debug!(
                "channel '{}': trailing partial element ({} of {} bytes), treating as end of stream",
                self.channel,
                filled,
                T::WIDTH
            );
            return Ok(None);
        }

        Ok(Some(T::decode_raw(buf)))
    }
}

//==================================================================================
// 2. Encoder
//==================================================================================

pub struct RawEncoder<W> {
    writer: W,
    scratch: Vec<u8>,
}

impl<W: Write> RawEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            scratch: Vec::new(),
        }
    }
}

impl<W: Write, T: Element> ValueEncoder<T> for RawEncoder<W> {
    fn encode_all(&mut self, values: &[T]) -> Result<(), DataportError> {
        self.scratch.clear();
        T::encode_raw_slice(values, &mut self.scratch);
        self.writer.write_all(&self.scratch)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DataportError> {
        self.writer.flush()?;
        Ok(())
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
