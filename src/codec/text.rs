//! The text codec: one decimal token per value.
//!
//! Decoding skips any inter-token whitespace (spaces, tabs, newlines), so
//! `"1 3 5"` and `"1\n3\n5\n"` carry the same value sequence. Encoding
//! writes one value per line with a trailing newline after every value,
//! including the last.

use std::io::{BufRead, Write};

use crate::codec::{ValueDecoder, ValueEncoder};
use crate::error::DataportError;
use crate::types::Element;

//==================================================================================
// 1. Decoder
//==================================================================================

pub struct TextDecoder<R> {
    reader: R,
    channel: String,
}

impl<R: BufRead> TextDecoder<R> {
    pub fn new(reader: R, channel: &str) -> Self {
        Self {
            reader,
            channel: channel.to_string(),
        }
    }

    /// Scans the next whitespace-delimited token. `None` at end of input.
    fn next_token(&mut self) -> Result<Option<String>, DataportError> {
        let mut token = String::new();
        loop {
            // Scan the buffered bytes first; the borrow must end before
            // `consume` below.
            let (consumed, complete) = {
                let buf = self.reader.fill_buf()?;
                if buf.is_empty() {
                    // End of input; a token in progress is complete.
                    return Ok(if token.is_empty() { None } else { Some(token) });
                }

                let mut consumed = 0;
                let mut complete = false;
                for &byte in buf {
                    if byte.is_ascii_whitespace() {
                        consumed += 1;
                        if token.is_empty() {
                            continue; // Leading whitespace.
                        }
                        complete = true;
                        break;
                    }
                    token.push(byte as char);
                    consumed += 1;
                }
                (consumed, complete)
            };

            self.reader.consume(consumed);
            if complete {
                return Ok(Some(token));
            }
        }
    }
}

impl<R: BufRead, T: Element> ValueDecoder<T> for TextDecoder<R> {
    fn decode_one(&mut self) -> Result<Option<T>, DataportError> {
        let token = match self.next_token()? {
            Some(token) => token,
            None => return Ok(None),
        };

        match T::decode_text(&token) {
            Some(value) => Ok(Some(value)),
            None => Err(DataportError::codec(
                &self.channel,
                format!("malformed {} token '{}'", T::ELEMENT_TYPE, token),
            )),
        }
    }
}

//==================================================================================
// 2. Encoder
//==================================================================================

pub struct TextEncoder<W> {
    writer: W,
    line: String,
}

impl<W: Write> TextEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            line: String::new(),
        }
    }
}

impl<W: Write, T: Element> ValueEncoder<T> for TextEncoder<W> {
    fn encode_all(&mut self, values: &[T]) -> Result<(), DataportError> {
        self.line.clear();
        for value in values {
            value.encode_text(&mut self.line);
            self.line.push('\n');
        }
        self.writer.write_all(self.line.as_bytes())?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode_all<T: Element>(input: &str) -> Result<Vec<T>, DataportError> {
        let mut decoder = TextDecoder::new(Cursor::new(input.to_string()), "t");
        let mut values = Vec::new();
        while let Some(value) = ValueDecoder::<T>::decode_one(&mut decoder)? {
            values.push(value);
        }
        Ok(values)
    }

    #[test]
    fn test_decode_space_and_newline_separated() {
        assert_eq!(decode_all::<i32>("1 3 5").unwrap(), vec![1, 3, 5]);
        assert_eq!(decode_all::<i32>("1\n3\n5\n").unwrap(), vec![1, 3, 5]);
        assert_eq!(decode_all::<i32>("  -2\t7 ").unwrap(), vec![-2, 7]);
        assert_eq!(decode_all::<i32>("").unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn test_decode_malformed_token() {
        let err = decode_all::<i32>("1 two 3").unwrap_err();
        assert!(err.to_string().contains("'two'"));

        let err = decode_all::<bool>("1 0 maybe").unwrap_err();
        assert!(err.to_string().contains("'maybe'"));
    }

    #[test]
    fn test_encode_one_value_per_line() {
        let mut sink = Vec::new();
        {
            let mut encoder = TextEncoder::new(&mut sink);
            encoder.encode_all(&[2i32, 6, 10]).unwrap();
            ValueEncoder::<i32>::flush(&mut encoder).unwrap();
        }
        assert_eq!(String::from_utf8(sink).unwrap(), "2\n6\n10\n");
    }

    #[test]
    fn test_encode_bools_as_digits() {
        let mut sink = Vec::new();
        {
            let mut encoder = TextEncoder::new(&mut sink);
            encoder.encode_all(&[false, true, true]).unwrap();
        }
        assert_eq!(String::from_utf8(sink).unwrap(), "0\n1\n1\n");
    }

    #[test]
    fn test_text_roundtrip() {
        let original = vec![0.5f32, -3.25, 1000.0];
        let mut sink = Vec::new();
        {
            let mut encoder = TextEncoder::new(&mut sink);
            encoder.encode_all(&original).unwrap();
        }
        let decoded = decode_all::<f32>(&String::from_utf8(sink).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }
}
