//! Protocol codec
//!
//! Encoding and decoding functions for RESP2.
//!
//! ## Wire Format
//!
//! Every frame starts with a one-byte type marker and ends its header line
//! with `\r\n`:
//! ```text
//! ┌──────────┬──────────────────────┬──────┬───────────────────────┐
//! │ Type (1) │ Header line (ASCII)  │ CRLF │ Body (bulk / array)   │
//! └──────────┴──────────────────────┴──────┴───────────────────────┘
//! ```
//!
//! - `+` simple string, `-` error, `:` integer: body is the header line
//! - `$` bulk: header is the byte length, followed by payload + CRLF
//! - `*` array: header is the element count, followed by that many frames
//!
//! A stream that ends mid-frame surfaces as `Io(UnexpectedEof)`, so
//! connection loops can tell a clean disconnect from garbage.

use std::io::{self, BufRead, Read, Write};

use bytes::Bytes;

use super::{Command, Frame};
use crate::error::{Result, WordbankError};

/// Maximum bulk string payload (16 MB)
pub const MAX_BULK_SIZE: usize = 16 * 1024 * 1024;

/// Maximum number of elements in one array
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// Longest accepted header line, excluding CRLF
const MAX_LINE: usize = 64 * 1024;

/// Deepest accepted array nesting
const MAX_DEPTH: usize = 32;

// =============================================================================
// Frame Encoding/Decoding
// =============================================================================

/// Encode a frame to bytes
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(frame, &mut out);
    out
}

fn encode_into(frame: &Frame, out: &mut Vec<u8>) {
    match frame {
        Frame::Simple(text) => {
            out.push(b'+');
            out.extend_from_slice(single_line(text).as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Frame::Error(message) => {
            out.push(b'-');
            out.extend_from_slice(single_line(message).as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Frame::Integer(n) => {
            out.extend_from_slice(format!(":{}\r\n", n).as_bytes());
        }
        Frame::Bulk(data) => {
            out.extend_from_slice(format!("${}\r\n", data.len()).as_bytes());
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        Frame::Null => out.extend_from_slice(b"$-1\r\n"),
        Frame::Array(items) => {
            out.extend_from_slice(format!("*{}\r\n", items.len()).as_bytes());
            for item in items {
                encode_into(item, out);
            }
        }
    }
}

/// Simple strings and errors cannot carry line breaks
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Decode exactly one frame from a byte slice
///
/// Trailing bytes after the frame are rejected.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    let mut cursor = bytes;
    let frame = read_frame(&mut cursor).map_err(|e| match e {
        WordbankError::Io(ref io_err) if io_err.kind() == io::ErrorKind::UnexpectedEof => {
            WordbankError::Protocol(format!("Incomplete frame: {} bytes", bytes.len()))
        }
        other => other,
    })?;

    if !cursor.is_empty() {
        return Err(WordbankError::Protocol(format!(
            "Trailing data after frame: {} bytes",
            cursor.len()
        )));
    }
    Ok(frame)
}

/// Read one complete frame from a buffered stream
///
/// Blocks until the frame is complete or an error occurs.
pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Frame> {
    read_frame_at(reader, 0)
}

fn read_frame_at<R: BufRead>(reader: &mut R, depth: usize) -> Result<Frame> {
    let line = read_line(reader)?;
    let (marker, header) = match line.split_first() {
        Some((marker, header)) => (*marker, header),
        None => return Err(WordbankError::Protocol("Empty frame header".to_string())),
    };

    match marker {
        b'+' => Ok(Frame::Simple(utf8(header)?)),
        b'-' => Ok(Frame::Error(utf8(header)?)),
        b':' => Ok(Frame::Integer(integer(header)?)),
        b'$' => {
            let len = integer(header)?;
            if len == -1 {
                return Ok(Frame::Null);
            }
            let len = length(len, MAX_BULK_SIZE, "Bulk string")?;

            // Payload plus trailing CRLF
            let mut payload = vec![0u8; len + 2];
            reader.read_exact(&mut payload)?;
            if &payload[len..] != b"\r\n" {
                return Err(WordbankError::Protocol(
                    "Bulk string not terminated by CRLF".to_string(),
                ));
            }
            payload.truncate(len);
            Ok(Frame::Bulk(Bytes::from(payload)))
        }
        b'*' => {
            let len = integer(header)?;
            if len == -1 {
                return Ok(Frame::Null);
            }
            let len = length(len, MAX_ARRAY_LEN, "Array")?;
            if depth >= MAX_DEPTH {
                return Err(WordbankError::Protocol(format!(
                    "Arrays nested deeper than {}",
                    MAX_DEPTH
                )));
            }

            // Capacity is bounded by what actually arrives
            let mut items = Vec::with_capacity(len.min(1024));
            for _ in 0..len {
                items.push(read_frame_at(reader, depth + 1)?);
            }
            Ok(Frame::Array(items))
        }
        other => Err(WordbankError::Protocol(format!(
            "Unknown frame type: 0x{:02x}",
            other
        ))),
    }
}

/// Read one CRLF-terminated line, returning it without the terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE as u64 + 2)
        .read_until(b'\n', &mut line)?;

    if read == 0 {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    if !line.ends_with(b"\r\n") {
        if line.len() >= MAX_LINE + 2 {
            return Err(WordbankError::Protocol(format!(
                "Header line longer than {} bytes",
                MAX_LINE
            )));
        }
        if line.ends_with(b"\n") {
            return Err(WordbankError::Protocol(
                "Header line terminated by bare LF".to_string(),
            ));
        }
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }

    line.truncate(line.len() - 2);
    Ok(line)
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| WordbankError::Protocol("Header line is not UTF-8".to_string()))
}

fn integer(bytes: &[u8]) -> Result<i64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            WordbankError::Protocol(format!(
                "Invalid integer: {:?}",
                String::from_utf8_lossy(bytes)
            ))
        })
}

fn length(len: i64, max: usize, what: &str) -> Result<usize> {
    if len < 0 {
        return Err(WordbankError::Protocol(format!(
            "{} length is negative: {}",
            what, len
        )));
    }
    let len = len as usize;
    if len > max {
        return Err(WordbankError::Protocol(format!(
            "{} too large: {} (max {})",
            what, len, max
        )));
    }
    Ok(len)
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command as an array of bulk strings
pub fn encode_command(command: &Command) -> Vec<u8> {
    encode_frame(&command.to_frame())
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    Command::from_frame(decode_frame(bytes)?)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response frame
pub fn encode_response(response: &Frame) -> Vec<u8> {
    encode_frame(response)
}

/// Decode a response frame
pub fn decode_response(bytes: &[u8]) -> Result<Frame> {
    decode_frame(bytes)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// An unparseable command inside a well-formed frame is a `Protocol`
/// error; the stream is still positioned at the next frame.
pub fn read_command<R: BufRead>(reader: &mut R) -> Result<Command> {
    Command::from_frame(read_frame(reader)?)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Frame> {
    read_frame(reader)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Frame) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_null_array_as_null() {
        assert_eq!(decode_frame(b"*-1\r\n").unwrap(), Frame::Null);
    }

    #[test]
    fn test_line_limit() {
        let mut bytes = vec![b'+'];
        bytes.extend(std::iter::repeat(b'a').take(MAX_LINE + 10));
        bytes.extend_from_slice(b"\r\n");
        assert!(matches!(
            decode_frame(&bytes),
            Err(WordbankError::Protocol(_))
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let bytes = "*1\r\n".repeat(MAX_DEPTH + 1).into_bytes();
        let err = decode_frame(&bytes).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn test_simple_string_newlines_are_flattened() {
        let bytes = encode_frame(&Frame::error("bad\r\nthing"));
        assert_eq!(bytes, b"-bad  thing\r\n");
    }
}
