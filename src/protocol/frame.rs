//! Frame definitions
//!
//! One RESP2 value, used both for requests and responses.

use bytes::Bytes;

/// A single protocol value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `+text`
    Simple(String),

    /// `-message`
    Error(String),

    /// `:n`
    Integer(i64),

    /// `$len` + payload
    Bulk(Bytes),

    /// `$-1` (also decoded from `*-1`)
    Null,

    /// `*n` + n frames
    Array(Vec<Frame>),
}

impl Frame {
    /// Simple `+OK`
    pub fn ok() -> Self {
        Frame::Simple("OK".to_string())
    }

    /// Error frame from a message
    pub fn error(message: impl Into<String>) -> Self {
        Frame::Error(message.into())
    }

    /// Bulk frame from anything byte-like
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Frame::Bulk(data.into())
    }

    /// Short name of the frame kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Simple(_) => "simple string",
            Frame::Error(_) => "error",
            Frame::Integer(_) => "integer",
            Frame::Bulk(_) => "bulk string",
            Frame::Null => "null",
            Frame::Array(_) => "array",
        }
    }
}
