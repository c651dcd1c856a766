//! Protocol Module
//!
//! RESP2 wire protocol spoken between the remote backend and a key-value
//! server (Redis, or the bundled [`crate::network::Server`]).
//!
//! ## Frame Format
//! ```text
//! +OK\r\n                      simple string
//! -ERR message\r\n             error
//! :42\r\n                      integer
//! $5\r\nhello\r\n              bulk string
//! $-1\r\n                      null
//! *2\r\n$3\r\nGET\r\n$1\r\nk\r\n   array
//! ```
//!
//! ### Commands
//! Requests are arrays of bulk strings: PING, GET, SET, DEL, MGET, HGET,
//! HSET, HDEL, HGETALL.

mod codec;
mod command;
mod frame;

pub use codec::{
    decode_command, decode_frame, decode_response, encode_command, encode_frame,
    encode_response, read_command, read_frame, read_response, write_command, write_response,
    MAX_ARRAY_LEN, MAX_BULK_SIZE,
};
pub use command::Command;
pub use frame::Frame;
