//! Command definitions
//!
//! Represents commands from clients and their frame encoding.

use bytes::Bytes;

use crate::error::{Result, WordbankError};

use super::Frame;

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ping (health check)
    Ping,

    /// Get a string value by key
    Get { key: String },

    /// Set a string value
    Set { key: String, value: Bytes },

    /// Delete keys of any type
    Del { keys: Vec<String> },

    /// Get several string values at once
    MGet { keys: Vec<String> },

    /// Get one hash field
    HGet { key: String, field: String },

    /// Set one hash field
    HSet { key: String, field: String, value: Bytes },

    /// Delete one hash field
    HDel { key: String, field: String },

    /// Get every field of a hash
    HGetAll { key: String },
}

impl Command {
    /// Upper-case command name as sent on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Del { .. } => "DEL",
            Command::MGet { .. } => "MGET",
            Command::HGet { .. } => "HGET",
            Command::HSet { .. } => "HSET",
            Command::HDel { .. } => "HDEL",
            Command::HGetAll { .. } => "HGETALL",
        }
    }

    /// First key the command touches, for error context
    pub fn key(&self) -> &str {
        match self {
            Command::Ping => "",
            Command::Get { key }
            | Command::Set { key, .. }
            | Command::HGet { key, .. }
            | Command::HSet { key, .. }
            | Command::HDel { key, .. }
            | Command::HGetAll { key } => key,
            Command::Del { keys } | Command::MGet { keys } => {
                keys.first().map(String::as_str).unwrap_or("")
            }
        }
    }

    /// Encode as an array of bulk strings
    pub fn to_frame(&self) -> Frame {
        let mut parts: Vec<Bytes> = vec![Bytes::from_static(self.name().as_bytes())];
        match self {
            Command::Ping => {}
            Command::Get { key } | Command::HGetAll { key } => {
                parts.push(Bytes::copy_from_slice(key.as_bytes()));
            }
            Command::Set { key, value } => {
                parts.push(Bytes::copy_from_slice(key.as_bytes()));
                parts.push(value.clone());
            }
            Command::Del { keys } | Command::MGet { keys } => {
                parts.extend(keys.iter().map(|k| Bytes::copy_from_slice(k.as_bytes())));
            }
            Command::HGet { key, field } | Command::HDel { key, field } => {
                parts.push(Bytes::copy_from_slice(key.as_bytes()));
                parts.push(Bytes::copy_from_slice(field.as_bytes()));
            }
            Command::HSet { key, field, value } => {
                parts.push(Bytes::copy_from_slice(key.as_bytes()));
                parts.push(Bytes::copy_from_slice(field.as_bytes()));
                parts.push(value.clone());
            }
        }
        Frame::Array(parts.into_iter().map(Frame::Bulk).collect())
    }

    /// Parse a request frame
    pub fn from_frame(frame: Frame) -> Result<Command> {
        let items = match frame {
            Frame::Array(items) if !items.is_empty() => items,
            other => {
                return Err(WordbankError::Protocol(format!(
                    "expected non-empty array, got {}",
                    other.kind()
                )))
            }
        };

        let mut args = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Frame::Bulk(data) => args.push(data),
                Frame::Simple(text) => args.push(Bytes::from(text)),
                other => {
                    return Err(WordbankError::Protocol(format!(
                        "command arguments must be strings, got {}",
                        other.kind()
                    )))
                }
            }
        }

        let name = String::from_utf8_lossy(&args[0]).to_ascii_uppercase();
        let rest = &args[1..];

        let command = match (name.as_str(), rest.len()) {
            ("PING", 0) => Command::Ping,
            ("GET", 1) => Command::Get { key: text(&rest[0])? },
            ("SET", 2) => Command::Set {
                key: text(&rest[0])?,
                value: rest[1].clone(),
            },
            ("DEL", n) if n > 0 => Command::Del { keys: texts(rest)? },
            ("MGET", n) if n > 0 => Command::MGet { keys: texts(rest)? },
            ("HGET", 2) => Command::HGet {
                key: text(&rest[0])?,
                field: text(&rest[1])?,
            },
            ("HSET", 3) => Command::HSet {
                key: text(&rest[0])?,
                field: text(&rest[1])?,
                value: rest[2].clone(),
            },
            ("HDEL", 2) => Command::HDel {
                key: text(&rest[0])?,
                field: text(&rest[1])?,
            },
            ("HGETALL", 1) => Command::HGetAll { key: text(&rest[0])? },
            ("PING" | "GET" | "SET" | "DEL" | "MGET" | "HGET" | "HSET" | "HDEL" | "HGETALL", _) => {
                return Err(WordbankError::Protocol(format!(
                    "wrong number of arguments for '{}' command",
                    name.to_ascii_lowercase()
                )))
            }
            _ => {
                return Err(WordbankError::Protocol(format!(
                    "unknown command '{}'",
                    name
                )))
            }
        };
        Ok(command)
    }
}

fn text(data: &Bytes) -> Result<String> {
    String::from_utf8(data.to_vec())
        .map_err(|_| WordbankError::Protocol("keys and fields must be UTF-8".to_string()))
}

fn texts(data: &[Bytes]) -> Result<Vec<String>> {
    data.iter().map(text).collect()
}
