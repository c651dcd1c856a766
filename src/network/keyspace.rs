//! Keyspace
//!
//! In-memory string and hash values served by the bundled KV server.
//! Semantics follow Redis for the supported commands: missing keys read as
//! null, touching a key of the other type is a `WRONGTYPE` error, and a hash
//! whose last field is removed disappears.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::protocol::{Command, Frame};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone)]
enum Value {
    Str(Bytes),
    Hash(HashMap<String, Bytes>),
}

/// Shared key-value state
#[derive(Default)]
pub struct Keyspace {
    entries: RwLock<HashMap<String, Value>>,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys of any type
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Execute one command and produce its reply
    pub fn execute(&self, command: Command) -> Frame {
        match command {
            Command::Ping => Frame::Simple("PONG".to_string()),

            Command::Get { key } => match self.entries.read().get(&key) {
                Some(Value::Str(data)) => Frame::Bulk(data.clone()),
                Some(Value::Hash(_)) => Frame::error(WRONGTYPE),
                None => Frame::Null,
            },

            Command::Set { key, value } => {
                self.entries.write().insert(key, Value::Str(value));
                Frame::ok()
            }

            Command::Del { keys } => {
                let mut entries = self.entries.write();
                let removed = keys.iter().filter(|k| entries.remove(*k).is_some()).count();
                Frame::Integer(removed as i64)
            }

            Command::MGet { keys } => {
                let entries = self.entries.read();
                let values = keys
                    .iter()
                    .map(|key| match entries.get(key) {
                        Some(Value::Str(data)) => Frame::Bulk(data.clone()),
                        _ => Frame::Null,
                    })
                    .collect();
                Frame::Array(values)
            }

            Command::HGet { key, field } => match self.entries.read().get(&key) {
                Some(Value::Hash(fields)) => {
                    fields.get(&field).cloned().map(Frame::Bulk).unwrap_or(Frame::Null)
                }
                Some(Value::Str(_)) => Frame::error(WRONGTYPE),
                None => Frame::Null,
            },

            Command::HSet { key, field, value } => {
                let mut entries = self.entries.write();
                let slot = entries
                    .entry(key)
                    .or_insert_with(|| Value::Hash(HashMap::new()));
                match slot {
                    Value::Hash(fields) => {
                        let added = fields.insert(field, value).is_none();
                        Frame::Integer(added as i64)
                    }
                    Value::Str(_) => Frame::error(WRONGTYPE),
                }
            }

            Command::HDel { key, field } => {
                let mut entries = self.entries.write();
                let (removed, now_empty) = match entries.get_mut(&key) {
                    Some(Value::Hash(fields)) => {
                        let removed = fields.remove(&field).is_some();
                        (removed, fields.is_empty())
                    }
                    Some(Value::Str(_)) => return Frame::error(WRONGTYPE),
                    None => (false, false),
                };
                if now_empty {
                    entries.remove(&key);
                }
                Frame::Integer(removed as i64)
            }

            Command::HGetAll { key } => match self.entries.read().get(&key) {
                Some(Value::Hash(fields)) => {
                    let mut flat = Vec::with_capacity(fields.len() * 2);
                    for (field, value) in fields {
                        flat.push(Frame::bulk(field.clone()));
                        flat.push(Frame::Bulk(value.clone()));
                    }
                    Frame::Array(flat)
                }
                Some(Value::Str(_)) => Frame::error(WRONGTYPE),
                None => Frame::Array(Vec::new()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(key: &str, value: &str) -> Command {
        Command::Set {
            key: key.to_string(),
            value: Bytes::copy_from_slice(value.as_bytes()),
        }
    }

    fn hset(key: &str, field: &str, value: &str) -> Command {
        Command::HSet {
            key: key.to_string(),
            field: field.to_string(),
            value: Bytes::copy_from_slice(value.as_bytes()),
        }
    }

    #[test]
    fn test_string_and_hash_types_do_not_mix() {
        let keyspace = Keyspace::new();
        keyspace.execute(set("s", "v"));
        keyspace.execute(hset("h", "f", "v"));

        assert!(matches!(keyspace.execute(hset("s", "f", "v")), Frame::Error(_)));
        assert!(matches!(
            keyspace.execute(Command::Get { key: "h".to_string() }),
            Frame::Error(_)
        ));
    }

    #[test]
    fn test_mget_reports_null_for_missing_and_hash_keys() {
        let keyspace = Keyspace::new();
        keyspace.execute(set("a", "1"));
        keyspace.execute(hset("h", "f", "v"));

        let reply = keyspace.execute(Command::MGet {
            keys: vec!["a".to_string(), "missing".to_string(), "h".to_string()],
        });
        assert_eq!(
            reply,
            Frame::Array(vec![Frame::bulk("1"), Frame::Null, Frame::Null])
        );
    }

    #[test]
    fn test_hdel_last_field_removes_key() {
        let keyspace = Keyspace::new();
        keyspace.execute(hset("h", "f", "v"));
        assert_eq!(
            keyspace.execute(Command::HDel {
                key: "h".to_string(),
                field: "f".to_string()
            }),
            Frame::Integer(1)
        );
        assert!(keyspace.is_empty());
    }

    #[test]
    fn test_hset_reports_new_fields_only() {
        let keyspace = Keyspace::new();
        assert_eq!(keyspace.execute(hset("h", "f", "1")), Frame::Integer(1));
        assert_eq!(keyspace.execute(hset("h", "f", "2")), Frame::Integer(0));
    }
}
