//! KV Client
//!
//! Blocking RESP client with a small pool of idle connections.
//!
//! ## Connection reuse
//! ```text
//! call ──► pop idle ──► peer closed? ──► send ──► receive ──► push back
//!            │ none         │ yes          │ write failed     │ any error
//!            ▼              ▼              ▼                  ▼
//!         dial new ◄── drop, pop next   redial, send once   surface, drop conn
//! ```
//! A command is re-sent only when writing it to a pooled connection failed.
//! Once the write went through, EOF or a reset while waiting for the reply
//! surfaces as `Network`: the server may already have applied it.
//!
//! Socket timeouts bound every round trip; a timed-out connection is
//! discarded because a late reply would desynchronize it.

use std::io::{self, BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;
use crossbeam::queue::ArrayQueue;

use crate::config::Config;
use crate::error::{Result, WordbankError};
use crate::protocol::{read_response, write_command, Command, Frame};

/// Dial timeout when no read timeout is configured
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

struct PooledConnection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl PooledConnection {
    /// Whether an idle connection can still carry a request
    ///
    /// Peeks without blocking: EOF, a socket error or unsolicited bytes all
    /// mean the connection must not be reused.
    fn is_usable(&self) -> bool {
        if !self.reader.buffer().is_empty() {
            return false;
        }
        let stream = self.reader.get_ref();
        if stream.set_nonblocking(true).is_err() {
            return false;
        }
        let mut peeked = [0u8; 1];
        let idle = matches!(stream.peek(&mut peeked), Err(ref e) if e.kind() == io::ErrorKind::WouldBlock);
        stream.set_nonblocking(false).is_ok() && idle
    }

    fn send(&mut self, command: &Command) -> Result<()> {
        write_command(&mut self.writer, command)
    }

    fn receive(&mut self) -> Result<Frame> {
        read_response(&mut self.reader)
    }
}

/// Pooled client for a RESP key-value server
pub struct KvClient {
    addrs: Vec<SocketAddr>,
    display_addr: String,
    idle: ArrayQueue<PooledConnection>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl KvClient {
    /// Resolve `addr` and open the first connection
    ///
    /// Fails fast when the server is unreachable.
    pub fn connect(addr: &str, config: &Config) -> Result<Self> {
        let addrs: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| WordbankError::Network(format!("cannot resolve {}: {}", addr, e)))?
            .collect();
        if addrs.is_empty() {
            return Err(WordbankError::Network(format!("{} resolved to no addresses", addr)));
        }

        let client = Self {
            addrs,
            display_addr: addr.to_string(),
            idle: ArrayQueue::new(config.pool_size.max(1)),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        };

        let first = client.dial()?;
        client.release(first);
        tracing::debug!(addr = %client.display_addr, "kv client connected");
        Ok(client)
    }

    /// Server address as given
    pub fn addr(&self) -> &str {
        &self.display_addr
    }

    /// Idle connections currently pooled
    pub fn idle_connections(&self) -> usize {
        self.idle.len()
    }

    // =========================================================================
    // Typed Commands
    // =========================================================================

    pub fn ping(&self) -> Result<()> {
        let command = Command::Ping;
        match self.call(&command)? {
            Frame::Simple(ref s) if s == "PONG" => Ok(()),
            other => Err(unexpected(&command, &other)),
        }
    }

    /// GET; `None` for an absent key
    pub fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let command = Command::Get { key: key.to_string() };
        let reply = self.call(&command)?;
        optional_bulk(&command, reply)
    }

    pub fn set(&self, key: &str, value: impl Into<Bytes>) -> Result<()> {
        let command = Command::Set {
            key: key.to_string(),
            value: value.into(),
        };
        match self.call(&command)? {
            Frame::Simple(_) => Ok(()),
            other => Err(unexpected(&command, &other)),
        }
    }

    /// DEL; returns how many keys existed
    pub fn del(&self, keys: &[&str]) -> Result<i64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let command = Command::Del {
            keys: keys.iter().map(|k| k.to_string()).collect(),
        };
        integer(&command, self.call(&command)?)
    }

    /// MGET; one slot per key, `None` where the key is absent
    pub fn mget(&self, keys: &[String]) -> Result<Vec<Option<Bytes>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let command = Command::MGet { keys: keys.to_vec() };
        match self.call(&command)? {
            Frame::Array(items) if items.len() == keys.len() => items
                .into_iter()
                .map(|item| optional_bulk(&command, item))
                .collect(),
            other => Err(unexpected(&command, &other)),
        }
    }

    pub fn hget(&self, key: &str, field: &str) -> Result<Option<Bytes>> {
        let command = Command::HGet {
            key: key.to_string(),
            field: field.to_string(),
        };
        let reply = self.call(&command)?;
        optional_bulk(&command, reply)
    }

    /// HSET of a single field; true when the field is new
    pub fn hset(&self, key: &str, field: &str, value: impl Into<Bytes>) -> Result<bool> {
        let command = Command::HSet {
            key: key.to_string(),
            field: field.to_string(),
            value: value.into(),
        };
        Ok(integer(&command, self.call(&command)?)? > 0)
    }

    pub fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        let command = Command::HDel {
            key: key.to_string(),
            field: field.to_string(),
        };
        Ok(integer(&command, self.call(&command)?)? > 0)
    }

    /// HGETALL as (field, value) pairs; empty for an absent key
    pub fn hgetall(&self, key: &str) -> Result<Vec<(String, Bytes)>> {
        let command = Command::HGetAll { key: key.to_string() };
        let items = match self.call(&command)? {
            Frame::Array(items) if items.len() % 2 == 0 => items,
            Frame::Null => return Ok(Vec::new()),
            other => return Err(unexpected(&command, &other)),
        };

        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
            match (field, value) {
                (Frame::Bulk(field), Frame::Bulk(value)) => {
                    let field = String::from_utf8(field.to_vec()).map_err(|_| {
                        WordbankError::backend(command.name(), key, "hash field is not UTF-8")
                    })?;
                    pairs.push((field, value));
                }
                (field, _) => return Err(unexpected(&command, &field)),
            }
        }
        Ok(pairs)
    }

    // =========================================================================
    // Round Trips
    // =========================================================================

    /// Send one command and return the reply; error replies become errors
    pub fn call(&self, command: &Command) -> Result<Frame> {
        let (mut conn, pooled) = self.checkout()?;

        if let Err(e) = conn.send(command) {
            match e {
                WordbankError::Io(ref io_err) if pooled && is_stale(io_err) => {
                    tracing::debug!(addr = %self.display_addr, "pooled connection refused the write, redialing");
                    conn = self.dial()?;
                    conn.send(command).map_err(|e| self.classify(command, e))?;
                }
                e => return Err(self.classify(command, e)),
            }
        }

        let reply = conn.receive().map_err(|e| self.classify(command, e))?;
        self.release(conn);

        match reply {
            Frame::Error(message) => Err(WordbankError::backend(command.name(), command.key(), message)),
            reply => Ok(reply),
        }
    }

    /// A usable idle connection, or a new one; `true` when it came from the pool
    fn checkout(&self) -> Result<(PooledConnection, bool)> {
        while let Some(conn) = self.idle.pop() {
            if conn.is_usable() {
                return Ok((conn, true));
            }
            tracing::debug!(addr = %self.display_addr, "discarding closed pooled connection");
        }
        Ok((self.dial()?, false))
    }

    fn dial(&self) -> Result<PooledConnection> {
        let connect_timeout = self.read_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let mut last_error = None;

        for addr in &self.addrs {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(self.read_timeout)?;
                    stream.set_write_timeout(self.write_timeout)?;
                    let read_stream = stream.try_clone()?;
                    return Ok(PooledConnection {
                        reader: BufReader::new(read_stream),
                        writer: BufWriter::new(stream),
                    });
                }
                Err(e) => last_error = Some(e),
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(WordbankError::Network(format!(
            "cannot connect to {}: {}",
            self.display_addr, reason
        )))
    }

    fn release(&self, conn: PooledConnection) {
        // Full pool: the surplus connection is simply closed
        let _ = self.idle.push(conn);
    }

    fn classify(&self, command: &Command, err: WordbankError) -> WordbankError {
        match err {
            WordbankError::Io(ref e) if is_timeout(e) => WordbankError::Timeout(format!(
                "{} '{}' on {}",
                command.name(),
                command.key(),
                self.display_addr
            )),
            WordbankError::Io(e) => WordbankError::Network(format!(
                "{} '{}' on {}: {}",
                command.name(),
                command.key(),
                self.display_addr,
                e
            )),
            other => other,
        }
    }
}

fn is_stale(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn optional_bulk(command: &Command, reply: Frame) -> Result<Option<Bytes>> {
    match reply {
        Frame::Bulk(data) => Ok(Some(data)),
        Frame::Null => Ok(None),
        other => Err(unexpected(command, &other)),
    }
}

fn integer(command: &Command, reply: Frame) -> Result<i64> {
    match reply {
        Frame::Integer(n) => Ok(n),
        other => Err(unexpected(command, &other)),
    }
}

fn unexpected(command: &Command, reply: &Frame) -> WordbankError {
    WordbankError::Protocol(format!(
        "unexpected {} reply to {}",
        reply.kind(),
        command.name()
    ))
}
