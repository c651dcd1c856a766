//! Connection Handler
//!
//! Handles individual client connections of the bundled KV server.

use std::io::{self, BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, WordbankError};
use crate::network::Keyspace;
use crate::protocol::{read_frame, write_response, Command, Frame};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared key-value state
    keyspace: Arc<Keyspace>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and configures timeouts
    pub fn new(stream: TcpStream, keyspace: Arc<Keyspace>, config: &Config) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            keyspace,
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads frames in a loop and sends replies. A frame that parses but is
    /// not a valid command gets an error reply and the loop continues; a
    /// malformed frame gets an error reply and closes the connection.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let frame = match read_frame(&mut self.reader) {
                Ok(frame) => frame,
                Err(WordbankError::Io(ref e)) if is_disconnect(e) => {
                    tracing::debug!("Client {} disconnected ({:?})", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    let _ = self.send(Frame::error(format!("ERR {}", e)));
                    return Err(e);
                }
            };

            let reply = match Command::from_frame(frame) {
                Ok(command) => {
                    tracing::trace!("Received command from {}: {}", self.peer_addr, command.name());
                    self.keyspace.execute(command)
                }
                Err(e) => Frame::error(format!("ERR {}", e)),
            };

            if let Err(e) = self.send(reply) {
                if let WordbankError::Io(ref io_err) = e {
                    if is_disconnect(io_err) || io_err.kind() == io::ErrorKind::BrokenPipe {
                        tracing::debug!(
                            "Client {} disconnected before reply could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    fn send(&mut self, reply: Frame) -> Result<()> {
        write_response(&mut self.writer, &reply)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// EOF, reset, abort and idle timeouts all end the session quietly
fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
