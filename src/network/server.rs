//! TCP Server
//!
//! Accepts connections and runs one handler thread per client.
//!
//! ```text
//!   accept loop (non-blocking, polls shutdown flag)
//!        │
//!        ├──► "conn-<n>" thread ──► Connection::handle ──┐
//!        ├──► "conn-<n>" thread ──► Connection::handle ──┼──► Arc<Keyspace>
//!        └──► over max_connections: error reply, close   │
//! ```

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Result, WordbankError};
use crate::network::{Connection, Keyspace};
use crate::protocol::{encode_frame, Frame};

/// Poll interval of the accept loop while idle
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// TCP server for the bundled key-value store
pub struct Server {
    config: Config,
    keyspace: Arc<Keyspace>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

/// Stops a running [`Server`] from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the accept loop to stop; open connections finish on their own
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Server {
    /// Bind the listener on `config.listen_addr`
    ///
    /// Port 0 picks a free port; see [`Server::local_addr`].
    pub fn bind(config: Config, keyspace: Arc<Keyspace>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            WordbankError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            keyspace,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);
        let mut next_id: u64 = 0;

        while !self.shutdown.load(Ordering::SeqCst) {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                    continue;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL);
                    continue;
                }
            };

            if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
                tracing::warn!("Rejecting {}: connection limit {} reached", peer, self.config.max_connections);
                reject(stream);
                continue;
            }

            next_id += 1;
            if let Err(e) = self.spawn_handler(stream, next_id) {
                tracing::warn!("Failed to start handler for {}: {}", peer, e);
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    fn spawn_handler(&self, stream: TcpStream, id: u64) -> Result<()> {
        stream.set_nonblocking(false)?;
        let mut connection = Connection::new(stream, Arc::clone(&self.keyspace), &self.config)?;

        let active = Arc::clone(&self.active);
        active.fetch_add(1, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                if let Err(e) = connection.handle() {
                    tracing::debug!("Connection {} closed with error: {}", connection.peer_addr(), e);
                }
                active.fetch_sub(1, Ordering::SeqCst);
            });

        if let Err(e) = spawned {
            self.active.fetch_sub(1, Ordering::SeqCst);
            return Err(e.into());
        }
        Ok(())
    }
}

fn reject(mut stream: TcpStream) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.write_all(&encode_frame(&Frame::error("ERR max number of clients reached")));
}
