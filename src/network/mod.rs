//! Network Module
//!
//! RESP transport: the client used by the remote backend, and a bundled
//! key-value server for development and tests.
//!
//! ## Architecture
//! - Single acceptor thread, one handler thread per connection
//! - Commands executed against a shared [`Keyspace`]
//! - [`KvClient`] keeps a bounded pool of idle connections

mod client;
mod connection;
mod keyspace;
mod server;

pub use client::KvClient;
pub use connection::Connection;
pub use keyspace::Keyspace;
pub use server::{Server, ShutdownHandle};
