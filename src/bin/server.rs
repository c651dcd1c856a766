//! wordbank-kv Server Binary
//!
//! Runs the bundled RESP key-value server the remote backend can talk to.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use wordbank::network::{Keyspace, Server};
use wordbank::Config;

/// wordbank key-value server
#[derive(Parser, Debug)]
#[command(name = "wordbank-kv")]
#[command(about = "In-memory RESP key-value server for wordbank")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Idle read timeout in milliseconds (0 disables)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds (0 disables)
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wordbank=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("wordbank-kv v{}", wordbank::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let server = match Server::bind(config, Arc::new(Keyspace::new())) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
