//! Configuration for wordbank
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, WordbankError};

/// Main configuration for a wordbank instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Which storage backend to open
    pub backend: BackendKind,

    /// Idle connections kept by the remote backend
    pub pool_size: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address of the bundled KV server
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds), 0 disables
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds), 0 disables
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Quiz Configuration
    // -------------------------------------------------------------------------
    /// Language tag translations are drawn from
    pub quiz_language: String,

    /// Number of choices per quiz (correct one included)
    pub quiz_choices: usize,
}

/// Storage backend selection
///
/// Parsed from `memory`, `embedded:<path>` or `remote:<host:port>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process maps, lost on drop
    Memory,

    /// Single-file transactional store
    Embedded { path: PathBuf },

    /// Networked key-value store speaking RESP
    Remote { addr: String },
}

impl FromStr for BackendKind {
    type Err = WordbankError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "memory" {
            return Ok(BackendKind::Memory);
        }
        match s.split_once(':') {
            Some(("embedded", path)) if !path.is_empty() => Ok(BackendKind::Embedded {
                path: PathBuf::from(path),
            }),
            Some(("remote", addr)) if !addr.is_empty() => Ok(BackendKind::Remote {
                addr: addr.to_string(),
            }),
            _ => Err(WordbankError::Config(format!(
                "unknown backend '{}' (expected memory, embedded:<path> or remote:<addr>)",
                s
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Embedded { path } => write!(f, "embedded:{}", path.display()),
            BackendKind::Remote { addr } => write!(f, "remote:{}", addr),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            pool_size: 8,
            listen_addr: "127.0.0.1:6379".to_string(),
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            quiz_language: "ru".to_string(),
            quiz_choices: 4,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Read timeout as a `Duration`, `None` when disabled
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Write timeout as a `Duration`, `None` when disabled
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.quiz_choices < 2 {
            return Err(WordbankError::Config(format!(
                "quiz_choices must be at least 2, got {}",
                self.quiz_choices
            )));
        }
        if self.pool_size == 0 {
            return Err(WordbankError::Config("pool_size must be positive".to_string()));
        }
        if self.quiz_language.is_empty() {
            return Err(WordbankError::Config("quiz_language is empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage backend
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the remote connection pool size
    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the quiz translation language
    pub fn quiz_language(mut self, lang: impl Into<String>) -> Self {
        self.config.quiz_language = lang.into();
        self
    }

    /// Set the number of choices per quiz
    pub fn quiz_choices(mut self, count: usize) -> Self {
        self.config.quiz_choices = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
