//! # wordbank
//!
//! Personal vocabulary storage and a spaced-repetition quiz engine:
//! - One storage contract with in-memory, embedded (redb) and networked
//!   (RESP / Redis) backends
//! - Recency-weighted multiple-choice quizzes over a user's word list
//! - A small RESP key-value server for development and tests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Callers (chat bot, HTTP API, wordbank-cli)          │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//! ┌──────────────▼──────────────┐  ┌────────────▼───────────────┐
//! │         QuizEngine          │  │   vocabulary workflows     │
//! │ select · choices · scoring  │  │ ensure_user · remember_word│
//! └──────────────┬──────────────┘  └────────────┬───────────────┘
//!                │                              │
//! ┌──────────────▼──────────────────────────────▼───────────────┐
//! │                    Storage (trait object)                    │
//! └──────┬───────────────────────┬───────────────────────┬──────┘
//!        ▼                       ▼                       ▼
//! ┌─────────────┐         ┌─────────────┐         ┌─────────────┐
//! │   Memory    │         │  Embedded   │         │   Remote    │
//! │  (RwLock)   │         │   (redb)    │         │ (KvClient)  │
//! └─────────────┘         └─────────────┘         └──────┬──────┘
//!                                                        │ RESP
//!                                                 ┌──────▼──────┐
//!                                                 │ Redis / kv  │
//!                                                 │   Server    │
//!                                                 └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod model;
pub mod network;
pub mod protocol;
pub mod quiz;
pub mod storage;
pub mod vocabulary;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{BackendKind, Config};
pub use error::{Result, WordbankError};
pub use model::{DictionaryItem, Quiz, QuizType, User, UserDictionaryItem, UserId};
pub use quiz::{QuizEngine, QuizSettings};
pub use storage::{Storage, UserDictionary, UserEntry};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of wordbank
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
