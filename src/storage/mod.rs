//! Storage Module
//!
//! The storage contract and its three interchangeable backends.
//!
//! ## Backends
//! ```text
//! ┌──────────────────┬──────────────────────────┬──────────────────────────────┐
//! │ Backend          │ Native shape             │ Atomicity                    │
//! ├──────────────────┼──────────────────────────┼──────────────────────────────┤
//! │ MemoryStorage    │ four maps, one RwLock    │ per call (whole store)       │
//! │ EmbeddedStorage  │ redb tables (buckets)    │ read/write transactions      │
//! │ RemoteStorage    │ prefixed keys + hashes   │ per key / per hash only      │
//! └──────────────────┴──────────────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Key Scheme
//! - dictionary: word
//! - users: stringified user ID
//! - vocabulary: (stringified user ID, word)
//! - quizzes: generated quiz ID
//!
//! No backend couples writes across entity families. `get_user_dictionary`
//! is a consistent snapshot on the memory and embedded backends; on the remote
//! backend it is two reads (hash, then words) and a concurrent writer may land
//! between them.

pub mod embedded;
pub mod memory;
pub mod remote;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{BackendKind, Config};
use crate::error::Result;
use crate::model::{DictionaryItem, Quiz, User, UserDictionaryItem, UserId};

pub use embedded::EmbeddedStorage;
pub use memory::MemoryStorage;
pub use remote::RemoteStorage;

/// A user's saved word joined with its dictionary record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub item: UserDictionaryItem,
    /// The referenced record; carries only the word when the record is missing
    pub dictionary: DictionaryItem,
}

/// A user's vocabulary keyed by word
pub type UserDictionary = BTreeMap<String, UserEntry>;

/// The only way the rest of the crate touches persisted state
///
/// Every `get*` on an absent key fails with [`WordbankError::NotFound`];
/// every `save*` overwrites the whole record.
///
/// [`WordbankError::NotFound`]: crate::WordbankError::NotFound
pub trait Storage: Send + Sync {
    /// Get a dictionary item by word
    fn get(&self, word: &str) -> Result<DictionaryItem>;

    /// Save a dictionary item, replacing any previous record
    fn save(&self, item: &DictionaryItem) -> Result<()>;

    /// Get a user by ID
    fn get_user(&self, id: UserId) -> Result<User>;

    /// Save a user, replacing any previous record
    fn save_user(&self, user: &User) -> Result<()>;

    /// Get one word of a user's vocabulary
    fn get_user_item(&self, user: UserId, word: &str) -> Result<UserDictionaryItem>;

    /// Save a vocabulary membership record
    fn save_user_item(&self, item: &UserDictionaryItem) -> Result<()>;

    /// Get a user's whole vocabulary joined with dictionary records
    ///
    /// An unknown user yields an empty map, never `NotFound`.
    fn get_user_dictionary(&self, user: UserId) -> Result<UserDictionary>;

    /// Save a quiz, replacing any previous record
    fn save_quiz(&self, quiz: &Quiz) -> Result<()>;

    /// Get a quiz by ID
    fn get_quiz(&self, id: &str) -> Result<Quiz>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Open the backend selected by `config`
pub fn open(config: &Config) -> Result<Arc<dyn Storage>> {
    config.validate()?;

    let storage: Arc<dyn Storage> = match &config.backend {
        BackendKind::Memory => Arc::new(MemoryStorage::new()),
        BackendKind::Embedded { path } => Arc::new(EmbeddedStorage::open(path)?),
        BackendKind::Remote { addr } => Arc::new(RemoteStorage::connect(addr, config)?),
    };

    tracing::debug!(backend = storage.name(), "storage opened");
    Ok(storage)
}

/// Join a vocabulary record with its dictionary record, tolerating a missing one
pub(crate) fn join_entry(item: UserDictionaryItem, dictionary: Option<DictionaryItem>) -> UserEntry {
    let dictionary = dictionary.unwrap_or_else(|| DictionaryItem::new(item.word.clone()));
    UserEntry { item, dictionary }
}
