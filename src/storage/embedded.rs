//! Embedded transactional backend
//!
//! Single-file redb database with one table per entity family ("bucket").
//!
//! ## Buckets
//! ```text
//! Dictionary         word                      → DictionaryItem
//! Users              "<user id>"               → User
//! Quizzes            quiz id                   → Quiz
//! UsersDictionaries  ("<user id>", word)       → UserDictionaryItem
//! ```
//! The per-user vocabulary is a nested namespace: the composite key keeps one
//! user's words contiguous, so a range scan over `("<user id>", "")..` visits
//! exactly that user's words.
//!
//! ## Concurrency
//! redb gives single-writer / multi-reader semantics: reads never block on
//! other reads, write transactions serialize. `get_user_dictionary` runs in
//! one read transaction and sees a consistent snapshot of both buckets.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableDatabase, TableDefinition};

use crate::error::{Result, WordbankError};
use crate::model::{decode_record, encode_record, DictionaryItem, Quiz, User, UserDictionaryItem, UserId};

use super::{join_entry, Storage, UserDictionary};

/// A flat bucket keyed by string
type Bucket = TableDefinition<'static, &'static str, &'static [u8]>;

const DICTIONARY: Bucket = TableDefinition::new("Dictionary");
const USERS: Bucket = TableDefinition::new("Users");
const QUIZZES: Bucket = TableDefinition::new("Quizzes");
const USERS_DICTIONARIES: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("UsersDictionaries");

/// Storage backed by a single redb file
pub struct EmbeddedStorage {
    db: Database,
    path: PathBuf,
}

/// Map any redb error into a backend error carrying operation and key
fn fail<'a, E: Display>(op: &'static str, key: &'a str) -> impl FnOnce(E) -> WordbankError + 'a {
    move |e| WordbankError::backend(op, key, e)
}

impl EmbeddedStorage {
    /// Open or create the database file and its buckets
    ///
    /// Bucket creation is create-if-absent, so reopening an existing file is safe.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let shown = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path).map_err(fail("open", &shown))?;

        let txn = db.begin_write().map_err(fail("open", &shown))?;
        {
            txn.open_table(DICTIONARY).map_err(fail("create bucket", "Dictionary"))?;
            txn.open_table(USERS).map_err(fail("create bucket", "Users"))?;
            txn.open_table(QUIZZES).map_err(fail("create bucket", "Quizzes"))?;
            txn.open_table(USERS_DICTIONARIES)
                .map_err(fail("create bucket", "UsersDictionaries"))?;
        }
        txn.commit().map_err(fail("open", &shown))?;

        tracing::debug!(path = %shown, "embedded storage opened");
        Ok(Self { db, path })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn read(&self, bucket: Bucket, op: &'static str, key: &str) -> Result<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(fail(op, key))?;
        let table = txn.open_table(bucket).map_err(fail(op, key))?;
        let value = table.get(key).map_err(fail(op, key))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn write(&self, bucket: Bucket, op: &'static str, key: &str, value: &[u8]) -> Result<()> {
        let txn = self.db.begin_write().map_err(fail(op, key))?;
        {
            let mut table = txn.open_table(bucket).map_err(fail(op, key))?;
            table.insert(key, value).map_err(fail(op, key))?;
        }
        txn.commit().map_err(fail(op, key))?;
        Ok(())
    }

    fn get_record<T: serde::de::DeserializeOwned>(
        &self,
        bucket: Bucket,
        op: &'static str,
        key: &str,
    ) -> Result<T> {
        let bytes = self.read(bucket, op, key)?.ok_or(WordbankError::NotFound)?;
        decode_record(key, &bytes)
    }
}

impl Storage for EmbeddedStorage {
    fn get(&self, word: &str) -> Result<DictionaryItem> {
        self.get_record(DICTIONARY, "get word", word)
    }

    fn save(&self, item: &DictionaryItem) -> Result<()> {
        let bytes = encode_record(&item.word, item)?;
        self.write(DICTIONARY, "save word", &item.word, &bytes)
    }

    fn get_user(&self, id: UserId) -> Result<User> {
        self.get_record(USERS, "get user", &id.to_string())
    }

    fn save_user(&self, user: &User) -> Result<()> {
        let key = user.id.to_string();
        let bytes = encode_record(&key, user)?;
        self.write(USERS, "save user", &key, &bytes)
    }

    fn get_user_item(&self, user: UserId, word: &str) -> Result<UserDictionaryItem> {
        let owner = user.to_string();
        let txn = self.db.begin_read().map_err(fail("get user item", word))?;
        let table = txn
            .open_table(USERS_DICTIONARIES)
            .map_err(fail("get user item", word))?;
        let guard = table
            .get((owner.as_str(), word))
            .map_err(fail("get user item", word))?
            .ok_or(WordbankError::NotFound)?;
        decode_record(word, guard.value())
    }

    fn save_user_item(&self, item: &UserDictionaryItem) -> Result<()> {
        let owner = item.user.to_string();
        let bytes = encode_record(&item.word, item)?;

        let txn = self.db.begin_write().map_err(fail("save user item", &item.word))?;
        {
            let mut table = txn
                .open_table(USERS_DICTIONARIES)
                .map_err(fail("save user item", &item.word))?;
            table
                .insert((owner.as_str(), item.word.as_str()), bytes.as_slice())
                .map_err(fail("save user item", &item.word))?;
        }
        txn.commit().map_err(fail("save user item", &item.word))?;
        Ok(())
    }

    fn get_user_dictionary(&self, user: UserId) -> Result<UserDictionary> {
        let owner = user.to_string();
        let op = "get user dictionary";

        let txn = self.db.begin_read().map_err(fail(op, &owner))?;
        let vocabulary = txn.open_table(USERS_DICTIONARIES).map_err(fail(op, &owner))?;
        let dictionary = txn.open_table(DICTIONARY).map_err(fail(op, &owner))?;

        let mut result = UserDictionary::new();
        for entry in vocabulary.range((owner.as_str(), "")..).map_err(fail(op, &owner))? {
            let (key, value) = entry.map_err(fail(op, &owner))?;
            let (entry_owner, word) = key.value();
            if entry_owner != owner {
                break;
            }

            let item: UserDictionaryItem = decode_record(word, value.value())?;
            let record = match dictionary.get(word).map_err(fail(op, word))? {
                Some(guard) => Some(decode_record::<DictionaryItem>(word, guard.value())?),
                None => None,
            };
            result.insert(word.to_string(), join_entry(item, record));
        }
        Ok(result)
    }

    fn save_quiz(&self, quiz: &Quiz) -> Result<()> {
        let bytes = encode_record(&quiz.id, quiz)?;
        self.write(QUIZZES, "save quiz", &quiz.id, &bytes)
    }

    fn get_quiz(&self, id: &str) -> Result<Quiz> {
        self.get_record(QUIZZES, "get quiz", id)
    }

    fn name(&self) -> &'static str {
        "embedded"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_storage() -> (TempDir, EmbeddedStorage) {
        let dir = TempDir::new().unwrap();
        let storage = EmbeddedStorage::open(dir.path().join("dict.redb")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_reopen_keeps_buckets_and_data() {
        let (dir, storage) = temp_storage();
        storage.save(&DictionaryItem::new("cat")).unwrap();
        drop(storage);

        let reopened = EmbeddedStorage::open(dir.path().join("dict.redb")).unwrap();
        assert_eq!(reopened.get("cat").unwrap(), DictionaryItem::new("cat"));
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dict.redb");
        let storage = EmbeddedStorage::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(storage.path(), path.as_path());
    }

    #[test]
    fn test_user_prefix_does_not_leak_into_neighbours() {
        let (_dir, storage) = temp_storage();
        storage.save_user_item(&UserDictionaryItem::new(UserId(4), "cat")).unwrap();
        storage.save_user_item(&UserDictionaryItem::new(UserId(42), "dog")).unwrap();
        storage.save_user_item(&UserDictionaryItem::new(UserId(420), "owl")).unwrap();

        let dict = storage.get_user_dictionary(UserId(42)).unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["dog"]);
    }

    #[test]
    fn test_corrupt_record_surfaces_serialization_error() {
        let (_dir, storage) = temp_storage();
        storage.write(DICTIONARY, "save word", "cat", b"{not json").unwrap();

        let err = storage.get("cat").unwrap_err();
        assert!(matches!(err, WordbankError::Serialization { .. }));
    }
}
