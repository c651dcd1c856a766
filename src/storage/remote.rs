//! Networked key-value backend
//!
//! Records live on a RESP server (Redis or the bundled server) under flat,
//! prefixed keys; a user's vocabulary is one hash.
//!
//! ## Key Layout
//! ```text
//! word:<word>          string  → DictionaryItem
//! user:<id>            string  → User
//! quiz:<id>            string  → Quiz
//! user_item:<id>       hash    word → UserDictionaryItem
//! ```
//!
//! `get_user_dictionary` is two round trips: `HGETALL user_item:<id>`, then
//! one `MGET` of every referenced `word:` key. A writer may land between
//! them; the join tolerates a word whose record is missing.

use crate::config::Config;
use crate::error::{Result, WordbankError};
use crate::model::{decode_record, encode_record, DictionaryItem, Quiz, User, UserDictionaryItem, UserId};
use crate::network::KvClient;

use super::{join_entry, Storage, UserDictionary};

const WORD_PREFIX: &str = "word:";
const USER_PREFIX: &str = "user:";
const USER_ITEM_PREFIX: &str = "user_item:";
const QUIZ_PREFIX: &str = "quiz:";

/// Storage on a remote RESP server
pub struct RemoteStorage {
    client: KvClient,
}

impl RemoteStorage {
    /// Connect to the server at `addr` using the pool and timeouts of `config`
    pub fn connect(addr: &str, config: &Config) -> Result<Self> {
        Ok(Self::with_client(KvClient::connect(addr, config)?))
    }

    pub fn with_client(client: KvClient) -> Self {
        Self { client }
    }

    /// Underlying client, for inspection and raw access
    pub fn client(&self) -> &KvClient {
        &self.client
    }

    fn get_string<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T> {
        let bytes = self.client.get(key)?.ok_or(WordbankError::NotFound)?;
        decode_record(key, &bytes)
    }

    fn set_string<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = encode_record(key, value)?;
        self.client.set(key, bytes)
    }
}

impl Storage for RemoteStorage {
    fn get(&self, word: &str) -> Result<DictionaryItem> {
        self.get_string(&format!("{}{}", WORD_PREFIX, word))
    }

    fn save(&self, item: &DictionaryItem) -> Result<()> {
        self.set_string(&format!("{}{}", WORD_PREFIX, item.word), item)
    }

    fn get_user(&self, id: UserId) -> Result<User> {
        self.get_string(&format!("{}{}", USER_PREFIX, id))
    }

    fn save_user(&self, user: &User) -> Result<()> {
        self.set_string(&format!("{}{}", USER_PREFIX, user.id), user)
    }

    fn get_user_item(&self, user: UserId, word: &str) -> Result<UserDictionaryItem> {
        let key = format!("{}{}", USER_ITEM_PREFIX, user);
        let bytes = self.client.hget(&key, word)?.ok_or(WordbankError::NotFound)?;
        decode_record(word, &bytes)
    }

    fn save_user_item(&self, item: &UserDictionaryItem) -> Result<()> {
        let key = format!("{}{}", USER_ITEM_PREFIX, item.user);
        let bytes = encode_record(&item.word, item)?;
        self.client.hset(&key, &item.word, bytes)?;
        Ok(())
    }

    fn get_user_dictionary(&self, user: UserId) -> Result<UserDictionary> {
        let fields = self.client.hgetall(&format!("{}{}", USER_ITEM_PREFIX, user))?;
        if fields.is_empty() {
            return Ok(UserDictionary::new());
        }

        let mut items = Vec::with_capacity(fields.len());
        for (word, bytes) in &fields {
            items.push(decode_record::<UserDictionaryItem>(word, bytes)?);
        }

        let keys: Vec<String> = fields
            .iter()
            .map(|(word, _)| format!("{}{}", WORD_PREFIX, word))
            .collect();
        let records = self.client.mget(&keys)?;

        // Entries are filed under the hash field, the same key MGET fetched
        let mut result = UserDictionary::new();
        for (((word, _), item), (key, record)) in fields.iter().zip(items).zip(keys.iter().zip(records)) {
            let dictionary = match record {
                Some(bytes) => Some(decode_record::<DictionaryItem>(key, &bytes)?),
                None => None,
            };
            result.insert(word.clone(), join_entry(item, dictionary));
        }
        Ok(result)
    }

    fn save_quiz(&self, quiz: &Quiz) -> Result<()> {
        self.set_string(&format!("{}{}", QUIZ_PREFIX, quiz.id), quiz)
    }

    fn get_quiz(&self, id: &str) -> Result<Quiz> {
        self.get_string(&format!("{}{}", QUIZ_PREFIX, id))
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
