//! In-process backend
//!
//! Four maps behind a single RwLock. Each public method holds the guard for
//! its whole body, so calls are linearizable, but a read followed by a
//! conditional write across two calls can race with another writer.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Result, WordbankError};
use crate::model::{DictionaryItem, Quiz, User, UserDictionaryItem, UserId};

use super::{join_entry, Storage, UserDictionary};

#[derive(Default)]
struct Maps {
    dictionary: HashMap<String, DictionaryItem>,
    users: HashMap<UserId, User>,
    quizzes: HashMap<String, Quiz>,
    vocabularies: HashMap<UserId, HashMap<String, UserDictionaryItem>>,
}

/// Concurrent in-memory storage
#[derive(Default)]
pub struct MemoryStorage {
    maps: RwLock<Maps>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, word: &str) -> Result<DictionaryItem> {
        let maps = self.maps.read();
        maps.dictionary.get(word).cloned().ok_or(WordbankError::NotFound)
    }

    fn save(&self, item: &DictionaryItem) -> Result<()> {
        let mut maps = self.maps.write();
        maps.dictionary.insert(item.word.clone(), item.clone());
        Ok(())
    }

    fn get_user(&self, id: UserId) -> Result<User> {
        let maps = self.maps.read();
        maps.users.get(&id).cloned().ok_or(WordbankError::NotFound)
    }

    fn save_user(&self, user: &User) -> Result<()> {
        let mut maps = self.maps.write();
        maps.users.insert(user.id, user.clone());
        Ok(())
    }

    fn get_user_item(&self, user: UserId, word: &str) -> Result<UserDictionaryItem> {
        let maps = self.maps.read();
        maps.vocabularies
            .get(&user)
            .and_then(|words| words.get(word))
            .cloned()
            .ok_or(WordbankError::NotFound)
    }

    fn save_user_item(&self, item: &UserDictionaryItem) -> Result<()> {
        let mut maps = self.maps.write();
        maps.vocabularies
            .entry(item.user)
            .or_default()
            .insert(item.word.clone(), item.clone());
        Ok(())
    }

    fn get_user_dictionary(&self, user: UserId) -> Result<UserDictionary> {
        let maps = self.maps.read();
        let Some(words) = maps.vocabularies.get(&user) else {
            return Ok(UserDictionary::new());
        };
        Ok(words
            .iter()
            .map(|(word, item)| {
                let entry = join_entry(item.clone(), maps.dictionary.get(word).cloned());
                (word.clone(), entry)
            })
            .collect())
    }

    fn save_quiz(&self, quiz: &Quiz) -> Result<()> {
        let mut maps = self.maps.write();
        maps.quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(())
    }

    fn get_quiz(&self, id: &str) -> Result<Quiz> {
        let maps = self.maps.read();
        maps.quizzes.get(id).cloned().ok_or(WordbankError::NotFound)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
