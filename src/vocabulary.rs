//! Vocabulary workflows
//!
//! Caller-side helpers built only on the [`Storage`] trait: first contact
//! with a user, quiz type settings, and adding a word to a user's list.

use crate::error::{Result, WordbankError};
use crate::model::{DictionaryItem, QuizType, User, UserDictionaryItem, UserId};
use crate::storage::Storage;

/// Lowercase a user-typed word; multi-word input is rejected
pub fn normalize_word(text: &str) -> Result<String> {
    let word = text.trim().to_lowercase();
    if word.is_empty() || word.contains(char::is_whitespace) {
        return Err(WordbankError::InvalidWord(text.to_string()));
    }
    Ok(word)
}

/// Return the stored user, creating it on first contact
pub fn ensure_user(
    storage: &dyn Storage,
    id: UserId,
    username: &str,
    language: &str,
) -> Result<User> {
    match storage.get_user(id) {
        Ok(user) => Ok(user),
        Err(WordbankError::NotFound) => {
            let user = User {
                username: username.to_string(),
                language: language.to_string(),
                ..User::new(id)
            };
            storage.save_user(&user)?;
            tracing::debug!(user = %id, "user created");
            Ok(user)
        }
        Err(e) => Err(e),
    }
}

/// Persist a new quiz type for `user`
pub fn set_quiz_type(storage: &dyn Storage, user: &mut User, quiz_type: QuizType) -> Result<()> {
    let previous = user.config.quiz_type.replace(quiz_type);
    if let Err(e) = storage.save_user(user) {
        user.config.quiz_type = previous;
        return Err(e);
    }
    Ok(())
}

/// Add `item` to the user's vocabulary
///
/// The dictionary record is saved only if the word is not stored yet; the
/// membership record is created only if absent, so an existing `created`
/// and `last_quiz` survive.
pub fn remember_word(
    storage: &dyn Storage,
    user: UserId,
    item: &DictionaryItem,
) -> Result<UserDictionaryItem> {
    match storage.get(&item.word) {
        Ok(_) => {}
        Err(WordbankError::NotFound) => storage.save(item)?,
        Err(e) => return Err(e),
    }

    match storage.get_user_item(user, &item.word) {
        Ok(existing) => Ok(existing),
        Err(WordbankError::NotFound) => {
            let membership = UserDictionaryItem::new(user, item.word.clone());
            storage.save_user_item(&membership)?;
            tracing::debug!(user = %user, word = %item.word, "word added to vocabulary");
            Ok(membership)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("  Cat ").unwrap(), "cat");
        assert!(matches!(normalize_word("black cat"), Err(WordbankError::InvalidWord(_))));
        assert!(normalize_word("   ").is_err());
    }

    #[test]
    fn test_ensure_user_keeps_existing_record() {
        let storage = MemoryStorage::new();
        let mut user = ensure_user(&storage, UserId(7), "alice", "en").unwrap();
        set_quiz_type(&storage, &mut user, QuizType::Meanings).unwrap();

        let again = ensure_user(&storage, UserId(7), "renamed", "de").unwrap();
        assert_eq!(again.username, "alice");
        assert_eq!(again.quiz_type(), QuizType::Meanings);
    }

    #[test]
    fn test_remember_word_is_create_if_absent() {
        let storage = MemoryStorage::new();
        let first = remember_word(&storage, UserId(1), &DictionaryItem::new("cat")).unwrap();

        let mut replacement = DictionaryItem::new("cat");
        replacement.phonetics.text = "kæt".to_string();
        let second = remember_word(&storage, UserId(1), &replacement).unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.get("cat").unwrap().phonetics.text, "");
    }
}
