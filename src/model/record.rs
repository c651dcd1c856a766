//! Record encoding shared by the persistent backends.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, WordbankError};

/// Encode an entity as a JSON record
pub fn encode_record<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| WordbankError::serialization(key, e))
}

/// Decode a JSON record, failing hard on malformed bytes
pub fn decode_record<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| WordbankError::serialization(key, e))
}

/// Treat an explicit `null` like an absent field
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DictionaryItem, User, UserDictionaryItem, UserId};

    #[test]
    fn test_decode_legacy_dictionary_record() {
        let raw = br#"{"Word":"test","Phonetics":{"Text":"","Audio":""},"Meanings":null,"Translations":null}"#;
        let item: DictionaryItem = decode_record("word:test", raw).unwrap();
        assert_eq!(item, DictionaryItem::new("test"));
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let raw = br#"{"ID":1,"Username":"test","Language":"en","Karma":12}"#;
        let user: User = decode_record("user:1", raw).unwrap();
        assert_eq!(user.id, UserId(1));
        assert_eq!(user.username, "test");
        assert_eq!(user.config.quiz_type, None);
    }

    #[test]
    fn test_decode_user_item_without_last_quiz() {
        let raw = br#"{"Word":"cat","User":7,"Created":"2024-03-01T10:00:00Z","LastQuiz":null}"#;
        let item: UserDictionaryItem = decode_record("user_item:7", raw).unwrap();
        assert_eq!(item.user, UserId(7));
        assert!(item.last_quiz.is_none());
    }

    #[test]
    fn test_malformed_record_is_an_error() {
        let err = decode_record::<DictionaryItem>("word:test", b"NOT_JSON").unwrap_err();
        assert!(matches!(err, WordbankError::Serialization { .. }));
        assert!(!err.is_not_found());
    }
}
