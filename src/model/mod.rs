//! Domain Model
//!
//! Value entities shared by every backend and by the quiz engine.
//!
//! ## Record Encoding
//! Entities serialize as field-named JSON records. Field names follow the
//! PascalCase layout already present in existing stores (`Word`, `LastQuiz`,
//! `DisplayWord`, ...), `null` is accepted wherever a list is expected, and
//! unknown fields are ignored so additive schema changes stay readable.

mod lookup;
mod record;

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WordbankError};

pub use lookup::{
    LookupDefinition, LookupMeaning, LookupPhonetic, TranslationDefinition, TranslationResponse,
    TranslationVariant, WordResponse,
};
pub use record::{decode_record, encode_record};

use record::nullable;

// =============================================================================
// Identifiers
// =============================================================================

/// Chat platform user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId(id)
    }
}

/// Generate a quiz ID: 128 random bits, URL-safe base64 without padding.
///
/// Uniqueness is probabilistic, nothing coordinates between writers.
pub fn generate_id() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}

// =============================================================================
// Dictionary
// =============================================================================

/// Canonical stored definition of a word
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DictionaryItem {
    pub word: String,
    pub phonetics: Phonetics,
    #[serde(deserialize_with = "nullable")]
    pub meanings: Vec<Meaning>,
    #[serde(deserialize_with = "nullable")]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Phonetics {
    pub text: String,
    pub audio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Meaning {
    pub part_of_speech: String,
    pub definition: String,
    #[serde(deserialize_with = "nullable")]
    pub examples: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub synonyms: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub antonyms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Translation {
    pub text: String,
    pub audio: String,
    pub language: String,
    pub part_of_speech: String,
}

impl DictionaryItem {
    /// An item carrying only its word
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            ..Default::default()
        }
    }

    /// Translations tagged with `language`
    pub fn translations_in<'a>(&'a self, language: &'a str) -> impl Iterator<Item = &'a Translation> + 'a {
        self.translations.iter().filter(move |t| t.language == language)
    }

    pub fn has_translation_in(&self, language: &str) -> bool {
        self.translations_in(language).next().is_some()
    }
}

// =============================================================================
// Users
// =============================================================================

/// A chat user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: UserId,
    pub is_admin: bool,
    pub username: String,
    pub language: String,
    pub config: UserConfig,
}

/// Per-user settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserConfig {
    pub quiz_type: Option<QuizType>,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Configured quiz type, falling back to the default
    pub fn quiz_type(&self) -> QuizType {
        self.config.quiz_type.unwrap_or_default()
    }
}

/// Membership of a word in a user's vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDictionaryItem {
    pub word: String,
    pub user: UserId,
    pub created: DateTime<Utc>,
    /// Set on the first correct answer, `None` until then
    #[serde(default)]
    pub last_quiz: Option<DateTime<Utc>>,
}

impl UserDictionaryItem {
    pub fn new(user: UserId, word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            user,
            created: Utc::now(),
            last_quiz: None,
        }
    }
}

// =============================================================================
// Quizzes
// =============================================================================

/// Kind of recall test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuizType {
    /// Word shown, pick its translation
    #[default]
    #[serde(rename = "translations")]
    Translations,

    /// Translation shown, pick the word
    #[serde(rename = "rTranslations")]
    ReverseTranslations,

    /// Word shown, pick its definition
    #[serde(rename = "meanings")]
    Meanings,
}

impl QuizType {
    pub const ALL: [QuizType; 3] = [
        QuizType::Translations,
        QuizType::ReverseTranslations,
        QuizType::Meanings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizType::Translations => "translations",
            QuizType::ReverseTranslations => "rTranslations",
            QuizType::Meanings => "meanings",
        }
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizType {
    type Err = WordbankError;

    fn from_str(s: &str) -> Result<Self> {
        QuizType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WordbankError::Config(format!("unknown quiz type '{}'", s)))
    }
}

/// One candidate choice
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct QuizItem {
    pub word: String,
    pub text: String,
    pub correct: bool,
}

/// The recorded answer of a quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuizResult {
    pub choice: usize,
    pub correct: bool,
}

/// One multiple-choice recall test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Quiz {
    #[serde(rename = "ID")]
    pub id: String,
    pub user: UserId,
    pub word: String,
    #[serde(default)]
    pub display_word: String,
    #[serde(default)]
    pub language: String,
    #[serde(rename = "Type", default)]
    pub quiz_type: QuizType,
    #[serde(default, deserialize_with = "nullable")]
    pub choices: Vec<QuizItem>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub result: Option<QuizResult>,
}

impl Quiz {
    /// A fresh, unanswered quiz with a generated ID
    pub fn new(
        user: UserId,
        word: impl Into<String>,
        display_word: impl Into<String>,
        language: impl Into<String>,
        quiz_type: QuizType,
        choices: Vec<QuizItem>,
    ) -> Self {
        Self {
            id: generate_id(),
            user,
            word: word.into(),
            display_word: display_word.into(),
            language: language.into(),
            quiz_type,
            choices,
            created: Utc::now(),
            result: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.result.is_some()
    }

    /// Index of the correct choice
    pub fn correct_index(&self) -> Option<usize> {
        self.choices.iter().position(|c| c.correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_is_compact_and_url_safe() {
        let id = generate_id();
        assert_eq!(id.len(), 22);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(id, generate_id());
    }

    #[test]
    fn test_quiz_type_names() {
        for t in QuizType::ALL {
            assert_eq!(t.as_str().parse::<QuizType>().unwrap(), t);
        }
        assert!("reverse".parse::<QuizType>().is_err());
        assert_eq!(User::new(UserId(1)).quiz_type(), QuizType::Translations);
    }

    #[test]
    fn test_translations_in_filters_language() {
        let mut item = DictionaryItem::new("cat");
        item.translations.push(Translation {
            text: "кот".into(),
            language: "ru".into(),
            ..Default::default()
        });
        item.translations.push(Translation {
            text: "chat".into(),
            language: "fr".into(),
            ..Default::default()
        });
        assert!(item.has_translation_in("ru"));
        assert!(!item.has_translation_in("de"));
        assert_eq!(item.translations_in("fr").count(), 1);
    }
}
