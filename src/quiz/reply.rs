//! Quiz reply tokens
//!
//! Compact `<kind>|<quiz id>|<choice index>` token carried by a chat button,
//! e.g. `qr|Vh3c0yV9QlqZ6bYxq3mP1g|2`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WordbankError};

/// Token kind of a quiz answer
pub const QUIZ_REPLY_KIND: &str = "qr";

const SEPARATOR: char = '|';

/// A parsed answer to a quiz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReply {
    pub quiz_id: String,
    pub choice: usize,
}

impl QuizReply {
    pub fn new(quiz_id: impl Into<String>, choice: usize) -> Self {
        Self {
            quiz_id: quiz_id.into(),
            choice,
        }
    }

    /// Does `token` look like a quiz reply at all?
    pub fn matches(token: &str) -> bool {
        token
            .strip_prefix(QUIZ_REPLY_KIND)
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }
}

impl FromStr for QuizReply {
    type Err = WordbankError;

    fn from_str(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split(SEPARATOR).collect();
        let [kind, quiz_id, choice] = parts.as_slice() else {
            return Err(WordbankError::InvalidReply(format!(
                "expected 3 fields, got {}",
                parts.len()
            )));
        };

        if *kind != QUIZ_REPLY_KIND {
            return Err(WordbankError::InvalidReply(format!("unknown kind '{}'", kind)));
        }
        if quiz_id.is_empty() {
            return Err(WordbankError::InvalidReply("empty quiz id".to_string()));
        }
        let choice = choice
            .parse::<usize>()
            .map_err(|_| WordbankError::InvalidReply(format!("bad choice index '{}'", choice)))?;

        Ok(QuizReply::new(*quiz_id, choice))
    }
}

impl fmt::Display for QuizReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            QUIZ_REPLY_KIND, SEPARATOR, self.quiz_id, SEPARATOR, self.choice
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let reply: QuizReply = "qr|abc|2".parse().unwrap();
        assert_eq!(reply, QuizReply::new("abc", 2));
        assert_eq!(reply.to_string(), "qr|abc|2");
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        for token in ["qr|abc", "qr|abc|1|2", "xx|abc|1", "qr||1", "qr|abc|-1", "qr|abc|one", ""] {
            let err = token.parse::<QuizReply>().unwrap_err();
            assert!(matches!(err, WordbankError::InvalidReply(_)), "{}", token);
        }
    }

    #[test]
    fn test_matches_prefix() {
        assert!(QuizReply::matches("qr|abc|0"));
        assert!(!QuizReply::matches("qrx|abc|0"));
        assert!(!QuizReply::matches("settings"));
    }
}
