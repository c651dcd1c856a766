//! Quiz scoring
//!
//! ```text
//!   Created ──set_result(valid choice)──► Answered (terminal)
//! ```
//! The answered quiz is persisted first; only then, and only for a correct
//! answer, the user's vocabulary record gets its `last_quiz` stamp. The two
//! writes are separate storage calls.

use chrono::Utc;

use crate::error::{Result, WordbankError};
use crate::model::{Quiz, QuizResult};
use crate::storage::Storage;

impl Quiz {
    /// Record the answer `choice` and persist it
    ///
    /// `InvalidChoice` and `AlreadyAnswered` leave the quiz untouched. If
    /// saving the quiz fails the in-memory result is rolled back.
    pub fn set_result(&mut self, choice: usize, storage: &dyn Storage) -> Result<()> {
        if choice >= self.choices.len() {
            return Err(WordbankError::InvalidChoice {
                choice,
                choices: self.choices.len(),
            });
        }
        if self.result.is_some() {
            return Err(WordbankError::AlreadyAnswered);
        }

        let correct = self.choices[choice].correct;
        self.result = Some(QuizResult { choice, correct });

        if let Err(e) = storage.save_quiz(self) {
            self.result = None;
            return Err(e);
        }

        if correct {
            let mut item = storage.get_user_item(self.user, &self.word)?;
            let now = Utc::now();
            item.last_quiz = Some(item.last_quiz.map_or(now, |prev| prev.max(now)));
            storage.save_user_item(&item)?;
        }

        tracing::debug!(quiz = %self.id, choice, correct, "quiz answered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuizItem, QuizType, UserDictionaryItem, UserId};
    use crate::storage::MemoryStorage;

    fn quiz() -> Quiz {
        let choices = vec![
            QuizItem {
                word: "cat".to_string(),
                text: "кот".to_string(),
                correct: true,
            },
            QuizItem {
                word: "dog".to_string(),
                text: "собака".to_string(),
                correct: false,
            },
        ];
        Quiz::new(UserId(1), "cat", "cat", "ru", QuizType::Translations, choices)
    }

    #[test]
    fn test_invalid_choice_leaves_quiz_untouched() {
        let storage = MemoryStorage::new();
        let mut quiz = quiz();
        let err = quiz.set_result(2, &storage).unwrap_err();
        assert!(matches!(err, WordbankError::InvalidChoice { choice: 2, choices: 2 }));
        assert!(quiz.result.is_none());
        assert!(storage.get_quiz(&quiz.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_correct_answer_requires_membership_record() {
        let storage = MemoryStorage::new();
        let mut quiz = quiz();
        let err = quiz.set_result(0, &storage).unwrap_err();
        assert!(err.is_not_found());

        // The answer itself was already persisted
        assert!(storage.get_quiz(&quiz.id).unwrap().is_answered());
    }

    #[test]
    fn test_last_quiz_never_moves_backwards() {
        let storage = MemoryStorage::new();
        let mut item = UserDictionaryItem::new(UserId(1), "cat");
        let future = Utc::now() + chrono::Duration::days(1);
        item.last_quiz = Some(future);
        storage.save_user_item(&item).unwrap();

        let mut quiz = quiz();
        quiz.set_result(0, &storage).unwrap();
        let stored = storage.get_user_item(UserId(1), "cat").unwrap();
        assert_eq!(stored.last_quiz, Some(future));
    }
}
