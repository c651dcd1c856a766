//! Quiz engine
//!
//! Stateless facade tying selection, choice assembly and scoring to a
//! storage backend. Every call receives the user explicitly and reads fresh
//! state from storage.

use std::sync::Arc;

use rand::Rng;

use crate::config::Config;
use crate::error::{Result, WordbankError};
use crate::model::{Quiz, User, UserId};
use crate::storage::Storage;

use super::choices::{build_choices, display_word};
use super::reply::QuizReply;
use super::selection::select_word;

/// Parameters of generated quizzes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    /// Language translations are drawn from
    pub language: String,

    /// Choices per quiz, the correct one included
    pub choices: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        QuizSettings::from(&Config::default())
    }
}

impl From<&Config> for QuizSettings {
    fn from(config: &Config) -> Self {
        Self {
            language: config.quiz_language.clone(),
            choices: config.quiz_choices,
        }
    }
}

/// Generates and scores quizzes against one storage backend
#[derive(Clone)]
pub struct QuizEngine {
    storage: Arc<dyn Storage>,
    settings: QuizSettings,
}

impl QuizEngine {
    pub fn new(storage: Arc<dyn Storage>, settings: QuizSettings) -> Self {
        Self { storage, settings }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Generate and persist a quiz for `user`
    ///
    /// Nothing is written when generation fails.
    pub fn generate<R: Rng + ?Sized>(&self, user: &User, rng: &mut R) -> Result<Quiz> {
        let quiz_type = user.quiz_type();
        let language = self.settings.language.as_str();

        // Step 1: Fresh snapshot of the user's vocabulary
        let dictionary = self.storage.get_user_dictionary(user.id)?;

        // Step 2: Weighted pick of the subject
        let subject = select_word(&dictionary, quiz_type, language, rng)?;

        // Step 3: Distractors plus the correct choice
        let choices = build_choices(
            &dictionary,
            subject,
            quiz_type,
            language,
            self.settings.choices,
            rng,
        )?;

        // Step 4: Persist
        let quiz = Quiz::new(
            user.id,
            subject.dictionary.word.clone(),
            display_word(&subject.dictionary, quiz_type, language),
            language,
            quiz_type,
            choices,
        );
        self.storage.save_quiz(&quiz)?;

        tracing::debug!(
            user = %user.id,
            quiz = %quiz.id,
            word = %quiz.word,
            quiz_type = %quiz_type,
            "quiz generated"
        );
        Ok(quiz)
    }

    /// Answer quiz `quiz_id` on behalf of `user`
    pub fn answer(&self, user: UserId, quiz_id: &str, choice: usize) -> Result<Quiz> {
        let mut quiz = self.storage.get_quiz(quiz_id)?;
        if quiz.user != user {
            return Err(WordbankError::ForeignQuiz(quiz_id.to_string()));
        }
        quiz.set_result(choice, self.storage.as_ref())?;
        Ok(quiz)
    }

    /// Answer from a `qr|<quiz id>|<choice>` token
    pub fn answer_reply(&self, user: UserId, token: &str) -> Result<Quiz> {
        let reply: QuizReply = token.parse()?;
        self.answer(user, &reply.quiz_id, reply.choice)
    }
}
