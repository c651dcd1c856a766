//! Word selection
//!
//! Picks the quiz subject from a user's dictionary, biased toward words that
//! have gone longest without a correct answer.
//!
//! ## Weights
//! ```text
//!   never answered correctly ........ 100
//!   answered at t ................... floor((max - t) / (max - min) * 100), at least 1
//!   all answered at the same instant  1
//! ```
//! With no answered candidate at all the pick is uniform.

use chrono::TimeDelta;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::{Result, WordbankError};
use crate::model::{DictionaryItem, QuizType};
use crate::storage::{UserDictionary, UserEntry};

/// Weight of a word that was never answered correctly
pub const UNQUIZZED_WEIGHT: u32 = 100;

/// Can `item` be the subject (or a distractor) of a quiz of this type?
pub fn is_eligible(item: &DictionaryItem, quiz_type: QuizType, language: &str) -> bool {
    match quiz_type {
        QuizType::Translations | QuizType::ReverseTranslations => item.has_translation_in(language),
        QuizType::Meanings => !item.meanings.is_empty(),
    }
}

/// Entries of `dictionary` eligible for the quiz type, in word order
pub fn eligible_entries<'a>(
    dictionary: &'a UserDictionary,
    quiz_type: QuizType,
    language: &str,
) -> Vec<&'a UserEntry> {
    dictionary
        .values()
        .filter(|entry| is_eligible(&entry.dictionary, quiz_type, language))
        .collect()
}

/// Recency weights, one per candidate
pub fn weights(candidates: &[&UserEntry]) -> Vec<u32> {
    let stamps = candidates.iter().filter_map(|e| e.item.last_quiz);
    let (min, max) = match (stamps.clone().min(), stamps.max()) {
        (Some(min), Some(max)) => (min, max),
        _ => return vec![UNQUIZZED_WEIGHT; candidates.len()],
    };
    let range = nanos(max - min);

    candidates
        .iter()
        .map(|entry| match entry.item.last_quiz {
            None => UNQUIZZED_WEIGHT,
            Some(_) if range <= 0.0 => 1,
            Some(t) => {
                let age = nanos(max - t);
                ((age / range * 100.0).floor() as u32).max(1)
            }
        })
        .collect()
}

/// Span in nanoseconds, degrading to coarser units past ~292 years
fn nanos(span: TimeDelta) -> f64 {
    match (span.num_nanoseconds(), span.num_microseconds()) {
        (Some(ns), _) => ns as f64,
        (None, Some(us)) => us as f64 * 1e3,
        (None, None) => span.num_milliseconds() as f64 * 1e6,
    }
}

/// Pick the quiz subject
///
/// `EmptyDictionary` when the user has no words, `NotEnoughWords` when none
/// of them is eligible.
pub fn select_word<'a, R: Rng + ?Sized>(
    dictionary: &'a UserDictionary,
    quiz_type: QuizType,
    language: &str,
    rng: &mut R,
) -> Result<&'a UserEntry> {
    if dictionary.is_empty() {
        return Err(WordbankError::EmptyDictionary);
    }

    let candidates = eligible_entries(dictionary, quiz_type, language);
    if candidates.is_empty() {
        return Err(WordbankError::NotEnoughWords {
            needed: 1,
            available: 0,
        });
    }

    if candidates.iter().all(|e| e.item.last_quiz.is_none()) {
        return Ok(candidates[rng.gen_range(0..candidates.len())]);
    }

    let index = WeightedIndex::new(weights(&candidates))
        .map_err(|e| WordbankError::Config(format!("invalid selection weights: {}", e)))?;
    Ok(candidates[index.sample(rng)])
}
