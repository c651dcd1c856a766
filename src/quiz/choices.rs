//! Choice assembly
//!
//! Distractors come from the other eligible words of the same dictionary.
//! The final list holds `count` items, exactly one correct, sorted by word.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Result, WordbankError};
use crate::model::{DictionaryItem, QuizItem, QuizType};
use crate::storage::{UserDictionary, UserEntry};

use super::selection::is_eligible;

/// Separator between several translations of one word
const TRANSLATION_SEPARATOR: &str = ", ";

/// Text shown for a choice
pub fn choice_text(item: &DictionaryItem, quiz_type: QuizType, language: &str) -> String {
    match quiz_type {
        QuizType::Translations => joined_translations(item, language),
        QuizType::ReverseTranslations => item.word.clone(),
        QuizType::Meanings => item
            .meanings
            .first()
            .map(|m| m.definition.clone())
            .unwrap_or_default(),
    }
}

/// Prompt shown for the quiz subject
pub fn display_word(item: &DictionaryItem, quiz_type: QuizType, language: &str) -> String {
    match quiz_type {
        QuizType::ReverseTranslations => joined_translations(item, language),
        QuizType::Translations | QuizType::Meanings => item.word.clone(),
    }
}

fn joined_translations(item: &DictionaryItem, language: &str) -> String {
    item.translations_in(language)
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(TRANSLATION_SEPARATOR)
}

/// Build `count` choices around `subject`
///
/// Fails with `NotEnoughWords` when fewer than `count - 1` distractors exist.
pub fn build_choices<R: Rng + ?Sized>(
    dictionary: &UserDictionary,
    subject: &UserEntry,
    quiz_type: QuizType,
    language: &str,
    count: usize,
    rng: &mut R,
) -> Result<Vec<QuizItem>> {
    let needed = count.saturating_sub(1);
    let mut pool: Vec<&DictionaryItem> = dictionary
        .values()
        .map(|entry| &entry.dictionary)
        .filter(|item| item.word != subject.dictionary.word)
        .filter(|item| is_eligible(item, quiz_type, language))
        .collect();

    if pool.len() < needed {
        return Err(WordbankError::NotEnoughWords {
            needed,
            available: pool.len(),
        });
    }

    pool.shuffle(rng);
    let mut choices: Vec<QuizItem> = pool
        .into_iter()
        .take(needed)
        .map(|item| QuizItem {
            word: item.word.clone(),
            text: choice_text(item, quiz_type, language),
            correct: false,
        })
        .collect();

    choices.push(QuizItem {
        word: subject.dictionary.word.clone(),
        text: choice_text(&subject.dictionary, quiz_type, language),
        correct: true,
    });
    choices.sort_by(|a, b| a.word.cmp(&b.word));
    Ok(choices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Meaning, Translation};

    fn item_with_translations(word: &str, texts: &[&str]) -> DictionaryItem {
        let mut item = DictionaryItem::new(word);
        for text in texts {
            item.translations.push(Translation {
                text: text.to_string(),
                language: "ru".to_string(),
                ..Default::default()
            });
        }
        item.translations.push(Translation {
            text: "ignored".to_string(),
            language: "de".to_string(),
            ..Default::default()
        });
        item
    }

    #[test]
    fn test_choice_text_per_type() {
        let mut item = item_with_translations("cat", &["кот", "кошка"]);
        item.meanings.push(Meaning {
            definition: "a small feline".to_string(),
            ..Default::default()
        });

        assert_eq!(choice_text(&item, QuizType::Translations, "ru"), "кот, кошка");
        assert_eq!(choice_text(&item, QuizType::ReverseTranslations, "ru"), "cat");
        assert_eq!(choice_text(&item, QuizType::Meanings, "ru"), "a small feline");
    }

    #[test]
    fn test_display_word_reverse_shows_translations() {
        let item = item_with_translations("cat", &["кот"]);
        assert_eq!(display_word(&item, QuizType::ReverseTranslations, "ru"), "кот");
        assert_eq!(display_word(&item, QuizType::Translations, "ru"), "cat");
    }
}
