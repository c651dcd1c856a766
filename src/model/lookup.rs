//! Lookup payloads
//!
//! Shapes produced by the external dictionary and translation collaborators,
//! and the assembly of a [`DictionaryItem`] from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DictionaryItem, Meaning, Translation};
use super::record::nullable;

// =============================================================================
// Dictionary lookup (free-dictionary style)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WordResponse {
    pub word: String,
    pub phonetic: String,
    #[serde(deserialize_with = "nullable")]
    pub phonetics: Vec<LookupPhonetic>,
    pub origin: String,
    #[serde(deserialize_with = "nullable")]
    pub meanings: Vec<LookupMeaning>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupPhonetic {
    pub text: String,
    #[serde(alias = "Audio")]
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupMeaning {
    #[serde(rename = "partOfSpeech")]
    pub part_of_speech: String,
    #[serde(deserialize_with = "nullable")]
    pub definitions: Vec<LookupDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupDefinition {
    pub definition: String,
    pub example: String,
    #[serde(deserialize_with = "nullable")]
    pub synonyms: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub antonyms: Vec<String>,
}

// =============================================================================
// Translation lookup
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationResponse {
    #[serde(rename = "def", deserialize_with = "nullable")]
    pub definitions: Vec<TranslationDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationDefinition {
    pub text: String,
    #[serde(rename = "pos")]
    pub part_of_speech: String,
    #[serde(rename = "tr", deserialize_with = "nullable")]
    pub translations: Vec<TranslationVariant>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationVariant {
    pub text: String,
    #[serde(rename = "pos")]
    pub part_of_speech: String,
}

// =============================================================================
// Assembly
// =============================================================================

impl DictionaryItem {
    /// Build an item from lookup responses
    ///
    /// Phonetics only come from responses for the same word: the response
    /// `phonetic` is preferred, then the first phonetic entry's text, and the
    /// first entry carrying audio supplies audio together with its own text.
    /// Every definition becomes one meaning; every translation variant becomes
    /// one translation tagged with its language.
    pub fn from_lookups(
        word: &str,
        responses: &[WordResponse],
        translations: &BTreeMap<String, TranslationResponse>,
    ) -> Self {
        let mut item = DictionaryItem::new(word);
        let mut text = String::new();
        let mut audio = String::new();

        for response in responses {
            if (text.is_empty() || audio.is_empty()) && response.word == word {
                if text.is_empty() {
                    text = response.phonetic.clone();
                }
                for phonetic in &response.phonetics {
                    if text.is_empty() {
                        text = phonetic.text.clone();
                    }
                    if audio.is_empty() {
                        if let Some(a) = phonetic.audio.as_deref().filter(|a| !a.is_empty()) {
                            text = phonetic.text.clone();
                            audio = a.to_string();
                        }
                    }
                }
            }
            for meaning in &response.meanings {
                for definition in &meaning.definitions {
                    item.meanings.push(Meaning {
                        part_of_speech: meaning.part_of_speech.clone(),
                        definition: definition.definition.clone(),
                        examples: if definition.example.is_empty() {
                            Vec::new()
                        } else {
                            vec![definition.example.clone()]
                        },
                        synonyms: definition.synonyms.clone(),
                        antonyms: definition.antonyms.clone(),
                    });
                }
            }
        }
        item.phonetics.text = text;
        item.phonetics.audio = audio;

        for (language, response) in translations {
            for definition in &response.definitions {
                for variant in &definition.translations {
                    item.translations.push(Translation {
                        text: variant.text.clone(),
                        audio: String::new(),
                        language: language.clone(),
                        part_of_speech: definition.part_of_speech.clone(),
                    });
                }
            }
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses() -> Vec<WordResponse> {
        let raw = r#"[
            {"word":"test","phonetic":"phon1","phonetics":[{"text":"phon_in1","audio":"phon_audio1"}],
             "meanings":[{"partOfSpeech":"pos1","definitions":[{"definition":"def11","example":"ex11","synonyms":["syn111"],"antonyms":[]}]},
                         {"partOfSpeech":"pos2","definitions":[{"definition":"def12","example":"","synonyms":[],"antonyms":["an121"]}]}]},
            {"word":"test","phonetic":"phon2","phonetics":[{"text":"phon_in2","audio":"phon_audio2"}],
             "meanings":[{"partOfSpeech":"pos1","definitions":[{"definition":"def21","example":"ex21","synonyms":null,"antonyms":null}]}]}
        ]"#;
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_from_lookups_full() {
        let mut translations = BTreeMap::new();
        translations.insert(
            "ru".to_string(),
            serde_json::from_str::<TranslationResponse>(
                r#"{"def":[{"text":"test","pos":"noun","tr":[{"text":"тест","pos":"noun"},{"text":"проверка","pos":"noun"}]}]}"#,
            )
            .unwrap(),
        );

        let item = DictionaryItem::from_lookups("test", &responses(), &translations);

        assert_eq!(item.phonetics.text, "phon_in1");
        assert_eq!(item.phonetics.audio, "phon_audio1");
        assert_eq!(item.meanings.len(), 3);
        assert_eq!(item.meanings[0].examples, vec!["ex11".to_string()]);
        assert!(item.meanings[1].examples.is_empty());
        assert_eq!(item.meanings[2].definition, "def21");
        assert_eq!(item.translations.len(), 2);
        assert!(item.translations.iter().all(|t| t.language == "ru" && t.part_of_speech == "noun"));
    }

    #[test]
    fn test_from_lookups_falls_through_to_second_audio() {
        let mut responses = responses();
        responses[0].phonetics[0].audio = None;

        let item = DictionaryItem::from_lookups("test", &responses, &BTreeMap::new());

        assert_eq!(item.phonetics.text, "phon_in2");
        assert_eq!(item.phonetics.audio, "phon_audio2");
    }

    #[test]
    fn test_from_lookups_empty() {
        let item = DictionaryItem::from_lookups("test", &[], &BTreeMap::new());
        assert_eq!(item, DictionaryItem::new("test"));
    }
}
