use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};
use serde::{Deserialize, Serialize};

/// ISO 639-1 language codes supported by the TTS system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "pt")]
    Portuguese,
}

const SUPPORTED: [Language; 6] = [
    Language::English,
    Language::Spanish,
    Language::French,
    Language::German,
    Language::Italian,
    Language::Portuguese,
];

impl LanguageCode {
    /// Get the ISO 639-1 code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::English => "en",
            LanguageCode::Spanish => "es",
            LanguageCode::French => "fr",
            LanguageCode::German => "de",
            LanguageCode::Italian => "it",
            LanguageCode::Portuguese => "pt",
        }
    }

    /// Convert lingua Language to LanguageCode
    pub fn from_lingua(language: Language) -> Option<Self> {
        match language {
            Language::English => Some(LanguageCode::English),
            Language::Spanish => Some(LanguageCode::Spanish),
            Language::French => Some(LanguageCode::French),
            Language::German => Some(LanguageCode::German),
            Language::Italian => Some(LanguageCode::Italian),
            Language::Portuguese => Some(LanguageCode::Portuguese),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Language detection restricted to the languages we have voices for.
///
/// Building a lingua detector is expensive; construct one and share it.
pub struct LanguageGuesser {
    detector: LanguageDetector,
}

impl LanguageGuesser {
    pub fn new() -> Self {
        Self {
            detector: LanguageDetectorBuilder::from_languages(&SUPPORTED).build(),
        }
    }

    /// Detect the language of the given text, falling back to English
    pub fn detect(&self, text: &str) -> LanguageCode {
        match self
            .detector
            .detect_language_of(text)
            .and_then(LanguageCode::from_lingua)
        {
            Some(language) => language,
            None => {
                tracing::warn!("Could not detect language, falling back to English");
                LanguageCode::English
            }
        }
    }
}

impl Default for LanguageGuesser {
    fn default() -> Self {
        Self::new()
    }
}
