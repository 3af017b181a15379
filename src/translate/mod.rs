pub mod deepl;
pub mod recipes;
pub mod ui;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub use deepl::{DeepLClient, DeepLConfig, QuotaLevel, Usage};
pub use recipes::{RecipeTranslator, TranslationOutcome};
pub use ui::{verify_language_files, UiFileReport, UiFileStatus, UiOutcome, UiTranslator};

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("DEEPL_API_KEY is not set")]
    MissingApiKey,
    #[error("DeepL quota exceeded")]
    QuotaExceeded,
    #[error("DeepL rejected the API key")]
    Unauthorized,
    #[error("DeepL answered with status {0}")]
    Status(u16),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Format(String),
}

/// A site language, held as the lowercase code used in file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_lowercase())
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn deepl_code(&self) -> String {
        self.0.to_uppercase()
    }

    /// Parses a comma separated list such as `"en,es,fr"`.
    pub fn parse_list(list: &str) -> Vec<Language> {
        list.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(Language::new)
            .collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// German source text in, target language out.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: &Language) -> Result<String, TranslateError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_list() {
        let languages = Language::parse_list(" en, ES ,,zh");
        assert_eq!(languages.len(), 3);
        assert_eq!(languages[1].code(), "es");
        assert_eq!(languages[2].deepl_code(), "ZH");
    }
}
