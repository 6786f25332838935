use std::sync::Arc;

use tracing::{debug, warn};

use crate::providers::TranslationProvider;

const TARGET_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    Unchanged(String),
    Translated(String),
    Degraded { text: String, error: String },
}

impl TranslationOutcome {
    pub fn text(&self) -> &str {
        match self {
            TranslationOutcome::Unchanged(text)
            | TranslationOutcome::Translated(text)
            | TranslationOutcome::Degraded { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            TranslationOutcome::Unchanged(text)
            | TranslationOutcome::Translated(text)
            | TranslationOutcome::Degraded { text, .. } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TranslationOutcome::Degraded { .. })
    }
}

#[derive(Clone)]
pub struct Translator {
    provider: Arc<dyn TranslationProvider>,
}

impl Translator {
    pub fn new(provider: Arc<dyn TranslationProvider>) -> Self {
        Self { provider }
    }

    pub async fn to_english(&self, text: &str, source_language: &str) -> TranslationOutcome {
        if is_english(source_language) {
            return TranslationOutcome::Unchanged(text.to_string());
        }

        let source_code = provider_code(source_language);
        match self
            .provider
            .translate(text, &source_code, TARGET_LANGUAGE)
            .await
        {
            Ok(translated) => {
                debug!(source = %source_code, "translated complaint text");
                TranslationOutcome::Translated(translated)
            }
            Err(err) => {
                warn!(
                    provider = "translation",
                    operation = "to_english",
                    source = %source_code,
                    error = %err,
                    "translation failed; keeping original text"
                );
                TranslationOutcome::Degraded {
                    text: text.to_string(),
                    error: err.to_string(),
                }
            }
        }
    }
}

fn is_english(language: &str) -> bool {
    let language = language.trim();
    language.eq_ignore_ascii_case("english") || language.eq_ignore_ascii_case("en")
}

fn provider_code(language: &str) -> String {
    let code = match language.trim() {
        "Hindi" => "hi",
        "Kannada" => "kn",
        "Tamil" => "ta",
        "Telugu" => "te",
        "Malayalam" => "ml",
        other => return other.to_lowercase(),
    };
    code.to_string()
}
