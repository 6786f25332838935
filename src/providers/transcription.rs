use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::TranscriptionConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub language: Option<String>,
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("transcription provider is not configured; set GROQ_API_KEY")]
    NotConfigured,
    #[error("transcription request failed: {0}")]
    Request(String),
    #[error("transcription provider returned status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("transcription provider returned an unreadable response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TranscriptionProvider: Send + Sync + 'static {
    async fn transcribe(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<Transcript, TranscriptionError>;
}

pub struct GroqTranscriber {
    client: Client,
    config: TranscriptionConfig,
}

impl GroqTranscriber {
    pub fn new(config: TranscriptionConfig) -> Result<Self, TranscriptionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| TranscriptionError::Request(err.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[derive(Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

#[async_trait]
impl TranscriptionProvider for GroqTranscriber {
    async fn transcribe(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<Transcript, TranscriptionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(TranscriptionError::NotConfigured)?;

        let mut file_part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(content_type) = content_type {
            file_part = file_part
                .mime_str(content_type)
                .map_err(|err| TranscriptionError::Request(err.to_string()))?;
        }

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json");

        let url = format!("{}/audio/transcriptions", self.config.base_url);
        debug!(%url, model = %self.config.model, "sending transcription request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|err| TranscriptionError::Request(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Provider { status, body });
        }

        let parsed: VerboseTranscription = response
            .json()
            .await
            .map_err(|err| TranscriptionError::Decode(err.to_string()))?;

        Ok(Transcript {
            text: parsed.text.trim().to_string(),
            language: parsed.language.as_deref().and_then(normalize_language_code),
        })
    }
}

pub fn normalize_language_code(reported: &str) -> Option<String> {
    let value = reported.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    let code = match value.as_str() {
        "english" => "en",
        "hindi" => "hi",
        "kannada" => "kn",
        "tamil" => "ta",
        "telugu" => "te",
        "malayalam" => "ml",
        "marathi" => "mr",
        "bengali" => "bn",
        "gujarati" => "gu",
        "punjabi" => "pa",
        "urdu" => "ur",
        other => other,
    };
    Some(code.to_string())
}
