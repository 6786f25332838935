pub mod language;
pub mod pipeline;
pub mod severity;
pub mod similarity;
pub mod translate;

use axum::http::StatusCode;
use thiserror::Error;

use crate::error::AppError;
use crate::providers::TranscriptionError;

pub use language::{detect_language, LanguageLabel};
pub use pipeline::{submit_audio, submit_text, AudioOutcome, AudioSubmission, TextOutcome, TextSubmission};
pub use severity::{analyze, SeverityReport};
pub use similarity::MatcherSettings;
pub use translate::{TranslationOutcome, Translator};

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("duplicate of complaint {complaint_id} (similarity {score:.3})")]
    Duplicate { complaint_id: i64, score: f64 },
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("transcription service is not configured")]
    TranscriptionUnavailable,
    #[error(transparent)]
    Transcription(TranscriptionError),
    #[error("translation failed: {0}")]
    Translation(String),
    #[error("audio storage failed: {0}")]
    Storage(anyhow::Error),
    #[error("database pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error(transparent)]
    Database(#[from] diesel::result::Error),
}

impl From<TranscriptionError> for TriageError {
    fn from(value: TranscriptionError) -> Self {
        match value {
            TranscriptionError::NotConfigured => TriageError::TranscriptionUnavailable,
            other => TriageError::Transcription(other),
        }
    }
}

impl From<TriageError> for AppError {
    fn from(value: TriageError) -> Self {
        match value {
            TriageError::Duplicate {
                complaint_id,
                score,
            } => AppError::duplicate(complaint_id, score),
            TriageError::Validation(message) => AppError::bad_request(message),
            TriageError::Forbidden(reason) => AppError::forbidden(reason),
            TriageError::TranscriptionUnavailable => AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "transcription service is not configured; set GROQ_API_KEY",
            ),
            TriageError::Transcription(err) => AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("transcription failed: {err}"),
            ),
            TriageError::Database(err) => AppError::from(err),
            other => AppError::internal(other),
        }
    }
}
