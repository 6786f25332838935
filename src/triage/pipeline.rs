use std::path::Path;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::language::detect_language;
use super::severity::{analyze, SeverityReport};
use super::similarity::{best_match, recent_history, MatcherSettings};
use super::translate::TranslationOutcome;
use super::{LanguageLabel, TriageError};
use crate::auth::{AuthenticatedUser, Role};
use crate::models::{Complaint, ComplaintStatus, ComplaintType, NewComplaint};
use crate::providers::TranscriptionError;
use crate::schema::{complaints, users};
use crate::state::AppState;

pub const ANONYMOUS_NAME: &str = "Anonymous";
pub const UNKNOWN_LOCATION: &str = "Unknown";
const DEFAULT_AUDIO_EXTENSION: &str = "webm";
pub const MAX_CONTENT_CHARS: usize = 10_000;
const MAX_LABEL_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct TextSubmission {
    pub name: String,
    pub location: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct AudioSubmission {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct TextOutcome {
    pub complaint: Complaint,
    pub language: LanguageLabel,
    pub severity: SeverityReport,
}

#[derive(Debug)]
pub struct AudioOutcome {
    pub complaint: Complaint,
    pub transcript: String,
    pub detected_language: String,
    pub translated_text: String,
    pub severity: SeverityReport,
}

struct Draft {
    submitter: Option<Uuid>,
    name: String,
    location: String,
    complaint_type: ComplaintType,
    language: String,
    content: String,
    original_content: String,
    audio_key: Option<String>,
}

pub async fn submit_text(
    state: &AppState,
    submitter: &AuthenticatedUser,
    submission: TextSubmission,
) -> Result<TextOutcome, TriageError> {
    if submitter.role != Role::Citizen {
        return Err(TriageError::Forbidden("only citizens can submit complaints"));
    }

    let name = required(submission.name, "name", MAX_LABEL_CHARS)?;
    let location = required(submission.location, "location", MAX_LABEL_CHARS)?;
    let content = required(submission.content, "content", MAX_CONTENT_CHARS)?;
    debug!(stage = "received", submitter = %submitter.user_id, kind = "text");

    let language = detect_language(&content);
    debug!(stage = "language_detected", language = %language);

    let translated = state.translator.to_english(&content, language.as_str()).await;
    debug!(
        stage = "translated",
        degraded = translated.is_degraded(),
        "text ready for duplicate check"
    );

    let draft = Draft {
        submitter: Some(submitter.user_id),
        name,
        location,
        complaint_type: ComplaintType::Text,
        language: language.as_str().to_string(),
        content: translated.into_text(),
        original_content: content,
        audio_key: None,
    };

    let mut conn = state.pool.get()?;
    let (complaint, severity) = gate_and_persist(&mut conn, &state.matcher_settings(), draft)?;

    Ok(TextOutcome {
        complaint,
        language,
        severity,
    })
}

pub async fn submit_audio(
    state: &AppState,
    submitter: &AuthenticatedUser,
    submission: AudioSubmission,
) -> Result<AudioOutcome, TriageError> {
    if submission.bytes.is_empty() {
        return Err(TriageError::Validation("no audio file uploaded".to_string()));
    }
    debug!(
        stage = "received",
        submitter = %submitter.user_id,
        kind = "audio",
        bytes = submission.bytes.len()
    );

    let file_name = submission
        .file_name
        .clone()
        .unwrap_or_else(|| format!("recording.{DEFAULT_AUDIO_EXTENSION}"));
    let transcript = state
        .transcriber
        .transcribe(
            &file_name,
            submission.bytes.clone(),
            submission.content_type.as_deref(),
        )
        .await
        .map_err(|err| {
            warn!(
                provider = "transcription",
                operation = "transcribe",
                error = %err,
                "transcription failed"
            );
            TriageError::from(err)
        })?;

    let text = transcript.text.trim().to_string();
    if text.is_empty() {
        return Err(TriageError::Transcription(TranscriptionError::Decode(
            "transcript was empty".to_string(),
        )));
    }

    let detected_language = transcript
        .language
        .clone()
        .or_else(|| detect_language(&text).code().map(str::to_string))
        .unwrap_or_else(|| "en".to_string());
    debug!(stage = "language_detected", language = %detected_language);

    let translated_text = match state.translator.to_english(&text, &detected_language).await {
        TranslationOutcome::Degraded { error, .. } => return Err(TriageError::Translation(error)),
        outcome => outcome.into_text(),
    };
    debug!(stage = "translated", "transcript ready for duplicate check");

    let extension = audio_extension(
        submission.file_name.as_deref(),
        submission.content_type.as_deref(),
    );
    let audio_key = state
        .storage
        .store(&extension, submission.bytes, submission.content_type)
        .await
        .map_err(TriageError::Storage)?;

    let draft = Draft {
        submitter: Some(submitter.user_id),
        name: ANONYMOUS_NAME.to_string(),
        location: UNKNOWN_LOCATION.to_string(),
        complaint_type: ComplaintType::Audio,
        language: detected_language.clone(),
        content: translated_text.clone(),
        original_content: text.clone(),
        audio_key: Some(audio_key.clone()),
    };

    let persisted = match state.pool.get() {
        Ok(mut conn) => gate_and_persist(&mut conn, &state.matcher_settings(), draft),
        Err(err) => Err(TriageError::from(err)),
    };

    let (complaint, severity) = match persisted {
        Ok(result) => result,
        Err(err) => {
            if let Err(cleanup) = state.storage.remove(&audio_key).await {
                warn!(
                    key = %audio_key,
                    error = %cleanup,
                    "failed to remove audio for rejected submission"
                );
            }
            return Err(err);
        }
    };

    Ok(AudioOutcome {
        complaint,
        transcript: text,
        detected_language,
        translated_text,
        severity,
    })
}

fn gate_and_persist(
    conn: &mut PgConnection,
    settings: &MatcherSettings,
    draft: Draft,
) -> Result<(Complaint, SeverityReport), TriageError> {
    conn.transaction(|conn| {
        if let Some(submitter) = draft.submitter {
            // serialises concurrent submissions from one account
            users::table
                .find(submitter)
                .select(users::id)
                .for_update()
                .first::<Uuid>(conn)?;

            let history = recent_history(conn, submitter, settings, Utc::now().naive_utc())?;
            let found = best_match(&history, &draft.content, settings.threshold);
            debug!(
                stage = "duplicate_checked",
                candidates = history.len(),
                score = found.score
            );
            if let Some(existing) = found.complaint {
                info!(
                    stage = "rejected_duplicate",
                    submitter = %submitter,
                    duplicate_of = existing.id,
                    score = found.score,
                    "rejected duplicate complaint"
                );
                return Err(TriageError::Duplicate {
                    complaint_id: existing.id,
                    score: found.score,
                });
            }
        }

        let severity = analyze(&draft.content);
        debug!(
            stage = "analyzed",
            emotion = severity.emotion.as_str(),
            priority = severity.priority.as_str(),
            threat_level = severity.threat_level.as_str()
        );

        let new_complaint = NewComplaint {
            user_id: draft.submitter,
            name: draft.name,
            location: draft.location,
            complaint_type: draft.complaint_type.as_str().to_string(),
            language: draft.language,
            content: draft.content,
            original_content: Some(draft.original_content),
            audio_key: draft.audio_key,
            emotion: severity.emotion.as_str().to_string(),
            priority: severity.priority.as_str().to_string(),
            threat_level: severity.threat_level.as_str().to_string(),
            risk_factors: Value::from(severity.risk_factors.clone()),
            status: ComplaintStatus::Pending.as_str().to_string(),
        };

        let complaint: Complaint = diesel::insert_into(complaints::table)
            .values(&new_complaint)
            .get_result(conn)?;
        info!(
            stage = "persisted",
            complaint_id = complaint.id,
            complaint_type = %complaint.complaint_type,
            priority = %complaint.priority,
            "complaint recorded"
        );

        Ok((complaint, severity))
    })
}

fn required(value: String, field: &str, max_chars: usize) -> Result<String, TriageError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TriageError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(TriageError::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn audio_extension(file_name: Option<&str>, content_type: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .or_else(|| {
            content_type
                .and_then(mime_guess::get_mime_extensions_str)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| DEFAULT_AUDIO_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_are_trimmed_and_checked() {
        assert_eq!(required("  Mysuru ".into(), "location", 100).unwrap(), "Mysuru");
        let err = required("   ".into(), "content", 100).unwrap_err();
        assert_eq!(err.to_string(), "content is required");
    }

    #[test]
    fn oversized_fields_are_rejected() {
        let content = "a".repeat(MAX_CONTENT_CHARS);
        assert!(required(content.clone(), "content", MAX_CONTENT_CHARS).is_ok());

        let err = required(format!("{content}b"), "content", MAX_CONTENT_CHARS).unwrap_err();
        assert_eq!(err.to_string(), "content must be at most 10000 characters");

        // counted in characters, not bytes
        let hindi = "क".repeat(100);
        assert!(required(hindi, "name", 100).is_ok());
    }

    #[test]
    fn audio_extension_prefers_the_uploaded_file_name() {
        assert_eq!(audio_extension(Some("Voice Note.M4A"), Some("audio/mp4")), "m4a");
        assert_eq!(audio_extension(None, None), "webm");
    }
}
