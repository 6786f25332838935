use std::time::Duration;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::{NaiveDateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::{Complaint, ComplaintStatus},
    schema::complaints,
    state::AppState,
    triage::{self, AudioSubmission, LanguageLabel, SeverityReport, TextSubmission},
};

const AUDIO_URL_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Serialize)]
pub struct ComplaintResponse {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub location: String,
    pub complaint_type: String,
    pub language: String,
    pub content: String,
    pub original_content: Option<String>,
    pub emotion: String,
    pub priority: String,
    pub threat_level: String,
    pub risk_factors: Vec<String>,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub review_notes: String,
    pub has_audio: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub submitted_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Complaint> for ComplaintResponse {
    fn from(complaint: Complaint) -> Self {
        let risk_factors = complaint.risk_factor_tags();
        Self {
            id: complaint.id,
            user_id: complaint.user_id,
            name: complaint.name,
            location: complaint.location,
            complaint_type: complaint.complaint_type,
            language: complaint.language,
            content: complaint.content,
            original_content: complaint.original_content,
            emotion: complaint.emotion,
            priority: complaint.priority,
            threat_level: complaint.threat_level,
            risk_factors,
            status: complaint.status,
            reviewed_by: complaint.reviewed_by,
            review_notes: complaint.review_notes,
            has_audio: complaint.audio_key.is_some(),
            audio_url: None,
            submitted_at: complaint.submitted_at,
            updated_at: complaint.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TextComplaintRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct TextComplaintResponse {
    pub message: &'static str,
    pub complaint_id: i64,
    pub language: LanguageLabel,
    #[serde(flatten)]
    pub severity: SeverityReport,
    pub content: String,
    pub original_content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AudioComplaintResponse {
    pub complaint_id: i64,
    pub transcript: String,
    pub detected_language: String,
    pub translated_text: String,
    #[serde(flatten)]
    pub severity: SeverityReport,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub review_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub message: &'static str,
    pub complaint: ComplaintResponse,
}

pub async fn list_complaints(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ComplaintResponse>>> {
    let mut conn = state.db()?;
    let mut query = complaints::table
        .order((complaints::submitted_at.desc(), complaints::id.desc()))
        .into_boxed();
    if !user.is_officer() {
        query = query.filter(complaints::user_id.eq(user.user_id));
    }
    let rows: Vec<Complaint> = query.load(&mut conn)?;

    Ok(Json(rows.into_iter().map(ComplaintResponse::from).collect()))
}

pub async fn get_complaint(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(complaint_id): Path<i64>,
) -> AppResult<Json<ComplaintResponse>> {
    let complaint = {
        let mut conn = state.db()?;
        load_visible_complaint(&mut conn, &user, complaint_id)?
    };

    let audio_key = complaint.audio_key.clone();
    let mut response = ComplaintResponse::from(complaint);
    if let Some(key) = audio_key {
        match state.storage.playback_url(&key, AUDIO_URL_TTL).await {
            Ok(url) => response.audio_url = Some(url),
            Err(err) => {
                warn!(complaint_id, key = %key, error = %err, "failed to presign audio URL")
            }
        }
    }

    Ok(Json(response))
}

pub async fn submit_text_complaint(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<TextComplaintRequest>,
) -> AppResult<Json<TextComplaintResponse>> {
    let submission = TextSubmission {
        name: payload.name,
        location: payload.location,
        content: payload.content,
    };

    let outcome = triage::submit_text(&state, &user, submission)
        .await
        .map_err(|err| {
            info!(submitter = %user.user_id, error = %err, "text complaint not accepted");
            AppError::from(err)
        })?;

    Ok(Json(TextComplaintResponse {
        message: "Text complaint submitted successfully",
        complaint_id: outcome.complaint.id,
        language: outcome.language,
        severity: outcome.severity,
        content: outcome.complaint.content,
        original_content: outcome.complaint.original_content,
    }))
}

pub async fn submit_audio_complaint(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<Json<AudioComplaintResponse>> {
    let mut submission: Option<AudioSubmission> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!(error = %err, "invalid multipart data");
        AppError::bad_request(format!("invalid multipart data: {err}"))
    })? {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field.file_name().map(|name| name.to_string());
        let content_type = field.content_type().map(|mime| mime.to_string());
        let data = field.bytes().await.map_err(|err| {
            error!(error = %err, "failed to read audio bytes");
            AppError::bad_request(format!("failed to read audio bytes: {err}"))
        })?;
        submission = Some(AudioSubmission {
            file_name,
            content_type,
            bytes: data.to_vec(),
        });
    }

    let submission = submission.ok_or_else(|| AppError::bad_request("no audio file uploaded"))?;
    if submission.bytes.len() > state.config.max_audio_bytes {
        return Err(AppError::bad_request(format!(
            "audio file exceeds the {} byte limit",
            state.config.max_audio_bytes
        )));
    }

    let outcome = triage::submit_audio(&state, &user, submission)
        .await
        .map_err(|err| {
            error!(submitter = %user.user_id, error = %err, "audio complaint not accepted");
            AppError::from(err)
        })?;

    Ok(Json(AudioComplaintResponse {
        complaint_id: outcome.complaint.id,
        transcript: outcome.transcript,
        detected_language: outcome.detected_language,
        translated_text: outcome.translated_text,
        severity: outcome.severity,
    }))
}

pub async fn update_complaint_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(complaint_id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<StatusUpdateResponse>> {
    if !user.is_officer() {
        return Err(AppError::forbidden(
            "only officers can update complaint status",
        ));
    }

    let mut conn = state.db()?;
    let updated = conn.transaction::<Complaint, AppError, _>(|conn| {
        let existing: Complaint = complaints::table
            .find(complaint_id)
            .for_update()
            .first(conn)?;

        let status: ComplaintStatus = payload.status.parse().map_err(AppError::bad_request)?;
        let review_notes = payload.review_notes.clone().unwrap_or_default();

        let updated = diesel::update(complaints::table.find(existing.id))
            .set((
                complaints::status.eq(status.as_str()),
                complaints::review_notes.eq(review_notes),
                complaints::reviewed_by.eq(Some(user.user_id)),
                complaints::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result(conn)?;
        Ok(updated)
    })?;

    info!(
        complaint_id,
        officer = %user.user_id,
        status = %updated.status,
        "complaint status updated"
    );

    Ok(Json(StatusUpdateResponse {
        message: "Complaint status updated successfully",
        complaint: ComplaintResponse::from(updated),
    }))
}

fn load_visible_complaint(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    complaint_id: i64,
) -> AppResult<Complaint> {
    let mut query = complaints::table
        .filter(complaints::id.eq(complaint_id))
        .into_boxed();
    if !user.is_officer() {
        query = query.filter(complaints::user_id.eq(user.user_id));
    }
    Ok(query.first(conn)?)
}
