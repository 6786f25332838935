use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;
use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub badge_id: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Citizen)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub badge_id: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = complaints)]
pub struct Complaint {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub location: String,
    pub complaint_type: String,
    pub language: String,
    pub content: String,
    pub original_content: Option<String>,
    pub audio_key: Option<String>,
    pub emotion: String,
    pub priority: String,
    pub threat_level: String,
    pub risk_factors: serde_json::Value,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub review_notes: String,
    pub submitted_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Complaint {
    pub fn risk_factor_tags(&self) -> Vec<String> {
        serde_json::from_value(self.risk_factors.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = complaints)]
pub struct NewComplaint {
    pub user_id: Option<Uuid>,
    pub name: String,
    pub location: String,
    pub complaint_type: String,
    pub language: String,
    pub content: String,
    pub original_content: Option<String>,
    pub audio_key: Option<String>,
    pub emotion: String,
    pub priority: String,
    pub threat_level: String,
    pub risk_factors: serde_json::Value,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintType {
    Audio,
    Text,
}

impl ComplaintType {
    pub fn as_str(self) -> &'static str {
        match self {
            ComplaintType::Audio => "audio",
            ComplaintType::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    UnderReview,
    Reviewed,
    Failed,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 4] = [
        ComplaintStatus::Pending,
        ComplaintStatus::UnderReview,
        ComplaintStatus::Reviewed,
        ComplaintStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::UnderReview => "under_review",
            ComplaintStatus::Reviewed => "reviewed",
            ComplaintStatus::Failed => "failed",
        }
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ComplaintStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                let allowed: Vec<&str> = ComplaintStatus::ALL.iter().map(|s| s.as_str()).collect();
                format!(
                    "\"{}\" is not a valid status; expected one of {}",
                    value.trim(),
                    allowed.join(", ")
                )
            })
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ComplaintStatus;

    #[test]
    fn parses_known_statuses() {
        assert_eq!(
            "under_review".parse::<ComplaintStatus>(),
            Ok(ComplaintStatus::UnderReview)
        );
        assert_eq!(
            " Reviewed ".parse::<ComplaintStatus>(),
            Ok(ComplaintStatus::Reviewed)
        );
    }

    #[test]
    fn rejects_unknown_status_with_allowed_values() {
        let err = "closed".parse::<ComplaintStatus>().unwrap_err();
        assert!(err.contains("closed"));
        assert!(err.contains("under_review"));
    }
}
