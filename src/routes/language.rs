use axum::Json;
use serde::{Deserialize, Serialize};

use crate::triage::{detect_language, LanguageLabel};

#[derive(Debug, Deserialize)]
pub struct DetectLanguageRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DetectLanguageResponse {
    pub language: LanguageLabel,
}

pub async fn detect(Json(payload): Json<DetectLanguageRequest>) -> Json<DetectLanguageResponse> {
    Json(DetectLanguageResponse {
        language: detect_language(&payload.text),
    })
}
