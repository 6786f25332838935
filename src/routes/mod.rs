use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

pub mod auth;
pub mod complaints;
pub mod health;
pub mod language;

const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());
    let audio_body_limit = state.config.max_audio_bytes + MULTIPART_OVERHEAD_BYTES;

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/officers/register", post(auth::register_officer))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let complaint_routes = Router::new()
        .route("/", get(complaints::list_complaints))
        .route("/text", post(complaints::submit_text_complaint))
        .route(
            "/audio",
            post(complaints::submit_audio_complaint).layer(DefaultBodyLimit::max(audio_body_limit)),
        )
        .route("/:id", get(complaints::get_complaint))
        .route("/:id/status", post(complaints::update_complaint_status));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/complaints", complaint_routes)
        .route("/api/detect-language", post(language::detect))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let allow_origin = match allowed_origins {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(err) => {
                        warn!(origin = value, error = %err, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
