use std::sync::Arc;

use chrono::Duration;
use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
};

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    db::PgPool,
    error::{AppError, AppResult},
    providers::{TranscriptionProvider, TranslationProvider},
    storage::AudioStore,
    triage::{MatcherSettings, Translator},
};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn AudioStore>,
    pub jwt: JwtService,
    pub translator: Translator,
    pub transcriber: Arc<dyn TranscriptionProvider>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        storage: Arc<dyn AudioStore>,
        jwt: JwtService,
        translation: Arc<dyn TranslationProvider>,
        transcriber: Arc<dyn TranscriptionProvider>,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            storage,
            jwt,
            translator: Translator::new(translation),
            transcriber,
        }
    }

    pub fn db(&self) -> AppResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))
    }

    pub fn matcher_settings(&self) -> MatcherSettings {
        MatcherSettings {
            window: Duration::hours(self.config.duplicate_window_hours),
            threshold: self.config.duplicate_similarity_threshold,
        }
    }
}
