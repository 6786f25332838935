use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use http_body_util::BodyExt;
use nyayasathi::auth::jwt::JwtService;
use nyayasathi::auth::{password, Role};
use nyayasathi::config::{AppConfig, DEFAULT_MAX_AUDIO_BYTES};
use nyayasathi::db::{self, PgPool};
use nyayasathi::models::NewUser;
use nyayasathi::providers::{
    Transcript, TranscriptionError, TranscriptionProvider, TranslationProvider,
};
use nyayasathi::routes;
use nyayasathi::state::AppState;
use nyayasathi::storage::{self, AudioStore};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[allow(dead_code)]
#[derive(Clone)]
pub struct StoredObject {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
}

#[async_trait]
impl AudioStore for FakeStorage {
    async fn store(
        &self,
        extension: &str,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<String> {
        let key = storage::audio_key(extension);
        let stored = StoredObject {
            key: key.clone(),
            bytes,
            content_type: Some(storage::audio_content_type(&key, content_type)),
        };
        let mut guard = self.objects.lock().await;
        guard.insert(key.clone(), stored);
        Ok(key)
    }

    async fn playback_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let guard = self.objects.lock().await;
        ensure!(guard.contains_key(key), "object {key} missing");
        Ok(format!(
            "https://fake-storage/{key}?expires_in={}",
            expires_in.as_secs()
        ))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        ensure!(storage::is_audio_key(key), "{key} is not a complaint audio key");
        let mut guard = self.objects.lock().await;
        guard.remove(key);
        Ok(())
    }
}

impl FakeStorage {
    #[allow(dead_code)]
    pub async fn keys(&self) -> Vec<String> {
        let guard = self.objects.lock().await;
        guard.keys().cloned().collect()
    }

    #[allow(dead_code)]
    pub async fn object_count(&self) -> usize {
        let guard = self.objects.lock().await;
        guard.len()
    }
}

/// Records every call; answers with a canned translation or echoes the input.
#[derive(Default)]
pub struct FakeTranslator {
    calls: StdMutex<Vec<(String, String)>>,
    reply: StdMutex<Option<String>>,
    failing: StdMutex<bool>,
}

#[async_trait]
impl TranslationProvider for FakeTranslator {
    async fn translate(&self, text: &str, source: &str, _target: &str) -> Result<String> {
        self.calls
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push((text.to_string(), source.to_string()));
        if *self.failing.lock().map_err(|_| anyhow!("poisoned"))? {
            return Err(anyhow!("translation provider offline"));
        }
        let reply = self.reply.lock().map_err(|_| anyhow!("poisoned"))?.clone();
        Ok(reply.unwrap_or_else(|| text.to_string()))
    }
}

#[allow(dead_code)]
impl FakeTranslator {
    pub fn reply_with(&self, text: &str) {
        *self.reply.lock().unwrap() = Some(text.to_string());
    }

    pub fn fail(&self) {
        *self.failing.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

/// Unconfigured until a transcript is set, mirroring a missing API key.
#[derive(Default)]
pub struct FakeTranscriber {
    transcript: StdMutex<Option<Transcript>>,
}

#[async_trait]
impl TranscriptionProvider for FakeTranscriber {
    async fn transcribe(
        &self,
        _file_name: &str,
        _bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<Transcript, TranscriptionError> {
        self.transcript
            .lock()
            .map_err(|_| TranscriptionError::Request("poisoned".to_string()))?
            .clone()
            .ok_or(TranscriptionError::NotConfigured)
    }
}

#[allow(dead_code)]
impl FakeTranscriber {
    pub fn respond_with(&self, text: &str, language: Option<&str>) {
        *self.transcript.lock().unwrap() = Some(Transcript {
            text: text.to_string(),
            language: language.map(str::to_string),
        });
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    storage: Arc<FakeStorage>,
    translator: Arc<FakeTranslator>,
    transcriber: Arc<FakeTranscriber>,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: 60,
            refresh_token_expiry_days: 30,
            refresh_cookie_secure: false,
            refresh_cookie_domain: None,
            cors_allowed_origin: None,
            aws_endpoint_url: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_region: "us-east-1".to_string(),
            s3_bucket: "test-bucket".to_string(),
            groq_api_key: None,
            groq_api_url: "http://127.0.0.1:9".to_string(),
            transcription_model: "test-model".to_string(),
            translation_endpoint: "http://127.0.0.1:9".to_string(),
            provider_timeout_secs: 1,
            duplicate_window_hours: 24,
            duplicate_similarity_threshold: 0.8,
            max_audio_bytes: DEFAULT_MAX_AUDIO_BYTES,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let storage = Arc::new(FakeStorage::default());
        let translator = Arc::new(FakeTranslator::default());
        let transcriber = Arc::new(FakeTranscriber::default());
        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(
            pool,
            config,
            storage.clone(),
            jwt,
            translator.clone(),
            transcriber.clone(),
        );
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            router,
            storage,
            translator,
            transcriber,
        })
    }

    pub async fn cleanup(&self) -> Result<()> {
        self.with_conn(truncate_all).await
    }

    #[allow(dead_code)]
    pub fn storage(&self) -> Arc<FakeStorage> {
        self.storage.clone()
    }

    #[allow(dead_code)]
    pub fn translator(&self) -> Arc<FakeTranslator> {
        self.translator.clone()
    }

    #[allow(dead_code)]
    pub fn transcriber(&self) -> Arc<FakeTranscriber> {
        self.transcriber.clone()
    }

    pub async fn insert_user(&self, username: &str, secret: &str, role: Role) -> Result<Uuid> {
        let username = username.to_string();
        let secret = secret.to_string();
        self.with_conn(move |conn| {
            let user = NewUser {
                id: Uuid::new_v4(),
                badge_id: (role == Role::Officer).then(|| username.clone()),
                username,
                password_hash: password::hash_password(&secret)?,
                role: role.as_str().to_string(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
            };
            diesel::insert_into(nyayasathi::schema::users::table)
                .values(&user)
                .execute(conn)
                .context("failed to insert user")?;
            Ok(user.id)
        })
        .await
    }

    pub async fn login_token(&self, username: &str, secret: &str, role: Role) -> Result<String> {
        let response = self
            .post_json(
                "/api/auth/login",
                &serde_json::json!({
                    "username": username,
                    "password": secret,
                    "role": role.as_str(),
                }),
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_json(response).await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("login response missing access_token"))
    }

    /// Creates a user of `role` and returns its id and a bearer token.
    pub async fn signed_in(&self, username: &str, role: Role) -> Result<(Uuid, String)> {
        let secret = "correct-horse";
        let id = self.insert_user(username, secret, role).await?;
        let token = self.login_token(username, secret, role).await?;
        Ok((id, token))
    }

    /// Moves every complaint of `user_id` `hours` into the past.
    #[allow(dead_code)]
    pub async fn backdate_complaints(&self, user_id: Uuid, hours: i64) -> Result<()> {
        self.with_conn(move |conn| {
            use nyayasathi::schema::complaints::dsl;
            let shift = chrono::Duration::hours(hours);
            let rows: Vec<(i64, chrono::NaiveDateTime)> = dsl::complaints
                .filter(dsl::user_id.eq(user_id))
                .select((dsl::id, dsl::submitted_at))
                .load(conn)?;
            for (id, submitted_at) in rows {
                diesel::update(dsl::complaints.find(id))
                    .set(dsl::submitted_at.eq(submitted_at - shift))
                    .execute(conn)?;
            }
            Ok(())
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn complaint_count(&self) -> Result<i64> {
        self.with_conn(|conn| {
            use nyayasathi::schema::complaints::dsl;
            Ok(dsl::complaints.count().get_result(conn)?)
        })
        .await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn upload_audio(
        &self,
        field_name: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
        token: &str,
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();
        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(
            format!(
                "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend(data);
        body.extend(b"\r\n");
        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/complaints/audio")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_json(response: hyper::Response<Body>) -> Result<Value> {
    let collected = response
        .into_body()
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    let bytes = collected.to_bytes();
    serde_json::from_slice(&bytes).context("response body was not JSON")
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        db::run_migrations(&mut conn)?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE complaints, refresh_tokens, users RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
