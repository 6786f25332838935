use std::env;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use url::Url;

use crate::db::DEFAULT_MAX_POOL_SIZE;

pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "distil-whisper-large-v3-en";
pub const DEFAULT_TRANSLATION_ENDPOINT: &str =
    "https://translate.googleapis.com/translate_a/single";
pub const DEFAULT_MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_pool_size: u32,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
    pub refresh_cookie_secure: bool,
    pub refresh_cookie_domain: Option<String>,
    pub cors_allowed_origin: Option<String>,
    pub aws_endpoint_url: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_region: String,
    pub s3_bucket: String,
    pub groq_api_key: Option<String>,
    pub groq_api_url: String,
    pub transcription_model: String,
    pub translation_endpoint: String,
    pub provider_timeout_secs: u64,
    pub duplicate_window_hours: i64,
    pub duplicate_similarity_threshold: f64,
    pub max_audio_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct TranslationConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct TranscriptionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_pool_size = env::var("DATABASE_MAX_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_POOL_SIZE);
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "nyayasathi".to_string());
        let jwt_audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nyayasathi-clients".to_string());
        let jwt_expiry_minutes = env::var("JWT_EXPIRY_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("JWT_EXPIRY_MINUTES must be an integer")?;
        let refresh_token_expiry_days = env::var("REFRESH_TOKEN_EXPIRY_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("REFRESH_TOKEN_EXPIRY_DAYS must be an integer")?;
        let refresh_cookie_secure = env::var("REFRESH_COOKIE_SECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let refresh_cookie_domain = env::var("REFRESH_COOKIE_DOMAIN").ok();
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();
        let aws_endpoint_url = env::var("AWS_ENDPOINT_URL").ok();
        let aws_access_key_id = env::var("AWS_ACCESS_KEY_ID").ok();
        let aws_secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok();
        let aws_region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let s3_bucket = env::var("S3_BUCKET").context("S3_BUCKET must be set")?;
        let groq_api_key = env::var("GROQ_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let groq_api_url =
            env::var("GROQ_API_URL").unwrap_or_else(|_| DEFAULT_GROQ_API_URL.to_string());
        let transcription_model = env::var("TRANSCRIPTION_MODEL")
            .unwrap_or_else(|_| DEFAULT_TRANSCRIPTION_MODEL.to_string());
        let translation_endpoint = env::var("TRANSLATION_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_TRANSLATION_ENDPOINT.to_string());
        let provider_timeout_secs = env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("PROVIDER_TIMEOUT_SECS must be an integer")?;
        let duplicate_window_hours = env::var("DUPLICATE_WINDOW_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .context("DUPLICATE_WINDOW_HOURS must be an integer")?;
        let duplicate_similarity_threshold = parse_threshold(
            &env::var("DUPLICATE_SIMILARITY_THRESHOLD").unwrap_or_else(|_| "0.8".to_string()),
        )?;
        let max_audio_bytes = env::var("MAX_AUDIO_BYTES")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_AUDIO_BYTES);

        Ok(Self {
            database_url,
            database_max_pool_size,
            server_host,
            server_port,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            jwt_expiry_minutes,
            refresh_token_expiry_days,
            refresh_cookie_secure,
            refresh_cookie_domain,
            cors_allowed_origin,
            aws_endpoint_url,
            aws_access_key_id,
            aws_secret_access_key,
            aws_region,
            s3_bucket,
            groq_api_key,
            groq_api_url,
            transcription_model,
            translation_endpoint,
            provider_timeout_secs,
            duplicate_window_hours,
            duplicate_similarity_threshold,
            max_audio_bytes,
        })
    }

    pub fn redacted_database_url(&self) -> String {
        redact_database_url(&self.database_url)
    }

    pub fn translation(&self) -> TranslationConfig {
        TranslationConfig {
            endpoint: self.translation_endpoint.clone(),
            timeout: Duration::from_secs(self.provider_timeout_secs),
        }
    }

    pub fn transcription(&self) -> TranscriptionConfig {
        TranscriptionConfig {
            api_key: self.groq_api_key.clone(),
            base_url: self.groq_api_url.trim_end_matches('/').to_string(),
            model: self.transcription_model.clone(),
            timeout: Duration::from_secs(self.provider_timeout_secs),
        }
    }
}

fn parse_threshold(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .context("DUPLICATE_SIMILARITY_THRESHOLD must be a number")?;
    ensure!(
        (0.0..=1.0).contains(&value),
        "DUPLICATE_SIMILARITY_THRESHOLD must be between 0 and 1"
    );
    Ok(value)
}

fn redact_database_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("*****"));
            }
            parsed.to_string()
        }
        Err(_) => "***".to_string(),
    }
}
