use std::time::Duration;

use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client as S3Client,
};
use uuid::Uuid;

use crate::config::AppConfig;

pub const AUDIO_PREFIX: &str = "complaints/audio/";

pub fn audio_key(extension: &str) -> String {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    format!("{AUDIO_PREFIX}{}.{extension}", Uuid::new_v4())
}

pub fn is_audio_key(key: &str) -> bool {
    key.strip_prefix(AUDIO_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

pub fn audio_content_type(key: &str, declared: Option<String>) -> String {
    declared
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(key)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
}

#[async_trait]
pub trait AudioStore: Send + Sync + 'static {
    async fn store(
        &self,
        extension: &str,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<String>;

    async fn playback_url(&self, key: &str, expires_in: Duration) -> Result<String>;

    async fn remove(&self, key: &str) -> Result<()>;
}

pub struct S3AudioStore {
    client: S3Client,
    bucket: String,
}

impl S3AudioStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let region = RegionProviderChain::first_try(Region::new(config.aws_region.clone()))
            .or_default_provider();
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(endpoint) = config.aws_endpoint_url.as_deref() {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(access_key), Some(secret_key)) = (
            config.aws_access_key_id.as_deref(),
            config.aws_secret_access_key.as_deref(),
        ) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "nyayasathi-env",
            ));
        }

        let shared = loader.load().await;
        // path-style URLs for S3-compatible endpoints
        let s3_config = S3ConfigBuilder::from(&shared).force_path_style(true).build();
        Ok(Self::new(
            S3Client::from_conf(s3_config),
            config.s3_bucket.clone(),
        ))
    }
}

#[async_trait]
impl AudioStore for S3AudioStore {
    async fn store(
        &self,
        extension: &str,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<String> {
        let key = audio_key(extension);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(audio_content_type(&key, content_type))
            .body(ByteStream::from(bytes))
            .send()
            .await
            .with_context(|| format!("failed to upload complaint audio {key}"))?;
        Ok(key)
    }

    async fn playback_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        ensure!(is_audio_key(key), "{key} is not a complaint audio key");
        let presigning = PresigningConfig::expires_in(expires_in)
            .context("invalid audio playback URL lifetime")?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .with_context(|| format!("failed to sign playback URL for {key}"))?;
        Ok(request.uri().to_string())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        ensure!(is_audio_key(key), "{key} is not a complaint audio key");
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("failed to delete complaint audio {key}"))?;
        Ok(())
    }
}
