use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::TranslationConfig;

#[async_trait]
pub trait TranslationProvider: Send + Sync + 'static {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

pub struct GoogleTranslateProvider {
    client: Client,
    endpoint: String,
}

impl GoogleTranslateProvider {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build translation HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        debug!(source, target, chars = text.chars().count(), "sending translation request");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .context("translation request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "translation failed with status {status}: {body}"
            ));
        }

        let payload: Value = response
            .json()
            .await
            .context("translation response was not valid JSON")?;
        extract_translation(&payload)
    }
}

fn extract_translation(payload: &Value) -> Result<String> {
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("translation response missing segment list"))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(anyhow!("translation response contained no text"));
    }
    Ok(translated)
}
