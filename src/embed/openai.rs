//! OpenAI-compatible embeddings client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::EmbeddingProvider;
use crate::config::OpenAiConfig;

/// Async embeddings client for `POST {base_url}/embeddings`.
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    max_attempts: usize,
    retry_base_delay: Duration,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, config: &OpenAiConfig) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        anyhow::ensure!(!config.model.trim().is_empty(), "missing OpenAI model name");

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build OpenAI HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_attempts: config.max_attempts.max(1),
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Read the API key from the environment variable named in `config`
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).with_context(|| {
            format!("environment variable {} is not set", config.api_key_env)
        })?;
        Self::new(&api_key, config)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let failure = match self.client.post(&self.endpoint).json(&request).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let mut parsed: EmbeddingResponse = resp
                        .json()
                        .await
                        .context("failed to parse OpenAI embedding response")?;
                    parsed.data.sort_by_key(|entry| entry.index);
                    anyhow::ensure!(
                        parsed.data.len() == texts.len(),
                        "OpenAI returned {} embeddings for {} inputs",
                        parsed.data.len(),
                        texts.len()
                    );
                    if let Some((position, entry)) =
                        parsed.data.iter().enumerate().find(|(i, entry)| entry.index != *i)
                    {
                        anyhow::bail!(
                            "OpenAI response has index {} at position {}",
                            entry.index,
                            position
                        );
                    }
                    return Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect());
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    let error = anyhow::anyhow!("OpenAI embeddings request failed ({}): {}", status, body);
                    if !should_retry(status) {
                        return Err(error);
                    }
                    error
                }
                Err(err) if is_retryable_error(&err) => anyhow::Error::new(err),
                Err(err) => return Err(err).context("OpenAI embeddings request failed"),
            };

            if attempt >= self.max_attempts {
                return Err(failure.context(format!("giving up after {} attempts", attempt)));
            }
            let delay = self.retry_backoff(attempt);
            warn!(attempt, delay_ms = delay.as_millis() as u64, error = %failure, "retrying embeddings request");
            tokio::time::sleep(delay).await;
        }
    }

    /// Base delay doubled per completed attempt, capped at 32x
    fn retry_backoff(&self, attempt: usize) -> Duration {
        let exponent = (attempt.saturating_sub(1)).min(5) as u32;
        self.retry_base_delay * (1 << exponent)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> Option<usize> {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body() || err.is_request()
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
