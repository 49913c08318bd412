//! AI Provider Trait
//!
//! Common interface for the hosted LLM providers (OpenAI, Claude, Gemini).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;

pub const MAX_TOKENS: u32 = 1500;
pub const TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum AIError {
    #[error("API request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Rate limited. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
    #[error("Missing API key or no provider available")]
    MissingApiKey,
    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),
    #[error("Unknown prompt type: {0}")]
    UnknownPromptType(String),
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Information about an AI model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Provider name (e.g., "openai", "claude", "gemini")
    pub provider: String,

    /// Model name (e.g., "gpt-4", "gemini-pro")
    pub model_name: String,

    /// Context window size in tokens
    pub context_window: usize,
}

/// Common trait for all AI providers
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Check if the provider is configured
    async fn is_available(&self) -> bool;

    /// Send a single prompt and return the model's text answer
    async fn complete(&self, prompt: &str) -> Result<String, AIError>;

    /// Get model info
    fn model_info(&self) -> ModelInfo;
}

pub(crate) fn http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a request, retrying transport errors and HTTP 429 with exponential
/// backoff. Non-success statuses other than 429 are returned as `ApiError`.
pub(crate) async fn send_with_retry<F>(provider: &str, build: F) -> Result<Response, AIError>
where
    F: Fn() -> RequestBuilder,
{
    let mut retry_count = 0;
    let mut delay_ms = INITIAL_RETRY_DELAY_MS;

    loop {
        match build().send().await {
            Ok(resp) => {
                let status = resp.status();

                if status.is_success() {
                    return Ok(resp);
                }

                if status.as_u16() == 429 {
                    let retry_after = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|h| h.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(delay_ms / 1000);

                    if retry_count >= MAX_RETRIES {
                        return Err(AIError::RateLimited { retry_after });
                    }
                    retry_count += 1;
                    tracing::warn!(
                        "{} rate limited. Retrying after {} seconds (attempt {}/{})",
                        provider,
                        retry_after,
                        retry_count,
                        MAX_RETRIES
                    );
                    sleep(Duration::from_secs(retry_after)).await;
                    delay_ms *= 2;
                    continue;
                }

                let message = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AIError::ApiError {
                    status: status.as_u16(),
                    message,
                });
            }
            Err(e) => {
                if retry_count >= MAX_RETRIES {
                    return Err(AIError::RequestFailed(e));
                }
                retry_count += 1;
                tracing::warn!(
                    "{} request failed: {}. Retrying in {}ms (attempt {}/{})",
                    provider,
                    e,
                    delay_ms,
                    retry_count,
                    MAX_RETRIES
                );
                sleep(Duration::from_millis(delay_ms)).await;
                delay_ms *= 2;
            }
        }
    }
}
