use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::provider::{
    http_client, send_with_retry, AIError, AIProvider, ModelInfo, DEFAULT_TIMEOUT_SECS,
    MAX_TOKENS, TEMPERATURE,
};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const CLAUDE_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

/// Anthropic Messages API client.
pub struct ClaudeClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: http_client(DEFAULT_TIMEOUT_SECS),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.client = http_client(secs);
        self
    }

    async fn send_request(&self, prompt: &str) -> Result<String, AIError> {
        if self.api_key.is_empty() {
            return Err(AIError::MissingApiKey);
        }

        let request_body = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let resp = send_with_retry("claude", || {
            self.client
                .post(CLAUDE_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", CLAUDE_API_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
        })
        .await?;

        let body = resp
            .text()
            .await
            .map_err(|e| AIError::ParseError(format!("Failed to read body: {}", e)))?;
        parse_response(&body)
    }
}

#[async_trait]
impl AIProvider for ClaudeClient {
    fn name(&self) -> &str {
        "claude"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, prompt: &str) -> Result<String, AIError> {
        self.send_request(prompt).await
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "claude".to_string(),
            model_name: self.model.clone(),
            context_window: 200000,
        }
    }
}

fn parse_response(body: &str) -> Result<String, AIError> {
    let claude_resp: ClaudeResponse = serde_json::from_str(body)
        .map_err(|e| AIError::ParseError(format!("Failed to parse JSON: {}", e)))?;

    claude_resp
        .content
        .into_iter()
        .find_map(|c| c.text)
        .ok_or_else(|| AIError::InvalidResponse("Empty content array in response".to_string()))
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{"id":"msg_1","content":[{"type":"text","text":"Looks fine."}]}"#;
        assert_eq!(parse_response(body).unwrap(), "Looks fine.");
    }

    #[test]
    fn test_parse_empty_content() {
        let err = parse_response(r#"{"content":[]}"#).unwrap_err();
        assert!(matches!(err, AIError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let client = ClaudeClient::new(String::new());
        assert!(!client.is_available().await);
        assert!(matches!(
            client.complete("hi").await,
            Err(AIError::MissingApiKey)
        ));
    }
}
