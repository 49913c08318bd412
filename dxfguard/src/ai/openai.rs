use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::provider::{
    http_client, send_with_retry, AIError, AIProvider, ModelInfo, DEFAULT_TIMEOUT_SECS,
    MAX_TOKENS, TEMPERATURE,
};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4";
const SYSTEM_PROMPT: &str = "You are an expert CAD drawing analyst.";

/// OpenAI Chat Completions client.
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAIClient {
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
}

#[async_trait]
impl AIProvider for OpenAIClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, prompt: &str) -> Result<String, AIError> {
        if self.api_key.is_empty() {
            return Err(AIError::MissingApiKey);
        }

        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let resp = send_with_retry("openai", || {
            self.client
                .post(OPENAI_API_URL)
                .bearer_auth(&self.api_key)
                .json(&request_body)
        })
        .await?;

        let body = resp
            .text()
            .await
            .map_err(|e| AIError::ParseError(format!("Failed to read body: {}", e)))?;
        parse_response(&body)
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "openai".to_string(),
            model_name: self.model.clone(),
            context_window: 8192,
        }
    }
}

fn parse_response(body: &str) -> Result<String, AIError> {
    let resp: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AIError::ParseError(format!("Failed to parse JSON: {}", e)))?;

    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AIError::InvalidResponse("No choices in response".to_string()))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Use ISO layers."}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "Use ISO layers.");
    }

    #[test]
    fn test_parse_no_choices() {
        assert!(matches!(
            parse_response(r#"{"choices":[]}"#),
            Err(AIError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_response("<html>"), Err(AIError::ParseError(_))));
    }
}
