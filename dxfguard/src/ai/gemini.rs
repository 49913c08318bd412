use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::provider::{
    http_client, send_with_retry, AIError, AIProvider, ModelInfo, DEFAULT_TIMEOUT_SECS,
    MAX_TOKENS, TEMPERATURE,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Google Gemini generateContent client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
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

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.model)
    }
}

#[async_trait]
impl AIProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, prompt: &str) -> Result<String, AIError> {
        if self.api_key.is_empty() {
            return Err(AIError::MissingApiKey);
        }

        let request_body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                candidate_count: 1,
                max_output_tokens: MAX_TOKENS,
                temperature: TEMPERATURE,
            },
        };

        let url = self.endpoint();
        let resp = send_with_retry("gemini", || {
            self.client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
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
            provider: "gemini".to_string(),
            model_name: self.model.clone(),
            context_window: 32768,
        }
    }
}

fn parse_response(body: &str) -> Result<String, AIError> {
    let resp: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| AIError::ParseError(format!("Failed to parse JSON: {}", e)))?;

    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AIError::InvalidResponse(
            "No candidate text in response".to_string(),
        ));
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    candidate_count: u32,
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}
