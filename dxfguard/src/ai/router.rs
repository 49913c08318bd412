//! AI Router
//!
//! Routes prompts to the configured providers, alone, all together, or with
//! fallback for interactive questions.

use std::sync::Arc;

use chrono::Local;
use futures::future::join_all;
use tokio::sync::RwLock;

use crate::ai::claude::ClaudeClient;
use crate::ai::gemini::GeminiClient;
use crate::ai::insights::{combine_insights, AIAnalysis, CombinedAnalysis, ProviderFailure};
use crate::ai::openai::OpenAIClient;
use crate::ai::prompts::{build_chat_prompt, build_prompt, PromptType};
use crate::ai::provider::{AIError, AIProvider, ModelInfo};
use crate::config::DxfGuardConfig;

/// Provider order for interactive questions.
pub const CHAT_ORDER: [&str; 3] = ["openai", "claude", "gemini"];

/// Router that manages multiple AI providers
pub struct AIRouter {
    providers: Vec<Arc<dyn AIProvider>>,
    preferred_provider: RwLock<Option<String>>,
}

impl AIRouter {
    /// Create a new router with no providers configured
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            preferred_provider: RwLock::new(None),
        }
    }

    /// Build clients for every provider with an API key in `config`.
    pub fn from_config(config: &DxfGuardConfig) -> Self {
        let mut router = Self::new();
        let timeout = config.request_timeout_secs;

        if let Some(key) = config.openai_api_key.clone().filter(|k| !k.is_empty()) {
            let mut client = OpenAIClient::new(key).with_timeout(timeout);
            if let Some(model) = config.openai_model.clone() {
                client = client.with_model(model);
            }
            router.add_provider(Arc::new(client));
        }
        if let Some(key) = config.anthropic_api_key.clone().filter(|k| !k.is_empty()) {
            let mut client = ClaudeClient::new(key).with_timeout(timeout);
            if let Some(model) = config.claude_model.clone() {
                client = client.with_model(model);
            }
            router.add_provider(Arc::new(client));
        }
        if let Some(key) = config.google_api_key.clone().filter(|k| !k.is_empty()) {
            let mut client = GeminiClient::new(key).with_timeout(timeout);
            if let Some(model) = config.gemini_model.clone() {
                client = client.with_model(model);
            }
            router.add_provider(Arc::new(client));
        }

        router.preferred_provider = RwLock::new(config.preferred_provider.clone());
        router
    }

    pub fn add_provider(&mut self, provider: Arc<dyn AIProvider>) {
        self.providers.retain(|p| p.name() != provider.name());
        self.providers.push(provider);
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn AIProvider>> {
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Names of configured providers, in registration order.
    pub fn configured_providers(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn has_provider(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Set the preferred provider
    pub async fn set_preferred_provider(&self, provider: &str) {
        let mut pref = self.preferred_provider.write().await;
        *pref = Some(provider.to_string());
    }

    pub async fn get_preferred_provider(&self) -> Option<String> {
        self.preferred_provider.read().await.clone()
    }

    /// The preferred provider when configured, otherwise the first one.
    pub async fn get_provider(&self) -> Option<Arc<dyn AIProvider>> {
        let preferred = self.preferred_provider.read().await.clone();
        preferred
            .and_then(|name| self.provider(&name))
            .or_else(|| self.providers.first().cloned())
    }

    pub async fn get_model_info(&self) -> Option<ModelInfo> {
        self.get_provider().await.map(|p| p.model_info())
    }

    /// Analyze with one provider. `None` uses the preferred provider.
    pub async fn analyze(
        &self,
        provider: Option<&str>,
        prompt_type: PromptType,
        data: &serde_json::Value,
    ) -> Result<AIAnalysis, AIError> {
        let provider = match provider {
            Some(name) => self.provider(name).ok_or_else(|| {
                if CHAT_ORDER.contains(&name) {
                    AIError::MissingApiKey
                } else {
                    AIError::UnknownProvider(name.to_string())
                }
            })?,
            None => self.get_provider().await.ok_or(AIError::MissingApiKey)?,
        };

        tracing::info!("Using AI provider: {}", provider.name());
        run_analysis(provider.as_ref(), prompt_type, data).await
    }

    /// Run every configured provider concurrently.
    pub async fn analyze_with_all(
        &self,
        prompt_type: PromptType,
        data: &serde_json::Value,
    ) -> Result<CombinedAnalysis, AIError> {
        if self.providers.is_empty() {
            return Err(AIError::MissingApiKey);
        }

        let results = join_all(
            self.providers
                .iter()
                .map(|p| run_analysis(p.as_ref(), prompt_type, data)),
        )
        .await;

        let mut analyses = Vec::new();
        let mut failures = Vec::new();
        for (provider, result) in self.providers.iter().zip(results) {
            match result {
                Ok(analysis) => analyses.push(analysis),
                Err(e) => {
                    tracing::warn!("{} analysis failed: {}", provider.name(), e);
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let combined_insights = (analyses.len() > 1).then(|| combine_insights(&analyses));

        Ok(CombinedAnalysis {
            timestamp: Local::now().to_rfc3339(),
            models_used: analyses.iter().map(|a| a.model.clone()).collect(),
            analyses,
            failures,
            combined_insights,
        })
    }

    /// Answer a free-form question, trying providers in [`CHAT_ORDER`].
    pub async fn chat(&self, question: &str, context: &serde_json::Value) -> Result<String, AIError> {
        let prompt = build_chat_prompt(context, question);
        let mut last_error = AIError::MissingApiKey;

        for name in CHAT_ORDER {
            let Some(provider) = self.provider(name) else {
                continue;
            };
            match provider.complete(&prompt).await {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    tracing::warn!("{} failed to answer: {}", name, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

impl Default for AIRouter {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_analysis(
    provider: &dyn AIProvider,
    prompt_type: PromptType,
    data: &serde_json::Value,
) -> Result<AIAnalysis, AIError> {
    let prompt = build_prompt(prompt_type, data);
    let response = provider.complete(&prompt).await?;
    Ok(AIAnalysis::from_response(
        provider.name(),
        &provider.model_info().model_name,
        prompt_type,
        response,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedProvider {
        name: &'static str,
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl AIProvider for CannedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn complete(&self, _prompt: &str) -> Result<String, AIError> {
            self.reply.map(str::to_string).ok_or(AIError::ApiError {
                status: 500,
                message: "down".to_string(),
            })
        }

        fn model_info(&self) -> ModelInfo {
            ModelInfo {
                provider: self.name.to_string(),
                model_name: format!("{}-model", self.name),
                context_window: 1000,
            }
        }
    }

    fn canned(name: &'static str, reply: Option<&'static str>) -> Arc<dyn AIProvider> {
        Arc::new(CannedProvider { name, reply })
    }

    const REPLY: &str = "Issues:\n- Missing centre lines\n";

    #[tokio::test]
    async fn test_router_no_providers() {
        let router = AIRouter::new();
        assert!(router.get_provider().await.is_none());
        assert!(matches!(
            router.analyze(None, PromptType::Analysis, &serde_json::json!({})).await,
            Err(AIError::MissingApiKey)
        ));
        assert!(matches!(
            router.analyze_with_all(PromptType::Analysis, &serde_json::json!({})).await,
            Err(AIError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_preferred_provider() {
        let mut router = AIRouter::new();
        router.add_provider(canned("openai", Some(REPLY)));
        router.add_provider(canned("claude", Some(REPLY)));

        assert_eq!(router.get_provider().await.unwrap().name(), "openai");
        router.set_preferred_provider("claude").await;
        assert_eq!(router.get_provider().await.unwrap().name(), "claude");
    }

    #[tokio::test]
    async fn test_analyze_named_provider() {
        let mut router = AIRouter::new();
        router.add_provider(canned("gemini", Some(REPLY)));

        let analysis = router
            .analyze(Some("gemini"), PromptType::DesignReview, &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(analysis.model, "gemini-model");
        assert_eq!(analysis.issues, vec!["Missing centre lines"]);

        assert!(matches!(
            router.analyze(Some("claude"), PromptType::Analysis, &serde_json::json!({})).await,
            Err(AIError::MissingApiKey)
        ));
        assert!(matches!(
            router.analyze(Some("llama"), PromptType::Analysis, &serde_json::json!({})).await,
            Err(AIError::UnknownProvider(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_with_all_collects_failures() {
        let mut router = AIRouter::new();
        router.add_provider(canned("openai", Some(REPLY)));
        router.add_provider(canned("claude", None));
        router.add_provider(canned("gemini", Some(REPLY)));

        let combined = router
            .analyze_with_all(PromptType::Analysis, &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(combined.models_used, vec!["openai-model", "gemini-model"]);
        assert_eq!(combined.failures.len(), 1);
        assert_eq!(combined.failures[0].provider, "claude");
        let insights = combined.combined_insights.unwrap();
        assert_eq!(insights.common_issues, vec!["missing centre lines"]);
    }

    #[tokio::test]
    async fn test_chat_falls_back_in_order() {
        let mut router = AIRouter::new();
        router.add_provider(canned("gemini", Some("from gemini")));
        router.add_provider(canned("openai", None));

        let answer = router.chat("why?", &serde_json::json!({})).await.unwrap();
        assert_eq!(answer, "from gemini");
    }

    #[test]
    fn test_from_config_skips_empty_keys() {
        let config = DxfGuardConfig {
            anthropic_api_key: Some("key".to_string()),
            openai_api_key: Some(String::new()),
            ..Default::default()
        };
        let router = AIRouter::from_config(&config);
        assert_eq!(router.configured_providers(), vec!["claude"]);
    }
}
