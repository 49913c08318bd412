pub mod claude;
pub mod gemini;
pub mod insights;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod router;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use insights::{
    combine_insights, extract_issues, extract_recommendations, AIAnalysis, CombinedAnalysis,
    CombinedInsights, Confidence,
};
pub use openai::OpenAIClient;
pub use prompts::{prepare_data_for_ai, AiContext, PromptType};
pub use provider::{AIError, AIProvider, ModelInfo};
pub use router::AIRouter;
