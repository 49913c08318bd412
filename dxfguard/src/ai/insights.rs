//! Model answers and the bullet points pulled out of them.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::ai::prompts::PromptType;

const MAX_EXTRACTED: usize = 5;
const MAX_COMBINED: usize = 3;
const GROUP_KEY_CHARS: usize = 30;

const RECOMMENDATION_KEYWORDS: &[&str] = &["권장", "제안", "추천", "recommend"];
const ISSUE_KEYWORDS: &[&str] = &["문제", "이슈", "issue", "problem"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIAnalysis {
    pub provider: String,
    pub model: String,
    pub timestamp: String,
    pub prompt_type: PromptType,
    pub analysis: String,
    pub recommendations: Vec<String>,
    pub issues: Vec<String>,
}

impl AIAnalysis {
    pub fn from_response(provider: &str, model: &str, prompt_type: PromptType, response: String) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            timestamp: Local::now().to_rfc3339(),
            prompt_type,
            recommendations: extract_recommendations(&response),
            issues: extract_issues(&response),
            analysis: response,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedInsights {
    pub common_issues: Vec<String>,
    pub common_recommendations: Vec<String>,
    pub confidence_level: Confidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedAnalysis {
    pub timestamp: String,
    pub models_used: Vec<String>,
    pub analyses: Vec<AIAnalysis>,
    pub failures: Vec<ProviderFailure>,
    /// Only present when more than one provider answered.
    pub combined_insights: Option<CombinedInsights>,
}

pub fn extract_recommendations(response: &str) -> Vec<String> {
    extract_section(response, RECOMMENDATION_KEYWORDS)
}

pub fn extract_issues(response: &str) -> Vec<String> {
    extract_section(response, ISSUE_KEYWORDS)
}

/// Collect bullet lines following a line that contains one of `keywords`.
/// The first non-bullet line after at least one bullet ends the section.
fn extract_section(response: &str, keywords: &[&str]) -> Vec<String> {
    let mut items = Vec::new();
    let mut in_section = false;

    for line in response.lines() {
        let lower = line.to_lowercase();
        if keywords.iter().any(|k| lower.contains(k)) {
            in_section = true;
            continue;
        }

        let trimmed = line.trim();
        if !in_section || trimmed.is_empty() {
            continue;
        }

        if is_bullet(trimmed) {
            items.push(
                trimmed
                    .trim_start_matches(|c: char| "-*•0123456789. ".contains(c))
                    .to_string(),
            );
        } else if !items.is_empty() {
            break;
        }
    }

    items.truncate(MAX_EXTRACTED);
    items
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(['-', '*', '•', '1', '2', '3'])
}

pub fn combine_insights(analyses: &[AIAnalysis]) -> CombinedInsights {
    CombinedInsights {
        common_issues: most_frequent(analyses.iter().flat_map(|a| a.issues.iter())),
        common_recommendations: most_frequent(analyses.iter().flat_map(|a| a.recommendations.iter())),
        confidence_level: if analyses.len() > 1 {
            Confidence::High
        } else {
            Confidence::Medium
        },
    }
}

/// Group items on their lower-cased 30-character prefix and return the
/// most frequent groups, first-seen order breaking ties.
fn most_frequent<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        let key: String = item.to_lowercase().chars().take(GROUP_KEY_CHARS).collect();
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(MAX_COMBINED).map(|(k, _)| k).collect()
}
