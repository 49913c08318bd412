use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ai::provider::AIError;
use crate::analyzer::insights::AdvancedAnalysis;
use crate::parser::schema::{DrawingData, FileInfo, SummaryInfo};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    Analysis,
    Comparison,
    Autofix,
    DesignReview,
    CncAnalysis,
    CostEstimation,
}

impl PromptType {
    pub const ALL: [PromptType; 6] = [
        PromptType::Analysis,
        PromptType::Comparison,
        PromptType::Autofix,
        PromptType::DesignReview,
        PromptType::CncAnalysis,
        PromptType::CostEstimation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::Analysis => "analysis",
            PromptType::Comparison => "comparison",
            PromptType::Autofix => "autofix",
            PromptType::DesignReview => "design_review",
            PromptType::CncAnalysis => "cnc_analysis",
            PromptType::CostEstimation => "cost_estimation",
        }
    }

    /// Template with a single `{data}` placeholder.
    pub fn template(&self) -> &'static str {
        match self {
            PromptType::Analysis => {
                r#"You are an expert CAD drawing analyst. Review the following DXF drawing analysis data and give your professional opinion:

{data}

Analyze it from these angles:
1. Drawing quality assessment
2. Potential problems
3. Recommended improvements
4. Compliance with industry standards
5. Design efficiency

Expert answer:"#
            }
            PromptType::Comparison => {
                r#"These are the results of comparing two DXF drawings:

{data}

Please analyze:
1. What the main changes mean
2. Whether the design improved
3. Potential problems or risks
4. Version control suggestions

Expert opinion:"#
            }
            PromptType::Autofix => {
                r#"The following problems were found in a DXF drawing:

{data}

For each problem:
1. Assess its severity
2. Recommend how to fix it
3. Set a fix priority
4. Explain how to prevent it

Expert advice:"#
            }
            PromptType::DesignReview => {
                r#"Please review the design of this DXF drawing:

{data}

Review items:
1. Design integrity
2. Manufacturability
3. Cost efficiency
4. Safety considerations
5. Optimization opportunities

Design review:"#
            }
            PromptType::CncAnalysis => {
                r#"You are a CNC machining expert. Analyze the following DXF drawing from a CNC machining perspective:

{data}

Please evaluate:
1. Machinability
2. Recommended tools and cutting conditions
3. Estimated machining time
4. Potential machining problems
5. Toolpath optimization suggestions

CNC expert analysis:"#
            }
            PromptType::CostEstimation => {
                r#"You are a manufacturing cost expert. Analyze the manufacturing cost of the following DXF drawing:

{data}

Please estimate:
1. Material cost
2. Machining time and labor cost
3. Tool and consumable cost
4. Setup time
5. Total manufacturing cost range

Cost analysis:"#
            }
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptType {
    type Err = AIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        PromptType::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| AIError::UnknownPromptType(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualitySummary {
    pub score: f64,
    pub grade: String,
}

/// Compact drawing summary sent to the models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiContext {
    pub file_info: FileInfo,
    pub summary: SummaryInfo,
    pub entity_breakdown: BTreeMap<String, usize>,
    pub layer_count: usize,
    pub total_entities: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_types: Option<Vec<String>>,
}

pub fn prepare_data_for_ai(drawing: &DrawingData, analysis: Option<&AdvancedAnalysis>) -> AiContext {
    let quality = analysis.map(|a| QualitySummary {
        score: a.summary.quality_score,
        grade: a.summary.quality_grade.to_string(),
    });
    let anomaly_types = analysis.map(|a| {
        a.anomalies
            .iter()
            .map(|i| i.rule_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    });

    AiContext {
        file_info: drawing.file_info.clone(),
        summary: drawing.summary_info.clone(),
        entity_breakdown: drawing.entity_breakdown.clone(),
        layer_count: drawing.layers.len(),
        total_entities: drawing.summary_info.total_entities,
        quality,
        anomaly_count: analysis.map(|a| a.anomalies.len()),
        anomaly_types,
    }
}

pub fn build_prompt(prompt_type: PromptType, data: &serde_json::Value) -> String {
    let data = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    prompt_type.template().replace("{data}", &data)
}

pub fn build_chat_prompt(context: &serde_json::Value, question: &str) -> String {
    let context = serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
    format!(
        "DXF drawing analysis context:\n{}\n\nUser question: {}\n\nExpert answer:",
        context, question
    )
}
