//! Bundled analysis used for advanced reports and AI context.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyzer::anomalies::detect_anomalies;
use crate::analyzer::complexity::{calculate_complexity, ComplexityLevel, ComplexityMetrics};
use crate::analyzer::patterns::{detect_patterns, PatternAnalysis};
use crate::analyzer::quality::{analyze_quality, quality_recommendations, Grade, QualityMetrics};
use crate::analyzer::rules::Issue;
use crate::analyzer::standards::{check_compliance, ComplianceReport};
use crate::parser::schema::DrawingData;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementSuggestion {
    pub priority: Priority,
    pub category: String,
    pub suggestion: String,
    pub impact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub file_name: String,
    pub total_entities: usize,
    pub quality_score: f64,
    pub quality_grade: Grade,
    pub complexity_level: ComplexityLevel,
    pub standards_compliant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAnalysis {
    pub score: f64,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedAnalysis {
    pub summary: AnalysisSummary,
    pub quality_analysis: QualityAnalysis,
    pub quality_metrics: QualityMetrics,
    pub complexity_analysis: ComplexityMetrics,
    pub standards_compliance: ComplianceReport,
    pub anomalies: Vec<Issue>,
    pub patterns: PatternAnalysis,
    pub key_insights: Vec<String>,
    pub improvement_suggestions: Vec<ImprovementSuggestion>,
}

impl AdvancedAnalysis {
    pub fn has_duplicate_circles(&self) -> bool {
        self.anomalies.iter().any(|a| a.rule_id == "duplicate_circle")
    }
}

pub fn analyze_advanced(drawing: &DrawingData) -> AdvancedAnalysis {
    let quality = analyze_quality(drawing);
    let complexity = calculate_complexity(drawing);
    let compliance = check_compliance(drawing);
    let anomalies = detect_anomalies(drawing);
    let patterns = detect_patterns(drawing);

    let key_insights = key_insights(&quality, &complexity, &compliance, &anomalies, &patterns);
    let improvement_suggestions =
        improvement_suggestions(&quality, &complexity, &compliance, &anomalies);

    info!(
        "Advanced analysis of {}: quality {:.1} ({}), {} anomalies",
        drawing.file_info.filename,
        quality.overall_score,
        quality.grade.letter(),
        anomalies.len()
    );

    AdvancedAnalysis {
        summary: AnalysisSummary {
            file_name: if drawing.file_info.filename.is_empty() {
                "unknown".to_string()
            } else {
                drawing.file_info.filename.clone()
            },
            total_entities: drawing.summary_info.total_entities,
            quality_score: quality.overall_score,
            quality_grade: quality.grade,
            complexity_level: complexity.complexity_level,
            standards_compliant: compliance.compliant,
        },
        quality_analysis: QualityAnalysis {
            score: quality.overall_score,
            issues: quality.issues.clone(),
            recommendations: quality_recommendations(&quality),
        },
        quality_metrics: quality,
        complexity_analysis: complexity,
        standards_compliance: compliance,
        anomalies,
        patterns,
        key_insights,
        improvement_suggestions,
    }
}

fn key_insights(
    quality: &QualityMetrics,
    complexity: &ComplexityMetrics,
    compliance: &ComplianceReport,
    anomalies: &[Issue],
    patterns: &PatternAnalysis,
) -> Vec<String> {
    let mut insights = Vec::new();

    if quality.overall_score < 70.0 {
        insights.push(format!(
            "Drawing quality is grade {}; improvement is needed.",
            quality.grade
        ));
    } else if quality.overall_score > 90.0 {
        insights.push("Drawing quality is excellent.".to_string());
    }

    if complexity.overall_complexity > 0.7 {
        insights.push("The drawing is complex; readability may need improvement.".to_string());
    }

    if !compliance.compliant {
        insights.push(format!(
            "{} standards violation(s) found.",
            compliance.violations.len()
        ));
    }

    if !anomalies.is_empty() {
        insights.push(format!("{} anomaly(ies) detected.", anomalies.len()));
    }

    if patterns.repeated_dimensions.found {
        insights.push(
            "Repeated dimension values found; the design may be a candidate for standardization."
                .to_string(),
        );
    }

    insights
}

fn improvement_suggestions(
    quality: &QualityMetrics,
    complexity: &ComplexityMetrics,
    compliance: &ComplianceReport,
    anomalies: &[Issue],
) -> Vec<ImprovementSuggestion> {
    let mut suggestions = Vec::new();

    if quality.overall_score < 60.0 {
        suggestions.push(ImprovementSuggestion {
            priority: Priority::High,
            category: "quality".to_string(),
            suggestion: "Drawing quality needs urgent work. Start with layer organization and entity cleanup."
                .to_string(),
            impact: "Much better readability and maintainability".to_string(),
        });
    }

    if complexity.is_high() {
        suggestions.push(ImprovementSuggestion {
            priority: Priority::Medium,
            category: "complexity".to_string(),
            suggestion: "Consider splitting the drawing into several sheets or separate detail views."
                .to_string(),
            impact: "Easier to understand, fewer errors".to_string(),
        });
    }

    if !compliance.compliant {
        suggestions.push(ImprovementSuggestion {
            priority: Priority::Medium,
            category: "standards".to_string(),
            suggestion: "Adjust layer names and linetypes to the ISO/KS standards.".to_string(),
            impact: "Better compatibility and collaboration".to_string(),
        });
    }

    if !anomalies.is_empty() {
        suggestions.push(ImprovementSuggestion {
            priority: Priority::High,
            category: "anomaly".to_string(),
            suggestion: "Review and fix the detected anomalies.".to_string(),
            impact: "Higher drawing accuracy".to_string(),
        });
    }

    suggestions.sort_by_key(|s| s.priority);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::{CircleInfo, LayerInfo, Point3};

    #[test]
    fn test_suggestions_sorted_by_priority() {
        let mut data = DrawingData::default();
        data.layers = (0..5)
            .map(|i| LayerInfo::new(format!("center{}", i), 7, "CENTER"))
            .collect();
        data.circles = vec![
            CircleInfo::new("0", Point3::default(), 2.0),
            CircleInfo::new("0", Point3::default(), 2.0),
        ];
        data.entity_breakdown.insert("CIRCLE".to_string(), 2);
        data.refresh_summary();

        let analysis = analyze_advanced(&data);
        assert!(!analysis.summary.standards_compliant);
        assert!(analysis.has_duplicate_circles());

        let priorities: Vec<Priority> = analysis
            .improvement_suggestions
            .iter()
            .map(|s| s.priority)
            .collect();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium]);
        assert!(analysis
            .key_insights
            .iter()
            .any(|i| i.contains("standards violation")));
    }

    #[test]
    fn test_unknown_file_name() {
        let analysis = analyze_advanced(&DrawingData::default());
        assert_eq!(analysis.summary.file_name, "unknown");
    }
}
