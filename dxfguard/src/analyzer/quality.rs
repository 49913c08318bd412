//! Weighted drawing quality score.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzer::complexity::calculate_complexity;
use crate::analyzer::rules::{
    dimension_outliers, dominant_entity_types, distinct_text_heights,
    has_unsystematic_layer_names, uses_only_default_layer, Issue, RulesEngine, QUALITY_RULE_IDS,
};
use crate::parser::schema::DrawingData;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn letter(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::A => "Excellent",
            Grade::B => "Good",
            Grade::C => "Fair",
            Grade::D => "Poor",
            Grade::F => "Needs improvement",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.letter(), self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub overall_score: f64,
    pub layer_score: f64,
    pub dimension_score: f64,
    pub distribution_score: f64,
    pub text_score: f64,
    pub issues: Vec<Issue>,
    pub grade: Grade,
}

pub fn layer_score(drawing: &DrawingData) -> f64 {
    if drawing.layers.is_empty() {
        return 0.0;
    }
    let mut score = 100.0;
    if uses_only_default_layer(&drawing.layers) {
        score -= 30.0;
    }
    if has_unsystematic_layer_names(&drawing.layers) {
        score -= 20.0;
    }
    score
}

pub fn dimension_score(drawing: &DrawingData) -> f64 {
    let outliers = dimension_outliers(&drawing.positive_measurements()).len() as f64;
    100.0 - (outliers * 5.0).min(20.0)
}

pub fn distribution_score(drawing: &DrawingData) -> f64 {
    if drawing.entity_breakdown.is_empty() {
        return 0.0;
    }
    100.0 - 15.0 * dominant_entity_types(drawing).len() as f64
}

pub fn text_score(drawing: &DrawingData) -> f64 {
    if distinct_text_heights(drawing) > 5 {
        90.0
    } else {
        100.0
    }
}

pub fn analyze_quality(drawing: &DrawingData) -> QualityMetrics {
    let layer_score = layer_score(drawing);
    let dimension_score = dimension_score(drawing);
    let distribution_score = distribution_score(drawing);
    let text_score = text_score(drawing);

    let mut score = 100.0
        - (100.0 - layer_score) * 0.2
        - (100.0 - dimension_score) * 0.3
        - (100.0 - distribution_score) * 0.1
        - (100.0 - text_score) * 0.1;
    if calculate_complexity(drawing).is_high() {
        score -= 10.0;
    }
    let overall_score = score.max(0.0);

    QualityMetrics {
        overall_score,
        layer_score,
        dimension_score,
        distribution_score,
        text_score,
        issues: RulesEngine::with_rules(QUALITY_RULE_IDS).analyze(drawing),
        grade: Grade::from_score(overall_score),
    }
}

pub fn quality_recommendations(metrics: &QualityMetrics) -> Vec<String> {
    let mut recommendations = Vec::new();
    if metrics.layer_score < 80.0 {
        recommendations
            .push("Organize layers and apply a standard naming convention.".to_string());
    }
    if metrics.dimension_score < 80.0 {
        recommendations.push("Review dimension accuracy and check outlying values.".to_string());
    }
    if metrics.text_score < 80.0 {
        recommendations.push("Unify text styles to improve consistency.".to_string());
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::LayerInfo;

    #[test]
    fn test_only_default_layer_scores() {
        let mut data = DrawingData::default();
        data.layers = vec![LayerInfo::new("0", 7, "CONTINUOUS")];
        data.entity_breakdown.insert("LINE".to_string(), 5);
        data.entity_breakdown.insert("CIRCLE".to_string(), 5);
        data.refresh_summary();

        let q = analyze_quality(&data);
        assert_eq!(q.layer_score, 50.0);
        assert_eq!(q.dimension_score, 100.0);
        assert_eq!(q.distribution_score, 100.0);
        assert_eq!(q.text_score, 100.0);
        assert!((q.overall_score - 90.0).abs() < 1e-9);
        assert_eq!(q.grade, Grade::A);
        assert_eq!(q.issues.len(), 2);
        assert_eq!(quality_recommendations(&q).len(), 1);
    }

    #[test]
    fn test_empty_drawing_scores() {
        let q = analyze_quality(&DrawingData::default());
        assert_eq!(q.layer_score, 0.0);
        assert_eq!(q.distribution_score, 0.0);
        // 100 - 20 - 10
        assert!((q.overall_score - 70.0).abs() < 1e-9);
        assert_eq!(q.grade, Grade::C);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.9), Grade::B);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.9), Grade::F);
        assert_eq!(Grade::A.to_string(), "A (Excellent)");
    }
}
