use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parser::schema::DrawingData;

/// Threshold above which a drawing counts as too complex.
pub const HIGH_COMPLEXITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComplexityLevel {
    VerySimple,
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

impl ComplexityLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.2 {
            ComplexityLevel::VerySimple
        } else if score < 0.4 {
            ComplexityLevel::Simple
        } else if score < 0.6 {
            ComplexityLevel::Moderate
        } else if score < 0.8 {
            ComplexityLevel::Complex
        } else {
            ComplexityLevel::VeryComplex
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComplexityLevel::VerySimple => "very simple",
            ComplexityLevel::Simple => "simple",
            ComplexityLevel::Moderate => "moderate",
            ComplexityLevel::Complex => "complex",
            ComplexityLevel::VeryComplex => "very complex",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub overall_complexity: f64,
    pub entity_complexity: f64,
    pub layer_complexity: f64,
    pub type_complexity: f64,
    pub complexity_level: ComplexityLevel,
}

impl ComplexityMetrics {
    pub fn is_high(&self) -> bool {
        self.overall_complexity > HIGH_COMPLEXITY
    }
}

/// Weighted complexity in `[0, 1]` from entity, layer and type counts.
pub fn calculate_complexity(data: &DrawingData) -> ComplexityMetrics {
    let entity_complexity = (data.summary_info.total_entities as f64 / 10_000.0).min(1.0);
    let layer_complexity = (data.summary_info.layer_count as f64 / 50.0).min(1.0);
    let type_complexity = (data.entity_breakdown.len() as f64 / 20.0).min(1.0);

    let overall_complexity =
        entity_complexity * 0.5 + layer_complexity * 0.3 + type_complexity * 0.2;

    ComplexityMetrics {
        overall_complexity,
        entity_complexity,
        layer_complexity,
        type_complexity,
        complexity_level: ComplexityLevel::from_score(overall_complexity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_weights() {
        let mut data = DrawingData::default();
        data.summary_info.total_entities = 5_000;
        data.summary_info.layer_count = 100;
        for t in ["LINE", "CIRCLE", "ARC", "TEXT"] {
            data.entity_breakdown.insert(t.to_string(), 1);
        }

        let c = calculate_complexity(&data);
        assert!((c.entity_complexity - 0.5).abs() < 1e-9);
        assert_eq!(c.layer_complexity, 1.0);
        assert!((c.type_complexity - 0.2).abs() < 1e-9);
        assert!((c.overall_complexity - 0.59).abs() < 1e-9);
        assert_eq!(c.complexity_level, ComplexityLevel::Moderate);
        assert!(!c.is_high());
    }

    #[test]
    fn test_empty_drawing_is_very_simple() {
        let c = calculate_complexity(&DrawingData::default());
        assert_eq!(c.overall_complexity, 0.0);
        assert_eq!(c.complexity_level, ComplexityLevel::VerySimple);
    }
}
