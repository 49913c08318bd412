//! ISO layer colour and linetype conventions.

use serde::{Deserialize, Serialize};

use crate::analyzer::rules::Severity;
use crate::parser::schema::{DrawingData, LayerInfo};

/// Compliance threshold (inclusive).
pub const COMPLIANT_SCORE: f64 = 80.0;

const COLOR_PENALTY: f64 = 5.0;
const LINETYPE_PENALTY: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
pub struct IsoLayerStandard {
    /// Substrings matched against the lower-cased layer name.
    pub keywords: &'static [&'static str],
    pub color: i16,
    pub color_name: &'static str,
    /// Empty when the standard has no linetype requirement.
    pub linetypes: &'static [&'static str],
}

pub const ISO_LAYER_STANDARDS: &[IsoLayerStandard] = &[
    IsoLayerStandard {
        keywords: &["외곽선", "outline"],
        color: 7,
        color_name: "white",
        linetypes: &["CONTINUOUS"],
    },
    IsoLayerStandard {
        keywords: &["중심선", "center"],
        color: 1,
        color_name: "red",
        linetypes: &["CENTER", "DASHDOT"],
    },
    IsoLayerStandard {
        keywords: &["숨김선", "hidden"],
        color: 3,
        color_name: "green",
        linetypes: &["HIDDEN", "DASHED"],
    },
    IsoLayerStandard {
        keywords: &["치수선", "dimension"],
        color: 2,
        color_name: "yellow",
        linetypes: &[],
    },
    IsoLayerStandard {
        keywords: &["절단선", "cutting"],
        color: 4,
        color_name: "cyan",
        linetypes: &[],
    },
];

impl IsoLayerStandard {
    pub fn matches(&self, layer_name: &str) -> bool {
        let lower = layer_name.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k))
    }
}

/// Standards whose keywords appear in the layer name.
pub fn standards_for_layer(layer_name: &str) -> impl Iterator<Item = &'static IsoLayerStandard> + '_ {
    ISO_LAYER_STANDARDS.iter().filter(move |s| s.matches(layer_name))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    LayerColor,
    Linetype,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceViolation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub layer: String,
    pub message: String,
    /// What the standard expects, in words.
    pub expected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub standard: String,
    pub compliance_score: f64,
    pub violations: Vec<ComplianceViolation>,
    pub compliant: bool,
}

impl ComplianceReport {
    /// Names of layers with at least one violation, deduplicated in order.
    pub fn violating_layers(&self) -> Vec<&str> {
        let mut layers: Vec<&str> = Vec::new();
        for v in &self.violations {
            if !layers.contains(&v.layer.as_str()) {
                layers.push(&v.layer);
            }
        }
        layers
    }
}

/// Colour violations first, then linetype violations.
pub fn layer_violations(layers: &[LayerInfo]) -> Vec<ComplianceViolation> {
    let mut violations = Vec::new();

    for layer in layers {
        for standard in standards_for_layer(&layer.name) {
            if layer.color != standard.color {
                violations.push(ComplianceViolation {
                    kind: ViolationKind::LayerColor,
                    severity: Severity::Warning,
                    layer: layer.name.clone(),
                    message: format!(
                        "Layer '{}' colour {} differs from the ISO standard (recommended: {})",
                        layer.name, layer.color, standard.color_name
                    ),
                    expected: format!("Set the layer colour to {} ({})", standard.color, standard.color_name),
                });
            }
        }
    }

    for layer in layers {
        let linetype = layer.linetype.to_uppercase();
        for standard in standards_for_layer(&layer.name) {
            if !standard.linetypes.is_empty() && !standard.linetypes.contains(&linetype.as_str()) {
                violations.push(ComplianceViolation {
                    kind: ViolationKind::Linetype,
                    severity: Severity::Info,
                    layer: layer.name.clone(),
                    message: format!(
                        "Layer '{}' linetype {} differs from the standard",
                        layer.name, layer.linetype
                    ),
                    expected: format!("Use linetype {}", standard.linetypes.join(" or ")),
                });
            }
        }
    }

    violations
}

pub fn check_compliance(drawing: &DrawingData) -> ComplianceReport {
    let violations = layer_violations(&drawing.layers);
    let color_count = violations
        .iter()
        .filter(|v| v.kind == ViolationKind::LayerColor)
        .count() as f64;
    let linetype_count = violations.len() as f64 - color_count;

    let score = 100.0 - color_count * COLOR_PENALTY - linetype_count * LINETYPE_PENALTY;

    ComplianceReport {
        standard: "ISO".to_string(),
        compliance_score: score.max(0.0),
        violations,
        compliant: score >= COMPLIANT_SCORE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliant_layers() {
        let mut data = DrawingData::default();
        data.layers = vec![
            LayerInfo::new("외곽선", 7, "CONTINUOUS"),
            LayerInfo::new("중심선", 1, "CENTER"),
            LayerInfo::new("숨김선", 3, "HIDDEN"),
            LayerInfo::new("치수선", 2, "CONTINUOUS"),
        ];
        let report = check_compliance(&data);
        assert!(report.violations.is_empty());
        assert_eq!(report.compliance_score, 100.0);
        assert!(report.compliant);
    }

    #[test]
    fn test_colour_and_linetype_penalties() {
        let mut data = DrawingData::default();
        data.layers = vec![
            LayerInfo::new("CENTER", 7, "Continuous"),
            LayerInfo::new("hidden-lines", 3, "dashed"),
        ];
        let report = check_compliance(&data);
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.violations[0].kind, ViolationKind::LayerColor);
        assert_eq!(report.violations[1].kind, ViolationKind::Linetype);
        assert_eq!(report.compliance_score, 92.0);
        assert_eq!(report.violating_layers(), vec!["CENTER"]);
    }

    #[test]
    fn test_non_compliant_below_threshold() {
        let mut data = DrawingData::default();
        data.layers = (0..5)
            .map(|i| LayerInfo::new(format!("center{}", i), 7, "CENTER"))
            .collect();
        let report = check_compliance(&data);
        assert_eq!(report.compliance_score, 75.0);
        assert!(!report.compliant);
    }
}
