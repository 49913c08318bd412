use crate::analyzer::anomalies;
use crate::analyzer::complexity::calculate_complexity;
use crate::analyzer::standards::{self, ViolationKind};
use crate::analyzer::stats;
use crate::parser::schema::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub rule_id: String,
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub layer: Option<String>,
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn new(
        rule_id: &str,
        severity: Severity,
        category: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            rule_id: rule_id.to_string(),
            severity,
            category: category.to_string(),
            message: message.into(),
            layer: None,
            suggestion: None,
        }
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn severity(&self) -> Severity;
    fn check(&self, drawing: &DrawingData) -> Vec<Issue>;
}

/// Ids of the rules feeding the quality score.
pub const QUALITY_RULE_IDS: &[&str] = &[
    "layer_organization",
    "dimension_outliers",
    "entity_distribution",
    "text_consistency",
    "drawing_complexity",
];

pub const ANOMALY_RULE_IDS: &[&str] = &["duplicate_circle", "text_scale"];

pub struct RulesEngine {
    rules: Vec<Arc<dyn Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Arc::new(LayerOrganizationRule));
        engine.add_rule(Arc::new(DimensionOutlierRule));
        engine.add_rule(Arc::new(EntityDistributionRule));
        engine.add_rule(Arc::new(TextConsistencyRule));
        engine.add_rule(Arc::new(DrawingComplexityRule));
        engine.add_rule(Arc::new(IsoLayerColorRule));
        engine.add_rule(Arc::new(IsoLinetypeRule));
        engine.add_rule(Arc::new(DuplicateCircleRule));
        engine.add_rule(Arc::new(TextScaleRule));
        engine
    }

    /// Default rules filtered to the given ids. Unknown ids are ignored;
    /// use [`RulesEngine::try_with_rules`] for user-supplied ids.
    pub fn with_rules<S: AsRef<str>>(ids: &[S]) -> Self {
        let mut engine = Self::with_default_rules();
        engine
            .rules
            .retain(|r| ids.iter().any(|id| id.as_ref() == r.id()));
        engine
    }

    /// Like [`RulesEngine::with_rules`], but the first id that names no
    /// default rule is returned as the error.
    pub fn try_with_rules<S: AsRef<str>>(ids: &[S]) -> Result<Self, String> {
        let engine = Self::with_default_rules();
        if let Some(unknown) = ids
            .iter()
            .map(AsRef::as_ref)
            .find(|id| !engine.rules.iter().any(|r| r.id() == *id))
        {
            return Err(unknown.to_string());
        }
        Ok(Self::with_rules(ids))
    }

    /// Ids of every default rule, in run order.
    pub fn default_rule_ids() -> Vec<String> {
        Self::with_default_rules()
            .rules
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    pub fn add_rule(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter()
    }

    pub fn analyze(&self, drawing: &DrawingData) -> Vec<Issue> {
        let mut issues = Vec::new();
        for rule in &self.rules {
            issues.extend(rule.check(drawing));
        }
        issues
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

// Helper functions

/// Case-insensitive substrings that mark a layer name as meaningful.
pub const MEANINGFUL_LAYER_PATTERNS: &[&str] = &[
    "치수", "dimension", "dim", "중심선", "center", "cen", "숨김선", "hidden", "hid", "텍스트",
    "text", "txt", "해치", "hatch", "hat",
];

pub fn is_meaningful_layer_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    MEANINGFUL_LAYER_PATTERNS.iter().any(|p| lower.contains(p))
}

pub fn uses_only_default_layer(layers: &[LayerInfo]) -> bool {
    layers.len() == 1 && layers[0].name == "0"
}

pub fn has_unsystematic_layer_names(layers: &[LayerInfo]) -> bool {
    let meaningful = layers
        .iter()
        .filter(|l| is_meaningful_layer_name(&l.name))
        .count();
    (meaningful as f64) < layers.len() as f64 * 0.5
}

/// Positive measurements further than three sample deviations from the mean.
pub fn dimension_outliers(measurements: &[f64]) -> Vec<f64> {
    let (Some(mean), Some(sd)) = (stats::mean(measurements), stats::sample_std_dev(measurements))
    else {
        return Vec::new();
    };
    if sd <= 0.0 {
        return Vec::new();
    }
    measurements
        .iter()
        .copied()
        .filter(|m| (m - mean).abs() > 3.0 * sd)
        .collect()
}

/// Entity types holding more than 70% of all entities, with their share.
pub fn dominant_entity_types(drawing: &DrawingData) -> Vec<(String, f64)> {
    let total = drawing.total_entities();
    if total == 0 {
        return Vec::new();
    }
    drawing
        .entity_breakdown
        .iter()
        .map(|(t, c)| (t.clone(), *c as f64 / total as f64))
        .filter(|(_, ratio)| *ratio > 0.7)
        .collect()
}

pub fn distinct_text_heights(drawing: &DrawingData) -> usize {
    stats::distinct_count(&drawing.positive_text_heights())
}

// Rules

pub struct LayerOrganizationRule;

impl Rule for LayerOrganizationRule {
    fn id(&self) -> &str {
        "layer_organization"
    }

    fn name(&self) -> &str {
        "Layer Organization"
    }

    fn description(&self) -> &str {
        "Layers exist, are not limited to layer 0, and mostly follow a naming convention"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        let mut issues = Vec::new();

        if drawing.layers.is_empty() {
            issues.push(
                Issue::new(self.id(), Severity::Error, "layer", "No layers are defined")
                    .with_suggestion("Create layers for outlines, dimensions, center lines and text"),
            );
            return issues;
        }

        if uses_only_default_layer(&drawing.layers) {
            issues.push(
                Issue::new(
                    self.id(),
                    Severity::Warning,
                    "layer",
                    "Only the default layer (0) is used; separate content into layers",
                )
                .with_layer("0"),
            );
        }

        if has_unsystematic_layer_names(&drawing.layers) {
            issues.push(
                Issue::new(
                    self.id(),
                    Severity::Info,
                    "layer",
                    "Layer names are not systematic; a standard naming convention is recommended",
                )
                .with_suggestion("Use names such as DIMENSION, CENTER, HIDDEN, TEXT, HATCH"),
            );
        }

        issues
    }
}

pub struct DimensionOutlierRule;

impl Rule for DimensionOutlierRule {
    fn id(&self) -> &str {
        "dimension_outliers"
    }

    fn name(&self) -> &str {
        "Dimension Outliers"
    }

    fn description(&self) -> &str {
        "Dimension values more than three standard deviations from the mean"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        let outliers = dimension_outliers(&drawing.positive_measurements());
        if outliers.is_empty() {
            return Vec::new();
        }
        vec![Issue::new(
            self.id(),
            self.severity(),
            "dimension",
            format!("{} outlier dimension value(s) found", outliers.len()),
        )
        .with_suggestion("Check the outlying dimensions for typing or scale errors")]
    }
}

pub struct EntityDistributionRule;

impl Rule for EntityDistributionRule {
    fn id(&self) -> &str {
        "entity_distribution"
    }

    fn name(&self) -> &str {
        "Entity Distribution"
    }

    fn description(&self) -> &str {
        "Drawing has entities and no single type dominates"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        if drawing.entity_breakdown.is_empty() {
            return vec![Issue::new(
                self.id(),
                Severity::Error,
                "entity",
                "No entity information",
            )];
        }

        dominant_entity_types(drawing)
            .into_iter()
            .map(|(entity_type, ratio)| {
                Issue::new(
                    self.id(),
                    Severity::Info,
                    "entity distribution",
                    format!(
                        "{} entities make up {:.1}% of the drawing",
                        entity_type,
                        ratio * 100.0
                    ),
                )
            })
            .collect()
    }
}

pub struct TextConsistencyRule;

impl Rule for TextConsistencyRule {
    fn id(&self) -> &str {
        "text_consistency"
    }

    fn name(&self) -> &str {
        "Text Height Consistency"
    }

    fn description(&self) -> &str {
        "At most five distinct text heights"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        let distinct = distinct_text_heights(drawing);
        if distinct <= 5 {
            return Vec::new();
        }
        vec![Issue::new(
            self.id(),
            self.severity(),
            "text",
            format!("{} different text heights are used", distinct),
        )
        .with_suggestion("Standardize text heights (e.g. 2.5, 3.5, 5, 7)")]
    }
}

pub struct DrawingComplexityRule;

impl Rule for DrawingComplexityRule {
    fn id(&self) -> &str {
        "drawing_complexity"
    }

    fn name(&self) -> &str {
        "Drawing Complexity"
    }

    fn description(&self) -> &str {
        "Overall complexity should stay at or below 0.8"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        if !calculate_complexity(drawing).is_high() {
            return Vec::new();
        }
        vec![Issue::new(
            self.id(),
            self.severity(),
            "complexity",
            "The drawing is very complex; readability may need improvement",
        )
        .with_suggestion("Split the drawing into sheets or separate detail views")]
    }
}

pub struct IsoLayerColorRule;

impl Rule for IsoLayerColorRule {
    fn id(&self) -> &str {
        "iso_layer_color"
    }

    fn name(&self) -> &str {
        "ISO Layer Colour"
    }

    fn description(&self) -> &str {
        "Standard layers use their ISO colour"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        standards::layer_violations(&drawing.layers)
            .into_iter()
            .filter(|v| v.kind == ViolationKind::LayerColor)
            .map(|v| {
                Issue::new(self.id(), v.severity, "standards", v.message)
                    .with_layer(v.layer)
                    .with_suggestion(v.expected)
            })
            .collect()
    }
}

pub struct IsoLinetypeRule;

impl Rule for IsoLinetypeRule {
    fn id(&self) -> &str {
        "iso_linetype"
    }

    fn name(&self) -> &str {
        "ISO Linetype"
    }

    fn description(&self) -> &str {
        "Standard layers use an allowed linetype"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        standards::layer_violations(&drawing.layers)
            .into_iter()
            .filter(|v| v.kind == ViolationKind::Linetype)
            .map(|v| {
                Issue::new(self.id(), v.severity, "standards", v.message)
                    .with_layer(v.layer)
                    .with_suggestion(v.expected)
            })
            .collect()
    }
}

pub struct DuplicateCircleRule;

impl Rule for DuplicateCircleRule {
    fn id(&self) -> &str {
        "duplicate_circle"
    }

    fn name(&self) -> &str {
        "Duplicate Circles"
    }

    fn description(&self) -> &str {
        "Circles with the same centre and radius"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        anomalies::duplicate_circles(&drawing.circles)
            .into_iter()
            .map(|c| {
                Issue::new(
                    self.id(),
                    self.severity(),
                    "anomaly",
                    format!(
                        "Duplicate circle at ({:.3}, {:.3}, {:.3}) with radius {:.3}",
                        c.center.x, c.center.y, c.center.z, c.radius
                    ),
                )
                .with_layer(c.layer.clone())
                .with_suggestion("Remove the duplicate circle")
            })
            .collect()
    }
}

pub struct TextScaleRule;

impl Rule for TextScaleRule {
    fn id(&self) -> &str {
        "text_scale"
    }

    fn name(&self) -> &str {
        "Text Scale"
    }

    fn description(&self) -> &str {
        "Text heights more than ten times above or below the mean"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        anomalies::text_scale_outliers(&drawing.texts)
            .into_iter()
            .map(|(text, mean)| {
                Issue::new(
                    self.id(),
                    self.severity(),
                    "anomaly",
                    format!(
                        "Abnormal text height: {:.2} (mean: {:.2})",
                        text.height, mean
                    ),
                )
                .with_layer(text.layer.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawing_with_layers(names: &[&str]) -> DrawingData {
        let mut data = DrawingData::default();
        data.layers = names.iter().map(|n| LayerInfo::new(*n, 7, "CONTINUOUS")).collect();
        data
    }

    #[test]
    fn test_only_default_layer() {
        let data = drawing_with_layers(&["0"]);
        let issues = LayerOrganizationRule.check(&data);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[1].severity, Severity::Info);
    }

    #[test]
    fn test_no_layers_is_error() {
        let issues = LayerOrganizationRule.check(&DrawingData::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_meaningful_layer_names() {
        assert!(is_meaningful_layer_name("DIM-MAIN"));
        assert!(is_meaningful_layer_name("치수선"));
        assert!(!is_meaningful_layer_name("Layer1"));

        let data = drawing_with_layers(&["DIMENSION", "CENTER", "misc"]);
        assert!(LayerOrganizationRule.check(&data).is_empty());
    }

    #[test]
    fn test_dimension_outliers() {
        let mut values = vec![10.0; 20];
        values.push(1000.0);
        assert_eq!(dimension_outliers(&values), vec![1000.0]);
        assert!(dimension_outliers(&[5.0, 5.0, 5.0]).is_empty());
        assert!(dimension_outliers(&[5.0]).is_empty());
    }

    #[test]
    fn test_entity_distribution() {
        let mut data = DrawingData::default();
        assert_eq!(EntityDistributionRule.check(&data)[0].severity, Severity::Error);

        data.entity_breakdown.insert("LINE".to_string(), 8);
        data.entity_breakdown.insert("CIRCLE".to_string(), 2);
        let issues = EntityDistributionRule.check(&data);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("80.0%"));
    }

    #[test]
    fn test_text_consistency() {
        let mut data = DrawingData::default();
        for h in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            data.texts.push(TextInfo {
                kind: TextKind::Text,
                layer: "0".to_string(),
                text: "x".to_string(),
                height: h,
            });
        }
        assert_eq!(TextConsistencyRule.check(&data).len(), 1);
        data.texts.pop();
        assert!(TextConsistencyRule.check(&data).is_empty());
    }

    #[test]
    fn test_with_rules_filters() {
        let engine = RulesEngine::with_rules(&["layer_organization", "unknown"]);
        let ids: Vec<&str> = engine.rules().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["layer_organization"]);
    }

    #[test]
    fn test_try_with_rules_rejects_unknown() {
        let err = RulesEngine::try_with_rules(&["layer_organization", "layer_organisation"])
            .err()
            .unwrap();
        assert_eq!(err, "layer_organisation");

        let engine = RulesEngine::try_with_rules(&["text_scale"]).unwrap();
        assert_eq!(engine.rules().count(), 1);
    }

    #[test]
    fn test_default_rules_order() {
        let engine = RulesEngine::default();
        let ids: Vec<&str> = engine.rules().map(|r| r.id()).collect();
        assert_eq!(ids.len(), 9);
        assert_eq!(&ids[..5], QUALITY_RULE_IDS);
        assert_eq!(&ids[7..], ANOMALY_RULE_IDS);
    }
}
