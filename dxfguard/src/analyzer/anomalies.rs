use std::collections::HashSet;

use crate::analyzer::rules::{Issue, RulesEngine, ANOMALY_RULE_IDS};
use crate::analyzer::stats::{self, round3_key};
use crate::parser::schema::{CircleInfo, DrawingData, TextInfo};

/// Centre (x, y) and radius rounded to three decimals.
pub fn circle_key(center_x: f64, center_y: f64, radius: f64) -> (i64, i64, i64) {
    (round3_key(center_x), round3_key(center_y), round3_key(radius))
}

/// Every circle whose key was already seen earlier in the list.
pub fn duplicate_circles(circles: &[CircleInfo]) -> Vec<&CircleInfo> {
    let mut seen = HashSet::new();
    circles
        .iter()
        .filter(|c| !seen.insert(circle_key(c.center.x, c.center.y, c.radius)))
        .collect()
}

/// Texts with a height above ten times or below a tenth of the mean height,
/// paired with that mean. Needs at least two positive heights.
pub fn text_scale_outliers(texts: &[TextInfo]) -> Vec<(&TextInfo, f64)> {
    let heights: Vec<f64> = texts
        .iter()
        .map(|t| t.height)
        .filter(|h| h.is_finite() && *h > 0.0)
        .collect();
    if heights.len() < 2 {
        return Vec::new();
    }
    let Some(mean) = stats::mean(&heights).filter(|m| *m > 0.0) else {
        return Vec::new();
    };

    texts
        .iter()
        .filter(|t| t.height.is_finite() && t.height > 0.0)
        .filter(|t| t.height > mean * 10.0 || t.height < mean / 10.0)
        .map(|t| (t, mean))
        .collect()
}

/// Isolated-entity detection needs spatial indexing; reports nothing.
pub fn isolated_entities(_drawing: &DrawingData) -> Vec<Issue> {
    Vec::new()
}

/// Duplicate circles, isolated entities and text scale anomalies.
pub fn detect_anomalies(drawing: &DrawingData) -> Vec<Issue> {
    let engine = RulesEngine::with_rules(ANOMALY_RULE_IDS);
    let mut anomalies = Vec::new();
    for rule in engine.rules() {
        if rule.id() == "text_scale" {
            anomalies.extend(isolated_entities(drawing));
        }
        anomalies.extend(rule.check(drawing));
    }
    anomalies
}
