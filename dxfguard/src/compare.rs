//! Version-to-version drawing comparison.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::parser::schema::{DrawingData, LayerInfo};

const MAJOR_ENTITY_DELTA: i64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfoDiff {
    pub file1: String,
    pub file2: String,
    pub size_diff: i64,
    pub date1: String,
    pub date2: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub property: String,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerChange {
    pub name: String,
    pub changes: Vec<PropertyChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCountChange {
    pub entity_type: String,
    pub old_count: usize,
    pub new_count: usize,
    pub difference: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountChange {
    pub old: usize,
    pub new: usize,
    pub difference: i64,
}

impl CountChange {
    fn new(old: usize, new: usize) -> Self {
        Self {
            old,
            new,
            difference: new as i64 - old as i64,
        }
    }
}

/// Items present on only one side of the comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub layers: Vec<LayerInfo>,
    pub dimension_values: Vec<f64>,
    pub texts: Vec<String>,
    pub blocks: Vec<String>,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.layers.len() + self.dimension_values.len() + self.texts.len() + self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeLevel {
    None,
    Minor,
    Moderate,
    Major,
}

impl ChangeLevel {
    pub fn from_total(total: usize) -> Self {
        match total {
            0 => ChangeLevel::None,
            1..=4 => ChangeLevel::Minor,
            5..=19 => ChangeLevel::Moderate,
            _ => ChangeLevel::Major,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeLevel::None => "none",
            ChangeLevel::Minor => "minor",
            ChangeLevel::Moderate => "moderate",
            ChangeLevel::Major => "major",
        }
    }
}

impl std::fmt::Display for ChangeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_additions: usize,
    pub total_removals: usize,
    pub total_modifications: usize,
    pub has_significant_changes: bool,
    pub change_level: ChangeLevel,
    pub major_changes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub file_info: FileInfoDiff,
    pub added: ChangeSet,
    pub removed: ChangeSet,
    pub modified_layers: Vec<LayerChange>,
    pub entity_changes: Vec<EntityCountChange>,
    pub dimension_count_change: CountChange,
    pub text_count_change: CountChange,
    pub summary: ComparisonSummary,
}

pub fn compare_drawings(old: &DrawingData, new: &DrawingData) -> ComparisonResult {
    let mut added = ChangeSet::default();
    let mut removed = ChangeSet::default();

    let modified_layers = compare_layers(&old.layers, &new.layers, &mut added, &mut removed);
    let entity_changes = compare_entity_counts(&old.entity_breakdown, &new.entity_breakdown);

    let (plus, minus) = set_difference(measurement_set(old), measurement_set(new));
    added.dimension_values = plus;
    removed.dimension_values = minus;

    let (plus, minus) = set_difference(text_set(old), text_set(new));
    added.texts = plus;
    removed.texts = minus;

    let (plus, minus) = set_difference(block_set(old), block_set(new));
    added.blocks = plus;
    removed.blocks = minus;

    let summary = summarize(&added, &removed, &modified_layers, &entity_changes);

    info!(
        "Compared {} -> {}: {} change level",
        old.file_info.filename, new.file_info.filename, summary.change_level
    );

    ComparisonResult {
        file_info: FileInfoDiff {
            file1: name_or_unknown(&old.file_info.filename),
            file2: name_or_unknown(&new.file_info.filename),
            size_diff: new.file_info.size as i64 - old.file_info.size as i64,
            date1: name_or_unknown(&old.file_info.modified_time),
            date2: name_or_unknown(&new.file_info.modified_time),
        },
        added,
        removed,
        modified_layers,
        entity_changes,
        dimension_count_change: CountChange::new(old.dimensions.len(), new.dimensions.len()),
        text_count_change: CountChange::new(old.texts.len(), new.texts.len()),
        summary,
    }
}

fn name_or_unknown(value: &str) -> String {
    if value.is_empty() {
        "Unknown".to_string()
    } else {
        value.to_string()
    }
}

fn compare_layers(
    old: &[LayerInfo],
    new: &[LayerInfo],
    added: &mut ChangeSet,
    removed: &mut ChangeSet,
) -> Vec<LayerChange> {
    let old_by_name: BTreeMap<&str, &LayerInfo> = old.iter().map(|l| (l.name.as_str(), l)).collect();
    let new_by_name: BTreeMap<&str, &LayerInfo> = new.iter().map(|l| (l.name.as_str(), l)).collect();

    added.layers = new_by_name
        .iter()
        .filter(|(name, _)| !old_by_name.contains_key(*name))
        .map(|(_, layer)| (*layer).clone())
        .collect();
    removed.layers = old_by_name
        .iter()
        .filter(|(name, _)| !new_by_name.contains_key(*name))
        .map(|(_, layer)| (*layer).clone())
        .collect();

    let mut modified = Vec::new();
    for (name, before) in &old_by_name {
        let Some(after) = new_by_name.get(name) else {
            continue;
        };
        let mut changes = Vec::new();
        if before.color != after.color {
            changes.push(PropertyChange {
                property: "color".to_string(),
                old: before.color.to_string(),
                new: after.color.to_string(),
            });
        }
        if before.linetype != after.linetype {
            changes.push(PropertyChange {
                property: "linetype".to_string(),
                old: before.linetype.clone(),
                new: after.linetype.clone(),
            });
        }
        if !changes.is_empty() {
            modified.push(LayerChange {
                name: name.to_string(),
                changes,
            });
        }
    }
    modified
}

fn compare_entity_counts(
    old: &BTreeMap<String, usize>,
    new: &BTreeMap<String, usize>,
) -> Vec<EntityCountChange> {
    let types: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let mut changes: Vec<EntityCountChange> = types
        .into_iter()
        .filter_map(|entity_type| {
            let old_count = old.get(entity_type).copied().unwrap_or(0);
            let new_count = new.get(entity_type).copied().unwrap_or(0);
            (old_count != new_count).then(|| EntityCountChange {
                entity_type: entity_type.clone(),
                old_count,
                new_count,
                difference: new_count as i64 - old_count as i64,
            })
        })
        .collect();
    // Stable sort keeps ties in type-name order.
    changes.sort_by_key(|c| std::cmp::Reverse(c.difference.abs()));
    changes
}

fn measurement_set(drawing: &DrawingData) -> Vec<f64> {
    let mut values: Vec<f64> = drawing
        .dimensions
        .iter()
        .filter_map(|d| d.measurement)
        .collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

/// Trimmed text contents. Empty values are skipped before trimming, so a
/// whitespace-only text still shows up as `""`.
fn text_set(drawing: &DrawingData) -> BTreeSet<String> {
    drawing
        .texts
        .iter()
        .filter(|t| !t.text.is_empty())
        .map(|t| t.text.trim().to_string())
        .collect()
}

fn block_set(drawing: &DrawingData) -> BTreeSet<String> {
    drawing.blocks.iter().map(|b| b.name.clone()).collect()
}

/// Returns (only in `new`, only in `old`), both sorted.
fn set_difference<T, C>(old: C, new: C) -> (Vec<T>, Vec<T>)
where
    T: PartialEq + Clone,
    C: IntoIterator<Item = T> + Clone,
{
    let old: Vec<T> = old.into_iter().collect();
    let new: Vec<T> = new.into_iter().collect();
    let plus = new.iter().filter(|v| !old.contains(v)).cloned().collect();
    let minus = old.iter().filter(|v| !new.contains(v)).cloned().collect();
    (plus, minus)
}

fn summarize(
    added: &ChangeSet,
    removed: &ChangeSet,
    modified_layers: &[LayerChange],
    entity_changes: &[EntityCountChange],
) -> ComparisonSummary {
    let total_additions = added.len();
    let total_removals = removed.len();
    let total_modifications = modified_layers.len();
    let change_level = ChangeLevel::from_total(total_additions + total_removals + total_modifications);

    let mut major_changes = Vec::new();
    if !added.layers.is_empty() || !removed.layers.is_empty() {
        major_changes.push("Layer structure changed".to_string());
    }
    for change in entity_changes {
        if change.difference.abs() > MAJOR_ENTITY_DELTA {
            major_changes.push(format!(
                "Bulk {} change ({:+})",
                change.entity_type, change.difference
            ));
        }
    }

    ComparisonSummary {
        total_additions,
        total_removals,
        total_modifications,
        has_significant_changes: change_level == ChangeLevel::Major,
        change_level,
        major_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::{DimensionInfo, TextInfo, TextKind};

    fn dim(value: f64) -> DimensionInfo {
        DimensionInfo {
            layer: "DIM".to_string(),
            measurement: Some(value),
            text: String::new(),
            style: "Standard".to_string(),
        }
    }

    fn text(value: &str) -> TextInfo {
        TextInfo {
            kind: TextKind::Text,
            layer: "0".to_string(),
            text: value.to_string(),
            height: 2.5,
        }
    }

    #[test]
    fn test_identical_drawings_have_no_changes() {
        let mut data = DrawingData::default();
        data.layers.push(LayerInfo::new("0", 7, "CONTINUOUS"));
        data.dimensions.push(dim(10.0));
        let result = compare_drawings(&data, &data);
        assert_eq!(result.summary.change_level, ChangeLevel::None);
        assert!(result.entity_changes.is_empty());
        assert!(!result.summary.has_significant_changes);
    }

    #[test]
    fn test_layer_changes() {
        let mut old = DrawingData::default();
        old.layers = vec![
            LayerInfo::new("0", 7, "CONTINUOUS"),
            LayerInfo::new("OLD", 3, "CONTINUOUS"),
        ];
        let mut new = DrawingData::default();
        new.layers = vec![
            LayerInfo::new("0", 1, "DASHED"),
            LayerInfo::new("NEW", 5, "CONTINUOUS"),
        ];

        let result = compare_drawings(&old, &new);
        assert_eq!(result.added.layers[0].name, "NEW");
        assert_eq!(result.removed.layers[0].name, "OLD");
        assert_eq!(result.modified_layers.len(), 1);
        assert_eq!(result.modified_layers[0].changes.len(), 2);
        assert_eq!(result.summary.change_level, ChangeLevel::Minor);
        assert_eq!(result.summary.major_changes, vec!["Layer structure changed"]);
    }

    #[test]
    fn test_values_and_texts() {
        let mut old = DrawingData::default();
        old.dimensions = vec![dim(10.0), dim(20.0)];
        old.texts = vec![text("A"), text(" B ")];
        let mut new = DrawingData::default();
        new.dimensions = vec![dim(20.0), dim(30.0), dim(30.0)];
        new.texts = vec![text("B"), text("C")];

        let result = compare_drawings(&old, &new);
        assert_eq!(result.added.dimension_values, vec![30.0]);
        assert_eq!(result.removed.dimension_values, vec![10.0]);
        assert_eq!(result.dimension_count_change.difference, 1);
        assert_eq!(result.added.texts, vec!["C"]);
        assert_eq!(result.removed.texts, vec!["A"]);
        assert_eq!(result.text_count_change.difference, 0);
    }

    #[test]
    fn test_blank_texts_in_content_set() {
        let mut old = DrawingData::default();
        old.texts = vec![text(""), text("A")];
        let mut new = DrawingData::default();
        new.texts = vec![text("   "), text("A")];

        let result = compare_drawings(&old, &new);
        assert_eq!(result.added.texts, vec![""]);
        assert!(result.removed.texts.is_empty());
    }

    #[test]
    fn test_entity_changes_sorted_and_bulk_flagged() {
        let mut old = DrawingData::default();
        old.entity_breakdown.insert("LINE".to_string(), 10);
        old.entity_breakdown.insert("CIRCLE".to_string(), 5);
        let mut new = DrawingData::default();
        new.entity_breakdown.insert("LINE".to_string(), 70);
        new.entity_breakdown.insert("CIRCLE".to_string(), 3);
        new.entity_breakdown.insert("ARC".to_string(), 1);

        let result = compare_drawings(&old, &new);
        let order: Vec<&str> = result
            .entity_changes
            .iter()
            .map(|c| c.entity_type.as_str())
            .collect();
        assert_eq!(order, vec!["LINE", "CIRCLE", "ARC"]);
        assert_eq!(result.summary.major_changes, vec!["Bulk LINE change (+60)"]);
    }

    #[test]
    fn test_change_levels() {
        assert_eq!(ChangeLevel::from_total(4), ChangeLevel::Minor);
        assert_eq!(ChangeLevel::from_total(5), ChangeLevel::Moderate);
        assert_eq!(ChangeLevel::from_total(20), ChangeLevel::Major);
    }
}
