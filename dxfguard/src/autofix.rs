//! Automatic repair of simple drawing problems.
//!
//! Fixes operate directly on a loaded [`dxf::Drawing`] and are recorded so a
//! report can be rendered afterwards. Nothing is written until [`AutoFixer::save`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::Local;
use dxf::entities::EntityType;
use dxf::tables::Layer;
use dxf::{Color, Drawing};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::analyzer::anomalies::circle_key;
use crate::analyzer::insights::{analyze_advanced, AdvancedAnalysis};
use crate::analyzer::standards::{standards_for_layer, ViolationKind};
use crate::parser::dxf_reader::{DxfParseError, DxfParser, DEFAULT_LAYER_COLOR};
use crate::parser::schema::FileInfo;

pub const MIN_TEXT_HEIGHT: f64 = 2.5;

/// Layers created when a drawing only uses layer `0`.
pub const STANDARD_LAYERS: &[(&str, u8, &str)] = &[
    ("DIMENSION", 2, "CONTINUOUS"),
    ("CENTER", 1, "CENTER"),
    ("HIDDEN", 3, "HIDDEN"),
    ("TEXT", 4, "CONTINUOUS"),
    ("HATCH", 254, "CONTINUOUS"),
];

#[derive(Debug, Error)]
pub enum AutoFixError {
    #[error(transparent)]
    Parse(#[from] DxfParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to save DXF: {0}")]
    Save(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerFix {
    LayerCreated {
        name: String,
        color: i16,
        linetype: String,
    },
    LayerColorFixed {
        name: String,
        old_color: i16,
        new_color: i16,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedCircle {
    pub position: (f64, f64),
    pub radius: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateFixes {
    pub count: usize,
    pub details: Vec<RemovedCircle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardFix {
    pub kind: ViolationKind,
    pub layer: String,
    pub standard: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextFix {
    TextHeightFixed {
        old_height: f64,
        new_height: f64,
        content: String,
    },
    TextLayerOrganized {
        count: usize,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ZeroSizeKind {
    ZeroLengthLine,
    ZeroRadiusCircle,
    ZeroRadiusArc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZeroSizeFix {
    pub kind: ZeroSizeKind,
    pub position: (f64, f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixSummary {
    pub total_fixes: usize,
    pub backup_created: bool,
    pub fixes_applied: Vec<String>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoFixReport {
    pub layer_fixes: Vec<LayerFix>,
    pub duplicate_fixes: DuplicateFixes,
    pub standard_fixes: Vec<StandardFix>,
    pub text_fixes: Vec<TextFix>,
    pub zero_size_fixes: Vec<ZeroSizeFix>,
    pub summary: FixSummary,
}

impl AutoFixReport {
    pub fn text_height_fix_count(&self) -> usize {
        self.text_fixes
            .iter()
            .filter(|f| matches!(f, TextFix::TextHeightFixed { .. }))
            .count()
    }

    pub fn texts_moved(&self) -> usize {
        self.text_fixes
            .iter()
            .find_map(|f| match f {
                TextFix::TextLayerOrganized { count } => Some(*count),
                _ => None,
            })
            .unwrap_or(0)
    }
}

pub struct AutoFixer {
    drawing: Drawing,
    fixes_applied: Vec<String>,
    backup_created: bool,
    min_text_height: f64,
}

impl AutoFixer {
    pub fn new(drawing: Drawing) -> Self {
        Self {
            drawing,
            fixes_applied: Vec::new(),
            backup_created: false,
            min_text_height: MIN_TEXT_HEIGHT,
        }
    }

    pub fn load(path: &Path) -> Result<Self, AutoFixError> {
        let drawing = DxfParser::load(path)?;
        info!("Loaded {} for auto-fix", path.display());
        Ok(Self::new(drawing))
    }

    pub fn with_min_text_height(mut self, height: f64) -> Self {
        self.min_text_height = height;
        self
    }

    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    pub fn into_drawing(self) -> Drawing {
        self.drawing
    }

    /// Copy `path` to `<path>.backup_YYYYMMDD_HHMMSS`.
    pub fn create_backup(&mut self, path: &Path) -> Result<PathBuf, AutoFixError> {
        let mut backup: OsString = path.as_os_str().to_os_string();
        backup.push(format!(".backup_{}", Local::now().format("%Y%m%d_%H%M%S")));
        let backup = PathBuf::from(backup);
        std::fs::copy(path, &backup)?;
        self.backup_created = true;
        info!("Backup created: {}", backup.display());
        Ok(backup)
    }

    pub fn save(&self, path: &Path) -> Result<(), AutoFixError> {
        self.drawing
            .save_file(path)
            .map_err(|e| AutoFixError::Save(e.to_string()))?;
        info!("Fixed drawing saved: {}", path.display());
        Ok(())
    }

    /// Analyze the loaded drawing, then apply every fix.
    pub fn fix_with_analysis(&mut self) -> AutoFixReport {
        let data = DxfParser::from_drawing(&self.drawing, FileInfo::default());
        let analysis = analyze_advanced(&data);
        self.fix_all(Some(&analysis))
    }

    /// Apply every fix. Duplicate and standards fixes need an analysis of
    /// the same drawing and are skipped without one.
    pub fn fix_all(&mut self, analysis: Option<&AdvancedAnalysis>) -> AutoFixReport {
        let layer_fixes = self.fix_layers();
        let duplicate_fixes = match analysis {
            Some(a) if a.has_duplicate_circles() => self.fix_duplicate_circles(),
            _ => DuplicateFixes::default(),
        };
        let standard_fixes = analysis
            .map(|a| self.fix_standards(a))
            .unwrap_or_default();
        let text_fixes = self.fix_texts();
        let zero_size_fixes = self.fix_zero_size_entities();

        let total_fixes = layer_fixes.len()
            + duplicate_fixes.count
            + standard_fixes.len()
            + text_fixes.len()
            + zero_size_fixes.len();

        info!("Auto-fix applied {} fix(es)", total_fixes);

        AutoFixReport {
            layer_fixes,
            duplicate_fixes,
            standard_fixes,
            text_fixes,
            zero_size_fixes,
            summary: FixSummary {
                total_fixes,
                backup_created: self.backup_created,
                fixes_applied: self.fixes_applied.clone(),
                success: total_fixes > 0,
            },
        }
    }

    fn fix_layers(&mut self) -> Vec<LayerFix> {
        let mut fixes = Vec::new();

        let only_default = self.drawing.layers().all(|l| l.name == "0");
        if only_default {
            for (name, color, linetype) in STANDARD_LAYERS {
                let mut layer = Layer::default();
                layer.name = name.to_string();
                layer.color = Color::from_index(*color);
                layer.line_type_name = linetype.to_string();
                self.drawing.add_layer(layer);
                fixes.push(LayerFix::LayerCreated {
                    name: name.to_string(),
                    color: i16::from(*color),
                    linetype: linetype.to_string(),
                });
            }
            self.fixes_applied.push("Created standard layers".to_string());
        }

        for layer in self.drawing.layers_mut() {
            let lower = layer.name.to_lowercase();
            let target: u8 = if lower.contains("치수") || lower.contains("dim") {
                2
            } else if lower.contains("중심") || lower.contains("center") {
                1
            } else {
                continue;
            };
            if layer.color.index() != Some(target) {
                let old_color = layer
                    .color
                    .index()
                    .map(i16::from)
                    .unwrap_or(DEFAULT_LAYER_COLOR);
                layer.color = Color::from_index(target);
                fixes.push(LayerFix::LayerColorFixed {
                    name: layer.name.clone(),
                    old_color,
                    new_color: i16::from(target),
                });
            }
        }

        fixes
    }

    fn fix_duplicate_circles(&mut self) -> DuplicateFixes {
        let mut seen = std::collections::HashSet::new();
        let mut doomed = Vec::new();
        let mut details = Vec::new();

        for (index, entity) in self.drawing.entities().enumerate() {
            if entity.common.is_in_paper_space {
                continue;
            }
            if let EntityType::Circle(circle) = &entity.specific {
                let key = circle_key(circle.center.x, circle.center.y, circle.radius);
                if !seen.insert(key) {
                    doomed.push(index);
                    details.push(RemovedCircle {
                        position: (circle.center.x, circle.center.y),
                        radius: circle.radius,
                    });
                }
            }
        }

        let count = self.remove_entities(&doomed);
        if count > 0 {
            self.fixes_applied
                .push(format!("Removed {} duplicate circle(s)", count));
        }
        DuplicateFixes { count, details }
    }

    fn fix_standards(&mut self, analysis: &AdvancedAnalysis) -> Vec<StandardFix> {
        let mut fixes = Vec::new();

        for violation in &analysis.standards_compliance.violations {
            let Some(layer) = self
                .drawing
                .layers_mut()
                .find(|l| l.name == violation.layer)
            else {
                debug!("Layer {} no longer exists", violation.layer);
                continue;
            };

            match violation.kind {
                ViolationKind::LayerColor => {
                    if let Some(standard) = standards_for_layer(&violation.layer).next() {
                        layer.color = Color::from_index(standard.color as u8);
                    }
                }
                ViolationKind::Linetype => {
                    if let Some(linetype) = standards_for_layer(&violation.layer)
                        .find_map(|s| s.linetypes.first())
                    {
                        layer.line_type_name = linetype.to_string();
                    }
                }
            }

            fixes.push(StandardFix {
                kind: violation.kind,
                layer: violation.layer.clone(),
                standard: "ISO".to_string(),
            });
        }

        if !fixes.is_empty() {
            self.fixes_applied
                .push(format!("Applied {} standards fix(es)", fixes.len()));
        }
        fixes
    }

    fn fix_texts(&mut self) -> Vec<TextFix> {
        let mut fixes = Vec::new();
        let min_height = self.min_text_height;

        for entity in self.drawing.entities_mut() {
            if entity.common.is_in_paper_space {
                continue;
            }
            let (height, content) = match &mut entity.specific {
                EntityType::Text(text) => (&mut text.text_height, text.value.clone()),
                EntityType::MText(mtext) => (&mut mtext.initial_text_height, mtext.text.clone()),
                _ => continue,
            };
            if *height < min_height {
                fixes.push(TextFix::TextHeightFixed {
                    old_height: *height,
                    new_height: min_height,
                    content: content.chars().take(30).collect(),
                });
                *height = min_height;
            }
        }
        if !fixes.is_empty() {
            self.fixes_applied.push(format!(
                "Raised {} text height(s) to {}",
                fixes.len(),
                min_height
            ));
        }

        let text_layer = self
            .drawing
            .layers()
            .find(|l| l.name.eq_ignore_ascii_case("TEXT"))
            .map(|l| l.name.clone());

        if let Some(text_layer) = text_layer {
            let mut moved = 0;
            for entity in self.drawing.entities_mut() {
                if entity.common.is_in_paper_space {
                    continue;
                }
                let is_text = matches!(entity.specific, EntityType::Text(_) | EntityType::MText(_));
                if is_text && entity.common.layer != text_layer {
                    entity.common.layer = text_layer.clone();
                    moved += 1;
                }
            }
            if moved > 0 {
                fixes.push(TextFix::TextLayerOrganized { count: moved });
                self.fixes_applied
                    .push(format!("Moved {} text(s) to the {} layer", moved, text_layer));
            }
        }

        fixes
    }

    fn fix_zero_size_entities(&mut self) -> Vec<ZeroSizeFix> {
        let mut fixes = Vec::new();
        let mut doomed = Vec::new();

        for (index, entity) in self.drawing.entities().enumerate() {
            if entity.common.is_in_paper_space {
                continue;
            }
            let fix = match &entity.specific {
                EntityType::Line(line)
                    if line.p1.x == line.p2.x && line.p1.y == line.p2.y && line.p1.z == line.p2.z =>
                {
                    ZeroSizeFix {
                        kind: ZeroSizeKind::ZeroLengthLine,
                        position: (line.p1.x, line.p1.y),
                    }
                }
                EntityType::Circle(circle) if circle.radius == 0.0 => ZeroSizeFix {
                    kind: ZeroSizeKind::ZeroRadiusCircle,
                    position: (circle.center.x, circle.center.y),
                },
                EntityType::Arc(arc) if arc.radius == 0.0 => ZeroSizeFix {
                    kind: ZeroSizeKind::ZeroRadiusArc,
                    position: (arc.center.x, arc.center.y),
                },
                _ => continue,
            };
            doomed.push(index);
            fixes.push(fix);
        }

        let removed = self.remove_entities(&doomed);
        if removed > 0 {
            self.fixes_applied
                .push(format!("Removed {} zero-size entit(ies)", removed));
        }
        fixes
    }

    /// Remove entities by index. Indices must be ascending.
    fn remove_entities(&mut self, indices: &[usize]) -> usize {
        let mut removed = 0;
        for &index in indices.iter().rev() {
            if self.drawing.remove_entity(index).is_some() {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxf::entities::{Circle, Entity, Line, Text};
    use dxf::Point;

    fn circle(x: f64, y: f64, r: f64) -> Entity {
        let mut c = Circle::default();
        c.center = Point::new(x, y, 0.0);
        c.radius = r;
        Entity::new(EntityType::Circle(c))
    }

    fn circle_count(drawing: &Drawing) -> usize {
        drawing
            .entities()
            .filter(|e| matches!(e.specific, EntityType::Circle(_)))
            .count()
    }

    #[test]
    fn test_standard_layers_created_for_default_only_drawing() {
        let mut fixer = AutoFixer::new(Drawing::new());
        let report = fixer.fix_all(None);

        let created: Vec<&LayerFix> = report
            .layer_fixes
            .iter()
            .filter(|f| matches!(f, LayerFix::LayerCreated { .. }))
            .collect();
        assert_eq!(created.len(), STANDARD_LAYERS.len());
        assert!(fixer.drawing().layers().any(|l| l.name == "HATCH"));
        assert!(report
            .summary
            .fixes_applied
            .contains(&"Created standard layers".to_string()));
    }

    #[test]
    fn test_dimension_layer_colour_fixed() {
        let mut drawing = Drawing::new();
        let mut layer = Layer::default();
        layer.name = "DIM_MAIN".to_string();
        layer.color = Color::from_index(5);
        drawing.add_layer(layer);

        let mut fixer = AutoFixer::new(drawing);
        let report = fixer.fix_all(None);
        assert!(report.layer_fixes.contains(&LayerFix::LayerColorFixed {
            name: "DIM_MAIN".to_string(),
            old_color: 5,
            new_color: 2,
        }));
    }

    #[test]
    fn test_duplicate_circles_removed() {
        let mut drawing = Drawing::new();
        drawing.add_entity(circle(10.0, 10.0, 5.0));
        drawing.add_entity(circle(10.0, 10.0, 5.0));
        drawing.add_entity(circle(50.0, 10.0, 5.0));

        let mut fixer = AutoFixer::new(drawing);
        let report = fixer.fix_with_analysis();
        assert_eq!(report.duplicate_fixes.count, 1);
        assert_eq!(circle_count(fixer.drawing()), 2);
    }

    #[test]
    fn test_duplicates_kept_without_analysis() {
        let mut drawing = Drawing::new();
        drawing.add_entity(circle(10.0, 10.0, 5.0));
        drawing.add_entity(circle(10.0, 10.0, 5.0));

        let mut fixer = AutoFixer::new(drawing);
        let report = fixer.fix_all(None);
        assert_eq!(report.duplicate_fixes.count, 0);
        assert_eq!(circle_count(fixer.drawing()), 2);
    }

    #[test]
    fn test_small_text_raised_and_moved() {
        let mut drawing = Drawing::new();
        let mut text = Text::default();
        text.value = "tiny".to_string();
        text.text_height = 1.0;
        drawing.add_entity(Entity::new(EntityType::Text(text)));

        let mut fixer = AutoFixer::new(drawing);
        let report = fixer.fix_all(None);
        assert_eq!(report.text_height_fix_count(), 1);
        assert_eq!(report.texts_moved(), 1);

        let fixed = fixer.drawing().entities().next().unwrap();
        assert_eq!(fixed.common.layer, "TEXT");
        match &fixed.specific {
            EntityType::Text(t) => assert_eq!(t.text_height, MIN_TEXT_HEIGHT),
            other => panic!("unexpected entity {:?}", other),
        }
    }

    #[test]
    fn test_zero_size_entities_removed() {
        let mut drawing = Drawing::new();
        let mut line = Line::default();
        line.p1 = Point::new(1.0, 1.0, 0.0);
        line.p2 = Point::new(1.0, 1.0, 0.0);
        drawing.add_entity(Entity::new(EntityType::Line(line)));
        drawing.add_entity(circle(0.0, 0.0, 0.0));
        drawing.add_entity(circle(0.0, 0.0, 3.0));

        let mut fixer = AutoFixer::new(drawing);
        let report = fixer.fix_all(None);
        assert_eq!(report.zero_size_fixes.len(), 2);
        assert_eq!(report.zero_size_fixes[0].kind, ZeroSizeKind::ZeroLengthLine);
        assert_eq!(fixer.drawing().entities().count(), 1);
    }

    #[test]
    fn test_paper_space_left_alone() {
        let mut drawing = Drawing::new();
        let mut text = Text::default();
        text.value = "TITLE".to_string();
        text.text_height = 1.0;
        let mut title = Entity::new(EntityType::Text(text));
        title.common.is_in_paper_space = true;
        drawing.add_entity(title);

        let mut line = Line::default();
        line.p1 = Point::new(5.0, 5.0, 0.0);
        line.p2 = Point::new(5.0, 5.0, 0.0);
        let mut dot = Entity::new(EntityType::Line(line));
        dot.common.is_in_paper_space = true;
        drawing.add_entity(dot);

        let mut fixer = AutoFixer::new(drawing);
        let report = fixer.fix_all(None);
        assert_eq!(report.text_height_fix_count(), 0);
        assert_eq!(report.texts_moved(), 0);
        assert!(report.zero_size_fixes.is_empty());
        assert_eq!(fixer.drawing().entities().count(), 2);

        let title = fixer
            .drawing()
            .entities()
            .find(|e| matches!(e.specific, EntityType::Text(_)))
            .unwrap();
        assert_eq!(title.common.layer, "0");
        match &title.specific {
            EntityType::Text(t) => assert_eq!(t.text_height, 1.0),
            other => panic!("unexpected entity {:?}", other),
        }
    }

    #[test]
    fn test_backup_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.dxf");
        std::fs::write(&path, "0\nEOF\n").unwrap();

        let mut fixer = AutoFixer::new(Drawing::new());
        let backup = fixer.create_backup(&path).unwrap();
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("part.dxf.backup_"));
        assert!(backup.exists());

        let report = fixer.fix_all(None);
        assert!(report.summary.backup_created);
    }
}
