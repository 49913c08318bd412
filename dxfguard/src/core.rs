//! Core analysis API shared by the CLI and library users.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ai::provider::AIError;
use crate::analyzer::insights::{analyze_advanced, AdvancedAnalysis};
use crate::analyzer::rules::{Issue, RulesEngine, Severity};
use crate::analyzer::three_d::{analyze_3d, ThreeDAnalysis};
use crate::autofix::AutoFixError;
use crate::config::ConfigError;
use crate::manufacturing::EstimateError;
use crate::parser::dxf_reader::{DxfParseError, DxfParser};
use crate::parser::schema::DrawingData;

/// Directories below this depth are not searched.
const MAX_WALK_DEPTH: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum DxfGuardError {
    #[error("Parse error: {0}")]
    Parse(#[from] DxfParseError),
    #[error("Failed to write DXF: {0}")]
    DxfWrite(String),
    #[error(transparent)]
    Estimate(#[from] EstimateError),
    #[error(transparent)]
    AutoFix(#[from] AutoFixError),
    #[error("AI error: {0}")]
    Ai(#[from] AIError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown rule: {id} (available: {available})")]
    UnknownRule { id: String, available: String },
    #[error("{0}")]
    Other(String),
}

/// Options for a check run.
#[derive(Clone, Debug, Default)]
pub struct AnalysisOptions {
    /// Only run these rule ids. Empty runs every rule.
    pub rules: Vec<String>,
    /// Treat warnings as errors.
    pub strict_mode: bool,
}

/// Full analysis of one file.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub file: PathBuf,
    pub drawing: DrawingData,
    pub advanced: AdvancedAnalysis,
    pub three_d: ThreeDAnalysis,
}

/// Rule findings for one file.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub file: PathBuf,
    pub issues: Vec<Issue>,
    pub stats: CheckStats,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CheckStats {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl CheckStats {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut stats = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Error => stats.errors += 1,
                Severity::Warning => stats.warnings += 1,
                Severity::Info => stats.info += 1,
            }
        }
        stats
    }
}

impl CheckResult {
    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    pub fn has_warnings_or_errors(&self) -> bool {
        self.stats.errors > 0 || self.stats.warnings > 0
    }

    pub fn total_issues(&self) -> usize {
        self.stats.errors + self.stats.warnings + self.stats.info
    }
}

pub fn is_dxf_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("dxf"))
}

/// Recursively discover DXF files in a directory, sorted by path.
pub fn discover_dxf_files(dir: &Path) -> Result<Vec<PathBuf>, DxfGuardError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), DxfGuardError> {
    if depth > MAX_WALK_DEPTH {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "node_modules" || name == "target" || name == "build" {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.is_file() && is_dxf_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

pub struct DxfGuardCore;

impl DxfGuardCore {
    /// Parse and run the advanced and 3D analyses.
    pub fn analyze_file(path: &Path) -> Result<AnalysisResult, DxfGuardError> {
        let drawing = DxfParser::parse_drawing(path)?;
        Ok(Self::analyze_drawing(path, drawing))
    }

    pub fn analyze_drawing(path: &Path, drawing: DrawingData) -> AnalysisResult {
        let advanced = analyze_advanced(&drawing);
        let three_d = analyze_3d(&drawing);
        tracing::info!(
            "Analyzed {}: {} entities, quality {:.1} ({})",
            path.display(),
            drawing.summary_info.total_entities,
            advanced.summary.quality_score,
            advanced.summary.quality_grade
        );
        AnalysisResult {
            file: path.to_path_buf(),
            drawing,
            advanced,
            three_d,
        }
    }

    /// Run the rules engine over one file.
    pub fn check_file(path: &Path, options: &AnalysisOptions) -> Result<CheckResult, DxfGuardError> {
        let engine = Self::engine_for(options)?;
        let drawing = DxfParser::parse_drawing(path)?;
        Ok(Self::run_check(path, &drawing, &engine, options))
    }

    /// Fails with [`DxfGuardError::UnknownRule`] when `options.rules`
    /// names a rule that does not exist.
    pub fn check_drawing(
        path: &Path,
        drawing: &DrawingData,
        options: &AnalysisOptions,
    ) -> Result<CheckResult, DxfGuardError> {
        let engine = Self::engine_for(options)?;
        Ok(Self::run_check(path, drawing, &engine, options))
    }

    fn engine_for(options: &AnalysisOptions) -> Result<RulesEngine, DxfGuardError> {
        if options.rules.is_empty() {
            return Ok(RulesEngine::with_default_rules());
        }
        RulesEngine::try_with_rules(&options.rules).map_err(|id| DxfGuardError::UnknownRule {
            id,
            available: RulesEngine::default_rule_ids().join(", "),
        })
    }

    fn run_check(
        path: &Path,
        drawing: &DrawingData,
        engine: &RulesEngine,
        options: &AnalysisOptions,
    ) -> CheckResult {
        let mut issues = engine.analyze(drawing);
        if options.strict_mode {
            for issue in &mut issues {
                if issue.severity == Severity::Warning {
                    issue.severity = Severity::Error;
                }
            }
        }

        let stats = CheckStats::from_issues(&issues);
        CheckResult {
            file: path.to_path_buf(),
            issues,
            stats,
        }
    }

    /// Check every DXF file under `dir`. Files that fail to parse are
    /// logged and skipped.
    pub fn check_project(dir: &Path, options: &AnalysisOptions) -> Result<Vec<CheckResult>, DxfGuardError> {
        let engine = Self::engine_for(options)?;
        let files = discover_dxf_files(dir)?;
        let mut results = Vec::with_capacity(files.len());
        for path in files {
            match DxfParser::parse_drawing(&path) {
                Ok(drawing) => results.push(Self::run_check(&path, &drawing, &engine, options)),
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_skips_hidden_and_build_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("parts/sub")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("parts/a.dxf"), "").unwrap();
        fs::write(root.join("parts/sub/B.DXF"), "").unwrap();
        fs::write(root.join("parts/notes.txt"), "").unwrap();
        fs::write(root.join(".git/c.dxf"), "").unwrap();
        fs::write(root.join("build/d.dxf"), "").unwrap();

        let files = discover_dxf_files(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.dxf", "B.DXF"]);
    }

    #[test]
    fn test_check_stats() {
        let issues = vec![
            Issue::new("r", Severity::Error, "c", "m"),
            Issue::new("r", Severity::Warning, "c", "m"),
            Issue::new("r", Severity::Warning, "c", "m"),
            Issue::new("r", Severity::Info, "c", "m"),
        ];
        let stats = CheckStats::from_issues(&issues);
        assert_eq!(
            stats,
            CheckStats {
                errors: 1,
                warnings: 2,
                info: 1
            }
        );
    }

    #[test]
    fn test_strict_mode_promotes_warnings() {
        let drawing = DrawingData {
            layers: vec![crate::parser::schema::LayerInfo::new("0", 7, "CONTINUOUS")],
            ..Default::default()
        };
        let options = AnalysisOptions {
            rules: vec!["layer_organization".to_string()],
            strict_mode: true,
        };
        let result = DxfGuardCore::check_drawing(Path::new("x.dxf"), &drawing, &options).unwrap();
        assert!(result.total_issues() > 0);
        assert_eq!(result.stats.warnings, 0);
        assert!(result.has_errors());
    }

    #[test]
    fn test_unknown_rule_is_rejected() {
        let options = AnalysisOptions {
            rules: vec!["layer_organisation".to_string()],
            strict_mode: false,
        };
        let err = DxfGuardCore::check_drawing(Path::new("x.dxf"), &DrawingData::default(), &options)
            .unwrap_err();
        match err {
            DxfGuardError::UnknownRule { id, available } => {
                assert_eq!(id, "layer_organisation");
                assert!(available.contains("layer_organization"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let dir = tempfile::tempdir().unwrap();
        let err = DxfGuardCore::check_project(dir.path(), &options).unwrap_err();
        assert!(matches!(err, DxfGuardError::UnknownRule { .. }));
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = DxfGuardCore::analyze_file(Path::new("/nonexistent/part.dxf")).unwrap_err();
        assert!(matches!(err, DxfGuardError::Parse(_)));
    }
}
