//! Integration tests for the DXFGuard library

use dxfguard::prelude::*;
use dxfguard::report;
use dxfguard::sample::write_sample;
use std::path::{Path, PathBuf};

fn sample_in(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    write_sample(&path).expect("sample should be written");
    path
}

#[test]
fn test_analyze_sample() {
    let dir = tempfile::tempdir().unwrap();
    let result = DxfGuardCore::analyze_file(&sample_in(dir.path(), "sample.dxf"))
        .expect("sample should analyze");

    let drawing = &result.drawing;
    assert_eq!(drawing.summary_info.total_entities, 17);
    assert_eq!(drawing.entity_breakdown.get("LINE"), Some(&8));
    assert_eq!(drawing.entity_breakdown.get("DIMENSION"), Some(&3));
    assert_eq!(drawing.summary_info.circle_count, 2);
    assert_eq!(drawing.file_info.filename, "sample.dxf");

    let summary = &result.advanced.summary;
    assert_eq!(summary.total_entities, 17);
    assert!(summary.quality_score >= 0.0 && summary.quality_score <= 100.0);
    assert!(summary.standards_compliant);
    assert!(!result.three_d.is_3d);
}

#[test]
fn test_check_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = sample_in(dir.path(), "sample.dxf");
    let result = DxfGuardCore::check_file(&path, &AnalysisOptions::default())
        .expect("sample should check");

    assert_eq!(result.file, path);
    assert_eq!(result.total_issues(), result.issues.len());
    assert!(!result.issues.iter().any(|i| i.rule_id == "iso_layer_color"));
    assert!(!result.issues.iter().any(|i| i.rule_id == "duplicate_circle"));
}

#[test]
fn test_check_with_rule_filter() {
    let dir = tempfile::tempdir().unwrap();
    let path = sample_in(dir.path(), "sample.dxf");
    let options = AnalysisOptions {
        rules: vec!["text_scale".to_string()],
        strict_mode: false,
    };
    let result = DxfGuardCore::check_file(&path, &options).expect("sample should check");
    assert!(result.issues.iter().all(|i| i.rule_id == "text_scale"));
}

#[test]
fn test_check_project_walks_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("rev2")).unwrap();
    std::fs::create_dir_all(dir.path().join(".cache")).unwrap();
    sample_in(dir.path(), "a.dxf");
    sample_in(&dir.path().join("rev2"), "b.dxf");
    sample_in(&dir.path().join(".cache"), "c.dxf");

    let results = DxfGuardCore::check_project(dir.path(), &AnalysisOptions::default())
        .expect("project should check");
    assert_eq!(results.len(), 2);
    assert!(results[0].file.ends_with("a.dxf"));
    assert!(results[1].file.ends_with("rev2/b.dxf"));
}

#[test]
fn test_advanced_report_for_sample() {
    let dir = tempfile::tempdir().unwrap();
    let result = DxfGuardCore::analyze_file(&sample_in(dir.path(), "sample.dxf")).unwrap();
    let md = report::advanced_report(&result.drawing, &result.advanced, &result.three_d);

    assert!(md.contains("# CAD Drawing Analysis Report"));
    assert!(md.contains("| LINE | 8 |"));
    assert!(md.contains("# Advanced DXF Analysis"));
    assert!(md.contains("## 3D Analysis"));
}

#[test]
fn test_analysis_result_serializes() {
    let dir = tempfile::tempdir().unwrap();
    let result = DxfGuardCore::analyze_file(&sample_in(dir.path(), "sample.dxf")).unwrap();
    let json = report::to_json(&result).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["drawing"]["summary_info"]["total_entities"], 17);
    assert!(value["advanced"]["summary"]["quality_score"].is_number());
}

#[test]
fn test_analyze_missing_file() {
    let result = DxfGuardCore::analyze_file(Path::new("missing.dxf"));
    assert!(matches!(result, Err(DxfGuardError::Parse(_))));
}
