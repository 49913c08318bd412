//! Markdown and JSON rendering of analysis results.

pub mod format;
pub mod markdown;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use markdown::{
    advanced_report, ai_report, autofix_report, basic_report, cnc_report, combined_ai_report,
    comparison_report, cost_report, three_d_section,
};

/// Pretty-printed JSON for any result type.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> std::io::Result<()> {
    let json = to_json(value).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

/// `report.md` -> `report_ai_context.json`, next to the report.
pub fn ai_context_path(report_path: &Path) -> PathBuf {
    let stem = report_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    report_path.with_file_name(format!("{}_ai_context.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_context_path() {
        assert_eq!(
            ai_context_path(Path::new("out/part_report.md")),
            PathBuf::from("out/part_report_ai_context.json")
        );
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        write_json(&serde_json::json!({"a": 1}), &path).unwrap();
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["a"], 1);
    }
}
