//! DXFGuard - DXF drawing analysis library
//!
//! Parses DXF drawings through the `dxf` crate and turns them into quality
//! scores, ISO standard checks, CNC machinability and cost estimates,
//! drawing comparisons, automatic fixes and Markdown/JSON reports.
//!
//! # Quick Start
//!
//! ```no_run
//! use dxfguard::DxfGuardCore;
//! use std::path::Path;
//!
//! let result = DxfGuardCore::analyze_file(Path::new("part.dxf")).unwrap();
//! println!(
//!     "quality {:.1} ({})",
//!     result.advanced.summary.quality_score,
//!     result.advanced.summary.quality_grade
//! );
//! for issue in &result.advanced.quality_analysis.issues {
//!     println!("{}: {}", issue.severity, issue.message);
//! }
//! ```
//!
//! # Features
//!
//! - **Analysis**: entity statistics, quality score, complexity, anomalies
//! - **Standards**: ISO layer colour and linetype checks
//! - **Manufacturing**: CNC machinability, machining time and cost quotes
//! - **Auto-fix**: standard layers, duplicates, text heights, degenerate entities
//! - **Optional AI**: OpenAI, Claude and Gemini review of the analysis

pub mod ai;
pub mod analyzer;
pub mod autofix;
pub mod compare;
pub mod config;
pub mod core;
pub mod manufacturing;
pub mod parser;
pub mod report;
pub mod sample;

// Re-export main types
pub use analyzer::insights::AdvancedAnalysis;
pub use analyzer::rules::{Issue, RulesEngine, Severity};
pub use autofix::{AutoFixReport, AutoFixer};
pub use compare::{compare_drawings, ComparisonResult};
pub use config::DxfGuardConfig;
pub use crate::core::{
    discover_dxf_files, AnalysisOptions, AnalysisResult, CheckResult, CheckStats, DxfGuardCore,
    DxfGuardError,
};
pub use manufacturing::{CncAnalyzer, CostEstimator, MaterialSpec};
pub use parser::dxf_reader::DxfParser;
pub use parser::schema::DrawingData;

/// Parse a DXF file (convenience wrapper).
pub fn parse_drawing(path: &std::path::Path) -> Result<DrawingData, DxfGuardError> {
    Ok(DxfParser::parse_drawing(path)?)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AnalysisOptions, AnalysisResult, CheckResult, DrawingData, DxfGuardCore, DxfGuardError,
        Issue, Severity,
    };
}
