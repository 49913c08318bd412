pub mod anomalies;
pub mod complexity;
pub mod insights;
pub mod patterns;
pub mod quality;
pub mod rules;
pub mod standards;
pub mod stats;
pub mod three_d;

pub use anomalies::detect_anomalies;
pub use complexity::{calculate_complexity, ComplexityLevel, ComplexityMetrics};
pub use insights::{analyze_advanced, AdvancedAnalysis, ImprovementSuggestion, Priority};
pub use patterns::{detect_patterns, PatternAnalysis};
pub use quality::{analyze_quality, Grade, QualityMetrics};
pub use rules::{Issue, Rule, RulesEngine, Severity};
pub use standards::{check_compliance, ComplianceReport, ComplianceViolation, ViolationKind};
pub use three_d::{analyze_3d, ThreeDAnalysis};
