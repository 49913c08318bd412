//! Example: using RulesEngine with a custom rule (without DxfGuardCore).
//! Run with: cargo run --example custom_rules [path/to/file.dxf]

use dxfguard::analyzer::Rule;
use dxfguard::{parse_drawing, DrawingData, Issue, RulesEngine, Severity};
use std::path::Path;
use std::sync::Arc;

/// Flags layers whose names contain spaces.
struct NoSpacesInLayerNames;

impl Rule for NoSpacesInLayerNames {
    fn id(&self) -> &str {
        "no_spaces_in_layer_names"
    }

    fn name(&self) -> &str {
        "No Spaces In Layer Names"
    }

    fn description(&self) -> &str {
        "Layer names should not contain spaces"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, drawing: &DrawingData) -> Vec<Issue> {
        drawing
            .layers
            .iter()
            .filter(|l| l.name.contains(' '))
            .map(|l| {
                Issue::new(self.id(), self.severity(), "layer", format!("Layer '{}' contains spaces", l.name))
                    .with_layer(l.name.clone())
            })
            .collect()
    }
}

fn main() -> Result<(), dxfguard::DxfGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample.dxf".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_rules [path/to/file.dxf]");
        std::process::exit(1);
    }

    let drawing = parse_drawing(path)?;
    let mut engine = RulesEngine::with_default_rules();
    engine.add_rule(Arc::new(NoSpacesInLayerNames));
    let issues = engine.analyze(&drawing);

    println!("Custom check found {} issues for {}", issues.len(), path.display());
    for issue in &issues {
        println!("  [{}] {}", issue.severity, issue.message);
        if let Some(ref layer) = issue.layer {
            println!("    Layer: {}", layer);
        }
    }

    let errors = issues.iter().filter(|i| matches!(i.severity, Severity::Error)).count();
    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
