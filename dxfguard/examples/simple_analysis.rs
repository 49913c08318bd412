//! Example: analyze a DXF file and write the Markdown report.
//! Run with: cargo run --example simple_analysis [path/to/file.dxf]

use dxfguard::prelude::*;
use dxfguard::report;
use std::path::Path;

fn main() -> Result<(), DxfGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample.dxf".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_analysis [path/to/file.dxf]");
        std::process::exit(1);
    }

    let result = DxfGuardCore::analyze_file(path)?;
    let summary = &result.advanced.summary;

    println!("Analyzed {}", path.display());
    println!("  Entities: {}", summary.total_entities);
    println!(
        "  Quality:  {:.1} ({})",
        summary.quality_score, summary.quality_grade
    );
    println!("  Complexity: {}", summary.complexity_level);
    for insight in &result.advanced.key_insights {
        println!("  - {}", insight);
    }

    let out = path.with_extension("md");
    std::fs::write(
        &out,
        report::advanced_report(&result.drawing, &result.advanced, &result.three_d),
    )?;
    println!("Report written to {}", out.display());
    Ok(())
}
