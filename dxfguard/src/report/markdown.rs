//! Markdown renderers for every analysis result.

use crate::ai::insights::{AIAnalysis, CombinedAnalysis};
use crate::ai::prompts::prepare_data_for_ai;
use crate::analyzer::insights::AdvancedAnalysis;
use crate::analyzer::three_d::ThreeDAnalysis;
use crate::autofix::{AutoFixReport, LayerFix};
use crate::compare::ComparisonResult;
use crate::manufacturing::cnc::CncAnalysis;
use crate::manufacturing::cost::CostEstimate;
use crate::parser::schema::{CircleInfo, DimensionInfo, DrawingData};
use crate::report::format::{escape_cell, footer, thousands, thousands_count, timestamp, title_case};

/// Rows shown in the advanced dimension and circle tables.
pub const DETAIL_ROW_LIMIT: usize = 100;
/// Rows shown in the comparison entity table.
pub const ENTITY_CHANGE_ROW_LIMIT: usize = 10;
/// Characters of each model answer shown in a combined AI report.
pub const COMBINED_EXCERPT_CHARS: usize = 500;

const DIMENSION_HEADER: &str = "| No. | Measurement | Drawing Text | Dimension Style | Layer |\n\
                                |-----|-------------|--------------|-----------------|-------|\n";
const CIRCLE_HEADER: &str = "| No. | Center (X, Y, Z) | Radius | Diameter | Layer |\n\
                             |-----|------------------|--------|----------|-------|\n";

fn dimension_row(idx: usize, dim: &DimensionInfo) -> String {
    format!(
        "| {} | {} | {} | {} | {} |\n",
        idx,
        dim.measurement.map(|m| format!("{:.3}", m)).unwrap_or_default(),
        escape_cell(&dim.text),
        escape_cell(&dim.style),
        escape_cell(&dim.layer)
    )
}

fn circle_row(idx: usize, circle: &CircleInfo) -> String {
    format!(
        "| {} | ({:.3}, {:.3}, {:.3}) | {:.3} | {:.3} | {} |\n",
        idx,
        circle.center.x,
        circle.center.y,
        circle.center.z,
        circle.radius,
        circle.diameter,
        escape_cell(&circle.layer)
    )
}

fn bullet_list(out: &mut String, items: &[String]) {
    for item in items {
        out.push_str(&format!("- {}\n", item));
    }
}

/// File info, counts, entity/layer tables and full dimension and circle
/// tables.
pub fn basic_report(data: &DrawingData) -> String {
    let summary = &data.summary_info;
    let mut md = String::from("# CAD Drawing Analysis Report\n\n");

    md.push_str("## File Information\n");
    md.push_str(&format!("- **File name**: {}\n", data.file_info.filename));
    md.push_str(&format!(
        "- **File size**: {} bytes\n",
        thousands(data.file_info.size as f64)
    ));
    md.push_str(&format!("- **Modified**: {}\n\n", data.file_info.modified_time));

    md.push_str("## Summary\n");
    md.push_str(&format!(
        "- **Total entities**: {}\n",
        thousands_count(summary.total_entities)
    ));
    md.push_str(&format!("- **Layers**: {}\n", summary.layer_count));
    md.push_str(&format!("- **Dimensions**: {}\n", summary.dimension_count));
    md.push_str(&format!(
        "- **Circles/arcs**: {}\n",
        summary.circle_count + summary.arc_count
    ));
    md.push_str(&format!("- **Texts**: {}\n", summary.text_count));
    if let Some(size) = &summary.drawing_size {
        md.push_str(&format!(
            "- **Drawing size**: {:.1} x {:.1}\n",
            size.width, size.height
        ));
    }

    md.push_str("\n## Entity Types\n");
    if !data.entity_breakdown.is_empty() {
        md.push_str("| Entity Type | Count | Share |\n");
        md.push_str("|-------------|-------|-------|\n");
        let total: usize = data.entity_breakdown.values().sum();
        let mut entries: Vec<(&String, &usize)> = data.entity_breakdown.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1));
        for (entity_type, count) in entries {
            let pct = if total > 0 {
                *count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            md.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                entity_type,
                thousands_count(*count),
                pct
            ));
        }
    }

    md.push_str("\n## Layers\n");
    if data.layers.is_empty() {
        md.push_str("No layer information.\n");
    } else {
        md.push_str("| Layer | Color | Linetype |\n");
        md.push_str("|-------|-------|----------|\n");
        for layer in &data.layers {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(&layer.name),
                layer.color,
                escape_cell(&layer.linetype)
            ));
        }
    }

    md.push_str("\n## Dimensions\n\n");
    if data.dimensions.is_empty() {
        md.push_str("No dimension entities.\n");
    } else {
        md.push_str(DIMENSION_HEADER);
        for (idx, dim) in data.dimensions.iter().enumerate() {
            md.push_str(&dimension_row(idx + 1, dim));
        }
    }

    md.push_str("\n## Circles\n\n");
    if data.circles.is_empty() {
        md.push_str("No circle entities.\n");
    } else {
        md.push_str(CIRCLE_HEADER);
        for (idx, circle) in data.circles.iter().enumerate() {
            md.push_str(&circle_row(idx + 1, circle));
        }
    }

    md.push_str(&footer("Report generated"));
    md
}

/// Quality, insights, anomalies, suggestions, the AI context as JSON and
/// capped detail tables.
pub fn advanced_section(data: &DrawingData, analysis: &AdvancedAnalysis) -> String {
    let summary = &analysis.summary;
    let mut md = String::from("# Advanced DXF Analysis\n\n");

    md.push_str("## Overview\n");
    md.push_str(&format!("- **File name**: {}\n", summary.file_name));
    md.push_str(&format!(
        "- **Total entities**: {}\n",
        thousands_count(summary.total_entities)
    ));
    md.push_str(&format!("- **Analyzed**: {}\n\n", timestamp()));

    md.push_str("## Assessment\n");
    md.push_str(&format!(
        "- **Quality grade**: {} ({:.1} points)\n",
        summary.quality_grade, summary.quality_score
    ));
    md.push_str(&format!("- **Complexity**: {}\n", summary.complexity_level));
    md.push_str(&format!(
        "- **Standards**: {}\n\n",
        if summary.standards_compliant {
            "compliant"
        } else {
            "not compliant"
        }
    ));

    md.push_str("## Key Insights\n");
    bullet_list(&mut md, &analysis.key_insights);

    md.push_str("\n## Detailed Analysis\n\n");
    md.push_str("### Quality\n");
    if !analysis.quality_analysis.issues.is_empty() {
        md.push_str("**Issues found:**\n");
        for issue in &analysis.quality_analysis.issues {
            md.push_str(&format!(
                "- [{}] {}: {}\n",
                issue.severity, issue.category, issue.message
            ));
        }
    }
    if !analysis.quality_analysis.recommendations.is_empty() {
        md.push_str("\n**Recommendations:**\n");
        bullet_list(&mut md, &analysis.quality_analysis.recommendations);
    }

    if !analysis.anomalies.is_empty() {
        md.push_str("\n### Anomalies\n");
        for anomaly in &analysis.anomalies {
            md.push_str(&format!(
                "- [{}] {}: {}\n",
                anomaly.severity, anomaly.rule_id, anomaly.message
            ));
        }
    }

    let repeated = &analysis.patterns.repeated_dimensions;
    if repeated.found {
        md.push_str("\n### Patterns\n");
        for (value, count) in &repeated.most_common {
            if *count > 1 {
                md.push_str(&format!("- Dimension {:.3} used {} times\n", value, count));
            }
        }
    }

    md.push_str("\n## Improvement Suggestions\n");
    for s in &analysis.improvement_suggestions {
        md.push_str(&format!(
            "\n### {} - {}\n",
            s.priority.to_string().to_uppercase(),
            s.category
        ));
        md.push_str(&format!("**Suggestion**: {}\n", s.suggestion));
        md.push_str(&format!("**Expected impact**: {}\n", s.impact));
    }

    let context = prepare_data_for_ai(data, Some(analysis));
    let context_json = serde_json::to_string_pretty(&context).unwrap_or_default();
    md.push_str("\n## Context for AI Analysis\n");
    md.push_str("```json\n");
    md.push_str(&context_json);
    md.push_str("\n```\n");

    if !data.dimensions.is_empty() {
        md.push_str("\n---\n\n### Dimension Details\n\n");
        md.push_str(DIMENSION_HEADER);
        for (idx, dim) in data.dimensions.iter().take(DETAIL_ROW_LIMIT).enumerate() {
            md.push_str(&dimension_row(idx + 1, dim));
        }
        if data.dimensions.len() > DETAIL_ROW_LIMIT {
            md.push_str(&format!(
                "| ... | ... | ({} total) | ... | ... |\n",
                data.dimensions.len()
            ));
        }
    }

    if !data.circles.is_empty() {
        md.push_str("\n### Circle Details\n\n");
        md.push_str(CIRCLE_HEADER);
        for (idx, circle) in data.circles.iter().take(DETAIL_ROW_LIMIT).enumerate() {
            md.push_str(&circle_row(idx + 1, circle));
        }
        if data.circles.len() > DETAIL_ROW_LIMIT {
            md.push_str(&format!(
                "| ... | ... | ... | ({} total) | ... |\n",
                data.circles.len()
            ));
        }
    }

    md.push('\n');
    md
}

pub fn three_d_section(analysis: &ThreeDAnalysis) -> String {
    let mut md = String::from("\n## 3D Analysis\n\n");

    if !analysis.is_3d {
        md.push_str("This is a 2D drawing.\n");
        return md;
    }

    md.push_str("**3D drawing detected**\n\n");
    md.push_str("### 3D Entities\n");
    md.push_str(&format!("- 3D entities: {}\n", analysis.entity_count_3d));
    if analysis.solid_count > 0 {
        md.push_str(&format!("- 3D solids: {}\n", analysis.solid_count));
    }
    if analysis.body_count > 0 {
        md.push_str(&format!("- Bodies: {}\n", analysis.body_count));
    }
    if analysis.region_count > 0 {
        md.push_str(&format!("- Regions: {}\n", analysis.region_count));
    }
    if analysis.face_count > 0 {
        md.push_str(&format!("- 3D faces: {}\n", analysis.face_count));
    }
    if analysis.spline_3d_count > 0 {
        md.push_str(&format!(
            "- 3D splines: {} of {}\n",
            analysis.spline_3d_count, analysis.spline_count
        ));
    }
    if analysis.extruded_count > 0 {
        md.push_str(&format!(
            "- Extruded 2D entities: {}\n",
            analysis.extruded_count
        ));
    }

    md.push_str("\n### Spatial Information\n");
    if let (Some(min), Some(max)) = (analysis.z_range.min, analysis.z_range.max) {
        md.push_str(&format!("- Z range: {:.3} to {:.3}\n", min, max));
        md.push_str(&format!("- Z height: {:.3}\n", (max - min).abs()));
    }
    md.push_str(&format!("- 3D complexity: {}\n", analysis.complexity));
    md
}

/// Basic report followed by the advanced and 3D sections.
pub fn advanced_report(
    data: &DrawingData,
    analysis: &AdvancedAnalysis,
    three_d: &ThreeDAnalysis,
) -> String {
    let mut md = basic_report(data);
    md.push_str("\n\n");
    md.push_str(&advanced_section(data, analysis));
    md.push_str(&three_d_section(three_d));
    md
}

pub fn cnc_report(analysis: &CncAnalysis) -> String {
    let mut md = String::from("# CNC Machinability Report\n\n");
    md.push_str(&format!(
        "**Material**: {}\n\n",
        analysis.material.as_str().to_uppercase()
    ));

    let score = &analysis.machinability_score;
    md.push_str("## Machinability\n");
    md.push_str(&format!(
        "- **Overall score**: {:.1}/100 (grade: {})\n",
        score.overall_score, score.grade
    ));
    md.push_str(&format!("- **Complexity**: {:.1}/100\n", score.complexity_score));
    md.push_str(&format!("- **Tool access**: {:.1}/100\n", score.tool_access_score));
    md.push_str(&format!("- **Tolerance**: {:.1}/100\n", score.tolerance_score));
    md.push_str(&format!(
        "- **Surface finish**: {:.1}/100\n",
        score.surface_finish_score
    ));
    md.push_str(&format!(
        "- **Material removal**: {:.1}/100\n\n",
        score.material_removal_score
    ));

    md.push_str("## Recommended Tools\n");
    for tool in &analysis.tool_recommendations {
        md.push_str(&format!("\n### {}\n", tool.tool_type));
        md.push_str(&format!("- **Diameter**: {:.1}mm\n", tool.diameter));
        md.push_str(&format!(
            "- **Material**: {} ({} coating)\n",
            tool.material, tool.coating
        ));
        md.push_str(&format!("- **Cutting speed**: {:.0} m/min\n", tool.cutting_speed));
        md.push_str(&format!("- **Feed**: {:.3} mm/tooth\n", tool.feed_rate));
        md.push_str(&format!("- **Depth of cut**: {:.1}mm\n", tool.depth_of_cut));
        md.push_str(&format!("- **Use**: {}\n", tool.reason));
    }

    let time = &analysis.machining_time;
    md.push_str("\n## Estimated Machining Time\n");
    md.push_str(&format!("- **Total**: {:.1} min\n", time.total_minutes));
    md.push_str(&format!("- **Cutting**: {:.1} min\n", time.cutting_time));
    md.push_str(&format!("- **Drilling**: {:.1} min\n", time.drilling_time));
    md.push_str(&format!("- **Tool changes**: {:.1} min\n", time.tool_change_time));
    md.push_str(&format!("- **Setup**: {:.1} min\n", time.setup_time));
    if !time.efficiency_tips.is_empty() {
        md.push_str("\n### Efficiency Tips\n");
        bullet_list(&mut md, &time.efficiency_tips);
    }

    let opt = &analysis.toolpath_optimization;
    md.push_str("\n## Toolpath Optimization\n");
    md.push_str(&format!("- **Current efficiency**: {}%\n", opt.current_efficiency));
    md.push_str(&format!(
        "- **Optimization potential**: {}%\n",
        opt.optimization_potential
    ));
    if !opt.recommendations.is_empty() {
        md.push_str("\n### Suggestions\n");
        bullet_list(&mut md, &opt.recommendations);
    }

    if !analysis.potential_issues.is_empty() {
        md.push_str("\n## Cautions\n");
        for issue in &analysis.potential_issues {
            md.push_str(&format!(
                "\n### [{}] {}\n",
                issue.severity.to_string().to_uppercase(),
                title_case(&issue.kind)
            ));
            md.push_str(&format!("- **Description**: {}\n", issue.description));
            md.push_str(&format!("- **Solution**: {}\n", issue.solution));
        }
    }

    let cost = &analysis.cost_factors;
    md.push_str("\n## Estimated Cost\n");
    md.push_str(&format!("- **Machining**: {} KRW\n", thousands(cost.machining_cost)));
    md.push_str(&format!("- **Tooling**: {} KRW\n", thousands(cost.tool_cost)));
    md.push_str(&format!(
        "- **Material difficulty factor**: {:.1}x\n",
        cost.material_factor
    ));
    md.push_str(&format!(
        "- **Total estimate**: {} KRW\n",
        thousands(cost.total_estimated_cost)
    ));
    md
}

pub fn cost_report(estimate: &CostEstimate) -> String {
    let mut md = String::from("# Manufacturing Cost Report\n\n");

    md.push_str(&format!(
        "**Quantity**: {} pcs\n",
        estimate.production_quantity
    ));
    md.push_str(&format!("**Unit cost**: {} KRW\n", thousands(estimate.unit_cost)));
    md.push_str(&format!(
        "**Quantity discount**: {:.1}%\n",
        estimate.quantity_discount
    ));
    md.push_str(&format!(
        "**Unit price after discount**: {} KRW\n",
        thousands(estimate.unit_price_after_discount)
    ));
    md.push_str(&format!(
        "**Total production cost**: {} KRW\n\n",
        thousands(estimate.total_production_cost)
    ));

    let material = &estimate.material_cost;
    let (l, w, h) = material.raw_stock_size;
    md.push_str("## Material\n");
    md.push_str(&format!("- **Material**: {}\n", material.material_type));
    md.push_str(&format!("- **Raw stock**: {:.1} x {:.1} x {:.1}mm\n", l, w, h));
    md.push_str(&format!("- **Unit price**: {} KRW/kg\n", thousands(material.unit_price)));
    md.push_str(&format!("- **Material cost**: {} KRW\n\n", thousands(material.total_cost)));

    let machining = &estimate.machining_cost;
    md.push_str("## Machining\n");
    md.push_str(&format!("- **Setup**: {:.1} min\n", machining.setup_time));
    md.push_str(&format!("- **Cutting**: {:.1} min\n", machining.cutting_time));
    md.push_str(&format!("- **Drilling**: {:.1} min\n", machining.drilling_time));
    md.push_str(&format!("- **Tool changes**: {:.1} min\n", machining.tool_change_time));
    md.push_str(&format!(
        "- **Machine rate**: {} KRW/h\n",
        thousands(machining.machine_rate)
    ));
    md.push_str(&format!("- **Labor rate**: {} KRW/h\n", thousands(machining.labor_rate)));
    md.push_str(&format!(
        "- **Machining cost**: {} KRW\n\n",
        thousands(machining.total_cost)
    ));

    let tooling = &estimate.tooling_cost;
    md.push_str("## Tooling\n");
    md.push_str(&format!("- **Tool wear**: {} KRW\n", thousands(tooling.tool_wear_cost)));
    md.push_str(&format!(
        "- **Consumables**: {} KRW\n",
        thousands(tooling.consumables_cost)
    ));
    md.push_str(&format!("- **Total tooling**: {} KRW\n\n", thousands(tooling.total_cost)));

    md.push_str("## Cost Breakdown\n");
    for share in &estimate.cost_breakdown {
        md.push_str(&format!(
            "- **{}**: {} KRW ({:.1}%)\n",
            title_case(&share.category),
            thousands(share.amount),
            share.percentage
        ));
    }
    md.push('\n');

    if !estimate.cost_reduction_suggestions.is_empty() {
        md.push_str("## Cost Reduction Suggestions\n");
        bullet_list(&mut md, &estimate.cost_reduction_suggestions);
    }
    md
}

pub fn comparison_report(result: &ComparisonResult) -> String {
    let mut md = String::from("# DXF Drawing Comparison Report\n\n");

    let info = &result.file_info;
    md.push_str("## Files\n");
    md.push_str(&format!("- **File 1**: {}\n", info.file1));
    md.push_str(&format!("- **File 2**: {}\n", info.file2));
    md.push_str(&format!("- **Size difference**: {:+} bytes\n\n", info.size_diff));

    let summary = &result.summary;
    md.push_str("## Summary\n");
    md.push_str(&format!(
        "- **Change level**: {}\n",
        summary.change_level.as_str().to_uppercase()
    ));
    md.push_str(&format!("- **Added**: {} items\n", summary.total_additions));
    md.push_str(&format!("- **Removed**: {} items\n", summary.total_removals));
    md.push_str(&format!("- **Modified**: {} items\n", summary.total_modifications));
    if !summary.major_changes.is_empty() {
        md.push_str("\n### Major Changes\n");
        bullet_list(&mut md, &summary.major_changes);
    }

    md.push_str("\n## Layer Changes\n");
    if !result.added.layers.is_empty() {
        md.push_str("\n### Added Layers\n");
        for layer in &result.added.layers {
            md.push_str(&format!("- {} (color: {})\n", layer.name, layer.color));
        }
    }
    if !result.removed.layers.is_empty() {
        md.push_str("\n### Removed Layers\n");
        for layer in &result.removed.layers {
            md.push_str(&format!("- {}\n", layer.name));
        }
    }
    if !result.modified_layers.is_empty() {
        md.push_str("\n### Modified Layers\n");
        for layer in &result.modified_layers {
            md.push_str(&format!("- **{}**:\n", layer.name));
            for change in &layer.changes {
                md.push_str(&format!(
                    "  - {}: {} -> {}\n",
                    change.property, change.old, change.new
                ));
            }
        }
    }

    if !result.entity_changes.is_empty() {
        md.push_str("\n## Entity Changes\n");
        md.push_str("| Entity Type | Before | After | Change |\n");
        md.push_str("|-------------|--------|-------|--------|\n");
        for change in result.entity_changes.iter().take(ENTITY_CHANGE_ROW_LIMIT) {
            md.push_str(&format!(
                "| {} | {} | {} | {:+} |\n",
                change.entity_type, change.old_count, change.new_count, change.difference
            ));
        }
    }

    let dims = &result.dimension_count_change;
    if dims.difference != 0 {
        md.push_str("\n## Dimension Changes\n");
        md.push_str(&format!(
            "- Dimensions: {} -> {} ({:+})\n",
            dims.old, dims.new, dims.difference
        ));
        let added = &result.added.dimension_values;
        if !added.is_empty() && added.len() <= 10 {
            md.push_str("\nAdded dimension values:\n");
            for value in added.iter().take(5) {
                md.push_str(&format!("- {:.3}\n", value));
            }
        }
    }

    let texts = &result.text_count_change;
    if texts.difference != 0 {
        md.push_str("\n## Text Changes\n");
        md.push_str(&format!(
            "- Texts: {} -> {} ({:+})\n",
            texts.old, texts.new, texts.difference
        ));
    }

    md.push_str(&footer("Compared"));
    md
}

pub fn autofix_report(report: &AutoFixReport) -> String {
    let mut md = String::from("# DXF Auto-Fix Report\n\n");

    let summary = &report.summary;
    md.push_str("## Summary\n");
    md.push_str(&format!("- **Total fixes**: {}\n", summary.total_fixes));
    md.push_str(&format!(
        "- **Backup created**: {}\n",
        if summary.backup_created { "yes" } else { "no" }
    ));
    if !summary.fixes_applied.is_empty() {
        md.push_str("\n### Applied Fixes\n");
        bullet_list(&mut md, &summary.fixes_applied);
    }

    if !report.layer_fixes.is_empty() {
        md.push_str("\n## Layer Fixes\n");
        for fix in &report.layer_fixes {
            match fix {
                LayerFix::LayerCreated { name, color, .. } => {
                    md.push_str(&format!("- Layer created: {} (color: {})\n", name, color));
                }
                LayerFix::LayerColorFixed {
                    name,
                    old_color,
                    new_color,
                } => {
                    md.push_str(&format!(
                        "- Color fixed: {} ({} -> {})\n",
                        name, old_color, new_color
                    ));
                }
            }
        }
    }

    if report.duplicate_fixes.count > 0 {
        md.push_str("\n## Duplicates Removed\n");
        md.push_str(&format!(
            "- Duplicate entities removed: {}\n",
            report.duplicate_fixes.count
        ));
    }

    if !report.standard_fixes.is_empty() {
        md.push_str("\n## Standards Fixes\n");
        md.push_str(&format!(
            "- ISO standard applied: {} layer(s)\n",
            report.standard_fixes.len()
        ));
    }

    if !report.text_fixes.is_empty() {
        md.push_str("\n## Text Fixes\n");
        let heights = report.text_height_fix_count();
        if heights > 0 {
            md.push_str(&format!("- Text heights raised: {}\n", heights));
        }
        let moved = report.texts_moved();
        if moved > 0 {
            md.push_str(&format!("- Texts moved to the TEXT layer: {}\n", moved));
        }
    }

    if !report.zero_size_fixes.is_empty() {
        md.push_str("\n## Degenerate Entities Removed\n");
        md.push_str(&format!(
            "- Zero length or zero radius entities removed: {}\n",
            report.zero_size_fixes.len()
        ));
    }

    md.push_str(&footer("Fixed"));
    md
}

const AI_REPORT_TITLE: &str = "# AI Drawing Analysis Report\n\n";

pub fn ai_report(analysis: &AIAnalysis) -> String {
    let mut md = String::from(AI_REPORT_TITLE);
    md.push_str(&format!("**Model**: {}\n", analysis.model));
    md.push_str(&format!("**Prompt**: {}\n", analysis.prompt_type));
    md.push_str(&format!("**Analyzed**: {}\n\n", analysis.timestamp));

    md.push_str("## Analysis\n");
    if analysis.analysis.trim().is_empty() {
        md.push_str("No analysis returned.");
    } else {
        md.push_str(&analysis.analysis);
    }
    md.push_str("\n\n");

    if !analysis.issues.is_empty() {
        md.push_str("## Issues Found\n");
        bullet_list(&mut md, &analysis.issues);
        md.push('\n');
    }
    if !analysis.recommendations.is_empty() {
        md.push_str("## Recommendations\n");
        bullet_list(&mut md, &analysis.recommendations);
        md.push('\n');
    }
    md
}

pub fn combined_ai_report(combined: &CombinedAnalysis) -> String {
    let mut md = String::from(AI_REPORT_TITLE);
    md.push_str(&format!("**Models**: {}\n", combined.models_used.join(", ")));
    md.push_str(&format!("**Analyzed**: {}\n\n", combined.timestamp));

    for analysis in &combined.analyses {
        md.push_str(&format!("### {} analysis\n", analysis.model));
        let excerpt: String = analysis.analysis.chars().take(COMBINED_EXCERPT_CHARS).collect();
        md.push_str(&excerpt);
        md.push_str("...\n\n");
    }

    if !combined.failures.is_empty() {
        md.push_str("### Failed providers\n");
        for failure in &combined.failures {
            md.push_str(&format!("- {}: {}\n", failure.provider, failure.error));
        }
        md.push('\n');
    }

    if let Some(insights) = &combined.combined_insights {
        md.push_str("## Combined Insights\n");
        if !insights.common_issues.is_empty() {
            md.push_str("\n### Common Issues\n");
            bullet_list(&mut md, &insights.common_issues);
        }
        if !insights.common_recommendations.is_empty() {
            md.push_str("\n### Common Recommendations\n");
            bullet_list(&mut md, &insights.common_recommendations);
        }
        let confidence = serde_json::to_value(insights.confidence_level)
            .ok()
            .and_then(|v| v.as_str().map(str::to_uppercase))
            .unwrap_or_default();
        md.push_str(&format!("\n**Confidence**: {}\n", confidence));
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::insights::analyze_advanced;
    use crate::analyzer::three_d::analyze_3d;
    use crate::compare::compare_drawings;
    use crate::parser::schema::{LayerInfo, Point3};

    fn drawing() -> DrawingData {
        let mut data = DrawingData::default();
        data.file_info.filename = "part.dxf".to_string();
        data.file_info.size = 12345;
        data.layers = vec![
            LayerInfo::new("0", 7, "CONTINUOUS"),
            LayerInfo::new("DIM", 2, "CONTINUOUS"),
        ];
        data.dimensions = vec![DimensionInfo {
            layer: "DIM".to_string(),
            measurement: Some(100.0),
            text: "<>|A".to_string(),
            style: "STANDARD".to_string(),
        }];
        data.circles = vec![CircleInfo::new("0", Point3::new(1.0, 2.0, 0.0), 5.0)];
        data.entity_breakdown.insert("LINE".to_string(), 3);
        data.entity_breakdown.insert("CIRCLE".to_string(), 1);
        data.entity_breakdown.insert("DIMENSION".to_string(), 1);
        data.refresh_summary();
        data
    }

    #[test]
    fn test_basic_report_tables() {
        let md = basic_report(&drawing());
        assert!(md.starts_with("# CAD Drawing Analysis Report"));
        assert!(md.contains("- **File size**: 12,345 bytes"));
        assert!(md.contains("| LINE | 3 | 60.0% |"));
        assert!(md.contains("| 1 | 100.000 | <>\\|A | STANDARD | DIM |"));
        assert!(md.contains("| 1 | (1.000, 2.000, 0.000) | 5.000 | 10.000 | 0 |"));
        assert!(md.contains("*Report generated: "));
    }

    #[test]
    fn test_basic_report_entity_order() {
        let md = basic_report(&drawing());
        let line = md.find("| LINE |").unwrap();
        let circle = md.find("| CIRCLE |").unwrap();
        assert!(line < circle);
    }

    #[test]
    fn test_empty_drawing_messages() {
        let md = basic_report(&DrawingData::default());
        assert!(md.contains("No layer information."));
        assert!(md.contains("No dimension entities."));
        assert!(md.contains("No circle entities."));
    }

    #[test]
    fn test_advanced_report_sections() {
        let data = drawing();
        let analysis = analyze_advanced(&data);
        let md = advanced_report(&data, &analysis, &analyze_3d(&data));
        assert!(md.contains("# Advanced DXF Analysis"));
        assert!(md.contains("## Context for AI Analysis"));
        assert!(md.contains("```json"));
        assert!(md.contains("### Dimension Details"));
        assert!(md.contains("This is a 2D drawing."));
    }

    #[test]
    fn test_detail_tables_are_capped() {
        let mut data = drawing();
        data.circles = (0..150)
            .map(|i| CircleInfo::new("0", Point3::new(i as f64, 0.0, 0.0), 1.0))
            .collect();
        let analysis = analyze_advanced(&data);
        let md = advanced_section(&data, &analysis);
        assert!(md.contains("| 100 | (99.000"));
        assert!(!md.contains("| 101 | (100.000"));
        assert!(md.contains("(150 total)"));
    }

    #[test]
    fn test_comparison_report() {
        let old = drawing();
        let mut new = drawing();
        new.layers.push(LayerInfo::new("TEXT", 4, "CONTINUOUS"));
        new.entity_breakdown.insert("LINE".to_string(), 40);
        new.refresh_summary();

        let md = comparison_report(&compare_drawings(&old, &new));
        assert!(md.contains("### Added Layers"));
        assert!(md.contains("- TEXT (color: 4)"));
        assert!(md.contains("| LINE | 3 | 40 | +37 |"));
    }

    #[test]
    fn test_combined_excerpt_is_char_safe() {
        use crate::ai::prompts::PromptType;
        let long = "가".repeat(600);
        let combined = CombinedAnalysis {
            timestamp: String::new(),
            models_used: vec!["m".to_string()],
            analyses: vec![AIAnalysis::from_response("p", "m", PromptType::Analysis, long)],
            failures: Vec::new(),
            combined_insights: None,
        };
        let md = combined_ai_report(&combined);
        assert!(md.contains(&format!("{}...", "가".repeat(500))));
        assert!(!md.contains("## Combined Insights"));
    }
}
