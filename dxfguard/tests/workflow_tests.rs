//! End-to-end tests for comparison, manufacturing and auto-fix workflows

use dxf::entities::{Circle, Entity, EntityType, Line, Text};
use dxf::enums::AcadVersion;
use dxf::tables::Layer;
use dxf::{Color, Drawing, Point};
use dxfguard::compare::{compare_drawings, ChangeLevel};
use dxfguard::manufacturing::cost::CustomerInfo;
use dxfguard::manufacturing::EstimateError;
use dxfguard::report;
use dxfguard::sample::{sample_drawing, write_sample};
use dxfguard::{parse_drawing, AutoFixer, CncAnalyzer, CostEstimator, MaterialSpec};
use std::path::{Path, PathBuf};

fn sample_in(dir: &Path) -> PathBuf {
    let path = dir.join("sample.dxf");
    write_sample(&path).expect("sample should be written");
    path
}

fn circle(x: f64, y: f64, r: f64) -> Entity {
    let mut c = Circle::default();
    c.center = Point::new(x, y, 0.0);
    c.radius = r;
    Entity::new(EntityType::Circle(c))
}

fn line(from: (f64, f64), to: (f64, f64)) -> Entity {
    let mut l = Line::default();
    l.p1 = Point::new(from.0, from.1, 0.0);
    l.p2 = Point::new(to.0, to.1, 0.0);
    Entity::new(EntityType::Line(l))
}

/// Everything on layer 0, one duplicate circle, one tiny text and one
/// zero-length line.
fn write_messy(dir: &Path) -> PathBuf {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2010;
    drawing.add_entity(line((0.0, 0.0), (50.0, 0.0)));
    drawing.add_entity(line((10.0, 10.0), (10.0, 10.0)));
    drawing.add_entity(circle(20.0, 20.0, 5.0));
    drawing.add_entity(circle(20.0, 20.0, 5.0));
    drawing.add_entity(circle(40.0, 20.0, 5.0));

    let mut text = Text::default();
    text.value = "tiny".to_string();
    text.text_height = 1.0;
    drawing.add_entity(Entity::new(EntityType::Text(text)));

    let path = dir.join("messy.dxf");
    drawing.save_file(&path).expect("messy drawing should save");
    path
}

#[test]
fn test_compare_sample_with_revision() {
    let dir = tempfile::tempdir().unwrap();
    let old_path = sample_in(dir.path());

    let mut revised = sample_drawing();
    let mut layer = Layer::default();
    layer.name = "REV".to_string();
    layer.color = Color::from_index(6);
    revised.add_layer(layer);
    for i in 0..6 {
        let y = 100.0 + i as f64 * 10.0;
        revised.add_entity(line((0.0, y), (100.0, y)));
    }
    let new_path = dir.path().join("sample_rev.dxf");
    revised.save_file(&new_path).unwrap();

    let old = parse_drawing(&old_path).unwrap();
    let new = parse_drawing(&new_path).unwrap();
    let result = compare_drawings(&old, &new);

    let lines = result
        .entity_changes
        .iter()
        .find(|c| c.entity_type == "LINE")
        .expect("line count changed");
    assert_eq!((lines.old_count, lines.new_count, lines.difference), (8, 14, 6));
    assert_eq!(result.summary.change_level, ChangeLevel::Minor);
    assert_eq!(result.added.layers.len(), 1);
    assert_eq!(result.added.layers[0].name, "REV");
    assert!(result
        .summary
        .major_changes
        .contains(&"Layer structure changed".to_string()));

    let md = report::comparison_report(&result);
    assert!(md.contains("| LINE | 8 | 14 | +6 |"));
}

#[test]
fn test_identical_drawings_have_no_changes() {
    let dir = tempfile::tempdir().unwrap();
    let data = parse_drawing(&sample_in(dir.path())).unwrap();
    let result = compare_drawings(&data, &data);
    assert_eq!(result.summary.change_level, ChangeLevel::None);
    assert!(result.entity_changes.is_empty());
}

#[test]
fn test_cnc_analysis_of_sample() {
    let dir = tempfile::tempdir().unwrap();
    let data = parse_drawing(&sample_in(dir.path())).unwrap();
    let analysis = CncAnalyzer::for_material("aluminum").unwrap().analyze(&data);

    assert_eq!(analysis.geometry.holes.len(), 2);
    assert_eq!(analysis.geometry.min_radius, Some(15.0));
    assert_eq!(analysis.geometry.contours.len(), 1);
    let score = analysis.machinability_score.overall_score;
    assert!((0.0..=100.0).contains(&score));
    assert!(analysis.machining_time.total_minutes > 0.0);

    let md = report::cnc_report(&analysis);
    assert!(md.contains("**Material**: ALUMINUM"));
}

#[test]
fn test_cost_estimate_of_sample() {
    let dir = tempfile::tempdir().unwrap();
    let data = parse_drawing(&sample_in(dir.path())).unwrap();
    let spec = MaterialSpec::parse("steel", None, 12.0, "3axis_mill").unwrap();
    let estimate = CostEstimator::estimate(&data, &spec, 100).unwrap();

    assert_eq!(estimate.production_quantity, 100);
    assert!((estimate.quantity_discount - 15.0).abs() < 1e-9);
    assert!(estimate.unit_cost > 0.0);
    assert!(estimate.unit_price_after_discount < estimate.unit_cost);
    assert_eq!(estimate.geometry.holes.len(), 2);

    let md = report::cost_report(&estimate);
    assert!(md.contains("**Quantity**: 100 pcs"));
    let quote = CostEstimator::quotation(&estimate, &CustomerInfo::default());
    assert!(quote.contains("Quantity: 100 pcs"));
}

#[test]
fn test_cost_rejects_zero_quantity() {
    let dir = tempfile::tempdir().unwrap();
    let data = parse_drawing(&sample_in(dir.path())).unwrap();
    assert!(matches!(
        CostEstimator::estimate(&data, &MaterialSpec::default(), 0),
        Err(EstimateError::InvalidQuantity)
    ));
}

#[test]
fn test_autofix_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_messy(dir.path());

    let mut fixer = AutoFixer::load(&path).unwrap();
    let backup = fixer.create_backup(&path).unwrap();
    let fix_report = fixer.fix_with_analysis();
    let fixed_path = dir.path().join("messy_fixed.dxf");
    fixer.save(&fixed_path).unwrap();

    assert!(backup.exists());
    assert!(fix_report.summary.backup_created);
    assert!(fix_report.summary.success);
    assert_eq!(fix_report.duplicate_fixes.count, 1);
    assert_eq!(fix_report.zero_size_fixes.len(), 1);
    assert_eq!(fix_report.text_height_fix_count(), 1);
    assert_eq!(fix_report.texts_moved(), 1);

    let fixed = parse_drawing(&fixed_path).unwrap();
    assert_eq!(fixed.circles.len(), 2);
    assert_eq!(fixed.lines.len(), 1);
    assert_eq!(fixed.texts[0].layer, "TEXT");
    assert_eq!(fixed.texts[0].height, 2.5);
    for name in ["DIMENSION", "CENTER", "HIDDEN", "TEXT", "HATCH"] {
        assert!(fixed.layers.iter().any(|l| l.name == name), "missing layer {}", name);
    }

    let md = report::autofix_report(&fix_report);
    assert!(md.contains("- **Backup created**: yes"));
    assert!(md.contains("- Duplicate entities removed: 1"));
}
