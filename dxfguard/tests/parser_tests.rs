//! Tests for DXF file parsing

use dxf::entities::{Arc, Circle, Entity, EntityType, Line, LwPolyline, MText, Text};
use dxf::enums::AcadVersion;
use dxf::tables::Layer;
use dxf::{Color, Drawing, LwPolylineVertex, Point};
use dxfguard::parse_drawing;
use std::path::{Path, PathBuf};

fn on_layer(layer: &str, specific: EntityType) -> Entity {
    let mut entity = Entity::new(specific);
    entity.common.layer = layer.to_string();
    entity
}

fn write_fixture(dir: &Path) -> PathBuf {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2010;

    let mut layer = Layer::default();
    layer.name = "OUTLINE".to_string();
    layer.color = Color::from_index(7);
    drawing.add_layer(layer);

    let mut line = Line::default();
    line.p1 = Point::new(-10.0, 0.0, 0.0);
    line.p2 = Point::new(40.0, 25.0, 0.0);
    drawing.add_entity(on_layer("OUTLINE", EntityType::Line(line)));

    let mut circle = Circle::default();
    circle.center = Point::new(5.0, 5.0, 0.0);
    circle.radius = 2.5;
    drawing.add_entity(on_layer("OUTLINE", EntityType::Circle(circle)));

    let mut arc = Arc::default();
    arc.center = Point::new(0.0, 0.0, 0.0);
    arc.radius = 4.0;
    arc.start_angle = 0.0;
    arc.end_angle = 90.0;
    drawing.add_entity(on_layer("OUTLINE", EntityType::Arc(arc)));

    let mut text = Text::default();
    text.value = "NOTE".to_string();
    text.text_height = 3.5;
    drawing.add_entity(on_layer("OUTLINE", EntityType::Text(text)));

    let mut mtext = MText::default();
    mtext.text = "GENERAL TOLERANCE".to_string();
    mtext.initial_text_height = 2.0;
    drawing.add_entity(on_layer("OUTLINE", EntityType::MText(mtext)));

    let mut poly = LwPolyline::default();
    poly.vertices = vec![
        LwPolylineVertex { x: 0.0, y: 0.0, ..Default::default() },
        LwPolylineVertex { x: 10.0, y: 0.0, ..Default::default() },
        LwPolylineVertex { x: 10.0, y: 10.0, ..Default::default() },
    ];
    poly.set_is_closed(true);
    drawing.add_entity(on_layer("OUTLINE", EntityType::LwPolyline(poly)));

    let path = dir.join("fixture.dxf");
    drawing.save_file(&path).expect("fixture should save");
    path
}

#[test]
fn test_parse_entity_counts() {
    let dir = tempfile::tempdir().unwrap();
    let data = parse_drawing(&write_fixture(dir.path())).expect("Should parse");

    assert_eq!(data.lines.len(), 1);
    assert_eq!(data.circles.len(), 1);
    assert_eq!(data.arcs.len(), 1);
    assert_eq!(data.texts.len(), 2);
    assert_eq!(data.polylines.len(), 1);
    assert_eq!(data.entity_breakdown.get("LWPOLYLINE"), Some(&1));
    assert_eq!(data.entity_breakdown.get("MTEXT"), Some(&1));
    assert_eq!(data.summary_info.total_entities, 6);
    assert_eq!(data.entities_by_layer["OUTLINE"]["CIRCLE"], 1);
}

#[test]
fn test_parse_geometry_values() {
    let dir = tempfile::tempdir().unwrap();
    let data = parse_drawing(&write_fixture(dir.path())).expect("Should parse");

    assert_eq!(data.circles[0].diameter, 5.0);
    assert!((data.lines[0].length - (50.0f64.powi(2) + 25.0f64.powi(2)).sqrt()).abs() < 1e-9);
    assert!(data.polylines[0].closed);
    assert_eq!(data.polylines[0].vertex_count, 3);

    let texts: Vec<_> = data.texts.iter().map(|t| (t.text.as_str(), t.height)).collect();
    assert!(texts.contains(&("NOTE", 3.5)));
    assert!(texts.contains(&("GENERAL TOLERANCE", 2.0)));
}

#[test]
fn test_bounds_come_from_lines() {
    let dir = tempfile::tempdir().unwrap();
    let data = parse_drawing(&write_fixture(dir.path())).expect("Should parse");

    let size = data.summary_info.drawing_size.expect("line gives bounds");
    assert_eq!(size.width, 50.0);
    assert_eq!(size.height, 25.0);
}

#[test]
fn test_parse_layers() {
    let dir = tempfile::tempdir().unwrap();
    let data = parse_drawing(&write_fixture(dir.path())).expect("Should parse");

    let outline = data.layers.iter().find(|l| l.name == "OUTLINE").expect("layer kept");
    assert_eq!(outline.color, 7);
    assert_eq!(data.summary_info.layer_count, data.layers.len());
}

#[test]
fn test_file_info() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path());
    let data = parse_drawing(&path).expect("Should parse");

    assert_eq!(data.file_info.filename, "fixture.dxf");
    assert_eq!(data.file_info.size, std::fs::metadata(&path).unwrap().len());
    assert!(!data.file_info.modified_time.is_empty());
}

#[test]
fn test_parse_missing_file() {
    let result = parse_drawing(Path::new("not_a_real_file.dxf"));
    assert!(result.is_err(), "Should fail on nonexistent file");
}
