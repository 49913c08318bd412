//! Built-in sample drawing: a 100x80 plate with two Ø30 holes.

use std::path::Path;

use dxf::entities::{
    Circle, DiameterDimension, Entity, EntityType, Line, LwPolyline,
    RotatedDimension, Text,
};
use dxf::enums::AcadVersion;
use dxf::tables::Layer;
use dxf::{Color, Drawing, LwPolylineVertex, Point};
use tracing::info;

use crate::core::DxfGuardError;

const DIMENSION_LAYER: &str = "치수선";
const CENTER_LAYER: &str = "중심선";
const OUTLINE_LAYER: &str = "외곽선";
const HIDDEN_LAYER: &str = "숨김선";
const TEXT_LAYER: &str = "텍스트";

const SAMPLE_LAYERS: &[(&str, u8, &str)] = &[
    (DIMENSION_LAYER, 2, "CONTINUOUS"),
    (CENTER_LAYER, 1, "CENTER"),
    (OUTLINE_LAYER, 7, "CONTINUOUS"),
    (HIDDEN_LAYER, 3, "HIDDEN"),
    (TEXT_LAYER, 4, "CONTINUOUS"),
];

fn on_layer(layer: &str, specific: EntityType) -> Entity {
    let mut entity = Entity::new(specific);
    entity.common.layer = layer.to_string();
    entity
}

fn line(layer: &str, from: (f64, f64), to: (f64, f64)) -> Entity {
    let mut l = Line::default();
    l.p1 = Point::new(from.0, from.1, 0.0);
    l.p2 = Point::new(to.0, to.1, 0.0);
    on_layer(layer, EntityType::Line(l))
}

fn circle(layer: &str, center: (f64, f64), radius: f64) -> Entity {
    let mut c = Circle::default();
    c.center = Point::new(center.0, center.1, 0.0);
    c.radius = radius;
    on_layer(layer, EntityType::Circle(c))
}

fn text(layer: &str, value: &str, height: f64, at: (f64, f64)) -> Entity {
    let mut t = Text::default();
    t.value = value.to_string();
    t.text_height = height;
    t.location = Point::new(at.0, at.1, 0.0);
    t.text_style_name = "STANDARD".to_string();
    on_layer(layer, EntityType::Text(t))
}

fn linear_dimension(base: (f64, f64), p1: (f64, f64), p2: (f64, f64), angle: f64, value: f64) -> Entity {
    let mut dim = RotatedDimension::default();
    dim.dimension_base.definition_point_1 = Point::new(base.0, base.1, 0.0);
    dim.dimension_base.actual_measurement = value;
    dim.definition_point_2 = Point::new(p1.0, p1.1, 0.0);
    dim.definition_point_3 = Point::new(p2.0, p2.1, 0.0);
    dim.rotation_angle = angle;
    on_layer(DIMENSION_LAYER, EntityType::RotatedDimension(dim))
}

/// Build the sample drawing in memory.
///
/// The hatch of the reference part is represented by its closed boundary,
/// since the `dxf` crate does not model HATCH entities.
pub fn sample_drawing() -> Drawing {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2010;

    for (name, color, linetype) in SAMPLE_LAYERS {
        let mut layer = Layer::default();
        layer.name = name.to_string();
        layer.color = Color::from_index(*color);
        layer.line_type_name = linetype.to_string();
        drawing.add_layer(layer);
    }

    for (from, to) in [
        ((0.0, 0.0), (100.0, 0.0)),
        ((100.0, 0.0), (100.0, 80.0)),
        ((100.0, 80.0), (0.0, 80.0)),
        ((0.0, 80.0), (0.0, 0.0)),
    ] {
        drawing.add_entity(line(OUTLINE_LAYER, from, to));
    }

    drawing.add_entity(circle(OUTLINE_LAYER, (30.0, 40.0), 15.0));
    drawing.add_entity(circle(OUTLINE_LAYER, (70.0, 40.0), 15.0));

    for (from, to) in [
        ((30.0, 20.0), (30.0, 60.0)),
        ((10.0, 40.0), (50.0, 40.0)),
        ((70.0, 20.0), (70.0, 60.0)),
        ((50.0, 40.0), (90.0, 40.0)),
    ] {
        drawing.add_entity(line(CENTER_LAYER, from, to));
    }

    drawing.add_entity(linear_dimension((50.0, -10.0), (0.0, 0.0), (100.0, 0.0), 0.0, 100.0));
    drawing.add_entity(linear_dimension((110.0, 40.0), (100.0, 0.0), (100.0, 80.0), 90.0, 80.0));

    let mut diameter = DiameterDimension::default();
    diameter.dimension_base.definition_point_1 = Point::new(15.0, 40.0, 0.0);
    diameter.dimension_base.text_mid_point = Point::new(45.0, 55.0, 0.0);
    diameter.dimension_base.actual_measurement = 30.0;
    diameter.definition_point_2 = Point::new(45.0, 40.0, 0.0);
    drawing.add_entity(on_layer(DIMENSION_LAYER, EntityType::DiameterDimension(diameter)));

    drawing.add_entity(text(TEXT_LAYER, "SAMPLE DRAWING", 5.0, (50.0, 90.0)));
    drawing.add_entity(text(TEXT_LAYER, "HOLE Ø30", 3.0, (30.0, 10.0)));
    drawing.add_entity(text(TEXT_LAYER, "HOLE Ø30", 3.0, (70.0, 10.0)));

    let mut boundary = LwPolyline::default();
    boundary.vertices = [(10.0, 65.0), (20.0, 65.0), (20.0, 75.0), (10.0, 75.0)]
        .into_iter()
        .map(|(x, y)| LwPolylineVertex {
            x,
            y,
            ..Default::default()
        })
        .collect();
    boundary.set_is_closed(true);
    drawing.add_entity(on_layer(OUTLINE_LAYER, EntityType::LwPolyline(boundary)));

    drawing
}

/// Write the sample drawing to `path`.
pub fn write_sample(path: &Path) -> Result<(), DxfGuardError> {
    sample_drawing()
        .save_file(path)
        .map_err(|e| DxfGuardError::DxfWrite(e.to_string()))?;
    info!("Sample drawing written to {}", path.display());
    Ok(())
}
