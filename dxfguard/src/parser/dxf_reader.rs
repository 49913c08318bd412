//! DXF ingestion.
//!
//! Loading is delegated to the `dxf` crate. This module walks the model
//! space once and collects per-type details into [`DrawingData`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use dxf::entities::{Entity, EntityType};
use dxf::Drawing;
use thiserror::Error;
use tracing::{debug, info};

use crate::parser::schema::*;

#[derive(Debug, Error)]
pub enum DxfParseError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to load DXF: {0}")]
    Load(String),
}

/// Default colour for layers without a valid colour index.
pub const DEFAULT_LAYER_COLOR: i16 = 7;
pub const DEFAULT_LINETYPE: &str = "CONTINUOUS";

/// Reader turning DXF files into [`DrawingData`].
pub struct DxfParser;

impl DxfParser {
    /// Parse a DXF file from disk.
    pub fn parse_drawing(path: &Path) -> Result<DrawingData, DxfParseError> {
        let file_info = Self::read_file_info(path)?;
        let drawing = Self::load(path)?;
        let data = Self::from_drawing(&drawing, file_info);
        info!(
            "Parsed {}: {} entity types, {} entities",
            path.display(),
            data.entity_breakdown.len(),
            data.summary_info.total_entities
        );
        Ok(data)
    }

    /// Load a DXF file through the `dxf` crate.
    pub fn load(path: &Path) -> Result<Drawing, DxfParseError> {
        if !path.exists() {
            return Err(DxfParseError::NotFound(path.to_path_buf()));
        }
        Drawing::load_file(path).map_err(|e| DxfParseError::Load(e.to_string()))
    }

    pub fn read_file_info(path: &Path) -> Result<FileInfo, DxfParseError> {
        if !path.exists() {
            return Err(DxfParseError::NotFound(path.to_path_buf()));
        }
        let metadata = std::fs::metadata(path)?;
        let modified_time = metadata
            .modified()
            .map(|t| {
                DateTime::<Local>::from(t)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default();

        Ok(FileInfo {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size: metadata.len(),
            modified_time,
        })
    }

    /// Aggregate an already-loaded drawing.
    pub fn from_drawing(drawing: &Drawing, file_info: FileInfo) -> DrawingData {
        let mut data = DrawingData {
            file_info,
            ..Default::default()
        };

        for layer in drawing.layers() {
            data.layers.push(LayerInfo::new(
                layer.name.clone(),
                layer
                    .color
                    .index()
                    .map(i16::from)
                    .unwrap_or(DEFAULT_LAYER_COLOR),
                if layer.line_type_name.is_empty() {
                    DEFAULT_LINETYPE.to_string()
                } else {
                    layer.line_type_name.clone()
                },
            ));
        }

        for entity in drawing.entities() {
            if entity.common.is_in_paper_space {
                continue;
            }
            collect_entity(&mut data, entity);
        }

        data.refresh_summary();
        data
    }
}

/// Upper-case DXF type name for an entity.
pub fn entity_type_name(specific: &EntityType) -> &'static str {
    match specific {
        EntityType::Line(_) => "LINE",
        EntityType::Circle(_) => "CIRCLE",
        EntityType::Arc(_) => "ARC",
        EntityType::Text(_) => "TEXT",
        EntityType::MText(_) => "MTEXT",
        EntityType::LwPolyline(_) => "LWPOLYLINE",
        EntityType::Polyline(_) => "POLYLINE",
        EntityType::Insert(_) => "INSERT",
        EntityType::RotatedDimension(_)
        | EntityType::RadialDimension(_)
        | EntityType::DiameterDimension(_)
        | EntityType::AngularThreePointDimension(_)
        | EntityType::OrdinateDimension(_) => "DIMENSION",
        EntityType::Spline(_) => "SPLINE",
        EntityType::Ellipse(_) => "ELLIPSE",
        EntityType::ModelPoint(_) => "POINT",
        EntityType::Solid(_) => "SOLID",
        EntityType::Face3D(_) => "3DFACE",
        EntityType::Solid3D(_) => "3DSOLID",
        EntityType::Body(_) => "BODY",
        EntityType::Region(_) => "REGION",
        EntityType::Leader(_) => "LEADER",
        EntityType::XLine(_) => "XLINE",
        EntityType::Ray(_) => "RAY",
        _ => "OTHER",
    }
}

fn dimension_base(specific: &EntityType) -> Option<&dxf::entities::DimensionBase> {
    match specific {
        EntityType::RotatedDimension(d) => Some(&d.dimension_base),
        EntityType::RadialDimension(d) => Some(&d.dimension_base),
        EntityType::DiameterDimension(d) => Some(&d.dimension_base),
        EntityType::AngularThreePointDimension(d) => Some(&d.dimension_base),
        EntityType::OrdinateDimension(d) => Some(&d.dimension_base),
        _ => None,
    }
}

fn thickness(specific: &EntityType) -> Option<f64> {
    match specific {
        EntityType::Line(l) => Some(l.thickness),
        EntityType::Circle(c) => Some(c.thickness),
        EntityType::Arc(a) => Some(a.thickness),
        EntityType::LwPolyline(p) => Some(p.thickness),
        EntityType::Polyline(p) => Some(p.thickness),
        EntityType::Text(t) => Some(t.thickness),
        _ => None,
    }
}

fn collect_entity(data: &mut DrawingData, entity: &Entity) {
    let type_name = entity_type_name(&entity.specific);
    let layer = entity.common.layer.clone();

    *data.entity_breakdown.entry(type_name.to_string()).or_insert(0) += 1;
    *data
        .entities_by_layer
        .entry(layer.clone())
        .or_default()
        .entry(type_name.to_string())
        .or_insert(0) += 1;

    if entity.common.elevation != 0.0 && entity.common.elevation.is_finite() {
        data.elevations.push(entity.common.elevation);
    }
    if thickness(&entity.specific).is_some_and(|t| t != 0.0) {
        data.extruded_entities += 1;
    }

    if let Some(base) = dimension_base(&entity.specific) {
        let measurement = Some(base.actual_measurement).filter(|m| m.is_finite() && *m != 0.0);
        data.dimensions.push(DimensionInfo {
            layer,
            measurement,
            text: base.text.clone(),
            style: base.dimension_style_name.clone(),
        });
        return;
    }

    match &entity.specific {
        EntityType::Circle(circle) => {
            data.circles
                .push(CircleInfo::new(layer, Point3::from(&circle.center), circle.radius));
        }
        EntityType::Arc(arc) => {
            data.arcs.push(ArcInfo {
                layer,
                center: Point3::from(&arc.center),
                radius: arc.radius,
                start_angle: arc.start_angle,
                end_angle: arc.end_angle,
            });
        }
        EntityType::Text(text) => {
            data.texts.push(TextInfo {
                kind: TextKind::Text,
                layer,
                text: text.value.clone(),
                height: text.text_height,
            });
        }
        EntityType::MText(mtext) => {
            data.texts.push(TextInfo {
                kind: TextKind::MText,
                layer,
                text: mtext.text.clone(),
                height: mtext.initial_text_height,
            });
        }
        EntityType::Line(line) => {
            let start = Point3::from(&line.p1);
            let end = Point3::from(&line.p2);
            data.drawing_bounds.update(start.x, start.y);
            data.drawing_bounds.update(end.x, end.y);
            data.lines.push(LineInfo::new(layer, start, end));
        }
        EntityType::LwPolyline(poly) => {
            let points: Vec<(f64, f64)> = poly.vertices.iter().map(|v| (v.x, v.y)).collect();
            data.polylines.push(PolylineInfo {
                kind: PolylineKind::LwPolyline,
                layer,
                vertex_count: points.len(),
                points,
                closed: poly.is_closed(),
            });
        }
        EntityType::Polyline(poly) => {
            let points: Vec<(f64, f64)> = poly
                .vertices()
                .map(|v| (v.location.x, v.location.y))
                .collect();
            data.polylines.push(PolylineInfo {
                kind: PolylineKind::Polyline,
                layer,
                vertex_count: points.len(),
                points,
                closed: poly.is_closed(),
            });
        }
        EntityType::Insert(insert) => {
            data.blocks.push(BlockRefInfo {
                layer,
                name: insert.name.clone(),
                position: (insert.location.x, insert.location.y),
                scale: (insert.x_scale_factor, insert.y_scale_factor),
                rotation: insert.rotation,
            });
        }
        EntityType::Spline(spline) => {
            data.splines.push(SplineInfo {
                layer,
                degree: spline.degree_of_curve,
                control_points: spline.control_points.iter().map(Point3::from).collect(),
                closed: spline.is_closed(),
            });
        }
        EntityType::Solid3D(_) => push_solid(data, SolidKind::Solid3D, layer, entity),
        EntityType::Body(_) => push_solid(data, SolidKind::Body, layer, entity),
        EntityType::Region(_) => push_solid(data, SolidKind::Region, layer, entity),
        EntityType::Face3D(_) => push_solid(data, SolidKind::Face3D, layer, entity),
        _ => {
            debug!("No detail collected for {} on layer {}", type_name, layer);
        }
    }
}

fn push_solid(data: &mut DrawingData, kind: SolidKind, layer: String, entity: &Entity) {
    data.solids.push(SolidInfo {
        kind,
        layer,
        handle: format!("{:X}", entity.common.handle.0),
    });
}
