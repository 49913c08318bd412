//! 3D content detection. No volumes are computed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::schema::{DrawingData, SolidKind};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ZRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ZRange {
    pub fn update(&mut self, z: f64) {
        if self.min.map_or(true, |v| z < v) {
            self.min = Some(z);
        }
        if self.max.map_or(true, |v| z > v) {
            self.max = Some(z);
        }
    }

    pub fn span(&self) -> Option<f64> {
        Some((self.max? - self.min?).abs())
    }

    pub fn is_degenerate(&self) -> bool {
        self.span().map_or(true, |s| s == 0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ThreeDComplexity {
    TwoD,
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

impl ThreeDComplexity {
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => ThreeDComplexity::TwoD,
            1..=9 => ThreeDComplexity::Simple,
            10..=49 => ThreeDComplexity::Moderate,
            50..=99 => ThreeDComplexity::Complex,
            _ => ThreeDComplexity::VeryComplex,
        }
    }
}

impl fmt::Display for ThreeDComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreeDComplexity::TwoD => "2D drawing",
            ThreeDComplexity::Simple => "simple 3D",
            ThreeDComplexity::Moderate => "moderate 3D",
            ThreeDComplexity::Complex => "complex 3D",
            ThreeDComplexity::VeryComplex => "very complex 3D",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreeDAnalysis {
    pub is_3d: bool,
    pub entity_count_3d: usize,
    pub solid_count: usize,
    pub body_count: usize,
    pub region_count: usize,
    pub face_count: usize,
    pub spline_count: usize,
    pub spline_3d_count: usize,
    /// 2D entities with a non-zero thickness.
    pub extruded_count: usize,
    pub solid_layers: Vec<String>,
    pub z_range: ZRange,
    pub z_span: Option<f64>,
    pub complexity_score: u32,
    pub complexity: ThreeDComplexity,
    pub breakdown: BTreeMap<String, usize>,
}

pub fn analyze_3d(drawing: &DrawingData) -> ThreeDAnalysis {
    let count = |kind: SolidKind| drawing.solids.iter().filter(|s| s.kind == kind).count();
    let solid_count = count(SolidKind::Solid3D);
    let body_count = count(SolidKind::Body);
    let region_count = count(SolidKind::Region);
    let face_count = count(SolidKind::Face3D);
    let spline_3d_count = drawing.splines.iter().filter(|s| s.is_3d()).count();

    let mut z_range = ZRange::default();
    let mut nonzero_z = false;
    let mut track = |z: f64| {
        if z != 0.0 && z.is_finite() {
            z_range.update(z);
            nonzero_z = true;
        }
    };
    for line in &drawing.lines {
        track(line.start.z);
        track(line.end.z);
    }
    for circle in &drawing.circles {
        track(circle.center.z);
    }
    for spline in &drawing.splines {
        for p in &spline.control_points {
            track(p.z);
        }
    }
    for e in &drawing.elevations {
        track(*e);
    }

    let is_3d = !drawing.solids.is_empty()
        || spline_3d_count > 0
        || drawing.extruded_entities > 0
        || !z_range.is_degenerate()
        || nonzero_z;

    let complexity_score = (solid_count * 10
        + (region_count + body_count) * 8
        + face_count * 6
        + spline_3d_count * 4) as u32;

    let mut solid_layers: Vec<String> = drawing
        .solids
        .iter()
        .filter(|s| s.kind == SolidKind::Solid3D)
        .map(|s| s.layer.clone())
        .collect();
    solid_layers.sort();
    solid_layers.dedup();

    let mut breakdown = BTreeMap::new();
    for (name, n) in [
        ("3DSOLID", solid_count),
        ("BODY", body_count),
        ("REGION", region_count),
        ("3DFACE", face_count),
        ("SPLINE", drawing.splines.len()),
    ] {
        if n > 0 {
            breakdown.insert(name.to_string(), n);
        }
    }

    ThreeDAnalysis {
        is_3d,
        entity_count_3d: drawing.solids.len(),
        solid_count,
        body_count,
        region_count,
        face_count,
        spline_count: drawing.splines.len(),
        spline_3d_count,
        extruded_count: drawing.extruded_entities,
        solid_layers,
        z_range,
        z_span: if is_3d { z_range.span() } else { None },
        complexity_score,
        complexity: ThreeDComplexity::from_score(complexity_score),
        breakdown,
    }
}
