use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Everything collected from one pass over a DXF file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawingData {
    pub file_info: FileInfo,
    pub summary_info: SummaryInfo,
    pub layers: Vec<LayerInfo>,
    pub dimensions: Vec<DimensionInfo>,
    pub circles: Vec<CircleInfo>,
    pub arcs: Vec<ArcInfo>,
    pub texts: Vec<TextInfo>,
    pub lines: Vec<LineInfo>,
    pub polylines: Vec<PolylineInfo>,
    pub blocks: Vec<BlockRefInfo>,
    pub splines: Vec<SplineInfo>,
    pub solids: Vec<SolidInfo>,
    /// Non-zero entity elevations seen while iterating.
    #[serde(default)]
    pub elevations: Vec<f64>,
    /// 2D entities extruded through a non-zero thickness.
    #[serde(default)]
    pub extruded_entities: usize,
    pub entities_by_layer: BTreeMap<String, BTreeMap<String, usize>>,
    pub entity_breakdown: BTreeMap<String, usize>,
    pub drawing_bounds: DrawingBounds,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub size: u64,
    pub modified_time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryInfo {
    pub total_entities: usize,
    pub layer_count: usize,
    pub dimension_count: usize,
    pub circle_count: usize,
    pub arc_count: usize,
    pub text_count: usize,
    pub line_count: usize,
    pub polyline_count: usize,
    pub block_count: usize,
    pub entity_breakdown: BTreeMap<String, usize>,
    pub drawing_size: Option<DrawingSize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_2d(&self, other: &Point3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn distance_3d(&self, other: &Point3) -> f64 {
        let dz = other.z - self.z;
        (self.distance_2d(other).powi(2) + dz * dz).sqrt()
    }
}

impl From<&dxf::Point> for Point3 {
    fn from(p: &dxf::Point) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerInfo {
    pub name: String,
    /// AutoCAD colour index.
    pub color: i16,
    pub linetype: String,
}

impl LayerInfo {
    pub fn new(name: impl Into<String>, color: i16, linetype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color,
            linetype: linetype.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionInfo {
    pub layer: String,
    pub measurement: Option<f64>,
    pub text: String,
    pub style: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleInfo {
    pub layer: String,
    pub center: Point3,
    pub radius: f64,
    pub diameter: f64,
}

impl CircleInfo {
    pub fn new(layer: impl Into<String>, center: Point3, radius: f64) -> Self {
        Self {
            layer: layer.into(),
            center,
            radius,
            diameter: radius * 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcInfo {
    pub layer: String,
    pub center: Point3,
    pub radius: f64,
    /// Degrees, as stored in the file.
    pub start_angle: f64,
    pub end_angle: f64,
}

impl ArcInfo {
    /// Length of the arc using the absolute sweep between the stored angles.
    pub fn length(&self) -> f64 {
        self.radius * (self.end_angle - self.start_angle).abs().to_radians()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TextKind {
    Text,
    MText,
}

impl TextKind {
    pub fn dxf_name(&self) -> &'static str {
        match self {
            TextKind::Text => "TEXT",
            TextKind::MText => "MTEXT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInfo {
    pub kind: TextKind,
    pub layer: String,
    pub text: String,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineInfo {
    pub layer: String,
    pub start: Point3,
    pub end: Point3,
    /// Planar (XY) length.
    pub length: f64,
}

impl LineInfo {
    pub fn new(layer: impl Into<String>, start: Point3, end: Point3) -> Self {
        Self {
            layer: layer.into(),
            start,
            end,
            length: start.distance_2d(&end),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolylineKind {
    LwPolyline,
    Polyline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolylineInfo {
    pub kind: PolylineKind,
    pub layer: String,
    pub points: Vec<(f64, f64)>,
    pub closed: bool,
    pub vertex_count: usize,
}

impl PolylineInfo {
    /// Sum of the segment lengths between consecutive points, without the closing segment.
    pub fn open_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt())
            .sum()
    }

    /// Shoelace area of the point ring.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].0 * self.points[j].1;
            area -= self.points[j].0 * self.points[i].1;
        }
        area.abs() / 2.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRefInfo {
    pub layer: String,
    pub name: String,
    pub position: (f64, f64),
    pub scale: (f64, f64),
    pub rotation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplineInfo {
    pub layer: String,
    pub degree: i32,
    pub control_points: Vec<Point3>,
    pub closed: bool,
}

impl SplineInfo {
    pub fn is_3d(&self) -> bool {
        self.control_points.iter().any(|p| p.z != 0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SolidKind {
    Solid3D,
    Body,
    Region,
    Face3D,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidInfo {
    pub kind: SolidKind,
    pub layer: String,
    pub handle: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DrawingBounds {
    pub min_x: Option<f64>,
    pub min_y: Option<f64>,
    pub max_x: Option<f64>,
    pub max_y: Option<f64>,
}

impl DrawingBounds {
    pub fn update(&mut self, x: f64, y: f64) {
        if self.min_x.map_or(true, |v| x < v) {
            self.min_x = Some(x);
        }
        if self.max_x.map_or(true, |v| x > v) {
            self.max_x = Some(x);
        }
        if self.min_y.map_or(true, |v| y < v) {
            self.min_y = Some(y);
        }
        if self.max_y.map_or(true, |v| y > v) {
            self.max_y = Some(y);
        }
    }

    pub fn size(&self) -> Option<DrawingSize> {
        let (min_x, min_y, max_x, max_y) = (self.min_x?, self.min_y?, self.max_x?, self.max_y?);
        let width = max_x - min_x;
        let height = max_y - min_y;
        Some(DrawingSize {
            width,
            height,
            area: width * height,
            bounds: self.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingSize {
    pub width: f64,
    pub height: f64,
    pub area: f64,
    pub bounds: DrawingBounds,
}

impl DrawingData {
    /// Total entity count from the type breakdown.
    pub fn total_entities(&self) -> usize {
        self.entity_breakdown.values().sum()
    }

    /// Positive, finite dimension measurements in file order.
    pub fn positive_measurements(&self) -> Vec<f64> {
        self.dimensions
            .iter()
            .filter_map(|d| d.measurement)
            .filter(|m| m.is_finite() && *m > 0.0)
            .collect()
    }

    /// Positive, finite text heights in file order.
    pub fn positive_text_heights(&self) -> Vec<f64> {
        self.texts
            .iter()
            .map(|t| t.height)
            .filter(|h| h.is_finite() && *h > 0.0)
            .collect()
    }

    /// Rebuild `summary_info` from the collected vectors.
    pub fn refresh_summary(&mut self) {
        self.summary_info = SummaryInfo {
            total_entities: self.total_entities(),
            layer_count: self.layers.len(),
            dimension_count: self.dimensions.len(),
            circle_count: self.circles.len(),
            arc_count: self.arcs.len(),
            text_count: self.texts.len(),
            line_count: self.lines.len(),
            polyline_count: self.polylines.len(),
            block_count: self.blocks.len(),
            entity_breakdown: self.entity_breakdown.clone(),
            drawing_size: self.drawing_bounds.size(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_require_all_sides() {
        let mut bounds = DrawingBounds::default();
        assert!(bounds.size().is_none());

        bounds.update(0.0, 0.0);
        bounds.update(100.0, 80.0);
        let size = bounds.size().unwrap();
        assert_eq!(size.width, 100.0);
        assert_eq!(size.height, 80.0);
        assert_eq!(size.area, 8000.0);
    }

    #[test]
    fn test_polyline_area_and_length() {
        let square = PolylineInfo {
            kind: PolylineKind::LwPolyline,
            layer: "0".to_string(),
            points: vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            closed: true,
            vertex_count: 4,
        };
        assert!((square.area() - 100.0).abs() < 1e-9);
        assert!((square.open_length() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_arc_length_uses_absolute_sweep() {
        let arc = ArcInfo {
            layer: "0".to_string(),
            center: Point3::default(),
            radius: 2.0,
            start_angle: 90.0,
            end_angle: 0.0,
        };
        assert!((arc.length() - std::f64::consts::PI).abs() < 1e-9);
    }
}
