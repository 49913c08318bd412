use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyzer::insights::Priority;
use crate::analyzer::quality::Grade;
use crate::manufacturing::{round1, EstimateError, Material};
use crate::parser::schema::{DrawingData, Point3, PolylineKind};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToolParams {
    /// m/min
    pub cutting_speed: f64,
    /// mm/tooth
    pub feed_rate: f64,
    pub drilling_speed: f64,
    pub drilling_feed: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaterialParams {
    pub machinability_factor: f64,
    pub cost_factor: f64,
}

/// Feature weights for the complexity score.
const COMPLEXITY_WEIGHTS: &[(&str, f64)] = &[
    ("small_radius", 2.0),
    ("deep_pocket", 1.5),
    ("thin_wall", 1.8),
    ("tight_tolerance", 1.6),
    ("complex_contour", 1.4),
];

const MACHINE_RATE: f64 = 50000.0;
const COST_PER_TOOL: f64 = 20000.0;
const TOOL_CHANGE_MINUTES: f64 = 1.5;
const BASE_SETUP_MINUTES: f64 = 15.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<(f64, f64)>,
    pub area: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hole {
    pub center: Point3,
    pub radius: f64,
    pub diameter: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CncGeometry {
    pub total_entities: usize,
    pub contours: Vec<Contour>,
    pub holes: Vec<Hole>,
    /// `None` when the drawing has no circle or arc.
    pub min_radius: Option<f64>,
    pub total_cut_length: f64,
    pub complexity_features: Vec<String>,
}

impl CncGeometry {
    fn min_radius_below(&self, limit: f64) -> bool {
        self.min_radius.map_or(false, |r| r < limit)
    }

    fn has_feature(&self, name: &str) -> bool {
        self.complexity_features.iter().any(|f| f == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachinabilityScore {
    pub overall_score: f64,
    pub complexity_score: f64,
    pub tool_access_score: f64,
    pub tolerance_score: f64,
    pub surface_finish_score: f64,
    pub material_removal_score: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecommendation {
    pub tool_type: String,
    pub diameter: f64,
    pub material: String,
    pub coating: String,
    pub cutting_speed: f64,
    pub feed_rate: f64,
    pub depth_of_cut: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachiningTime {
    pub total_minutes: f64,
    pub cutting_time: f64,
    pub drilling_time: f64,
    pub tool_change_time: f64,
    pub setup_time: f64,
    pub efficiency_tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolpathOptimization {
    pub current_efficiency: u32,
    pub optimization_potential: u32,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachiningIssue {
    pub kind: String,
    pub severity: Priority,
    pub description: String,
    pub solution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CncCostBreakdown {
    pub labor: f64,
    pub machine: f64,
    pub tooling: f64,
    pub overhead: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CncCostFactors {
    pub machining_cost: f64,
    pub tool_cost: f64,
    pub material_factor: f64,
    pub total_estimated_cost: f64,
    pub cost_breakdown: CncCostBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CncAnalysis {
    pub material: Material,
    pub geometry: CncGeometry,
    pub machinability_score: MachinabilityScore,
    pub tool_recommendations: Vec<ToolRecommendation>,
    pub machining_time: MachiningTime,
    pub toolpath_optimization: ToolpathOptimization,
    pub potential_issues: Vec<MachiningIssue>,
    pub cost_factors: CncCostFactors,
}

/// CNC machinability analyzer for aluminum, steel, stainless steel and titanium.
pub struct CncAnalyzer {
    material: Material,
    tools: ToolParams,
    params: MaterialParams,
}

impl CncAnalyzer {
    pub fn new(material: Material) -> Result<Self, EstimateError> {
        let (tools, params) = match material {
            Material::Aluminum => (
                ToolParams {
                    cutting_speed: 300.0,
                    feed_rate: 0.15,
                    drilling_speed: 100.0,
                    drilling_feed: 0.1,
                },
                MaterialParams {
                    machinability_factor: 1.0,
                    cost_factor: 1.0,
                },
            ),
            Material::Steel => (
                ToolParams {
                    cutting_speed: 150.0,
                    feed_rate: 0.1,
                    drilling_speed: 50.0,
                    drilling_feed: 0.08,
                },
                MaterialParams {
                    machinability_factor: 1.5,
                    cost_factor: 1.3,
                },
            ),
            Material::StainlessSteel => (
                ToolParams {
                    cutting_speed: 80.0,
                    feed_rate: 0.08,
                    drilling_speed: 30.0,
                    drilling_feed: 0.06,
                },
                MaterialParams {
                    machinability_factor: 2.0,
                    cost_factor: 1.6,
                },
            ),
            Material::Titanium => (
                ToolParams {
                    cutting_speed: 50.0,
                    feed_rate: 0.05,
                    drilling_speed: 20.0,
                    drilling_feed: 0.04,
                },
                MaterialParams {
                    machinability_factor: 3.0,
                    cost_factor: 2.5,
                },
            ),
            Material::Plastic => {
                return Err(EstimateError::UnsupportedCncMaterial(
                    material.as_str().to_string(),
                ))
            }
        };
        Ok(Self {
            material,
            tools,
            params,
        })
    }

    /// Parse the material name and build an analyzer.
    pub fn for_material(name: &str) -> Result<Self, EstimateError> {
        Self::new(name.parse()?)
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn analyze(&self, drawing: &DrawingData) -> CncAnalysis {
        let geometry = analyze_geometry(drawing);
        let machinability_score = self.machinability_score(&geometry);
        let tool_recommendations = self.recommend_tools(&geometry);
        let machining_time = self.machining_time(&geometry, &tool_recommendations);
        let toolpath_optimization = toolpath_optimization(&geometry);
        let potential_issues = self.machining_issues(&geometry);
        let cost_factors = self.cost_factors(&machining_time, &tool_recommendations);

        info!(
            "CNC analysis ({}): score {:.1}, {} tools, {:.1} min",
            self.material,
            machinability_score.overall_score,
            tool_recommendations.len(),
            machining_time.total_minutes
        );

        CncAnalysis {
            material: self.material,
            geometry,
            machinability_score,
            tool_recommendations,
            machining_time,
            toolpath_optimization,
            potential_issues,
            cost_factors,
        }
    }

    fn machinability_score(&self, geometry: &CncGeometry) -> MachinabilityScore {
        let mut complexity_score: f64 = 100.0;
        for feature in &geometry.complexity_features {
            if let Some((_, w)) = COMPLEXITY_WEIGHTS.iter().find(|(name, _)| name == feature) {
                complexity_score -= w * 5.0;
            }
        }
        let complexity_score = complexity_score.max(0.0);

        let tool_access_score = if geometry.min_radius_below(1.0) {
            70.0
        } else if geometry.min_radius_below(3.0) {
            85.0
        } else {
            100.0
        };

        let tolerance_score = 85.0;
        let surface_finish_score = 90.0;
        let material_removal_score = match self.material {
            Material::Titanium | Material::StainlessSteel => 80.0,
            _ => 100.0,
        };

        let overall_score = complexity_score * 0.25
            + tool_access_score * 0.25
            + tolerance_score * 0.20
            + surface_finish_score * 0.15
            + material_removal_score * 0.15;

        MachinabilityScore {
            overall_score,
            complexity_score,
            tool_access_score,
            tolerance_score,
            surface_finish_score,
            material_removal_score,
            grade: Grade::from_score(overall_score),
        }
    }

    fn recommend_tools(&self, geometry: &CncGeometry) -> Vec<ToolRecommendation> {
        let mut tools = Vec::new();

        if !geometry.contours.is_empty() {
            tools.push(ToolRecommendation {
                tool_type: "End Mill".to_string(),
                diameter: 6.0,
                material: "Carbide".to_string(),
                coating: "TiAlN".to_string(),
                cutting_speed: self.tools.cutting_speed,
                feed_rate: self.tools.feed_rate,
                depth_of_cut: 2.0,
                reason: "Contour and pocket machining".to_string(),
            });
        }

        let mut diameters: Vec<f64> = geometry.holes.iter().map(|h| h.diameter).collect();
        diameters.sort_by(|a, b| a.total_cmp(b));
        diameters.dedup();
        for diameter in diameters.into_iter().take(3) {
            tools.push(ToolRecommendation {
                tool_type: "Drill".to_string(),
                diameter,
                material: "HSS-Co".to_string(),
                coating: "TiN".to_string(),
                cutting_speed: self.tools.drilling_speed,
                feed_rate: self.tools.drilling_feed,
                depth_of_cut: diameter * 0.5,
                reason: format!("Drilling {}mm holes", diameter),
            });
        }

        if let Some(r) = geometry.min_radius.filter(|r| *r < 3.0) {
            tools.push(ToolRecommendation {
                tool_type: "Ball End Mill".to_string(),
                diameter: r * 1.5,
                material: "Carbide".to_string(),
                coating: "DLC".to_string(),
                cutting_speed: self.tools.cutting_speed * 0.8,
                feed_rate: self.tools.feed_rate * 0.6,
                depth_of_cut: r * 0.3,
                reason: "Small radius corners".to_string(),
            });
        }

        tools
    }

    fn machining_time(&self, geometry: &CncGeometry, tools: &[ToolRecommendation]) -> MachiningTime {
        let factor = self.params.machinability_factor;

        let cutting_time = if tools.is_empty() {
            0.0
        } else {
            let avg_feed = tools.iter().map(|t| t.feed_rate).sum::<f64>() / tools.len() as f64;
            geometry.total_cut_length / avg_feed * factor
        };
        let tool_change_time = tools.len() as f64 * TOOL_CHANGE_MINUTES;
        let mut setup_time = BASE_SETUP_MINUTES;
        if geometry.has_feature("complex_contour") {
            setup_time += 10.0;
        }
        let drilling_time = geometry.holes.len() as f64 * 0.5 * factor;
        let total = cutting_time + tool_change_time + setup_time + drilling_time;

        let mut efficiency_tips = Vec::new();
        if geometry.holes.len() > 20 {
            efficiency_tips.push("Optimize the drilling order with a TSP algorithm".to_string());
        }
        if geometry.total_cut_length > 500.0 {
            efficiency_tips.push("Consider a high-speed machining (HSM) strategy".to_string());
        }
        if tools.len() > 5 {
            efficiency_tips.push("Use an automatic tool changer (ATC)".to_string());
        }

        MachiningTime {
            total_minutes: round1(total),
            cutting_time: round1(cutting_time),
            drilling_time: round1(drilling_time),
            tool_change_time: round1(tool_change_time),
            setup_time: round1(setup_time),
            efficiency_tips,
        }
    }

    fn machining_issues(&self, geometry: &CncGeometry) -> Vec<MachiningIssue> {
        let mut issues = Vec::new();

        if let Some(r) = geometry.min_radius.filter(|r| *r < 0.5) {
            issues.push(MachiningIssue {
                kind: "small_radius".to_string(),
                severity: Priority::High,
                description: format!("Minimum radius {}mm requires special tooling", r),
                solution: "Consider wire EDM or micro end mills".to_string(),
            });
        }

        if self.material == Material::StainlessSteel {
            issues.push(MachiningIssue {
                kind: "material_hardness".to_string(),
                severity: Priority::Low,
                description: "Stainless steel increases tool wear".to_string(),
                solution: "Use coated tools and keep cutting conditions moderate".to_string(),
            });
        }

        issues
    }

    fn cost_factors(&self, time: &MachiningTime, tools: &[ToolRecommendation]) -> CncCostFactors {
        let machining_cost = time.total_minutes / 60.0 * MACHINE_RATE;
        let tool_cost = tools.len() as f64 * COST_PER_TOOL;
        let material_factor = self.params.cost_factor;

        CncCostFactors {
            machining_cost: machining_cost.round_ties_even(),
            tool_cost: tool_cost.round_ties_even(),
            material_factor,
            total_estimated_cost: ((machining_cost + tool_cost) * material_factor).round_ties_even(),
            cost_breakdown: CncCostBreakdown {
                labor: (machining_cost * 0.4).round_ties_even(),
                machine: (machining_cost * 0.6).round_ties_even(),
                tooling: tool_cost.round_ties_even(),
                overhead: (machining_cost * 0.2).round_ties_even(),
            },
        }
    }
}

pub fn analyze_geometry(drawing: &DrawingData) -> CncGeometry {
    let holes: Vec<Hole> = drawing
        .circles
        .iter()
        .map(|c| Hole {
            center: c.center,
            radius: c.radius,
            diameter: c.diameter,
        })
        .collect();

    let min_radius = drawing
        .circles
        .iter()
        .map(|c| c.radius)
        .chain(drawing.arcs.iter().map(|a| a.radius))
        .reduce(f64::min);

    let mut total_cut_length: f64 = drawing.arcs.iter().map(|a| a.length()).sum();
    total_cut_length += drawing
        .lines
        .iter()
        .map(|l| l.start.distance_3d(&l.end))
        .sum::<f64>();

    let mut contours = Vec::new();
    for poly in drawing
        .polylines
        .iter()
        .filter(|p| p.kind == PolylineKind::LwPolyline && p.points.len() > 2)
    {
        if poly.closed {
            contours.push(Contour {
                points: poly.points.clone(),
                area: poly.area(),
            });
        }
        total_cut_length += poly.open_length();
    }

    let mut complexity_features = Vec::new();
    if min_radius.map_or(false, |r| r < 1.0) {
        complexity_features.push("small_radius_corners".to_string());
    }
    if holes.len() > 20 {
        complexity_features.push("many_holes".to_string());
    }
    if total_cut_length > 1000.0 {
        complexity_features.push("long_cutting_path".to_string());
    }

    CncGeometry {
        total_entities: drawing.summary_info.total_entities,
        contours,
        holes,
        min_radius,
        total_cut_length,
        complexity_features,
    }
}

fn toolpath_optimization(geometry: &CncGeometry) -> ToolpathOptimization {
    let mut opt = ToolpathOptimization {
        current_efficiency: 0,
        optimization_potential: 0,
        recommendations: Vec::new(),
    };
    if geometry.total_cut_length <= 0.0 {
        return opt;
    }

    opt.current_efficiency = 75;
    if geometry.holes.len() > 10 {
        opt.optimization_potential = 20;
        opt.recommendations
            .push("Optimizing the drilling order can cut travel time by 20%".to_string());
    }
    if geometry.has_feature("many_holes") {
        opt.recommendations
            .push("Use a pecking drill cycle".to_string());
    }
    if !geometry.contours.is_empty() {
        opt.recommendations
            .push("Adaptive clearing extends tool life".to_string());
    }
    opt
}
