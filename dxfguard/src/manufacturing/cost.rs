use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::manufacturing::{labor, EstimateError, Machine, Material};
use crate::parser::schema::DrawingData;
use crate::report::format::thousands;

const STOCK_MARGIN_MM: f64 = 5.0;
const DEFAULT_HOLE_DEPTH: f64 = 10.0;
const DEFAULT_PART_HEIGHT: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub material_type: Material,
    pub grade: String,
    /// mm
    pub thickness: f64,
    pub machine: Machine,
}

impl Default for MaterialSpec {
    fn default() -> Self {
        Self {
            material_type: Material::Aluminum,
            grade: "6061".to_string(),
            thickness: 10.0,
            machine: Machine::ThreeAxisMill,
        }
    }
}

impl MaterialSpec {
    /// Build a spec from user input. A missing grade selects the material's first grade.
    pub fn parse(
        material: &str,
        grade: Option<&str>,
        thickness: f64,
        machine: &str,
    ) -> Result<Self, EstimateError> {
        let material_type: Material = material.parse()?;
        let grade = grade.unwrap_or_else(|| material_type.default_grade());
        let spec = Self {
            material_type,
            grade: grade.to_string(),
            thickness,
            machine: machine.parse()?,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), EstimateError> {
        if self.material_type.price_per_kg(&self.grade).is_none() {
            return Err(EstimateError::UnknownGrade {
                material: self.material_type.to_string(),
                grade: self.grade.clone(),
            });
        }
        if !(self.thickness.is_finite() && self.thickness > 0.0) {
            return Err(EstimateError::InvalidThickness(self.thickness));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        self.length * self.width
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoleSpec {
    pub diameter: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostGeometry {
    pub bounding_box: BoundingBox,
    pub holes: Vec<HoleSpec>,
    pub total_cut_length: f64,
    /// 1 to 10.
    pub complexity_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialCost {
    pub material_type: String,
    /// Length, width, height in mm.
    pub raw_stock_size: (f64, f64, f64),
    /// cm³
    pub volume_used: f64,
    pub volume_waste: f64,
    /// KRW/kg
    pub unit_price: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachiningCost {
    /// Setup minutes per unit.
    pub setup_time: f64,
    pub cutting_time: f64,
    pub drilling_time: f64,
    pub tool_change_time: f64,
    pub machine_rate: f64,
    pub labor_rate: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolItem {
    pub name: String,
    pub unit_cost: f64,
    pub life_parts: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolingCost {
    pub tools_required: Vec<ToolItem>,
    pub tool_wear_cost: f64,
    pub consumables_cost: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalCosts {
    pub quality_control: f64,
    pub overhead: f64,
    pub profit_margin: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostShare {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    pub production_quantity: u32,
    pub material_spec: MaterialSpec,
    pub geometry: CostGeometry,
    pub material_cost: MaterialCost,
    pub machining_cost: MachiningCost,
    pub tooling_cost: ToolingCost,
    pub additional_costs: AdditionalCosts,
    pub unit_cost: f64,
    /// Percent.
    pub quantity_discount: f64,
    pub total_production_cost: f64,
    pub unit_price_after_discount: f64,
    pub cost_breakdown: Vec<CostShare>,
    pub cost_reduction_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub company: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub product_name: Option<String>,
}

/// Manufacturing cost estimator.
pub struct CostEstimator;

impl CostEstimator {
    pub fn estimate(
        drawing: &DrawingData,
        spec: &MaterialSpec,
        quantity: u32,
    ) -> Result<CostEstimate, EstimateError> {
        if quantity == 0 {
            return Err(EstimateError::InvalidQuantity);
        }
        spec.validate()?;

        let geometry = analyze_geometry(drawing);
        let material_cost = material_cost(&geometry, spec, quantity);
        let machining_cost = machining_cost(&geometry, spec, quantity);
        let tooling_cost = tooling_cost(&geometry);
        let additional_costs = additional_costs(&material_cost, &machining_cost, &tooling_cost);
        let discount = quantity_discount(quantity);

        let unit_cost = material_cost.total_cost
            + machining_cost.total_cost
            + tooling_cost.total_cost
            + additional_costs.total;
        let total_production_cost = unit_cost * quantity as f64 * (1.0 - discount);

        let cost_breakdown =
            cost_breakdown(&material_cost, &machining_cost, &tooling_cost, &additional_costs);
        let cost_reduction_suggestions = cost_reduction_suggestions(&geometry, spec, quantity);

        info!(
            "Cost estimate: {} x {} {}, unit {:.0} KRW",
            quantity, spec.material_type, spec.grade, unit_cost
        );

        Ok(CostEstimate {
            production_quantity: quantity,
            material_spec: spec.clone(),
            geometry,
            material_cost,
            machining_cost,
            tooling_cost,
            additional_costs,
            unit_cost,
            quantity_discount: discount * 100.0,
            total_production_cost,
            unit_price_after_discount: total_production_cost / quantity as f64,
            cost_breakdown,
            cost_reduction_suggestions,
        })
    }

    /// Plain-text quotation for an estimate.
    pub fn quotation(estimate: &CostEstimate, customer: &CustomerInfo) -> String {
        let now = Local::now();
        let unspecified = "N/A".to_string();
        let additional = &estimate.additional_costs;

        format!(
            "\n=====================================\n\
             \x20          MANUFACTURING QUOTATION\n\
             =====================================\n\n\
             Quotation No.: Q{}\n\
             Date: {}\n\n\
             [ Customer ]\n\
             Company: {}\n\
             Contact: {}\n\
             Phone: {}\n\n\
             [ Product ]\n\
             Product: {}\n\
             Quantity: {} pcs\n\
             Material: {}\n\n\
             [ Breakdown ]\n\
             1. Material: {} KRW\n\
             2. Machining: {} KRW\n\
             3. Tooling: {} KRW\n\
             4. Quality control: {} KRW\n\
             5. Overhead: {} KRW\n\
             ─────────────────────────────────\n\
             Subtotal: {} KRW\n\
             Profit: {} KRW\n\
             ─────────────────────────────────\n\
             Unit price: {} KRW\n\n\
             [ Quantity discount ]\n\
             Discount: {:.1}%\n\
             Unit price after discount: {} KRW\n\n\
             [ Total ]\n\
             {} KRW\n\
             (VAT excluded)\n\n\
             [ Delivery ]\n\
             Estimated delivery: {} days after order\n\n\
             [ Notes ]\n\
             - This quotation is valid for 30 days\n\
             - Design changes may change the quotation\n\
             - Shipping is charged separately\n\n\
             =====================================\n",
            now.format("%Y%m%d%H%M"),
            now.format("%Y-%m-%d"),
            customer.company.as_ref().unwrap_or(&unspecified),
            customer.contact.as_ref().unwrap_or(&unspecified),
            customer.phone.as_ref().unwrap_or(&unspecified),
            customer
                .product_name
                .clone()
                .unwrap_or_else(|| "DXF machined part".to_string()),
            estimate.production_quantity,
            estimate.material_cost.material_type,
            thousands(estimate.material_cost.total_cost),
            thousands(estimate.machining_cost.total_cost),
            thousands(estimate.tooling_cost.total_cost),
            thousands(additional.quality_control),
            thousands(additional.overhead),
            thousands(estimate.unit_cost - additional.profit_margin),
            thousands(additional.profit_margin),
            thousands(estimate.unit_cost),
            estimate.quantity_discount,
            thousands(estimate.unit_price_after_discount),
            thousands(estimate.total_production_cost),
            delivery_days(estimate.production_quantity),
        )
    }
}

pub fn delivery_days(quantity: u32) -> u32 {
    (quantity / 10).max(5)
}

/// Discount fraction by production quantity.
pub fn quantity_discount(quantity: u32) -> f64 {
    match quantity {
        q if q >= 1000 => 0.25,
        q if q >= 500 => 0.20,
        q if q >= 100 => 0.15,
        q if q >= 50 => 0.10,
        q if q >= 10 => 0.05,
        _ => 0.0,
    }
}

pub fn analyze_geometry(drawing: &DrawingData) -> CostGeometry {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut total_cut_length = 0.0;
    let mut holes = Vec::new();

    for line in &drawing.lines {
        for p in [&line.start, &line.end] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        total_cut_length += line.start.distance_3d(&line.end);
    }

    for circle in &drawing.circles {
        min_x = min_x.min(circle.center.x - circle.radius);
        max_x = max_x.max(circle.center.x + circle.radius);
        min_y = min_y.min(circle.center.y - circle.radius);
        max_y = max_y.max(circle.center.y + circle.radius);
        holes.push(HoleSpec {
            diameter: circle.radius * 2.0,
            depth: DEFAULT_HOLE_DEPTH,
        });
        total_cut_length += 2.0 * std::f64::consts::PI * circle.radius;
    }

    let (length, width) = if min_x.is_finite() && max_x.is_finite() {
        (max_x - min_x, max_y - min_y)
    } else {
        (0.0, 0.0)
    };

    let bounding_box = BoundingBox {
        length,
        width,
        height: DEFAULT_PART_HEIGHT,
    };

    let mut complexity_score: f64 = 1.0;
    if holes.len() > 20 {
        complexity_score += 2.0;
    } else if holes.len() > 10 {
        complexity_score += 1.0;
    }
    if total_cut_length > 1000.0 {
        complexity_score += 2.0;
    } else if total_cut_length > 500.0 {
        complexity_score += 1.0;
    }
    if bounding_box.area() > 10_000.0 {
        complexity_score += 1.0;
    }

    CostGeometry {
        bounding_box,
        holes,
        total_cut_length,
        complexity_score: complexity_score.min(10.0),
    }
}

fn material_cost(geometry: &CostGeometry, spec: &MaterialSpec, quantity: u32) -> MaterialCost {
    let raw_length = geometry.bounding_box.length + 2.0 * STOCK_MARGIN_MM;
    let raw_width = geometry.bounding_box.width + 2.0 * STOCK_MARGIN_MM;
    let raw_height = spec.thickness;

    let raw_volume = raw_length * raw_width * raw_height / 1000.0;
    // Assumes 30% of the stock is removed.
    let volume_used = raw_volume * 0.7;
    let raw_weight = raw_volume * spec.material_type.density() / 1000.0;

    let unit_price = spec
        .material_type
        .price_per_kg(&spec.grade)
        .unwrap_or_else(|| spec.material_type.grades()[0].1);
    let mut total_cost = raw_weight * unit_price;
    if quantity > 100 {
        total_cost *= 0.9;
    } else if quantity > 50 {
        total_cost *= 0.95;
    }

    MaterialCost {
        material_type: format!("{} {}", spec.material_type, spec.grade),
        raw_stock_size: (raw_length, raw_width, raw_height),
        volume_used,
        volume_waste: raw_volume - volume_used,
        unit_price,
        total_cost,
    }
}

fn machining_cost(geometry: &CostGeometry, spec: &MaterialSpec, quantity: u32) -> MachiningCost {
    let factor = spec.material_type.machining_factor();

    let mut setup = 30.0;
    if geometry.complexity_score > 7.0 {
        setup += 20.0;
    } else if geometry.complexity_score > 5.0 {
        setup += 10.0;
    }

    let cutting_speed = 300.0 / factor;
    let cutting_time = geometry.total_cut_length / cutting_speed * 1.5;
    let drilling_time = geometry.holes.len() as f64 * 2.0 * factor;
    let tool_changes = (geometry.holes.len() / 10 + 2).max(3);
    let tool_change_time = tool_changes as f64 * 2.0;

    let total_minutes = setup + cutting_time + drilling_time + tool_change_time;
    let machine_rate = spec.machine.hourly_rate();
    let labor_rate = labor::SKILLED_MACHINIST;

    MachiningCost {
        setup_time: setup / quantity.max(1) as f64,
        cutting_time,
        drilling_time,
        tool_change_time,
        machine_rate,
        labor_rate,
        total_cost: total_minutes / 60.0 * (machine_rate + labor_rate),
    }
}

fn tooling_cost(geometry: &CostGeometry) -> ToolingCost {
    let mut tools = vec![ToolItem {
        name: "End Mill 6mm".to_string(),
        unit_cost: 50000.0,
        life_parts: 500.0,
        quantity: 2,
    }];

    let mut diameters: Vec<u64> = geometry.holes.iter().map(|h| h.diameter.to_bits()).collect();
    diameters.sort_unstable();
    diameters.dedup();
    for i in 0..diameters.len().min(5) {
        tools.push(ToolItem {
            name: format!("Drill Bit {}", i + 1),
            unit_cost: 20000.0,
            life_parts: 200.0,
            quantity: 1,
        });
    }

    let tool_wear_cost: f64 = tools
        .iter()
        .map(|t| t.unit_cost / t.life_parts * t.quantity as f64)
        .sum();
    let consumables_cost = geometry.total_cut_length * 0.5;

    ToolingCost {
        tools_required: tools,
        tool_wear_cost,
        consumables_cost,
        total_cost: tool_wear_cost + consumables_cost,
    }
}

fn additional_costs(
    material: &MaterialCost,
    machining: &MachiningCost,
    tooling: &ToolingCost,
) -> AdditionalCosts {
    let subtotal = material.total_cost + machining.total_cost + tooling.total_cost;
    let quality_control = subtotal * 0.05;
    let overhead = subtotal * 0.15;
    let profit_margin = subtotal * 0.20;
    AdditionalCosts {
        quality_control,
        overhead,
        profit_margin,
        total: quality_control + overhead + profit_margin,
    }
}

fn cost_breakdown(
    material: &MaterialCost,
    machining: &MachiningCost,
    tooling: &ToolingCost,
    additional: &AdditionalCosts,
) -> Vec<CostShare> {
    let total = material.total_cost + machining.total_cost + tooling.total_cost + additional.total;
    [
        ("material", material.total_cost),
        ("machining", machining.total_cost),
        ("tooling", tooling.total_cost),
        ("quality_control", additional.quality_control),
        ("overhead", additional.overhead),
        ("profit", additional.profit_margin),
    ]
    .into_iter()
    .map(|(category, amount)| CostShare {
        category: category.to_string(),
        amount,
        percentage: if total > 0.0 { amount / total * 100.0 } else { 0.0 },
    })
    .collect()
}

fn cost_reduction_suggestions(
    geometry: &CostGeometry,
    spec: &MaterialSpec,
    quantity: u32,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if quantity < 10 {
        suggestions.push("Ordering 10 or more pieces lowers the unit price by 5%".to_string());
    } else if quantity < 50 {
        suggestions
            .push("Ordering 50 or more pieces lowers the unit price by another 5%".to_string());
    }

    match spec.material_type {
        Material::StainlessSteel => suggestions.push(
            "Switching to regular steel with surface treatment can save about 30%".to_string(),
        ),
        Material::Titanium => suggestions
            .push("Replacing titanium with an aluminum alloy can save about 60%".to_string()),
        _ => {}
    }

    if geometry.holes.len() > 20 {
        suggestions.push(
            "Fewer holes or standardized hole sizes can cut machining cost by 20%".to_string(),
        );
    }
    if geometry.complexity_score > 7.0 {
        suggestions.push("Simplifying the design can shorten machining time by 30%".to_string());
    }
    if geometry.bounding_box.area() < 100.0 {
        suggestions.push("Laser cutting lowers cost for small batches".to_string());
    }

    suggestions
}
