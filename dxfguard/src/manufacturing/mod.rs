//! CNC machinability and manufacturing cost heuristics.
//!
//! All prices are in KRW. The constants are fixed lookup tables, not
//! market data.

pub mod cnc;
pub mod cost;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cnc::{CncAnalysis, CncAnalyzer};
pub use cost::{CostEstimate, CostEstimator, CustomerInfo, MaterialSpec};

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),
    #[error("Material {0} is not supported for CNC analysis")]
    UnsupportedCncMaterial(String),
    #[error("Unknown grade '{grade}' for {material}")]
    UnknownGrade { material: String, grade: String },
    #[error("Unknown machine: {0}")]
    UnknownMachine(String),
    #[error("Production quantity must be at least 1")]
    InvalidQuantity,
    #[error("Thickness must be positive, got {0}")]
    InvalidThickness(f64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Aluminum,
    Steel,
    StainlessSteel,
    Titanium,
    Plastic,
}

impl Material {
    pub const ALL: [Material; 5] = [
        Material::Aluminum,
        Material::Steel,
        Material::StainlessSteel,
        Material::Titanium,
        Material::Plastic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Aluminum => "aluminum",
            Material::Steel => "steel",
            Material::StainlessSteel => "stainless_steel",
            Material::Titanium => "titanium",
            Material::Plastic => "plastic",
        }
    }

    /// g/cm³
    pub fn density(&self) -> f64 {
        match self {
            Material::Aluminum => 2.7,
            Material::Steel => 7.85,
            Material::StainlessSteel => 7.9,
            Material::Titanium => 4.5,
            Material::Plastic => 1.4,
        }
    }

    /// Grade name and price in KRW/kg.
    pub fn grades(&self) -> &'static [(&'static str, f64)] {
        match self {
            Material::Aluminum => &[("6061", 8000.0), ("7075", 12000.0), ("5052", 7500.0)],
            Material::Steel => &[
                ("mild_steel", 3000.0),
                ("carbon_steel", 4500.0),
                ("alloy_steel", 6000.0),
            ],
            Material::StainlessSteel => &[("304", 8500.0), ("316", 11000.0), ("430", 7000.0)],
            Material::Titanium => &[("grade2", 50000.0), ("grade5", 65000.0)],
            Material::Plastic => &[("pom", 5000.0), ("nylon", 4500.0), ("peek", 150000.0)],
        }
    }

    pub fn default_grade(&self) -> &'static str {
        self.grades()[0].0
    }

    pub fn price_per_kg(&self, grade: &str) -> Option<f64> {
        self.grades()
            .iter()
            .find(|(g, _)| g.eq_ignore_ascii_case(grade))
            .map(|(_, p)| *p)
    }

    /// Machining difficulty used by the cost estimator.
    pub fn machining_factor(&self) -> f64 {
        match self {
            Material::Aluminum => 1.0,
            Material::Steel => 1.5,
            Material::StainlessSteel => 2.0,
            Material::Titanium => 3.0,
            Material::Plastic => 0.8,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Material::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized || (normalized == "stainless" && *m == Material::StainlessSteel))
            .ok_or_else(|| EstimateError::UnknownMaterial(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Machine {
    #[serde(rename = "3axis_mill")]
    ThreeAxisMill,
    #[serde(rename = "5axis_mill")]
    FiveAxisMill,
    #[serde(rename = "lathe")]
    Lathe,
    #[serde(rename = "edm")]
    Edm,
    #[serde(rename = "laser")]
    Laser,
}

impl Machine {
    pub const ALL: [Machine; 5] = [
        Machine::ThreeAxisMill,
        Machine::FiveAxisMill,
        Machine::Lathe,
        Machine::Edm,
        Machine::Laser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Machine::ThreeAxisMill => "3axis_mill",
            Machine::FiveAxisMill => "5axis_mill",
            Machine::Lathe => "lathe",
            Machine::Edm => "edm",
            Machine::Laser => "laser",
        }
    }

    /// KRW per hour.
    pub fn hourly_rate(&self) -> f64 {
        match self {
            Machine::ThreeAxisMill => 50000.0,
            Machine::FiveAxisMill => 80000.0,
            Machine::Lathe => 45000.0,
            Machine::Edm => 70000.0,
            Machine::Laser => 60000.0,
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Machine {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Machine::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| EstimateError::UnknownMachine(s.to_string()))
    }
}

/// Labour rates in KRW per hour.
pub mod labor {
    pub const OPERATOR: f64 = 25000.0;
    pub const SKILLED_MACHINIST: f64 = 35000.0;
    pub const CNC_PROGRAMMER: f64 = 40000.0;
}

/// Round to one decimal place, ties to even on the exact decimal value
/// (`0.25 -> 0.2`, `0.75 -> 0.8`, `0.35 -> 0.3` since 0.35 is stored
/// just below the tie).
pub(crate) fn round1(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_parsing() {
        assert_eq!("aluminum".parse::<Material>().unwrap(), Material::Aluminum);
        assert_eq!(
            "Stainless-Steel".parse::<Material>().unwrap(),
            Material::StainlessSteel
        );
        assert!(matches!(
            "wood".parse::<Material>(),
            Err(EstimateError::UnknownMaterial(_))
        ));
    }

    #[test]
    fn test_price_lookup() {
        assert_eq!(Material::Aluminum.price_per_kg("7075"), Some(12000.0));
        assert_eq!(Material::Titanium.price_per_kg("GRADE5"), Some(65000.0));
        assert_eq!(Material::Steel.price_per_kg("6061"), None);
        assert_eq!(Material::Plastic.default_grade(), "pom");
    }

    #[test]
    fn test_round1_ties_to_even() {
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(round1(0.35), 0.3);
        assert_eq!(round1(2.45), 2.5);
        assert_eq!(round1(12.34), 12.3);
        assert_eq!(round1(-0.25), -0.2);
        assert_eq!(round1(7.0), 7.0);
    }

    #[test]
    fn test_machine_parsing() {
        assert_eq!("5axis_mill".parse::<Machine>().unwrap().hourly_rate(), 80000.0);
        assert!("plasma".parse::<Machine>().is_err());
    }
}
