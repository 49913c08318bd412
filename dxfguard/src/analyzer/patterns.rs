use serde::{Deserialize, Serialize};

use crate::parser::schema::DrawingData;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepeatedDimensions {
    pub found: bool,
    /// Values occurring more than once, in first-seen order.
    pub repeated_values: Vec<(f64, usize)>,
    /// Up to five most frequent values.
    pub most_common: Vec<(f64, usize)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternFlag {
    pub found: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub repeated_dimensions: RepeatedDimensions,
    pub grid_pattern: PatternFlag,
    pub symmetry: PatternFlag,
}

pub fn detect_patterns(drawing: &DrawingData) -> PatternAnalysis {
    PatternAnalysis {
        repeated_dimensions: find_repeated_dimensions(drawing),
        // Grid and symmetry need coordinate clustering; not detected.
        grid_pattern: PatternFlag::default(),
        symmetry: PatternFlag::default(),
    }
}

pub fn find_repeated_dimensions(drawing: &DrawingData) -> RepeatedDimensions {
    let measurements = drawing.positive_measurements();
    if measurements.is_empty() {
        return RepeatedDimensions::default();
    }

    let mut freq: Vec<(f64, usize)> = Vec::new();
    for m in measurements {
        match freq.iter_mut().find(|(v, _)| v.to_bits() == m.to_bits()) {
            Some((_, count)) => *count += 1,
            None => freq.push((m, 1)),
        }
    }

    let repeated_values: Vec<(f64, usize)> =
        freq.iter().copied().filter(|(_, c)| *c > 1).collect();

    // Stable sort keeps first-seen order among equal counts.
    let mut most_common = freq;
    most_common.sort_by(|a, b| b.1.cmp(&a.1));
    most_common.truncate(5);

    RepeatedDimensions {
        found: !repeated_values.is_empty(),
        repeated_values,
        most_common,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::DimensionInfo;

    fn dim(value: f64) -> DimensionInfo {
        DimensionInfo {
            layer: "DIM".to_string(),
            measurement: Some(value),
            text: String::new(),
            style: "Standard".to_string(),
        }
    }

    #[test]
    fn test_repeated_dimensions() {
        let mut data = DrawingData::default();
        data.dimensions = [10.0, 20.0, 10.0, 30.0, 20.0, 10.0]
            .into_iter()
            .map(dim)
            .collect();

        let repeated = find_repeated_dimensions(&data);
        assert!(repeated.found);
        assert_eq!(repeated.repeated_values, vec![(10.0, 3), (20.0, 2)]);
        assert_eq!(repeated.most_common[0], (10.0, 3));
        assert_eq!(repeated.most_common.len(), 3);
    }

    #[test]
    fn test_no_dimensions() {
        let patterns = detect_patterns(&DrawingData::default());
        assert!(!patterns.repeated_dimensions.found);
        assert!(!patterns.grid_pattern.found);
        assert!(!patterns.symmetry.found);
    }
}
