//! # Structural Floor Configuration
//!
//! Beam, column and storey-height settings keyed by floor label. Member
//! cross-sections are given in inches; spacing and heights in feet.
//!
//! ## Lookup rules
//!
//! - An entry whose label matches the floor's label wins.
//! - Floors from index 2 upward fall back to the `"Other Floors"` entry.
//! - Basement level N looks for `"Basement N"`, then `"Basement 1"`.
//!
//! ## JSON Example
//!
//! ```json
//! [
//!   {
//!     "floor": "Ground Floor",
//!     "beam": { "gridSpacing": 15, "width": 9, "depth": 12 },
//!     "column": { "gridSpacing": 15, "width": 9, "depth": 9, "height": 10 },
//!     "floorHeight": 10
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::expression::Env;
use crate::floors::{labels_match, Floor, OTHER_FLOORS};
use crate::units::{Feet, Inches};

/// Beam settings for one floor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BeamConfig {
    /// Centre-to-centre grid spacing (0 = use the default spacing)
    #[serde(default, alias = "gridSpacing")]
    pub grid_spacing_ft: Feet,
    /// Beam width
    #[serde(default, alias = "width")]
    pub width_in: Inches,
    /// Beam depth
    #[serde(default, alias = "depth")]
    pub depth_in: Inches,
}

/// Column settings for one floor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default, alias = "gridSpacing")]
    pub grid_spacing_ft: Feet,
    #[serde(default, alias = "width")]
    pub width_in: Inches,
    #[serde(default, alias = "depth")]
    pub depth_in: Inches,
    /// Column height (0 = use the floor height)
    #[serde(default, alias = "height")]
    pub height_ft: Feet,
}

/// Structural settings for one floor label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralFloorConfig {
    /// "Foundation", "Ground Floor", "Other Floors", "Basement 1", ...
    pub floor: String,
    #[serde(default)]
    pub beam: BeamConfig,
    #[serde(default)]
    pub column: ColumnConfig,
    #[serde(default, alias = "floorHeight")]
    pub floor_height_ft: Feet,
}

impl StructuralFloorConfig {
    /// Column height, falling back to the storey height.
    pub fn effective_column_height(&self) -> Feet {
        if self.column.height_ft.is_positive() {
            self.column.height_ft
        } else {
            self.floor_height_ft
        }
    }

    /// Bind this floor's structural values into a formula environment.
    pub fn bind(&self, env: &mut Env) {
        env.set("floor_height", self.floor_height_ft.value());
        env.set("beam_width", self.beam.width_in.value());
        env.set("beam_depth", self.beam.depth_in.value());
        env.set("beam_grid_spacing", self.beam.grid_spacing_ft.value());
        env.set("column_width", self.column.width_in.value());
        env.set("column_depth", self.column.depth_in.value());
        env.set("column_height", self.effective_column_height().value());
        env.set("column_grid_spacing", self.column.grid_spacing_ft.value());
    }
}

/// All structural floor entries of an estimate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralConfig {
    pub floors: Vec<StructuralFloorConfig>,
}

impl StructuralConfig {
    pub fn new(floors: Vec<StructuralFloorConfig>) -> Self {
        StructuralConfig { floors }
    }

    /// Entry with exactly this label (normalized comparison).
    pub fn find(&self, label: &str) -> Option<&StructuralFloorConfig> {
        self.floors.iter().find(|c| labels_match(&c.floor, label))
    }

    /// Entry for a building floor, with the "Other Floors" fallback above ground.
    pub fn for_floor(&self, floor: &Floor) -> Option<&StructuralFloorConfig> {
        self.find(&floor.label).or_else(|| {
            if floor.index >= 2 {
                self.find(OTHER_FLOORS)
            } else {
                None
            }
        })
    }

    /// Entry for basement level `level` (1-based), falling back to "Basement 1".
    pub fn for_basement(&self, level: u32) -> Option<&StructuralFloorConfig> {
        self.find(&basement_label(level))
            .or_else(|| self.find(&basement_label(1)))
    }
}

pub fn basement_label(level: u32) -> String {
    format!("Basement {}", level)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn floor_config(label: &str, height: f64) -> StructuralFloorConfig {
        StructuralFloorConfig {
            floor: label.to_string(),
            beam: BeamConfig {
                grid_spacing_ft: Feet(15.0),
                width_in: Inches(9.0),
                depth_in: Inches(12.0),
            },
            column: ColumnConfig {
                grid_spacing_ft: Feet(15.0),
                width_in: Inches(9.0),
                depth_in: Inches(12.0),
                height_ft: Feet(0.0),
            },
            floor_height_ft: Feet(height),
        }
    }

    pub(crate) fn sample_structure() -> StructuralConfig {
        StructuralConfig::new(vec![
            floor_config("Foundation", 5.0),
            floor_config("Ground Floor", 10.0),
            floor_config("Other Floors", 10.0),
            floor_config("Basement 1", 12.0),
        ])
    }

    #[test]
    fn test_explicit_and_fallback_lookup() {
        let config = sample_structure();
        assert_eq!(config.for_floor(&Floor::new(1)).unwrap().floor, "Ground Floor");
        assert_eq!(config.for_floor(&Floor::new(4)).unwrap().floor, "Other Floors");
    }

    #[test]
    fn test_ground_floor_has_no_fallback() {
        let config = StructuralConfig::new(vec![floor_config("Other Floors", 10.0)]);
        assert!(config.for_floor(&Floor::new(1)).is_none());
        assert!(config.for_floor(&Floor::new(0)).is_none());
        assert!(config.for_floor(&Floor::new(2)).is_some());
    }

    #[test]
    fn test_basement_fallback() {
        let config = sample_structure();
        assert_eq!(config.for_basement(2).unwrap().floor, "Basement 1");
        assert!(StructuralConfig::default().for_basement(1).is_none());
    }

    #[test]
    fn test_column_height_falls_back_to_floor_height() {
        let mut config = floor_config("Ground Floor", 10.0);
        assert_eq!(config.effective_column_height(), Feet(10.0));
        config.column.height_ft = Feet(11.0);
        assert_eq!(config.effective_column_height(), Feet(11.0));
    }

    #[test]
    fn test_camel_case_json() {
        let json = r#"{
            "floor": "Ground Floor",
            "beam": { "gridSpacing": 12, "width": 9, "depth": 15 },
            "column": { "gridSpacing": 12, "width": 12, "depth": 12, "height": 10 },
            "floorHeight": 10.5
        }"#;
        let config: StructuralFloorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.beam.grid_spacing_ft, Feet(12.0));
        assert_eq!(config.beam.depth_in, Inches(15.0));
        assert_eq!(config.floor_height_ft, Feet(10.5));
    }
}
