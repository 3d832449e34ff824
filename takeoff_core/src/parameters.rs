//! # Building Parameters
//!
//! The coarse description of the building a takeoff is run for. All plan
//! dimensions are in feet, all areas in square feet.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "width_ft": 40.0,
//!   "depth_ft": 60.0,
//!   "floors": 3,
//!   "construction_perimeter_ft": 200.0,
//!   "carpet_percent": 80.0,
//!   "buildup_percent": 90.0,
//!   "carpet_area_sqft": 1728.0,
//!   "lift": true,
//!   "basements": 1
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{TakeoffError, TakeoffResult};
use crate::expression::Env;
use crate::floors::{building_floors, Floor};

/// Immutable building inputs for one calculation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingParameters {
    /// Plot/footprint width in feet
    #[serde(alias = "width")]
    pub width_ft: f64,

    /// Plot/footprint depth in feet
    #[serde(alias = "depth")]
    pub depth_ft: f64,

    /// Storeys above the foundation, ground floor included
    #[serde(alias = "floorCount")]
    pub floors: u32,

    /// Construction perimeter in feet
    #[serde(alias = "perimeter", alias = "constructionPerimeter")]
    pub construction_perimeter_ft: f64,

    /// Carpet area as a percentage of the footprint
    #[serde(default, alias = "carpetPercent")]
    pub carpet_percent: f64,

    /// Built-up area as a percentage of the footprint
    #[serde(default, alias = "buildupPercent")]
    pub buildup_percent: f64,

    /// Carpet (usable) area in square feet
    #[serde(default, alias = "carpetArea")]
    pub carpet_area_sqft: f64,

    /// Whether the building has a lift
    #[serde(default)]
    pub lift: bool,

    /// Number of basement levels
    #[serde(default, alias = "basementCount")]
    pub basements: u32,
}

impl BuildingParameters {
    /// Validate input parameters.
    pub fn validate(&self) -> TakeoffResult<()> {
        for (field, value) in [
            ("width_ft", self.width_ft),
            ("depth_ft", self.depth_ft),
            ("construction_perimeter_ft", self.construction_perimeter_ft),
            ("carpet_percent", self.carpet_percent),
            ("buildup_percent", self.buildup_percent),
            ("carpet_area_sqft", self.carpet_area_sqft),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TakeoffError::invalid_input(
                    field,
                    value.to_string(),
                    "Must be a non-negative number",
                ));
            }
        }
        if self.floors == 0 {
            return Err(TakeoffError::invalid_input(
                "floors",
                "0",
                "A building needs at least the ground floor",
            ));
        }
        Ok(())
    }

    /// Gross footprint area width × depth
    pub fn footprint_area(&self) -> f64 {
        self.width_ft * self.depth_ft
    }

    /// Built-up area of one floor: width × depth × buildup%.
    ///
    /// A product that comes out as zero or NaN is reported as 0. This is the
    /// only fallback applied; a negative product passes through unchanged.
    pub fn buildup_area(&self) -> f64 {
        let area = self.width_ft * self.depth_ft * (self.buildup_percent / 100.0);
        if area == 0.0 || area.is_nan() {
            0.0
        } else {
            area
        }
    }

    /// Built-up area summed over every storey
    pub fn total_buildup_area(&self) -> f64 {
        self.buildup_area() * self.floors as f64
    }

    /// Index of the top floor (Foundation is 0, Ground is 1).
    pub fn last_floor_index(&self) -> usize {
        self.floors as usize
    }

    /// Foundation, Ground Floor and every upper floor in order.
    pub fn floor_list(&self) -> Vec<Floor> {
        building_floors(self.floors)
    }

    /// Formula variables that describe the whole building.
    ///
    /// The built-up area is bound under four names because formula authors
    /// have used all of them.
    pub fn env(&self) -> Env {
        let buildup = self.buildup_area();
        Env::new()
            .with("width", self.width_ft)
            .with("depth", self.depth_ft)
            .with("floors", self.floors as f64)
            .with("perimeter", self.construction_perimeter_ft)
            .with("construction_perimeter", self.construction_perimeter_ft)
            .with("carpet_percent", self.carpet_percent)
            .with("buildup_percent", self.buildup_percent)
            .with("carpet_area", self.carpet_area_sqft)
            .with("lift", if self.lift { 1.0 } else { 0.0 })
            .with("basements", self.basements as f64)
            .with("footprint_area", self.footprint_area())
            .with("buildup_area", buildup)
            .with("builtup_area", buildup)
            .with("built_up_area", buildup)
            .with("buildupArea", buildup)
            .with("total_buildup_area", self.total_buildup_area())
    }
}
