//! # Finishing Materials
//!
//! Finishing items (tiles, paint, fittings, fixtures) arrive with their
//! quantities already worked out and go straight into the BOQ. They can be
//! supplied two ways:
//!
//! - as [`FinishingItem`]s with a `totalQty` (and optionally a hand-typed
//!   `manualQty` that wins over it), or
//! - as [`FinishingRule`]s whose formulas are evaluated against a
//!   [`SummaryContext`] built from the takeoff.
//!
//! ## Summary variables
//!
//! | Variable             | Meaning                                          |
//! |----------------------|--------------------------------------------------|
//! | `buildup_area`       | built-up area of one floor                       |
//! | `total_buildup_area` | built-up area × floors                           |
//! | `carpet_area`        | carpet area                                      |
//! | `perimeter`          | construction perimeter                           |
//! | `floors`             | storeys above the foundation                     |
//! | `tile_area`          | Flooring component area above the ground floor   |
//! | `paint_area`         | Painting component area above the ground floor   |
//! | `room_count`         | rooms across all units and floors                |
//! | `door_count`         | doors across all units and floors                |
//! | `window_count`       | windows across all units and floors              |

use serde::{Deserialize, Serialize};

use crate::components::ComponentResult;
use crate::expression::{evaluate, Env};
use crate::layout::RoomLayout;
use crate::naming::names_match;
use crate::parameters::BuildingParameters;

/// A finishing material with a known quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishingItem {
    pub material: String,
    pub unit: String,
    pub category: String,
    #[serde(alias = "totalQty", default)]
    pub total_qty: f64,
    /// Quantity typed by hand; replaces `total_qty` when present
    #[serde(alias = "manualQty", default, skip_serializing_if = "Option::is_none")]
    pub manual_qty: Option<f64>,
}

impl FinishingItem {
    pub fn effective_qty(&self) -> f64 {
        self.manual_qty.unwrap_or(self.total_qty)
    }
}

/// A finishing material whose quantity is a formula over the summary context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishingRule {
    pub material: String,
    pub unit: String,
    pub category: String,
    pub formula: String,
}

/// Building-level figures finishing formulas are written against.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryContext {
    pub buildup_area: f64,
    pub total_buildup_area: f64,
    pub carpet_area: f64,
    pub perimeter: f64,
    pub floors: f64,
    pub tile_area: f64,
    pub paint_area: f64,
    pub room_count: f64,
    pub door_count: f64,
    pub window_count: f64,
}

impl SummaryContext {
    pub fn from_takeoff(params: &BuildingParameters, layout: &RoomLayout, results: &[ComponentResult]) -> Self {
        let above_ground = |category: &str| -> f64 {
            results
                .iter()
                .filter(|r| r.floor_index >= 2 && names_match(&r.category, category))
                .map(|r| r.area.or_zero())
                .sum()
        };

        SummaryContext {
            buildup_area: params.buildup_area(),
            total_buildup_area: params.total_buildup_area(),
            carpet_area: params.carpet_area_sqft,
            perimeter: params.construction_perimeter_ft,
            floors: params.floors as f64,
            tile_area: above_ground("Flooring"),
            paint_area: above_ground("Painting"),
            room_count: layout.room_count(),
            door_count: layout.door_count(),
            window_count: layout.window_count(),
        }
    }

    pub fn env(&self) -> Env {
        Env::new()
            .with("buildup_area", self.buildup_area)
            .with("total_buildup_area", self.total_buildup_area)
            .with("carpet_area", self.carpet_area)
            .with("perimeter", self.perimeter)
            .with("floors", self.floors)
            .with("tile_area", self.tile_area)
            .with("paint_area", self.paint_area)
            .with("room_count", self.room_count)
            .with("door_count", self.door_count)
            .with("window_count", self.window_count)
    }
}

/// Evaluate finishing rules. A failing formula yields a zero quantity.
pub fn evaluate_rules(rules: &[FinishingRule], summary: &SummaryContext) -> Vec<FinishingItem> {
    let env = summary.env();
    rules
        .iter()
        .map(|rule| FinishingItem {
            material: rule.material.clone(),
            unit: rule.unit.clone(),
            category: rule.category.clone(),
            total_qty: evaluate(&rule.formula, &env).or_zero(),
            manual_qty: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::two_bhk;
    use crate::layout::FloorLayout;
    use crate::materials::tests::result;
    use crate::parameters::tests::sample_parameters;

    fn rule(material: &str, formula: &str) -> FinishingRule {
        FinishingRule {
            material: material.to_string(),
            unit: "nos".to_string(),
            category: "Fittings".to_string(),
            formula: formula.to_string(),
        }
    }

    #[test]
    fn test_item_json_and_manual_qty() {
        let json = r#"{"material": "Door Handle", "unit": "nos", "category": "Fittings", "totalQty": 12}"#;
        let mut item: FinishingItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.effective_qty(), 12.0);
        item.manual_qty = Some(15.0);
        assert_eq!(item.effective_qty(), 15.0);
    }

    #[test]
    fn test_summary_context() {
        let mut layout = RoomLayout::default();
        let mut floor = FloorLayout::new();
        floor.insert("2BHK".into(), two_bhk(2.0));
        layout.floors.insert("1st Floor".into(), floor);

        let results = vec![
            result(1, "Tiles", "Flooring", 900.0),
            result(2, "Tiles", "Flooring", 800.0),
            result(2, "Paint", "Painting", 2500.0),
        ];
        let summary = SummaryContext::from_takeoff(&sample_parameters(), &layout, &results);
        assert_eq!(summary.tile_area, 800.0);
        assert_eq!(summary.paint_area, 2500.0);
        // (2 bedrooms + hall + balcony) × 2 units
        assert_eq!(summary.room_count, 8.0);
        // openings are counted per room type, not per room
        assert_eq!(summary.door_count, 4.0);
        assert_eq!(summary.window_count, 6.0);
    }

    #[test]
    fn test_evaluate_rules() {
        let summary = SummaryContext {
            door_count: 6.0,
            tile_area: 800.0,
            ..Default::default()
        };
        let items = evaluate_rules(
            &[rule("Door Handle", "door_count * 2"), rule("Grout", "tile_area / 40"), rule("Broken", "nope + 1")],
            &summary,
        );
        assert_eq!(items[0].total_qty, 12.0);
        assert_eq!(items[1].total_qty, 20.0);
        assert_eq!(items[2].total_qty, 0.0);
    }
}
