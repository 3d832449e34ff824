//! # Takeoff Geometry
//!
//! The geometric algorithms that can't be written as a single formula:
//! structural grid counting for beams and columns, and internal wall area
//! net of shared walls and openings.
//!
//! ## Grid counting
//!
//! Columns sit on a rectangular grid laid across the footprint at the grid
//! spacing. Along each axis there are `floor(length / spacing) + 1` grid
//! lines. Beams run between adjacent columns along both axes.
//!
//! ```text
//!  o---o---o---o---o      columns_per_row = 5
//!  |   |   |   |   |      rows_of_columns = 3
//!  o---o---o---o---o      columns = 5 × 3 = 15
//!  |   |   |   |   |      beams   = 3 × 4 + 5 × 2 = 22
//!  o---o---o---o---o
//! ```

use serde::{Deserialize, Serialize};

use crate::layout::{is_balcony, FloorLayout};
use crate::structure::{BeamConfig, ColumnConfig};
use crate::units::{CuFt, Feet, SqFt};

/// Grid lines allowed along one axis. Keeps member counts well inside `u64`.
pub const MAX_GRID_LINES: u64 = 1_000_000;

/// Column grid over a rectangular footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub length_ft: f64,
    pub breadth_ft: f64,
    pub spacing_ft: f64,
    /// Grid lines along the length
    pub columns_per_row: u64,
    /// Grid lines along the breadth
    pub rows_of_columns: u64,
}

impl GridLayout {
    /// Lay a grid over `length × breadth` at `spacing`.
    ///
    /// `None` when the spacing isn't positive or either axis would need more
    /// than [`MAX_GRID_LINES`] grid lines.
    pub fn new(length: Feet, breadth: Feet, spacing: Feet) -> Option<Self> {
        if !spacing.is_positive() {
            return None;
        }
        let lines = |extent: Feet| {
            let spans = (extent.value().max(0.0) / spacing.value()).floor();
            if spans.is_finite() && spans < MAX_GRID_LINES as f64 {
                (spans as u64).checked_add(1)
            } else {
                None
            }
        };
        Some(GridLayout {
            length_ft: length.value(),
            breadth_ft: breadth.value(),
            spacing_ft: spacing.value(),
            columns_per_row: lines(length)?,
            rows_of_columns: lines(breadth)?,
        })
    }

    /// Grid over the usable part of the footprint: `factor` of the plan
    /// area, with the footprint's aspect ratio kept.
    pub fn usable(width: Feet, depth: Feet, factor: f64, spacing: Feet) -> Option<Self> {
        let scale = factor.max(0.0).sqrt();
        GridLayout::new(width * scale, depth * scale, spacing)
    }

    pub fn column_count(&self) -> u64 {
        self.columns_per_row * self.rows_of_columns
    }

    /// Beam segments between adjacent grid intersections, both directions.
    pub fn beam_count(&self) -> u64 {
        let along_length = self.rows_of_columns * self.columns_per_row.saturating_sub(1);
        let along_breadth = self.columns_per_row * self.rows_of_columns.saturating_sub(1);
        along_length + along_breadth
    }

    pub fn describe(&self) -> String {
        format!(
            "{:.2} ft x {:.2} ft @ {} ft: {} x {} grid",
            self.length_ft, self.breadth_ft, self.spacing_ft, self.columns_per_row, self.rows_of_columns
        )
    }
}

/// Concrete in all beams: segments × span × width × depth.
pub fn beam_volume(grid: &GridLayout, beam: &BeamConfig) -> CuFt {
    let section: SqFt = Feet::from(beam.width_in) * Feet::from(beam.depth_in);
    section * Feet(grid.spacing_ft) * grid.beam_count() as f64
}

/// Concrete in all columns: count × width × depth × height.
pub fn column_volume(grid: &GridLayout, column: &ColumnConfig, height: Feet) -> CuFt {
    let section: SqFt = Feet::from(column.width_in) * Feet::from(column.depth_in);
    section * height * grid.column_count() as f64
}

/// Breakdown of the internal-wall takeoff on one floor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WallTakeoff {
    /// Room perimeters × storey height, balconies excluded
    pub gross: SqFt,
    /// Share of gross assumed to be walls counted twice by adjacent rooms
    pub shared_deduction: SqFt,
    /// Door and window area
    pub openings: SqFt,
    /// Sum of per-unit net areas, each clamped at zero
    pub net: SqFt,
}

/// Internal wall area of one floor.
///
/// For each unit type: gross wall face of every non-balcony room, less the
/// shared-wall fraction of that gross, less door and window area of all
/// rooms scaled by the unit count. Each unit's net is clamped at zero before
/// the units are summed, so the result never exceeds the gross and is never
/// negative.
pub fn internal_wall_takeoff(layout: &FloorLayout, floor_height: Feet, shared_fraction: f64) -> WallTakeoff {
    let mut total = WallTakeoff::default();

    for unit in layout.values() {
        let units = unit.count.max(0.0);

        let gross = unit
            .rooms
            .iter()
            .filter(|(name, _)| !is_balcony(name))
            .fold(SqFt(0.0), |acc, (_, room)| {
                acc + room.perimeter() * floor_height * (room.count.max(0.0) * units)
            });
        let shared = gross * shared_fraction.clamp(0.0, 1.0);
        let openings = unit
            .rooms
            .values()
            .fold(SqFt(0.0), |acc, room| acc + room.opening_area())
            * units;
        let net = SqFt((gross - shared - openings).value().max(0.0));

        total.gross = total.gross + gross;
        total.shared_deduction = total.shared_deduction + shared;
        total.openings = total.openings + openings;
        total.net = total.net + net;
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::{room, two_bhk};
    use crate::layout::UnitLayout;
    use crate::units::Inches;

    #[test]
    fn test_grid_counts_60_by_40() {
        let grid = GridLayout::new(Feet(60.0), Feet(40.0), Feet(15.0)).unwrap();
        assert_eq!(grid.columns_per_row, 5);
        assert_eq!(grid.rows_of_columns, 3);
        assert_eq!(grid.column_count(), 15);
        // 3 rows × 4 spans + 5 lines × 2 spans
        assert_eq!(grid.beam_count(), 22);
    }

    #[test]
    fn test_usable_grid_keeps_aspect_ratio() {
        let grid = GridLayout::usable(Feet(60.0), Feet(40.0), 0.85, Feet(15.0)).unwrap();
        assert!((grid.length_ft * grid.breadth_ft - 0.85 * 2400.0).abs() < 1e-9);
        assert!((grid.length_ft / grid.breadth_ft - 1.5).abs() < 1e-12);
        // 55.3 ft -> 4 lines, 36.9 ft -> 3 lines
        assert_eq!(grid.columns_per_row, 4);
        assert_eq!(grid.rows_of_columns, 3);
    }

    #[test]
    fn test_degenerate_footprint() {
        let grid = GridLayout::new(Feet(0.0), Feet(10.0), Feet(15.0)).unwrap();
        assert_eq!(grid.columns_per_row, 1);
        assert_eq!(grid.rows_of_columns, 1);
        assert_eq!(grid.beam_count(), 0);
        assert_eq!(grid.column_count(), 1);
    }

    #[test]
    fn test_unusable_spacing_or_extent() {
        assert!(GridLayout::new(Feet(60.0), Feet(40.0), Feet(0.0)).is_none());
        assert!(GridLayout::new(Feet(60.0), Feet(40.0), Feet(-15.0)).is_none());
        assert!(GridLayout::new(Feet(60.0), Feet(40.0), Feet(f64::NAN)).is_none());
        assert!(GridLayout::new(Feet(f64::INFINITY), Feet(40.0), Feet(15.0)).is_none());
        assert!(GridLayout::new(Feet(1e12), Feet(40.0), Feet(1e-3)).is_none());
        assert!(GridLayout::usable(Feet(60.0), Feet(40.0), 0.85, Feet(0.0)).is_none());

        // just under the line cap still counts without overflow
        let grid = GridLayout::new(Feet(999_998.0), Feet(999_998.0), Feet(1.0)).unwrap();
        assert_eq!(grid.column_count(), 999_999 * 999_999);
        assert_eq!(grid.beam_count(), 2 * 999_999 * 999_998);
    }

    #[test]
    fn test_member_volumes() {
        let grid = GridLayout::new(Feet(60.0), Feet(40.0), Feet(15.0)).unwrap();
        let beam = BeamConfig {
            grid_spacing_ft: Feet(15.0),
            width_in: Inches(12.0),
            depth_in: Inches(18.0),
        };
        // 22 × 15 ft × 1 ft × 1.5 ft
        assert!((beam_volume(&grid, &beam).value() - 495.0).abs() < 1e-9);

        let column = ColumnConfig {
            grid_spacing_ft: Feet(15.0),
            width_in: Inches(12.0),
            depth_in: Inches(12.0),
            height_ft: Feet(10.0),
        };
        // 15 × 1 × 1 × 10
        assert!((column_volume(&grid, &column, Feet(10.0)).value() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_internal_walls_single_unit() {
        let mut floor = FloorLayout::new();
        floor.insert("2BHK".into(), two_bhk(1.0));
        let takeoff = internal_wall_takeoff(&floor, Feet(10.0), 0.2);

        // Bedroom: 44 ft × 10 × 2 rooms = 880; Hall: 54 × 10 = 540; balcony excluded
        assert!((takeoff.gross.value() - 1420.0).abs() < 1e-9);
        assert!((takeoff.shared_deduction.value() - 284.0).abs() < 1e-9);
        // Doors 2 × 21, windows 3 × 16
        assert!((takeoff.openings.value() - 90.0).abs() < 1e-9);
        assert!((takeoff.net.value() - 1046.0).abs() < 1e-9);
    }

    #[test]
    fn test_internal_walls_scale_with_unit_count() {
        let mut one = FloorLayout::new();
        one.insert("2BHK".into(), two_bhk(1.0));
        let mut three = FloorLayout::new();
        three.insert("2BHK".into(), two_bhk(3.0));

        let single = internal_wall_takeoff(&one, Feet(10.0), 0.2);
        let triple = internal_wall_takeoff(&three, Feet(10.0), 0.2);
        assert!((triple.net.value() - 3.0 * single.net.value()).abs() < 1e-9);
    }

    #[test]
    fn test_internal_walls_clamped_per_unit() {
        let mut rooms = std::collections::BTreeMap::new();
        // tiny room with a huge number of doors
        rooms.insert("Store".to_string(), room(1.0, 2.0, 2.0, 20.0, 0.0));
        let mut floor = FloorLayout::new();
        floor.insert("Studio".into(), UnitLayout { count: 1.0, rooms });
        floor.insert("2BHK".into(), two_bhk(1.0));

        let takeoff = internal_wall_takeoff(&floor, Feet(10.0), 0.2);
        assert!(takeoff.net.value() >= 0.0);
        assert!(takeoff.net.value() <= takeoff.gross.value());
        // the Studio contributes nothing, the 2BHK contributes its own net
        assert!((takeoff.net.value() - 1046.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_layout() {
        let takeoff = internal_wall_takeoff(&FloorLayout::new(), Feet(10.0), 0.2);
        assert_eq!(takeoff, WallTakeoff::default());
    }
}
