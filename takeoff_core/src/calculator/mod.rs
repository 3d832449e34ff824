//! # Component Calculator
//!
//! Produces one [`ComponentResult`] per (floor, applicable component).
//!
//! Most components are plain formulas evaluated against the floor's
//! variable environment. A closed set of reserved component keys is
//! computed by a built-in strategy instead, because their geometry can't be
//! written as one formula:
//!
//! | Key                  | Strategy                 |
//! |----------------------|--------------------------|
//! | `internal_walls`     | [`ComponentStrategy::InternalWalls`]        |
//! | `external_walls`     | [`ComponentStrategy::ExternalWalls`]        |
//! | `Beams`              | [`ComponentStrategy::BeamGrid`]             |
//! | `Columns`            | [`ComponentStrategy::ColumnGrid`]           |
//! | `ExcavationVolume`   | [`ComponentStrategy::ExcavationPercentage`] |
//! | `BasementSlab`       | [`ComponentStrategy::BasementSlab`]         |
//! | `BasementWallVolume` | [`ComponentStrategy::BasementWall`]         |
//! | `BasementBeam`       | [`ComponentStrategy::BasementBeamGrid`]     |
//! | `Basementcolumns`    | [`ComponentStrategy::BasementColumnGrid`]   |
//!
//! Keys match ignoring case, spaces and underscores.
//!
//! ## Volume rule
//!
//! `volume = area × thickness` when both are present and non-zero,
//! otherwise `volume = area` (area-rated items such as tiling and paint),
//! and unavailable when the area is unavailable.

pub mod geometry;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::components::{normalize_key, ComponentDefinition, ComponentResult, ComponentSet};
use crate::expression::{try_evaluate, Env};
use crate::floors::{is_applicable, Floor};
use crate::layout::RoomLayout;
use crate::overrides::Overrides;
use crate::parameters::BuildingParameters;
use crate::quantity::Quantity;
use crate::settings::TakeoffSettings;
use crate::structure::{basement_label, StructuralConfig, StructuralFloorConfig};
use crate::units::{CuFt, Feet};

use geometry::{beam_volume, column_volume, internal_wall_takeoff, GridLayout};

/// Formula keyword: built-up area × percentage
pub const PERCENTAGE_OF_BUILDUP: &str = "percentage_of_buildup";
/// Formula keyword: built-up area × percentage when `condition` holds
pub const CONDITIONAL_PERCENTAGE_OF_BUILDUP: &str = "conditional_percentage_of_buildup";

/// How a component's area is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentStrategy {
    GenericFormula,
    InternalWalls,
    ExternalWalls,
    BeamGrid,
    ColumnGrid,
    ExcavationPercentage,
    BasementSlab,
    BasementWall,
    BasementBeamGrid,
    BasementColumnGrid,
}

static RESERVED_KEYS: Lazy<HashMap<&'static str, ComponentStrategy>> = Lazy::new(|| {
    HashMap::from([
        ("internalwalls", ComponentStrategy::InternalWalls),
        ("externalwalls", ComponentStrategy::ExternalWalls),
        ("beams", ComponentStrategy::BeamGrid),
        ("columns", ComponentStrategy::ColumnGrid),
        ("excavationvolume", ComponentStrategy::ExcavationPercentage),
        ("basementslab", ComponentStrategy::BasementSlab),
        ("basementwallvolume", ComponentStrategy::BasementWall),
        ("basementbeam", ComponentStrategy::BasementBeamGrid),
        ("basementbeams", ComponentStrategy::BasementBeamGrid),
        ("basementcolumns", ComponentStrategy::BasementColumnGrid),
    ])
});

/// Everything a strategy may look at for one floor.
#[derive(Debug, Clone, Copy)]
pub struct FloorContext<'a> {
    pub floor: &'a Floor,
    pub last_index: usize,
    pub params: &'a BuildingParameters,
    pub structure: &'a StructuralConfig,
    pub layout: &'a RoomLayout,
    pub settings: &'a TakeoffSettings,
    pub overrides: &'a Overrides,
}

impl<'a> FloorContext<'a> {
    /// Structural config for this floor, with the "Other Floors" fallback.
    pub fn floor_config(&self) -> Option<&'a StructuralFloorConfig> {
        self.structure.for_floor(self.floor)
    }

    /// Percentage for a component: the user's edit wins over the config.
    pub fn percentage(&self, key: &str, def: &ComponentDefinition) -> Option<f64> {
        self.overrides.percentage(key).or(def.percentage)
    }

    /// Variables visible to a component's formula on this floor.
    pub fn env(&self, key: &str, def: &ComponentDefinition) -> Env {
        let mut env = self.params.env();
        env.set("floor_index", self.floor.index as f64);
        if let Some(config) = self.floor_config() {
            config.bind(&mut env);
        }
        if let Some(percentage) = self.percentage(key, def) {
            env.set("percentage", percentage);
        }
        if let Some(thickness) = def.thickness {
            env.set("thickness", thickness);
        }
        env
    }
}

/// An area with the explanation of how it was reached.
struct Measured {
    area: Quantity,
    logic: String,
}

impl Measured {
    fn new(area: f64, logic: impl Into<String>) -> Self {
        Measured {
            area: Quantity::from_f64(area),
            logic: logic.into(),
        }
    }

    fn unavailable(reason: impl Into<String>) -> Self {
        Measured {
            area: Quantity::Unavailable,
            logic: reason.into(),
        }
    }
}

impl ComponentStrategy {
    /// Strategy for a component key; anything unreserved is a formula.
    pub fn for_key(key: &str) -> Self {
        RESERVED_KEYS
            .get(normalize_key(key).as_str())
            .copied()
            .unwrap_or(ComponentStrategy::GenericFormula)
    }

    /// Compute the result for `key` on the context's floor.
    pub fn compute(self, key: &str, def: &ComponentDefinition, ctx: &FloorContext) -> ComponentResult {
        let measured = match self {
            ComponentStrategy::GenericFormula => generic_formula(key, def, ctx),
            ComponentStrategy::InternalWalls => internal_walls(ctx),
            ComponentStrategy::ExternalWalls => external_walls(ctx),
            ComponentStrategy::BeamGrid => beam_grid(ctx),
            ComponentStrategy::ColumnGrid => column_grid(ctx),
            ComponentStrategy::ExcavationPercentage => percentage_of_buildup(key, def, ctx),
            ComponentStrategy::BasementSlab => match basement_configs(ctx) {
                Ok(_) => percentage_of_buildup(key, def, ctx),
                Err(missing) => missing,
            },
            ComponentStrategy::BasementWall => basement_wall(ctx),
            ComponentStrategy::BasementBeamGrid => basement_beam_grid(ctx),
            ComponentStrategy::BasementColumnGrid => basement_column_grid(ctx),
        };

        if !measured.area.is_available() {
            log::warn!(
                "{} on {}: unavailable ({})",
                key,
                ctx.floor.label,
                measured.logic
            );
        }

        let volume_cuft = volume_for(measured.area, def.thickness);
        log::debug!(
            "{} on {} via {:?}: area {} volume {}",
            key,
            ctx.floor.label,
            self,
            measured.area,
            volume_cuft
        );

        ComponentResult {
            floor: ctx.floor.label.clone(),
            floor_index: ctx.floor.index,
            component: key.to_string(),
            category: def.category.clone(),
            area: measured.area,
            volume_cuft,
            logic: measured.logic,
        }
    }
}

/// Volume from area and thickness.
pub fn volume_for(area: Quantity, thickness: Option<f64>) -> Quantity {
    let Quantity::Value(area) = area else {
        return Quantity::Unavailable;
    };
    let volume = match thickness {
        Some(t) if t.is_finite() && t != 0.0 && area != 0.0 => area * t,
        _ => area,
    };
    if volume < 0.0 {
        log::warn!("negative volume {:.2} clamped to 0", volume);
        return Quantity::Value(0.0);
    }
    Quantity::from_f64(volume)
}

fn generic_formula(key: &str, def: &ComponentDefinition, ctx: &FloorContext) -> Measured {
    let Some(formula) = def.formula.as_deref().map(str::trim).filter(|f| !f.is_empty()) else {
        return Measured::new(0.0, "no formula configured");
    };

    if formula.eq_ignore_ascii_case(PERCENTAGE_OF_BUILDUP) {
        return percentage_of_buildup(key, def, ctx);
    }

    let env = ctx.env(key, def);

    if formula.eq_ignore_ascii_case(CONDITIONAL_PERCENTAGE_OF_BUILDUP) {
        let Some(condition) = def.condition.as_deref() else {
            return percentage_of_buildup(key, def, ctx);
        };
        return match try_evaluate(condition, &env) {
            Ok(v) if v != 0.0 => percentage_of_buildup(key, def, ctx),
            Ok(_) => Measured::new(0.0, format!("condition '{}' not met", condition)),
            Err(e) => Measured::unavailable(format!("condition '{}': {}", condition, e)),
        };
    }

    match try_evaluate(formula, &env) {
        Ok(area) => Measured::new(area, format!("{} = {:.2}", formula, area)),
        Err(e) => Measured::unavailable(format!("{}: {}", formula, e)),
    }
}

/// Built-up area × percentage / 100.
fn percentage_of_buildup(key: &str, def: &ComponentDefinition, ctx: &FloorContext) -> Measured {
    let Some(percentage) = ctx.percentage(key, def) else {
        return Measured::unavailable("no percentage configured");
    };
    let buildup = ctx.params.buildup_area();
    Measured::new(
        buildup * (percentage / 100.0),
        format!("buildup area {:.2} sq ft x {}%", buildup, percentage),
    )
}

fn internal_walls(ctx: &FloorContext) -> Measured {
    let Some(config) = ctx.floor_config() else {
        return Measured::unavailable(format!("no structural config for {}", ctx.floor.label));
    };
    let Some(layout) = ctx.layout.for_floor(ctx.floor) else {
        return Measured::new(0.0, "no room layout for this floor");
    };
    let takeoff = internal_wall_takeoff(layout, config.floor_height_ft, ctx.settings.shared_wall_reduction);
    Measured::new(
        takeoff.net.value(),
        format!(
            "rooms {:.2} - shared walls {:.2} - openings {:.2} = {:.2} sq ft",
            takeoff.gross.value(),
            takeoff.shared_deduction.value(),
            takeoff.openings.value(),
            takeoff.net.value()
        ),
    )
}

/// Perimeter × storey height × storey count, one aggregate for the building.
fn external_walls(ctx: &FloorContext) -> Measured {
    let Some(config) = ctx.floor_config() else {
        return Measured::unavailable(format!("no structural config for {}", ctx.floor.label));
    };
    let perimeter = ctx.params.construction_perimeter_ft;
    let height = config.floor_height_ft.value();
    let floors = ctx.params.floors as f64;
    Measured::new(
        perimeter * height * floors,
        format!("perimeter {} ft x height {} ft x {} floors", perimeter, height, floors),
    )
}

fn usable_grid(ctx: &FloorContext, spacing: Feet) -> Option<GridLayout> {
    GridLayout::usable(
        Feet(ctx.params.width_ft),
        Feet(ctx.params.depth_ft),
        ctx.settings.usable_footprint_factor,
        ctx.settings.grid_spacing(spacing),
    )
}

fn beam_grid(ctx: &FloorContext) -> Measured {
    let Some(config) = ctx.floor_config() else {
        return Measured::unavailable(format!("no structural config for {}", ctx.floor.label));
    };
    let Some(grid) = usable_grid(ctx, config.beam.grid_spacing_ft) else {
        return Measured::unavailable(format!("no usable beam grid for {}", ctx.floor.label));
    };
    let volume = beam_volume(&grid, &config.beam);
    Measured::new(
        volume.value(),
        format!("{} beams on {}", grid.beam_count(), grid.describe()),
    )
}

fn column_grid(ctx: &FloorContext) -> Measured {
    let Some(config) = ctx.floor_config() else {
        return Measured::unavailable(format!("no structural config for {}", ctx.floor.label));
    };
    let height = config.effective_column_height();
    if !height.is_positive() {
        return Measured::unavailable(format!("no column or floor height for {}", ctx.floor.label));
    }
    let Some(grid) = usable_grid(ctx, config.column.grid_spacing_ft) else {
        return Measured::unavailable(format!("no usable column grid for {}", ctx.floor.label));
    };
    let volume = column_volume(&grid, &config.column, height);
    Measured::new(
        volume.value(),
        format!("{} columns x {} ft on {}", grid.column_count(), height.value(), grid.describe()),
    )
}

/// Structural config of every basement level, or why it is missing.
fn basement_configs<'a>(ctx: &FloorContext<'a>) -> Result<Vec<&'a StructuralFloorConfig>, Measured> {
    if ctx.params.basements == 0 {
        return Err(Measured::unavailable("building has no basement"));
    }
    (1..=ctx.params.basements)
        .map(|level| {
            ctx.structure.for_basement(level).ok_or_else(|| {
                Measured::unavailable(format!("no structural config for {}", basement_label(level)))
            })
        })
        .collect()
}

fn basement_wall(ctx: &FloorContext) -> Measured {
    let levels = match basement_configs(ctx) {
        Ok(levels) => levels,
        Err(missing) => return missing,
    };
    let depth: f64 = levels.iter().map(|c| c.floor_height_ft.value()).sum();
    let perimeter = ctx.params.construction_perimeter_ft;
    Measured::new(
        perimeter * depth,
        format!("perimeter {} ft x basement height {} ft", perimeter, depth),
    )
}

/// Basement grids span the raw footprint, one grid per basement level.
fn basement_grid(ctx: &FloorContext, spacing: Feet) -> Option<GridLayout> {
    GridLayout::new(
        Feet(ctx.params.width_ft),
        Feet(ctx.params.depth_ft),
        ctx.settings.grid_spacing(spacing),
    )
}

fn basement_beam_grid(ctx: &FloorContext) -> Measured {
    let levels = match basement_configs(ctx) {
        Ok(levels) => levels,
        Err(missing) => return missing,
    };
    let mut total = CuFt(0.0);
    let mut beams = 0;
    for config in &levels {
        let Some(grid) = basement_grid(ctx, config.beam.grid_spacing_ft) else {
            return Measured::unavailable(format!("no usable beam grid for {}", config.floor));
        };
        beams += grid.beam_count();
        total = total + beam_volume(&grid, &config.beam);
    }
    Measured::new(
        total.value(),
        format!("{} beams over {} basement level(s)", beams, levels.len()),
    )
}

fn basement_column_grid(ctx: &FloorContext) -> Measured {
    let levels = match basement_configs(ctx) {
        Ok(levels) => levels,
        Err(missing) => return missing,
    };
    let mut total = CuFt(0.0);
    let mut columns = 0;
    for config in &levels {
        let height = config.effective_column_height();
        if !height.is_positive() {
            return Measured::unavailable(format!("no column or floor height for {}", config.floor));
        }
        let Some(grid) = basement_grid(ctx, config.column.grid_spacing_ft) else {
            return Measured::unavailable(format!("no usable column grid for {}", config.floor));
        };
        columns += grid.column_count();
        total = total + column_volume(&grid, &config.column, height);
    }
    Measured::new(
        total.value(),
        format!("{} columns over {} basement level(s)", columns, levels.len()),
    )
}

/// Runs every applicable component on every floor.
#[derive(Debug, Clone, Copy)]
pub struct Calculator<'a> {
    pub params: &'a BuildingParameters,
    pub structure: &'a StructuralConfig,
    pub layout: &'a RoomLayout,
    pub settings: &'a TakeoffSettings,
    pub overrides: &'a Overrides,
}

impl<'a> Calculator<'a> {
    pub fn context<'f>(&self, floor: &'f Floor) -> FloorContext<'f>
    where
        'a: 'f,
    {
        FloorContext {
            floor,
            last_index: self.params.last_floor_index(),
            params: self.params,
            structure: self.structure,
            layout: self.layout,
            settings: self.settings,
            overrides: self.overrides,
        }
    }

    /// Results for all floors, floor by floor, in component authoring order.
    pub fn run(&self, components: &ComponentSet) -> Vec<ComponentResult> {
        let floors = self.params.floor_list();
        let last_index = self.params.last_floor_index();
        let mut results = Vec::new();

        for floor in &floors {
            let ctx = self.context(floor);
            for (key, def) in components.iter() {
                if !is_applicable(def.applicable_floors.as_deref(), floor.index, last_index) {
                    continue;
                }
                results.push(ComponentStrategy::for_key(key).compute(key, def, &ctx));
            }
        }

        results
    }
}
