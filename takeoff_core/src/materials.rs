//! # Material Aggregation
//!
//! Turns component volumes into material quantities.
//!
//! 1. Component results are grouped by (floor, category) and their volumes
//!    summed. Unavailable volumes count as zero.
//! 2. Each group looks up its materials in the [`MaterialTable`] by floor
//!    class and category.
//! 3. Each material's quantity is `multiplier × volume`, or a formula with
//!    `volume_cuft` bound to the group volume. A user qty-per-unit override
//!    replaces either.
//! 4. `total_qty = qty × (1 + wastage / 100)`, rounded to the configured
//!    decimals. Wastage defaults to 5% unless overridden.
//!
//! Two category pairs don't follow the per-floor grouping:
//!
//! | Category                     | Group volume                                   |
//! |------------------------------|------------------------------------------------|
//! | Electrical Work, Plumbing    | built-up area of the whole building            |
//! | Flooring, Painting           | sum over floors above the ground floor only    |
//!
//! Both produce one building-wide group labelled "All Floors".
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "Foundation": {
//!     "Concrete": {
//!       "Cement": { "unit": "bag", "qty": 0.22 },
//!       "Sand":   { "unit": "cft", "qty": "volume_cuft * 0.42" }
//!     }
//!   },
//!   "Other Floor": { "Plaster": { "Cement": { "unit": "bag", "qty": 0.03 } } }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::RateCatalog;
use crate::components::ComponentResult;
use crate::expression::evaluate;
use crate::floors::FloorClass;
use crate::naming::{names_match, normalize_name};
use crate::overrides::{MaterialKey, Overrides};
use crate::parameters::BuildingParameters;
use crate::quantity::round_to;
use crate::settings::TakeoffSettings;

/// Floor label of building-wide material groups
pub const ALL_FLOORS: &str = "All Floors";

/// Quantity of a material per unit of group volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QtyRule {
    /// qty = multiplier × volume
    Multiplier(f64),
    /// qty = formula, with `volume_cuft` bound
    Formula(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub unit: String,
    pub qty: QtyRule,
}

/// material name -> spec
pub type CategoryMaterials = IndexMap<String, MaterialSpec>;

/// floor class -> category -> material -> spec
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialTable {
    pub classes: IndexMap<String, IndexMap<String, CategoryMaterials>>,
}

impl MaterialTable {
    /// Materials of a category for a floor class. Category names compare
    /// ignoring case, accents and extra whitespace.
    pub fn lookup(&self, class: FloorClass, category: &str) -> Option<&CategoryMaterials> {
        let categories = find_entry(&self.classes, |key| class.matches_key(key))?;
        find_entry(categories, |key| names_match(key, category))
    }
}

/// First value whose key satisfies `pred`, in table order.
fn find_entry<V>(map: &IndexMap<String, V>, mut pred: impl FnMut(&str) -> bool) -> Option<&V> {
    map.iter().find(|(key, _)| pred(key.as_str())).map(|(_, value)| value)
}

/// One material quantity line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRow {
    pub floor: String,
    pub category: String,
    pub material: String,
    /// Group volume the quantity was derived from
    pub volume: f64,
    pub unit: String,
    /// Multiplier applied to the volume; absent for formula quantities
    pub qty_per_unit: Option<f64>,
    pub qty: f64,
    pub wastage_percent: f64,
    pub total_qty: f64,
    /// Default-brand catalog rate, absent when the catalog has no entry
    pub rate: Option<f64>,
    pub total_value: Option<f64>,
    /// Whether a user override changed this row
    pub overridden: bool,
}

impl MaterialRow {
    pub fn key(&self) -> MaterialKey {
        MaterialKey::new(&self.category, &self.material, &self.floor)
    }
}

/// How a category's components are pooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupRule {
    PerFloor,
    WholeBuilding,
    AboveGround,
}

impl GroupRule {
    fn of(category: &str) -> Self {
        match normalize_name(category).as_str() {
            "electrical work" | "plumbing" => GroupRule::WholeBuilding,
            "flooring" | "painting" => GroupRule::AboveGround,
            _ => GroupRule::PerFloor,
        }
    }
}

/// Summed volume of one (floor, category) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialGroup {
    pub floor: String,
    /// Floor classes to try, in order, when looking up materials
    pub classes: Vec<FloorClass>,
    pub category: String,
    pub volume: f64,
}

/// Pool component volumes into material groups, in first-seen order.
pub fn group_volumes(results: &[ComponentResult], params: &BuildingParameters) -> Vec<MaterialGroup> {
    let mut groups: Vec<MaterialGroup> = Vec::new();

    for result in results {
        if result.category.trim().is_empty() {
            continue;
        }
        let rule = GroupRule::of(&result.category);
        let floor = match rule {
            GroupRule::PerFloor => result.floor.as_str(),
            _ => ALL_FLOORS,
        };

        let index = match groups
            .iter()
            .position(|g| g.floor == floor && names_match(&g.category, &result.category))
        {
            Some(index) => index,
            None => {
                let (classes, volume) = match rule {
                    GroupRule::PerFloor => (vec![FloorClass::of_index(result.floor_index)], 0.0),
                    GroupRule::WholeBuilding => (building_wide_classes(), params.total_buildup_area()),
                    GroupRule::AboveGround => (building_wide_classes(), 0.0),
                };
                groups.push(MaterialGroup {
                    floor: floor.to_string(),
                    classes,
                    category: result.category.clone(),
                    volume,
                });
                groups.len() - 1
            }
        };

        match rule {
            GroupRule::PerFloor => groups[index].volume += result.volume_cuft.or_zero(),
            GroupRule::AboveGround if result.floor_index >= 2 => {
                groups[index].volume += result.volume_cuft.or_zero()
            }
            _ => {}
        }
    }

    for group in &groups {
        log::debug!("material group {} / {}: {:.2}", group.floor, group.category, group.volume);
    }
    groups
}

fn building_wide_classes() -> Vec<FloorClass> {
    vec![FloorClass::OtherFloor, FloorClass::GroundFloor, FloorClass::Foundation]
}

/// Builds material rows from component results.
#[derive(Debug, Clone, Copy)]
pub struct MaterialAggregator<'a> {
    pub params: &'a BuildingParameters,
    pub table: &'a MaterialTable,
    pub catalog: &'a RateCatalog,
    pub settings: &'a TakeoffSettings,
    pub overrides: &'a Overrides,
}

impl<'a> MaterialAggregator<'a> {
    pub fn run(&self, results: &[ComponentResult]) -> Vec<MaterialRow> {
        let mut rows = Vec::new();

        for group in group_volumes(results, self.params) {
            let materials = group
                .classes
                .iter()
                .find_map(|class| self.table.lookup(*class, &group.category));
            let Some(materials) = materials else {
                log::warn!(
                    "no material definition for category '{}' on {}",
                    group.category,
                    group.floor
                );
                continue;
            };

            for (material, spec) in materials.iter() {
                rows.push(self.row(&group, material, spec));
            }
        }

        rows
    }

    fn row(&self, group: &MaterialGroup, material: &str, spec: &MaterialSpec) -> MaterialRow {
        let key = MaterialKey::new(&group.category, material, &group.floor);
        let edit = self.overrides.material(&key);
        let volume = group.volume;

        let (qty_per_unit, qty) = match (edit.qty_per_unit, &spec.qty) {
            (Some(per_unit), _) => (Some(per_unit), per_unit * volume),
            (None, QtyRule::Multiplier(per_unit)) => (Some(*per_unit), per_unit * volume),
            (None, QtyRule::Formula(formula)) => {
                let env = self
                    .params
                    .env()
                    .with("volume_cuft", volume)
                    .with("volume", volume);
                (None, evaluate(formula, &env).or_zero())
            }
        };

        let wastage_percent = edit
            .wastage_percent
            .unwrap_or(self.settings.default_wastage_percent);
        let decimals = self.settings.quantity_decimals;
        let total_qty = round_to(qty * (1.0 + wastage_percent / 100.0), decimals);

        let rate = self.catalog.default_rate(material);
        if rate.is_none() {
            log::warn!("no catalog rate for material '{}'", material);
        }

        MaterialRow {
            floor: group.floor.clone(),
            category: group.category.clone(),
            material: material.to_string(),
            volume,
            unit: spec.unit.clone(),
            qty_per_unit,
            qty,
            wastage_percent,
            total_qty,
            rate,
            total_value: rate.map(|r| round_to(total_qty * r, decimals)),
            overridden: !edit.is_empty(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;
    use crate::floors::floor_label;
    use crate::parameters::tests::sample_parameters;
    use crate::quantity::Quantity;
    use pretty_assertions::assert_eq;

    fn spec(unit: &str, qty: QtyRule) -> MaterialSpec {
        MaterialSpec {
            unit: unit.to_string(),
            qty,
        }
    }

    pub(crate) fn sample_table() -> MaterialTable {
        let concrete = CategoryMaterials::from([
            ("Cement".to_string(), spec("bag", QtyRule::Multiplier(2.0))),
            ("Sand".to_string(), spec("cft", QtyRule::Formula("volume_cuft * 0.5 + 10".into()))),
        ]);
        let finishing = CategoryMaterials::from([("Vitrified Tiles".to_string(), spec("sqft", QtyRule::Multiplier(1.0)))]);
        let electrical = CategoryMaterials::from([("Wiring".to_string(), spec("sqft", QtyRule::Multiplier(1.0)))]);
        let only_concrete = IndexMap::from([("Concrete".to_string(), concrete.clone())]);
        MaterialTable {
            classes: IndexMap::from([
                ("Foundation".to_string(), only_concrete.clone()),
                ("GroundFloor".to_string(), only_concrete),
                (
                    "Other Floor".to_string(),
                    IndexMap::from([
                        ("Concrete".to_string(), concrete),
                        ("Flooring".to_string(), finishing),
                        ("Electrical Work".to_string(), electrical),
                    ]),
                ),
            ]),
        }
    }

    pub(crate) fn result(floor_index: usize, component: &str, category: &str, volume: f64) -> ComponentResult {
        ComponentResult {
            floor: floor_label(floor_index),
            floor_index,
            component: component.to_string(),
            category: category.to_string(),
            area: Quantity::Value(volume),
            volume_cuft: Quantity::Value(volume),
            logic: String::new(),
        }
    }

    struct Fixture {
        params: BuildingParameters,
        table: MaterialTable,
        catalog: RateCatalog,
        settings: TakeoffSettings,
        overrides: Overrides,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                params: sample_parameters(),
                table: sample_table(),
                catalog: sample_catalog(),
                settings: TakeoffSettings::default(),
                overrides: Overrides::default(),
            }
        }

        fn run(&self, results: &[ComponentResult]) -> Vec<MaterialRow> {
            MaterialAggregator {
                params: &self.params,
                table: &self.table,
                catalog: &self.catalog,
                settings: &self.settings,
                overrides: &self.overrides,
            }
            .run(results)
        }
    }

    fn find<'r>(rows: &'r [MaterialRow], floor: &str, material: &str) -> &'r MaterialRow {
        rows.iter()
            .find(|r| r.floor == floor && r.material == material)
            .unwrap()
    }

    #[test]
    fn test_multiplier_with_wastage() {
        let fx = Fixture::new();
        let rows = fx.run(&[result(0, "Footing", "Concrete", 500.0)]);
        let cement = find(&rows, "Foundation", "Cement");
        // 2 × 500 × 1.05
        assert!((cement.total_qty - 1050.0).abs() < 1e-9);
        assert_eq!(cement.qty_per_unit, Some(2.0));
        assert_eq!(cement.wastage_percent, 5.0);
        assert_eq!(cement.rate, Some(410.0));
        assert!((cement.total_value.unwrap() - 430500.0).abs() < 1e-6);
        assert!(!cement.overridden);
    }

    #[test]
    fn test_formula_quantity() {
        let fx = Fixture::new();
        let rows = fx.run(&[result(1, "Slab", "Concrete", 100.0)]);
        let sand = find(&rows, "Ground Floor", "Sand");
        // (100 × 0.5 + 10) × 1.05
        assert!((sand.qty - 60.0).abs() < 1e-9);
        assert!((sand.total_qty - 63.0).abs() < 1e-9);
        assert_eq!(sand.qty_per_unit, None);
    }

    #[test]
    fn test_groups_sum_per_floor_and_category() {
        let fx = Fixture::new();
        let results = vec![
            result(1, "Slab", "Concrete", 300.0),
            result(1, "Beams", "Concrete", 200.0),
            result(2, "Slab", "Concrete", 100.0),
            ComponentResult {
                volume_cuft: Quantity::Unavailable,
                ..result(1, "Columns", "Concrete", 0.0)
            },
        ];
        let groups = group_volumes(&results, &fx.params);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].floor, "Ground Floor");
        assert!((groups[0].volume - 500.0).abs() < 1e-9);
        assert!((groups[1].volume - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_overrides_replace_multiplier_and_wastage() {
        let mut fx = Fixture::new();
        let key = MaterialKey::new("Concrete", "Cement", "Foundation");
        fx.overrides.set_qty_per_unit(key.clone(), 3.0);
        fx.overrides.set_wastage(key, 0.0);

        let rows = fx.run(&[result(0, "Footing", "Concrete", 500.0)]);
        let cement = find(&rows, "Foundation", "Cement");
        assert_eq!(cement.qty_per_unit, Some(3.0));
        assert!((cement.total_qty - 1500.0).abs() < 1e-9);
        assert!(cement.overridden);

        // other floors untouched
        let rows = fx.run(&[result(1, "Slab", "Concrete", 500.0)]);
        assert_eq!(find(&rows, "Ground Floor", "Cement").qty_per_unit, Some(2.0));
    }

    #[test]
    fn test_electrical_uses_whole_building_buildup() {
        let fx = Fixture::new();
        let results = vec![
            result(1, "Wiring", "Electrical Work", 10.0),
            result(2, "Wiring", "Electrical Work", 10.0),
        ];
        let rows = fx.run(&results);
        assert_eq!(rows.len(), 1);
        let wiring = &rows[0];
        assert_eq!(wiring.floor, ALL_FLOORS);
        // 2160 × 3 floors
        assert!((wiring.volume - 6480.0).abs() < 1e-9);
    }

    #[test]
    fn test_flooring_starts_above_ground() {
        let fx = Fixture::new();
        let results = vec![
            result(0, "Tiles", "Flooring", 1000.0),
            result(1, "Tiles", "Flooring", 1000.0),
            result(2, "Tiles", "Flooring", 400.0),
            result(3, "Tiles", "Flooring", 600.0),
        ];
        let rows = fx.run(&results);
        let tiles = find(&rows, ALL_FLOORS, "Vitrified Tiles");
        assert!((tiles.volume - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_definition_omits_rows() {
        let fx = Fixture::new();
        let rows = fx.run(&[result(0, "Mystery", "Landscaping", 100.0)]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_rate_leaves_value_unset() {
        let mut fx = Fixture::new();
        fx.catalog = RateCatalog::default();
        let rows = fx.run(&[result(0, "Footing", "Concrete", 500.0)]);
        let cement = find(&rows, "Foundation", "Cement");
        assert_eq!(cement.rate, None);
        assert_eq!(cement.total_value, None);
    }

    #[test]
    fn test_table_lookup_is_accent_insensitive() {
        let table = sample_table();
        assert!(table.lookup(FloorClass::Foundation, "concrète").is_some());
        assert!(table.lookup(FloorClass::OtherFloor, " FLOORING ").is_some());
        assert!(table.lookup(FloorClass::Foundation, "Flooring").is_none());
    }

    #[test]
    fn test_table_json() {
        let json = r#"{
            "Foundation": {"Concrete": {
                "Cement": {"unit": "bag", "qty": 0.22},
                "Sand": {"unit": "cft", "qty": "volume_cuft * 0.42"}
            }}
        }"#;
        let table: MaterialTable = serde_json::from_str(json).unwrap();
        let concrete = table.lookup(FloorClass::Foundation, "Concrete").unwrap();
        assert_eq!(concrete.get("Cement").unwrap().qty, QtyRule::Multiplier(0.22));
        assert_eq!(
            concrete.get("Sand").unwrap().qty,
            QtyRule::Formula("volume_cuft * 0.42".to_string())
        );
    }
}
