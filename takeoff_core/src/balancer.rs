//! Basement backfill balancing.
//!
//! After the calculator runs, the Foundation floor's `Backfilling` volume is
//! replaced by what is left of the excavation once the basement's concrete
//! is in place:
//!
//! ```text
//! backfill = excavation - (slab + wall + beams + columns)
//! ```
//!
//! The inputs are found by the strategy their component key selects, so any
//! accepted spelling of a reserved key (`BasementBeam`, `BasementBeams`, ...)
//! takes part. A negative or non-finite balance becomes 0. When any of the
//! five inputs is missing or unavailable, `Backfilling` keeps the value its
//! own rule produced.

use crate::calculator::ComponentStrategy;
use crate::components::ComponentResult;
use crate::quantity::Quantity;

pub const BACKFILLING: &str = "Backfilling";

/// Strategies whose concrete volume is subtracted from the excavation.
pub const BASEMENT_STRUCTURE: [ComponentStrategy; 4] = [
    ComponentStrategy::BasementSlab,
    ComponentStrategy::BasementWall,
    ComponentStrategy::BasementBeamGrid,
    ComponentStrategy::BasementColumnGrid,
];

fn foundation_volume(results: &[ComponentResult], strategy: ComponentStrategy) -> Option<f64> {
    results
        .iter()
        .find(|r| r.floor_index == 0 && ComponentStrategy::for_key(&r.component) == strategy)
        .and_then(|r| r.volume_cuft.value())
}

/// Backfill balance, or `None` when an input is missing.
pub fn backfill_volume(results: &[ComponentResult]) -> Option<f64> {
    let excavation = foundation_volume(results, ComponentStrategy::ExcavationPercentage)?;
    let mut structure = 0.0;
    for strategy in BASEMENT_STRUCTURE {
        structure += foundation_volume(results, strategy)?;
    }
    let balance = excavation - structure;
    if !balance.is_finite() || balance < 0.0 {
        log::warn!(
            "backfill balance {:.2} (excavation {:.2} - structure {:.2}) clamped to 0",
            balance,
            excavation,
            structure
        );
        return Some(0.0);
    }
    Some(balance)
}

/// Overwrite the Foundation `Backfilling` volume with the balance.
///
/// Returns true when a result was rewritten.
pub fn balance_basement(results: &mut [ComponentResult]) -> bool {
    let Some(balance) = backfill_volume(results) else {
        log::debug!("backfill not balanced: basement inputs incomplete");
        return false;
    };
    let Some(backfill) = results
        .iter_mut()
        .find(|r| r.floor_index == 0 && r.is(BACKFILLING))
    else {
        return false;
    };

    backfill.volume_cuft = Quantity::Value(balance);
    backfill.logic = format!("excavation less basement concrete = {:.2} cu ft", balance);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(floor_index: usize, component: &str, volume: Quantity) -> ComponentResult {
        ComponentResult {
            floor: crate::floors::floor_label(floor_index),
            floor_index,
            component: component.to_string(),
            category: "Earthwork".to_string(),
            area: volume,
            volume_cuft: volume,
            logic: String::new(),
        }
    }

    fn basement(slab: f64) -> Vec<ComponentResult> {
        vec![
            result(0, "ExcavationVolume", Quantity::Value(10000.0)),
            result(0, "BasementSlab", Quantity::Value(slab)),
            result(0, "BasementWallVolume", Quantity::Value(1500.0)),
            result(0, "BasementBeam", Quantity::Value(300.0)),
            result(0, "Basementcolumns", Quantity::Value(200.0)),
            result(0, "Backfilling", Quantity::Value(123.0)),
        ]
    }

    #[test]
    fn test_backfill_balance() {
        let mut results = basement(2000.0);
        assert!(balance_basement(&mut results));
        let backfill = results.iter().find(|r| r.is("Backfilling")).unwrap();
        assert_eq!(backfill.volume_cuft, Quantity::Value(6000.0));
    }

    #[test]
    fn test_key_spellings_are_balanced() {
        let mut results = basement(2000.0);
        results[3].component = "BasementBeams".to_string();
        results[4].component = "basement_columns".to_string();
        results[0].component = "Excavation Volume".to_string();
        assert!(balance_basement(&mut results));
        assert_eq!(results[5].volume_cuft, Quantity::Value(6000.0));
    }

    #[test]
    fn test_backfill_clamped() {
        let mut results = basement(9000.0);
        assert!(balance_basement(&mut results));
        let backfill = results.iter().find(|r| r.is("Backfilling")).unwrap();
        assert_eq!(backfill.volume_cuft, Quantity::Value(0.0));
    }

    #[test]
    fn test_missing_input_leaves_backfill() {
        let mut results = basement(2000.0);
        results.retain(|r| !r.is("BasementBeam"));
        assert!(!balance_basement(&mut results));
        let backfill = results.iter().find(|r| r.is("Backfilling")).unwrap();
        assert_eq!(backfill.volume_cuft, Quantity::Value(123.0));
    }

    #[test]
    fn test_unavailable_input_leaves_backfill() {
        let mut results = basement(2000.0);
        results[1].volume_cuft = Quantity::Unavailable;
        assert!(!balance_basement(&mut results));
        assert_eq!(results[5].volume_cuft, Quantity::Value(123.0));
    }

    #[test]
    fn test_only_foundation_floor() {
        let mut results = basement(2000.0);
        for r in results.iter_mut() {
            r.floor_index = 1;
        }
        assert!(!balance_basement(&mut results));
    }
}
