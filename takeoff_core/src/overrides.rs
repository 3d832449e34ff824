//! # User Overrides
//!
//! The only user-owned mutable state of an estimate: edited percentages,
//! per-row qty-per-unit and wastage, and BOQ brand/rate choices. Everything
//! else is recomputed from inputs on every pass, so overrides are addressed
//! by structured keys that stay stable across recomputation.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::overrides::{BoqKey, MaterialKey, Overrides};
//!
//! let mut overrides = Overrides::default();
//! let key = MaterialKey::new("Concrete", "Cement", "Ground Floor");
//! overrides.set_wastage(key.clone(), 7.5);
//! assert_eq!(overrides.material(&key).wastage_percent, Some(7.5));
//!
//! // Keys compare case-insensitively
//! let same = MaterialKey::new("concrete", "CEMENT", "ground floor");
//! assert_eq!(overrides.material(&same).wastage_percent, Some(7.5));
//!
//! overrides.select_brand(BoqKey::new("Civil Works", "Cement"), "UltraTech");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::normalize_key;
use crate::naming::normalize_name;

/// Identifies one aggregated material row: (category, material, floor).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialKey {
    category: String,
    material: String,
    floor: String,
}

impl MaterialKey {
    pub fn new(category: &str, material: &str, floor: &str) -> Self {
        MaterialKey {
            category: normalize_name(category),
            material: normalize_name(material),
            floor: normalize_name(floor),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn floor(&self) -> &str {
        &self.floor
    }
}

/// Identifies one BOQ row: (category, material).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoqKey {
    category: String,
    material: String,
}

impl BoqKey {
    pub fn new(category: &str, material: &str) -> Self {
        BoqKey {
            category: normalize_name(category),
            material: normalize_name(material),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn material(&self) -> &str {
        &self.material
    }
}

/// User edits to one material row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialOverride {
    /// Replaces the configured multiplier or formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty_per_unit: Option<f64>,
    /// Replaces the default wastage percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wastage_percent: Option<f64>,
}

impl MaterialOverride {
    pub fn is_empty(&self) -> bool {
        self.qty_per_unit.is_none() && self.wastage_percent.is_none()
    }
}

/// User choices for one BOQ row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoqSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// A rate typed by hand; wins over any catalog rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_rate: Option<f64>,
}

/// All user overrides of an estimate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Overrides {
    /// Component key (normalized) -> percentage
    #[serde(default)]
    percentages: BTreeMap<String, f64>,

    #[serde(default, with = "entries")]
    materials: BTreeMap<MaterialKey, MaterialOverride>,

    #[serde(default, with = "entries")]
    boq: BTreeMap<BoqKey, BoqSelection>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.percentages.is_empty() && self.materials.is_empty() && self.boq.is_empty()
    }

    // --- component percentages ---

    pub fn set_percentage(&mut self, component: &str, percentage: f64) {
        self.percentages.insert(normalize_key(component), percentage);
    }

    pub fn clear_percentage(&mut self, component: &str) {
        self.percentages.remove(&normalize_key(component));
    }

    pub fn percentage(&self, component: &str) -> Option<f64> {
        self.percentages.get(&normalize_key(component)).copied()
    }

    // --- material rows ---

    pub fn set_qty_per_unit(&mut self, key: MaterialKey, qty_per_unit: f64) {
        self.materials.entry(key).or_default().qty_per_unit = Some(qty_per_unit);
    }

    pub fn set_wastage(&mut self, key: MaterialKey, wastage_percent: f64) {
        self.materials.entry(key).or_default().wastage_percent = Some(wastage_percent);
    }

    pub fn clear_material_override(&mut self, key: &MaterialKey) {
        self.materials.remove(key);
    }

    /// Overrides for a row (empty when the user never touched it).
    pub fn material(&self, key: &MaterialKey) -> MaterialOverride {
        self.materials.get(key).copied().unwrap_or_default()
    }

    // --- BOQ rows ---

    /// Choose a brand. The rate follows the brand unless a manual rate is set.
    pub fn select_brand(&mut self, key: BoqKey, brand: impl Into<String>) {
        self.boq.entry(key).or_default().brand = Some(brand.into());
    }

    pub fn set_rate(&mut self, key: BoqKey, rate: f64) {
        self.boq.entry(key).or_default().manual_rate = Some(rate);
    }

    /// Drop a manual rate so the catalog rate applies again.
    pub fn clear_rate(&mut self, key: &BoqKey) {
        if let Some(selection) = self.boq.get_mut(key) {
            selection.manual_rate = None;
            if selection.brand.is_none() {
                self.boq.remove(key);
            }
        }
    }

    pub fn boq_selection(&self, key: &BoqKey) -> Option<&BoqSelection> {
        self.boq.get(key)
    }
}

/// Serialize structured-key maps as `[{ "key": ..., "value": ... }]`.
mod entries {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Entry<K, V> {
        key: K,
        value: V,
    }

    pub fn serialize<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
        V: Serialize,
    {
        serializer.collect_seq(map.iter().map(|(key, value)| Entry { key, value }))
    }

    pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
    {
        let entries = Vec::<Entry<K, V>>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.key, e.value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_do_not_collide() {
        // "a_b" + "c" and "a" + "b_c" collide when keys are joined with '_'
        let first = MaterialKey::new("a_b", "c", "Ground Floor");
        let second = MaterialKey::new("a", "b_c", "Ground Floor");
        assert_ne!(first, second);

        let mut overrides = Overrides::default();
        overrides.set_wastage(first.clone(), 10.0);
        assert_eq!(overrides.material(&second).wastage_percent, None);
    }

    #[test]
    fn test_percentage_override_key_normalized() {
        let mut overrides = Overrides::default();
        overrides.set_percentage("ExcavationVolume", 120.0);
        assert_eq!(overrides.percentage("excavation_volume"), Some(120.0));
        overrides.clear_percentage("Excavation Volume");
        assert_eq!(overrides.percentage("ExcavationVolume"), None);
    }

    #[test]
    fn test_brand_then_rate() {
        let mut overrides = Overrides::default();
        let key = BoqKey::new("Civil Works", "Cement");
        overrides.select_brand(key.clone(), "ACC");
        overrides.set_rate(key.clone(), 420.0);
        let sel = overrides.boq_selection(&key).unwrap();
        assert_eq!(sel.brand.as_deref(), Some("ACC"));
        assert_eq!(sel.manual_rate, Some(420.0));

        overrides.clear_rate(&key);
        let sel = overrides.boq_selection(&key).unwrap();
        assert_eq!(sel.manual_rate, None);
        assert_eq!(sel.brand.as_deref(), Some("ACC"));
    }

    #[test]
    fn test_clear_rate_without_brand_removes_row() {
        let mut overrides = Overrides::default();
        let key = BoqKey::new("Civil Works", "Sand");
        overrides.set_rate(key.clone(), 60.0);
        overrides.clear_rate(&key);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut overrides = Overrides::default();
        overrides.set_qty_per_unit(MaterialKey::new("Concrete", "Cement", "Foundation"), 7.0);
        overrides.select_brand(BoqKey::new("Civil Works", "Cement"), "ACC");
        overrides.set_percentage("BasementSlab", 95.0);

        let json = serde_json::to_string(&overrides).unwrap();
        let roundtrip: Overrides = serde_json::from_str(&json).unwrap();
        assert_eq!(overrides, roundtrip);
    }
}
