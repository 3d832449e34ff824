//! # Rate Catalog
//!
//! Brands and unit rates per material, grouped into sections. Used by the
//! material aggregator for indicative row values and by the BOQ for brand
//! and rate resolution.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "Civil": [
//!     {
//!       "material": "Cement",
//!       "unit": "bag",
//!       "default_brand": "UltraTech",
//!       "brands": [
//!         { "brand_name": "UltraTech", "rate_per_unit": 410 },
//!         { "brand_name": "ACC", "rate_per_unit": 395 }
//!       ]
//!     }
//!   ]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::naming::{item_key, names_match};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBrand {
    #[serde(alias = "brand", alias = "brandName")]
    pub brand_name: String,
    #[serde(alias = "rate", alias = "ratePerUnit")]
    pub rate_per_unit: f64,
}

/// One material with its purchasable brands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub material: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, alias = "defaultBrand", skip_serializing_if = "Option::is_none")]
    pub default_brand: Option<String>,
    #[serde(default)]
    pub brands: Vec<CatalogBrand>,
}

impl CatalogEntry {
    pub fn brand(&self, name: &str) -> Option<&CatalogBrand> {
        self.brands.iter().find(|b| names_match(&b.brand_name, name))
    }

    /// The brand used when the user hasn't picked one: the listed default,
    /// else the first brand.
    pub fn effective_default(&self) -> Option<&CatalogBrand> {
        self.default_brand
            .as_deref()
            .and_then(|name| self.brand(name))
            .or_else(|| self.brands.first())
    }

    pub fn brand_names(&self) -> Vec<String> {
        self.brands.iter().map(|b| b.brand_name.clone()).collect()
    }
}

/// Section name -> entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateCatalog {
    pub sections: IndexMap<String, Vec<CatalogEntry>>,
}

impl RateCatalog {
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.sections.iter().flat_map(|(_, entries)| entries.iter())
    }

    /// Entry for a material in a unit, falling back to a name-only match.
    pub fn find(&self, material: &str, unit: &str) -> Option<&CatalogEntry> {
        let key = item_key(material, unit);
        self.entries()
            .find(|e| item_key(&e.material, &e.unit) == key)
            .or_else(|| self.find_material(material))
    }

    /// First entry whose material name matches, whatever its unit.
    pub fn find_material(&self, material: &str) -> Option<&CatalogEntry> {
        self.entries().find(|e| names_match(&e.material, material))
    }

    /// Default-brand rate for a material.
    pub fn default_rate(&self, material: &str) -> Option<f64> {
        self.find_material(material)
            .and_then(|e| e.effective_default())
            .map(|b| b.rate_per_unit)
    }
}
