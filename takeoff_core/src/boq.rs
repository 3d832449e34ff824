//! # Bill of Quantities
//!
//! Consolidates civil material rows and finishing items into one priced list.
//!
//! - Civil rows are summed across floors per (material, unit) into a single
//!   "Civil Works" category. Material names compare case-insensitively and
//!   units are compared in singular form, so "Bags" and "bag" merge.
//! - Finishing items keep their own categories and merge the same way.
//! - Each item gets a brand (the user's choice, else the catalog default)
//!   and a rate (a manual rate, else the brand's catalog rate). A chosen
//!   brand the catalog doesn't list leaves the rate unset.
//! - `cost = round(rate × round(qty))`. Items without a rate have no cost.
//! - Subtotals sum costs per category; the grand total sums subtotals.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::boq::{consolidate, CIVIL_WORKS};
//! use takeoff_core::catalog::RateCatalog;
//! use takeoff_core::finishing::FinishingItem;
//! use takeoff_core::overrides::Overrides;
//! use takeoff_core::settings::TakeoffSettings;
//!
//! let finishing = vec![FinishingItem {
//!     material: "Door Handle".into(),
//!     unit: "nos".into(),
//!     category: "Fittings".into(),
//!     total_qty: 12.0,
//!     manual_qty: None,
//! }];
//! let report = consolidate(&[], &finishing, &RateCatalog::default(), &Overrides::default(), &TakeoffSettings::default());
//! assert_eq!(report.groups.len(), 1);
//! assert!(report.group(CIVIL_WORKS).is_none());
//! assert_eq!(report.grand_total, 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::RateCatalog;
use crate::finishing::FinishingItem;
use crate::materials::MaterialRow;
use crate::naming::{item_key, names_match, normalize_name};
use crate::overrides::{BoqKey, Overrides};
use crate::quantity::round_to;
use crate::settings::TakeoffSettings;

/// Category every civil material row is consolidated into
pub const CIVIL_WORKS: &str = "Civil Works";

/// One priced BOQ line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoqItem {
    pub category: String,
    pub material: String,
    pub unit: String,
    pub total_qty: f64,
    pub selected_brand: Option<String>,
    pub available_brands: Vec<String>,
    pub rate_per_unit: Option<f64>,
    /// Rate was typed by the user rather than taken from the catalog
    pub rate_is_manual: bool,
    pub cost: Option<f64>,
}

impl BoqItem {
    pub fn key(&self) -> BoqKey {
        BoqKey::new(&self.category, &self.material)
    }

    fn matches_text(&self, needle: &str) -> bool {
        [Some(&self.material), Some(&self.category), self.selected_brand.as_ref()]
            .into_iter()
            .flatten()
            .any(|field| normalize_name(field).contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoqGroup {
    pub category: String,
    pub items: Vec<BoqItem>,
    pub subtotal: f64,
}

impl BoqGroup {
    fn new(category: String, items: Vec<BoqItem>) -> Self {
        let subtotal = items.iter().filter_map(|i| i.cost).sum();
        BoqGroup {
            category,
            items,
            subtotal,
        }
    }
}

/// Grouped, priced bill of quantities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoqReport {
    pub groups: Vec<BoqGroup>,
    pub grand_total: f64,
}

impl BoqReport {
    fn from_groups(groups: Vec<BoqGroup>) -> Self {
        let grand_total = groups.iter().map(|g| g.subtotal).sum();
        BoqReport { groups, grand_total }
    }

    pub fn group(&self, category: &str) -> Option<&BoqGroup> {
        self.groups.iter().find(|g| names_match(&g.category, category))
    }

    pub fn items(&self) -> impl Iterator<Item = &BoqItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    /// Restrict to one category and/or items whose material, category or
    /// brand contains `text`. Totals are recomputed over what remains.
    pub fn filter(&self, category: Option<&str>, text: Option<&str>) -> BoqReport {
        let needle = text.map(normalize_name).filter(|t| !t.is_empty());
        let groups = self
            .groups
            .iter()
            .filter(|g| category.map_or(true, |c| names_match(&g.category, c)))
            .filter_map(|g| {
                let items: Vec<BoqItem> = g
                    .items
                    .iter()
                    .filter(|i| needle.as_deref().map_or(true, |n| i.matches_text(n)))
                    .cloned()
                    .collect();
                (!items.is_empty()).then(|| BoqGroup::new(g.category.clone(), items))
            })
            .collect();
        BoqReport::from_groups(groups)
    }
}

/// An item before pricing.
struct Line {
    category: String,
    material: String,
    unit: String,
    qty: f64,
}

/// Append `qty` to the line with the same category and (material, unit) key.
fn accumulate(lines: &mut Vec<Line>, category: &str, material: &str, unit: &str, qty: f64) {
    let key = item_key(material, unit);
    match lines
        .iter_mut()
        .find(|l| names_match(&l.category, category) && item_key(&l.material, &l.unit) == key)
    {
        Some(line) => line.qty += qty,
        None => lines.push(Line {
            category: category.to_string(),
            material: material.to_string(),
            unit: unit.to_string(),
            qty,
        }),
    }
}

/// Build the priced BOQ from civil rows and finishing items.
pub fn consolidate(
    rows: &[MaterialRow],
    finishing: &[FinishingItem],
    catalog: &RateCatalog,
    overrides: &Overrides,
    settings: &TakeoffSettings,
) -> BoqReport {
    let mut lines = Vec::new();
    for row in rows {
        accumulate(&mut lines, CIVIL_WORKS, &row.material, &row.unit, row.total_qty);
    }
    for item in finishing {
        accumulate(&mut lines, &item.category, &item.material, &item.unit, item.effective_qty());
    }

    let mut groups: Vec<(String, Vec<BoqItem>)> = Vec::new();
    for line in lines {
        let item = price(line, catalog, overrides, settings.quantity_decimals);
        match groups.iter_mut().find(|(c, _)| names_match(c, &item.category)) {
            Some((_, items)) => items.push(item),
            None => groups.push((item.category.clone(), vec![item])),
        }
    }

    let report = BoqReport::from_groups(
        groups
            .into_iter()
            .map(|(category, items)| BoqGroup::new(category, items))
            .collect(),
    );
    log::debug!(
        "boq: {} groups, {} items, grand total {:.2}",
        report.groups.len(),
        report.items().count(),
        report.grand_total
    );
    report
}

fn price(line: Line, catalog: &RateCatalog, overrides: &Overrides, decimals: u32) -> BoqItem {
    let selection = overrides.boq_selection(&BoqKey::new(&line.category, &line.material));
    let chosen = selection.and_then(|s| s.brand.as_deref());
    let manual_rate = selection.and_then(|s| s.manual_rate);

    let entry = catalog.find(&line.material, &line.unit);
    let brand = match (entry, chosen) {
        (None, _) => {
            log::warn!("no catalog entry for {} ({})", line.material, line.unit);
            None
        }
        // A chosen brand the catalog doesn't list has no rate of its own.
        (Some(entry), Some(name)) => {
            let found = entry.brand(name);
            if found.is_none() {
                log::warn!("brand '{}' is not listed for {} ({})", name, line.material, line.unit);
            }
            found
        }
        (Some(entry), None) => entry.effective_default(),
    };

    let rate_per_unit = manual_rate.or_else(|| brand.map(|b| b.rate_per_unit));
    let total_qty = round_to(line.qty, decimals);
    let cost = rate_per_unit.map(|rate| (rate * total_qty.round()).round());

    BoqItem {
        category: line.category,
        material: line.material,
        unit: line.unit,
        total_qty,
        selected_brand: chosen
            .map(str::to_string)
            .or_else(|| brand.map(|b| b.brand_name.clone())),
        available_brands: entry.map(|e| e.brand_names()).unwrap_or_default(),
        rate_per_unit,
        rate_is_manual: manual_rate.is_some(),
        cost,
    }
}
