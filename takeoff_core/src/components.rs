//! # Component Definitions and Results
//!
//! A component is one structural or finishing line item (internal walls,
//! beams, PCC bed, plaster...) with a rule for its area. Definitions come
//! from configuration; results are produced once per (floor, applicable
//! component) by [`crate::calculator`].
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "PCC": {
//!     "formula": "buildup_area",
//!     "thickness": 0.33,
//!     "Applicable Floors": ["Foundation"],
//!     "Category": "Concrete"
//!   },
//!   "ExcavationVolume": {
//!     "percentage": 110,
//!     "thickness": 5,
//!     "Applicable Floors": ["Foundation"],
//!     "Category": "Earthwork"
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::floors::normalize_label;
use crate::quantity::Quantity;

/// One component rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentDefinition {
    /// Area formula (ignored by components with a built-in strategy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Percentage used by percentage-of-buildup rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,

    /// Thickness in feet; volume = area × thickness when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,

    /// Gate for `conditional_percentage_of_buildup`; applies when non-zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Floor-class tags; absent means every floor
    #[serde(
        rename = "Applicable Floors",
        alias = "applicable_floors",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub applicable_floors: Option<Vec<String>>,

    /// Material-aggregation key
    #[serde(rename = "Category", alias = "category", default)]
    pub category: String,
}

/// Accept `"Foundation"` as well as `["Foundation", "Ground Floor"]`.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(tag)) => Some(vec![tag]),
        Some(OneOrMany::Many(tags)) => Some(tags),
    })
}

impl ComponentDefinition {
    pub fn formula(formula: impl Into<String>, category: impl Into<String>) -> Self {
        ComponentDefinition {
            formula: Some(formula.into()),
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = Some(thickness);
        self
    }

    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn on_floors(mut self, tags: &[&str]) -> Self {
        self.applicable_floors = Some(tags.iter().map(|t| t.to_string()).collect());
        self
    }
}

/// Component definitions in authoring order.
pub type ComponentSet = IndexMap<String, ComponentDefinition>;

/// Canonical form of a component key for reserved-name matching.
pub fn normalize_key(key: &str) -> String {
    normalize_label(key)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// The computed area/volume of one component on one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub floor: String,
    pub floor_index: usize,
    pub component: String,
    pub category: String,
    /// Area in sq ft, or the full cu ft figure for grid-counted members
    pub area: Quantity,
    pub volume_cuft: Quantity,
    /// Human-readable account of how the figure was reached
    pub logic: String,
}

impl ComponentResult {
    /// Key comparison that ignores case, spaces and underscores.
    pub fn is(&self, key: &str) -> bool {
        normalize_key(&self.component) == normalize_key(key)
    }
}
