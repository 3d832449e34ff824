//! # Floor Indexing
//!
//! The one place that knows how floors are numbered, labelled and bucketed.
//! Both component applicability and material-table lookup go through here.
//!
//! ```text
//! index 0 -> "Foundation"     class Foundation
//! index 1 -> "Ground Floor"   class GroundFloor
//! index 2 -> "1st Floor"      class OtherFloor
//! index 3 -> "2nd Floor"      class OtherFloor
//! index n -> "{n-1}th Floor"  class OtherFloor
//! ```
//!
//! ## Applicability tags
//!
//! | Tag            | Applies when                          |
//! |----------------|---------------------------------------|
//! | `foundation`   | index == 0                            |
//! | `groundfloor`  | index == 1                            |
//! | `topfloor`     | index == last index                   |
//! | `middlefloors` | 1 < index < last index                |
//! | `allfloors`    | always                                |
//! | a floor label  | tag equals the floor's label          |
//!
//! Tags and labels compare case-, space- and period-insensitively.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::floors::{is_applicable, Floor, FloorClass};
//!
//! let floor = Floor::new(3);
//! assert_eq!(floor.label, "2nd Floor");
//! assert_eq!(floor.class(), FloorClass::OtherFloor);
//!
//! let tags = vec!["Top Floor".to_string()];
//! assert!(is_applicable(Some(tags.as_slice()), 3, 3));
//! assert!(!is_applicable(Some(tags.as_slice()), 2, 3));
//! ```

use std::fmt;

use deunicode::deunicode;
use serde::{Deserialize, Serialize};

/// Label of floor index 0
pub const FOUNDATION: &str = "Foundation";
/// Label of floor index 1
pub const GROUND_FLOOR: &str = "Ground Floor";
/// Structural config label shared by every floor above ground
pub const OTHER_FLOORS: &str = "Other Floors";

/// One floor of the building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub index: usize,
    pub label: String,
}

impl Floor {
    pub fn new(index: usize) -> Self {
        Floor {
            index,
            label: floor_label(index),
        }
    }

    pub fn class(&self) -> FloorClass {
        FloorClass::of_index(self.index)
    }
}

/// Every floor of a building with `storeys` storeys above the foundation
/// (ground floor included), in index order.
pub fn building_floors(storeys: u32) -> Vec<Floor> {
    (0..=storeys as usize).map(Floor::new).collect()
}

/// English ordinal suffix: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st...
pub fn ordinal_suffix(n: usize) -> &'static str {
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Display label for a floor index.
pub fn floor_label(index: usize) -> String {
    match index {
        0 => FOUNDATION.to_string(),
        1 => GROUND_FLOOR.to_string(),
        n => {
            let k = n - 1;
            format!("{}{} Floor", k, ordinal_suffix(k))
        }
    }
}

/// Normalize a floor label or tag for comparison.
pub fn normalize_label(label: &str) -> String {
    deunicode(label)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case-, space- and period-insensitive label equality.
pub fn labels_match(a: &str, b: &str) -> bool {
    normalize_label(a) == normalize_label(b)
}

/// Coarse floor bucket used to pick material tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FloorClass {
    Foundation,
    GroundFloor,
    #[serde(rename = "Other Floor")]
    OtherFloor,
}

impl FloorClass {
    pub fn of_index(index: usize) -> Self {
        match index {
            0 => FloorClass::Foundation,
            1 => FloorClass::GroundFloor,
            _ => FloorClass::OtherFloor,
        }
    }

    /// Classify a free-form floor label ("Ground Floor", "groundfloor", "3rd Floor").
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "foundation" => FloorClass::Foundation,
            "groundfloor" | "ground" => FloorClass::GroundFloor,
            _ => FloorClass::OtherFloor,
        }
    }

    /// Key used by material tables.
    pub fn table_key(&self) -> &'static str {
        match self {
            FloorClass::Foundation => "Foundation",
            FloorClass::GroundFloor => "GroundFloor",
            FloorClass::OtherFloor => "Other Floor",
        }
    }

    /// Whether a material-table key names this class. "Other Floors" and
    /// "OtherFloor" are accepted for the upper-floor bucket.
    pub fn matches_key(&self, key: &str) -> bool {
        let key = normalize_label(key);
        match self {
            FloorClass::Foundation => key == "foundation",
            FloorClass::GroundFloor => key == "groundfloor",
            FloorClass::OtherFloor => key == "otherfloor" || key == "otherfloors",
        }
    }
}

impl fmt::Display for FloorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_key())
    }
}

/// Decide whether a component tagged with `tags` applies to floor `index`
/// of a building whose top floor is `last_index`.
///
/// `None` means the component carries no applicability field and applies
/// everywhere. An explicit empty list applies nowhere.
pub fn is_applicable(tags: Option<&[String]>, index: usize, last_index: usize) -> bool {
    let Some(tags) = tags else {
        return true;
    };
    let label = normalize_label(&floor_label(index));
    tags.iter().any(|tag| {
        let tag = normalize_label(tag);
        match tag.as_str() {
            "foundation" => index == 0,
            "groundfloor" => index == 1,
            "topfloor" => index == last_index,
            "middlefloors" => index > 1 && index < last_index,
            "allfloors" => true,
            _ => tag == label,
        }
    })
}
