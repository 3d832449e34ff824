//! # Room Layout
//!
//! Per-floor residential layout: each floor holds one or more unit types
//! (1BHK, 2BHK, ...) and each unit type lists its rooms with dimensions and
//! openings. The layout only feeds the internal-wall takeoff.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "Ground Floor": {
//!     "2BHK": {
//!       "count": 2,
//!       "rooms": {
//!         "Bedroom": {
//!           "Count": 2, "Length (ft)": 12, "Width (ft)": 10,
//!           "Door": { "count": 1, "width": 3, "height": 7 },
//!           "Window": { "count": 1, "width": 4, "height": 4 }
//!         },
//!         "Balcony": { "Count": 1, "Length (ft)": 8, "Width (ft)": 4 }
//!       }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::floors::{labels_match, normalize_label, Floor};
use crate::units::{Feet, SqFt};

/// A door or window type in a room.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Opening {
    #[serde(default, alias = "Count")]
    pub count: f64,
    #[serde(default, alias = "width", alias = "Width", alias = "Width (ft)")]
    pub width_ft: f64,
    #[serde(default, alias = "height", alias = "Height", alias = "Height (ft)")]
    pub height_ft: f64,
}

impl Opening {
    /// count × width × height, never negative
    pub fn area(&self) -> SqFt {
        SqFt((self.count * self.width_ft * self.height_ft).max(0.0))
    }
}

/// One room type within a unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoomSpec {
    #[serde(rename = "Count", alias = "count", default = "one")]
    pub count: f64,
    #[serde(rename = "Length (ft)", alias = "length", default)]
    pub length_ft: f64,
    #[serde(rename = "Width (ft)", alias = "width", default)]
    pub width_ft: f64,
    #[serde(rename = "Door", alias = "door", default)]
    pub door: Opening,
    #[serde(rename = "Window", alias = "window", default)]
    pub window: Opening,
}

fn one() -> f64 {
    1.0
}

impl RoomSpec {
    pub fn perimeter(&self) -> Feet {
        Feet(2.0 * (self.length_ft + self.width_ft))
    }

    /// Combined door and window area of this room entry
    pub fn opening_area(&self) -> SqFt {
        self.door.area() + self.window.area()
    }
}

/// One unit type (BHK configuration) on a floor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitLayout {
    /// How many units of this type the floor holds
    #[serde(default = "one", alias = "Count", alias = "unit_count")]
    pub count: f64,
    #[serde(default)]
    pub rooms: BTreeMap<String, RoomSpec>,
}

/// Returns true for rooms whose walls are not counted (open balconies).
pub fn is_balcony(room_name: &str) -> bool {
    normalize_label(room_name).contains("balcony")
}

/// Unit types on one floor, keyed by BHK label.
pub type FloorLayout = BTreeMap<String, UnitLayout>;

/// Room layout for every floor, keyed by floor label.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomLayout {
    pub floors: BTreeMap<String, FloorLayout>,
}

impl RoomLayout {
    /// Layout entered for a floor, if any.
    pub fn for_floor(&self, floor: &Floor) -> Option<&FloorLayout> {
        self.floors
            .iter()
            .find(|(label, _)| labels_match(label, &floor.label))
            .map(|(_, layout)| layout)
    }

    /// Total room count across the building (room count × unit count).
    pub fn room_count(&self) -> f64 {
        self.units().map(|u| u.rooms.values().map(|r| r.count).sum::<f64>() * u.count).sum()
    }

    /// Total door count across the building.
    pub fn door_count(&self) -> f64 {
        self.units()
            .map(|u| u.rooms.values().map(|r| r.door.count).sum::<f64>() * u.count)
            .sum()
    }

    /// Total window count across the building.
    pub fn window_count(&self) -> f64 {
        self.units()
            .map(|u| u.rooms.values().map(|r| r.window.count).sum::<f64>() * u.count)
            .sum()
    }

    fn units(&self) -> impl Iterator<Item = &UnitLayout> {
        self.floors.values().flat_map(|f| f.values())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn room(count: f64, length: f64, width: f64, doors: f64, windows: f64) -> RoomSpec {
        RoomSpec {
            count,
            length_ft: length,
            width_ft: width,
            door: Opening { count: doors, width_ft: 3.0, height_ft: 7.0 },
            window: Opening { count: windows, width_ft: 4.0, height_ft: 4.0 },
        }
    }

    pub(crate) fn two_bhk(count: f64) -> UnitLayout {
        let mut rooms = BTreeMap::new();
        rooms.insert("Bedroom".to_string(), room(2.0, 12.0, 10.0, 1.0, 1.0));
        rooms.insert("Hall".to_string(), room(1.0, 15.0, 12.0, 1.0, 2.0));
        rooms.insert("Balcony".to_string(), room(1.0, 8.0, 4.0, 0.0, 0.0));
        UnitLayout { count, rooms }
    }

    #[test]
    fn test_room_geometry() {
        let r = room(1.0, 12.0, 10.0, 1.0, 2.0);
        assert_eq!(r.perimeter(), Feet(44.0));
        assert_eq!(r.opening_area(), SqFt(21.0 + 32.0));
    }

    #[test]
    fn test_balcony_detection() {
        assert!(is_balcony("Balcony"));
        assert!(is_balcony("Utility balcony 2"));
        assert!(!is_balcony("Bedroom"));
    }

    #[test]
    fn test_display_name_json() {
        let json = r#"{
            "Ground Floor": {
                "1BHK": {
                    "count": 3,
                    "rooms": {
                        "Kitchen": { "Count": 1, "Length (ft)": 10, "Width (ft)": 8,
                                     "Door": { "count": 1, "width": 3, "height": 7 } }
                    }
                }
            }
        }"#;
        let layout: RoomLayout = serde_json::from_str(json).unwrap();
        let floor = layout.for_floor(&Floor::new(1)).unwrap();
        let unit = &floor["1BHK"];
        assert_eq!(unit.count, 3.0);
        assert_eq!(unit.rooms["Kitchen"].door.area(), SqFt(21.0));
        assert_eq!(unit.rooms["Kitchen"].window, Opening::default());
    }

    #[test]
    fn test_building_counts() {
        let mut layout = RoomLayout::default();
        let mut floor = FloorLayout::new();
        floor.insert("2BHK".into(), two_bhk(2.0));
        layout.floors.insert("Ground Floor".into(), floor);
        // rooms per unit: 2 + 1 + 1 = 4, two units
        assert_eq!(layout.room_count(), 8.0);
        // doors per unit: 1 + 1 + 0
        assert_eq!(layout.door_count(), 4.0);
        assert_eq!(layout.window_count(), 6.0);
    }
}
