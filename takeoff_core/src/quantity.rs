//! # Quantity Sentinel
//!
//! A computed area or volume is either a number or *unavailable* (`-`), the
//! marker used when a formula fails or the structural config a component
//! needs is missing. Unavailable values are displayed as `-` and contribute
//! zero wherever downstream arithmetic needs a number.
//!
//! ## JSON
//!
//! ```json
//! { "area": 1200.0, "volume_cuft": "-" }
//! ```

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Marker string for an unavailable quantity
pub const UNAVAILABLE: &str = "-";

/// A numeric result that may be unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Quantity {
    /// A finite computed value
    Value(f64),
    /// Formula failure or missing config
    #[default]
    Unavailable,
}

impl Quantity {
    /// Wrap a raw number, mapping NaN and infinities to `Unavailable`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Quantity::Value(value)
        } else {
            Quantity::Unavailable
        }
    }

    /// The numeric value, if available
    pub fn value(self) -> Option<f64> {
        match self {
            Quantity::Value(v) => Some(v),
            Quantity::Unavailable => None,
        }
    }

    /// The numeric value, with unavailable treated as zero
    pub fn or_zero(self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    pub fn is_available(self) -> bool {
        matches!(self, Quantity::Value(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Quantity::Value(v) => Quantity::from_f64(f(v)),
            Quantity::Unavailable => Quantity::Unavailable,
        }
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Quantity::from_f64(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Value(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            Quantity::Unavailable => f.pad(UNAVAILABLE),
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Quantity::Value(v) => serializer.serialize_f64(*v),
            Quantity::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or \"-\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
        Ok(Quantity::from_f64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        Ok(Quantity::Value(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        Ok(Quantity::Value(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        if v.trim() == UNAVAILABLE {
            return Ok(Quantity::Unavailable);
        }
        v.trim()
            .parse::<f64>()
            .map(Quantity::from_f64)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Quantity, E> {
        Ok(Quantity::Unavailable)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
