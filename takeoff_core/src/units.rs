//! # Unit Types
//!
//! Lightweight newtype wrappers for the units a takeoff works in. They
//! serialize as bare numbers so configuration JSON stays readable.
//!
//! ## Conventions
//!
//! - Plan dimensions, grid spacing, storey heights and thicknesses: feet (ft)
//! - Structural member cross-sections (beam/column width and depth): inches (in)
//! - Areas: square feet (sq ft)
//! - Volumes: cubic feet (cu ft)
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::units::{CuFt, Feet, Inches, SqFt};
//!
//! let beam_width: Feet = Inches(9.0).into();
//! assert_eq!(beam_width.0, 0.75);
//!
//! let face: SqFt = Feet(10.0) * Feet(3.0);
//! let volume: CuFt = face * Feet(0.5);
//! assert_eq!(volume.0, 15.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Length in feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feet(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

/// Area in square feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqFt(pub f64);

/// Volume in cubic feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CuFt(pub f64);

impl From<Inches> for Feet {
    fn from(inches: Inches) -> Self {
        Feet(inches.0 / 12.0)
    }
}

impl From<Feet> for Inches {
    fn from(ft: Feet) -> Self {
        Inches(ft.0 * 12.0)
    }
}

impl Mul for Feet {
    type Output = SqFt;
    fn mul(self, rhs: Feet) -> SqFt {
        SqFt(self.0 * rhs.0)
    }
}

impl Mul<Feet> for SqFt {
    type Output = CuFt;
    fn mul(self, rhs: Feet) -> CuFt {
        CuFt(self.0 * rhs.0)
    }
}

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// True when the value is a usable, strictly positive measurement
            pub fn is_positive(self) -> bool {
                self.0.is_finite() && self.0 > 0.0
            }
        }
    };
}

impl_arithmetic!(Feet);
impl_arithmetic!(Inches);
impl_arithmetic!(SqFt);
impl_arithmetic!(CuFt);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches_to_feet() {
        let ft: Feet = Inches(18.0).into();
        assert_eq!(ft.0, 1.5);
        let back: Inches = ft.into();
        assert_eq!(back.0, 18.0);
    }

    #[test]
    fn test_dimensional_products() {
        let area = Feet(12.0) * Feet(10.0);
        assert_eq!(area, SqFt(120.0));
        assert_eq!(area * Feet(0.5), CuFt(60.0));
    }

    #[test]
    fn test_is_positive() {
        assert!(Feet(15.0).is_positive());
        assert!(!Feet(0.0).is_positive());
        assert!(!Feet(f64::NAN).is_positive());
    }

    #[test]
    fn test_serialization() {
        let ft = Feet(12.5);
        let json = serde_json::to_string(&ft).unwrap();
        assert_eq!(json, "12.5");
        let roundtrip: Feet = serde_json::from_str(&json).unwrap();
        assert_eq!(ft, roundtrip);
    }
}
