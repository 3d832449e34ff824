//! Tunable constants of a takeoff pass.
//!
//! Every estimate embeds its settings so that a saved estimate reproduces
//! the same bill of quantities even if the defaults change later.

use serde::{Deserialize, Serialize};

use crate::errors::{TakeoffError, TakeoffResult};
use crate::units::Feet;

/// Most decimal places a quantity can be rounded to
pub const MAX_QUANTITY_DECIMALS: u32 = 12;

/// Takeoff settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeoffSettings {
    /// Wastage added to material rows without an override (percent)
    pub default_wastage_percent: f64,

    /// Fraction of gross internal wall area treated as shared between rooms
    pub shared_wall_reduction: f64,

    /// Grid spacing used when a floor's beam/column spacing is missing or zero
    pub default_grid_spacing_ft: Feet,

    /// Share of the plan area beams and columns are laid out over
    pub usable_footprint_factor: f64,

    /// Decimal places kept on material quantities and values
    pub quantity_decimals: u32,

    /// Currency code shown next to costs
    pub currency: String,
}

impl Default for TakeoffSettings {
    fn default() -> Self {
        TakeoffSettings {
            default_wastage_percent: 5.0,
            shared_wall_reduction: 0.20,
            default_grid_spacing_ft: Feet(15.0),
            usable_footprint_factor: 0.85,
            quantity_decimals: 2,
            currency: "INR".to_string(),
        }
    }
}

impl TakeoffSettings {
    /// Reject settings a pass can't run with.
    pub fn validate(&self) -> TakeoffResult<()> {
        let fraction = |field: &str, value: f64| {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(TakeoffError::invalid_input(field, value.to_string(), "Must be between 0 and 1"))
            }
        };

        if !self.default_wastage_percent.is_finite() || self.default_wastage_percent < 0.0 {
            return Err(TakeoffError::invalid_input(
                "default_wastage_percent",
                self.default_wastage_percent.to_string(),
                "Must be a non-negative number",
            ));
        }
        fraction("shared_wall_reduction", self.shared_wall_reduction)?;
        fraction("usable_footprint_factor", self.usable_footprint_factor)?;
        if !self.default_grid_spacing_ft.is_positive() {
            return Err(TakeoffError::invalid_input(
                "default_grid_spacing_ft",
                self.default_grid_spacing_ft.value().to_string(),
                "Grid spacing must be positive",
            ));
        }
        if self.quantity_decimals > MAX_QUANTITY_DECIMALS {
            return Err(TakeoffError::invalid_input(
                "quantity_decimals",
                self.quantity_decimals.to_string(),
                format!("At most {} decimal places", MAX_QUANTITY_DECIMALS),
            ));
        }
        Ok(())
    }

    /// `spacing` when usable, otherwise the default spacing.
    pub fn grid_spacing(&self, spacing: Feet) -> Feet {
        if spacing.is_positive() {
            spacing
        } else {
            self.default_grid_spacing_ft
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TakeoffSettings::default();
        assert_eq!(settings.default_wastage_percent, 5.0);
        assert_eq!(settings.grid_spacing(Feet(0.0)), Feet(15.0));
        assert_eq!(settings.grid_spacing(Feet(12.0)), Feet(12.0));
    }

    #[test]
    fn test_validate() {
        assert!(TakeoffSettings::default().validate().is_ok());

        let zero_spacing = TakeoffSettings {
            default_grid_spacing_ft: Feet(0.0),
            ..TakeoffSettings::default()
        };
        let err = zero_spacing.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("default_grid_spacing_ft"));

        let factor = TakeoffSettings {
            usable_footprint_factor: 1.5,
            ..TakeoffSettings::default()
        };
        assert!(factor.validate().is_err());

        let shared = TakeoffSettings {
            shared_wall_reduction: f64::NAN,
            ..TakeoffSettings::default()
        };
        assert!(shared.validate().is_err());

        let decimals = TakeoffSettings {
            quantity_decimals: 40,
            ..TakeoffSettings::default()
        };
        assert!(decimals.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: TakeoffSettings =
            serde_json::from_str(r#"{"default_wastage_percent": 3}"#).unwrap();
        assert_eq!(settings.default_wastage_percent, 3.0);
        assert_eq!(settings.usable_footprint_factor, 0.85);
        assert_eq!(settings.currency, "INR");
    }
}
