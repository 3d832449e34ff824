//! # Estimate Data Structures
//!
//! An [`Estimate`] is the root container: every external input of a takeoff
//! plus the settings and user overrides that shape it. Estimates serialize
//! to `.takeoff.json` files (see [`crate::file_io`]).
//!
//! ## Structure
//!
//! ```text
//! Estimate
//! ├── meta: EstimateMetadata (version, id, name, timestamps)
//! ├── settings: TakeoffSettings
//! ├── inputs: EstimateInputs
//! │   ├── parameters, structure, components, layout
//! │   ├── materials, catalog
//! │   └── finishing, finishing_rules
//! └── overrides: Overrides
//! ```
//!
//! ## Pipeline
//!
//! [`run_takeoff`] is a pure function of inputs, settings and overrides:
//!
//! ```text
//! components -> basement balance -> material rows -> finishing -> BOQ
//! ```
//!
//! Running it twice on the same estimate gives identical reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::balancer::balance_basement;
use crate::boq::{consolidate, BoqReport};
use crate::calculator::{Calculator, CONDITIONAL_PERCENTAGE_OF_BUILDUP, PERCENTAGE_OF_BUILDUP};
use crate::catalog::RateCatalog;
use crate::components::{ComponentResult, ComponentSet};
use crate::errors::{TakeoffError, TakeoffResult};
use crate::expression::parser::parse;
use crate::finishing::{evaluate_rules, FinishingItem, FinishingRule, SummaryContext};
use crate::layout::RoomLayout;
use crate::materials::{MaterialAggregator, MaterialRow, MaterialTable, QtyRule};
use crate::overrides::Overrides;
use crate::parameters::BuildingParameters;
use crate::settings::TakeoffSettings;
use crate::structure::StructuralConfig;

/// Current schema version for estimate files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Estimate metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub id: Uuid,
    pub name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Everything a takeoff pass reads, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateInputs {
    pub parameters: BuildingParameters,
    #[serde(default)]
    pub structure: StructuralConfig,
    #[serde(default)]
    pub components: ComponentSet,
    #[serde(default)]
    pub layout: RoomLayout,
    #[serde(default)]
    pub materials: MaterialTable,
    #[serde(default)]
    pub catalog: RateCatalog,
    /// Finishing items with precomputed quantities
    #[serde(default)]
    pub finishing: Vec<FinishingItem>,
    /// Finishing items computed from the takeoff summary
    #[serde(default)]
    pub finishing_rules: Vec<FinishingRule>,
}

impl EstimateInputs {
    pub fn new(parameters: BuildingParameters) -> Self {
        EstimateInputs {
            parameters,
            structure: StructuralConfig::default(),
            components: ComponentSet::new(),
            layout: RoomLayout::default(),
            materials: MaterialTable::default(),
            catalog: RateCatalog::default(),
            finishing: Vec::new(),
            finishing_rules: Vec::new(),
        }
    }

    /// Syntax-check every formula in the configuration.
    ///
    /// Variables aren't resolved here since most are bound per floor; this
    /// only catches formulas that could never evaluate.
    pub fn check_formulas(&self) -> Vec<TakeoffError> {
        let mut formulas: Vec<&str> = Vec::new();

        for (_, def) in self.components.iter() {
            if let Some(formula) = def.formula.as_deref() {
                let keyword = formula.trim().eq_ignore_ascii_case(PERCENTAGE_OF_BUILDUP)
                    || formula.trim().eq_ignore_ascii_case(CONDITIONAL_PERCENTAGE_OF_BUILDUP);
                if !keyword && !formula.trim().is_empty() {
                    formulas.push(formula);
                }
            }
            if let Some(condition) = def.condition.as_deref() {
                formulas.push(condition);
            }
        }
        for (_, categories) in self.materials.classes.iter() {
            for (_, materials) in categories.iter() {
                for (_, spec) in materials.iter() {
                    if let QtyRule::Formula(formula) = &spec.qty {
                        formulas.push(formula);
                    }
                }
            }
        }
        formulas.extend(self.finishing_rules.iter().map(|r| r.formula.as_str()));

        formulas
            .into_iter()
            .filter_map(|formula| {
                parse(formula)
                    .err()
                    .map(|e| TakeoffError::formula(formula, e.to_string()))
            })
            .collect()
    }
}

/// Root estimate container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub meta: EstimateMetadata,
    #[serde(default)]
    pub settings: TakeoffSettings,
    pub inputs: EstimateInputs,
    #[serde(default)]
    pub overrides: Overrides,
}

impl Estimate {
    /// Create a new estimate with default settings and no overrides.
    ///
    /// # Example
    ///
    /// ```rust
    /// use takeoff_core::estimate::{Estimate, EstimateInputs, SCHEMA_VERSION};
    /// use takeoff_core::parameters::BuildingParameters;
    ///
    /// let params: BuildingParameters = serde_json::from_str(
    ///     r#"{"width": 40, "depth": 60, "floorCount": 2, "perimeter": 200}"#,
    /// ).unwrap();
    /// let estimate = Estimate::new("Plot 14", EstimateInputs::new(params));
    /// assert_eq!(estimate.meta.version, SCHEMA_VERSION);
    /// ```
    pub fn new(name: impl Into<String>, inputs: EstimateInputs) -> Self {
        let now = Utc::now();
        Estimate {
            meta: EstimateMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                name: name.into(),
                created: now,
                modified: now,
            },
            settings: TakeoffSettings::default(),
            inputs,
            overrides: Overrides::default(),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Check the inputs a pass can't run without.
    pub fn validate(&self) -> TakeoffResult<()> {
        self.inputs.parameters.validate()?;
        self.settings.validate()?;
        if self.inputs.components.is_empty() {
            return Err(TakeoffError::missing_field("inputs.components"));
        }
        Ok(())
    }

    /// Validate, then run the full pipeline.
    pub fn calculate(&self) -> TakeoffResult<TakeoffReport> {
        self.validate()?;
        Ok(run_takeoff(&self.inputs, &self.settings, &self.overrides))
    }
}

/// Output of one takeoff pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TakeoffReport {
    pub components: Vec<ComponentResult>,
    pub materials: Vec<MaterialRow>,
    /// Finishing items as priced (supplied items plus evaluated rules)
    pub finishing: Vec<FinishingItem>,
    pub boq: BoqReport,
}

/// Run every stage of the takeoff.
pub fn run_takeoff(inputs: &EstimateInputs, settings: &TakeoffSettings, overrides: &Overrides) -> TakeoffReport {
    let params = &inputs.parameters;

    let mut components = Calculator {
        params,
        structure: &inputs.structure,
        layout: &inputs.layout,
        settings,
        overrides,
    }
    .run(&inputs.components);
    balance_basement(&mut components);

    let materials = MaterialAggregator {
        params,
        table: &inputs.materials,
        catalog: &inputs.catalog,
        settings,
        overrides,
    }
    .run(&components);

    let mut finishing = inputs.finishing.clone();
    if !inputs.finishing_rules.is_empty() {
        let summary = SummaryContext::from_takeoff(params, &inputs.layout, &components);
        finishing.extend(evaluate_rules(&inputs.finishing_rules, &summary));
    }

    let boq = consolidate(&materials, &finishing, &inputs.catalog, overrides, settings);

    log::debug!(
        "takeoff: {} component results, {} material rows, {} finishing items",
        components.len(),
        materials.len(),
        finishing.len()
    );

    TakeoffReport {
        components,
        materials,
        finishing,
        boq,
    }
}
