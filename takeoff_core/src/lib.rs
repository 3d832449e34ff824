//! # takeoff_core - Construction Quantity Takeoff Engine
//!
//! `takeoff_core` turns a coarse building description (footprint, floors,
//! structural grid, room layout) and a set of externally supplied rules into
//! component areas and volumes, material quantities, and a priced bill of
//! quantities. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Pure passes**: a takeoff is a function of inputs, settings and overrides
//! - **Local recovery**: a bad formula or missing config blanks one result, never the pass
//! - **JSON-First**: every input and result type implements Serialize/Deserialize
//! - **Stable overrides**: user edits are addressed by structured keys that survive recomputation
//!
//! ## Pipeline
//!
//! ```text
//! BuildingParameters + StructuralConfig + RoomLayout + ComponentSet
//!        │
//!        ▼
//! calculator ──► balancer ──► materials ──► boq (+ finishing)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use takeoff_core::components::ComponentDefinition;
//! use takeoff_core::estimate::{Estimate, EstimateInputs};
//! use takeoff_core::parameters::BuildingParameters;
//!
//! let params: BuildingParameters = serde_json::from_str(
//!     r#"{"width": 40, "depth": 60, "floorCount": 2, "perimeter": 200, "buildupPercent": 90}"#,
//! ).unwrap();
//! let mut inputs = EstimateInputs::new(params);
//! inputs.components.insert(
//!     "Slab".to_string(),
//!     ComponentDefinition::formula("buildup_area", "Concrete").with_thickness(0.5),
//! );
//!
//! let report = Estimate::new("Plot 14", inputs).calculate().unwrap();
//! // Foundation, Ground Floor and 1st Floor
//! assert_eq!(report.components.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`estimate`] - Estimate container and the full pipeline
//! - [`calculator`] - Per-floor component strategies and takeoff geometry
//! - [`balancer`] - Basement backfill balancing
//! - [`materials`] - Material tables and aggregation
//! - [`boq`] - Consolidated, priced bill of quantities
//! - [`expression`] - Sandboxed formula language
//! - [`floors`] - Floor numbering, labels and applicability
//! - [`overrides`] - User edits with structured keys
//! - [`session`] - Memoized recomputation
//! - [`file_io`] - Estimate files with atomic saves

pub mod balancer;
pub mod boq;
pub mod calculator;
pub mod catalog;
pub mod components;
pub mod errors;
pub mod estimate;
pub mod expression;
pub mod file_io;
pub mod finishing;
pub mod floors;
pub mod layout;
pub mod materials;
pub mod naming;
pub mod overrides;
pub mod parameters;
pub mod quantity;
pub mod session;
pub mod settings;
pub mod structure;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{TakeoffError, TakeoffResult};
pub use estimate::{run_takeoff, Estimate, EstimateInputs, TakeoffReport};
pub use file_io::{load_estimate, save_estimate};
pub use quantity::Quantity;
pub use session::EstimateSession;
