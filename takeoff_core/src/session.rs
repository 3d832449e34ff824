//! Memoized takeoff for one editing session.
//!
//! A session owns an [`Estimate`] and keeps the last [`TakeoffReport`]
//! together with a fingerprint of what produced it. [`EstimateSession::report`]
//! only reruns the pipeline when settings, inputs or overrides changed.
//!
//! ```rust
//! use takeoff_core::components::ComponentDefinition;
//! use takeoff_core::estimate::{Estimate, EstimateInputs};
//! use takeoff_core::parameters::BuildingParameters;
//! use takeoff_core::session::EstimateSession;
//!
//! let params: BuildingParameters = serde_json::from_str(
//!     r#"{"width": 40, "depth": 60, "floorCount": 2, "perimeter": 200, "buildupPercent": 90}"#,
//! ).unwrap();
//! let mut inputs = EstimateInputs::new(params);
//! inputs.components.insert("Slab".to_string(), ComponentDefinition::formula("buildup_area", "Concrete"));
//!
//! let mut session = EstimateSession::new(Estimate::new("Plot 14", inputs));
//! let first = session.report().unwrap().components.len();
//! assert_eq!(session.report().unwrap().components.len(), first);
//! assert_eq!(session.passes(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::errors::TakeoffResult;
use crate::estimate::{Estimate, TakeoffReport};
use crate::overrides::Overrides;

pub struct EstimateSession {
    estimate: Estimate,
    cache: Option<(u64, TakeoffReport)>,
    passes: usize,
}

impl EstimateSession {
    pub fn new(estimate: Estimate) -> Self {
        EstimateSession {
            estimate,
            cache: None,
            passes: 0,
        }
    }

    pub fn estimate(&self) -> &Estimate {
        &self.estimate
    }

    /// Mutable access to the whole estimate. Marks it modified.
    pub fn estimate_mut(&mut self) -> &mut Estimate {
        self.estimate.touch();
        &mut self.estimate
    }

    /// Mutable access to the user overrides. Marks the estimate modified.
    pub fn overrides_mut(&mut self) -> &mut Overrides {
        self.estimate.touch();
        &mut self.estimate.overrides
    }

    pub fn into_estimate(self) -> Estimate {
        self.estimate
    }

    /// Number of pipeline runs so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Current report, recomputed only if anything it depends on changed.
    pub fn report(&mut self) -> TakeoffResult<&TakeoffReport> {
        let fingerprint = self.fingerprint()?;
        let report = match self.cache.take() {
            Some((hash, report)) if hash == fingerprint => report,
            _ => {
                log::debug!("inputs changed, recomputing takeoff");
                let report = self.estimate.calculate()?;
                self.passes += 1;
                report
            }
        };
        let (_, report) = self.cache.insert((fingerprint, report));
        Ok(report)
    }

    /// Hash of the serialized settings, inputs and overrides. Metadata is
    /// left out so touching timestamps doesn't invalidate the cache.
    fn fingerprint(&self) -> TakeoffResult<u64> {
        let mut hasher = DefaultHasher::new();
        serde_json::to_string(&self.estimate.settings)?.hash(&mut hasher);
        serde_json::to_string(&self.estimate.inputs)?.hash(&mut hasher);
        serde_json::to_string(&self.estimate.overrides)?.hash(&mut hasher);
        Ok(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::tests::sample_estimate;
    use crate::overrides::MaterialKey;

    #[test]
    fn test_report_is_memoized() {
        let mut session = EstimateSession::new(sample_estimate());
        let first = session.report().unwrap().clone();
        let second = session.report().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(session.passes(), 1);
    }

    #[test]
    fn test_override_invalidates_cache() {
        let mut session = EstimateSession::new(sample_estimate());
        session.report().unwrap();

        let key = MaterialKey::new("Concrete", "Cement", "Foundation");
        session.overrides_mut().set_wastage(key.clone(), 0.0);
        let report = session.report().unwrap();
        let row = report.materials.iter().find(|r| r.key() == key).unwrap();
        assert_eq!(row.wastage_percent, 0.0);
        assert_eq!(session.passes(), 2);
    }

    #[test]
    fn test_touch_alone_keeps_cache() {
        let mut session = EstimateSession::new(sample_estimate());
        session.report().unwrap();
        session.estimate_mut().meta.name = "Renamed".into();
        session.report().unwrap();
        assert_eq!(session.passes(), 1);
    }

    #[test]
    fn test_input_change_recomputes() {
        let mut session = EstimateSession::new(sample_estimate());
        let before = session.report().unwrap().boq.grand_total;
        session.estimate_mut().inputs.parameters.width_ft = 50.0;
        let after = session.report().unwrap().boq.grand_total;
        assert_ne!(before, after);
        assert_eq!(session.passes(), 2);
    }
}
