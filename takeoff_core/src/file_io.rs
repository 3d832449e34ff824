//! # File I/O Module
//!
//! Reads and writes estimate files:
//! - **Atomic saves**: write to `.tmp`, verify it parses back, rename
//! - **Version validation**: refuse files from an incompatible schema
//!
//! ## File Format
//!
//! Estimates are saved as pretty-printed JSON, conventionally with a
//! `.takeoff.json` extension.
//!
//! ## Example
//!
//! ```rust,no_run
//! use takeoff_core::file_io::{load_estimate, save_estimate};
//! use std::path::Path;
//!
//! let path = Path::new("plot14.takeoff.json");
//! let mut estimate = load_estimate(path)?;
//! estimate.touch();
//! save_estimate(&estimate, path)?;
//! # Ok::<(), takeoff_core::errors::TakeoffError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::errors::{TakeoffError, TakeoffResult};
use crate::estimate::{Estimate, SCHEMA_VERSION};

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save an estimate with atomic write semantics.
///
/// The save process:
/// 1. Serialize to pretty JSON
/// 2. Write to a temporary file next to the target and fsync it
/// 3. Parse the temporary file back to make sure it is loadable
/// 4. Rename over the target (atomic on most filesystems)
pub fn save_estimate(estimate: &Estimate, path: &Path) -> TakeoffResult<()> {
    let json = serde_json::to_string_pretty(estimate)?;
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        TakeoffError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        TakeoffError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        TakeoffError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    drop(tmp_file);

    if let Err(e) = read_estimate(&tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(TakeoffError::file_error(
            "verify temp file",
            tmp_path.display().to_string(),
            e.to_string(),
        ));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        TakeoffError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    log::debug!("saved estimate '{}' to {}", estimate.meta.name, path.display());
    Ok(())
}

/// Load an estimate and check its schema version.
///
/// # Returns
///
/// * `Err(TakeoffError::VersionMismatch)` - File version is incompatible
/// * `Err(TakeoffError::SerializationError)` - Invalid JSON
/// * `Err(TakeoffError::FileError)` - I/O error
pub fn load_estimate(path: &Path) -> TakeoffResult<Estimate> {
    let estimate = read_estimate(path)?;
    validate_version(&estimate.meta.version)?;
    log::debug!("loaded estimate '{}' ({})", estimate.meta.name, estimate.meta.id);
    Ok(estimate)
}

fn read_estimate(path: &Path) -> TakeoffResult<Estimate> {
    let mut file = File::open(path)
        .map_err(|e| TakeoffError::file_error("open", path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| TakeoffError::file_error("read", path.display().to_string(), e.to_string()))?;

    serde_json::from_str(&contents).map_err(|e| TakeoffError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Validate that a file version is compatible with the current schema.
///
/// Major versions must match. While the schema is 0.x, a file with a newer
/// minor version is rejected too.
fn validate_version(file_version: &str) -> TakeoffResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let mismatch = || TakeoffError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let (Some(file_major), Some(current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }
    if *current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::tests::sample_estimate;
    use std::env::temp_dir;

    fn temp_estimate_path(name: &str) -> PathBuf {
        temp_dir().join(format!("takeoff_test_{}_{}.takeoff.json", name, std::process::id()))
    }

    #[test]
    fn test_tmp_path() {
        let tmp = tmp_path_for(Path::new("/path/to/plot.takeoff.json"));
        assert_eq!(tmp, Path::new("/path/to/plot.takeoff.json.tmp"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_estimate_path("roundtrip");
        let estimate = sample_estimate();
        save_estimate(&estimate, &path).unwrap();

        let loaded = load_estimate(&path).unwrap();
        assert_eq!(loaded.meta.id, estimate.meta.id);
        assert_eq!(loaded.inputs.components.len(), estimate.inputs.components.len());
        assert!(!tmp_path_for(&path).exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_estimate(Path::new("/nonexistent/estimate.takeoff.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_invalid_json() {
        let path = temp_estimate_path("invalid");
        fs::write(&path, "{ not json").unwrap();
        let err = load_estimate(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_newer_file_rejected() {
        let path = temp_estimate_path("newer");
        let mut estimate = sample_estimate();
        estimate.meta.version = "0.9.0".to_string();
        save_estimate(&estimate, &path).unwrap();
        let err = load_estimate(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_demo_estimate_loads_and_prices() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/sample_estimate.json");
        let estimate = load_estimate(&path).unwrap();
        estimate.validate().unwrap();
        assert!(estimate.inputs.check_formulas().is_empty());

        let report = estimate.calculate().unwrap();
        assert!(!report.components.is_empty());
        assert!(!report.materials.is_empty());
        assert!(report.boq.grand_total > 0.0);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.0.5").is_ok());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("garbage").is_err());
    }
}
