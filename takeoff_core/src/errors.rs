//! # Error Types
//!
//! Structured error types for takeoff_core.
//!
//! Most failures inside the takeoff pipeline are recovered locally: a bad
//! formula becomes an unavailable quantity, a missing material definition
//! drops a row, a missing rate leaves the cost unset. `TakeoffError` is
//! reserved for problems the caller has to fix before a pass can run at all
//! (invalid building parameters, unreadable estimate files).
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::errors::{TakeoffError, TakeoffResult};
//!
//! fn validate_width(width_ft: f64) -> TakeoffResult<()> {
//!     if width_ft <= 0.0 {
//!         return Err(TakeoffError::invalid_input(
//!             "width_ft",
//!             width_ft.to_string(),
//!             "Footprint width must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_width(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for takeoff_core operations
pub type TakeoffResult<T> = Result<T, TakeoffError>;

/// Structured error type for takeoff operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum TakeoffError {
    /// An input value is invalid (out of range, wrong sign, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A formula could not be parsed or evaluated
    #[error("Formula error in '{formula}': {reason}")]
    Formula { formula: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl TakeoffError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TakeoffError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        TakeoffError::MissingField {
            field: field.into(),
        }
    }

    /// Create a Formula error
    pub fn formula(formula: impl Into<String>, reason: impl Into<String>) -> Self {
        TakeoffError::Formula {
            formula: formula.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TakeoffError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            TakeoffError::InvalidInput { .. } => "INVALID_INPUT",
            TakeoffError::MissingField { .. } => "MISSING_FIELD",
            TakeoffError::Formula { .. } => "FORMULA_ERROR",
            TakeoffError::FileError { .. } => "FILE_ERROR",
            TakeoffError::SerializationError { .. } => "SERIALIZATION_ERROR",
            TakeoffError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

impl From<serde_json::Error> for TakeoffError {
    fn from(e: serde_json::Error) -> Self {
        TakeoffError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = TakeoffError::invalid_input("width_ft", "-5", "Footprint width must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: TakeoffError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TakeoffError::missing_field("floors").error_code(), "MISSING_FIELD");
        assert_eq!(TakeoffError::formula("a +", "unexpected end").error_code(), "FORMULA_ERROR");
    }

    #[test]
    fn test_display_includes_context() {
        let error = TakeoffError::formula("width *", "unexpected end of formula");
        assert_eq!(
            error.to_string(),
            "Formula error in 'width *': unexpected end of formula"
        );
    }
}
