//! Validation Error Types

use thiserror::Error;

/// Errors during telemetry validation and feature scaling
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// Value is NaN or infinite
    #[error("Unit {unit_id} cycle {cycle}: {field} is not finite ({value})")]
    NonFinite {
        unit_id: u32,
        cycle: u32,
        field: String,
        value: f64,
    },

    /// Cycles for a unit are not contiguous from 1
    #[error("Unit {unit_id}: expected cycle {expected}, found {found}")]
    CycleGap {
        unit_id: u32,
        expected: u32,
        found: u32,
    },

    /// Nothing to fit or validate
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    /// Row width does not match the fitted feature count
    #[error("Feature count mismatch at row {row}: expected {expected}, got {actual}")]
    FeatureCount {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Persisted scaler could not be read or written
    #[error("Scaler artifact error: {0}")]
    Artifact(String),
}
