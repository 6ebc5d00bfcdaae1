//! Telemetry Error Types

use thiserror::Error;

/// Errors while reading or interpreting engine telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Underlying file could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// Row has the wrong number of columns
    #[error("Line {line}: expected {expected} columns, found {actual}")]
    ColumnCount {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// Token could not be parsed as a number
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Reading lacks a column required by the feature schema
    #[error("Missing column '{column}' for unit {unit_id} cycle {cycle}")]
    MissingColumn {
        column: String,
        unit_id: u32,
        cycle: u32,
    },
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Io(err.to_string())
    }
}
