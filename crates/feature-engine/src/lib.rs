//! Sequence Feature Engine
//!
//! Shapes engine telemetry into fixed-length, scaled windows for RUL models.

mod csv;
mod window;
mod windower;

pub use csv::parse_window_csv;
pub use window::{FeatureWindow, ReceivedShape, ShapeMismatch, WindowShape, NUM_FEATURES, TIME_STEPS};
pub use windower::{SequenceWindower, TrainingSample};

use data_validator::ValidationError;
use telemetry::TelemetryError;
use thiserror::Error;

/// Errors while building model windows
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Invalid input shape: {0}")]
    Shape(#[from] ShapeMismatch),
    #[error("Window length must be positive")]
    ZeroLength,
    #[error("Invalid cycle count: expected {expected}, found {found}")]
    CycleCount { expected: usize, found: usize },
    #[error("Cycle {cycle}: expected {expected} values, found {found}")]
    CycleWidth {
        cycle: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unit {unit_id}: need {required} cycles of history, have {available}")]
    InsufficientHistory {
        unit_id: u32,
        required: usize,
        available: usize,
    },
    #[error("Unit {0} not present in telemetry")]
    UnknownUnit(u32),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Scaling(#[from] ValidationError),
}
