//! Engine Telemetry
//!
//! Sensor readings, the canonical feature schema, and CMAPSS dataset parsing.

mod cmapss;
mod error;
mod reading;
mod table;

pub use cmapss::{load_dataset, load_rul_truth, parse_dataset, parse_line, parse_rul_truth};
pub use error::TelemetryError;
pub use reading::{FeatureSchema, OperationalSettings, SensorReading, SENSOR_COUNT};
pub use table::UnitTable;
