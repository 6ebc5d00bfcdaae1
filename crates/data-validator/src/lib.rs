//! Data Validation and Normalization
//!
//! Provides telemetry validation and the min-max scaler shared by training and serving.

mod error;
mod normalizer;
mod validator;

pub use error::ValidationError;
pub use normalizer::ScalerState;
pub use validator::{ValidationConfig, ValidationResult, Validator};
