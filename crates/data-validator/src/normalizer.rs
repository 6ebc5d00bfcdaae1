//! Min-Max Feature Scaling
//!
//! The fitted state is persisted next to the model so that serving applies
//! exactly the transform the model was trained on.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Per-feature (min, max) pairs fitted over training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl ScalerState {
    /// Create a state from explicit bounds
    pub fn from_bounds(min: Vec<f64>, max: Vec<f64>) -> Result<Self, ValidationError> {
        if min.len() != max.len() {
            return Err(ValidationError::FeatureCount {
                row: 0,
                expected: min.len(),
                actual: max.len(),
            });
        }
        if min.is_empty() {
            return Err(ValidationError::EmptyInput("scaler bounds"));
        }
        Ok(Self { min, max })
    }

    /// Fit column-wise min and max over all rows
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, ValidationError> {
        let first = rows
            .first()
            .ok_or(ValidationError::EmptyInput("no rows to fit"))?
            .as_ref();
        let width = first.len();
        if width == 0 {
            return Err(ValidationError::EmptyInput("rows have no features"));
        }

        let mut min = vec![f64::INFINITY; width];
        let mut max = vec![f64::NEG_INFINITY; width];

        for (row_idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(ValidationError::FeatureCount {
                    row: row_idx,
                    expected: width,
                    actual: row.len(),
                });
            }
            for (col, &value) in row.iter().enumerate() {
                min[col] = min[col].min(value);
                max[col] = max[col].max(value);
            }
        }

        let constant = min.iter().zip(&max).filter(|(lo, hi)| hi <= lo).count();
        if constant > 0 {
            warn!("{} feature(s) have zero range and will scale to 0", constant);
        }
        info!("Fitted min-max scaler over {} rows x {} features", rows.len(), width);

        Ok(Self { min, max })
    }

    /// Number of features the state was fitted on
    pub fn num_features(&self) -> usize {
        self.min.len()
    }

    /// Fitted minimums
    pub fn min(&self) -> &[f64] {
        &self.min
    }

    /// Fitted maximums
    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// Scale one row. Values outside the fitted range map outside [0, 1].
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, ValidationError> {
        self.transform_row_at(row, 0)
    }

    fn transform_row_at(&self, row: &[f64], row_idx: usize) -> Result<Vec<f64>, ValidationError> {
        if row.len() != self.num_features() {
            return Err(ValidationError::FeatureCount {
                row: row_idx,
                expected: self.num_features(),
                actual: row.len(),
            });
        }

        Ok(row
            .iter()
            .zip(self.min.iter().zip(&self.max))
            .map(|(&value, (&lo, &hi))| {
                let range = hi - lo;
                if range > 0.0 {
                    (value - lo) / range
                } else {
                    0.0
                }
            })
            .collect())
    }

    /// Scale every row
    pub fn transform<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<Vec<Vec<f64>>, ValidationError> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.transform_row_at(row.as_ref(), idx))
            .collect()
    }

    /// Write the fitted state as JSON
    pub fn save(&self, path: &Path) -> Result<(), ValidationError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ValidationError::Artifact(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| ValidationError::Artifact(format!("{}: {}", path.display(), e)))?;
        info!("Saved scaler to {}", path.display());
        Ok(())
    }

    /// Read a fitted state written by [`ScalerState::save`]
    pub fn load(path: &Path) -> Result<Self, ValidationError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ValidationError::Artifact(format!("{}: {}", path.display(), e)))?;
        let state: Self = serde_json::from_str(&json)
            .map_err(|e| ValidationError::Artifact(format!("{}: {}", path.display(), e)))?;
        let state = Self::from_bounds(state.min, state.max)?;
        debug!("Loaded scaler with {} features from {}", state.num_features(), path.display());
        Ok(state)
    }
}
