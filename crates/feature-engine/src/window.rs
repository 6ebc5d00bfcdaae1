//! Feature Windows and Shape Contract

use data_validator::{ScalerState, ValidationError};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Cycles per model input window
pub const TIME_STEPS: usize = 30;

/// Features per cycle (3 operational settings + 21 sensors)
pub const NUM_FEATURES: usize = 24;

/// Expected (time_steps, num_features) of a model input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowShape {
    pub time_steps: usize,
    pub num_features: usize,
}

impl WindowShape {
    /// The (30, 24) contract served by the API
    pub const CANONICAL: WindowShape = WindowShape::new(TIME_STEPS, NUM_FEATURES);

    pub const fn new(time_steps: usize, num_features: usize) -> Self {
        Self {
            time_steps,
            num_features,
        }
    }

    /// Exact-shape check. Anything other than `time_steps` rows of
    /// `num_features` values each is rejected.
    pub fn check<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<(), ShapeMismatch> {
        let received = ReceivedShape::of(rows);
        let matches = matches!(
            received,
            ReceivedShape::Rect { rows, cols } if rows == self.time_steps && cols == self.num_features
        );

        if matches && self.time_steps > 0 {
            Ok(())
        } else {
            Err(ShapeMismatch {
                expected: *self,
                received,
            })
        }
    }
}

impl Default for WindowShape {
    fn default() -> Self {
        Self::CANONICAL
    }
}

impl fmt::Display for WindowShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.time_steps, self.num_features)
    }
}

/// Shape actually observed in an incoming matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceivedShape {
    /// Every row has the same width
    Rect { rows: usize, cols: usize },
    /// Rows differ in width
    Ragged {
        rows: usize,
        min_cols: usize,
        max_cols: usize,
    },
}

impl ReceivedShape {
    /// Describe the shape of a row-major matrix
    pub fn of<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let min_cols = rows.iter().map(|r| r.as_ref().len()).min().unwrap_or(0);
        let max_cols = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);

        if min_cols == max_cols {
            ReceivedShape::Rect {
                rows: rows.len(),
                cols: min_cols,
            }
        } else {
            ReceivedShape::Ragged {
                rows: rows.len(),
                min_cols,
                max_cols,
            }
        }
    }
}

impl fmt::Display for ReceivedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceivedShape::Rect { rows, cols } => write!(f, "({rows}, {cols})"),
            ReceivedShape::Ragged {
                rows,
                min_cols,
                max_cols,
            } => write!(f, "({rows}, ragged {min_cols}..{max_cols})"),
        }
    }
}

/// Input matrix does not have the expected shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, received {received}")]
pub struct ShapeMismatch {
    pub expected: WindowShape,
    pub received: ReceivedShape,
}

/// Fixed-shape (time_steps x num_features) model input
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWindow {
    values: Array2<f64>,
}

impl FeatureWindow {
    /// Build a window from row-major data, rejecting any other shape
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R], shape: WindowShape) -> Result<Self, ShapeMismatch> {
        shape.check(rows)?;
        let values = Array2::from_shape_fn((shape.time_steps, shape.num_features), |(r, c)| {
            rows[r].as_ref()[c]
        });
        Ok(Self { values })
    }

    /// Window with every value set to `value`
    pub fn uniform(shape: WindowShape, value: f64) -> Self {
        Self {
            values: Array2::from_elem((shape.time_steps, shape.num_features), value),
        }
    }

    pub fn shape(&self) -> WindowShape {
        let (time_steps, num_features) = self.values.dim();
        WindowShape::new(time_steps, num_features)
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Feature vector for one time step
    pub fn row(&self, step: usize) -> ArrayView1<'_, f64> {
        self.values.row(step)
    }

    /// Apply a fitted scaler to every time step
    pub fn scaled(&self, scaler: &ScalerState) -> Result<Self, ValidationError> {
        let rows = self
            .values
            .rows()
            .into_iter()
            .map(|row| scaler.transform_row(&row.to_vec()))
            .collect::<Result<Vec<_>, _>>()?;

        let shape = self.shape();
        let values = Array2::from_shape_fn((shape.time_steps, shape.num_features), |(r, c)| {
            rows[r][c]
        });
        Ok(Self { values })
    }

    /// Row-major values as f32, the layout expected by the model runtime
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: usize, cols: usize) -> Vec<Vec<f64>> {
        (0..rows)
            .map(|r| (0..cols).map(|c| (r * cols + c) as f64).collect())
            .collect()
    }

    #[test]
    fn test_canonical_shape_accepted() {
        let rows = matrix(30, 24);
        assert!(WindowShape::CANONICAL.check(&rows).is_ok());

        let window = FeatureWindow::from_rows(&rows, WindowShape::CANONICAL).unwrap();
        assert_eq!(window.shape(), WindowShape::CANONICAL);
        assert_eq!(window.row(1)[0], 24.0);
    }

    #[test]
    fn test_wrong_row_count() {
        let err = WindowShape::CANONICAL.check(&matrix(29, 24)).unwrap_err();
        assert_eq!(err.received, ReceivedShape::Rect { rows: 29, cols: 24 });
        assert_eq!(err.to_string(), "expected (30, 24), received (29, 24)");
    }

    #[test]
    fn test_transposed_rejected() {
        assert!(WindowShape::CANONICAL.check(&matrix(24, 30)).is_err());
    }

    #[test]
    fn test_empty_rejected() {
        let empty: Vec<Vec<f64>> = Vec::new();
        let err = WindowShape::CANONICAL.check(&empty).unwrap_err();
        assert_eq!(err.received, ReceivedShape::Rect { rows: 0, cols: 0 });
        assert!(WindowShape::new(0, 0).check(&empty).is_err());
    }

    #[test]
    fn test_ragged_rejected() {
        let mut rows = matrix(30, 24);
        rows[7].pop();
        let err = WindowShape::CANONICAL.check(&rows).unwrap_err();
        assert_eq!(
            err.received,
            ReceivedShape::Ragged { rows: 30, min_cols: 23, max_cols: 24 }
        );
        assert_eq!(err.to_string(), "expected (30, 24), received (30, ragged 23..24)");
    }

    #[test]
    fn test_scaled_window() {
        let scaler = ScalerState::from_bounds(vec![0.0, 10.0], vec![10.0, 20.0]).unwrap();
        let window = FeatureWindow::from_rows(&[vec![5.0, 15.0], vec![10.0, 10.0]], WindowShape::new(2, 2))
            .unwrap()
            .scaled(&scaler)
            .unwrap();
        assert_eq!(window.row(0).to_vec(), vec![0.5, 0.5]);
        assert_eq!(window.row(1).to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_scaled_with_mismatched_scaler() {
        let scaler = ScalerState::from_bounds(vec![0.0], vec![1.0]).unwrap();
        let window = FeatureWindow::uniform(WindowShape::new(2, 3), 0.5);
        assert!(window.scaled(&scaler).is_err());
    }

    #[test]
    fn test_f32_layout_is_row_major() {
        let window = FeatureWindow::from_rows(&matrix(2, 3), WindowShape::new(2, 3)).unwrap();
        assert_eq!(window.to_f32_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
