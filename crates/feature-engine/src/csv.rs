//! Window Text Parsing
//!
//! Operators paste a window as one cycle per line with comma-separated
//! values. Blank lines and trailing commas are ignored.

use crate::window::{FeatureWindow, WindowShape};
use crate::WindowError;
use tracing::debug;

fn parse_value(token: &str) -> f64 {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Parse pasted text into a window of exactly `shape`.
///
/// Non-numeric and non-finite values are replaced with 0.0; row and column
/// counts are never adjusted.
pub fn parse_window_csv(text: &str, shape: WindowShape) -> Result<FeatureWindow, WindowError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() != shape.time_steps {
        return Err(WindowError::CycleCount {
            expected: shape.time_steps,
            found: lines.len(),
        });
    }

    let mut rows = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let row: Vec<f64> = line
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(parse_value)
            .collect();

        if row.len() != shape.num_features {
            return Err(WindowError::CycleWidth {
                cycle: idx + 1,
                expected: shape.num_features,
                found: row.len(),
            });
        }
        rows.push(row);
    }

    debug!("Parsed {} window from text", shape);
    Ok(FeatureWindow::from_rows(&rows, shape)?)
}
