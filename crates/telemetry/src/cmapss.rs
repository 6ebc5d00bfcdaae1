//! CMAPSS Dataset Parsing
//!
//! Training and test files are whitespace-separated rows of 26 numbers:
//! unit id, cycle, three operational settings, and 21 sensor channels.
//! Ground-truth files carry one remaining-life value per line.

use crate::reading::{OperationalSettings, SensorReading, SENSOR_COUNT};
use crate::TelemetryError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Columns in a CMAPSS row
const ROW_COLUMNS: usize = 5 + SENSOR_COUNT;

fn parse_number(token: &str, line: usize, column: usize) -> Result<f64, TelemetryError> {
    token.parse::<f64>().map_err(|_| TelemetryError::Parse {
        line,
        message: format!("column {} is not a number: '{}'", column + 1, token),
    })
}

fn parse_index(value: f64, line: usize, name: &str) -> Result<u32, TelemetryError> {
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(TelemetryError::Parse {
            line,
            message: format!("{name} must be a non-negative integer, got {value}"),
        });
    }
    Ok(value as u32)
}

/// Parse one CMAPSS row (`line` is 1-based, used for error messages)
pub fn parse_line(text: &str, line: usize) -> Result<SensorReading, TelemetryError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != ROW_COLUMNS {
        return Err(TelemetryError::ColumnCount {
            line,
            expected: ROW_COLUMNS,
            actual: tokens.len(),
        });
    }

    let values = tokens
        .iter()
        .enumerate()
        .map(|(column, token)| parse_number(token, line, column))
        .collect::<Result<Vec<f64>, _>>()?;

    let unit_id = parse_index(values[0], line, "unit id")?;
    let cycle = parse_index(values[1], line, "cycle")?;
    let settings = OperationalSettings {
        altitude: values[2],
        mach: values[3],
        throttle_resolver_angle: values[4],
    };

    Ok(SensorReading::from_cmapss(unit_id, cycle, settings, &values[5..]))
}

/// Parse a whole CMAPSS training or test file, skipping blank lines
pub fn parse_dataset<R: BufRead>(reader: R) -> Result<Vec<SensorReading>, TelemetryError> {
    let mut readings = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        readings.push(parse_line(&line, idx + 1)?);
    }
    debug!("Parsed {} CMAPSS rows", readings.len());
    Ok(readings)
}

/// Load a CMAPSS file from disk
pub fn load_dataset(path: &Path) -> Result<Vec<SensorReading>, TelemetryError> {
    let file = File::open(path)
        .map_err(|e| TelemetryError::Io(format!("{}: {}", path.display(), e)))?;
    let readings = parse_dataset(BufReader::new(file))?;
    info!("Loaded {} rows from {}", readings.len(), path.display());
    Ok(readings)
}

/// Parse a ground-truth RUL file: one value per non-blank line, in unit order
pub fn parse_rul_truth<R: BufRead>(reader: R) -> Result<Vec<f64>, TelemetryError> {
    let mut truth = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        truth.push(parse_number(token, idx + 1, 0)?);
    }
    Ok(truth)
}

/// Load a ground-truth RUL file from disk
pub fn load_rul_truth(path: &Path) -> Result<Vec<f64>, TelemetryError> {
    let file = File::open(path)
        .map_err(|e| TelemetryError::Io(format!("{}: {}", path.display(), e)))?;
    parse_rul_truth(BufReader::new(file))
}
