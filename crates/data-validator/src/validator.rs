//! Telemetry Validator

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use telemetry::{SensorReading, UnitTable};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Require cycles to run 1, 2, 3, ... within each unit
    pub require_contiguous_cycles: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_contiguous_cycles: true,
        }
    }
}

/// Result of validating a whole table
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all rows are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of rows checked
    pub rows_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(rows_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            rows_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, rows_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            rows_checked,
        }
    }

    /// First error, if any
    pub fn into_result(self) -> Result<usize, ValidationError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.rows_checked),
        }
    }
}

/// Validator for CMAPSS telemetry
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Every value in the reading must be finite and the cycle must start at 1
    pub fn validate_reading(&self, reading: &SensorReading) -> Result<(), ValidationError> {
        if reading.cycle == 0 {
            return Err(ValidationError::CycleGap {
                unit_id: reading.unit_id,
                expected: 1,
                found: 0,
            });
        }

        for (field, value) in reading.values() {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite {
                    unit_id: reading.unit_id,
                    cycle: reading.cycle,
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Cycles for one unit must be strictly increasing and contiguous from 1.
    /// `rows` must already be sorted by cycle.
    pub fn validate_unit(&self, rows: &[SensorReading]) -> Result<(), ValidationError> {
        for (idx, reading) in rows.iter().enumerate() {
            self.validate_reading(reading)?;

            if self.config.require_contiguous_cycles {
                let expected = idx as u32 + 1;
                if reading.cycle != expected {
                    return Err(ValidationError::CycleGap {
                        unit_id: reading.unit_id,
                        expected,
                        found: reading.cycle,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate every unit in the table, collecting one error per failing unit
    pub fn validate_table(&self, table: &UnitTable) -> ValidationResult {
        let errors: Vec<ValidationError> = table
            .iter()
            .filter_map(|(_, rows)| self.validate_unit(rows).err())
            .collect();

        let rows_checked = table.row_count();
        debug!(
            "Validated {} rows across {} units: {} failing units",
            rows_checked,
            table.unit_count(),
            errors.len()
        );

        if errors.is_empty() {
            ValidationResult::valid(rows_checked)
        } else {
            ValidationResult::invalid(errors, rows_checked)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(unit_id: u32, cycle: u32) -> SensorReading {
        let mut r = SensorReading {
            unit_id,
            cycle,
            ..Default::default()
        };
        r.sensors.insert("sensor1".to_string(), 518.67);
        r
    }

    #[test]
    fn test_contiguous_unit_is_valid() {
        let rows: Vec<_> = (1..=5).map(|c| reading(1, c)).collect();
        assert!(Validator::default().validate_unit(&rows).is_ok());
    }

    #[test]
    fn test_gap_is_rejected() {
        let rows = vec![reading(3, 1), reading(3, 2), reading(3, 4)];
        let err = Validator::default().validate_unit(&rows).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CycleGap { unit_id: 3, expected: 3, found: 4 }
        ));
    }

    #[test]
    fn test_duplicate_cycle_is_rejected() {
        let rows = vec![reading(1, 1), reading(1, 1)];
        assert!(Validator::default().validate_unit(&rows).is_err());
    }

    #[test]
    fn test_gap_allowed_when_relaxed() {
        let validator = Validator::new(ValidationConfig {
            require_contiguous_cycles: false,
        });
        let rows = vec![reading(1, 1), reading(1, 5)];
        assert!(validator.validate_unit(&rows).is_ok());
    }

    #[test]
    fn test_non_finite_value() {
        let mut r = reading(1, 1);
        r.sensors.insert("sensor2".to_string(), f64::NAN);
        let err = Validator::default().validate_reading(&r).unwrap_err();
        assert!(matches!(err, ValidationError::NonFinite { ref field, .. } if field == "sensor2"));
    }

    #[test]
    fn test_validate_table_collects_per_unit() {
        let table = UnitTable::from_readings(vec![
            reading(1, 1),
            reading(1, 2),
            reading(2, 2),
            reading(3, 1),
        ]);
        let result = Validator::default().validate_table(&table);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.rows_checked, 4);
        assert!(result.into_result().is_err());
    }
}
