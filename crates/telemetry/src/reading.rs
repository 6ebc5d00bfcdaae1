//! Sensor Readings and Feature Schema

use crate::TelemetryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of sensor channels in a CMAPSS row
pub const SENSOR_COUNT: usize = 21;

/// Operating condition of the engine for one cycle (CMAPSS op_setting1..3)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationalSettings {
    /// Flight altitude setting
    pub altitude: f64,
    /// Mach number setting
    pub mach: f64,
    /// Throttle resolver angle
    pub throttle_resolver_angle: f64,
}

impl OperationalSettings {
    /// Settings in column order
    pub fn as_array(&self) -> [f64; 3] {
        [self.altitude, self.mach, self.throttle_resolver_angle]
    }
}

/// One row of telemetry for a (unit, cycle) pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub unit_id: u32,
    pub cycle: u32,
    pub settings: OperationalSettings,
    /// Sensor name to value (`sensor1` .. `sensor21` for CMAPSS)
    pub sensors: BTreeMap<String, f64>,
}

impl SensorReading {
    /// Create a reading from positional CMAPSS sensor values
    pub fn from_cmapss(
        unit_id: u32,
        cycle: u32,
        settings: OperationalSettings,
        sensor_values: &[f64],
    ) -> Self {
        let sensors = sensor_values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("sensor{}", i + 1), *v))
            .collect();

        Self {
            unit_id,
            cycle,
            settings,
            sensors,
        }
    }

    /// Look up a column by schema name
    pub fn value(&self, column: &str) -> Option<f64> {
        match column {
            "op_setting1" => Some(self.settings.altitude),
            "op_setting2" => Some(self.settings.mach),
            "op_setting3" => Some(self.settings.throttle_resolver_angle),
            name => self.sensors.get(name).copied(),
        }
    }

    /// Iterate over every (column, value) pair carried by this reading
    pub fn values(&self) -> impl Iterator<Item = (&str, f64)> {
        let settings = [
            ("op_setting1", self.settings.altitude),
            ("op_setting2", self.settings.mach),
            ("op_setting3", self.settings.throttle_resolver_angle),
        ];
        settings
            .into_iter()
            .chain(self.sensors.iter().map(|(k, v)| (k.as_str(), *v)))
    }
}

/// Ordered list of columns that make up a model feature vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema from explicit column names
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Canonical 24-column schema: three operational settings then 21 sensors
    pub fn cmapss() -> Self {
        let columns = (1..=3)
            .map(|i| format!("op_setting{i}"))
            .chain((1..=SENSOR_COUNT).map(|i| format!("sensor{i}")))
            .collect();
        Self { columns }
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Build the feature vector for a reading in schema order
    pub fn extract(&self, reading: &SensorReading) -> Result<Vec<f64>, TelemetryError> {
        self.columns
            .iter()
            .map(|column| {
                reading
                    .value(column)
                    .ok_or_else(|| TelemetryError::MissingColumn {
                        column: column.clone(),
                        unit_id: reading.unit_id,
                        cycle: reading.cycle,
                    })
            })
            .collect()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::cmapss()
    }
}
