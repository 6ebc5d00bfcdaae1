//! Per-Unit Telemetry Table

use crate::SensorReading;
use std::collections::BTreeMap;

/// Readings grouped by unit, each unit ordered by ascending cycle
#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    units: BTreeMap<u32, Vec<SensorReading>>,
}

impl UnitTable {
    /// Group readings by unit and sort each unit by cycle
    pub fn from_readings<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = SensorReading>,
    {
        let mut units: BTreeMap<u32, Vec<SensorReading>> = BTreeMap::new();
        for reading in readings {
            units.entry(reading.unit_id).or_default().push(reading);
        }
        for rows in units.values_mut() {
            rows.sort_by_key(|r| r.cycle);
        }
        Self { units }
    }

    /// Rows for a unit, ordered by cycle
    pub fn rows(&self, unit_id: u32) -> Option<&[SensorReading]> {
        self.units.get(&unit_id).map(Vec::as_slice)
    }

    /// Iterate over (unit id, rows)
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[SensorReading])> {
        self.units.iter().map(|(id, rows)| (*id, rows.as_slice()))
    }

    /// Number of units
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Total number of rows across all units
    pub fn row_count(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    /// All rows in unit-then-cycle order
    pub fn all_rows(&self) -> impl Iterator<Item = &SensorReading> {
        self.units.values().flatten()
    }
}
