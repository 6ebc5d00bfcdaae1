//! Sequence Windowing
//!
//! Turns per-unit telemetry into overlapping fixed-length windows. Training
//! windows carry a cycles-remaining label; inference uses the trailing window.

use crate::window::{FeatureWindow, WindowShape, TIME_STEPS};
use crate::WindowError;
use data_validator::ScalerState;
use telemetry::{FeatureSchema, SensorReading, UnitTable};
use tracing::{debug, info};

/// One labelled training example
#[derive(Debug, Clone)]
pub struct TrainingSample {
    pub unit_id: u32,
    pub window: FeatureWindow,
    /// Cycles remaining after the window ends
    pub label: f64,
}

/// Slices unit telemetry into model windows
#[derive(Debug, Clone)]
pub struct SequenceWindower {
    time_steps: usize,
    schema: FeatureSchema,
}

impl SequenceWindower {
    /// Create a windower producing `time_steps`-long windows over `schema`
    pub fn new(time_steps: usize, schema: FeatureSchema) -> Result<Self, WindowError> {
        if time_steps == 0 {
            return Err(WindowError::ZeroLength);
        }
        Ok(Self { time_steps, schema })
    }

    /// 30-cycle windows over the 24-column CMAPSS schema
    pub fn canonical() -> Self {
        Self {
            time_steps: TIME_STEPS,
            schema: FeatureSchema::cmapss(),
        }
    }

    pub fn time_steps(&self) -> usize {
        self.time_steps
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn shape(&self) -> WindowShape {
        WindowShape::new(self.time_steps, self.schema.len())
    }

    fn ordered(rows: &[SensorReading]) -> Vec<&SensorReading> {
        let mut ordered: Vec<&SensorReading> = rows.iter().collect();
        ordered.sort_by_key(|r| r.cycle);
        ordered
    }

    fn feature_rows(
        &self,
        rows: &[&SensorReading],
        scaler: Option<&ScalerState>,
    ) -> Result<Vec<Vec<f64>>, WindowError> {
        rows.iter()
            .map(|reading| -> Result<Vec<f64>, WindowError> {
                let features = self.schema.extract(reading)?;
                match scaler {
                    Some(scaler) => Ok(scaler.transform_row(&features)?),
                    None => Ok(features),
                }
            })
            .collect()
    }

    /// Labelled windows for a single unit.
    ///
    /// Window `i` covers rows `[i, i + time_steps)` and is labelled with
    /// `max_cycle - cycle_at(i + time_steps)`. A unit with `n` rows yields
    /// `n - time_steps` windows, or none when `n <= time_steps`.
    pub fn unit_training_windows(
        &self,
        unit_id: u32,
        rows: &[SensorReading],
        scaler: Option<&ScalerState>,
    ) -> Result<Vec<TrainingSample>, WindowError> {
        if rows.len() <= self.time_steps {
            debug!(
                "Unit {}: {} rows, not enough for a {}-step training window",
                unit_id,
                rows.len(),
                self.time_steps
            );
            return Ok(Vec::new());
        }

        let ordered = Self::ordered(rows);
        let features = self.feature_rows(&ordered, scaler)?;
        let max_cycle = ordered.last().map(|r| r.cycle).unwrap_or(0);
        let shape = self.shape();

        (0..ordered.len() - self.time_steps)
            .map(|i| -> Result<TrainingSample, WindowError> {
                let window = FeatureWindow::from_rows(&features[i..i + self.time_steps], shape)?;
                let label = f64::from(max_cycle - ordered[i + self.time_steps].cycle);
                Ok(TrainingSample {
                    unit_id,
                    window,
                    label,
                })
            })
            .collect()
    }

    /// Labelled windows for every unit in the table
    pub fn training_windows(
        &self,
        table: &UnitTable,
        scaler: Option<&ScalerState>,
    ) -> Result<Vec<TrainingSample>, WindowError> {
        let mut samples = Vec::new();
        for (unit_id, rows) in table.iter() {
            samples.extend(self.unit_training_windows(unit_id, rows, scaler)?);
        }
        info!(
            "Built {} training windows from {} units",
            samples.len(),
            table.unit_count()
        );
        Ok(samples)
    }

    /// The last `time_steps` rows of a unit, in time order
    pub fn inference_window(
        &self,
        unit_id: u32,
        rows: &[SensorReading],
        scaler: Option<&ScalerState>,
    ) -> Result<FeatureWindow, WindowError> {
        if rows.len() < self.time_steps {
            return Err(WindowError::InsufficientHistory {
                unit_id,
                required: self.time_steps,
                available: rows.len(),
            });
        }

        let ordered = Self::ordered(rows);
        let tail = &ordered[ordered.len() - self.time_steps..];
        let features = self.feature_rows(tail, scaler)?;
        Ok(FeatureWindow::from_rows(&features, self.shape())?)
    }

    /// Trailing window for one unit of a table
    pub fn inference_window_for(
        &self,
        table: &UnitTable,
        unit_id: u32,
        scaler: Option<&ScalerState>,
    ) -> Result<FeatureWindow, WindowError> {
        let rows = table.rows(unit_id).ok_or(WindowError::UnknownUnit(unit_id))?;
        self.inference_window(unit_id, rows, scaler)
    }

    /// Trailing window for every unit, keeping per-unit failures
    pub fn trailing_windows(
        &self,
        table: &UnitTable,
        scaler: Option<&ScalerState>,
    ) -> Vec<(u32, Result<FeatureWindow, WindowError>)> {
        table
            .iter()
            .map(|(unit_id, rows)| (unit_id, self.inference_window(unit_id, rows, scaler)))
            .collect()
    }
}

impl Default for SequenceWindower {
    fn default() -> Self {
        Self::canonical()
    }
}
