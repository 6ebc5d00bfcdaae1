//! Offline evaluation against CMAPSS ground truth

use feature_engine::{FeatureWindow, SequenceWindower};
use health_scorer::{HealthScorer, HealthStatus};
use inference_engine::{InferenceEngine, InferenceError};
use serde::Serialize;
use telemetry::UnitTable;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct UnitEvaluation {
    pub unit_id: u32,
    pub predicted_rul: f64,
    /// Ground truth capped at the engine's `max_rul`
    pub true_rul: f64,
    pub error: f64,
    pub health_percent: f64,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedUnit {
    pub unit_id: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub units: Vec<UnitEvaluation>,
    pub skipped: Vec<SkippedUnit>,
    /// `None` when no unit could be evaluated
    pub rmse: Option<f64>,
}

/// Root mean squared error of paired values
pub fn rmse(errors: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = errors
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), e| (sum + e * e, count + 1));
    (count > 0).then(|| (sum / count as f64).sqrt())
}

/// Predict the trailing window of every test unit and compare with `truth`,
/// where `truth[i]` is the RUL of unit `i + 1`.
///
/// Units with too little history or no truth entry are skipped.
pub fn evaluate(
    engine: &InferenceEngine,
    scorer: &HealthScorer,
    windower: &SequenceWindower,
    table: &UnitTable,
    truth: &[f64],
) -> Result<EvaluationReport, InferenceError> {
    let mut skipped = Vec::new();
    let mut ready: Vec<(u32, f64)> = Vec::new();
    let mut windows: Vec<FeatureWindow> = Vec::new();

    // the engine applies its own scaler
    for (unit_id, window) in windower.trailing_windows(table, None) {
        let true_rul = unit_id
            .checked_sub(1)
            .and_then(|i| truth.get(i as usize))
            .copied();

        match (window, true_rul) {
            (Ok(window), Some(true_rul)) => {
                ready.push((unit_id, true_rul.min(engine.max_rul())));
                windows.push(window);
            }
            (Err(e), _) => {
                warn!("Skipping unit {}: {}", unit_id, e);
                skipped.push(SkippedUnit {
                    unit_id,
                    reason: e.to_string(),
                });
            }
            (Ok(_), None) => {
                warn!("Skipping unit {}: no ground truth", unit_id);
                skipped.push(SkippedUnit {
                    unit_id,
                    reason: "no ground truth entry".to_string(),
                });
            }
        }
    }

    let estimates = engine.predict_batch(&windows)?;

    let units: Vec<UnitEvaluation> = ready
        .into_iter()
        .zip(estimates)
        .map(|((unit_id, true_rul), estimate)| {
            let predicted_rul = estimate.value();
            let assessment = scorer.score(predicted_rul);
            UnitEvaluation {
                unit_id,
                predicted_rul,
                true_rul,
                error: predicted_rul - true_rul,
                health_percent: assessment.health_percent,
                status: assessment.status,
            }
        })
        .collect();

    let rmse = rmse(units.iter().map(|u| u.error));
    info!(
        "Evaluated {} units ({} skipped), RMSE {}",
        units.len(),
        skipped.len(),
        rmse.map(|r| format!("{:.3}", r)).unwrap_or_else(|| "n/a".to_string())
    );

    Ok(EvaluationReport { units, skipped, rmse })
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry::{OperationalSettings, SensorReading};

    fn unit(unit_id: u32, cycles: u32) -> Vec<SensorReading> {
        (1..=cycles)
            .map(|cycle| {
                SensorReading::from_cmapss(unit_id, cycle, OperationalSettings::default(), &[0.0; 21])
            })
            .collect()
    }

    #[test]
    fn test_rmse() {
        assert_eq!(rmse(Vec::new()), None);
        assert_eq!(rmse(vec![3.0, -3.0]), Some(3.0));
    }

    #[test]
    fn test_evaluate_skips_short_units() {
        let readings: Vec<_> = unit(1, 40).into_iter().chain(unit(2, 10)).collect();
        let table = UnitTable::from_readings(readings);

        // all-zero windows: mock model predicts its intercept (160), clamped to 125
        let report = evaluate(
            &InferenceEngine::mock(),
            &HealthScorer::default(),
            &SequenceWindower::canonical(),
            &table,
            &[100.0, 50.0],
        )
        .unwrap();

        assert_eq!(report.units.len(), 1);
        assert_eq!(report.units[0].unit_id, 1);
        assert_eq!(report.units[0].predicted_rul, 125.0);
        assert_eq!(report.units[0].error, 25.0);
        assert_eq!(report.units[0].status, HealthStatus::Healthy);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].unit_id, 2);
        assert_eq!(report.rmse, Some(25.0));
    }

    #[test]
    fn test_evaluate_without_model() {
        let table = UnitTable::from_readings(unit(1, 40));
        let engine = InferenceEngine::new(feature_engine::WindowShape::CANONICAL, 125.0);
        let result = evaluate(
            &engine,
            &HealthScorer::default(),
            &SequenceWindower::canonical(),
            &table,
            &[10.0],
        );
        assert!(matches!(result, Err(InferenceError::ModelUnavailable)));
    }
}
