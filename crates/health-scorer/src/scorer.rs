//! Health Scoring
//!
//! Turns a clamped RUL estimate into the operator-facing assessment.
//!
//! Only `health_percent`, the grade/status tier and `risk_score` follow from
//! the estimate. `confidence`, `time_to_failure`, `rul_history`,
//! `maintenance_cost` and `top_sensors` are synthetic display values: a fixed
//! confidence ramp, a +/-15% band, a linear backward trend, a constant cost
//! table and a constant sensor ranking. None of them is derived from the
//! model or from stored history.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Points in the synthetic RUL trend
pub const HISTORY_POINTS: usize = 11;

/// Cycles between synthetic trend points
const HISTORY_STEP: f64 = 5.0;

/// Coarse letter bucket derived from health percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskGrade {
    A,
    B,
    C,
}

/// Operator-facing status tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Warning => "Warning",
            HealthStatus::Critical => "Critical",
        }
    }

    /// Grade paired with this status
    pub fn grade(&self) -> RiskGrade {
        match self {
            HealthStatus::Healthy => RiskGrade::A,
            HealthStatus::Warning => RiskGrade::B,
            HealthStatus::Critical => RiskGrade::C,
        }
    }

    /// Get recommended action
    pub fn maintenance_action(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Continue routine monitoring; no maintenance required",
            HealthStatus::Warning => "Schedule borescope inspection within the next maintenance window",
            HealthStatus::Critical => "Remove from service and perform immediate maintenance",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthetic failure window around the estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeToFailure {
    pub min: u32,
    pub max: u32,
}

/// Fixed illustrative maintenance cost estimate (USD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceCost {
    pub preventive: f64,
    pub reactive: f64,
    pub savings: f64,
}

impl Default for MaintenanceCost {
    fn default() -> Self {
        Self {
            preventive: 12_000.0,
            reactive: 48_000.0,
            savings: 36_000.0,
        }
    }
}

/// One entry of the static contributing-sensor ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorImpact {
    pub sensor: String,
    pub impact: f64,
}

const TOP_SENSORS: [(&str, f64); 3] = [("T50", 0.38), ("Ps30", 0.29), ("T24", 0.21)];

/// Derived health record for one estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub health_percent: f64,
    pub risk_grade: RiskGrade,
    pub status: HealthStatus,
    pub maintenance_action: String,
    pub risk_score: f64,
    /// Fixed ramp from 0.75 to 0.95 over health percent, not a calibrated probability
    pub confidence: f64,
    pub time_to_failure: TimeToFailure,
    pub maintenance_cost: MaintenanceCost,
    /// Oldest first, ending at the current estimate
    pub rul_history: Vec<f64>,
    pub top_sensors: Vec<SensorImpact>,
}

/// Scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Reference lifespan; RUL at or above this is 100% health
    pub max_rul: f64,
    /// Health percent strictly above this is Healthy
    pub healthy_above: f64,
    /// Health percent strictly above this (and not Healthy) is Warning
    pub warning_above: f64,
    pub maintenance_cost: MaintenanceCost,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_rul: 125.0,
            healthy_above: 70.0,
            warning_above: 40.0,
            maintenance_cost: MaintenanceCost::default(),
        }
    }
}

/// Deterministic RUL-to-assessment mapping
#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    config: ScoringConfig,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl HealthScorer {
    /// Create a new scorer
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Health percent for an estimate, clamped to [0, 100]
    pub fn health_percent(&self, rul: f64) -> f64 {
        (rul * 100.0 / self.config.max_rul).clamp(0.0, 100.0)
    }

    /// Status tier for a health percent
    pub fn status(&self, health_percent: f64) -> HealthStatus {
        if health_percent > self.config.healthy_above {
            HealthStatus::Healthy
        } else if health_percent > self.config.warning_above {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }

    /// Score a RUL estimate
    pub fn score(&self, rul: f64) -> HealthAssessment {
        let rul = if rul.is_finite() { rul.max(0.0) } else { 0.0 };

        let health_percent = self.health_percent(rul);
        let status = self.status(health_percent);
        let risk_score = round2(1.0 - health_percent / 100.0);
        let confidence = (0.75 + health_percent / 400.0).clamp(0.75, 0.95);

        let time_to_failure = TimeToFailure {
            min: (rul * 0.85).floor().max(0.0) as u32,
            max: (rul * 1.15).floor().max(0.0) as u32,
        };

        let rul_history = (0..HISTORY_POINTS)
            .rev()
            .map(|k| (rul + HISTORY_STEP * k as f64).max(0.0))
            .collect();

        let top_sensors = TOP_SENSORS
            .iter()
            .map(|(sensor, impact)| SensorImpact {
                sensor: sensor.to_string(),
                impact: *impact,
            })
            .collect();

        debug!(
            "Scored rul={:.2}: health={:.1}% status={}",
            rul, health_percent, status
        );

        HealthAssessment {
            health_percent,
            risk_grade: status.grade(),
            status,
            maintenance_action: status.maintenance_action().to_string(),
            risk_score,
            confidence,
            time_to_failure,
            maintenance_cost: self.config.maintenance_cost,
            rul_history,
            top_sensors,
        }
    }
}

/// Score with the default configuration (MAX_RUL = 125)
pub fn score(rul: f64) -> HealthAssessment {
    HealthScorer::default().score(rul)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_rul_is_critical() {
        let a = score(0.0);
        assert_eq!(a.status, HealthStatus::Critical);
        assert_eq!(a.risk_grade, RiskGrade::C);
        assert_eq!(a.health_percent, 0.0);
        assert_eq!(a.time_to_failure, TimeToFailure { min: 0, max: 0 });
        assert_eq!(a.risk_score, 1.0);
        assert_eq!(a.confidence, 0.75);
    }

    #[test]
    fn test_max_rul_is_healthy() {
        let a = score(125.0);
        assert_eq!(a.health_percent, 100.0);
        assert_eq!(a.status, HealthStatus::Healthy);
        assert_eq!(a.risk_grade, RiskGrade::A);
        assert_eq!(a.risk_score, 0.0);
        assert_eq!(a.confidence, 0.95);
    }

    #[test]
    fn test_exactly_seventy_percent_is_warning() {
        let a = score(87.5);
        assert_eq!(a.health_percent, 70.0);
        assert_eq!(a.status, HealthStatus::Warning);
        assert_eq!(a.risk_grade, RiskGrade::B);
        assert_eq!(a.risk_score, 0.3);
    }

    #[test]
    fn test_exactly_forty_percent_is_critical() {
        let a = score(50.0);
        assert_eq!(a.health_percent, 40.0);
        assert_eq!(a.status, HealthStatus::Critical);
    }

    #[test]
    fn test_above_max_clamps_health() {
        assert_eq!(score(300.0).health_percent, 100.0);
    }

    #[test]
    fn test_time_to_failure_band() {
        let a = score(100.0);
        assert_eq!(a.time_to_failure, TimeToFailure { min: 85, max: 114 });
    }

    #[test]
    fn test_rul_history_is_linear_backward_trend() {
        let a = score(20.0);
        assert_eq!(a.rul_history.len(), HISTORY_POINTS);
        assert_eq!(a.rul_history[0], 70.0);
        assert_eq!(a.rul_history[10], 20.0);
        for pair in a.rul_history.windows(2) {
            assert_eq!(pair[0] - pair[1], 5.0);
        }
    }

    #[test]
    fn test_static_fields_do_not_depend_on_rul() {
        let low = score(3.0);
        let high = score(120.0);
        assert_eq!(low.maintenance_cost, high.maintenance_cost);
        assert_eq!(low.top_sensors, high.top_sensors);
        assert_eq!(low.top_sensors.len(), 3);
        assert_eq!(
            low.maintenance_cost,
            MaintenanceCost { preventive: 12_000.0, reactive: 48_000.0, savings: 36_000.0 }
        );
    }

    #[test]
    fn test_maintenance_action_keyed_by_status() {
        assert_eq!(score(10.0).maintenance_action, HealthStatus::Critical.maintenance_action());
        assert_eq!(score(70.0).maintenance_action, HealthStatus::Warning.maintenance_action());
        assert_eq!(score(110.0).maintenance_action, HealthStatus::Healthy.maintenance_action());
    }

    #[test]
    fn test_non_finite_input_scores_as_zero() {
        assert_eq!(score(f64::NAN), score(0.0));
        assert_eq!(score(-4.0), score(0.0));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(score(87.5)).unwrap();
        assert_eq!(json["status"], "Warning");
        assert_eq!(json["risk_grade"], "B");
        assert_eq!(json["time_to_failure"]["min"], 74);
        assert_eq!(json["maintenance_cost"]["reactive"], 48000.0);
        assert_eq!(json["top_sensors"][0]["sensor"], "T50");
        assert_eq!(json["rul_history"].as_array().unwrap().len(), 11);
    }

    #[test]
    fn test_custom_thresholds() {
        let scorer = HealthScorer::new(ScoringConfig {
            max_rul: 200.0,
            ..Default::default()
        });
        assert_eq!(scorer.score(100.0).health_percent, 50.0);
        assert_eq!(scorer.score(100.0).status, HealthStatus::Warning);
    }

    proptest! {
        #[test]
        fn prop_monotone_in_rul(a in 0.0f64..=125.0, b in 0.0f64..=125.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let low = score(lo);
            let high = score(hi);
            prop_assert!(high.health_percent >= low.health_percent);
            prop_assert!(high.risk_score <= low.risk_score);
            prop_assert!(high.confidence >= low.confidence);
        }

        #[test]
        fn prop_bounds(rul in 0.0f64..1000.0) {
            let a = score(rul);
            prop_assert!((0.0..=100.0).contains(&a.health_percent));
            prop_assert!((0.75..=0.95).contains(&a.confidence));
            prop_assert!((0.0..=1.0).contains(&a.risk_score));
            prop_assert!(a.time_to_failure.min <= a.time_to_failure.max);
            prop_assert_eq!(a.risk_grade, a.status.grade());
        }
    }
}
