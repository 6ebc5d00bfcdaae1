//! Health Scorer
//!
//! Deterministic mapping from a RUL estimate to health percent, risk grade,
//! maintenance recommendation and the synthetic display fields.

mod fleet;
mod scorer;

pub use fleet::FleetSummary;
pub use scorer::{
    score, HealthAssessment, HealthScorer, HealthStatus, MaintenanceCost, RiskGrade, ScoringConfig,
    SensorImpact, TimeToFailure, HISTORY_POINTS,
};
