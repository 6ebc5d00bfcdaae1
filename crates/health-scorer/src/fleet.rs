//! Fleet roll-up of per-engine assessments

use crate::scorer::{HealthAssessment, HealthStatus};
use serde::{Deserialize, Serialize};

/// Count of engines per status tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total: usize,
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
}

impl FleetSummary {
    /// Count one engine
    pub fn record(&mut self, status: HealthStatus) {
        self.total += 1;
        match status {
            HealthStatus::Healthy => self.healthy += 1,
            HealthStatus::Warning => self.warning += 1,
            HealthStatus::Critical => self.critical += 1,
        }
    }

    pub fn from_assessments<'a, I>(assessments: I) -> Self
    where
        I: IntoIterator<Item = &'a HealthAssessment>,
    {
        let mut summary = Self::default();
        for assessment in assessments {
            summary.record(assessment.status);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score;
    use crate::HealthAssessment;

    #[test]
    fn test_fleet_counts() {
        let assessments: Vec<_> = [120.0, 100.0, 60.0, 10.0, 0.0].iter().map(|r| score(*r)).collect();
        let summary = FleetSummary::from_assessments(&assessments);
        assert_eq!(
            summary,
            FleetSummary { total: 5, healthy: 2, warning: 1, critical: 2 }
        );
    }

    #[test]
    fn test_empty_fleet() {
        let summary = FleetSummary::from_assessments(&Vec::<HealthAssessment>::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary, FleetSummary::default());
    }
}
