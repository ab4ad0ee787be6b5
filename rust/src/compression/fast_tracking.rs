//! Fast-tracking: overlapping a task with its successor at a rework risk.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::error::{EngineError, EngineResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskLevel {
    /// Fixed part of the risk score for this level.
    pub fn base_score(self) -> f64 {
        match self {
            RiskLevel::Low => 20.0,
            RiskLevel::Moderate => 50.0,
            RiskLevel::High => 80.0,
            RiskLevel::Extreme => 100.0,
        }
    }

    pub fn is_acceptable(self) -> bool {
        matches!(self, RiskLevel::Low | RiskLevel::Moderate)
    }
}

/// A proposal to shrink the lag between a task and one successor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFastTrackingOption")]
pub struct FastTrackingOption {
    task_id: String,
    successor_id: String,
    original_lag: Duration,
    proposed_lag: Duration,
    risk_level: RiskLevel,
    rework_probability: f64,
}

#[derive(Deserialize)]
struct RawFastTrackingOption {
    task_id: String,
    successor_id: String,
    original_lag: Duration,
    proposed_lag: Duration,
    risk_level: RiskLevel,
    rework_probability: f64,
}

impl TryFrom<RawFastTrackingOption> for FastTrackingOption {
    type Error = EngineError;

    fn try_from(raw: RawFastTrackingOption) -> EngineResult<Self> {
        FastTrackingOption::new(
            raw.task_id,
            raw.successor_id,
            raw.original_lag,
            raw.proposed_lag,
            raw.risk_level,
            raw.rework_probability,
        )
    }
}

impl FastTrackingOption {
    pub fn new(
        task_id: impl Into<String>,
        successor_id: impl Into<String>,
        original_lag: Duration,
        proposed_lag: Duration,
        risk_level: RiskLevel,
        rework_probability: f64,
    ) -> EngineResult<Self> {
        let task_id = task_id.into();
        let successor_id = successor_id.into();

        let reason = if !proposed_lag.is_shorter_than(&original_lag) {
            Some(format!(
                "proposed lag {} must be shorter than original lag {}",
                proposed_lag, original_lag
            ))
        } else if !(0.0..=1.0).contains(&rework_probability) {
            Some(format!(
                "rework probability must be within [0, 1], got {}",
                rework_probability
            ))
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(EngineError::InvalidFastTrackingOption {
                task_id,
                successor_id,
                reason,
            });
        }

        Ok(Self {
            task_id,
            successor_id,
            original_lag,
            proposed_lag,
            risk_level,
            rework_probability,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn successor_id(&self) -> &str {
        &self.successor_id
    }

    pub fn original_lag(&self) -> Duration {
        self.original_lag
    }

    pub fn proposed_lag(&self) -> Duration {
        self.proposed_lag
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn rework_probability(&self) -> f64 {
        self.rework_probability
    }

    pub fn time_savings(&self) -> Duration {
        self.original_lag.subtract(&self.proposed_lag)
    }

    /// Savings in hours discounted by the chance of rework.
    pub fn expected_time_savings_hours(&self) -> f64 {
        self.time_savings().to_hours() * (1.0 - self.rework_probability)
    }

    /// Formula: `base(risk_level) + 20 * rework_probability`
    pub fn risk_score(&self) -> f64 {
        self.risk_level.base_score() + 20.0 * self.rework_probability
    }

    /// Formula: `max(0, 10 * expected_hours - risk_score)`
    pub fn benefit_score(&self) -> f64 {
        (10.0 * self.expected_time_savings_hours() - self.risk_score()).max(0.0)
    }

    pub fn is_recommended(&self) -> bool {
        self.risk_level.is_acceptable()
            && self.expected_time_savings_hours() > 0.0
            && self.benefit_score() > 50.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn overlap(risk_level: RiskLevel, rework_probability: f64) -> FastTrackingOption {
        FastTrackingOption::new(
            "frame",
            "roof",
            Duration::days(5.0).unwrap(),
            Duration::days(2.0).unwrap(),
            risk_level,
            rework_probability,
        )
        .unwrap()
    }

    #[test]
    fn test_expected_savings_discounted_by_rework() {
        let option = overlap(RiskLevel::Low, 0.2);
        assert!((option.time_savings().to_hours() - 24.0).abs() < 1e-9);
        assert!((option.expected_time_savings_hours() - 19.2).abs() < 1e-9);
        assert!((option.risk_score() - 24.0).abs() < 1e-9);
        assert!((option.benefit_score() - 168.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommended_only_for_acceptable_risk() {
        assert!(overlap(RiskLevel::Low, 0.2).is_recommended());
        assert!(overlap(RiskLevel::Moderate, 0.2).is_recommended());
        assert!(!overlap(RiskLevel::High, 0.2).is_recommended());
        assert!(!overlap(RiskLevel::Extreme, 0.2).is_recommended());
        // Certain rework leaves nothing to gain.
        assert!(!overlap(RiskLevel::Low, 1.0).is_recommended());
    }

    #[test]
    fn test_benefit_never_negative() {
        let small = FastTrackingOption::new(
            "a",
            "b",
            Duration::hours(2.0).unwrap(),
            Duration::hours(1.0).unwrap(),
            RiskLevel::Extreme,
            0.9,
        )
        .unwrap();
        assert_eq!(small.benefit_score(), 0.0);
        assert!((small.risk_score() - 118.0).abs() < 1e-9);
    }

    #[test]
    fn test_validation() {
        let not_shorter = FastTrackingOption::new(
            "a",
            "b",
            Duration::days(1.0).unwrap(),
            Duration::days(1.0).unwrap(),
            RiskLevel::Low,
            0.1,
        );
        assert!(matches!(
            not_shorter.unwrap_err(),
            EngineError::InvalidFastTrackingOption { .. }
        ));

        for probability in [-0.1, 1.5, f64::NAN] {
            assert!(FastTrackingOption::new(
                "a",
                "b",
                Duration::days(2.0).unwrap(),
                Duration::days(1.0).unwrap(),
                RiskLevel::Low,
                probability,
            )
            .is_err());
        }
    }
}
