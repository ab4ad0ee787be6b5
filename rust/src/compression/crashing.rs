//! Crashing: buying time on a task with extra cost.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::error::{EngineError, EngineResult};

/// A way to shorten one task from its normal to its crashed duration.
///
/// Cost grows linearly with the hours removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCrashingOption")]
pub struct CrashingOption {
    task_id: String,
    task_name: String,
    normal_duration: Duration,
    crashed_duration: Duration,
    normal_cost: f64,
    crashed_cost: f64,
}

#[derive(Deserialize)]
struct RawCrashingOption {
    task_id: String,
    #[serde(default)]
    task_name: String,
    normal_duration: Duration,
    crashed_duration: Duration,
    normal_cost: f64,
    crashed_cost: f64,
}

impl TryFrom<RawCrashingOption> for CrashingOption {
    type Error = EngineError;

    fn try_from(raw: RawCrashingOption) -> EngineResult<Self> {
        CrashingOption::new(
            raw.task_id,
            raw.task_name,
            raw.normal_duration,
            raw.crashed_duration,
            raw.normal_cost,
            raw.crashed_cost,
        )
    }
}

impl CrashingOption {
    pub fn new(
        task_id: impl Into<String>,
        task_name: impl Into<String>,
        normal_duration: Duration,
        crashed_duration: Duration,
        normal_cost: f64,
        crashed_cost: f64,
    ) -> EngineResult<Self> {
        let task_id = task_id.into();
        let invalid = |reason: String| EngineError::InvalidCrashingOption {
            task_id: task_id.clone(),
            reason,
        };

        if !crashed_duration.is_shorter_than(&normal_duration) {
            return Err(invalid(format!(
                "crashed duration {} must be shorter than normal duration {}",
                crashed_duration, normal_duration
            )));
        }
        if !normal_cost.is_finite() || !crashed_cost.is_finite() || normal_cost < 0.0 {
            return Err(invalid(format!(
                "costs must be finite and non-negative, got {} and {}",
                normal_cost, crashed_cost
            )));
        }
        if crashed_cost < normal_cost {
            return Err(invalid(format!(
                "crashed cost {} is below normal cost {}",
                crashed_cost, normal_cost
            )));
        }

        Ok(Self {
            task_id,
            task_name: task_name.into(),
            normal_duration,
            crashed_duration,
            normal_cost,
            crashed_cost,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn normal_duration(&self) -> Duration {
        self.normal_duration
    }

    pub fn crashed_duration(&self) -> Duration {
        self.crashed_duration
    }

    pub fn normal_cost(&self) -> f64 {
        self.normal_cost
    }

    pub fn crashed_cost(&self) -> f64 {
        self.crashed_cost
    }

    pub fn max_crash_hours(&self) -> f64 {
        self.normal_duration.to_hours() - self.crashed_duration.to_hours()
    }

    /// Extra cost per hour removed.
    ///
    /// Formula: `(crashed_cost - normal_cost) / max_crash_hours`
    pub fn cost_slope(&self) -> f64 {
        (self.crashed_cost - self.normal_cost) / self.max_crash_hours()
    }

    /// Total task cost after removing `hours`, clamped to `[0, max_crash_hours]`.
    pub fn cost_for_reduction(&self, hours: f64) -> f64 {
        let hours = hours.clamp(0.0, self.max_crash_hours());
        self.normal_cost + self.cost_slope() * hours
    }

    /// Hours saved per dollar spent at full crash; infinite when crashing is free.
    pub fn efficiency(&self) -> f64 {
        let extra = self.crashed_cost - self.normal_cost;
        if extra <= 0.0 {
            f64::INFINITY
        } else {
            self.max_crash_hours() / extra
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn pour_slab() -> CrashingOption {
        CrashingOption::new(
            "pour",
            "Pour slab",
            Duration::days(10.0).unwrap(),
            Duration::days(6.0).unwrap(),
            1000.0,
            2000.0,
        )
        .unwrap()
    }

    #[test]
    fn test_cost_slope_per_hour() {
        let option = pour_slab();
        assert!((option.max_crash_hours() - 32.0).abs() < 1e-9);
        assert!((option.cost_slope() - 31.25).abs() < 1e-9);
        assert!((option.cost_for_reduction(16.0) - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_cost_for_reduction_is_clamped() {
        let option = pour_slab();
        assert!((option.cost_for_reduction(-5.0) - 1000.0).abs() < 1e-9);
        assert!((option.cost_for_reduction(0.0) - 1000.0).abs() < 1e-9);
        assert!((option.cost_for_reduction(32.0) - 2000.0).abs() < 1e-9);
        assert!((option.cost_for_reduction(100.0) - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency() {
        assert!((pour_slab().efficiency() - 0.032).abs() < 1e-12);

        let free = CrashingOption::new(
            "paint",
            "Paint",
            Duration::days(2.0).unwrap(),
            Duration::days(1.0).unwrap(),
            300.0,
            300.0,
        )
        .unwrap();
        assert!(free.efficiency().is_infinite());
        assert_eq!(free.cost_slope(), 0.0);
    }

    #[test]
    fn test_validation() {
        let longer = CrashingOption::new(
            "a",
            "A",
            Duration::days(2.0).unwrap(),
            Duration::days(3.0).unwrap(),
            100.0,
            200.0,
        );
        assert!(matches!(
            longer.unwrap_err(),
            EngineError::InvalidCrashingOption { .. }
        ));

        let same = CrashingOption::new(
            "a",
            "A",
            Duration::days(2.0).unwrap(),
            Duration::hours(16.0).unwrap(),
            100.0,
            200.0,
        );
        assert!(same.is_err());

        let cheaper = CrashingOption::new(
            "a",
            "A",
            Duration::days(2.0).unwrap(),
            Duration::days(1.0).unwrap(),
            200.0,
            100.0,
        );
        assert!(cheaper.is_err());

        let nan = CrashingOption::new(
            "a",
            "A",
            Duration::days(2.0).unwrap(),
            Duration::days(1.0).unwrap(),
            f64::NAN,
            100.0,
        );
        assert!(nan.is_err());
    }
}
