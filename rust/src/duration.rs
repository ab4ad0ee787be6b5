//! Time quantities on the fixed project calendar.
//!
//! The calendar is 8 working hours per day, 40 per week and 160 per month.
//! Every conversion goes through hours.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};

pub const HOURS_PER_DAY: f64 = 8.0;
pub const HOURS_PER_WEEK: f64 = 40.0;
pub const HOURS_PER_MONTH: f64 = 160.0;

/// Tolerance used by [`Duration::equals`], in hours.
pub const EQUALITY_TOLERANCE_HOURS: f64 = 0.01;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Unit a [`Duration`] is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hours,
    Days,
    Weeks,
    Months,
}

impl TimeUnit {
    /// Number of calendar hours in one unit.
    pub fn hours(self) -> f64 {
        match self {
            TimeUnit::Hours => 1.0,
            TimeUnit::Days => HOURS_PER_DAY,
            TimeUnit::Weeks => HOURS_PER_WEEK,
            TimeUnit::Months => HOURS_PER_MONTH,
        }
    }

    fn label(self, value: f64) -> &'static str {
        let singular = (value - 1.0).abs() < f64::EPSILON;
        match (self, singular) {
            (TimeUnit::Hours, true) => "hour",
            (TimeUnit::Hours, false) => "hours",
            (TimeUnit::Days, true) => "day",
            (TimeUnit::Days, false) => "days",
            (TimeUnit::Weeks, true) => "week",
            (TimeUnit::Weeks, false) => "weeks",
            (TimeUnit::Months, true) => "month",
            (TimeUnit::Months, false) => "months",
        }
    }
}

/// Immutable, non-negative amount of working time.
///
/// Equality is value-based with a 0.01 hour tolerance, so `Duration::days(1.0)`
/// equals `Duration::hours(8.0)`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawDuration")]
pub struct Duration {
    value: f64,
    unit: TimeUnit,
}

#[derive(Deserialize)]
struct RawDuration {
    value: f64,
    unit: TimeUnit,
}

impl TryFrom<RawDuration> for Duration {
    type Error = EngineError;

    fn try_from(raw: RawDuration) -> EngineResult<Self> {
        Duration::new(raw.value, raw.unit)
    }
}

impl Duration {
    /// Create a duration, rejecting negative and non-finite values.
    pub fn new(value: f64, unit: TimeUnit) -> EngineResult<Self> {
        if !value.is_finite() {
            return Err(EngineError::InvalidDuration(format!(
                "value must be finite, got {}",
                value
            )));
        }
        if value < 0.0 {
            return Err(EngineError::InvalidDuration(format!(
                "value must be non-negative, got {}",
                value
            )));
        }
        Ok(Self { value, unit })
    }

    pub fn hours(value: f64) -> EngineResult<Self> {
        Self::new(value, TimeUnit::Hours)
    }

    pub fn days(value: f64) -> EngineResult<Self> {
        Self::new(value, TimeUnit::Days)
    }

    pub fn weeks(value: f64) -> EngineResult<Self> {
        Self::new(value, TimeUnit::Weeks)
    }

    pub fn months(value: f64) -> EngineResult<Self> {
        Self::new(value, TimeUnit::Months)
    }

    pub fn zero() -> Self {
        Self {
            value: 0.0,
            unit: TimeUnit::Days,
        }
    }

    /// Build a duration from whole milliseconds of working time.
    pub fn from_millis(millis: i64) -> EngineResult<Self> {
        Self::hours(millis as f64 / MILLIS_PER_HOUR)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn to_hours(&self) -> f64 {
        self.value * self.unit.hours()
    }

    pub fn to_days(&self) -> f64 {
        self.to_hours() / HOURS_PER_DAY
    }

    pub fn to_weeks(&self) -> f64 {
        self.to_hours() / HOURS_PER_WEEK
    }

    pub fn to_months(&self) -> f64 {
        self.to_hours() / HOURS_PER_MONTH
    }

    /// Working time in whole milliseconds, rounded to the nearest millisecond.
    pub fn to_millis(&self) -> i64 {
        (self.to_hours() * MILLIS_PER_HOUR).round() as i64
    }

    /// Like [`Duration::to_millis`], but `None` when the value does not fit in an `i64`.
    pub fn checked_millis(&self) -> Option<i64> {
        let millis = (self.to_hours() * MILLIS_PER_HOUR).round();
        (millis.abs() < i64::MAX as f64).then_some(millis as i64)
    }

    pub fn convert_to(&self, unit: TimeUnit) -> Self {
        Self {
            value: self.to_hours() / unit.hours(),
            unit,
        }
    }

    /// Sum of both durations, expressed in days.
    pub fn add(&self, other: &Duration) -> Self {
        Self {
            value: self.to_days() + other.to_days(),
            unit: TimeUnit::Days,
        }
    }

    /// Difference expressed in days, floored at zero.
    pub fn subtract(&self, other: &Duration) -> Self {
        Self {
            value: (self.to_days() - other.to_days()).max(0.0),
            unit: TimeUnit::Days,
        }
    }

    pub fn multiply(&self, factor: f64) -> EngineResult<Self> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(EngineError::InvalidDuration(format!(
                "multiplier must be finite and non-negative, got {}",
                factor
            )));
        }
        Self::new(self.value * factor, self.unit)
    }

    pub fn is_zero(&self) -> bool {
        self.to_hours().abs() < EQUALITY_TOLERANCE_HOURS
    }

    pub fn is_longer_than(&self, other: &Duration) -> bool {
        self.to_hours() - other.to_hours() > EQUALITY_TOLERANCE_HOURS
    }

    pub fn is_shorter_than(&self, other: &Duration) -> bool {
        other.to_hours() - self.to_hours() > EQUALITY_TOLERANCE_HOURS
    }

    pub fn equals(&self, other: &Duration) -> bool {
        (self.to_hours() - other.to_hours()).abs() < EQUALITY_TOLERANCE_HOURS
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl std::ops::Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration::add(&self, &rhs)
    }
}

impl std::ops::Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        self.subtract(&rhs)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.label(self.value))
    }
}
