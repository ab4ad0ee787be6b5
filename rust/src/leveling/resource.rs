//! Resource constraints and allocation profiles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Allocations within this many units of the limit are not overallocated.
const UNITS_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Labor,
    Equipment,
    Material,
}

/// Inclusive date range during which a resource can be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AvailabilityPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &AvailabilityPeriod) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Limits on how much of a resource can be used per day.
///
/// Availability periods are kept sorted by start date and never overlap. A
/// constraint without periods is available every day; otherwise capacity is
/// zero outside the declared periods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResourceConstraint")]
pub struct ResourceConstraint {
    resource_id: String,
    resource_name: String,
    resource_type: ResourceType,
    max_units_available: f64,
    cost_per_unit: f64,
    available_periods: Vec<AvailabilityPeriod>,
}

#[derive(Deserialize)]
struct RawResourceConstraint {
    resource_id: String,
    resource_name: String,
    resource_type: ResourceType,
    max_units_available: f64,
    cost_per_unit: f64,
    #[serde(default)]
    available_periods: Vec<AvailabilityPeriod>,
}

impl TryFrom<RawResourceConstraint> for ResourceConstraint {
    type Error = EngineError;

    fn try_from(raw: RawResourceConstraint) -> EngineResult<Self> {
        ResourceConstraint::new(
            raw.resource_id,
            raw.resource_name,
            raw.resource_type,
            raw.max_units_available,
            raw.cost_per_unit,
            raw.available_periods,
        )
    }
}

impl ResourceConstraint {
    pub fn new(
        resource_id: impl Into<String>,
        resource_name: impl Into<String>,
        resource_type: ResourceType,
        max_units_available: f64,
        cost_per_unit: f64,
        mut available_periods: Vec<AvailabilityPeriod>,
    ) -> EngineResult<Self> {
        let resource_id = resource_id.into();
        let invalid = |reason: String| EngineError::InvalidResourceConstraint {
            resource_id: resource_id.clone(),
            reason,
        };

        if !max_units_available.is_finite() || max_units_available <= 0.0 {
            return Err(invalid(format!(
                "max units available must be positive, got {}",
                max_units_available
            )));
        }
        if !cost_per_unit.is_finite() || cost_per_unit < 0.0 {
            return Err(invalid(format!(
                "cost per unit must be non-negative, got {}",
                cost_per_unit
            )));
        }
        if let Some(p) = available_periods.iter().find(|p| p.start > p.end) {
            return Err(invalid(format!(
                "availability period starts after it ends ({} > {})",
                p.start, p.end
            )));
        }

        available_periods.sort_by_key(|p| p.start);
        for pair in available_periods.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(invalid(format!(
                    "availability periods {}..{} and {}..{} overlap",
                    pair[0].start, pair[0].end, pair[1].start, pair[1].end
                )));
            }
        }

        Ok(Self {
            resource_id,
            resource_name: resource_name.into(),
            resource_type,
            max_units_available,
            cost_per_unit,
            available_periods,
        })
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn max_units_available(&self) -> f64 {
        self.max_units_available
    }

    pub fn cost_per_unit(&self) -> f64 {
        self.cost_per_unit
    }

    pub fn available_periods(&self) -> &[AvailabilityPeriod] {
        &self.available_periods
    }

    /// Whether the resource can be used on `date`. Binary search over the sorted periods.
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        if self.available_periods.is_empty() {
            return true;
        }
        let idx = self.available_periods.partition_point(|p| p.end < date);
        self.available_periods
            .get(idx)
            .is_some_and(|p| p.contains(date))
    }

    /// Units usable on `date`.
    pub fn capacity_on(&self, date: NaiveDate) -> f64 {
        if self.is_available_on(date) {
            self.max_units_available
        } else {
            0.0
        }
    }
}

/// Units of a resource in use on one date and the tasks using them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub date: NaiveDate,
    pub units_allocated: f64,
    pub task_ids: Vec<String>,
}

impl ResourceAllocation {
    pub fn new(date: NaiveDate, units_allocated: f64, task_ids: Vec<String>) -> Self {
        Self {
            date,
            units_allocated,
            task_ids,
        }
    }
}

/// A contiguous run of overallocated points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverallocationPeriod {
    pub start: NaiveDate,
    /// Last overallocated date in the run.
    pub end: NaiveDate,
    /// Largest excess of allocated units over capacity within the run.
    pub peak_overallocation: f64,
    /// Every task contributing to the run, sorted and deduplicated.
    pub task_ids: Vec<String>,
}

/// Allocation time series of one constrained resource.
///
/// Allocations are sorted by date with one point per date (entries sharing a
/// date are merged). Every metric is computed on demand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResourceProfile")]
pub struct ResourceProfile {
    constraint: ResourceConstraint,
    allocations: Vec<ResourceAllocation>,
}

#[derive(Deserialize)]
struct RawResourceProfile {
    constraint: ResourceConstraint,
    #[serde(default)]
    allocations: Vec<ResourceAllocation>,
}

impl TryFrom<RawResourceProfile> for ResourceProfile {
    type Error = EngineError;

    fn try_from(raw: RawResourceProfile) -> EngineResult<Self> {
        ResourceProfile::new(raw.constraint, raw.allocations)
    }
}

impl ResourceProfile {
    pub fn new(
        constraint: ResourceConstraint,
        mut allocations: Vec<ResourceAllocation>,
    ) -> EngineResult<Self> {
        if let Some(a) = allocations
            .iter()
            .find(|a| !a.units_allocated.is_finite() || a.units_allocated < 0.0)
        {
            return Err(EngineError::InvalidResourceConstraint {
                resource_id: constraint.resource_id.clone(),
                reason: format!(
                    "allocation on {} has invalid units {}",
                    a.date, a.units_allocated
                ),
            });
        }

        allocations.sort_by_key(|a| a.date);
        let mut merged: Vec<ResourceAllocation> = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            match merged.last_mut() {
                Some(last) if last.date == allocation.date => {
                    last.units_allocated += allocation.units_allocated;
                    for id in allocation.task_ids {
                        if !last.task_ids.contains(&id) {
                            last.task_ids.push(id);
                        }
                    }
                }
                _ => merged.push(allocation),
            }
        }

        Ok(Self {
            constraint,
            allocations: merged,
        })
    }

    pub fn constraint(&self) -> &ResourceConstraint {
        &self.constraint
    }

    pub fn allocations(&self) -> &[ResourceAllocation] {
        &self.allocations
    }

    pub fn resource_id(&self) -> &str {
        self.constraint.resource_id()
    }

    pub fn peak_units(&self) -> f64 {
        self.allocations
            .iter()
            .map(|a| a.units_allocated)
            .fold(0.0, f64::max)
    }

    pub fn average_units(&self) -> f64 {
        if self.allocations.is_empty() {
            return 0.0;
        }
        self.allocations
            .iter()
            .map(|a| a.units_allocated)
            .sum::<f64>()
            / self.allocations.len() as f64
    }

    /// Standard deviation of allocated units; lower is smoother.
    pub fn smoothness(&self) -> f64 {
        if self.allocations.is_empty() {
            return 0.0;
        }
        let mean = self.average_units();
        let variance = self
            .allocations
            .iter()
            .map(|a| (a.units_allocated - mean).powi(2))
            .sum::<f64>()
            / self.allocations.len() as f64;
        variance.sqrt()
    }

    /// Standard deviation relative to the mean (0 for an idle resource).
    pub fn coefficient_of_variation(&self) -> f64 {
        let mean = self.average_units();
        if mean <= 0.0 {
            0.0
        } else {
            self.smoothness() / mean
        }
    }

    /// Peak-to-average variation as a percentage of the average.
    pub fn variation_percent(&self) -> f64 {
        let mean = self.average_units();
        if mean <= 0.0 {
            0.0
        } else {
            (self.peak_units() - mean) / mean * 100.0
        }
    }

    pub fn is_level(&self, tolerance_percent: f64) -> bool {
        self.variation_percent() <= tolerance_percent
    }

    /// Peak allocation as a percentage of the maximum units available.
    pub fn peak_utilization(&self) -> f64 {
        self.peak_units() / self.constraint.max_units_available * 100.0
    }

    pub fn average_utilization(&self) -> f64 {
        self.average_units() / self.constraint.max_units_available * 100.0
    }

    pub fn total_cost(&self) -> f64 {
        self.allocations
            .iter()
            .map(|a| a.units_allocated)
            .sum::<f64>()
            * self.constraint.cost_per_unit
    }

    pub fn is_overallocated_on(&self, allocation: &ResourceAllocation) -> bool {
        allocation.units_allocated > self.constraint.capacity_on(allocation.date) + UNITS_EPSILON
    }

    /// Scan the series for runs of overallocated points.
    ///
    /// A run opens at the first point over capacity and closes at the first
    /// point back within it.
    pub fn overallocation_periods(&self) -> Vec<OverallocationPeriod> {
        let mut periods = Vec::new();
        let mut current: Option<OverallocationPeriod> = None;

        for allocation in &self.allocations {
            let excess =
                allocation.units_allocated - self.constraint.capacity_on(allocation.date);
            if self.is_overallocated_on(allocation) {
                let period = current.get_or_insert_with(|| OverallocationPeriod {
                    start: allocation.date,
                    end: allocation.date,
                    peak_overallocation: 0.0,
                    task_ids: Vec::new(),
                });
                period.end = allocation.date;
                period.peak_overallocation = period.peak_overallocation.max(excess);
                period.task_ids.extend(allocation.task_ids.iter().cloned());
            } else if let Some(period) = current.take() {
                periods.push(period);
            }
        }
        if let Some(period) = current.take() {
            periods.push(period);
        }

        for period in &mut periods {
            period.task_ids.sort();
            period.task_ids.dedup();
        }
        periods
    }

    pub fn is_overallocated(&self) -> bool {
        self.allocations.iter().any(|a| self.is_overallocated_on(a))
    }
}
