//! Leveling outcome and its scoring.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::models::Recommendation;

use super::engine::LevelingAlgorithm;
use super::resource::ResourceProfile;

/// A task moved later by leveling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayedTask {
    pub task_id: String,
    pub delay: Duration,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelingMetrics {
    /// Growth of the project duration as a percentage of the original.
    pub schedule_extension_percent: f64,
    pub overallocations_before: usize,
    pub overallocations_resolved: usize,
    pub remaining_overallocations: usize,
    /// Highest peak utilization (percent) across resources.
    pub peak_utilization: f64,
    /// Mean of per-resource average utilization (percent).
    pub average_utilization: f64,
    /// Mean of per-resource standard deviation of allocated units.
    pub smoothness: f64,
    /// Mean of per-resource coefficient of variation.
    pub coefficient_of_variation: f64,
}

impl LevelingMetrics {
    pub(crate) fn measure(
        original_duration: &Duration,
        leveled_duration: &Duration,
        overallocations_before: usize,
        leveled_profiles: &[ResourceProfile],
    ) -> Self {
        let original_hours = original_duration.to_hours();
        let schedule_extension_percent = if original_hours > 0.0 {
            ((leveled_duration.to_hours() - original_hours) / original_hours * 100.0).max(0.0)
        } else {
            0.0
        };

        let remaining_overallocations: usize = leveled_profiles
            .iter()
            .map(|p| p.overallocation_periods().len())
            .sum();

        let count = leveled_profiles.len();
        let mean = |f: fn(&ResourceProfile) -> f64| {
            if count == 0 {
                0.0
            } else {
                leveled_profiles.iter().map(f).sum::<f64>() / count as f64
            }
        };

        Self {
            schedule_extension_percent,
            overallocations_before,
            overallocations_resolved: overallocations_before.saturating_sub(remaining_overallocations),
            remaining_overallocations,
            peak_utilization: leveled_profiles
                .iter()
                .map(ResourceProfile::peak_utilization)
                .fold(0.0, f64::max),
            average_utilization: mean(ResourceProfile::average_utilization),
            smoothness: mean(ResourceProfile::smoothness),
            coefficient_of_variation: mean(ResourceProfile::coefficient_of_variation),
        }
    }

    /// Effectiveness in [0, 100].
    ///
    /// Starts at 50, loses a point per percent of extension (at most 30),
    /// gains 40 when nothing is overallocated, loses up to 20 for uneven
    /// profiles and gains up to 10 for average utilization close to the peak.
    pub fn effectiveness_score(&self) -> f64 {
        let mut score = 50.0;
        score -= self.schedule_extension_percent.min(30.0);
        if self.remaining_overallocations == 0 {
            score += 40.0;
        }
        score -= (20.0 * self.coefficient_of_variation).min(20.0);
        if self.peak_utilization > 0.0 {
            score += (10.0 * self.average_utilization / self.peak_utilization).min(10.0);
        }
        score.clamp(0.0, 100.0)
    }
}

/// Output of [`level_resources`](super::level_resources).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelingResult {
    pub algorithm: LevelingAlgorithm,
    pub original_duration: Duration,
    pub leveled_duration: Duration,
    pub leveled_profiles: Vec<ResourceProfile>,
    /// Delayed tasks in topological order.
    pub delayed_tasks: Vec<DelayedTask>,
    pub metrics: LevelingMetrics,
    pub effectiveness_score: f64,
    pub recommendation: Recommendation,
    /// Delay decisions considered before leveling stopped.
    pub iterations: usize,
}

impl LevelingResult {
    pub(crate) fn new(
        algorithm: LevelingAlgorithm,
        original_duration: Duration,
        leveled_duration: Duration,
        leveled_profiles: Vec<ResourceProfile>,
        delayed_tasks: Vec<DelayedTask>,
        metrics: LevelingMetrics,
        iterations: usize,
    ) -> Self {
        let effectiveness_score = metrics.effectiveness_score();
        let impact_days = leveled_duration.subtract(&original_duration).to_days();
        let recommendation = recommend(effectiveness_score, impact_days);
        Self {
            algorithm,
            original_duration,
            leveled_duration,
            leveled_profiles,
            delayed_tasks,
            metrics,
            effectiveness_score,
            recommendation,
            iterations,
        }
    }

    /// How much longer the leveled schedule is than the original.
    pub fn schedule_impact(&self) -> Duration {
        self.leveled_duration.subtract(&self.original_duration)
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.metrics.remaining_overallocations == 0
    }

    pub fn delay_of(&self, task_id: &str) -> Option<Duration> {
        self.delayed_tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .map(|t| t.delay)
    }

    /// Total cost of the leveled allocations across resources.
    pub fn total_cost(&self) -> f64 {
        self.leveled_profiles.iter().map(|p| p.total_cost()).sum()
    }
}

fn recommend(score: f64, impact_days: f64) -> Recommendation {
    if score >= 80.0 && impact_days < 5.0 {
        Recommendation::Accept
    } else if score >= 60.0 && impact_days < 10.0 {
        Recommendation::Review
    } else {
        Recommendation::Reject
    }
}
