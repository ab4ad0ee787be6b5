//! Combined compression outcome, scoring and recommendation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::error::EngineResult;
use crate::models::Recommendation;

use super::crashing::CrashingOption;
use super::fast_tracking::FastTrackingOption;

/// Mix of actions in an applied compression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionStrategy {
    None,
    CrashingOnly,
    FastTrackingOnly,
    CrashingDominant,
    FastTrackingDominant,
    Balanced,
}

impl CompressionStrategy {
    /// Classify by the share of applied actions that are crashes.
    pub fn classify(crashes: usize, fast_tracks: usize) -> Self {
        match (crashes, fast_tracks) {
            (0, 0) => CompressionStrategy::None,
            (_, 0) => CompressionStrategy::CrashingOnly,
            (0, _) => CompressionStrategy::FastTrackingOnly,
            _ => {
                let ratio = crashes as f64 / (crashes + fast_tracks) as f64;
                if ratio > 0.7 {
                    CompressionStrategy::CrashingDominant
                } else if ratio < 0.3 {
                    CompressionStrategy::FastTrackingDominant
                } else {
                    CompressionStrategy::Balanced
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedCrash {
    pub task_id: String,
    pub reduction: Duration,
    /// Cost above the task's normal cost.
    pub cost_increase: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedFastTrack {
    pub task_id: String,
    pub successor_id: String,
    pub time_savings: Duration,
    pub expected_time_savings: Duration,
    pub risk_score: f64,
}

/// Unapplied options worth a second look, best first.
#[derive(Debug)]
pub struct Opportunities<'a> {
    pub crashing: Vec<&'a CrashingOption>,
    pub fast_tracking: Vec<&'a FastTrackingOption>,
}

/// Output of [`analyze_compression`](super::analyze_compression).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    pub original_duration: Duration,
    pub compressed_duration: Duration,
    pub time_saved: Duration,
    pub applied_crashes: Vec<AppliedCrash>,
    pub applied_fast_tracks: Vec<AppliedFastTrack>,
    pub total_cost_increase: f64,
    pub compression_percent: f64,
    /// Zero when nothing was saved.
    pub cost_per_day_saved: f64,
    pub strategy: CompressionStrategy,
    /// Mean risk score of applied fast-tracks; zero when none were applied.
    pub average_risk_score: f64,
    pub effectiveness_score: f64,
    pub recommendation: Recommendation,
    pub message: String,
    pub analyzed_at: NaiveDateTime,
    pub(crate) unapplied_crashing: Vec<CrashingOption>,
    pub(crate) unapplied_fast_tracking: Vec<FastTrackingOption>,
}

impl CompressionResult {
    /// Total the applied actions and score them.
    ///
    /// Fails with `InvalidDuration` when the combined savings are not a finite duration.
    pub(crate) fn new(
        original_duration: Duration,
        applied_crashes: Vec<AppliedCrash>,
        applied_fast_tracks: Vec<AppliedFastTrack>,
        unapplied_crashing: Vec<CrashingOption>,
        unapplied_fast_tracking: Vec<FastTrackingOption>,
        analyzed_at: NaiveDateTime,
    ) -> EngineResult<Self> {
        let crash_hours: f64 = applied_crashes.iter().map(|c| c.reduction.to_hours()).sum();
        let fast_track_hours: f64 = applied_fast_tracks
            .iter()
            .map(|f| f.expected_time_savings.to_hours())
            .sum();
        let saved_hours = crash_hours + fast_track_hours;
        let time_saved = Duration::hours(saved_hours)?;
        let compressed_duration = original_duration.subtract(&time_saved);

        let total_cost_increase: f64 = applied_crashes.iter().map(|c| c.cost_increase).sum();
        let original_hours = original_duration.to_hours();
        let compression_percent = if original_hours > 0.0 {
            saved_hours / original_hours * 100.0
        } else {
            0.0
        };
        let days_saved = time_saved.to_days();
        let cost_per_day_saved = if days_saved > 0.0 {
            total_cost_increase / days_saved
        } else {
            0.0
        };
        let average_risk_score = if applied_fast_tracks.is_empty() {
            0.0
        } else {
            applied_fast_tracks.iter().map(|f| f.risk_score).sum::<f64>()
                / applied_fast_tracks.len() as f64
        };
        let strategy =
            CompressionStrategy::classify(applied_crashes.len(), applied_fast_tracks.len());

        let effectiveness_score =
            effectiveness_score(compression_percent, cost_per_day_saved, average_risk_score);
        let (recommendation, message) =
            recommend(effectiveness_score, days_saved, cost_per_day_saved);

        Ok(Self {
            original_duration,
            compressed_duration,
            time_saved,
            applied_crashes,
            applied_fast_tracks,
            total_cost_increase,
            compression_percent,
            cost_per_day_saved,
            strategy,
            average_risk_score,
            effectiveness_score,
            recommendation,
            message,
            analyzed_at,
            unapplied_crashing,
            unapplied_fast_tracking,
        })
    }

    pub fn days_saved(&self) -> f64 {
        self.time_saved.to_days()
    }

    /// Up to `limit` unapplied crash options ranked by efficiency and up to
    /// `limit` unapplied fast-track options ranked by benefit score.
    pub fn top_unapplied_opportunities(&self, limit: usize) -> Opportunities<'_> {
        let mut crashing: Vec<&CrashingOption> = self.unapplied_crashing.iter().collect();
        crashing.sort_by(|a, b| {
            b.efficiency()
                .total_cmp(&a.efficiency())
                .then_with(|| a.task_id().cmp(b.task_id()))
        });
        crashing.truncate(limit);

        let mut fast_tracking: Vec<&FastTrackingOption> =
            self.unapplied_fast_tracking.iter().collect();
        fast_tracking.sort_by(|a, b| {
            b.benefit_score()
                .total_cmp(&a.benefit_score())
                .then_with(|| a.task_id().cmp(b.task_id()))
                .then_with(|| a.successor_id().cmp(b.successor_id()))
        });
        fast_tracking.truncate(limit);

        Opportunities {
            crashing,
            fast_tracking,
        }
    }
}

/// Effectiveness in [0, 100].
///
/// Formula: `50 + min(50, 2.5 * compression_percent) - cost_penalty - risk_penalty`
/// where the cost penalty is 10/20/30 above $2k/$5k/$10k per day saved and the
/// risk penalty is 10/20/30 above an average risk score of 40/60/80.
pub fn effectiveness_score(
    compression_percent: f64,
    cost_per_day_saved: f64,
    average_risk_score: f64,
) -> f64 {
    let reward = (2.5 * compression_percent).min(50.0);

    let cost_penalty = if cost_per_day_saved > 10_000.0 {
        30.0
    } else if cost_per_day_saved > 5_000.0 {
        20.0
    } else if cost_per_day_saved > 2_000.0 {
        10.0
    } else {
        0.0
    };

    let risk_penalty = if average_risk_score > 80.0 {
        30.0
    } else if average_risk_score > 60.0 {
        20.0
    } else if average_risk_score > 40.0 {
        10.0
    } else {
        0.0
    };

    (50.0 + reward - cost_penalty - risk_penalty).clamp(0.0, 100.0)
}

fn recommend(score: f64, days_saved: f64, cost_per_day_saved: f64) -> (Recommendation, String) {
    if (score >= 70.0 && days_saved >= 5.0)
        || (score >= 50.0 && days_saved >= 3.0 && cost_per_day_saved < 5_000.0)
    {
        (
            Recommendation::Accept,
            format!(
                "Compression saves {:.1} days at ${:.0} per day",
                days_saved, cost_per_day_saved
            ),
        )
    } else if score >= 40.0 && days_saved >= 2.0 {
        (
            Recommendation::Review,
            format!(
                "Compression saves {:.1} days; review cost and rework risk before committing",
                days_saved
            ),
        )
    } else if days_saved < 2.0 {
        (
            Recommendation::Reject,
            format!("Limited savings: only {:.1} days gained", days_saved),
        )
    } else {
        (
            Recommendation::Reject,
            format!(
                "Cost and risk outweigh the {:.1} days saved",
                days_saved
            ),
        )
    }
}
