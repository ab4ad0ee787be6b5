//! Applying a selection of crash and fast-track options.

use chrono::NaiveDateTime;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::config::CompressionConfig;
use crate::duration::Duration;
use crate::error::{EngineError, EngineResult};
use crate::{log_changes, log_checks};

use super::crashing::CrashingOption;
use super::fast_tracking::FastTrackingOption;
use super::result::{AppliedCrash, AppliedFastTrack, CompressionResult};

/// Crash one task, by `reduction` or by its full crashable amount when `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrashSelection {
    pub task_id: String,
    #[serde(default)]
    pub reduction: Option<Duration>,
}

impl CrashSelection {
    pub fn full(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            reduction: None,
        }
    }

    pub fn by(task_id: impl Into<String>, reduction: Duration) -> Self {
        Self {
            task_id: task_id.into(),
            reduction: Some(reduction),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastTrackSelection {
    pub task_id: String,
    pub successor_id: String,
}

impl FastTrackSelection {
    pub fn new(task_id: impl Into<String>, successor_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            successor_id: successor_id.into(),
        }
    }
}

/// Which options to apply against a schedule of `original_duration`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompressionPlan {
    pub original_duration: Duration,
    #[serde(default)]
    pub crashes: Vec<CrashSelection>,
    #[serde(default)]
    pub fast_tracks: Vec<FastTrackSelection>,
    pub analyzed_at: NaiveDateTime,
}

/// Evaluate the options selected in `plan`.
///
/// Crash reductions are clamped to what the option allows. Options that were
/// offered but not selected remain available through
/// [`CompressionResult::top_unapplied_opportunities`].
pub fn analyze_compression(
    crashing: &[CrashingOption],
    fast_tracking: &[FastTrackingOption],
    plan: &CompressionPlan,
    config: &CompressionConfig,
) -> EngineResult<CompressionResult> {
    let verbosity = config.verbosity;

    let mut crash_index: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, option) in crashing.iter().enumerate() {
        if crash_index.insert(option.task_id(), i).is_some() {
            return Err(EngineError::InvalidCrashingOption {
                task_id: option.task_id().to_string(),
                reason: "more than one crashing option for the task".to_string(),
            });
        }
    }
    let mut fast_track_index: FxHashMap<(&str, &str), usize> = FxHashMap::default();
    for (i, option) in fast_tracking.iter().enumerate() {
        if fast_track_index
            .insert((option.task_id(), option.successor_id()), i)
            .is_some()
        {
            return Err(EngineError::InvalidFastTrackingOption {
                task_id: option.task_id().to_string(),
                successor_id: option.successor_id().to_string(),
                reason: "more than one fast-tracking option for the pair".to_string(),
            });
        }
    }

    let mut crash_used: FxHashSet<usize> = FxHashSet::default();
    let mut applied_crashes = Vec::with_capacity(plan.crashes.len());
    for selection in &plan.crashes {
        let Some(&i) = crash_index.get(selection.task_id.as_str()) else {
            return Err(EngineError::UnknownCompressionOption(format!(
                "crash {}",
                selection.task_id
            )));
        };
        if !crash_used.insert(i) {
            return Err(EngineError::InvalidCrashingOption {
                task_id: selection.task_id.clone(),
                reason: "selected more than once".to_string(),
            });
        }

        let option = &crashing[i];
        let max_hours = option.max_crash_hours();
        let hours = selection
            .reduction
            .map_or(max_hours, |r| r.to_hours().min(max_hours));
        let cost_increase = option.cost_for_reduction(hours) - option.normal_cost();
        log_checks!(
            verbosity,
            "  crash {}: {:.1}h of {:.1}h for ${:.2}",
            option.task_id(),
            hours,
            max_hours,
            cost_increase
        );
        applied_crashes.push(AppliedCrash {
            task_id: option.task_id().to_string(),
            reduction: Duration::hours(hours)?,
            cost_increase,
        });
    }

    let mut fast_track_used: FxHashSet<usize> = FxHashSet::default();
    let mut applied_fast_tracks = Vec::with_capacity(plan.fast_tracks.len());
    for selection in &plan.fast_tracks {
        let key = (selection.task_id.as_str(), selection.successor_id.as_str());
        let Some(&i) = fast_track_index.get(&key) else {
            return Err(EngineError::UnknownCompressionOption(format!(
                "fast-track {} -> {}",
                selection.task_id, selection.successor_id
            )));
        };
        if !fast_track_used.insert(i) {
            return Err(EngineError::InvalidFastTrackingOption {
                task_id: selection.task_id.clone(),
                successor_id: selection.successor_id.clone(),
                reason: "selected more than once".to_string(),
            });
        }

        let option = &fast_tracking[i];
        log_checks!(
            verbosity,
            "  fast-track {} -> {}: expected {:.1}h, risk {:.1}",
            option.task_id(),
            option.successor_id(),
            option.expected_time_savings_hours(),
            option.risk_score()
        );
        applied_fast_tracks.push(AppliedFastTrack {
            task_id: option.task_id().to_string(),
            successor_id: option.successor_id().to_string(),
            time_savings: option.time_savings(),
            expected_time_savings: Duration::hours(option.expected_time_savings_hours())?,
            risk_score: option.risk_score(),
        });
    }

    let unapplied_crashing = crashing
        .iter()
        .enumerate()
        .filter(|(i, _)| !crash_used.contains(i))
        .map(|(_, option)| option.clone())
        .collect();
    let unapplied_fast_tracking = fast_tracking
        .iter()
        .enumerate()
        .filter(|(i, _)| !fast_track_used.contains(i))
        .map(|(_, option)| option.clone())
        .collect();

    let result = CompressionResult::new(
        plan.original_duration,
        applied_crashes,
        applied_fast_tracks,
        unapplied_crashing,
        unapplied_fast_tracking,
        plan.analyzed_at,
    )?;
    log_changes!(
        verbosity,
        "Compression saves {:.1} days ({:?}), score {:.1}: {:?}",
        result.days_saved(),
        result.strategy,
        result.effectiveness_score,
        result.recommendation
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::crashing::tests::pour_slab;
    use crate::compression::fast_tracking::tests::overlap;
    use crate::compression::fast_tracking::RiskLevel;
    use crate::compression::result::CompressionStrategy;
    use crate::models::Recommendation;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn plan(crashes: Vec<CrashSelection>, fast_tracks: Vec<FastTrackSelection>) -> CompressionPlan {
        CompressionPlan {
            original_duration: Duration::days(40.0).unwrap(),
            crashes,
            fast_tracks,
            analyzed_at: at(),
        }
    }

    fn drywall() -> CrashingOption {
        CrashingOption::new(
            "drywall",
            "Drywall",
            Duration::days(6.0).unwrap(),
            Duration::days(4.0).unwrap(),
            3000.0,
            3400.0,
        )
        .unwrap()
    }

    #[test]
    fn test_combined_crash_and_fast_track() {
        let crashing = vec![pour_slab(), drywall()];
        let fast_tracking = vec![overlap(RiskLevel::Low, 0.2)];
        let plan = plan(
            vec![CrashSelection::by("pour", Duration::days(2.0).unwrap())],
            vec![FastTrackSelection::new("frame", "roof")],
        );

        let result =
            analyze_compression(&crashing, &fast_tracking, &plan, &CompressionConfig::default())
                .unwrap();

        // 16h crashed + 19.2h expected from the overlap.
        assert!((result.time_saved.to_hours() - 35.2).abs() < 1e-9);
        assert!((result.days_saved() - 4.4).abs() < 1e-9);
        assert!((result.compressed_duration.to_days() - 35.6).abs() < 1e-9);
        assert!((result.total_cost_increase - 500.0).abs() < 1e-9);
        assert!((result.compression_percent - 11.0).abs() < 1e-9);
        assert!((result.average_risk_score - 24.0).abs() < 1e-9);
        assert_eq!(result.strategy, CompressionStrategy::Balanced);
        // 50 + 27.5 with no cost or risk penalty.
        assert!((result.effectiveness_score - 77.5).abs() < 1e-9);
        assert_eq!(result.recommendation, Recommendation::Accept);
        assert_eq!(result.analyzed_at, at());

        let top = result.top_unapplied_opportunities(5);
        assert_eq!(top.crashing.len(), 1);
        assert_eq!(top.crashing[0].task_id(), "drywall");
        assert!(top.fast_tracking.is_empty());
    }

    #[test]
    fn test_crash_reduction_is_clamped_to_maximum() {
        let crashing = vec![pour_slab()];
        let plan = plan(vec![CrashSelection::by("pour", Duration::weeks(3.0).unwrap())], vec![]);

        let result =
            analyze_compression(&crashing, &[], &plan, &CompressionConfig::default()).unwrap();

        assert!((result.applied_crashes[0].reduction.to_hours() - 32.0).abs() < 1e-9);
        assert!((result.applied_crashes[0].cost_increase - 1000.0).abs() < 1e-9);
        assert_eq!(result.strategy, CompressionStrategy::CrashingOnly);
        assert!((result.cost_per_day_saved - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_crash_when_no_reduction_given() {
        let crashing = vec![drywall()];
        let plan = plan(vec![CrashSelection::full("drywall")], vec![]);
        let result =
            analyze_compression(&crashing, &[], &plan, &CompressionConfig::default()).unwrap();
        assert!((result.days_saved() - 2.0).abs() < 1e-9);
        assert!((result.total_cost_increase - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_selection_is_rejected() {
        let crashing = vec![pour_slab()];
        let err = analyze_compression(
            &crashing,
            &[],
            &plan(vec![CrashSelection::full("roof")], vec![]),
            &CompressionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnknownCompressionOption(_)));

        let fast_tracking = vec![overlap(RiskLevel::Low, 0.2)];
        let err = analyze_compression(
            &[],
            &fast_tracking,
            &plan(vec![], vec![FastTrackSelection::new("roof", "frame")]),
            &CompressionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnknownCompressionOption(_)));
    }

    #[test]
    fn test_duplicate_selection_is_rejected() {
        let crashing = vec![pour_slab()];
        let err = analyze_compression(
            &crashing,
            &[],
            &plan(
                vec![CrashSelection::full("pour"), CrashSelection::full("pour")],
                vec![],
            ),
            &CompressionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidCrashingOption { .. }));
    }

    #[test]
    fn test_nothing_applied() {
        let crashing = vec![pour_slab(), drywall()];
        let fast_tracking = vec![
            overlap(RiskLevel::High, 0.5),
            FastTrackingOption::new(
                "excavate",
                "footings",
                Duration::days(3.0).unwrap(),
                Duration::days(1.0).unwrap(),
                RiskLevel::Low,
                0.0,
            )
            .unwrap(),
        ];
        let result = analyze_compression(
            &crashing,
            &fast_tracking,
            &plan(vec![], vec![]),
            &CompressionConfig::default(),
        )
        .unwrap();

        assert_eq!(result.strategy, CompressionStrategy::None);
        assert!(result.time_saved.is_zero());
        assert_eq!(result.cost_per_day_saved, 0.0);
        assert_eq!(result.recommendation, Recommendation::Reject);
        assert!(result.message.starts_with("Limited savings"));

        // drywall: 16h for $400 beats pour: 32h for $1000.
        let top = result.top_unapplied_opportunities(1);
        assert_eq!(top.crashing.len(), 1);
        assert_eq!(top.crashing[0].task_id(), "drywall");
        // excavate: 160 - 20 = 140 beats frame: 120 - 90 = 30.
        let top = result.top_unapplied_opportunities(5);
        assert_eq!(top.fast_tracking[0].task_id(), "excavate");
        assert_eq!(top.fast_tracking[1].task_id(), "frame");
    }
}
