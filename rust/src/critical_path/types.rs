//! Result types for critical path calculation.

use chrono::{NaiveDateTime, TimeDelta};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::error::{EngineError, EngineResult};

/// Slack available to a task.
///
/// Invariant: `free_float <= total_float`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Float {
    total_float: Duration,
    free_float: Duration,
}

impl Float {
    /// Total float from the earliest and latest start offsets (milliseconds).
    ///
    /// A negative result means the passes disagree and is reported as
    /// `NegativeFloat` rather than clamped.
    pub fn calculate_total_float(
        task_id: &str,
        earliest_start_ms: i64,
        latest_start_ms: i64,
    ) -> EngineResult<Duration> {
        let float_ms = latest_start_ms - earliest_start_ms;
        if float_ms < 0 {
            return Err(EngineError::NegativeFloat {
                task_id: task_id.to_string(),
                float_ms,
            });
        }
        Duration::from_millis(float_ms)
    }

    /// Free float from the task's earliest finish and the earliest moment any
    /// successor needs it finished (milliseconds).
    pub fn calculate_free_float(
        task_id: &str,
        earliest_finish_ms: i64,
        successor_deadline_ms: i64,
    ) -> EngineResult<Duration> {
        let float_ms = successor_deadline_ms - earliest_finish_ms;
        if float_ms < 0 {
            return Err(EngineError::NegativeFloat {
                task_id: task_id.to_string(),
                float_ms,
            });
        }
        Duration::from_millis(float_ms)
    }

    pub(crate) fn new(total_float: Duration, free_float: Duration) -> Self {
        debug_assert!(!free_float.is_longer_than(&total_float));
        Self {
            total_float,
            free_float,
        }
    }

    pub fn total_float(&self) -> Duration {
        self.total_float
    }

    pub fn free_float(&self) -> Duration {
        self.free_float
    }
}

/// Position of a task relative to the critical path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CriticalityStatus {
    Critical,
    NearCritical,
    Normal,
}

/// Forward/backward pass output for one task.
///
/// Offsets are working-time milliseconds from the project start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskTiming {
    pub task_id: String,
    pub duration: Duration,
    pub earliest_start_ms: i64,
    pub earliest_finish_ms: i64,
    pub latest_start_ms: i64,
    pub latest_finish_ms: i64,
    pub float: Float,
    pub status: CriticalityStatus,
}

impl TaskTiming {
    pub fn is_critical(&self) -> bool {
        self.status == CriticalityStatus::Critical
    }

    pub fn total_float(&self) -> Duration {
        self.float.total_float()
    }

    pub fn free_float(&self) -> Duration {
        self.float.free_float()
    }
}

/// The ordered chain of zero-float tasks and the project length.
///
/// Invariant: `task_ids` is non-empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalPath {
    task_ids: Vec<String>,
    total_duration: Duration,
    calculated_at: NaiveDateTime,
}

impl CriticalPath {
    pub(crate) fn new(
        task_ids: Vec<String>,
        total_duration: Duration,
        calculated_at: NaiveDateTime,
    ) -> EngineResult<Self> {
        if task_ids.is_empty() {
            return Err(EngineError::NoCriticalPathFound);
        }
        Ok(Self {
            task_ids,
            total_duration,
            calculated_at,
        })
    }

    pub fn task_ids(&self) -> &[String] {
        &self.task_ids
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn calculated_at(&self) -> NaiveDateTime {
        self.calculated_at
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.task_ids.iter().any(|id| id == task_id)
    }

    pub fn len(&self) -> usize {
        self.task_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_ids.is_empty()
    }
}

/// Full result of a critical path calculation.
///
/// `timings` are listed in the topological order used by the passes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCriticalPathAnalysis")]
pub struct CriticalPathAnalysis {
    pub project_start: NaiveDateTime,
    pub critical_path: CriticalPath,
    pub timings: Vec<TaskTiming>,
    #[serde(skip)]
    positions: FxHashMap<String, usize>,
}

/// Serialized form; the id index is rebuilt from `timings`.
#[derive(Deserialize)]
struct RawCriticalPathAnalysis {
    project_start: NaiveDateTime,
    critical_path: CriticalPath,
    timings: Vec<TaskTiming>,
}

impl From<RawCriticalPathAnalysis> for CriticalPathAnalysis {
    fn from(raw: RawCriticalPathAnalysis) -> Self {
        Self::new(raw.project_start, raw.critical_path, raw.timings)
    }
}

impl CriticalPathAnalysis {
    pub(crate) fn new(
        project_start: NaiveDateTime,
        critical_path: CriticalPath,
        timings: Vec<TaskTiming>,
    ) -> Self {
        let positions = timings
            .iter()
            .enumerate()
            .map(|(i, t)| (t.task_id.clone(), i))
            .collect();
        Self {
            project_start,
            critical_path,
            timings,
            positions,
        }
    }

    pub fn critical_path(&self) -> &CriticalPath {
        &self.critical_path
    }

    pub fn timing(&self, task_id: &str) -> Option<&TaskTiming> {
        self.positions
            .get(task_id)
            .and_then(|&i| self.timings.get(i))
    }

    pub fn float(&self, task_id: &str) -> Option<Float> {
        self.timing(task_id).map(|t| t.float)
    }

    pub fn status(&self, task_id: &str) -> Option<CriticalityStatus> {
        self.timing(task_id).map(|t| t.status)
    }

    pub fn is_critical(&self, task_id: &str) -> bool {
        self.timing(task_id).is_some_and(|t| t.is_critical())
    }

    /// Ids of near-critical tasks, in topological order.
    pub fn near_critical_tasks(&self) -> Vec<&str> {
        self.timings
            .iter()
            .filter(|t| t.status == CriticalityStatus::NearCritical)
            .map(|t| t.task_id.as_str())
            .collect()
    }

    /// Latest earliest-finish offset across all tasks.
    pub fn project_finish_ms(&self) -> i64 {
        self.timings
            .iter()
            .map(|t| t.earliest_finish_ms)
            .max()
            .unwrap_or(0)
    }

    /// Convert an offset from the project start to an instant.
    ///
    /// `None` when the instant falls outside the calendar range chrono supports.
    pub fn instant_at(&self, offset_ms: i64) -> Option<NaiveDateTime> {
        TimeDelta::try_milliseconds(offset_ms)
            .and_then(|delta| self.project_start.checked_add_signed(delta))
    }

    // The per-task instants are `None` for an unknown id or an out-of-range instant.

    pub fn earliest_start_at(&self, task_id: &str) -> Option<NaiveDateTime> {
        self.timing(task_id)
            .and_then(|t| self.instant_at(t.earliest_start_ms))
    }

    pub fn earliest_finish_at(&self, task_id: &str) -> Option<NaiveDateTime> {
        self.timing(task_id)
            .and_then(|t| self.instant_at(t.earliest_finish_ms))
    }

    pub fn latest_start_at(&self, task_id: &str) -> Option<NaiveDateTime> {
        self.timing(task_id)
            .and_then(|t| self.instant_at(t.latest_start_ms))
    }

    pub fn latest_finish_at(&self, task_id: &str) -> Option<NaiveDateTime> {
        self.timing(task_id)
            .and_then(|t| self.instant_at(t.latest_finish_ms))
    }

    pub fn project_finish_at(&self) -> Option<NaiveDateTime> {
        self.instant_at(self.project_finish_ms())
    }
}
