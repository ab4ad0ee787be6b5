//! Engine-local projection of project tasks.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;

/// A finish-to-start dependency on another task with optional lag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Predecessor {
    pub task_id: String,
    #[serde(default)]
    pub lag: Duration,
}

impl Predecessor {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            lag: Duration::zero(),
        }
    }

    pub fn with_lag(task_id: impl Into<String>, lag: Duration) -> Self {
        Self {
            task_id: task_id.into(),
            lag,
        }
    }
}

/// A task as seen by the engine: id, duration and the tasks that must finish first.
///
/// Built fresh by the caller for each engine call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    pub duration: Duration,
    #[serde(default)]
    pub predecessors: Vec<Predecessor>,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, duration: Duration) -> Self {
        Self {
            id: id.into(),
            duration,
            predecessors: Vec::new(),
        }
    }

    /// Add a zero-lag predecessor.
    pub fn after(mut self, predecessor_id: impl Into<String>) -> Self {
        self.predecessors.push(Predecessor::new(predecessor_id));
        self
    }

    /// Add a predecessor with a lag between its finish and this task's start.
    pub fn after_with_lag(mut self, predecessor_id: impl Into<String>, lag: Duration) -> Self {
        self.predecessors
            .push(Predecessor::with_lag(predecessor_id, lag));
        self
    }

    pub fn predecessor_ids(&self) -> impl Iterator<Item = &str> {
        self.predecessors.iter().map(|p| p.task_id.as_str())
    }
}

/// Verdict attached to leveling and compression reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Accept,
    Review,
    Reject,
}
