//! Error types shared by every engine operation.

use thiserror::Error;

/// Errors returned by the scheduling engine.
///
/// Validation errors describe malformed input and can be fixed by the caller.
/// `NoCriticalPathFound` and `NegativeFloat` indicate a defect in the passes
/// themselves; see [`EngineError::is_invariant_violation`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
    #[error("Task {0} lists itself as a predecessor")]
    SelfDependency(String),
    #[error("Circular dependency detected involving task {task_id} (cycle: {})", cycle.join(" -> "))]
    CircularDependency { task_id: String, cycle: Vec<String> },
    #[error("Task {task_id} references unknown predecessor {missing_id}")]
    UnknownPredecessor { task_id: String, missing_id: String },
    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),
    #[error("Task network is empty")]
    EmptyNetwork,
    #[error("No task has zero total float; critical path could not be determined")]
    NoCriticalPathFound,
    #[error("Negative total float ({float_ms} ms) computed for task {task_id}")]
    NegativeFloat { task_id: String, float_ms: i64 },
    #[error("Task {0} has no timing in the critical path analysis")]
    MissingTiming(String),
    #[error("Invalid resource constraint {resource_id}: {reason}")]
    InvalidResourceConstraint { resource_id: String, reason: String },
    #[error("Invalid crashing option for task {task_id}: {reason}")]
    InvalidCrashingOption { task_id: String, reason: String },
    #[error("Invalid fast-tracking option {task_id} -> {successor_id}: {reason}")]
    InvalidFastTrackingOption {
        task_id: String,
        successor_id: String,
        reason: String,
    },
    #[error("No compression option matches selection {0}")]
    UnknownCompressionOption(String),
}

impl EngineError {
    /// True for errors that can only come from a bug in the engine, never from input.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            EngineError::NoCriticalPathFound | EngineError::NegativeFloat { .. }
        )
    }

    pub(crate) fn circular(task_id: &str, cycle: Vec<String>) -> Self {
        EngineError::CircularDependency {
            task_id: task_id.to_string(),
            cycle,
        }
    }
}

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
