//! Project scheduling engine.
//!
//! Builds and validates task dependency networks, runs the Critical Path
//! Method, levels overallocated resources and evaluates schedule compression.
//! Every entry point is a pure function over caller-owned inputs; Python
//! bindings are available behind the `python` feature.

pub mod compression;
pub mod config;
pub mod critical_path;
pub mod duration;
pub mod error;
pub mod graph;
mod interner;
pub mod leveling;
pub mod logging;
pub mod models;

#[cfg(feature = "python")]
mod python;

pub use compression::{
    analyze_compression, CompressionPlan, CompressionResult, CompressionStrategy, CrashSelection,
    CrashingOption, FastTrackSelection, FastTrackingOption, RiskLevel,
};
pub use config::{CompressionConfig, CriticalPathConfig, LevelingConfig};
pub use critical_path::{
    calculate_critical_path, CriticalPath, CriticalPathAnalysis, CriticalityStatus, Float,
    TaskTiming,
};
pub use duration::{Duration, TimeUnit};
pub use error::{EngineError, EngineResult};
pub use graph::TaskGraph;
pub use leveling::{
    level_resources, LevelingAlgorithm, LevelingResult, ResourceAllocation, ResourceConstraint,
    ResourceProfile, ResourceType,
};
pub use models::{Predecessor, Recommendation, TaskNode};

/// Check a task network for duplicate ids, self-dependencies, unknown
/// predecessors and cycles.
pub fn validate_network(tasks: &[TaskNode]) -> EngineResult<()> {
    TaskGraph::validate(tasks).map(|_| ())
}

/// Task ids ordered so every task follows all of its predecessors.
///
/// Among tasks that are ready at the same time, input order is kept.
pub fn topological_sort(tasks: &[TaskNode]) -> EngineResult<Vec<String>> {
    TaskGraph::build(tasks)?.topological_ids()
}
