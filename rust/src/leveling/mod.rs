//! Resource leveling.
//!
//! Resolves overallocated resources by delaying non-critical tasks, chosen by
//! one of several priority heuristics, and scores the leveled schedule.

mod engine;
mod resource;
mod result;

pub use engine::{level_resources, LevelingAlgorithm};
pub use resource::{
    AvailabilityPeriod, OverallocationPeriod, ResourceAllocation, ResourceConstraint,
    ResourceProfile, ResourceType,
};
pub use result::{DelayedTask, LevelingMetrics, LevelingResult};
