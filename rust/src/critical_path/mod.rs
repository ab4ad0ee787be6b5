//! Critical Path Method.
//!
//! Forward pass for earliest start/finish, backward pass for latest
//! start/finish, float per task and the ordered chain of critical tasks.

mod calculation;
mod types;

pub use calculation::{calculate_critical_path, calculate_for_graph};
pub use types::{CriticalPath, CriticalPathAnalysis, CriticalityStatus, Float, TaskTiming};
