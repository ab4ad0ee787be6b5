//! Schedule compression.
//!
//! Evaluates crashing (cost for time) and fast-tracking (overlap for rework
//! risk) and scores a chosen combination of both.

mod analyzer;
mod crashing;
mod fast_tracking;
mod result;

pub use analyzer::{analyze_compression, CompressionPlan, CrashSelection, FastTrackSelection};
pub use crashing::CrashingOption;
pub use fast_tracking::{FastTrackingOption, RiskLevel};
pub use result::{
    effectiveness_score, AppliedCrash, AppliedFastTrack, CompressionResult, CompressionStrategy,
    Opportunities,
};
