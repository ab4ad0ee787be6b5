//! Configuration types for the scheduling engine.

use serde::{Deserialize, Serialize};

use crate::duration::{Duration, TimeUnit};

/// Thresholds for critical path extraction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CriticalPathConfig {
    /// Tasks with total float at or below this are critical.
    pub critical_tolerance: Duration,
    /// Tasks with total float at or below this (but above the critical tolerance) are near-critical.
    pub near_critical_threshold: Duration,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for CriticalPathConfig {
    fn default() -> Self {
        Self {
            critical_tolerance: Duration::new(0.1, TimeUnit::Hours).unwrap_or_default(),
            near_critical_threshold: Duration::new(8.0, TimeUnit::Hours).unwrap_or_default(),
            verbosity: 0,
        }
    }
}

/// Configuration for resource leveling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelingConfig {
    /// Maximum peak-to-average variation (percent) for a profile to count as level.
    pub level_tolerance_percent: f64,
    /// Upper bound on delay decisions before giving up on remaining conflicts.
    pub max_iterations: usize,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            level_tolerance_percent: 10.0,
            max_iterations: 10_000,
            verbosity: 0,
        }
    }
}

/// Configuration for compression analysis.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_path_defaults() {
        let config = CriticalPathConfig::default();
        assert!((config.critical_tolerance.to_hours() - 0.1).abs() < 1e-9);
        assert!((config.near_critical_threshold.to_hours() - 8.0).abs() < 1e-9);
        assert_eq!(config.verbosity, 0);
    }

    #[test]
    fn test_leveling_defaults() {
        let config = LevelingConfig::default();
        assert!((config.level_tolerance_percent - 10.0).abs() < 1e-9);
        assert!(config.max_iterations > 0);
    }
}
