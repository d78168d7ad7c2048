// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scheduler settings.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings for a [`Scheduler`](crate::Scheduler)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Largest tick delta passed down to timelines, in seconds. Unset passes
    /// every delta through unchanged.
    pub max_delta: Option<f32>,
    /// Warn when a timeline's step cursor has not moved for this many seconds
    pub stall_warning: Option<f32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_delta: None,
            stall_warning: None,
        }
    }
}

impl SchedulerConfig {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Clamp ceiling as a duration
    pub fn max_delta(&self) -> Option<Duration> {
        self.max_delta.map(duration_from_secs)
    }

    /// Stall threshold as a duration
    pub fn stall_warning(&self) -> Option<Duration> {
        self.stall_warning.map(duration_from_secs)
    }
}

/// Convert seconds to a duration, rounded to whole milliseconds
pub fn duration_from_secs(seconds: f32) -> Duration {
    Duration::from_millis((seconds.max(0.0) * 1000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SchedulerConfig::default();
        assert!(config.max_delta().is_none());
        assert!(config.stall_warning().is_none());
    }

    #[test]
    fn test_config_from_ron() {
        let config = SchedulerConfig::from_ron("(stall_warning: Some(5.0))").unwrap();
        assert_eq!(config.stall_warning(), Some(Duration::from_secs(5)));
        assert_eq!(config.max_delta, SchedulerConfig::default().max_delta);

        let config = SchedulerConfig::from_ron("(max_delta: Some(0.25))").unwrap();
        assert_eq!(config.max_delta(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_duration_from_secs_rounds_to_millis() {
        assert_eq!(duration_from_secs(0.1), Duration::from_millis(100));
        assert_eq!(duration_from_secs(2.0), Duration::from_secs(2));
        assert_eq!(duration_from_secs(-1.0), Duration::ZERO);
    }

    #[test]
    fn test_config_parse_error() {
        let err = SchedulerConfig::from_ron("(max_delta: \"fast\")").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
