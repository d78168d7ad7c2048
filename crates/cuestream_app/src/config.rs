// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host configuration loaded from RON.

use cuestream_sequencer::{ConfigError, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Mixer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Master volume (0.0 to 1.0)
    pub master_volume: f32,
    /// Background music volume (0.0 to 1.0)
    pub bgm_volume: f32,
    /// Sound effect volume (0.0 to 1.0)
    pub se_volume: f32,
    /// Sound effect voices allocated up front
    pub se_voices: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            bgm_volume: 1.0,
            se_volume: 1.0,
            se_voices: 10,
        }
    }
}

/// Top-level host settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Simulated frames per second
    pub frame_rate: u32,
    /// Stop after this many frames even if timelines remain
    pub max_frames: u64,
    /// Multiplier applied to every frame delta
    pub time_scale: f32,
    /// Cue sheet to play. The built-in demo sheet is used when unset.
    pub cue_sheet: Option<PathBuf>,
    /// Scheduler settings
    pub scheduler: SchedulerConfig,
    /// Mixer settings
    pub audio: AudioSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            max_frames: 60 * 60,
            time_scale: 1.0,
            cue_sheet: None,
            scheduler: SchedulerConfig::default(),
            audio: AudioSettings::default(),
        }
    }
}

impl AppConfig {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_ron(&content)?;

        // Cue sheet paths are relative to the config file
        if let (Some(sheet), Some(dir)) = (config.cue_sheet.as_mut(), path.parent()) {
            if sheet.is_relative() {
                *sheet = dir.join(&*sheet);
            }
        }

        Ok(config)
    }

    /// Scaled delta of one frame
    pub fn frame_delta(&self) -> Duration {
        let frame = Duration::from_secs(1) / self.frame_rate.max(1);
        let scale = f64::from(self.time_scale.clamp(0.0, 10.0));
        Duration::from_nanos((frame.as_nanos() as f64 * scale).round() as u64)
    }
}
