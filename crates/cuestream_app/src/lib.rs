// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless host for cuestream timelines.
//!
//! Loads a RON cue sheet, builds its timelines against an in-process audio
//! mixer and sprite animation library, then drives them from a fixed-rate
//! frame loop until every timeline has finished.

pub mod audio;
pub mod config;
pub mod cue_sheet;
pub mod host;

pub use audio::{AudioChannel, AudioMixer, SharedMixer};
pub use config::{AppConfig, AudioSettings};
pub use cue_sheet::{CueSheet, CueSheetError};
pub use host::{Host, RunSummary};
