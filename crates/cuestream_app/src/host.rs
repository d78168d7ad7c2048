// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-rate frame loop that owns the scheduler and its collaborators.
//!
//! This module handles:
//! - Creating the scheduler, mixer and animation library from config
//! - Loading cue sheets into scheduled timelines
//! - Stepping simulated frames until every timeline is done

use crate::audio::{AudioMixer, SharedMixer};
use crate::config::AppConfig;
use crate::cue_sheet::{CueSheet, CueSheetError};
use cuestream_sequencer::{AnimationLibrary, Scheduler};
use std::time::Duration;

/// Outcome of [`Host::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames stepped
    pub frames: u64,
    /// Simulated time covered
    pub elapsed: Duration,
    /// Timelines still registered when the loop ended
    pub unfinished: usize,
}

/// Owns everything a frame needs
pub struct Host {
    config: AppConfig,
    scheduler: Scheduler,
    mixer: SharedMixer,
    library: AnimationLibrary,
    /// Frames stepped so far
    frame_count: u64,
    /// Simulated time so far
    elapsed: Duration,
}

impl Host {
    /// Create a host with nothing scheduled
    pub fn new(config: AppConfig) -> Self {
        let scheduler = Scheduler::with_config(config.scheduler.clone());
        let mixer = SharedMixer::new(AudioMixer::new(&config.audio));
        Self {
            config,
            scheduler,
            mixer,
            library: AnimationLibrary::new(),
            frame_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Build a cue sheet's timelines and schedule them
    /// Returns the number of timelines added
    pub fn load(&mut self, sheet: &CueSheet) -> Result<usize, CueSheetError> {
        let timelines = sheet.build(&self.mixer, &mut self.library)?;
        let count = timelines.len();
        for timeline in timelines {
            self.scheduler.add(timeline);
        }
        tracing::info!("Scheduled {} timelines", count);
        Ok(count)
    }

    /// Advance one frame
    pub fn step(&mut self) {
        let delta = self.config.frame_delta();
        self.mixer.with(|m| m.advance(delta));
        self.scheduler.update(delta);
        self.frame_count += 1;
        self.elapsed += delta;
    }

    /// Step frames until nothing is scheduled or the frame limit is hit
    pub fn run(&mut self) -> RunSummary {
        let limit = self.frame_count.saturating_add(self.config.max_frames);
        while !self.scheduler.is_empty() && self.frame_count < limit {
            self.step();
        }

        let summary = RunSummary {
            frames: self.frame_count,
            elapsed: self.elapsed,
            unfinished: self.scheduler.len(),
        };
        if summary.unfinished > 0 {
            tracing::warn!(
                "Frame limit reached with {} timelines unfinished",
                summary.unfinished
            );
        } else {
            tracing::info!(
                "All timelines finished after {} frames ({:?})",
                summary.frames,
                summary.elapsed
            );
        }
        summary
    }

    /// The scheduler driven by this host
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Mutable access to the scheduler, for adding timelines directly
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// The shared mixer
    pub fn mixer(&self) -> &SharedMixer {
        &self.mixer
    }

    /// Animations registered so far
    pub fn library(&self) -> &AnimationLibrary {
        &self.library
    }
}
