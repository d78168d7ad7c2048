// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audio mixer collaborator for the host.
//!
//! This module provides:
//! - Channel volumes with mute flags (master, BGM, SE)
//! - A pool of sound-effect voices that free themselves when their clip ends
//! - Looping background music with fade in/out advanced per frame
//!
//! No samples are decoded; the mixer tracks what would be audible and logs
//! transitions. Timelines reach it through [`SharedMixer`], which implements
//! [`CueSink`].

use crate::config::AudioSettings;
use cuestream_sequencer::{AudioError, CueSink};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Clip extensions the mixer accepts
const SUPPORTED_FORMATS: [&str; 3] = ["wav", "ogg", "mp3"];

/// Mixer channel for volume control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioChannel {
    /// Scales every other channel
    Master,
    /// Background music
    Bgm,
    /// Sound effects
    Se,
}

/// A sound effect that is currently audible
#[derive(Debug, Clone)]
struct Voice {
    clip: String,
    volume: f32,
    remaining: Duration,
}

/// A background music track and its fade level (0.0 to 1.0)
#[derive(Debug, Clone)]
struct BgmTrack {
    clip: String,
    level: f32,
}

/// Tracks every audible sound and the volumes applied to it
#[derive(Debug)]
pub struct AudioMixer {
    /// Channel volumes (0.0 to 1.0)
    volumes: HashMap<AudioChannel, f32>,
    /// Muted channels
    muted: HashMap<AudioChannel, bool>,
    /// Registered clips and their lengths
    clips: HashMap<String, Duration>,
    voices: Vec<Voice>,
    voice_capacity: usize,
    bgm: Option<BgmTrack>,
    fading_out: Option<BgmTrack>,
    /// Level change per second while fading
    fade_speed: f32,
}

impl AudioMixer {
    /// Slow fade, a little over three seconds
    pub const FADE_SPEED_LOW: f32 = 0.3;
    /// Fast fade, just over a second
    pub const FADE_SPEED_HIGH: f32 = 0.9;

    /// Create a mixer from settings
    pub fn new(settings: &AudioSettings) -> Self {
        let mut volumes = HashMap::new();
        volumes.insert(AudioChannel::Master, settings.master_volume.clamp(0.0, 1.0));
        volumes.insert(AudioChannel::Bgm, settings.bgm_volume.clamp(0.0, 1.0));
        volumes.insert(AudioChannel::Se, settings.se_volume.clamp(0.0, 1.0));

        Self {
            volumes,
            muted: HashMap::new(),
            clips: HashMap::new(),
            voices: Vec::with_capacity(settings.se_voices),
            voice_capacity: settings.se_voices.max(1),
            bgm: None,
            fading_out: None,
            fade_speed: Self::FADE_SPEED_LOW,
        }
    }

    /// Register a clip so it can be played
    pub fn register_clip(
        &mut self,
        name: impl Into<String>,
        length: Duration,
    ) -> Result<(), AudioError> {
        let name = name.into();
        let supported = name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| SUPPORTED_FORMATS.contains(&ext.to_ascii_lowercase().as_str()));
        if !supported {
            return Err(AudioError::UnsupportedFormat(name));
        }
        self.clips.insert(name, length);
        Ok(())
    }

    fn clip_length(&self, name: &str) -> Result<Duration, AudioError> {
        self.clips
            .get(name)
            .copied()
            .ok_or_else(|| AudioError::UnknownCue(name.to_string()))
    }

    /// Effective volume of a channel after master volume and mutes
    pub fn get_volume(&self, channel: AudioChannel) -> f32 {
        let master = *self.volumes.get(&AudioChannel::Master).unwrap_or(&1.0);
        let channel_vol = *self.volumes.get(&channel).unwrap_or(&1.0);
        let is_muted = *self.muted.get(&channel).unwrap_or(&false);

        if is_muted || *self.muted.get(&AudioChannel::Master).unwrap_or(&false) {
            0.0
        } else if channel == AudioChannel::Master {
            master
        } else {
            master * channel_vol
        }
    }

    /// Set a channel volume
    pub fn set_volume(&mut self, channel: AudioChannel, volume: f32) {
        self.volumes.insert(channel, volume.clamp(0.0, 1.0));
    }

    /// Mute or unmute a channel
    pub fn set_muted(&mut self, channel: AudioChannel, muted: bool) {
        self.muted.insert(channel, muted);
    }

    /// Play a sound effect on a free voice
    pub fn play_se(&mut self, clip: &str, volume: f32) -> Result<(), AudioError> {
        let remaining = self.clip_length(clip)?;
        if self.voices.len() >= self.voice_capacity {
            self.voice_capacity += 1;
            tracing::debug!("SE voice pool grown to {}", self.voice_capacity);
        }
        let volume = volume.clamp(0.0, 1.0);
        tracing::debug!(
            "SE '{}' at {:.2}",
            clip,
            volume * self.get_volume(AudioChannel::Se)
        );
        self.voices.push(Voice {
            clip: clip.to_string(),
            volume,
            remaining,
        });
        Ok(())
    }

    /// Silence every sound effect
    pub fn stop_se(&mut self) {
        self.voices.clear();
    }

    /// Whether any sound effect is audible
    pub fn is_playing_se(&self) -> bool {
        !self.voices.is_empty()
    }

    /// Clips of the sound effects currently audible with their volumes
    pub fn playing_se(&self) -> impl Iterator<Item = (&str, f32)> {
        let channel = self.get_volume(AudioChannel::Se);
        self.voices.iter().map(move |v| (v.clip.as_str(), v.volume * channel))
    }

    /// Start background music at full level, cutting the previous track.
    /// Requesting the track already playing does nothing.
    pub fn play_bgm(&mut self, clip: &str) -> Result<(), AudioError> {
        if self.current_bgm() == Some(clip) {
            return Ok(());
        }
        self.clip_length(clip)?;
        self.fading_out = None;
        self.bgm = Some(BgmTrack {
            clip: clip.to_string(),
            level: 1.0,
        });
        tracing::debug!("BGM '{}'", clip);
        Ok(())
    }

    /// Cross-fade to new background music
    pub fn fade_bgm(&mut self, clip: &str, fade_speed: f32) -> Result<(), AudioError> {
        if self.current_bgm() == Some(clip) {
            return Ok(());
        }
        self.clip_length(clip)?;
        self.fade_out_bgm(fade_speed);
        self.bgm = Some(BgmTrack {
            clip: clip.to_string(),
            level: 0.0,
        });
        tracing::debug!("BGM fading in '{}'", clip);
        Ok(())
    }

    /// Fade out the current background music
    pub fn fade_out_bgm(&mut self, fade_speed: f32) {
        self.fade_speed = fade_speed.max(f32::EPSILON);
        if let Some(track) = self.bgm.take() {
            self.fading_out = Some(track);
        }
    }

    /// Stop background music immediately
    pub fn stop_bgm(&mut self) {
        self.bgm = None;
        self.fading_out = None;
    }

    /// Clip of the current background music
    pub fn current_bgm(&self) -> Option<&str> {
        self.bgm.as_ref().map(|t| t.clip.as_str())
    }

    /// Whether any background music is audible
    pub fn is_playing_bgm(&self) -> bool {
        self.bgm.is_some() || self.fading_out.is_some()
    }

    /// Audible level of the current background music
    pub fn bgm_level(&self) -> f32 {
        self.bgm
            .as_ref()
            .map_or(0.0, |t| t.level * self.get_volume(AudioChannel::Bgm))
    }

    /// Advance fades and retire finished sound effects
    pub fn advance(&mut self, delta: Duration) {
        self.voices.retain_mut(|voice| {
            voice.remaining = voice.remaining.saturating_sub(delta);
            !voice.remaining.is_zero()
        });

        let step = delta.as_secs_f32() * self.fade_speed;
        if let Some(track) = self.bgm.as_mut() {
            track.level = (track.level + step).min(1.0);
        }
        if let Some(track) = self.fading_out.as_mut() {
            track.level -= step;
            if track.level <= 0.0 {
                tracing::debug!("BGM '{}' faded out", track.clip);
                self.fading_out = None;
            }
        }
    }
}

/// Mixer shared between the host loop and the timelines it schedules
#[derive(Debug, Clone)]
pub struct SharedMixer(Arc<Mutex<AudioMixer>>);

impl SharedMixer {
    /// Wrap a mixer
    pub fn new(mixer: AudioMixer) -> Self {
        Self(Arc::new(Mutex::new(mixer)))
    }

    /// Run `f` with the mixer locked
    pub fn with<R>(&self, f: impl FnOnce(&mut AudioMixer) -> R) -> R {
        f(&mut self.0.lock())
    }
}

impl CueSink for SharedMixer {
    fn play_cue(&self, cue: &str, volume: f32) -> Result<(), AudioError> {
        self.0.lock().play_se(cue, volume)
    }
}
