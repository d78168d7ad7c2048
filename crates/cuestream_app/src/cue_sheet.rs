// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cue sheets: RON descriptions of timelines built against the host's
//! mixer and animation library.

use crate::audio::{AudioChannel, AudioMixer, SharedMixer};
use cuestream_sequencer::config::duration_from_secs;
use cuestream_sequencer::{
    AnimationError, AnimationLibrary, AnimationPlayable, AudioError, Callback, ConfigError, Delay,
    Easing, Playable, SoundCue, SpritePlayer, Timeline, TweenPlayable, ValueTween,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Demo sheet used when no cue sheet is configured
pub const DEMO_CUE_SHEET: &str = include_str!("../assets/demo.cues.ron");

/// Error when loading or building a cue sheet
#[derive(Debug, thiserror::Error)]
pub enum CueSheetError {
    /// The sheet file could not be read or parsed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A timeline refers to an animation that is not defined
    #[error(transparent)]
    Animation(#[from] AnimationError),

    /// A sound could not be registered with the mixer
    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Sprite animation cut from a sheet grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationDef {
    /// Name timelines refer to
    pub name: String,
    /// Sprite sheet image
    pub image: String,
    /// Number of frames
    pub count: u32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frames per row on the sheet
    pub columns: u32,
    /// Whether the animation wraps around
    #[serde(default)]
    pub looping: bool,
    /// Frames per second
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_fps() -> u32 {
    cuestream_sequencer::SpriteAnimation::DEFAULT_FPS
}

/// Sound clip known to the mixer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundDef {
    /// Clip name, including its extension
    pub name: String,
    /// Clip length in seconds
    pub length: f32,
}

/// Leaf unit of a timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Action {
    /// Wait for some seconds
    Delay(f32),
    /// Fire a sound effect at a volume
    Sound(String, f32),
    /// Play a sprite animation to its end
    Animation(String),
    /// Cross-fade the background music to a clip
    Bgm(String),
    /// Tween the BGM channel volume from, to, over seconds
    Fade(f32, f32, f32, Easing),
    /// Write a line to the log
    Log(String),
}

/// Where an action is placed in its timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Entry {
    /// New step after the last one
    Append(Action),
    /// Alongside the last step
    Join(Action),
    /// New step before the first one
    Prepend(Action),
    /// At an offset in seconds
    Insert(f32, Action),
}

/// A named timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineDef {
    /// Name used in log output
    pub name: String,
    /// Entries applied in order
    pub entries: Vec<Entry>,
}

/// A full cue sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CueSheet {
    /// Animations to register
    #[serde(default)]
    pub animations: Vec<AnimationDef>,
    /// Sounds to register
    #[serde(default)]
    pub sounds: Vec<SoundDef>,
    /// Timelines to build
    #[serde(default)]
    pub timelines: Vec<TimelineDef>,
}

impl CueSheet {
    /// Parse a sheet from RON text
    pub fn from_ron(text: &str) -> Result<Self, CueSheetError> {
        ron::from_str(text).map_err(|e| CueSheetError::Config(e.into()))
    }

    /// Load a sheet from a RON file
    pub fn load(path: &Path) -> Result<Self, CueSheetError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_ron(&content)
    }

    /// The built-in demo sheet
    pub fn demo() -> Result<Self, CueSheetError> {
        Self::from_ron(DEMO_CUE_SHEET)
    }

    /// Register the sheet's animations and sounds, then build its timelines
    pub fn build(
        &self,
        mixer: &SharedMixer,
        library: &mut AnimationLibrary,
    ) -> Result<Vec<Timeline>, CueSheetError> {
        for def in &self.animations {
            library.set_grid(
                def.name.clone(),
                def.image.clone(),
                def.count,
                def.width,
                def.height,
                def.columns,
                def.looping,
                def.fps,
            );
        }
        mixer.with(|m| {
            self.sounds.iter().try_for_each(|def| {
                m.register_clip(def.name.clone(), duration_from_secs(def.length))
            })
        })?;

        self.timelines
            .iter()
            .map(|def| {
                let mut timeline = Timeline::named(def.name.clone());
                for entry in &def.entries {
                    match entry {
                        Entry::Append(action) => {
                            timeline.append_boxed(build_action(action, mixer, library)?);
                        }
                        Entry::Join(action) => {
                            timeline.join_boxed(build_action(action, mixer, library)?);
                        }
                        Entry::Prepend(action) => {
                            timeline.prepend_boxed(build_action(action, mixer, library)?);
                        }
                        Entry::Insert(seconds, action) => {
                            let offset = duration_from_secs(*seconds);
                            timeline.insert_boxed(offset, build_action(action, mixer, library)?);
                        }
                    }
                }
                Ok(timeline)
            })
            .collect()
    }
}

fn build_action(
    action: &Action,
    mixer: &SharedMixer,
    library: &AnimationLibrary,
) -> Result<Box<dyn Playable>, CueSheetError> {
    let playable: Box<dyn Playable> = match action {
        Action::Delay(seconds) => Box::new(Delay::secs(*seconds)),
        Action::Sound(cue, volume) => {
            let sink = Arc::new(mixer.clone());
            Box::new(SoundCue::new(sink, cue.clone()).with_volume(*volume))
        }
        Action::Animation(name) => {
            let player = SpritePlayer::new(library.get(name)?);
            Box::new(AnimationPlayable::new(player))
        }
        Action::Bgm(clip) => {
            let mixer = mixer.clone();
            let clip = clip.clone();
            let label = format!("bgm {clip}");
            Box::new(
                Callback::once(move || {
                    if let Err(e) = mixer.with(|m| m.fade_bgm(&clip, AudioMixer::FADE_SPEED_HIGH)) {
                        tracing::warn!("BGM '{}' failed: {}", clip, e);
                    }
                })
                .with_label(label),
            )
        }
        Action::Fade(from, to, seconds, easing) => {
            let mixer = mixer.clone();
            let duration = duration_from_secs(*seconds);
            let tween = ValueTween::new(*from, *to, duration, move |volume| {
                mixer.with(|m| m.set_volume(AudioChannel::Bgm, volume));
            })
            .with_easing(*easing);
            Box::new(TweenPlayable::new(tween))
        }
        Action::Log(message) => {
            let message = message.clone();
            Box::new(Callback::once(move || tracing::info!("{}", message)).with_label("log"))
        }
    };
    Ok(playable)
}
