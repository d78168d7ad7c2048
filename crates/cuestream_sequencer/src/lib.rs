// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tick-driven timeline sequencing.
//!
//! This crate composes heterogeneous playable units into schedules:
//! - Sprite animations
//! - Sound cues
//! - Fixed delays
//! - Scripted callbacks
//! - Tweened values
//!
//! ## Architecture
//!
//! The sequencer is built on:
//! - A [`Playable`] capability implemented by every leaf unit
//! - [`Timeline`]s made of ordered steps (each a parallel group) plus
//!   playables keyed by an absolute time offset
//! - A [`Scheduler`] that ticks every registered timeline once per frame and
//!   reaps the completed ones
//!
//! Everything runs on the caller's thread. "Parallel" members of a step are
//! started and advanced back-to-back within the same tick.

pub mod animation;
pub mod config;
pub mod error;
pub mod playable;
pub mod scheduler;
pub mod timeline;
pub mod tween;

pub use animation::{AnimationLibrary, SpriteAnimation, SpriteFrame, SpritePlayer};
pub use config::SchedulerConfig;
pub use error::{AnimationError, AudioError, ConfigError};
pub use playable::{
    AnimationPlayable, AnimationPlayer, Callback, CallbackContext, CueSink, Delay, Playable,
    SoundCue,
};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use timeline::{Timeline, TimelineId};
pub use tween::{Easing, Interpolation, Tween, TweenPlayable, ValueTween};
