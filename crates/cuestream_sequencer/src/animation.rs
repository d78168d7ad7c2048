// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sprite-sheet animations and a tick-driven player.

use crate::error::AnimationError;
use crate::playable::AnimationPlayer;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A rectangle on a sprite sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteFrame {
    /// Sprite sheet the frame is cut from
    pub image: String,
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// An ordered list of frames shown at a fixed rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteAnimation {
    /// Frames in display order
    pub frames: Vec<SpriteFrame>,
    /// Frames per second
    pub fps: u32,
    /// Whether the animation wraps around after the last frame
    pub looping: bool,
}

impl SpriteAnimation {
    /// Default playback rate
    pub const DEFAULT_FPS: u32 = 30;

    /// Create an empty animation
    pub fn new(fps: u32, looping: bool) -> Self {
        Self {
            frames: Vec::new(),
            fps: fps.max(1),
            looping,
        }
    }

    /// Cut `count` frames of `width` x `height` from a sheet laid out in
    /// rows of `columns`, left to right then top to bottom
    pub fn from_grid(
        image: impl Into<String>,
        count: u32,
        width: u32,
        height: u32,
        columns: u32,
    ) -> Self {
        let mut animation = Self::new(Self::DEFAULT_FPS, false);
        animation.push_grid(image, count, width, height, columns);
        animation
    }

    /// Set the playback rate
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Set whether the animation loops
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Append frames cut from a grid, see [`SpriteAnimation::from_grid`]
    pub fn push_grid(
        &mut self,
        image: impl Into<String>,
        count: u32,
        width: u32,
        height: u32,
        columns: u32,
    ) {
        let image = image.into();
        let columns = columns.max(1);
        self.frames.extend((0..count).map(|i| SpriteFrame {
            image: image.clone(),
            x: width * (i % columns),
            y: height * (i / columns),
            width,
            height,
        }));
    }

    /// How long each frame stays on screen
    pub fn frame_time(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    /// Total time for one pass over all frames
    pub fn duration(&self) -> Duration {
        self.frame_time() * self.frames.len() as u32
    }
}

/// Named animations available to the host
///
/// Lookups hand out clones so players never share frame lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationLibrary {
    animations: IndexMap<String, SpriteAnimation>,
}

impl AnimationLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an animation, replacing any previous one with the same name
    pub fn insert(&mut self, name: impl Into<String>, animation: SpriteAnimation) {
        self.animations.insert(name.into(), animation);
    }

    /// Register an animation cut from a sprite-sheet grid
    pub fn set_grid(
        &mut self,
        name: impl Into<String>,
        image: impl Into<String>,
        count: u32,
        width: u32,
        height: u32,
        columns: u32,
        looping: bool,
        fps: u32,
    ) {
        let animation = SpriteAnimation::from_grid(image, count, width, height, columns)
            .with_looping(looping)
            .with_fps(fps);
        self.insert(name, animation);
    }

    /// Append more grid frames to an existing animation
    pub fn extend_grid(
        &mut self,
        name: &str,
        image: impl Into<String>,
        count: u32,
        width: u32,
        height: u32,
        columns: u32,
    ) -> Result<(), AnimationError> {
        let animation = self
            .animations
            .get_mut(name)
            .ok_or_else(|| AnimationError::NotFound(name.to_string()))?;
        animation.push_grid(image, count, width, height, columns);
        Ok(())
    }

    /// Get a copy of a named animation
    pub fn get(&self, name: &str) -> Result<SpriteAnimation, AnimationError> {
        self.animations
            .get(name)
            .cloned()
            .ok_or_else(|| AnimationError::NotFound(name.to_string()))
    }

    /// Check if an animation is registered
    pub fn contains(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    /// Number of registered animations
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Remove every animation
    pub fn clear(&mut self) {
        self.animations.clear();
    }
}

/// Steps through a [`SpriteAnimation`] as ticks arrive
#[derive(Debug, Clone)]
pub struct SpritePlayer {
    animation: SpriteAnimation,
    frame: usize,
    frame_elapsed: Duration,
    playing: bool,
    visible: bool,
    /// Set once a single-shot run reaches its end
    finished: bool,
    rewind_on_finish: bool,
}

impl SpritePlayer {
    /// Create a stopped player
    pub fn new(animation: SpriteAnimation) -> Self {
        Self {
            animation,
            frame: 0,
            frame_elapsed: Duration::ZERO,
            playing: false,
            visible: false,
            finished: false,
            rewind_on_finish: false,
        }
    }

    /// Reset to the first frame and hide when a single-shot run finishes
    pub fn with_rewind_on_finish(mut self, rewind: bool) -> Self {
        self.rewind_on_finish = rewind;
        self
    }

    /// Frame currently on screen, if any
    pub fn current_frame(&self) -> Option<&SpriteFrame> {
        if self.visible {
            self.animation.frames.get(self.frame)
        } else {
            None
        }
    }

    /// Index of the frame currently on screen
    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// The animation being played
    pub fn animation(&self) -> &SpriteAnimation {
        &self.animation
    }

    fn finish(&mut self) {
        self.playing = false;
        self.finished = true;
        if self.rewind_on_finish {
            self.frame = 0;
            self.frame_elapsed = Duration::ZERO;
            self.visible = false;
        }
    }
}

impl AnimationPlayer for SpritePlayer {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) {
        if self.animation.frames.is_empty() {
            return;
        }
        // A finished run starts over; a stopped one resumes
        if self.finished {
            self.finished = false;
            self.frame = 0;
            self.frame_elapsed = Duration::ZERO;
        }
        self.playing = true;
        self.visible = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn advance(&mut self, delta: Duration) {
        if !self.playing {
            return;
        }
        let frame_time = self.animation.frame_time();
        self.frame_elapsed += delta;
        while self.playing && self.frame_elapsed >= frame_time {
            self.frame_elapsed -= frame_time;
            if self.frame + 1 < self.animation.frames.len() {
                self.frame += 1;
            } else if self.animation.looping {
                self.frame = 0;
            } else {
                self.finish();
            }
        }
    }

    fn is_looping(&self) -> bool {
        self.animation.looping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_frames(looping: bool) -> SpriteAnimation {
        SpriteAnimation::from_grid("sheet.png", 4, 32, 16, 2)
            .with_fps(10)
            .with_looping(looping)
    }

    #[test]
    fn test_grid_layout() {
        let animation = SpriteAnimation::from_grid("sheet.png", 5, 32, 16, 2);
        let origins: Vec<_> = animation.frames.iter().map(|f| (f.x, f.y)).collect();
        assert_eq!(origins, vec![(0, 0), (32, 0), (0, 16), (32, 16), (0, 32)]);
        assert_eq!(animation.fps, SpriteAnimation::DEFAULT_FPS);
    }

    #[test]
    fn test_library_lookup() {
        let mut library = AnimationLibrary::new();
        library.set_grid("slash", "fx.png", 3, 64, 64, 3, false, 24);
        assert!(library.contains("slash"));
        assert_eq!(library.get("slash").unwrap().frames.len(), 3);
        assert!(matches!(library.get("nope"), Err(AnimationError::NotFound(_))));

        library.extend_grid("slash", "fx2.png", 2, 64, 64, 2).unwrap();
        assert_eq!(library.get("slash").unwrap().frames.len(), 5);
        assert!(library.extend_grid("nope", "fx.png", 1, 1, 1, 1).is_err());

        library.clear();
        assert!(library.is_empty());
    }

    #[test]
    fn test_single_shot_player_stops_after_last_frame() {
        let mut player = SpritePlayer::new(four_frames(false));
        assert!(player.current_frame().is_none());

        player.play();
        assert_eq!(player.frame_index(), 0);
        for expected in 1..4 {
            player.advance(Duration::from_millis(100));
            assert_eq!(player.frame_index(), expected);
        }
        assert!(player.is_playing());
        player.advance(Duration::from_millis(100));
        assert!(!player.is_playing());
        assert_eq!(player.frame_index(), 3);
    }

    #[test]
    fn test_looping_player_wraps() {
        let mut player = SpritePlayer::new(four_frames(true));
        player.play();
        player.advance(Duration::from_millis(450));
        assert_eq!(player.frame_index(), 0);
        assert!(player.is_playing());
        assert!(player.is_looping());
    }

    #[test]
    fn test_replay_after_finish_starts_over() {
        let mut player = SpritePlayer::new(four_frames(false));
        player.play();
        player.advance(Duration::from_secs(1));
        assert!(!player.is_playing());
        assert_eq!(player.frame_index(), 3);

        player.play();
        assert_eq!(player.frame_index(), 0);
        player.advance(Duration::from_millis(100));
        assert!(player.is_playing());
        assert_eq!(player.frame_index(), 1);
    }

    #[test]
    fn test_stop_then_play_resumes() {
        let mut player = SpritePlayer::new(four_frames(false));
        player.play();
        player.advance(Duration::from_millis(250));
        player.stop();
        player.play();
        assert_eq!(player.frame_index(), 2);
        player.advance(Duration::from_millis(50));
        assert_eq!(player.frame_index(), 3);
    }

    #[test]
    fn test_rewind_on_finish() {
        let mut player = SpritePlayer::new(four_frames(false)).with_rewind_on_finish(true);
        player.play();
        player.advance(Duration::from_secs(1));
        assert!(!player.is_playing());
        assert_eq!(player.frame_index(), 0);
        assert!(player.current_frame().is_none());
    }

    #[test]
    fn test_empty_animation_never_plays() {
        let mut player = SpritePlayer::new(SpriteAnimation::new(30, false));
        player.play();
        assert!(!player.is_playing());
    }
}
