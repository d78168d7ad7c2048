// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playable units and their standard variants.
//!
//! A playable is constructed stopped. [`Playable::play`] marks it running and
//! kicks off its collaborator; [`Playable::update`] is called once per tick
//! and may flip it to complete; [`Playable::stop`] halts it without marking
//! it complete.

use crate::config::duration_from_secs;
use crate::error::AudioError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A unit of work that can be started, stopped and advanced per tick
pub trait Playable {
    /// Whether the playable has been started and not stopped since
    fn is_playing(&self) -> bool;

    /// Whether the playable has finished its work
    fn is_complete(&self) -> bool;

    /// Start the playable
    fn play(&mut self);

    /// Halt the playable. Does not mark it complete.
    fn stop(&mut self);

    /// Advance by one tick. No-op once complete.
    fn update(&mut self, delta: Duration);

    /// Whether this playable never completes on its own
    fn is_looping(&self) -> bool {
        false
    }

    /// Short name used in log output
    fn label(&self) -> &str {
        "playable"
    }
}

impl<P: Playable + ?Sized> Playable for Box<P> {
    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }

    fn is_complete(&self) -> bool {
        (**self).is_complete()
    }

    fn play(&mut self) {
        (**self).play();
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn update(&mut self, delta: Duration) {
        (**self).update(delta);
    }

    fn is_looping(&self) -> bool {
        (**self).is_looping()
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

/// Renderer-side animation that a timeline can wait on
pub trait AnimationPlayer {
    /// Whether frames are still being shown
    fn is_playing(&self) -> bool;

    /// Start showing frames
    fn play(&mut self);

    /// Stop showing frames
    fn stop(&mut self);

    /// Advance self-driven players. Players rendered elsewhere leave this empty.
    fn advance(&mut self, _delta: Duration) {}

    /// Whether the animation wraps around instead of finishing
    fn is_looping(&self) -> bool {
        false
    }
}

/// Playable backed by an [`AnimationPlayer`]
///
/// Completes once it was started and the player reports it stopped playing.
/// A looping player never gets there.
pub struct AnimationPlayable {
    player: Box<dyn AnimationPlayer>,
    playing: bool,
    complete: bool,
}

impl AnimationPlayable {
    /// Wrap an animation player
    pub fn new(player: impl AnimationPlayer + 'static) -> Self {
        Self::boxed(Box::new(player))
    }

    /// Wrap an already boxed animation player
    pub fn boxed(player: Box<dyn AnimationPlayer>) -> Self {
        Self {
            player,
            playing: false,
            complete: false,
        }
    }

    /// Access the wrapped player
    pub fn player(&self) -> &dyn AnimationPlayer {
        self.player.as_ref()
    }
}

impl Playable for AnimationPlayable {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn play(&mut self) {
        self.playing = true;
        self.player.play();
    }

    fn stop(&mut self) {
        self.playing = false;
        self.player.stop();
    }

    fn update(&mut self, delta: Duration) {
        if self.complete {
            return;
        }
        if self.playing {
            self.player.advance(delta);
        }
        self.complete = self.playing && !self.player.is_playing();
    }

    fn is_looping(&self) -> bool {
        self.player.is_looping()
    }

    fn label(&self) -> &str {
        "animation"
    }
}

impl fmt::Debug for AnimationPlayable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationPlayable")
            .field("playing", &self.playing)
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

/// Mixer-side sink for fire-and-forget sound effects
pub trait CueSink {
    /// Dispatch a sound effect at the given volume (0.0 to 1.0)
    fn play_cue(&self, cue: &str, volume: f32) -> Result<(), AudioError>;
}

/// Fire-and-forget sound effect
///
/// Completes inside [`Playable::play`]; the mixer owns the sound afterwards.
pub struct SoundCue {
    sink: Arc<dyn CueSink>,
    cue: String,
    volume: f32,
    playing: bool,
    complete: bool,
}

impl SoundCue {
    /// Create a cue at full volume
    pub fn new(sink: Arc<dyn CueSink>, cue: impl Into<String>) -> Self {
        Self {
            sink,
            cue: cue.into(),
            volume: 1.0,
            playing: false,
            complete: false,
        }
    }

    /// Set the volume multiplier
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Name of the cue
    pub fn cue(&self) -> &str {
        &self.cue
    }
}

impl Playable for SoundCue {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn play(&mut self) {
        self.playing = true;
        if let Err(e) = self.sink.play_cue(&self.cue, self.volume) {
            tracing::warn!("Sound cue '{}' failed: {}", self.cue, e);
        }
        self.complete = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn update(&mut self, _delta: Duration) {}

    fn label(&self) -> &str {
        &self.cue
    }
}

impl fmt::Debug for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundCue")
            .field("cue", &self.cue)
            .field("volume", &self.volume)
            .field("playing", &self.playing)
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

/// Waits for a fixed duration
///
/// Keeps its own clock: every update received while running adds the tick
/// delta, including the update on the tick it was started.
#[derive(Debug, Clone)]
pub struct Delay {
    duration: Duration,
    elapsed: Duration,
    playing: bool,
    complete: bool,
}

impl Delay {
    /// Create a delay
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            playing: false,
            complete: false,
        }
    }

    /// Create a delay from seconds, rounded to whole milliseconds
    pub fn secs(seconds: f32) -> Self {
        Self::new(duration_from_secs(seconds))
    }

    /// Configured duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time accrued while running
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Playable for Delay {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn update(&mut self, delta: Duration) {
        if self.complete || !self.playing {
            return;
        }
        self.elapsed += delta;
        self.complete = self.elapsed >= self.duration;
    }

    fn label(&self) -> &str {
        "delay"
    }
}

/// State handed to [`Callback`] hooks
#[derive(Debug, Clone, Default)]
pub struct CallbackContext {
    playing: bool,
    complete: bool,
    delta: Duration,
    elapsed: Duration,
}

impl CallbackContext {
    /// Whether the callback is currently running
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the callback has been marked complete
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Mark the callback complete, or clear the mark again
    pub fn set_complete(&mut self, complete: bool) {
        self.complete = complete;
    }

    /// Delta of the tick being processed (zero inside play/stop hooks)
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Time accrued over all updates so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

type Hook = Box<dyn FnMut(&mut CallbackContext)>;

/// Playable whose behavior is supplied by closures
///
/// Completion is decided entirely by the hooks through
/// [`CallbackContext::set_complete`]. A hook may clear the flag again, so
/// completion is not guaranteed to be monotonic for this variant.
#[derive(Default)]
pub struct Callback {
    on_play: Option<Hook>,
    on_stop: Option<Hook>,
    on_update: Option<Hook>,
    context: CallbackContext,
    label: Option<String>,
}

impl Callback {
    /// Create a callback with no hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` when played and complete immediately
    pub fn once(mut f: impl FnMut() + 'static) -> Self {
        Self::new().on_play(move |ctx| {
            f();
            ctx.set_complete(true);
        })
    }

    /// Set the hook run by [`Playable::play`]
    pub fn on_play(mut self, hook: impl FnMut(&mut CallbackContext) + 'static) -> Self {
        self.on_play = Some(Box::new(hook));
        self
    }

    /// Set the hook run by [`Playable::stop`]
    pub fn on_stop(mut self, hook: impl FnMut(&mut CallbackContext) + 'static) -> Self {
        self.on_stop = Some(Box::new(hook));
        self
    }

    /// Set the hook run by [`Playable::update`]
    pub fn on_update(mut self, hook: impl FnMut(&mut CallbackContext) + 'static) -> Self {
        self.on_update = Some(Box::new(hook));
        self
    }

    /// Set the name used in log output
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Playable for Callback {
    fn is_playing(&self) -> bool {
        self.context.playing
    }

    fn is_complete(&self) -> bool {
        self.context.complete
    }

    fn play(&mut self) {
        self.context.playing = true;
        self.context.delta = Duration::ZERO;
        if let Some(hook) = self.on_play.as_mut() {
            hook(&mut self.context);
        }
    }

    fn stop(&mut self) {
        self.context.playing = false;
        self.context.delta = Duration::ZERO;
        if let Some(hook) = self.on_stop.as_mut() {
            hook(&mut self.context);
        }
    }

    fn update(&mut self, delta: Duration) {
        if self.context.complete {
            return;
        }
        self.context.delta = delta;
        self.context.elapsed += delta;
        if let Some(hook) = self.on_update.as_mut() {
            hook(&mut self.context);
        }
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("callback")
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("label", &self.label)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::cell::Cell;
    use std::rc::Rc;

    const TICK: Duration = Duration::from_millis(100);

    struct Recorder {
        cues: Mutex<Vec<(String, f32)>>,
    }

    impl CueSink for Recorder {
        fn play_cue(&self, cue: &str, volume: f32) -> Result<(), AudioError> {
            if cue == "missing.wav" {
                return Err(AudioError::UnknownCue(cue.to_string()));
            }
            self.cues.lock().push((cue.to_string(), volume));
            Ok(())
        }
    }

    struct FixedFrames {
        remaining: u32,
        playing: bool,
    }

    impl AnimationPlayer for FixedFrames {
        fn is_playing(&self) -> bool {
            self.playing
        }

        fn play(&mut self) {
            self.playing = true;
        }

        fn stop(&mut self) {
            self.playing = false;
        }

        fn advance(&mut self, _delta: Duration) {
            if self.remaining == 0 {
                self.playing = false;
            } else {
                self.remaining -= 1;
            }
        }
    }

    #[test]
    fn test_delay_completes_after_duration() {
        let mut delay = Delay::new(Duration::from_millis(300));
        delay.update(TICK);
        assert!(!delay.is_complete(), "not started yet");

        delay.play();
        delay.update(TICK);
        delay.update(TICK);
        assert!(!delay.is_complete());
        delay.update(TICK);
        assert!(delay.is_complete());
        assert_eq!(delay.elapsed(), Duration::from_millis(300));
    }

    #[test]
    fn test_delay_stop_is_not_completion() {
        let mut delay = Delay::secs(1.0);
        delay.play();
        delay.update(TICK);
        delay.stop();
        assert!(!delay.is_playing());
        assert!(!delay.is_complete());

        delay.update(Duration::from_secs(5));
        assert!(!delay.is_complete(), "stopped delays do not accrue time");
    }

    #[test]
    fn test_sound_cue_completes_on_play() {
        let sink = Arc::new(Recorder { cues: Mutex::new(Vec::new()) });
        let mut cue = SoundCue::new(sink.clone(), "hit.wav").with_volume(0.5);
        assert!(!cue.is_complete());

        cue.play();
        assert!(cue.is_playing());
        assert!(cue.is_complete());
        assert_eq!(sink.cues.lock().as_slice(), &[("hit.wav".to_string(), 0.5)]);
    }

    #[test]
    fn test_sound_cue_failure_still_completes() {
        let sink = Arc::new(Recorder { cues: Mutex::new(Vec::new()) });
        let mut cue = SoundCue::new(sink.clone(), "missing.wav");
        cue.play();
        assert!(cue.is_complete());
        assert!(sink.cues.lock().is_empty());
    }

    #[test]
    fn test_animation_completes_when_player_stops() {
        let mut anim = AnimationPlayable::new(FixedFrames { remaining: 2, playing: false });
        anim.update(TICK);
        assert!(!anim.is_complete(), "never started");

        anim.play();
        anim.update(TICK);
        anim.update(TICK);
        assert!(!anim.is_complete());
        anim.update(TICK);
        assert!(anim.is_complete());
    }

    #[test]
    fn test_callback_hooks_drive_completion() {
        let plays = Rc::new(Cell::new(0));
        let plays_in_hook = plays.clone();
        let mut callback = Callback::new()
            .on_play(move |_| plays_in_hook.set(plays_in_hook.get() + 1))
            .on_update(|ctx| {
                if ctx.elapsed() >= Duration::from_millis(200) {
                    ctx.set_complete(true);
                }
            });

        callback.play();
        assert_eq!(plays.get(), 1);
        callback.update(TICK);
        assert!(!callback.is_complete());
        callback.update(TICK);
        assert!(callback.is_complete());
    }

    #[test]
    fn test_callback_may_clear_completion() {
        let mut callback = Callback::new()
            .on_play(|ctx| ctx.set_complete(true))
            .on_stop(|ctx| ctx.set_complete(false));
        callback.play();
        assert!(callback.is_complete());
        callback.stop();
        assert!(!callback.is_complete());
    }

    #[test]
    fn test_callback_once() {
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let mut callback = Callback::once(move || flag.set(true)).with_label("flash");
        assert_eq!(callback.label(), "flash");
        callback.play();
        assert!(fired.get());
        assert!(callback.is_complete());
    }
}
