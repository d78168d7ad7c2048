// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tweened values and easing curves.

use crate::playable::Playable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Easing curve applied to normalized tween progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Easing {
    /// Hold the start value until the end
    Constant,
    /// Linear interpolation
    #[default]
    Linear,
    /// Quadratic ease in
    EaseIn,
    /// Quadratic ease out
    EaseOut,
    /// Smoothstep in and out
    EaseInOut,
    /// Cubic bezier with the two inner control points
    Bezier(f32, f32),
}

impl Easing {
    /// Map progress in `[0, 1]` onto the curve
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Constant => {
                if t >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => t * t * (3.0 - 2.0 * t),
            Self::Bezier(p1, p2) => Interpolation::bezier(0.0, p1, p2, 1.0, t),
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// One-dimensional cubic bezier, evaluated by repeated subdivision
    pub fn bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
        let a = Self::lerp(p0, p1, t);
        let b = Self::lerp(p1, p2, t);
        let c = Self::lerp(p2, p3, t);
        Self::lerp(Self::lerp(a, b, t), Self::lerp(b, c, t), t)
    }
}

/// An interpolation that runs over several ticks
pub trait Tween {
    /// Start or resume the interpolation
    fn start(&mut self);

    /// Pause the interpolation where it is
    fn pause(&mut self);

    /// Advance by one tick
    fn advance(&mut self, delta: Duration);

    /// Whether the interpolation reached its end
    fn is_finished(&self) -> bool;
}

/// Interpolates an `f32` and reports each sample to a sink
pub struct ValueTween {
    from: f32,
    to: f32,
    duration: Duration,
    easing: Easing,
    elapsed: Duration,
    running: bool,
    sink: Box<dyn FnMut(f32)>,
}

impl ValueTween {
    /// Create a linear tween
    pub fn new(from: f32, to: f32, duration: Duration, sink: impl FnMut(f32) + 'static) -> Self {
        Self {
            from,
            to,
            duration,
            easing: Easing::Linear,
            elapsed: Duration::ZERO,
            running: false,
            sink: Box::new(sink),
        }
    }

    /// Set the easing curve
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Normalized progress in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Value at the current progress
    pub fn value(&self) -> f32 {
        Interpolation::lerp(self.from, self.to, self.easing.apply(self.progress()))
    }
}

impl Tween for ValueTween {
    fn start(&mut self) {
        self.running = true;
        let value = self.value();
        (self.sink)(value);
    }

    fn pause(&mut self) {
        self.running = false;
    }

    fn advance(&mut self, delta: Duration) {
        if !self.running || self.is_finished() {
            return;
        }
        self.elapsed = (self.elapsed + delta).min(self.duration);
        let value = self.value();
        (self.sink)(value);
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

impl fmt::Debug for ValueTween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueTween")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

/// Playable backed by a [`Tween`]
pub struct TweenPlayable<T: Tween> {
    tween: T,
    playing: bool,
    complete: bool,
}

impl<T: Tween> TweenPlayable<T> {
    /// Wrap a tween
    pub fn new(tween: T) -> Self {
        Self {
            tween,
            playing: false,
            complete: false,
        }
    }

    /// Access the wrapped tween
    pub fn tween(&self) -> &T {
        &self.tween
    }
}

impl<T: Tween> Playable for TweenPlayable<T> {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn play(&mut self) {
        self.playing = true;
        self.tween.start();
    }

    fn stop(&mut self) {
        self.playing = false;
        self.tween.pause();
    }

    fn update(&mut self, delta: Duration) {
        if self.complete {
            return;
        }
        if self.playing {
            self.tween.advance(delta);
        }
        self.complete = self.playing && self.tween.is_finished();
    }

    fn label(&self) -> &str {
        "tween"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::Bezier(0.25, 0.75),
        ] {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
        assert_eq!(Easing::Constant.apply(0.99), 0.0);
        assert_eq!(Easing::Constant.apply(1.0), 1.0);
    }

    #[test]
    fn test_easing_shapes() {
        assert!(Easing::EaseIn.apply(0.5) < 0.5);
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_curve_midpoints() {
        assert!((Easing::EaseInOut.apply(0.25) - 0.15625).abs() < 1e-6);
        assert!((Interpolation::bezier(0.0, 0.0, 1.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((Interpolation::bezier(0.0, 1.0, 1.0, 1.0, 0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_value_tween_reports_samples() {
        let samples = Rc::new(RefCell::new(Vec::new()));
        let sink = samples.clone();
        let tween = ValueTween::new(0.0, 10.0, Duration::from_millis(400), move |v| {
            sink.borrow_mut().push(v);
        });
        let mut playable = TweenPlayable::new(tween);

        playable.play();
        for _ in 0..3 {
            playable.update(Duration::from_millis(100));
        }
        assert!(!playable.is_complete());
        playable.update(Duration::from_millis(100));
        assert!(playable.is_complete());

        let samples = samples.borrow();
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0], 0.0);
        assert!((samples[2] - 5.0).abs() < 1e-4);
        assert_eq!(samples[4], 10.0);
    }

    #[test]
    fn test_tween_stop_pauses() {
        let tween = ValueTween::new(1.0, 0.0, Duration::from_secs(1), |_| {});
        let mut playable = TweenPlayable::new(tween);
        playable.play();
        playable.update(Duration::from_millis(500));
        playable.stop();
        playable.update(Duration::from_secs(2));
        assert!(!playable.is_complete());
        assert!((playable.tween().progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_length_tween_finishes_immediately() {
        let mut playable = TweenPlayable::new(ValueTween::new(0.0, 1.0, Duration::ZERO, |_| {}));
        playable.play();
        playable.update(Duration::from_millis(16));
        assert!(playable.is_complete());
        assert_eq!(playable.tween().value(), 1.0);
    }
}
