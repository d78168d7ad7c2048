// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timelines: ordered steps of parallel playables plus time-keyed insertions.
//!
//! A timeline is assembled with [`Timeline::append`], [`Timeline::join`],
//! [`Timeline::prepend`] and [`Timeline::insert`], then played. Once
//! [`Timeline::play`] has been called the structure is frozen and further
//! edits are ignored.
//!
//! Each [`Timeline::update`]:
//! 1. plays and updates every member of the current step, moving the cursor
//!    on once all of them are complete (empty steps are passed over on the
//!    tick they are reached, so the next real step starts on that tick)
//! 2. advances the clock by the tick delta
//! 3. plays and updates every insertion whose offset is at or before the clock
//! 4. marks the timeline complete once the cursor is past the last step and
//!    every insertion is complete

use crate::config::duration_from_secs;
use crate::playable::Playable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineId(pub Uuid);

impl TimelineId {
    /// Create a new random timeline ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A group of playables that start together. Members are kept in insertion
/// order, which is also the order they are ticked in.
type Step = Vec<Box<dyn Playable>>;

/// Plays a playable if needed, then updates it if it is not complete yet
fn drive(playable: &mut dyn Playable, delta: Duration) {
    if !playable.is_playing() {
        playable.play();
    }
    if !playable.is_complete() {
        playable.update(delta);
    }
}

/// An ordered sequence of steps plus playables keyed by time offset
pub struct Timeline {
    id: TimelineId,
    name: String,
    steps: Vec<Step>,
    cursor: usize,
    insertions: BTreeMap<Duration, Step>,
    elapsed: Duration,
    started: bool,
    playing: bool,
    complete: bool,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::named("timeline")
    }

    /// Create an empty timeline with a name used in log output
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: TimelineId::new(),
            name: name.into(),
            steps: Vec::new(),
            cursor: 0,
            insertions: BTreeMap::new(),
            elapsed: Duration::ZERO,
            started: false,
            playing: false,
            complete: false,
        }
    }

    /// Unique ID of this timeline
    pub fn id(&self) -> TimelineId {
        self.id
    }

    /// Name of this timeline
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_frozen(&self, op: &str) -> bool {
        if self.started {
            tracing::debug!("Ignoring {} on timeline '{}': already started", op, self.name);
        }
        self.started
    }

    fn check_looping(&self, playable: &dyn Playable) {
        if playable.is_looping() {
            tracing::warn!(
                "Looping playable '{}' placed in a step of timeline '{}' will never complete",
                playable.label(),
                self.name
            );
        }
    }

    /// Add a playable as a new step after the last one
    pub fn append(&mut self, playable: impl Playable + 'static) -> &mut Self {
        self.append_boxed(Box::new(playable))
    }

    /// Boxed form of [`Timeline::append`]
    pub fn append_boxed(&mut self, playable: Box<dyn Playable>) -> &mut Self {
        if self.is_frozen("append") {
            return self;
        }
        self.check_looping(&*playable);
        self.steps.push(vec![playable]);
        self
    }

    /// Add a playable to the last step so it runs alongside it
    pub fn join(&mut self, playable: impl Playable + 'static) -> &mut Self {
        self.join_boxed(Box::new(playable))
    }

    /// Boxed form of [`Timeline::join`]
    pub fn join_boxed(&mut self, playable: Box<dyn Playable>) -> &mut Self {
        if self.is_frozen("join") {
            return self;
        }
        self.check_looping(&*playable);
        match self.steps.last_mut() {
            Some(step) => step.push(playable),
            None => self.steps.push(vec![playable]),
        }
        self
    }

    /// Add a playable as a new step before the first one
    pub fn prepend(&mut self, playable: impl Playable + 'static) -> &mut Self {
        self.prepend_boxed(Box::new(playable))
    }

    /// Boxed form of [`Timeline::prepend`]
    pub fn prepend_boxed(&mut self, playable: Box<dyn Playable>) -> &mut Self {
        if self.is_frozen("prepend") {
            return self;
        }
        self.check_looping(&*playable);
        self.steps.insert(0, vec![playable]);
        self
    }

    /// Schedule a playable to start once the clock reaches `offset`,
    /// independent of step progress
    pub fn insert(&mut self, offset: Duration, playable: impl Playable + 'static) -> &mut Self {
        self.insert_boxed(offset, Box::new(playable))
    }

    /// Boxed form of [`Timeline::insert`]
    pub fn insert_boxed(&mut self, offset: Duration, playable: Box<dyn Playable>) -> &mut Self {
        if self.is_frozen("insert") {
            return self;
        }
        self.insertions.entry(offset).or_default().push(playable);
        self
    }

    /// [`Timeline::insert`] with the offset in seconds, rounded to whole
    /// milliseconds
    pub fn insert_secs(&mut self, seconds: f32, playable: impl Playable + 'static) -> &mut Self {
        self.insert(duration_from_secs(seconds), playable)
    }

    /// Add an empty step. It is passed on the tick the cursor reaches it.
    pub fn append_empty_step(&mut self) -> &mut Self {
        if !self.is_frozen("append") {
            self.steps.push(Vec::new());
        }
        self
    }

    /// Start or resume the timeline. Playables are started by the next update.
    pub fn play(&mut self) {
        if !self.started {
            tracing::debug!(
                "Timeline '{}' started: {} steps, {} insertions",
                self.name,
                self.steps.len(),
                self.insertion_count()
            );
        }
        self.started = true;
        self.playing = true;
    }

    /// Pause the timeline and stop every playable that is running
    ///
    /// The cursor and clock are kept, so a later [`Timeline::play`] resumes.
    pub fn stop(&mut self) {
        self.playing = false;
        let elapsed = self.elapsed;
        let current = self.steps.get_mut(self.cursor).into_iter().flatten();
        let inserted = self
            .insertions
            .range_mut(..=elapsed)
            .flat_map(|(_, step)| step.iter_mut());
        for playable in current.chain(inserted) {
            if playable.is_playing() && !playable.is_complete() {
                playable.stop();
            }
        }
    }

    fn skip_empty_steps(&mut self) {
        while self.steps.get(self.cursor).is_some_and(Vec::is_empty) {
            self.cursor += 1;
        }
    }

    /// Advance the timeline by one tick
    pub fn update(&mut self, delta: Duration) {
        if !self.playing || self.complete {
            return;
        }

        self.skip_empty_steps();
        if let Some(step) = self.steps.get_mut(self.cursor) {
            for playable in step.iter_mut() {
                drive(&mut **playable, delta);
            }
            if step.iter().all(|p| p.is_complete()) {
                self.cursor += 1;
                tracing::trace!("Timeline '{}' advanced to step {}", self.name, self.cursor);
                self.skip_empty_steps();
            }
        }

        self.elapsed += delta;

        for (_, step) in self.insertions.range_mut(..=self.elapsed) {
            for playable in step.iter_mut() {
                drive(&mut **playable, delta);
            }
        }

        let steps_done = self.cursor >= self.steps.len();
        let insertions_done = self
            .insertions
            .values()
            .flatten()
            .all(|p| p.is_complete());
        self.complete = steps_done && insertions_done;
        if self.complete {
            tracing::debug!("Timeline '{}' complete after {:?}", self.name, self.elapsed);
        }
    }

    /// Whether the timeline is currently playing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether every step and insertion has completed
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether [`Timeline::play`] has ever been called
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Time accumulated by updates while playing
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Index of the step currently being played
    pub fn current_step(&self) -> usize {
        self.cursor
    }

    /// Number of ordered steps
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Number of playables in a step
    pub fn step_len(&self, index: usize) -> Option<usize> {
        self.steps.get(index).map(Vec::len)
    }

    /// Number of time-keyed playables
    pub fn insertion_count(&self) -> usize {
        self.insertions.values().map(Vec::len).sum()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .field("cursor", &self.cursor)
            .field("insertions", &self.insertion_count())
            .field("elapsed", &self.elapsed)
            .field("playing", &self.playing)
            .field("complete", &self.complete)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playable::Delay;

    const TICK: Duration = Duration::from_millis(100);

    #[test]
    fn test_composition_shapes() {
        let mut timeline = Timeline::new();
        timeline
            .join(Delay::secs(0.1))
            .append(Delay::secs(0.1))
            .join(Delay::secs(0.1))
            .prepend(Delay::secs(0.1))
            .insert(Duration::from_secs(1), Delay::secs(0.1))
            .insert_secs(1.0, Delay::secs(0.1));

        assert_eq!(timeline.step_count(), 3);
        assert_eq!(timeline.step_len(0), Some(1));
        assert_eq!(timeline.step_len(1), Some(1));
        assert_eq!(timeline.step_len(2), Some(2));
        assert_eq!(timeline.insertion_count(), 2);
    }

    #[test]
    fn test_edits_after_play_are_ignored() {
        let mut timeline = Timeline::new();
        timeline.append(Delay::secs(1.0));
        timeline.play();
        timeline.stop();
        timeline
            .append(Delay::secs(1.0))
            .join(Delay::secs(1.0))
            .prepend(Delay::secs(1.0))
            .insert_secs(0.0, Delay::secs(1.0))
            .append_empty_step();

        assert_eq!(timeline.step_count(), 1);
        assert_eq!(timeline.step_len(0), Some(1));
        assert_eq!(timeline.insertion_count(), 0);
    }

    #[test]
    fn test_update_before_play_does_nothing() {
        let mut timeline = Timeline::new();
        timeline.update(TICK);
        assert!(!timeline.is_complete());
        assert_eq!(timeline.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_empty_timeline_completes_on_first_update() {
        let mut timeline = Timeline::new();
        timeline.play();
        assert!(!timeline.is_complete());
        timeline.update(TICK);
        assert!(timeline.is_complete());
    }

    #[test]
    fn test_stop_pauses_clock_and_cursor() {
        let mut timeline = Timeline::new();
        timeline.append(Delay::secs(0.3));
        timeline.play();
        timeline.update(TICK);
        timeline.stop();
        timeline.update(TICK);
        timeline.update(TICK);
        assert_eq!(timeline.elapsed(), TICK);
        assert_eq!(timeline.current_step(), 0);

        timeline.play();
        timeline.update(TICK);
        assert!(!timeline.is_complete());
        timeline.update(TICK);
        assert!(timeline.is_complete());
        assert_eq!(timeline.current_step(), 1);
    }

    #[test]
    fn test_complete_timeline_ignores_updates() {
        let mut timeline = Timeline::new();
        timeline.append(Delay::new(Duration::ZERO));
        timeline.play();
        timeline.update(TICK);
        assert!(timeline.is_complete());
        timeline.update(TICK);
        assert_eq!(timeline.elapsed(), TICK);
    }
}
