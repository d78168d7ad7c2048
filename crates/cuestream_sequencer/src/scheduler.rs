// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scheduler that ticks independent timelines and reaps finished ones.
//!
//! The host owns one [`Scheduler`] and calls [`Scheduler::update`] once per
//! frame. Code running inside a tick (for example a [`Callback`] hook) cannot
//! borrow the scheduler, so it edits the registry through a
//! [`SchedulerHandle`] instead. Handle commands are queued and applied between
//! timelines, never while one is being advanced.
//!
//! [`Callback`]: crate::playable::Callback

use crate::config::SchedulerConfig;
use crate::playable::Playable;
use crate::timeline::{Timeline, TimelineId};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Registry edit requested through a [`SchedulerHandle`]
enum Command {
    Add(Timeline),
    Remove(TimelineId),
    Cancel,
}

/// Cloneable handle for editing a scheduler's registry from inside a tick
#[derive(Clone, Default)]
pub struct SchedulerHandle {
    pending: Arc<Mutex<Vec<Command>>>,
}

impl SchedulerHandle {
    /// Queue a timeline for registration. It is first ticked on the pass
    /// after it is applied.
    pub fn add(&self, timeline: Timeline) -> TimelineId {
        let id = timeline.id();
        self.pending.lock().push(Command::Add(timeline));
        id
    }

    /// Queue removal of a timeline. It is not stopped.
    pub fn remove(&self, id: TimelineId) {
        self.pending.lock().push(Command::Remove(id));
    }

    /// Queue removal of every timeline
    pub fn cancel(&self) {
        self.pending.lock().push(Command::Cancel);
    }

    fn take(&self) -> Vec<Command> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

/// Per-timeline bookkeeping for the stall watchdog
#[derive(Debug)]
struct Entry {
    timeline: Timeline,
    last_step: usize,
    stalled_for: Duration,
    warned: bool,
}

impl Entry {
    fn new(timeline: Timeline) -> Self {
        Self {
            last_step: timeline.current_step(),
            timeline,
            stalled_for: Duration::ZERO,
            warned: false,
        }
    }

    fn watch(&mut self, delta: Duration, threshold: Option<Duration>) {
        let Some(threshold) = threshold else {
            return;
        };
        let step = self.timeline.current_step();
        if step != self.last_step || step >= self.timeline.step_count() {
            self.last_step = step;
            self.stalled_for = Duration::ZERO;
            self.warned = false;
            return;
        }
        self.stalled_for += delta;
        if !self.warned && self.stalled_for >= threshold {
            self.warned = true;
            tracing::warn!(
                "Timeline '{}' ({}) has been stuck on step {} for {:?}",
                self.timeline.name(),
                self.timeline.id(),
                step,
                self.stalled_for
            );
        }
    }
}

/// Owns independent timelines and advances them once per tick
#[derive(Debug, Default)]
pub struct Scheduler {
    timelines: IndexMap<TimelineId, Entry>,
    config: SchedulerConfig,
    handle: SchedulerHandle,
}

impl Scheduler {
    /// Create a scheduler with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with the given settings
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Settings in use
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Handle for editing the registry from inside a tick
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Register a timeline
    ///
    /// Every [`Timeline`] gets a fresh id at construction and cannot be
    /// cloned, so an id is never registered twice.
    pub fn add(&mut self, timeline: Timeline) -> TimelineId {
        let id = timeline.id();
        tracing::debug!("Registered timeline '{}' ({})", timeline.name(), id);
        self.timelines.insert(id, Entry::new(timeline));
        id
    }

    /// Register a single playable as a one-step timeline
    pub fn play_once(&mut self, playable: impl Playable + 'static) -> TimelineId {
        let mut timeline = Timeline::named(playable.label().to_string());
        timeline.append(playable);
        self.add(timeline)
    }

    /// Unregister a timeline without stopping it
    pub fn remove(&mut self, id: TimelineId) -> Option<Timeline> {
        self.timelines.shift_remove(&id).map(|entry| entry.timeline)
    }

    /// Unregister every timeline. None of them is stopped or completed.
    pub fn cancel(&mut self) {
        if !self.timelines.is_empty() {
            tracing::debug!("Cancelled {} timelines", self.timelines.len());
        }
        self.timelines.clear();
    }

    /// Advance every registered timeline by one tick, then drop the ones
    /// that completed
    pub fn update(&mut self, delta: Duration) {
        let delta = match self.config.max_delta() {
            Some(max) if delta > max => {
                tracing::trace!("Clamping tick delta {:?} to {:?}", delta, max);
                max
            }
            _ => delta,
        };
        let stall_warning = self.config.stall_warning();

        self.apply_pending();

        let ids: Vec<TimelineId> = self.timelines.keys().copied().collect();
        for id in ids {
            // Removed by an earlier timeline's callbacks during this pass
            let Some(entry) = self.timelines.get_mut(&id) else {
                continue;
            };
            let timeline = &mut entry.timeline;
            if !timeline.is_playing() {
                timeline.play();
            }
            if !timeline.is_complete() {
                timeline.update(delta);
            }
            entry.watch(delta, stall_warning);
            self.apply_pending();
        }

        self.timelines.retain(|id, entry| {
            let keep = !entry.timeline.is_complete();
            if !keep {
                tracing::debug!("Reaped timeline '{}' ({})", entry.timeline.name(), id);
            }
            keep
        });
        self.apply_pending();
    }

    fn apply_pending(&mut self) {
        for command in self.handle.take() {
            match command {
                Command::Add(timeline) => {
                    self.add(timeline);
                }
                Command::Remove(id) => {
                    self.remove(id);
                }
                Command::Cancel => self.cancel(),
            }
        }
    }

    /// Whether a timeline is registered
    pub fn contains(&self, id: TimelineId) -> bool {
        self.timelines.contains_key(&id)
    }

    /// Look up a registered timeline
    pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id).map(|entry| &entry.timeline)
    }

    /// Iterate over registered timelines
    pub fn timelines(&self) -> impl Iterator<Item = &Timeline> {
        self.timelines.values().map(|entry| &entry.timeline)
    }

    /// Whether the watchdog has flagged a timeline as stuck
    pub fn is_stalled(&self, id: TimelineId) -> bool {
        self.timelines.get(&id).is_some_and(|entry| entry.warned)
    }

    /// Number of registered timelines
    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    /// Whether no timeline is registered
    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playable::{Callback, Delay};

    const TICK: Duration = Duration::from_millis(100);

    fn delay_timeline(seconds: f32) -> Timeline {
        let mut timeline = Timeline::new();
        timeline.append(Delay::secs(seconds));
        timeline
    }

    #[test]
    fn test_update_starts_and_reaps() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.add(delay_timeline(0.2));
        assert!(!scheduler.get(id).unwrap().has_started());

        scheduler.update(TICK);
        assert!(scheduler.get(id).unwrap().is_playing());
        scheduler.update(TICK);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_each_timeline_registers_under_its_own_id() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.add(delay_timeline(1.0));
        let b = scheduler.add(delay_timeline(1.0));
        assert_ne!(a, b);
        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.get(a).unwrap().id(), a);
    }

    #[test]
    fn test_remove_does_not_stop() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.add(delay_timeline(1.0));
        scheduler.update(TICK);

        let timeline = scheduler.remove(id).unwrap();
        assert!(timeline.is_playing());
        assert!(!timeline.is_complete());
        assert!(scheduler.remove(id).is_none());
    }

    #[test]
    fn test_cancel_clears_registry() {
        let mut scheduler = Scheduler::new();
        scheduler.add(delay_timeline(1.0));
        scheduler.add(delay_timeline(2.0));
        assert_eq!(scheduler.len(), 2);
        scheduler.cancel();
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_play_once() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.play_once(Delay::secs(0.1));
        assert_eq!(scheduler.get(id).unwrap().name(), "delay");
        scheduler.update(TICK);
        assert!(!scheduler.contains(id));
    }

    #[test]
    fn test_max_delta_clamps() {
        let config = SchedulerConfig {
            max_delta: Some(0.1),
            stall_warning: None,
        };
        let mut scheduler = Scheduler::with_config(config);
        let id = scheduler.add(delay_timeline(10.0));
        scheduler.update(Duration::from_secs(3));
        assert_eq!(scheduler.get(id).unwrap().elapsed(), TICK);
    }

    #[test]
    fn test_handle_add_is_ticked_next_pass() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();
        let mut spawned = None;
        let mut parent = Timeline::new();
        parent.append(Callback::once(move || {
            let id = handle.add(delay_timeline(1.0));
            assert!(spawned.replace(id).is_none());
        }));
        scheduler.add(parent);

        scheduler.update(TICK);
        assert_eq!(scheduler.len(), 1);
        let child = scheduler.timelines().next().unwrap();
        assert!(!child.has_started());

        scheduler.update(TICK);
        assert!(scheduler.timelines().next().unwrap().is_playing());
    }

    #[test]
    fn test_stall_watchdog() {
        let config = SchedulerConfig {
            max_delta: None,
            stall_warning: Some(0.5),
        };
        let mut scheduler = Scheduler::with_config(config);
        let stuck = scheduler.add(delay_timeline(60.0));
        let moving = scheduler.add(delay_timeline(0.3));

        for _ in 0..4 {
            scheduler.update(TICK);
        }
        assert!(!scheduler.is_stalled(stuck));
        assert!(!scheduler.contains(moving));

        scheduler.update(TICK);
        assert!(scheduler.is_stalled(stuck));
    }
}
