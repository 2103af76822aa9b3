//! Sub-item progression
//!
//! Runs a flat list of durations through its own [`Overlapper`], one duration
//! per sub-item. Useful below step level, for instance to stagger the targets
//! a single modifier drives.

use cadence_overlap::{OverlapItems, Overlapper};
use cadence_timing::{Duration, DurationCycle};

#[derive(Debug)]
struct Entry {
    duration: Duration,
    enabled: bool,
    forwards: bool,
}

#[derive(Debug, Default)]
struct Entries {
    list: Vec<Entry>,
    overlap_time: f32,
}

impl OverlapItems for Entries {
    fn item_count(&self) -> usize {
        self.list.len()
    }

    fn can_run(&self, index: usize) -> bool {
        self.list[index].enabled
    }

    fn can_run_backwards(&self, _index: usize) -> bool {
        false
    }

    fn resume(&mut self, index: usize) {
        self.list[index].duration.resume();
    }

    fn reset(&mut self, index: usize) {
        self.list[index].duration.reset(None);
    }

    fn tick(&mut self, index: usize, dt: f32, forwards: bool, paused: bool) -> bool {
        let entry = &mut self.list[index];
        if paused {
            return true;
        }
        entry.forwards = forwards;
        entry.duration.tick(dt);
        !entry.duration.finished()
    }

    fn time_remaining(&self, index: usize) -> f32 {
        self.list[index].duration.time_remaining()
    }

    fn overlap_time(&self) -> f32 {
        self.overlap_time
    }
}

/// Ping-pong scheduler over plain durations
#[derive(Debug, Default)]
pub struct ItemProgression {
    entries: Entries,
    overlapper: Overlapper,
}

impl ItemProgression {
    pub fn new(overlap_time: f32) -> Self {
        Self {
            entries: Entries {
                list: Vec::new(),
                overlap_time: overlap_time.max(0.0),
            },
            overlapper: Overlapper::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.list.is_empty()
    }

    /// Append a sub-item; returns its index
    pub fn push(&mut self, duration: Duration) -> usize {
        let index = self.entries.list.len();
        self.entries.list.push(Entry {
            duration,
            enabled: true,
            forwards: true,
        });
        self.overlapper.item_inserted(index);
        index
    }

    pub fn remove(&mut self, index: usize) -> Option<Duration> {
        if index >= self.entries.list.len() {
            return None;
        }
        self.overlapper.item_deleted(index);
        Some(self.entries.list.remove(index).duration)
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(entry) = self.entries.list.get_mut(index) {
            entry.enabled = enabled;
        }
    }

    pub fn duration(&self, index: usize) -> Option<&Duration> {
        self.entries.list.get(index).map(|e| &e.duration)
    }

    pub fn tick(&mut self, dt: f32) {
        self.overlapper.tick(&mut self.entries, dt);
    }

    pub fn is_running(&self, index: usize) -> bool {
        self.overlapper.is_running(index)
    }

    /// Whether the current pass has already reached `index`
    pub fn is_processed(&self, index: usize) -> bool {
        self.overlapper.is_active(index)
    }

    /// Direction of the pass that last ticked `index`
    pub fn forwards(&self, index: usize) -> bool {
        self.entries.list.get(index).is_some_and(|e| e.forwards)
    }

    /// Rises over the first half, falls over the second; 0 while idle
    pub fn level(&self, index: usize) -> f32 {
        if !self.is_running(index) {
            return 0.0;
        }
        let Some(entry) = self.entries.list.get(index) else {
            return 0.0;
        };
        let duration = &entry.duration;
        if duration.in_first_half() {
            duration.first_half_progress()
        } else {
            1.0 - duration.second_half_progress()
        }
    }
}
