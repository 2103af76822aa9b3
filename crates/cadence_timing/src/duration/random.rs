//! Randomly ranged duration

use super::{CloneFlags, DurationConfig, DurationCycle};
use crate::random::{default_source, PcgSource, RandomSource};
use serde::{Deserialize, Serialize};

pub(super) const DEFAULT_CUTOFF_STEP: f32 = 0.1;

/// Rounding applied to each draw
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    /// Keep the draw as is
    #[default]
    Exact,
    /// Nearest multiple of the cutoff step
    Round,
    /// Multiple of the cutoff step at or below the draw
    Floor,
    /// Multiple of the cutoff step at or above the draw
    Ceil,
}

impl Cutoff {
    pub fn apply(self, value: f32, step: f32) -> f32 {
        if step <= 0.0 {
            return value;
        }
        let units = value / step;
        let snapped = match self {
            Cutoff::Exact => return value,
            Cutoff::Round => units.round(),
            Cutoff::Floor => units.floor(),
            Cutoff::Ceil => units.ceil(),
        };
        snapped * step
    }
}

/// Duration drawn from `initial ± range` on every reset.
///
/// With a non-zero `interval`, a new value is drawn only once at least
/// `interval` seconds have been ticked since the previous draw; other resets
/// keep the previous draw.
#[derive(Debug)]
pub struct RandomDuration {
    initial: f32,
    range: f32,
    interval: f32,
    cutoff: Cutoff,
    cutoff_step: f32,

    drawn: f32,
    current: f32,
    elapsed: f32,
    since_draw: f32,
    finished: bool,

    source: Box<dyn RandomSource>,
}

impl RandomDuration {
    /// Create with an entropy-seeded source
    pub fn new(initial: f32, range: f32) -> Self {
        Self::with_source(initial, range, default_source())
    }

    /// Create with an injected source. The first value is drawn immediately.
    pub fn with_source(initial: f32, range: f32, source: Box<dyn RandomSource>) -> Self {
        let mut duration = Self {
            initial: initial.max(0.0),
            range: range.max(0.0),
            interval: 0.0,
            cutoff: Cutoff::Exact,
            cutoff_step: DEFAULT_CUTOFF_STEP,
            drawn: 0.0,
            current: 0.0,
            elapsed: 0.0,
            since_draw: 0.0,
            finished: false,
            source,
        };
        duration.redraw();
        duration.current = duration.drawn;
        duration
    }

    /// Only redraw after `interval` seconds of ticking
    pub fn with_interval(mut self, interval: f32) -> Self {
        self.interval = interval.max(0.0);
        self
    }

    pub fn with_cutoff(mut self, cutoff: Cutoff, step: f32) -> Self {
        self.cutoff = cutoff;
        self.cutoff_step = step.max(0.0);
        self.redraw();
        self.current = self.drawn;
        self
    }

    pub fn initial(&self) -> f32 {
        self.initial
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn cutoff(&self) -> Cutoff {
        self.cutoff
    }

    /// The last uncapped draw
    pub fn drawn(&self) -> f32 {
        self.drawn
    }

    pub fn set_initial(&mut self, initial: f32) {
        self.initial = initial.max(0.0);
    }

    pub fn set_range(&mut self, range: f32) {
        self.range = range.max(0.0);
    }

    pub fn set_interval(&mut self, interval: f32) {
        self.interval = interval.max(0.0);
    }

    fn needs_redraw(&self) -> bool {
        self.interval <= 0.0 || self.since_draw >= self.interval
    }

    fn redraw(&mut self) {
        let low = self.initial - self.range;
        let high = self.initial + self.range;
        let value = self.source.range(low, high);
        self.drawn = self.cutoff.apply(value, self.cutoff_step).max(0.0);
        self.since_draw = 0.0;
        tracing::trace!(drawn = self.drawn, "random duration redrawn");
    }

    pub fn to_config(&self) -> DurationConfig {
        DurationConfig::Random {
            initial: self.initial,
            range: self.range,
            interval: self.interval,
            cutoff: self.cutoff,
            cutoff_step: self.cutoff_step,
        }
    }

    pub fn clone_with(&self, flags: CloneFlags) -> Self {
        let source = if flags.contains(CloneFlags::RESEED) {
            PcgSource::from_entropy().boxed()
        } else {
            self.source.duplicate()
        };
        let mut copy = Self {
            initial: self.initial,
            range: self.range,
            interval: self.interval,
            cutoff: self.cutoff,
            cutoff_step: self.cutoff_step,
            drawn: self.drawn,
            current: self.current,
            elapsed: self.elapsed,
            since_draw: self.since_draw,
            finished: self.finished,
            source,
        };
        if !flags.contains(CloneFlags::KEEP_STATE) {
            copy.elapsed = 0.0;
            copy.finished = false;
            copy.current = copy.drawn;
        }
        copy
    }

    fn half(&self) -> f32 {
        self.current * 0.5
    }
}

impl DurationCycle for RandomDuration {
    fn tick(&mut self, dt: f32) {
        if self.finished {
            return;
        }
        let dt = dt.max(0.0);
        self.since_draw += dt;
        self.elapsed += dt;
        if self.elapsed >= self.current {
            self.elapsed = self.current;
            self.finished = true;
        }
    }

    fn reset(&mut self, max_total: Option<f32>) -> f32 {
        if self.needs_redraw() {
            self.redraw();
        }
        self.current = match max_total {
            Some(max) => self.drawn.min(max.max(0.0)),
            None => self.drawn,
        };
        self.elapsed = 0.0;
        self.finished = false;
        self.current
    }

    fn current(&self) -> f32 {
        self.current
    }

    fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn in_first_half(&self) -> bool {
        self.elapsed < self.half()
    }

    fn first_half_progress(&self) -> f32 {
        let half = self.half();
        if half <= 0.0 {
            return 1.0;
        }
        (self.elapsed / half).min(1.0)
    }

    fn second_half_progress(&self) -> f32 {
        let half = self.half();
        if half <= 0.0 {
            return if self.finished { 1.0 } else { 0.0 };
        }
        if self.in_first_half() {
            return 0.0;
        }
        ((self.elapsed - half) / half).clamp(0.0, 1.0)
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn half_remaining(&self) -> f32 {
        (self.half() - self.elapsed).max(0.0)
    }
}

impl Clone for RandomDuration {
    fn clone(&self) -> Self {
        self.clone_with(CloneFlags::KEEP_STATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(initial: f32, range: f32, seed: u64) -> RandomDuration {
        RandomDuration::with_source(initial, range, PcgSource::seeded(seed).boxed())
    }

    #[test]
    fn test_draws_stay_in_range() {
        let mut duration = seeded(5.0, 2.0, 1);
        for _ in 0..100 {
            let value = duration.reset(None);
            assert!((3.0..=7.0).contains(&value), "{}", value);
        }
    }

    #[test]
    fn test_zero_interval_redraws_every_reset() {
        let mut duration = seeded(5.0, 2.0, 2);
        let draws: Vec<f32> = (0..20).map(|_| duration.reset(None)).collect();
        let mean = draws.iter().sum::<f32>() / draws.len() as f32;
        let variance =
            draws.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / draws.len() as f32;
        assert!(variance > 0.0);
    }

    #[test]
    fn test_interval_holds_previous_draw() {
        let mut duration = seeded(5.0, 2.0, 3).with_interval(1.0);
        let first = duration.reset(None);

        duration.tick(0.4);
        assert_eq!(duration.reset(None), first);
        duration.tick(0.4);
        assert_eq!(duration.reset(None), first);

        // 1.2s accumulated since the draw, so this reset draws again
        duration.tick(0.4);
        let next = duration.reset(None);
        assert_eq!(duration.since_draw, 0.0);

        duration.tick(0.5);
        assert_eq!(duration.reset(None), next);
        assert_eq!(duration.since_draw, 0.5);
    }

    #[test]
    fn test_reset_respects_budget_without_losing_draw() {
        let mut duration = seeded(4.0, 0.0, 4).with_interval(10.0);
        assert_eq!(duration.reset(Some(1.5)), 1.5);
        assert_eq!(duration.drawn(), 4.0);
        assert_eq!(duration.reset(None), 4.0);
    }

    #[test]
    fn test_finishes_and_clamps_elapsed() {
        let mut duration = seeded(1.0, 0.0, 5);
        duration.reset(None);
        duration.tick(0.6);
        assert!(!duration.finished());
        assert!(!duration.in_first_half());
        duration.tick(0.6);
        assert!(duration.finished());
        assert_eq!(duration.elapsed(), 1.0);
        assert_eq!(duration.time_remaining(), 0.0);

        // Finished cycles do not advance until reset
        duration.tick(1.0);
        assert_eq!(duration.elapsed(), 1.0);
    }

    #[test]
    fn test_zero_length_cycle() {
        let mut duration = seeded(0.0, 0.0, 6);
        duration.reset(None);
        assert_eq!(duration.first_half_progress(), 1.0);
        duration.tick(0.016);
        assert!(duration.finished());
        assert_eq!(duration.second_half_progress(), 1.0);
        assert_eq!(duration.total_progress(), 1.0);
    }

    #[test]
    fn test_cutoff_snaps_draws() {
        assert_eq!(Cutoff::Round.apply(1.26, 0.5), 1.5);
        assert_eq!(Cutoff::Floor.apply(1.26, 0.5), 1.0);
        assert_eq!(Cutoff::Ceil.apply(1.26, 0.5), 1.5);
        assert_eq!(Cutoff::Exact.apply(1.26, 0.5), 1.26);
        assert_eq!(Cutoff::Round.apply(1.26, 0.0), 1.26);

        let mut duration = seeded(3.0, 1.0, 7).with_cutoff(Cutoff::Floor, 1.0);
        for _ in 0..20 {
            let value = duration.reset(None);
            assert_eq!(value.fract(), 0.0);
        }
    }

    #[test]
    fn test_draws_never_negative() {
        let mut duration = seeded(0.5, 3.0, 8);
        for _ in 0..50 {
            assert!(duration.reset(None) >= 0.0);
        }
    }

    #[test]
    fn test_clone_without_state_restarts() {
        let mut duration = seeded(2.0, 0.0, 9);
        duration.reset(None);
        duration.tick(1.5);

        let kept = duration.clone_with(CloneFlags::KEEP_STATE);
        assert_eq!(kept.elapsed(), 1.5);

        let fresh = duration.clone_with(CloneFlags::NONE);
        assert_eq!(fresh.elapsed(), 0.0);
        assert_eq!(fresh.current(), 2.0);
        assert!(!fresh.finished());
    }
}
