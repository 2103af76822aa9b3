//! Steps
//!
//! A step owns a duration, a delay and a list of modifiers. Each frame the
//! step advances its own duration first, then lets every modifier sample the
//! result through its sync.

use crate::config::StepConfig;
use crate::error::{ConfigError, Result};
use crate::modifier::Modifier;
use crate::sync::{StepView, SyncContext, SyncSample};
use cadence_timing::{
    Delay, DelayPhase, DelayTick, Duration, DurationCycle, RandomSource, TimingError,
};
use smallvec::SmallVec;

/// How modifiers are driven on a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ModifierPhase {
    Running,
    /// The step's own delay is running
    Delayed,
    /// The step is not scheduled
    Paused,
}

#[derive(Clone, Debug)]
pub struct Step {
    name: String,
    enabled: bool,
    half_move: bool,
    duration: Duration,
    delay: Delay,
    modifiers: Vec<Modifier>,

    forwards: bool,
    was_first_half: bool,
    /// Half-move step stopped at its half crossing
    parked: bool,
    /// The step's runs end; set for steps scheduled by an overlapper
    bounded: bool,
}

impl Step {
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            half_move: false,
            duration,
            delay: Delay::new(),
            modifiers: Vec::new(),
            forwards: true,
            was_first_half: true,
            parked: false,
            bounded: false,
        }
    }

    pub fn from_config(config: &StepConfig, source: &mut dyn RandomSource) -> Result<Self> {
        config.validate()?;
        let timing = |source: TimingError| ConfigError::Timing {
            step: config.name.clone(),
            source,
        };

        let mut step = Self::new(
            config.name.clone(),
            Duration::from_config(&config.duration, source).map_err(timing)?,
        );
        step.enabled = config.enabled;
        step.half_move = config.half_move;
        step.delay = Delay::from_config(&config.delay, source).map_err(timing)?;
        for modifier in &config.modifiers {
            step.modifiers
                .push(Modifier::from_config(modifier, source).map_err(timing)?);
        }
        Ok(step)
    }

    pub fn to_config(&self) -> StepConfig {
        StepConfig {
            name: self.name.clone(),
            enabled: self.enabled,
            half_move: self.half_move,
            duration: self.duration.to_config(),
            delay: self.delay.to_config(),
            modifiers: self.modifiers.iter().map(Modifier::to_config).collect(),
        }
    }

    pub fn with_delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_half_move(mut self, half_move: bool) -> Self {
        self.half_move = half_move;
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    // ========== Accessors ==========

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn half_move(&self) -> bool {
        self.half_move
    }

    pub fn set_half_move(&mut self, half_move: bool) {
        self.half_move = half_move;
    }

    pub fn duration(&self) -> &Duration {
        &self.duration
    }

    pub fn duration_mut(&mut self) -> &mut Duration {
        &mut self.duration
    }

    /// Replace the step duration; the new one starts a fresh cycle
    pub fn set_duration(&mut self, mut duration: Duration) {
        duration.reset(None);
        self.duration = duration;
        self.was_first_half = true;
        self.parked = false;
    }

    pub fn delay(&self) -> &Delay {
        &self.delay
    }

    pub fn delay_mut(&mut self) -> &mut Delay {
        &mut self.delay
    }

    /// Direction of the current or last run
    pub fn forwards(&self) -> bool {
        self.forwards
    }

    pub fn is_parked(&self) -> bool {
        self.parked
    }

    pub(crate) fn set_bounded(&mut self, bounded: bool) {
        self.bounded = bounded;
    }

    /// Snapshot handed to modifier syncs
    pub fn view(&self) -> StepView {
        StepView::of(&self.duration, self.forwards)
            .with_budget(self.bounded.then(|| self.time_remaining()))
    }

    /// Seconds left in the current run, including a running delay
    pub fn time_remaining(&self) -> f32 {
        if self.parked {
            return self.delay.time_remaining();
        }
        let run = if self.half_move && self.forwards && self.duration.in_first_half() {
            self.duration.half_remaining()
        } else {
            self.duration.time_remaining()
        };
        run + self.delay.time_remaining()
    }

    // ========== Modifiers ==========

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn modifier(&self, index: usize) -> Option<&Modifier> {
        self.modifiers.get(index)
    }

    pub fn modifier_mut(&mut self, index: usize) -> Option<&mut Modifier> {
        self.modifiers.get_mut(index)
    }

    pub fn add_modifier(&mut self, modifier: Modifier) -> usize {
        self.modifiers.push(modifier);
        self.modifiers.len() - 1
    }

    /// Insert at `at`; links to modifiers at or after `at` follow them
    pub fn insert_modifier(&mut self, at: usize, modifier: Modifier) {
        let at = at.min(self.modifiers.len());
        for m in &mut self.modifiers {
            m.sync_mut()
                .remap_link(|i| Some(if i >= at { i + 1 } else { i }));
        }
        self.modifiers.insert(at, modifier);
    }

    /// Remove the modifier at `index`; links to it are cleared
    pub fn remove_modifier(&mut self, index: usize) -> Option<Modifier> {
        if index >= self.modifiers.len() {
            return None;
        }
        let removed = self.modifiers.remove(index);
        for m in &mut self.modifiers {
            m.sync_mut().remap_link(|i| match i {
                i if i == index => None,
                i if i > index => Some(i - 1),
                i => Some(i),
            });
        }
        Some(removed)
    }

    /// Move a modifier; links keep pointing at the same modifiers
    pub fn move_modifier(&mut self, from: usize, to: usize) {
        let len = self.modifiers.len();
        if from >= len || to >= len || from == to {
            return;
        }
        let moved = self.modifiers.remove(from);
        self.modifiers.insert(to, moved);

        let map = |i: usize| {
            if i == from {
                return Some(to);
            }
            let without = if i > from { i - 1 } else { i };
            Some(if without >= to { without + 1 } else { without })
        };
        for m in &mut self.modifiers {
            m.sync_mut().remap_link(map);
        }
    }

    // ========== Frame driving ==========

    /// Advance one frame. Returns `false` once the run has ended.
    ///
    /// A paused step only lets its modifiers evaluate; its own duration and
    /// delay do not move.
    pub fn tick(&mut self, dt: f32, forwards: bool, paused: bool) -> bool {
        if paused {
            self.tick_modifiers(dt, ModifierPhase::Paused);
            return true;
        }
        self.forwards = forwards;

        if self.delay.is_active() {
            let outcome = self.delay.tick(dt);
            self.tick_modifiers(dt, ModifierPhase::Delayed);
            return !matches!(outcome, DelayTick::Finished { stop: true, .. });
        }

        if !self.duration.finished() {
            self.duration.tick(dt);
        }
        let first_half = self.duration.in_first_half();
        let crossed = self.was_first_half && !first_half;
        self.was_first_half = first_half;
        self.tick_modifiers(dt, ModifierPhase::Running);

        if self.duration.finished() {
            return self.end_run();
        }
        if crossed {
            return self.cross_half();
        }
        true
    }

    fn cross_half(&mut self) -> bool {
        let halfway = self.delay.enabled(DelayPhase::Halfway);
        if self.half_move && self.forwards {
            tracing::trace!(step = %self.name, "half-move step parked");
            self.parked = true;
            if halfway {
                self.delay.activate_then_reset(DelayPhase::Halfway);
                return true;
            }
            return false;
        }
        if halfway {
            self.delay.activate(DelayPhase::Halfway);
        }
        true
    }

    fn end_run(&mut self) -> bool {
        let phase = if self.forwards {
            DelayPhase::EndForwards
        } else {
            DelayPhase::EndBackwards
        };
        if self.delay.enabled(phase) {
            self.delay.activate_then_reset(phase);
            return true;
        }
        false
    }

    fn tick_modifiers(&mut self, dt: f32, phase: ModifierPhase) {
        if self.modifiers.is_empty() {
            return;
        }
        let view = self.view().with_paused(phase == ModifierPhase::Paused);
        let len = self.modifiers.len();

        for (index, modifier) in self.modifiers.iter_mut().enumerate() {
            modifier.sync_mut().check_link(index, len);
            let advanced = modifier.enabled()
                && match phase {
                    ModifierPhase::Running | ModifierPhase::Paused => {
                        modifier.sync_mut().tick(dt, &view)
                    }
                    ModifierPhase::Delayed => modifier.sync_mut().tick_delayed(dt, &view),
                };
            modifier.set_advanced(advanced);
        }

        let samples: SmallVec<[Option<SyncSample>; 8]> = (0..len)
            .map(|index| {
                let ctx = SyncContext::new(&view, &self.modifiers, index);
                let modifier = &self.modifiers[index];
                let sync = modifier.sync();
                (modifier.enabled() && sync.advancing(&ctx)).then(|| sync.sample(&ctx))
            })
            .collect();

        for (modifier, sample) in self.modifiers.iter_mut().zip(samples) {
            if !modifier.enabled() {
                continue;
            }
            if let Some(sample) = sample {
                modifier.apply(sample);
            }
            modifier.sync_mut().post_tick(&view);
        }
    }

    /// End of a run. A parked half-move step keeps its cycle for the next run.
    pub fn reset(&mut self) {
        self.delay.reset();
        if self.parked {
            return;
        }
        self.duration.reset(None);
        self.was_first_half = true;
        for modifier in &mut self.modifiers {
            modifier.reset();
        }
    }

    /// Drop any parked half and start over from a fresh cycle
    pub fn restart(&mut self) {
        self.parked = false;
        self.reset();
    }

    /// The step was selected to run
    pub fn resume(&mut self) {
        self.parked = false;
        self.duration.resume();
        self.delay.resume();
        for modifier in &mut self.modifiers {
            modifier.resume();
        }
    }
}
