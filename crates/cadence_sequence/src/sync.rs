//! Modifier sync strategies
//!
//! A sync decides whether its modifier advances on a frame and which
//! `(progress, first_half)` pair the modifier interpolates from. Syncs never
//! hold references to their step or siblings: every query receives a
//! [`SyncContext`] with a snapshot of the step and the step's modifier list.

use crate::config::SyncConfig;
use crate::modifier::Modifier;
use cadence_timing::{
    Delay, DelayConfig, DelayPhase, DelayTick, Duration, DurationConfig, DurationCycle,
    DurationKind, RandomSource, Result as TimingResult,
};

/// Snapshot of a step, taken after the step's own duration ticked
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepView {
    /// Progress through the running half
    pub progress: f32,
    pub first_half: bool,
    pub forwards: bool,
    pub total_progress: f32,
    pub elapsed: f32,
    pub current: f32,
    pub time_remaining: f32,
    pub finished: bool,
    /// `None` when the modifier is evaluated outside a step
    pub kind: Option<DurationKind>,
    /// Seconds the step has left before it stops; `None` for steps that loop
    pub budget: Option<f32>,
    /// The step is not scheduled this frame
    pub paused: bool,
}

impl StepView {
    pub fn of(duration: &Duration, forwards: bool) -> Self {
        Self {
            progress: duration.half_progress(),
            first_half: duration.in_first_half(),
            forwards,
            total_progress: duration.total_progress(),
            elapsed: duration.elapsed(),
            current: duration.current(),
            time_remaining: duration.time_remaining(),
            finished: duration.finished(),
            kind: Some(duration.kind()),
            budget: None,
            paused: false,
        }
    }

    /// A view with no step behind it
    pub fn detached() -> Self {
        Self {
            progress: 1.0,
            first_half: true,
            forwards: true,
            total_progress: 1.0,
            elapsed: 0.0,
            current: 0.0,
            time_remaining: 0.0,
            finished: true,
            kind: None,
            budget: None,
            paused: false,
        }
    }

    pub fn with_budget(mut self, budget: Option<f32>) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }
}

/// Read-only surroundings of the modifier being queried
#[derive(Clone, Copy, Debug)]
pub struct SyncContext<'a> {
    pub step: &'a StepView,
    pub modifiers: &'a [Modifier],
    /// Position of the queried modifier in `modifiers`
    pub index: usize,
}

impl<'a> SyncContext<'a> {
    pub fn new(step: &'a StepView, modifiers: &'a [Modifier], index: usize) -> Self {
        Self {
            step,
            modifiers,
            index,
        }
    }

    fn at(&self, index: usize) -> Self {
        Self { index, ..*self }
    }
}

/// What a modifier interpolates from
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyncSample {
    pub progress: f32,
    pub first_half: bool,
}

impl SyncSample {
    /// Fallback for unresolved links and missing steps
    pub const NEUTRAL: Self = Self {
        progress: 1.0,
        first_half: true,
    };
}

/// Phase of an unsynced modifier's own cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnsyncedState {
    #[default]
    Running,
    /// The halfway delay is running
    HalfwayPending,
    /// The end delay is running, or has ended and the restart is not confirmed yet
    EndForwardsPending,
}

/// Independent duration and delay owned by one modifier
#[derive(Clone, Debug)]
pub struct UnsyncedSync {
    duration: Duration,
    delay: Delay,
    state: UnsyncedState,
    was_first_half: bool,
}

impl UnsyncedSync {
    pub fn new(duration: Duration, delay: Delay) -> Self {
        Self {
            duration,
            delay,
            state: UnsyncedState::Running,
            was_first_half: true,
        }
    }

    pub fn from_config(
        duration: &DurationConfig,
        delay: &DelayConfig,
        source: &mut dyn RandomSource,
    ) -> TimingResult<Self> {
        Ok(Self::new(
            Duration::from_config(duration, source)?,
            Delay::from_config(delay, source)?,
        ))
    }

    pub fn duration(&self) -> &Duration {
        &self.duration
    }

    pub fn duration_mut(&mut self) -> &mut Duration {
        &mut self.duration
    }

    pub fn delay(&self) -> &Delay {
        &self.delay
    }

    pub fn delay_mut(&mut self) -> &mut Delay {
        &mut self.delay
    }

    pub fn state(&self) -> UnsyncedState {
        self.state
    }

    fn tick(&mut self, dt: f32) -> bool {
        match self.state {
            UnsyncedState::Running => {
                // Finished cycles hold until post_tick restarts them
                if self.duration.finished() {
                    return false;
                }
                self.duration.tick(dt);
                true
            }
            UnsyncedState::HalfwayPending | UnsyncedState::EndForwardsPending => {
                match self.delay.tick(dt) {
                    DelayTick::Running => {}
                    DelayTick::Finished {
                        reset_wrapped: true,
                        ..
                    } => {}
                    DelayTick::Finished { .. } | DelayTick::Idle => {
                        if self.state == UnsyncedState::HalfwayPending {
                            self.state = UnsyncedState::Running;
                        }
                    }
                }
                false
            }
        }
    }

    fn post_tick(&mut self, step: &StepView) {
        if !step.paused {
            match self.state {
                UnsyncedState::Running if self.duration.finished() => self.on_finished(step),
                UnsyncedState::Running => self.on_running(step),
                UnsyncedState::EndForwardsPending if !self.delay.is_active() => {
                    self.restart(step)
                }
                _ => {}
            }
        }
        self.was_first_half = self.duration.in_first_half();
    }

    fn on_running(&mut self, step: &StepView) {
        let crossed = self.was_first_half && !self.duration.in_first_half();
        if !crossed || !self.delay.enabled(DelayPhase::Halfway) {
            return;
        }

        let needed =
            self.delay.duration(DelayPhase::Halfway).current() + self.duration.time_remaining();
        if let Some(budget) = step.budget {
            if needed > budget {
                tracing::debug!(needed, budget, "halfway delay does not fit; skipped");
                return;
            }
        }
        self.delay.activate(DelayPhase::Halfway);
        self.state = UnsyncedState::HalfwayPending;
    }

    fn on_finished(&mut self, step: &StepView) {
        if !self.delay.enabled(DelayPhase::EndForwards) {
            self.restart(step);
            return;
        }

        let needed = self.delay.duration(DelayPhase::EndForwards).current();
        if let Some(budget) = step.budget {
            if needed > budget {
                tracing::trace!(needed, budget, "end delay does not fit; waiting");
                return;
            }
        }
        self.delay.activate_then_reset(DelayPhase::EndForwards);
        self.state = UnsyncedState::EndForwardsPending;
    }

    /// Start the next cycle. A step that will stop gets a cycle that fits its
    /// remaining time, subject to [`confirm_stop_reset`](Self::confirm_stop_reset).
    fn restart(&mut self, step: &StepView) {
        let Some(budget) = step.budget else {
            self.duration.reset(None);
            self.state = UnsyncedState::Running;
            return;
        };

        let mut candidate = self.duration.clone();
        candidate.reset(Some(budget));
        if self.confirm_stop_reset(budget, &candidate) {
            self.duration = candidate;
            self.state = UnsyncedState::Running;
        } else {
            tracing::trace!(budget, current = candidate.current(), "stop reset skipped");
        }
    }

    /// Whether a capped restart still leaves room for the halfway delay.
    ///
    /// Provisional: a failed check leaves the finished cycle in place and the
    /// check repeats every frame until the step stops.
    fn confirm_stop_reset(&self, budget: f32, candidate: &Duration) -> bool {
        if !self.delay.enabled(DelayPhase::Halfway) {
            return true;
        }
        let grace = budget - candidate.current();
        grace >= self.delay.duration(DelayPhase::Halfway).current()
    }

    fn reset(&mut self) {
        self.duration.reset(None);
        self.delay.reset();
        self.state = UnsyncedState::Running;
        self.was_first_half = true;
    }

    fn resume(&mut self) {
        self.duration.resume();
        self.delay.resume();
    }
}

/// Lazily resolved link to a sibling modifier, by position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModifierLink {
    index: Option<usize>,
}

impl ModifierLink {
    pub fn new(index: Option<usize>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

/// Strategy a modifier uses to derive its progress
#[derive(Clone, Debug, Default)]
pub enum ModifierSync {
    /// Same progress and direction as the step
    #[default]
    Duration,
    /// Progress through the step's whole duration
    StepProgress,
    /// Own duration and delay, independent of the step's timing
    Unsynced(UnsyncedSync),
    /// Mirrors another modifier of the same step
    OtherModifier(ModifierLink),
}

impl ModifierSync {
    pub fn from_config(config: &SyncConfig, source: &mut dyn RandomSource) -> TimingResult<Self> {
        Ok(match config {
            SyncConfig::Duration => ModifierSync::Duration,
            SyncConfig::StepProgress => ModifierSync::StepProgress,
            SyncConfig::Unsynced { duration, delay } => {
                ModifierSync::Unsynced(UnsyncedSync::from_config(duration, delay, source)?)
            }
            SyncConfig::OtherModifier { index } => {
                ModifierSync::OtherModifier(ModifierLink::new(*index))
            }
        })
    }

    pub fn to_config(&self) -> SyncConfig {
        match self {
            ModifierSync::Duration => SyncConfig::Duration,
            ModifierSync::StepProgress => SyncConfig::StepProgress,
            ModifierSync::Unsynced(sync) => SyncConfig::Unsynced {
                duration: sync.duration.to_config(),
                delay: sync.delay.to_config(),
            },
            ModifierSync::OtherModifier(link) => SyncConfig::OtherModifier { index: link.index },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModifierSync::Duration => "duration",
            ModifierSync::StepProgress => "step_progress",
            ModifierSync::Unsynced(_) => "unsynced",
            ModifierSync::OtherModifier(_) => "other_modifier",
        }
    }

    pub fn as_unsynced(&self) -> Option<&UnsyncedSync> {
        match self {
            ModifierSync::Unsynced(sync) => Some(sync),
            _ => None,
        }
    }

    pub fn as_unsynced_mut(&mut self) -> Option<&mut UnsyncedSync> {
        match self {
            ModifierSync::Unsynced(sync) => Some(sync),
            _ => None,
        }
    }

    // ========== Frame driving ==========

    /// Advance while the step runs. Returns whether the modifier may update
    /// its value this frame.
    ///
    /// Links report `true` here; whether they advance is decided by the
    /// modifier they resolve to.
    pub fn tick(&mut self, dt: f32, step: &StepView) -> bool {
        match self {
            ModifierSync::Duration | ModifierSync::StepProgress => !step.paused,
            ModifierSync::Unsynced(sync) => sync.tick(dt),
            ModifierSync::OtherModifier(_) => true,
        }
    }

    /// Advance while the step's own delay runs
    pub fn tick_delayed(&mut self, dt: f32, step: &StepView) -> bool {
        match self {
            ModifierSync::Duration | ModifierSync::StepProgress => false,
            ModifierSync::Unsynced(_) | ModifierSync::OtherModifier(_) => self.tick(dt, step),
        }
    }

    /// Adjust state once the frame's value has been computed
    pub fn post_tick(&mut self, step: &StepView) {
        if let ModifierSync::Unsynced(sync) = self {
            sync.post_tick(step);
        }
    }

    pub fn reset(&mut self) {
        if let ModifierSync::Unsynced(sync) = self {
            sync.reset();
        }
    }

    pub fn resume(&mut self) {
        if let ModifierSync::Unsynced(sync) = self {
            sync.resume();
        }
    }

    // ========== Links ==========

    /// Drop a link that points at its own modifier or past the list
    pub fn check_link(&mut self, own_index: usize, len: usize) {
        let ModifierSync::OtherModifier(link) = self else {
            return;
        };
        match link.index {
            Some(index) if index == own_index => {
                tracing::error!(modifier = own_index, "modifier synced to itself; link cleared");
                link.index = None;
            }
            Some(index) if index >= len => {
                tracing::error!(
                    modifier = own_index,
                    index,
                    len,
                    "modifier synced to a missing modifier; link cleared"
                );
                link.index = None;
            }
            _ => {}
        }
    }

    /// Rewrite a stored link after the modifier list changed.
    ///
    /// `map` takes the old position and returns the new one, or `None` if the
    /// linked modifier was removed.
    pub fn remap_link(&mut self, map: impl Fn(usize) -> Option<usize>) {
        if let ModifierSync::OtherModifier(link) = self {
            if let Some(index) = link.index {
                link.index = map(index);
                if link.index.is_none() {
                    tracing::warn!(index, "linked modifier removed; link cleared");
                }
            }
        }
    }

    /// Position of the modifier whose sync answers queries for this one
    pub fn resolve(&self, ctx: &SyncContext<'_>) -> Option<usize> {
        let ModifierSync::OtherModifier(link) = self else {
            return Some(ctx.index);
        };

        let len = ctx.modifiers.len();
        let mut next = link.index?;
        for _ in 0..len {
            if next == ctx.index {
                tracing::warn!(modifier = ctx.index, "modifier link cycle");
                return None;
            }
            let Some(target) = ctx.modifiers.get(next) else {
                tracing::debug!(modifier = ctx.index, index = next, len, "link unresolved");
                return None;
            };
            match target.sync() {
                ModifierSync::OtherModifier(link) => next = link.index?,
                _ => return Some(next),
            }
        }

        tracing::warn!(modifier = ctx.index, "modifier link cycle");
        None
    }

    fn target<'a>(&'a self, ctx: &SyncContext<'a>) -> Option<(&'a ModifierSync, SyncContext<'a>)> {
        match self {
            ModifierSync::OtherModifier(_) => {
                let index = self.resolve(ctx)?;
                Some((ctx.modifiers[index].sync(), ctx.at(index)))
            }
            _ => Some((self, *ctx)),
        }
    }

    // ========== Queries ==========

    /// Whether the modifier should take a new value this frame
    pub fn advancing(&self, ctx: &SyncContext<'_>) -> bool {
        match self {
            ModifierSync::OtherModifier(_) => match self.resolve(ctx) {
                Some(index) => ctx.modifiers[index].advanced(),
                None => !ctx.step.paused,
            },
            _ => ctx
                .modifiers
                .get(ctx.index)
                .map(|m| m.advanced())
                .unwrap_or(false),
        }
    }

    pub fn sample(&self, ctx: &SyncContext<'_>) -> SyncSample {
        let Some((sync, ctx)) = self.target(ctx) else {
            return SyncSample::NEUTRAL;
        };
        match sync {
            ModifierSync::Duration => SyncSample {
                progress: ctx.step.progress,
                first_half: ctx.step.first_half,
            },
            ModifierSync::StepProgress => step_progress(ctx.step),
            ModifierSync::Unsynced(sync) => SyncSample {
                progress: sync.duration.half_progress(),
                first_half: sync.duration.in_first_half(),
            },
            ModifierSync::OtherModifier(_) => SyncSample::NEUTRAL,
        }
    }

    pub fn progress(&self, ctx: &SyncContext<'_>) -> f32 {
        self.sample(ctx).progress
    }

    pub fn in_first_half(&self, ctx: &SyncContext<'_>) -> bool {
        self.sample(ctx).first_half
    }

    pub fn finished(&self, ctx: &SyncContext<'_>) -> bool {
        match self.target(ctx) {
            Some((ModifierSync::Unsynced(sync), _)) => sync.duration.finished(),
            Some((ModifierSync::Duration | ModifierSync::StepProgress, ctx)) => ctx.step.finished,
            _ => true,
        }
    }

    pub fn time_remaining(&self, ctx: &SyncContext<'_>) -> f32 {
        match self.target(ctx) {
            Some((ModifierSync::Unsynced(sync), _)) => {
                sync.duration.time_remaining() + sync.delay.time_remaining()
            }
            Some((ModifierSync::Duration | ModifierSync::StepProgress, ctx)) => {
                ctx.step.time_remaining
            }
            _ => 0.0,
        }
    }

    pub fn current_duration(&self, ctx: &SyncContext<'_>) -> f32 {
        match self.target(ctx) {
            Some((ModifierSync::Unsynced(sync), _)) => sync.duration.current(),
            Some((ModifierSync::Duration | ModifierSync::StepProgress, ctx)) => ctx.step.current,
            _ => 0.0,
        }
    }

    pub fn duration_progress(&self, ctx: &SyncContext<'_>) -> f32 {
        match self.target(ctx) {
            Some((ModifierSync::Unsynced(sync), _)) => sync.duration.total_progress(),
            Some((ModifierSync::Duration | ModifierSync::StepProgress, ctx)) => {
                ctx.step.total_progress
            }
            _ => 1.0,
        }
    }
}

fn step_progress(step: &StepView) -> SyncSample {
    match step.kind {
        Some(DurationKind::Random) => SyncSample {
            progress: if step.current > 0.0 {
                (step.elapsed / step.current).clamp(0.0, 1.0)
            } else {
                1.0
            },
            first_half: true,
        },
        Some(DurationKind::Ramp) => SyncSample {
            progress: step.total_progress,
            first_half: step.first_half,
        },
        None => {
            tracing::error!("step progress sync evaluated without a step duration");
            SyncSample::NEUTRAL
        }
    }
}
