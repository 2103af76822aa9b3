//! Layered delays
//!
//! A [`Delay`] holds up to four durations and at most one of them runs at a
//! time. In `same_delay` mode every phase shares the single duration; otherwise
//! each phase (halfway, end of a forwards run, end of a backwards run) has its
//! own.
//!
//! The delay never calls back into its owner. When the running duration ends,
//! [`Delay::tick`] reports [`DelayTick::Finished`] and the owner acts on the
//! consumed one-shot flags.

use crate::duration::{Duration, DurationConfig, DurationCycle};
use crate::error::Result;
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};

/// Which duration is currently running
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DelayType {
    #[default]
    None,
    /// The shared duration of a `same_delay` delay
    Single,
    Halfway,
    EndForwards,
    EndBackwards,
}

/// Point of a cycle where a delay can be injected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelayPhase {
    Halfway,
    EndForwards,
    EndBackwards,
}

impl DelayPhase {
    fn delay_type(self) -> DelayType {
        match self {
            DelayPhase::Halfway => DelayType::Halfway,
            DelayPhase::EndForwards => DelayType::EndForwards,
            DelayPhase::EndBackwards => DelayType::EndBackwards,
        }
    }
}

/// Outcome of [`Delay::tick`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayTick {
    /// No delay is running
    Idle,
    /// The active delay is still running
    Running,
    /// The active delay ended this tick
    Finished {
        /// `stop_after` was set and has been consumed
        stop: bool,
        /// The owner should reset the duration this delay wraps
        reset_wrapped: bool,
    },
}

#[derive(Clone, Debug)]
pub struct Delay {
    same_delay: bool,
    halfway: bool,
    end_forwards: bool,
    end_backwards: bool,

    single: Duration,
    halfway_duration: Duration,
    end_forwards_duration: Duration,
    end_backwards_duration: Duration,

    active_type: DelayType,
    stop_after: bool,
    reset_duration_after: bool,
}

impl Delay {
    /// A delay with every phase disabled
    pub fn new() -> Self {
        Self {
            same_delay: false,
            halfway: false,
            end_forwards: false,
            end_backwards: false,
            single: Duration::default(),
            halfway_duration: Duration::default(),
            end_forwards_duration: Duration::default(),
            end_backwards_duration: Duration::default(),
            active_type: DelayType::None,
            stop_after: false,
            reset_duration_after: false,
        }
    }

    pub fn from_config(config: &DelayConfig, source: &mut dyn RandomSource) -> Result<Self> {
        Ok(Self {
            same_delay: config.same_delay,
            halfway: config.halfway,
            end_forwards: config.end_forwards,
            end_backwards: config.end_backwards,
            single: Duration::from_config(&config.single, source)?,
            halfway_duration: Duration::from_config(&config.halfway_duration, source)?,
            end_forwards_duration: Duration::from_config(&config.end_forwards_duration, source)?,
            end_backwards_duration: Duration::from_config(
                &config.end_backwards_duration,
                source,
            )?,
            active_type: DelayType::None,
            stop_after: false,
            reset_duration_after: false,
        })
    }

    pub fn to_config(&self) -> DelayConfig {
        DelayConfig {
            same_delay: self.same_delay,
            halfway: self.halfway,
            end_forwards: self.end_forwards,
            end_backwards: self.end_backwards,
            single: self.single.to_config(),
            halfway_duration: self.halfway_duration.to_config(),
            end_forwards_duration: self.end_forwards_duration.to_config(),
            end_backwards_duration: self.end_backwards_duration.to_config(),
        }
    }

    pub fn same_delay(&self) -> bool {
        self.same_delay
    }

    pub fn set_same_delay(&mut self, same: bool) {
        self.same_delay = same;
    }

    pub fn enabled(&self, phase: DelayPhase) -> bool {
        match phase {
            DelayPhase::Halfway => self.halfway,
            DelayPhase::EndForwards => self.end_forwards,
            DelayPhase::EndBackwards => self.end_backwards,
        }
    }

    pub fn set_enabled(&mut self, phase: DelayPhase, enabled: bool) {
        match phase {
            DelayPhase::Halfway => self.halfway = enabled,
            DelayPhase::EndForwards => self.end_forwards = enabled,
            DelayPhase::EndBackwards => self.end_backwards = enabled,
        }
    }

    /// Duration that would run for `phase`, honouring `same_delay`
    pub fn duration(&self, phase: DelayPhase) -> &Duration {
        if self.same_delay {
            return &self.single;
        }
        match phase {
            DelayPhase::Halfway => &self.halfway_duration,
            DelayPhase::EndForwards => &self.end_forwards_duration,
            DelayPhase::EndBackwards => &self.end_backwards_duration,
        }
    }

    /// Replace the duration used for `phase` (the shared one in `same_delay` mode)
    pub fn set_duration(&mut self, phase: DelayPhase, duration: Duration) {
        let slot = if self.same_delay {
            &mut self.single
        } else {
            match phase {
                DelayPhase::Halfway => &mut self.halfway_duration,
                DelayPhase::EndForwards => &mut self.end_forwards_duration,
                DelayPhase::EndBackwards => &mut self.end_backwards_duration,
            }
        };
        *slot = duration;
    }

    pub fn active_type(&self) -> DelayType {
        self.active_type
    }

    pub fn is_active(&self) -> bool {
        self.active_type != DelayType::None
    }

    pub fn stop_after(&self) -> bool {
        self.stop_after
    }

    pub fn reset_duration_after(&self) -> bool {
        self.reset_duration_after
    }

    fn duration_for(&mut self, ty: DelayType) -> Option<&mut Duration> {
        match ty {
            DelayType::None => None,
            DelayType::Single => Some(&mut self.single),
            DelayType::Halfway => Some(&mut self.halfway_duration),
            DelayType::EndForwards => Some(&mut self.end_forwards_duration),
            DelayType::EndBackwards => Some(&mut self.end_backwards_duration),
        }
    }

    pub fn active_duration(&self) -> Option<&Duration> {
        match self.active_type {
            DelayType::None => None,
            DelayType::Single => Some(&self.single),
            DelayType::Halfway => Some(&self.halfway_duration),
            DelayType::EndForwards => Some(&self.end_forwards_duration),
            DelayType::EndBackwards => Some(&self.end_backwards_duration),
        }
    }

    /// Time left in the running delay, 0 when idle
    pub fn time_remaining(&self) -> f32 {
        self.active_duration()
            .map(|d| d.time_remaining())
            .unwrap_or(0.0)
    }

    /// Start the delay for `phase`
    pub fn activate(&mut self, phase: DelayPhase) {
        self.active_type = if self.same_delay {
            DelayType::Single
        } else {
            phase.delay_type()
        };
        tracing::trace!(?phase, active = ?self.active_type, "delay activated");
    }

    /// Start the delay for `phase` and ask the owner to stop and reset its
    /// wrapped duration once it ends
    pub fn activate_then_reset(&mut self, phase: DelayPhase) {
        self.activate(phase);
        self.stop_after = true;
        self.reset_duration_after = true;
    }

    /// Advance the active delay; frozen phases do not move
    pub fn tick(&mut self, dt: f32) -> DelayTick {
        let ty = self.active_type;
        let Some(duration) = self.duration_for(ty) else {
            return DelayTick::Idle;
        };

        duration.tick(dt);
        if !duration.finished() {
            return DelayTick::Running;
        }
        duration.reset(None);

        self.active_type = DelayType::None;
        let stop = std::mem::take(&mut self.stop_after);
        let reset_wrapped = stop && std::mem::take(&mut self.reset_duration_after);
        if !stop {
            self.reset_duration_after = false;
        }
        tracing::trace!(?ty, stop, reset_wrapped, "delay finished");

        DelayTick::Finished {
            stop,
            reset_wrapped,
        }
    }

    /// Cancel any running delay and restart the durations in use
    pub fn reset(&mut self) {
        self.active_type = DelayType::None;
        self.stop_after = false;
        self.reset_duration_after = false;
        self.for_each_in_use(|d| {
            d.reset(None);
        });
    }

    pub fn resume(&mut self) {
        self.for_each_in_use(|d| d.resume());
    }

    fn for_each_in_use(&mut self, mut f: impl FnMut(&mut Duration)) {
        if self.same_delay {
            f(&mut self.single);
        } else {
            f(&mut self.halfway_duration);
            f(&mut self.end_forwards_duration);
            f(&mut self.end_backwards_duration);
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable delay parameters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    pub same_delay: bool,
    pub halfway: bool,
    pub end_forwards: bool,
    pub end_backwards: bool,
    pub single: DurationConfig,
    pub halfway_duration: DurationConfig,
    pub end_forwards_duration: DurationConfig,
    pub end_backwards_duration: DurationConfig,
}

impl DelayConfig {
    /// Validate every duration, including the unused ones
    pub fn validate(&self) -> Result<()> {
        self.single.validate()?;
        self.halfway_duration.validate()?;
        self.end_forwards_duration.validate()?;
        self.end_backwards_duration.validate()
    }
}
