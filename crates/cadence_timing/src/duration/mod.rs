//! Durations
//!
//! A duration is one resettable cycle of `current` seconds. The cycle is split
//! into two halves that each produce a monotonic progress ramp; a consumer
//! interpolating `minimum → maximum` over the first half and back over the
//! second half gets a ping-pong.
//!
//! [`Duration`] is a closed set of variants. Callers that need variant-specific
//! behaviour match on [`Duration::kind`] or the enum itself instead of probing
//! concrete types.

mod ramp;
mod random;

pub use ramp::RampDuration;
pub use random::{Cutoff, RandomDuration};

use crate::easing::Easing;
use crate::error::{check_finite, check_time, Result};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Query and control surface shared by every duration variant
pub trait DurationCycle {
    /// Advance elapsed time. A finished cycle does not advance.
    fn tick(&mut self, dt: f32);

    /// Start a new cycle, optionally capped at `max_total` seconds.
    ///
    /// Returns the new `current`.
    fn reset(&mut self, max_total: Option<f32>) -> f32;

    /// Pause/unpause bookkeeping hook
    fn resume(&mut self) {}

    /// Length of the current cycle in seconds
    fn current(&self) -> f32;

    /// Seconds elapsed in the current cycle
    fn elapsed(&self) -> f32;

    fn in_first_half(&self) -> bool;

    /// Progress through the first half, 1 once the second half starts
    fn first_half_progress(&self) -> f32;

    /// Progress through the second half, 0 while in the first half
    fn second_half_progress(&self) -> f32;

    fn finished(&self) -> bool;

    /// Seconds until the half crossing, 0 once in the second half
    fn half_remaining(&self) -> f32;

    fn time_remaining(&self) -> f32 {
        (self.current() - self.elapsed()).max(0.0)
    }

    /// Progress through the whole cycle
    fn total_progress(&self) -> f32 {
        let current = self.current();
        if current <= 0.0 {
            return 1.0;
        }
        (self.elapsed() / current).clamp(0.0, 1.0)
    }

    /// Progress through whichever half is running
    fn half_progress(&self) -> f32 {
        if self.in_first_half() {
            self.first_half_progress()
        } else {
            self.second_half_progress()
        }
    }
}

/// Variant tag for dispatching callers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DurationKind {
    Random,
    Ramp,
}

/// Options for [`Duration::clone_with`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CloneFlags(u8);

impl CloneFlags {
    /// Configuration only, the copy starts a fresh cycle
    pub const NONE: Self = Self(0);
    /// Also copy elapsed time and the current draw
    pub const KEEP_STATE: Self = Self(1);
    /// Give the copy a new entropy-seeded random source instead of a replay
    pub const RESEED: Self = Self(1 << 1);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CloneFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A duration of any variant
#[derive(Debug)]
pub enum Duration {
    Random(RandomDuration),
    Ramp(RampDuration),
}

impl Duration {
    pub fn kind(&self) -> DurationKind {
        match self {
            Duration::Random(_) => DurationKind::Random,
            Duration::Ramp(_) => DurationKind::Ramp,
        }
    }

    fn cycle(&self) -> &dyn DurationCycle {
        match self {
            Duration::Random(d) => d,
            Duration::Ramp(d) => d,
        }
    }

    fn cycle_mut(&mut self) -> &mut dyn DurationCycle {
        match self {
            Duration::Random(d) => d,
            Duration::Ramp(d) => d,
        }
    }

    /// Build from configuration, spawning a random source from `source`
    pub fn from_config(config: &DurationConfig, source: &mut dyn RandomSource) -> Result<Self> {
        config.validate()?;
        Ok(match *config {
            DurationConfig::Random {
                initial,
                range,
                interval,
                cutoff,
                cutoff_step,
            } => Duration::Random(
                RandomDuration::with_source(initial, range, source.spawn())
                    .with_interval(interval)
                    .with_cutoff(cutoff, cutoff_step),
            ),
            DurationConfig::Ramp {
                minimum,
                maximum,
                over,
                hold,
                ramp_up,
                ramp_down,
                easing,
            } => Duration::Ramp(
                RampDuration::new(minimum, maximum, over)
                    .with_hold(hold)
                    .with_ramps(ramp_up, ramp_down)
                    .with_easing(easing),
            ),
        })
    }

    pub fn to_config(&self) -> DurationConfig {
        match self {
            Duration::Random(d) => d.to_config(),
            Duration::Ramp(d) => d.to_config(),
        }
    }

    /// Independent copy; see [`CloneFlags`]
    pub fn clone_with(&self, flags: CloneFlags) -> Self {
        match self {
            Duration::Random(d) => Duration::Random(d.clone_with(flags)),
            Duration::Ramp(d) => Duration::Ramp(d.clone_with(flags)),
        }
    }

    pub fn as_random(&self) -> Option<&RandomDuration> {
        match self {
            Duration::Random(d) => Some(d),
            Duration::Ramp(_) => None,
        }
    }

    pub fn as_ramp(&self) -> Option<&RampDuration> {
        match self {
            Duration::Ramp(d) => Some(d),
            Duration::Random(_) => None,
        }
    }
}

impl DurationCycle for Duration {
    fn tick(&mut self, dt: f32) {
        self.cycle_mut().tick(dt);
    }

    fn reset(&mut self, max_total: Option<f32>) -> f32 {
        self.cycle_mut().reset(max_total)
    }

    fn resume(&mut self) {
        self.cycle_mut().resume();
    }

    fn current(&self) -> f32 {
        self.cycle().current()
    }

    fn elapsed(&self) -> f32 {
        self.cycle().elapsed()
    }

    fn in_first_half(&self) -> bool {
        self.cycle().in_first_half()
    }

    fn first_half_progress(&self) -> f32 {
        self.cycle().first_half_progress()
    }

    fn second_half_progress(&self) -> f32 {
        self.cycle().second_half_progress()
    }

    fn finished(&self) -> bool {
        self.cycle().finished()
    }

    fn half_remaining(&self) -> f32 {
        self.cycle().half_remaining()
    }
}

impl Clone for Duration {
    fn clone(&self) -> Self {
        self.clone_with(CloneFlags::KEEP_STATE)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Duration::Random(RandomDuration::new(1.0, 0.0))
    }
}

/// Serializable duration parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DurationConfig {
    Random {
        initial: f32,
        #[serde(default)]
        range: f32,
        #[serde(default)]
        interval: f32,
        #[serde(default)]
        cutoff: Cutoff,
        #[serde(default = "default_cutoff_step")]
        cutoff_step: f32,
    },
    Ramp {
        minimum: f32,
        maximum: f32,
        over: f32,
        #[serde(default)]
        hold: f32,
        #[serde(default = "default_true")]
        ramp_up: bool,
        #[serde(default = "default_true")]
        ramp_down: bool,
        #[serde(default)]
        easing: Easing,
    },
}

fn default_cutoff_step() -> f32 {
    random::DEFAULT_CUTOFF_STEP
}

fn default_true() -> bool {
    true
}

impl DurationConfig {
    /// Fixed-length random duration with no spread
    pub fn fixed(seconds: f32) -> Self {
        DurationConfig::Random {
            initial: seconds,
            range: 0.0,
            interval: 0.0,
            cutoff: Cutoff::Exact,
            cutoff_step: default_cutoff_step(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            DurationConfig::Random {
                initial,
                range,
                interval,
                cutoff_step,
                ..
            } => {
                check_time("initial", initial)?;
                check_time("range", range)?;
                check_time("interval", interval)?;
                check_time("cutoff_step", cutoff_step)
            }
            DurationConfig::Ramp {
                minimum,
                maximum,
                over,
                hold,
                ..
            } => {
                check_finite("minimum", minimum)?;
                check_finite("maximum", maximum)?;
                check_time("over", over)?;
                check_time("hold", hold)
            }
        }
    }
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self::fixed(1.0)
    }
}
