//! Cadence Timing
//!
//! Frame-driven timing primitives for step and modifier animation.
//!
//! # Features
//!
//! - **Durations**: Resettable cycles split into two halves (random-ranged or ramped)
//! - **Delays**: Layered pauses injected halfway through or at either end of a cycle
//! - **Easing**: Curves shared by ramps and value interpolation
//! - **Injected randomness**: Every random draw goes through a [`RandomSource`]
//!
//! Everything advances purely from accumulated `dt`; nothing reads a wall clock.

pub mod delay;
pub mod duration;
pub mod easing;
pub mod error;
pub mod random;

pub use delay::{Delay, DelayConfig, DelayPhase, DelayTick, DelayType};
pub use duration::{
    CloneFlags, Cutoff, Duration, DurationConfig, DurationCycle, DurationKind, RampDuration,
    RandomDuration,
};
pub use easing::Easing;
pub use error::{Result, TimingError};
pub use random::{PcgSource, RandomSource};
