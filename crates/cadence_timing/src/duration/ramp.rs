//! Ramped duration
//!
//! One cycle is `time_up` seconds ramping `minimum → maximum`, `hold` seconds
//! pinned at `maximum`, then `time_down` seconds ramping back. The first half
//! covers the up ramp and the hold, the second half the down ramp. With no up
//! ramp and no hold the first half is only the instant the cycle starts.
//!
//! `current` is the cycle length; the ramped value itself is
//! [`RampDuration::ramp_value`].

use super::{CloneFlags, DurationConfig, DurationCycle};
use crate::easing::Easing;

#[derive(Clone, Debug, PartialEq)]
pub struct RampDuration {
    minimum: f32,
    maximum: f32,
    over: f32,
    hold: f32,
    ramp_up: bool,
    ramp_down: bool,
    easing: Easing,

    elapsed: f32,
    /// Compression applied when a reset was capped below the natural cycle
    scale: f32,
    finished: bool,
}

impl RampDuration {
    pub fn new(minimum: f32, maximum: f32, over: f32) -> Self {
        Self {
            minimum,
            maximum,
            over: over.max(0.0),
            hold: 0.0,
            ramp_up: true,
            ramp_down: true,
            easing: Easing::Linear,
            elapsed: 0.0,
            scale: 1.0,
            finished: false,
        }
    }

    /// Seconds to stay at `maximum` between the ramps
    pub fn with_hold(mut self, hold: f32) -> Self {
        self.hold = hold.max(0.0);
        self
    }

    /// Disabled directions snap instead of animating
    pub fn with_ramps(mut self, up: bool, down: bool) -> Self {
        self.ramp_up = up;
        self.ramp_down = down;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn minimum(&self) -> f32 {
        self.minimum
    }

    pub fn maximum(&self) -> f32 {
        self.maximum
    }

    pub fn over(&self) -> f32 {
        self.over
    }

    pub fn hold(&self) -> f32 {
        self.hold
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn set_ramp_up(&mut self, enabled: bool) {
        self.ramp_up = enabled;
    }

    pub fn set_ramp_down(&mut self, enabled: bool) {
        self.ramp_down = enabled;
    }

    /// Length of the up ramp, 0 when ramping up is disabled
    pub fn time_up(&self) -> f32 {
        if self.ramp_up {
            self.over
        } else {
            0.0
        }
    }

    /// Length of the down ramp, 0 when ramping down is disabled
    pub fn time_down(&self) -> f32 {
        if self.ramp_down {
            self.over
        } else {
            0.0
        }
    }

    fn natural_length(&self) -> f32 {
        self.time_up() + self.hold + self.time_down()
    }

    /// Elapsed time mapped back onto the uncompressed cycle
    fn local_time(&self) -> f32 {
        if self.scale <= 0.0 {
            return self.natural_length();
        }
        self.elapsed / self.scale
    }

    /// Current eased value between `minimum` and `maximum`
    pub fn ramp_value(&self) -> f32 {
        let t = self.local_time();
        let up = self.time_up();
        let top = up + self.hold;

        if t < up {
            self.easing.interpolate(self.minimum, self.maximum, t / up)
        } else if t < top {
            self.maximum
        } else if self.time_down() > 0.0 {
            let down = ((t - top) / self.time_down()).min(1.0);
            self.easing.interpolate(self.maximum, self.minimum, down)
        } else {
            self.minimum
        }
    }

    pub fn to_config(&self) -> DurationConfig {
        DurationConfig::Ramp {
            minimum: self.minimum,
            maximum: self.maximum,
            over: self.over,
            hold: self.hold,
            ramp_up: self.ramp_up,
            ramp_down: self.ramp_down,
            easing: self.easing,
        }
    }

    pub fn clone_with(&self, flags: CloneFlags) -> Self {
        let mut copy = self.clone();
        if !flags.contains(CloneFlags::KEEP_STATE) {
            copy.elapsed = 0.0;
            copy.scale = 1.0;
            copy.finished = false;
        }
        copy
    }
}

impl DurationCycle for RampDuration {
    fn tick(&mut self, dt: f32) {
        if self.finished {
            return;
        }
        self.elapsed += dt.max(0.0);
        let current = self.current();
        if self.elapsed >= current {
            self.elapsed = current;
            self.finished = true;
        }
    }

    fn reset(&mut self, max_total: Option<f32>) -> f32 {
        let natural = self.natural_length();
        self.scale = match max_total {
            Some(max) if natural > 0.0 && max < natural => max.max(0.0) / natural,
            _ => 1.0,
        };
        self.elapsed = 0.0;
        self.finished = false;
        self.current()
    }

    fn current(&self) -> f32 {
        self.natural_length() * self.scale
    }

    fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn in_first_half(&self) -> bool {
        let t = self.local_time();
        // A zero-length first half still owns the start of the cycle
        t < self.time_up() + self.hold || (t <= 0.0 && !self.finished)
    }

    fn first_half_progress(&self) -> f32 {
        let up = self.time_up();
        if up <= 0.0 {
            return 1.0;
        }
        (self.local_time() / up).min(1.0)
    }

    fn second_half_progress(&self) -> f32 {
        if self.in_first_half() {
            return 0.0;
        }
        let down = self.time_down();
        if down <= 0.0 {
            return 1.0;
        }
        ((self.local_time() - self.time_up() - self.hold) / down).clamp(0.0, 1.0)
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn half_remaining(&self) -> f32 {
        let top = self.time_up() + self.hold;
        ((top - self.local_time()) * self.scale).max(0.0)
    }
}
