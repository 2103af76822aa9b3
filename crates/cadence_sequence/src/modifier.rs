//! Modifiers
//!
//! A modifier is one animated value. It ping-pongs between `minimum` and
//! `maximum`: the first half of a cycle eases up, the second half eases back.

use crate::config::ModifierConfig;
use crate::sync::{ModifierSync, SyncSample};
use cadence_timing::{Easing, RandomSource, Result as TimingResult};

#[derive(Clone, Debug)]
pub struct Modifier {
    name: String,
    enabled: bool,
    minimum: f32,
    maximum: f32,
    easing: Easing,
    sync: ModifierSync,

    value: f32,
    /// Whether the sync let the modifier move on the last frame
    advanced: bool,
}

impl Modifier {
    pub fn new(name: impl Into<String>, minimum: f32, maximum: f32) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            minimum,
            maximum,
            easing: Easing::Linear,
            sync: ModifierSync::Duration,
            value: minimum,
            advanced: false,
        }
    }

    pub fn from_config(config: &ModifierConfig, source: &mut dyn RandomSource) -> TimingResult<Self> {
        Ok(Self {
            enabled: config.enabled,
            easing: config.easing,
            sync: ModifierSync::from_config(&config.sync, source)?,
            ..Self::new(config.name.clone(), config.minimum, config.maximum)
        })
    }

    pub fn to_config(&self) -> ModifierConfig {
        ModifierConfig {
            name: self.name.clone(),
            enabled: self.enabled,
            minimum: self.minimum,
            maximum: self.maximum,
            easing: self.easing,
            sync: self.sync.to_config(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_sync(mut self, sync: ModifierSync) -> Self {
        self.sync = sync;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn minimum(&self) -> f32 {
        self.minimum
    }

    pub fn maximum(&self) -> f32 {
        self.maximum
    }

    pub fn set_range(&mut self, minimum: f32, maximum: f32) {
        self.minimum = minimum;
        self.maximum = maximum;
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    pub fn sync(&self) -> &ModifierSync {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut ModifierSync {
        &mut self.sync
    }

    /// Replace the sync strategy. The old strategy and its state are dropped.
    pub fn set_sync(&mut self, sync: ModifierSync) {
        tracing::debug!(
            modifier = %self.name,
            from = self.sync.name(),
            to = sync.name(),
            "sync replaced"
        );
        self.sync = sync;
        self.advanced = false;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn advanced(&self) -> bool {
        self.advanced
    }

    /// Value for a sample, without storing it
    pub fn value_at(&self, sample: SyncSample) -> f32 {
        if sample.first_half {
            self.easing
                .interpolate(self.minimum, self.maximum, sample.progress)
        } else {
            self.easing
                .interpolate(self.maximum, self.minimum, sample.progress)
        }
    }

    pub(crate) fn set_advanced(&mut self, advanced: bool) {
        self.advanced = advanced;
    }

    pub(crate) fn apply(&mut self, sample: SyncSample) {
        self.value = self.value_at(sample);
    }

    pub fn reset(&mut self) {
        self.sync.reset();
        self.advanced = false;
    }

    pub fn resume(&mut self) {
        self.sync.resume();
    }
}
