//! Sequence configuration documents
//!
//! Only configuration is ever persisted. Traversal cursors, order lists and
//! elapsed times are rebuilt when a [`Sequence`](crate::Sequence) is built
//! from a document.

use crate::error::{ConfigError, Result};
use cadence_timing::{DelayConfig, DurationConfig, Easing};
use serde::{Deserialize, Serialize};

/// How a sequence schedules its steps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionMode {
    /// One active step at a time, ping-ponging through the step order
    #[default]
    Ordered,
    /// Every enabled step runs at once and loops on its own
    Concurrent,
}

/// Top-level sequence document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(default)]
    pub mode: ProgressionMode,
    /// Crossfade window between consecutive steps, in seconds
    #[serde(default)]
    pub overlap_time: f32,
    /// Shuffle the step order for every traversal cycle
    #[serde(default)]
    pub randomize_order: bool,
    /// Seed for every random draw in the sequence; entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// One step of a sequence
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Run the first half on forward passes and the second half on the next run
    #[serde(default)]
    pub half_move: bool,
    #[serde(default)]
    pub duration: DurationConfig,
    #[serde(default)]
    pub delay: DelayConfig,
    #[serde(default)]
    pub modifiers: Vec<ModifierConfig>,
}

/// One animated value driven by a step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub minimum: f32,
    #[serde(default = "default_maximum")]
    pub maximum: f32,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Sync strategy selection
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncConfig {
    /// Follow the step's own progress and direction
    #[default]
    Duration,
    /// Follow the step's progress through its whole duration
    StepProgress,
    /// Run an independent duration and delay
    Unsynced {
        #[serde(default)]
        duration: DurationConfig,
        #[serde(default)]
        delay: DelayConfig,
    },
    /// Mirror another modifier of the same step, by position
    OtherModifier {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
}

fn default_true() -> bool {
    true
}

fn default_maximum() -> f32 {
    1.0
}

impl StepConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            half_move: false,
            duration: DurationConfig::default(),
            delay: DelayConfig::default(),
            modifiers: Vec::new(),
        }
    }

    /// Check durations, delays and modifier links
    pub fn validate(&self) -> Result<()> {
        let timing = |source| ConfigError::Timing {
            step: self.name.clone(),
            source,
        };
        self.duration.validate().map_err(timing)?;
        self.delay.validate().map_err(timing)?;

        let len = self.modifiers.len();
        for (position, modifier) in self.modifiers.iter().enumerate() {
            match &modifier.sync {
                SyncConfig::Unsynced { duration, delay } => {
                    duration.validate().map_err(timing)?;
                    delay.validate().map_err(timing)?;
                }
                SyncConfig::OtherModifier { index: Some(index) } if *index == position => {
                    return Err(ConfigError::SelfLink {
                        step: self.name.clone(),
                        modifier: position,
                    });
                }
                SyncConfig::OtherModifier { index: Some(index) } if *index >= len => {
                    return Err(ConfigError::LinkOutOfRange {
                        step: self.name.clone(),
                        modifier: position,
                        index: *index,
                        len,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl ModifierConfig {
    pub fn new(name: impl Into<String>, minimum: f32, maximum: f32) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            minimum,
            maximum,
            easing: Easing::default(),
            sync: SyncConfig::default(),
        }
    }

    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }
}

impl SequenceConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.overlap_time.is_finite() || self.overlap_time < 0.0 {
            return Err(ConfigError::OverlapTime(self.overlap_time));
        }
        self.steps.iter().try_for_each(StepConfig::validate)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
