//! Cadence Sequence
//!
//! Steps, modifiers and the strategies that keep modifiers in time with
//! their step.
//!
//! # Features
//!
//! - **Steps**: A duration plus delays, driving any number of modifiers
//! - **Modifier sync**: Follow the step, its overall progress, an independent
//!   duration, or another modifier
//! - **Sequences**: Ordered ping-pong traversal with crossfades, or every step at once
//! - **Documents**: Sequences load from and save to JSON or TOML
//!
//! ```ignore
//! let config = SequenceConfig::from_toml(&text)?;
//! let mut sequence = Sequence::from_config(&config)?;
//! loop {
//!     sequence.tick(dt);
//! }
//! ```

pub mod config;
pub mod error;
pub mod modifier;
pub mod progression;
pub mod sequence;
pub mod step;
pub mod sync;

pub use config::{ModifierConfig, ProgressionMode, SequenceConfig, StepConfig, SyncConfig};
pub use error::{ConfigError, Result};
pub use modifier::Modifier;
pub use progression::ItemProgression;
pub use sequence::{Sequence, StepId};
pub use step::Step;
pub use sync::{
    ModifierLink, ModifierSync, StepView, SyncContext, SyncSample, UnsyncedState, UnsyncedSync,
};
