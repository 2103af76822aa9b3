//! Step sequences
//!
//! Steps live in a slot map. Two index lists sit on top of it:
//!
//! - `slots`: insertion order. A step's position here is the real index the
//!   overlapper works with; removal shifts later steps down by one.
//! - `order`: the traversal order, edited by insert and move.

use crate::config::{ProgressionMode, SequenceConfig};
use crate::error::{ConfigError, Result};
use crate::step::Step;
use cadence_overlap::{OverlapItems, Overlapper};
use cadence_timing::{PcgSource, RandomSource};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct StepId;
}

pub struct Sequence {
    steps: SlotMap<StepId, Step>,
    slots: Vec<StepId>,
    order: Vec<StepId>,

    mode: ProgressionMode,
    overlap_time: f32,
    randomize_order: bool,
    seed: Option<u64>,

    overlapper: Overlapper,
    source: Box<dyn RandomSource>,
}

impl Sequence {
    pub fn new(mode: ProgressionMode) -> Self {
        Self::with_source(mode, PcgSource::from_entropy().boxed())
    }

    /// Sequence whose order shuffling draws from `source`
    pub fn with_source(mode: ProgressionMode, source: Box<dyn RandomSource>) -> Self {
        Self {
            steps: SlotMap::with_key(),
            slots: Vec::new(),
            order: Vec::new(),
            mode,
            overlap_time: 0.0,
            randomize_order: false,
            seed: None,
            overlapper: Overlapper::new(),
            source,
        }
    }

    /// Build every step from a validated document
    pub fn from_config(config: &SequenceConfig) -> Result<Self> {
        config.validate()?;

        let mut sequence = Self::with_source(config.mode, PcgSource::from_seed(config.seed).boxed());
        sequence.overlap_time = config.overlap_time;
        sequence.randomize_order = config.randomize_order;
        sequence.seed = config.seed;

        for step_config in &config.steps {
            let step = Step::from_config(step_config, sequence.source.as_mut())?;
            sequence.add_step(step);
        }
        tracing::debug!(
            steps = sequence.len(),
            mode = ?sequence.mode,
            "sequence loaded"
        );
        Ok(sequence)
    }

    pub fn to_config(&self) -> SequenceConfig {
        SequenceConfig {
            mode: self.mode,
            overlap_time: self.overlap_time,
            randomize_order: self.randomize_order,
            seed: self.seed,
            steps: self.steps().map(|(_, step)| step.to_config()).collect(),
        }
    }

    // ========== Settings ==========

    pub fn mode(&self) -> ProgressionMode {
        self.mode
    }

    /// Switch scheduling mode; every step starts over
    pub fn set_mode(&mut self, mode: ProgressionMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.reset();
    }

    pub fn overlap_time(&self) -> f32 {
        self.overlap_time
    }

    pub fn set_overlap_time(&mut self, seconds: f32) -> Result<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ConfigError::OverlapTime(seconds));
        }
        self.overlap_time = seconds;
        Ok(())
    }

    pub fn randomize_order(&self) -> bool {
        self.randomize_order
    }

    /// Takes effect from the next traversal cycle
    pub fn set_randomize_order(&mut self, randomize: bool) {
        if randomize == self.randomize_order {
            return;
        }
        self.randomize_order = randomize;
        self.next_order_changed();
    }

    // ========== Steps ==========

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: StepId) -> Option<&Step> {
        self.steps.get(id)
    }

    pub fn get_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.get_mut(id)
    }

    /// Step ids in traversal order
    pub fn step_ids(&self) -> &[StepId] {
        &self.order
    }

    /// Steps in traversal order
    pub fn steps(&self) -> impl Iterator<Item = (StepId, &Step)> {
        self.order
            .iter()
            .filter_map(|&id| self.steps.get(id).map(|step| (id, step)))
    }

    pub fn position(&self, id: StepId) -> Option<usize> {
        self.order.iter().position(|&s| s == id)
    }

    pub fn add_step(&mut self, step: Step) -> StepId {
        self.insert_step(self.order.len(), step)
    }

    /// Insert at traversal position `at`
    pub fn insert_step(&mut self, at: usize, mut step: Step) -> StepId {
        let at = at.min(self.order.len());
        step.set_bounded(self.mode == ProgressionMode::Ordered);
        let id = self.steps.insert(step);
        self.slots.push(id);
        self.order.insert(at, id);
        self.overlapper.item_inserted(at);
        id
    }

    pub fn remove_step(&mut self, id: StepId) -> Option<Step> {
        let real = self.slots.iter().position(|&s| s == id)?;
        self.slots.remove(real);
        self.order.retain(|&s| s != id);
        self.overlapper.item_deleted(real);
        self.steps.remove(id)
    }

    /// Move a step to traversal position `to`; takes effect from the next cycle
    pub fn move_step(&mut self, id: StepId, to: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        self.order.remove(from);
        self.order.insert(to.min(self.order.len()), id);
        self.next_order_changed();
        true
    }

    fn next_order_changed(&mut self) {
        if self.mode != ProgressionMode::Ordered {
            return;
        }
        let mut items = StepItems {
            steps: &mut self.steps,
            slots: &self.slots,
            order: &self.order,
            overlap_time: self.overlap_time,
            randomize: self.randomize_order,
            source: self.source.as_mut(),
        };
        self.overlapper.next_order_changed(&mut items);
    }

    fn real_index(&self, id: StepId) -> Option<usize> {
        self.slots.iter().position(|&s| s == id)
    }

    // ========== Frame driving ==========

    pub fn tick(&mut self, dt: f32) {
        match self.mode {
            ProgressionMode::Ordered => {
                let mut items = StepItems {
                    steps: &mut self.steps,
                    slots: &self.slots,
                    order: &self.order,
                    overlap_time: self.overlap_time,
                    randomize: self.randomize_order,
                    source: self.source.as_mut(),
                };
                self.overlapper.tick(&mut items, dt);
            }
            ProgressionMode::Concurrent => {
                for &id in &self.order {
                    let Some(step) = self.steps.get_mut(id) else {
                        continue;
                    };
                    if !step.enabled() {
                        step.tick(dt, true, true);
                    } else if !step.tick(dt, true, false) {
                        step.reset();
                        step.resume();
                    }
                }
            }
        }
    }

    /// Jump straight to `id`, rebuilding the traversal
    pub fn force_run(&mut self, id: StepId) -> bool {
        let Some(real) = self.real_index(id) else {
            tracing::error!(?id, "cannot force run an unknown step");
            return false;
        };
        match self.mode {
            ProgressionMode::Ordered => {
                if let Some(step) = self.steps.get_mut(id) {
                    step.restart();
                }
                let mut items = StepItems {
                    steps: &mut self.steps,
                    slots: &self.slots,
                    order: &self.order,
                    overlap_time: self.overlap_time,
                    randomize: self.randomize_order,
                    source: self.source.as_mut(),
                };
                self.overlapper.force_run(&mut items, real)
            }
            ProgressionMode::Concurrent => match self.steps.get_mut(id) {
                Some(step) => {
                    step.restart();
                    step.resume();
                    true
                }
                None => false,
            },
        }
    }

    /// Restart every step and forget the traversal
    pub fn reset(&mut self) {
        self.overlapper.items_changed();
        let bounded = self.mode == ProgressionMode::Ordered;
        for step in self.steps.values_mut() {
            step.set_bounded(bounded);
            step.restart();
        }
    }

    // ========== Queries ==========

    /// Step currently driving the primary value (ordered mode)
    pub fn active_step(&self) -> Option<StepId> {
        self.overlapper
            .active_index()
            .and_then(|real| self.slots.get(real).copied())
    }

    /// Step running in the crossfade window (ordered mode)
    pub fn overlap_step(&self) -> Option<StepId> {
        self.overlapper
            .overlap_index()
            .and_then(|real| self.slots.get(real).copied())
    }

    pub fn is_running(&self, id: StepId) -> bool {
        match self.mode {
            ProgressionMode::Ordered => self
                .real_index(id)
                .is_some_and(|real| self.overlapper.is_running(real)),
            ProgressionMode::Concurrent => self.steps.get(id).is_some_and(Step::enabled),
        }
    }

    /// Whether the current traversal pass has reached `id`
    pub fn is_processed(&self, id: StepId) -> bool {
        match self.mode {
            ProgressionMode::Ordered => self
                .real_index(id)
                .is_some_and(|real| self.overlapper.is_active(real)),
            ProgressionMode::Concurrent => self.steps.get(id).is_some_and(Step::enabled),
        }
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("mode", &self.mode)
            .field("steps", &self.order.len())
            .field("overlap_time", &self.overlap_time)
            .field("overlapper", &self.overlapper)
            .finish_non_exhaustive()
    }
}

/// Steps seen through overlapper real indices
struct StepItems<'a> {
    steps: &'a mut SlotMap<StepId, Step>,
    slots: &'a [StepId],
    order: &'a [StepId],
    overlap_time: f32,
    randomize: bool,
    source: &'a mut dyn RandomSource,
}

impl StepItems<'_> {
    fn step(&self, real: usize) -> Option<&Step> {
        self.slots.get(real).and_then(|&id| self.steps.get(id))
    }

    fn step_mut(&mut self, real: usize) -> Option<&mut Step> {
        let id = *self.slots.get(real)?;
        self.steps.get_mut(id)
    }
}

impl OverlapItems for StepItems<'_> {
    fn item_count(&self) -> usize {
        self.slots.len()
    }

    fn can_run(&self, index: usize) -> bool {
        self.step(index).is_some_and(Step::enabled)
    }

    fn can_run_backwards(&self, index: usize) -> bool {
        self.step(index).is_some_and(Step::half_move)
    }

    fn resume(&mut self, index: usize) {
        if let Some(step) = self.step_mut(index) {
            tracing::trace!(step = %step.name(), "step resumed");
            step.resume();
        }
    }

    fn reset(&mut self, index: usize) {
        if let Some(step) = self.step_mut(index) {
            step.reset();
        }
    }

    fn tick(&mut self, index: usize, dt: f32, forwards: bool, paused: bool) -> bool {
        match self.step_mut(index) {
            Some(step) => step.tick(dt, forwards, paused),
            None => false,
        }
    }

    fn time_remaining(&self, index: usize) -> f32 {
        self.step(index).map(Step::time_remaining).unwrap_or(0.0)
    }

    fn regenerate(&mut self, _old: &[usize]) -> Vec<usize> {
        let mut order: Vec<usize> = self
            .order
            .iter()
            .filter_map(|id| self.slots.iter().position(|s| s == id))
            .collect();
        if self.randomize {
            self.source.shuffle(&mut order);
        }
        order
    }

    fn overlap_time(&self) -> f32 {
        self.overlap_time
    }
}
