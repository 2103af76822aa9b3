//! Item interface consumed by the overlapper

/// Items driven by an [`Overlapper`](crate::Overlapper).
///
/// Indices are real item indices in `0..item_count()`. The overlapper never
/// calls these with an index it could not resolve.
pub trait OverlapItems {
    fn item_count(&self) -> usize;

    /// Whether the item may be selected and keep running
    fn can_run(&self, index: usize) -> bool;

    /// Whether the item can keep running while the traversal turns around
    /// (a half-move item). An overlap waits instead of racing such an item.
    fn can_run_backwards(&self, index: usize) -> bool;

    /// The item was selected as active or overlap
    fn resume(&mut self, index: usize);

    /// The item finished its run
    fn reset(&mut self, index: usize);

    /// Advance the item. Returns `false` once the item has finished.
    ///
    /// Items that are not scheduled are ticked with `paused = true`.
    fn tick(&mut self, index: usize, dt: f32, forwards: bool, paused: bool) -> bool;

    /// Seconds left in the item's current run
    fn time_remaining(&self, index: usize) -> f32;

    /// Order for the next traversal cycle. `old` is the order that precedes it,
    /// empty when building the first cycle.
    fn regenerate(&mut self, old: &[usize]) -> Vec<usize> {
        let _ = old;
        (0..self.item_count()).collect()
    }

    /// Crossfade window in seconds; 0 disables overlapping
    fn overlap_time(&self) -> f32;
}
