//! Overlapper
//!
//! Keeps two order lists: `order1` for the running traversal cycle and
//! `order2` for the next one. The active cursor always walks `order1`; an
//! overlap cursor may look ahead into `order2` when the crossfade spans the
//! cycle boundary, and swapping happens only once the overlap is promoted.

use crate::cursor::Cursor;
use crate::items::OverlapItems;
use smallvec::SmallVec;

#[derive(Debug, Default)]
pub struct Overlapper {
    order1: Vec<usize>,
    order2: Vec<usize>,
    active: Option<Cursor>,
    overlap: Option<Cursor>,
}

impl Overlapper {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Frame driving ==========

    /// Advance one frame.
    ///
    /// The active item ticks first, then a running overlap item, then every
    /// other item in paused mode in ascending order-list order.
    pub fn tick<I: OverlapItems + ?Sized>(&mut self, items: &mut I, dt: f32) {
        self.ensure_orders(items);
        if self.order1.is_empty() {
            return;
        }

        if self.active.is_none() {
            self.next_active(items);
        }

        // Snapshot: order1 may be swapped while ticking
        let order: SmallVec<[usize; 16]> = self.order1.iter().copied().collect();
        let mut ticked: SmallVec<[usize; 2]> = SmallVec::new();

        let active_real = self.active_index();
        let overlap_real = self.overlap_index();

        if let Some(real) = active_real {
            ticked.push(real);
            self.tick_active(items, real, dt);
        }

        match overlap_real {
            // Promoted while the previous active item finished
            Some(real) if self.overlap.is_none() && self.active_index() == Some(real) => {
                ticked.push(real);
                self.tick_active(items, real, dt);
            }
            _ => {
                if let Some(real) = self.overlap_index() {
                    if !ticked.contains(&real) {
                        ticked.push(real);
                        self.tick_overlap(items, real, dt);
                    }
                }
            }
        }

        // Items selected during this frame start running next frame
        for real in [self.active_index(), self.overlap_index()].into_iter().flatten() {
            if !ticked.contains(&real) {
                ticked.push(real);
            }
        }

        for real in order {
            if !ticked.contains(&real) {
                items.tick(real, dt, false, true);
            }
        }
    }

    fn tick_active<I: OverlapItems + ?Sized>(&mut self, items: &mut I, real: usize, dt: f32) {
        let Some(cursor) = self.active else {
            return;
        };

        let running = items.can_run(real) && items.tick(real, dt, cursor.forwards, false);
        if running {
            let overlap_time = items.overlap_time();
            if self.overlap.is_none()
                && overlap_time > 0.0
                && items.time_remaining(real) < overlap_time
            {
                self.next_overlap(items);
            }
        } else {
            tracing::trace!(item = real, "active item finished");
            items.reset(real);
            self.next_active(items);
        }
    }

    fn tick_overlap<I: OverlapItems + ?Sized>(&mut self, items: &mut I, real: usize, dt: f32) {
        let Some(cursor) = self.overlap else {
            return;
        };

        let running = items.can_run(real) && items.tick(real, dt, cursor.forwards, false);
        if !running {
            tracing::trace!(item = real, "overlap item finished");
            items.reset(real);
            self.next_overlap(items);
        }
    }

    // ========== Selection ==========

    /// Select the next active item, promoting a pending overlap if there is one.
    pub fn next_active<I: OverlapItems + ?Sized>(&mut self, items: &mut I) {
        if let Some(overlap) = self.overlap.take() {
            self.promote(items, overlap);
            return;
        }

        let len = self.order1.len();
        if len == 0 {
            self.active = None;
            return;
        }

        let (mut cursor, inclusive) = match self.active {
            Some(cursor) => (cursor, false),
            None => (Cursor::start(), true),
        };
        let from = self.active.and_then(|c| self.resolve(c));

        for step in 0..2 * len {
            let mut crossed = false;
            if !(inclusive && step == 0) && cursor.advance(len) {
                self.swap_orders(items);
                crossed = true;
            }

            let Some(real) = self.resolve(cursor) else {
                continue;
            };
            // The cycle boundary must not replay the item that ended the cycle
            if crossed && len > 1 && Some(real) == from {
                continue;
            }
            if items.can_run(real) {
                cursor.order1 = true;
                cursor.must_wait = false;
                self.active = Some(cursor);
                tracing::trace!(item = real, forwards = cursor.forwards, "active item selected");
                items.resume(real);
                return;
            }
        }

        tracing::debug!(items = len, "no runnable item");
        self.active = None;
    }

    fn promote<I: OverlapItems + ?Sized>(&mut self, items: &mut I, mut overlap: Cursor) {
        let was_waiting = overlap.must_wait;
        overlap.must_wait = false;
        if !overlap.order1 {
            self.swap_orders(items);
            overlap.order1 = true;
        }
        self.active = Some(overlap);

        if let Some(real) = self.resolve(overlap) {
            tracing::trace!(item = real, "overlap promoted to active");
            if was_waiting && items.can_run(real) {
                items.resume(real);
            }
        }
    }

    /// Select the next overlap item, or hold the overlap back.
    pub fn next_overlap<I: OverlapItems + ?Sized>(&mut self, items: &mut I) {
        let Some(active) = self.active else {
            return;
        };
        let Some(active_real) = self.resolve(active) else {
            return;
        };

        let mut cursor = match self.overlap {
            None => Cursor {
                must_wait: false,
                ..active
            },
            Some(existing) => {
                if items.can_run_backwards(active_real) {
                    self.overlap = Some(Cursor {
                        must_wait: true,
                        ..existing
                    });
                    return;
                }
                existing
            }
        };

        let len = self.order1.len();
        let from = self.resolve(cursor);

        for _ in 0..2 * len {
            let was_order1 = cursor.order1;
            let crossed = cursor.advance(len);
            if crossed {
                if !was_order1 {
                    // Looking past the next cycle is not supported
                    break;
                }
                cursor.order1 = false;
            }

            let Some(real) = self.resolve(cursor) else {
                continue;
            };
            if crossed && len > 1 && Some(real) == from {
                continue;
            }
            if real == active_real {
                cursor.must_wait = true;
                self.overlap = Some(cursor);
                tracing::trace!(item = real, "overlap waits for active item");
                return;
            }
            if items.can_run(real) {
                cursor.must_wait = false;
                self.overlap = Some(cursor);
                tracing::trace!(item = real, "overlap item selected");
                items.resume(real);
                return;
            }
        }

        cursor.must_wait = true;
        self.overlap = Some(cursor);
    }

    /// Jump to `real_index`: rebuild the orders and make it the active item.
    ///
    /// Returns `false` if the index is not part of the rebuilt order.
    pub fn force_run<I: OverlapItems + ?Sized>(&mut self, items: &mut I, real_index: usize) -> bool {
        self.items_changed();
        self.ensure_orders(items);

        let Some(position) = self.order1.iter().position(|&r| r == real_index) else {
            tracing::error!(
                index = real_index,
                len = self.order1.len(),
                "cannot force run an item missing from order1"
            );
            return false;
        };

        self.active = Some(Cursor {
            order_index: position,
            ..Cursor::start()
        });
        items.resume(real_index);
        true
    }

    // ========== Structural changes ==========

    /// A new item (real index `count - 1`) was added at order position `at`
    pub fn item_inserted(&mut self, at: usize) {
        if self.order1.is_empty() {
            return;
        }
        let real = self.order1.len();

        for is_order1 in [true, false] {
            let list = if is_order1 {
                &mut self.order1
            } else {
                &mut self.order2
            };
            let position = at.min(list.len());
            list.insert(position, real);

            for cursor in [self.active.as_mut(), self.overlap.as_mut()]
                .into_iter()
                .flatten()
            {
                if cursor.order1 == is_order1 && cursor.order_index >= position {
                    cursor.order_index += 1;
                }
            }
        }
    }

    /// The item with real index `real_index` was removed
    pub fn item_deleted(&mut self, real_index: usize) {
        if self.active_index() == Some(real_index) {
            self.items_changed();
            return;
        }
        if self.overlap.and_then(|c| self.resolve(c)) == Some(real_index) {
            self.overlap = None;
        }

        for is_order1 in [true, false] {
            let list = if is_order1 {
                &mut self.order1
            } else {
                &mut self.order2
            };
            if list.is_empty() {
                continue;
            }

            match list.iter().position(|&r| r == real_index) {
                Some(position) => {
                    list.remove(position);
                    for cursor in [self.active.as_mut(), self.overlap.as_mut()]
                        .into_iter()
                        .flatten()
                    {
                        if cursor.order1 == is_order1 && cursor.order_index > position {
                            cursor.order_index -= 1;
                        }
                    }
                }
                None => tracing::warn!(
                    order = if is_order1 { "order1" } else { "order2" },
                    index = real_index,
                    len = list.len(),
                    "deleted item missing from order list"
                ),
            }

            for r in list.iter_mut() {
                if *r > real_index {
                    *r -= 1;
                }
            }
        }
    }

    /// The item order changed; rebuild the next cycle's order list.
    ///
    /// Skipped while an overlap cursor already walks the next cycle.
    pub fn next_order_changed<I: OverlapItems + ?Sized>(&mut self, items: &mut I) {
        if self.order1.is_empty() || self.overlap.is_some_and(|c| !c.order1) {
            return;
        }
        self.order2 = Self::regenerate(items, &self.order1);
        tracing::trace!(order = ?self.order2, "next cycle reordered");
    }

    /// Forget all orders and cursors; the next tick rebuilds from scratch
    pub fn items_changed(&mut self) {
        self.order1.clear();
        self.order2.clear();
        self.active = None;
        self.overlap = None;
    }

    // ========== Queries ==========

    /// Whether the active item or a running overlap item is `real_index`
    pub fn is_running(&self, real_index: usize) -> bool {
        self.active_index() == Some(real_index) || self.overlap_index() == Some(real_index)
    }

    /// Whether `real_index` sits at or before the active position in this
    /// cycle's order, whichever way the cursor is moving
    pub fn is_active(&self, real_index: usize) -> bool {
        let Some(cursor) = self.active else {
            return false;
        };
        self.order1
            .iter()
            .position(|&r| r == real_index)
            .is_some_and(|position| position <= cursor.order_index)
    }

    /// Real index of the active item
    pub fn active_index(&self) -> Option<usize> {
        self.active.and_then(|c| self.resolve(c))
    }

    /// Real index of the overlap item while it runs (not while it waits)
    pub fn overlap_index(&self) -> Option<usize> {
        self.overlap
            .filter(|c| !c.must_wait)
            .and_then(|c| self.resolve(c))
    }

    pub fn active_cursor(&self) -> Option<Cursor> {
        self.active
    }

    pub fn overlap_cursor(&self) -> Option<Cursor> {
        self.overlap
    }

    pub fn order1(&self) -> &[usize] {
        &self.order1
    }

    pub fn order2(&self) -> &[usize] {
        &self.order2
    }

    // ========== Order lists ==========

    fn resolve(&self, cursor: Cursor) -> Option<usize> {
        let (name, list) = if cursor.order1 {
            ("order1", &self.order1)
        } else {
            ("order2", &self.order2)
        };
        match list.get(cursor.order_index) {
            Some(&real) => Some(real),
            None => {
                tracing::error!(
                    order = name,
                    index = cursor.order_index,
                    len = list.len(),
                    order1_len = self.order1.len(),
                    order2_len = self.order2.len(),
                    "cursor outside order list"
                );
                None
            }
        }
    }

    fn ensure_orders<I: OverlapItems + ?Sized>(&mut self, items: &mut I) {
        let count = items.item_count();
        let stale = |list: &Vec<usize>| !list.is_empty() && list.len() != count;
        if stale(&self.order1) || stale(&self.order2) {
            tracing::warn!(
                count,
                order1_len = self.order1.len(),
                order2_len = self.order2.len(),
                "item count changed outside insert/delete; rebuilding orders"
            );
            self.items_changed();
        }
        if count == 0 {
            return;
        }

        if self.order1.is_empty() {
            self.order1 = Self::regenerate(items, &[]);
        }
        if self.order2.is_empty() {
            self.order2 = Self::regenerate(items, &self.order1);
        }
    }

    fn swap_orders<I: OverlapItems + ?Sized>(&mut self, items: &mut I) {
        self.order1 = std::mem::take(&mut self.order2);
        self.order2 = Self::regenerate(items, &self.order1);
        tracing::trace!(order = ?self.order1, "traversal cycle started");
    }

    fn regenerate<I: OverlapItems + ?Sized>(items: &mut I, old: &[usize]) -> Vec<usize> {
        let count = items.item_count();
        let order = items.regenerate(old);
        if is_permutation(&order, count) {
            order
        } else {
            tracing::error!(
                count,
                len = order.len(),
                "regenerated order is not a permutation; using identity"
            );
            (0..count).collect()
        }
    }
}

fn is_permutation(order: &[usize], count: usize) -> bool {
    if order.len() != count {
        return false;
    }
    let mut seen = vec![false; count];
    for &real in order {
        match seen.get_mut(real) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Items that run for a fixed number of ticks
    #[derive(Default)]
    struct Counted {
        length: Vec<u32>,
        left: Vec<u32>,
        enabled: Vec<bool>,
        resumed: Vec<usize>,
        paused_ticks: Vec<usize>,
    }

    impl Counted {
        fn new(lengths: &[u32]) -> Self {
            Self {
                length: lengths.to_vec(),
                left: lengths.to_vec(),
                enabled: vec![true; lengths.len()],
                ..Default::default()
            }
        }
    }

    impl OverlapItems for Counted {
        fn item_count(&self) -> usize {
            self.length.len()
        }

        fn can_run(&self, index: usize) -> bool {
            self.enabled[index]
        }

        fn can_run_backwards(&self, _index: usize) -> bool {
            false
        }

        fn resume(&mut self, index: usize) {
            self.resumed.push(index);
        }

        fn reset(&mut self, index: usize) {
            self.left[index] = self.length[index];
        }

        fn tick(&mut self, index: usize, _dt: f32, _forwards: bool, paused: bool) -> bool {
            if paused {
                self.paused_ticks.push(index);
                return true;
            }
            self.left[index] = self.left[index].saturating_sub(1);
            self.left[index] > 0
        }

        fn time_remaining(&self, index: usize) -> f32 {
            self.left[index] as f32
        }

        fn overlap_time(&self) -> f32 {
            0.0
        }
    }

    #[test]
    fn test_empty_item_set() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[]);
        overlapper.tick(&mut items, 0.1);
        assert!(overlapper.active_cursor().is_none());
        assert!(overlapper.order1().is_empty());
    }

    #[test]
    fn test_first_tick_selects_first_item() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[3, 3]);
        overlapper.tick(&mut items, 0.1);
        assert_eq!(overlapper.active_index(), Some(0));
        assert_eq!(items.resumed, vec![0]);
        assert_eq!(items.left[0], 2);
        assert_eq!(items.paused_ticks, vec![1]);
    }

    #[test]
    fn test_disabled_items_are_skipped() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[1, 1, 1]);
        items.enabled[1] = false;
        for _ in 0..8 {
            overlapper.tick(&mut items, 0.1);
        }
        assert!(!items.resumed.contains(&1));
    }

    #[test]
    fn test_all_disabled_resolves_to_none() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[1, 1, 1]);
        items.enabled = vec![false; 3];
        overlapper.tick(&mut items, 0.1);
        assert!(overlapper.active_cursor().is_none());
        assert!(items.resumed.is_empty());
        assert_eq!(items.paused_ticks, vec![0, 1, 2]);
    }

    #[test]
    fn test_deleting_active_clears_orders() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[5, 5, 5]);
        overlapper.tick(&mut items, 0.1);
        overlapper.item_deleted(0);
        assert!(overlapper.order1().is_empty());
        assert!(overlapper.order2().is_empty());
        assert!(overlapper.active_cursor().is_none());
    }

    #[test]
    fn test_deleting_earlier_item_shifts_cursor() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[1, 5, 5]);
        overlapper.tick(&mut items, 0.1);
        assert_eq!(overlapper.active_index(), Some(1));
        assert_eq!(overlapper.active_cursor().unwrap().order_index, 1);

        overlapper.item_deleted(0);
        assert_eq!(overlapper.order1(), &[0, 1]);
        assert_eq!(overlapper.active_cursor().unwrap().order_index, 0);
        // Same logical item, renumbered
        assert_eq!(overlapper.active_index(), Some(0));
    }

    #[test]
    fn test_inserting_before_cursor_shifts_it() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[1, 5]);
        overlapper.tick(&mut items, 0.1);
        assert_eq!(overlapper.active_index(), Some(1));

        overlapper.item_inserted(0);
        assert_eq!(overlapper.order1(), &[2, 0, 1]);
        assert_eq!(overlapper.order2(), &[2, 0, 1]);
        assert_eq!(overlapper.active_index(), Some(1));
    }

    #[test]
    fn test_count_change_forces_rebuild() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[5, 5]);
        overlapper.tick(&mut items, 0.1);
        items = Counted::new(&[5, 5, 5]);
        overlapper.tick(&mut items, 0.1);
        assert_eq!(overlapper.order1(), &[0, 1, 2]);
        assert_eq!(overlapper.active_index(), Some(0));
    }

    #[test]
    fn test_force_run() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[5, 5, 5]);
        overlapper.tick(&mut items, 0.1);
        assert!(overlapper.force_run(&mut items, 2));
        assert_eq!(overlapper.active_index(), Some(2));
        assert!(overlapper.active_cursor().unwrap().forwards);
        assert_eq!(items.resumed.last(), Some(&2));
        assert!(!overlapper.force_run(&mut items, 9));
    }

    #[test]
    fn test_is_active_tracks_pass() {
        let mut overlapper = Overlapper::new();
        let mut items = Counted::new(&[1, 5, 5]);
        overlapper.tick(&mut items, 0.1);
        assert!(overlapper.is_active(0));
        assert!(overlapper.is_active(1));
        assert!(!overlapper.is_active(2));
        assert!(overlapper.is_running(1));
        assert!(!overlapper.is_running(0));
    }

    #[test]
    fn test_permutation_check() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 1], 3));
        assert!(!is_permutation(&[0, 1, 3], 3));
    }
}
