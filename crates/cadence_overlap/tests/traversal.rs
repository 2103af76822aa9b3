use cadence_overlap::{OverlapItems, Overlapper};

/// Items that each run for a fixed number of seconds
struct Timed {
    length: Vec<f32>,
    left: Vec<f32>,
    enabled: Vec<bool>,
    half_move: Vec<bool>,
    overlap: f32,
    resumed: Vec<usize>,
    directions: Vec<(usize, bool)>,
    rotate_orders: bool,
    broken_orders: bool,
}

impl Timed {
    fn new(lengths: &[f32]) -> Self {
        Self {
            length: lengths.to_vec(),
            left: lengths.to_vec(),
            enabled: vec![true; lengths.len()],
            half_move: vec![false; lengths.len()],
            overlap: 0.0,
            resumed: Vec::new(),
            directions: Vec::new(),
            rotate_orders: false,
            broken_orders: false,
        }
    }

    fn with_overlap(mut self, overlap: f32) -> Self {
        self.overlap = overlap;
        self
    }
}

impl OverlapItems for Timed {
    fn item_count(&self) -> usize {
        self.length.len()
    }

    fn can_run(&self, index: usize) -> bool {
        self.enabled[index]
    }

    fn can_run_backwards(&self, index: usize) -> bool {
        self.half_move[index]
    }

    fn resume(&mut self, index: usize) {
        self.resumed.push(index);
    }

    fn reset(&mut self, index: usize) {
        self.left[index] = self.length[index];
    }

    fn tick(&mut self, index: usize, dt: f32, forwards: bool, paused: bool) -> bool {
        if paused {
            return true;
        }
        self.directions.push((index, forwards));
        self.left[index] -= dt;
        self.left[index] > 1e-4
    }

    fn time_remaining(&self, index: usize) -> f32 {
        self.left[index].max(0.0)
    }

    fn regenerate(&mut self, old: &[usize]) -> Vec<usize> {
        let count = self.item_count();
        if self.broken_orders {
            return vec![0; count];
        }
        if self.rotate_orders && !old.is_empty() {
            let mut next = old.to_vec();
            next.rotate_left(1);
            return next;
        }
        (0..count).collect()
    }

    fn overlap_time(&self) -> f32 {
        self.overlap
    }
}

fn run(overlapper: &mut Overlapper, items: &mut Timed, frames: usize, dt: f32) {
    for _ in 0..frames {
        overlapper.tick(items, dt);
    }
}

#[test]
fn three_items_ping_pong_without_overlap() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[0.1, 0.1, 0.1]);
    // An item finishing hands over within the same frame
    run(&mut overlapper, &mut items, 8, 0.1);

    assert_eq!(items.resumed, vec![0, 1, 2, 1, 0, 1, 2, 1, 0]);
    assert!(overlapper.overlap_cursor().is_none());
}

#[test]
fn every_pass_visits_each_item_once() {
    let n = 5;
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&vec![0.1; n]);
    run(&mut overlapper, &mut items, 40, 0.1);

    // Forward passes start at 0, backward passes end at 0
    let mut passes: Vec<Vec<usize>> = vec![vec![items.resumed[0]]];
    let mut rising = true;
    for pair in items.resumed.windows(2) {
        let now_rising = pair[1] > pair[0];
        if now_rising != rising {
            passes.push(Vec::new());
            rising = now_rising;
        }
        passes.last_mut().unwrap().push(pair[1]);
    }

    for pass in &passes[..passes.len() - 1] {
        let mut sorted = pass.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), pass.len(), "duplicate in pass {:?}", pass);
    }
    // First pass covers everything
    assert_eq!(passes[0], (0..n).collect::<Vec<_>>());
}

#[test]
fn active_direction_follows_pass() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[0.1, 0.1, 0.1]);
    run(&mut overlapper, &mut items, 5, 0.1);

    assert_eq!(
        items.directions,
        vec![(0, true), (1, true), (2, true), (1, false), (0, false)]
    );
}

#[test]
fn disabled_items_never_become_active() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[0.1, 0.1, 0.1, 0.1]);
    items.enabled[2] = false;
    run(&mut overlapper, &mut items, 30, 0.1);

    assert!(!items.resumed.contains(&2));
    assert!(items.resumed.contains(&3));
}

#[test]
fn fully_disabled_set_terminates() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[0.1; 6]);
    items.enabled = vec![false; 6];
    run(&mut overlapper, &mut items, 3, 0.1);

    assert!(overlapper.active_cursor().is_none());
    assert!(items.resumed.is_empty());

    // Re-enabling one item is picked up on the next frame
    items.enabled[4] = true;
    overlapper.tick(&mut items, 0.1);
    assert_eq!(overlapper.active_index(), Some(4));
}

#[test]
fn overlap_starts_inside_window_only() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[1.0, 1.0, 1.0]).with_overlap(0.3);

    let mut started = None;
    for frame in 0..30 {
        let before = overlapper.overlap_index();
        overlapper.tick(&mut items, 0.1);

        if let (Some(active), Some(overlap)) =
            (overlapper.active_index(), overlapper.overlap_index())
        {
            assert_ne!(active, overlap, "overlap resolved to active on frame {}", frame);
            if before.is_none() && started.is_none() {
                assert!(items.time_remaining(active) < 0.3);
                started = Some((frame, active, overlap));
            }
        }
    }

    let (frame, active, overlap) = started.expect("overlap never started");
    assert_eq!((active, overlap), (0, 1));
    assert!(frame >= 6 && frame <= 8, "started on frame {}", frame);
}

#[test]
fn zero_overlap_time_never_overlaps() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[0.5, 0.5, 0.5]);
    for _ in 0..40 {
        overlapper.tick(&mut items, 0.1);
        assert!(overlapper.overlap_cursor().is_none());
    }
}

#[test]
fn overlap_is_promoted_when_active_finishes() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[1.0, 1.0, 1.0]).with_overlap(0.3);
    run(&mut overlapper, &mut items, 9, 0.1);
    assert_eq!(overlapper.overlap_index(), Some(1));

    run(&mut overlapper, &mut items, 2, 0.1);
    assert_eq!(overlapper.active_index(), Some(1));
    assert!(overlapper.overlap_cursor().is_none());
    // Item 1 kept running through the promotion
    assert!(items.left[1] < 0.9);
    assert_eq!(items.resumed.iter().filter(|&&i| i == 1).count(), 1);
}

#[test]
fn finished_overlap_moves_on() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[3.0, 0.3, 1.0]).with_overlap(1.0);
    run(&mut overlapper, &mut items, 25, 0.1);

    // Item 1 finished inside the window, item 2 took over the overlap
    assert_eq!(overlapper.active_index(), Some(0));
    assert_eq!(overlapper.overlap_index(), Some(2));
}

#[test]
fn half_move_active_holds_overlap() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[3.0, 0.3, 1.0]).with_overlap(1.0);
    items.half_move[0] = true;
    run(&mut overlapper, &mut items, 25, 0.1);

    assert_eq!(overlapper.active_index(), Some(0));
    assert_eq!(overlapper.overlap_index(), None);
    assert!(overlapper.overlap_cursor().unwrap().must_wait);
}

#[test]
fn overlap_looks_ahead_into_next_cycle() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[1.0, 1.0]).with_overlap(0.3);
    items.rotate_orders = true;

    for _ in 0..60 {
        overlapper.tick(&mut items, 0.1);
        if let (Some(active), Some(overlap)) =
            (overlapper.active_index(), overlapper.overlap_index())
        {
            assert_ne!(active, overlap);
        }
    }

    // 0 forwards, 1 forwards, 0 backwards, then 1 opens the rotated cycle
    assert!(items.resumed.len() >= 5);
    assert_eq!(&items.resumed[..4], &[0, 1, 0, 1]);
}

#[test]
fn invalid_regenerated_order_falls_back_to_identity() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[0.1, 0.1, 0.1]);
    items.broken_orders = true;
    overlapper.tick(&mut items, 0.1);

    assert_eq!(overlapper.order1(), &[0, 1, 2]);
    assert_eq!(overlapper.order2(), &[0, 1, 2]);
}

#[test]
fn deleting_other_item_keeps_logical_position() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[0.1, 0.1, 5.0, 0.1]);
    run(&mut overlapper, &mut items, 3, 0.1);
    assert_eq!(overlapper.active_index(), Some(2));

    overlapper.item_deleted(3);
    items.length.remove(3);
    items.left.remove(3);
    items.enabled.remove(3);
    items.half_move.remove(3);
    assert_eq!(overlapper.active_index(), Some(2));
    assert_eq!(overlapper.order1(), &[0, 1, 2]);

    overlapper.item_deleted(0);
    items.length.remove(0);
    items.left.remove(0);
    items.enabled.remove(0);
    items.half_move.remove(0);
    assert_eq!(overlapper.active_index(), Some(1));
    assert_eq!(overlapper.active_cursor().unwrap().order_index, 1);

    // Tracked edits do not trigger a rebuild
    overlapper.tick(&mut items, 0.1);
    assert_eq!(overlapper.active_index(), Some(1));
}

#[test]
fn processed_items_stay_processed_on_the_way_back() {
    let mut overlapper = Overlapper::new();
    let mut items = Timed::new(&[0.1, 0.1, 0.1]);
    run(&mut overlapper, &mut items, 3, 0.1);

    let cursor = overlapper.active_cursor().unwrap();
    assert!(!cursor.forwards);
    assert_eq!(cursor.order_index, 1);

    assert!(overlapper.is_active(0));
    assert!(overlapper.is_active(1));
    assert!(!overlapper.is_active(2));
}
