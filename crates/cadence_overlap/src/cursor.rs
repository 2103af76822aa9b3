//! Traversal cursors

/// Position in one of the two order lists
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    /// Position inside the order list
    pub order_index: usize,
    /// Direction of the current pass
    pub forwards: bool,
    /// `true` for the current cycle's order, `false` for the next cycle's
    pub order1: bool,
    /// Selected but held back until the active item finishes
    pub must_wait: bool,
}

impl Cursor {
    /// First position of a fresh traversal
    pub fn start() -> Self {
        Self {
            order_index: 0,
            forwards: true,
            order1: true,
            must_wait: false,
        }
    }

    /// Move one position along the ping-pong over `len` positions.
    ///
    /// Returns `true` when the move leaves position 0 backwards, which ends the
    /// cycle: the cursor then sits at position 0 of the *next* order, forwards.
    pub(crate) fn advance(&mut self, len: usize) -> bool {
        if self.forwards {
            if self.order_index + 1 < len {
                self.order_index += 1;
            } else {
                self.forwards = false;
                self.order_index = self.order_index.saturating_sub(1);
            }
            false
        } else if self.order_index > 0 {
            self.order_index -= 1;
            false
        } else {
            self.forwards = true;
            self.order_index = 0;
            true
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}
