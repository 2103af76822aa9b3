//! Cadence Overlapper
//!
//! A scheduler that walks N abstract items in a ping-pong order, keeping one
//! item active and optionally starting a second, overlapping item while the
//! active one is about to finish.
//!
//! # Features
//!
//! - **Ping-pong traversal**: forwards through an order list, backwards, then
//!   forwards through the next (possibly reshuffled) order list
//! - **Overlap windows**: the next item starts once the active item's remaining
//!   time drops below the configured overlap time
//! - **Stable under edits**: inserted and deleted items keep the traversal position
//! - **Bounded**: scans terminate even when no item can run
//!
//! Items are plain indices. All item behaviour goes through [`OverlapItems`],
//! so the same scheduler drives whole steps or the sub-items of one modifier.

mod cursor;
mod items;
mod overlapper;

pub use cursor::Cursor;
pub use items::OverlapItems;
pub use overlapper::Overlapper;
