//! Segment tree over an arbitrary monoid.
//!
//! Supports point assignment, half-open range aggregation and binary search
//! over aggregates (`max_right` / `min_left`), all in `O(log n)`.

#[macro_use]
extern crate log;
extern crate thiserror;

mod error;
mod monoid;
mod segtree;

pub use crate::error::UsageError;
pub use crate::monoid::{Max, Min, Monoid, Sum, Xor};
pub use crate::segtree::{Levels, SegTree};
