// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fmt::Debug;
use std::hash::Hash;

use super::Parents;
use crate::Weight;

#[derive(Debug, Clone, Copy)]
pub(super) struct QueueItem<V, W> {
    pub vertex: V,
    pub distance: W,
}

impl<V, W: Ord> PartialEq for QueueItem<V, W> {
    fn eq(&self, other: &Self) -> bool {
        self.distance.eq(&other.distance)
    }
}

impl<V, W: Ord> Eq for QueueItem<V, W> {}

impl<V, W: Ord> PartialOrd for QueueItem<V, W> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<V, W: Ord> Ord for QueueItem<V, W> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison,
        // as lower distances are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other.distance.cmp(&self.distance)
    }
}

/// Walks the parent map back from `last`, returning the path in the forward order.
///
/// Panics if the walk does not reach `origin`.
pub(super) fn reconstruct_path<V: Copy + Eq + Hash + Debug>(
    parents: &Parents<V>,
    origin: V,
    mut last: V,
) -> Vec<V> {
    let mut path = vec![last];

    while last != origin {
        last = *parents
            .get(&last)
            .unwrap_or_else(|| panic!("missing parent of {:?} during path reconstruction", last));
        path.push(last);
    }

    path.reverse();
    path
}

/// Clamps a reduced edge weight to zero, logging a warning if it is negative
/// by more than `epsilon` (heuristic inconsistency).
#[inline]
pub(super) fn clamp_reduced<V: Debug, W: Weight>(from: &V, to: &V, reduced: W, epsilon: W) -> W {
    if reduced < -epsilon {
        log::warn!(
            "negative reduced weight {:?} on edge {:?} -> {:?}, heuristic is inconsistent",
            reduced,
            from,
            to,
        );
    }

    if reduced < W::zero() {
        W::zero()
    } else {
        reduced
    }
}
