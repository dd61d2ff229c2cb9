// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::AStarGraph;

/// Shared cancellation flag. Clones observe the same flag, so a search running
/// on one thread can be cancelled from another.
#[derive(Debug, Clone, Default)]
pub struct Cancellable(Arc<AtomicBool>);

impl Cancellable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Callback receiving every vertex popped from a search queue and the current target.
/// Returning `false` stops the search.
pub type VisitorFn<'a, V> = Box<dyn FnMut(&V, &V) -> bool + 'a>;

/// Predicate on the real (un-reduced) distance of a candidate relaxation.
/// Returning `false` drops the edge.
pub type LengthCheckFn<'a, W> = Box<dyn Fn(W) -> bool + 'a>;

/// Parameters of a single search.
pub struct Params<'a, G: AStarGraph> {
    pub graph: &'a mut G,
    pub start: G::Vertex,
    pub finish: G::Vertex,
    pub cancellable: Cancellable,
    pub on_visited_vertex: Option<VisitorFn<'a, G::Vertex>>,
    pub check_length: Option<LengthCheckFn<'a, G::Weight>>,
}

impl<'a, G: AStarGraph> Params<'a, G> {
    pub fn new(graph: &'a mut G, start: G::Vertex, finish: G::Vertex) -> Self {
        Self {
            graph,
            start,
            finish,
            cancellable: Cancellable::default(),
            on_visited_vertex: None,
            check_length: None,
        }
    }

    pub fn with_cancellable(mut self, cancellable: Cancellable) -> Self {
        self.cancellable = cancellable;
        self
    }

    pub fn with_visitor(mut self, visitor: impl FnMut(&G::Vertex, &G::Vertex) -> bool + 'a) -> Self {
        self.on_visited_vertex = Some(Box::new(visitor));
        self
    }

    pub fn with_length_check(mut self, check: impl Fn(G::Weight) -> bool + 'a) -> Self {
        self.check_length = Some(Box::new(check));
        self
    }

    #[inline]
    pub(super) fn visit(&mut self, vertex: &G::Vertex, target: &G::Vertex) -> bool {
        match self.on_visited_vertex {
            Some(ref mut visitor) => visitor(vertex, target),
            None => true,
        }
    }

    #[inline]
    pub(super) fn length_ok(&self, real_distance: G::Weight) -> bool {
        match self.check_length {
            Some(ref check) => check(real_distance),
            None => true,
        }
    }
}

/// Successful result of a search: the vertices from start to finish and the total weight.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingResult<V, W> {
    pub path: Vec<V>,
    pub distance: W,
}
