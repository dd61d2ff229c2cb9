// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::Weight;

/// Map from a vertex to the vertex it was reached from, kept by every search wave.
pub type Parents<V> = HashMap<V, V>;

/// Represents an outgoing (or, in backward searches, incoming) connection to `target`.
///
/// `weight` must not be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge<V, W> {
    pub target: V,
    pub weight: W,
}

impl<V, W> Edge<V, W> {
    pub const fn new(target: V, weight: W) -> Self {
        Self { target, weight }
    }
}

/// Vertex being expanded by a search wave, together with the wave's state.
///
/// `real_distance` is the un-reduced distance from the wave's origin and doubles
/// as a simulated clock for time-dependent edges. `parents` is the parent map
/// of the expanding wave, lent for the duration of a single edge enumeration.
#[derive(Debug, Clone, Copy)]
pub struct VertexData<'p, V, W> {
    pub vertex: V,
    pub real_distance: W,
    pub parents: &'p Parents<V>,
}

impl<'p, V, W> VertexData<'p, V, W> {
    pub fn new(vertex: V, real_distance: W, parents: &'p Parents<V>) -> Self {
        Self {
            vertex,
            real_distance,
            parents,
        }
    }
}

/// Capabilities the search engine needs from a graph.
///
/// Methods take `&mut self`, as adapters are free to memoize geometry,
/// lazily load regions or build synthetic vertices during a search.
pub trait AStarGraph {
    type Vertex: Copy + Eq + Hash + Debug;
    type Weight: Weight;

    /// Estimates the cost of reaching `to` from `from`. Must be consistent,
    /// up to [AStarGraph::weight_epsilon], for searches to be exact.
    fn heuristic_cost_estimate(&mut self, from: &Self::Vertex, to: &Self::Vertex) -> Self::Weight;

    /// Appends all edges leaving `data.vertex` to `edges`.
    fn outgoing_edges(
        &mut self,
        data: &VertexData<'_, Self::Vertex, Self::Weight>,
        edges: &mut Vec<Edge<Self::Vertex, Self::Weight>>,
    );

    /// Appends all edges entering `data.vertex` to `edges`.
    /// Edge targets are the source vertices of those edges.
    fn ingoing_edges(
        &mut self,
        data: &VertexData<'_, Self::Vertex, Self::Weight>,
        edges: &mut Vec<Edge<Self::Vertex, Self::Weight>>,
    );

    fn weight_epsilon(&self) -> Self::Weight {
        Self::Weight::epsilon()
    }

    /// Checks whether joining the forward and the backward wave at `common`
    /// produces a valid path.
    fn are_waves_connectible(
        &mut self,
        _forward_parents: &Parents<Self::Vertex>,
        _common: &Self::Vertex,
        _backward_parents: &Parents<Self::Vertex>,
    ) -> bool {
        true
    }
}
