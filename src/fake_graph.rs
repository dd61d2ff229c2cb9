// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeSet, HashMap};

use crate::distance::LatLon;
use crate::{RegionId, Segment};

/// What a [FakeVertex] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeKind {
    /// Off-road movement, e.g. from the requested start position to the road.
    PureFake,

    /// Part of the given real segment, in the same direction.
    PartOfReal(Segment),
}

/// Synthetic segment between two arbitrary positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeVertex {
    pub region: RegionId,
    pub from: LatLon,
    pub to: LatLon,
    pub kind: FakeKind,
}

impl FakeVertex {
    /// Head (`front == true`) or tail of the vertex.
    pub fn point(&self, front: bool) -> LatLon {
        if front {
            self.to
        } else {
            self.from
        }
    }

    pub fn real(&self) -> Option<Segment> {
        match self.kind {
            FakeKind::PureFake => None,
            FakeKind::PartOfReal(s) => Some(s),
        }
    }
}

/// Directed graph of fake segments, created around the start and finish of a route
/// and connected with the road graph through the real segments they are parts of.
#[derive(Debug, Default, Clone)]
pub struct FakeGraph {
    vertices: HashMap<Segment, FakeVertex>,
    outgoing: HashMap<Segment, BTreeSet<Segment>>,
    ingoing: HashMap<Segment, BTreeSet<Segment>>,
    real_to_fake: HashMap<Segment, BTreeSet<Segment>>,
}

impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Adds a vertex without any edges.
    pub fn add_standalone_vertex(&mut self, segment: Segment, vertex: FakeVertex) {
        assert!(!segment.is_real(), "fake vertex can't use real segment {}", segment);
        if let Some(real) = vertex.real() {
            self.real_to_fake.entry(real).or_default().insert(segment);
        }
        self.vertices.insert(segment, vertex);
    }

    /// Adds `new` (unless it already exists) and connects it with `existing`:
    /// `existing -> new` if `is_outgoing`, `new -> existing` otherwise.
    pub fn add_vertex(
        &mut self,
        existing: Segment,
        new: Segment,
        vertex: FakeVertex,
        is_outgoing: bool,
    ) {
        if !self.vertices.contains_key(&new) {
            self.add_standalone_vertex(new, vertex);
        }

        if is_outgoing {
            self.add_connection(existing, new);
        } else {
            self.add_connection(new, existing);
        }
    }

    pub fn add_connection(&mut self, from: Segment, to: Segment) {
        self.outgoing.entry(from).or_default().insert(to);
        self.ingoing.entry(to).or_default().insert(from);
    }

    /// Finds an already added vertex equal to `vertex`.
    pub fn find_segment(&self, vertex: &FakeVertex) -> Option<Segment> {
        self.vertices
            .iter()
            .filter(|(_, v)| *v == vertex)
            .map(|(&s, _)| s)
            .min()
    }

    /// Panics if `segment` isn't a vertex of this graph.
    pub fn vertex(&self, segment: &Segment) -> &FakeVertex {
        self.vertices
            .get(segment)
            .unwrap_or_else(|| panic!("unknown fake segment {}", segment))
    }

    pub fn contains(&self, segment: &Segment) -> bool {
        self.vertices.contains_key(segment)
    }

    /// Fake segments following (`is_outgoing`) or preceding `segment`.
    pub fn edges(&self, segment: &Segment, is_outgoing: bool) -> impl Iterator<Item = Segment> + '_ {
        let table = if is_outgoing { &self.outgoing } else { &self.ingoing };
        table.get(segment).into_iter().flatten().copied()
    }

    /// Real segment the fake segment is a part of.
    pub fn find_real(&self, segment: &Segment) -> Option<Segment> {
        self.vertices.get(segment).and_then(FakeVertex::real)
    }

    /// Fake segments which are parts of `real`.
    pub fn fakes_of_real(&self, real: &Segment) -> impl Iterator<Item = Segment> + '_ {
        self.real_to_fake.get(real).into_iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seg, xy};

    fn pure(from: LatLon, to: LatLon) -> FakeVertex {
        FakeVertex {
            region: 0,
            from,
            to,
            kind: FakeKind::PureFake,
        }
    }

    #[test]
    fn connections_are_directed() {
        let (a, b, c) = (Segment::fake(0), Segment::fake(2), Segment::fake(3));
        let mut g = FakeGraph::new();
        g.add_standalone_vertex(a, pure(xy(0.0, 0.0), xy(0.0, 0.0)));
        g.add_vertex(a, b, pure(xy(0.0, 0.0), xy(1.0, 0.0)), true);
        g.add_vertex(a, c, pure(xy(2.0, 0.0), xy(0.0, 0.0)), false);

        assert_eq!(g.edges(&a, true).collect::<Vec<_>>(), vec![b]);
        assert_eq!(g.edges(&a, false).collect::<Vec<_>>(), vec![c]);
        assert_eq!(g.edges(&b, false).collect::<Vec<_>>(), vec![a]);
        assert_eq!(g.edges(&c, true).collect::<Vec<_>>(), vec![a]);
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn parts_of_real_segments() {
        let real = seg(3, 1, true);
        let part = FakeVertex {
            region: 0,
            from: xy(1.5, 0.0),
            to: xy(2.0, 0.0),
            kind: FakeKind::PartOfReal(real),
        };

        let mut g = FakeGraph::new();
        g.add_standalone_vertex(Segment::fake(4), part);

        assert_eq!(g.find_real(&Segment::fake(4)), Some(real));
        assert_eq!(g.fakes_of_real(&real).collect::<Vec<_>>(), vec![Segment::fake(4)]);
        assert_eq!(g.find_segment(&part), Some(Segment::fake(4)));
        assert_eq!(g.find_segment(&pure(xy(1.5, 0.0), xy(2.0, 0.0))), None);
    }

    #[test]
    #[should_panic(expected = "unknown fake segment")]
    fn unknown_vertex() {
        FakeGraph::new().vertex(&Segment::fake(7));
    }
}
