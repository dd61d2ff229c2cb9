// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;

use crate::astar::{AStarGraph, Edge, Parents, VertexData};
use crate::distance::LatLon;
use crate::estimator::Purpose;
use crate::fake_ending::FakeEnding;
use crate::fake_graph::{FakeGraph, FakeKind, FakeVertex};
use crate::index_graph::{Expansion, JointEdge};
use crate::joint::JointSegment;
use crate::joints_starter::SegmentGraph;
use crate::restrictions::Locator;
use crate::world_graph::WorldGraph;
use crate::{RegionId, RouteWeight, Segment, SegmentEdge, FAKE_REGION_ID};

/// Vertex standing for the requested start position.
pub const START_SEGMENT: Segment = Segment::fake(0);

/// Vertex standing for the requested finish position.
pub const FINISH_SEGMENT: Segment = Segment::fake(1);

const FIRST_FREE_FAKE_ID: u32 = 2;

fn real_of(fake: &FakeGraph, segment: &Segment) -> Option<Segment> {
    if segment.is_real() {
        Some(*segment)
    } else {
        fake.find_real(segment)
    }
}

/// [WorldGraph] extended with fake vertices connecting arbitrary start and finish
/// positions with the roads they were snapped to.
///
/// Both the start and the finish become a zero-length fake vertex ([START_SEGMENT]
/// and [FINISH_SEGMENT]). Every projection of an ending adds an off-road fake
/// vertex between the position and the road, followed (or preceded) by fake parts
/// of the real segment leading to its ends. Parts of real segments weigh the same
/// fraction of the real segment's weight as their length is of the real segment's length.
#[derive(Debug)]
pub struct IndexGraphStarter<'w> {
    graph: &'w mut WorldGraph,
    fake: FakeGraph,
    next_fake_id: u32,
    start_point: LatLon,
    finish_point: LatLon,
    start_regions: BTreeSet<RegionId>,
    finish_regions: BTreeSet<RegionId>,
    start_to_finish: RouteWeight,
    real_edges: Vec<SegmentEdge>,
}

impl<'w> IndexGraphStarter<'w> {
    pub fn new(graph: &'w mut WorldGraph, start: &FakeEnding, finish: &FakeEnding) -> Self {
        let start_to_finish = graph
            .estimator()
            .calc_heuristic(start.origin, finish.origin);
        let mut starter = Self {
            graph,
            fake: FakeGraph::new(),
            next_fake_id: FIRST_FREE_FAKE_ID,
            start_point: start.origin,
            finish_point: finish.origin,
            start_regions: start.regions(),
            finish_regions: finish.regions(),
            start_to_finish,
            real_edges: Vec::default(),
        };
        starter.add_ending(start, finish, true);
        starter.add_ending(finish, start, false);
        starter
    }

    fn new_fake_segment(&mut self) -> Segment {
        let segment = Segment::fake(self.next_fake_id);
        self.next_fake_id += 1;
        segment
    }

    fn fake_segment_for(&mut self, vertex: &FakeVertex) -> Segment {
        match self.fake.find_segment(vertex) {
            Some(segment) => segment,
            None => self.new_fake_segment(),
        }
    }

    fn add_ending(&mut self, this: &FakeEnding, other: &FakeEnding, is_start: bool) {
        let origin = if is_start { START_SEGMENT } else { FINISH_SEGMENT };
        let origin_region = this
            .projections
            .first()
            .map_or(FAKE_REGION_ID, |p| p.segment.region_id());
        self.fake.add_standalone_vertex(
            origin,
            FakeVertex {
                region: origin_region,
                from: this.origin,
                to: this.origin,
                kind: FakeKind::PureFake,
            },
        );

        let metric = self.graph.estimator().metric();
        for projection in &this.projections {
            let region = projection.segment.region_id();
            let (from, to) = if is_start {
                (this.origin, projection.junction)
            } else {
                (projection.junction, this.origin)
            };
            let off_road = self.new_fake_segment();
            self.fake.add_vertex(
                origin,
                off_road,
                FakeVertex {
                    region,
                    from,
                    to,
                    kind: FakeKind::PureFake,
                },
                is_start,
            );

            // Stop at the other ending if it lies on the same segment
            let mut front = projection.segment_front;
            let mut back = projection.segment_back;
            let same_segment = other.projections.iter().filter(|o| {
                o.segment == projection.segment || o.segment == projection.segment.reversed()
            });
            for other_projection in same_segment {
                let to_this = metric(projection.segment_back, projection.junction);
                let to_other = metric(projection.segment_back, other_projection.junction);
                if to_this < to_other {
                    front = other_projection.junction;
                } else if to_other < to_this {
                    back = other_projection.junction;
                } else {
                    front = other_projection.junction;
                    back = other_projection.junction;
                }
            }

            let forward = FakeVertex {
                region,
                from: if is_start { projection.junction } else { back },
                to: if is_start { front } else { projection.junction },
                kind: FakeKind::PartOfReal(projection.segment),
            };
            let forward_segment = self.fake_segment_for(&forward);
            self.fake
                .add_vertex(off_road, forward_segment, forward, is_start);

            if !projection.one_way {
                let backward = FakeVertex {
                    region,
                    from: if is_start { projection.junction } else { front },
                    to: if is_start { back } else { projection.junction },
                    kind: FakeKind::PartOfReal(projection.segment.reversed()),
                };
                let backward_segment = self.fake_segment_for(&backward);
                self.fake
                    .add_vertex(off_road, backward_segment, backward, is_start);
            }
        }
    }

    pub fn graph(&mut self) -> &mut WorldGraph {
        &mut *self.graph
    }

    pub fn start_point(&self) -> LatLon {
        self.start_point
    }

    pub fn finish_point(&self) -> LatLon {
        self.finish_point
    }

    pub fn start_regions(&self) -> &BTreeSet<RegionId> {
        &self.start_regions
    }

    pub fn finish_regions(&self) -> &BTreeSet<RegionId> {
        &self.finish_regions
    }

    /// Regions the start or the finish were snapped in.
    pub fn regions(&self) -> BTreeSet<RegionId> {
        self.start_regions
            .union(&self.finish_regions)
            .copied()
            .collect()
    }

    pub fn fake_graph(&self) -> &FakeGraph {
        &self.fake
    }

    /// Real segment a segment stands for: itself if real, the segment
    /// a fake one is part of, or `None` for off-road fakes.
    pub fn convert_to_real(&self, segment: &Segment) -> Option<Segment> {
        real_of(&self.fake, segment)
    }

    /// Checks whether a route of the given weight is short enough to be considered,
    /// relative to the straight-line estimate between the start and the finish.
    pub fn check_length(&self, weight: RouteWeight) -> bool {
        weight <= self.length_limit()
    }

    /// Maximum weight accepted by [IndexGraphStarter::check_length].
    pub fn length_limit(&self) -> RouteWeight {
        let profile = self.graph.estimator().profile();
        RouteWeight::new(
            (self.start_to_finish.seconds() * profile.length_limit_factor)
                .max(profile.min_length_limit),
        )
    }

    pub fn point(&mut self, segment: &Segment, front: bool) -> LatLon {
        if segment.is_real() {
            self.graph.point(segment, front)
        } else {
            self.fake.vertex(segment).point(front)
        }
    }

    pub fn segment_weight(&mut self, segment: &Segment) -> RouteWeight {
        if segment.is_real() {
            return self.graph.segment_weight(segment);
        }

        let vertex = *self.fake.vertex(segment);
        match vertex.kind {
            FakeKind::PureFake => self.graph.estimator().calc_offroad(vertex.from, vertex.to),
            FakeKind::PartOfReal(real) => {
                let metric = self.graph.estimator().metric();
                let full = metric(self.graph.point(&real, false), self.graph.point(&real, true));
                if full <= 0.0 {
                    return RouteWeight::ZERO;
                }
                let part = metric(vertex.from, vertex.to);
                RouteWeight::new(self.graph.segment_weight(&real).seconds() * part / full)
            }
        }
    }

    pub fn is_joint(&mut self, segment: &Segment, front: bool) -> bool {
        segment.is_real() && self.graph.is_joint(segment, front)
    }

    /// Appends edges leaving (or entering) `segment` to `edges`.
    pub fn get_edge_list(
        &mut self,
        segment: &Segment,
        real_distance: RouteWeight,
        is_outgoing: bool,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        // Parts sharing the real segment's head (or tail) continue like it
        let continued = if segment.is_real() {
            Some(*segment)
        } else {
            let vertex = *self.fake.vertex(segment);
            vertex
                .real()
                .filter(|real| self.graph.point(real, is_outgoing) == vertex.point(is_outgoing))
        };

        if let Some(real) = continued {
            let first = edges.len();
            let fake = &self.fake;
            let lookup = |s: &Segment| real_of(fake, s);
            let at = Expansion::new(segment, real_distance, is_outgoing, parents)
                .with_locator(Locator::new(&lookup));
            self.graph.get_edge_list(&at, &real, edges);

            if !segment.is_real() && !is_outgoing {
                let real_weight = self.graph.segment_weight(&real);
                let part_weight = self.segment_weight(segment);
                for edge in &mut edges[first..] {
                    edge.weight = (edge.weight - real_weight + part_weight).max(RouteWeight::ZERO);
                }
            }
        }

        if !segment.is_real() {
            let neighbors: Vec<Segment> = self.fake.edges(segment, is_outgoing).collect();
            for neighbor in neighbors {
                let entered = if is_outgoing { &neighbor } else { segment };
                let weight = self.segment_weight(entered);
                edges.push(Edge::new(neighbor, weight));
            }
        }

        self.add_fake_edges(segment, is_outgoing, edges);
    }

    /// Adds fake parts of real edge targets which connect with `segment` directly.
    fn add_fake_edges(&mut self, segment: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>) {
        let here = self.point(segment, is_outgoing);
        self.real_edges.clear();
        self.real_edges
            .extend(edges.iter().filter(|e| e.target.is_real()));

        for i in 0..self.real_edges.len() {
            let edge = self.real_edges[i];
            let parts: Vec<Segment> = self.fake.fakes_of_real(&edge.target).collect();
            if parts.is_empty() {
                continue;
            }

            for part in parts {
                let vertex = *self.fake.vertex(&part);
                if is_outgoing && vertex.from == here {
                    let penalty = edge.weight - self.graph.segment_weight(&edge.target);
                    let weight = (penalty + self.segment_weight(&part)).max(RouteWeight::ZERO);
                    edges.push(Edge::new(part, weight));
                } else if !is_outgoing && vertex.to == here {
                    edges.push(Edge::new(part, edge.weight));
                }
            }
        }
    }

    /// Weight of moving from `from` onto `to` along a found path: the weight of `to`
    /// plus the maneuver penalties of `purpose`. [Purpose::Eta] leaves out
    /// penalties which don't take time.
    pub fn step_weight(
        &mut self,
        purpose: Purpose,
        from: &Segment,
        to: &Segment,
        real_distance: RouteWeight,
    ) -> RouteWeight {
        let from = self.convert_to_real(from);
        let real_to = self.convert_to_real(to);
        if let (Some(from), Some(real_to)) = (from, real_to) {
            if from.region_id() != real_to.region_id() {
                return match purpose {
                    Purpose::Weight => self.graph.border_penalty(from.region_id(), real_to.region_id()),
                    Purpose::Eta => RouteWeight::ZERO,
                };
            }
            if let Some(graph) = self.graph.region_graph(from.region_id()) {
                let ctx = *self.graph.context();
                let penalty = graph.calc_edge_weight(&ctx, purpose, true, &from, &real_to, real_distance)
                    - graph.calc_segment_weight(&real_to);
                return (penalty + self.segment_weight(to)).max(RouteWeight::ZERO);
            }
        }
        self.segment_weight(to)
    }
}

impl AStarGraph for IndexGraphStarter<'_> {
    type Vertex = Segment;
    type Weight = RouteWeight;

    fn heuristic_cost_estimate(&mut self, from: &Segment, to: &Segment) -> RouteWeight {
        let from = self.point(from, true);
        let to = self.point(to, true);
        self.graph.estimator().calc_heuristic(from, to)
    }

    fn outgoing_edges(
        &mut self,
        data: &VertexData<'_, Segment, RouteWeight>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        self.get_edge_list(&data.vertex, data.real_distance, true, data.parents, edges);
    }

    fn ingoing_edges(
        &mut self,
        data: &VertexData<'_, Segment, RouteWeight>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        self.get_edge_list(&data.vertex, data.real_distance, false, data.parents, edges);
    }

    fn are_waves_connectible(
        &mut self,
        forward_parents: &Parents<Segment>,
        common: &Segment,
        backward_parents: &Parents<Segment>,
    ) -> bool {
        let fake = &self.fake;
        let lookup = |s: &Segment| real_of(fake, s);
        self.graph.are_waves_connectible(
            forward_parents,
            common,
            backward_parents,
            Locator::new(&lookup),
        )
    }
}

impl SegmentGraph for IndexGraphStarter<'_> {
    fn point(&mut self, segment: &Segment, front: bool) -> LatLon {
        IndexGraphStarter::point(self, segment, front)
    }

    fn segment_weight(&mut self, segment: &Segment) -> RouteWeight {
        IndexGraphStarter::segment_weight(self, segment)
    }

    fn is_joint(&mut self, segment: &Segment, front: bool) -> bool {
        IndexGraphStarter::is_joint(self, segment, front)
    }

    fn convert_to_real(&self, segment: &Segment) -> Option<Segment> {
        IndexGraphStarter::convert_to_real(self, segment)
    }

    fn segment_edges(&mut self, segment: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>) {
        self.get_edge_list(segment, RouteWeight::ZERO, is_outgoing, &Parents::default(), edges);
    }

    fn joint_edges(
        &mut self,
        at: &Expansion<'_, JointSegment>,
        segment: &Segment,
        edges: &mut Vec<JointEdge>,
    ) {
        self.graph.joint_edges(at, segment, edges);
    }

    fn heuristic(&mut self, from: LatLon, to: LatLon) -> RouteWeight {
        self.graph.estimator().calc_heuristic(from, to)
    }

    fn are_waves_connectible(
        &mut self,
        forward_parents: &Parents<JointSegment>,
        common: &JointSegment,
        backward_parents: &Parents<JointSegment>,
        locator: Locator<'_, JointSegment>,
    ) -> bool {
        self.graph
            .are_waves_connectible(forward_parents, common, backward_parents, locator)
    }
}
