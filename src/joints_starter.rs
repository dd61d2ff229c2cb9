// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::astar::{AStarGraph, Edge, Parents, VertexData};
use crate::distance::LatLon;
use crate::index_graph::{Expansion, JointEdge};
use crate::joint::JointSegment;
use crate::restrictions::{Locator, RestrictionVertex};
use crate::{RouteWeight, Segment, SegmentEdge};

/// Graph of [Segments](Segment) which can be searched over [JointSegments](JointSegment)
/// by [IndexGraphStarterJoints].
pub trait SegmentGraph {
    fn point(&mut self, segment: &Segment, front: bool) -> LatLon;

    fn segment_weight(&mut self, segment: &Segment) -> RouteWeight;

    /// Checks whether the head (`front == true`) or the tail of a real segment
    /// is a joint or a road end.
    fn is_joint(&mut self, segment: &Segment, front: bool) -> bool;

    /// Real segment a segment stands for, if any.
    fn convert_to_real(&self, segment: &Segment) -> Option<Segment>;

    /// Appends edges leaving (or entering) `segment` to `edges`,
    /// ignoring sequence restrictions.
    fn segment_edges(&mut self, segment: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>);

    /// Appends edges of the compressed graph leaving (or entering) the real `segment`,
    /// which is the last (or first) segment of the expanded vertex.
    fn joint_edges(
        &mut self,
        at: &Expansion<'_, JointSegment>,
        segment: &Segment,
        edges: &mut Vec<JointEdge>,
    );

    fn heuristic(&mut self, from: LatLon, to: LatLon) -> RouteWeight;

    fn are_waves_connectible(
        &mut self,
        forward_parents: &Parents<JointSegment>,
        common: &JointSegment,
        backward_parents: &Parents<JointSegment>,
        locator: Locator<'_, JointSegment>,
    ) -> bool;
}

const START_JOINT_ID: u32 = u32::MAX - 2;
const FINISH_JOINT_ID: u32 = u32::MAX - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FakeJointKind {
    /// Zero-weight vertex standing for the start or the finish segment itself.
    Invisible,

    /// Path from the start to the first joint.
    FromStart,

    /// Path from the last joint to the finish.
    ToFinish,

    /// Path from the start to the finish, not passing through any joint.
    Direct,
}

#[derive(Debug, Clone)]
struct FakeJoint {
    kind: FakeJointKind,
    path: Vec<Segment>,

    /// Real segment through which the path connects with the rest of the graph:
    /// the last one for [FakeJointKind::FromStart], the first one for [FakeJointKind::ToFinish].
    boundary: Segment,

    weight: RouteWeight,
}

/// Real segment through which a joint segment meets sequence restrictions:
/// fake joints connect with the road network through their boundary segment.
fn boundary_of(fakes: &HashMap<JointSegment, FakeJoint>, joint: &JointSegment) -> Option<Segment> {
    match fakes.get(joint) {
        Some(fake) => fake.boundary.is_real().then_some(fake.boundary),
        None => joint.real_segment(),
    }
}

/// Search graph over [JointSegments](JointSegment) of any [SegmentGraph].
///
/// Parts of the route between the start (or the finish) and the first (or last)
/// joint are precomputed with a small breadth-first search and represented by fake
/// joint segments. The start and the finish themselves are represented by invisible,
/// zero-weight joint segments.
///
/// The edge from `J1` to `J2` weighs the maneuver penalty between the last segment
/// of `J1` and the first segment of `J2`, plus the weight of all segments of `J2`.
/// When `J2` starts with the twin of `J1`'s last segment, the twin isn't charged again.
#[derive(Debug)]
pub struct IndexGraphStarterJoints<'g, G: SegmentGraph> {
    graph: &'g mut G,
    start_segment: Segment,
    finish_segment: Segment,
    start_point: LatLon,
    finish_point: LatLon,
    fakes: HashMap<JointSegment, FakeJoint>,
    start_edges: Vec<Edge<JointSegment, RouteWeight>>,
    finish_edges: Vec<Edge<JointSegment, RouteWeight>>,
    from_start_by_last: HashMap<Segment, Vec<JointSegment>>,
    to_finish_by_first: HashMap<Segment, Vec<JointSegment>>,
    weights: HashMap<JointSegment, RouteWeight>,
    next_fake_id: u32,
    joint_buffer: Vec<JointEdge>,
}

impl<'g, G: SegmentGraph> IndexGraphStarterJoints<'g, G> {
    pub fn new(graph: &'g mut G, start: Segment, finish: Segment) -> Self {
        let start_point = graph.point(&start, true);
        let finish_point = graph.point(&finish, true);
        let mut joints = Self {
            graph,
            start_segment: start,
            finish_segment: finish,
            start_point,
            finish_point,
            fakes: HashMap::default(),
            start_edges: Vec::default(),
            finish_edges: Vec::default(),
            from_start_by_last: HashMap::default(),
            to_finish_by_first: HashMap::default(),
            weights: HashMap::default(),
            next_fake_id: 0,
            joint_buffer: Vec::default(),
        };

        for (id, segment) in [(START_JOINT_ID, start), (FINISH_JOINT_ID, finish)] {
            joints.fakes.insert(
                JointSegment::fake(id),
                FakeJoint {
                    kind: FakeJointKind::Invisible,
                    path: vec![segment],
                    boundary: segment,
                    weight: RouteWeight::ZERO,
                },
            );
        }

        joints.find_first_joints(start, true);
        joints.find_first_joints(finish, false);
        log::debug!(
            "compressed route ends into {} start and {} finish joints",
            joints.start_edges.len(),
            joints.finish_edges.len(),
        );
        joints
    }

    pub fn start_joint(&self) -> JointSegment {
        JointSegment::fake(START_JOINT_ID)
    }

    pub fn finish_joint(&self) -> JointSegment {
        JointSegment::fake(FINISH_JOINT_ID)
    }

    pub fn graph(&mut self) -> &mut G {
        &mut *self.graph
    }

    fn is_end_of_segment(&mut self, fake: &Segment, real: &Segment, from_start: bool) -> bool {
        self.graph.point(fake, from_start) == self.graph.point(real, from_start)
    }

    /// Walks from `ending` (forwards if `from_start`, backwards otherwise) until
    /// reaching joints or the other ending, and creates fake joint segments for
    /// all such paths.
    fn find_first_joints(&mut self, ending: Segment, from_start: bool) {
        let other = if from_start {
            self.finish_segment
        } else {
            self.start_segment
        };

        let mut queue = VecDeque::from([ending]);
        let mut parents: HashMap<Segment, Segment> = HashMap::default();
        let mut weights: HashMap<Segment, RouteWeight> = HashMap::from([(ending, RouteWeight::ZERO)]);
        let mut found: BTreeSet<(Segment, Segment)> = BTreeSet::default();
        let mut edges = Vec::default();

        while let Some(segment) = queue.pop_front() {
            if segment == other {
                found.insert((segment, segment));
                continue;
            }

            let real = if segment.is_real() {
                Some(segment)
            } else {
                self.graph
                    .convert_to_real(&segment)
                    .filter(|real| self.is_end_of_segment(&segment, real, from_start))
            };
            if let Some(real) = real {
                if self.graph.is_joint(&real, from_start) {
                    found.insert((segment, real));
                    continue;
                }
            }

            let weight = weights[&segment];
            edges.clear();
            self.graph.segment_edges(&segment, from_start, &mut edges);
            for edge in edges.drain(..) {
                let candidate = weight + edge.weight;
                if weights.get(&edge.target).is_some_and(|&w| w <= candidate) {
                    continue;
                }
                weights.insert(edge.target, candidate);
                parents.insert(edge.target, segment);
                queue.push_back(edge.target);
            }
        }

        for (last, boundary) in found {
            let mut path = vec![last];
            let mut current = last;
            while let Some(&parent) = parents.get(&current) {
                path.push(parent);
                current = parent;
            }
            if from_start {
                path.reverse();
            }

            let walked = weights[&last];
            let kind = if last == other {
                FakeJointKind::Direct
            } else if from_start {
                FakeJointKind::FromStart
            } else {
                FakeJointKind::ToFinish
            };
            let weight = match kind {
                FakeJointKind::ToFinish => self.graph.segment_weight(&last) + walked,
                _ => walked,
            };

            let id = JointSegment::fake(self.next_fake_id);
            self.next_fake_id += 1;
            self.fakes.insert(
                id,
                FakeJoint {
                    kind,
                    path,
                    boundary,
                    weight,
                },
            );

            match kind {
                FakeJointKind::FromStart => {
                    self.start_edges.push(Edge::new(id, weight));
                    self.from_start_by_last.entry(boundary).or_default().push(id);
                }
                FakeJointKind::ToFinish => {
                    self.finish_edges.push(Edge::new(id, RouteWeight::ZERO));
                    self.to_finish_by_first.entry(boundary).or_default().push(id);
                }
                FakeJointKind::Direct => {
                    self.start_edges.push(Edge::new(id, weight));
                    self.finish_edges.push(Edge::new(id, RouteWeight::ZERO));
                }
                FakeJointKind::Invisible => unreachable!(),
            }
        }
    }

    /// Segments represented by a joint segment, in travel order.
    pub fn reconstruct_joint(&self, joint: &JointSegment) -> Vec<Segment> {
        if let Some(fake) = self.fakes.get(joint) {
            return match fake.kind {
                FakeJointKind::Invisible => Vec::default(),
                _ => fake.path.clone(),
            };
        }

        assert!(!joint.is_fake(), "unknown fake joint segment {}", joint);
        let first = joint.segment(true);
        let last = joint.segment(false);
        let mut segments = vec![first];
        let mut current = first;
        while current != last {
            current = current.next(current.is_forward());
            segments.push(current);
        }
        segments
    }

    /// Segments of a route found over joint segments.
    pub fn reconstruct_path(&self, path: &[JointSegment]) -> Vec<Segment> {
        path.iter().flat_map(|j| self.reconstruct_joint(j)).collect()
    }

    fn weight_of(&mut self, joint: &JointSegment) -> RouteWeight {
        if let Some(fake) = self.fakes.get(joint) {
            return fake.weight;
        }
        if let Some(&w) = self.weights.get(joint) {
            return w;
        }

        let w = self
            .reconstruct_joint(joint)
            .iter()
            .map(|s| self.graph.segment_weight(s))
            .sum();
        self.weights.insert(*joint, w);
        w
    }

    fn get_edge_list(
        &mut self,
        data: &VertexData<'_, JointSegment, RouteWeight>,
        is_outgoing: bool,
        edges: &mut Vec<Edge<JointSegment, RouteWeight>>,
    ) {
        let vertex = data.vertex;
        if vertex == self.start_joint() {
            if is_outgoing {
                edges.extend_from_slice(&self.start_edges);
            }
            return;
        }
        if vertex == self.finish_joint() {
            if !is_outgoing {
                edges.extend_from_slice(&self.finish_edges);
            }
            return;
        }

        let boundary = match self.fakes.get(&vertex).map(|f| (f.kind, f.boundary, f.weight)) {
            Some((FakeJointKind::Direct | FakeJointKind::ToFinish, _, _)) if is_outgoing => {
                edges.push(Edge::new(self.finish_joint(), RouteWeight::ZERO));
                return;
            }
            Some((FakeJointKind::Direct | FakeJointKind::FromStart, _, weight)) if !is_outgoing => {
                edges.push(Edge::new(self.start_joint(), weight));
                return;
            }
            Some((_, boundary, _)) => boundary,
            None => vertex.segment(!is_outgoing),
        };

        let own_weight = if is_outgoing {
            RouteWeight::ZERO
        } else {
            self.weight_of(&vertex)
        };

        self.joint_buffer.clear();
        let fakes = &self.fakes;
        let lookup = |j: &JointSegment| boundary_of(fakes, j);
        let at = Expansion::new(&vertex, data.real_distance, is_outgoing, data.parents)
            .with_locator(Locator::new(&lookup));
        self.graph.joint_edges(&at, &boundary, &mut self.joint_buffer);

        for i in 0..self.joint_buffer.len() {
            let edge = self.joint_buffer[i];
            if is_outgoing {
                edges.push(Edge::new(edge.target, edge.penalty + edge.weight - edge.shared));
                if let Some(fakes) = self.to_finish_by_first.get(&edge.target.segment(true)) {
                    for fake in fakes {
                        let weight = edge.penalty + self.fakes[fake].weight - edge.shared;
                        edges.push(Edge::new(*fake, weight));
                    }
                }
            } else {
                let weight = edge.penalty + own_weight - edge.shared;
                edges.push(Edge::new(edge.target, weight));
                if let Some(fakes) = self.from_start_by_last.get(&edge.target.segment(false)) {
                    edges.extend(fakes.iter().map(|&fake| Edge::new(fake, weight)));
                }
            }
        }
    }

    /// Position of the head of the joint segment's last segment.
    fn head(&mut self, joint: &JointSegment) -> LatLon {
        let last = match self.fakes.get(joint) {
            Some(fake) => fake.path.last().copied().unwrap_or(fake.boundary),
            None => joint.segment(false),
        };
        self.graph.point(&last, true)
    }
}

impl<G: SegmentGraph> AStarGraph for IndexGraphStarterJoints<'_, G> {
    type Vertex = JointSegment;
    type Weight = RouteWeight;

    fn heuristic_cost_estimate(&mut self, from: &JointSegment, to: &JointSegment) -> RouteWeight {
        let from = self.head(from);
        let to = if *to == self.finish_joint() {
            self.finish_point
        } else if *to == self.start_joint() {
            self.start_point
        } else {
            self.head(to)
        };
        self.graph.heuristic(from, to)
    }

    fn outgoing_edges(
        &mut self,
        data: &VertexData<'_, JointSegment, RouteWeight>,
        edges: &mut Vec<Edge<JointSegment, RouteWeight>>,
    ) {
        self.get_edge_list(data, true, edges);
    }

    fn ingoing_edges(
        &mut self,
        data: &VertexData<'_, JointSegment, RouteWeight>,
        edges: &mut Vec<Edge<JointSegment, RouteWeight>>,
    ) {
        self.get_edge_list(data, false, edges);
    }

    fn are_waves_connectible(
        &mut self,
        forward_parents: &Parents<JointSegment>,
        common: &JointSegment,
        backward_parents: &Parents<JointSegment>,
    ) -> bool {
        let fakes = &self.fakes;
        let lookup = |j: &JointSegment| boundary_of(fakes, j);
        self.graph.are_waves_connectible(
            forward_parents,
            common,
            backward_parents,
            Locator::new(&lookup),
        )
    }
}
