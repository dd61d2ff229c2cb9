// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDateTime;

use crate::astar::{Edge, Parents};
use crate::distance::LatLon;
use crate::estimator::{EdgeEstimator, Purpose};
use crate::geometry::{Geometry, RoadGeometry};
use crate::joint::{Joint, JointId, JointSegment};
use crate::kd::KDTree;
use crate::profile::RoutingOptions;
use crate::restrictions::{
    Locator, Restriction, RestrictionKind, RestrictionTable, RestrictionVertex,
    UTurnRestriction, UTurnTable,
};
use crate::road_access::{Confidence, RoadAccess, RoadAccessType};
use crate::road_index::{JointIndex, RoadIndex};
use crate::time::advance;
use crate::{RegionId, RoadPoint, RouteWeight, Segment, SegmentEdge};

/// Per-request parameters affecting which edges exist and what they weigh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeContext {
    pub options: RoutingOptions,

    /// Departure time of the route. Conditional access is ignored if unknown.
    pub start_time: Option<NaiveDateTime>,
}

impl EdgeContext {
    /// Moment at which access is evaluated when enumerating edges of a vertex
    /// reached after `real_distance`.
    ///
    /// Outgoing searches simulate the arrival time; ingoing searches don't know
    /// when the route will reach the vertex and use the departure time.
    pub fn access_time(&self, real_distance: RouteWeight, is_outgoing: bool) -> Option<NaiveDateTime> {
        self.start_time.map(|start| {
            if is_outgoing {
                advance(start, real_distance.seconds())
            } else {
                start
            }
        })
    }
}

/// Search vertex whose edges are being enumerated.
#[derive(Debug)]
pub struct Expansion<'a, V> {
    /// Usually the expanded real segment itself, but it may be a synthetic vertex
    /// standing for a part of it, or a compressed vertex ending at it.
    pub vertex: &'a V,

    /// Weight of the route found so far to `vertex`.
    pub real_distance: RouteWeight,

    pub is_outgoing: bool,

    /// Ancestors of `vertex`, used to evaluate sequence restrictions.
    pub parents: &'a Parents<V>,

    pub locator: Locator<'a, V>,
}

impl<'a, V: RestrictionVertex> Expansion<'a, V> {
    pub fn new(vertex: &'a V, real_distance: RouteWeight, is_outgoing: bool, parents: &'a Parents<V>) -> Self {
        Self {
            vertex,
            real_distance,
            is_outgoing,
            parents,
            locator: Locator::default(),
        }
    }

    pub fn with_locator(mut self, locator: Locator<'a, V>) -> Self {
        self.locator = locator;
        self
    }
}

/// Edge between two [JointSegments](JointSegment) of the compressed graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointEdge {
    pub target: JointSegment,

    /// Maneuver penalty between the boundary segments.
    pub penalty: RouteWeight,

    /// Weight of traveling all segments of `target`.
    pub weight: RouteWeight,

    /// Weight of the first segment (in travel order) of the later joint segment
    /// when it is the twin of the earlier one's last segment. Both stand for the
    /// same road across a region border, which is traveled only once.
    pub shared: RouteWeight,
}

/// Road graph of a single region.
///
/// Vertices are [Segments](Segment); two segments are connected if the head of the
/// first one shares a [joint](Joint) with the tail of the other (or both are consecutive
/// segments of the same road). The graph is assembled during load with [IndexGraph::import]
/// and the `set_*` methods, and later shared read-only.
pub struct IndexGraph {
    region: RegionId,
    geometry: Arc<Geometry>,
    estimator: Arc<EdgeEstimator>,
    road_index: RoadIndex,
    joint_index: JointIndex,
    restrictions: RestrictionTable,
    u_turns: UTurnTable,
    road_access: RoadAccess,
    snap_index: OnceLock<Option<SnapIndex>>,
}

impl IndexGraph {
    pub fn new(region: RegionId, geometry: Arc<Geometry>, estimator: Arc<EdgeEstimator>) -> Self {
        Self {
            region,
            geometry,
            estimator,
            road_index: RoadIndex::default(),
            joint_index: JointIndex::default(),
            restrictions: RestrictionTable::default(),
            u_turns: UTurnTable::default(),
            road_access: RoadAccess::default(),
            snap_index: OnceLock::new(),
        }
    }

    /// Loads the joints of the region. Joint ids are positions in the slice.
    pub fn import(&mut self, joints: &[Joint]) {
        self.road_index = RoadIndex::import(joints);
        self.joint_index = JointIndex::build(joints);
        self.snap_index = OnceLock::new();
    }

    /// Loads sequence restrictions. Must be called after [IndexGraph::import],
    /// as `Only` restrictions are converted into `No` restrictions over the
    /// features meeting at their last joint.
    pub fn set_restrictions(&mut self, restrictions: Vec<Restriction>) {
        let mut forbidden = Vec::with_capacity(restrictions.len());
        for restriction in restrictions {
            restriction.validate();
            match restriction.kind {
                RestrictionKind::No => forbidden.push(restriction.features),
                RestrictionKind::Only => self.convert_only(&restriction.features, &mut forbidden),
            }
        }
        self.restrictions = RestrictionTable::new(forbidden);
    }

    /// `only [.., A, B]` becomes `no [.., A, X]` for every other feature X at the A/B joint.
    fn convert_only(&self, features: &[u32], forbidden: &mut Vec<Vec<u32>>) {
        let (&to, preceding) = features
            .split_last()
            .unwrap_or_else(|| unreachable!("validated restriction can't be empty"));
        let from = *preceding
            .last()
            .unwrap_or_else(|| unreachable!("validated restriction has at least two features"));

        let Some(joint_id) = self.common_joint(from, to) else {
            log::warn!(
                "features {} and {} of only-restriction {:?} don't meet in region {}",
                from,
                to,
                features,
                self.region,
            );
            return;
        };

        let mut others: Vec<u32> = self
            .joint_index
            .points(joint_id)
            .iter()
            .map(|p| p.feature_id)
            .filter(|&f| f != from && f != to)
            .collect();
        others.sort_unstable();
        others.dedup();

        for other in others {
            let mut sequence = preceding.to_vec();
            sequence.push(other);
            forbidden.push(sequence);
        }
    }

    fn common_joint(&self, a: u32, b: u32) -> Option<JointId> {
        self.road_index.road(a)?.joints().find_map(|(_, joint_id)| {
            self.joint_index
                .points(joint_id)
                .iter()
                .any(|p| p.feature_id == b)
                .then_some(joint_id)
        })
    }

    pub fn set_uturn_restrictions(&mut self, restrictions: Vec<UTurnRestriction>) {
        self.u_turns = UTurnTable::new(restrictions);
    }

    pub fn set_road_access(&mut self, road_access: RoadAccess) {
        self.road_access = road_access;
    }

    #[inline]
    pub fn region_id(&self) -> RegionId {
        self.region
    }

    pub fn estimator(&self) -> &EdgeEstimator {
        &self.estimator
    }

    pub fn road(&self, feature_id: u32) -> Arc<RoadGeometry> {
        self.geometry.road(feature_id)
    }

    /// Position of the head (`front == true`) or the tail of a real segment.
    pub fn point(&self, segment: &Segment, front: bool) -> LatLon {
        self.geometry.point(segment.road_point(front))
    }

    pub fn joint_id(&self, point: RoadPoint) -> Option<JointId> {
        self.road_index.joint_id(point)
    }

    pub fn joint_points(&self, joint_id: JointId) -> &[RoadPoint] {
        self.joint_index.points(joint_id)
    }

    pub fn road_access(&self) -> &RoadAccess {
        &self.road_access
    }

    /// Checks whether the head (`front == true`) or the tail of a segment is a joint,
    /// or the first or last point of its road.
    pub fn is_joint(&self, segment: &Segment, front: bool) -> bool {
        let point = segment.road_point(front);
        if self.road_index.joint_id(point).is_some() || point.point_id == 0 {
            return true;
        }
        point.point_id + 1 >= self.road(point.feature_id).points_count()
    }

    /// Weight of traveling a whole segment. Doesn't depend on [Purpose],
    /// which only affects maneuver penalties.
    pub fn calc_segment_weight(&self, segment: &Segment) -> RouteWeight {
        self.estimator
            .calc_segment_weight(segment, &self.road(segment.feature_id()))
    }

    /// Appends edges between `segment` and its neighbors to `edges`,
    /// as seen from the search vertex `at` travels along `segment`.
    pub fn get_edge_list<V: RestrictionVertex>(
        &self,
        ctx: &EdgeContext,
        at: &Expansion<'_, V>,
        segment: &Segment,
        edges: &mut Vec<SegmentEdge>,
    ) {
        let time = ctx.access_time(at.real_distance, at.is_outgoing);
        for neighbor in self.neighbors(ctx, segment, at.is_outgoing) {
            if self.is_allowed(ctx, at, segment, &neighbor, time) {
                let weight =
                    self.edge_weight_at(Purpose::Weight, at.is_outgoing, segment, &neighbor, time);
                edges.push(Edge::new(neighbor, weight));
            }
        }
    }

    /// Weight of moving between `from` and a neighboring `to`: the weight of the
    /// entered segment (`to` for outgoing edges, `from` for ingoing ones) plus
    /// maneuver penalties.
    pub fn calc_edge_weight(
        &self,
        ctx: &EdgeContext,
        purpose: Purpose,
        is_outgoing: bool,
        from: &Segment,
        to: &Segment,
        real_distance: RouteWeight,
    ) -> RouteWeight {
        let time = ctx.access_time(real_distance, is_outgoing);
        self.edge_weight_at(purpose, is_outgoing, from, to, time)
    }

    /// Maneuver penalty of moving from `arriving` onto `leaving`.
    pub fn calc_penalties(
        &self,
        purpose: Purpose,
        arriving: &Segment,
        leaving: &Segment,
        time: Option<NaiveDateTime>,
    ) -> RouteWeight {
        let mut penalty = RouteWeight::ZERO;
        if arriving.is_inverse(leaving) {
            penalty += self.estimator.u_turn_penalty(purpose);
        }

        let from_road = self.road(arriving.feature_id());
        let to_road = self.road(leaving.feature_id());
        if !from_road.is_ferry() && to_road.is_ferry() {
            penalty += self.estimator.ferry_landing_penalty(purpose);
        }
        if from_road.pass_through_allowed && !to_road.pass_through_allowed {
            penalty += self.estimator.pass_through_penalty(purpose);
        }

        let (from_access, from_confidence) =
            self.road_access.feature_access(arriving.feature_id(), time);
        let (to_access, to_confidence) = self.road_access.feature_access(leaving.feature_id(), time);
        let (point_access, point_confidence) =
            self.road_access.point_access(leaving.road_point(false), time);

        let entering_private = |access: RoadAccessType, confidence: Confidence| {
            confidence == Confidence::Sure
                && matches!(access, RoadAccessType::Private | RoadAccessType::Destination)
        };
        if (from_confidence == Confidence::Sure
            && !entering_private(from_access, from_confidence)
            && entering_private(to_access, to_confidence))
            || entering_private(point_access, point_confidence)
        {
            penalty += self.estimator.access_change_penalty(purpose);
        }

        if to_confidence == Confidence::Maybe || point_confidence == Confidence::Maybe {
            penalty += self.estimator.conditional_access_penalty(purpose);
        }

        penalty
    }

    fn edge_weight_at(
        &self,
        purpose: Purpose,
        is_outgoing: bool,
        from: &Segment,
        to: &Segment,
        time: Option<NaiveDateTime>,
    ) -> RouteWeight {
        let (arriving, leaving) = if is_outgoing { (from, to) } else { (to, from) };
        self.calc_segment_weight(leaving)
            + self.calc_penalties(purpose, arriving, leaving, time)
    }

    /// Appends edges of the compressed graph leaving (or entering) `segment` to `edges`.
    ///
    /// Every allowed neighbor of `segment` is extended along its road until the
    /// next joint or road end, forming the target [JointSegment].
    pub fn joint_edges<V: RestrictionVertex>(
        &self,
        ctx: &EdgeContext,
        at: &Expansion<'_, V>,
        segment: &Segment,
        edges: &mut Vec<JointEdge>,
    ) {
        let time = ctx.access_time(at.real_distance, at.is_outgoing);
        for neighbor in self.neighbors(ctx, segment, at.is_outgoing) {
            if !self.is_allowed(ctx, at, segment, &neighbor, time) {
                continue;
            }

            let (arriving, leaving) = if at.is_outgoing {
                (segment, &neighbor)
            } else {
                (&neighbor, segment)
            };
            let penalty = self.calc_penalties(Purpose::Weight, arriving, leaving, time);
            let (target, weight) = self.extend_to_joint(&neighbor, at.is_outgoing);
            edges.push(JointEdge {
                target,
                penalty,
                weight,
                shared: RouteWeight::ZERO,
            });
        }
    }

    /// Walks from `first` along its road (in the travel direction if `is_outgoing`,
    /// against it otherwise) until a joint or a road end.
    pub fn extend_to_joint(&self, first: &Segment, is_outgoing: bool) -> (JointSegment, RouteWeight) {
        let road = self.road(first.feature_id());
        let mut weight = self.estimator.calc_segment_weight(first, &road);
        let mut last = *first;

        while !self.is_joint_on(&road, &last, is_outgoing) {
            last = if is_outgoing {
                last.next(last.is_forward())
            } else {
                last.next(!last.is_forward())
            };
            weight += self.estimator.calc_segment_weight(&last, &road);
        }

        let joint_segment = if is_outgoing {
            JointSegment::new(first, &last)
        } else {
            JointSegment::new(&last, first)
        };
        (joint_segment, weight)
    }

    fn is_joint_on(&self, road: &RoadGeometry, segment: &Segment, front: bool) -> bool {
        let point = segment.road_point(front);
        point.point_id == 0
            || point.point_id + 1 >= road.points_count()
            || self.road_index.joint_id(point).is_some()
    }

    /// Checks whether joining the waves of a bidirectional search at `common`
    /// travels a forbidden feature sequence.
    pub fn are_waves_connectible<V: RestrictionVertex>(
        &self,
        forward_parents: &Parents<V>,
        common: &V,
        backward_parents: &Parents<V>,
        locator: Locator<'_, V>,
    ) -> bool {
        self.restrictions
            .are_waves_connectible(forward_parents, common, backward_parents, locator)
    }

    /// Segments sharing the head (`is_outgoing`) or the tail of `segment`,
    /// traversable in the matching direction.
    fn neighbors(&self, ctx: &EdgeContext, segment: &Segment, is_outgoing: bool) -> Vec<Segment> {
        let point = segment.road_point(is_outgoing);
        let mut neighbors = Vec::default();
        match self.road_index.joint_id(point) {
            Some(joint_id) => {
                for &p in self.joint_index.points(joint_id) {
                    self.neighbors_at(ctx, p, is_outgoing, &mut neighbors);
                }
            }
            None => self.neighbors_at(ctx, point, is_outgoing, &mut neighbors),
        }
        neighbors
    }

    fn neighbors_at(
        &self,
        ctx: &EdgeContext,
        point: RoadPoint,
        is_outgoing: bool,
        neighbors: &mut Vec<Segment>,
    ) {
        let road = self.road(point.feature_id);
        if !road.is_valid() || ctx.options.excludes(&road.options) {
            return;
        }

        let bidirectional = !road.one_way;
        if (is_outgoing || bidirectional) && point.point_id + 1 < road.points_count() {
            neighbors.push(Segment::new(
                self.region,
                point.feature_id,
                point.point_id,
                is_outgoing,
            ));
        }
        if (!is_outgoing || bidirectional) && point.point_id > 0 {
            neighbors.push(Segment::new(
                self.region,
                point.feature_id,
                point.point_id - 1,
                !is_outgoing,
            ));
        }
    }

    fn is_allowed<V: RestrictionVertex>(
        &self,
        ctx: &EdgeContext,
        at: &Expansion<'_, V>,
        segment: &Segment,
        neighbor: &Segment,
        time: Option<NaiveDateTime>,
    ) -> bool {
        let is_outgoing = at.is_outgoing;
        let (arriving, leaving) = if is_outgoing {
            (segment, neighbor)
        } else {
            (neighbor, segment)
        };

        if !self.is_turn_allowed(ctx, arriving, leaving) {
            return false;
        }

        if self
            .restrictions
            .is_restricted(at, segment, neighbor.feature_id())
        {
            return false;
        }

        let forbidden = |(access, confidence): (RoadAccessType, Confidence)| {
            access == RoadAccessType::No && confidence == Confidence::Sure
        };
        let junction = neighbor.road_point(!is_outgoing);
        let through = segment.road_point(is_outgoing);
        !forbidden(self.road_access.feature_access(neighbor.feature_id(), time))
            && !forbidden(self.road_access.point_access(junction, time))
            && !forbidden(self.road_access.point_access(through, time))
    }

    /// Applies u-turn rules to the maneuver `arriving -> leaving`.
    ///
    /// Turning around is only possible at dead ends and where an `only_u_turn`
    /// restriction exists; `no_u_turn` forbids it, `only_u_turn` forbids everything else.
    fn is_turn_allowed(&self, ctx: &EdgeContext, arriving: &Segment, leaving: &Segment) -> bool {
        let head = arriving.road_point(true);
        let points_count = self.road(head.feature_id).points_count();
        let at_first = head.point_id == 0;
        let at_last = head.point_id + 1 >= points_count;

        let (no_u_turn, only_u_turn) = if at_first || at_last {
            (
                self.u_turns.no_u_turn(head.feature_id, at_first),
                self.u_turns.only_u_turn(head.feature_id, at_first),
            )
        } else {
            (false, false)
        };

        if arriving.is_inverse(leaving) {
            !no_u_turn && (only_u_turn || self.is_dead_end(ctx, arriving))
        } else {
            !only_u_turn
        }
    }

    fn is_dead_end(&self, ctx: &EdgeContext, arriving: &Segment) -> bool {
        self.neighbors(ctx, arriving, true)
            .iter()
            .all(|s| s.is_inverse(arriving))
    }

    /// Returns the real segments which may pass within `radius` of `position`.
    ///
    /// A segment's closest point may lie far from both of its ends, so the search
    /// covers road points within `radius` plus half of the longest segment of the region.
    /// The result is a superset: callers need to check the projections themselves.
    pub fn segments_near(&self, position: LatLon, radius: f64) -> BTreeSet<Segment> {
        let mut candidates = BTreeSet::default();
        let Some(index) = self.snap_index() else {
            return candidates;
        };

        let mut found = Vec::default();
        index.points.find_within(
            position,
            radius + index.longest_segment / 2.0,
            self.estimator.metric(),
            &mut found,
        );

        for (point, _) in found {
            let points_count = self.road(point.feature_id).points_count();
            if point.point_id > 0 {
                candidates.insert(Segment::new(
                    self.region,
                    point.feature_id,
                    point.point_id - 1,
                    true,
                ));
            }
            if point.point_id + 1 < points_count {
                candidates.insert(Segment::new(self.region, point.feature_id, point.point_id, true));
            }
        }
        candidates
    }

    fn snap_index(&self) -> Option<&SnapIndex> {
        self.snap_index
            .get_or_init(|| self.build_snap_index())
            .as_ref()
    }

    fn build_snap_index(&self) -> Option<SnapIndex> {
        let metric = self.estimator.metric();
        let mut items = Vec::default();
        let mut longest_segment: f64 = 0.0;
        for feature_id in self.road_index.features() {
            let road = self.road(feature_id);
            if !road.is_valid() {
                continue;
            }
            for (point_id, &position) in road.points().iter().enumerate() {
                items.push((position, RoadPoint::new(feature_id, point_id as u32)));
            }
            for pair in road.points().windows(2) {
                longest_segment = longest_segment.max(metric(pair[0], pair[1]));
            }
        }
        log::debug!(
            "indexed {} road points of region {}, longest segment {:.0} m",
            items.len(),
            self.region,
            longest_segment,
        );
        KDTree::build(&mut items).map(|points| SnapIndex {
            points,
            longest_segment,
        })
    }
}

/// Road points of a region, for attaching arbitrary positions to the closest roads.
#[derive(Debug)]
struct SnapIndex {
    points: KDTree<RoadPoint>,

    /// Length of the longest segment of the region, in meters.
    longest_segment: f64,
}

impl fmt::Debug for IndexGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexGraph")
            .field("region", &self.region)
            .field("joints", &self.joint_index.len())
            .field("restrictions", &!self.restrictions.is_empty())
            .finish_non_exhaustive()
    }
}
