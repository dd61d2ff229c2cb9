// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Helpers shared by unit tests: small in-memory graphs with planar geometry,
//! where (x, y) positions are stored as `LatLon { lat: y, lon: x }` and
//! traveling one unit of distance takes exactly one second.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::astar::{AStarGraph, Edge, VertexData};
use crate::cross_region::TransitionTable;
use crate::distance::LatLon;
use crate::estimator::EdgeEstimator;
use crate::geometry::{Geometry, RoadGeometry};
use crate::index_graph::IndexGraph;
use crate::joint::Joint;
use crate::regions::PrebuiltGraphs;
use crate::profile::VehicleProfile;
use crate::restrictions::{Restriction, UTurnRestriction};
use crate::road_access::RoadAccess;
use crate::{RegionId, RoadPoint, RouteWeight, Segment};

pub(crate) const TEST_REGION: RegionId = 0;

/// Speed at which one unit of [unit_metric] takes one second.
pub(crate) const UNIT_SPEED: f64 = 3600.0;

pub(crate) const UNIT_PROFILE: VehicleProfile = VehicleProfile {
    name: "test",
    max_speed_kmph: UNIT_SPEED,
    offroad_speed_kmph: UNIT_SPEED,
    leap_speed_kmph: UNIT_SPEED,
    u_turn_penalty: 0.0,
    ferry_landing_penalty: 0.0,
    pass_through_penalty: 0.0,
    access_change_penalty: 0.0,
    conditional_access_penalty: 0.0,
    use_leaps: false,
    use_joints: false,
    length_limit_factor: 1000.0,
    min_length_limit: 1e6,
    snapping_radius: 1500.0,
};

/// Euclidean distance between two points, treating latitude as `y` and longitude as `x`.
pub(crate) fn planar_distance(a: LatLon, b: LatLon) -> f64 {
    (a.lat - b.lat).hypot(a.lon - b.lon)
}

/// One planar unit is a kilometer.
pub(crate) fn unit_metric(a: LatLon, b: LatLon) -> f64 {
    planar_distance(a, b) * 1000.0
}

pub(crate) fn unit_estimator_with(profile: VehicleProfile) -> Arc<EdgeEstimator> {
    Arc::new(EdgeEstimator::with_metric(profile, unit_metric))
}

pub(crate) fn unit_estimator() -> Arc<EdgeEstimator> {
    unit_estimator_with(UNIT_PROFILE)
}

pub(crate) fn xy(x: f64, y: f64) -> LatLon {
    LatLon::new(y, x)
}

/// Monday, 2024-03-04 at the given time.
pub(crate) fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid test date")
}

pub(crate) fn seg(feature_id: u32, segment_idx: u32, forward: bool) -> Segment {
    Segment::new(TEST_REGION, feature_id, segment_idx, forward)
}

pub(crate) fn road(one_way: bool, points: &[(f64, f64)]) -> RoadGeometry {
    RoadGeometry::new(
        points.iter().map(|&(x, y)| xy(x, y)).collect(),
        UNIT_SPEED,
        one_way,
    )
}

pub(crate) fn joint(points: &[(u32, u32)]) -> Joint {
    points
        .iter()
        .map(|&(feature, point)| RoadPoint::new(feature, point))
        .collect()
}

/// Assembles an [IndexGraph] the way region loading does.
pub(crate) struct IndexGraphBuilder {
    region: RegionId,
    roads: HashMap<u32, RoadGeometry>,
    joints: Vec<Joint>,
    restrictions: Vec<Restriction>,
    u_turns: Vec<UTurnRestriction>,
    road_access: RoadAccess,
    estimator: Arc<EdgeEstimator>,
}

impl IndexGraphBuilder {
    pub(crate) fn new() -> Self {
        Self {
            region: TEST_REGION,
            roads: HashMap::default(),
            joints: Vec::default(),
            restrictions: Vec::default(),
            u_turns: Vec::default(),
            road_access: RoadAccess::default(),
            estimator: unit_estimator(),
        }
    }

    pub(crate) fn region(mut self, region: RegionId) -> Self {
        self.region = region;
        self
    }

    pub(crate) fn road(mut self, feature_id: u32, road: RoadGeometry) -> Self {
        self.roads.insert(feature_id, road);
        self
    }

    pub(crate) fn joint(mut self, joint: Joint) -> Self {
        self.joints.push(joint);
        self
    }

    pub(crate) fn restrictions(mut self, restrictions: Vec<Restriction>) -> Self {
        self.restrictions = restrictions;
        self
    }

    pub(crate) fn u_turns(mut self, u_turns: Vec<UTurnRestriction>) -> Self {
        self.u_turns = u_turns;
        self
    }

    pub(crate) fn road_access(mut self, road_access: RoadAccess) -> Self {
        self.road_access = road_access;
        self
    }

    pub(crate) fn estimator(mut self, estimator: Arc<EdgeEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub(crate) fn build(self) -> IndexGraph {
        let geometry = Arc::new(Geometry::new(self.roads));
        let mut graph = IndexGraph::new(self.region, geometry, self.estimator);
        graph.import(&self.joints);
        graph.set_restrictions(self.restrictions);
        graph.set_uturn_restrictions(self.u_turns);
        graph.set_road_access(self.road_access);
        graph
    }
}

/// ```text
/// Finish
/// 3 *
///   ^
///   F4
/// 2 *
///   ^ ↖
///   |   F1
/// 1 |     *
///   F0      ↖
///   |         F2
/// 0 *<--F3--*<--F3--*<--F5--* Start
///   0       1       2       3
/// ```
///
/// All roads are one-way.
pub(crate) fn triangular_graph() -> IndexGraphBuilder {
    IndexGraphBuilder::new()
        .road(0, road(true, &[(0.0, 0.0), (0.0, 2.0)]))
        .road(1, road(true, &[(1.0, 1.0), (0.0, 2.0)]))
        .road(2, road(true, &[(2.0, 0.0), (1.0, 1.0)]))
        .road(3, road(true, &[(2.0, 0.0), (1.0, 0.0), (0.0, 0.0)]))
        .road(4, road(true, &[(0.0, 2.0), (0.0, 3.0)]))
        .road(5, road(true, &[(3.0, 0.0), (2.0, 0.0)]))
        .joint(joint(&[(2, 0), (3, 0), (5, 1)]))
        .joint(joint(&[(3, 2), (0, 0)]))
        .joint(joint(&[(2, 1), (1, 0)]))
        .joint(joint(&[(0, 1), (1, 1), (4, 0)]))
        .joint(joint(&[(5, 0)]))
        .joint(joint(&[(4, 1)]))
}

/// ```text
/// Finish
/// 3 *
///   F4
/// 2 *
///   | ╲
///   F0  F2
/// 1 *     *
///   F0      F2
///   |         ╲
/// 0 *--F1--*--F1--*--F3--* Start
///   0      1      2      3
/// ```
///
/// All roads are two-way.
pub(crate) fn corner_graph() -> IndexGraphBuilder {
    IndexGraphBuilder::new()
        .road(0, road(false, &[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)]))
        .road(1, road(false, &[(2.0, 0.0), (1.0, 0.0), (0.0, 0.0)]))
        .road(2, road(false, &[(2.0, 0.0), (1.0, 1.0), (0.0, 2.0)]))
        .road(3, road(false, &[(3.0, 0.0), (2.0, 0.0)]))
        .road(4, road(false, &[(0.0, 2.0), (0.0, 3.0)]))
        .joint(joint(&[(1, 2), (0, 0)]))
        .joint(joint(&[(1, 0), (2, 0), (3, 1)]))
        .joint(joint(&[(2, 2), (0, 2), (4, 0)]))
        .joint(joint(&[(4, 1)]))
        .joint(joint(&[(3, 0)]))
}

/// ```text
/// Finish
/// 3 *
///   ^
///  F11
/// 2 *<--F5---*<--F6---*
///   ^ ↖      ^ ↖      ^
///   |   F7   F1  F8   F2
/// 1 F0     ↖ *     ↖  *
///   |        ^ ↖      ^
///   |       F1   F9   F2
/// 0 *<--F4---*<--F3---*<--F10--* Start
///   0        1        2        3
/// ```
///
/// All roads are one-way; F1 and F2 have two segments.
pub(crate) fn two_squares_graph() -> IndexGraphBuilder {
    IndexGraphBuilder::new()
        .road(0, road(true, &[(0.0, 0.0), (0.0, 2.0)]))
        .road(1, road(true, &[(1.0, 0.0), (1.0, 1.0), (1.0, 2.0)]))
        .road(2, road(true, &[(2.0, 0.0), (2.0, 1.0), (2.0, 2.0)]))
        .road(3, road(true, &[(2.0, 0.0), (1.0, 0.0)]))
        .road(4, road(true, &[(1.0, 0.0), (0.0, 0.0)]))
        .road(5, road(true, &[(1.0, 2.0), (0.0, 2.0)]))
        .road(6, road(true, &[(2.0, 2.0), (1.0, 2.0)]))
        .road(7, road(true, &[(1.0, 1.0), (0.0, 2.0)]))
        .road(8, road(true, &[(2.0, 1.0), (1.0, 2.0)]))
        .road(9, road(true, &[(2.0, 0.0), (1.0, 1.0)]))
        .road(10, road(true, &[(3.0, 0.0), (2.0, 0.0)]))
        .road(11, road(true, &[(0.0, 2.0), (0.0, 3.0)]))
        .joint(joint(&[(4, 1), (0, 0)]))
        .joint(joint(&[(0, 1), (5, 1), (7, 1), (11, 0)]))
        .joint(joint(&[(4, 0), (1, 0), (3, 1)]))
        .joint(joint(&[(5, 0), (1, 2), (6, 1), (8, 1)]))
        .joint(joint(&[(3, 0), (2, 0), (9, 0), (10, 1)]))
        .joint(joint(&[(2, 2), (6, 0)]))
        .joint(joint(&[(1, 1), (9, 1), (7, 0)]))
        .joint(joint(&[(2, 1), (8, 0)]))
        .joint(joint(&[(10, 0)]))
        .joint(joint(&[(11, 1)]))
}

/// ```text
///               (2.5, 1)
///                ↗    ↘
///              F4      F4
///              /         ↘
/// 0 *--F1-->*--F2-->*--F3-->*--F3-->* Finish
///   0       1       2       3       4
/// Start
/// ```
///
/// All roads are one-way. F4 is a detour from the end of F2 to the middle of F3.
pub(crate) fn detour_graph() -> IndexGraphBuilder {
    IndexGraphBuilder::new()
        .road(1, road(true, &[(0.0, 0.0), (1.0, 0.0)]))
        .road(2, road(true, &[(1.0, 0.0), (2.0, 0.0)]))
        .road(3, road(true, &[(2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]))
        .road(4, road(true, &[(2.0, 0.0), (2.5, 1.0), (3.0, 0.0)]))
        .joint(joint(&[(1, 0)]))
        .joint(joint(&[(1, 1), (2, 0)]))
        .joint(joint(&[(2, 1), (3, 0), (4, 0)]))
        .joint(joint(&[(3, 1), (4, 2)]))
        .joint(joint(&[(3, 2)]))
}

/// Region `k` of [chain_world]: a one-way road along the x axis,
/// from `x = 3k - 3` to `x = 3k + 1` (or `x = 3k` in the last region).
pub(crate) fn chain_region(k: RegionId, regions: RegionId) -> IndexGraph {
    let first = 3.0 * k as f64 - 3.0;
    let count = if k == regions { 4 } else { 5 };
    let points: Vec<(f64, f64)> = (0..count).map(|i| (first + i as f64, 0.0)).collect();
    IndexGraphBuilder::new()
        .region(k)
        .road(0, road(true, &points))
        .joint(joint(&[(0, 0)]))
        .joint(joint(&[(0, count - 1)]))
        .build()
}

/// ```text
/// region 1          region 2          region 3
/// 0---1---2---3---4
///             3---4---5---6---7
///                         6---7---8---9
/// ```
///
/// Regions 1..=`regions` hold consecutive pieces of a single one-way road.
/// The last segment of every region but the last one is an exit,
/// and its twin is the first segment of the next region. Leaps cross
/// every region from its enter to its exit.
pub(crate) fn chain_world(regions: RegionId) -> (PrebuiltGraphs, TransitionTable) {
    let graphs = (1..=regions).map(|k| chain_region(k, regions)).collect();
    let mut transitions = TransitionTable::new();
    for k in 1..regions {
        transitions.add_transition(
            Segment::new(k, 0, 3, true),
            Segment::new(k + 1, 0, 0, true),
            xy(3.0 * k as f64 + 0.5, 0.0),
        );
        if k > 1 {
            transitions.add_leap(
                Segment::new(k, 0, 0, true),
                Segment::new(k, 0, 3, true),
                RouteWeight::new(3.0),
            );
        }
    }
    (graphs, transitions)
}

/// Directed graph over integer vertices with explicit edges, for engine tests.
///
/// Vertices placed with coordinates (like the ones of [VecGraph::grid]) use the
/// euclidean distance as the heuristic; others use zero.
#[derive(Debug, Default, Clone)]
pub(crate) struct VecGraph {
    outgoing: HashMap<u32, Vec<(u32, f64)>>,
    ingoing: HashMap<u32, Vec<(u32, f64)>>,
    coords: HashMap<u32, (f64, f64)>,
    potentials: HashMap<u32, f64>,

    /// Number of vertices whose edges were enumerated.
    pub(crate) expanded: usize,
}

impl VecGraph {
    pub(crate) fn add_edge(&mut self, from: u32, to: u32, weight: f64) {
        self.outgoing.entry(from).or_default().push((to, weight));
        self.ingoing.entry(to).or_default().push((from, weight));
    }

    /// `0 -> 1 -> .. -> n-1`, with unit weights.
    pub(crate) fn chain(n: u32) -> Self {
        let mut g = Self::default();
        for i in 1..n {
            g.add_edge(i - 1, i, 1.0);
        }
        g
    }

    /// `w`×`h` grid with unit edges in both directions; vertex `i` lies at `(i % w, i / w)`.
    pub(crate) fn grid(w: u32, h: u32) -> Self {
        let mut g = Self::default();
        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                g.coords.insert(i, (x as f64, y as f64));
                if x + 1 < w {
                    g.add_edge(i, i + 1, 1.0);
                    g.add_edge(i + 1, i, 1.0);
                }
                if y + 1 < h {
                    g.add_edge(i, i + w, 1.0);
                    g.add_edge(i + w, i, 1.0);
                }
            }
        }
        g
    }

    /// Overrides the heuristic estimate from `v` to any vertex.
    pub(crate) fn set_potential(&mut self, v: u32, potential: f64) {
        self.potentials.insert(v, potential);
    }

    /// Weight of the cheapest edge `from -> to`.
    pub(crate) fn weight(&self, from: u32, to: u32) -> RouteWeight {
        self.outgoing
            .get(&from)
            .into_iter()
            .flatten()
            .filter(|&&(t, _)| t == to)
            .map(|&(_, w)| RouteWeight::new(w))
            .min()
            .unwrap_or_else(|| panic!("no edge {} -> {}", from, to))
    }

    fn edges(
        map: &HashMap<u32, Vec<(u32, f64)>>,
        v: u32,
        edges: &mut Vec<Edge<u32, RouteWeight>>,
    ) {
        if let Some(list) = map.get(&v) {
            edges.extend(list.iter().map(|&(t, w)| Edge::new(t, RouteWeight::new(w))));
        }
    }
}

impl AStarGraph for VecGraph {
    type Vertex = u32;
    type Weight = RouteWeight;

    fn heuristic_cost_estimate(&mut self, from: &u32, to: &u32) -> RouteWeight {
        if let Some(&p) = self.potentials.get(from) {
            return RouteWeight::new(p);
        }
        match (self.coords.get(from), self.coords.get(to)) {
            (Some(&(x1, y1)), Some(&(x2, y2))) => RouteWeight::new((x1 - x2).hypot(y1 - y2)),
            _ => RouteWeight::ZERO,
        }
    }

    fn outgoing_edges(
        &mut self,
        data: &VertexData<'_, u32, RouteWeight>,
        edges: &mut Vec<Edge<u32, RouteWeight>>,
    ) {
        self.expanded += 1;
        Self::edges(&self.outgoing, data.vertex, edges);
    }

    fn ingoing_edges(
        &mut self,
        data: &VertexData<'_, u32, RouteWeight>,
        edges: &mut Vec<Edge<u32, RouteWeight>>,
    ) {
        self.expanded += 1;
        Self::edges(&self.ingoing, data.vertex, edges);
    }
}
