// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::astar::{AStarGraph, Edge, Parents, VertexData};
use crate::border::CrossBorderPenalty;
use crate::cross_region::CrossRegionGraph;
use crate::distance::LatLon;
use crate::estimator::EdgeEstimator;
use crate::index_graph::{EdgeContext, Expansion, IndexGraph, JointEdge};
use crate::joint::JointSegment;
use crate::joints_starter::SegmentGraph;
use crate::regions::RegionGraphSource;
use crate::restrictions::{Locator, RestrictionVertex};
use crate::{RegionId, RouteWeight, Segment, SegmentEdge};

/// How the [WorldGraph] connects regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorldGraphMode {
    /// Regions are crossed with leaps only; no road graph is loaded.
    LeapsOnly,

    /// Regions containing the start or the finish are searched over roads,
    /// other regions are crossed with leaps.
    LeapsIfPossible,

    /// All regions are searched over roads.
    #[default]
    NoLeaps,

    /// Searches never leave the region they start in.
    SingleMwm,

    /// Like [WorldGraphMode::NoLeaps], for searches over [JointSegments](JointSegment).
    Joints,
}

/// Road graph spanning all regions, loaded lazily.
///
/// Vertices are real [Segments](Segment) of any region. Within a region edges come
/// from its [IndexGraph]; exits are connected with their twins in neighboring regions.
/// Depending on the [mode](WorldGraphMode), regions may instead be crossed with leaps.
pub struct WorldGraph {
    source: Arc<dyn RegionGraphSource>,
    loaded: HashMap<RegionId, Option<Arc<IndexGraph>>>,
    cross: Arc<dyn CrossRegionGraph>,
    border: Option<Arc<CrossBorderPenalty>>,
    estimator: Arc<EdgeEstimator>,
    ctx: EdgeContext,
    mode: WorldGraphMode,
    local_regions: BTreeSet<RegionId>,
    twins: Vec<Segment>,
}

impl WorldGraph {
    pub fn new(
        source: Arc<dyn RegionGraphSource>,
        cross: Arc<dyn CrossRegionGraph>,
        estimator: Arc<EdgeEstimator>,
    ) -> Self {
        Self {
            source,
            loaded: HashMap::default(),
            cross,
            border: None,
            estimator,
            ctx: EdgeContext::default(),
            mode: WorldGraphMode::default(),
            local_regions: BTreeSet::default(),
            twins: Vec::default(),
        }
    }

    pub fn with_border_penalty(mut self, border: Arc<CrossBorderPenalty>) -> Self {
        self.border = Some(border);
        self
    }

    pub fn mode(&self) -> WorldGraphMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: WorldGraphMode) {
        self.mode = mode;
    }

    pub fn context(&self) -> &EdgeContext {
        &self.ctx
    }

    pub fn set_context(&mut self, ctx: EdgeContext) {
        self.ctx = ctx;
    }

    /// Sets regions searched over roads in [WorldGraphMode::LeapsIfPossible].
    pub fn set_local_regions<I: IntoIterator<Item = RegionId>>(&mut self, regions: I) {
        self.local_regions = regions.into_iter().collect();
    }

    pub fn estimator(&self) -> &EdgeEstimator {
        &self.estimator
    }

    pub fn cross_region(&self) -> &dyn CrossRegionGraph {
        self.cross.as_ref()
    }

    pub fn source(&self) -> &dyn RegionGraphSource {
        self.source.as_ref()
    }

    /// Returns the road graph of a region, loading it on first use.
    /// Regions which failed to load are remembered and yield `None`.
    pub fn region_graph(&mut self, region: RegionId) -> Option<Arc<IndexGraph>> {
        if let Some(graph) = self.loaded.get(&region) {
            return graph.clone();
        }

        let graph = match self.source.load(region) {
            Ok(graph) => {
                log::debug!("loaded road graph of region {}", region);
                Some(graph)
            }
            Err(e) => {
                log::warn!("road graph of region {} is unavailable: {}", region, e);
                None
            }
        };
        self.loaded.insert(region, graph.clone());
        graph
    }

    /// Drops all loaded region graphs.
    pub fn clear_cached_graphs(&mut self) {
        self.loaded.clear();
    }

    fn uses_leaps(&self, region: RegionId) -> bool {
        match self.mode {
            WorldGraphMode::LeapsOnly => true,
            WorldGraphMode::LeapsIfPossible => !self.local_regions.contains(&region),
            _ => false,
        }
    }

    /// Position of the head (`front == true`) or the tail of a real segment.
    ///
    /// Transitions of regions crossed with leaps are placed at their border point.
    /// Panics if the region of the segment can't be loaded and the segment isn't
    /// a transition.
    pub fn point(&mut self, segment: &Segment, front: bool) -> LatLon {
        if self.uses_leaps(segment.region_id()) {
            if let Some(p) = self.cross.transition_point(segment) {
                return p;
            }
        }

        match self.region_graph(segment.region_id()) {
            Some(graph) => graph.point(segment, front),
            None => self.cross.transition_point(segment).unwrap_or_else(|| {
                panic!("position of {} requested from an unavailable region", segment)
            }),
        }
    }

    pub fn segment_weight(&mut self, segment: &Segment) -> RouteWeight {
        self.region_graph(segment.region_id())
            .map(|g| g.calc_segment_weight(segment))
            .unwrap_or(RouteWeight::ZERO)
    }

    pub fn is_joint(&mut self, segment: &Segment, front: bool) -> bool {
        self.region_graph(segment.region_id())
            .map_or(true, |g| g.is_joint(segment, front))
    }

    /// Penalty of moving from region `a` into region `b`.
    pub fn border_penalty(&self, a: RegionId, b: RegionId) -> RouteWeight {
        match self.border {
            Some(ref border) if a != b => border.penalty(a, b),
            _ => RouteWeight::ZERO,
        }
    }

    /// Appends edges leaving (or entering) `segment` to `edges`,
    /// see [IndexGraph::get_edge_list].
    pub fn get_edge_list<V: RestrictionVertex>(
        &mut self,
        at: &Expansion<'_, V>,
        segment: &Segment,
        edges: &mut Vec<SegmentEdge>,
    ) {
        let is_outgoing = at.is_outgoing;
        let region = segment.region_id();
        if self.uses_leaps(region) {
            if self.cross.is_transition(segment, is_outgoing) {
                self.add_twin_edges(segment, is_outgoing, edges);
            } else {
                self.cross.leap_edges(segment, is_outgoing, edges);
            }
            return;
        }

        if let Some(graph) = self.region_graph(region) {
            graph.get_edge_list(&self.ctx, at, segment, edges);
        }

        if self.mode != WorldGraphMode::SingleMwm {
            self.add_twin_edges(segment, is_outgoing, edges);
        }
    }

    fn add_twin_edges(&mut self, segment: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>) {
        self.twins.clear();
        self.cross.twins(segment, is_outgoing, &mut self.twins);
        for i in 0..self.twins.len() {
            let twin = self.twins[i];
            let penalty = self.border_penalty(segment.region_id(), twin.region_id());
            edges.push(Edge::new(twin, penalty));
        }
    }

    /// Appends edges of the compressed graph leaving (or entering) `segment` to `edges`,
    /// see [IndexGraph::joint_edges].
    ///
    /// Crossing into a neighboring region leads to the joint segment starting
    /// (or ending) with the twin. The twin's own weight is reported as
    /// [JointEdge::shared], as it was already traveled as the exit.
    pub fn joint_edges(
        &mut self,
        at: &Expansion<'_, JointSegment>,
        segment: &Segment,
        edges: &mut Vec<JointEdge>,
    ) {
        let is_outgoing = at.is_outgoing;
        if let Some(graph) = self.region_graph(segment.region_id()) {
            graph.joint_edges(&self.ctx, at, segment, edges);
        }

        if self.mode == WorldGraphMode::SingleMwm {
            return;
        }

        self.twins.clear();
        self.cross.twins(segment, is_outgoing, &mut self.twins);
        for i in 0..self.twins.len() {
            let twin = self.twins[i];
            let Some(graph) = self.region_graph(twin.region_id()) else {
                continue;
            };
            let (target, weight) = graph.extend_to_joint(&twin, is_outgoing);
            let entered = if is_outgoing { twin } else { *segment };
            edges.push(JointEdge {
                target,
                penalty: self.border_penalty(segment.region_id(), twin.region_id()),
                weight,
                shared: self.segment_weight(&entered),
            });
        }
    }

    /// Checks restrictions over the point where bidirectional waves meet.
    pub fn are_waves_connectible<V: RestrictionVertex>(
        &mut self,
        forward_parents: &Parents<V>,
        common: &V,
        backward_parents: &Parents<V>,
        locator: Locator<'_, V>,
    ) -> bool {
        let Some(real) = locator.real_segment(common) else {
            return true;
        };
        self.region_graph(real.region_id()).map_or(true, |g| {
            g.are_waves_connectible(forward_parents, common, backward_parents, locator)
        })
    }
}

impl fmt::Debug for WorldGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldGraph")
            .field("mode", &self.mode)
            .field("loaded", &self.loaded.len())
            .field("local_regions", &self.local_regions)
            .finish_non_exhaustive()
    }
}

impl AStarGraph for WorldGraph {
    type Vertex = Segment;
    type Weight = RouteWeight;

    fn heuristic_cost_estimate(&mut self, from: &Segment, to: &Segment) -> RouteWeight {
        let from = self.point(from, true);
        let to = self.point(to, true);
        self.estimator.calc_heuristic(from, to)
    }

    fn outgoing_edges(
        &mut self,
        data: &VertexData<'_, Segment, RouteWeight>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        let at = Expansion::new(&data.vertex, data.real_distance, true, data.parents);
        self.get_edge_list(&at, &data.vertex, edges);
    }

    fn ingoing_edges(
        &mut self,
        data: &VertexData<'_, Segment, RouteWeight>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        let at = Expansion::new(&data.vertex, data.real_distance, false, data.parents);
        self.get_edge_list(&at, &data.vertex, edges);
    }

    fn are_waves_connectible(
        &mut self,
        forward_parents: &Parents<Segment>,
        common: &Segment,
        backward_parents: &Parents<Segment>,
    ) -> bool {
        WorldGraph::are_waves_connectible(
            self,
            forward_parents,
            common,
            backward_parents,
            Locator::default(),
        )
    }
}

impl SegmentGraph for WorldGraph {
    fn point(&mut self, segment: &Segment, front: bool) -> LatLon {
        WorldGraph::point(self, segment, front)
    }

    fn segment_weight(&mut self, segment: &Segment) -> RouteWeight {
        WorldGraph::segment_weight(self, segment)
    }

    fn is_joint(&mut self, segment: &Segment, front: bool) -> bool {
        WorldGraph::is_joint(self, segment, front)
    }

    fn convert_to_real(&self, segment: &Segment) -> Option<Segment> {
        segment.is_real().then_some(*segment)
    }

    fn segment_edges(&mut self, segment: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>) {
        let parents = Parents::default();
        let at = Expansion::new(segment, RouteWeight::ZERO, is_outgoing, &parents);
        self.get_edge_list(&at, segment, edges);
    }

    fn joint_edges(
        &mut self,
        at: &Expansion<'_, JointSegment>,
        segment: &Segment,
        edges: &mut Vec<JointEdge>,
    ) {
        WorldGraph::joint_edges(self, at, segment, edges);
    }

    fn heuristic(&mut self, from: LatLon, to: LatLon) -> RouteWeight {
        self.estimator.calc_heuristic(from, to)
    }

    fn are_waves_connectible(
        &mut self,
        forward_parents: &Parents<JointSegment>,
        common: &JointSegment,
        backward_parents: &Parents<JointSegment>,
        locator: Locator<'_, JointSegment>,
    ) -> bool {
        WorldGraph::are_waves_connectible(self, forward_parents, common, backward_parents, locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::{find_path, find_path_bidirectional, Params};
    use crate::border::DEFAULT_BORDER_RULES;
    use crate::regions::PrebuiltGraphs;
    use crate::test_support::{chain_region, chain_world, unit_estimator, xy};

    fn world(regions: RegionId) -> WorldGraph {
        let (graphs, transitions) = chain_world(regions);
        WorldGraph::new(Arc::new(graphs), Arc::new(transitions), unit_estimator())
    }

    fn edges_of(g: &mut WorldGraph, s: Segment, is_outgoing: bool) -> Vec<SegmentEdge> {
        let mut edges = Vec::new();
        let parents = Parents::default();
        g.get_edge_list(&Expansion::new(&s, RouteWeight::ZERO, is_outgoing, &parents), &s, &mut edges);
        edges
    }

    #[test]
    fn exits_lead_to_twins() {
        let mut g = world(2);
        let exit = Segment::new(1, 0, 3, true);
        let enter = Segment::new(2, 0, 0, true);

        assert_eq!(edges_of(&mut g, exit, true), vec![Edge::new(enter, RouteWeight::ZERO)]);
        assert_eq!(edges_of(&mut g, enter, false), vec![Edge::new(exit, RouteWeight::ZERO)]);

        g.set_mode(WorldGraphMode::SingleMwm);
        assert!(edges_of(&mut g, exit, true).is_empty());
    }

    #[test]
    fn twins_carry_the_border_penalty() {
        let names = [(1, "Alpha".to_string()), (2, "Beta".to_string())].into_iter().collect();
        let hierarchy: HashMap<String, String> = [("Alpha", "Countries"), ("Beta", "Countries")]
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        let border = CrossBorderPenalty::new(DEFAULT_BORDER_RULES, names, hierarchy);
        let mut g = world(2).with_border_penalty(Arc::new(border));

        assert_eq!(
            edges_of(&mut g, Segment::new(1, 0, 3, true), true),
            vec![Edge::new(Segment::new(2, 0, 0, true), RouteWeight::new(7200.0))],
        );
    }

    #[test]
    fn leaps_cross_remote_regions() {
        let mut g = world(3);
        g.set_mode(WorldGraphMode::LeapsIfPossible);
        g.set_local_regions([1]);

        let enter = Segment::new(2, 0, 0, true);
        let exit = Segment::new(2, 0, 3, true);
        assert_eq!(edges_of(&mut g, enter, true), vec![Edge::new(exit, RouteWeight::new(3.0))]);
        assert_eq!(
            edges_of(&mut g, exit, true),
            vec![Edge::new(Segment::new(3, 0, 0, true), RouteWeight::ZERO)],
        );
        assert_eq!(g.point(&exit, true), xy(6.5, 0.0));

        // Local regions still expose their roads
        assert_eq!(
            edges_of(&mut g, Segment::new(1, 0, 0, true), true),
            vec![Edge::new(Segment::new(1, 0, 1, true), RouteWeight::new(1.0))],
        );
    }

    #[test]
    fn unavailable_regions_have_no_edges() {
        let (_, transitions) = chain_world(2);
        let graphs: PrebuiltGraphs = [chain_region(1, 2)].into_iter().collect();
        let mut g = WorldGraph::new(Arc::new(graphs), Arc::new(transitions), unit_estimator());

        let enter = Segment::new(2, 0, 0, true);
        assert!(edges_of(&mut g, enter, true).is_empty());
        assert_eq!(g.point(&enter, true), xy(3.5, 0.0));
    }

    #[test]
    fn searches_cross_regions() {
        let mut g = world(3);
        let start = Segment::new(1, 0, 0, true);
        let finish = Segment::new(3, 0, 2, true);

        let expected = vec![
            Segment::new(1, 0, 0, true),
            Segment::new(1, 0, 1, true),
            Segment::new(1, 0, 2, true),
            Segment::new(1, 0, 3, true),
            Segment::new(2, 0, 0, true),
            Segment::new(2, 0, 1, true),
            Segment::new(2, 0, 2, true),
            Segment::new(2, 0, 3, true),
            Segment::new(3, 0, 0, true),
            Segment::new(3, 0, 1, true),
            Segment::new(3, 0, 2, true),
        ];

        let r = find_path(Params::new(&mut g, start, finish)).expect("route must exist");
        assert_eq!(r.path, expected);
        assert_eq!(r.distance, RouteWeight::new(8.0));

        let r = find_path_bidirectional(Params::new(&mut g, start, finish)).expect("route must exist");
        assert_eq!(r.path, expected);
        assert_eq!(r.distance, RouteWeight::new(8.0));
    }

    #[test]
    fn joint_edges_cross_into_twins() {
        let mut g = world(2);
        let exit = Segment::new(1, 0, 3, true);
        let vertex = JointSegment::new(&exit, &exit);
        let parents = Parents::default();
        let mut edges = Vec::new();
        let at = Expansion::new(&vertex, RouteWeight::ZERO, true, &parents);
        g.joint_edges(&at, &exit, &mut edges);

        assert_eq!(
            edges,
            vec![JointEdge {
                target: JointSegment::new(&Segment::new(2, 0, 0, true), &Segment::new(2, 0, 2, true)),
                penalty: RouteWeight::ZERO,
                weight: RouteWeight::new(3.0),
                shared: RouteWeight::new(1.0),
            }],
        );

        let enter = Segment::new(2, 0, 0, true);
        let vertex = JointSegment::new(&enter, &Segment::new(2, 0, 2, true));
        edges.clear();
        let at = Expansion::new(&vertex, RouteWeight::ZERO, false, &parents);
        g.joint_edges(&at, &enter, &mut edges);
        assert_eq!(
            edges,
            vec![JointEdge {
                target: JointSegment::new(&Segment::new(1, 0, 0, true), &exit),
                penalty: RouteWeight::ZERO,
                weight: RouteWeight::new(4.0),
                shared: RouteWeight::new(1.0),
            }],
        );
    }
}
