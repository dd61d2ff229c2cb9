// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::astar::{AStarGraph, Edge, Parents, VertexData};
use crate::index_graph::Expansion;
use crate::starter::{IndexGraphStarter, FINISH_SEGMENT, START_SEGMENT};
use crate::world_graph::WorldGraphMode;
use crate::{RouteWeight, Segment, SegmentEdge};

/// Coarse search graph crossing whole regions at once.
///
/// The start connects to the exits of the regions it was snapped in, and the
/// enters of the finish regions connect to the finish, both weighted with
/// [EdgeEstimator::calc_leap_weight](crate::EdgeEstimator::calc_leap_weight).
/// Other edges come from the world graph in [WorldGraphMode::LeapsOnly]:
/// exits lead to their twins, enters lead to exits of their region.
///
/// Paths found over this graph have to be refined into actual roads,
/// see [Router](crate::Router).
#[derive(Debug)]
pub struct LeapsGraph<'s, 'w> {
    starter: &'s mut IndexGraphStarter<'w>,
}

impl<'s, 'w> LeapsGraph<'s, 'w> {
    pub fn new(starter: &'s mut IndexGraphStarter<'w>) -> Self {
        starter.graph().set_mode(WorldGraphMode::LeapsOnly);
        Self { starter }
    }

    pub fn starter(&mut self) -> &mut IndexGraphStarter<'w> {
        &mut *self.starter
    }

    fn leap(&mut self, from: &Segment, to: &Segment) -> RouteWeight {
        let from = self.starter.point(from, true);
        let to = self.starter.point(to, true);
        self.starter.graph().estimator().calc_leap_weight(from, to)
    }

    fn ending_transitions(&mut self, is_start: bool) -> Vec<Segment> {
        let regions = if is_start {
            self.starter.start_regions().clone()
        } else {
            self.starter.finish_regions().clone()
        };
        let cross = self.starter.graph().cross_region();
        regions
            .into_iter()
            .flat_map(|region| cross.transitions(region, !is_start))
            .collect()
    }

    fn get_edge_list(
        &mut self,
        data: &VertexData<'_, Segment, RouteWeight>,
        is_outgoing: bool,
        edges: &mut Vec<SegmentEdge>,
    ) {
        let segment = data.vertex;

        if segment == START_SEGMENT || segment == FINISH_SEGMENT {
            if is_outgoing == (segment == START_SEGMENT) {
                for transition in self.ending_transitions(is_outgoing) {
                    let weight = if is_outgoing {
                        self.leap(&START_SEGMENT, &transition)
                    } else {
                        self.leap(&transition, &FINISH_SEGMENT)
                    };
                    edges.push(Edge::new(transition, weight));
                }
            }
            return;
        }

        // Enters of finish regions lead to the finish, exits of start regions
        // are reached from the start.
        let region = segment.region_id();
        let cross_to_ending = if is_outgoing {
            self.starter.finish_regions().contains(&region)
                && self.starter.graph().cross_region().is_transition(&segment, false)
        } else {
            self.starter.start_regions().contains(&region)
                && self.starter.graph().cross_region().is_transition(&segment, true)
        };
        if cross_to_ending {
            let (target, weight) = if is_outgoing {
                (FINISH_SEGMENT, self.leap(&segment, &FINISH_SEGMENT))
            } else {
                (START_SEGMENT, self.leap(&START_SEGMENT, &segment))
            };
            edges.push(Edge::new(target, weight));
        }

        let at = Expansion::new(&segment, data.real_distance, is_outgoing, data.parents);
        self.starter.graph().get_edge_list(&at, &segment, edges);
    }
}

impl AStarGraph for LeapsGraph<'_, '_> {
    type Vertex = Segment;
    type Weight = RouteWeight;

    fn heuristic_cost_estimate(&mut self, from: &Segment, to: &Segment) -> RouteWeight {
        self.starter.heuristic_cost_estimate(from, to)
    }

    fn outgoing_edges(
        &mut self,
        data: &VertexData<'_, Segment, RouteWeight>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        self.get_edge_list(data, true, edges);
    }

    fn ingoing_edges(
        &mut self,
        data: &VertexData<'_, Segment, RouteWeight>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        self.get_edge_list(data, false, edges);
    }

    fn are_waves_connectible(
        &mut self,
        _forward_parents: &Parents<Segment>,
        _common: &Segment,
        _backward_parents: &Parents<Segment>,
    ) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::astar::{find_path, find_path_bidirectional, Params};
    use crate::fake_ending::FakeEnding;
    use crate::test_support::{chain_world, unit_estimator, xy};
    use crate::world_graph::WorldGraph;
    use crate::RegionId;

    fn chain(regions: RegionId) -> WorldGraph {
        let (graphs, transitions) = chain_world(regions);
        WorldGraph::new(Arc::new(graphs), Arc::new(transitions), unit_estimator())
    }

    fn ending(world: &mut WorldGraph, segment: Segment, x: f64) -> FakeEnding {
        let graph = world
            .region_graph(segment.region_id())
            .expect("test region must load");
        FakeEnding::on_segment(&graph, segment, xy(x, 0.0))
    }

    #[test]
    fn leaps_cross_the_middle_region() {
        for bidirectional in [false, true] {
            let mut world = chain(3);
            let start = ending(&mut world, Segment::new(1, 0, 0, true), 0.0);
            let finish = ending(&mut world, Segment::new(3, 0, 2, true), 9.0);
            let mut starter = IndexGraphStarter::new(&mut world, &start, &finish);
            let mut leaps = LeapsGraph::new(&mut starter);

            let params = Params::new(&mut leaps, START_SEGMENT, FINISH_SEGMENT);
            let r = if bidirectional {
                find_path_bidirectional(params)
            } else {
                find_path(params)
            }
            .expect("route must exist");

            assert_eq!(
                r.path,
                vec![
                    START_SEGMENT,
                    Segment::new(1, 0, 3, true),
                    Segment::new(2, 0, 0, true),
                    Segment::new(2, 0, 3, true),
                    Segment::new(3, 0, 0, true),
                    FINISH_SEGMENT,
                ],
            );

            // 3.5 to the first border, a 3 second leap, 2.5 from the second border
            assert!(r.distance.almost_eq(RouteWeight::new(9.0), RouteWeight::new(1e-6)));
        }
    }

    #[test]
    fn leaps_switch_the_world_graph_mode() {
        let mut world = chain(3);
        let start = ending(&mut world, Segment::new(1, 0, 0, true), 0.0);
        let finish = ending(&mut world, Segment::new(3, 0, 2, true), 9.0);
        let mut starter = IndexGraphStarter::new(&mut world, &start, &finish);
        let mut leaps = LeapsGraph::new(&mut starter);
        assert_eq!(leaps.starter().graph().mode(), WorldGraphMode::LeapsOnly);
    }
}
