// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap, HashSet};

use super::queue::{clamp_reduced, reconstruct_path, QueueItem};
use super::{
    AStarError, AStarGraph, Edge, Params, Parents, RoutingResult, VertexData, POLL_PERIOD,
};
use crate::Weight;

/// State of one of the two search waves.
struct Wave<G: AStarGraph> {
    forward: bool,
    start: G::Vertex,
    finish: G::Vertex,
    origin_potential: G::Weight,
    queue: BinaryHeap<QueueItem<G::Vertex, G::Weight>>,
    distances: HashMap<G::Vertex, G::Weight>,
    parents: Parents<G::Vertex>,
}

impl<G: AStarGraph> Wave<G> {
    fn new(graph: &mut G, forward: bool, start: G::Vertex, finish: G::Vertex) -> Self {
        let mut wave = Self {
            forward,
            start,
            finish,
            origin_potential: G::Weight::zero(),
            queue: BinaryHeap::default(),
            distances: HashMap::default(),
            parents: Parents::default(),
        };

        let origin = wave.origin();
        wave.origin_potential = wave.potential(graph, &origin);
        wave.distances.insert(origin, G::Weight::zero());
        wave.queue.push(QueueItem {
            vertex: origin,
            distance: G::Weight::zero(),
        });
        wave
    }

    #[inline]
    fn origin(&self) -> G::Vertex {
        if self.forward {
            self.start
        } else {
            self.finish
        }
    }

    #[inline]
    fn target(&self) -> G::Vertex {
        if self.forward {
            self.finish
        } else {
            self.start
        }
    }

    /// Consistent potential of a vertex: `p_f(v) = (π_f(v) - π_r(v)) / 2` for the
    /// forward wave and `p_r(v) = -p_f(v)` for the backward one, so that
    /// `p_f(v) + p_r(v)` is constant.
    fn potential(&self, graph: &mut G, v: &G::Vertex) -> G::Weight {
        let to_finish = graph.heuristic_cost_estimate(v, &self.finish);
        let to_start = graph.heuristic_cost_estimate(v, &self.start);
        if self.forward {
            (to_finish - to_start).scale(0.5)
        } else {
            (to_start - to_finish).scale(0.5)
        }
    }

    /// Returns the best known reduced distance of the vertex on top of the queue.
    fn top_distance(&self) -> Option<G::Weight> {
        self.queue
            .peek()
            .and_then(|item| self.distances.get(&item.vertex).copied())
    }

    fn is_stale(&self, item: &QueueItem<G::Vertex, G::Weight>) -> bool {
        self.distances
            .get(&item.vertex)
            .is_some_and(|&known| item.distance > known)
    }

    fn collect_edges(
        &self,
        graph: &mut G,
        vertex: G::Vertex,
        real_distance: G::Weight,
        edges: &mut Vec<Edge<G::Vertex, G::Weight>>,
    ) {
        edges.clear();
        let data = VertexData::new(vertex, real_distance, &self.parents);
        if self.forward {
            graph.outgoing_edges(&data, edges);
        } else {
            graph.ingoing_edges(&data, edges);
        }
    }
}

/// Best meeting point found so far.
#[derive(Debug, Clone, Copy)]
struct Candidate<V, W> {
    reduced_length: W,
    real_length: W,
    forward_vertex: V,
    backward_vertex: V,
}

/// Finds the cheapest path from `params.start` to `params.finish` with two
/// A* waves, one growing forward from the start and one growing backward from the finish.
///
/// Returns the same weight as [find_path](super::find_path) (up to the graph's epsilon),
/// but usually visits considerably fewer vertices.
pub fn find_path_bidirectional<G: AStarGraph>(
    params: Params<'_, G>,
) -> Result<RoutingResult<G::Vertex, G::Weight>, AStarError> {
    find_path_bidirectional_ex(params, |_| true)
}

/// Bidirectional search passing each final candidate to `emitter`.
///
/// If the emitter returns `false` the candidate is rejected: its meeting pair
/// is never considered again and the search continues for the next-best
/// candidate. When both waves are exhausted, the best remaining candidate (if any)
/// is returned without asking the emitter.
pub fn find_path_bidirectional_ex<G, E>(
    mut params: Params<'_, G>,
    mut emitter: E,
) -> Result<RoutingResult<G::Vertex, G::Weight>, AStarError>
where
    G: AStarGraph,
    E: FnMut(&RoutingResult<G::Vertex, G::Weight>) -> bool,
{
    let start = params.start;
    let finish = params.finish;

    if start == finish {
        return Ok(RoutingResult {
            path: vec![start],
            distance: G::Weight::zero(),
        });
    }

    let epsilon = params.graph.weight_epsilon();
    let mut waves = [
        Wave::new(params.graph, true, start, finish),
        Wave::new(params.graph, false, start, finish),
    ];
    let mut current: usize = 0;

    let mut best: Option<Candidate<G::Vertex, G::Weight>> = None;
    let mut rejected: HashSet<(G::Vertex, G::Vertex)> = HashSet::default();
    let mut edges = Vec::default();
    let mut steps: usize = 0;

    // Once one of the queues runs empty without a candidate, no path will ever be found.
    while waves.iter().all(|w| !w.queue.is_empty()) {
        if steps % POLL_PERIOD == 0 && params.cancellable.is_cancelled() {
            log::debug!("find_path_bidirectional cancelled after {} steps", steps);
            return Err(AStarError::Cancelled);
        }
        steps += 1;
        if steps % POLL_PERIOD == 0 {
            current = 1 - current;
        }

        let [forward, backward] = &mut waves;
        let (cur, nxt) = if current == 0 {
            (forward, backward)
        } else {
            (backward, forward)
        };

        if let Some(candidate) = best {
            let tops = cur.top_distance().zip(nxt.top_distance());
            if tops.is_some_and(|(a, b)| a + b >= candidate.reduced_length - epsilon) {
                let result = assemble_result(cur, nxt, &candidate);
                if emitter(&result) {
                    log::debug!(
                        "find_path_bidirectional finished after {} steps, distance {:?}",
                        steps,
                        result.distance,
                    );
                    return Ok(result);
                }

                rejected.insert((candidate.forward_vertex, candidate.backward_vertex));
                best = None;
            }
        }

        let Some(item) = cur.queue.pop() else {
            continue;
        };

        if cur.is_stale(&item) {
            continue;
        }

        let target = cur.target();
        if !params.visit(&item.vertex, &target) {
            log::debug!(
                "find_path_bidirectional stopped by the visitor after {} steps",
                steps
            );
            return Err(AStarError::NoPath);
        }

        let potential = cur.potential(params.graph, &item.vertex);
        let real_distance = item.distance + cur.origin_potential - potential;
        cur.collect_edges(params.graph, item.vertex, real_distance, &mut edges);

        for edge in edges.drain(..) {
            if edge.target == item.vertex {
                continue;
            }

            let target_potential = cur.potential(params.graph, &edge.target);
            let reduced = clamp_reduced(
                &item.vertex,
                &edge.target,
                edge.weight + target_potential - potential,
                epsilon,
            );
            let new_distance = item.distance + reduced;

            if !params.length_ok(real_distance + edge.weight) {
                continue;
            }

            if cur
                .distances
                .get(&edge.target)
                .is_some_and(|&known| new_distance > known - epsilon)
            {
                continue;
            }

            cur.distances.insert(edge.target, new_distance);
            cur.parents.insert(edge.target, item.vertex);

            if let Some(&other_distance) = nxt.distances.get(&edge.target) {
                let reduced_length = new_distance + other_distance;
                let (forward_vertex, backward_vertex) = if cur.forward {
                    (item.vertex, edge.target)
                } else {
                    (edge.target, item.vertex)
                };

                // No epsilon here: it is ok to overshoot slightly.
                let improves = best.map_or(true, |b| b.reduced_length > reduced_length);
                if improves && !rejected.contains(&(forward_vertex, backward_vertex)) {
                    let (forward_parents, backward_parents) = if cur.forward {
                        (&cur.parents, &nxt.parents)
                    } else {
                        (&nxt.parents, &cur.parents)
                    };

                    if params.graph.are_waves_connectible(
                        forward_parents,
                        &edge.target,
                        backward_parents,
                    ) {
                        let other_potential = nxt.potential(params.graph, &edge.target);
                        let real_length = real_distance
                            + edge.weight
                            + other_distance
                            + (nxt.origin_potential - other_potential);

                        best = Some(Candidate {
                            reduced_length,
                            real_length,
                            forward_vertex,
                            backward_vertex,
                        });
                    }
                }
            }

            if edge.target != target {
                cur.queue.push(QueueItem {
                    vertex: edge.target,
                    distance: new_distance,
                });
            }
        }
    }

    match best {
        Some(candidate) => {
            let [forward, backward] = &waves;
            let result = assemble_result(forward, backward, &candidate);
            emitter(&result);
            log::debug!(
                "find_path_bidirectional exhausted a wave after {} steps, distance {:?}",
                steps,
                result.distance,
            );
            Ok(result)
        }
        None => {
            log::debug!("find_path_bidirectional found no path after {} steps", steps);
            Err(AStarError::NoPath)
        }
    }
}

/// Joins the forward path (start to the forward meeting vertex) with the
/// reversed backward path (backward meeting vertex to finish).
fn assemble_result<G: AStarGraph>(
    a: &Wave<G>,
    b: &Wave<G>,
    candidate: &Candidate<G::Vertex, G::Weight>,
) -> RoutingResult<G::Vertex, G::Weight> {
    let (forward, backward) = if a.forward { (a, b) } else { (b, a) };

    let mut path = reconstruct_path(&forward.parents, forward.start, candidate.forward_vertex);
    let mut tail = reconstruct_path(&backward.parents, backward.finish, candidate.backward_vertex);
    tail.reverse();
    path.extend(tail);

    RoutingResult {
        path,
        distance: candidate.real_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::{find_path, Cancellable};
    use crate::test_support::VecGraph;
    use crate::RouteWeight;
    use proptest::prelude::*;

    #[test]
    fn linear_chain() {
        let mut g = VecGraph::chain(5);
        let result =
            find_path_bidirectional(Params::new(&mut g, 0, 4)).expect("chain must be traversable");
        assert_eq!(result.path, vec![0, 1, 2, 3, 4]);
        assert!(result.distance.almost_eq(RouteWeight::new(4.0), RouteWeight::EPSILON));
    }

    #[test]
    fn start_equals_finish() {
        let mut g = VecGraph::chain(3);
        let result = find_path_bidirectional(Params::new(&mut g, 2, 2)).expect("trivial path");
        assert_eq!(result.path, vec![2]);
        assert_eq!(result.distance, RouteWeight::ZERO);
    }

    #[test]
    fn disconnected_components() {
        let mut g = VecGraph::default();
        g.add_edge(0, 1, 1.0);
        g.add_edge(2, 3, 1.0);
        assert_eq!(
            find_path_bidirectional(Params::new(&mut g, 0, 3)),
            Err(AStarError::NoPath)
        );
    }

    #[test]
    fn respects_edge_direction() {
        let mut g = VecGraph::default();
        g.add_edge(0, 1, 1.0);
        g.add_edge(2, 1, 1.0);
        assert_eq!(
            find_path_bidirectional(Params::new(&mut g, 0, 2)),
            Err(AStarError::NoPath)
        );
    }

    #[test]
    fn grid_with_heuristic() {
        let mut g = VecGraph::grid(8, 8);
        let result = find_path_bidirectional(Params::new(&mut g, 0, 63)).expect("grid path");
        assert!(result.distance.almost_eq(RouteWeight::new(14.0), RouteWeight::EPSILON));
        assert_eq!(result.path.first(), Some(&0));
        assert_eq!(result.path.last(), Some(&63));
        assert_eq!(result.path.len(), 15);
    }

    #[test]
    fn pre_cancelled() {
        let mut g = VecGraph::grid(20, 20);
        let cancellable = Cancellable::new();
        cancellable.cancel();
        let result =
            find_path_bidirectional(Params::new(&mut g, 0, 399).with_cancellable(cancellable));
        assert_eq!(result, Err(AStarError::Cancelled));
        assert!(g.expanded <= POLL_PERIOD);
    }

    #[test]
    fn emitter_sees_the_returned_candidate() {
        let mut g = VecGraph::chain(5);
        let mut emitted = Vec::new();
        let result = find_path_bidirectional_ex(Params::new(&mut g, 0, 4), |r| {
            emitted.push(r.path.clone());
            true
        })
        .expect("chain must be traversable");

        assert_eq!(emitted, vec![result.path]);
    }

    #[test]
    fn emitter_rejection_continues_the_search() {
        let mut g = VecGraph::grid(30, 30);
        let mut emitted: Vec<RoutingResult<u32, RouteWeight>> = Vec::new();
        let result = find_path_bidirectional_ex(Params::new(&mut g, 0, 899), |r| {
            emitted.push(r.clone());
            emitted.len() > 1
        })
        .expect("grid must have more than one route");

        assert!(emitted.len() >= 2);
        assert!(emitted[0].distance.almost_eq(RouteWeight::new(58.0), RouteWeight::new(1e-5)));
        assert!(result.distance >= RouteWeight::new(58.0 - 1e-5));
        assert_eq!(result.path.first(), Some(&0));
        assert_eq!(result.path.last(), Some(&899));
    }

    fn random_graph() -> impl Strategy<Value = (u32, Vec<(u32, u32, f64)>)> {
        (3u32..12).prop_flat_map(|n| {
            let edge = (0..n, 0..n, 0.0f64..10.0);
            (Just(n), prop::collection::vec(edge, 0..40))
        })
    }

    proptest! {
        #[test]
        fn matches_unidirectional((n, edges) in random_graph(), from in 0u32..3, to in 0u32..3) {
            let to = to % n;
            let mut g = VecGraph::default();
            for &(a, b, w) in &edges {
                g.add_edge(a, b, w);
            }

            let uni = find_path(Params::new(&mut g, from, to));
            let bi = find_path_bidirectional(Params::new(&mut g, from, to));

            match (uni, bi) {
                (Ok(u), Ok(b)) => {
                    prop_assert!(
                        u.distance.almost_eq(b.distance, RouteWeight::new(1e-5)),
                        "uni {:?} vs bi {:?}", u, b,
                    );
                    prop_assert_eq!(b.path.first(), Some(&from));
                    prop_assert_eq!(b.path.last(), Some(&to));
                }
                (Err(e1), Err(e2)) => prop_assert_eq!(e1, e2),
                (u, b) => prop_assert!(false, "uni {:?} vs bi {:?}", u, b),
            }
        }
    }
}
