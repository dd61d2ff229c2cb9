// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap};

use super::queue::{clamp_reduced, reconstruct_path, QueueItem};
use super::{AStarError, AStarGraph, Params, Parents, RoutingResult, VertexData, POLL_PERIOD};
use crate::Weight;

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the cheapest path from `params.start` to `params.finish`.
///
/// The search runs Dijkstra's algorithm over reduced weights
/// `w(u, v) + h(v) - h(u)`, where `h(x)` estimates the cost from `x` to the finish.
/// A reduced weight below `-epsilon` means the heuristic is inconsistent;
/// such weights are logged and clamped to zero.
///
/// Every popped vertex is passed to the visitor (if any) before being expanded;
/// returning `false` from it ends the search with [AStarError::NoPath].
pub fn find_path<G: AStarGraph>(
    mut params: Params<'_, G>,
) -> Result<RoutingResult<G::Vertex, G::Weight>, AStarError> {
    let start = params.start;
    let finish = params.finish;
    let epsilon = params.graph.weight_epsilon();
    let start_potential = params.graph.heuristic_cost_estimate(&start, &finish);

    let mut queue: BinaryHeap<QueueItem<G::Vertex, G::Weight>> = BinaryHeap::default();
    let mut distances: HashMap<G::Vertex, G::Weight> = HashMap::default();
    let mut parents: Parents<G::Vertex> = Parents::default();
    let mut edges = Vec::default();
    let mut steps: usize = 0;

    distances.insert(start, G::Weight::zero());
    queue.push(QueueItem {
        vertex: start,
        distance: G::Weight::zero(),
    });

    while let Some(item) = queue.pop() {
        if steps % POLL_PERIOD == 0 && params.cancellable.is_cancelled() {
            log::debug!("find_path cancelled after {} steps", steps);
            return Err(AStarError::Cancelled);
        }
        steps += 1;

        // Contrary to the wikipedia definition, we might keep multiple items in the queue for the same vertex.
        if distances
            .get(&item.vertex)
            .is_some_and(|&known| item.distance > known)
        {
            continue;
        }

        if !params.visit(&item.vertex, &finish) {
            log::debug!("find_path stopped by the visitor after {} steps", steps);
            return Err(AStarError::NoPath);
        }

        let potential = params.graph.heuristic_cost_estimate(&item.vertex, &finish);
        let real_distance = item.distance + start_potential - potential;

        if item.vertex == finish {
            log::debug!(
                "find_path reached the finish after {} steps, distance {:?}",
                steps,
                real_distance,
            );
            return Ok(RoutingResult {
                path: reconstruct_path(&parents, start, finish),
                distance: real_distance,
            });
        }

        edges.clear();
        params.graph.outgoing_edges(
            &VertexData::new(item.vertex, real_distance, &parents),
            &mut edges,
        );

        for edge in edges.drain(..) {
            if edge.target == item.vertex {
                continue;
            }

            let target_potential = params.graph.heuristic_cost_estimate(&edge.target, &finish);
            let reduced = clamp_reduced(
                &item.vertex,
                &edge.target,
                edge.weight + target_potential - potential,
                epsilon,
            );
            let new_distance = item.distance + reduced;

            // Check if this is the cheapest way to the neighbor
            if distances
                .get(&edge.target)
                .is_some_and(|&known| known <= new_distance)
            {
                continue;
            }

            if !params.length_ok(real_distance + edge.weight) {
                continue;
            }

            distances.insert(edge.target, new_distance);
            parents.insert(edge.target, item.vertex);
            queue.push(QueueItem {
                vertex: edge.target,
                distance: new_distance,
            });
        }
    }

    log::debug!("find_path exhausted the graph after {} steps", steps);
    Err(AStarError::NoPath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::Cancellable;
    use crate::test_support::VecGraph;
    use crate::RouteWeight;

    #[test]
    fn linear_chain() {
        let mut g = VecGraph::chain(5);
        let result = find_path(Params::new(&mut g, 0, 4)).expect("chain must be traversable");
        assert_eq!(result.path, vec![0, 1, 2, 3, 4]);
        assert_eq!(result.distance, RouteWeight::new(4.0));
    }

    #[test]
    fn start_equals_finish() {
        let mut g = VecGraph::chain(3);
        let result = find_path(Params::new(&mut g, 1, 1)).expect("trivial path must exist");
        assert_eq!(result.path, vec![1]);
        assert_eq!(result.distance, RouteWeight::ZERO);
    }

    #[test]
    fn disconnected_components() {
        let mut g = VecGraph::default();
        g.add_edge(0, 1, 1.0);
        g.add_edge(2, 3, 1.0);
        assert_eq!(find_path(Params::new(&mut g, 0, 3)), Err(AStarError::NoPath));
    }

    #[test]
    fn prefers_cheaper_detour() {
        let mut g = VecGraph::default();
        g.add_edge(0, 1, 10.0);
        g.add_edge(0, 2, 1.0);
        g.add_edge(2, 3, 1.0);
        g.add_edge(3, 1, 1.0);
        let result = find_path(Params::new(&mut g, 0, 1)).expect("path must exist");
        assert_eq!(result.path, vec![0, 2, 3, 1]);
        assert_eq!(result.distance, RouteWeight::new(3.0));
    }

    #[test]
    fn uses_heuristic_on_planar_graph() {
        let mut g = VecGraph::grid(6, 6);
        let result = find_path(Params::new(&mut g, 0, 35)).expect("grid must be connected");
        assert_eq!(result.distance, RouteWeight::new(10.0));
        assert_eq!(result.path.len(), 11);
    }

    #[test]
    fn pre_cancelled() {
        let mut g = VecGraph::grid(20, 20);
        let cancellable = Cancellable::new();
        cancellable.cancel();
        let result = find_path(Params::new(&mut g, 0, 399).with_cancellable(cancellable));
        assert_eq!(result, Err(AStarError::Cancelled));
        assert!(g.expanded <= POLL_PERIOD);
    }

    #[test]
    fn visitor_can_stop_the_search() {
        let mut g = VecGraph::chain(10);
        let mut visited = Vec::new();
        let result = find_path(Params::new(&mut g, 0, 9).with_visitor(|&v, &target| {
            assert_eq!(target, 9);
            visited.push(v);
            v < 3
        }));
        assert_eq!(result, Err(AStarError::NoPath));
        assert_eq!(visited, vec![0, 1, 2, 3]);
    }

    #[test]
    fn length_check_prunes_edges() {
        let mut g = VecGraph::chain(5);
        let result = find_path(
            Params::new(&mut g, 0, 4).with_length_check(|w| w <= RouteWeight::new(3.0)),
        );
        assert_eq!(result, Err(AStarError::NoPath));
    }

    #[test]
    fn inconsistent_heuristic_is_clamped() {
        let mut g = VecGraph::default();
        g.add_edge(0, 1, 1.0);
        g.add_edge(1, 2, 1.0);
        // Vertex 1 claims to be far from the finish, making the 1 -> 2 reduced weight negative.
        g.set_potential(1, 50.0);
        let result = find_path(Params::new(&mut g, 0, 2)).expect("path must exist");
        assert_eq!(result.path, vec![0, 1, 2]);
    }
}
