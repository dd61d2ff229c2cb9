// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap};

use super::queue::{reconstruct_path, QueueItem};
use super::{AStarError, AStarGraph, Edge, Params, Parents, RoutingResult, VertexData, POLL_PERIOD};
use crate::Weight;

/// Reconnects `params.start` to a previously computed route.
///
/// `prev_route` lists the edges of the previous route (the first edge leaves
/// the previous route's start, which is not part of the list). A single Dijkstra
/// wave (without a heuristic) grows from `params.start`, bounded by the length
/// predicate; every visited vertex of the previous route is scored by its
/// distance plus the remaining weight of the previous route. The best-scoring
/// vertex (first visited wins ties within epsilon) is where the new path joins
/// the old one, and the result is the path to it followed by the unchanged
/// suffix of `prev_route`.
///
/// Panics if `prev_route` is empty.
pub fn adjust_route<G: AStarGraph>(
    mut params: Params<'_, G>,
    prev_route: &[Edge<G::Vertex, G::Weight>],
) -> Result<RoutingResult<G::Vertex, G::Weight>, AStarError> {
    assert!(!prev_route.is_empty(), "adjust_route requires a non-empty previous route");

    let start = params.start;
    let epsilon = params.graph.weight_epsilon();

    let mut remaining: HashMap<G::Vertex, G::Weight> = HashMap::default();
    let mut remaining_weight = G::Weight::zero();
    for edge in prev_route.iter().rev() {
        remaining.insert(edge.target, remaining_weight);
        remaining_weight = remaining_weight + edge.weight;
    }

    let mut queue: BinaryHeap<QueueItem<G::Vertex, G::Weight>> = BinaryHeap::default();
    let mut distances: HashMap<G::Vertex, G::Weight> = HashMap::default();
    let mut parents: Parents<G::Vertex> = Parents::default();
    let mut edges = Vec::default();
    let mut steps: usize = 0;
    let mut best: Option<(G::Vertex, G::Weight)> = None;

    distances.insert(start, G::Weight::zero());
    queue.push(QueueItem {
        vertex: start,
        distance: G::Weight::zero(),
    });

    while let Some(item) = queue.pop() {
        if steps % POLL_PERIOD == 0 && params.cancellable.is_cancelled() {
            log::debug!("adjust_route cancelled after {} steps", steps);
            return Err(AStarError::Cancelled);
        }
        steps += 1;

        if distances
            .get(&item.vertex)
            .is_some_and(|&known| item.distance > known)
        {
            continue;
        }

        if !params.visit(&item.vertex, &start) {
            break;
        }

        if let Some(&rest) = remaining.get(&item.vertex) {
            let full = item.distance + rest;
            if best.map_or(true, |(_, min)| full < min - epsilon) {
                best = Some((item.vertex, full));
            }
        }

        edges.clear();
        params.graph.outgoing_edges(
            &VertexData::new(item.vertex, item.distance, &parents),
            &mut edges,
        );

        for edge in edges.drain(..) {
            if edge.target == item.vertex {
                continue;
            }

            let new_distance = item.distance + edge.weight;
            if distances
                .get(&edge.target)
                .is_some_and(|&known| known <= new_distance)
            {
                continue;
            }

            if !params.length_ok(new_distance) {
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

    let Some((join, distance)) = best else {
        log::debug!("adjust_route did not reach the previous route after {} steps", steps);
        return Err(AStarError::NoPath);
    };

    let mut path = reconstruct_path(&parents, start, join);
    let join_idx = prev_route
        .iter()
        .position(|e| e.target == join)
        .unwrap_or_else(|| panic!("join vertex {:?} is not part of the previous route", join));
    path.extend(prev_route[join_idx + 1..].iter().map(|e| e.target));

    log::debug!(
        "adjust_route joined the previous route at {:?} after {} steps, distance {:?}",
        join,
        steps,
        distance,
    );
    Ok(RoutingResult { path, distance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::{find_path, Cancellable};
    use crate::test_support::VecGraph;
    use crate::RouteWeight;

    fn route_edges(g: &VecGraph, path: &[u32]) -> Vec<Edge<u32, RouteWeight>> {
        path.windows(2)
            .map(|pair| Edge::new(pair[1], g.weight(pair[0], pair[1])))
            .collect()
    }

    #[test]
    fn previous_route_is_returned_unchanged() {
        let mut g = VecGraph::grid(5, 5);
        let previous = find_path(Params::new(&mut g, 0, 24)).expect("grid path");
        let prev_route = route_edges(&g, &previous.path);

        let adjusted = adjust_route(Params::new(&mut g, 0, 24), &prev_route).expect("adjustable");
        assert_eq!(adjusted.path, previous.path);
        assert!(adjusted.distance.almost_eq(previous.distance, RouteWeight::EPSILON));
    }

    #[test]
    fn reconnects_after_deviation() {
        // Previous route 0-1-2-3-4; the user drifted to 5, which has a way back to 2.
        let mut g = VecGraph::chain(5);
        g.add_edge(5, 2, 1.5);
        g.add_edge(5, 6, 1.0);
        g.add_edge(6, 4, 10.0);
        let prev_route = route_edges(&g, &[0, 1, 2, 3, 4]);

        let adjusted = adjust_route(Params::new(&mut g, 5, 4), &prev_route).expect("adjustable");
        assert_eq!(adjusted.path, vec![5, 2, 3, 4]);
        assert!(adjusted.distance.almost_eq(RouteWeight::new(3.5), RouteWeight::EPSILON));
    }

    #[test]
    fn unreachable_route() {
        let mut g = VecGraph::chain(3);
        g.add_edge(7, 8, 1.0);
        let prev_route = route_edges(&g, &[0, 1, 2]);
        assert_eq!(
            adjust_route(Params::new(&mut g, 7, 2), &prev_route),
            Err(AStarError::NoPath)
        );
    }

    #[test]
    fn length_check_limits_the_detour() {
        let mut g = VecGraph::chain(3);
        g.add_edge(9, 1, 100.0);
        let prev_route = route_edges(&g, &[0, 1, 2]);
        let params = Params::new(&mut g, 9, 2).with_length_check(|w| w <= RouteWeight::new(50.0));
        assert_eq!(adjust_route(params, &prev_route), Err(AStarError::NoPath));
    }

    #[test]
    fn pre_cancelled() {
        let mut g = VecGraph::chain(3);
        let prev_route = route_edges(&g, &[0, 1, 2]);
        let cancellable = Cancellable::new();
        cancellable.cancel();
        assert_eq!(
            adjust_route(Params::new(&mut g, 0, 2).with_cancellable(cancellable), &prev_route),
            Err(AStarError::Cancelled)
        );
    }

    #[test]
    #[should_panic(expected = "non-empty previous route")]
    fn empty_previous_route() {
        let mut g = VecGraph::chain(3);
        let _ = adjust_route(Params::new(&mut g, 0, 2), &[]);
    }
}
