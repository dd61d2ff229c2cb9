// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::astar::{
    self, find_path_bidirectional, AStarError, AStarGraph, Cancellable, Edge, Params,
    RoutingResult,
};
use crate::cross_region::CrossRegionGraph;
use crate::distance::LatLon;
use crate::estimator::Purpose;
use crate::fake_ending::FakeEnding;
use crate::index_graph::{EdgeContext, IndexGraph};
use crate::joints_starter::IndexGraphStarterJoints;
use crate::leaps::LeapsGraph;
use crate::profile::{RoutingOptions, VehicleProfile};
use crate::starter::{IndexGraphStarter, FINISH_SEGMENT, START_SEGMENT};
use crate::time::{SystemClock, TimeSource};
use crate::world_graph::{WorldGraph, WorldGraphMode};
use crate::{RegionId, RouteWeight, Segment, SegmentEdge};

/// Longest detour [Router::adjust_route] looks for before giving up.
pub const ADJUST_LIMIT: RouteWeight = RouteWeight::new(5.0 * 60.0);

/// Number of visited vertices between two progress reports.
pub const VISIT_PERIOD: usize = 40;

/// Callback receiving the number of vertices visited by the current search.
pub type ProgressFn = Box<dyn FnMut(usize) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    AStar(#[from] AStarError),

    #[error("no roads near the start point")]
    StartPointNotFound,

    #[error("no roads near the end point")]
    EndPointNotFound,

    #[error("search over leaps returned an inconsistent path")]
    InconsistentLeaps,
}

/// Single real segment of a [Route].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStep {
    pub segment: Segment,

    /// Position where the step ends. Differs from the segment's head
    /// for the parts of segments the route starts or ends on.
    pub junction: LatLon,

    /// Time it takes to travel this step, including maneuvers leading onto it.
    pub eta: RouteWeight,

    /// Search weight of this step, including all penalties leading onto it.
    pub weight: RouteWeight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub start: LatLon,
    pub finish: LatLon,
    pub steps: Vec<RouteStep>,

    /// Weight minimized by the search, including all penalties.
    pub weight: RouteWeight,

    /// Estimated travel time.
    pub eta: RouteWeight,
}

impl Route {
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.steps.iter().map(|s| s.segment)
    }
}

/// Finds routes between arbitrary positions over a [WorldGraph].
pub struct Router {
    graph: WorldGraph,
    clock: Box<dyn TimeSource>,
    options: RoutingOptions,
    progress: Option<ProgressFn>,
}

impl Router {
    pub fn new(graph: WorldGraph) -> Self {
        Self {
            graph,
            clock: Box::new(SystemClock),
            options: RoutingOptions::default(),
            progress: None,
        }
    }

    pub fn with_clock(mut self, clock: impl TimeSource + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_options(mut self, options: RoutingOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets a callback invoked every [VISIT_PERIOD] vertices visited by a search.
    pub fn with_progress(mut self, progress: impl FnMut(usize) + Send + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn graph(&mut self) -> &mut WorldGraph {
        &mut self.graph
    }

    /// Snaps a position to the roads within the profile's snapping radius.
    pub fn find_ending(&mut self, position: LatLon) -> Option<FakeEnding> {
        let radius = self.graph.estimator().profile().snapping_radius;
        let regions = self.graph.source().regions_near(position);
        let graphs: Vec<Arc<IndexGraph>> = regions
            .into_iter()
            .filter_map(|region| self.graph.region_graph(region))
            .collect();
        FakeEnding::snap(graphs.iter().map(Arc::as_ref), position, radius)
    }

    /// Snaps both positions to the roads and finds a route between them.
    pub fn route(
        &mut self,
        start: LatLon,
        finish: LatLon,
        cancellable: &Cancellable,
    ) -> Result<Route, RouterError> {
        let start = self.find_ending(start).ok_or(RouterError::StartPointNotFound)?;
        let finish = self.find_ending(finish).ok_or(RouterError::EndPointNotFound)?;
        self.calculate_route(&start, &finish, cancellable)
    }

    fn prepare(&mut self) {
        self.graph.set_context(EdgeContext {
            options: self.options,
            start_time: Some(self.clock.now()),
        });
        self.graph.set_mode(WorldGraphMode::NoLeaps);
    }

    pub fn calculate_route(
        &mut self,
        start: &FakeEnding,
        finish: &FakeEnding,
        cancellable: &Cancellable,
    ) -> Result<Route, RouterError> {
        if start.projections.is_empty() {
            return Err(RouterError::StartPointNotFound);
        }
        if finish.projections.is_empty() {
            return Err(RouterError::EndPointNotFound);
        }

        self.prepare();
        let mode = choose_mode(
            self.graph.estimator().profile(),
            &start.regions(),
            &finish.regions(),
            self.graph.cross_region(),
        );
        log::info!("routing {} -> {} in {:?} mode", start.origin, finish.origin, mode);

        let mut starter = IndexGraphStarter::new(&mut self.graph, start, finish);
        let limit = starter.length_limit();
        let progress = &mut self.progress;
        let local_regions = starter.regions();
        starter.graph().set_local_regions(local_regions);

        let (path, weight) = match mode {
            WorldGraphMode::Joints => {
                starter.graph().set_mode(WorldGraphMode::Joints);
                let mut joints =
                    IndexGraphStarterJoints::new(&mut starter, START_SEGMENT, FINISH_SEGMENT);
                let (from, to) = (joints.start_joint(), joints.finish_joint());
                let r = find_path_bidirectional(params(
                    &mut joints,
                    from,
                    to,
                    cancellable,
                    progress,
                    Some(limit),
                ))?;
                (joints.reconstruct_path(&r.path), r.distance)
            }

            WorldGraphMode::LeapsOnly => {
                let coarse = {
                    let mut leaps = LeapsGraph::new(&mut starter);
                    find_path_bidirectional(params(
                        &mut leaps,
                        START_SEGMENT,
                        FINISH_SEGMENT,
                        cancellable,
                        progress,
                        Some(limit),
                    ))?
                };
                log::debug!("found {} leaps, refining", coarse.path.len());

                match process_leaps(&mut starter, &coarse.path, cancellable, progress) {
                    Ok(refined) => refined,
                    Err(RouterError::AStar(AStarError::NoPath)) => {
                        log::warn!("leaps refinement failed, routing without leaps");
                        starter.graph().set_mode(WorldGraphMode::NoLeaps);
                        let r = find_path_bidirectional(params(
                            &mut starter,
                            START_SEGMENT,
                            FINISH_SEGMENT,
                            cancellable,
                            progress,
                            Some(limit),
                        ))?;
                        (r.path, r.distance)
                    }
                    Err(e) => return Err(e),
                }
            }

            mode => {
                starter.graph().set_mode(mode);
                let r = find_path_bidirectional(params(
                    &mut starter,
                    START_SEGMENT,
                    FINISH_SEGMENT,
                    cancellable,
                    progress,
                    Some(limit),
                ))?;
                if mode == WorldGraphMode::LeapsIfPossible {
                    refine_remote_leaps(&mut starter, r.path, r.distance, cancellable, progress)?
                } else {
                    (r.path, r.distance)
                }
            }
        };

        starter.graph().set_mode(WorldGraphMode::NoLeaps);
        let route = make_route(&mut starter, &path, weight);
        log::debug!(
            "route of {} steps, weight {}, eta {}",
            route.steps.len(),
            route.weight,
            route.eta,
        );
        Ok(route)
    }

    /// Reconnects a new `start` with a previously calculated route,
    /// looking for a detour of at most [ADJUST_LIMIT].
    ///
    /// The joined part of `prev` keeps its step weights and ends at the same
    /// finish, even if it lies in the middle of a segment.
    ///
    /// Callers should fall back to [Router::calculate_route] on failure.
    pub fn adjust_route(
        &mut self,
        start: &FakeEnding,
        prev: &Route,
        cancellable: &Cancellable,
    ) -> Result<Route, RouterError> {
        if start.projections.is_empty() {
            return Err(RouterError::StartPointNotFound);
        }
        let Some(last) = prev.steps.last() else {
            return Err(RouterError::EndPointNotFound);
        };
        let Some(last_graph) = self.graph.region_graph(last.segment.region_id()) else {
            return Err(RouterError::EndPointNotFound);
        };

        self.prepare();
        let finish = FakeEnding::on_segment(&last_graph, last.segment, prev.finish);
        let mut starter = IndexGraphStarter::new(&mut self.graph, start, &finish);
        let limit = starter.length_limit().min(ADJUST_LIMIT);
        let prev_edges = previous_edges(&starter, prev)?;

        let r = astar::adjust_route(
            params(
                &mut starter,
                START_SEGMENT,
                FINISH_SEGMENT,
                cancellable,
                &mut self.progress,
                Some(limit),
            ),
            &prev_edges,
        )?;

        let route = make_route(&mut starter, &r.path, r.distance);
        log::info!(
            "route adjusted into {} steps (previously {}), weight {}",
            route.steps.len(),
            prev.steps.len(),
            route.weight,
        );
        Ok(route)
    }
}

/// Edges of a previous route as vertices of `starter`, whose finish was attached
/// to the last step of `prev`. The last step becomes the finish part of its segment,
/// followed by the off-road leg to [FINISH_SEGMENT].
fn previous_edges(starter: &IndexGraphStarter<'_>, prev: &Route) -> Result<Vec<SegmentEdge>, RouterError> {
    let Some((last, init)) = prev.steps.split_last() else {
        return Err(RouterError::EndPointNotFound);
    };

    // Only parts leading to the finish have outgoing fake edges
    let fake = starter.fake_graph();
    let Some((part, off_road)) = fake
        .fakes_of_real(&last.segment)
        .find_map(|part| fake.edges(&part, true).next().map(|off_road| (part, off_road)))
    else {
        return Err(RouterError::EndPointNotFound);
    };

    let mut edges: Vec<SegmentEdge> = init
        .iter()
        .map(|step| Edge::new(step.segment, step.weight))
        .collect();
    edges.push(Edge::new(part, last.weight));
    edges.push(Edge::new(off_road, RouteWeight::ZERO));
    edges.push(Edge::new(FINISH_SEGMENT, RouteWeight::ZERO));
    Ok(edges)
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("graph", &self.graph)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn choose_mode(
    profile: &VehicleProfile,
    start_regions: &BTreeSet<RegionId>,
    finish_regions: &BTreeSet<RegionId>,
    cross: &dyn CrossRegionGraph,
) -> WorldGraphMode {
    if !profile.use_leaps {
        return if profile.use_joints {
            WorldGraphMode::Joints
        } else {
            WorldGraphMode::NoLeaps
        };
    }

    let close = start_regions.iter().any(|&region| {
        finish_regions.contains(&region)
            || cross
                .neighbors(region)
                .iter()
                .any(|n| finish_regions.contains(n))
    });

    match (close, profile.use_joints) {
        (true, true) => WorldGraphMode::Joints,
        (true, false) => WorldGraphMode::LeapsIfPossible,
        (false, _) => WorldGraphMode::LeapsOnly,
    }
}

fn params<'a, G>(
    graph: &'a mut G,
    from: G::Vertex,
    to: G::Vertex,
    cancellable: &Cancellable,
    progress: &'a mut Option<ProgressFn>,
    limit: Option<RouteWeight>,
) -> Params<'a, G>
where
    G: AStarGraph<Weight = RouteWeight>,
{
    let mut p = Params::new(graph, from, to).with_cancellable(cancellable.clone());
    if let Some(limit) = limit {
        p = p.with_length_check(move |w| w <= limit);
    }
    if let Some(progress) = progress.as_mut() {
        let mut visited: usize = 0;
        p = p.with_visitor(move |_, _| {
            visited += 1;
            if visited % VISIT_PERIOD == 0 {
                progress(visited);
            }
            true
        });
    }
    p
}

/// Finds roads between two consecutive vertices of a path over leaps.
fn refine_leg(
    starter: &mut IndexGraphStarter<'_>,
    from: Segment,
    to: Segment,
    cancellable: &Cancellable,
    progress: &mut Option<ProgressFn>,
) -> Result<RoutingResult<Segment, RouteWeight>, AStarError> {
    starter.graph().clear_cached_graphs();
    if from == START_SEGMENT || to == FINISH_SEGMENT {
        starter.graph().set_mode(WorldGraphMode::NoLeaps);
        find_path_bidirectional(params(starter, from, to, cancellable, progress, None))
    } else {
        let world = starter.graph();
        world.set_mode(WorldGraphMode::SingleMwm);
        find_path_bidirectional(params(world, from, to, cancellable, progress, None))
    }
}

fn is_twin_pair(from: &Segment, to: &Segment) -> bool {
    from.is_real() && to.is_real() && from.region_id() != to.region_id()
}

/// Replaces every leap of a path found in [WorldGraphMode::LeapsOnly] with roads.
///
/// Twins are kept on both sides of a border.
fn process_leaps(
    starter: &mut IndexGraphStarter<'_>,
    coarse: &[Segment],
    cancellable: &Cancellable,
    progress: &mut Option<ProgressFn>,
) -> Result<(Vec<Segment>, RouteWeight), RouterError> {
    if coarse.len() < 3
        || coarse.first() != Some(&START_SEGMENT)
        || coarse.last() != Some(&FINISH_SEGMENT)
    {
        return Err(RouterError::InconsistentLeaps);
    }

    let mut path: Vec<Segment> = Vec::default();
    let mut weight = RouteWeight::ZERO;
    for pair in coarse.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if is_twin_pair(&from, &to) {
            weight += starter.graph().border_penalty(from.region_id(), to.region_id());
            continue;
        }

        let leg = refine_leg(starter, from, to, cancellable, progress)?;
        log::debug!("refined leap {} -> {} into {} segments", from, to, leg.path.len());
        let skip = usize::from(path.last() == leg.path.first());
        path.extend_from_slice(&leg.path[skip..]);
        weight += leg.distance;
    }
    Ok((path, weight))
}

/// Replaces leaps over regions without the start or the finish
/// of a path found in [WorldGraphMode::LeapsIfPossible] with roads.
fn refine_remote_leaps(
    starter: &mut IndexGraphStarter<'_>,
    coarse: Vec<Segment>,
    mut weight: RouteWeight,
    cancellable: &Cancellable,
    progress: &mut Option<ProgressFn>,
) -> Result<(Vec<Segment>, RouteWeight), RouterError> {
    let local = starter.regions();
    let mut path: Vec<Segment> = Vec::with_capacity(coarse.len());
    let mut leap_edges = Vec::default();

    for (i, &segment) in coarse.iter().enumerate() {
        let leap = coarse.get(i + 1).copied().filter(|next| {
            segment.is_real()
                && next.is_real()
                && segment != *next
                && segment.region_id() == next.region_id()
                && !local.contains(&segment.region_id())
        });

        let Some(next) = leap else {
            if path.last() != Some(&segment) {
                path.push(segment);
            }
            continue;
        };

        leap_edges.clear();
        starter
            .graph()
            .cross_region()
            .leap_edges(&segment, true, &mut leap_edges);
        let leap_weight = leap_edges
            .iter()
            .find(|e| e.target == next)
            .map_or(RouteWeight::ZERO, |e| e.weight);

        let leg = refine_leg(starter, segment, next, cancellable, progress)?;
        let skip = usize::from(path.last() == leg.path.first());
        path.extend_from_slice(&leg.path[skip..]);
        weight = weight - leap_weight + leg.distance;
    }

    Ok((path, weight))
}

/// Converts a path over the starter into route steps over real segments.
fn make_route(starter: &mut IndexGraphStarter<'_>, path: &[Segment], weight: RouteWeight) -> Route {
    let mut steps: Vec<RouteStep> = Vec::with_capacity(path.len());
    let mut eta = RouteWeight::ZERO;
    let mut pending_eta = RouteWeight::ZERO;
    let mut pending_weight = RouteWeight::ZERO;

    for (i, segment) in path.iter().enumerate() {
        if let Some(prev) = i.checked_sub(1).map(|j| path[j]) {
            let step_eta = starter.step_weight(Purpose::Eta, &prev, segment, eta);
            pending_weight += starter.step_weight(Purpose::Weight, &prev, segment, eta);
            eta += step_eta;
            pending_eta += step_eta;
        }

        if let Some(real) = starter.convert_to_real(segment) {
            steps.push(RouteStep {
                segment: real,
                junction: starter.point(segment, true),
                eta: pending_eta,
                weight: pending_weight,
            });
            pending_eta = RouteWeight::ZERO;
            pending_weight = RouteWeight::ZERO;
        }
    }

    if let Some(last) = steps.last_mut() {
        last.eta += pending_eta;
        last.weight += pending_weight;
    }

    Route {
        start: starter.start_point(),
        finish: starter.finish_point(),
        steps,
        weight,
        eta,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cross_region::TransitionTable;
    use crate::regions::PrebuiltGraphs;
    use crate::restrictions::Restriction;
    use crate::test_support::{
        chain_world, detour_graph, seg, triangular_graph, unit_estimator_with, xy, UNIT_PROFILE,
    };

    const PROFILE: VehicleProfile = VehicleProfile {
        snapping_radius: 100.0,
        ..UNIT_PROFILE
    };

    fn router(graphs: PrebuiltGraphs, transitions: TransitionTable, profile: VehicleProfile) -> Router {
        let world = WorldGraph::new(
            Arc::new(graphs),
            Arc::new(transitions),
            unit_estimator_with(profile),
        );
        Router::new(world)
    }

    fn triangular_router(profile: VehicleProfile) -> Router {
        let graphs: PrebuiltGraphs = [triangular_graph().build()].into_iter().collect();
        router(graphs, TransitionTable::new(), profile)
    }

    fn chain_router(regions: RegionId, profile: VehicleProfile) -> Router {
        let (graphs, transitions) = chain_world(regions);
        router(graphs, transitions, profile)
    }

    fn chain_segments(parts: &[(RegionId, u32)]) -> Vec<Segment> {
        parts
            .iter()
            .flat_map(|&(region, count)| (0..count).map(move |i| Segment::new(region, 0, i, true)))
            .collect()
    }

    macro_rules! assert_weight {
        ($actual:expr, $expected:expr) => {
            let (actual, expected): (RouteWeight, f64) = ($actual, $expected);
            assert!(
                actual.almost_eq(RouteWeight::new(expected), RouteWeight::new(1e-6)),
                "{} != {}",
                actual,
                expected,
            );
        };
    }

    macro_rules! assert_close {
        ($a:expr, $b:expr) => {
            let (a, b): (LatLon, LatLon) = ($a, $b);
            assert!(
                (a.lat - b.lat).abs() < 1e-9 && (a.lon - b.lon).abs() < 1e-9,
                "{} != {}",
                a,
                b,
            );
        };
    }

    #[test]
    fn routes_within_a_region() {
        for profile in [PROFILE, VehicleProfile { use_joints: true, ..PROFILE }] {
            let mut r = triangular_router(profile);
            let route = r
                .route(xy(3.0, 0.0), xy(0.0, 3.0), &Cancellable::new())
                .expect("route must exist");

            assert_eq!(
                route.segments().collect::<Vec<_>>(),
                vec![seg(5, 0, true), seg(2, 0, true), seg(1, 0, true), seg(4, 0, true)],
            );
            assert_eq!(route.steps[3].junction, xy(0.0, 3.0));
            assert_weight!(route.weight, 2.0 + 2.0 * 2.0_f64.sqrt());
            assert_weight!(route.eta, 2.0 + 2.0 * 2.0_f64.sqrt());
        }
    }

    #[test]
    fn routes_from_the_middle_of_a_segment() {
        let restrictions = vec![Restriction::no(vec![1, 2, 3])];
        for profile in [PROFILE, VehicleProfile { use_joints: true, ..PROFILE }] {
            let graphs: PrebuiltGraphs =
                [detour_graph().restrictions(restrictions.clone()).build()].into_iter().collect();
            let mut r = router(graphs, TransitionTable::new(), profile);
            let route = r
                .route(xy(0.5, 0.0), xy(4.0, 0.0), &Cancellable::new())
                .expect("route must exist");

            assert_eq!(
                route.segments().collect::<Vec<_>>(),
                vec![
                    seg(1, 0, true),
                    seg(2, 0, true),
                    seg(4, 0, true),
                    seg(4, 1, true),
                    seg(3, 1, true),
                ],
            );
            assert_weight!(route.weight, 2.5 + 2.0 * 1.25_f64.sqrt());
        }
    }

    #[test]
    fn points_far_from_roads() {
        let mut r = triangular_router(PROFILE);
        let c = Cancellable::new();
        assert_eq!(
            r.route(xy(10.0, 10.0), xy(0.0, 3.0), &c),
            Err(RouterError::StartPointNotFound),
        );
        assert_eq!(
            r.route(xy(3.0, 0.0), xy(10.0, 10.0), &c),
            Err(RouterError::EndPointNotFound),
        );
    }

    #[test]
    fn cancelled_routing() {
        let mut r = triangular_router(PROFILE);
        let c = Cancellable::new();
        c.cancel();
        assert_eq!(
            r.route(xy(3.0, 0.0), xy(0.0, 3.0), &c),
            Err(RouterError::AStar(AStarError::Cancelled)),
        );
    }

    #[test]
    fn mode_selection() {
        let (_, transitions) = chain_world(3);
        let leaps = VehicleProfile { use_leaps: true, ..PROFILE };
        let leaps_joints = VehicleProfile { use_joints: true, ..leaps };
        let r = |ids: &[RegionId]| ids.iter().copied().collect::<BTreeSet<RegionId>>();

        let joints = VehicleProfile { use_joints: true, ..PROFILE };
        let cases = [
            (PROFILE, 1, 3, WorldGraphMode::NoLeaps),
            (joints, 1, 3, WorldGraphMode::Joints),
            (leaps, 1, 3, WorldGraphMode::LeapsOnly),
            (leaps, 1, 2, WorldGraphMode::LeapsIfPossible),
            (leaps, 2, 2, WorldGraphMode::LeapsIfPossible),
            (leaps_joints, 1, 2, WorldGraphMode::Joints),
            (leaps_joints, 1, 3, WorldGraphMode::LeapsOnly),
        ];
        for (profile, start, finish, expected) in cases {
            let mode = choose_mode(&profile, &r(&[start]), &r(&[finish]), &transitions);
            assert_eq!(mode, expected, "{} -> {} with {:?}", start, finish, profile);
        }
    }

    #[test]
    fn leaps_are_refined_into_roads() {
        let mut r = chain_router(3, VehicleProfile { use_leaps: true, ..PROFILE });
        let route = r
            .route(xy(0.0, 0.0), xy(9.0, 0.0), &Cancellable::new())
            .expect("route must exist");

        assert_eq!(
            route.segments().collect::<Vec<_>>(),
            chain_segments(&[(1, 4), (2, 4), (3, 3)]),
        );
        assert_weight!(route.weight, 9.0);
        assert_weight!(route.eta, 9.0);
    }

    #[test]
    fn neighboring_regions_are_routed_over_roads() {
        let mut r = chain_router(2, VehicleProfile { use_leaps: true, ..PROFILE });
        let route = r
            .route(xy(0.0, 0.0), xy(6.0, 0.0), &Cancellable::new())
            .expect("route must exist");

        assert_eq!(
            route.segments().collect::<Vec<_>>(),
            chain_segments(&[(1, 4), (2, 3)]),
        );
        assert_weight!(route.weight, 6.0);
    }

    #[test]
    fn progress_is_reported() {
        let reports = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reports);
        let mut r = chain_router(20, PROFILE).with_progress(move |visited| {
            assert_eq!(visited % VISIT_PERIOD, 0);
            counter.fetch_add(1, Ordering::Relaxed);
        });

        r.route(xy(0.0, 0.0), xy(60.0, 0.0), &Cancellable::new())
            .expect("route must exist");
        assert!(reports.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn adjusting_from_the_same_start() {
        let mut r = triangular_router(PROFILE);
        let c = Cancellable::new();
        let prev = r
            .route(xy(3.0, 0.0), xy(0.0, 3.0), &c)
            .expect("route must exist");

        let start = r.find_ending(xy(3.0, 0.0)).expect("start must snap");
        let adjusted = r.adjust_route(&start, &prev, &c).expect("route must be adjusted");
        assert_eq!(
            adjusted.segments().collect::<Vec<_>>(),
            prev.segments().collect::<Vec<_>>(),
        );
        assert_weight!(adjusted.weight, prev.weight.seconds());
    }

    #[test]
    fn adjusting_rejoins_the_previous_route() {
        let mut r = triangular_router(PROFILE);
        let c = Cancellable::new();
        let prev = r
            .route(xy(3.0, 0.0), xy(0.0, 3.0), &c)
            .expect("route must exist");

        let start = r.find_ending(xy(1.0, 1.0)).expect("start must snap");
        let adjusted = r.adjust_route(&start, &prev, &c).expect("route must be adjusted");
        assert_eq!(
            adjusted.segments().collect::<Vec<_>>(),
            vec![seg(2, 0, true), seg(1, 0, true), seg(4, 0, true)],
        );
        assert_weight!(adjusted.weight, 1.0 + 2.0_f64.sqrt());
        assert_eq!(adjusted.finish, prev.finish);
    }

    #[test]
    fn adjusting_keeps_a_finish_in_the_middle_of_a_segment() {
        let mut r = triangular_router(PROFILE);
        let c = Cancellable::new();
        let prev = r
            .route(xy(3.0, 0.0), xy(0.0, 2.5), &c)
            .expect("route must exist");
        assert_weight!(prev.weight, 1.5 + 2.0 * 2.0_f64.sqrt());
        assert_close!(prev.steps[3].junction, xy(0.0, 2.5));
        assert_weight!(prev.steps[3].weight, 0.5);

        let start = r.find_ending(xy(1.0, 1.0)).expect("start must snap");
        let adjusted = r.adjust_route(&start, &prev, &c).expect("route must be adjusted");
        assert_eq!(
            adjusted.segments().collect::<Vec<_>>(),
            vec![seg(2, 0, true), seg(1, 0, true), seg(4, 0, true)],
        );
        assert_close!(adjusted.steps[2].junction, xy(0.0, 2.5));
        assert_weight!(adjusted.weight, 0.5 + 2.0_f64.sqrt());
        assert_weight!(adjusted.eta, 0.5 + 2.0_f64.sqrt());
        assert_eq!(adjusted.finish, prev.finish);
    }
}
