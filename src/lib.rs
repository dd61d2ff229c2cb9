// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Pathfinding core for offline routing over road networks split into regions.
//!
//! Each region is an [IndexGraph]: roads stored as point sequences connected at
//! [Joints](Joint), together with turn restrictions, u-turn rules and (possibly
//! time-conditional) road access. Vertices of all graphs are directed road
//! [Segments](Segment). The [WorldGraph] stitches regions together through
//! border transitions, and can cross whole regions at once using precomputed
//! leaps.
//!
//! Searches are run by the generic A* engine from the [astar] module, over any
//! graph implementing [AStarGraph]. The [Router] puts everything together:
//! it snaps arbitrary positions to roads ([FakeEnding]), connects them with the
//! road network ([IndexGraphStarter]), picks a search mode and returns a [Route].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! # fn load_regions() -> (tileroute::PrebuiltGraphs, tileroute::TransitionTable) { todo!() }
//! let (graphs, transitions) = load_regions();
//! let estimator = Arc::new(tileroute::EdgeEstimator::new(tileroute::CAR_PROFILE));
//! let world = tileroute::WorldGraph::new(Arc::new(graphs), Arc::new(transitions), estimator);
//! let mut router = tileroute::Router::new(world);
//!
//! let route = router
//!     .route(
//!         tileroute::LatLon::new(43.7384, 7.4246),
//!         tileroute::LatLon::new(43.7478, 7.4323),
//!         &tileroute::Cancellable::new(),
//!     )
//!     .expect("failed to find route");
//!
//! println!("Route: {:?}", route);
//! ```

pub mod astar;
mod border;
mod cross_region;
mod distance;
mod error;
mod estimator;
mod fake_ending;
mod fake_graph;
mod geometry;
mod index_graph;
mod joint;
mod joints_starter;
mod kd;
mod leaps;
mod opening_hours;
mod profile;
mod regions;
mod restrictions;
mod road_access;
mod road_index;
mod router;
mod segment;
mod starter;
mod time;
mod weight;
mod world_graph;

#[cfg(test)]
mod test_support;

pub use astar::{
    adjust_route, find_path, find_path_bidirectional, AStarError, AStarGraph, Cancellable, Edge,
    Params, RoutingResult,
};
pub use border::{
    country_by_region_name, BorderRules, CrossBorderPenalty, ParentNameLookup,
    DEFAULT_BORDER_RULES,
};
pub use cross_region::{CrossRegionGraph, TransitionTable};
pub use distance::{earth_distance, LatLon};
pub use error::Error;
pub use estimator::{EdgeEstimator, Metric, Purpose};
pub use fake_ending::{FakeEnding, SegmentProjection, MAX_ROAD_CANDIDATES};
pub use fake_graph::{FakeGraph, FakeKind, FakeVertex};
pub use geometry::{Geometry, GeometryLoader, RoadGeometry, DEFAULT_GEOMETRY_CACHE_SIZE};
pub use index_graph::{EdgeContext, Expansion, IndexGraph, JointEdge};
pub use joint::{Joint, JointId, JointSegment};
pub use joints_starter::{IndexGraphStarterJoints, SegmentGraph};
pub use kd::KDTree;
pub use leaps::LeapsGraph;
pub use opening_hours::{OpeningHours, OpeningState};
pub use profile::{
    RoadOptions, RoutingOptions, VehicleProfile, BICYCLE_PROFILE, CAR_PROFILE, FOOT_PROFILE,
};
pub use regions::{Bounds, PrebuiltGraphs, RegionGraphSource};
pub use restrictions::{
    Locator, Restriction, RestrictionKind, RestrictionTable, RestrictionVertex,
    UTurnRestriction, UTurnTable,
};
pub use road_access::{Conditional, Confidence, RoadAccess, RoadAccessType};
pub use road_index::{JointIndex, RoadIndex, RoadJointIds};
pub use router::{ProgressFn, Route, RouteStep, Router, RouterError, ADJUST_LIMIT, VISIT_PERIOD};
pub use segment::{RegionId, RoadPoint, Segment, SegmentEdge, FAKE_FEATURE_ID, FAKE_REGION_ID};
pub use starter::{IndexGraphStarter, FINISH_SEGMENT, START_SEGMENT};
pub use time::{FixedClock, SystemClock, TimeSource};
pub use weight::{RouteWeight, Weight};
pub use world_graph::{WorldGraph, WorldGraphMode};
