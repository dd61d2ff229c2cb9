// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeSet, HashMap};

use crate::astar::Edge;
use crate::distance::LatLon;
use crate::{RegionId, RouteWeight, Segment, SegmentEdge};

/// Connections between regions.
///
/// A road crossing a region border is stored in both regions. In the region it
/// leaves, its segment is an *exit*; in the region it enters, the same physical
/// segment is an *enter*. Such a pair of segments are *twins*. Every region also
/// has precomputed *leaps*: best weights of crossing it from each enter to each exit.
pub trait CrossRegionGraph: Send + Sync {
    /// Checks whether `segment` is an exit (`is_outgoing`) or an enter (otherwise).
    fn is_transition(&self, segment: &Segment, is_outgoing: bool) -> bool;

    /// Appends the twins of an exit (`is_outgoing`) or of an enter (otherwise) to `twins`.
    fn twins(&self, segment: &Segment, is_outgoing: bool, twins: &mut Vec<Segment>);

    /// Appends leaps from an enter to the exits of its region (`is_outgoing`),
    /// or from an exit to the enters of its region (otherwise).
    fn leap_edges(&self, segment: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>);

    /// Lists enters (`is_enter`) or exits of a region.
    fn transitions(&self, region: RegionId, is_enter: bool) -> Vec<Segment>;

    /// Position where a transition crosses the region border.
    fn transition_point(&self, segment: &Segment) -> Option<LatLon>;

    /// Regions directly connected with `region` by at least one transition.
    fn neighbors(&self, region: RegionId) -> Vec<RegionId>;
}

/// In-memory [CrossRegionGraph].
#[derive(Debug, Default, Clone)]
pub struct TransitionTable {
    exits: HashMap<RegionId, BTreeSet<Segment>>,
    enters: HashMap<RegionId, BTreeSet<Segment>>,
    exit_twins: HashMap<Segment, Vec<Segment>>,
    enter_twins: HashMap<Segment, Vec<Segment>>,
    points: HashMap<Segment, LatLon>,
    leaps_from_enter: HashMap<Segment, Vec<SegmentEdge>>,
    leaps_to_exit: HashMap<Segment, Vec<SegmentEdge>>,
    neighbors: HashMap<RegionId, BTreeSet<RegionId>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a border crossing: `exit` leaves its region, and continues
    /// as `enter` in a different region.
    ///
    /// Panics if both segments belong to the same region, or either is fake.
    pub fn add_transition(&mut self, exit: Segment, enter: Segment, border_point: LatLon) {
        assert!(
            exit.is_real() && enter.is_real() && exit.region_id() != enter.region_id(),
            "transition {} -> {} must connect real segments of different regions",
            exit,
            enter,
        );

        self.exits.entry(exit.region_id()).or_default().insert(exit);
        self.enters.entry(enter.region_id()).or_default().insert(enter);
        self.exit_twins.entry(exit).or_default().push(enter);
        self.enter_twins.entry(enter).or_default().push(exit);
        self.points.insert(exit, border_point);
        self.points.insert(enter, border_point);
        self.neighbors
            .entry(exit.region_id())
            .or_default()
            .insert(enter.region_id());
        self.neighbors
            .entry(enter.region_id())
            .or_default()
            .insert(exit.region_id());
    }

    /// Registers the weight of crossing a region from `enter` to `exit`.
    ///
    /// Panics if the segments belong to different regions.
    pub fn add_leap(&mut self, enter: Segment, exit: Segment, weight: RouteWeight) {
        assert_eq!(
            enter.region_id(),
            exit.region_id(),
            "leap {} -> {} must stay inside a single region",
            enter,
            exit,
        );
        self.leaps_from_enter
            .entry(enter)
            .or_default()
            .push(Edge::new(exit, weight));
        self.leaps_to_exit
            .entry(exit)
            .or_default()
            .push(Edge::new(enter, weight));
    }
}

impl CrossRegionGraph for TransitionTable {
    fn is_transition(&self, segment: &Segment, is_outgoing: bool) -> bool {
        let table = if is_outgoing { &self.exits } else { &self.enters };
        table
            .get(&segment.region_id())
            .is_some_and(|s| s.contains(segment))
    }

    fn twins(&self, segment: &Segment, is_outgoing: bool, twins: &mut Vec<Segment>) {
        let table = if is_outgoing { &self.exit_twins } else { &self.enter_twins };
        if let Some(found) = table.get(segment) {
            twins.extend_from_slice(found);
        }
    }

    fn leap_edges(&self, segment: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>) {
        let table = if is_outgoing {
            &self.leaps_from_enter
        } else {
            &self.leaps_to_exit
        };
        if let Some(found) = table.get(segment) {
            edges.extend_from_slice(found);
        }
    }

    fn transitions(&self, region: RegionId, is_enter: bool) -> Vec<Segment> {
        let table = if is_enter { &self.enters } else { &self.exits };
        table
            .get(&region)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    fn transition_point(&self, segment: &Segment) -> Option<LatLon> {
        self.points.get(segment).copied()
    }

    fn neighbors(&self, region: RegionId) -> Vec<RegionId> {
        self.neighbors
            .get(&region)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }
}
