// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;

use crate::distance::{project_on_segment, LatLon, LocalProjection};
use crate::index_graph::IndexGraph;
use crate::{RegionId, Segment};

/// Maximum number of road segments a start or finish position is attached to.
pub const MAX_ROAD_CANDIDATES: usize = 12;

/// Projection of a position onto a real road segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    pub segment: Segment,
    pub one_way: bool,
    pub segment_back: LatLon,
    pub segment_front: LatLon,

    /// Point of the segment closest to the projected position.
    pub junction: LatLon,

    /// Distance between the projected position and the junction, in meters.
    pub distance: f64,
}

/// Arbitrary route start or finish, with its projections onto nearby roads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FakeEnding {
    pub origin: LatLon,
    pub projections: Vec<SegmentProjection>,
}

impl FakeEnding {
    /// Attaches `origin` to a single, known segment.
    pub fn on_segment(graph: &IndexGraph, segment: Segment, origin: LatLon) -> Self {
        Self {
            origin,
            projections: vec![project(graph, segment, origin)],
        }
    }

    /// Attaches `origin` to the closest road segments (at most [MAX_ROAD_CANDIDATES])
    /// passing within `radius` meters.
    ///
    /// Returns `None` if there are no such segments.
    pub fn snap<'g, I>(graphs: I, origin: LatLon, radius: f64) -> Option<Self>
    where
        I: IntoIterator<Item = &'g IndexGraph>,
    {
        let mut projections = Vec::default();
        for graph in graphs {
            projections.extend(
                graph
                    .segments_near(origin, radius)
                    .into_iter()
                    .map(|s| project(graph, s, origin))
                    .filter(|p| p.distance <= radius),
            );
        }

        if projections.is_empty() {
            log::debug!("no roads within {} m of {}", radius, origin);
            return None;
        }

        projections.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.segment.cmp(&b.segment))
        });
        projections.truncate(MAX_ROAD_CANDIDATES);
        Some(Self {
            origin,
            projections,
        })
    }

    pub fn regions(&self) -> BTreeSet<RegionId> {
        self.projections
            .iter()
            .map(|p| p.segment.region_id())
            .collect()
    }
}

fn project(graph: &IndexGraph, segment: Segment, origin: LatLon) -> SegmentProjection {
    let back = graph.point(&segment, false);
    let front = graph.point(&segment, true);

    let local = LocalProjection::new(origin);
    let (bx, by) = local.project(back);
    let (fx, fy) = local.project(front);
    let on_segment = project_on_segment(
        LatLon::new(0.0, 0.0),
        LatLon::new(by, bx),
        LatLon::new(fy, fx),
    );
    let junction = match on_segment.fraction {
        f if f <= 0.0 => back,
        f if f >= 1.0 => front,
        _ => local.unproject(on_segment.point.lon, on_segment.point.lat),
    };

    SegmentProjection {
        segment,
        one_way: graph.road(segment.feature_id()).one_way,
        segment_back: back,
        segment_front: front,
        junction,
        distance: (graph.estimator().metric())(origin, junction),
    }
}
