// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::astar::Edge;
use crate::RouteWeight;

/// Numeric identifier of a region (map tile) with its own road graph.
pub type RegionId = u16;

/// Region id of all synthetic, non-persisted segments.
pub const FAKE_REGION_ID: RegionId = RegionId::MAX;

/// Feature id of segments created by the [starter](crate::IndexGraphStarter)
/// for arbitrary start and finish points.
pub const FAKE_FEATURE_ID: u32 = u32::MAX;

/// [Edge] between two [Segments](Segment).
pub type SegmentEdge = Edge<Segment, RouteWeight>;

/// Identifies a point inside a road's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoadPoint {
    pub feature_id: u32,
    pub point_id: u32,
}

impl RoadPoint {
    pub const fn new(feature_id: u32, point_id: u32) -> Self {
        Self {
            feature_id,
            point_id,
        }
    }
}

impl fmt::Display for RoadPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoadPoint({}, {})", self.feature_id, self.point_id)
    }
}

/// Directed arrow between two consecutive points of a road polyline.
///
/// Segment `i` of a feature connects points `i` and `i + 1`. A `forward` segment
/// travels from point `i` to `i + 1`; a backward one travels from `i + 1` to `i`.
///
/// Segments are small values - all data associated with them lives in external maps
/// keyed by the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    region: RegionId,
    feature_id: u32,
    segment_idx: u32,
    forward: bool,
}

impl Segment {
    pub const fn new(region: RegionId, feature_id: u32, segment_idx: u32, forward: bool) -> Self {
        Self {
            region,
            feature_id,
            segment_idx,
            forward,
        }
    }

    /// Creates a synthetic segment with the given id.
    pub const fn fake(id: u32) -> Self {
        Self::new(FAKE_REGION_ID, FAKE_FEATURE_ID, id, true)
    }

    #[inline]
    pub const fn region_id(&self) -> RegionId {
        self.region
    }

    #[inline]
    pub const fn feature_id(&self) -> u32 {
        self.feature_id
    }

    #[inline]
    pub const fn segment_idx(&self) -> u32 {
        self.segment_idx
    }

    #[inline]
    pub const fn is_forward(&self) -> bool {
        self.forward
    }

    /// Returns true for segments backed by persisted road geometry.
    #[inline]
    pub const fn is_real(&self) -> bool {
        self.region != FAKE_REGION_ID
    }

    /// Returns true for segments created for a single search by the starter.
    #[inline]
    pub const fn is_fake_created(&self) -> bool {
        self.feature_id == FAKE_FEATURE_ID
    }

    /// Returns the index of the head (`front == true`) or the tail point of the segment.
    #[inline]
    pub const fn point_id(&self, front: bool) -> u32 {
        if front == self.forward {
            self.segment_idx + 1
        } else {
            self.segment_idx
        }
    }

    #[inline]
    pub const fn min_point_id(&self) -> u32 {
        self.segment_idx
    }

    #[inline]
    pub const fn max_point_id(&self) -> u32 {
        self.segment_idx + 1
    }

    /// Returns the head (`front == true`) or the tail [RoadPoint] of the segment.
    #[inline]
    pub const fn road_point(&self, front: bool) -> RoadPoint {
        RoadPoint::new(self.feature_id, self.point_id(front))
    }

    /// Returns the same piece of road traveled in the opposite direction.
    #[inline]
    pub const fn reversed(&self) -> Self {
        Self::new(self.region, self.feature_id, self.segment_idx, !self.forward)
    }

    /// Checks if `other` is the same piece of road traveled in the opposite direction.
    #[inline]
    pub fn is_inverse(&self, other: &Self) -> bool {
        self.region == other.region
            && self.feature_id == other.feature_id
            && self.segment_idx == other.segment_idx
            && self.forward != other.forward
    }

    /// Returns the neighboring segment along the same feature, towards higher
    /// (`increasing == true`) or lower point indices.
    #[inline]
    pub fn next(&self, increasing: bool) -> Self {
        let segment_idx = if increasing {
            self.segment_idx + 1
        } else {
            assert!(self.segment_idx > 0, "no segment before {self}");
            self.segment_idx - 1
        };
        Self::new(self.region, self.feature_id, segment_idx, self.forward)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Segment(region={}, feature={}, idx={}, {})",
            self.region,
            self.feature_id,
            self.segment_idx,
            if self.forward { "forward" } else { "backward" },
        )
    }
}
