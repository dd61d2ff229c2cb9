// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::segment::{FAKE_FEATURE_ID, FAKE_REGION_ID};
use crate::{RegionId, RoadPoint, Segment};

/// Dense identifier of a joint within a single region.
pub type JointId = u32;

/// Place where several roads meet, as produced by the data generator:
/// the list of road points sharing a single position.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Joint {
    points: Vec<RoadPoint>,
}

impl Joint {
    pub fn new(points: Vec<RoadPoint>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: RoadPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[RoadPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<RoadPoint> for Joint {
    fn from_iter<I: IntoIterator<Item = RoadPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Run of consecutive segments of one road, traveled in one direction,
/// between two joints (or road ends). Vertex of the compressed graph.
///
/// Synthetic joint segments (created around the start and finish of a search)
/// only carry an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointSegment {
    region: RegionId,
    feature_id: u32,
    start_segment_id: u32,
    end_segment_id: u32,
    forward: bool,
}

impl JointSegment {
    /// Creates a joint segment spanning from `from` to `to` (both inclusive).
    ///
    /// Panics if the segments don't belong to the same road, don't share
    /// direction, or are ordered against that direction.
    pub fn new(from: &Segment, to: &Segment) -> Self {
        assert!(
            from.region_id() == to.region_id()
                && from.feature_id() == to.feature_id()
                && from.is_forward() == to.is_forward(),
            "joint segment boundaries {} and {} don't belong to a single road direction",
            from,
            to,
        );
        assert!(
            if from.is_forward() {
                from.segment_idx() <= to.segment_idx()
            } else {
                from.segment_idx() >= to.segment_idx()
            },
            "joint segment boundaries {} and {} are ordered against their direction",
            from,
            to,
        );

        Self {
            region: from.region_id(),
            feature_id: from.feature_id(),
            start_segment_id: from.segment_idx(),
            end_segment_id: to.segment_idx(),
            forward: from.is_forward(),
        }
    }

    pub const fn fake(id: u32) -> Self {
        Self {
            region: FAKE_REGION_ID,
            feature_id: FAKE_FEATURE_ID,
            start_segment_id: id,
            end_segment_id: id,
            forward: true,
        }
    }

    #[inline]
    pub const fn is_fake(&self) -> bool {
        self.region == FAKE_REGION_ID && self.feature_id == FAKE_FEATURE_ID
    }

    /// Returns the id of a fake joint segment, or `None` for real ones.
    #[inline]
    pub fn fake_id(&self) -> Option<u32> {
        self.is_fake().then_some(self.start_segment_id)
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
    pub const fn start_segment_id(&self) -> u32 {
        self.start_segment_id
    }

    #[inline]
    pub const fn end_segment_id(&self) -> u32 {
        self.end_segment_id
    }

    #[inline]
    pub const fn is_forward(&self) -> bool {
        self.forward
    }

    /// Returns the first (`start == true`) or the last segment of a real joint segment.
    pub fn segment(&self, start: bool) -> Segment {
        assert!(!self.is_fake(), "fake joint segment {} has no boundary segments", self);
        let idx = if start {
            self.start_segment_id
        } else {
            self.end_segment_id
        };
        Segment::new(self.region, self.feature_id, idx, self.forward)
    }

    /// Number of segments covered by a real joint segment.
    pub fn len(&self) -> u32 {
        self.start_segment_id.abs_diff(self.end_segment_id) + 1
    }
}

impl fmt::Display for JointSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fake() {
            write!(f, "JointSegment(fake {})", self.start_segment_id)
        } else {
            write!(
                f,
                "JointSegment(region={}, feature={}, {}..{}, {})",
                self.region,
                self.feature_id,
                self.start_segment_id,
                self.end_segment_id,
                if self.forward { "forward" } else { "backward" },
            )
        }
    }
}
