// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::astar::Parents;
use crate::index_graph::Expansion;
use crate::joint::JointSegment;
use crate::{RegionId, Segment};

/// Kind of a sequence [Restriction].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictionKind {
    /// The sequence of features must not be traveled.
    No,

    /// After traveling all features but the last one, the last one must be taken.
    Only,
}

/// Turn restriction over a sequence of features (roads) of a single region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Restriction {
    pub kind: RestrictionKind,
    pub features: Vec<u32>,
}

impl Restriction {
    pub fn no(features: Vec<u32>) -> Self {
        Self {
            kind: RestrictionKind::No,
            features,
        }
    }

    pub fn only(features: Vec<u32>) -> Self {
        Self {
            kind: RestrictionKind::Only,
            features,
        }
    }

    /// Panics if the restriction has fewer than two features, or if it
    /// repeats a feature at two consecutive positions.
    pub(crate) fn validate(&self) {
        assert!(
            self.features.len() >= 2,
            "restriction {:?} must span at least two features",
            self,
        );
        assert!(
            self.features.windows(2).all(|w| w[0] != w[1]),
            "restriction {:?} repeats a feature",
            self,
        );
    }
}

/// Restriction on turning around at the first or last point of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UTurnRestriction {
    pub feature_id: u32,

    /// True if the restriction applies at the first point of the feature,
    /// false if it applies at the last one.
    pub via_is_first_point: bool,

    /// If true, turning around is the only allowed maneuver at that point
    /// (`only_u_turn`); otherwise turning around is forbidden there (`no_u_turn`).
    pub only: bool,
}

/// Vertex of a graph subject to sequence restrictions.
pub trait RestrictionVertex: Copy + Eq + Hash {
    /// Real segment the vertex travels along, or `None` for synthetic vertices,
    /// which interrupt restriction chains.
    fn real_segment(&self) -> Option<Segment>;
}

/// Finds the real segments search vertices travel along.
///
/// Defaults to [RestrictionVertex::real_segment]. Graphs with synthetic vertices
/// standing for parts of real segments provide their own lookup, so that
/// restriction chains continue through such parts.
pub struct Locator<'a, V>(Option<&'a dyn Fn(&V) -> Option<Segment>>);

impl<'a, V: RestrictionVertex> Locator<'a, V> {
    pub fn new(lookup: &'a dyn Fn(&V) -> Option<Segment>) -> Self {
        Self(Some(lookup))
    }

    pub fn real_segment(&self, vertex: &V) -> Option<Segment> {
        match self.0 {
            Some(lookup) => lookup(vertex),
            None => vertex.real_segment(),
        }
    }

    /// Region and feature of the real segment `vertex` travels along.
    fn locate(&self, vertex: &V) -> Option<(RegionId, u32)> {
        self.real_segment(vertex)
            .map(|s| (s.region_id(), s.feature_id()))
    }
}

impl<V> Default for Locator<'_, V> {
    fn default() -> Self {
        Self(None)
    }
}

impl<V> Clone for Locator<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Locator<'_, V> {}

impl<V> fmt::Debug for Locator<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "Locator(custom)" } else { "Locator(default)" })
    }
}

/// Forbidden feature sequences of a single region, indexed for lookups
/// from both search directions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestrictionTable {
    /// Last feature -> preceding features, nearest first; in input order.
    forward: HashMap<u32, Vec<Vec<u32>>>,

    /// First feature -> following features, nearest first; in input order.
    backward: HashMap<u32, Vec<Vec<u32>>>,

    /// Number of features of the longest restriction.
    max_len: usize,
}

impl RestrictionTable {
    /// Builds the table from `No` feature sequences.
    ///
    /// Panics on malformed sequences (see [Restriction::validate]).
    pub fn new<I: IntoIterator<Item = Vec<u32>>>(forbidden: I) -> Self {
        let mut table = Self::default();

        for features in forbidden {
            Restriction::no(features.clone()).validate();
            table.max_len = table.max_len.max(features.len());

            let (&last, preceding) = features
                .split_last()
                .unwrap_or_else(|| unreachable!("validated restriction can't be empty"));
            table
                .forward
                .entry(last)
                .or_default()
                .push(preceding.iter().rev().copied().collect());

            let (&first, following) = features
                .split_first()
                .unwrap_or_else(|| unreachable!("validated restriction can't be empty"));
            table
                .backward
                .entry(first)
                .or_default()
                .push(following.to_vec());
        }

        table
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Checks whether moving from the expanded vertex, traveling `segment`,
    /// onto `next_feature` completes a forbidden sequence.
    ///
    /// For outgoing searches the sequence is completed with the features the search
    /// passed through before reaching the vertex (as recorded in its parents). For ingoing
    /// searches parents lead towards the finish and the sequence is matched backwards.
    pub fn is_restricted<V: RestrictionVertex>(
        &self,
        at: &Expansion<'_, V>,
        segment: &Segment,
        next_feature: u32,
    ) -> bool {
        let feature = segment.feature_id();
        if feature == next_feature {
            return false;
        }

        let table = if at.is_outgoing {
            &self.forward
        } else {
            &self.backward
        };

        table.get(&next_feature).is_some_and(|sequences| {
            sequences
                .iter()
                .any(|seq| Self::chain_matches(at, segment, seq))
        })
    }

    /// Checks whether `seq` (nearest first) matches the features walked through to
    /// reach the expanded vertex, starting with the feature of `segment` itself.
    /// Consecutive vertices on the same feature are collapsed.
    fn chain_matches<V: RestrictionVertex>(at: &Expansion<'_, V>, segment: &Segment, seq: &[u32]) -> bool {
        let region = segment.region_id();
        let mut last_feature = segment.feature_id();
        if seq.first() != Some(&last_feature) {
            return false;
        }

        let mut matched = 1;
        let mut current = *at.vertex;
        while matched < seq.len() {
            let Some(&parent) = at.parents.get(&current) else {
                return false;
            };
            let Some((parent_region, feature)) = at.locator.locate(&parent) else {
                return false;
            };
            if parent_region != region {
                return false;
            }

            if feature != last_feature {
                if feature != seq[matched] {
                    return false;
                }
                matched += 1;
                last_feature = feature;
            }
            current = parent;
        }

        true
    }

    /// Checks whether joining the forward and the backward wave at `common`
    /// would make the route travel a forbidden sequence spanning the meeting point.
    ///
    /// Sequences ending or starting on the feature of `common` are already enforced
    /// by the waves themselves, so only sequences with `common`'s feature strictly
    /// inside are checked here.
    pub fn are_waves_connectible<V: RestrictionVertex>(
        &self,
        forward_parents: &Parents<V>,
        common: &V,
        backward_parents: &Parents<V>,
        locator: Locator<'_, V>,
    ) -> bool {
        if self.is_empty() {
            return true;
        }

        let Some((region, common_feature)) = locator.locate(common) else {
            return true;
        };

        let mut chain = self.collect_features(common, region, common_feature, forward_parents, locator);
        chain.reverse();
        let meeting = chain.len();
        chain.push(common_feature);
        chain.extend(self.collect_features(common, region, common_feature, backward_parents, locator));

        for end in (meeting + 1)..chain.len() {
            let Some(sequences) = self.forward.get(&chain[end]) else {
                continue;
            };

            for seq in sequences {
                // seq holds the features preceding chain[end], nearest first
                if seq.len() > end || end - seq.len() >= meeting {
                    continue;
                }

                if seq
                    .iter()
                    .enumerate()
                    .all(|(k, &feature)| chain[end - 1 - k] == feature)
                {
                    return false;
                }
            }
        }

        true
    }

    /// Walks the parent chain of `start`, returning the features passed through
    /// (nearest first, collapsed, excluding `start`'s own feature).
    fn collect_features<V: RestrictionVertex>(
        &self,
        start: &V,
        region: RegionId,
        start_feature: u32,
        parents: &Parents<V>,
        locator: Locator<'_, V>,
    ) -> Vec<u32> {
        let mut features = Vec::default();
        let mut last = start_feature;
        let mut current = *start;

        while features.len() < self.max_len {
            let Some(&parent) = parents.get(&current) else {
                break;
            };
            let Some((parent_region, feature)) = locator.locate(&parent) else {
                break;
            };
            if parent_region != region {
                break;
            }

            if feature != last {
                features.push(feature);
                last = feature;
            }
            current = parent;
        }

        features
    }
}

/// U-turn restrictions of a single region.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UTurnTable {
    /// feature -> (via first point, only) pairs
    restrictions: HashMap<u32, Vec<(bool, bool)>>,
}

impl UTurnTable {
    pub fn new<I: IntoIterator<Item = UTurnRestriction>>(restrictions: I) -> Self {
        let mut table = Self::default();
        for r in restrictions {
            table
                .restrictions
                .entry(r.feature_id)
                .or_default()
                .push((r.via_is_first_point, r.only));
        }
        table
    }

    fn has(&self, feature_id: u32, at_first_point: bool, only: bool) -> bool {
        self.restrictions
            .get(&feature_id)
            .is_some_and(|v| v.contains(&(at_first_point, only)))
    }

    /// Checks for a `no_u_turn` restriction at the first (`at_first_point`) or last point of a feature.
    pub fn no_u_turn(&self, feature_id: u32, at_first_point: bool) -> bool {
        self.has(feature_id, at_first_point, false)
    }

    /// Checks for an `only_u_turn` restriction at the first (`at_first_point`) or last point of a feature.
    pub fn only_u_turn(&self, feature_id: u32, at_first_point: bool) -> bool {
        self.has(feature_id, at_first_point, true)
    }
}

impl RestrictionVertex for Segment {
    fn real_segment(&self) -> Option<Segment> {
        self.is_real().then_some(*self)
    }
}

impl RestrictionVertex for JointSegment {
    fn real_segment(&self) -> Option<Segment> {
        (!self.is_fake()).then(|| self.segment(true))
    }
}
