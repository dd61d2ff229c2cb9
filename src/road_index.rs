// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use crate::joint::{Joint, JointId};
use crate::RoadPoint;

const NO_JOINT: JointId = JointId::MAX;

/// Joint ids of the points of a single road, indexed by point id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoadJointIds {
    joint_ids: Vec<JointId>,
}

impl RoadJointIds {
    pub fn joint_id(&self, point_id: u32) -> Option<JointId> {
        self.joint_ids
            .get(point_id as usize)
            .copied()
            .filter(|&id| id != NO_JOINT)
    }

    fn set(&mut self, point_id: u32, joint_id: JointId) {
        let idx = point_id as usize;
        if self.joint_ids.len() <= idx {
            self.joint_ids.resize(idx + 1, NO_JOINT);
        }
        self.joint_ids[idx] = joint_id;
    }

    /// Iterates over (point id, joint id) pairs of the road, in order of point ids.
    pub fn joints(&self) -> impl Iterator<Item = (u32, JointId)> + '_ {
        self.joint_ids
            .iter()
            .enumerate()
            .filter(|&(_, &id)| id != NO_JOINT)
            .map(|(point_id, &id)| (point_id as u32, id))
    }
}

/// Maps road points to joints, for all roads of a region.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoadIndex {
    roads: BTreeMap<u32, RoadJointIds>,
}

impl RoadIndex {
    /// Builds the index from a list of joints; joint ids are positions in the list.
    ///
    /// Panics if a road point belongs to more than one joint.
    pub fn import(joints: &[Joint]) -> Self {
        let mut index = Self::default();

        for (joint_id, joint) in joints.iter().enumerate() {
            for &point in joint.points() {
                let road = index.roads.entry(point.feature_id).or_default();
                assert!(
                    road.joint_id(point.point_id).is_none(),
                    "{} belongs to more than one joint",
                    point,
                );
                road.set(point.point_id, joint_id as JointId);
            }
        }

        index
    }

    pub fn road(&self, feature_id: u32) -> Option<&RoadJointIds> {
        self.roads.get(&feature_id)
    }

    pub fn joint_id(&self, point: RoadPoint) -> Option<JointId> {
        self.road(point.feature_id)
            .and_then(|r| r.joint_id(point.point_id))
    }

    /// Iterates over ids of all roads with at least one joint, in increasing order.
    pub fn features(&self) -> impl Iterator<Item = u32> + '_ {
        self.roads.keys().copied()
    }
}

/// Read-only table of the road points of every joint, stored in a flat array.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JointIndex {
    points: Vec<RoadPoint>,

    /// Points of joint `i` live in `points[offsets[i]..offsets[i + 1]]`.
    offsets: Vec<u32>,
}

impl JointIndex {
    pub fn build(joints: &[Joint]) -> Self {
        let mut points = Vec::with_capacity(joints.iter().map(Joint::len).sum());
        let mut offsets = Vec::with_capacity(joints.len() + 1);

        offsets.push(0);
        for joint in joints {
            points.extend_from_slice(joint.points());
            offsets.push(points.len() as u32);
        }

        Self { points, offsets }
    }

    /// Returns the number of joints.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the road points of a joint.
    ///
    /// Panics if the joint id is out of range.
    pub fn points(&self, joint_id: JointId) -> &[RoadPoint] {
        let idx = joint_id as usize;
        assert!(idx < self.len(), "joint {} out of range ({} joints)", joint_id, self.len());
        let begin = self.offsets[idx] as usize;
        let end = self.offsets[idx + 1] as usize;
        &self.points[begin..end]
    }
}
