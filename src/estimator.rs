// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::{earth_distance, LatLon};
use crate::geometry::RoadGeometry;
use crate::profile::VehicleProfile;
use crate::{RouteWeight, Segment};

/// Distance between two positions, in meters.
pub type Metric = fn(LatLon, LatLon) -> f64;

/// What edge weights are used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Weights minimized by searches; include all penalties.
    Weight,

    /// Estimated time of arrival shown to the user; only includes penalties
    /// for maneuvers which actually take time.
    Eta,
}

/// Converts road geometry and maneuvers into [RouteWeights](RouteWeight) (seconds)
/// for a specific [VehicleProfile].
#[derive(Debug, Clone, Copy)]
pub struct EdgeEstimator {
    profile: VehicleProfile,
    metric: Metric,
}

impl EdgeEstimator {
    /// Creates an estimator measuring distances along the Earth's surface.
    pub fn new(profile: VehicleProfile) -> Self {
        Self::with_metric(profile, earth_distance)
    }

    pub fn with_metric(profile: VehicleProfile, metric: Metric) -> Self {
        Self { profile, metric }
    }

    pub fn profile(&self) -> &VehicleProfile {
        &self.profile
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    #[inline]
    fn time(&self, from: LatLon, to: LatLon, speed_kmph: f64) -> RouteWeight {
        RouteWeight::new((self.metric)(from, to) / VehicleProfile::mps(speed_kmph))
    }

    /// Lower bound on the weight of any route between two positions.
    pub fn calc_heuristic(&self, from: LatLon, to: LatLon) -> RouteWeight {
        self.time(from, to, self.profile.max_speed_kmph)
    }

    /// Weight of a leap between two positions without a precomputed weight.
    pub fn calc_leap_weight(&self, from: LatLon, to: LatLon) -> RouteWeight {
        self.time(from, to, self.profile.leap_speed_kmph)
    }

    /// Weight of moving between a requested position and the road network.
    pub fn calc_offroad(&self, from: LatLon, to: LatLon) -> RouteWeight {
        self.time(from, to, self.profile.offroad_speed_kmph)
    }

    /// Weight of traveling a whole segment of `road`.
    ///
    /// Segments of invalid roads weigh [RouteWeight::MAX].
    pub fn calc_segment_weight(&self, segment: &Segment, road: &RoadGeometry) -> RouteWeight {
        if !road.is_valid() {
            return RouteWeight::MAX;
        }

        let from = road.point(segment.point_id(false));
        let to = road.point(segment.point_id(true));
        self.time(from, to, road.speed(segment.is_forward()))
    }

    pub fn u_turn_penalty(&self, _purpose: Purpose) -> RouteWeight {
        RouteWeight::new(self.profile.u_turn_penalty)
    }

    pub fn ferry_landing_penalty(&self, _purpose: Purpose) -> RouteWeight {
        RouteWeight::new(self.profile.ferry_landing_penalty)
    }

    pub fn pass_through_penalty(&self, purpose: Purpose) -> RouteWeight {
        self.weight_only(purpose, self.profile.pass_through_penalty)
    }

    pub fn access_change_penalty(&self, purpose: Purpose) -> RouteWeight {
        self.weight_only(purpose, self.profile.access_change_penalty)
    }

    pub fn conditional_access_penalty(&self, purpose: Purpose) -> RouteWeight {
        self.weight_only(purpose, self.profile.conditional_access_penalty)
    }

    #[inline]
    fn weight_only(&self, purpose: Purpose, seconds: f64) -> RouteWeight {
        match purpose {
            Purpose::Weight => RouteWeight::new(seconds),
            Purpose::Eta => RouteWeight::ZERO,
        }
    }
}
