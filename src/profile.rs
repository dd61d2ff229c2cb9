// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Describes how a specific kind of vehicle moves over the road network.
///
/// All penalties are expressed in seconds and must be finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleProfile {
    /// Human readable name of the profile, used only for logging.
    pub name: &'static str,

    /// Highest speed the vehicle may achieve, in km/h. The A* heuristic divides
    /// straight-line distances by this speed, so no road may be faster.
    pub max_speed_kmph: f64,

    /// Speed used to reach the road network from the requested start or finish
    /// position, in km/h.
    pub offroad_speed_kmph: f64,

    /// Speed used to estimate weights of leaps (crossings of whole regions)
    /// without precomputed weights, in km/h. Must not exceed [VehicleProfile::max_speed_kmph].
    pub leap_speed_kmph: f64,

    /// Penalty for turning around in place.
    pub u_turn_penalty: f64,

    /// Penalty for boarding a ferry from a non-ferry road.
    pub ferry_landing_penalty: f64,

    /// Penalty for leaving a road which allows passing through for a road which does not.
    pub pass_through_penalty: f64,

    /// Penalty for moving between roads with different access (e.g. from a public
    /// road into a private one).
    pub access_change_penalty: f64,

    /// Penalty for using a road whose conditional access is uncertain
    /// at the simulated arrival time.
    pub conditional_access_penalty: f64,

    /// Whether long-distance searches may use leaps between region transitions.
    pub use_leaps: bool,

    /// Whether searches run on the graph compressed into joint segments.
    pub use_joints: bool,

    /// Multiplier applied to the heuristic start-finish estimate to obtain
    /// the upper bound on the length of any route.
    pub length_limit_factor: f64,

    /// Lower bound on the route length limit, in seconds.
    pub min_length_limit: f64,

    /// Radius within which the start and finish positions are snapped to roads, in meters.
    pub snapping_radius: f64,
}

impl VehicleProfile {
    /// Converts a speed in km/h into m/s.
    #[inline]
    pub fn mps(kmph: f64) -> f64 {
        kmph / 3.6
    }
}

pub const CAR_PROFILE: VehicleProfile = VehicleProfile {
    name: "car",
    max_speed_kmph: 140.0,
    offroad_speed_kmph: 10.0,
    leap_speed_kmph: 90.0,
    u_turn_penalty: 120.0,
    ferry_landing_penalty: 1200.0,
    pass_through_penalty: 3600.0,
    access_change_penalty: 3600.0,
    conditional_access_penalty: 1800.0,
    use_leaps: true,
    use_joints: true,
    length_limit_factor: 3.0,
    min_length_limit: 1800.0,
    snapping_radius: 1000.0,
};

pub const BICYCLE_PROFILE: VehicleProfile = VehicleProfile {
    name: "bicycle",
    max_speed_kmph: 25.0,
    offroad_speed_kmph: 3.0,
    leap_speed_kmph: 20.0,
    u_turn_penalty: 20.0,
    ferry_landing_penalty: 600.0,
    pass_through_penalty: 0.0,
    access_change_penalty: 1800.0,
    conditional_access_penalty: 900.0,
    use_leaps: false,
    use_joints: true,
    length_limit_factor: 3.0,
    min_length_limit: 1800.0,
    snapping_radius: 1000.0,
};

pub const FOOT_PROFILE: VehicleProfile = VehicleProfile {
    name: "foot",
    max_speed_kmph: 5.0,
    offroad_speed_kmph: 3.0,
    leap_speed_kmph: 4.0,
    u_turn_penalty: 0.0,
    ferry_landing_penalty: 480.0,
    pass_through_penalty: 0.0,
    access_change_penalty: 1800.0,
    conditional_access_penalty: 900.0,
    use_leaps: false,
    use_joints: true,
    length_limit_factor: 3.0,
    min_length_limit: 1800.0,
    snapping_radius: 500.0,
};

/// Kinds of roads a road may belong to, from the point of view of [RoutingOptions].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoadOptions {
    pub toll: bool,
    pub ferry: bool,
    pub dirt: bool,
    pub motorway: bool,
}

/// User preferences excluding certain kinds of roads from routing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoutingOptions {
    pub avoid_toll: bool,
    pub avoid_ferry: bool,
    pub avoid_dirt: bool,
    pub avoid_motorway: bool,
}

impl RoutingOptions {
    /// Returns true if a road with the provided options must not be used.
    pub fn excludes(&self, road: &RoadOptions) -> bool {
        (self.avoid_toll && road.toll)
            || (self.avoid_ferry && road.ferry)
            || (self.avoid_dirt && road.dirt)
            || (self.avoid_motorway && road.motorway)
    }
}
