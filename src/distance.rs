// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fmt;

/// Mean radius of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_RADIUS: f64 = 6_371_008.8;

/// Mean diameter of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Position on Earth, in degrees.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the [haversine formula](https://en.wikipedia.org/wiki/Haversine_formula).
/// Returns the result in meters.
pub fn earth_distance(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lon1 = a.lon.to_radians();
    let lat2 = b.lat.to_radians();
    let lon2 = b.lon.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    EARTH_DIAMETER * h.sqrt().min(1.0).asin()
}

/// Local [equirectangular projection](https://en.wikipedia.org/wiki/Equirectangular_projection)
/// centered around a reference point, mapping positions to meters east and north
/// of that point.
///
/// Only accurate within a couple of kilometers from the reference point, which is
/// enough for snapping positions to nearby roads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: LatLon,
    cos_lat: f64,
}

impl LocalProjection {
    pub fn new(origin: LatLon) -> Self {
        Self {
            origin,
            cos_lat: origin.lat.to_radians().cos(),
        }
    }

    /// Returns the (east, north) offset of `p` from the origin, in meters.
    pub fn project(&self, p: LatLon) -> (f64, f64) {
        let x = (p.lon - self.origin.lon).to_radians() * self.cos_lat * EARTH_RADIUS;
        let y = (p.lat - self.origin.lat).to_radians() * EARTH_RADIUS;
        (x, y)
    }

    /// Inverse of [LocalProjection::project].
    pub fn unproject(&self, x: f64, y: f64) -> LatLon {
        let lat = self.origin.lat + (y / EARTH_RADIUS).to_degrees();
        let lon = if self.cos_lat.abs() < f64::EPSILON {
            self.origin.lon
        } else {
            self.origin.lon + (x / (EARTH_RADIUS * self.cos_lat)).to_degrees()
        };
        LatLon::new(lat, lon)
    }
}

/// Result of projecting a point onto a straight segment `a -> b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Closest position on the segment.
    pub point: LatLon,

    /// Position of [Projection::point] along the segment, from 0 (at `a`) to 1 (at `b`).
    pub fraction: f64,
}

/// Finds the point of segment `a -> b` closest to `p`, using a planar metric
/// in which latitude is `y` and longitude is `x`.
///
/// Callers working in geographic coordinates should first move everything into a
/// [LocalProjection].
pub fn project_on_segment(p: LatLon, a: LatLon, b: LatLon) -> Projection {
    let (dx, dy) = (b.lon - a.lon, b.lat - a.lat);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON * f64::EPSILON {
        return Projection {
            point: a,
            fraction: 0.0,
        };
    }

    let t = (((p.lon - a.lon) * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0);
    Projection {
        point: LatLon::new(a.lat + t * dy, a.lon + t * dx),
        fraction: t,
    }
}
