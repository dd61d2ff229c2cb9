// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;

use crate::distance::LatLon;
use crate::profile::RoadOptions;
use crate::RoadPoint;

/// Default number of roads kept in a [Geometry] cache.
pub const DEFAULT_GEOMETRY_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(4096) {
    Some(n) => n,
    None => panic!("cache size must not be zero"),
};

/// Shape and routing attributes of a single road (feature).
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    points: Vec<LatLon>,
    valid: bool,

    /// If true, only forward segments (towards higher point indices) may be used.
    pub one_way: bool,

    /// Travel speed towards higher point indices, in km/h.
    pub forward_speed_kmph: f64,

    /// Travel speed towards lower point indices, in km/h.
    pub backward_speed_kmph: f64,

    /// False for roads which may only be used to reach destinations along them.
    pub pass_through_allowed: bool,

    pub options: RoadOptions,
}

impl RoadGeometry {
    /// Creates a routable road with the same speed in both directions.
    /// Roads with fewer than two points are not routable.
    pub fn new(points: Vec<LatLon>, speed_kmph: f64, one_way: bool) -> Self {
        Self {
            valid: points.len() >= 2 && speed_kmph > 0.0,
            points,
            one_way,
            forward_speed_kmph: speed_kmph,
            backward_speed_kmph: speed_kmph,
            pass_through_allowed: true,
            options: RoadOptions::default(),
        }
    }

    /// Creates a road which must never be used for routing.
    pub fn invalid() -> Self {
        Self {
            points: Vec::default(),
            valid: false,
            one_way: false,
            forward_speed_kmph: 0.0,
            backward_speed_kmph: 0.0,
            pass_through_allowed: true,
            options: RoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_pass_through(mut self, allowed: bool) -> Self {
        self.pass_through_allowed = allowed;
        self
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn is_ferry(&self) -> bool {
        self.options.ferry
    }

    #[inline]
    pub fn points_count(&self) -> u32 {
        self.points.len() as u32
    }

    #[inline]
    pub fn segments_count(&self) -> u32 {
        self.points_count().saturating_sub(1)
    }

    pub fn points(&self) -> &[LatLon] {
        &self.points
    }

    /// Returns the position of the given point.
    ///
    /// Panics if the point is out of range.
    pub fn point(&self, point_id: u32) -> LatLon {
        *self.points.get(point_id as usize).unwrap_or_else(|| {
            panic!(
                "point {} out of range of a road with {} points",
                point_id,
                self.points.len()
            )
        })
    }

    /// Returns the speed towards higher (`forward == true`) or lower point indices, in km/h.
    #[inline]
    pub fn speed(&self, forward: bool) -> f64 {
        if forward {
            self.forward_speed_kmph
        } else {
            self.backward_speed_kmph
        }
    }
}

/// Source of road geometry, usually backed by the region container on disk.
pub trait GeometryLoader: Send + Sync {
    /// Loads the road with the given feature id. Unknown features should be
    /// returned as [RoadGeometry::invalid].
    fn load(&self, feature_id: u32) -> RoadGeometry;
}

impl GeometryLoader for HashMap<u32, RoadGeometry> {
    fn load(&self, feature_id: u32) -> RoadGeometry {
        self.get(&feature_id)
            .cloned()
            .unwrap_or_else(RoadGeometry::invalid)
    }
}

/// Road geometry of a region, loaded on demand and kept in a bounded LRU cache.
///
/// Safe to share between threads.
pub struct Geometry {
    loader: Box<dyn GeometryLoader>,
    cache: Mutex<LruCache<u32, Arc<RoadGeometry>>>,
}

impl Geometry {
    /// Creates a geometry cache holding up to [DEFAULT_GEOMETRY_CACHE_SIZE] roads.
    pub fn new(loader: impl GeometryLoader + 'static) -> Self {
        Self::with_capacity(loader, DEFAULT_GEOMETRY_CACHE_SIZE)
    }

    pub fn with_capacity(loader: impl GeometryLoader + 'static, capacity: NonZeroUsize) -> Self {
        Self {
            loader: Box::new(loader),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the geometry of the given road, loading it if it's not cached.
    pub fn road(&self, feature_id: u32) -> Arc<RoadGeometry> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(road) = cache.get(&feature_id) {
            return Arc::clone(road);
        }

        let road = Arc::new(self.loader.load(feature_id));
        cache.put(feature_id, Arc::clone(&road));
        road
    }

    /// Returns the position of a road point.
    pub fn point(&self, point: RoadPoint) -> LatLon {
        self.road(point.feature_id).point(point.point_id)
    }
}

impl std::fmt::Debug for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self
            .cache
            .lock()
            .map(|c| c.len())
            .unwrap_or_default();
        f.debug_struct("Geometry").field("cached", &cached).finish()
    }
}
