// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::LatLon;
use crate::estimator::Metric;

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree),
/// used to find road points close to arbitrary positions (start and finish of a route)
/// without checking every point of a region.
///
/// This implementation splits space along latitude and longitude as if they were
/// euclidean coordinates, and measures distances with the provided [Metric].
/// This results in undefined behavior when points are close to the ante meridian
/// (180°/-180° longitude) or poles (90°/-90° latitude).
#[derive(Debug, Clone)]
pub struct KDTree<T> {
    pivot: (LatLon, T),
    left: Option<Box<KDTree<T>>>,
    right: Option<Box<KDTree<T>>>,
}

impl<T: Copy> KDTree<T> {
    /// Appends all items within `radius` of the given position (with their distances) to `out`.
    pub fn find_within(&self, pos: LatLon, radius: f64, metric: Metric, out: &mut Vec<(T, f64)>) {
        self.find_within_impl(pos, radius, metric, false, out);
    }

    fn find_within_impl(
        &self,
        pos: LatLon,
        radius: f64,
        metric: Metric,
        lon_divides: bool,
        out: &mut Vec<(T, f64)>,
    ) {
        let dist = metric(pos, self.pivot.0);
        if dist <= radius {
            out.push((self.pivot.1, dist));
        }

        let (near, far) = if self.goes_left(pos, lon_divides) {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(ref branch) = near {
            branch.find_within_impl(pos, radius, metric, !lon_divides, out);
        }

        if let Some(ref branch) = far {
            if self.distance_to_axis(pos, metric, lon_divides) <= radius {
                branch.find_within_impl(pos, radius, metric, !lon_divides, out);
            }
        }
    }

    #[inline]
    fn goes_left(&self, pos: LatLon, lon_divides: bool) -> bool {
        if lon_divides {
            pos.lon < self.pivot.0.lon
        } else {
            pos.lat < self.pivot.0.lat
        }
    }

    #[inline]
    fn distance_to_axis(&self, pos: LatLon, metric: Metric, lon_divides: bool) -> f64 {
        let axis = if lon_divides {
            LatLon::new(pos.lat, self.pivot.0.lon)
        } else {
            LatLon::new(self.pivot.0.lat, pos.lon)
        };
        metric(pos, axis)
    }

    /// Builds a k-d tree from a mutable slice of positioned items. Items will be reordered
    /// in the slice to facilitate building the tree.
    pub fn build(items: &mut [(LatLon, T)]) -> Option<Self> {
        Self::build_impl(items, false)
    }

    fn build_impl(items: &mut [(LatLon, T)], lon_divides: bool) -> Option<Self> {
        match items.len() {
            0 => None,
            1 => Some(Self {
                pivot: items[0],
                left: None,
                right: None,
            }),
            _ => {
                if lon_divides {
                    items.sort_by(|a, b| a.0.lon.total_cmp(&b.0.lon));
                } else {
                    items.sort_by(|a, b| a.0.lat.total_cmp(&b.0.lat));
                }
                let median = items.len() / 2;
                let pivot = items[median];
                let (left, right_and_pivot) = items.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: Self::build_impl(left, !lon_divides).map(Box::new),
                    right: Self::build_impl(right, !lon_divides).map(Box::new),
                })
            }
        }
    }
}
