// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::distance::LatLon;
use crate::index_graph::IndexGraph;
use crate::{Error, RegionId};

/// Provider of region road graphs, usually backed by the region containers on disk.
pub trait RegionGraphSource: Send + Sync {
    /// Loads the road graph of a region.
    fn load(&self, region: RegionId) -> Result<Arc<IndexGraph>, Error>;

    /// Lists regions which may contain roads close to `position`.
    fn regions_near(&self, position: LatLon) -> Vec<RegionId>;
}

/// Bounding box of a region, used to pick regions for snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: LatLon,
    pub max: LatLon,
}

impl Bounds {
    pub fn contains(&self, p: LatLon) -> bool {
        (self.min.lat..=self.max.lat).contains(&p.lat)
            && (self.min.lon..=self.max.lon).contains(&p.lon)
    }
}

/// [RegionGraphSource] over graphs already held in memory.
#[derive(Debug, Default, Clone)]
pub struct PrebuiltGraphs {
    graphs: HashMap<RegionId, Arc<IndexGraph>>,
    bounds: HashMap<RegionId, Bounds>,
}

impl PrebuiltGraphs {
    pub fn insert(&mut self, graph: IndexGraph) {
        self.graphs.insert(graph.region_id(), Arc::new(graph));
    }

    /// Limits snapping near `region` to positions inside `bounds`.
    /// Regions without bounds are considered near every position.
    pub fn set_bounds(&mut self, region: RegionId, bounds: Bounds) {
        self.bounds.insert(region, bounds);
    }
}

impl FromIterator<IndexGraph> for PrebuiltGraphs {
    fn from_iter<I: IntoIterator<Item = IndexGraph>>(iter: I) -> Self {
        let mut graphs = Self::default();
        for graph in iter {
            graphs.insert(graph);
        }
        graphs
    }
}

impl RegionGraphSource for PrebuiltGraphs {
    fn load(&self, region: RegionId) -> Result<Arc<IndexGraph>, Error> {
        self.graphs
            .get(&region)
            .cloned()
            .ok_or(Error::UnknownRegion(region))
    }

    fn regions_near(&self, position: LatLon) -> Vec<RegionId> {
        let mut regions: Vec<RegionId> = self
            .graphs
            .keys()
            .copied()
            .filter(|r| self.bounds.get(r).map_or(true, |b| b.contains(position)))
            .collect();
        regions.sort_unstable();
        regions
    }
}
