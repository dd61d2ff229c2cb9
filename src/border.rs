// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use lru::LruCache;

use crate::{RegionId, RouteWeight};

/// Name of the root of the region hierarchy. Its direct children are countries.
pub const ROOT_NAME: &str = "Countries";

const MAX_HIERARCHY_DEPTH: usize = 32;

const COUNTRY_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(n) => n,
    None => unreachable!(),
};

/// Source of the region hierarchy: maps a region (or group) name to its parent's name.
pub trait ParentNameLookup: Send + Sync {
    fn parent(&self, name: &str) -> Option<String>;
}

impl ParentNameLookup for HashMap<String, String> {
    fn parent(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Finds the country containing a region, by following parent names
/// until a direct child of [ROOT_NAME].
///
/// Returns `None` if the chain of parents breaks before reaching the root.
pub fn country_by_region_name(name: &str, lookup: &dyn ParentNameLookup) -> Option<String> {
    let mut current = name.to_string();
    for _ in 0..MAX_HIERARCHY_DEPTH {
        let parent = lookup.parent(&current)?;
        if parent == ROOT_NAME {
            return Some(current);
        }
        current = parent;
    }
    None
}

/// Which border crossings are free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderRules {
    /// Penalty for crossing a border with customs control, in seconds.
    pub penalty_seconds: f64,

    /// Groups of countries without customs control between members.
    pub unions: &'static [&'static [&'static str]],

    /// Pairs of countries without customs control between each other.
    pub exceptions: &'static [(&'static str, &'static str)],

    /// Regions whose crossings are never penalized, as their country is disputed.
    pub whitelist: &'static [&'static str],
}

impl BorderRules {
    fn in_one_union(&self, a: &str, b: &str) -> bool {
        self.unions
            .iter()
            .any(|members| members.contains(&a) && members.contains(&b))
    }

    fn is_exception(&self, a: &str, b: &str) -> bool {
        self.exceptions
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

const SCHENGEN_AND_EU: &[&str] = &[
    "Austria",
    "Belgium",
    "Bulgaria",
    "Croatia",
    "Cyprus",
    "Czech Republic",
    "Denmark",
    "Estonia",
    "Finland",
    "France",
    "Germany",
    "Greece",
    "Hungary",
    "Iceland",
    "Ireland",
    "Italy",
    "Latvia",
    "Liechtenstein",
    "Lithuania",
    "Luxembourg",
    "Malta",
    "Netherlands",
    "Norway",
    "Poland",
    "Portugal",
    "Romania",
    "Slovakia",
    "Slovenia",
    "Spain",
    "Sweden",
    "Switzerland",
];

const EURASIAN_ECONOMIC_UNION: &[&str] = &[
    "Armenia",
    "Belarus",
    "Kazakhstan",
    "Kyrgyzstan",
    "Russian Federation",
];

pub const DEFAULT_BORDER_RULES: BorderRules = BorderRules {
    penalty_seconds: 2.0 * 60.0 * 60.0,
    unions: &[SCHENGEN_AND_EU, EURASIAN_ECONOMIC_UNION],
    exceptions: &[("Ireland", "United Kingdom")],
    whitelist: &["Jerusalem"],
};

/// Penalizes routes crossing borders with customs control.
pub struct CrossBorderPenalty {
    rules: BorderRules,
    region_names: HashMap<RegionId, String>,
    lookup: Box<dyn ParentNameLookup>,
    countries: Mutex<LruCache<RegionId, Option<String>>>,
}

impl CrossBorderPenalty {
    pub fn new(
        rules: BorderRules,
        region_names: HashMap<RegionId, String>,
        lookup: impl ParentNameLookup + 'static,
    ) -> Self {
        Self {
            rules,
            region_names,
            lookup: Box::new(lookup),
            countries: Mutex::new(LruCache::new(COUNTRY_CACHE_SIZE)),
        }
    }

    pub fn rules(&self) -> &BorderRules {
        &self.rules
    }

    fn is_whitelisted(&self, region: RegionId) -> bool {
        self.region_names
            .get(&region)
            .is_some_and(|name| self.rules.whitelist.contains(&name.as_str()))
    }

    fn country(&self, region: RegionId) -> Option<String> {
        let mut cache = self.countries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(country) = cache.get(&region) {
            return country.clone();
        }

        let country = self
            .region_names
            .get(&region)
            .and_then(|name| country_by_region_name(name, self.lookup.as_ref()));
        if country.is_none() {
            log::debug!("country of region {} is unknown", region);
        }
        cache.put(region, country.clone());
        country
    }

    /// Checks whether moving between two regions crosses a border with customs control.
    pub fn has_penalty(&self, a: RegionId, b: RegionId) -> bool {
        if a == b || self.is_whitelisted(a) || self.is_whitelisted(b) {
            return false;
        }

        let (Some(country_a), Some(country_b)) = (self.country(a), self.country(b)) else {
            return true;
        };

        country_a != country_b
            && !self.rules.in_one_union(&country_a, &country_b)
            && !self.rules.is_exception(&country_a, &country_b)
    }

    pub fn penalty(&self, a: RegionId, b: RegionId) -> RouteWeight {
        if self.has_penalty(a, b) {
            RouteWeight::new(self.rules.penalty_seconds)
        } else {
            RouteWeight::ZERO
        }
    }
}

impl std::fmt::Debug for CrossBorderPenalty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossBorderPenalty")
            .field("rules", &self.rules)
            .field("regions", &self.region_names.len())
            .finish_non_exhaustive()
    }
}
