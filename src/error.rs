// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::RegionId;

/// Failures of loading or configuring routing data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unknown region: {0}")]
    UnknownRegion(RegionId),

    #[error("malformed opening hours {rule:?}: {reason}")]
    MalformedOpeningHours { rule: String, reason: &'static str },

    #[error("unknown access tag: {0:?}")]
    UnknownAccessTag(String),
}
