// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Number of vertex expansions between two polls of a [Cancellable](super::Cancellable)
/// flag. The bidirectional search also switches between its waves with this period.
pub const POLL_PERIOD: usize = 128;

/// Unsuccessful outcomes of [find_path](super::find_path),
/// [find_path_bidirectional](super::find_path_bidirectional) and
/// [adjust_route](super::adjust_route).
///
/// Neither of those is a malfunction - both are ordinary results of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AStarError {
    /// The graph has no admissible route between the requested vertices, the visitor
    /// has stopped the search, or the length predicate has rejected all candidates.
    #[error("no path")]
    NoPath,

    /// The search was aborted through its [Cancellable](super::Cancellable).
    #[error("search cancelled")]
    Cancelled,
}
