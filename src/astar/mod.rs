// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Generic search engine: unidirectional and bidirectional A* over reduced
//! weights, plus route adjustment, for any graph implementing [AStarGraph].

mod adjust;
mod bidirectional;
mod error;
mod graph;
mod params;
mod queue;
mod unidirectional;

pub use adjust::adjust_route;
pub use bidirectional::{find_path_bidirectional, find_path_bidirectional_ex};
pub use error::{AStarError, POLL_PERIOD};
pub use graph::{AStarGraph, Edge, Parents, VertexData};
pub use params::{Cancellable, LengthCheckFn, Params, RoutingResult, VisitorFn};
pub use unidirectional::find_path;
