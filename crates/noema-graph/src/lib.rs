//! Graph model and view projections for noema.
//!
//! This crate is the pure foundation: the canonical in-memory graph
//! (nodes + links as fetched from the graph store) and the three
//! read-only projections derived from it. It has **no rendering
//! dependencies**; the app crate consumes these structures and draws
//! them.
//!
//! # Data flow
//!
//! ```text
//! GraphData (canonical snapshot, read-only to projectors)
//!     ├── hierarchy::build_hierarchy  → HierarchyNode tree (drill-down)
//!     ├── matrix::build_matrix        → MatrixData (dense adjacency)
//!     └── timeline::build_bands       → Vec<TimelineBand> (temporal)
//! ```
//!
//! Every projection is a pure function of a snapshot plus explicit
//! filter state: the same inputs always produce the same output.
//! Derived structures are rebuilt from scratch on every snapshot or
//! filter change; nothing is mutated in place.
//!
//! # Key types
//!
//! |--------------------|---------------------------------------------|
//! | Type               | Purpose                                     |
//! |--------------------|---------------------------------------------|
//! | [`GraphNode`]      | Typed node (session, thought, entity, tool) |
//! | [`GraphLink`]      | Typed, weighted, undirected link            |
//! | [`GraphData`]      | One canonical snapshot                      |
//! | [`HierarchyNode`]  | Rooted spanning tree for browsing           |
//! | [`MatrixData`]     | Dense weighted adjacency matrix             |
//! | [`TimelineBand`]   | Per-type band of time-ordered nodes         |
//! |--------------------|---------------------------------------------|

pub mod hierarchy;
pub mod matrix;
pub mod model;
pub mod timeline;

pub use hierarchy::{build_hierarchy, filter_hierarchy, HierarchyNode, VIRTUAL_ROOT_ID};
pub use matrix::{
    build_matrix, filter_by_threshold, ColorScheme, MatrixAxisNode, MatrixCell, MatrixData,
    MATRIX_WARN_NODES,
};
pub use model::{GraphData, GraphLink, GraphNode, Timestamp, UNKNOWN_LABEL};
pub use timeline::{
    build_bands, PeriodPreset, TimeScale, TimelineBand, TimelineNode, BAND_PALETTE,
};

/// Current time as Unix milliseconds. Default for nodes without a
/// parsable timestamp.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
