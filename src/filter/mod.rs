//! Filtering primitives for pathway databases.

pub mod size;

pub use size::{filter_pathways, ExcludedPathway, ExclusionReason, PathwayFilterResult, TestablePathway};
