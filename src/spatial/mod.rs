//! Spatial data structures for gridded samples
//!
//! This module contains spatial-related functionality including:
//! - Corner-point geometry mapping indices to world coordinates
//! - The sample raster with null-aware lookup
//! - Area-of-interest polygons and their rasterized cell masks

/// Corner-point geometry and index/world transforms
pub mod geometry;
/// Sample storage, null handling and XY lookup
pub mod grid;
/// Inclusion and exclusion polygons
pub mod aoi;
/// Per-cell rasterization of an area of interest
pub mod mask;

pub use aoi::AreaOfInterest;
pub use geometry::{GridGeometry, Point};
pub use grid::{Grid3d, Sampling};
pub use mask::CellMask;
