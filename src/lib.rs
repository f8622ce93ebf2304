//! Corner-point grid rasters with polygon area-of-interest editing
//!
//! A grid is a 2D array of samples positioned in world coordinates by four
//! corner points. Polygon areas of interest select cells to erase or clip,
//! and grids move to and from disk through a fixed-header binary codec and
//! the ASCII `ModSpec` text format.

#![forbid(unsafe_code)]

/// Row-wise grid edits: erase and clip, with cancellable outcomes
pub mod algorithm;
/// File formats, command line, progress, units and error handling
pub mod io;
/// Bilinear interpolation and its inverse
pub mod math;
/// Grid geometry, sample storage and area-of-interest masks
pub mod spatial;

pub use algorithm::outcome::Outcome;
pub use io::error::{GridError, Result};
pub use spatial::{AreaOfInterest, CellMask, Grid3d, GridGeometry, Point, Sampling};
