//! Mathematical utilities for grid geometry

/// Bilinear blending, its inverse, and neighbour weights
pub mod interpolation;
