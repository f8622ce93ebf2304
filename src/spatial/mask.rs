//! Rasterized area-of-interest selections

use bitvec::prelude::*;
use rayon::prelude::*;
use std::fmt;

use crate::spatial::aoi::{AreaOfInterest, BoundingBox};
use crate::spatial::geometry::GridGeometry;

/// One bit per grid cell, set where the cell node lies in an area of interest
///
/// The edits rasterize their area once and then work row by row from the
/// selection. Storage is row-major to match the sample arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellMask {
    bits: BitVec,
    num_rows: usize,
    num_cols: usize,
}

impl CellMask {
    /// Mask with no cells selected
    pub fn empty(num_rows: usize, num_cols: usize) -> Self {
        Self {
            bits: bitvec![0; num_rows * num_cols],
            num_rows,
            num_cols,
        }
    }

    /// Rasterize `aoi` over every node of `geometry`
    pub fn from_aoi(geometry: &GridGeometry, aoi: &AreaOfInterest) -> Self {
        let (num_rows, num_cols) = geometry.dimensions();
        let Some(bounds) = aoi.bounding_box() else {
            return Self::empty(num_rows, num_cols);
        };
        let mut bits = BitVec::with_capacity(num_rows * num_cols);
        for row in 0..num_rows {
            bits.extend_from_bitslice(&row_bits(geometry, aoi, &bounds, row));
        }
        Self {
            bits,
            num_rows,
            num_cols,
        }
    }

    /// Row-parallel variant of [`CellMask::from_aoi`]
    pub fn from_aoi_parallel(geometry: &GridGeometry, aoi: &AreaOfInterest) -> Self {
        let (num_rows, num_cols) = geometry.dimensions();
        let Some(bounds) = aoi.bounding_box() else {
            return Self::empty(num_rows, num_cols);
        };
        let rows: Vec<BitVec> = (0..num_rows)
            .into_par_iter()
            .map(|row| row_bits(geometry, aoi, &bounds, row))
            .collect();
        let mut bits = BitVec::with_capacity(num_rows * num_cols);
        for row in &rows {
            bits.extend_from_bitslice(row);
        }
        Self {
            bits,
            num_rows,
            num_cols,
        }
    }

    /// Test whether (row, col) is selected; cells outside the grid are not
    pub fn contains(&self, row: usize, col: usize) -> bool {
        if row >= self.num_rows || col >= self.num_cols {
            return false;
        }
        self.bits.get(row * self.num_cols + col).as_deref() == Some(&true)
    }

    /// Number of selected cells
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// No cells selected
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Mask dimensions (rows, cols)
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    /// Selected columns of one row
    pub fn row_selection(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        let start = (row * self.num_cols).min(self.bits.len());
        let end = (start + self.num_cols).min(self.bits.len());
        self.bits
            .get(start..end)
            .into_iter()
            .flat_map(BitSlice::iter_ones)
    }
}

impl fmt::Display for CellMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CellMask({}x{}, {} selected)",
            self.num_rows,
            self.num_cols,
            self.count()
        )
    }
}

// Nodes of one row inside the area; the bounding box rejects most outside nodes
fn row_bits(
    geometry: &GridGeometry,
    aoi: &AreaOfInterest,
    bounds: &BoundingBox,
    row: usize,
) -> BitVec {
    (0..geometry.num_cols())
        .map(|col| {
            let p = geometry.to_world(row as f64, col as f64);
            bounds.contains(p.x, p.y) && aoi.contains(p.x, p.y)
        })
        .collect()
}
