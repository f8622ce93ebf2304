//! Grid raster store with null-aware sampling
//!
//! A `Grid3d` owns one `f32` sample per geometry node plus a null sentinel.
//! Non-finite input never reaches storage: NaN and infinities are stored as
//! the sentinel so every cell is either a finite sample or exactly null.

use ndarray::Array2;
use tracing::debug;

use crate::io::configuration::{
    DEFAULT_BOUNDS_TOLERANCE, DEFAULT_NULL_VALUE, MIN_INTERPOLATION_WEIGHT,
};
use crate::io::error::{GridError, Result, invalid_parameter};
use crate::math::interpolation::bilinear_weights;
use crate::spatial::geometry::GridGeometry;

/// How `value_at_xy` turns a fractional position into a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// Blend the four surrounding nodes, ignoring null neighbours
    #[default]
    Bilinear,
    /// Return the raw value of the nearest node
    Nearest,
}

/// Named raster of samples laid out on a grid geometry
#[derive(Debug, Clone)]
pub struct Grid3d {
    name: String,
    geometry: GridGeometry,
    values: Array2<f32>,
    null_value: f32,
    min_value: f32,
    max_value: f32,
    bounds_tolerance: f64,
}

impl Grid3d {
    /// Create an all-null grid using the default sentinel
    pub fn new(name: impl Into<String>, geometry: GridGeometry) -> Self {
        Self::with_null_value(name, geometry, DEFAULT_NULL_VALUE)
    }

    /// Create an all-null grid with an explicit sentinel
    ///
    /// A non-finite sentinel is replaced by the default one, since it could
    /// never compare equal to itself.
    pub fn with_null_value(name: impl Into<String>, geometry: GridGeometry, null_value: f32) -> Self {
        let null_value = if null_value.is_finite() {
            null_value
        } else {
            DEFAULT_NULL_VALUE
        };
        let values = Array2::from_elem(geometry.dimensions(), null_value);
        Self {
            name: name.into(),
            geometry,
            values,
            null_value,
            min_value: null_value,
            max_value: null_value,
            bounds_tolerance: DEFAULT_BOUNDS_TOLERANCE,
        }
    }

    /// Set how far (in cells) outside the outer nodes XY queries still resolve
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for negative or non-finite tolerances
    pub fn with_bounds_tolerance(mut self, tolerance: f64) -> Result<Self> {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(invalid_parameter(
                "bounds_tolerance",
                &tolerance,
                &"must be a non-negative number of cells",
            ));
        }
        self.bounds_tolerance = tolerance;
        Ok(self)
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Geometry the samples are laid out on
    pub const fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Number of rows
    pub const fn num_rows(&self) -> usize {
        self.geometry.num_rows()
    }

    /// Number of columns
    pub const fn num_cols(&self) -> usize {
        self.geometry.num_cols()
    }

    /// Null sentinel
    pub const fn null_value(&self) -> f32 {
        self.null_value
    }

    /// Smallest non-null value, or the sentinel when every cell is null
    pub const fn min_value(&self) -> f32 {
        self.min_value
    }

    /// Largest non-null value, or the sentinel when every cell is null
    pub const fn max_value(&self) -> f32 {
        self.max_value
    }

    /// Current bounds tolerance in cells
    pub const fn bounds_tolerance(&self) -> f64 {
        self.bounds_tolerance
    }

    /// Read-only view of all samples
    pub const fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// Exact comparison against the sentinel
    #[allow(clippy::float_cmp)]
    pub fn is_null(&self, value: f32) -> bool {
        value == self.null_value
    }

    /// Whether the cell at (row, col) holds the sentinel
    ///
    /// Cells outside the grid count as null.
    pub fn is_null_at(&self, row: usize, col: usize) -> bool {
        self.values
            .get([row, col])
            .is_none_or(|&value| self.is_null(value))
    }

    /// Number of null cells
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|&&v| self.is_null(v)).count()
    }

    /// Replace every sample
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` unless `values` is exactly rows x cols
    pub fn set_values(&mut self, values: Array2<f32>) -> Result<()> {
        let expected = self.geometry.dimensions();
        if values.dim() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                actual: values.dim(),
            });
        }
        self.values = values;
        self.sanitize();
        self.compute_min_max();
        Ok(())
    }

    /// Replace every sample from nested rows
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the row count or any row length differs from
    /// the geometry
    pub fn set_rows(&mut self, rows: &[Vec<f32>]) -> Result<()> {
        let expected = self.geometry.dimensions();
        let ragged = rows.iter().find(|row| row.len() != expected.1);
        if rows.len() != expected.0 || ragged.is_some() {
            return Err(GridError::ShapeMismatch {
                expected,
                actual: (rows.len(), ragged.map_or(expected.1, Vec::len)),
            });
        }
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let values = Array2::from_shape_vec(expected, flat).map_err(|_shape_error| {
            GridError::ShapeMismatch {
                expected,
                actual: (rows.len(), expected.1),
            }
        })?;
        self.set_values(values)
    }

    /// Change the sentinel, rewriting cells that held the old one
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a non-finite sentinel
    pub fn set_null_value(&mut self, null_value: f32) -> Result<()> {
        if !null_value.is_finite() {
            return Err(invalid_parameter(
                "null_value",
                &null_value,
                &"sentinel must be finite",
            ));
        }
        let old = self.null_value;
        #[allow(clippy::float_cmp)]
        self.values.mapv_inplace(|v| if v == old { null_value } else { v });
        self.null_value = null_value;
        self.compute_min_max();
        Ok(())
    }

    /// Sample at (row, col)
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` outside `[0, rows) x [0, cols)`
    pub fn value(&self, row: usize, col: usize) -> Result<f32> {
        self.values
            .get([row, col])
            .copied()
            .ok_or_else(|| self.out_of_range(row, col))
    }

    /// Overwrite the sample at (row, col)
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` outside `[0, rows) x [0, cols)`
    pub fn set_value(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        let stored = self.admit(value);
        let error = self.out_of_range(row, col);
        let cell = self.values.get_mut([row, col]).ok_or(error)?;
        let previous = std::mem::replace(cell, stored);
        self.update_min_max(previous, stored);
        Ok(())
    }

    /// Sample at a world position
    ///
    /// Positions outside the grid (beyond the bounds tolerance) return the
    /// sentinel. `Sampling::Bilinear` gives null neighbours zero weight and
    /// re-normalizes the rest; if less than half the weight is valid the result
    /// is null. `Sampling::Nearest` returns the nearest node's raw value.
    pub fn value_at_xy(&self, x: f64, y: f64, sampling: Sampling) -> f32 {
        let (row, col) = self.geometry.to_index(x, y);
        let Some(row) = self.snap_to_extent(row, self.num_rows()) else {
            return self.null_value;
        };
        let Some(col) = self.snap_to_extent(col, self.num_cols()) else {
            return self.null_value;
        };

        match sampling {
            Sampling::Nearest => self
                .values
                .get([row.round() as usize, col.round() as usize])
                .copied()
                .unwrap_or(self.null_value),
            Sampling::Bilinear => self.blend(row, col),
        }
    }

    fn blend(&self, row: f64, col: f64) -> f32 {
        let mut total = 0.0_f64;
        let mut weight = 0.0_f64;
        for ([r, c], w) in bilinear_weights(row, col) {
            if w <= 0.0 {
                continue;
            }
            if let Some(&value) = self.values.get([r, c]) {
                if !self.is_null(value) {
                    total += f64::from(value) * w;
                    weight += w;
                }
            }
        }
        if weight >= MIN_INTERPOLATION_WEIGHT {
            (total / weight) as f32
        } else {
            self.null_value
        }
    }

    // Pull indices within tolerance of the extent onto it; reject the rest
    fn snap_to_extent(&self, index: f64, count: usize) -> Option<f64> {
        let last = (count - 1) as f64;
        if !index.is_finite() {
            None
        } else if index < 0.0 {
            (index >= -self.bounds_tolerance).then_some(0.0)
        } else if index > last {
            (index <= last + self.bounds_tolerance).then_some(last)
        } else {
            Some(index)
        }
    }

    fn admit(&self, value: f32) -> f32 {
        if value.is_finite() {
            value
        } else {
            debug!(grid = %self.name, %value, "storing non-finite sample as null");
            self.null_value
        }
    }

    fn sanitize(&mut self) {
        let null_value = self.null_value;
        let mut replaced = 0_usize;
        self.values.mapv_inplace(|v| {
            if v.is_finite() {
                v
            } else {
                replaced += 1;
                null_value
            }
        });
        if replaced > 0 {
            debug!(grid = %self.name, replaced, "stored non-finite samples as null");
        }
    }

    fn compute_min_max(&mut self) {
        let (min, max) = self
            .values
            .iter()
            .filter(|&&v| !self.is_null(v))
            .fold(None, |acc: Option<(f32, f32)>, &v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })
            .unwrap_or((self.null_value, self.null_value));
        self.min_value = min;
        self.max_value = max;
    }

    // Full rescan only when the cell held the min or max and gave it up
    #[allow(clippy::float_cmp)]
    fn update_min_max(&mut self, previous: f32, stored: f32) {
        let cleared = self.is_null(stored);
        let gave_up_extreme = !self.is_null(previous)
            && ((previous == self.min_value && (cleared || stored > previous))
                || (previous == self.max_value && (cleared || stored < previous)));
        if gave_up_extreme {
            self.compute_min_max();
        } else if !cleared {
            if self.is_null(self.min_value) {
                self.min_value = stored;
                self.max_value = stored;
            } else {
                self.min_value = self.min_value.min(stored);
                self.max_value = self.max_value.max(stored);
            }
        }
    }

    const fn out_of_range(&self, row: usize, col: usize) -> GridError {
        GridError::IndexOutOfRange {
            row,
            col,
            dimensions: self.geometry.dimensions(),
        }
    }
}
