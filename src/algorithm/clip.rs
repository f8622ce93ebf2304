//! Clip grid values to a [min, max] range inside an optional area of interest

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use tracing::info;

use crate::algorithm::outcome::{Outcome, edit_rows};
use crate::io::error::{GridError, Result, invalid_parameter};
use crate::io::progress::ProgressMonitor;
use crate::spatial::aoi::AreaOfInterest;
use crate::spatial::grid::Grid3d;
use crate::spatial::mask::CellMask;

/// Replacement for samples outside the clip limits
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ClipMethod {
    /// Out-of-range samples become null
    #[default]
    ReplaceWithNulls,
    /// Out-of-range samples take the limit they crossed
    ReplaceWithLimits,
    /// Out-of-range samples take a fixed value
    ReplaceWithConstant(f32),
}

impl ClipMethod {
    /// Parse a method name, using `constant` for the constant variant
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for unknown names, or when `constant` is
    /// requested without a finite value
    pub fn parse(name: &str, constant: Option<f32>) -> Result<Self> {
        match ClipMethodName::from_str(name)? {
            ClipMethodName::Nulls => Ok(Self::ReplaceWithNulls),
            ClipMethodName::Limits => Ok(Self::ReplaceWithLimits),
            ClipMethodName::Constant => match constant {
                Some(value) if value.is_finite() => Ok(Self::ReplaceWithConstant(value)),
                _ => Err(invalid_parameter(
                    "constant",
                    &format!("{constant:?}"),
                    &"constant clipping needs a finite replacement value",
                )),
            },
        }
    }
}

impl fmt::Display for ClipMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplaceWithNulls => f.write_str("nulls"),
            Self::ReplaceWithLimits => f.write_str("limits"),
            Self::ReplaceWithConstant(value) => write!(f, "constant ({value})"),
        }
    }
}

/// Method names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipMethodName {
    Nulls,
    Limits,
    Constant,
}

impl FromStr for ClipMethodName {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nulls" | "null" => Ok(Self::Nulls),
            "limits" | "limit" => Ok(Self::Limits),
            "constant" => Ok(Self::Constant),
            other => Err(invalid_parameter(
                "method",
                &other,
                &"expected nulls, limits or constant",
            )),
        }
    }
}

/// Validated inclusive clip range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipLimits {
    min: f32,
    max: f32,
}

impl ClipLimits {
    /// Create a range
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if a limit is not finite or `max < min`
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if !min.is_finite() {
            return Err(invalid_parameter("min", &min, &"limit must be finite"));
        }
        if !max.is_finite() {
            return Err(invalid_parameter("max", &max, &"limit must be finite"));
        }
        if max < min {
            return Err(invalid_parameter(
                "max",
                &max,
                &format!("clip maximum is less than the minimum ({min})"),
            ));
        }
        Ok(Self { min, max })
    }

    /// Lower limit
    pub const fn min(&self) -> f32 {
        self.min
    }

    /// Upper limit
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Replacement for `value` under `method`, or the value itself when in range
    pub const fn apply(&self, value: f32, method: ClipMethod, null_value: f32) -> f32 {
        let limit = if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            return value;
        };
        match method {
            ClipMethod::ReplaceWithNulls => null_value,
            ClipMethod::ReplaceWithLimits => limit,
            ClipMethod::ReplaceWithConstant(constant) => constant,
        }
    }
}

/// Copy of the grid's samples clipped to `limits`
///
/// Cells whose node lies outside `aoi` (when given) become null, null inputs
/// stay null, and in-range samples pass through. Progress and cancellation
/// follow [`crate::algorithm::erase::erase_grid_data`].
pub fn clip_grid_data(
    grid: &Grid3d,
    aoi: Option<&AreaOfInterest>,
    limits: ClipLimits,
    method: ClipMethod,
    progress: &dyn ProgressMonitor,
) -> Outcome<Array2<f32>> {
    let mask = aoi.map(|area| CellMask::from_aoi(grid.geometry(), area));
    let null_value = grid.null_value();
    let mut clipped = 0_usize;

    let outcome = edit_rows(grid.values().clone(), progress, |row, mut cells| {
        for (col, cell) in cells.iter_mut().enumerate() {
            let inside = mask.as_ref().is_none_or(|selection| selection.contains(row, col));
            if !inside || grid.is_null(*cell) {
                *cell = null_value;
                continue;
            }
            let replacement = limits.apply(*cell, method, null_value);
            if replacement.to_bits() != cell.to_bits() {
                clipped += 1;
                *cell = replacement;
            }
        }
    });

    if !outcome.is_cancelled() {
        info!(grid = grid.name(), clipped, %method, "clipped grid values");
    }
    outcome
}
