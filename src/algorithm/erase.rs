//! Erase-area edit: null every grid cell whose node lies inside an area of interest
//!
//! The input grid is never modified by the copying variants. Each row is either
//! fully processed or left exactly as it was, so a cancelled run yields a
//! partial array that is safe to inspect.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ndarray::{Array2, ArrayViewMut1};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::algorithm::outcome::{Outcome, edit_rows};
use crate::io::error::Result;
use crate::io::progress::ProgressMonitor;
use crate::spatial::aoi::AreaOfInterest;
use crate::spatial::grid::Grid3d;
use crate::spatial::mask::CellMask;

/// Null the selected cells of `row`, returning how many changed
fn erase_row(
    mask: &CellMask,
    row: usize,
    mut cells: ArrayViewMut1<'_, f32>,
    null_value: f32,
) -> usize {
    let mut erased = 0;
    for col in mask.row_selection(row) {
        if let Some(cell) = cells.get_mut(col) {
            *cell = null_value;
            erased += 1;
        }
    }
    erased
}

/// Copy of the grid's samples with every cell inside `aoi` set to null
///
/// The area is rasterized into a [`CellMask`] first. Progress is then
/// reported per row and cancellation is polled before each row. On
/// cancellation the partial array holds erased rows up to `rows_processed`
/// and original values after it.
pub fn erase_grid_data(
    grid: &Grid3d,
    aoi: &AreaOfInterest,
    progress: &dyn ProgressMonitor,
) -> Outcome<Array2<f32>> {
    let mask = CellMask::from_aoi(grid.geometry(), aoi);
    debug!(grid = grid.name(), %mask, "rasterized area of interest");
    let null_value = grid.null_value();
    let mut erased = 0;
    let outcome = edit_rows(grid.values().clone(), progress, |row, cells| {
        erased += erase_row(&mask, row, cells, null_value);
    });
    if !outcome.is_cancelled() {
        info!(grid = grid.name(), erased, "erased area of interest");
    }
    outcome
}

/// Row-parallel variant of [`erase_grid_data`]
///
/// Both the rasterization and the edit are partitioned by row across the
/// rayon pool. Each row polls cancellation before it starts; rows that see
/// the request are left untouched, so on cancellation the processed rows
/// need not be a prefix.
pub fn erase_grid_data_parallel(
    grid: &Grid3d,
    aoi: &AreaOfInterest,
    progress: &dyn ProgressMonitor,
) -> Outcome<Array2<f32>> {
    let mut values = grid.values().as_standard_layout().into_owned();
    let (total_rows, num_cols) = values.dim();
    let null_value = grid.null_value();

    let Some(cells) = values.as_slice_mut() else {
        return erase_grid_data(grid, aoi, progress);
    };
    let mask = CellMask::from_aoi_parallel(grid.geometry(), aoi);
    debug!(grid = grid.name(), %mask, "rasterized area of interest");

    let rows_processed = AtomicUsize::new(0);
    let erased = AtomicUsize::new(0);
    let stopped = AtomicBool::new(false);
    progress.begin(total_rows);

    cells
        .par_chunks_mut(num_cols.max(1))
        .enumerate()
        .for_each(|(row, row_cells)| {
            if stopped.load(Ordering::Relaxed) || progress.is_cancelled() {
                stopped.store(true, Ordering::Relaxed);
                return;
            }
            let changed = erase_row(&mask, row, ArrayViewMut1::from(row_cells), null_value);
            erased.fetch_add(changed, Ordering::Relaxed);
            rows_processed.fetch_add(1, Ordering::Relaxed);
            progress.worked(1);
        });

    progress.done();
    let rows_processed = rows_processed.into_inner();
    if stopped.into_inner() {
        warn!(rows_processed, total_rows, "parallel erase cancelled");
        return Outcome::Cancelled {
            partial: values,
            rows_processed,
            total_rows,
        };
    }
    info!(
        grid = grid.name(),
        erased = erased.into_inner(),
        "erased area of interest in parallel"
    );
    Outcome::Complete(values)
}

/// Erase the area directly in `grid`, writing back only on completion
///
/// # Errors
///
/// Returns `Cancelled` (leaving `grid` untouched) if the monitor stops the run
pub fn erase_in_place(
    grid: &mut Grid3d,
    aoi: &AreaOfInterest,
    progress: &dyn ProgressMonitor,
) -> Result<()> {
    let values = erase_grid_data(grid, aoi, progress).into_result()?;
    grid.set_values(values)
}
