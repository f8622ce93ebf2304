use ndarray::{Array2, ArrayViewMut1};
use tracing::warn;

use crate::io::error::{GridError, Result};
use crate::io::progress::ProgressMonitor;

/// Result of a row-wise edit that may be cancelled part way
///
/// A cancelled run still hands back its partial output: rows before
/// `rows_processed` carry the edit, later rows are untouched copies of the
/// input.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Every row was processed
    Complete(T),
    /// The progress monitor requested a stop
    Cancelled {
        /// Output with only the processed rows edited
        partial: T,
        /// Rows fully processed before the stop
        rows_processed: usize,
        /// Rows the edit would have covered
        total_rows: usize,
    },
}

impl<T> Outcome<T> {
    /// Whether the run stopped early
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Output regardless of completion
    pub fn into_inner(self) -> T {
        match self {
            Self::Complete(value) | Self::Cancelled { partial: value, .. } => value,
        }
    }

    /// Complete output, discarding partial results
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` with the row counts if the run stopped early
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Complete(value) => Ok(value),
            Self::Cancelled {
                rows_processed,
                total_rows,
                ..
            } => Err(GridError::Cancelled {
                rows_processed,
                total_rows,
            }),
        }
    }

    /// Transform the carried output, keeping the completion state
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Complete(value) => Outcome::Complete(f(value)),
            Self::Cancelled {
                partial,
                rows_processed,
                total_rows,
            } => Outcome::Cancelled {
                partial: f(partial),
                rows_processed,
                total_rows,
            },
        }
    }
}

/// Apply `edit_row` to each row in order, honouring cancellation
///
/// The monitor sees `begin(rows)`, one `worked(1)` per finished row and a
/// final `done()`. Cancellation is polled before every row.
pub(crate) fn edit_rows<F>(
    mut values: Array2<f32>,
    progress: &dyn ProgressMonitor,
    mut edit_row: F,
) -> Outcome<Array2<f32>>
where
    F: FnMut(usize, ArrayViewMut1<'_, f32>),
{
    let total_rows = values.nrows();
    progress.begin(total_rows);

    for row in 0..total_rows {
        if progress.is_cancelled() {
            warn!(rows_processed = row, total_rows, "row edit cancelled");
            progress.done();
            return Outcome::Cancelled {
                partial: values,
                rows_processed: row,
                total_rows,
            };
        }
        edit_row(row, values.row_mut(row));
        progress.worked(1);
    }

    progress.done();
    Outcome::Complete(values)
}
