//! Error types for grid, geometry and file operations

use std::fmt;
use std::path::PathBuf;

/// Main error type for all grid operations
#[derive(Debug)]
pub enum GridError {
    /// Value array dimensions do not match the grid geometry
    ShapeMismatch {
        /// Dimensions required by the geometry (rows, cols)
        expected: (usize, usize),
        /// Dimensions that were supplied (rows, cols)
        actual: (usize, usize),
    },

    /// Direct cell access outside the grid
    IndexOutOfRange {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
        /// Grid dimensions (rows, cols)
        dimensions: (usize, usize),
    },

    /// Binary grid header is short or inconsistent
    CorruptHeader {
        /// Description of the inconsistency
        reason: String,
    },

    /// Fewer sample bytes available than the header promises
    TruncatedData {
        /// Bytes required for the full sample block
        expected_bytes: usize,
        /// Bytes actually read before the stream ended
        available_bytes: usize,
    },

    /// Long-running operation aborted through its progress monitor
    Cancelled {
        /// Rows fully processed before the abort
        rows_processed: usize,
        /// Total rows in the operation
        total_rows: usize,
    },

    /// Geometry parameters cannot describe a grid
    InvalidGeometry {
        /// Description of what's wrong with the geometry
        reason: String,
    },

    /// Polygon does not meet area-of-interest requirements
    InvalidPolygon {
        /// Description of what's wrong with the polygon
        reason: String,
    },

    /// Text grid or AOI input could not be parsed
    Parse {
        /// One-based line number of the offending input
        line: usize,
        /// Description of the failure
        reason: String,
    },

    /// Operation parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "Value array is {}x{} but the grid geometry is {}x{}",
                    actual.0, actual.1, expected.0, expected.1
                )
            }
            Self::IndexOutOfRange {
                row,
                col,
                dimensions,
            } => {
                write!(
                    f,
                    "Cell ({row}, {col}) is outside the grid (size {}x{})",
                    dimensions.0, dimensions.1
                )
            }
            Self::CorruptHeader { reason } => {
                write!(f, "Corrupt grid header: {reason}")
            }
            Self::TruncatedData {
                expected_bytes,
                available_bytes,
            } => {
                write!(
                    f,
                    "Truncated grid data: expected {expected_bytes} bytes, found {available_bytes}"
                )
            }
            Self::Cancelled {
                rows_processed,
                total_rows,
            } => {
                write!(f, "Cancelled after {rows_processed} of {total_rows} rows")
            }
            Self::InvalidGeometry { reason } => {
                write!(f, "Invalid grid geometry: {reason}")
            }
            Self::InvalidPolygon { reason } => {
                write!(f, "Invalid polygon: {reason}")
            }
            Self::Parse { line, reason } => {
                write!(f, "Parse error on line {line}: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for grid results
pub type Result<T> = std::result::Result<T, GridError>;

impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<stream>"),
            operation: "stream access",
            source: err,
        }
    }
}

/// Attach a path and operation to an I/O error
pub fn file_system_error(
    path: impl Into<PathBuf>,
    operation: &'static str,
    source: std::io::Error,
) -> GridError {
    GridError::FileSystem {
        path: path.into(),
        operation,
        source,
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> GridError {
    GridError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a corrupt header error
pub fn corrupt_header(reason: &impl ToString) -> GridError {
    GridError::CorruptHeader {
        reason: reason.to_string(),
    }
}

/// Create a parse error for a one-based line number
pub fn parse_error(line: usize, reason: &impl ToString) -> GridError {
    GridError::Parse {
        line,
        reason: reason.to_string(),
    }
}
