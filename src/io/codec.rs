//! Binary grid file codec
//!
//! Layout is six little-endian 32-bit header words followed by the samples as
//! little-endian `f32`, row-major:
//!
//! | word | field       | value                        |
//! |------|-------------|------------------------------|
//! | 0    | num_rows    | i32 > 0                      |
//! | 1    | num_cols    | i32 > 0                      |
//! | 2    | magic       | `GRID_MAGIC` ("GRD1")        |
//! | 3    | cell_count  | i32 = num_rows * num_cols    |
//! | 4    | null_value  | f32 bits, finite             |
//! | 5    | data_offset | i32 = `HEADER_BYTES`         |
//!
//! The header carries no geometry; readers take it from the caller.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array2;
use tracing::{debug, error};

use crate::io::configuration::{GRID_MAGIC, HEADER_BYTES, SAMPLE_BYTES, WRITE_FAILED_OFFSET};
use crate::io::error::{GridError, Result, corrupt_header, file_system_error, invalid_parameter};
use crate::io::progress::{NullProgress, ProgressMonitor};
use crate::spatial::geometry::GridGeometry;
use crate::spatial::grid::Grid3d;

/// Decoded binary grid header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Null sentinel stored with the samples
    pub null_value: f32,
}

impl GridHeader {
    /// Header describing `grid`
    pub const fn for_grid(grid: &Grid3d) -> Self {
        Self {
            num_rows: grid.num_rows(),
            num_cols: grid.num_cols(),
            null_value: grid.null_value(),
        }
    }

    /// Number of samples following the header
    pub const fn cell_count(&self) -> usize {
        self.num_rows * self.num_cols
    }

    /// Size of the sample block in bytes
    pub const fn data_bytes(&self) -> usize {
        self.cell_count() * SAMPLE_BYTES
    }

    /// Total file size for this header
    pub const fn file_bytes(&self) -> usize {
        HEADER_BYTES + self.data_bytes()
    }

    fn encode(&self, writer: &mut impl Write) -> Result<()> {
        let too_large = |value: usize| {
            invalid_parameter("dimensions", &value, &"does not fit a 32-bit header word")
        };
        let rows = i32::try_from(self.num_rows).map_err(|_overflow| too_large(self.num_rows))?;
        let cols = i32::try_from(self.num_cols).map_err(|_overflow| too_large(self.num_cols))?;
        let cells = i32::try_from(self.cell_count()).map_err(|_overflow| too_large(self.cell_count()))?;

        writer.write_i32::<LittleEndian>(rows)?;
        writer.write_i32::<LittleEndian>(cols)?;
        writer.write_u32::<LittleEndian>(GRID_MAGIC)?;
        writer.write_i32::<LittleEndian>(cells)?;
        writer.write_f32::<LittleEndian>(self.null_value)?;
        writer.write_i32::<LittleEndian>(HEADER_BYTES as i32)?;
        Ok(())
    }
}

/// Read and validate the 24-byte header
///
/// # Errors
///
/// Returns `CorruptHeader` if fewer than 24 bytes are available, the magic is
/// wrong, a dimension is not positive, the cell count disagrees with the
/// dimensions, the null value is not finite, or the data offset is not 24.
/// Returns `FileSystem` if the underlying read fails.
pub fn read_header(reader: &mut impl Read) -> Result<GridHeader> {
    let mut bytes = Vec::with_capacity(HEADER_BYTES);
    reader
        .by_ref()
        .take(HEADER_BYTES as u64)
        .read_to_end(&mut bytes)?;
    if bytes.len() < HEADER_BYTES {
        return Err(corrupt_header(&format!(
            "expected {HEADER_BYTES} header bytes, found {}",
            bytes.len()
        )));
    }

    let mut words = bytes.as_slice();
    let rows = words.read_i32::<LittleEndian>()?;
    let cols = words.read_i32::<LittleEndian>()?;
    let magic = words.read_u32::<LittleEndian>()?;
    let cells = words.read_i32::<LittleEndian>()?;
    let null_value = words.read_f32::<LittleEndian>()?;
    let offset = words.read_i32::<LittleEndian>()?;

    if magic != GRID_MAGIC {
        return Err(corrupt_header(&format!(
            "bad magic word {magic:#010x}, expected {GRID_MAGIC:#010x}"
        )));
    }
    if rows <= 0 || cols <= 0 {
        return Err(corrupt_header(&format!(
            "dimensions must be positive, got {rows}x{cols}"
        )));
    }
    if i64::from(rows) * i64::from(cols) != i64::from(cells) {
        return Err(corrupt_header(&format!(
            "cell count {cells} does not match {rows}x{cols}"
        )));
    }
    if !null_value.is_finite() {
        return Err(corrupt_header(&format!(
            "null value {null_value} is not finite"
        )));
    }
    if offset != HEADER_BYTES as i32 {
        return Err(corrupt_header(&format!(
            "data offset {offset} is not {HEADER_BYTES}"
        )));
    }

    Ok(GridHeader {
        num_rows: rows as usize,
        num_cols: cols as usize,
        null_value,
    })
}

/// Read the sample block described by `header`
///
/// # Errors
///
/// Returns `TruncatedData` if the stream ends early, or `FileSystem` if a
/// read fails
pub fn read_samples(reader: &mut impl Read, header: &GridHeader) -> Result<Array2<f32>> {
    read_samples_monitored(reader, header, &NullProgress)
}

/// Read the sample block one row at a time, reporting progress per row
///
/// # Errors
///
/// Returns `TruncatedData` if the stream ends early, `Cancelled` if the
/// monitor asks to stop, or `FileSystem` if a read fails
pub fn read_samples_monitored(
    reader: &mut impl Read,
    header: &GridHeader,
    progress: &dyn ProgressMonitor,
) -> Result<Array2<f32>> {
    // Buffers grow with the bytes actually read, never with the header's claim
    let row_bytes = header.num_cols * SAMPLE_BYTES;
    let mut samples: Vec<f32> = Vec::new();
    let mut row_buffer = Vec::new();

    progress.begin(header.num_rows);
    for row in 0..header.num_rows {
        if progress.is_cancelled() {
            progress.done();
            return Err(GridError::Cancelled {
                rows_processed: row,
                total_rows: header.num_rows,
            });
        }

        row_buffer.clear();
        reader
            .by_ref()
            .take(row_bytes as u64)
            .read_to_end(&mut row_buffer)?;
        if row_buffer.len() < row_bytes {
            progress.done();
            return Err(GridError::TruncatedData {
                expected_bytes: header.data_bytes(),
                available_bytes: row * row_bytes + row_buffer.len(),
            });
        }

        samples.extend(row_buffer.chunks_exact(SAMPLE_BYTES).map(LittleEndian::read_f32));
        progress.worked(1);
    }
    progress.done();

    Array2::from_shape_vec((header.num_rows, header.num_cols), samples).map_err(|shape_error| {
        corrupt_header(&format!("sample block does not fit the header: {shape_error}"))
    })
}

/// Write header and samples, returning the number of bytes written
///
/// # Errors
///
/// Returns `InvalidParameter` if the grid is too large for the header, or
/// `FileSystem` if a write fails
pub fn try_write_grid(grid: &Grid3d, writer: &mut impl Write) -> Result<u64> {
    let header = GridHeader::for_grid(grid);
    header.encode(writer)?;
    for &value in grid.values() {
        writer.write_f32::<LittleEndian>(value)?;
    }
    writer.flush()?;
    Ok(header.file_bytes() as u64)
}

/// Write header and samples
///
/// Returns the number of bytes written, or `WRITE_FAILED_OFFSET` after logging
/// the failure.
pub fn write_grid(grid: &Grid3d, writer: &mut impl Write) -> i64 {
    match try_write_grid(grid, writer) {
        Ok(written) => written as i64,
        Err(err) => {
            error!(grid = grid.name(), error = %err, "failed to write binary grid");
            WRITE_FAILED_OFFSET
        }
    }
}

/// Read a binary grid file laid out on `geometry`
///
/// # Errors
///
/// Returns `FileSystem` if the file cannot be opened or read, any header or
/// sample error from the codec, or `ShapeMismatch` if the stored dimensions
/// differ from the geometry
pub fn read_grid_file(
    path: &Path,
    geometry: GridGeometry,
    name: impl Into<String>,
) -> Result<Grid3d> {
    read_grid_file_monitored(path, geometry, name, &NullProgress)
}

/// Read a binary grid file, reporting progress per row
///
/// # Errors
///
/// As [`read_grid_file`], plus `Cancelled` if the monitor asks to stop
pub fn read_grid_file_monitored(
    path: &Path,
    geometry: GridGeometry,
    name: impl Into<String>,
    progress: &dyn ProgressMonitor,
) -> Result<Grid3d> {
    let file = File::open(path).map_err(|e| file_system_error(path, "open grid", e))?;
    let file_len = file
        .metadata()
        .map_err(|e| file_system_error(path, "inspect grid", e))?
        .len();
    let mut reader = BufReader::new(file);

    let header = read_header(&mut reader)?;
    if (header.num_rows, header.num_cols) != geometry.dimensions() {
        return Err(GridError::ShapeMismatch {
            expected: geometry.dimensions(),
            actual: (header.num_rows, header.num_cols),
        });
    }
    if file_len < header.file_bytes() as u64 {
        return Err(GridError::TruncatedData {
            expected_bytes: header.data_bytes(),
            available_bytes: file_len.saturating_sub(HEADER_BYTES as u64) as usize,
        });
    }
    let values = read_samples_monitored(&mut reader, &header, progress)?;

    let mut trailing = [0_u8; 1];
    if reader.read(&mut trailing).unwrap_or(0) > 0 {
        debug!(path = %path.display(), "ignoring bytes after the sample block");
    }

    let mut grid = Grid3d::with_null_value(name, geometry, header.null_value);
    grid.set_values(values)?;
    Ok(grid)
}

/// Write `grid` to a binary file, returning the bytes written
///
/// # Errors
///
/// Returns `FileSystem` if the file cannot be created or written
pub fn write_grid_file(grid: &Grid3d, path: &Path) -> Result<u64> {
    let file = File::create(path).map_err(|e| file_system_error(path, "create grid", e))?;
    let mut writer = BufWriter::new(file);
    try_write_grid(grid, &mut writer).map_err(|err| match err {
        GridError::FileSystem { source, .. } => file_system_error(path, "write grid", source),
        other => other,
    })
}
