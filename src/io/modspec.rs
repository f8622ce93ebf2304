//! Legacy binary `ModSpec` grid format
//!
//! A text header of `#KEY = value` entries carries the geometry:
//!
//! ```text
//! #<CPS_v1 TYPE=MODSPEC_GRID/>
//! ...
//! #XORG       = 1000           origin x (row 0, column 0)
//! #YORG       = 2000           origin y
//! #NX         = 48             number of columns
//! #NY         = 64             number of rows
//! #DX         = 25             column spacing
//! #DY         = 25             row spacing
//! #ANGLE      = 30             rotation from +x in degrees
//! #ZNON       = -999.25        null value
//! #ADDRESS    = (0, 2598)      byte offset of the binary section
//! #</MODSPEC_GRID>
//! ```
//!
//! The binary section starts with six little-endian `i32` words:
//!
//! | word | value                                     |
//! |------|-------------------------------------------|
//! | 0    | cell count                                |
//! | 1    | 0                                         |
//! | 2    | end of file (address + 24 + 4 * cells + 1)|
//! | 3    | 0                                         |
//! | 4    | address + 20                              |
//! | 5    | cell count                                |
//!
//! followed by `NY * NX` little-endian `f32` samples row-major from row 0 and
//! one newline byte. Fixed header entries are padded to a constant width.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::{debug, warn};

use crate::io::codec::{GridHeader, read_samples_monitored};
use crate::io::configuration::{
    HEADER_BYTES, HEADER_WORDS, MODSPEC_DATA_TAG, MODSPEC_ENTRY_WIDTH, MODSPEC_HEADER_END,
    MODSPEC_MARKER, MODSPEC_MAX_LINE_BYTES, SAMPLE_BYTES,
};
use crate::io::error::{
    GridError, Result, corrupt_header, file_system_error, invalid_parameter, parse_error,
};
use crate::io::progress::ProgressMonitor;
use crate::io::units::{DistanceUnit, UnitPreferences};
use crate::spatial::geometry::{GridGeometry, Point};
use crate::spatial::grid::Grid3d;

/// Geometry and layout read from a binary `ModSpec` header, in file units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModSpecHeader {
    /// World position of node (0, 0)
    pub origin: Point,
    /// Distance between columns
    pub col_spacing: f64,
    /// Distance between rows
    pub row_spacing: f64,
    /// Number of rows (`NY`)
    pub num_rows: usize,
    /// Number of columns (`NX`)
    pub num_cols: usize,
    /// Column direction from +x, in degrees
    pub rotation_degrees: f64,
    /// Null sentinel stored with the samples
    pub null_value: f32,
    /// Byte offset of the binary section
    pub data_address: u64,
}

impl ModSpecHeader {
    /// Number of samples in the binary section
    pub const fn cell_count(&self) -> usize {
        self.num_rows * self.num_cols
    }

    /// Total file size implied by the header
    pub const fn file_bytes(&self) -> u64 {
        self.data_address + (HEADER_BYTES + self.cell_count() * SAMPLE_BYTES + 1) as u64
    }

    /// Geometry with origin and spacing converted from `file_unit` into `app_unit`
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` for non-positive spacing or unusable dimensions
    pub fn geometry(
        &self,
        file_unit: DistanceUnit,
        app_unit: DistanceUnit,
    ) -> Result<GridGeometry> {
        let to_app = |value: f64| file_unit.convert(value, app_unit);
        GridGeometry::from_origin(
            Point::new(to_app(self.origin.x), to_app(self.origin.y)),
            to_app(self.col_spacing),
            to_app(self.row_spacing),
            self.num_rows,
            self.num_cols,
            self.rotation_degrees,
        )
    }
}

/// Header lines with the byte count consumed so far
struct HeaderLines<R> {
    reader: R,
    consumed: u64,
    number: usize,
}

impl<R: BufRead> HeaderLines<R> {
    const fn new(reader: R) -> Self {
        Self {
            reader,
            consumed: 0,
            number: 0,
        }
    }

    fn next_line(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        let read = self
            .reader
            .by_ref()
            .take(MODSPEC_MAX_LINE_BYTES as u64)
            .read_until(b'\n', &mut bytes)?;
        self.number += 1;
        if read == 0 {
            return Err(corrupt_header(&format!(
                "header ends at line {} without {MODSPEC_HEADER_END}",
                self.number
            )));
        }
        if read == MODSPEC_MAX_LINE_BYTES && bytes.last() != Some(&b'\n') {
            return Err(corrupt_header(&format!(
                "header line {} is longer than {MODSPEC_MAX_LINE_BYTES} bytes",
                self.number
            )));
        }
        self.consumed += read as u64;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }
}

/// Header entries by key, with the line each came from
struct Entries(HashMap<String, (usize, String)>);

impl Entries {
    fn raw(&self, key: &str) -> Result<(usize, &str)> {
        self.0
            .get(key)
            .map(|(line, value)| (*line, value.as_str()))
            .ok_or_else(|| corrupt_header(&format!("missing {key} entry")))
    }

    fn parse<T: FromStr>(&self, key: &str) -> Result<T> {
        let (line, value) = self.raw(key)?;
        value
            .parse()
            .map_err(|_bad_value| parse_error(line, &format!("cannot read '{value}' as {key}")))
    }

    // ADDRESS is written as "(start, end)"; the data begins at `end`
    fn address(&self) -> Result<u64> {
        let (line, value) = self.raw("ADDRESS")?;
        value
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(',')
            .nth(1)
            .and_then(|end| end.trim().parse().ok())
            .ok_or_else(|| {
                parse_error(line, &format!("cannot read '{value}' as ADDRESS (start, end)"))
            })
    }
}

/// Check whether a stream starts with the binary `ModSpec` marker
///
/// # Errors
///
/// Returns `FileSystem` if the read fails
pub fn has_modspec_marker(reader: &mut impl Read) -> Result<bool> {
    let mut bytes = Vec::with_capacity(MODSPEC_MARKER.len());
    reader
        .by_ref()
        .take(MODSPEC_MARKER.len() as u64)
        .read_to_end(&mut bytes)?;
    Ok(bytes == MODSPEC_MARKER.as_bytes())
}

/// Read the text header and the six data header words
///
/// Leaves `reader` at the first sample.
///
/// # Errors
///
/// Returns `CorruptHeader` if the marker, a required entry or the closing
/// line is missing, or the address points inside the header; `Parse` with
/// the line number for unreadable values; `InvalidGeometry` for unusable
/// dimensions or spacing; `TruncatedData` if the stream ends before the
/// samples; or `FileSystem` if a read fails
pub fn read_modspec_header(reader: &mut impl BufRead) -> Result<ModSpecHeader> {
    let mut lines = HeaderLines::new(reader);
    if lines.next_line()? != MODSPEC_MARKER {
        return Err(corrupt_header(&format!(
            "first line is not {MODSPEC_MARKER}"
        )));
    }

    let mut entries = HashMap::new();
    loop {
        let line = lines.next_line()?;
        if line == MODSPEC_HEADER_END {
            break;
        }
        if let Some((key, value)) = line.trim_start_matches('#').split_once('=') {
            entries.insert(key.trim().to_string(), (lines.number, value.trim().to_string()));
        }
    }
    let entries = Entries(entries);

    let header = ModSpecHeader {
        origin: Point::new(entries.parse("XORG")?, entries.parse("YORG")?),
        col_spacing: entries.parse("DX")?,
        row_spacing: entries.parse("DY")?,
        num_rows: entries.parse("NY")?,
        num_cols: entries.parse("NX")?,
        rotation_degrees: entries.parse("ANGLE")?,
        null_value: entries.parse("ZNON")?,
        data_address: entries.address()?,
    };
    header.geometry(DistanceUnit::Undefined, DistanceUnit::Undefined)?;

    let consumed = lines.consumed;
    let gap = header.data_address.checked_sub(consumed).ok_or_else(|| {
        corrupt_header(&format!(
            "data address {} lies inside the {consumed}-byte header",
            header.data_address
        ))
    })?;
    let skipped = io::copy(&mut lines.reader.by_ref().take(gap), &mut io::sink())?;

    let mut words = Vec::with_capacity(HEADER_BYTES);
    lines
        .reader
        .by_ref()
        .take(HEADER_BYTES as u64)
        .read_to_end(&mut words)?;
    if skipped < gap || words.len() < HEADER_BYTES {
        return Err(GridError::TruncatedData {
            expected_bytes: header.cell_count() * SAMPLE_BYTES,
            available_bytes: 0,
        });
    }

    let mut cursor = words.as_slice();
    let mut data_header = [0_i32; HEADER_WORDS];
    cursor.read_i32_into::<LittleEndian>(&mut data_header)?;
    let cells = i64::try_from(header.cell_count()).unwrap_or(i64::MAX);
    let [first_count, .., last_count] = data_header;
    if i64::from(first_count) != cells || i64::from(last_count) != cells {
        warn!(first_count, last_count, cells, "data header cell counts disagree with NX * NY");
    }
    debug!(?header, ?data_header, "read modspec header");
    Ok(header)
}

/// Read a binary `ModSpec` grid, reporting progress per row
///
/// Origin and spacing are converted from `file_unit` into the unit resolved
/// from `preferences`.
///
/// # Errors
///
/// Any header error from [`read_modspec_header`], `TruncatedData` if the
/// samples end early, `Cancelled` if the monitor asks to stop, or
/// `FileSystem` if a read fails
pub fn read_modspec_grid(
    reader: &mut impl BufRead,
    name: impl Into<String>,
    file_unit: DistanceUnit,
    preferences: UnitPreferences,
    progress: &dyn ProgressMonitor,
) -> Result<Grid3d> {
    let header = read_modspec_header(reader)?;
    read_body(reader, &header, name.into(), file_unit, preferences, progress)
}

fn read_body(
    reader: &mut impl Read,
    header: &ModSpecHeader,
    name: String,
    file_unit: DistanceUnit,
    preferences: UnitPreferences,
    progress: &dyn ProgressMonitor,
) -> Result<Grid3d> {
    let geometry = header.geometry(file_unit, preferences.resolve(file_unit))?;
    let samples = GridHeader {
        num_rows: header.num_rows,
        num_cols: header.num_cols,
        null_value: header.null_value,
    };
    let values = read_samples_monitored(reader, &samples, progress)?;

    let mut grid = Grid3d::with_null_value(name, geometry, header.null_value);
    grid.set_values(values)?;
    Ok(grid)
}

/// Read a binary `ModSpec` grid file, naming the grid after the file stem
///
/// # Errors
///
/// As [`read_modspec_grid`], plus `FileSystem` if the file cannot be opened
pub fn read_modspec_grid_file(
    path: &Path,
    file_unit: DistanceUnit,
    preferences: UnitPreferences,
    progress: &dyn ProgressMonitor,
) -> Result<Grid3d> {
    let file = File::open(path).map_err(|e| file_system_error(path, "open modspec grid", e))?;
    let file_len = file
        .metadata()
        .map_err(|e| file_system_error(path, "inspect modspec grid", e))?
        .len();
    let name = path
        .file_stem()
        .map_or_else(|| "grid".to_string(), |stem| stem.to_string_lossy().into_owned());
    let mut reader = BufReader::new(file);

    let with_path = |err: GridError| match err {
        GridError::FileSystem { source, .. } => file_system_error(path, "read modspec grid", source),
        other => other,
    };
    let header = read_modspec_header(&mut reader).map_err(with_path)?;
    // The trailing newline is optional on read
    if file_len + 1 < header.file_bytes() {
        return Err(GridError::TruncatedData {
            expected_bytes: header.cell_count() * SAMPLE_BYTES,
            available_bytes: file_len.saturating_sub(header.data_address + HEADER_BYTES as u64)
                as usize,
        });
    }

    read_body(&mut reader, &header, name, file_unit, preferences, progress).map_err(with_path)
}

fn padded(entry: &str) -> String {
    format!("{entry:<MODSPEC_ENTRY_WIDTH$}\n")
}

const fn unit_label(unit: DistanceUnit) -> &'static str {
    match unit {
        DistanceUnit::Meters => "meters",
        DistanceUnit::Feet => "feet",
        DistanceUnit::Undefined => "unknown",
    }
}

/// Write a binary `ModSpec` grid, returning the number of bytes written
///
/// Origin and spacing are converted into `file_unit`. Like the ASCII format,
/// only origin, spacing and angle are stored, so non-rectangular geometries
/// are written from their first row and column edges.
///
/// # Errors
///
/// Returns `InvalidParameter` if an address or cell count does not fit a
/// 32-bit word, or `FileSystem` if writing fails
pub fn write_modspec_grid(
    grid: &Grid3d,
    writer: &mut impl Write,
    file_unit: DistanceUnit,
    preferences: UnitPreferences,
) -> Result<u64> {
    let geometry = grid.geometry();
    if !geometry.is_rectangular() {
        warn!(
            grid = grid.name(),
            "geometry is not rectangular; modspec output keeps only origin, spacing and angle"
        );
    }

    let app_unit = preferences.resolve(file_unit);
    let to_file = |value: f64| app_unit.convert(value, file_unit);
    let spacing = |value: f64| to_file(if value > 0.0 { value } else { 1.0 });
    let [origin, ..] = *geometry.corner_points();
    let (num_rows, num_cols) = geometry.dimensions();

    let mut prefix = String::new();
    for line in [MODSPEC_MARKER, "#", "#", "#<HDR_MODSPEC_GRID>"] {
        prefix.push_str(line);
        prefix.push('\n');
    }
    let entries = [
        "#VERSION    = 1.0".to_string(),
        "#ENDIAN     = LITTLE_ENDIAN".to_string(),
        format!("#XORG       = {}", to_file(origin.x)),
        format!("#YORG       = {}", to_file(origin.y)),
        format!("#NX         = {num_cols}"),
        format!("#NY         = {num_rows}"),
        format!("#DX         = {}", spacing(geometry.col_spacing())),
        format!("#DY         = {}", spacing(geometry.row_spacing())),
        format!("#ANGLE      = {}", geometry.rotation_degrees()),
        format!("#ZNON       = {}", grid.null_value()),
        "#DESCRIPTION = \"\"".to_string(),
        "#ATTRIBUTE  = \"\"".to_string(),
        "#DATA_FILE  = NONE".to_string(),
        "#STORAGE_ORDER = XY".to_string(),
        "#ENCODING   = binary".to_string(),
        "#NILSTRING  = nil".to_string(),
        "#WRAP       = 1".to_string(),
        "#NCOLUMNS   = 1".to_string(),
        "#FILLOUT    = NO".to_string(),
        "#FIELDS     = (grid)".to_string(),
        "##DEFAULTS  = (\"\")".to_string(),
        "#HDRS       = (0)".to_string(),
        "#FIELDTYPES = (\"\")".to_string(),
        format!("#UNITS      = ({})", unit_label(file_unit)),
        "#VARTYPES   = (F)".to_string(),
        "#DELIMITERS = (NO)".to_string(),
        "#WIDTHS     = (0)".to_string(),
        "#NLINES     = 0".to_string(),
        "#NPACKETS   = 0".to_string(),
    ];
    for entry in &entries {
        prefix.push_str(&padded(entry));
    }
    let mut trailer = String::new();
    for line in [MODSPEC_HEADER_END, "#", "#", MODSPEC_DATA_TAG] {
        trailer.push_str(line);
        trailer.push('\n');
    }

    // The padded ADDRESS entry has the same length whatever its value
    let address = prefix.len() + MODSPEC_ENTRY_WIDTH + 1 + trailer.len();
    let address_entry = padded(&format!("#ADDRESS    = (0, {address})"));

    let too_large = |value: usize| {
        invalid_parameter("dimensions", &value, &"does not fit a 32-bit modspec word")
    };
    let word = |value: usize| i32::try_from(value).map_err(|_overflow| too_large(value));
    let cells = num_rows * num_cols;
    let end = address + HEADER_BYTES + cells * SAMPLE_BYTES + 1;
    let data_header = [
        word(cells)?,
        0,
        word(end)?,
        0,
        word(address + (HEADER_WORDS - 1) * 4)?,
        word(cells)?,
    ];

    writer.write_all(prefix.as_bytes())?;
    writer.write_all(address_entry.as_bytes())?;
    writer.write_all(trailer.as_bytes())?;
    for value in data_header {
        writer.write_i32::<LittleEndian>(value)?;
    }
    for &value in grid.values() {
        writer.write_f32::<LittleEndian>(value)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(end as u64)
}

/// Write a binary `ModSpec` grid file, returning the bytes written
///
/// # Errors
///
/// As [`write_modspec_grid`], plus `FileSystem` if the file cannot be created
pub fn write_modspec_grid_file(
    grid: &Grid3d,
    path: &Path,
    file_unit: DistanceUnit,
    preferences: UnitPreferences,
) -> Result<u64> {
    let file = File::create(path).map_err(|e| file_system_error(path, "create modspec grid", e))?;
    let mut writer = BufWriter::new(file);
    write_modspec_grid(grid, &mut writer, file_unit, preferences).map_err(|err| match err {
        GridError::FileSystem { source, .. } => file_system_error(path, "write modspec grid", source),
        other => other,
    })
}
