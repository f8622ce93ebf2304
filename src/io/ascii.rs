//! ASCII `ModSpec` grid format
//!
//! Four header lines, each followed by free commentary:
//!
//! ```text
//! x0 y0        origin (row 0, column 0)
//! dx dy        column spacing, row spacing
//! nx ny        number of columns, number of rows
//! angle znon   rotation from +x in degrees, null value
//! ```
//!
//! The body holds one block per column, from the top row down to row 0. A
//! block wraps at eight values per line and always starts on a fresh line;
//! readers accept longer lines too.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use ndarray::Array2;
use tracing::{debug, warn};

use crate::io::configuration::{ASCII_VALUES_PER_LINE, MAX_CELL_COUNT};
use crate::io::error::{GridError, Result, file_system_error, parse_error};
use crate::io::units::{DistanceUnit, UnitPreferences};
use crate::spatial::geometry::{GridGeometry, Point};
use crate::spatial::grid::Grid3d;

/// Line reader that remembers the one-based number of the last line read
struct Lines<R> {
    inner: std::io::Lines<R>,
    number: usize,
}

impl<R: BufRead> Lines<R> {
    const fn new(inner: std::io::Lines<R>) -> Self {
        Self { inner, number: 0 }
    }

    fn next_line(&mut self, what: &str) -> Result<String> {
        self.number += 1;
        match self.inner.next() {
            Some(line) => Ok(line?),
            None => Err(parse_error(
                self.number,
                &format!("unexpected end of file, expected {what}"),
            )),
        }
    }

    // First two tokens of a header line; anything after them is commentary
    fn header_pair<A: FromStr, B: FromStr>(&mut self, what: &str) -> Result<(A, B)> {
        let line = self.next_line(what)?;
        let mut tokens = line.split_whitespace();
        let first = parse_token(tokens.next(), self.number, what)?;
        let second = parse_token(tokens.next(), self.number, what)?;
        Ok((first, second))
    }
}

fn parse_token<T: FromStr>(token: Option<&str>, line: usize, what: &str) -> Result<T> {
    let token = token.ok_or_else(|| parse_error(line, &format!("missing value for {what}")))?;
    token
        .parse()
        .map_err(|_bad_token| parse_error(line, &format!("cannot read '{token}' as {what}")))
}

/// Read an ASCII grid
///
/// Origin and spacing are converted from `file_unit` into the unit resolved
/// from `preferences`.
///
/// # Errors
///
/// Returns `Parse` with the offending line number for malformed or missing
/// header fields and body values or for dimensions too large to store,
/// `InvalidGeometry` for unusable dimensions or spacing, or `FileSystem` if
/// reading fails
pub fn read_ascii_grid(
    reader: impl BufRead,
    name: impl Into<String>,
    file_unit: DistanceUnit,
    preferences: UnitPreferences,
) -> Result<Grid3d> {
    let mut lines = Lines::new(reader.lines());

    let (x0, y0): (f64, f64) = lines.header_pair("origin x0 y0")?;
    let (dx, dy): (f64, f64) = lines.header_pair("spacing dx dy")?;
    let (nx, ny): (usize, usize) = lines.header_pair("dimensions nx ny")?;
    let cells = nx
        .checked_mul(ny)
        .filter(|&cells| cells <= MAX_CELL_COUNT)
        .ok_or_else(|| parse_error(lines.number, &format!("{nx}x{ny} cells cannot be stored")))?;
    let (angle, null_value): (f64, f32) = lines.header_pair("angle and null value")?;

    let app_unit = preferences.resolve(file_unit);
    let to_app = |value: f64| file_unit.convert(value, app_unit);
    let geometry = GridGeometry::from_origin(
        Point::new(to_app(x0), to_app(y0)),
        to_app(dx),
        to_app(dy),
        ny,
        nx,
        angle,
    )?;

    // File order: column by column, top row first
    let mut body: Vec<f32> = Vec::new();
    while body.len() < cells {
        let line = lines.next_line("grid values")?;
        let column_left = ny - body.len() % ny;
        let mut tokens = line.split_whitespace();
        for token in tokens.by_ref().take(column_left) {
            body.push(parse_token(Some(token), lines.number, "a grid value")?);
        }
        if tokens.next().is_some() {
            debug!(line = lines.number, "ignoring values past the end of a column");
        }
    }
    let values = Array2::from_shape_fn((ny, nx), |(row, col)| {
        body.get(col * ny + (ny - 1 - row))
            .copied()
            .unwrap_or(null_value)
    });

    let mut grid = Grid3d::with_null_value(name, geometry, null_value);
    grid.set_values(values)?;
    Ok(grid)
}

/// Read an ASCII grid file, naming the grid after the file stem
///
/// # Errors
///
/// As [`read_ascii_grid`], plus `FileSystem` if the file cannot be opened
pub fn read_ascii_grid_file(
    path: &Path,
    file_unit: DistanceUnit,
    preferences: UnitPreferences,
) -> Result<Grid3d> {
    let file = File::open(path).map_err(|e| file_system_error(path, "open ascii grid", e))?;
    let name = path
        .file_stem()
        .map_or_else(|| "grid".to_string(), |stem| stem.to_string_lossy().into_owned());
    read_ascii_grid(BufReader::new(file), name, file_unit, preferences).map_err(|err| match err {
        GridError::FileSystem { source, .. } => file_system_error(path, "read ascii grid", source),
        other => other,
    })
}

/// Write an ASCII grid
///
/// Origin and spacing are converted into `file_unit`. The format can only
/// describe rectangular geometries; other shapes are written from their first
/// row and column edges.
///
/// # Errors
///
/// Returns `FileSystem` if writing fails
pub fn write_ascii_grid(
    grid: &Grid3d,
    writer: &mut impl Write,
    file_unit: DistanceUnit,
    preferences: UnitPreferences,
) -> Result<()> {
    let geometry = grid.geometry();
    if !geometry.is_rectangular() {
        warn!(
            grid = grid.name(),
            "geometry is not rectangular; ascii output keeps only origin, spacing and angle"
        );
    }

    let app_unit = preferences.resolve(file_unit);
    let to_file = |value: f64| app_unit.convert(value, file_unit);
    let [origin, ..] = *geometry.corner_points();
    let spacing = |value: f64| to_file(if value > 0.0 { value } else { 1.0 });
    let (num_rows, num_cols) = geometry.dimensions();

    writeln!(
        writer,
        "{} {} [x0 and y0 origins of the grid. No more than {ASCII_VALUES_PER_LINE} items per record, so columns span records]",
        to_file(origin.x),
        to_file(origin.y)
    )?;
    writeln!(
        writer,
        "{} {} [dx (column) and dy (row) spacing of the grid]",
        spacing(geometry.col_spacing()),
        spacing(geometry.row_spacing())
    )?;
    writeln!(
        writer,
        "{num_cols} {num_rows} [number of columns, number of rows]"
    )?;
    writeln!(
        writer,
        "{} {} [rotation angle (from +x axis, cartesian system) and value to be treated as null]",
        geometry.rotation_degrees(),
        grid.null_value()
    )?;

    let values = grid.values();
    for col in 0..num_cols {
        let mut count = 0;
        for row in (0..num_rows).rev() {
            let value = values.get([row, col]).copied().unwrap_or(grid.null_value());
            write!(writer, " {value:>10}")?;
            count += 1;
            if count == ASCII_VALUES_PER_LINE {
                writeln!(writer)?;
                count = 0;
            }
        }
        if count > 0 {
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write an ASCII grid file
///
/// # Errors
///
/// Returns `FileSystem` if the file cannot be created or written
pub fn write_ascii_grid_file(
    grid: &Grid3d,
    path: &Path,
    file_unit: DistanceUnit,
    preferences: UnitPreferences,
) -> Result<()> {
    let file = File::create(path).map_err(|e| file_system_error(path, "create ascii grid", e))?;
    let mut writer = BufWriter::new(file);
    write_ascii_grid(grid, &mut writer, file_unit, preferences).map_err(|err| match err {
        GridError::FileSystem { source, .. } => file_system_error(path, "write ascii grid", source),
        other => other,
    })
}
