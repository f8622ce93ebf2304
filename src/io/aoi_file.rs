//! Area-of-interest text files
//!
//! ```text
//! # lease outline
//! inclusion
//! 0 0
//! 100 0
//! 100 100
//! exclusion
//! 40 40
//! 60 40
//! 50 60
//! ```
//!
//! `inclusion` or `exclusion` opens a polygon, each following `x y` line adds a
//! vertex, and `#` starts a comment running to the end of the line.

use std::fs;
use std::path::Path;

use crate::io::error::{GridError, Result, file_system_error, parse_error};
use crate::spatial::aoi::{AreaOfInterest, Polygon, PolygonKind};
use crate::spatial::geometry::Point;

/// Polygon under construction and the line that opened it
struct OpenPolygon {
    kind: PolygonKind,
    line: usize,
    vertices: Vec<Point>,
}

impl OpenPolygon {
    fn close(self, aoi: &mut AreaOfInterest) -> Result<()> {
        let polygon = Polygon::new(self.kind, self.vertices).map_err(|err| match err {
            GridError::InvalidPolygon { reason } => GridError::InvalidPolygon {
                reason: format!("polygon opened on line {}: {reason}", self.line),
            },
            other => other,
        })?;
        aoi.push(polygon);
        Ok(())
    }
}

/// Parse area-of-interest text
///
/// # Errors
///
/// Returns `Parse` with the line number for unknown keywords, malformed
/// vertices or vertices outside any polygon, and `InvalidPolygon` for a
/// polygon with fewer than three vertices
pub fn parse_aoi(text: &str) -> Result<AreaOfInterest> {
    let mut aoi = AreaOfInterest::new();
    let mut current: Option<OpenPolygon> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let kind = match content.to_ascii_lowercase().as_str() {
            "inclusion" | "include" => Some(PolygonKind::Inclusion),
            "exclusion" | "exclude" => Some(PolygonKind::Exclusion),
            _ => None,
        };
        if let Some(kind) = kind {
            if let Some(open) = current.take() {
                open.close(&mut aoi)?;
            }
            current = Some(OpenPolygon {
                kind,
                line,
                vertices: Vec::new(),
            });
            continue;
        }

        let vertex = parse_vertex(content, line)?;
        match current.as_mut() {
            Some(open) => open.vertices.push(vertex),
            None => {
                return Err(parse_error(
                    line,
                    &"vertex before any 'inclusion' or 'exclusion' line",
                ));
            }
        }
    }

    if let Some(open) = current {
        open.close(&mut aoi)?;
    }
    Ok(aoi)
}

fn parse_vertex(content: &str, line: usize) -> Result<Point> {
    let mut tokens = content.split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty());
    let mut coordinate = |axis: &str| -> Result<f64> {
        let token = tokens
            .next()
            .ok_or_else(|| parse_error(line, &format!("missing {axis} coordinate")))?;
        token
            .parse()
            .map_err(|_bad_number| parse_error(line, &format!("cannot read '{token}' as {axis}")))
    };
    let x = coordinate("x")?;
    let y = coordinate("y")?;
    if tokens.next().is_some() {
        return Err(parse_error(line, &"expected exactly two coordinates"));
    }
    Ok(Point::new(x, y))
}

/// Read an area-of-interest file
///
/// # Errors
///
/// Returns `FileSystem` if the file cannot be read, otherwise as [`parse_aoi`]
pub fn read_aoi_file(path: &Path) -> Result<AreaOfInterest> {
    let text = fs::read_to_string(path).map_err(|e| file_system_error(path, "read aoi", e))?;
    parse_aoi(&text)
}
