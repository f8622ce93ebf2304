//! Corner-point grid geometry
//!
//! A geometry is fixed by its row and column counts and four world-space corner
//! points ordered by (row, col) as (0, 0), (0, ncols-1), (nrows-1, ncols-1),
//! (nrows-1, 0):
//!
//! ```text
//!   3---------------2   nrows-1
//!   |   |   |   |   |
//!   |---+---+---+---|      ^
//!   |   |   |   |   |      |
//!   0---------------1      0
//!   0      --->     ncols-1
//! ```
//!
//! Node positions are bilinear blends of the corners, so sheared and tapered
//! grids are represented as well as rotated rectangles.

use crate::io::configuration::{MAX_CELL_COUNT, SHAPE_TOLERANCE};
use crate::io::error::{GridError, Result};
use crate::math::interpolation::{bilinear_point, inverse_bilinear};

/// World-space coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Easting
    pub x: f64,
    /// Northing
    pub y: f64,
}

impl Point {
    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    const fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }

    fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Immutable mapping between grid indices and world coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    num_rows: usize,
    num_cols: usize,
    corners: [Point; 4],
    row_spacing: f64,
    col_spacing: f64,
    rotation_degrees: f64,
    rectilinear: bool,
    rectangular: bool,
}

impl GridGeometry {
    /// Create a geometry from its dimensions and corner points
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if either dimension is zero, the cell count
    /// exceeds `MAX_CELL_COUNT`, a corner is not finite, or (for grids with
    /// more than one row and column) the corners do not form a convex
    /// quadrilateral in a consistent winding order.
    pub fn new(num_rows: usize, num_cols: usize, corners: [Point; 4]) -> Result<Self> {
        if num_rows == 0 || num_cols == 0 {
            return Err(GridError::InvalidGeometry {
                reason: format!("dimensions must be at least 1x1, got {num_rows}x{num_cols}"),
            });
        }
        if num_rows
            .checked_mul(num_cols)
            .is_none_or(|cells| cells > MAX_CELL_COUNT)
        {
            return Err(GridError::InvalidGeometry {
                reason: format!("{num_rows}x{num_cols} cells cannot be stored"),
            });
        }
        if !corners.iter().all(|corner| corner.is_finite()) {
            return Err(GridError::InvalidGeometry {
                reason: "corner points must be finite".to_string(),
            });
        }
        if num_rows > 1 && num_cols > 1 && !is_convex_quad(&corners) {
            return Err(GridError::InvalidGeometry {
                reason: "corner points must form a convex quadrilateral ordered consistently"
                    .to_string(),
            });
        }

        let [p0, p1, p2, p3] = corners;
        let col_spacing = if num_cols > 1 {
            p0.distance(p1) / (num_cols - 1) as f64
        } else {
            0.0
        };
        let row_spacing = if num_rows > 1 {
            p0.distance(p3) / (num_rows - 1) as f64
        } else {
            0.0
        };
        let rotation_degrees = (p1.y - p0.y).atan2(p1.x - p0.x).to_degrees();

        let rectilinear = (p1.x - p0.x - (p2.x - p3.x)).abs() < SHAPE_TOLERANCE
            && (p1.y - p0.y - (p2.y - p3.y)).abs() < SHAPE_TOLERANCE
            && (p3.x - p0.x - (p2.x - p1.x)).abs() < SHAPE_TOLERANCE
            && (p3.y - p0.y - (p2.y - p1.y)).abs() < SHAPE_TOLERANCE;
        let rectangular = rectilinear && {
            let dot = (p1.x - p0.x).mul_add(p3.x - p0.x, (p1.y - p0.y) * (p3.y - p0.y));
            let lengths = p0.distance(p1) * p0.distance(p3);
            lengths <= 0.0 || (dot / lengths).abs() < SHAPE_TOLERANCE
        };

        Ok(Self {
            num_rows,
            num_cols,
            corners,
            row_spacing,
            col_spacing,
            rotation_degrees,
            rectilinear,
            rectangular,
        })
    }

    /// Create a rectangular geometry from an origin, spacings and a rotation
    ///
    /// Columns advance along `rotation_degrees` (counter-clockwise from +x) and
    /// rows advance 90 degrees further round.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if a spacing is not positive and finite, or for
    /// the conditions listed on [`GridGeometry::new`].
    pub fn from_origin(
        origin: Point,
        col_spacing: f64,
        row_spacing: f64,
        num_rows: usize,
        num_cols: usize,
        rotation_degrees: f64,
    ) -> Result<Self> {
        if !(col_spacing.is_finite() && col_spacing > 0.0) {
            return Err(GridError::InvalidGeometry {
                reason: format!("column spacing must be positive, got {col_spacing}"),
            });
        }
        if !(row_spacing.is_finite() && row_spacing > 0.0) {
            return Err(GridError::InvalidGeometry {
                reason: format!("row spacing must be positive, got {row_spacing}"),
            });
        }

        let (sin_col, cos_col) = rotation_degrees.to_radians().sin_cos();
        let (sin_row, cos_row) = (rotation_degrees + 90.0).to_radians().sin_cos();
        let last_row = num_rows.saturating_sub(1) as f64;
        let last_col = num_cols.saturating_sub(1) as f64;

        let corner = |row: f64, col: f64| {
            Point::new(
                (row * row_spacing).mul_add(cos_row, (col * col_spacing).mul_add(cos_col, origin.x)),
                (row * row_spacing).mul_add(sin_row, (col * col_spacing).mul_add(sin_col, origin.y)),
            )
        };

        Self::new(
            num_rows,
            num_cols,
            [
                corner(0.0, 0.0),
                corner(0.0, last_col),
                corner(last_row, last_col),
                corner(last_row, 0.0),
            ],
        )
    }

    /// Number of rows
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns
    pub const fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Grid dimensions (rows, cols)
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    /// Corner points in (0,0), (0,C-1), (R-1,C-1), (R-1,0) order
    pub const fn corner_points(&self) -> &[Point; 4] {
        &self.corners
    }

    /// Distance between adjacent rows along the first column
    pub const fn row_spacing(&self) -> f64 {
        self.row_spacing
    }

    /// Distance between adjacent columns along the first row
    pub const fn col_spacing(&self) -> f64 {
        self.col_spacing
    }

    /// Angle of the first row from +x, in degrees
    pub const fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    /// Opposite edges are parallel and equal in length
    pub const fn is_rectilinear(&self) -> bool {
        self.rectilinear
    }

    /// Rectilinear with perpendicular row and column directions
    pub const fn is_rectangular(&self) -> bool {
        self.rectangular
    }

    /// Whether a fractional (row, col) lies on the node lattice extent
    pub fn contains_index(&self, row: f64, col: f64) -> bool {
        row >= 0.0
            && col >= 0.0
            && row <= (self.num_rows - 1) as f64
            && col <= (self.num_cols - 1) as f64
    }

    /// Same dimensions and corners within tolerance
    pub fn matches(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions()
            && self
                .corners
                .iter()
                .zip(other.corners.iter())
                .all(|(a, b)| a.distance(*b) < SHAPE_TOLERANCE)
    }

    fn corner_array(&self) -> [[f64; 2]; 4] {
        self.corners.map(Point::to_array)
    }

    /// World position of a (possibly fractional) row and column
    ///
    /// Indices are not bounds-checked; positions beyond the lattice extrapolate
    /// the bilinear map.
    pub fn to_world(&self, row: f64, col: f64) -> Point {
        let u = normalize(col, self.num_cols);
        let v = normalize(row, self.num_rows);
        let [x, y] = bilinear_point(&self.corner_array(), u, v);
        Point::new(x, y)
    }

    /// Fractional (row, col) of a world position
    ///
    /// Points outside the quadrilateral come back outside `[0, R-1] x [0, C-1]`;
    /// when no inverse exists at all both values are NaN. Neither case is an
    /// error, callers test the result with [`GridGeometry::contains_index`].
    pub fn to_index(&self, x: f64, y: f64) -> (f64, f64) {
        let point = Point::new(x, y);
        let [p0, p1, _, p3] = self.corners;

        match (self.num_rows, self.num_cols) {
            (1, 1) => {
                if p0.distance(point) <= SHAPE_TOLERANCE {
                    (0.0, 0.0)
                } else {
                    (f64::NAN, f64::NAN)
                }
            }
            (rows, 1) => match project_onto_segment(p0, p3, point) {
                Some(t) => (t * (rows - 1) as f64, 0.0),
                None => (f64::NAN, f64::NAN),
            },
            (1, cols) => match project_onto_segment(p0, p1, point) {
                Some(t) => (0.0, t * (cols - 1) as f64),
                None => (f64::NAN, f64::NAN),
            },
            (rows, cols) => match inverse_bilinear(&self.corner_array(), point.to_array()) {
                Some([u, v]) => (v * (rows - 1) as f64, u * (cols - 1) as f64),
                None => (f64::NAN, f64::NAN),
            },
        }
    }
}

fn normalize(index: f64, count: usize) -> f64 {
    if count > 1 {
        index / (count - 1) as f64
    } else {
        0.0
    }
}

// Parameter of `point` along `a→b`, or None if it lies off the line
fn project_onto_segment(a: Point, b: Point, point: Point) -> Option<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);
    if length_sq <= 0.0 {
        return (a.distance(point) <= SHAPE_TOLERANCE).then_some(0.0);
    }
    let hx = point.x - a.x;
    let hy = point.y - a.y;
    let offset = dx.mul_add(hy, -(dy * hx)).abs() / length_sq.sqrt();
    (offset <= SHAPE_TOLERANCE).then(|| dx.mul_add(hx, dy * hy) / length_sq)
}

// Both diagonals split the quad into triangles of one winding
fn is_convex_quad(corners: &[Point; 4]) -> bool {
    let turn = |a: Point, b: Point, c: Point| {
        (b.x - a.x).mul_add(c.y - a.y, -((b.y - a.y) * (c.x - a.x)))
    };
    let [p0, p1, p2, p3] = *corners;
    let turns = [
        turn(p0, p1, p2),
        turn(p1, p2, p3),
        turn(p2, p3, p0),
        turn(p3, p0, p1),
    ];
    turns.iter().all(|&t| t > 0.0) || turns.iter().all(|&t| t < 0.0)
}
