//! Area-of-interest polygons with inclusion and exclusion rings
//!
//! A point lies in the area when it is inside at least one inclusion polygon
//! and inside no exclusion polygon. Points on an edge or vertex count as inside
//! the polygon whose boundary they touch.

use crate::io::configuration::GEOMETRY_EPSILON;
use crate::io::error::{GridError, Result};
use crate::spatial::geometry::Point;

/// Role a polygon plays in the area of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonKind {
    /// Points inside are part of the area
    Inclusion,
    /// Points inside are removed from the area
    Exclusion,
}

/// Axis-aligned extent in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Lower-left corner
    pub min: Point,
    /// Upper-right corner
    pub max: Point,
}

impl BoundingBox {
    fn around(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(
            Self {
                min: *first,
                max: *first,
            },
            |bounds, p| bounds.expanded_to(*p),
        ))
    }

    const fn expanded_to(self, p: Point) -> Self {
        Self {
            min: Point::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Point::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    const fn union(self, other: Self) -> Self {
        self.expanded_to(other.min).expanded_to(other.max)
    }

    /// Whether (x, y) lies inside or on the box
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }
}

/// Closed polygon with an implicit closing edge
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    kind: PolygonKind,
    vertices: Vec<Point>,
    bounds: BoundingBox,
}

impl Polygon {
    /// Create a polygon from its vertices
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolygon` for fewer than three vertices or any
    /// non-finite coordinate
    pub fn new(kind: PolygonKind, vertices: Vec<Point>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(GridError::InvalidPolygon {
                reason: format!("needs at least 3 vertices, got {}", vertices.len()),
            });
        }
        if let Some(bad) = vertices
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            return Err(GridError::InvalidPolygon {
                reason: format!("vertex {bad} has a non-finite coordinate"),
            });
        }
        let bounds = BoundingBox::around(&vertices).ok_or_else(|| GridError::InvalidPolygon {
            reason: "polygon has no vertices".to_string(),
        })?;
        Ok(Self {
            kind,
            vertices,
            bounds,
        })
    }

    /// Inclusion or exclusion
    pub const fn kind(&self) -> PolygonKind {
        self.kind
    }

    /// Vertices in input order
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Axis-aligned extent of the vertices
    pub const fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.vertices
            .iter()
            .copied()
            .zip(self.vertices.iter().copied().cycle().skip(1))
    }

    /// Ray-casting containment, boundary inclusive
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if !self.bounds.contains(x, y) {
            return false;
        }
        let point = Point::new(x, y);
        if self.edges().any(|(a, b)| on_segment(a, b, point)) {
            return true;
        }

        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > y) != (b.y > y) {
                let crossing = (b.x - a.x).mul_add((y - a.y) / (b.y - a.y), a.x);
                if x < crossing {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let cross = dx.mul_add(p.y - a.y, -(dy * (p.x - a.x)));
    let scale = dx.abs().max(dy.abs()).max(1.0);
    if cross.abs() > GEOMETRY_EPSILON * scale {
        return false;
    }
    p.x >= a.x.min(b.x) - GEOMETRY_EPSILON
        && p.x <= a.x.max(b.x) + GEOMETRY_EPSILON
        && p.y >= a.y.min(b.y) - GEOMETRY_EPSILON
        && p.y <= a.y.max(b.y) + GEOMETRY_EPSILON
}

/// Ordered set of inclusion and exclusion polygons
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaOfInterest {
    polygons: Vec<Polygon>,
}

impl AreaOfInterest {
    /// Empty area; contains nothing until an inclusion polygon is added
    pub const fn new() -> Self {
        Self {
            polygons: Vec::new(),
        }
    }

    /// Append a validated polygon
    pub fn push(&mut self, polygon: Polygon) {
        self.polygons.push(polygon);
    }

    /// Validate and append an inclusion polygon
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolygon` under the rules of [`Polygon::new`]
    pub fn add_inclusion(&mut self, vertices: Vec<Point>) -> Result<()> {
        self.push(Polygon::new(PolygonKind::Inclusion, vertices)?);
        Ok(())
    }

    /// Validate and append an exclusion polygon
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolygon` under the rules of [`Polygon::new`]
    pub fn add_exclusion(&mut self, vertices: Vec<Point>) -> Result<()> {
        self.push(Polygon::new(PolygonKind::Exclusion, vertices)?);
        Ok(())
    }

    /// Polygons in insertion order
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// No polygons at all
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    fn of_kind(&self, kind: PolygonKind) -> impl Iterator<Item = &Polygon> {
        self.polygons.iter().filter(move |p| p.kind == kind)
    }

    /// Extent of all inclusion polygons, `None` when there are none
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.of_kind(PolygonKind::Inclusion)
            .map(Polygon::bounding_box)
            .reduce(BoundingBox::union)
    }

    /// Whether (x, y) is inside some inclusion polygon and no exclusion polygon
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.of_kind(PolygonKind::Inclusion).any(|p| p.contains(x, y))
            && !self.of_kind(PolygonKind::Exclusion).any(|p| p.contains(x, y))
    }
}
