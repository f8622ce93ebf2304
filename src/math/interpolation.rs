//! Bilinear blending and its inverse over a four-corner quadrilateral
//!
//! Corners are ordered `p0` at (u=0, v=0), `p1` at (u=1, v=0), `p2` at (u=1, v=1)
//! and `p3` at (u=0, v=1). The forward map blends along the `p0→p3` and `p1→p2`
//! edges by `v`, then across by `u`.

use crate::io::configuration::{GEOMETRY_EPSILON, NEWTON_MAX_ITERATIONS, NEWTON_TOLERANCE};
use num_traits::Float;

/// Slack allowed when deciding whether a root lies on the unit square
const ROOT_SLACK: f64 = 1e-9;

/// Linear interpolation between `a` and `b`
pub fn lerp<T: Float>(a: T, b: T, t: T) -> T {
    t.mul_add(b - a, a)
}

/// Interpolate between two points
pub fn lerp_point(a: [f64; 2], b: [f64; 2], t: f64) -> [f64; 2] {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t)]
}

/// Evaluate the bilinear map at parameters (u, v)
pub fn bilinear_point(corners: &[[f64; 2]; 4], u: f64, v: f64) -> [f64; 2] {
    let [p0, p1, p2, p3] = *corners;
    let left = lerp_point(p0, p3, v);
    let right = lerp_point(p1, p2, v);
    lerp_point(left, right, u)
}

const fn cross(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

const fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

/// Terms of `h = u*e + v*f + u*v*g` relative to corner `p0`
struct BilinearTerms {
    e: [f64; 2],
    f: [f64; 2],
    g: [f64; 2],
    h: [f64; 2],
}

impl BilinearTerms {
    fn new(corners: &[[f64; 2]; 4], point: [f64; 2]) -> Self {
        let [p0, p1, p2, p3] = *corners;
        Self {
            e: sub(p1, p0),
            f: sub(p3, p0),
            g: [p0[0] - p1[0] + p2[0] - p3[0], p0[1] - p1[1] + p2[1] - p3[1]],
            h: sub(point, p0),
        }
    }

    // Solve for u once v is known, using whichever axis is better conditioned
    fn u_for(&self, v: f64) -> Option<f64> {
        let denom_x = v.mul_add(self.g[0], self.e[0]);
        let denom_y = v.mul_add(self.g[1], self.e[1]);
        let u = if denom_x.abs() >= denom_y.abs() {
            (self.h[0] - self.f[0] * v) / denom_x
        } else {
            (self.h[1] - self.f[1] * v) / denom_y
        };
        u.is_finite().then_some(u)
    }

    fn scale(&self) -> f64 {
        cross(self.e, self.f).abs().max(GEOMETRY_EPSILON)
    }
}

const fn on_unit_square(uv: [f64; 2]) -> bool {
    uv[0] >= -ROOT_SLACK
        && uv[0] <= 1.0 + ROOT_SLACK
        && uv[1] >= -ROOT_SLACK
        && uv[1] <= 1.0 + ROOT_SLACK
}

// Distance from the unit square in parameter space, zero when on it
fn outside_distance(uv: [f64; 2]) -> f64 {
    let du = (-uv[0]).max(uv[0] - 1.0).max(0.0);
    let dv = (-uv[1]).max(uv[1] - 1.0).max(0.0);
    du.hypot(dv)
}

/// Closed-form inverse of the bilinear map
///
/// Returns `None` when the system is degenerate (collapsed edges or no real root),
/// leaving the caller to fall back on iteration.
pub fn inverse_bilinear_closed_form(corners: &[[f64; 2]; 4], point: [f64; 2]) -> Option<[f64; 2]> {
    let terms = BilinearTerms::new(corners, point);
    let k2 = cross(terms.g, terms.f);
    let k1 = cross(terms.e, terms.f) + cross(terms.h, terms.g);
    let k0 = cross(terms.h, terms.e);

    // Parallelogram: the quadratic term vanishes
    if k2.abs() <= GEOMETRY_EPSILON * terms.scale() {
        if k1.abs() <= GEOMETRY_EPSILON * terms.scale() {
            return None;
        }
        let v = -k0 / k1;
        let u = terms.u_for(v)?;
        return Some([u, v]);
    }

    let discriminant = k1.mul_add(k1, -4.0 * k0 * k2);
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let candidates = [(-k1 - root) / (2.0 * k2), (-k1 + root) / (2.0 * k2)]
        .into_iter()
        .filter_map(|v| terms.u_for(v).map(|u| [u, v]));

    let mut best: Option<[f64; 2]> = None;
    for uv in candidates {
        if on_unit_square(uv) {
            return Some(uv);
        }
        best = match best {
            Some(current) if outside_distance(current) <= outside_distance(uv) => Some(current),
            _ => Some(uv),
        };
    }
    best
}

/// Newton iteration for the inverse bilinear map starting at the quad centre
pub fn inverse_bilinear_newton(corners: &[[f64; 2]; 4], point: [f64; 2]) -> Option<[f64; 2]> {
    let terms = BilinearTerms::new(corners, point);
    let mut u = 0.5;
    let mut v = 0.5;

    for _ in 0..NEWTON_MAX_ITERATIONS {
        let residual = [
            (u * v).mul_add(terms.g[0], u.mul_add(terms.e[0], v * terms.f[0])) - terms.h[0],
            (u * v).mul_add(terms.g[1], u.mul_add(terms.e[1], v * terms.f[1])) - terms.h[1],
        ];
        // Jacobian columns: d/du and d/dv
        let du = [v.mul_add(terms.g[0], terms.e[0]), v.mul_add(terms.g[1], terms.e[1])];
        let dv = [u.mul_add(terms.g[0], terms.f[0]), u.mul_add(terms.g[1], terms.f[1])];
        let det = cross(du, dv);
        if det.abs() <= GEOMETRY_EPSILON * terms.scale() {
            return None;
        }
        let step_u = cross(residual, dv) / det;
        let step_v = cross(du, residual) / det;
        u -= step_u;
        v -= step_v;
        if !(u.is_finite() && v.is_finite()) {
            return None;
        }
        if step_u.abs().max(step_v.abs()) < NEWTON_TOLERANCE {
            return Some([u, v]);
        }
    }
    None
}

/// Invert the bilinear map: closed form first, Newton when that degenerates
pub fn inverse_bilinear(corners: &[[f64; 2]; 4], point: [f64; 2]) -> Option<[f64; 2]> {
    inverse_bilinear_closed_form(corners, point).or_else(|| inverse_bilinear_newton(corners, point))
}

/// Four surrounding nodes of a fractional (row, col) position with their weights
///
/// Order is (row0, col0), (row1, col0), (row0, col1), (row1, col1). Both
/// coordinates must be finite and non-negative.
pub fn bilinear_weights(row: f64, col: f64) -> [([usize; 2], f64); 4] {
    let row0 = row.floor().max(0.0) as usize;
    let col0 = col.floor().max(0.0) as usize;
    let row1_weight = row - row0 as f64;
    let col1_weight = col - col0 as f64;
    let row0_weight = 1.0 - row1_weight;
    let col0_weight = 1.0 - col1_weight;

    [
        ([row0, col0], row0_weight * col0_weight),
        ([row0 + 1, col0], row1_weight * col0_weight),
        ([row0, col0 + 1], row0_weight * col1_weight),
        ([row0 + 1, col0 + 1], row1_weight * col1_weight),
    ]
}
