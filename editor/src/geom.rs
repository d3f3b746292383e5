//! Geometry primitives: points, 2D affine transforms and outline paths.
//!
//! Paths are expressed in layer space; a [`Affine`] maps them to surface
//! pixels. Backends that understand arcs natively draw [`Path::Circle`]
//! directly, others flatten it with [`Path::to_polygon`].

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::consts::CIRCLE_SEGMENTS;

/// A point in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Rotate this point by `degrees` (clockwise on screen) around `center`.
    #[must_use]
    pub fn rotate_around(self, center: Point, degrees: f64) -> Point {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
    }
}

/// Row-major 2D affine transform `[a c e; b d f]`, matching the canvas
/// `setTransform(a, b, c, d, e, f)` convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    /// `self` followed by a translation in local space.
    #[must_use]
    pub fn then_translate(self, dx: f64, dy: f64) -> Affine {
        Affine { e: self.a * dx + self.c * dy + self.e, f: self.b * dx + self.d * dy + self.f, ..self }
    }

    /// `self` followed by a rotation in local space.
    #[must_use]
    pub fn then_rotate(self, radians: f64) -> Affine {
        let (sin, cos) = radians.sin_cos();
        Affine {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            e: self.e,
            f: self.f,
        }
    }

    /// Map a local point to surface space.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y + self.e, self.b * p.x + self.d * p.y + self.f)
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Uniform scale factor (square root of the absolute determinant).
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// The inverse transform, or `None` when the matrix is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Affine> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// An outline to fill or stroke.
#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    /// Axis-aligned rectangle in local space.
    Rect { x: f64, y: f64, width: f64, height: f64 },
    /// Circle centred at `(cx, cy)`.
    Circle { cx: f64, cy: f64, radius: f64 },
    /// Closed polygon through the given vertices.
    Polygon(Vec<Point>),
    /// Open freehand line; stroked with round joins and caps.
    Polyline(Vec<Point>),
}

impl Path {
    /// Whether the last vertex connects back to the first.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !matches!(self, Path::Polyline(_))
    }

    /// Flatten into vertices in local space. Closed unless [`Path::Polyline`].
    #[must_use]
    pub fn to_polygon(&self) -> Vec<Point> {
        match self {
            Path::Rect { x, y, width, height } => vec![
                Point::new(*x, *y),
                Point::new(x + width, *y),
                Point::new(x + width, y + height),
                Point::new(*x, y + height),
            ],
            Path::Circle { cx, cy, radius } => (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let t = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
                    Point::new(cx + radius * t.cos(), cy + radius * t.sin())
                })
                .collect(),
            Path::Polygon(points) | Path::Polyline(points) => points.clone(),
        }
    }
}
