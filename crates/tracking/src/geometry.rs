//! Normalized frame geometry
//!
//! All coordinates are fractions of the frame in `[0, 1]`, origin at the
//! top-left corner, `y` growing downward.

use serde::{Deserialize, Serialize};

/// A point in normalized frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    #[inline]
    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Displacement from `self` to `other`
    pub fn vector_to(&self, other: &Point) -> MovementVector {
        MovementVector::between(self, other)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn in_frame(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// Axis-aligned box; `a` is the top-left corner, `b` the bottom-right.
///
/// Zero-area boxes are legal. Inverted boxes are rejected where
/// predictions enter the tracker, so the methods here assume
/// `a.x <= b.x` and `a.y <= b.y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub a: Point,
    pub b: Point,
}

impl BoundingBox {
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Build a box from its corner coordinates
    pub const fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            a: Point::new(ax, ay),
            b: Point::new(bx, by),
        }
    }

    #[inline]
    pub fn w(&self) -> f64 {
        self.b.x - self.a.x
    }

    #[inline]
    pub fn h(&self) -> f64 {
        self.b.y - self.a.y
    }

    pub fn center(&self) -> Point {
        Point::new((self.a.x + self.b.x) / 2.0, (self.a.y + self.b.y) / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.w() * self.h()
    }

    /// Intersection area divided by the area of `self`.
    ///
    /// Not symmetric: this answers "how much of `self` lies inside
    /// `other`". Returns 0 when the boxes do not intersect or either box
    /// has no area.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f64 {
        let self_area = self.area();
        if self_area <= 0.0 || other.area() <= 0.0 {
            return 0.0;
        }

        let intersection_width = (self.b.x.min(other.b.x) - self.a.x.max(other.a.x)).max(0.0);
        let intersection_height = (self.b.y.min(other.b.y) - self.a.y.max(other.a.y)).max(0.0);

        (intersection_width * intersection_height / self_area).clamp(0.0, 1.0)
    }

    /// Corner-wise midpoint of two boxes
    pub fn average_with(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_corners(
            (self.a.x + other.a.x) / 2.0,
            (self.a.y + other.a.y) / 2.0,
            (self.b.x + other.b.x) / 2.0,
            (self.b.y + other.b.y) / 2.0,
        )
    }

    /// Smallest box covering both `self` and `other`
    pub fn union_with(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_corners(
            self.a.x.min(other.a.x),
            self.a.y.min(other.a.y),
            self.b.x.max(other.b.x),
            self.b.y.max(other.b.y),
        )
    }

    /// This box with every corner pulled inside `bounds`
    pub fn clamped_to(&self, bounds: &BoundingBox) -> BoundingBox {
        let clamp = |v: f64, lo: f64, hi: f64| v.max(lo).min(hi);
        BoundingBox::from_corners(
            clamp(self.a.x, bounds.a.x, bounds.b.x),
            clamp(self.a.y, bounds.a.y, bounds.b.y),
            clamp(self.b.x, bounds.a.x, bounds.b.x),
            clamp(self.b.y, bounds.a.y, bounds.b.y),
        )
    }

    /// True when `other` lies entirely inside `self` (edges inclusive)
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.a.x <= other.a.x
            && self.a.y <= other.a.y
            && self.b.x >= other.b.x
            && self.b.y >= other.b.y
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite()
    }

    /// Corners are ordered top-left to bottom-right
    pub fn is_ordered(&self) -> bool {
        self.a.x <= self.b.x && self.a.y <= self.b.y
    }
}

/// Displacement between two points.
///
/// `direction` is in degrees in `[-180, 180)`: 0° points right, 90° up,
/// -90° down and -180° left. Frame `y` grows downward, so it is flipped
/// before taking the angle. `direction360` is `direction + 180`, which puts
/// 0° on the left and keeps the value in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementVector {
    pub length: f64,
    pub direction: f64,
    pub direction360: f64,
}

impl MovementVector {
    pub fn between(from: &Point, to: &Point) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;

        let mut direction = (-dy).atan2(dx).to_degrees();
        if direction >= 180.0 {
            direction -= 360.0;
        }
        // atan2 can hand back -0.0
        direction += 0.0;

        Self {
            length: from.distance_to(to),
            direction,
            direction360: direction + 180.0,
        }
    }
}
