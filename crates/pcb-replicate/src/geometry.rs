//! Integer board geometry.
//!
//! Coordinates follow KiCad: board units (nanometres), Y axis pointing down,
//! angles in degrees with positive values turning counter-clockwise on screen.
//! A flip is KiCad's default top-bottom mirror across a horizontal line.

use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Rotate this point about `center` by `angle` degrees.
    pub fn rotated(self, center: Point, angle: f64) -> Point {
        center + (self - center).rotated_vec(angle)
    }

    /// Rotate this point as a vector about the origin.
    pub fn rotated_vec(self, angle: f64) -> Point {
        if angle == 0.0 {
            return self;
        }
        let (sin, cos) = angle.to_radians().sin_cos();
        let (x, y) = (self.x as f64, self.y as f64);
        Point::new(
            (x * cos + y * sin).round() as i64,
            (-x * sin + y * cos).round() as i64,
        )
    }

    /// Mirror across the horizontal line through `center`.
    pub fn flipped(self, center: Point) -> Point {
        Point::new(self.x, 2 * center.y - self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        let d = self - other;
        (d.x as f64).hypot(d.y as f64)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Normalize an angle into `[-180, 180)` degrees.
///
/// Results are snapped to a micro-degree so repeated transforms of the same
/// input produce bit-identical orientations.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = ((angle % 360.0) * 1e6).round() / 1e6;
    if a >= 180.0 {
        a -= 360.0;
    } else if a < -180.0 {
        a += 360.0;
    }
    if a == 0.0 { 0.0 } else { a }
}

/// Orientation of an object after a top-bottom flip.
pub fn flipped_angle(angle: f64) -> f64 {
    let a = normalize_angle(angle);
    if a > 0.0 {
        normalize_angle(180.0 - a)
    } else {
        normalize_angle(-180.0 - a)
    }
}

/// Axis-aligned bounding box, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl BoundingBox {
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(BoundingBox::new(first, first), |bbox, p| {
            bbox.merge(&BoundingBox::new(p, p))
        }))
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }

    pub fn center(&self) -> Point {
        Point::new((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    pub fn inflate(&self, margin: i64) -> Self {
        Self {
            left: self.left - margin,
            top: self.top - margin,
            right: self.right + margin,
            bottom: self.bottom + margin,
        }
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    pub fn merge(&self, other: &BoundingBox) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Smallest box covering every box in `boxes`.
    pub fn union<I: IntoIterator<Item = BoundingBox>>(boxes: I) -> Option<Self> {
        boxes.into_iter().reduce(|a, b| a.merge(&b))
    }
}
