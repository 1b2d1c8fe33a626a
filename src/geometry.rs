//! Screen-space point math
//!
//! Every handler works in map-relative logical pixels, with `y` growing
//! downwards.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A point or vector in screen space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Length of this point seen as a vector
    pub fn mag(self) -> f64 {
        DVec2::from(self).length()
    }

    /// Euclidean distance to another point
    pub fn dist(self, other: Point) -> f64 {
        DVec2::from(self).distance(other.into())
    }

    /// Signed angle in radians between `self` and `other`
    ///
    /// Positive when turning from `other` to `self` is counter-clockwise on screen.
    pub fn angle_with(self, other: Point) -> f64 {
        let cross = self.x * other.y - self.y * other.x;
        let dot = self.x * other.x + self.y * other.y;
        cross.atan2(dot)
    }

    /// Point halfway between `self` and `other`
    pub fn midpoint(self, other: Point) -> Point {
        (self + other) / 2.0
    }

    /// True when the vertical component dominates
    pub fn is_vertical(self) -> bool {
        self.y.abs() > self.x.abs()
    }
}

impl From<DVec2> for Point {
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Point> for DVec2 {
    fn from(p: Point) -> Self {
        DVec2::new(p.x, p.y)
    }
}

impl From<[f32; 2]> for Point {
    fn from(pos: [f32; 2]) -> Self {
        Self::new(f64::from(pos[0]), f64::from(pos[1]))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, k: f64) -> Point {
        Point::new(self.x / k, self.y / k)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}
