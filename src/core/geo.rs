use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Div, Mul, Sub};

/// Degrees to radians factor
pub const DEG_TO_RAD: f64 = PI / 180.0;

/// Radians to degrees factor
pub const RAD_TO_DEG: f64 = 180.0 / PI;

/// Represents a point in screen, projected or geographic coordinates.
///
/// Geographic points carry longitude in `x` and latitude in `y`, both in
/// radians. Projected points are meters, screen points are pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a geographic point from degrees
    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self::new(lon * DEG_TO_RAD, lat * DEG_TO_RAD)
    }

    /// Converts a geographic point back to degrees
    pub fn to_degrees(self) -> Self {
        Self::new(self.x * RAD_TO_DEG, self.y * RAD_TO_DEG)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
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

/// Component-wise product, used for per-axis scale factors
impl Mul for Point {
    type Output = Point;

    fn mul(self, rhs: Point) -> Point {
        Point::new(self.x * rhs.x, self.y * rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Component-wise quotient
impl Div for Point {
    type Output = Point;

    fn div(self, rhs: Point) -> Point {
        Point::new(self.x / rhs.x, self.y / rhs.y)
    }
}

/// Size of a view in whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis aligned rectangle in geographic radians.
///
/// `top_left` holds the western longitude and northern latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRect {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl GeoRect {
    pub fn new(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Creates a rectangle from degrees (west, north, east, south)
    pub fn from_degrees(west: f64, north: f64, east: f64, south: f64) -> Self {
        Self::new(
            Point::from_degrees(west, north),
            Point::from_degrees(east, south),
        )
    }

    pub fn width(&self) -> f64 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> f64 {
        self.bottom_right.y - self.top_left.y
    }

    /// True if the rectangle collapses to a line or a point
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.top_left.x + self.bottom_right.x) / 2.0,
            (self.top_left.y + self.bottom_right.y) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_operators() {
        let a = Point::new(2.0, -4.0);
        let b = Point::new(1.0, 2.0);

        assert_eq!(a + b, Point::new(3.0, -2.0));
        assert_eq!(a - b, Point::new(1.0, -6.0));
        assert_eq!(a * b, Point::new(2.0, -8.0));
        assert_eq!(a / b, Point::new(2.0, -2.0));
        assert_eq!(a * 0.5, Point::new(1.0, -2.0));
    }

    #[test]
    fn test_degree_conversion() {
        let p = Point::from_degrees(180.0, -90.0);
        assert!((p.x - PI).abs() < 1e-12);
        assert!((p.y + PI / 2.0).abs() < 1e-12);

        let back = p.to_degrees();
        assert!((back.x - 180.0).abs() < 1e-9);
        assert!((back.y + 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_rect_degenerate() {
        let line = GeoRect::from_degrees(10.0, 50.0, 12.0, 50.0);
        assert!(line.is_degenerate());

        let area = GeoRect::from_degrees(10.0, 50.0, 12.0, 49.0);
        assert!(!area.is_degenerate());
        assert!(area.width() > 0.0);
        assert!(area.height() < 0.0);
    }
}
