// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Geometry primitives shared by every classifier.
//!
//! All angle math goes through [`angle`]; [`interior_angle`] only folds its
//! result and never recomputes it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 2D image-space point with optional depth.
///
/// Image coordinates grow rightwards in `x` and downwards in `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate (increases downwards).
    pub y: f32,
    /// Optional depth reported by 3D-capable pose models.
    pub z: Option<f32>,
}

impl Point {
    /// Create a 2D point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    /// Create a point carrying a depth coordinate.
    #[must_use]
    pub const fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Whether both planar coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise mean of two points (depth is dropped).
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.z {
            Some(z) => [self.x, self.y, z].serialize(serializer),
            None => [self.x, self.y].serialize(serializer),
        }
    }
}

/// Accepted wire shapes for a point: `[x, y]`, `[x, y, z]` or `{"x":..,"y":..}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Seq(Vec<f32>),
    Map { x: f32, y: f32, z: Option<f32> },
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PointRepr::deserialize(deserializer)? {
            PointRepr::Seq(v) => match v.as_slice() {
                [x, y] => Ok(Self::new(*x, *y)),
                [x, y, z] => Ok(Self::with_depth(*x, *y, *z)),
                _ => Err(serde::de::Error::custom(format!(
                    "point must have 2 or 3 coordinates, got {}",
                    v.len()
                ))),
            },
            PointRepr::Map { x, y, z } => Ok(Self { x, y, z }),
        }
    }
}

/// Signed angle in degrees at vertex `b` between rays `b→a` and `b→c`.
///
/// Computed as `atan2(cross, dot)` of `(a − b)` and `(c − b)` and normalized
/// into `[0, 360)`. Swapping `a` and `c` mirrors the result (`θ` becomes
/// `360 − θ`).
///
/// # Returns
///
/// * `None` when `a == b` or `c == b`; the caller must treat the rule as
///   unclassifiable.
#[must_use]
pub fn angle(a: Point, b: Point, c: Point) -> Option<f32> {
    let ab = (a.x - b.x, a.y - b.y);
    let cb = (c.x - b.x, c.y - b.y);

    if (ab.0 == 0.0 && ab.1 == 0.0) || (cb.0 == 0.0 && cb.1 == 0.0) {
        return None;
    }

    // Unfused on purpose: identical rays must give an exact zero cross product.
    let dot = ab.0 * cb.0 + ab.1 * cb.1;
    let cross = ab.0 * cb.1 - ab.1 * cb.0;
    let degrees = cross.atan2(dot).to_degrees();
    let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };

    degrees.is_finite().then_some(degrees)
}

/// Unsigned joint angle in `[0, 180]`, i.e. [`angle`] folded so that left
/// and right limbs bucket identically.
#[must_use]
pub fn interior_angle(a: Point, b: Point, c: Point) -> Option<f32> {
    angle(a, b, c).map(|deg| if deg > 180.0 { 360.0 - deg } else { deg })
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_angle_collinear_is_straight() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.5, 0.0);
        let c = Point::new(1.0, 0.0);
        assert!((angle(a, b, c).unwrap() - 180.0).abs() < EPS);
    }

    #[test]
    fn test_angle_same_endpoint_is_zero() {
        let a = Point::new(0.2, 0.7);
        let b = Point::new(0.5, 0.5);
        assert!(angle(a, b, a).unwrap().abs() < EPS);
    }

    #[test]
    fn test_angle_is_signed() {
        let a = Point::new(1.0, 0.0);
        let b = Point::new(0.0, 0.0);
        let c = Point::new(0.0, 1.0);
        let abc = angle(a, b, c).unwrap();
        let cba = angle(c, b, a).unwrap();
        assert!((abc - 90.0).abs() < EPS);
        assert!((cba - 270.0).abs() < EPS);
        assert!((abc - cba).abs() > 1.0);
    }

    #[test]
    fn test_angle_degenerate() {
        let a = Point::new(0.3, 0.3);
        let c = Point::new(0.9, 0.1);
        assert!(angle(a, a, c).is_none());
        assert!(angle(a, c, c).is_none());
        assert!(interior_angle(a, a, c).is_none());
    }

    #[test]
    fn test_interior_angle_folds() {
        let a = Point::new(1.0, 0.0);
        let b = Point::new(0.0, 0.0);
        let c = Point::new(0.0, 1.0);
        assert!((interior_angle(a, b, c).unwrap() - 90.0).abs() < EPS);
        assert!((interior_angle(c, b, a).unwrap() - 90.0).abs() < EPS);
    }

    #[test]
    fn test_distance_symmetry() {
        let a = Point::new(0.1, 0.9);
        let b = Point::new(0.4, 0.5);
        assert_eq!(distance(a, b), distance(b, a));
        assert!((distance(a, b) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_point_wire_shapes() {
        let p: Point = serde_json::from_str("[0.25, 0.5]").unwrap();
        assert_eq!(p, Point::new(0.25, 0.5));

        let p: Point = serde_json::from_str("[0.25, 0.5, -0.1]").unwrap();
        assert_eq!(p.z, Some(-0.1));

        let p: Point = serde_json::from_str(r#"{"x": 0.1, "y": 0.2}"#).unwrap();
        assert_eq!(p, Point::new(0.1, 0.2));

        assert!(serde_json::from_str::<Point>("[0.1]").is_err());
    }
}
