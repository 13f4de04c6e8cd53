use std::fmt;

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::{Distance, EPSILON_DIST};

/// This represents world-space in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        if !x.is_finite() || !y.is_finite() {
            panic!("Bad Pt2D {}, {}", x, y);
        }

        Pt2D { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn dist_to(self, to: Pt2D) -> Distance {
        Distance::meters(self.raw_dist_to(to))
    }

    /// Not trimmed, for callers comparing tiny distances.
    pub fn raw_dist_to(self, to: Pt2D) -> f64 {
        ((self.x - to.x).powi(2) + (self.y - to.y).powi(2)).sqrt()
    }

    pub fn approx_eq(self, other: Pt2D, threshold: Distance) -> bool {
        self.raw_dist_to(other) <= threshold.inner_meters()
    }

    pub fn to_hashable(self) -> HashablePt2D {
        HashablePt2D::new(self.x, self.y)
    }

    pub fn to_coord(self) -> geo::Coord {
        geo::Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Cross product of (a - origin) and (b - origin). Positive when the three points turn
    /// left.
    pub fn cross(origin: Pt2D, a: Pt2D, b: Pt2D) -> f64 {
        (a.x - origin.x) * (b.y - origin.y) - (a.y - origin.y) * (b.x - origin.x)
    }

    /// True if the points are within EPSILON_DIST of each other.
    pub fn same_as(self, other: Pt2D) -> bool {
        self.approx_eq(other, EPSILON_DIST)
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}

impl From<geo::Coord> for Pt2D {
    fn from(coord: geo::Coord) -> Self {
        Pt2D::new(coord.x, coord.y)
    }
}

impl From<Pt2D> for geo::Coord {
    fn from(pt: Pt2D) -> Self {
        pt.to_coord()
    }
}

impl From<geo::Point> for Pt2D {
    fn from(pt: geo::Point) -> Self {
        Pt2D::new(pt.x(), pt.y())
    }
}

impl From<Pt2D> for geo::Point {
    fn from(pt: Pt2D) -> Self {
        geo::Point::new(pt.x, pt.y)
    }
}

/// This isn't opinionated about what the (x, y) represents. Exact equality, so only use this for
/// points that come from the same source, never for points computed along the way.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HashablePt2D {
    x_nan: NotNan<f64>,
    y_nan: NotNan<f64>,
}

impl HashablePt2D {
    pub fn new(x: f64, y: f64) -> HashablePt2D {
        HashablePt2D {
            x_nan: NotNan::new(x).unwrap(),
            y_nan: NotNan::new(y).unwrap(),
        }
    }

    pub fn x(&self) -> f64 {
        self.x_nan.into_inner()
    }

    pub fn y(&self) -> f64 {
        self.y_nan.into_inner()
    }

    pub fn to_pt2d(self) -> Pt2D {
        Pt2D::new(self.x(), self.y())
    }
}

impl From<Pt2D> for HashablePt2D {
    fn from(pt: Pt2D) -> Self {
        pt.to_hashable()
    }
}

impl From<geo::Coord> for HashablePt2D {
    fn from(coord: geo::Coord) -> Self {
        HashablePt2D::new(coord.x, coord.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_sign() {
        let o = Pt2D::new(0.0, 0.0);
        assert!(Pt2D::cross(o, Pt2D::new(1.0, 0.0), Pt2D::new(1.0, 1.0)) > 0.0);
        assert!(Pt2D::cross(o, Pt2D::new(1.0, 0.0), Pt2D::new(1.0, -1.0)) < 0.0);
        assert_eq!(Pt2D::cross(o, Pt2D::new(1.0, 0.0), Pt2D::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn hashable_round_trip() {
        let pt = Pt2D::new(3.25, -1.5);
        assert_eq!(pt.to_hashable().to_pt2d(), pt);
        assert_eq!(HashablePt2D::from(pt.to_coord()), pt.to_hashable());
    }
}
