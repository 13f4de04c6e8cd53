use std::collections::HashSet;
use std::fmt;

use anyhow::Result;
use geo::Validation;
use serde::{Deserialize, Serialize};

use crate::{Line, Pt2D};

/// Maybe a misnomer, but like a PolyLine, but closed. Always a simple polygon boundary: no
/// repeated points and no self-intersections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    // first equals last
    pts: Vec<Pt2D>,
}

impl Ring {
    pub fn new(pts: Vec<Pt2D>) -> Result<Ring> {
        if pts.len() < 4 {
            bail!("Can't make a ring with < 4 points");
        }
        if pts[0] != pts[pts.len() - 1] {
            bail!("Can't make a ring with mismatching first/last points");
        }

        if let Some(pair) = pts.windows(2).find(|pair| pair[0] == pair[1]) {
            bail!("Ring has duplicate adjacent points near {}", pair[0]);
        }

        let result = Ring { pts };

        let mut seen_pts = HashSet::new();
        for pt in result.pts.iter().skip(1) {
            if !seen_pts.insert(pt.to_hashable()) {
                bail!("Ring has repeat point {}", pt);
            }
        }

        if !result.to_polygon().is_valid() {
            bail!("Ring starting at {} intersects itself", result.pts[0]);
        }

        Ok(result)
    }

    pub fn must_new(pts: Vec<Pt2D>) -> Ring {
        Ring::new(pts).unwrap()
    }

    /// Includes the repeated first/last point.
    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.pts
            .windows(2)
            .filter_map(|pair| Line::new(pair[0], pair[1]).ok())
    }

    /// Shoelace formula. Positive if the points go counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        let mut sum = 0.0;
        for pair in self.pts.windows(2) {
            sum += pair[0].x() * pair[1].y() - pair[1].x() * pair[0].y();
        }
        sum / 2.0
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn to_linestring(&self) -> geo::LineString {
        geo::LineString::new(self.pts.iter().map(|pt| pt.to_coord()).collect())
    }

    /// A polygon with no holes
    pub fn to_polygon(&self) -> geo::Polygon {
        geo::Polygon::new(self.to_linestring(), Vec::new())
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Ring::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}

impl From<Ring> for geo::LineString {
    fn from(ring: Ring) -> Self {
        ring.to_linestring()
    }
}

impl TryFrom<&geo::LineString> for Ring {
    type Error = anyhow::Error;

    fn try_from(ls: &geo::LineString) -> Result<Self> {
        Ring::new(ls.coords().map(|c| Pt2D::from(*c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Pt2D> {
        vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 0.0),
            Pt2D::new(10.0, 10.0),
            Pt2D::new(0.0, 10.0),
            Pt2D::new(0.0, 0.0),
        ]
    }

    #[test]
    fn orientation() {
        let ring = Ring::must_new(square());
        assert!(ring.is_counter_clockwise());
        assert_eq!(ring.signed_area(), 100.0);

        let mut pts = square();
        pts.reverse();
        let ring = Ring::must_new(pts);
        assert_eq!(ring.signed_area(), -100.0);
    }

    #[test]
    fn rejects_malformed() {
        assert!(Ring::new(square()[0..3].to_vec()).is_err());

        let mut open = square();
        open.pop();
        open.push(Pt2D::new(1.0, 1.0));
        assert!(Ring::new(open).is_err());

        // A bowtie crosses itself
        assert!(Ring::new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 10.0),
            Pt2D::new(10.0, 0.0),
            Pt2D::new(0.0, 10.0),
            Pt2D::new(0.0, 0.0),
        ])
        .is_err());

        let mut repeat = square();
        repeat.insert(2, Pt2D::new(0.0, 0.0));
        assert!(Ring::new(repeat).is_err());
    }
}
