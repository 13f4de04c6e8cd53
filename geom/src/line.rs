use std::fmt;

use anyhow::Result;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use serde::{Deserialize, Serialize};

use crate::{Distance, Pt2D, EPSILON_DIST};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    /// Creates a line segment between two points, which must not be the same
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Result<Line> {
        if pt1.dist_to(pt2) <= EPSILON_DIST {
            bail!("Line from {} to {} too small", pt1, pt2);
        }
        Ok(Line(pt1, pt2))
    }

    /// Equivalent to `Line::new(pt1, pt2).unwrap()`. Use this to effectively document an assertion
    /// at the call-site.
    pub fn must_new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line::new(pt1, pt2).unwrap()
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn points(&self) -> Vec<Pt2D> {
        vec![self.0, self.1]
    }

    pub fn length(&self) -> Distance {
        self.pt1().dist_to(self.pt2())
    }

    /// Untrimmed length, for summing many tiny pieces.
    pub fn raw_length(&self) -> f64 {
        self.pt1().raw_dist_to(self.pt2())
    }

    pub fn reversed(&self) -> Line {
        Line(self.pt2(), self.pt1())
    }

    /// Linear interpolation; 0 is pt1 and 1 is pt2. Not clamped.
    pub fn percent_along(&self, percent: f64) -> Pt2D {
        Pt2D::new(
            self.pt1().x() + percent * (self.pt2().x() - self.pt1().x()),
            self.pt1().y() + percent * (self.pt2().y() - self.pt1().y()),
        )
    }

    /// Projects the point onto the infinite line, returning the percent along this segment.
    pub fn percent_of(&self, pt: Pt2D) -> f64 {
        let dx = self.pt2().x() - self.pt1().x();
        let dy = self.pt2().y() - self.pt1().y();
        ((pt.x() - self.pt1().x()) * dx + (pt.y() - self.pt1().y()) * dy) / (dx * dx + dy * dy)
    }

    /// Every point where the two segments touch. Overlapping collinear segments produce both
    /// endpoints of the overlap.
    pub fn crossings(&self, other: &Line) -> Vec<Pt2D> {
        match line_intersection(self.to_geo(), other.to_geo()) {
            Some(LineIntersection::SinglePoint { intersection, .. }) => vec![intersection.into()],
            Some(LineIntersection::Collinear { intersection }) => {
                vec![intersection.start.into(), intersection.end.into()]
            }
            None => Vec::new(),
        }
    }

    pub fn to_geo(&self) -> geo::Line {
        geo::Line::new(self.pt1().to_coord(), self.pt2().to_coord())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Line::new(")?;
        writeln!(f, "  Pt2D::new({}, {}),", self.0.x(), self.0.y())?;
        writeln!(f, "  Pt2D::new({}, {}),", self.1.x(), self.1.y())?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_lines_rejected() {
        assert!(Line::new(Pt2D::new(1.0, 1.0), Pt2D::new(1.0, 1.0)).is_err());
        assert!(Line::new(Pt2D::new(1.0, 1.0), Pt2D::new(2.0, 1.0)).is_ok());
    }

    #[test]
    fn crossing_segments() {
        let l1 = Line::must_new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 10.0));
        let l2 = Line::must_new(Pt2D::new(0.0, 10.0), Pt2D::new(10.0, 0.0));
        let hits = l1.crossings(&l2);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].same_as(Pt2D::new(5.0, 5.0)));
        assert!((l1.percent_of(hits[0]) - 0.5).abs() < 1e-9);

        let far = Line::must_new(Pt2D::new(20.0, 0.0), Pt2D::new(30.0, 0.0));
        assert!(l1.crossings(&far).is_empty());
    }

    #[test]
    fn collinear_overlap() {
        let l1 = Line::must_new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let l2 = Line::must_new(Pt2D::new(5.0, 0.0), Pt2D::new(15.0, 0.0));
        let mut params: Vec<f64> = l1
            .crossings(&l2)
            .into_iter()
            .map(|pt| l1.percent_of(pt))
            .collect();
        params.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(params.len(), 2);
        assert!((params[0] - 0.5).abs() < 1e-9);
        assert!((params[1] - 1.0).abs() < 1e-9);
    }
}
