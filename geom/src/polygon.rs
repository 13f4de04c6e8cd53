use geo::{BooleanOps, Relate};

/// Union all of the polygons into one geo::MultiPolygon
pub fn union_all_into_multipolygon(mut list: Vec<geo::Polygon>) -> geo::MultiPolygon {
    let first = match list.pop() {
        Some(p) => p,
        None => {
            return geo::MultiPolygon(Vec::new());
        }
    };

    let mut result = geo::MultiPolygon(vec![first]);
    for p in list {
        result = result.union(&geo::MultiPolygon(vec![p]));
    }
    result
}

/// True if the boundaries of the two polygons overlap along some line, not just at isolated
/// points.
pub fn boundaries_share_line(a: &geo::Polygon, b: &geo::Polygon) -> bool {
    // Boundary/boundary cell of the DE-9IM matrix is one-dimensional
    a.relate(b).matches("****1****").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use geo::Area;

    use super::*;
    use crate::{Pt2D, Ring};

    fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> geo::Polygon {
        Ring::must_new(vec![
            Pt2D::new(x1, y1),
            Pt2D::new(x2, y1),
            Pt2D::new(x2, y2),
            Pt2D::new(x1, y2),
            Pt2D::new(x1, y1),
        ])
        .to_polygon()
    }

    #[test]
    fn union_adjacent_squares() {
        let result = union_all_into_multipolygon(vec![
            rect(0.0, 0.0, 10.0, 10.0),
            rect(10.0, 0.0, 20.0, 10.0),
        ]);
        assert_eq!(result.0.len(), 1);
        assert!((result.unsigned_area() - 200.0).abs() < 1e-6);
        assert!(union_all_into_multipolygon(Vec::new()).0.is_empty());
    }

    #[test]
    fn shared_edges_vs_corners() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert!(boundaries_share_line(&a, &rect(10.0, 0.0, 20.0, 10.0)));
        assert!(!boundaries_share_line(&a, &rect(10.0, 10.0, 20.0, 20.0)));
        assert!(!boundaries_share_line(&a, &rect(30.0, 0.0, 40.0, 10.0)));
    }
}
