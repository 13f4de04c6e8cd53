use std::collections::HashMap;

use rstar::primitives::GeomWithData;
use rstar::RTree;

use geom::{HashablePt2D, Pt2D};

use crate::osm::NodeID;
use crate::ring::AreaRing;

/// Maps coordinates produced by geometric operations back to the input points they came from.
/// Built from the source rings before any union happens; afterwards, vertices are only ever
/// input points, possibly nudged a bit by the boolean op's rounding.
pub struct CoordinateLookup {
    exact: HashMap<HashablePt2D, NodeID>,
    tree: RTree<GeomWithData<[f64; 2], NodeID>>,
    tolerance: f64,
}

impl CoordinateLookup {
    pub fn new<'a>(rings: impl Iterator<Item = &'a AreaRing>, tolerance: f64) -> CoordinateLookup {
        let mut exact = HashMap::new();
        for ring in rings {
            for (idx, node) in ring.distinct_nodes().iter().enumerate() {
                exact.insert(ring.pt(idx).to_hashable(), *node);
            }
        }
        let tree = RTree::bulk_load(
            exact
                .iter()
                .map(|(pt, node)| GeomWithData::new([pt.x(), pt.y()], *node))
                .collect(),
        );
        CoordinateLookup {
            exact,
            tree,
            tolerance,
        }
    }

    /// An exact match wins. Otherwise the nearest source point, if it's within the tolerance.
    pub fn lookup(&self, pt: Pt2D) -> Option<NodeID> {
        if let Some(node) = self.exact.get(&pt.to_hashable()) {
            return Some(*node);
        }
        let nearest = self.tree.nearest_neighbor(&[pt.x(), pt.y()])?;
        let [x, y] = *nearest.geom();
        if Pt2D::new(x, y).raw_dist_to(pt) <= self.tolerance {
            Some(nearest.data)
        } else {
            None
        }
    }

    /// Maps every vertex of a closed linestring to a node. Consecutive vertices that snap to the
    /// same node collapse into one, and the result is closed. Fails with the first vertex that
    /// doesn't match anything.
    pub fn trace(&self, ls: &geo::LineString) -> Result<Vec<NodeID>, Pt2D> {
        let mut nodes: Vec<NodeID> = Vec::new();
        for coord in ls.coords() {
            let pt: Pt2D = (*coord).into();
            let node = self.lookup(pt).ok_or(pt)?;
            if nodes.last() != Some(&node) {
                nodes.push(node);
            }
        }
        if !nodes.is_empty() && nodes[0] != nodes[nodes.len() - 1] {
            nodes.push(nodes[0]);
        }
        Ok(nodes)
    }
}
