use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use geom::{Pt2D, Ring};

use crate::osm::NodeID;
use crate::{AreaError, PointTable};

/// A closed, simple cycle of nodes, with its geometry. Holes are indices into the `RingArena`
/// owning this ring.
#[derive(Clone, Debug, Serialize)]
pub struct AreaRing {
    /// The first node equals the last.
    pub nodes: Vec<NodeID>,
    pub geometry: Ring,
    pub holes: Vec<usize>,
    #[serde(skip)]
    shell: OnceLock<geo::Polygon>,
}

impl AreaRing {
    /// Looks up every node's position.
    pub fn new(nodes: Vec<NodeID>, points: &PointTable) -> Result<AreaRing, AreaError> {
        let pts = points.resolve(&nodes).map_err(AreaError::MissingPoint)?;
        AreaRing::with_points(nodes, pts)
    }

    /// The caller already knows where the nodes are.
    pub fn with_points(nodes: Vec<NodeID>, pts: Vec<Pt2D>) -> Result<AreaRing, AreaError> {
        if nodes.len() < 4 {
            return Err(AreaError::InvalidRing(format!(
                "only {} distinct nodes",
                nodes.len().saturating_sub(1)
            )));
        }
        let geometry = Ring::new(pts).map_err(|err| AreaError::InvalidRing(err.to_string()))?;
        Ok(AreaRing {
            nodes,
            geometry,
            holes: Vec::new(),
            shell: OnceLock::new(),
        })
    }

    /// The polygon bounded by just this ring, ignoring holes.
    pub fn shell(&self) -> &geo::Polygon {
        self.shell.get_or_init(|| self.geometry.to_polygon())
    }

    pub fn num_vertices(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Every node once.
    pub fn distinct_nodes(&self) -> &[NodeID] {
        &self.nodes[..self.nodes.len() - 1]
    }

    pub fn pt(&self, idx: usize) -> Pt2D {
        self.geometry.points()[idx]
    }

    /// Consecutive pairs of nodes around the ring, with their positions.
    pub fn segments(&self) -> impl Iterator<Item = ((NodeID, Pt2D), (NodeID, Pt2D))> + '_ {
        (0..self.num_vertices()).map(move |i| {
            (
                (self.nodes[i], self.pt(i)),
                (self.nodes[i + 1], self.pt(i + 1)),
            )
        })
    }

    /// Is the interior angle at this vertex less than 180 degrees, measured on the walkable side?
    /// For outer rings that's inside the ring. Holes are walkable outside, so the test flips.
    pub fn is_node_convex(&self, idx: usize, is_hole: bool) -> bool {
        let n = self.num_vertices();
        let prev = self.pt((idx + n - 1) % n);
        let cur = self.pt(idx % n);
        let next = self.pt((idx + 1) % n);

        let turn = Pt2D::cross(prev, cur, next);
        // Relative to the segment lengths, so nearly collinear points count as straight
        let threshold = 1e-9 * prev.raw_dist_to(cur) * cur.raw_dist_to(next);
        let orientation = if self.geometry.is_counter_clockwise() {
            1.0
        } else {
            -1.0
        };
        let walkable_side = if is_hole { -orientation } else { orientation };
        turn * walkable_side > threshold
    }
}

/// Owns all rings for one area or group. Outer rings point to their holes by index, so there are
/// no ownership cycles.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RingArena {
    rings: Vec<AreaRing>,
    #[serde(skip)]
    polygons: Vec<OnceLock<geo::Polygon>>,
}

impl RingArena {
    pub fn new() -> RingArena {
        RingArena::default()
    }

    pub fn push(&mut self, ring: AreaRing) -> usize {
        self.rings.push(ring);
        self.polygons.push(OnceLock::new());
        self.rings.len() - 1
    }

    pub fn add_hole(&mut self, outer: usize, hole: usize) {
        self.rings[outer].holes.push(hole);
        self.polygons[outer] = OnceLock::new();
    }

    pub fn get(&self, idx: usize) -> &AreaRing {
        &self.rings[idx]
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AreaRing> {
        self.rings.iter()
    }

    /// An outer ring and all of its holes
    pub fn polygon(&self, idx: usize) -> &geo::Polygon {
        self.polygons[idx].get_or_init(|| {
            let outer = &self.rings[idx];
            geo::Polygon::new(
                outer.geometry.to_linestring(),
                outer
                    .holes
                    .iter()
                    .map(|h| self.rings[*h].geometry.to_linestring())
                    .collect(),
            )
        })
    }

    /// An outer ring, followed by its holes
    pub fn with_holes(&self, idx: usize) -> impl Iterator<Item = (&AreaRing, bool)> {
        std::iter::once((&self.rings[idx], false)).chain(
            self.rings[idx]
                .holes
                .iter()
                .map(move |h| (&self.rings[*h], true)),
        )
    }

    pub fn num_vertices(&self) -> usize {
        self.rings.iter().map(|r| r.num_vertices()).sum()
    }
}

/// A ring that touches itself at a node is really several simple loops glued at that node. Split
/// them apart. Spikes that retrace themselves produce degenerate loops, which are discarded.
pub fn split_pinched(nodes: &[NodeID]) -> Vec<Vec<NodeID>> {
    let mut loops = Vec::new();
    let mut stack: Vec<NodeID> = Vec::new();
    let mut position: HashMap<NodeID, usize> = HashMap::new();
    for node in nodes {
        if let Some(idx) = position.get(node).cloned() {
            let mut closed: Vec<NodeID> = stack.drain(idx..).collect();
            for n in &closed {
                position.remove(n);
            }
            closed.push(*node);
            if closed.len() >= 4 {
                loops.push(closed);
            }
        }
        position.insert(*node, stack.len());
        stack.push(*node);
    }
    loops
}
