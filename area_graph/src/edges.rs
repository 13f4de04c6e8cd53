use std::collections::BTreeSet;
use std::fmt;

use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use geom::{Distance, HashablePt2D, Line, Pt2D};

use crate::osm::{NodeID, OsmID};
use crate::{AreaID, TraversalMode, WayProperties};

/// Where an area edge starts or ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AreaVertex {
    /// An input point, usually on some ring
    Node(NodeID),
    /// Where a chord crosses from one sub-area into another, away from any input point
    Splitter(HashablePt2D),
}

impl AreaVertex {
    pub fn splitter(pt: Pt2D) -> AreaVertex {
        AreaVertex::Splitter(pt.to_hashable())
    }
}

impl fmt::Display for AreaVertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AreaVertex::Node(n) => write!(f, "{}", n.0),
            AreaVertex::Splitter(pt) => write!(f, "({}, {})", pt.x(), pt.y()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeListID(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaEdgeKind {
    /// Along the boundary of some member area
    Boundary,
    /// A straight line through the interior between two visibility vertices, or a piece of one
    Chord,
}

/// One direction of travel through an area.
#[derive(Clone, Debug, Serialize)]
pub struct AreaEdge {
    pub from: AreaVertex,
    pub to: AreaVertex,
    pub geometry: Line,
    pub length: Distance,
    pub kind: AreaEdgeKind,
    /// The reverse of the direction the edge was found in. Safety factors are picked accordingly.
    pub back: bool,
    pub permission: EnumSet<TraversalMode>,
    pub walk_safety: f64,
    pub bicycle_safety: f64,
    pub wheelchair_accessible: bool,
    pub name: String,
    /// The name was made up, because the area has no `name` tag
    pub bogus_name: bool,
    /// The member area classifying this edge
    pub area: AreaID,
    pub osm_id: OsmID,
    pub edge_list: EdgeListID,
}

/// Shared by every edge built for one ring of an area group.
#[derive(Clone, Debug, Serialize)]
pub struct AreaEdgeList {
    /// Index into the groups of the output
    pub group: usize,
    /// Outermost ring of that group
    pub ring: usize,
    /// The ring, with holes
    pub polygon: geo::Polygon,
    pub named_areas: Vec<NamedArea>,
    pub visibility_vertices: BTreeSet<AreaVertex>,
}

/// A member area's classification, and the part of the ring it covers.
#[derive(Clone, Debug, Serialize)]
pub struct NamedArea {
    pub area: AreaID,
    pub osm_id: OsmID,
    pub name: Option<String>,
    pub properties: WayProperties,
    pub original_edges: geo::MultiPolygon,
}
