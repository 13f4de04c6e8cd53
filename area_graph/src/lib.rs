//! Turns OpenStreetMap walkable areas (plazas, platforms, parking lots) into routable edges.
//!
//! Boundary fragments are stitched into rings, rings into validated areas, touching areas on the
//! same level into groups, and each group gets boundary edges plus a pruned visibility graph
//! through its interior.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod area;
mod area_group;
mod classify;
mod edges;
mod input;
mod issues;
mod level;
mod make;
mod options;
pub mod osm;
mod ring;
mod ring_assembler;
mod trace;
mod union_find;
pub mod visibility;

pub use crate::area::{Area, AreaError, AreaID};
pub use crate::area_group::AreaGroup;
pub use crate::classify::{
    AreaClassifier, SafetyFactors, TagClassifier, TraversalMode, WayProperties,
};
pub use crate::edges::{AreaEdge, AreaEdgeKind, AreaEdgeList, AreaVertex, EdgeListID, NamedArea};
pub use crate::input::{AreaInput, PointTable, RawArea, RawNode, RawWay};
pub use crate::issues::{Issue, IssueStore};
pub use crate::level::Level;
pub use crate::make::{build_walkable_areas, AreaGraph};
pub use crate::options::AreaOptions;
pub use crate::ring::{split_pinched, AreaRing, RingArena};
pub use crate::ring_assembler::{
    assemble_rings, AssembledRing, AssembledRings, OddEndpointPolicy, RingAssemblyError,
};
pub use crate::trace::CoordinateLookup;
pub use crate::union_find::UnionFind;
