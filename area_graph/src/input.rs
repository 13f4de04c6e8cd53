//! Everything consumed from the upstream ingestion phase. Read-only once built.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use abstutil::{
    deserialize_btreemap, deserialize_multimap, serialize_btreemap, serialize_multimap, MultiMap,
    Tags,
};
use geom::Pt2D;

use crate::osm::{NodeID, OsmID, WayID};
use crate::Level;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub pt: Pt2D,
    #[serde(default)]
    pub tags: Tags,
}

/// The one shared table of points. Everything else refers to points by ID.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointTable {
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    nodes: BTreeMap<NodeID, RawNode>,
}

impl PointTable {
    pub fn new() -> PointTable {
        PointTable::default()
    }

    pub fn insert(&mut self, id: NodeID, pt: Pt2D, tags: Tags) {
        self.nodes.insert(id, RawNode { pt, tags });
    }

    pub fn get(&self, id: NodeID) -> Option<&RawNode> {
        self.nodes.get(&id)
    }

    pub fn pt(&self, id: NodeID) -> Option<Pt2D> {
        self.nodes.get(&id).map(|n| n.pt)
    }

    pub fn contains(&self, id: NodeID) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns the first node that's missing, if any.
    pub fn resolve(&self, ids: &[NodeID]) -> Result<Vec<Pt2D>, NodeID> {
        ids.iter().map(|id| self.pt(*id).ok_or(*id)).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One fragment of an area boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawWay {
    pub id: WayID,
    pub nodes: Vec<NodeID>,
}

/// A tagged entity describing an area: a closed way, or a multipolygon relation with outer and
/// inner member ways.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawArea {
    pub id: OsmID,
    #[serde(default)]
    pub tags: Tags,
    pub outer: Vec<RawWay>,
    #[serde(default)]
    pub inner: Vec<RawWay>,
    /// If the upstream phase already knows the level (from a level_map relation, for example).
    /// Otherwise it comes from the tags.
    #[serde(default)]
    pub level: Option<Level>,
}

impl RawArea {
    /// An area described by one closed way
    pub fn single_way(id: WayID, tags: Tags, nodes: Vec<NodeID>) -> RawArea {
        RawArea {
            id: OsmID::Way(id),
            tags,
            outer: vec![RawWay { id, nodes }],
            inner: Vec::new(),
            level: None,
        }
    }

    pub fn level(&self) -> Option<Level> {
        self.level.or_else(|| Level::from_tags(&self.tags))
    }

    pub fn member_ways(&self) -> BTreeSet<WayID> {
        self.outer
            .iter()
            .chain(self.inner.iter())
            .map(|w| w.id)
            .collect()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = NodeID> + '_ {
        self.outer
            .iter()
            .chain(self.inner.iter())
            .flat_map(|w| w.nodes.iter().cloned())
    }

    /// The first referenced node missing from the table, if any.
    pub fn find_missing_node(&self, points: &PointTable) -> Option<NodeID> {
        self.all_nodes().find(|n| !points.contains(*n))
    }
}

/// A snapshot of everything needed to build walkable areas.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AreaInput {
    pub nodes: PointTable,
    pub areas: Vec<RawArea>,
    /// Nodes belonging to any routable street way
    #[serde(default)]
    pub street_nodes: BTreeSet<NodeID>,
    /// Transit stops known to lie in or on an area
    #[serde(
        default,
        serialize_with = "serialize_multimap",
        deserialize_with = "deserialize_multimap"
    )]
    pub stops: MultiMap<OsmID, NodeID>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let mut input = AreaInput::default();
        input
            .nodes
            .insert(NodeID(1), Pt2D::new(0.0, 0.0), Tags::empty());
        input
            .nodes
            .insert(NodeID(2), Pt2D::new(5.0, 0.0), Tags::empty());
        input.areas.push(RawArea::single_way(
            WayID(10),
            vec![("highway", "pedestrian"), ("level", "1")]
                .into_iter()
                .collect(),
            vec![NodeID(1), NodeID(2), NodeID(1)],
        ));
        input.stops.insert(OsmID::Way(WayID(10)), NodeID(2));

        let json = serde_json::to_string(&input).unwrap();
        let back: AreaInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes.pt(NodeID(2)), Some(Pt2D::new(5.0, 0.0)));
        assert_eq!(back.areas[0].level(), Level::new(1.0));
        assert_eq!(back.stops.get(OsmID::Way(WayID(10))).len(), 1);
    }

    #[test]
    fn missing_nodes() {
        let mut points = PointTable::new();
        points.insert(NodeID(1), Pt2D::new(0.0, 0.0), Tags::empty());
        let area = RawArea::single_way(
            WayID(1),
            Tags::empty(),
            vec![NodeID(1), NodeID(2), NodeID(1)],
        );
        assert_eq!(area.find_missing_node(&points), Some(NodeID(2)));
        assert_eq!(points.resolve(&[NodeID(1), NodeID(3)]), Err(NodeID(3)));
    }
}
