use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use geo::{Relate, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use abstutil::Tags;
use geom::{boundaries_share_line, union_all_into_multipolygon, Pt2D};

use crate::osm::{self, NodeID, OsmID, WayID};
use crate::ring::{split_pinched, AreaRing, RingArena};
use crate::trace::CoordinateLookup;
use crate::{
    assemble_rings, AreaOptions, Level, PointTable, RawArea, RingAssemblyError, UnionFind,
    WayProperties,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaID(pub usize);

impl fmt::Display for AreaID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Area #{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum AreaError {
    #[error("can't assemble rings: {0}")]
    RingAssembly(#[from] RingAssemblyError),
    #[error("{0} is missing from the point table")]
    MissingPoint(NodeID),
    #[error("invalid ring: {0}")]
    InvalidRing(String),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("{0} doesn't match any input point")]
    UntraceableVertex(Pt2D),
}

/// A validated walkable area: one or more outermost rings, each with its holes.
#[derive(Debug, Serialize)]
pub struct Area {
    pub id: AreaID,
    pub osm_id: OsmID,
    pub tags: Tags,
    pub level: Option<Level>,
    pub properties: WayProperties,
    pub member_ways: BTreeSet<WayID>,
    /// Only outermost rings and the holes assigned to them
    pub rings: RingArena,
    pub outermost: Vec<usize>,
    /// Boundary fragments thrown away because their endpoints couldn't be paired
    pub dropped_fragments: Vec<WayID>,

    #[serde(skip)]
    multipolygon: OnceLock<geo::MultiPolygon>,
}

impl Area {
    pub fn new(
        id: AreaID,
        raw: &RawArea,
        properties: WayProperties,
        points: &PointTable,
        opts: &AreaOptions,
    ) -> Result<Area, AreaError> {
        let mut dropped_fragments = Vec::new();
        let mut outer = Vec::new();
        let mut holes = Vec::new();
        for (ways, rings) in [(&raw.outer, &mut outer), (&raw.inner, &mut holes)] {
            let fragments: Vec<Vec<NodeID>> = ways.iter().map(|w| w.nodes.clone()).collect();
            let assembled = assemble_rings(&fragments, opts.odd_endpoints)?;
            dropped_fragments.extend(assembled.dropped.iter().map(|idx| ways[*idx].id));
            for ring in assembled.rings {
                rings.push(AreaRing::new(ring.nodes, points)?);
            }
        }
        if outer.is_empty() {
            return Err(AreaError::InvalidGeometry("no outer rings".to_string()));
        }

        let holes = merge_touching_holes(holes, points, opts)?;

        let mut rings = RingArena::new();
        let mut outermost = Vec::new();
        for (idx, ring) in outer.iter().enumerate() {
            let nested = outer.iter().enumerate().any(|(other_idx, other)| {
                if other_idx == idx {
                    return false;
                }
                let matrix = other.shell().relate(ring.shell());
                if matrix.is_equal_topo() {
                    // Keep the first of exact duplicates
                    other_idx < idx
                } else {
                    matrix.is_contains()
                }
            });
            if nested {
                debug!("{} has a nested outer ring; dropping it", raw.id);
            } else {
                outermost.push(rings.push(ring.clone()));
            }
        }

        for hole in holes {
            let covered_by = outermost
                .iter()
                .find(|o| rings.get(**o).shell().relate(hole.shell()).is_covers())
                .cloned();
            if let Some(o) = covered_by {
                let hole_idx = rings.push(hole);
                rings.add_hole(o, hole_idx);
            } else {
                debug!("{} has a hole outside of every outer ring; dropping it", raw.id);
            }
        }

        let area = Area {
            id,
            osm_id: raw.id,
            tags: raw.tags.clone(),
            level: raw.level(),
            properties,
            member_ways: raw.member_ways(),
            rings,
            outermost,
            dropped_fragments,
            multipolygon: OnceLock::new(),
        };
        if !area.multipolygon().is_valid() {
            return Err(AreaError::InvalidGeometry(format!(
                "{} rings don't form a valid multipolygon",
                area.rings.len()
            )));
        }
        Ok(area)
    }

    /// Every outermost ring, with holes
    pub fn multipolygon(&self) -> &geo::MultiPolygon {
        self.multipolygon.get_or_init(|| {
            geo::MultiPolygon(
                self.outermost
                    .iter()
                    .map(|idx| self.rings.polygon(*idx).clone())
                    .collect(),
            )
        })
    }

    /// Every node on an outer ring or hole
    pub fn all_nodes(&self) -> BTreeSet<NodeID> {
        self.rings
            .iter()
            .flat_map(|r| r.distinct_nodes().iter().cloned())
            .collect()
    }

    pub fn name(&self) -> Option<&String> {
        self.tags.get(osm::NAME)
    }

    pub fn num_vertices(&self) -> usize {
        self.rings.num_vertices()
    }
}

/// Holes sharing a stretch of boundary would otherwise be treated as separate, leaving a
/// zero-width walkable sliver between them. Union them first.
fn merge_touching_holes(
    holes: Vec<AreaRing>,
    points: &PointTable,
    opts: &AreaOptions,
) -> Result<Vec<AreaRing>, AreaError> {
    if holes.len() < 2 {
        return Ok(holes);
    }

    let mut uf = UnionFind::new();
    for i in 0..holes.len() {
        uf.find(i);
    }
    for i in 0..holes.len() {
        for j in (i + 1)..holes.len() {
            if boundaries_share_line(holes[i].shell(), holes[j].shell()) {
                uf.union(i, j);
            }
        }
    }

    let lookup = CoordinateLookup::new(holes.iter(), opts.snap_tolerance);
    let mut result = Vec::new();
    for component in uf.components() {
        if component.len() == 1 {
            result.push(holes[component[0]].clone());
            continue;
        }
        let merged = union_all_into_multipolygon(
            component
                .iter()
                .map(|idx| holes[*idx].shell().clone())
                .collect(),
        );
        for polygon in merged.0 {
            if !polygon.interiors().is_empty() {
                debug!(
                    "Merged holes enclose {} islands; ignoring them",
                    polygon.interiors().len()
                );
            }
            let nodes = lookup
                .trace(polygon.exterior())
                .map_err(AreaError::UntraceableVertex)?;
            for nodes in split_pinched(&nodes) {
                result.push(AreaRing::new(nodes, points)?);
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use geo::Area as _;

    use super::*;
    use crate::classify::TraversalMode;
    use crate::RawWay;

    fn square(table: &mut PointTable, first_id: i64, x: f64, y: f64, size: f64) -> Vec<NodeID> {
        let corners = [(x, y), (x + size, y), (x + size, y + size), (x, y + size)];
        let mut ids = Vec::new();
        for (i, (px, py)) in corners.into_iter().enumerate() {
            let id = NodeID(first_id + i as i64);
            table.insert(id, Pt2D::new(px, py), Tags::empty());
            ids.push(id);
        }
        ids.push(ids[0]);
        ids
    }

    fn walkable() -> WayProperties {
        WayProperties::new(TraversalMode::Pedestrian.into())
    }

    fn relation(outer: Vec<Vec<NodeID>>, inner: Vec<Vec<NodeID>>) -> RawArea {
        let way = |(idx, nodes): (usize, Vec<NodeID>)| RawWay {
            id: WayID(100 + idx as i64),
            nodes,
        };
        RawArea {
            id: OsmID::Relation(osm::RelationID(1)),
            tags: Tags::empty(),
            outer: outer.into_iter().enumerate().map(way).collect(),
            inner: inner
                .into_iter()
                .enumerate()
                .map(|(idx, nodes)| way((idx + 50, nodes)))
                .collect(),
            level: None,
        }
    }

    #[test]
    fn outer_with_one_hole() {
        let mut table = PointTable::new();
        let outer = square(&mut table, 0, 0.0, 0.0, 10.0);
        let inner = square(&mut table, 10, 4.0, 4.0, 2.0);
        let area = Area::new(
            AreaID(0),
            &relation(vec![outer], vec![inner]),
            walkable(),
            &table,
            &AreaOptions::default(),
        )
        .unwrap();
        assert_eq!(area.outermost.len(), 1);
        assert_eq!(area.rings.get(area.outermost[0]).holes.len(), 1);
        assert!((area.multipolygon().unsigned_area() - 96.0).abs() < 1e-6);
        assert_eq!(area.all_nodes().len(), 8);
    }

    #[test]
    fn touching_holes_merge() {
        let mut table = PointTable::new();
        let outer = square(&mut table, 0, 0.0, 0.0, 20.0);
        // Two 4x4 holes sharing the x=8 edge
        let left = square(&mut table, 10, 4.0, 4.0, 4.0);
        let right = vec![NodeID(11), NodeID(20), NodeID(21), NodeID(12), NodeID(11)];
        table.insert(NodeID(20), Pt2D::new(12.0, 4.0), Tags::empty());
        table.insert(NodeID(21), Pt2D::new(12.0, 8.0), Tags::empty());

        let area = Area::new(
            AreaID(0),
            &relation(vec![outer], vec![left, right]),
            walkable(),
            &table,
            &AreaOptions::default(),
        )
        .unwrap();
        let outer = area.rings.get(area.outermost[0]);
        assert_eq!(outer.holes.len(), 1);
        let hole = area.rings.get(outer.holes[0]);
        assert!((hole.geometry.signed_area().abs() - 32.0).abs() < 1e-6);
        assert!(hole.nodes.contains(&NodeID(20)));
        assert!(hole.nodes.contains(&NodeID(10)));
    }

    #[test]
    fn nested_outer_rings_and_orphan_holes() {
        let mut table = PointTable::new();
        let big = square(&mut table, 0, 0.0, 0.0, 10.0);
        let small = square(&mut table, 10, 2.0, 2.0, 2.0);
        let far_hole = square(&mut table, 20, 50.0, 50.0, 1.0);
        let area = Area::new(
            AreaID(0),
            &relation(vec![small, big], vec![far_hole]),
            walkable(),
            &table,
            &AreaOptions::default(),
        )
        .unwrap();
        assert_eq!(area.outermost.len(), 1);
        assert_eq!(area.rings.len(), 1);
        assert_eq!(area.rings.get(area.outermost[0]).nodes[0], NodeID(0));
    }

    #[test]
    fn member_order_doesnt_matter() {
        let mut table = PointTable::new();
        for (id, x, y) in [
            (1, 0.0, 0.0),
            (2, 10.0, 0.0),
            (10, 5.0, 5.0),
            (20, 5.0, 2.0),
            (30, 5.0, -2.0),
            (40, 5.0, -5.0),
        ] {
            table.insert(NodeID(id), Pt2D::new(x, y), Tags::empty());
        }
        let path = |via: i64| vec![NodeID(1), NodeID(via), NodeID(2)];
        let summarize = |outer: Vec<Vec<NodeID>>| {
            Area::new(
                AreaID(0),
                &relation(outer, vec![]),
                walkable(),
                &table,
                &AreaOptions::default(),
            )
            .map(|area| (area.multipolygon().unsigned_area() * 1000.0).round() as i64)
            .map_err(|err| err.to_string())
        };

        let expected = summarize(vec![path(10), path(20), path(30), path(40)]);
        assert_eq!(summarize(vec![path(10), path(30), path(20), path(40)]), expected);
        assert_eq!(summarize(vec![path(40), path(10), path(30), path(20)]), expected);
    }

    #[test]
    fn failures() {
        let mut table = PointTable::new();
        let outer = square(&mut table, 0, 0.0, 0.0, 10.0);
        let opts = AreaOptions::default();

        let mut missing = outer.clone();
        missing.insert(2, NodeID(99));
        assert!(matches!(
            Area::new(AreaID(0), &relation(vec![missing], vec![]), walkable(), &table, &opts),
            Err(AreaError::MissingPoint(NodeID(99)))
        ));

        // Only half of the boundary
        let half = vec![outer[0], outer[1], outer[2]];
        assert!(matches!(
            Area::new(AreaID(0), &relation(vec![half.clone()], vec![]), walkable(), &table, &opts),
            Err(AreaError::InvalidGeometry(_))
        ));
        let strict = AreaOptions {
            odd_endpoints: crate::OddEndpointPolicy::Fail,
            ..AreaOptions::default()
        };
        assert!(matches!(
            Area::new(AreaID(0), &relation(vec![half], vec![]), walkable(), &table, &strict),
            Err(AreaError::RingAssembly(RingAssemblyError::OddEndpoint(_)))
        ));

        // A bowtie
        let bowtie = vec![outer[0], outer[2], outer[1], outer[3], outer[0]];
        assert!(matches!(
            Area::new(AreaID(0), &relation(vec![bowtie], vec![]), walkable(), &table, &opts),
            Err(AreaError::InvalidRing(_))
        ));
    }
}
