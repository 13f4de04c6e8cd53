use std::collections::BTreeSet;

use geo::{Relate, Validation};
use serde::Serialize;

use abstutil::{MultiMap, Timer};
use geom::union_all_into_multipolygon;

use crate::osm::{NodeID, OsmID};
use crate::ring::{split_pinched, AreaRing, RingArena};
use crate::trace::CoordinateLookup;
use crate::{Area, AreaID, AreaOptions, Issue, IssueStore, Level, PointTable, UnionFind};

/// Areas on the same level that touch, merged into one region. Routing through the group treats
/// it as one space, even if the member areas are tagged differently.
#[derive(Clone, Debug, Serialize)]
pub struct AreaGroup {
    pub areas: Vec<AreaID>,
    pub level: Option<Level>,
    pub rings: RingArena,
    pub outermost: Vec<usize>,
    /// False for groups with one area, and for members of a merge that failed
    pub merged: bool,
}

impl AreaGroup {
    /// Partitions the areas into groups of same-level areas connected through shared nodes. Groups
    /// come out in order of their first member.
    pub fn group_areas(
        areas: &[Area],
        points: &PointTable,
        opts: &AreaOptions,
        issues: &mut IssueStore,
        timer: &mut Timer,
    ) -> Vec<AreaGroup> {
        let mut uf = UnionFind::new();
        let mut areas_per_node: MultiMap<NodeID, usize> = MultiMap::new();
        for (idx, area) in areas.iter().enumerate() {
            uf.find(idx);
            for node in area.all_nodes() {
                areas_per_node.insert(node, idx);
            }
        }
        for sharing in areas_per_node.borrow().values() {
            let sharing: Vec<usize> = sharing.iter().cloned().collect();
            for (i, a) in sharing.iter().enumerate() {
                for b in &sharing[i + 1..] {
                    if areas[*a].level == areas[*b].level {
                        uf.union(*a, *b);
                    }
                }
            }
        }

        let components = uf.components();
        let mut groups = Vec::new();
        timer.start_iter("merge area groups", components.len());
        for component in components {
            timer.next();
            if component.len() == 1 {
                groups.push(AreaGroup::singleton(&areas[component[0]]));
                continue;
            }

            let members: Vec<&Area> = component.iter().map(|idx| &areas[*idx]).collect();
            match AreaGroup::merge(&members, points, opts) {
                Ok(group) => groups.push(group),
                Err(issue) => {
                    issues.add(issue);
                    for area in members {
                        groups.push(AreaGroup::singleton(area));
                    }
                }
            }
        }
        groups
    }

    fn singleton(area: &Area) -> AreaGroup {
        AreaGroup {
            areas: vec![area.id],
            level: area.level,
            rings: area.rings.clone(),
            outermost: area.outermost.clone(),
            merged: false,
        }
    }

    fn merge(
        members: &[&Area],
        points: &PointTable,
        opts: &AreaOptions,
    ) -> Result<AreaGroup, Issue> {
        let osm_ids: Vec<OsmID> = members.iter().map(|a| a.osm_id).collect();
        let invalid = |reason: String| Issue::InvalidGeometry {
            area: osm_ids[0],
            reason,
        };

        // Before the union; afterwards, vertices might be rounded
        let lookup = CoordinateLookup::new(
            members.iter().flat_map(|a| a.rings.iter()),
            opts.snap_tolerance,
        );
        let union = union_all_into_multipolygon(
            members
                .iter()
                .flat_map(|a| a.multipolygon().0.iter().cloned())
                .collect(),
        );

        let mut rings = RingArena::new();
        let mut outermost = Vec::new();
        let mut holes = Vec::new();
        for polygon in &union.0 {
            for (ls, is_hole) in std::iter::once((polygon.exterior(), false))
                .chain(polygon.interiors().iter().map(|ls| (ls, true)))
            {
                let nodes = lookup
                    .trace(ls)
                    .map_err(|pt| Issue::UntraceableUnionVertex {
                        areas: osm_ids.clone(),
                        pt,
                    })?;
                for nodes in split_pinched(&nodes) {
                    let ring =
                        AreaRing::new(nodes, points).map_err(|err| invalid(err.to_string()))?;
                    if is_hole {
                        holes.push(ring);
                    } else {
                        outermost.push(rings.push(ring));
                    }
                }
            }
        }

        for hole in holes {
            let outer = outermost
                .iter()
                .find(|o| rings.get(**o).shell().relate(hole.shell()).is_covers())
                .cloned()
                .ok_or_else(|| invalid("a merged hole isn't inside any ring".to_string()))?;
            let idx = rings.push(hole);
            rings.add_hole(outer, idx);
        }

        let multipolygon = geo::MultiPolygon(
            outermost
                .iter()
                .map(|idx| rings.polygon(*idx).clone())
                .collect(),
        );
        if !multipolygon.is_valid() {
            return Err(invalid("the merged rings aren't valid".to_string()));
        }

        Ok(AreaGroup {
            areas: members.iter().map(|a| a.id).collect(),
            level: members[0].level,
            rings,
            outermost,
            merged: true,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.rings.num_vertices()
    }

    /// Every node on the merged rings, including holes
    pub fn all_nodes(&self) -> BTreeSet<NodeID> {
        self.rings
            .iter()
            .flat_map(|r| r.distinct_nodes().iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use geo::Area as _;

    use super::*;
    use crate::classify::{TraversalMode, WayProperties};
    use crate::osm::WayID;
    use crate::RawArea;
    use abstutil::Tags;
    use geom::Pt2D;

    fn build(
        table: &PointTable,
        polygons: Vec<(Vec<i64>, Option<f64>)>,
    ) -> (Vec<AreaGroup>, IssueStore) {
        let opts = AreaOptions::default();
        let areas: Vec<Area> = polygons
            .into_iter()
            .enumerate()
            .map(|(idx, (nodes, level))| {
                let mut raw = RawArea::single_way(
                    WayID(idx as i64),
                    Tags::empty(),
                    nodes.into_iter().map(NodeID).collect(),
                );
                raw.level = level.and_then(Level::new);
                Area::new(
                    AreaID(idx),
                    &raw,
                    WayProperties::new(TraversalMode::Pedestrian.into()),
                    table,
                    &opts,
                )
                .unwrap()
            })
            .collect();
        let mut issues = IssueStore::new();
        let groups =
            AreaGroup::group_areas(&areas, table, &opts, &mut issues, &mut Timer::throwaway());
        (groups, issues)
    }

    fn table(pts: Vec<(i64, f64, f64)>) -> PointTable {
        let mut table = PointTable::new();
        for (id, x, y) in pts {
            table.insert(NodeID(id), Pt2D::new(x, y), Tags::empty());
        }
        table
    }

    #[test]
    fn shared_edge_merges_into_one_ring() {
        let table = table(vec![
            (1, 0.0, 0.0),
            (2, 10.0, 0.0),
            (3, 10.0, 10.0),
            (4, 0.0, 10.0),
            (5, 20.0, 0.0),
            (6, 20.0, 10.0),
        ]);
        let (groups, issues) = build(
            &table,
            vec![(vec![1, 2, 3, 4, 1], None), (vec![2, 5, 6, 3, 2], None)],
        );
        assert!(issues.is_empty());
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert!(group.merged);
        assert_eq!(group.areas, vec![AreaID(0), AreaID(1)]);
        assert_eq!(group.outermost.len(), 1);
        assert!((group.rings.polygon(group.outermost[0]).unsigned_area() - 200.0).abs() < 1e-6);
        for node in [1, 4, 5, 6] {
            assert!(group.all_nodes().contains(&NodeID(node)));
        }
    }

    #[test]
    fn levels_keep_areas_apart() {
        let table = table(vec![
            (1, 0.0, 0.0),
            (2, 10.0, 0.0),
            (3, 10.0, 10.0),
            (4, 0.0, 10.0),
            (5, 20.0, 0.0),
            (6, 20.0, 10.0),
            (7, 30.0, 0.0),
            (8, 30.0, 10.0),
        ]);
        let (groups, _) = build(
            &table,
            vec![
                (vec![1, 2, 3, 4, 1], Some(1.0)),
                (vec![2, 5, 6, 3, 2], None),
                (vec![5, 7, 8, 6, 5], None),
            ],
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].areas, vec![AreaID(0)]);
        assert!(!groups[0].merged);
        assert_eq!(groups[1].areas, vec![AreaID(1), AreaID(2)]);
    }

    #[test]
    fn untraceable_union_falls_back() {
        // The second area crosses the first's right edge at (10, 5), which isn't an input point
        let table = table(vec![
            (1, 0.0, 0.0),
            (2, 10.0, 0.0),
            (3, 10.0, 10.0),
            (4, 0.0, 10.0),
            (5, 20.0, -1.0),
            (6, 20.0, 5.0),
            (7, 5.0, 5.0),
        ]);
        let (groups, issues) = build(
            &table,
            vec![(vec![1, 2, 3, 4, 1], None), (vec![1, 5, 6, 7, 1], None)],
        );
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| !g.merged && g.areas.len() == 1));
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues.issues()[0],
            Issue::UntraceableUnionVertex { .. }
        ));
    }
}
