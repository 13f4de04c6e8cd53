use serde::Serialize;

use abstutil::{prettyprint_usize, Timer};

use crate::edges::{AreaEdge, AreaEdgeList, EdgeListID};
use crate::visibility::{build_group_edges, AreaContext, GroupEdges};
use crate::{
    Area, AreaClassifier, AreaError, AreaGroup, AreaID, AreaInput, AreaOptions, Issue, IssueStore,
};

/// Everything produced for the downstream graph. Areas are indexed by `AreaID`, edge lists by
/// `EdgeListID`.
#[derive(Serialize)]
pub struct AreaGraph {
    pub areas: Vec<Area>,
    pub groups: Vec<AreaGroup>,
    pub edges: Vec<AreaEdge>,
    pub edge_lists: Vec<AreaEdgeList>,
    pub issues: IssueStore,
}

impl AreaGraph {
    pub fn get_a(&self, id: AreaID) -> &Area {
        &self.areas[id.0]
    }

    pub fn get_edge_list(&self, id: EdgeListID) -> &AreaEdgeList {
        &self.edge_lists[id.0]
    }
}

/// Builds every walkable area, groups them, and connects each group with edges. Problems with
/// individual areas or groups are recorded in the result's issues; this always finishes.
pub fn build_walkable_areas(
    input: &AreaInput,
    opts: &AreaOptions,
    classifier: &dyn AreaClassifier,
    timer: &mut Timer,
) -> AreaGraph {
    let mut issues = IssueStore::new();

    let mut areas = Vec::new();
    timer.start_iter("build areas", input.areas.len());
    for raw in &input.areas {
        timer.next();
        let properties = classifier.classify(raw.id, &raw.tags);
        if properties.permission.is_empty() {
            continue;
        }
        if let Some(node) = raw.find_missing_node(&input.nodes) {
            debug!("Skipping {}, because node {} is missing", raw.id, node.0);
            continue;
        }

        match Area::new(AreaID(areas.len()), raw, properties, &input.nodes, opts) {
            Ok(area) => {
                if !area.dropped_fragments.is_empty() {
                    timer.warn(format!(
                        "{} has {} fragments with unpaired endpoints",
                        raw.id,
                        area.dropped_fragments.len()
                    ));
                }
                areas.push(area);
            }
            Err(AreaError::MissingPoint(node)) => {
                debug!("Skipping {}, because node {} is missing", raw.id, node.0);
            }
            Err(AreaError::RingAssembly(err)) => {
                debug!("{}: {}", raw.id, err);
                issues.add(Issue::UnassemblableRings { area: raw.id });
            }
            Err(err) => {
                issues.add(Issue::InvalidGeometry {
                    area: raw.id,
                    reason: err.to_string(),
                });
            }
        }
    }

    timer.start("group areas");
    let groups = AreaGroup::group_areas(&areas, &input.nodes, opts, &mut issues, timer);
    timer.stop("group areas");

    let ctx = AreaContext::new(input, &areas, opts);
    let requests: Vec<(usize, &AreaGroup)> = groups.iter().enumerate().collect();
    let per_group: Vec<GroupEdges> = if opts.sequential {
        timer.start_iter("build area edges", requests.len());
        requests
            .into_iter()
            .map(|(idx, group)| {
                timer.next();
                build_group_edges(idx, group, &ctx)
            })
            .collect()
    } else {
        timer.parallelize("build area edges", requests, |(idx, group)| {
            build_group_edges(idx, group, &ctx)
        })
    };

    // Merge in group order, so the output doesn't depend on threads
    let mut edges = Vec::new();
    let mut edge_lists = Vec::new();
    for result in per_group {
        let offset = edge_lists.len();
        for mut edge in result.edges {
            edge.edge_list = EdgeListID(edge.edge_list.0 + offset);
            edges.push(edge);
        }
        edge_lists.extend(result.edge_lists);
        for issue in result.issues {
            issues.add(issue);
        }
    }

    timer.note(format!(
        "{} areas in {} groups have {} edges, with {} issues",
        prettyprint_usize(areas.len()),
        prettyprint_usize(groups.len()),
        prettyprint_usize(edges.len()),
        prettyprint_usize(issues.len())
    ));

    AreaGraph {
        areas,
        groups,
        edges,
        edge_lists,
        issues,
    }
}
