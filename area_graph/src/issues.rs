use std::fmt;

use serde::Serialize;

use abstutil::Counter;
use geom::Pt2D;

use crate::osm::OsmID;

/// Something went wrong with one area or group. None of these stop the batch; each one comes
/// with a fallback, described per variant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Issue {
    /// The boundary fragments don't form closed rings. The area is dropped.
    UnassemblableRings { area: OsmID },
    /// The area or merged group isn't a valid polygon. An area is dropped; a group falls back to
    /// its members.
    InvalidGeometry { area: OsmID, reason: String },
    /// Merging a group produced a vertex that doesn't match any input point. The group falls back
    /// to its members.
    UntraceableUnionVertex { areas: Vec<OsmID>, pt: Pt2D },
    /// Too many vertices for the quadratic visibility step. Only boundary edges are built.
    AreaTooComplicated {
        area: OsmID,
        vertices: usize,
        limit: usize,
    },
    /// No visibility vertices at all, so nothing can route through the ring.
    UnconnectedArea { area: OsmID },
}

impl Issue {
    pub fn kind(&self) -> &'static str {
        match self {
            Issue::UnassemblableRings { .. } => "unassemblable rings",
            Issue::InvalidGeometry { .. } => "invalid geometry",
            Issue::UntraceableUnionVertex { .. } => "untraceable union vertex",
            Issue::AreaTooComplicated { .. } => "area too complicated",
            Issue::UnconnectedArea { .. } => "unconnected area",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Issue::UnassemblableRings { area } => {
                write!(f, "Couldn't assemble rings for {}", area)
            }
            Issue::InvalidGeometry { area, reason } => {
                write!(f, "{} has invalid geometry: {}", area, reason)
            }
            Issue::UntraceableUnionVertex { areas, pt } => {
                write!(
                    f,
                    "Merging {} areas (starting with {}) produced {}, which isn't an input point",
                    areas.len(),
                    areas
                        .first()
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "nothing".to_string()),
                    pt
                )
            }
            Issue::AreaTooComplicated {
                area,
                vertices,
                limit,
            } => write!(
                f,
                "{} has {} vertices, more than the limit of {}; skipping visibility edges",
                area, vertices, limit
            ),
            Issue::UnconnectedArea { area } => {
                write!(f, "{} has no visibility vertices", area)
            }
        }
    }
}

/// Collects issues as they're found. Each one is logged when it's added.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IssueStore {
    issues: Vec<Issue>,
}

impl IssueStore {
    pub fn new() -> IssueStore {
        IssueStore::default()
    }

    pub fn add(&mut self, issue: Issue) {
        warn!("{}", issue);
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &Vec<Issue> {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn counts(&self) -> Counter<&'static str> {
        let mut counts = Counter::new();
        for issue in &self.issues {
            counts.inc(issue.kind());
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm::WayID;

    #[test]
    fn counts_by_kind() {
        let mut store = IssueStore::new();
        store.add(Issue::UnconnectedArea {
            area: OsmID::Way(WayID(1)),
        });
        store.add(Issue::UnconnectedArea {
            area: OsmID::Way(WayID(2)),
        });
        store.add(Issue::AreaTooComplicated {
            area: OsmID::Way(WayID(3)),
            vertices: 600,
            limit: 500,
        });
        let counts = store.counts();
        assert_eq!(counts.get("unconnected area"), 2);
        assert_eq!(counts.get("area too complicated"), 1);
        assert_eq!(store.len(), 3);
        assert!(store.issues()[2].to_string().contains("600"));
    }
}
