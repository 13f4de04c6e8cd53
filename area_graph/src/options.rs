use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use crate::OddEndpointPolicy;

/// Configures how walkable areas are assembled and how dense their visibility graphs get. The CLI
/// flattens this into its flags; it can also be read from a JSON file, where missing fields take
/// their defaults.
#[derive(Clone, Debug, PartialEq, StructOpt, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaOptions {
    /// Groups whose rings have more vertices than this don't get any interior edges, just their
    /// boundary.
    #[structopt(long, default_value = "500")]
    pub max_area_nodes: usize,
    /// Only produce boundary edges. Useful when the visibility graph is too expensive and routing
    /// along the perimeter is good enough.
    #[structopt(long)]
    pub skip_visibility: bool,
    /// What to do when some fragments of an area's boundary can't pair up: `drop` or `fail`
    #[structopt(long, default_value = "drop")]
    pub odd_endpoints: OddEndpointPolicy,
    /// When a merged ring produces a vertex that isn't exactly one of the input points, how far
    /// away (in meters) can the original point be? Boolean ops round onto a fine grid.
    #[structopt(long, default_value = "0.001")]
    pub snap_tolerance: f64,
    /// Boundary segments and chord pieces shorter than this (in meters) are skipped.
    #[structopt(long, default_value = "0.01")]
    pub min_edge_length: f64,
    // Phrased negatively, because structopt flags can't default to true
    /// Build every group on one thread. Slower, but easier to debug.
    #[structopt(long)]
    pub sequential: bool,
}

impl Default for AreaOptions {
    fn default() -> AreaOptions {
        AreaOptions {
            max_area_nodes: 500,
            skip_visibility: false,
            odd_endpoints: OddEndpointPolicy::DropFragments,
            snap_tolerance: 0.001,
            min_edge_length: 0.01,
            sequential: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_match_defaults() {
        let from_flags = AreaOptions::from_iter(vec!["area_graph"]);
        assert_eq!(from_flags, AreaOptions::default());

        let custom = AreaOptions::from_iter(vec![
            "area_graph",
            "--max-area-nodes",
            "20",
            "--odd-endpoints",
            "fail",
            "--skip-visibility",
        ]);
        assert_eq!(custom.max_area_nodes, 20);
        assert_eq!(custom.odd_endpoints, OddEndpointPolicy::Fail);
        assert!(custom.skip_visibility);
    }

    #[test]
    fn partial_json() {
        let opts: AreaOptions = serde_json::from_str(r#"{"max_area_nodes": 7}"#).unwrap();
        assert_eq!(opts.max_area_nodes, 7);
        assert_eq!(opts.snap_tolerance, 0.001);
        assert!(!opts.sequential);
    }
}
