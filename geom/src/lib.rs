//! Planar geometry used while assembling walkable areas. Coordinates are in meters, projected onto
//! a plane. The heavy lifting (boolean ops, relate, validity) is delegated to the `geo` crate; the
//! types here add the invariants the rest of the workspace relies on.

#[macro_use]
extern crate anyhow;

mod distance;
mod line;
mod polygon;
mod pt;
mod ring;

pub use crate::distance::Distance;
pub use crate::line::Line;
pub use crate::polygon::{boundaries_share_line, union_all_into_multipolygon};
pub use crate::pt::{HashablePt2D, Pt2D};
pub use crate::ring::Ring;

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Any two points closer than this are considered the same.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.0001);
