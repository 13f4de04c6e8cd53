use std::fmt;

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use abstutil::Tags;

use crate::osm;

/// The vertical level of an area. Areas on different levels never merge, even if they share
/// points. A missing level is its own value; two areas without one are on the same level.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Level(NotNan<f64>);

impl Level {
    pub fn new(value: f64) -> Option<Level> {
        NotNan::new(value).ok().map(Level)
    }

    /// Parses values like `1`, `-0.5`, or `0;1`. Lists use the first entry.
    pub fn parse(value: &str) -> Option<Level> {
        let first = value.split(';').next()?.trim();
        let x = first.parse::<f64>().ok()?;
        if !x.is_finite() {
            return None;
        }
        Level::new(x)
    }

    /// `level` wins over `layer`. Unparseable values count as missing.
    pub fn from_tags(tags: &Tags) -> Option<Level> {
        tags.get(osm::LEVEL)
            .and_then(|v| Level::parse(v))
            .or_else(|| tags.get(osm::LAYER).and_then(|v| Level::parse(v)))
    }

    pub fn value(self) -> f64 {
        self.0.into_inner()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "level {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_levels() {
        assert_eq!(Level::parse("1"), Level::new(1.0));
        assert_eq!(Level::parse("-1"), Level::new(-1.0));
        assert_eq!(Level::parse("0.5;1"), Level::new(0.5));
        assert_eq!(Level::parse("ground"), None);
        assert_eq!(Level::parse("NaN"), None);
    }

    #[test]
    fn level_beats_layer() {
        let mut tags = Tags::empty();
        assert_eq!(Level::from_tags(&tags), None);
        tags.insert("layer", "2");
        assert_eq!(Level::from_tags(&tags), Level::new(2.0));
        tags.insert("level", "-1");
        assert_eq!(Level::from_tags(&tags), Level::new(-1.0));
    }
}
