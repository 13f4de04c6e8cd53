//! Turning an area's tags into who can move through it, and how pleasant that is.

use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};

use abstutil::Tags;

use crate::osm::{self, OsmID};

/// Who's moving through an area?
#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, EnumSetType)]
pub enum TraversalMode {
    Pedestrian,
    Bicycle,
    Car,
}

/// Multipliers on length. 1.0 is neutral; higher means less pleasant or less safe.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafetyFactors {
    pub forward: f64,
    pub back: f64,
}

impl SafetyFactors {
    pub fn neutral() -> SafetyFactors {
        SafetyFactors::both(1.0)
    }

    pub fn both(factor: f64) -> SafetyFactors {
        SafetyFactors {
            forward: factor,
            back: factor,
        }
    }

    pub fn get(self, back: bool) -> f64 {
        if back {
            self.back
        } else {
            self.forward
        }
    }
}

impl Default for SafetyFactors {
    fn default() -> SafetyFactors {
        SafetyFactors::neutral()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WayProperties {
    pub permission: EnumSet<TraversalMode>,
    pub walk_safety: SafetyFactors,
    pub bicycle_safety: SafetyFactors,
    pub wheelchair_accessible: bool,
}

impl WayProperties {
    pub fn new(permission: EnumSet<TraversalMode>) -> WayProperties {
        WayProperties {
            permission,
            walk_safety: SafetyFactors::neutral(),
            bicycle_safety: SafetyFactors::neutral(),
            wheelchair_accessible: true,
        }
    }
}

/// Decides the properties of each area from its tags. Implementations are shared across threads.
pub trait AreaClassifier: Sync {
    fn classify(&self, id: OsmID, tags: &Tags) -> WayProperties;
}

/// Handles the common cases of pedestrian plazas, platforms, and parking lots. Anything else isn't
/// traversable.
#[derive(Clone, Debug, Default)]
pub struct TagClassifier;

impl AreaClassifier for TagClassifier {
    fn classify(&self, _: OsmID, tags: &Tags) -> WayProperties {
        if tags.is_any("access", vec!["no", "private"]) {
            return WayProperties::new(EnumSet::empty());
        }

        let mut props = if tags.is_any(osm::HIGHWAY, vec!["pedestrian", "footway", "path"])
            || tags.is(osm::HIGHWAY, "platform")
            || tags.is(osm::RAILWAY, "platform")
            || tags.is(osm::PUBLIC_TRANSPORT, "platform")
            || tags.is("place", "square")
        {
            let mut permission = EnumSet::only(TraversalMode::Pedestrian);
            if tags.is_any("bicycle", vec!["yes", "designated"]) {
                permission |= TraversalMode::Bicycle;
            }
            WayProperties::new(permission)
        } else if tags.is(osm::HIGHWAY, "cycleway") {
            WayProperties::new(EnumSet::only(TraversalMode::Bicycle))
        } else if tags.is("amenity", "parking")
            || tags.is_any(osm::HIGHWAY, vec!["service", "living_street"])
        {
            let mut props = WayProperties::new(EnumSet::all());
            // Sharing space with cars
            props.walk_safety = SafetyFactors::both(1.1);
            props.bicycle_safety = SafetyFactors::both(1.2);
            props
        } else {
            WayProperties::new(EnumSet::empty())
        };

        for (key, mode) in [
            ("foot", TraversalMode::Pedestrian),
            ("bicycle", TraversalMode::Bicycle),
            ("motor_vehicle", TraversalMode::Car),
        ] {
            if tags.is(key, "no") {
                props.permission.remove(mode);
            } else if tags.is_any(key, vec!["yes", "designated"]) {
                props.permission.insert(mode);
            }
        }

        if tags.is(osm::WHEELCHAIR, "no") {
            props.wheelchair_accessible = false;
        }
        props
    }
}
