use meridian_entity::DEFAULT_SEARCH_RADIUS;
use meridian_host::RayMask;
use serde::{Deserialize, Serialize};

/// Spatial query configuration. Maps to the `[query]` table of the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Collision categories used when a caller does not pass a mask
    pub default_mask: RayMask,
    /// Length of the ray cast by `screen_to_world`
    pub max_distance: f64,
    /// Radius for closest-entity lookups
    pub closest_radius: f64,
    /// How many collision-request/probe rounds `settle_ground_z` makes
    pub ground_settle_attempts: u32,
    /// Game time between those rounds
    pub ground_settle_interval_ms: u64,
    /// Altitude the ground probe starts from
    pub ground_probe_height: f64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_mask: RayMask::ALL,
            max_distance: 1000.0,
            closest_radius: DEFAULT_SEARCH_RADIUS,
            ground_settle_attempts: 10,
            ground_settle_interval_ms: 50,
            ground_probe_height: 1000.0,
        }
    }
}
