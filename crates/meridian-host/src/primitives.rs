//! Primitives the host world provides
//!
//! Everything here is owned by the host: Meridian never caches what these
//! return. All receivers are `&self`; hosts mutate through interior
//! mutability, the same way native bindings behave.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use meridian_core::{joaat, AssetHash, AssetId, EntityKind, NetworkId, RawHandle, Vector3};

/// Monotonic host game timer
pub trait GameClock {
    /// Milliseconds since the host started
    fn game_timer(&self) -> u64;
}

/// Existence, identity, and lookup probes for world objects
pub trait WorldProbe {
    fn exists(&self, handle: RawHandle) -> bool;

    /// Capability kind of a live handle, `None` if it does not exist.
    fn kind_of(&self, handle: RawHandle) -> Option<EntityKind>;

    fn entity_position(&self, handle: RawHandle) -> Vector3;

    /// Nearest live entity of `kind` within `radius`, or the sentinel.
    fn closest_entity(&self, kind: EntityKind, position: Vector3, radius: f64) -> RawHandle;

    fn network_id_exists(&self, net_id: NetworkId) -> bool;

    /// Local handle for a replication id, or the sentinel.
    fn entity_from_network_id(&self, net_id: NetworkId) -> RawHandle;

    /// Ped sitting in `seat` of `vehicle`, or the sentinel for an empty seat.
    fn ped_in_vehicle_seat(&self, vehicle: RawHandle, seat: i32) -> RawHandle;

    fn delete_entity(&self, handle: RawHandle);
}

/// The host's streamable asset catalog
pub trait AssetCatalog {
    /// Hash an asset name into its catalog key
    fn hash_name(&self, name: &str) -> AssetHash {
        joaat(name)
    }

    /// Whether the catalog knows this asset at all
    fn contains(&self, asset: AssetId) -> bool;

    /// Spawnable category of a model, `None` for unknown models.
    fn model_kind(&self, model: AssetHash) -> Option<EntityKind>;

    fn is_loaded(&self, asset: AssetId) -> bool;

    /// Non-blocking: start streaming the asset in
    fn request_load(&self, asset: AssetId);

    /// Non-blocking: the asset may be evicted once nothing else holds it
    fn release_hint(&self, asset: AssetId);
}

/// Arguments for the host creation primitives
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnParams {
    pub model: AssetHash,
    pub position: Vector3,
    pub heading: f64,
    pub networked: bool,
    pub mission_entity: bool,
    /// Ped type (0-29), peds only
    pub ped_type: i32,
    /// Dynamic physics, objects only
    pub dynamic: bool,
}

/// World object creation
pub trait SpawnPrimitives {
    /// Create an entity of `kind`. Returns the sentinel if the host refuses.
    fn create_entity(&self, kind: EntityKind, params: &SpawnParams) -> RawHandle;
}

/// Transient id of an issued ray, consumed exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationHandle(pub i32);

/// Which categories of geometry a ray collides with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RayMask(pub u32);

impl RayMask {
    pub const NONE: RayMask = RayMask(0);
    pub const WORLD: RayMask = RayMask(1);
    pub const VEHICLES: RayMask = RayMask(2);
    pub const PEDS: RayMask = RayMask(4);
    pub const OBJECTS: RayMask = RayMask(8);
    pub const VEGETATION: RayMask = RayMask(16);
    pub const ALL: RayMask = RayMask(1 | 2 | 4 | 8 | 16);

    pub fn contains(self, other: RayMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// The mask bit that makes a ray collide with entities of `kind`
    pub fn for_kind(kind: EntityKind) -> RayMask {
        match kind {
            EntityKind::Vehicle => RayMask::VEHICLES,
            EntityKind::Ped => RayMask::PEDS,
            EntityKind::Object => RayMask::OBJECTS,
            EntityKind::Camera | EntityKind::Blip | EntityKind::Generic => RayMask::NONE,
        }
    }
}

impl Default for RayMask {
    fn default() -> Self {
        RayMask::ALL
    }
}

impl BitOr for RayMask {
    type Output = RayMask;

    fn bitor(self, rhs: RayMask) -> RayMask {
        RayMask(self.0 | rhs.0)
    }
}

impl fmt::Display for RayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07b}", self.0)
    }
}

/// A ray query as issued to the host
#[derive(Debug, Clone, PartialEq)]
pub struct RayRequest {
    pub from: Vector3,
    pub to: Vector3,
    pub mask: RayMask,
    /// Entity the ray passes through; the sentinel ignores nothing.
    pub ignore: RawHandle,
    /// Ask the host to report the surface material
    pub with_material: bool,
}

/// What the host reports for a resolved ray
#[derive(Debug, Clone, PartialEq)]
pub struct RayResolution {
    pub hit: bool,
    pub end_point: Vector3,
    pub surface_normal: Vector3,
    pub entity: RawHandle,
    pub material: Option<u32>,
}

/// Ray casting and terrain probes
pub trait RayPrimitives {
    fn issue_ray(&self, request: &RayRequest) -> CorrelationHandle;

    /// Consume a correlation handle. `None` if it was never issued or was
    /// already consumed.
    fn resolve_ray(&self, handle: CorrelationHandle) -> Option<RayResolution>;

    /// Height of the ground below `position`, if any
    fn ground_z(&self, position: Vector3) -> Option<f64>;

    fn request_collision_at(&self, position: Vector3);

    /// Water surface height at `position`, if there is water
    fn water_height(&self, position: Vector3) -> Option<f64>;
}

/// Gameplay camera pose
pub trait CameraPrimitives {
    fn camera_position(&self) -> Vector3;

    /// Rotation in degrees: x = pitch, y = roll, z = yaw
    fn camera_rotation(&self) -> Vector3;

    /// Vertical field of view in degrees
    fn camera_fov(&self) -> f64;
}

/// Everything Meridian consumes from the host.
pub trait WorldHost:
    GameClock + WorldProbe + AssetCatalog + SpawnPrimitives + RayPrimitives + CameraPrimitives
{
}

impl<T> WorldHost for T where
    T: GameClock + WorldProbe + AssetCatalog + SpawnPrimitives + RayPrimitives + CameraPrimitives
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_union_and_contains() {
        let mask = RayMask::WORLD | RayMask::PEDS;
        assert!(mask.contains(RayMask::WORLD));
        assert!(mask.contains(RayMask::PEDS));
        assert!(!mask.contains(RayMask::VEHICLES));
        assert!(RayMask::ALL.contains(mask));
        assert_eq!(RayMask::default(), RayMask::ALL);
    }

    #[test]
    fn mask_for_kind() {
        assert_eq!(RayMask::for_kind(EntityKind::Vehicle), RayMask::VEHICLES);
        assert_eq!(RayMask::for_kind(EntityKind::Blip), RayMask::NONE);
    }
}
