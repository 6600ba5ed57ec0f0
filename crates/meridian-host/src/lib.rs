//! Meridian Host - The boundary to the externally simulated world
//!
//! Meridian never owns world state. Everything it knows about entities,
//! assets, rays, and the camera comes through the primitive traits in this
//! crate, bundled together as [`WorldHost`]. [`SimulatedWorld`] is an
//! in-process implementation used by tests and the demo binary.

mod primitives;
mod sim;

pub use primitives::{
    AssetCatalog, CameraPrimitives, CorrelationHandle, GameClock, RayMask, RayPrimitives,
    RayRequest, RayResolution, SpawnParams, SpawnPrimitives, WorldHost, WorldProbe,
};
pub use sim::{SimEntity, SimulatedWorld, ENTITY_RADIUS, TERRAIN_MATERIAL};
