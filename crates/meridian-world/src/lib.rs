//! Meridian World - Spatial queries and spawning
//!
//! Ray casts, camera-center projection and ground probes over the host
//! world, plus the coordinator that streams a model in before creating an
//! entity from it.

mod config;
mod query;
mod spawn;

pub use config::QueryConfig;
pub use query::{camera_forward, RaycastResult, SpatialQuery};
pub use spawn::{SpawnCoordinator, SpawnError, SpawnOptions, Spawnable};
