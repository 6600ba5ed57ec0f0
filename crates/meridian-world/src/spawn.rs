use std::future::Future;
use std::rc::Rc;

use meridian_core::{AssetClass, AssetId, AssetKey, EntityKind, Vector3};
use meridian_entity::kind::{Object, Ped, Vehicle};
use meridian_entity::{Capability, EntityHandle};
use meridian_host::{SpawnParams, WorldHost};
use meridian_streaming::{AsyncResourceLoader, StreamingError};
use tracing::{info, warn};

/// Errors that can occur while spawning an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("{asset} is not a {expected} model")]
    InvalidModelKind {
        asset: AssetId,
        expected: EntityKind,
        actual: Option<EntityKind>,
    },

    #[error(transparent)]
    Streaming(#[from] StreamingError),

    #[error("host refused to create a {kind} from {asset}")]
    Rejected { asset: AssetId, kind: EntityKind },
}

/// Capabilities the host can create from a model.
pub trait Spawnable: Capability {}

impl Spawnable for Ped {}
impl Spawnable for Vehicle {}
impl Spawnable for Object {}

/// Creation flags beyond position and heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnOptions {
    pub mission_entity: bool,
    /// Ped type (0-29), peds only
    pub ped_type: i32,
    /// Dynamic physics, objects only
    pub dynamic: bool,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            mission_entity: false,
            ped_type: 4,
            dynamic: false,
        }
    }
}

/// Streams a model in, creates an entity from it, and lets the model go.
pub struct SpawnCoordinator {
    host: Rc<dyn WorldHost>,
    loader: Rc<AsyncResourceLoader>,
}

impl SpawnCoordinator {
    pub fn new(host: Rc<dyn WorldHost>, loader: Rc<AsyncResourceLoader>) -> Self {
        Self { host, loader }
    }

    /// Spawn a `K` from `model` at exactly `position`.
    ///
    /// The model is checked against the catalog when this is called, so an
    /// unknown or wrong-category model never causes a load request. The
    /// returned future drives the load and creation.
    pub fn create<K: Spawnable>(
        &self,
        model: impl Into<AssetKey>,
        position: Vector3,
        heading: f64,
        networked: bool,
    ) -> impl Future<Output = Result<EntityHandle<K>, SpawnError>> + 'static {
        self.create_with(model, position, heading, networked, SpawnOptions::default())
    }

    pub fn create_with<K: Spawnable>(
        &self,
        model: impl Into<AssetKey>,
        position: Vector3,
        heading: f64,
        networked: bool,
        options: SpawnOptions,
    ) -> impl Future<Output = Result<EntityHandle<K>, SpawnError>> + 'static {
        let asset = self.loader.resolve(AssetClass::Model, &model.into());
        let acquire = self.validate::<K>(asset).and_then(|()| {
            let options = self.loader.config().options_for(AssetClass::Model);
            self.loader.acquire_id(asset, options).map_err(SpawnError::from)
        });
        let params = SpawnParams {
            model: asset.hash,
            position,
            heading,
            networked,
            mission_entity: options.mission_entity,
            ped_type: options.ped_type,
            dynamic: options.dynamic,
        };
        let host = Rc::clone(&self.host);
        let loader = Rc::clone(&self.loader);

        async move {
            acquire?.await?;
            let raw = host.create_entity(K::KIND, &params);
            loader.release(asset);
            if raw.is_none() {
                warn!("host refused to create {} from {asset}", K::KIND);
                return Err(SpawnError::Rejected { asset, kind: K::KIND });
            }
            info!("spawned {} {raw} at {}", K::KIND, params.position);
            Ok(EntityHandle::from_raw(raw))
        }
    }

    fn validate<K: Spawnable>(&self, asset: AssetId) -> Result<(), SpawnError> {
        if !self.host.contains(asset) {
            return Err(StreamingError::InvalidAsset { asset }.into());
        }
        let actual = self.host.model_kind(asset.hash);
        if actual != Some(K::KIND) {
            return Err(SpawnError::InvalidModelKind {
                asset,
                expected: K::KIND,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::joaat;
    use meridian_entity::HandleRegistry;
    use meridian_host::SimulatedWorld;
    use meridian_streaming::{LoaderConfig, Scheduler, TaskHandle};

    fn setup(world: SimulatedWorld) -> (Rc<SimulatedWorld>, SpawnCoordinator) {
        let world = Rc::new(world);
        let loader = Rc::new(AsyncResourceLoader::new(world.clone()));
        let spawner = SpawnCoordinator::new(world.clone(), loader);
        (world, spawner)
    }

    fn run<T>(world: &SimulatedWorld, handle: &TaskHandle<T>, scheduler: &mut Scheduler) {
        while !handle.is_finished() && world.now() < 60_000 {
            scheduler.tick();
            world.advance(10);
        }
    }

    #[test]
    fn creates_vehicle_at_exact_position() {
        let world = SimulatedWorld::new().with_model("testcar", EntityKind::Vehicle, 30);
        let (world, spawner) = setup(world);
        let mut scheduler = Scheduler::new();
        let handle =
            scheduler.spawn(spawner.create::<Vehicle>("testcar", Vector3::ZERO, 0.0, true));
        run(&world, &handle, &mut scheduler);

        let vehicle = handle.try_take().unwrap().unwrap();
        let registry = HandleRegistry::new(world.clone());
        assert!(registry.exists(vehicle));
        assert_eq!(registry.position(vehicle), Some(Vector3::ZERO));
        let entity = world.entity(vehicle.raw()).unwrap();
        assert_eq!(entity.heading, 0.0);
        assert!(entity.network_id.is_some());
    }

    #[test]
    fn concurrent_spawns_of_one_model_both_complete() {
        let world = SimulatedWorld::new().with_model("testcar", EntityKind::Vehicle, 30);
        let (world, spawner) = setup(world);
        let mut scheduler = Scheduler::new();
        let first =
            scheduler.spawn(spawner.create::<Vehicle>("testcar", Vector3::ZERO, 0.0, true));
        let second = scheduler.spawn(spawner.create::<Vehicle>(
            "testcar",
            Vector3::new(5.0, 0.0, 0.0),
            0.0,
            true,
        ));
        run(&world, &first, &mut scheduler);
        run(&world, &second, &mut scheduler);

        let first = first.try_take().unwrap().unwrap();
        let second = second.try_take().unwrap().unwrap();
        assert_ne!(first, second);
        let registry = HandleRegistry::new(world.clone());
        assert_eq!(registry.position(first), Some(Vector3::ZERO));
        assert_eq!(registry.position(second), Some(Vector3::new(5.0, 0.0, 0.0)));

        let asset = AssetId::model(joaat("testcar"));
        assert_eq!(world.release_hints(asset), 2);
        assert_eq!(world.load_requests(asset), 2);
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn refused_creation_still_releases_the_model() {
        let world = SimulatedWorld::new().with_model("testcar", EntityKind::Vehicle, 30);
        let (world, spawner) = setup(world);
        world.set_refuse_creation(true);
        let mut scheduler = Scheduler::new();
        let handle =
            scheduler.spawn(spawner.create::<Vehicle>("testcar", Vector3::ZERO, 0.0, true));
        run(&world, &handle, &mut scheduler);

        let asset = AssetId::model(joaat("testcar"));
        assert_eq!(
            handle.try_take(),
            Some(Err(SpawnError::Rejected {
                asset,
                kind: EntityKind::Vehicle,
            }))
        );
        assert_eq!(world.release_hints(asset), 1);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn model_is_released_exactly_once() {
        let world = SimulatedWorld::new().with_model("a_m_y_skater_01", EntityKind::Ped, 20);
        let (world, spawner) = setup(world);
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(spawner.create::<Ped>(
            "a_m_y_skater_01",
            Vector3::new(1.0, 2.0, 3.0),
            0.0,
            true,
        ));
        run(&world, &handle, &mut scheduler);

        let ped = handle.try_take().unwrap().unwrap();
        let asset = AssetId::model(joaat("a_m_y_skater_01"));
        assert_eq!(world.release_hints(asset), 1);
        assert_eq!(world.load_requests(asset), 1);
        assert!(world.entity(ped.raw()).and_then(|e| e.network_id).is_some());
    }

    #[test]
    fn wrong_category_fails_before_any_request() {
        let world = SimulatedWorld::new().with_model("a_m_y_skater_01", EntityKind::Ped, 20);
        let (world, spawner) = setup(world);
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(spawner.create::<Vehicle>(
            "a_m_y_skater_01",
            Vector3::ZERO,
            0.0,
            false,
        ));
        scheduler.tick();

        let asset = AssetId::model(joaat("a_m_y_skater_01"));
        assert_eq!(
            handle.try_take(),
            Some(Err(SpawnError::InvalidModelKind {
                asset,
                expected: EntityKind::Vehicle,
                actual: Some(EntityKind::Ped),
            }))
        );
        assert_eq!(world.load_requests(asset), 0);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn unknown_model_is_invalid_asset() {
        let (world, spawner) = setup(SimulatedWorld::new());
        let mut scheduler = Scheduler::new();
        let handle =
            scheduler.spawn(spawner.create::<Object>("prop_nothing", Vector3::ZERO, 0.0, false));
        scheduler.tick();

        let asset = AssetId::model(joaat("prop_nothing"));
        assert_eq!(
            handle.try_take(),
            Some(Err(SpawnError::Streaming(StreamingError::InvalidAsset { asset })))
        );
        assert_eq!(world.loaded_checks(), 0);
    }

    #[test]
    fn load_timeout_propagates_unchanged() {
        let world =
            Rc::new(SimulatedWorld::new().with_stuck_model("prop_stuck", EntityKind::Object));
        let config = LoaderConfig {
            timeout_budget_ms: 100,
            ..Default::default()
        };
        let loader = Rc::new(AsyncResourceLoader::with_config(world.clone(), config));
        let spawner = SpawnCoordinator::new(world.clone(), loader);

        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(spawner.create_with::<Object>(
            "prop_stuck",
            Vector3::ZERO,
            0.0,
            false,
            SpawnOptions {
                dynamic: true,
                ..Default::default()
            },
        ));
        run(&world, &handle, &mut scheduler);

        let asset = AssetId::model(joaat("prop_stuck"));
        assert_eq!(
            handle.try_take(),
            Some(Err(SpawnError::Streaming(StreamingError::Timeout {
                asset,
                budget_ms: 100,
            })))
        );
        assert_eq!(world.release_hints(asset), 0);
        assert_eq!(world.entity_count(), 0);
    }
}
