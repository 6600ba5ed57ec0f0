//! Meridian - resource streaming and spatial queries over a host world
//!
//! The binary runs a short scripted session against the in-process
//! simulated host: stream models in, spawn a vehicle and its driver, then
//! project the camera center into the world.

mod settings;

use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use meridian_core::{AssetClass, EntityKind, Vector3};
use meridian_entity::{kind, HandleRegistry};
use meridian_host::{SimulatedWorld, WorldHost};
use meridian_streaming::{AsyncResourceLoader, Scheduler, TaskHandle};
use meridian_world::{SpatialQuery, SpawnCoordinator, SpawnOptions};

use settings::MeridianSettings;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Meridian session...");
    let settings = MeridianSettings::load();
    // Persist merged defaults
    if let Err(e) = settings.save() {
        warn!("Could not save settings: {e:#}");
    }
    let sim = &settings.simulation;

    let world = Rc::new(
        SimulatedWorld::new()
            .with_model("adder", EntityKind::Vehicle, sim.asset_latency_ms)
            .with_model("a_m_y_skater_01", EntityKind::Ped, sim.asset_latency_ms)
            .with_asset(AssetClass::AnimDict, "move_m@drunk@verydrunk", sim.asset_latency_ms),
    );
    world.set_camera(Vector3::new(0.0, -8.0, 6.0), Vector3::new(-30.0, 0.0, 0.0));
    let host: Rc<dyn WorldHost> = world.clone();

    let loader = Rc::new(AsyncResourceLoader::with_config(
        Rc::clone(&host),
        settings.streaming.clone(),
    ));
    let spawner = SpawnCoordinator::new(Rc::clone(&host), Rc::clone(&loader));
    let query = SpatialQuery::with_config(Rc::clone(&host), settings.query.clone());
    let registry = HandleRegistry::new(Rc::clone(&host));

    let mut scheduler = Scheduler::new();

    let anim = scheduler.spawn(
        loader
            .acquire_anim_dict("move_m@drunk@verydrunk")
            .context("anim dict is not in the catalog")?,
    );
    let vehicle = scheduler.spawn(spawner.create::<kind::Vehicle>(
        "adder",
        Vector3::new(0.0, 5.0, 0.5),
        90.0,
        true,
    ));
    let driver = scheduler.spawn(spawner.create_with::<kind::Ped>(
        "a_m_y_skater_01",
        Vector3::new(2.0, 5.0, 0.5),
        0.0,
        true,
        SpawnOptions {
            mission_entity: true,
            ..Default::default()
        },
    ));
    let ground = scheduler.spawn(query.settle_ground_z(Vector3::new(10.0, 10.0, 50.0)));

    run(&mut scheduler, &world, sim.tick_ms, sim.max_ticks);

    if let Some(result) = anim.try_take() {
        let loaded = result.context("anim dict did not stream in")?;
        info!("{} ready after {} ms", loaded.asset, loaded.waited_ms);
    }
    let vehicle = take(&vehicle, "vehicle spawn")?.context("vehicle spawn failed")?;
    let driver = take(&driver, "driver spawn")?.context("driver spawn failed")?;
    let ground_z = take(&ground, "ground probe")?;
    info!("ground settled at z = {ground_z:.2}");

    world.occupy_seat(vehicle.raw(), -1, driver.raw());
    match registry.occupant(vehicle, -1) {
        Some(ped) => info!("{ped} is driving {vehicle}"),
        None => warn!("{vehicle} has no driver"),
    }

    let radius = query.config().closest_radius;
    if let Some(nearest) = registry.closest::<kind::Vehicle>(Vector3::ZERO, radius) {
        let distance = registry
            .distance_between(nearest, driver)
            .context("spawned entities vanished")?;
        info!("nearest vehicle {nearest} is {distance:.2} from the driver");
    }

    let config = query.config();
    let hit = query.screen_to_world(0.5, 0.5, config.default_mask, config.max_distance);
    match hit.entity().and_then(|entity| registry.narrow::<kind::Vehicle, _>(entity)) {
        Some(target) => info!("camera center is on {target} at {}", hit.end_point),
        None if hit.hit => info!("camera center hits the world at {}", hit.end_point),
        None => info!("camera center hits nothing"),
    }

    if let Some(level) = query.water_height(hit.end_point) {
        info!("water surface at z = {level:.2}");
    }

    info!("Session finished after {} ticks at t = {} ms", scheduler.ticks(), world.now());
    Ok(())
}

/// Tick the scheduler, advancing the host clock, until every task is done
fn run(scheduler: &mut Scheduler, world: &SimulatedWorld, tick_ms: u64, max_ticks: u64) {
    while !scheduler.is_idle() && scheduler.ticks() < max_ticks {
        scheduler.tick();
        world.advance(tick_ms);
    }
    if !scheduler.is_idle() {
        warn!("{} task(s) still running after {max_ticks} ticks", scheduler.len());
    }
}

fn take<T>(handle: &TaskHandle<T>, what: &str) -> Result<T> {
    handle
        .try_take()
        .with_context(|| format!("{what} did not finish"))
}
