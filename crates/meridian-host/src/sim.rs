//! In-process simulated host world
//!
//! `SimulatedWorld` implements every host primitive against a small,
//! deterministic model: a manually advanced game timer, an asset catalog
//! with per-asset load latency, an entity table, a flat terrain plane, and
//! sphere-shaped entities for ray hits. It also counts the calls Meridian
//! makes so tests can assert on what was (or was not) probed.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use meridian_core::{
    joaat, AssetClass, AssetHash, AssetId, EntityKind, NetworkId, RawHandle, Vector3,
};
use tracing::debug;

use crate::primitives::{
    AssetCatalog, CameraPrimitives, CorrelationHandle, GameClock, RayMask, RayPrimitives,
    RayRequest, RayResolution, SpawnParams, SpawnPrimitives, WorldProbe,
};

/// Collision radius of every simulated entity
pub const ENTITY_RADIUS: f64 = 1.0;

/// Material id the terrain reports
pub const TERRAIN_MATERIAL: u32 = 0x0AAB_2C4F;

/// A catalog entry
#[derive(Debug, Clone)]
struct SimAsset {
    name: String,
    model_kind: Option<EntityKind>,
    /// `None` never finishes loading
    latency_ms: Option<u64>,
    requested_at: Option<u64>,
    resident: bool,
}

/// A live world object
#[derive(Debug, Clone, PartialEq)]
pub struct SimEntity {
    pub kind: EntityKind,
    pub model: Option<AssetHash>,
    pub position: Vector3,
    pub heading: f64,
    pub network_id: Option<NetworkId>,
    pub seats: HashMap<i32, RawHandle>,
}

#[derive(Debug)]
struct SimState {
    assets: HashMap<AssetId, SimAsset>,
    entities: HashMap<RawHandle, SimEntity>,
    next_handle: i32,
    next_network_id: i32,
    rays: HashMap<CorrelationHandle, RayRequest>,
    next_ray: i32,
    camera_position: Vector3,
    camera_rotation: Vector3,
    camera_fov: f64,
    terrain_height: Option<f64>,
    water_level: Option<f64>,
    load_requests: HashMap<AssetId, usize>,
    release_hints: HashMap<AssetId, usize>,
    collision_requests: Vec<Vector3>,
    refuse_creation: bool,
}

/// Deterministic host world for tests and the demo binary.
#[derive(Debug)]
pub struct SimulatedWorld {
    clock: Cell<u64>,
    probes: Cell<usize>,
    loaded_checks: Cell<usize>,
    state: RefCell<SimState>,
}

impl SimulatedWorld {
    /// An empty world at time zero with flat terrain at z = 0
    pub fn new() -> Self {
        Self {
            clock: Cell::new(0),
            probes: Cell::new(0),
            loaded_checks: Cell::new(0),
            state: RefCell::new(SimState {
                assets: HashMap::new(),
                entities: HashMap::new(),
                next_handle: 1,
                next_network_id: 1,
                rays: HashMap::new(),
                next_ray: 1,
                camera_position: Vector3::ZERO,
                camera_rotation: Vector3::ZERO,
                camera_fov: 50.0,
                terrain_height: Some(0.0),
                water_level: None,
                load_requests: HashMap::new(),
                release_hints: HashMap::new(),
                collision_requests: Vec::new(),
                refuse_creation: false,
            }),
        }
    }

    // ---- Catalog setup ----

    /// Register an asset that finishes loading `latency_ms` after it is requested.
    /// A `None` latency never finishes.
    pub fn register_asset(
        &self,
        class: AssetClass,
        name: &str,
        model_kind: Option<EntityKind>,
        latency_ms: Option<u64>,
    ) -> AssetId {
        let id = AssetId::new(class, joaat(name));
        self.state.borrow_mut().assets.insert(
            id,
            SimAsset {
                name: name.to_string(),
                model_kind,
                latency_ms,
                requested_at: None,
                resident: false,
            },
        );
        id
    }

    /// Builder: a spawnable model with the given load latency
    pub fn with_model(self, name: &str, kind: EntityKind, latency_ms: u64) -> Self {
        self.register_asset(AssetClass::Model, name, Some(kind), Some(latency_ms));
        self
    }

    /// Builder: a spawnable model whose load never completes
    pub fn with_stuck_model(self, name: &str, kind: EntityKind) -> Self {
        self.register_asset(AssetClass::Model, name, Some(kind), None);
        self
    }

    /// Builder: a non-model asset (anim dict, texture dict, ...)
    pub fn with_asset(self, class: AssetClass, name: &str, latency_ms: u64) -> Self {
        self.register_asset(class, name, None, Some(latency_ms));
        self
    }

    /// Mark an asset resident without a request, as if something else loaded it
    pub fn preload(&self, asset: AssetId) {
        if let Some(entry) = self.state.borrow_mut().assets.get_mut(&asset) {
            entry.resident = true;
        }
    }

    // ---- Clock ----

    pub fn advance(&self, ms: u64) {
        self.clock.set(self.clock.get() + ms);
    }

    pub fn now(&self) -> u64 {
        self.clock.get()
    }

    // ---- World setup ----

    /// Place an entity directly, bypassing the catalog
    pub fn insert_entity(&self, kind: EntityKind, position: Vector3) -> RawHandle {
        self.insert(kind, None, position, 0.0, false)
    }

    /// Place a networked entity and return its handle and replication id
    pub fn insert_networked(&self, kind: EntityKind, position: Vector3) -> (RawHandle, NetworkId) {
        let handle = self.insert(kind, None, position, 0.0, true);
        let net_id = self
            .entity(handle)
            .and_then(|e| e.network_id)
            .unwrap_or(NetworkId(0));
        (handle, net_id)
    }

    fn insert(
        &self,
        kind: EntityKind,
        model: Option<AssetHash>,
        position: Vector3,
        heading: f64,
        networked: bool,
    ) -> RawHandle {
        let mut state = self.state.borrow_mut();
        let handle = RawHandle(state.next_handle);
        state.next_handle += 1;
        let network_id = if networked {
            let id = NetworkId(state.next_network_id);
            state.next_network_id += 1;
            Some(id)
        } else {
            None
        };
        state.entities.insert(
            handle,
            SimEntity {
                kind,
                model,
                position,
                heading,
                network_id,
                seats: HashMap::new(),
            },
        );
        handle
    }

    /// Remove an entity out from under any handles that refer to it
    pub fn destroy(&self, handle: RawHandle) -> bool {
        self.state.borrow_mut().entities.remove(&handle).is_some()
    }

    /// Seat a ped in a vehicle
    pub fn occupy_seat(&self, vehicle: RawHandle, seat: i32, ped: RawHandle) {
        if let Some(entity) = self.state.borrow_mut().entities.get_mut(&vehicle) {
            entity.seats.insert(seat, ped);
        }
    }

    pub fn set_camera(&self, position: Vector3, rotation: Vector3) {
        let mut state = self.state.borrow_mut();
        state.camera_position = position;
        state.camera_rotation = rotation;
    }

    pub fn set_camera_fov(&self, fov: f64) {
        self.state.borrow_mut().camera_fov = fov;
    }

    /// Flat terrain height, or `None` for no ground anywhere
    pub fn set_terrain(&self, height: Option<f64>) {
        self.state.borrow_mut().terrain_height = height;
    }

    pub fn set_water_level(&self, level: Option<f64>) {
        self.state.borrow_mut().water_level = level;
    }

    /// Make `create_entity` return the sentinel even for loaded models
    pub fn set_refuse_creation(&self, refuse: bool) {
        self.state.borrow_mut().refuse_creation = refuse;
    }

    // ---- Inspection ----

    pub fn entity(&self, handle: RawHandle) -> Option<SimEntity> {
        self.state.borrow().entities.get(&handle).cloned()
    }

    pub fn entity_count(&self) -> usize {
        self.state.borrow().entities.len()
    }

    /// How many times `request_load` was called for an asset
    pub fn load_requests(&self, asset: AssetId) -> usize {
        self.state.borrow().load_requests.get(&asset).copied().unwrap_or(0)
    }

    /// How many times `release_hint` was called for an asset
    pub fn release_hints(&self, asset: AssetId) -> usize {
        self.state.borrow().release_hints.get(&asset).copied().unwrap_or(0)
    }

    /// Total existence/kind/position probes made against the entity table
    pub fn probe_count(&self) -> usize {
        self.probes.get()
    }

    /// Total `is_loaded` checks made against the catalog
    pub fn loaded_checks(&self) -> usize {
        self.loaded_checks.get()
    }

    pub fn collision_requests(&self) -> Vec<Vector3> {
        self.state.borrow().collision_requests.clone()
    }

    fn probe(&self) {
        self.probes.set(self.probes.get() + 1);
    }

    /// Loaded state without counting it as a check
    fn asset_ready(&self, asset: AssetId) -> bool {
        let now = self.now();
        let mut state = self.state.borrow_mut();
        let Some(entry) = state.assets.get_mut(&asset) else {
            return false;
        };
        if !entry.resident {
            if let (Some(requested_at), Some(latency)) = (entry.requested_at, entry.latency_ms) {
                if now >= requested_at + latency {
                    entry.resident = true;
                    debug!("sim: {} '{}' finished loading", asset.class.name(), entry.name);
                }
            }
        }
        entry.resident
    }

    fn trace_ray(&self, request: &RayRequest) -> RayResolution {
        let state = self.state.borrow();
        let direction = request.to - request.from;
        let mut best: Option<(f64, Vector3, RawHandle, Option<u32>)> = None;

        if request.mask.contains(RayMask::WORLD) {
            if let Some(ground) = state.terrain_height {
                let (z0, z1) = (request.from.z, request.to.z);
                if z0 >= ground && z1 <= ground && z0 != z1 {
                    let t = (z0 - ground) / (z0 - z1);
                    best = Some((t, Vector3::Z, RawHandle::NONE, Some(TERRAIN_MATERIAL)));
                }
            }
        }

        for (&handle, entity) in &state.entities {
            let bit = RayMask::for_kind(entity.kind);
            if handle == request.ignore || bit == RayMask::NONE || !request.mask.contains(bit) {
                continue;
            }
            let entry = segment_sphere(request.from, direction, entity.position, ENTITY_RADIUS);
            if let Some(t) = entry {
                if best.as_ref().map_or(true, |(bt, ..)| t < *bt) {
                    let point = request.from + direction * t;
                    let normal = (point - entity.position).normalize();
                    best = Some((t, normal, handle, Some(0)));
                }
            }
        }

        match best {
            Some((t, normal, entity, material)) => RayResolution {
                hit: true,
                end_point: request.from + direction * t,
                surface_normal: normal,
                entity,
                material: if request.with_material { material } else { None },
            },
            None => RayResolution {
                hit: false,
                end_point: request.to,
                surface_normal: Vector3::ZERO,
                entity: RawHandle::NONE,
                material: None,
            },
        }
    }
}

impl Default for SimulatedWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// First intersection parameter `t` in `[0, 1]` of `origin + t * direction`
/// with a sphere.
fn segment_sphere(
    origin: Vector3,
    direction: Vector3,
    center: Vector3,
    radius: f64,
) -> Option<f64> {
    let a = direction.dot(direction);
    if a == 0.0 {
        return None;
    }
    let f = origin - center;
    let b = 2.0 * f.dot(direction);
    let c = f.dot(f) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

impl GameClock for SimulatedWorld {
    fn game_timer(&self) -> u64 {
        self.clock.get()
    }
}

impl WorldProbe for SimulatedWorld {
    fn exists(&self, handle: RawHandle) -> bool {
        self.probe();
        self.state.borrow().entities.contains_key(&handle)
    }

    fn kind_of(&self, handle: RawHandle) -> Option<EntityKind> {
        self.probe();
        self.state.borrow().entities.get(&handle).map(|e| e.kind)
    }

    fn entity_position(&self, handle: RawHandle) -> Vector3 {
        self.probe();
        self.state
            .borrow()
            .entities
            .get(&handle)
            .map(|e| e.position)
            .unwrap_or(Vector3::ZERO)
    }

    fn closest_entity(&self, kind: EntityKind, position: Vector3, radius: f64) -> RawHandle {
        self.probe();
        let state = self.state.borrow();
        state
            .entities
            .iter()
            .filter(|(_, e)| e.kind == kind)
            .map(|(&h, e)| (h, e.position.distance_squared(position)))
            .filter(|&(_, d2)| d2 <= radius * radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(h, _)| h)
            .unwrap_or(RawHandle::NONE)
    }

    fn network_id_exists(&self, net_id: NetworkId) -> bool {
        self.probe();
        self.state
            .borrow()
            .entities
            .values()
            .any(|e| e.network_id == Some(net_id))
    }

    fn entity_from_network_id(&self, net_id: NetworkId) -> RawHandle {
        self.probe();
        self.state
            .borrow()
            .entities
            .iter()
            .find(|(_, e)| e.network_id == Some(net_id))
            .map(|(&h, _)| h)
            .unwrap_or(RawHandle::NONE)
    }

    fn ped_in_vehicle_seat(&self, vehicle: RawHandle, seat: i32) -> RawHandle {
        self.probe();
        self.state
            .borrow()
            .entities
            .get(&vehicle)
            .and_then(|e| e.seats.get(&seat).copied())
            .unwrap_or(RawHandle::NONE)
    }

    fn delete_entity(&self, handle: RawHandle) {
        self.destroy(handle);
    }
}

impl AssetCatalog for SimulatedWorld {
    fn contains(&self, asset: AssetId) -> bool {
        self.state.borrow().assets.contains_key(&asset)
    }

    fn model_kind(&self, model: AssetHash) -> Option<EntityKind> {
        self.state
            .borrow()
            .assets
            .get(&AssetId::model(model))
            .and_then(|a| a.model_kind)
    }

    fn is_loaded(&self, asset: AssetId) -> bool {
        self.loaded_checks.set(self.loaded_checks.get() + 1);
        self.asset_ready(asset)
    }

    fn request_load(&self, asset: AssetId) {
        let now = self.now();
        let mut state = self.state.borrow_mut();
        *state.load_requests.entry(asset).or_insert(0) += 1;
        if let Some(entry) = state.assets.get_mut(&asset) {
            if !entry.resident && entry.requested_at.is_none() {
                entry.requested_at = Some(now);
            }
            debug!("sim: load requested for {} '{}'", asset.class.name(), entry.name);
        }
    }

    fn release_hint(&self, asset: AssetId) {
        let mut state = self.state.borrow_mut();
        *state.release_hints.entry(asset).or_insert(0) += 1;
        // Only resident assets are evicted; a pending stream keeps going.
        if let Some(entry) = state.assets.get_mut(&asset) {
            if entry.resident {
                entry.resident = false;
                entry.requested_at = None;
            }
        }
    }
}

impl SpawnPrimitives for SimulatedWorld {
    fn create_entity(&self, kind: EntityKind, params: &SpawnParams) -> RawHandle {
        if !self.asset_ready(AssetId::model(params.model)) {
            debug!("sim: refusing to create {kind} from unloaded model {}", params.model);
            return RawHandle::NONE;
        }
        if self.state.borrow().refuse_creation {
            debug!("sim: refusing to create {kind}: creation is disabled");
            return RawHandle::NONE;
        }
        let handle = self.insert(
            kind,
            Some(params.model),
            params.position,
            params.heading,
            params.networked,
        );
        debug!("sim: created {kind} {handle} at {}", params.position);
        handle
    }
}

impl RayPrimitives for SimulatedWorld {
    fn issue_ray(&self, request: &RayRequest) -> CorrelationHandle {
        let mut state = self.state.borrow_mut();
        let handle = CorrelationHandle(state.next_ray);
        state.next_ray += 1;
        state.rays.insert(handle, request.clone());
        handle
    }

    fn resolve_ray(&self, handle: CorrelationHandle) -> Option<RayResolution> {
        let request = self.state.borrow_mut().rays.remove(&handle)?;
        Some(self.trace_ray(&request))
    }

    fn ground_z(&self, position: Vector3) -> Option<f64> {
        self.state
            .borrow()
            .terrain_height
            .filter(|&ground| position.z >= ground)
    }

    fn request_collision_at(&self, position: Vector3) {
        self.state.borrow_mut().collision_requests.push(position);
    }

    fn water_height(&self, _position: Vector3) -> Option<f64> {
        self.state.borrow().water_level
    }
}

impl CameraPrimitives for SimulatedWorld {
    fn camera_position(&self) -> Vector3 {
        self.state.borrow().camera_position
    }

    fn camera_rotation(&self) -> Vector3 {
        self.state.borrow().camera_rotation
    }

    fn camera_fov(&self) -> f64 {
        self.state.borrow().camera_fov
    }
}
