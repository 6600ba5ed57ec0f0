use std::future::Future;
use std::rc::Rc;

use meridian_core::Vector3;
use meridian_entity::{kind, EntityHandle};
use meridian_host::{RayMask, RayRequest, WorldHost};
use meridian_streaming::delay;
use tracing::{debug, trace};

use crate::config::QueryConfig;

/// Outcome of a resolved ray
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastResult {
    pub hit: bool,
    pub end_point: Vector3,
    pub surface_normal: Vector3,
    /// The sentinel when nothing (or only world geometry) was hit
    pub hit_entity: EntityHandle<kind::Generic>,
    /// Only reported by [`SpatialQuery::raycast_with_material`]
    pub material_id: Option<u32>,
}

impl RaycastResult {
    fn miss(end_point: Vector3) -> Self {
        Self {
            hit: false,
            end_point,
            surface_normal: Vector3::ZERO,
            hit_entity: EntityHandle::NONE,
            material_id: None,
        }
    }

    /// The entity that was hit, if any
    pub fn entity(&self) -> Option<EntityHandle<kind::Generic>> {
        (!self.hit_entity.is_none()).then_some(self.hit_entity)
    }
}

/// Unit view direction for a camera rotation in degrees (x = pitch, z = yaw).
///
/// Yaw 0 looks down +Y; positive yaw turns towards -X.
pub fn camera_forward(rotation: Vector3) -> Vector3 {
    let pitch = rotation.x.to_radians();
    let yaw = rotation.z.to_radians();
    let planar = pitch.cos().abs();
    Vector3::new(-yaw.sin() * planar, yaw.cos() * planar, pitch.sin())
}

/// Ray and projection queries against the host world.
#[derive(Clone)]
pub struct SpatialQuery {
    host: Rc<dyn WorldHost>,
    config: QueryConfig,
}

impl SpatialQuery {
    pub fn new(host: Rc<dyn WorldHost>) -> Self {
        Self::with_config(host, QueryConfig::default())
    }

    pub fn with_config(host: Rc<dyn WorldHost>, config: QueryConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Cast a ray from `from` to `to`, passing through `ignore`.
    pub fn raycast(
        &self,
        from: Vector3,
        to: Vector3,
        mask: RayMask,
        ignore: EntityHandle,
    ) -> RaycastResult {
        self.cast(RayRequest {
            from,
            to,
            mask,
            ignore: ignore.raw(),
            with_material: false,
        })
    }

    /// Like [`raycast`](Self::raycast), also reporting the surface material.
    pub fn raycast_with_material(
        &self,
        from: Vector3,
        to: Vector3,
        mask: RayMask,
        ignore: EntityHandle,
    ) -> RaycastResult {
        self.cast(RayRequest {
            from,
            to,
            mask,
            ignore: ignore.raw(),
            with_material: true,
        })
    }

    fn cast(&self, request: RayRequest) -> RaycastResult {
        let correlation = self.host.issue_ray(&request);
        let Some(resolution) = self.host.resolve_ray(correlation) else {
            debug!("ray {:?} could not be resolved, treating as a miss", correlation);
            return RaycastResult::miss(request.to);
        };
        trace!(
            "ray {} -> {} mask {}: hit={} at {}",
            request.from,
            request.to,
            request.mask,
            resolution.hit,
            resolution.end_point
        );
        RaycastResult {
            hit: resolution.hit,
            end_point: resolution.end_point,
            surface_normal: resolution.surface_normal,
            hit_entity: EntityHandle::from_raw(resolution.entity),
            material_id: if request.with_material { resolution.material } else { None },
        }
    }

    /// Cast along the gameplay camera's view direction.
    ///
    /// The screen coordinates are accepted for call-site compatibility; the
    /// ray always goes through the view center.
    pub fn screen_to_world(
        &self,
        _screen_x: f64,
        _screen_y: f64,
        mask: RayMask,
        max_distance: f64,
    ) -> RaycastResult {
        let origin = self.host.camera_position();
        let direction = camera_forward(self.host.camera_rotation());
        let end = origin + direction * max_distance;
        self.raycast(origin, end, mask, EntityHandle::NONE)
    }

    /// Ground height below `position`, if the ground there is loaded
    pub fn ground_z(&self, position: Vector3) -> Option<f64> {
        self.host.ground_z(position)
    }

    /// Ground height below `position`, streaming collision in first.
    ///
    /// Each attempt requests collision, waits one interval, then probes from
    /// the configured altitude. Falls back to `position.z` when every attempt
    /// misses.
    pub fn settle_ground_z(&self, position: Vector3) -> impl Future<Output = f64> + 'static {
        let host = Rc::clone(&self.host);
        let config = self.config.clone();
        async move {
            let probe = Vector3::new(position.x, position.y, config.ground_probe_height);
            for attempt in 1..=config.ground_settle_attempts {
                host.request_collision_at(position);
                delay(&host, config.ground_settle_interval_ms).await;
                if let Some(z) = host.ground_z(probe) {
                    trace!("ground at {z} after {attempt} attempt(s)");
                    return z;
                }
            }
            debug!(
                "no ground under {position} after {} attempts, keeping z",
                config.ground_settle_attempts
            );
            position.z
        }
    }

    /// Water surface height at `position`, if there is water
    pub fn water_height(&self, position: Vector3) -> Option<f64> {
        self.host.water_height(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::EntityKind;
    use meridian_host::{SimulatedWorld, TERRAIN_MATERIAL};
    use meridian_streaming::Scheduler;

    const EPSILON: f64 = 1e-9;

    fn approx(a: Vector3, b: Vector3) -> bool {
        (a - b).length() < EPSILON
    }

    fn setup() -> (Rc<SimulatedWorld>, SpatialQuery) {
        let world = Rc::new(SimulatedWorld::new());
        let query = SpatialQuery::new(world.clone());
        (world, query)
    }

    #[test]
    fn forward_from_camera_rotation() {
        assert!(approx(camera_forward(Vector3::ZERO), Vector3::new(0.0, 1.0, 0.0)));
        assert!(approx(camera_forward(Vector3::new(90.0, 0.0, 0.0)), Vector3::new(0.0, 0.0, 1.0)));
        assert!(approx(camera_forward(Vector3::new(0.0, 0.0, 90.0)), Vector3::new(-1.0, 0.0, 0.0)));
        let tilted = camera_forward(Vector3::new(30.0, 0.0, 45.0));
        assert!((tilted.length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn screen_to_world_looks_down_at_terrain() {
        let (world, query) = setup();
        world.set_camera(Vector3::new(2.0, 3.0, 10.0), Vector3::new(-90.0, 0.0, 0.0));
        let result = query.screen_to_world(0.5, 0.5, RayMask::ALL, 1000.0);
        assert!(result.hit);
        assert!(approx(result.end_point, Vector3::new(2.0, 3.0, 0.0)));
        assert!(result.entity().is_none());
        assert_eq!(result.material_id, None);
    }

    #[test]
    fn screen_coordinates_do_not_move_the_ray() {
        let (world, query) = setup();
        world.set_camera(Vector3::new(0.0, 0.0, 5.0), Vector3::new(-45.0, 0.0, 0.0));
        let center = query.screen_to_world(0.5, 0.5, RayMask::ALL, 100.0);
        let corner = query.screen_to_world(0.0, 1.0, RayMask::ALL, 100.0);
        assert_eq!(center, corner);
    }

    #[test]
    fn raycast_reports_hit_entity() {
        let (world, query) = setup();
        let vehicle = world.insert_entity(EntityKind::Vehicle, Vector3::new(0.0, 10.0, 1.0));
        let from = Vector3::new(0.0, 0.0, 1.0);
        let to = Vector3::new(0.0, 20.0, 1.0);

        let result = query.raycast(from, to, RayMask::ALL, EntityHandle::NONE);
        assert!(result.hit);
        assert_eq!(result.hit_entity.raw(), vehicle);
        assert!(approx(result.end_point, Vector3::new(0.0, 9.0, 1.0)));
        assert!(approx(result.surface_normal, Vector3::new(0.0, -1.0, 0.0)));

        let ignored = query.raycast(from, to, RayMask::ALL, EntityHandle::from_raw(vehicle));
        assert!(!ignored.hit);
        assert_eq!(ignored.hit_entity, EntityHandle::NONE);

        let masked = query.raycast(from, to, RayMask::PEDS, EntityHandle::NONE);
        assert!(!masked.hit);
    }

    #[test]
    fn material_only_when_asked() {
        let (_world, query) = setup();
        let from = Vector3::new(0.0, 0.0, 10.0);
        let to = Vector3::new(0.0, 0.0, -10.0);
        assert_eq!(query.raycast(from, to, RayMask::WORLD, EntityHandle::NONE).material_id, None);
        assert_eq!(
            query
                .raycast_with_material(from, to, RayMask::WORLD, EntityHandle::NONE)
                .material_id,
            Some(TERRAIN_MATERIAL)
        );
    }

    #[test]
    fn settle_ground_z_finds_loaded_ground() {
        let (world, query) = setup();
        world.set_terrain(Some(5.0));
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(query.settle_ground_z(Vector3::new(1.0, 1.0, 40.0)));
        while !handle.is_finished() {
            scheduler.tick();
            world.advance(10);
        }
        assert_eq!(handle.try_take(), Some(5.0));
        assert_eq!(world.collision_requests().len(), 1);
    }

    #[test]
    fn settle_ground_z_falls_back_to_input_height() {
        let (world, query) = setup();
        world.set_terrain(None);
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(query.settle_ground_z(Vector3::new(1.0, 1.0, 40.0)));
        while !handle.is_finished() {
            scheduler.tick();
            world.advance(10);
        }
        assert_eq!(handle.try_take(), Some(40.0));
        assert_eq!(world.collision_requests().len(), 10);
        assert!(world.now() >= 500);
    }

    #[test]
    fn water_and_ground_probes() {
        let (world, query) = setup();
        assert_eq!(query.water_height(Vector3::ZERO), None);
        world.set_water_level(Some(-2.0));
        assert_eq!(query.water_height(Vector3::ZERO), Some(-2.0));
        assert_eq!(query.ground_z(Vector3::new(0.0, 0.0, 3.0)), Some(0.0));
        assert_eq!(query.ground_z(Vector3::new(0.0, 0.0, -3.0)), None);
    }
}
