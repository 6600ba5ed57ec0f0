use std::rc::Rc;

use meridian_core::{NetworkId, Vector3};
use meridian_host::WorldHost;
use tracing::trace;

use crate::handle::kind::{Ped, Vehicle};
use crate::handle::{Capability, EntityHandle};

/// Search radius used by the closest-entity lookups when callers have no
/// better value.
pub const DEFAULT_SEARCH_RADIUS: f64 = 25.0;

/// Liveness-checked access to world objects.
///
/// The registry owns no entity state. Every method re-probes the host at
/// the point of use, and the sentinel handle short-circuits before any
/// probe is made.
pub struct HandleRegistry {
    host: Rc<dyn WorldHost>,
}

impl HandleRegistry {
    pub fn new(host: Rc<dyn WorldHost>) -> Self {
        Self { host }
    }

    /// Whether the referent is alive right now
    pub fn exists<K: Capability>(&self, handle: EntityHandle<K>) -> bool {
        if handle.is_none() {
            return false;
        }
        self.host.exists(handle.raw())
    }

    /// Integer identity comparison, across capability tags
    pub fn equals<A: Capability, B: Capability>(a: EntityHandle<A>, b: EntityHandle<B>) -> bool {
        a.same_entity(&b)
    }

    /// Re-tag a handle after probing that the referent really is a `K`.
    ///
    /// Returns `None` for the sentinel, for dead handles, and on a kind
    /// mismatch. Narrowing to `Generic` only checks existence.
    pub fn narrow<K: Capability, F: Capability>(
        &self,
        handle: EntityHandle<F>,
    ) -> Option<EntityHandle<K>> {
        if handle.is_none() {
            return None;
        }
        let matches = if K::KIND == meridian_core::EntityKind::Generic {
            self.host.exists(handle.raw())
        } else {
            self.host.kind_of(handle.raw()) == Some(K::KIND)
        };
        if matches {
            Some(EntityHandle::from_raw(handle.raw()))
        } else {
            trace!("{handle} did not narrow to {}", K::KIND);
            None
        }
    }

    /// Current world position, `None` if the handle is not alive
    pub fn position<K: Capability>(&self, handle: EntityHandle<K>) -> Option<Vector3> {
        if !self.exists(handle) {
            return None;
        }
        Some(self.host.entity_position(handle.raw()))
    }

    /// Distance between two live entities
    pub fn distance_between<A: Capability, B: Capability>(
        &self,
        a: EntityHandle<A>,
        b: EntityHandle<B>,
    ) -> Option<f64> {
        let from = self.position(a)?;
        let to = self.position(b)?;
        Some(from.distance_to(to))
    }

    /// Nearest live `K` within `radius` of `position`
    pub fn closest<K: Capability>(
        &self,
        position: Vector3,
        radius: f64,
    ) -> Option<EntityHandle<K>> {
        let raw = self.host.closest_entity(K::KIND, position, radius);
        if raw.is_none() {
            return None;
        }
        Some(EntityHandle::from_raw(raw))
    }

    /// Resolve a replication id to a live, correctly-tagged handle
    pub fn from_network_id<K: Capability>(&self, net_id: NetworkId) -> Option<EntityHandle<K>> {
        if net_id.0 == 0 || !self.host.network_id_exists(net_id) {
            return None;
        }
        let raw = self.host.entity_from_network_id(net_id);
        self.narrow(EntityHandle::<K>::from_raw(raw))
    }

    /// Resolve a state bag name of the form `entity:<netId>`
    pub fn from_state_bag<K: Capability>(&self, bag_name: &str) -> Option<EntityHandle<K>> {
        let net_id = parse_state_bag(bag_name)?;
        self.from_network_id(net_id)
    }

    /// Ped in a vehicle seat. An empty seat is `None`, not an error.
    pub fn occupant(&self, vehicle: EntityHandle<Vehicle>, seat: i32) -> Option<EntityHandle<Ped>> {
        if !self.exists(vehicle) {
            return None;
        }
        let raw = self.host.ped_in_vehicle_seat(vehicle.raw(), seat);
        if raw.is_none() {
            return None;
        }
        Some(EntityHandle::from_raw(raw))
    }

    /// Ask the host to destroy a live entity. Returns whether a delete was issued.
    pub fn delete<K: Capability>(&self, handle: EntityHandle<K>) -> bool {
        if !self.exists(handle) {
            return false;
        }
        self.host.delete_entity(handle.raw());
        true
    }
}

/// Parse `entity:<netId>` into a replication id.
pub fn parse_state_bag(bag_name: &str) -> Option<NetworkId> {
    let id: i32 = bag_name.strip_prefix("entity:")?.parse().ok()?;
    (id != 0).then_some(NetworkId(id))
}
