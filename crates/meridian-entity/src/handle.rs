use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use meridian_core::{EntityKind, RawHandle};

/// Capability tag carried by an [`EntityHandle`].
pub trait Capability: 'static {
    const KIND: EntityKind;
}

/// Capability markers. Uninhabited: they only exist at the type level.
pub mod kind {
    use super::Capability;
    use meridian_core::EntityKind;

    #[derive(Debug)]
    pub enum Ped {}
    #[derive(Debug)]
    pub enum Vehicle {}
    #[derive(Debug)]
    pub enum Object {}
    #[derive(Debug)]
    pub enum Camera {}
    #[derive(Debug)]
    pub enum Blip {}
    /// Any world object; narrowing to it only checks existence.
    #[derive(Debug)]
    pub enum Generic {}

    impl Capability for Ped {
        const KIND: EntityKind = EntityKind::Ped;
    }
    impl Capability for Vehicle {
        const KIND: EntityKind = EntityKind::Vehicle;
    }
    impl Capability for Object {
        const KIND: EntityKind = EntityKind::Object;
    }
    impl Capability for Camera {
        const KIND: EntityKind = EntityKind::Camera;
    }
    impl Capability for Blip {
        const KIND: EntityKind = EntityKind::Blip;
    }
    impl Capability for Generic {
        const KIND: EntityKind = EntityKind::Generic;
    }
}

/// A weak, capability-tagged reference to a world object.
///
/// Holds nothing but the host's integer. It never caches liveness: the world
/// can destroy the referent at any moment, so every use goes back through
/// [`HandleRegistry`](crate::HandleRegistry) to probe it.
pub struct EntityHandle<K: Capability = kind::Generic> {
    raw: RawHandle,
    _kind: PhantomData<K>,
}

impl<K: Capability> EntityHandle<K> {
    /// The "no entity" handle
    pub const NONE: EntityHandle<K> = EntityHandle {
        raw: RawHandle::NONE,
        _kind: PhantomData,
    };

    /// Wrap a raw host integer. Always permitted; correctness is checked
    /// later by probing.
    pub fn from_raw(raw: impl Into<RawHandle>) -> Self {
        Self {
            raw: raw.into(),
            _kind: PhantomData,
        }
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// The capability this handle is tagged with
    pub fn kind(&self) -> EntityKind {
        K::KIND
    }

    /// Whether this is the sentinel handle
    pub fn is_none(&self) -> bool {
        self.raw.is_none()
    }

    /// Drop the capability tag. No probe is needed to go wider.
    pub fn widen(self) -> EntityHandle<kind::Generic> {
        EntityHandle::from_raw(self.raw)
    }

    /// Integer identity, regardless of capability tag
    pub fn same_entity<J: Capability>(&self, other: &EntityHandle<J>) -> bool {
        self.raw == other.raw
    }
}

impl<K: Capability> Clone for EntityHandle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: Capability> Copy for EntityHandle<K> {}

impl<K: Capability> PartialEq for EntityHandle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K: Capability> Eq for EntityHandle<K> {}

impl<K: Capability> Hash for EntityHandle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K: Capability> Default for EntityHandle<K> {
    fn default() -> Self {
        Self::NONE
    }
}

impl<K: Capability> fmt::Debug for EntityHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle<{}>({})", K::KIND, self.raw.0)
    }
}

impl<K: Capability> fmt::Display for EntityHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", K::KIND, self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::kind::{Generic, Ped, Vehicle};
    use super::*;

    #[test]
    fn construct_from_raw_is_free() {
        let handle = EntityHandle::<Vehicle>::from_raw(42);
        assert_eq!(handle.raw(), RawHandle(42));
        assert_eq!(handle.kind(), EntityKind::Vehicle);
        assert!(!handle.is_none());
    }

    #[test]
    fn sentinel() {
        assert!(EntityHandle::<Ped>::NONE.is_none());
        assert!(EntityHandle::<Generic>::default().is_none());
        assert!(EntityHandle::<Generic>::from_raw(0).is_none());
    }

    #[test]
    fn identity_across_kinds() {
        let vehicle = EntityHandle::<Vehicle>::from_raw(7);
        let generic = vehicle.widen();
        assert!(vehicle.same_entity(&generic));
        assert_eq!(generic, EntityHandle::<Generic>::from_raw(7));
        assert_ne!(generic, EntityHandle::<Generic>::from_raw(8));
    }

    #[test]
    fn debug_names_the_capability() {
        let ped = EntityHandle::<Ped>::from_raw(3);
        assert_eq!(format!("{ped:?}"), "EntityHandle<ped>(3)");
        assert_eq!(ped.to_string(), "ped #3");
    }
}
