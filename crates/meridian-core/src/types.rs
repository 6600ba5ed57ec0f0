//! Identifier types shared across the Meridian crates
//!
//! Entity handles and asset hashes are both plain integers on the host side.
//! They get separate newtypes here so one can never be passed where the
//! other is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The host's integer naming of a world object. `0` means "no entity".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct RawHandle(pub i32);

impl RawHandle {
    /// The sentinel: no entity, empty seat, nothing found.
    pub const NONE: RawHandle = RawHandle(0);

    /// Whether this is the sentinel value
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for RawHandle {
    fn from(raw: i32) -> Self {
        RawHandle(raw)
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Host replication id of a networked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub i32);

/// Runtime capability discriminator for world objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Ped,
    Vehicle,
    Object,
    Camera,
    Blip,
    Generic,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Ped => "ped",
            EntityKind::Vehicle => "vehicle",
            EntityKind::Object => "object",
            EntityKind::Camera => "camera",
            EntityKind::Blip => "blip",
            EntityKind::Generic => "entity",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric key of a streamable asset, as produced by [`joaat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHash(pub u32);

impl fmt::Display for AssetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// A streamable asset named either by string or by its precomputed hash.
///
/// Both forms denote the same resource. A `Hash` is passed through as-is;
/// it is never hashed a second time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKey {
    Name(String),
    Hash(AssetHash),
}

impl AssetKey {
    /// Resolve to a hash using the given name hasher
    pub fn resolve_with(&self, hasher: impl FnOnce(&str) -> AssetHash) -> AssetHash {
        match self {
            AssetKey::Name(name) => hasher(name),
            AssetKey::Hash(hash) => *hash,
        }
    }

    /// Resolve to a hash using [`joaat`]
    pub fn hash(&self) -> AssetHash {
        self.resolve_with(joaat)
    }

    /// The string name, if this key carries one
    pub fn name(&self) -> Option<&str> {
        match self {
            AssetKey::Name(name) => Some(name),
            AssetKey::Hash(_) => None,
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKey::Name(name) => f.write_str(name),
            AssetKey::Hash(hash) => write!(f, "{hash}"),
        }
    }
}

impl From<&str> for AssetKey {
    fn from(name: &str) -> Self {
        AssetKey::Name(name.to_string())
    }
}

impl From<String> for AssetKey {
    fn from(name: String) -> Self {
        AssetKey::Name(name)
    }
}

impl From<AssetHash> for AssetKey {
    fn from(hash: AssetHash) -> Self {
        AssetKey::Hash(hash)
    }
}

impl From<u32> for AssetKey {
    fn from(hash: u32) -> Self {
        AssetKey::Hash(AssetHash(hash))
    }
}

/// Category of streamable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Model,
    AnimDict,
    AnimSet,
    TextureDict,
    PtfxAsset,
}

impl AssetClass {
    pub fn name(&self) -> &'static str {
        match self {
            AssetClass::Model => "model",
            AssetClass::AnimDict => "anim dict",
            AssetClass::AnimSet => "anim set",
            AssetClass::TextureDict => "texture dict",
            AssetClass::PtfxAsset => "ptfx asset",
        }
    }
}

/// A fully resolved asset reference: class plus hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId {
    pub class: AssetClass,
    pub hash: AssetHash,
}

impl AssetId {
    pub fn new(class: AssetClass, hash: AssetHash) -> Self {
        Self { class, hash }
    }

    pub fn model(hash: AssetHash) -> Self {
        Self::new(AssetClass::Model, hash)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.class.name(), self.hash)
    }
}

/// Case-insensitive Jenkins one-at-a-time hash, the asset catalog's key function.
pub fn joaat(name: &str) -> AssetHash {
    let mut h: u32 = 0;
    for byte in name.bytes() {
        h = h.wrapping_add(byte.to_ascii_lowercase() as u32);
        h = h.wrapping_add(h << 10);
        h ^= h >> 6;
    }
    h = h.wrapping_add(h << 3);
    h ^= h >> 11;
    h = h.wrapping_add(h << 15);
    AssetHash(h)
}
