//! Meridian Core - Vector math and shared identifier types
//!
//! This crate provides the foundational types used throughout Meridian:
//! - [`Vector3`], the immutable vector every spatial query is built on
//! - Handle and asset identifier newtypes that keep entity handles and asset
//!   hashes from being confused with each other
//! - The asset-name hash used by host catalogs

pub mod math;
pub mod types;

pub use math::Vector3;
pub use types::{
    joaat, AssetClass, AssetHash, AssetId, AssetKey, EntityKind, NetworkId, RawHandle,
};
