//! Meridian Entity - Handles to objects in the host world
//!
//! A handle is a weak, capability-tagged integer. It is cheap to create from
//! any raw value and is only trusted after [`HandleRegistry`] has probed the
//! host for existence and kind.

mod handle;
mod registry;

pub use handle::kind;
pub use handle::{Capability, EntityHandle};
pub use registry::{parse_state_bag, HandleRegistry, DEFAULT_SEARCH_RADIUS};
