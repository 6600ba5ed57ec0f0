//! Meridian Streaming - Cooperative loading of host assets
//!
//! Provides the tick-driven [`Scheduler`] that script tasks run on and the
//! [`AsyncResourceLoader`] that waits for models, animation dictionaries,
//! texture dictionaries and particle assets to become resident.

mod config;
mod error;
mod loader;
mod scheduler;

pub use config::{AcquireOptions, ClassBudgets, LoaderConfig};
pub use error::StreamingError;
pub use loader::{Acquire, AsyncResourceLoader, LoadState, Loaded};
pub use scheduler::{delay, next_tick, Delay, NextTick, Scheduler, TaskHandle};
