//! Pipeline Plugins
//!
//! Auxiliary behaviors composed onto a component through its plugin
//! pipeline, without touching its render logic:
//!
//! - [`cache`]: retain a produced output across unmount/remount cycles
//! - [`spawn`]: back one declared component with many per-key lifecycles
//! - [`restate`]: attach a state map and a `restate` capability
//! - [`logger`]: report lifecycle events through `tracing`
//!
//! Each plugin is a pipeline stage `(context, args) -> context` and runs on
//! every render call, so plugins guard their own idempotence where needed.

pub mod cache;
pub mod logger;
pub mod restate;
pub mod spawn;

pub use cache::cache;
pub use logger::{logger, Logger};
pub use restate::{restate, state_of};
pub use spawn::{MapStore, Spawn, SpawnStore};
