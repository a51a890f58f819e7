//! Tessera Core
//!
//! This crate provides the lifecycle and dispatch engine for the Tessera
//! component framework. It wraps a pure "produce an output from arguments"
//! function with identity, mount/unmount detection hooks, update diffing,
//! and a plugin pipeline, so auxiliary behaviors (caching, logging, state
//! management, per-key multiplexing) compose onto any component without
//! modifying its render logic.
//!
//! The engine renders nothing itself: the output artifact is opaque, and an
//! external mount detector drives the `load`/`unload`/`afterreorder`
//! transitions as outputs attach to and detach from a live structure.
//! Execution is single-threaded, cooperative, and synchronous; one render
//! pass runs to completion with no suspension points. Work started inside a
//! lifecycle listener (such as a network fetch begun in `load`) is the
//! caller's responsibility: the one-shot hook a `load` listener may return
//! is the seam for cancelling it on `unload`, nothing is cancelled
//! automatically.
//!
//! # Architecture
//!
//! The crate is organized into three modules:
//!
//! - `component`: the Context and Component types, event registry, and
//!   update decision engine
//! - `plugin`: cache, spawn, restate, and logger pipeline stages
//! - `hooks`: inline, call-order-based hook registration
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_core::{Arg, Component, Node};
//!
//! let greeting = Component::new("greeting", |_, args| {
//!     Ok(Node::new(format!("<h1>Hello {:?}!</h1>", args)))
//! })?;
//!
//! greeting.on_load(|_, _, _| {
//!     // runs when the mount detector reports attachment; the returned
//!     // hook would run once on detachment
//!     None
//! });
//!
//! let output = greeting.render(&[Arg::from("world")])?;
//! greeting.context().load()?;
//!
//! // While mounted, identical arguments reuse the same output.
//! assert_eq!(greeting.render(&[Arg::from("world")])?, output);
//! ```

pub mod component;
pub mod error;
pub mod hooks;
pub mod plugin;

pub use component::{
    Arg, ArgList, Callback, Component, Context, ContextId, Event, ListenerId, Node, NodeId,
    Plugin, RenderFn, UnloadHook, Value,
};
pub use error::{Error, Result};
