//! Component Lifecycle Engine
//!
//! This module implements the core of the engine: the argument model, the
//! opaque output node, the per-context event registry, the default update
//! decision, the stateful [`Context`], and the declared [`Component`] with
//! its plugin pipeline.
//!
//! # Control flow
//!
//! A call to [`Component::render`] runs the plugin pipeline stage by
//! stage; each stage receives the current context and the original
//! arguments and may substitute another context (per-key multiplexing is
//! implemented exactly that way). The final stage renders the surviving
//! context, which consults the update decision engine (or custom `update`
//! listeners) to choose between reusing its output and regenerating it.
//! Lifecycle events then fire as an external mount detector reports
//! attachment and detachment.

mod arg;
mod context;
pub mod diff;
mod events;
mod handle;
mod node;

pub use arg::{Arg, ArgList, Callback, Value};
pub use context::{Context, ContextId, RenderFn};
pub use events::{Event, LifecycleFn, ListenerId, UnloadHook, UpdateFn};
pub use handle::{Component, Plugin};
pub use node::{Node, NodeId};

pub(crate) use events::Listener;
