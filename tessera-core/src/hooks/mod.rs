//! Inline Hook Registration
//!
//! An alternative to pre-declared listeners: lifecycle hooks are declared
//! inside the render body itself, ordered by call sequence. A component
//! created with [`component`] pushes its context onto a thread-local
//! render stack while its render function runs; the free registration
//! functions in this module target whichever context is on top.
//!
//! # Positional identity
//!
//! Hook identity is purely positional. The first render records the
//! sequence of registration calls; every later render must repeat exactly
//! the same sequence and count. Registering a different hook kind at a
//! recorded position, or a different number of hooks, fails that render
//! call with a protocol violation. The failure is scoped to the offending
//! context: the engine itself keeps running.
//!
//! Because the slot sequence is fixed, the hook *callables* are re-bound on
//! every render, so closures capture the current call's environment.
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_core::hooks;
//!
//! let greeter = hooks::component("greeting", |_, args| {
//!     hooks::load(|_, _, _| {
//!         // runs when the output is attached; the returned hook runs on
//!         // detach
//!         Some(Box::new(|_: &Context, _: &Node, _: &[Arg]| {}) as UnloadHook)
//!     })?;
//!     hooks::update(|_, new_args, prev_args| diff::changed(new_args, prev_args))?;
//!     Ok(Node::new("<h1>Hello!</h1>"))
//! })?;
//! ```

pub(crate) mod stack;

use std::rc::Rc;

use crate::component::{
    Arg, Component, Context, Event, Listener, Node, UnloadHook,
};
use crate::error::{Error, Result};

/// Declare a component whose render function registers hooks inline.
///
/// Identical to [`Component::new`] except that the context is pushed onto
/// the render stack for the duration of each render, enabling the free
/// registration functions in this module.
pub fn component(
    name: &str,
    render: impl Fn(&Context, &[Arg]) -> Result<Node> + 'static,
) -> Result<Component> {
    let component = Component::new(name, render)?;
    component.context().enable_hooks();
    Ok(component)
}

fn current() -> Result<Context> {
    stack::current().ok_or_else(|| {
        Error::Protocol("hook registered outside a rendering component".into())
    })
}

/// Register a `load` hook on the currently rendering context.
///
/// Returning a hook from the listener installs it as the one-shot unload
/// handler for that mount cycle.
pub fn load(
    listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
) -> Result<()> {
    current()?.register_hook(Event::Load, Listener::Lifecycle(Rc::new(listener)))
}

/// Register an `update` hook on the currently rendering context.
pub fn update(
    listener: impl Fn(&Context, &[Arg], &[Arg]) -> bool + 'static,
) -> Result<()> {
    current()?.register_hook(Event::Update, Listener::Update(Rc::new(listener)))
}

/// Register a `beforerender` hook on the currently rendering context.
pub fn before_render(
    listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
) -> Result<()> {
    current()?.register_hook(Event::BeforeRender, Listener::Lifecycle(Rc::new(listener)))
}

/// Register an `afterupdate` hook on the currently rendering context.
pub fn after_update(
    listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
) -> Result<()> {
    current()?.register_hook(Event::AfterUpdate, Listener::Lifecycle(Rc::new(listener)))
}

/// Register an `afterreorder` hook on the currently rendering context.
pub fn after_reorder(
    listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
) -> Result<()> {
    current()?.register_hook(Event::AfterReorder, Listener::Lifecycle(Rc::new(listener)))
}

/// The currently rendering context's output, if it has produced one.
pub fn output() -> Result<Option<Node>> {
    Ok(current()?.output())
}

/// Run a closure against the currently rendering context.
pub fn with_context<T>(f: impl FnOnce(&Context) -> T) -> Result<T> {
    Ok(f(&current()?))
}
