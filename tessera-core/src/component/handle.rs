//! Component: the declared template
//!
//! A `Component` is what a caller declares once and renders many times. It
//! owns a base context and an ordered plugin pipeline. On every call to
//! [`Component::render`] the full pipeline runs from scratch: each stage
//! receives the current context and the original arguments and may return
//! the same context or substitute another one (the spawn registry
//! substitutes a per-key context, for example). The final, implicit stage
//! renders whichever context survived the pipeline.
//!
//! A stage that produces no context at all is a protocol violation: it
//! indicates a defective plugin, not a recoverable condition.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::arg::Arg;
use super::context::Context;
use super::events::{Event, ListenerId, UnloadHook};
use super::node::Node;
use crate::error::{Error, Result};

/// A pipeline stage: receives the current context and the call arguments,
/// returns the context to continue with. `Ok(None)` means the stage failed
/// to expose a renderable context and fails the call.
pub type Plugin = Rc<dyn Fn(&Context, &[Arg]) -> Result<Option<Context>>>;

struct ComponentInner {
    context: Context,
    plugins: RefCell<Vec<Plugin>>,
}

/// A declared component: render entry point, plugin pipeline, and listener
/// management. Clones share the same template.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    /// Declare a component wrapping a render function.
    ///
    /// Fails with a `Configuration` error when the name is empty.
    pub fn new(
        name: &str,
        render: impl Fn(&Context, &[Arg]) -> Result<Node> + 'static,
    ) -> Result<Self> {
        let context = Context::new(name, Rc::new(render))?;
        Ok(Self::from_context(context))
    }

    pub(crate) fn from_context(context: Context) -> Self {
        Self {
            inner: Rc::new(ComponentInner {
                context,
                plugins: RefCell::new(Vec::new()),
            }),
        }
    }

    /// The declared component name.
    pub fn name(&self) -> String {
        self.inner.context.name()
    }

    /// The base context backing this template.
    ///
    /// This is the seam the external mount detector uses to drive
    /// `load`/`unload`/`afterreorder` for non-spawned components.
    pub fn context(&self) -> Context {
        self.inner.context.clone()
    }

    /// Render with the given arguments.
    ///
    /// Runs the plugin pipeline stage by stage, then renders the resulting
    /// context. Idempotent while mounted with identical arguments: no hook
    /// fires and the same output is returned.
    pub fn render(&self, args: &[Arg]) -> Result<Node> {
        let mut ctx = self.inner.context.clone();
        let plugins = self.inner.plugins.borrow().clone();
        for plugin in plugins {
            ctx = plugin(&ctx, args)?.ok_or_else(|| {
                Error::Protocol("plugin stage returned no context".into())
            })?;
        }
        ctx.render(args)
    }

    /// Append a stage to the plugin pipeline.
    ///
    /// Pipeline order is fixed by registration order for the life of the
    /// template; stages cannot be removed.
    pub fn use_plugin(&self, plugin: Plugin) {
        self.inner.plugins.borrow_mut().push(plugin);
    }

    /// Register a `load` listener. Returning a hook from it installs the
    /// one-shot unload handler for that mount cycle.
    pub fn on_load(
        &self,
        listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
    ) -> ListenerId {
        self.inner.context.add_lifecycle(Event::Load, Rc::new(listener))
    }

    /// Register an `unload` listener.
    pub fn on_unload(
        &self,
        listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
    ) -> ListenerId {
        self.inner.context.add_lifecycle(Event::Unload, Rc::new(listener))
    }

    /// Register a `beforerender` listener.
    pub fn on_beforerender(
        &self,
        listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
    ) -> ListenerId {
        self.inner
            .context
            .add_lifecycle(Event::BeforeRender, Rc::new(listener))
    }

    /// Register an `afterupdate` listener.
    pub fn on_afterupdate(
        &self,
        listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
    ) -> ListenerId {
        self.inner
            .context
            .add_lifecycle(Event::AfterUpdate, Rc::new(listener))
    }

    /// Register an `afterreorder` listener.
    pub fn on_afterreorder(
        &self,
        listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
    ) -> ListenerId {
        self.inner
            .context
            .add_lifecycle(Event::AfterReorder, Rc::new(listener))
    }

    /// Register a custom update listener, replacing the default diff.
    pub fn on_update(
        &self,
        listener: impl Fn(&Context, &[Arg], &[Arg]) -> bool + 'static,
    ) -> ListenerId {
        self.inner.context.on_update(listener)
    }

    /// Remove a previously registered listener.
    pub fn off(&self, event: Event, id: ListenerId) -> bool {
        self.inner.context.off(event, id)
    }

    /// Produce a new, independently addressable component sharing this
    /// one's render function and plugin pipeline.
    ///
    /// Listeners are copied as a snapshot taken at the moment of forking:
    /// later registrations on either side are not mirrored to the other.
    pub fn fork(&self, name: Option<&str>) -> Result<Component> {
        let base = &self.inner.context;
        let name = match name {
            Some(name) => name.to_owned(),
            None => base.name(),
        };
        let context = Context::with_parts(
            &name,
            base.render_fn(),
            base.registry_snapshot(),
            base.hooks_enabled(),
        )?;
        let fork = Component::from_context(context);
        *fork.inner.plugins.borrow_mut() = self.inner.plugins.borrow().clone();
        Ok(fork)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("plugins", &self.inner.plugins.borrow().len())
            .finish()
    }
}
