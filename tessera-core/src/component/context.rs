//! Context: the stateful lifecycle unit
//!
//! A `Context` binds one render function to an identity, the arguments it
//! was last rendered with, its mount state, and its registered lifecycle
//! listeners. The context itself knows nothing about the live structure its
//! output is attached to: an external mount detector drives the
//! `load`/`unload`/`afterreorder` transitions at the right physical
//! instants, while `render` and `update` are driven by the caller.
//!
//! # Mount cycle
//!
//! `Unmounted -> Mounted -> Unmounted -> ...`, cyclically, any number of
//! times. Within one instance, `unload` of an outgoing mount always
//! completes before the next `load`. There is no ordering guarantee between
//! the lifecycle events of different instances.
//!
//! # Dispatch
//!
//! Listener lists are cloned out of the registry before anything is
//! invoked, so listeners may re-enter the context, including calling
//! `render` from inside a `load` listener. Lifecycle listeners fire
//! strictly in registration order and the dispatch result is the last
//! listener's return value. `update` listeners aggregate by logical OR and
//! all of them always run.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::arg::{Arg, ArgList, Value};
use super::diff;
use super::events::{
    Event, EventRegistry, LifecycleFn, Listener, ListenerId, UnloadHook, UpdateFn,
};
use super::node::Node;
use crate::error::{Error, Result};
use crate::hooks::stack;
use crate::plugin::logger::Logger;

/// Process-unique identifier for a context instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Generate a new unique context ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

/// The wrapped producer: builds an opaque output from the context and the
/// call arguments.
pub type RenderFn = Rc<dyn Fn(&Context, &[Arg]) -> Result<Node>>;

/// A positional hook slot recorded by the hook-stack registration idiom.
///
/// The event sequence is sealed after the first render; the listener is
/// re-bound on every subsequent render so closures capture fresh state.
struct HookSlot {
    event: Event,
    listener: Listener,
}

struct ContextInner {
    name: String,
    id: ContextId,
    render: RenderFn,
    registry: EventRegistry,
    last_args: ArgList,
    has_rendered: bool,
    mounted: bool,
    output: Option<Node>,
    cached: Option<Node>,
    cache_enabled: bool,
    captured_unload: Option<UnloadHook>,
    state: Option<IndexMap<String, Value>>,
    logger: Option<Logger>,
    hooks_enabled: bool,
    hook_slots: Vec<HookSlot>,
    hook_cursor: usize,
    hook_sealed: bool,
    post_unload: Vec<Rc<dyn Fn(&Context)>>,
}

/// Cheap handle to one stateful component instance.
///
/// Clones share the same underlying instance.
#[derive(Clone)]
pub struct Context {
    inner: Rc<RefCell<ContextInner>>,
}

impl Context {
    /// Create a new unmounted context.
    ///
    /// Fails with a `Configuration` error when the name is empty.
    pub fn new(name: &str, render: RenderFn) -> Result<Self> {
        Self::with_parts(name, render, EventRegistry::new(), false)
    }

    /// Create a context from an existing listener snapshot, used when
    /// forking a component or spawning a per-key instance.
    pub(crate) fn with_parts(
        name: &str,
        render: RenderFn,
        registry: EventRegistry,
        hooks_enabled: bool,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::Configuration(
                "component name must not be empty".into(),
            ));
        }

        Ok(Self {
            inner: Rc::new(RefCell::new(ContextInner {
                name: name.to_owned(),
                id: ContextId::new(),
                render,
                registry,
                last_args: ArgList::new(),
                has_rendered: false,
                mounted: false,
                output: None,
                cached: None,
                cache_enabled: false,
                captured_unload: None,
                state: None,
                logger: None,
                hooks_enabled,
                hook_slots: Vec::new(),
                hook_cursor: 0,
                hook_sealed: false,
                post_unload: Vec::new(),
            })),
        })
    }

    /// The component name this context was declared or spawned with.
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// The process-unique instance ID.
    pub fn id(&self) -> ContextId {
        self.inner.borrow().id
    }

    /// The most recently produced output, if any.
    pub fn output(&self) -> Option<Node> {
        self.inner.borrow().output.clone()
    }

    /// The output retained across unmount by the cache behavior, if any.
    pub fn cached(&self) -> Option<Node> {
        self.inner.borrow().cached.clone()
    }

    /// Whether the context is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.inner.borrow().mounted
    }

    /// The arguments of the most recent call that actually rendered.
    pub fn last_args(&self) -> ArgList {
        self.inner.borrow().last_args.clone()
    }

    /// The wrapped render function.
    pub fn render_fn(&self) -> RenderFn {
        Rc::clone(&self.inner.borrow().render)
    }

    pub(crate) fn registry_snapshot(&self) -> EventRegistry {
        self.inner.borrow().registry.snapshot()
    }

    pub(crate) fn hooks_enabled(&self) -> bool {
        self.inner.borrow().hooks_enabled
    }

    pub(crate) fn enable_hooks(&self) {
        self.inner.borrow_mut().hooks_enabled = true;
    }

    // ------------------------------------------------------------------
    // Listener registration
    // ------------------------------------------------------------------

    /// Register a lifecycle listener for a non-`update` event.
    ///
    /// Fails with a `Configuration` error for `Event::Update`, which takes
    /// a differently shaped listener (see [`Context::on_update`]).
    pub fn on(
        &self,
        event: Event,
        listener: impl Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook> + 'static,
    ) -> Result<ListenerId> {
        if event == Event::Update {
            return Err(Error::Configuration(
                "update listeners are registered with on_update".into(),
            ));
        }
        Ok(self.add_lifecycle(event, Rc::new(listener)))
    }

    pub(crate) fn add_lifecycle(&self, event: Event, listener: LifecycleFn) -> ListenerId {
        self.inner.borrow_mut().registry.add_lifecycle(event, listener)
    }

    /// Register a custom update listener, replacing the default diff.
    pub fn on_update(
        &self,
        listener: impl Fn(&Context, &[Arg], &[Arg]) -> bool + 'static,
    ) -> ListenerId {
        self.inner.borrow_mut().registry.add_update(Rc::new(listener))
    }

    /// Remove a previously registered listener.
    pub fn off(&self, event: Event, id: ListenerId) -> bool {
        self.inner.borrow_mut().registry.remove(event, id)
    }

    /// Run `hook` once after this context's next unload dispatch completes.
    ///
    /// The spawn registry uses this to free a key only once the context has
    /// fully unloaded.
    pub(crate) fn on_unloaded(&self, hook: Rc<dyn Fn(&Context)>) {
        self.inner.borrow_mut().post_unload.push(hook);
    }

    /// Install a one-shot handler invoked by the next `unload`.
    ///
    /// Normally installed implicitly by a `load` listener returning a hook;
    /// exposed for listeners that want to capture explicitly.
    pub fn capture_unload(&self, hook: UnloadHook) {
        self.inner.borrow_mut().captured_unload = Some(hook);
    }

    // ------------------------------------------------------------------
    // Render and update
    // ------------------------------------------------------------------

    /// Render or update, per the mount state.
    ///
    /// Unmounted: produces a fresh output via the render function (or
    /// returns the cached output when the cache behavior applies), fires
    /// `beforerender`, and records the output and arguments.
    ///
    /// Mounted: consults the update decision; `false` returns the existing
    /// output unchanged, `true` re-renders and fires `afterupdate`.
    pub fn render(&self, args: &[Arg]) -> Result<Node> {
        self.render_with(args, false)
    }

    /// Re-render with the last-known arguments, forcing the update
    /// decision while mounted. Used by the state store's `restate`.
    pub fn rerender(&self) -> Result<Node> {
        let args = {
            let inner = self.inner.borrow();
            if !inner.has_rendered {
                return Err(Error::Protocol(
                    "rerender called before any initial render".into(),
                ));
            }
            inner.last_args.clone()
        };
        self.render_with(&args, true)
    }

    fn render_with(&self, args: &[Arg], force: bool) -> Result<Node> {
        if self.inner.borrow().mounted {
            let should = force || self.update_decision(args);
            self.log_event("update", args);
            if !should {
                return self.inner.borrow().output.clone().ok_or_else(|| {
                    Error::Protocol("mounted context has no output".into())
                });
            }

            let node = self.invoke_render(args)?;
            {
                let mut inner = self.inner.borrow_mut();
                inner.output = Some(node.clone());
                inner.last_args = args.iter().cloned().collect();
                inner.has_rendered = true;
            }
            self.dispatch(Event::AfterUpdate, &node, args);
            self.log_event("afterupdate", args);
            return Ok(node);
        }

        // Unmounted with a retained output from a prior mount cycle: every
        // render while detached hands the cached output back without
        // touching the render function. New arguments still flow through
        // custom update listeners so internal state stays current while
        // detached, but last_args is untouched and nothing becomes visible
        // until remount drives an update.
        let reuse = {
            let inner = self.inner.borrow();
            if inner.cache_enabled {
                inner.cached.clone()
            } else {
                None
            }
        };
        if let Some(cached) = reuse {
            let prev = self.last_args();
            for listener in self.update_listeners() {
                listener(self, args, &prev);
            }
            self.inner.borrow_mut().output = Some(cached.clone());
            self.log_event("render", args);
            return Ok(cached);
        }

        let node = self.invoke_render(args)?;
        {
            let mut inner = self.inner.borrow_mut();
            inner.output = Some(node.clone());
            inner.last_args = args.iter().cloned().collect();
            inner.has_rendered = true;
        }
        self.dispatch(Event::BeforeRender, &node, args);
        self.log_event("beforerender", args);
        self.log_event("render", args);
        Ok(node)
    }

    /// The update decision for `args` against the previous arguments.
    ///
    /// Custom update listeners fully replace the default diff; with several
    /// registered, the aggregate is the logical OR of every individual
    /// result and all of them run.
    pub fn update_decision(&self, args: &[Arg]) -> bool {
        let prev = self.last_args();
        let listeners = self.update_listeners();
        if listeners.is_empty() {
            return diff::changed(args, &prev);
        }

        let mut should = false;
        for listener in listeners {
            should |= listener(self, args, &prev);
        }
        should
    }

    fn update_listeners(&self) -> Vec<UpdateFn> {
        let inner = self.inner.borrow();
        let mut listeners = inner.registry.update_listeners();
        listeners.extend(inner.hook_slots.iter().filter_map(|slot| match &slot.listener {
            Listener::Update(f) => Some(Rc::clone(f)),
            Listener::Lifecycle(_) => None,
        }));
        listeners
    }

    fn invoke_render(&self, args: &[Arg]) -> Result<Node> {
        let (render, hooks_enabled) = {
            let inner = self.inner.borrow();
            (Rc::clone(&inner.render), inner.hooks_enabled)
        };

        if !hooks_enabled {
            return render(self, args);
        }

        // The guard pops the stack on every exit path, including a failing
        // render, so a failure cannot desynchronize unrelated renders.
        let _guard = stack::push(self.clone());
        self.inner.borrow_mut().hook_cursor = 0;
        let node = render(self, args)?;
        self.finish_hook_pass()?;
        Ok(node)
    }

    /// Record one positional hook registration for the current render pass.
    ///
    /// Hook identity is purely positional: the event sequence recorded on
    /// the first render is sealed, and any later render registering a
    /// different event at the same position, or a different number of
    /// hooks, is a protocol violation scoped to that render call.
    pub(crate) fn register_hook(&self, event: Event, listener: Listener) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if !inner.hooks_enabled {
            return Err(Error::Protocol(
                "hook registration on a context without hook support".into(),
            ));
        }

        let index = inner.hook_cursor;
        inner.hook_cursor += 1;

        if let Some(slot) = inner.hook_slots.get_mut(index) {
            if slot.event != event {
                let recorded = slot.event;
                return Err(Error::Protocol(format!(
                    "hook order mismatch at position {index}: recorded {recorded}, got {event}",
                )));
            }
            slot.listener = listener;
            return Ok(());
        }

        if inner.hook_sealed {
            return Err(Error::Protocol(format!(
                "hook count mismatch: a previous render registered {} hooks",
                inner.hook_slots.len(),
            )));
        }

        inner.hook_slots.push(HookSlot { event, listener });
        Ok(())
    }

    fn finish_hook_pass(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.hook_sealed {
            if inner.hook_cursor != inner.hook_slots.len() {
                return Err(Error::Protocol(format!(
                    "hook count mismatch: this render registered {}, previous renders {}",
                    inner.hook_cursor,
                    inner.hook_slots.len(),
                )));
            }
        } else {
            inner.hook_sealed = true;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mount transitions, driven by the external mount detector
    // ------------------------------------------------------------------

    /// Fired once per mount transition, after the output is attached.
    ///
    /// Flips to mounted *before* dispatching, so a listener may re-enter
    /// `render` and take the update path. If the dispatch result is a
    /// hook, it is installed as the one-shot unload handler for this mount
    /// cycle. With the cache behavior active, the attached output is
    /// additionally retained for reuse on a later mount.
    pub fn load(&self) -> Result<()> {
        let (node, args) = {
            let mut inner = self.inner.borrow_mut();
            if inner.mounted {
                return Err(Error::Protocol("load fired while already mounted".into()));
            }
            let node = inner.output.clone().ok_or_else(|| {
                Error::Protocol("load fired before render produced an output".into())
            })?;
            inner.mounted = true;
            if inner.cache_enabled {
                inner.cached = Some(node.clone());
            }
            (node, inner.last_args.clone())
        };

        self.log_event("load", &args);
        if let Some(hook) = self.dispatch(Event::Load, &node, &args) {
            self.inner.borrow_mut().captured_unload = Some(hook);
        }
        Ok(())
    }

    /// Fired once per unmount transition.
    ///
    /// Runs registered `unload` listeners in order, then the one-shot
    /// handler captured by the most recent `load` (which is then
    /// discarded), then clears mount state and output. A cached output
    /// survives for the next mount.
    pub fn unload(&self) -> Result<()> {
        let (node, args) = {
            let inner = self.inner.borrow();
            if !inner.mounted {
                return Err(Error::Protocol("unload fired while unmounted".into()));
            }
            let node = inner.output.clone().ok_or_else(|| {
                Error::Protocol("mounted context has no output".into())
            })?;
            (node, inner.last_args.clone())
        };

        self.log_event("unload", &args);
        self.dispatch(Event::Unload, &node, &args);

        let captured = self.inner.borrow_mut().captured_unload.take();
        if let Some(hook) = captured {
            hook(self, &node, &args);
        }

        {
            let mut inner = self.inner.borrow_mut();
            inner.mounted = false;
            inner.output = None;
        }

        // The unmount is complete; now run post-unload hooks such as spawn
        // key eviction.
        let post = self.inner.borrow().post_unload.clone();
        for hook in post {
            hook(self);
        }
        Ok(())
    }

    /// Fired when the existing output changed position within a parent
    /// collection without a content change. Never fired by `render` or
    /// `update`.
    pub fn afterreorder(&self) -> Result<()> {
        let (node, args) = {
            let inner = self.inner.borrow();
            if !inner.mounted {
                return Err(Error::Protocol("afterreorder fired while unmounted".into()));
            }
            let node = inner.output.clone().ok_or_else(|| {
                Error::Protocol("mounted context has no output".into())
            })?;
            (node, inner.last_args.clone())
        };

        self.log_event("afterreorder", &args);
        self.dispatch(Event::AfterReorder, &node, &args);
        Ok(())
    }

    /// Dispatch a lifecycle event to its listeners in registration order,
    /// followed by positional hook listeners in slot order. Returns the
    /// last executed listener's return value.
    fn dispatch(&self, event: Event, node: &Node, args: &[Arg]) -> Option<UnloadHook> {
        let listeners = {
            let inner = self.inner.borrow();
            let mut listeners = inner.registry.lifecycle_listeners(event);
            listeners.extend(inner.hook_slots.iter().filter_map(|slot| {
                match (&slot.listener, slot.event == event) {
                    (Listener::Lifecycle(f), true) => Some(Rc::clone(f)),
                    _ => None,
                }
            }));
            listeners
        };

        let mut result = None;
        for listener in listeners {
            result = listener(self, node, args);
        }
        result
    }

    // ------------------------------------------------------------------
    // Capabilities attached by plugins
    // ------------------------------------------------------------------

    pub(crate) fn enable_cache(&self) {
        self.inner.borrow_mut().cache_enabled = true;
    }

    /// Attach a logger capability. Lifecycle transitions and render/update
    /// decisions are reported to it from then on.
    pub fn set_logger(&self, logger: Logger) {
        self.inner.borrow_mut().logger = Some(logger);
    }

    /// Whether a logger capability is attached.
    pub fn has_logger(&self) -> bool {
        self.inner.borrow().logger.is_some()
    }

    fn log_event(&self, event: &str, args: &[Arg]) {
        let inner = self.inner.borrow();
        if let Some(logger) = &inner.logger {
            logger.debug(event, args);
        }
    }

    /// Seed the state map if none exists yet.
    pub(crate) fn init_state(&self, initial: IndexMap<String, Value>) {
        let mut inner = self.inner.borrow_mut();
        if inner.state.is_none() {
            inner.state = Some(initial);
        }
    }

    /// The context's free-form state map, if the state store attached one.
    pub fn state(&self) -> Option<IndexMap<String, Value>> {
        self.inner.borrow().state.clone()
    }

    /// Look up a single state entry.
    pub fn state_value(&self, key: &str) -> Option<Value> {
        self.inner
            .borrow()
            .state
            .as_ref()
            .and_then(|state| state.get(key).cloned())
    }

    /// Shallow-merge `partial` into the state map, then re-render with the
    /// last-known arguments.
    ///
    /// Fails with a `Configuration` error unless `partial` is object-shaped
    /// (`Value::Map`).
    pub fn restate(&self, partial: Value) -> Result<Node> {
        let Value::Map(partial) = partial else {
            return Err(Error::Configuration(
                "restate requires an object-shaped value".into(),
            ));
        };

        {
            let mut inner = self.inner.borrow_mut();
            let state = inner.state.get_or_insert_with(IndexMap::new);
            for (key, value) in partial {
                state.insert(key, value);
            }
        }
        self.rerender()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Context")
            .field("name", &inner.name)
            .field("id", &inner.id)
            .field("mounted", &inner.mounted)
            .field("has_output", &inner.output.is_some())
            .field("has_cached", &inner.cached.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn greeting() -> RenderFn {
        Rc::new(|_, args| {
            let name = match args.first() {
                Some(Arg::Value(Value::Str(s))) => s.clone(),
                _ => String::new(),
            };
            Ok(Node::new(format!("<h1>Hello {name}!</h1>")))
        })
    }

    #[test]
    fn empty_name_is_a_configuration_error() {
        let err = Context::new("", greeting()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn fresh_render_records_output_and_args() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        let node = ctx.render(&[Arg::from("world")]).unwrap();

        assert_eq!(node.payload(), "<h1>Hello world!</h1>");
        assert_eq!(ctx.output().unwrap(), node);
        assert_eq!(ctx.last_args().len(), 1);
        assert!(!ctx.is_mounted());
    }

    #[test]
    fn mounted_render_with_same_args_reuses_output() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        let first = ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();

        let second = ctx.render(&[Arg::from("world")]).unwrap();
        let third = ctx.render(&[Arg::from("world")]).unwrap();

        assert!(first.same_node(&second));
        assert!(first.same_node(&third));
    }

    #[test]
    fn mounted_render_with_new_args_produces_new_output() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        let first = ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();

        let second = ctx.render(&[Arg::from("Jane")]).unwrap();
        assert!(!first.same_node(&second));
        assert_eq!(second.payload(), "<h1>Hello Jane!</h1>");
    }

    #[test]
    fn update_false_leaves_last_args_untouched() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();

        ctx.on_update(|_, _, _| false);
        ctx.render(&[Arg::from("Jane")]).unwrap();

        let last = ctx.last_args();
        assert!(!last[0].differs_from(&Arg::from("world")));
    }

    #[test]
    fn update_aggregates_by_or_and_runs_all_listeners() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();

        let runs = Rc::new(Cell::new(0));
        for decision in [false, true, false] {
            let runs = runs.clone();
            ctx.on_update(move |_, _, _| {
                runs.set(runs.get() + 1);
                decision
            });
        }

        assert!(ctx.update_decision(&[Arg::from("world")]));
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn lifecycle_dispatch_returns_last_listener_result() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["L1", "L2", "L3"] {
            let order = order.clone();
            ctx.on(Event::Load, move |_, _, _| {
                order.borrow_mut().push(tag);
                // Only the last listener's capture survives the dispatch.
                if tag == "L3" {
                    Some(Box::new(move |_: &Context, _: &Node, _: &[Arg]| {})
                        as UnloadHook)
                } else {
                    None
                }
            })
            .unwrap();
        }

        ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();

        assert_eq!(*order.borrow(), vec!["L1", "L2", "L3"]);
        assert!(ctx.inner.borrow().captured_unload.is_some());
    }

    #[test]
    fn load_capture_is_invoked_once_by_unload() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        let torn_down = Rc::new(Cell::new(0));

        let counter = torn_down.clone();
        ctx.on(Event::Load, move |_, _, _| {
            let counter = counter.clone();
            Some(Box::new(move |_: &Context, _: &Node, _: &[Arg]| {
                counter.set(counter.get() + 1);
            }) as UnloadHook)
        })
        .unwrap();

        ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();
        ctx.unload().unwrap();
        assert_eq!(torn_down.get(), 1);

        // Second mount cycle without a new capture consumer: the old hook
        // is gone, the new one fires again.
        ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();
        ctx.unload().unwrap();
        assert_eq!(torn_down.get(), 2);
    }

    #[test]
    fn out_of_phase_transitions_are_protocol_errors() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        assert!(matches!(ctx.load(), Err(Error::Protocol(_))));
        assert!(matches!(ctx.unload(), Err(Error::Protocol(_))));
        assert!(matches!(ctx.afterreorder(), Err(Error::Protocol(_))));

        ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();
        assert!(matches!(ctx.load(), Err(Error::Protocol(_))));
    }

    #[test]
    fn rerender_before_initial_render_is_a_protocol_error() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        assert!(matches!(ctx.rerender(), Err(Error::Protocol(_))));
    }

    #[test]
    fn rerender_forces_update_while_mounted() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        ctx.on_update(|_, _, _| false);

        let first = ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();

        // A plain render is vetoed by the update listener, a rerender is not.
        let vetoed = ctx.render(&[Arg::from("world")]).unwrap();
        assert!(first.same_node(&vetoed));
        let forced = ctx.rerender().unwrap();
        assert!(!first.same_node(&forced));
    }

    #[test]
    fn restate_requires_object_shaped_value() {
        let ctx = Context::new("greeting", greeting()).unwrap();
        ctx.render(&[Arg::from("world")]).unwrap();

        let err = ctx.restate(Value::Str("oops".into())).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn restate_merges_shallowly_and_rerenders() {
        let ctx = Context::new("counter", Rc::new(|ctx: &Context, _: &[Arg]| {
            let count = match ctx.state_value("count") {
                Some(Value::Int(n)) => n,
                _ => 0,
            };
            Ok(Node::new(format!("count={count}")))
        }))
        .unwrap();

        let mut initial = IndexMap::new();
        initial.insert("count".to_owned(), Value::Int(1));
        ctx.init_state(initial);

        let first = ctx.render(&[]).unwrap();
        assert_eq!(first.payload(), "count=1");

        let mut partial = IndexMap::new();
        partial.insert("count".to_owned(), Value::Int(2));
        let second = ctx.restate(Value::Map(partial)).unwrap();
        assert_eq!(second.payload(), "count=2");
    }

    #[test]
    fn listener_may_reenter_render_during_load() {
        // Mirrors the lifecycle scenario from the original browser suite:
        // a load listener immediately renders with new arguments and takes
        // the update path, because load flips the mount state first.
        let ctx = Context::new("greeting", greeting()).unwrap();
        let updated = Rc::new(Cell::new(false));

        {
            let updated = updated.clone();
            ctx.on(Event::AfterUpdate, move |_, _, _| {
                updated.set(true);
                None
            })
            .unwrap();
        }
        {
            let reenter = ctx.clone();
            ctx.on(Event::Load, move |_, _, _| {
                reenter.render(&[Arg::from("Jane")]).unwrap();
                None
            })
            .unwrap();
        }

        ctx.render(&[Arg::from("world")]).unwrap();
        ctx.load().unwrap();

        assert!(updated.get());
        assert_eq!(ctx.output().unwrap().payload(), "<h1>Hello Jane!</h1>");
    }
}
