//! Spawn Registry
//!
//! Lets one declared component back unboundedly many independent
//! lifecycles. The plugin derives a key from the call arguments via an
//! identity function and substitutes a per-key context for the declared
//! one, creating it on first use:
//!
//! - the spawned context is named `<source>_<key>` and shares the source's
//!   render function;
//!
//! - every listener registered on the source *at spawn time* is copied
//!   onto the new context (a snapshot, not a live link);
//!
//! - unless persistence is requested for the key, the key is freed again
//!   once the spawned context's unload dispatch completes, so a later
//!   render with the same key yields a brand-new instance.
//!
//! The backing store defaults to an insertion-ordered map and is pluggable
//! through [`SpawnStore`], e.g. to bound the number of live contexts with
//! an evicting store.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::component::{Arg, Context, Plugin};
use crate::error::{Error, Result};

/// Uniform get/set/remove capability over the key-to-context cache.
pub trait SpawnStore {
    /// Look up the live context for a key.
    fn get(&self, key: &str) -> Option<Context>;

    /// Insert a freshly spawned context under its key.
    ///
    /// At most one live context exists per key; the engine only inserts
    /// after a miss.
    fn insert(&mut self, key: String, ctx: Context);

    /// Remove a key, freeing it for reuse.
    fn remove(&mut self, key: &str) -> Option<Context>;

    /// Number of live contexts.
    fn len(&self) -> usize;

    /// Whether the store holds no live contexts.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The default backing store: a plain insertion-ordered map.
#[derive(Default)]
pub struct MapStore {
    entries: IndexMap<String, Context>,
}

impl SpawnStore for MapStore {
    fn get(&self, key: &str) -> Option<Context> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: String, ctx: Context) {
        self.entries.insert(key, ctx);
    }

    fn remove(&mut self, key: &str) -> Option<Context> {
        self.entries.shift_remove(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

struct SpawnInner {
    identity: Box<dyn Fn(&[Arg]) -> String>,
    store: RefCell<Box<dyn SpawnStore>>,
    persist: RefCell<Option<Box<dyn Fn(&str) -> bool>>>,
}

/// Per-key context multiplexer.
///
/// Build one with an identity function, optionally customize the store and
/// persistence, then install [`Spawn::plugin`] on a component. The handle
/// stays useful afterwards: it exposes the live contexts so the external
/// mount detector can drive their lifecycles.
pub struct Spawn {
    inner: Rc<SpawnInner>,
}

impl Spawn {
    /// Create a multiplexer deriving keys with `identity`.
    pub fn new(identity: impl Fn(&[Arg]) -> String + 'static) -> Self {
        Self {
            inner: Rc::new(SpawnInner {
                identity: Box::new(identity),
                store: RefCell::new(Box::<MapStore>::default()),
                persist: RefCell::new(None),
            }),
        }
    }

    /// Replace the backing store.
    ///
    /// Intended for setup, before any context was spawned; live contexts in
    /// the previous store are discarded.
    pub fn with_store(self, store: impl SpawnStore + 'static) -> Self {
        *self.inner.store.borrow_mut() = Box::new(store);
        self
    }

    /// Keep contexts whose key matches the predicate alive across unload
    /// instead of evicting them.
    pub fn persist_when(self, predicate: impl Fn(&str) -> bool + 'static) -> Self {
        *self.inner.persist.borrow_mut() = Some(Box::new(predicate));
        self
    }

    /// Build the pipeline stage substituting per-key contexts.
    pub fn plugin(&self) -> Plugin {
        let inner = Rc::clone(&self.inner);
        Rc::new(move |source, args| {
            let ctx = spawn_context(&inner, source, args)?;
            Ok(Some(ctx))
        })
    }

    /// The live context for a key, if any.
    pub fn context(&self, key: &str) -> Option<Context> {
        self.inner.store.borrow().get(key)
    }

    /// Number of live contexts.
    pub fn len(&self) -> usize {
        self.inner.store.borrow().len()
    }

    /// Whether no context is currently live.
    pub fn is_empty(&self) -> bool {
        self.inner.store.borrow().is_empty()
    }
}

fn spawn_context(inner: &Rc<SpawnInner>, source: &Context, args: &[Arg]) -> Result<Context> {
    let key = (inner.identity)(args);
    if key.is_empty() {
        return Err(Error::Identity(
            "identity function returned an empty key".into(),
        ));
    }

    if let Some(existing) = inner.store.borrow().get(&key) {
        return Ok(existing);
    }

    let name = format!("{}_{}", source.name(), key);
    let ctx = Context::with_parts(
        &name,
        source.render_fn(),
        source.registry_snapshot(),
        source.hooks_enabled(),
    )?;

    let persist = inner
        .persist
        .borrow()
        .as_ref()
        .map(|predicate| predicate(&key))
        .unwrap_or(false);
    if !persist {
        // Free the key only once this context's own unload dispatch has
        // completed. The weak reference keeps the spawned context from
        // keeping the whole registry alive.
        let registry = Rc::downgrade(inner);
        let evict_key = key.clone();
        ctx.on_unloaded(Rc::new(move |_ctx| {
            if let Some(registry) = Weak::upgrade(&registry) {
                registry.store.borrow_mut().remove(&evict_key);
            }
        }));
    }

    inner.store.borrow_mut().insert(key, ctx.clone());
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, Node, Value};
    use std::cell::Cell;

    fn keyed_greeting() -> Component {
        Component::new("greeting", |_, args| {
            let who = match args.first() {
                Some(Arg::Value(Value::Str(s))) => s.clone(),
                _ => String::new(),
            };
            Ok(Node::new(format!("<h1>Hello {who}!</h1>")))
        })
        .unwrap()
    }

    fn first_string(args: &[Arg]) -> String {
        match args.first() {
            Some(Arg::Value(Value::Str(s))) => s.clone(),
            _ => String::new(),
        }
    }

    #[test]
    fn distinct_keys_spawn_distinct_contexts() {
        let component = keyed_greeting();
        let spawn = Spawn::new(first_string);
        component.use_plugin(spawn.plugin());

        component.render(&[Arg::from("alice")]).unwrap();
        component.render(&[Arg::from("bob")]).unwrap();

        assert_eq!(spawn.len(), 2);
        let alice = spawn.context("alice").unwrap();
        let bob = spawn.context("bob").unwrap();
        assert_ne!(alice.id(), bob.id());
        assert_eq!(alice.name(), "greeting_alice");
        assert_eq!(bob.name(), "greeting_bob");
    }

    #[test]
    fn same_key_returns_the_same_live_context() {
        let component = keyed_greeting();
        let spawn = Spawn::new(first_string);
        component.use_plugin(spawn.plugin());

        let first = component.render(&[Arg::from("alice")]).unwrap();
        let id = spawn.context("alice").unwrap().id();

        let second = component.render(&[Arg::from("alice")]).unwrap();
        assert_eq!(spawn.context("alice").unwrap().id(), id);
        assert_eq!(spawn.len(), 1);
        // Unmounted renders regenerate output, but on the same instance.
        assert!(!first.same_node(&second));
    }

    #[test]
    fn empty_key_is_an_identity_error() {
        let component = keyed_greeting();
        let spawn = Spawn::new(|_| String::new());
        component.use_plugin(spawn.plugin());

        let err = component.render(&[Arg::from("alice")]).unwrap_err();
        assert!(matches!(err, Error::Identity(_)));
        assert!(spawn.is_empty());
    }

    #[test]
    fn unload_evicts_the_key_for_a_fresh_spawn() {
        let component = keyed_greeting();
        let spawn = Spawn::new(first_string);
        component.use_plugin(spawn.plugin());

        component.render(&[Arg::from("alice")]).unwrap();
        let first = spawn.context("alice").unwrap();
        first.load().unwrap();
        first.unload().unwrap();

        assert!(spawn.context("alice").is_none());

        component.render(&[Arg::from("alice")]).unwrap();
        let second = spawn.context("alice").unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn persisted_keys_survive_unload() {
        let component = keyed_greeting();
        let spawn = Spawn::new(first_string).persist_when(|key| key == "alice");
        component.use_plugin(spawn.plugin());

        component.render(&[Arg::from("alice")]).unwrap();
        component.render(&[Arg::from("bob")]).unwrap();

        for key in ["alice", "bob"] {
            let ctx = spawn.context(key).unwrap();
            ctx.load().unwrap();
            ctx.unload().unwrap();
        }

        assert!(spawn.context("alice").is_some());
        assert!(spawn.context("bob").is_none());
    }

    #[test]
    fn spawned_contexts_copy_source_listeners_at_spawn_time() {
        let component = keyed_greeting();
        let spawn = Spawn::new(first_string);
        component.use_plugin(spawn.plugin());

        let loads = Rc::new(Cell::new(0));
        {
            let loads = loads.clone();
            component.on_load(move |_, _, _| {
                loads.set(loads.get() + 1);
                None
            });
        }

        component.render(&[Arg::from("alice")]).unwrap();
        spawn.context("alice").unwrap().load().unwrap();
        assert_eq!(loads.get(), 1);

        // A listener registered after a context was spawned is not copied
        // onto that existing context.
        let late = Rc::new(Cell::new(0));
        {
            let late = late.clone();
            component.on_load(move |_, _, _| {
                late.set(late.get() + 1);
                None
            });
        }
        component.render(&[Arg::from("bob")]).unwrap();
        spawn.context("bob").unwrap().load().unwrap();
        assert_eq!(late.get(), 1);
        assert_eq!(loads.get(), 2);

        let alice = spawn.context("alice").unwrap();
        alice.unload().unwrap();
    }

    #[test]
    fn custom_store_is_consulted() {
        struct CountingStore {
            inner: MapStore,
            hits: Rc<Cell<usize>>,
        }

        impl SpawnStore for CountingStore {
            fn get(&self, key: &str) -> Option<Context> {
                self.hits.set(self.hits.get() + 1);
                self.inner.get(key)
            }

            fn insert(&mut self, key: String, ctx: Context) {
                self.inner.insert(key, ctx);
            }

            fn remove(&mut self, key: &str) -> Option<Context> {
                self.inner.remove(key)
            }

            fn len(&self) -> usize {
                self.inner.len()
            }
        }

        let hits = Rc::new(Cell::new(0));
        let component = keyed_greeting();
        let spawn = Spawn::new(first_string).with_store(CountingStore {
            inner: MapStore::default(),
            hits: hits.clone(),
        });
        component.use_plugin(spawn.plugin());

        component.render(&[Arg::from("alice")]).unwrap();
        component.render(&[Arg::from("alice")]).unwrap();
        assert!(hits.get() >= 2);
        assert_eq!(spawn.len(), 1);
    }
}
