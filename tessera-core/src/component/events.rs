//! Event Registry
//!
//! Each context owns a registry mapping a fixed set of lifecycle event
//! names to an ordered list of listeners. Registration order is the
//! dispatch order; duplicates are allowed. Removing the last listener for
//! an event removes the entry entirely, so dispatching that event becomes
//! a no-op again.
//!
//! Two listener shapes exist:
//!
//! - lifecycle listeners receive `(context, output, args)` and may return a
//!   one-shot hook. The dispatch result is whatever the *last* executed
//!   listener returned; earlier returns are discarded.
//!
//! - `update` listeners receive `(context, new_args, prev_args)` and return
//!   a boolean. The aggregate decision is the logical OR of every
//!   listener's result; all listeners always run, so any listener
//!   requesting an update wins regardless of position.
//!
//! The registry only stores listeners. Dispatch lives on the context, which
//! clones the relevant listener list out of the registry before invoking
//! anything, so a listener is free to re-enter the context (for example by
//! calling `render` from inside `load`).

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::arg::Arg;
use super::node::Node;
use crate::Context;

/// The fixed set of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Load,
    Unload,
    BeforeRender,
    Update,
    AfterUpdate,
    AfterReorder,
}

impl Event {
    /// The event's wire name, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Load => "load",
            Event::Unload => "unload",
            Event::BeforeRender => "beforerender",
            Event::Update => "update",
            Event::AfterUpdate => "afterupdate",
            Event::AfterReorder => "afterreorder",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unique identifier for a registered listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// A one-shot hook captured by a `load` dispatch and consumed by the next
/// `unload` of the same mount cycle.
pub type UnloadHook = Box<dyn FnOnce(&Context, &Node, &[Arg])>;

/// A lifecycle listener. Returning `Some` from a `load` listener installs
/// the returned hook as the one-shot unload handler for this mount cycle.
pub type LifecycleFn = Rc<dyn Fn(&Context, &Node, &[Arg]) -> Option<UnloadHook>>;

/// An update listener, replacing the default diff when registered.
pub type UpdateFn = Rc<dyn Fn(&Context, &[Arg], &[Arg]) -> bool>;

/// A registered listener of either shape.
#[derive(Clone)]
pub(crate) enum Listener {
    Lifecycle(LifecycleFn),
    Update(UpdateFn),
}

/// Per-context mapping of event to ordered listener list.
#[derive(Clone, Default)]
pub(crate) struct EventRegistry {
    entries: IndexMap<Event, Vec<(ListenerId, Listener)>>,
}

impl EventRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a lifecycle listener for a non-`update` event.
    pub(crate) fn add_lifecycle(&mut self, event: Event, listener: LifecycleFn) -> ListenerId {
        debug_assert_ne!(event, Event::Update, "update listeners have their own shape");
        let id = ListenerId::new();
        self.entries
            .entry(event)
            .or_default()
            .push((id, Listener::Lifecycle(listener)));
        id
    }

    /// Append an `update` listener.
    pub(crate) fn add_update(&mut self, listener: UpdateFn) -> ListenerId {
        let id = ListenerId::new();
        self.entries
            .entry(Event::Update)
            .or_default()
            .push((id, Listener::Update(listener)));
        id
    }

    /// Remove a listener by ID. Returns whether anything was removed.
    ///
    /// Removing the last listener for an event drops the event's entry, so
    /// subsequent dispatches of that event are no-ops.
    pub(crate) fn remove(&mut self, event: Event, id: ListenerId) -> bool {
        let Some(listeners) = self.entries.get_mut(&event) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            self.entries.shift_remove(&event);
        }
        removed
    }

    /// Clone out the lifecycle listeners for an event, in registration order.
    pub(crate) fn lifecycle_listeners(&self, event: Event) -> Vec<LifecycleFn> {
        self.entries
            .get(&event)
            .map(|listeners| {
                listeners
                    .iter()
                    .filter_map(|(_, l)| match l {
                        Listener::Lifecycle(f) => Some(Rc::clone(f)),
                        Listener::Update(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Clone out the `update` listeners, in registration order.
    pub(crate) fn update_listeners(&self) -> Vec<UpdateFn> {
        self.entries
            .get(&Event::Update)
            .map(|listeners| {
                listeners
                    .iter()
                    .filter_map(|(_, l)| match l {
                        Listener::Update(f) => Some(Rc::clone(f)),
                        Listener::Lifecycle(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether any listener is registered for the event.
    #[cfg(test)]
    pub(crate) fn has(&self, event: Event) -> bool {
        self.entries.contains_key(&event)
    }

    /// Snapshot copy of the full registry.
    ///
    /// The copy shares listener callables but not the lists themselves:
    /// later registrations or removals on either side are not mirrored to
    /// the other.
    pub(crate) fn snapshot(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> LifecycleFn {
        Rc::new(|_, _, _| None)
    }

    #[test]
    fn registration_preserves_order_and_duplicates() {
        let mut registry = EventRegistry::new();
        let f = noop();
        registry.add_lifecycle(Event::Load, Rc::clone(&f));
        registry.add_lifecycle(Event::Load, Rc::clone(&f));
        registry.add_lifecycle(Event::Load, f);

        assert_eq!(registry.lifecycle_listeners(Event::Load).len(), 3);
    }

    #[test]
    fn removing_last_listener_removes_entry() {
        let mut registry = EventRegistry::new();
        let id = registry.add_lifecycle(Event::Unload, noop());

        assert!(registry.has(Event::Unload));
        assert!(registry.remove(Event::Unload, id));
        assert!(!registry.has(Event::Unload));
        assert!(registry.lifecycle_listeners(Event::Unload).is_empty());

        // Removing again is a no-op.
        assert!(!registry.remove(Event::Unload, id));
    }

    #[test]
    fn remove_targets_one_listener_only() {
        let mut registry = EventRegistry::new();
        let first = registry.add_lifecycle(Event::Load, noop());
        let _second = registry.add_lifecycle(Event::Load, noop());

        assert!(registry.remove(Event::Load, first));
        assert!(registry.has(Event::Load));
        assert_eq!(registry.lifecycle_listeners(Event::Load).len(), 1);
    }

    #[test]
    fn snapshot_is_not_a_live_link() {
        let mut registry = EventRegistry::new();
        registry.add_lifecycle(Event::Load, noop());

        let mut copy = registry.snapshot();
        copy.add_lifecycle(Event::Load, noop());
        copy.add_update(Rc::new(|_, _, _| true));

        assert_eq!(registry.lifecycle_listeners(Event::Load).len(), 1);
        assert_eq!(copy.lifecycle_listeners(Event::Load).len(), 2);
        assert!(registry.update_listeners().is_empty());
        assert_eq!(copy.update_listeners().len(), 1);
    }

    #[test]
    fn update_listeners_are_kept_apart_from_lifecycle() {
        let mut registry = EventRegistry::new();
        registry.add_update(Rc::new(|_, _, _| false));

        assert!(registry.has(Event::Update));
        assert!(registry.lifecycle_listeners(Event::Update).is_empty());
        assert_eq!(registry.update_listeners().len(), 1);
    }
}
