//! Output Nodes
//!
//! A `Node` is the opaque artifact a render function produces. The engine
//! never inspects it: an external templating engine builds it and an
//! external mount detector attaches it to a live structure. All the engine
//! needs is a stable identity, so that "is this the same underlying output"
//! can be answered when diffing arguments and when deciding whether a
//! mounted context may keep its current output.
//!
//! The payload is an uninterpreted string standing in for whatever the
//! templating engine produced. Equality between nodes is identity, never
//! content.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an output node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

struct NodeInner {
    id: NodeId,
    payload: String,
}

/// An opaque output artifact with process-unique identity.
///
/// Nodes are cheap to clone; clones share the same underlying artifact and
/// compare equal to each other.
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

impl Node {
    /// Wrap a produced artifact in a new node with a fresh identity.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                id: NodeId::new(),
                payload: payload.into(),
            }),
        }
    }

    /// The node's unique ID.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// The uninterpreted payload handed over by the templating engine.
    pub fn payload(&self) -> &str {
        &self.inner.payload
    }

    /// Whether `other` refers to the same underlying output artifact.
    pub fn same_node(&self, other: &Node) -> bool {
        self.inner.id == other.inner.id
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.same_node(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.inner.id)
            .field("payload", &self.inner.payload)
            .finish()
    }
}
