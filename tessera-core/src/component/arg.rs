//! Render Arguments
//!
//! Render functions receive an ordered list of arguments. The update
//! decision engine needs to compare two such lists, and different kinds of
//! argument carry different notions of "same":
//!
//! - plain values compare by strict value equality
//! - output nodes compare by identity (same underlying artifact)
//! - callbacks compare by the textual representation of their source
//!
//! The `Arg` enum makes each argument carry its own equality capability,
//! rather than inferring it from ad hoc type inspection.
//!
//! # Callback equality caveat
//!
//! Comparing callbacks by source text means two distinct closures with
//! identical source text are judged equal. This is a deliberate carry-over:
//! it tolerates callbacks re-allocated inline on every call, at the cost of
//! missing a swap between two textually identical closures that capture
//! different environments. Callers that need exact callback identity should
//! give each callback a distinguishing source label.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::node::Node;

/// A plain argument value, compared by strict equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An object-shaped mapping. Also the required shape for component
    /// state managed by the restate plugin.
    Map(IndexMap<String, Value>),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

/// A callable argument.
///
/// Carries the callable itself plus a source-text label used for equality
/// (see the module docs for the caveat this implies).
#[derive(Clone)]
pub struct Callback {
    source: Rc<str>,
    f: Rc<dyn Fn(&[Arg])>,
}

impl Callback {
    /// Create a callback from its source label and callable.
    pub fn new(source: impl Into<String>, f: impl Fn(&[Arg]) + 'static) -> Self {
        Self {
            source: source.into().into(),
            f: Rc::new(f),
        }
    }

    /// Invoke the callback.
    pub fn call(&self, args: &[Arg]) {
        (self.f)(args)
    }

    /// The textual representation this callback is compared by.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("source", &self.source)
            .finish()
    }
}

/// One render argument, carrying its own equality capability.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Compared by strict value equality.
    Value(Value),
    /// Compared by output identity.
    Node(Node),
    /// Compared by source text.
    Callback(Callback),
}

impl Arg {
    /// Whether this argument differs from `other` for update purposes.
    ///
    /// Arguments of different kinds always differ.
    pub fn differs_from(&self, other: &Arg) -> bool {
        match (self, other) {
            (Arg::Node(a), Arg::Node(b)) => !a.same_node(b),
            (Arg::Callback(a), Arg::Callback(b)) => a.source() != b.source(),
            (Arg::Value(a), Arg::Value(b)) => a != b,
            _ => true,
        }
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Value(v.into())
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Value(v.into())
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Value(v.into())
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Value(v.into())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Value(v.into())
    }
}

impl From<Node> for Arg {
    fn from(v: Node) -> Self {
        Arg::Node(v)
    }
}

impl From<Callback> for Arg {
    fn from(v: Callback) -> Self {
        Arg::Callback(v)
    }
}

/// An ordered argument list. Argument lists are typically short, so small
/// lists live inline.
pub type ArgList = SmallVec<[Arg; 4]>;
