//! State Store
//!
//! Attaches a free-form state map to a context and a `restate` capability
//! for updating it. `restate(partial)` shallow-merges an object-shaped
//! value into the state and re-renders the component with its last-known
//! arguments, so render functions can read their own state without the
//! caller threading it through.
//!
//! The initial state must be object-shaped (`Value::Map`); anything else
//! is a configuration error at setup time, mirroring the same requirement
//! on every `restate` call.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::component::{Plugin, Value};
use crate::error::{Error, Result};

/// Build the state store pipeline stage, seeding state with `initial`.
///
/// A context that already carries state keeps it; the seed only applies to
/// contexts passing through the pipeline for the first time, including
/// contexts substituted by a spawn registry further up the pipeline.
pub fn restate(initial: Value) -> Result<Plugin> {
    let Value::Map(initial) = initial else {
        return Err(Error::Configuration(
            "initial state must be an object-shaped value".into(),
        ));
    };

    Ok(Rc::new(move |ctx, _args| {
        ctx.init_state(initial.clone());
        Ok(Some(ctx.clone()))
    }))
}

/// Convenience constructor for object-shaped values.
pub fn state_of<const N: usize>(entries: [(&str, Value); N]) -> Value {
    let mut map = IndexMap::new();
    for (key, value) in entries {
        map.insert(key.to_owned(), value);
    }
    Value::Map(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Arg, Component, Node};

    fn counter() -> Component {
        Component::new("counter", |ctx, _| {
            let count = match ctx.state_value("count") {
                Some(Value::Int(n)) => n,
                _ => 0,
            };
            Ok(Node::new(format!("<span>{count}</span>")))
        })
        .unwrap()
    }

    #[test]
    fn non_map_initial_state_is_a_configuration_error() {
        assert!(matches!(
            restate(Value::Int(1)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn state_is_seeded_once() {
        let component = counter();
        component.use_plugin(restate(state_of([("count", Value::Int(3))])).unwrap());

        let node = component.render(&[]).unwrap();
        assert_eq!(node.payload(), "<span>3</span>");

        // A later pipeline pass does not reset existing state.
        component
            .context()
            .restate(state_of([("count", Value::Int(7))]))
            .unwrap();
        let node = component.render(&[]).unwrap();
        assert_eq!(node.payload(), "<span>7</span>");
    }

    #[test]
    fn restate_rerenders_with_last_args() {
        let component = Component::new("greeting", |ctx, args| {
            let who = match args.first() {
                Some(Arg::Value(Value::Str(s))) => s.clone(),
                _ => String::new(),
            };
            let mood = match ctx.state_value("mood") {
                Some(Value::Str(s)) => s,
                _ => "calm".to_owned(),
            };
            Ok(Node::new(format!("{who} is {mood}")))
        })
        .unwrap();
        component.use_plugin(restate(state_of([])).unwrap());

        let first = component.render(&[Arg::from("Jane")]).unwrap();
        assert_eq!(first.payload(), "Jane is calm");
        component.context().load().unwrap();

        let second = component
            .context()
            .restate(state_of([("mood", Value::Str("thrilled".into()))]))
            .unwrap();
        assert_eq!(second.payload(), "Jane is thrilled");
        assert!(!first.same_node(&second));
    }

    #[test]
    fn merge_is_shallow() {
        let component = counter();
        component.use_plugin(
            restate(state_of([
                ("count", Value::Int(1)),
                ("label", Value::Str("clicks".into())),
            ]))
            .unwrap(),
        );

        component.render(&[]).unwrap();
        component
            .context()
            .restate(state_of([("count", Value::Int(2))]))
            .unwrap();

        // Untouched keys survive the merge.
        assert_eq!(
            component.context().state_value("label"),
            Some(Value::Str("clicks".into()))
        );
        assert_eq!(
            component.context().state_value("count"),
            Some(Value::Int(2))
        );
    }
}
