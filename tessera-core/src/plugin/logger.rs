//! Lifecycle Logging
//!
//! Attaches a [`Logger`] capability to a context. The context holds the
//! logger by composition and reports every lifecycle transition and
//! render/update decision to it; the logger forwards them as `tracing`
//! debug events carrying the component name, the event name, and an
//! argument summary.
//!
//! Install the plugin after stages that substitute contexts (such as a
//! spawn registry): each substituted context then gets its own logger
//! carrying its own name.

use std::rc::Rc;

use crate::component::{Arg, Plugin};

/// Log sink for one context's lifecycle events.
#[derive(Debug, Clone)]
pub struct Logger {
    component: String,
}

impl Logger {
    /// Create a logger reporting under the given component name.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Report a lifecycle event with its arguments.
    pub fn debug(&self, event: &str, args: &[Arg]) {
        tracing::debug!(
            target: "tessera::lifecycle",
            component = %self.component,
            event,
            args = ?args,
        );
    }
}

/// Build the logging pipeline stage.
pub fn logger() -> Plugin {
    Rc::new(|ctx, _args| {
        if !ctx.has_logger() {
            ctx.set_logger(Logger::new(ctx.name()));
        }
        Ok(Some(ctx.clone()))
    })
}
