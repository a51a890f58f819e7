//! Cache Behavior
//!
//! Avoids destroying and recreating expensive outputs across
//! unmount/remount cycles, for example outputs wrapping externally
//! initialized resources.
//!
//! The plugin enables output retention on the context it receives. From
//! then on:
//!
//! - on a successful `load`, the attached output is additionally saved as
//!   the cached output, and it survives the subsequent `unload`;
//!
//! - on a render while detached, the cached output is returned immediately
//!   without invoking the render function. Custom `update` listeners still
//!   see the new arguments so internal state stays current, but nothing
//!   becomes visible until reattachment drives an update.

use std::rc::Rc;

use crate::component::Plugin;

/// Build the cache pipeline stage.
pub fn cache() -> Plugin {
    Rc::new(|ctx, _args| {
        ctx.enable_cache();
        Ok(Some(ctx.clone()))
    })
}
