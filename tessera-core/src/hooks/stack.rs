//! Render Stack
//!
//! The hook registration idiom needs to know which context is currently
//! executing its render function. Each thread keeps its own stack:
//! entering a hook-enabled render pushes the context, leaving pops it.
//!
//! The pop happens in a drop guard so it runs on every exit path,
//! including a failing render. A missed pop would permanently
//! desynchronize the stack and corrupt subsequent, unrelated renders,
//! which is why this is never done manually.
//!
//! The stack supports nesting: a component rendered from inside another
//! component's render function targets its own hooks correctly.

use std::cell::RefCell;

use crate::component::{Context, ContextId};

thread_local! {
    static RENDER_STACK: RefCell<Vec<Context>> = RefCell::new(Vec::new());
}

/// Guard that pops the render stack when dropped.
pub(crate) struct StackGuard {
    id: ContextId,
}

/// Push a context as the currently rendering one.
///
/// The context is popped again when the returned guard is dropped.
pub(crate) fn push(ctx: Context) -> StackGuard {
    let id = ctx.id();
    RENDER_STACK.with(|stack| stack.borrow_mut().push(ctx));
    StackGuard { id }
}

/// The context currently at the top of the stack, if any.
pub(crate) fn current() -> Option<Context> {
    RENDER_STACK.with(|stack| stack.borrow().last().cloned())
}

/// Current stack depth.
#[cfg(test)]
pub(crate) fn depth() -> usize {
    RENDER_STACK.with(|stack| stack.borrow().len())
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RENDER_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Catch mismatched pushes and pops early.
            if let Some(ctx) = popped {
                debug_assert_eq!(
                    ctx.id(),
                    self.id,
                    "render stack mismatch: expected {:?}, got {:?}",
                    self.id,
                    ctx.id()
                );
            }
        });
    }
}
