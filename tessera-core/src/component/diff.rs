//! Update Decision Engine
//!
//! The default algorithm deciding, from two argument lists, whether a
//! mounted component needs to re-render. A context uses it whenever no
//! custom `update` listener is registered.
//!
//! # Algorithm
//!
//! 1. Lists of different lengths always require an update, regardless of
//!    content.
//!
//! 2. Otherwise compare pairwise by index, each argument using its own
//!    equality capability (see `Arg::differs_from`): output nodes by
//!    identity, callbacks by source text, plain values by strict equality.
//!
//! 3. Any differing pair requires an update.

use super::arg::Arg;

/// Whether `new_args` differs from `prev_args` enough to warrant a
/// re-render.
pub fn changed(new_args: &[Arg], prev_args: &[Arg]) -> bool {
    if new_args.len() != prev_args.len() {
        return true;
    }

    new_args
        .iter()
        .zip(prev_args.iter())
        .any(|(new, prev)| new.differs_from(prev))
}
