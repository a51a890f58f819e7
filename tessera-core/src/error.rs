//! Error Taxonomy
//!
//! Every failure in the engine falls into one of three classes:
//!
//! - `Configuration`: invalid setup input (empty component name, non-map
//!   initial state). Raised synchronously at setup or spawn time.
//!
//! - `Protocol`: a programming defect in how the engine is driven, such as
//!   a plugin stage that fails to produce a context, a lifecycle event
//!   fired out of phase, or a hook registration sequence that differs
//!   between two renders of the same context.
//!
//! - `Identity`: a spawn identity function produced an unusable key.
//!
//! All three are fatal to the call that triggered them. Errors propagate
//! synchronously through the offending `render`/`spawn`/configuration call;
//! there is no internal recovery or retry path, and no error is swallowed.

use thiserror::Error;

/// Errors raised by the component engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid setup input, detected before any lifecycle work happens.
    #[error("configuration: {0}")]
    Configuration(String),

    /// The engine was driven in a way that violates its contract.
    ///
    /// These indicate a programming defect, not a transient condition,
    /// and are never retried.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// A spawn identity function returned an empty key.
    #[error("identity: {0}")]
    Identity(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
