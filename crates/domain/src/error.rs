//! Hard errors raised before a command ever reaches the reducer.
//!
//! Domain-level problems are not errors here; they travel as
//! [`crate::Event`] values.

use thiserror::Error;

/// A command envelope that cannot be routed at all. Unlike reducer
/// rejections these surface as typed errors and map to client-error
/// responses at every entry point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("command envelope is missing a non-empty `type` discriminant")]
    MissingType,

    #[error("command envelope must be a JSON object")]
    NotAnObject,
}
