//! Error types for tether_core

use thiserror::Error;

/// Errors raised by property and binding operations
///
/// Unbind and dispose paths never produce an error: removing something that
/// was never registered is a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// The call was given an argument it cannot accept, e.g. binding a
    /// property to itself
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The receiver is in a state that forbids the call, e.g. writing into a
    /// property that is bound to a source
    #[error("illegal state: {0}")]
    IllegalState(String),
}

impl BindingError {
    pub(crate) fn self_binding() -> Self {
        BindingError::InvalidArgument("cannot bind to itself".into())
    }

    pub(crate) fn bound_value() -> Self {
        BindingError::IllegalState("a bound value cannot be set".into())
    }
}

/// Result type for tether_core operations
pub type Result<T> = std::result::Result<T, BindingError>;
