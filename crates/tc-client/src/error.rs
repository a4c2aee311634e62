//! Errors surfaced by the console views.

use crate::gateway::GatewayError;
use tc_core::CoreError;
use thiserror::Error;

/// A failed view load. The display text is what the operator sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The view was torn down before its response could be applied.
    #[error("View closed before the response arrived")]
    Cancelled,
}

impl ConsoleError {
    /// True for unknown case or experiment ids, whichever way the backend
    /// reported them.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Core(CoreError::NotFound { .. }) => true,
            Self::Gateway(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Result type for console views.
pub type ConsoleResult<T> = Result<T, ConsoleError>;
