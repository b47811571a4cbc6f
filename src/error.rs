//! Crate-level error type.

use thiserror::Error;

use crate::navigation::NavigationError;
use crate::routing::CompileError;

/// Errors surfaced by [`Router`](crate::Router) and
/// [`RouterHandle`](crate::RouterHandle).
#[derive(Debug, Error)]
pub enum RouterError {
    /// The route table is malformed.
    #[error("route compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// A handle outlived the router it was taken from.
    #[error("router handle used after its router was dropped")]
    Detached,
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
