//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! Caller → NavigationRequest → controller.rs → HistoryStack + TransitionOrchestrator
//! Host   → HistoryEvent      → controller.rs → TransitionOrchestrator
//!                                            → LocationStore (inside the commit)
//! ```

pub mod controller;
pub mod request;

pub use controller::{NavigationController, NavigationOptions};
pub use request::{
    NavigationError, NavigationOutcome, NavigationRequest, NavigationResult, NavigationTarget,
};
