//! The assembled navigation engine.
//!
//! # Data Flow
//! ```text
//! RouterConfig + HostCapabilities
//!     → Router::new
//!         → RouteTreeCache (compile once per route-table identity)
//!         → LocationStore (initial location from the history stack)
//!         → NavigationController (+ TransitionOrchestrator)
//!
//! Router::matches()      → cache → match_routes(current pathname)
//! Router::navigate(req)  → controller → history + store
//! Router::handle_event() → controller → store
//! ```
//!
//! # Design Decisions
//! - One `Router` owns the engine; `RouterHandle` is a weak accessor that
//!   fails fast with `RouterError::Detached` once the router is gone
//! - The route table is swapped atomically; the next match recompiles

pub mod handle;
pub mod router;

pub use handle::RouterHandle;
pub use router::Router;
