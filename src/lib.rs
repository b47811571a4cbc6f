//! Client-side navigation engine for single-page applications.
//!
//! # Architecture Overview
//!
//! ```text
//!   Caller / Host events
//!        │
//!        ▼
//!   ┌──────────────────┐   push / replace / go    ┌──────────────┐
//!   │ NavigationCtrl   │─────────────────────────▶│ HistoryStack │ (host)
//!   │  (navigation)    │                          └──────────────┘
//!   └────────┬─────────┘
//!            │ commit (store.set + scroll)
//!            ▼
//!   ┌──────────────────┐   decorate / animate     ┌──────────────┐
//!   │ TransitionOrch.  │─────────────────────────▶│ HostDocument │ (host)
//!   │  (transition)    │                          │ AnimatedCommit│
//!   └────────┬─────────┘                          └──────────────┘
//!            ▼
//!   ┌──────────────────┐   pathname   ┌─────────────────────────────┐
//!   │  LocationStore   │─────────────▶│ RouteCompiler → RouteMatcher │
//!   │  (location)      │              │  (routing, PathPatternAdapter)│
//!   └──────────────────┘              └──────────────┬──────────────┘
//!                                                    ▼
//!                                               MatchStack
//! ```
//!
//! `Router` (engine) wires these together over a set of
//! [`HostCapabilities`]; `host::memory` provides headless ones.

// Core subsystems
pub mod location;
pub mod navigation;
pub mod routing;
pub mod transition;

// Host seams and assembly
pub mod engine;
pub mod host;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use config::RouterConfig;
pub use engine::{Router, RouterHandle};
pub use error::{RouterError, RouterResult};
pub use host::HostCapabilities;
pub use location::Location;
pub use navigation::{NavigationOutcome, NavigationRequest};
pub use routing::{MatchStack, RouteDefinition};
pub use transition::{TransitionConfig, TransitionSetting};
