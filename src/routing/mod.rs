//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (once per route-table identity):
//!     RouteDefinition[]
//!     → compiler.rs (absolute paths, patterns via adapter, parent links)
//!     → cache.rs (reuse while the table Arc is unchanged)
//!     → CompiledRouteTree (immutable)
//!
//! Every location change:
//!     pathname
//!     → matcher.rs (depth-first descent, pattern or string fallback)
//!     → Return: MatchStack (root → leaf) or no match
//! ```
//!
//! # Design Decisions
//! - Compiled trees are immutable and shared via Arc
//! - Deterministic: same input always yields the same stack
//! - First match wins, in declaration order
//! - Precise matching is optional; pattern.rs hides the capability

pub mod cache;
pub mod compiler;
pub mod matcher;
pub mod path;
pub mod pattern;

pub use cache::{RouteTable, RouteTreeCache};
pub use compiler::{CompileError, CompiledRoute, CompiledRouteTree, RouteCompiler, RouteDefinition, RouteId};
pub use matcher::{match_pattern, match_routes, Match, MatchStack, PathMatch, RenderCursor};
pub use pattern::{Params, PathMatcher, PathPatternAdapter, SegmentPatterns, StringFallback, SPLAT_KEY};
