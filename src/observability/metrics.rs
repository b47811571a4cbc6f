//! Router metrics.
//!
//! # Metrics
//! - `router_route_compilations_total` (counter): route trees compiled
//! - `router_compiled_routes` (gauge): nodes in the last compiled tree
//! - `router_matches_total` (counter): match attempts by `result` (hit, miss)
//! - `router_navigations_total` (counter): navigations by `outcome`
//! - `router_transitions_total` (counter): transitions by `path`
//!
//! # Design Decisions
//! - Facade only; the embedding application chooses the recorder
//! - Labels are static strings to keep cardinality bounded

use crate::navigation::NavigationOutcome;
use crate::transition::TransitionPath;

pub fn record_compilation(routes: usize) {
    ::metrics::counter!("router_route_compilations_total").increment(1);
    ::metrics::gauge!("router_compiled_routes").set(routes as f64);
}

pub fn record_match(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    ::metrics::counter!("router_matches_total", "result" => result).increment(1);
}

pub fn record_navigation(outcome: &NavigationOutcome) {
    ::metrics::counter!("router_navigations_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_transition(path: TransitionPath) {
    ::metrics::counter!("router_transitions_total", "path" => path.as_str()).increment(1);
}
