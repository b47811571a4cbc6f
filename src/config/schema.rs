//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::host::ScrollBehavior;
use crate::routing::RouteDefinition;
use crate::transition::TransitionPreset;

/// Root configuration for a router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// The route tree, in precedence order.
    pub routes: Vec<RouteDefinition>,

    /// Navigation behavior.
    pub navigation: NavigationConfig,

    /// Path matching settings.
    pub matching: MatchingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Navigation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Transition applied when a request does not choose one:
    /// `false`, `true`, a name, or `{ name, class_name, attribute }`.
    pub default_transition: TransitionPreset,

    /// Take over host-intercepted same-origin navigations.
    pub enable_interception: bool,

    /// Scroll-to-top behavior after a navigation.
    pub scroll: ScrollBehavior,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            default_transition: TransitionPreset::Toggle(true),
            enable_interception: false,
            scroll: ScrollBehavior::Auto,
        }
    }
}

/// Matching configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MatchingConfig {
    /// Ignore any precise pattern adapter and use string comparison only.
    pub force_string_fallback: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
