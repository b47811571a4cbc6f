//! Shared utilities for integration testing.

use std::sync::Arc;

use vt_router::config::RouterConfig;
use vt_router::host::memory::{AnimatorMode, MemoryAnimator, MemoryDocument, MemoryHistory};
use vt_router::host::HostCapabilities;
use vt_router::routing::{PathPatternAdapter, RouteDefinition, SegmentPatterns, StringFallback};
use vt_router::transition::TransitionPreset;
use vt_router::Router;

pub const ORIGIN: &str = "http://app.test";

/// An in-memory host whose parts stay inspectable after the router is built.
pub struct TestHost {
    pub history: Arc<MemoryHistory>,
    pub document: Arc<MemoryDocument>,
    pub animator: Option<Arc<MemoryAnimator>>,
}

#[allow(dead_code)]
impl TestHost {
    /// A host whose visible URL is `ORIGIN` + `path`.
    pub fn at(path: &str) -> Self {
        Self {
            history: Arc::new(MemoryHistory::parse(&format!("{ORIGIN}{path}")).unwrap()),
            document: Arc::new(MemoryDocument::new()),
            animator: None,
        }
    }

    pub fn with_animator(mut self, mode: AnimatorMode) -> Self {
        self.animator = Some(Arc::new(MemoryAnimator::new(mode)));
        self
    }

    pub fn capabilities(&self) -> HostCapabilities {
        let caps = HostCapabilities::new(self.history.clone(), self.document.clone());
        match &self.animator {
            Some(animator) => caps.with_animator(animator.clone()),
            None => caps,
        }
    }

    pub fn router(&self, config: RouterConfig) -> Router {
        Router::new(config, self.capabilities()).unwrap()
    }

    /// Deliver queued history events to the router, the way a browser
    /// fires them after the stack moved. Returns how many were delivered.
    pub fn pump(&self, router: &Router) -> usize {
        let events = self.history.take_events();
        let count = events.len();
        for event in events {
            router.handle_event(event);
        }
        count
    }
}

/// Config with the given routes and transitions switched off.
#[allow(dead_code)]
pub fn quiet_config(routes: Vec<RouteDefinition>) -> RouterConfig {
    let mut config = RouterConfig {
        routes,
        ..RouterConfig::default()
    };
    config.navigation.default_transition = TransitionPreset::Toggle(false);
    config
}

/// A small application route table.
#[allow(dead_code)]
pub fn app_routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new("/").element("layout").children(vec![
            RouteDefinition::index().element("home"),
            RouteDefinition::new("users").element("users").children(vec![
                RouteDefinition::index().element("user-list"),
                RouteDefinition::new("new").element("user-new"),
                RouteDefinition::new(":id").element("user-detail"),
            ]),
            RouteDefinition::new("old-home").redirect_to("/"),
            RouteDefinition::new("docs/*").element("docs"),
        ]),
        RouteDefinition::new("*").element("not-found"),
    ]
}

/// Both pattern adapters, precise first.
#[allow(dead_code)]
pub fn adapters() -> Vec<Arc<dyn PathPatternAdapter>> {
    let precise: Arc<dyn PathPatternAdapter> = Arc::new(SegmentPatterns);
    let fallback: Arc<dyn PathPatternAdapter> = Arc::new(StringFallback);
    vec![precise, fallback]
}
