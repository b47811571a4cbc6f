//! Router assembly and the public engine surface.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;

use crate::config::RouterConfig;
use crate::engine::handle::RouterHandle;
use crate::error::RouterResult;
use crate::host::{HistoryEvent, HostCapabilities};
use crate::location::{Location, LocationStore, SubscriptionId, INITIAL_KEY};
use crate::navigation::{NavigationController, NavigationOptions, NavigationOutcome, NavigationRequest};
use crate::routing::path;
use crate::routing::{
    match_pattern, match_routes, CompiledRouteTree, MatchStack, PathMatch, PathPatternAdapter,
    RouteCompiler, RouteDefinition, RouteTable, RouteTreeCache, StringFallback,
};
use crate::transition::{TransitionHandle, TransitionSetting};

#[derive(Debug)]
pub(crate) struct RouterInner {
    controller: NavigationController,
    cache: RouteTreeCache,
    routes: ArcSwap<Vec<RouteDefinition>>,
}

/// A navigation engine bound to one set of host capabilities.
#[derive(Debug)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Build a router. The route table is compiled up front so a malformed
    /// tree is rejected here rather than on first match.
    pub fn new(config: RouterConfig, host: HostCapabilities) -> RouterResult<Self> {
        let patterns: Arc<dyn PathPatternAdapter> = if config.matching.force_string_fallback {
            tracing::warn!(adapter = host.patterns.name(), "Precise matching disabled by config");
            Arc::new(StringFallback)
        } else {
            host.patterns.clone()
        };

        let cache = RouteTreeCache::new(RouteCompiler::new(patterns));
        let routes: RouteTable = Arc::new(config.routes);
        let tree = cache.get_or_compile(&routes)?;

        let initial_url = host.history.current_url();
        let state = host
            .history
            .current_state()
            .map(|s| s.usr)
            .unwrap_or(Value::Null);
        let store = Arc::new(LocationStore::new(Location::from_url(
            &initial_url,
            state,
            INITIAL_KEY,
        )));

        let controller = NavigationController::new(
            host.history,
            host.document,
            host.animator,
            store,
            NavigationOptions::from(&config.navigation),
        );

        tracing::info!(
            routes = tree.len(),
            url = %initial_url,
            interception = config.navigation.enable_interception,
            "Router started"
        );

        Ok(Self {
            inner: Arc::new(RouterInner {
                controller,
                cache,
                routes: ArcSwap::new(routes),
            }),
        })
    }

    pub(crate) fn from_inner(inner: Arc<RouterInner>) -> Self {
        Self { inner }
    }

    /// A weak accessor for code that must not keep the router alive.
    pub fn handle(&self) -> RouterHandle {
        RouterHandle::new(Arc::downgrade(&self.inner))
    }

    pub fn location(&self) -> Arc<Location> {
        self.inner.controller.store().get()
    }

    pub fn routes(&self) -> RouteTable {
        self.inner.routes.load_full()
    }

    /// Replace the route table. The new table is compiled before it is
    /// installed; on error the old table stays in place.
    pub fn set_routes(&self, routes: Vec<RouteDefinition>) -> RouterResult<()> {
        let table: RouteTable = Arc::new(routes);
        let tree = self.inner.cache.get_or_compile(&table)?;
        self.inner.routes.store(table);
        tracing::info!(routes = tree.len(), "Route table replaced");
        Ok(())
    }

    /// The compiled form of the current route table.
    pub fn tree(&self) -> RouterResult<Arc<CompiledRouteTree>> {
        Ok(self.inner.cache.get_or_compile(&self.routes())?)
    }

    /// Match stack for the current location, or `None` for a not-found.
    pub fn matches(&self) -> RouterResult<Option<MatchStack>> {
        let tree = self.tree()?;
        Ok(match_routes(&tree, &self.location().pathname))
    }

    pub fn navigate(&self, request: impl Into<NavigationRequest>) -> RouterResult<NavigationOutcome> {
        Ok(self.inner.controller.navigate(request.into())?)
    }

    pub fn back(&self) -> NavigationOutcome {
        self.inner.controller.back()
    }

    pub fn forward(&self) -> NavigationOutcome {
        self.inner.controller.forward()
    }

    pub fn go(&self, delta: i64) -> NavigationOutcome {
        self.inner.controller.go(delta)
    }

    /// Feed a host history notification to the engine.
    pub fn handle_event(&self, event: HistoryEvent) -> Option<TransitionHandle> {
        self.inner.controller.handle_event(event)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Location) + Send + Sync + 'static,
    {
        self.inner.controller.store().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.controller.store().unsubscribe(id)
    }

    pub fn set_default_transition(&self, setting: impl Into<TransitionSetting>) {
        self.inner.controller.set_default_transition(setting.into());
    }

    /// Animated transitions that have not finished yet.
    pub fn transitions_in_flight(&self) -> usize {
        self.inner.controller.orchestrator().in_flight()
    }

    /// Follow the deepest match's `redirect_to`, replacing the current
    /// entry. Returns `None` when there is nothing to follow.
    pub fn apply_redirect(&self) -> RouterResult<Option<NavigationOutcome>> {
        let Some(stack) = self.matches()? else {
            return Ok(None);
        };
        let Some(target) = stack
            .leaf()
            .and_then(|m| m.route().redirect_to())
            .map(str::to_string)
        else {
            return Ok(None);
        };

        tracing::debug!(from = %self.location().pathname, to = %target, "Following route redirect");
        let outcome = self.navigate(NavigationRequest::new(target).replace())?;
        Ok(Some(outcome))
    }

    /// Test the current pathname against an ad-hoc pattern.
    pub fn match_pattern(&self, pattern: &str) -> Option<PathMatch> {
        let tree = self.tree().ok()?;
        match_pattern(tree.adapter(), pattern, &self.location().pathname)
    }

    /// Whether a link to `target` should render as active.
    pub fn is_active(&self, target: &str, end: bool) -> bool {
        path::is_active(&self.location().pathname, target, end)
    }

    pub fn search_params(&self) -> Vec<(String, String)> {
        self.location().search_params()
    }

    pub fn set_search_params(
        &self,
        pairs: &[(String, String)],
        replace: bool,
    ) -> RouterResult<NavigationOutcome> {
        Ok(self.inner.controller.set_search_params(pairs, replace)?)
    }
}
