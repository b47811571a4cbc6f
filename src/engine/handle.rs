//! Weak access to a router.
//!
//! Rendering code holds a `RouterHandle` instead of the router itself. Every
//! call upgrades the weak reference first; once the owning [`Router`] is
//! dropped, calls fail with [`RouterError::Detached`] instead of acting on a
//! dead engine.

use std::sync::{Arc, Weak};

use crate::engine::router::{Router, RouterInner};
use crate::error::{RouterError, RouterResult};
use crate::location::{Location, SubscriptionId};
use crate::navigation::{NavigationOutcome, NavigationRequest};
use crate::routing::MatchStack;

#[derive(Debug, Clone)]
pub struct RouterHandle {
    inner: Weak<RouterInner>,
}

impl RouterHandle {
    pub(crate) fn new(inner: Weak<RouterInner>) -> Self {
        Self { inner }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.strong_count() > 0
    }

    fn router(&self) -> RouterResult<Router> {
        self.inner
            .upgrade()
            .map(Router::from_inner)
            .ok_or(RouterError::Detached)
    }

    pub fn location(&self) -> RouterResult<Arc<Location>> {
        Ok(self.router()?.location())
    }

    pub fn matches(&self) -> RouterResult<Option<MatchStack>> {
        self.router()?.matches()
    }

    pub fn navigate(&self, request: impl Into<NavigationRequest>) -> RouterResult<NavigationOutcome> {
        self.router()?.navigate(request)
    }

    pub fn back(&self) -> RouterResult<NavigationOutcome> {
        Ok(self.router()?.back())
    }

    pub fn forward(&self) -> RouterResult<NavigationOutcome> {
        Ok(self.router()?.forward())
    }

    pub fn subscribe<F>(&self, listener: F) -> RouterResult<SubscriptionId>
    where
        F: Fn(&Location) + Send + Sync + 'static,
    {
        Ok(self.router()?.subscribe(listener))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> RouterResult<bool> {
        Ok(self.router()?.unsubscribe(id))
    }
}
