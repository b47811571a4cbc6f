//! The navigation controller.
//!
//! # Responsibilities
//! - Resolve navigation targets against the visible URL
//! - Decide between delegation, full load, no-op and commit
//! - Mutate the history stack, then commit the new location through the
//!   transition orchestrator
//! - Turn host history events into location commits
//!
//! # Data Flow
//! ```text
//! navigate(request)
//!     Delta(n)           → history.go(n)                 → Delegated
//!     Path(target)       → current_url.join(target)
//!         other origin   → document.load(url)            → FullLoad
//!         same URL       →                               → NoOp
//!         otherwise      → history.push / replace
//!                          → orchestrator.run(store.set + scroll) → Committed
//!
//! handle_event(event)
//!     PopState / HashChange → location from history      → orchestrator
//!     Intercepted           → location from destination  → orchestrator
//! ```
//!
//! # Design Decisions
//! - The no-op check compares against the browser-visible URL, not the
//!   stored location, so repeated redirects to the same URL settle
//! - Events never mutate history; the stack already moved

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;
use url::Url;

use crate::config::NavigationConfig;
use crate::host::{
    AnimatedCommit, Commit, HistoryEvent, HistoryStack, HistoryState, HostDocument,
    InterceptedNavigation, ScrollBehavior,
};
use crate::location::{encode_search, hash_of, search_of, Location, LocationStore};
use crate::navigation::request::{
    NavigationError, NavigationOutcome, NavigationRequest, NavigationResult, NavigationTarget,
};
use crate::observability::metrics;
use crate::transition::{TransitionHandle, TransitionOrchestrator, TransitionSetting};

/// Behavior knobs for a controller.
#[derive(Debug, Clone, Default)]
pub struct NavigationOptions {
    pub default_transition: TransitionSetting,
    pub enable_interception: bool,
    pub scroll: ScrollBehavior,
}

impl From<&NavigationConfig> for NavigationOptions {
    fn from(config: &NavigationConfig) -> Self {
        Self {
            default_transition: TransitionSetting::from(&config.default_transition),
            enable_interception: config.enable_interception,
            scroll: config.scroll,
        }
    }
}

pub struct NavigationController {
    history: Arc<dyn HistoryStack>,
    document: Arc<dyn HostDocument>,
    store: Arc<LocationStore>,
    orchestrator: TransitionOrchestrator,
    default_transition: ArcSwap<TransitionSetting>,
    enable_interception: bool,
    default_scroll: ScrollBehavior,
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("history", &self.history)
            .field("orchestrator", &self.orchestrator)
            .field("enable_interception", &self.enable_interception)
            .finish_non_exhaustive()
    }
}

impl NavigationController {
    pub fn new(
        history: Arc<dyn HistoryStack>,
        document: Arc<dyn HostDocument>,
        animator: Option<Arc<dyn AnimatedCommit>>,
        store: Arc<LocationStore>,
        options: NavigationOptions,
    ) -> Self {
        Self {
            orchestrator: TransitionOrchestrator::new(document.clone(), animator),
            history,
            document,
            store,
            default_transition: ArcSwap::from_pointee(options.default_transition),
            enable_interception: options.enable_interception,
            default_scroll: options.scroll,
        }
    }

    pub fn store(&self) -> &Arc<LocationStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &TransitionOrchestrator {
        &self.orchestrator
    }

    /// Transition used when a request carries none, and for history events.
    pub fn set_default_transition(&self, setting: TransitionSetting) {
        self.default_transition.store(Arc::new(setting));
    }

    pub fn navigate(&self, request: NavigationRequest) -> NavigationResult<NavigationOutcome> {
        let outcome = match &request.target {
            NavigationTarget::Delta(delta) => {
                tracing::debug!(delta, "Delegating relative navigation to history");
                self.history.go(*delta);
                NavigationOutcome::Delegated
            }
            NavigationTarget::Path(target) => self.navigate_to(target, &request)?,
        };
        metrics::record_navigation(&outcome);
        Ok(outcome)
    }

    pub fn back(&self) -> NavigationOutcome {
        self.go(-1)
    }

    pub fn forward(&self) -> NavigationOutcome {
        self.go(1)
    }

    pub fn go(&self, delta: i64) -> NavigationOutcome {
        self.history.go(delta);
        let outcome = NavigationOutcome::Delegated;
        metrics::record_navigation(&outcome);
        outcome
    }

    /// Navigate to the current URL with its query string replaced. The
    /// fragment is kept.
    pub fn set_search_params(
        &self,
        pairs: &[(String, String)],
        replace: bool,
    ) -> NavigationResult<NavigationOutcome> {
        let mut url = self.history.current_url();
        let search = encode_search(pairs);
        url.set_query(search.strip_prefix('?'));
        let mut request = NavigationRequest::new(url.to_string());
        request.replace = replace;
        self.navigate(request)
    }

    fn navigate_to(&self, target: &str, request: &NavigationRequest) -> NavigationResult<NavigationOutcome> {
        let current = self.history.current_url();
        let url = current
            .join(target)
            .map_err(|source| NavigationError::InvalidTarget {
                target: target.to_string(),
                source,
            })?;

        if !same_origin(&url, &current) {
            tracing::info!(url = %url, "Cross-origin target, handing off to full load");
            self.document.load(&url);
            return Ok(NavigationOutcome::FullLoad(url));
        }

        if same_visible_url(&url, &current) {
            tracing::debug!(url = %url, "Navigation target equals current URL, ignoring");
            return Ok(NavigationOutcome::NoOp);
        }

        let usr = request.state.clone().unwrap_or(Value::Null);
        let entry = HistoryState::new(usr.clone());
        if request.replace {
            self.history.replace(entry, &url);
        } else {
            self.history.push(entry, &url);
        }

        let location = Location::from_url(&url, usr, self.store.next_key());
        tracing::debug!(
            href = %location.href(),
            replace = request.replace,
            key = %location.key,
            "Navigating"
        );

        let setting = match &request.transition {
            Some(setting) => setting.clone(),
            None => self.default_transition.load().as_ref().clone(),
        };
        let scroll = request.scroll.unwrap_or(self.default_scroll);
        let handle = self.commit(location, Some(scroll), &setting);
        Ok(NavigationOutcome::Committed(handle))
    }

    /// React to a host history notification. Returns `None` when the event
    /// was not taken.
    pub fn handle_event(&self, event: HistoryEvent) -> Option<TransitionHandle> {
        let setting = self.default_transition.load_full();
        match event {
            HistoryEvent::Intercepted(navigation) => self.intercept(navigation, &setting),
            moved => {
                let location = self.location_from_history();
                tracing::debug!(event = ?moved, href = %location.href(), "History moved");
                Some(self.commit(location, None, &setting))
            }
        }
    }

    fn intercept(
        &self,
        navigation: InterceptedNavigation,
        setting: &TransitionSetting,
    ) -> Option<TransitionHandle> {
        if !self.enable_interception {
            tracing::debug!("Interception disabled, ignoring intercepted navigation");
            return None;
        }
        if !navigation.can_intercept {
            return None;
        }
        if !same_origin(&navigation.destination, &self.history.current_url()) {
            tracing::debug!(url = %navigation.destination, "Intercepted navigation is cross-origin");
            return None;
        }

        let state = navigation
            .info
            .state
            .or_else(|| self.history.current_state().map(|s| s.usr))
            .unwrap_or(Value::Null);
        let location = Location::from_url(&navigation.destination, state, self.store.next_key());
        let scroll = navigation.info.scroll.then_some(ScrollBehavior::Auto);
        tracing::debug!(href = %location.href(), "Intercepted navigation");
        Some(self.commit(location, scroll, setting))
    }

    fn location_from_history(&self) -> Location {
        let url = self.history.current_url();
        let state = self
            .history
            .current_state()
            .map(|s| s.usr)
            .unwrap_or(Value::Null);
        Location::from_url(&url, state, self.store.next_key())
    }

    fn commit(
        &self,
        location: Location,
        scroll: Option<ScrollBehavior>,
        setting: &TransitionSetting,
    ) -> TransitionHandle {
        let store = self.store.clone();
        let document = self.document.clone();
        let commit: Commit = Box::new(move || {
            store.set(location);
            if let Some(behavior) = scroll {
                document.scroll_to_top(behavior);
            }
        });
        self.orchestrator.run(commit, setting)
    }
}

/// Opaque origins (`app:`, `file:` and other non-special schemes) never
/// compare equal in `url`, so those fall back to scheme, host and port.
fn same_origin(a: &Url, b: &Url) -> bool {
    let (left, right) = (a.origin(), b.origin());
    if left.is_tuple() || right.is_tuple() {
        return left == right;
    }
    a.scheme() == b.scheme() && a.host_str() == b.host_str() && a.port() == b.port()
}

fn same_visible_url(a: &Url, b: &Url) -> bool {
    a.path() == b.path() && search_of(a) == search_of(b) && hash_of(a) == hash_of(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryDocument, MemoryHistory};
    use crate::host::NavigationInfo;
    use crate::location::INITIAL_KEY;
    use serde_json::json;

    struct Fixture {
        history: Arc<MemoryHistory>,
        document: Arc<MemoryDocument>,
        controller: NavigationController,
    }

    fn fixture(start: &str, options: NavigationOptions) -> Fixture {
        let history = Arc::new(MemoryHistory::parse(start).unwrap());
        let document = Arc::new(MemoryDocument::new());
        let initial = Location::from_url(&history.current_url(), Value::Null, INITIAL_KEY);
        let store = Arc::new(LocationStore::new(initial));
        let controller = NavigationController::new(
            history.clone(),
            document.clone(),
            None,
            store,
            options,
        );
        Fixture {
            history,
            document,
            controller,
        }
    }

    fn quiet() -> NavigationOptions {
        NavigationOptions {
            default_transition: TransitionSetting::Disabled,
            ..NavigationOptions::default()
        }
    }

    #[test]
    fn test_push_commits_location() {
        let f = fixture("http://app.test/", quiet());
        let outcome = f
            .controller
            .navigate(NavigationRequest::new("/users/7?tab=posts").with_state(json!({"from": "home"})))
            .unwrap();
        assert!(outcome.is_committed());
        let location = f.controller.store().get();
        assert_eq!(location.pathname, "/users/7");
        assert_eq!(location.search, "?tab=posts");
        assert_eq!(location.state, json!({"from": "home"}));
        assert_ne!(location.key, INITIAL_KEY);
        assert_eq!(f.history.depth(), 2);
        assert_eq!(f.history.current_state().unwrap().usr, json!({"from": "home"}));
        assert_eq!(f.document.scrolls(), vec![ScrollBehavior::Auto]);
    }

    #[test]
    fn test_same_url_is_noop() {
        let f = fixture("http://app.test/a?b=1", quiet());
        let before = f.controller.store().get();
        let outcome = f.controller.navigate("/a?b=1".into()).unwrap();
        assert!(matches!(outcome, NavigationOutcome::NoOp));
        assert_eq!(f.history.depth(), 1);
        assert_eq!(f.controller.store().get().key, before.key);
    }

    #[test]
    fn test_relative_target_resolves_against_current() {
        let f = fixture("http://app.test/docs/intro", quiet());
        f.controller.navigate("setup".into()).unwrap();
        assert_eq!(f.controller.store().get().pathname, "/docs/setup");
    }

    #[test]
    fn test_cross_origin_full_load() {
        let f = fixture("http://app.test/", quiet());
        let outcome = f.controller.navigate("https://elsewhere.test/x".into()).unwrap();
        assert!(matches!(outcome, NavigationOutcome::FullLoad(_)));
        assert_eq!(f.document.loads().len(), 1);
        assert_eq!(f.history.depth(), 1);
        assert_eq!(f.controller.store().get().key, INITIAL_KEY);
    }

    #[test]
    fn test_invalid_target() {
        let f = fixture("http://app.test/", quiet());
        let err = f.controller.navigate("http://[::1".into()).unwrap_err();
        assert!(matches!(err, NavigationError::InvalidTarget { .. }));
    }

    #[test]
    fn test_intercept_requires_opt_in() {
        let f = fixture("http://app.test/", quiet());
        let event = HistoryEvent::Intercepted(InterceptedNavigation {
            destination: Url::parse("http://app.test/next").unwrap(),
            can_intercept: true,
            info: NavigationInfo::default(),
        });
        assert!(f.controller.handle_event(event).is_none());
        assert_eq!(f.controller.store().get().pathname, "/");
    }

    #[test]
    fn test_intercept_honours_scroll_flag() {
        let options = NavigationOptions {
            enable_interception: true,
            ..quiet()
        };
        let f = fixture("http://app.test/", options);
        let event = HistoryEvent::Intercepted(InterceptedNavigation {
            destination: Url::parse("http://app.test/next").unwrap(),
            can_intercept: true,
            info: NavigationInfo {
                state: Some(json!(3)),
                scroll: false,
            },
        });
        assert!(f.controller.handle_event(event).is_some());
        let location = f.controller.store().get();
        assert_eq!(location.pathname, "/next");
        assert_eq!(location.state, json!(3));
        assert!(f.document.scrolls().is_empty());
    }

    #[test]
    fn test_set_search_params_keeps_path_and_hash() {
        let f = fixture("http://app.test/list?page=1#top", quiet());
        let pairs = vec![("page".to_string(), "2".to_string())];
        f.controller.set_search_params(&pairs, true).unwrap();
        let location = f.controller.store().get();
        assert_eq!(location.href(), "/list?page=2#top");
        assert_eq!(f.history.depth(), 1);

        f.controller.set_search_params(&[], false).unwrap();
        assert_eq!(f.controller.store().get().href(), "/list#top");
        assert_eq!(f.history.current_url().as_str(), "http://app.test/list#top");
    }

    #[test]
    fn test_set_search_params_on_double_slash_path_stays_in_app() {
        let f = fixture("http://app.test//evil.test/x", quiet());
        let pairs = vec![("q".to_string(), "1".to_string())];
        let outcome = f.controller.set_search_params(&pairs, false).unwrap();
        assert!(outcome.is_committed());
        assert!(f.document.loads().is_empty());
        assert_eq!(f.history.current_url().host_str(), Some("app.test"));
        assert_eq!(f.controller.store().get().pathname, "//evil.test/x");
    }

    #[test]
    fn test_opaque_origin_host_stays_in_app() {
        let f = fixture("app://local/", quiet());
        let outcome = f.controller.navigate("/x".into()).unwrap();
        assert!(outcome.is_committed());
        assert!(f.document.loads().is_empty());
        assert_eq!(f.controller.store().get().pathname, "/x");

        let outcome = f.controller.navigate("app://other/y".into()).unwrap();
        assert!(matches!(outcome, NavigationOutcome::FullLoad(_)));
    }

    #[test]
    fn test_opaque_origin_interception() {
        let options = NavigationOptions {
            enable_interception: true,
            ..quiet()
        };
        let f = fixture("app://local/", options);
        let event = HistoryEvent::Intercepted(InterceptedNavigation {
            destination: Url::parse("app://local/next").unwrap(),
            can_intercept: true,
            info: NavigationInfo::default(),
        });
        assert!(f.controller.handle_event(event).is_some());
        assert_eq!(f.controller.store().get().pathname, "/next");
    }
}
