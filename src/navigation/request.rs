//! Navigation requests and their outcomes.

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::host::ScrollBehavior;
use crate::transition::{TransitionHandle, TransitionSetting};

/// Where to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// Absolute or relative URL reference, resolved against the current URL.
    Path(String),
    /// Relative history motion.
    Delta(i64),
}

impl From<&str> for NavigationTarget {
    fn from(target: &str) -> Self {
        NavigationTarget::Path(target.to_string())
    }
}

impl From<String> for NavigationTarget {
    fn from(target: String) -> Self {
        NavigationTarget::Path(target)
    }
}

impl From<i64> for NavigationTarget {
    fn from(delta: i64) -> Self {
        NavigationTarget::Delta(delta)
    }
}

#[derive(Debug, Clone)]
pub struct NavigationRequest {
    pub target: NavigationTarget,
    pub replace: bool,
    /// Stored verbatim in the history entry; `None` stores null.
    pub state: Option<Value>,
    /// Overrides the router's default transition when set.
    pub transition: Option<TransitionSetting>,
    /// Overrides the router's scroll behavior when set.
    pub scroll: Option<ScrollBehavior>,
}

impl NavigationRequest {
    pub fn new(target: impl Into<NavigationTarget>) -> Self {
        Self {
            target: target.into(),
            replace: false,
            state: None,
            transition: None,
            scroll: None,
        }
    }

    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_transition(mut self, transition: impl Into<TransitionSetting>) -> Self {
        self.transition = Some(transition.into());
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollBehavior) -> Self {
        self.scroll = Some(scroll);
        self
    }
}

impl From<&str> for NavigationRequest {
    fn from(target: &str) -> Self {
        NavigationRequest::new(target)
    }
}

impl From<i64> for NavigationRequest {
    fn from(delta: i64) -> Self {
        NavigationRequest::new(delta)
    }
}

/// What `navigate` did.
#[derive(Debug)]
pub enum NavigationOutcome {
    /// Relative motion handed to the history stack; a later pop-state
    /// event updates the location.
    Delegated,
    /// Cross-origin target; the document was asked to load it.
    FullLoad(Url),
    /// Target equals the visible URL; nothing happened.
    NoOp,
    /// History mutated and the location committed.
    Committed(TransitionHandle),
}

impl NavigationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            NavigationOutcome::Delegated => "delegated",
            NavigationOutcome::FullLoad(_) => "full_load",
            NavigationOutcome::NoOp => "noop",
            NavigationOutcome::Committed(_) => "committed",
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, NavigationOutcome::Committed(_))
    }

    /// The transition handle, when a commit happened.
    pub fn into_handle(self) -> Option<TransitionHandle> {
        match self {
            NavigationOutcome::Committed(handle) => Some(handle),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("invalid navigation target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },
}

/// Result type for navigation operations.
pub type NavigationResult<T> = Result<T, NavigationError>;
