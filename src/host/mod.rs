//! Host capability seams.
//!
//! # Data Flow
//! ```text
//! Engine → HistoryStack   (push / replace / go, read current URL + state)
//! Engine → HostDocument   (full load, scroll reset, root decoration)
//! Engine → AnimatedCommit (optional: wrap a commit in an animated transition)
//! Host   → HistoryEvent   (pop-state, hash change, intercepted navigation)
//! ```
//!
//! # Design Decisions
//! - Every capability is a trait object supplied at construction
//! - Optional capabilities report "unsupported" as a value, never by
//!   panicking, so call sites branch on a typed outcome
//! - memory.rs provides headless implementations for tests and the CLI

pub mod memory;

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::routing::pattern::{PathPatternAdapter, SegmentPatterns};

/// Payload stored with every history entry. The caller's state lives
/// under `usr` and is round-tripped verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    #[serde(default)]
    pub usr: Value,
}

impl HistoryState {
    pub fn new(usr: Value) -> Self {
        Self { usr }
    }
}

/// Scroll behavior used for the reset-to-top after a navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
    Instant,
}

/// The external, mutable history stack.
pub trait HistoryStack: Send + Sync + fmt::Debug {
    /// Add an entry after the current one, discarding forward entries.
    fn push(&self, state: HistoryState, url: &Url);

    /// Overwrite the current entry.
    fn replace(&self, state: HistoryState, url: &Url);

    /// Relative motion. The host reports the result later as a
    /// [`HistoryEvent::PopState`].
    fn go(&self, delta: i64);

    /// The browser-visible URL.
    fn current_url(&self) -> Url;

    /// State of the current entry, if any was stored.
    fn current_state(&self) -> Option<HistoryState>;
}

/// The document the application renders into.
pub trait HostDocument: Send + Sync + fmt::Debug {
    /// Full, non-SPA load of `url`. Control leaves the engine.
    fn load(&self, url: &Url);

    fn scroll_to_top(&self, behavior: ScrollBehavior);

    fn set_root_attribute(&self, name: &str, value: &str);

    fn remove_root_attribute(&self, name: &str);

    fn add_root_class(&self, class: &str);

    fn remove_root_class(&self, class: &str);
}

/// The visible update handed to the transition layer.
pub type Commit = Box<dyn FnOnce() + Send + 'static>;

/// Failure of an animation milestone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    /// The host aborted or skipped the animation.
    #[error("animation aborted: {0}")]
    Aborted(String),
}

/// An awaitable animation milestone.
pub type Milestone = BoxFuture<'static, Result<(), AnimationError>>;

/// A started animated transition.
pub struct AnimatedTransition {
    /// Resolves once the animation is about to run.
    pub ready: Milestone,
    /// Resolves (or fails) once the animation is over.
    pub finished: Milestone,
}

impl fmt::Debug for AnimatedTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedTransition").finish_non_exhaustive()
    }
}

/// Outcome of asking the host for an animated commit.
pub enum AnimationStart {
    /// The host took the commit and will run it inside the animation.
    Started(AnimatedTransition),
    /// The host refused; the commit is handed back untouched.
    Unsupported(Commit),
}

impl fmt::Debug for AnimationStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationStart::Started(t) => f.debug_tuple("Started").field(t).finish(),
            AnimationStart::Unsupported(_) => f.write_str("Unsupported"),
        }
    }
}

/// Optional animated-commit capability.
pub trait AnimatedCommit: Send + Sync + fmt::Debug {
    fn start(&self, commit: Commit) -> AnimationStart;
}

/// Payload a host attaches to an intercepted navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationInfo {
    pub state: Option<Value>,
    /// Reset scroll after the commit.
    pub scroll: bool,
}

impl Default for NavigationInfo {
    fn default() -> Self {
        Self {
            state: None,
            scroll: true,
        }
    }
}

/// A navigation the host offers to the engine before committing it.
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptedNavigation {
    pub destination: Url,
    pub can_intercept: bool,
    pub info: NavigationInfo,
}

/// Notifications the host delivers after the history stack moved.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    PopState,
    HashChange,
    Intercepted(InterceptedNavigation),
}

/// Bundle of host capabilities an engine is built from.
#[derive(Debug, Clone)]
pub struct HostCapabilities {
    pub history: Arc<dyn HistoryStack>,
    pub document: Arc<dyn HostDocument>,
    pub animator: Option<Arc<dyn AnimatedCommit>>,
    pub patterns: Arc<dyn PathPatternAdapter>,
}

impl HostCapabilities {
    /// Required capabilities only; precise patterns on, no animation.
    pub fn new(history: Arc<dyn HistoryStack>, document: Arc<dyn HostDocument>) -> Self {
        Self {
            history,
            document,
            animator: None,
            patterns: Arc::new(SegmentPatterns),
        }
    }

    pub fn with_animator(mut self, animator: Arc<dyn AnimatedCommit>) -> Self {
        self.animator = Some(animator);
        self
    }

    pub fn with_patterns(mut self, patterns: Arc<dyn PathPatternAdapter>) -> Self {
        self.patterns = patterns;
        self
    }
}
