//! Runs visible updates, animated when the host can.
//!
//! # Responsibilities
//! - Call `on_start` before the commit, `on_finished` exactly once after it
//! - Decorate the document root for the transition's duration
//! - Drive the animated path on a spawned task so callers never wait
//!
//! # Data Flow
//! ```text
//! run(commit, setting)
//!     Disabled            → commit()                          → Settled
//!     no animator         → decorate, commit, revert, finish  → Settled
//!     animator refuses    → same as above                     → Settled
//!     animator starts     → spawn { ready → on_ready;
//!                                   finished → revert, on_finished } → Animating
//! ```
//!
//! # Design Decisions
//! - Overlapping transitions are allowed; each one keeps its own lifecycle
//!   and `in_flight` tracks how many animated ones are outstanding
//! - Milestone failures are logged at debug and otherwise ignored

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::host::{AnimatedCommit, AnimatedTransition, AnimationStart, Commit, HostDocument};
use crate::observability::metrics;
use crate::transition::config::{TransitionConfig, TransitionSetting};

/// Which branch a transition took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPath {
    Disabled,
    Fallback,
    Unsupported,
    Animated,
}

impl TransitionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPath::Disabled => "disabled",
            TransitionPath::Fallback => "fallback",
            TransitionPath::Unsupported => "unsupported",
            TransitionPath::Animated => "animated",
        }
    }
}

impl fmt::Display for TransitionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`TransitionOrchestrator::run`]. The commit has always run by
/// the time a handle is returned.
#[derive(Debug)]
pub enum TransitionHandle {
    /// Everything, `on_finished` included, already happened.
    Settled(TransitionPath),
    /// Waiting on the host's `finished` milestone.
    Animating(JoinHandle<()>),
}

impl TransitionHandle {
    pub fn path(&self) -> TransitionPath {
        match self {
            TransitionHandle::Settled(path) => *path,
            TransitionHandle::Animating(_) => TransitionPath::Animated,
        }
    }

    pub fn is_settled(&self) -> bool {
        match self {
            TransitionHandle::Settled(_) => true,
            TransitionHandle::Animating(task) => task.is_finished(),
        }
    }

    /// Wait until `on_finished` has run.
    pub async fn finished(self) {
        if let TransitionHandle::Animating(task) = self {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Transition task did not complete");
            }
        }
    }
}

/// Root decoration applied for the transition's duration.
#[derive(Debug, Clone)]
struct Decoration {
    attribute: Option<(String, String)>,
    class_name: Option<String>,
}

impl Decoration {
    fn from_config(config: &TransitionConfig) -> Self {
        Self {
            attribute: config
                .name
                .as_ref()
                .map(|name| (config.attribute.clone(), name.clone())),
            class_name: config.class_name.clone(),
        }
    }

    fn apply(&self, document: &dyn HostDocument) {
        if let Some((attribute, name)) = &self.attribute {
            document.set_root_attribute(attribute, name);
        }
        if let Some(class) = &self.class_name {
            document.add_root_class(class);
        }
    }

    fn revert(&self, document: &dyn HostDocument) {
        if let Some((attribute, _)) = &self.attribute {
            document.remove_root_attribute(attribute);
        }
        if let Some(class) = &self.class_name {
            document.remove_root_class(class);
        }
    }
}

pub struct TransitionOrchestrator {
    document: Arc<dyn HostDocument>,
    animator: Option<Arc<dyn AnimatedCommit>>,
    in_flight: Arc<AtomicUsize>,
}

impl fmt::Debug for TransitionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionOrchestrator")
            .field("animated", &self.animator.is_some())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl TransitionOrchestrator {
    pub fn new(document: Arc<dyn HostDocument>, animator: Option<Arc<dyn AnimatedCommit>>) -> Self {
        Self {
            document,
            animator,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Animated transitions started but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn run(&self, commit: Commit, setting: &TransitionSetting) -> TransitionHandle {
        let config = match setting {
            TransitionSetting::Disabled => {
                commit();
                return self.settle(TransitionPath::Disabled);
            }
            TransitionSetting::Enabled(config) => config.clone(),
        };

        config.fire_start();
        let decoration = Decoration::from_config(&config);
        decoration.apply(self.document.as_ref());

        let Some(animator) = &self.animator else {
            return self.fallback(commit, &decoration, &config, TransitionPath::Fallback);
        };

        // The finished milestone is awaited on a task; without a runtime
        // there is nowhere to drive it.
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("No async runtime available, running transition synchronously");
                return self.fallback(commit, &decoration, &config, TransitionPath::Fallback);
            }
        };

        match animator.start(commit) {
            AnimationStart::Unsupported(commit) => {
                tracing::debug!("Animated commit unsupported, falling back");
                self.fallback(commit, &decoration, &config, TransitionPath::Unsupported)
            }
            AnimationStart::Started(transition) => {
                metrics::record_transition(TransitionPath::Animated);
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                let task = runtime.spawn(drive(
                    transition,
                    decoration,
                    config,
                    self.document.clone(),
                    self.in_flight.clone(),
                ));
                TransitionHandle::Animating(task)
            }
        }
    }

    fn fallback(
        &self,
        commit: Commit,
        decoration: &Decoration,
        config: &TransitionConfig,
        path: TransitionPath,
    ) -> TransitionHandle {
        commit();
        decoration.revert(self.document.as_ref());
        config.fire_finished();
        self.settle(path)
    }

    fn settle(&self, path: TransitionPath) -> TransitionHandle {
        tracing::debug!(path = %path, "Transition settled");
        metrics::record_transition(path);
        TransitionHandle::Settled(path)
    }
}

async fn drive(
    transition: AnimatedTransition,
    decoration: Decoration,
    config: TransitionConfig,
    document: Arc<dyn HostDocument>,
    in_flight: Arc<AtomicUsize>,
) {
    let AnimatedTransition { ready, finished } = transition;

    match ready.await {
        Ok(()) => config.fire_ready(),
        Err(e) => tracing::debug!(error = %e, "Transition ready milestone failed"),
    }
    if let Err(e) = finished.await {
        tracing::debug!(error = %e, "Transition finished with failure");
    }

    decoration.revert(document.as_ref());
    config.fire_finished();
    in_flight.fetch_sub(1, Ordering::SeqCst);
    tracing::debug!("Animated transition finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{AnimatorMode, DecorationEvent, MemoryAnimator, MemoryDocument};
    use std::sync::Mutex;

    type Journal = Arc<Mutex<Vec<&'static str>>>;

    fn journaled(journal: &Journal) -> TransitionSetting {
        let (s, r, f) = (journal.clone(), journal.clone(), journal.clone());
        TransitionConfig::named("fade")
            .on_start(move || s.lock().unwrap().push("start"))
            .on_ready(move || r.lock().unwrap().push("ready"))
            .on_finished(move || f.lock().unwrap().push("finished"))
            .into()
    }

    fn commit(journal: &Journal) -> Commit {
        let j = journal.clone();
        Box::new(move || j.lock().unwrap().push("commit"))
    }

    #[test]
    fn test_disabled_commits_only() {
        let doc = Arc::new(MemoryDocument::new());
        let orchestrator = TransitionOrchestrator::new(doc.clone(), None);
        let journal: Journal = Arc::default();
        let handle = orchestrator.run(commit(&journal), &TransitionSetting::Disabled);
        assert_eq!(handle.path(), TransitionPath::Disabled);
        assert_eq!(*journal.lock().unwrap(), vec!["commit"]);
        assert!(doc.decoration_log().is_empty());
    }

    #[test]
    fn test_fallback_lifecycle_and_decoration() {
        let doc = Arc::new(MemoryDocument::new());
        let orchestrator = TransitionOrchestrator::new(doc.clone(), None);
        let journal: Journal = Arc::default();
        let handle = orchestrator.run(commit(&journal), &journaled(&journal));

        assert!(handle.is_settled());
        assert_eq!(handle.path(), TransitionPath::Fallback);
        assert_eq!(*journal.lock().unwrap(), vec!["start", "commit", "finished"]);
        assert_eq!(
            doc.decoration_log(),
            vec![
                DecorationEvent::SetAttribute {
                    name: "data-vt".into(),
                    value: "fade".into()
                },
                DecorationEvent::RemoveAttribute("data-vt".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unsupported_animator_falls_back() {
        let doc = Arc::new(MemoryDocument::new());
        let animator = Arc::new(MemoryAnimator::new(AnimatorMode::Unsupported));
        let orchestrator = TransitionOrchestrator::new(doc, Some(animator));
        let journal: Journal = Arc::default();
        let handle = orchestrator.run(commit(&journal), &journaled(&journal));

        assert_eq!(handle.path(), TransitionPath::Unsupported);
        assert_eq!(*journal.lock().unwrap(), vec!["start", "commit", "finished"]);
    }

    #[tokio::test]
    async fn test_animated_lifecycle() {
        let doc = Arc::new(MemoryDocument::new());
        let animator = Arc::new(MemoryAnimator::new(AnimatorMode::Deferred));
        let orchestrator = TransitionOrchestrator::new(doc.clone(), Some(animator.clone()));
        let journal: Journal = Arc::default();
        let handle = orchestrator.run(commit(&journal), &journaled(&journal));

        assert_eq!(handle.path(), TransitionPath::Animated);
        assert_eq!(orchestrator.in_flight(), 1);
        assert_eq!(doc.attribute("data-vt").as_deref(), Some("fade"));

        animator.finish_all();
        handle.finished().await;

        assert_eq!(orchestrator.in_flight(), 0);
        assert!(doc.attribute("data-vt").is_none());
        assert_eq!(
            *journal.lock().unwrap(),
            vec!["start", "commit", "ready", "finished"]
        );
    }

    #[tokio::test]
    async fn test_failing_milestones_still_finish_once() {
        let doc = Arc::new(MemoryDocument::new());
        let animator = Arc::new(MemoryAnimator::new(AnimatorMode::FailingReady));
        let orchestrator = TransitionOrchestrator::new(doc, Some(animator));
        let journal: Journal = Arc::default();
        orchestrator
            .run(commit(&journal), &journaled(&journal))
            .finished()
            .await;
        assert_eq!(*journal.lock().unwrap(), vec!["start", "commit", "finished"]);
    }

    #[tokio::test]
    async fn test_aborted_finish_still_reverts() {
        let doc = Arc::new(MemoryDocument::new());
        let animator = Arc::new(MemoryAnimator::new(AnimatorMode::Deferred));
        let orchestrator = TransitionOrchestrator::new(doc.clone(), Some(animator.clone()));
        let setting: TransitionSetting = TransitionConfig::default().with_class("vt-busy").into();
        let handle = orchestrator.run(Box::new(|| {}), &setting);
        assert!(doc.has_class("vt-busy"));
        animator.abort_all();
        handle.finished().await;
        assert!(!doc.has_class("vt-busy"));
    }

    #[test]
    fn test_no_runtime_degrades_to_fallback() {
        let doc = Arc::new(MemoryDocument::new());
        let animator = Arc::new(MemoryAnimator::new(AnimatorMode::Immediate));
        let orchestrator = TransitionOrchestrator::new(doc, Some(animator.clone()));
        let journal: Journal = Arc::default();
        let handle = orchestrator.run(commit(&journal), &journaled(&journal));
        assert_eq!(handle.path(), TransitionPath::Fallback);
        assert_eq!(animator.started(), 0);
        assert_eq!(*journal.lock().unwrap(), vec!["start", "commit", "finished"]);
    }
}
