//! In-memory host capabilities.
//!
//! Headless stand-ins for the browser: a history stack with an entry list
//! and cursor, a document that records what was done to it, and an
//! animator whose milestones the caller can hold open.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use futures_util::future::{self, FutureExt};
use tokio::sync::oneshot;
use url::Url;

use crate::host::{
    AnimatedCommit, AnimatedTransition, AnimationError, AnimationStart, Commit, HistoryEvent,
    HistoryStack, HistoryState, HostDocument, ScrollBehavior,
};

#[derive(Debug)]
struct HistoryInner {
    entries: Vec<(Url, HistoryState)>,
    index: usize,
    events: Vec<HistoryEvent>,
}

/// History stack held in memory.
///
/// `go` moves the cursor and queues a [`HistoryEvent::PopState`]; drain
/// queued events with [`take_events`](MemoryHistory::take_events) and hand
/// them to the router, the way a browser fires `popstate` later.
#[derive(Debug)]
pub struct MemoryHistory {
    inner: Mutex<HistoryInner>,
}

impl MemoryHistory {
    pub fn new(initial: Url) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                entries: vec![(initial, HistoryState::default())],
                index: 0,
                events: Vec::new(),
            }),
        }
    }

    pub fn parse(initial: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(initial)?))
    }

    /// Number of entries on the stack.
    pub fn depth(&self) -> usize {
        self.lock().entries.len()
    }

    /// Position of the current entry.
    pub fn index(&self) -> usize {
        self.lock().index
    }

    pub fn take_events(&self) -> Vec<HistoryEvent> {
        std::mem::take(&mut self.lock().events)
    }

    /// Simulate the user editing the fragment: a new entry plus a
    /// hash-change notification.
    pub fn change_fragment(&self, fragment: &str) {
        let mut inner = self.lock();
        let mut url = inner.entries[inner.index].0.clone();
        url.set_fragment(Some(fragment));
        push_entry(&mut inner, url, HistoryState::default());
        inner.events.push(HistoryEvent::HashChange);
    }

    /// Simulate the host committing a navigation on its own, as an
    /// interception-capable browser does before invoking the handler.
    pub fn commit_external(&self, url: Url, state: HistoryState) {
        let mut inner = self.lock();
        push_entry(&mut inner, url, state);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn push_entry(inner: &mut HistoryInner, url: Url, state: HistoryState) {
    let keep = inner.index + 1;
    inner.entries.truncate(keep);
    inner.entries.push((url, state));
    inner.index = inner.entries.len() - 1;
}

impl HistoryStack for MemoryHistory {
    fn push(&self, state: HistoryState, url: &Url) {
        let mut inner = self.lock();
        push_entry(&mut inner, url.clone(), state);
    }

    fn replace(&self, state: HistoryState, url: &Url) {
        let mut inner = self.lock();
        let index = inner.index;
        inner.entries[index] = (url.clone(), state);
    }

    fn go(&self, delta: i64) {
        let mut inner = self.lock();
        if delta == 0 {
            return;
        }
        let target = i64::try_from(inner.index)
            .ok()
            .and_then(|index| index.checked_add(delta))
            .and_then(|target| usize::try_from(target).ok())
            .filter(|target| *target < inner.entries.len());
        let Some(target) = target else {
            tracing::debug!(delta, index = inner.index, "History motion out of range, ignored");
            return;
        };
        inner.index = target;
        inner.events.push(HistoryEvent::PopState);
    }

    fn current_url(&self) -> Url {
        let inner = self.lock();
        inner.entries[inner.index].0.clone()
    }

    fn current_state(&self) -> Option<HistoryState> {
        let inner = self.lock();
        Some(inner.entries[inner.index].1.clone())
    }
}

/// A decoration change applied to the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecorationEvent {
    SetAttribute { name: String, value: String },
    RemoveAttribute(String),
    AddClass(String),
    RemoveClass(String),
}

#[derive(Debug, Default)]
struct DocumentInner {
    loads: Vec<Url>,
    scrolls: Vec<ScrollBehavior>,
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    log: Vec<DecorationEvent>,
}

/// Document that records loads, scrolls and root decoration.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    inner: Mutex<DocumentInner>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs handed to a full page load.
    pub fn loads(&self) -> Vec<Url> {
        self.lock().loads.clone()
    }

    pub fn scrolls(&self) -> Vec<ScrollBehavior> {
        self.lock().scrolls.clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.lock().attributes.get(name).cloned()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.lock().classes.contains(class)
    }

    pub fn decoration_log(&self) -> Vec<DecorationEvent> {
        self.lock().log.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DocumentInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostDocument for MemoryDocument {
    fn load(&self, url: &Url) {
        self.lock().loads.push(url.clone());
    }

    fn scroll_to_top(&self, behavior: ScrollBehavior) {
        self.lock().scrolls.push(behavior);
    }

    fn set_root_attribute(&self, name: &str, value: &str) {
        let mut inner = self.lock();
        inner.attributes.insert(name.to_string(), value.to_string());
        inner.log.push(DecorationEvent::SetAttribute {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn remove_root_attribute(&self, name: &str) {
        let mut inner = self.lock();
        inner.attributes.remove(name);
        inner.log.push(DecorationEvent::RemoveAttribute(name.to_string()));
    }

    fn add_root_class(&self, class: &str) {
        let mut inner = self.lock();
        inner.classes.insert(class.to_string());
        inner.log.push(DecorationEvent::AddClass(class.to_string()));
    }

    fn remove_root_class(&self, class: &str) {
        let mut inner = self.lock();
        inner.classes.remove(class);
        inner.log.push(DecorationEvent::RemoveClass(class.to_string()));
    }
}

/// How a [`MemoryAnimator`] answers start requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorMode {
    /// Commit at once; both milestones resolve immediately.
    Immediate,
    /// Refuse every request.
    Unsupported,
    /// Commit at once; `finished` stays pending until released.
    Deferred,
    /// Commit at once; `ready` fails, `finished` resolves.
    FailingReady,
}

/// Scriptable animated-commit capability.
#[derive(Debug)]
pub struct MemoryAnimator {
    mode: AnimatorMode,
    started: AtomicUsize,
    pending: Mutex<Vec<oneshot::Sender<Result<(), AnimationError>>>>,
}

impl MemoryAnimator {
    pub fn new(mode: AnimatorMode) -> Self {
        Self {
            mode,
            started: AtomicUsize::new(0),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of animations started.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Resolve every held `finished` milestone. Returns how many.
    pub fn finish_all(&self) -> usize {
        self.release(Ok(()))
    }

    /// Fail every held `finished` milestone. Returns how many.
    pub fn abort_all(&self) -> usize {
        self.release(Err(AnimationError::Aborted("skipped".into())))
    }

    fn release(&self, result: Result<(), AnimationError>) -> usize {
        let senders: Vec<_> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let count = senders.len();
        for tx in senders {
            let _ = tx.send(result.clone());
        }
        count
    }
}

impl AnimatedCommit for MemoryAnimator {
    fn start(&self, commit: Commit) -> AnimationStart {
        if self.mode == AnimatorMode::Unsupported {
            return AnimationStart::Unsupported(commit);
        }

        self.started.fetch_add(1, Ordering::SeqCst);
        commit();

        let ready = match self.mode {
            AnimatorMode::FailingReady => future::ready(Err(AnimationError::Aborted("not ready".into()))).boxed(),
            _ => future::ready(Ok(())).boxed(),
        };
        let finished = match self.mode {
            AnimatorMode::Deferred => {
                let (tx, rx) = oneshot::channel();
                self.pending.lock().unwrap_or_else(PoisonError::into_inner).push(tx);
                rx.map(|received| {
                    received.unwrap_or_else(|_| Err(AnimationError::Aborted("animator dropped".into())))
                })
                .boxed()
            }
            _ => future::ready(Ok(())).boxed(),
        };

        AnimationStart::Started(AnimatedTransition { ready, finished })
    }
}
