//! Route file watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify event (modify / create)
//!     → RouteReloader::reload: load_config + validate
//!         invalid or same routes → dropped (logged)
//!         new routes             → channel → Router::set_routes
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RouterConfig;
use crate::routing::RouteDefinition;

/// Reloads a route file and remembers the last table it handed out.
///
/// Editors often emit several events for one save; only a revision whose
/// routes differ from the previous one is reported.
#[derive(Debug)]
pub struct RouteReloader {
    path: PathBuf,
    last_routes: Option<Vec<RouteDefinition>>,
}

impl RouteReloader {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            last_routes: None,
        }
    }

    /// Seed the reloader with the table already in use.
    pub fn with_current(mut self, routes: Vec<RouteDefinition>) -> Self {
        self.last_routes = Some(routes);
        self
    }

    /// Load the file. Returns the config only when it is valid and its
    /// routes changed.
    pub fn reload(&mut self) -> Option<RouterConfig> {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Failed to reload routes, keeping current table");
                return None;
            }
        };
        if self.last_routes.as_ref() == Some(&config.routes) {
            tracing::debug!(path = ?self.path, "Route file saved without route changes");
            return None;
        }
        self.last_routes = Some(config.routes.clone());
        tracing::info!(path = ?self.path, routes = config.routes.len(), "Route table reloaded");
        Some(config)
    }
}

/// Watches a route file and sends every changed, valid revision over a
/// channel.
///
/// The consumer feeds `config.routes` to `Router::set_routes`, which gives
/// the table a new identity and forces one recompile.
pub struct RouteFileWatcher {
    reloader: RouteReloader,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl RouteFileWatcher {
    /// Returns the watcher and the receiving end for reloaded configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                reloader: RouteReloader::new(path),
                update_tx,
            },
            update_rx,
        )
    }

    /// Skip revisions identical to `routes`, the table the router already has.
    pub fn with_current(mut self, routes: Vec<RouteDefinition>) -> Self {
        self.reloader = self.reloader.with_current(routes);
        self
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            mut reloader,
            update_tx,
        } = self;
        let path = reloader.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::debug!(kind = ?event.kind, "Route file change detected");
                    if let Some(config) = reloader.reload() {
                        let _ = update_tx.send(config);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Route file watcher started");
        Ok(watcher)
    }
}
