//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! route file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, route tree included)
//!     → RouterConfig (validated, immutable)
//!     → Router::new
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → channel → Router::set_routes (new table identity, recompiled once)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{MatchingConfig, NavigationConfig, ObservabilityConfig, RouterConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::{RouteFileWatcher, RouteReloader};
