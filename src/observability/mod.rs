//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters via the metrics facade)
//!
//! Consumers:
//!     → Log output (stdout, filtered by RUST_LOG or config)
//!     → Whatever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics exporter itself
//! - Without a recorder, metric updates are no-ops
//! - Logging init is idempotent so tests and the CLI can both call it

pub mod logging;
pub mod metrics;
