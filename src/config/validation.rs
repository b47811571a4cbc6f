//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the route tree compiles (index shape, templates, param collisions)
//! - Validate value ranges (log level, transition names)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::RouterConfig;
use crate::routing::compiler::{check_definitions, CompileError};
use crate::transition::TransitionPreset;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug)]
pub enum ValidationError {
    /// The route tree would not compile.
    Route(CompileError),
    UnknownLogLevel(String),
    /// A transition name or attribute that cannot be written to the root.
    EmptyTransitionField(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Route(e) => write!(f, "route: {}", e),
            ValidationError::UnknownLogLevel(level) => write!(f, "unknown log level '{}'", level),
            ValidationError::EmptyTransitionField(field) => {
                write!(f, "navigation.default_transition.{} must not be empty", field)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors: Vec<ValidationError> = check_definitions(&config.routes)
        .into_iter()
        .map(ValidationError::Route)
        .collect();

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    match &config.navigation.default_transition {
        TransitionPreset::Named(name) if name.trim().is_empty() => {
            errors.push(ValidationError::EmptyTransitionField("name"));
        }
        TransitionPreset::Detailed { name, attribute, .. } => {
            if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
                errors.push(ValidationError::EmptyTransitionField("name"));
            }
            if attribute.as_deref().is_some_and(|a| a.trim().is_empty()) {
                errors.push(ValidationError::EmptyTransitionField("attribute"));
            }
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
