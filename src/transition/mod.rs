//! Transition subsystem: settings and the orchestrator that applies them.

pub mod config;
pub mod orchestrator;

pub use config::{TransitionConfig, TransitionHook, TransitionPreset, TransitionSetting, DEFAULT_ATTRIBUTE};
pub use orchestrator::{TransitionHandle, TransitionOrchestrator, TransitionPath};
