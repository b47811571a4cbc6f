//! Transition settings.
//!
//! A transition is either disabled or enabled with a [`TransitionConfig`]
//! describing the root decoration and lifecycle hooks. Settings convert from
//! the shorthand shapes callers use: `false` disables, `true` enables with
//! defaults, a string names the transition.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Root attribute set to the transition name while it runs.
pub const DEFAULT_ATTRIBUTE: &str = "data-vt";

/// Lifecycle callback.
pub type TransitionHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct TransitionConfig {
    /// Written to `attribute` on the document root for the duration.
    pub name: Option<String>,
    /// Added to the document root's classes for the duration.
    pub class_name: Option<String>,
    pub attribute: String,
    on_start: Option<TransitionHook>,
    on_ready: Option<TransitionHook>,
    on_finished: Option<TransitionHook>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            name: None,
            class_name: None,
            attribute: DEFAULT_ATTRIBUTE.to_string(),
            on_start: None,
            on_ready: None,
            on_finished: None,
        }
    }
}

impl fmt::Debug for TransitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionConfig")
            .field("name", &self.name)
            .field("class_name", &self.class_name)
            .field("attribute", &self.attribute)
            .field("on_start", &self.on_start.is_some())
            .field("on_ready", &self.on_ready.is_some())
            .field("on_finished", &self.on_finished.is_some())
            .finish()
    }
}

impl TransitionConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    pub fn on_start(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Arc::new(hook));
        self
    }

    pub fn on_ready(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_ready = Some(Arc::new(hook));
        self
    }

    pub fn on_finished(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_finished = Some(Arc::new(hook));
        self
    }

    pub(crate) fn fire_start(&self) {
        if let Some(hook) = &self.on_start {
            hook();
        }
    }

    pub(crate) fn fire_ready(&self) {
        if let Some(hook) = &self.on_ready {
            hook();
        }
    }

    pub(crate) fn fire_finished(&self) {
        if let Some(hook) = &self.on_finished {
            hook();
        }
    }
}

/// Whether, and how, a commit is wrapped in a transition.
#[derive(Debug, Clone)]
pub enum TransitionSetting {
    Disabled,
    Enabled(TransitionConfig),
}

impl Default for TransitionSetting {
    fn default() -> Self {
        TransitionSetting::Enabled(TransitionConfig::default())
    }
}

impl TransitionSetting {
    pub fn is_enabled(&self) -> bool {
        matches!(self, TransitionSetting::Enabled(_))
    }
}

impl From<bool> for TransitionSetting {
    fn from(enabled: bool) -> Self {
        if enabled {
            TransitionSetting::default()
        } else {
            TransitionSetting::Disabled
        }
    }
}

impl From<&str> for TransitionSetting {
    fn from(name: &str) -> Self {
        TransitionSetting::Enabled(TransitionConfig::named(name))
    }
}

impl From<String> for TransitionSetting {
    fn from(name: String) -> Self {
        TransitionSetting::Enabled(TransitionConfig::named(name))
    }
}

impl From<TransitionConfig> for TransitionSetting {
    fn from(config: TransitionConfig) -> Self {
        TransitionSetting::Enabled(config)
    }
}

/// Serializable transition shorthand, as written in config files:
/// `true`, `"fade"` or `{ name = "fade", class_name = "vt" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransitionPreset {
    Toggle(bool),
    Named(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        class_name: Option<String>,
        #[serde(default)]
        attribute: Option<String>,
    },
}

impl Default for TransitionPreset {
    fn default() -> Self {
        TransitionPreset::Toggle(true)
    }
}

impl From<&TransitionPreset> for TransitionSetting {
    fn from(preset: &TransitionPreset) -> Self {
        match preset {
            TransitionPreset::Toggle(enabled) => TransitionSetting::from(*enabled),
            TransitionPreset::Named(name) => TransitionSetting::from(name.as_str()),
            TransitionPreset::Detailed {
                name,
                class_name,
                attribute,
            } => TransitionSetting::Enabled(TransitionConfig {
                name: name.clone(),
                class_name: class_name.clone(),
                attribute: attribute
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ATTRIBUTE.to_string()),
                ..TransitionConfig::default()
            }),
        }
    }
}
