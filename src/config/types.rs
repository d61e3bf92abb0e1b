use serde::{Deserialize, Serialize};

use crate::host::EventKind;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Attribute names that mark triggers in rendered markup.
    #[serde(default)]
    pub markers: MarkerNames,
    /// Event types bound on the mount element (default: click, change,
    /// input, submit, keydown, keyup).
    #[serde(default = "default_delegated_events")]
    pub delegated_events: Vec<String>,
    /// Collapse render requests made in the same turn into one (default: false).
    #[serde(default)]
    pub coalesce_renders: bool,
    /// Tracing filter used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

/// Trigger marker attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerNames {
    /// Action name to dispatch (default: "data-action").
    #[serde(default = "default_action_marker")]
    pub action: String,
    /// Event type the trigger answers to (default: "data-action-event").
    #[serde(default = "default_event_marker")]
    pub event: String,
    /// Explicit payload value (default: "data-action-value").
    #[serde(default = "default_value_marker")]
    pub value: String,
}

fn default_delegated_events() -> Vec<String> {
    ["click", "change", "input", "submit", "keydown", "keyup"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_action_marker() -> String {
    "data-action".to_string()
}

fn default_event_marker() -> String {
    "data-action-event".to_string()
}

fn default_value_marker() -> String {
    "data-action-value".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            markers: MarkerNames::default(),
            delegated_events: default_delegated_events(),
            coalesce_renders: false,
            log_filter: default_log_filter(),
        }
    }
}

impl Default for MarkerNames {
    fn default() -> Self {
        Self {
            action: default_action_marker(),
            event: default_event_marker(),
            value: default_value_marker(),
        }
    }
}

impl RuntimeConfig {
    /// Delegated event names as event kinds, in configured order.
    pub fn event_kinds(&self) -> Vec<EventKind> {
        self.delegated_events
            .iter()
            .map(|name| EventKind::parse(name))
            .collect()
    }
}
