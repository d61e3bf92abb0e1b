//! Actions: named handlers that turn (state, payload) into a delta.
//!
//! ```text
//! dispatch ──→ Action ──→ Delta ──→ merge ──→ render
//!    ↑                                          │
//!    └───────────── delegated events ───────────┘
//! ```
//!
//! Handlers only ever see `&State`, so the one way to change state is to
//! return a delta. The table is an open, string-keyed registry: names come
//! from trigger markers in rendered markup.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::host::EventInfo;
use crate::state::{Delta, State};

/// Argument handed to an action handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    /// Caller-supplied value, or the trigger's value for delegated events.
    pub value: Value,
    /// The event that caused a delegated dispatch.
    pub event: Option<EventInfo>,
}

impl Payload {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            event: None,
        }
    }

    pub fn from_event(event: EventInfo, value: Option<String>) -> Self {
        Self {
            value: value.map_or(Value::Null, Value::String),
            event: Some(event),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.value.as_i64()
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::value(value)
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

/// A state transition.
///
/// Must be pure: read the state, return the fields that change. `None`
/// commits nothing but still counts as a dispatch.
pub trait Action {
    fn apply(&self, state: &State, payload: &Payload) -> Option<Delta>;
}

impl<F> Action for F
where
    F: Fn(&State, &Payload) -> Option<Delta>,
{
    fn apply(&self, state: &State, payload: &Payload) -> Option<Delta> {
        self(state, payload)
    }
}

#[derive(Clone, Default)]
pub struct ActionTable {
    actions: HashMap<String, Rc<dyn Action>>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ActionTable::insert`].
    pub fn on<A: Action + 'static>(mut self, name: &str, action: A) -> Self {
        self.insert(name, action);
        self
    }

    /// Register `action` under `name`, replacing any previous handler.
    pub fn insert<A: Action + 'static>(&mut self, name: &str, action: A) {
        self.actions.insert(name.to_string(), Rc::new(action));
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTable")
            .field("actions", &self.names())
            .finish()
    }
}
