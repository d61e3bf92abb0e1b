//! Application state record.
//!
//! State is a JSON object behind an `Arc`. Commits never edit the map in
//! place: every merge produces a fresh record, so a changed reference is a
//! reliable "something was committed" signal.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Partial state returned by an action handler.
pub type Delta = Map<String, Value>;

/// Field the router keeps the current path in.
pub const ROUTE_FIELD: &str = "route";

/// Turn a handler's return value into a delta. Only objects merge.
pub fn delta(value: Value) -> Option<Delta> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("state is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("state must serialize to an object, got {kind}")]
    NotAnObject { kind: &'static str },
}

#[derive(Debug, Clone, Default)]
pub struct State(Arc<Map<String, Value>>);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep copy of any serializable record.
    pub fn snapshot<T: Serialize + ?Sized>(value: &T) -> Result<Self, SnapshotError> {
        Self::try_from(serde_json::to_value(value)?)
    }

    /// Copy that shares nothing with `self`.
    pub fn detach(&self) -> Self {
        Self(Arc::new(self.0.as_ref().clone()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Current router path, if routing has put one in state.
    pub fn route(&self) -> Option<&str> {
        self.get_str(ROUTE_FIELD).filter(|route| !route.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.as_ref().clone())
    }

    /// Shallow merge: delta fields overwrite, missing fields are kept.
    ///
    /// Always returns a new record, even for an absent or empty delta.
    pub fn merge(&self, delta: Option<Delta>) -> Self {
        let mut next = self.0.as_ref().clone();
        if let Some(delta) = delta {
            for (key, value) in delta {
                next.insert(key, value);
            }
        }
        Self(Arc::new(next))
    }

    /// New record with a single field replaced.
    pub fn with(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut delta = Delta::new();
        delta.insert(key.to_string(), value.into());
        self.merge(Some(delta))
    }

    /// True if both handles point at the same committed record.
    pub fn ptr_eq(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl From<Map<String, Value>> for State {
    fn from(map: Map<String, Value>) -> Self {
        Self(Arc::new(map))
    }
}

impl TryFrom<Value> for State {
    type Error = SnapshotError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self::from(map)),
            Value::Null => Err(SnapshotError::NotAnObject { kind: "null" }),
            Value::Bool(_) => Err(SnapshotError::NotAnObject { kind: "bool" }),
            Value::Number(_) => Err(SnapshotError::NotAnObject { kind: "number" }),
            Value::String(_) => Err(SnapshotError::NotAnObject { kind: "string" }),
            Value::Array(_) => Err(SnapshotError::NotAnObject { kind: "array" }),
        }
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}
