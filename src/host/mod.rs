//! Host facilities consumed by the runtime.
//!
//! The runtime never touches a document directly. Element lookup, content
//! replacement, listener wiring, the location fragment and the task queues
//! all go through the [`Host`] trait, so the same application root can run
//! against a browser binding or the in-memory [`MemoryHost`].

pub mod memory;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

pub use memory::MemoryHost;

/// Handle to an element owned by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Handle returned when a listener is attached, used to detach it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Native event types the runtime knows by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Change,
    Input,
    Submit,
    KeyDown,
    KeyUp,
    /// Any other event name, kept verbatim.
    Other(String),
}

impl EventKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "click" => Self::Click,
            "change" => Self::Change,
            "input" => Self::Input,
            "submit" => Self::Submit,
            "keydown" => Self::KeyDown,
            "keyup" => Self::KeyUp,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Click => "click",
            Self::Change => "change",
            Self::Input => "input",
            Self::Submit => "submit",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

/// A native event travelling from its target up through the ancestors.
#[derive(Debug)]
pub struct DomEvent {
    kind: EventKind,
    target: NodeId,
    key: Option<String>,
    default_prevented: Cell<bool>,
}

impl DomEvent {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            key: None,
            default_prevented: Cell::new(false),
        }
    }

    /// Attach the pressed key (keyboard events).
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Element the event originated on.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Cancel the host's default behaviour (form navigation on submit).
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Owned copy of the event fields, for handing to action handlers.
    pub fn info(&self) -> EventInfo {
        EventInfo {
            kind: self.kind.clone(),
            target: self.target,
            key: self.key.clone(),
        }
    }
}

/// Snapshot of the event that caused a delegated dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInfo {
    pub kind: EventKind,
    pub target: NodeId,
    pub key: Option<String>,
}

/// Deferred unit of work queued on the host.
pub type Task = Box<dyn FnOnce()>;

/// Element event listener.
pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// Location fragment change listener.
pub type FragmentListener = Rc<dyn Fn()>;

/// The document, location and event-loop facilities an application root needs.
pub trait Host {
    /// Find the first element matching a locator string.
    fn resolve(&self, selector: &str) -> Option<NodeId>;

    /// True if the node is an element currently attached to the document.
    fn contains(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Live value of a form control, `None` for elements without one.
    fn native_value(&self, node: NodeId) -> Option<String>;

    /// Replace every child of `node` with the parsed `markup`.
    fn set_content(&self, node: NodeId, markup: &str);

    fn add_listener(&self, node: NodeId, kind: EventKind, listener: Listener) -> ListenerId;

    fn on_fragment_change(&self, listener: FragmentListener) -> ListenerId;

    /// Detach an element or fragment listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);

    /// Current location fragment including its leading `#`, or empty.
    fn location_fragment(&self) -> String;

    /// Queue a task to run once the current synchronous turn unwinds.
    ///
    /// Hosts without a microtask facility hand the task back.
    fn queue_microtask(&self, task: Task) -> Result<(), Task>;

    fn set_timeout(&self, task: Task, delay: Duration);
}
