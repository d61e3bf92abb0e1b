//! A small client-side UI runtime.
//!
//! An [`App`] owns one record of state, a table of named actions and a view
//! function. Actions return deltas that are merged into a fresh state; each
//! dispatch schedules a render that replaces the mount element's content.
//! Rendered markup names its own triggers through marker attributes, and a
//! handful of listeners bound on the mount element route events back to
//! actions. An optional hash router picks a view from `state.route`.
//!
//! The document is reached only through the [`Host`] trait. [`MemoryHost`]
//! is an in-memory implementation used by the tests and the demo binary.

pub mod action;
pub mod app;
pub mod bus;
pub mod component;
pub mod config;
pub mod delegate;
pub mod error;
pub mod host;
pub mod logging;
pub mod markup;
pub mod render;
pub mod router;
pub mod scheduler;
pub mod state;

pub use action::{Action, ActionTable, Payload};
pub use app::{App, AppBuilder, Dispatch, Helpers, MountTarget};
pub use bus::{Bus, Subscription};
pub use component::{Component, Registry};
pub use config::{LoadError, MarkerNames, RuntimeConfig};
pub use error::ConfigurationError;
pub use host::{DomEvent, EventKind, Host, MemoryHost, NodeId};
pub use render::{ReplaceRenderer, Renderer};
pub use router::{RouteEntry, Routes};
pub use state::{delta, Delta, State};
