//! Application root.
//!
//! Owns the canonical state, the action table, the subscriber bus, the
//! render cycle, the delegated listeners and the optional router for one
//! mount element.
//!
//! ```text
//! dispatch ──→ action ──→ merge ──→ schedule ──→ view(state, helpers) ──→ renderer
//!                                      ↑
//!                      fragment change ┘
//! ```

mod builder;
mod helpers;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::action::{ActionTable, Payload};
use crate::bus::{Bus, Subscription};
use crate::config::MarkerNames;
use crate::delegate;
use crate::host::{DomEvent, EventKind, Host, ListenerId, NodeId};
use crate::render::Renderer;
use crate::router::{self, Routes};
use crate::scheduler::Scheduler;
use crate::state::{State, ROUTE_FIELD};

pub use builder::{AppBuilder, MountTarget};
pub use helpers::Helpers;

/// Root view: renders the whole state to markup.
pub type View = Rc<dyn Fn(&State, &Helpers) -> String>;

/// Outcome of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler ran, state was replaced and a render was scheduled.
    Committed,
    /// No handler under that name; nothing changed.
    Unknown,
    /// The application was destroyed; nothing changed.
    Detached,
}

impl Dispatch {
    pub fn is_committed(self) -> bool {
        self == Self::Committed
    }
}

struct Inner {
    me: Weak<Inner>,
    host: Rc<dyn Host>,
    mount: NodeId,
    state: RefCell<State>,
    actions: ActionTable,
    view: View,
    routes: Option<Routes>,
    bus: Bus,
    scheduler: Scheduler,
    helpers: Helpers,
    renderer: RefCell<Box<dyn Renderer>>,
    markers: MarkerNames,
    coalesce: bool,
    render_pending: Cell<bool>,
    listeners: RefCell<Vec<ListenerId>>,
    destroyed: Cell<bool>,
    renders: Cell<u64>,
}

impl Inner {
    fn dispatch(&self, name: &str, payload: Payload) -> Dispatch {
        if self.destroyed.get() {
            tracing::debug!(target: "markpen::app", action = name, "dispatch after destroy ignored");
            return Dispatch::Detached;
        }
        let Some(action) = self.actions.get(name) else {
            tracing::warn!(target: "markpen::app", action = name, "no such action");
            return Dispatch::Unknown;
        };

        // No borrow is held while user code runs.
        let current = self.state.borrow().clone();
        let delta = action.apply(&current, &payload);
        {
            let mut state = self.state.borrow_mut();
            let next = state.merge(delta);
            *state = next;
        }
        tracing::trace!(target: "markpen::app", action = name, "committed");

        self.schedule_render();
        Dispatch::Committed
    }

    fn schedule_render(&self) {
        if self.coalesce && self.render_pending.replace(true) {
            tracing::trace!(target: "markpen::app", "render already pending");
            return;
        }
        let me = self.me.clone();
        self.scheduler.schedule(move || {
            if let Some(inner) = me.upgrade() {
                inner.render_pending.set(false);
                inner.render();
            }
        });
    }

    fn render(&self) {
        if self.destroyed.get() {
            return;
        }
        let state = self.state.borrow().clone();
        let markup = (self.view)(&state, &self.helpers);
        if self.destroyed.get() {
            return;
        }
        self.renderer
            .borrow_mut()
            .commit(self.host.as_ref(), self.mount, &markup);
        self.renders.set(self.renders.get() + 1);
    }

    fn handle_event(&self, event: &DomEvent) {
        if self.destroyed.get() {
            return;
        }
        let Some(trigger) =
            delegate::find_trigger(self.host.as_ref(), self.mount, event, &self.markers)
        else {
            return;
        };
        if *event.kind() == EventKind::Submit {
            event.prevent_default();
        }
        tracing::debug!(
            target: "markpen::app",
            action = %trigger.action,
            event = %event.kind(),
            "delegated trigger"
        );
        self.dispatch(&trigger.action, Payload::from_event(event.info(), trigger.value));
    }

    fn sync_route(&self) {
        if self.destroyed.get() {
            return;
        }
        let path = router::path_from_fragment(&self.host.location_fragment());
        tracing::debug!(target: "markpen::router", path = %path, "route changed");
        {
            let mut state = self.state.borrow_mut();
            let next = state.with(ROUTE_FIELD, path);
            *state = next;
        }
        self.schedule_render();
    }

    fn route(&self) -> String {
        let state = self.state.borrow().clone();
        router::resolve(self.routes.as_ref(), &state, &self.helpers)
    }
}

/// A running application bound to one mount element.
pub struct App {
    inner: Rc<Inner>,
}

impl App {
    pub fn builder(host: Rc<dyn Host>) -> AppBuilder {
        AppBuilder::new(host)
    }

    /// Current state. Treat as read-only; change it through actions.
    pub fn state(&self) -> State {
        self.inner.state.borrow().clone()
    }

    /// Run the named action and schedule one render.
    pub fn dispatch(&self, action: &str, payload: impl Into<Payload>) -> Dispatch {
        self.inner.dispatch(action, payload.into())
    }

    /// Alias of [`App::dispatch`].
    pub fn trigger(&self, action: &str, payload: impl Into<Payload>) -> Dispatch {
        self.dispatch(action, payload)
    }

    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.inner.bus.subscribe(event, handler)
    }

    /// Synchronously call the subscribers of `event`. Returns how many ran.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        self.inner.bus.emit(event, payload)
    }

    /// Run `callback` after the current turn.
    pub fn schedule<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.inner.scheduler.schedule(callback);
    }

    /// Markup of the route matching the current state.
    pub fn route(&self) -> String {
        self.inner.route()
    }

    pub fn helpers(&self) -> Helpers {
        self.inner.helpers.clone()
    }

    pub fn mount(&self) -> NodeId {
        self.inner.mount
    }

    pub fn routing_enabled(&self) -> bool {
        self.inner.routes.is_some()
    }

    /// Number of renders committed so far.
    pub fn render_count(&self) -> u64 {
        self.inner.renders.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Detach every listener, drop all subscribers and clear the mount.
    ///
    /// Later dispatches report [`Dispatch::Detached`] and renders already
    /// scheduled do nothing.
    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return;
        }
        let listeners = std::mem::take(&mut *inner.listeners.borrow_mut());
        for id in listeners {
            inner.host.remove_listener(id);
        }
        inner.bus.clear();
        inner
            .renderer
            .borrow_mut()
            .clear(inner.host.as_ref(), inner.mount);
        tracing::debug!(target: "markpen::app", mount = %inner.mount, "destroyed");
    }
}
