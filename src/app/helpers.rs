use std::rc::Weak;

use serde_json::Value;

use super::{Dispatch, Inner};
use crate::action::Payload;
use crate::bus::{Bus, Subscription};
use crate::component::{Component, Registry};
use crate::scheduler::Scheduler;
use crate::state::State;

/// Capabilities handed to views.
///
/// Holds only a weak link to the application, so a view may stash a clone
/// without keeping a destroyed application alive.
#[derive(Clone)]
pub struct Helpers {
    app: Weak<Inner>,
    bus: Bus,
    scheduler: Scheduler,
    components: Registry,
}

impl Helpers {
    pub(super) fn new(app: Weak<Inner>, bus: Bus, scheduler: Scheduler, components: Registry) -> Self {
        Self {
            app,
            bus,
            scheduler,
            components,
        }
    }

    pub fn dispatch(&self, action: &str, payload: impl Into<Payload>) -> Dispatch {
        match self.app.upgrade() {
            Some(inner) => inner.dispatch(action, payload.into()),
            None => Dispatch::Detached,
        }
    }

    pub fn schedule<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.scheduler.schedule(callback);
    }

    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        self.bus.emit(event, payload)
    }

    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.bus.subscribe(event, handler)
    }

    /// Component factory.
    pub fn component<F>(&self, name: &str, render: F) -> Component
    where
        F: Fn(&Value, &str) -> String + 'static,
    {
        Component::new(name, render)
    }

    pub fn components(&self) -> &Registry {
        &self.components
    }

    /// Markup of the current route, empty when routing is off or the
    /// application is gone.
    pub fn route(&self) -> String {
        self.app
            .upgrade()
            .map(|inner| inner.route())
            .unwrap_or_default()
    }

    pub fn state(&self) -> Option<State> {
        self.app.upgrade().map(|inner| inner.state.borrow().clone())
    }
}
