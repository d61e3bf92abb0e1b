//! Subscriber bus: named events with ordered callbacks.
//!
//! Independent of the action table; emitting never touches state.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::Value;

pub type Handler = Rc<dyn Fn(&Value)>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    topics: HashMap<String, Vec<(u64, Handler)>>,
}

#[derive(Clone, Default)]
pub struct Bus {
    inner: Rc<RefCell<Subscribers>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner
            .topics
            .entry(event.to_string())
            .or_default()
            .push((id, Rc::new(handler)));
        Subscription {
            bus: Rc::downgrade(&self.inner),
            event: event.to_string(),
            id,
            active: Cell::new(true),
        }
    }

    /// Call every handler registered for `event` right now, in order.
    ///
    /// The list is snapshotted first: handlers added or removed while
    /// emitting only affect later emissions. Returns the number invoked.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        let handlers: Vec<Handler> = match self.inner.borrow().topics.get(event) {
            Some(list) => list.iter().map(|(_, handler)| Rc::clone(handler)).collect(),
            None => return 0,
        };
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    /// Drop every subscriber.
    pub fn clear(&self) {
        self.inner.borrow_mut().topics.clear();
    }

    /// Event names with at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.inner.borrow().topics.len()
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .topics
            .get(event)
            .map_or(0, Vec::len)
    }
}

/// Registration handle. Dropping it does not unsubscribe.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<RefCell<Subscribers>>,
    event: String,
    id: u64,
    active: Cell<bool>,
}

impl Subscription {
    /// Remove the handler. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(inner) = self.bus.upgrade() {
            let mut inner = inner.borrow_mut();
            if let Some(list) = inner.topics.get_mut(&self.event) {
                list.retain(|(id, _)| *id != self.id);
                if list.is_empty() {
                    inner.topics.remove(&self.event);
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn event(&self) -> &str {
        &self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Box<dyn Fn(&Value)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |tag: &'static str| -> Box<dyn Fn(&Value)> {
            let sink = Rc::clone(&sink);
            Box::new(move |value: &Value| sink.borrow_mut().push(format!("{tag}:{value}")))
        };
        (log, make)
    }

    #[test]
    fn emit_runs_handlers_in_registration_order() {
        let bus = Bus::new();
        let (log, make) = recorder();
        bus.subscribe("ready", make("a"));
        bus.subscribe("ready", make("b"));
        bus.subscribe("other", make("c"));

        assert_eq!(bus.emit("ready", &json!(1)), 2);
        assert_eq!(*log.borrow(), vec!["a:1", "b:1"]);
        assert_eq!(bus.emit("nobody", &json!(null)), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = Bus::new();
        let (log, make) = recorder();
        let first = bus.subscribe("e", make("a"));
        bus.subscribe("e", make("b"));

        first.unsubscribe();
        first.unsubscribe();
        assert!(!first.is_active());
        assert_eq!(bus.subscriber_count("e"), 1);
        bus.emit("e", &json!("x"));
        assert_eq!(*log.borrow(), vec![r#"b:"x""#]);
    }

    #[test]
    fn subscribing_during_emit_affects_only_later_emits() {
        let bus = Bus::new();
        let hits = Rc::new(Cell::new(0));
        let inner_bus = bus.clone();
        let inner_hits = Rc::clone(&hits);
        bus.subscribe("e", move |_: &Value| {
            let hits = Rc::clone(&inner_hits);
            inner_bus.subscribe("e", move |_: &Value| hits.set(hits.get() + 1));
        });

        assert_eq!(bus.emit("e", &Value::Null), 1);
        assert_eq!(hits.get(), 0);
        assert_eq!(bus.emit("e", &Value::Null), 2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn clear_empties_every_topic() {
        let bus = Bus::new();
        let (_, make) = recorder();
        let sub = bus.subscribe("a", make("a"));
        bus.subscribe("b", make("b"));
        bus.clear();
        assert_eq!(bus.subscriber_count("a"), 0);
        assert_eq!(bus.subscriber_count("b"), 0);
        assert_eq!(bus.topic_count(), 0);
        sub.unsubscribe();
    }

    #[test]
    fn last_unsubscribe_forgets_the_topic() {
        let bus = Bus::new();
        let (_, make) = recorder();
        let first = bus.subscribe("e", make("a"));
        let second = bus.subscribe("e", make("b"));
        bus.subscribe("kept", make("c"));

        first.unsubscribe();
        assert_eq!(bus.topic_count(), 2);
        second.unsubscribe();
        assert_eq!(bus.topic_count(), 1);
        assert_eq!(bus.emit("e", &Value::Null), 0);

        bus.subscribe("e", make("d"));
        assert_eq!(bus.subscriber_count("e"), 1);
    }
}
