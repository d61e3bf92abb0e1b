//! Deferred callbacks.
//!
//! Work scheduled here runs after the current synchronous turn, in
//! scheduling order. The host's microtask queue is preferred; hosts without
//! one get a zero-delay timer instead. There is no de-duplication at this
//! level, so N requests run N callbacks.

use std::rc::Rc;
use std::time::Duration;

use crate::host::Host;

#[derive(Clone)]
pub struct Scheduler {
    host: Rc<dyn Host>,
}

impl Scheduler {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn schedule<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        if let Err(task) = self.host.queue_microtask(Box::new(callback)) {
            tracing::trace!(target: "markpen::scheduler", "no microtask queue, using a timer");
            self.host.set_timeout(task, Duration::ZERO);
        }
    }
}
