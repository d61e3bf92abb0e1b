use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::Serialize;

use super::{App, Helpers, Inner, View};
use crate::action::{ActionTable, Payload};
use crate::bus::Bus;
use crate::component::Registry;
use crate::config::RuntimeConfig;
use crate::error::ConfigurationError;
use crate::host::{DomEvent, Host, NodeId};
use crate::render::{ReplaceRenderer, Renderer};
use crate::router::{self, RouteEntry, Routes};
use crate::scheduler::Scheduler;
use crate::state::{Delta, State, ROUTE_FIELD};

/// Where to mount: an existing node or a selector resolved at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountTarget {
    Node(NodeId),
    Selector(String),
}

impl From<NodeId> for MountTarget {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for MountTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for MountTarget {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

/// Collects an application's parts; [`AppBuilder::build`] validates them
/// and mounts.
pub struct AppBuilder {
    host: Rc<dyn Host>,
    root: Option<MountTarget>,
    state: State,
    actions: ActionTable,
    view: Option<View>,
    routes: Option<Routes>,
    components: Registry,
    config: RuntimeConfig,
    renderer: Option<Box<dyn Renderer>>,
}

impl AppBuilder {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self {
            host,
            root: None,
            state: State::new(),
            actions: ActionTable::new(),
            view: None,
            routes: None,
            components: Registry::new(),
            config: RuntimeConfig::default(),
            renderer: None,
        }
    }

    pub fn root(mut self, target: impl Into<MountTarget>) -> Self {
        self.root = Some(target.into());
        self
    }

    /// Initial state. The application keeps its own copy.
    pub fn state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    /// Initial state from any serializable record.
    ///
    /// A value that doesn't serialize to an object is ignored and the
    /// previous initial state is kept.
    pub fn state_from<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match State::snapshot(value) {
            Ok(state) => self.state = state,
            Err(e) => {
                tracing::debug!(target: "markpen::app", error = %e, "initial state not copied, keeping previous");
            }
        }
        self
    }

    pub fn actions(mut self, actions: ActionTable) -> Self {
        self.actions = actions;
        self
    }

    pub fn action<F>(mut self, name: &str, action: F) -> Self
    where
        F: Fn(&State, &Payload) -> Option<Delta> + 'static,
    {
        self.actions.insert(name, action);
        self
    }

    pub fn view<F>(mut self, view: F) -> Self
    where
        F: Fn(&State, &Helpers) -> String + 'static,
    {
        self.view = Some(Rc::new(view));
        self
    }

    /// Enable hash routing.
    pub fn routes(mut self, routes: Routes) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Add one route, enabling routing.
    pub fn route(mut self, path: &str, entry: RouteEntry) -> Self {
        self.routes.get_or_insert_with(Routes::new).insert(path, entry);
        self
    }

    /// Components reachable through [`Helpers::components`].
    pub fn components(mut self, components: Registry) -> Self {
        self.components = components;
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default [`ReplaceRenderer`].
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Validate, attach listeners and render once.
    ///
    /// On error nothing has been attached to the host.
    pub fn build(self) -> Result<App, ConfigurationError> {
        let host = self.host;
        let mount = match self.root.ok_or(ConfigurationError::MissingRoot)? {
            MountTarget::Node(node) if host.contains(node) => node,
            MountTarget::Node(node) => {
                return Err(ConfigurationError::RootNotFound {
                    target: node.to_string(),
                })
            }
            MountTarget::Selector(selector) => host
                .resolve(&selector)
                .ok_or(ConfigurationError::RootNotFound { target: selector })?,
        };
        let view = self.view.ok_or(ConfigurationError::MissingView)?;
        self.config.validate()?;

        let mut state = self.state.detach();
        if self.routes.is_some() {
            let path = router::path_from_fragment(&host.location_fragment());
            state = state.with(ROUTE_FIELD, path);
        }

        let bus = Bus::new();
        let scheduler = Scheduler::new(Rc::clone(&host));
        let renderer = self
            .renderer
            .unwrap_or_else(|| Box::new(ReplaceRenderer) as Box<dyn Renderer>);
        let components = self.components;
        let actions = self.actions;
        let routes = self.routes;
        let markers = self.config.markers.clone();
        let coalesce = self.config.coalesce_renders;

        let inner = Rc::new_cyclic(|me: &Weak<Inner>| Inner {
            me: me.clone(),
            host: Rc::clone(&host),
            mount,
            state: RefCell::new(state),
            actions,
            view,
            routes,
            bus: bus.clone(),
            scheduler: scheduler.clone(),
            helpers: Helpers::new(me.clone(), bus, scheduler, components),
            renderer: RefCell::new(renderer),
            markers,
            coalesce,
            render_pending: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
            renders: Cell::new(0),
        });

        let mut listeners = Vec::new();
        for kind in self.config.event_kinds() {
            let me = Rc::downgrade(&inner);
            let id = host.add_listener(
                mount,
                kind,
                Rc::new(move |event: &DomEvent| {
                    if let Some(inner) = me.upgrade() {
                        inner.handle_event(event);
                    }
                }),
            );
            listeners.push(id);
        }
        if inner.routes.is_some() {
            let me = Rc::downgrade(&inner);
            listeners.push(host.on_fragment_change(Rc::new(move || {
                if let Some(inner) = me.upgrade() {
                    inner.sync_route();
                }
            })));
        }
        *inner.listeners.borrow_mut() = listeners;

        tracing::debug!(
            target: "markpen::app",
            %mount,
            actions = inner.actions.len(),
            routing = inner.routes.is_some(),
            "mounted"
        );
        inner.render();
        Ok(App { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn node_targets_must_exist() {
        let host = Rc::new(MemoryHost::new("<main></main>"));
        let result = App::builder(host)
            .root(NodeId::new(999))
            .view(|_, _| String::new())
            .build();
        assert!(matches!(result, Err(ConfigurationError::RootNotFound { .. })));
    }

    #[test]
    fn invalid_config_attaches_nothing() {
        let host = Rc::new(MemoryHost::new(r#"<main id="app"></main>"#));
        let config = RuntimeConfig {
            delegated_events: Vec::new(),
            ..RuntimeConfig::default()
        };
        let result = App::builder(host.clone())
            .root("#app")
            .view(|_, _| String::new())
            .config(config)
            .build();
        assert!(matches!(result, Err(ConfigurationError::InvalidConfig(_))));
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn single_routes_enable_routing() {
        let host = Rc::new(MemoryHost::new(r#"<main id="app"></main>"#));
        let app = App::builder(host.clone())
            .root("#app")
            .route("/", RouteEntry::markup("home"))
            .view(|_, helpers| helpers.route())
            .build()
            .expect("app");
        assert!(app.routing_enabled());
        assert_eq!(host.inner_html(app.mount()), "home");
    }

    #[test]
    fn one_listener_per_delegated_event() {
        let host = Rc::new(MemoryHost::new(r#"<main id="app"></main>"#));
        let config = RuntimeConfig {
            delegated_events: vec!["click".to_string(), "input".to_string()],
            ..RuntimeConfig::default()
        };
        let _app = App::builder(host.clone())
            .root("#app")
            .view(|_, _| String::new())
            .config(config)
            .build()
            .expect("app");
        assert_eq!(host.listener_count(), 2);
    }
}
