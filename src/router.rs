//! Hash router: maps `state.route` to a view producer.
//!
//! Matching is exact string equality. A path with no entry falls back to
//! the `"404"` entry, then to the `"/"` entry; with neither, nothing is
//! rendered.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::app::Helpers;
use crate::component::Component;
use crate::state::State;

/// Reserved key for the not-found view.
pub const NOT_FOUND: &str = "404";

/// Home path, also the last fallback.
pub const HOME: &str = "/";

pub type RouteView = Rc<dyn Fn(&State, &Helpers) -> String>;

#[derive(Clone)]
pub enum RouteEntry {
    View(RouteView),
    Static(String),
}

impl RouteEntry {
    pub fn view<F>(view: F) -> Self
    where
        F: Fn(&State, &Helpers) -> String + 'static,
    {
        Self::View(Rc::new(view))
    }

    pub fn markup(markup: &str) -> Self {
        Self::Static(markup.to_string())
    }

    /// Render the component with the whole state as its attributes.
    pub fn component(component: Component) -> Self {
        Self::view(move |state, _| component.render(&state.to_value()))
    }

    pub fn produce(&self, state: &State, helpers: &Helpers) -> String {
        match self {
            Self::View(view) => view(state, helpers),
            Self::Static(markup) => markup.clone(),
        }
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View(_) => f.write_str("View(..)"),
            Self::Static(markup) => f.debug_tuple("Static").field(markup).finish(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Routes {
    table: HashMap<String, RouteEntry>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, entry: RouteEntry) -> Self {
        self.insert(path, entry);
        self
    }

    pub fn view<F>(self, path: &str, view: F) -> Self
    where
        F: Fn(&State, &Helpers) -> String + 'static,
    {
        self.route(path, RouteEntry::view(view))
    }

    pub fn markup(self, path: &str, markup: &str) -> Self {
        self.route(path, RouteEntry::markup(markup))
    }

    pub fn component(self, path: &str, component: Component) -> Self {
        self.route(path, RouteEntry::component(component))
    }

    pub fn insert(&mut self, path: &str, entry: RouteEntry) {
        self.table.insert(path.to_string(), entry);
    }

    pub fn get(&self, path: &str) -> Option<&RouteEntry> {
        self.table.get(path)
    }

    /// Exact match, then `"404"`, then `"/"`.
    pub fn lookup(&self, path: &str) -> Option<&RouteEntry> {
        self.table
            .get(path)
            .or_else(|| self.table.get(NOT_FOUND))
            .or_else(|| self.table.get(HOME))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Path encoded by a location fragment: the text after `#`, or `"/"`.
pub fn path_from_fragment(fragment: &str) -> String {
    let path = fragment.strip_prefix('#').unwrap_or(fragment);
    if path.is_empty() {
        HOME.to_string()
    } else {
        path.to_string()
    }
}

/// Markup for the current route; empty when routing is disabled.
pub fn resolve(routes: Option<&Routes>, state: &State, helpers: &Helpers) -> String {
    let Some(routes) = routes else {
        return String::new();
    };
    let path = state.route().unwrap_or(HOME);
    match routes.lookup(path) {
        Some(entry) => entry.produce(state, helpers),
        None => {
            tracing::debug!(target: "markpen::router", path, "no route and no fallback");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_static(entry: Option<&RouteEntry>, want: &str) -> bool {
        matches!(entry, Some(RouteEntry::Static(markup)) if markup == want)
    }

    #[test]
    fn exact_match_wins() {
        let routes = Routes::new()
            .markup("/", "home")
            .markup("/about", "about")
            .markup(NOT_FOUND, "missing");
        assert!(is_static(routes.lookup("/about"), "about"));
        assert!(is_static(routes.lookup("/"), "home"));
    }

    #[test]
    fn unknown_path_falls_back_to_not_found_then_home() {
        let with_404 = Routes::new().markup("/", "A").markup(NOT_FOUND, "B");
        assert!(is_static(with_404.lookup("/x"), "B"));

        let without_404 = Routes::new().markup("/", "A");
        assert!(is_static(without_404.lookup("/x"), "A"));

        assert!(Routes::new().markup("/a", "a").lookup("/x").is_none());
    }

    #[test]
    fn matching_is_exact() {
        let routes = Routes::new().markup("/about", "about").markup(NOT_FOUND, "nf");
        assert!(is_static(routes.lookup("/about/"), "nf"));
        assert!(is_static(routes.lookup("/About"), "nf"));
        assert!(is_static(routes.lookup("/about?x=1"), "nf"));
    }

    #[test]
    fn fragment_to_path() {
        assert_eq!(path_from_fragment(""), "/");
        assert_eq!(path_from_fragment("#"), "/");
        assert_eq!(path_from_fragment("#/about"), "/about");
        assert_eq!(path_from_fragment("/raw"), "/raw");
    }
}
