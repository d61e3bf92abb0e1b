//! Stateless components: named render functions over (attributes, children).

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::ConfigurationError;

type RenderFn = dyn Fn(&Value, &str) -> String;

/// A named, immutable render function. Cloning is cheap.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Value, &str) -> String + 'static,
    {
        Self {
            name: Rc::from(name),
            render: Rc::new(render),
        }
    }

    /// Build from a render function that may be missing, failing up front
    /// rather than at call time.
    pub fn try_new<F>(name: &str, render: Option<F>) -> Result<Self, ConfigurationError>
    where
        F: Fn(&Value, &str) -> String + 'static,
    {
        match render {
            Some(render) => Ok(Self::new(name, render)),
            None => Err(ConfigurationError::MissingRender {
                name: name.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, attributes: &Value, children: &str) -> String {
        (self.render)(attributes, children)
    }

    /// Render without children.
    pub fn render(&self, attributes: &Value) -> String {
        self.call(attributes, "")
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("name", &self.name).finish()
    }
}

/// Embedder-owned table of components, looked up by name.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    components: BTreeMap<String, Component>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a component and register it, replacing one with the same name.
    pub fn define<F>(&mut self, name: &str, render: F) -> Component
    where
        F: Fn(&Value, &str) -> String + 'static,
    {
        let component = Component::new(name, render);
        self.insert(component.clone());
        component
    }

    pub fn insert(&mut self, component: Component) {
        self.components
            .insert(component.name().to_string(), component);
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn badge(attrs: &Value, children: &str) -> String {
        format!("<span class=\"badge\">{}{children}</span>", attrs["label"].as_str().unwrap_or(""))
    }

    #[test]
    fn renders_attributes_and_children() {
        let component = Component::new("Badge", badge);
        assert_eq!(component.name(), "Badge");
        assert_eq!(
            component.call(&json!({"label": "hi"}), "!"),
            r#"<span class="badge">hi!</span>"#
        );
        assert_eq!(component.render(&json!({})), r#"<span class="badge"></span>"#);
    }

    #[test]
    fn missing_render_fails_at_construction() {
        let err = Component::try_new::<fn(&Value, &str) -> String>("Empty", None).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingRender { ref name } if name == "Empty"));
        assert!(Component::try_new("Badge", Some(badge)).is_ok());
    }

    #[test]
    fn registry_defines_and_replaces() {
        let mut registry = Registry::new();
        registry.define("Badge", badge);
        registry.define("Badge", |_: &Value, _: &str| "v2".to_string());
        registry.define("Card", |_: &Value, children: &str| format!("<div>{children}</div>"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Badge", "Card"]);
        let badge = registry.get("Badge").expect("badge");
        assert_eq!(badge.render(&json!({})), "v2");
        assert!(!registry.contains("Missing"));
    }
}
