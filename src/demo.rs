//! Bundled demo applications driven by the CLI.

use std::rc::Rc;

use markpen::markup::{escape_attr, escape_text};
use markpen::state::delta;
use markpen::{
    App, ConfigurationError, Helpers, Host, Payload, Registry, Routes, RuntimeConfig, State,
};
use serde_json::json;

const MOUNT: &str = "#app";

fn badge_registry() -> Registry {
    let mut components = Registry::new();
    components.define("badge", |attrs, children| {
        let label = attrs.get("label").and_then(|v| v.as_str()).unwrap_or("");
        format!(
            r#"<span class="badge">{}: {}</span>"#,
            escape_text(label),
            children
        )
    });
    components
}

fn step_of(state: &State) -> i64 {
    state.get_i64("step").unwrap_or(1)
}

fn count_of(state: &State) -> i64 {
    state.get_i64("count").unwrap_or(0)
}

fn counter_markup(state: &State, helpers: &Helpers) -> String {
    let count = count_of(state);
    let badge = helpers
        .components()
        .get("badge")
        .map(|badge| badge.call(&json!({ "label": "step" }), &step_of(state).to_string()))
        .unwrap_or_default();
    format!(
        r#"<section class="counter">
  <h1>Count: {count}</h1>
  <button id="dec" data-action="decrement">-</button>
  <button id="inc" data-action="increment">+</button>
  <div id="keys" data-action="key" data-action-event="keydown">
    <input id="step" data-action="set_step" data-action-event="input" value="{step}">
  </div>
  <button id="reset" data-action="reset" data-action-value="0">reset</button>
  {badge}
</section>"#,
        step = step_of(state),
    )
}

fn counter_actions(builder: markpen::AppBuilder) -> markpen::AppBuilder {
    builder
        .action("increment", |state: &State, _: &Payload| {
            delta(json!({ "count": count_of(state) + step_of(state) }))
        })
        .action("decrement", |state: &State, _: &Payload| {
            delta(json!({ "count": count_of(state) - step_of(state) }))
        })
        .action("set_step", |_: &State, payload: &Payload| {
            let step = payload.as_str()?.trim().parse::<i64>().ok()?;
            delta(json!({ "step": step }))
        })
        .action("reset", |_: &State, payload: &Payload| {
            let count = payload
                .as_str()
                .and_then(|raw| raw.parse::<i64>().ok())
                .unwrap_or(0);
            delta(json!({ "count": count }))
        })
        .action("key", |state: &State, payload: &Payload| {
            let key = payload.event.as_ref()?.key.as_deref()?;
            let change = match key {
                "ArrowUp" => step_of(state),
                "ArrowDown" => -step_of(state),
                _ => return None,
            };
            delta(json!({ "count": count_of(state) + change }))
        })
}

/// Counter with increment, decrement, step input and keyboard control.
pub fn counter(host: Rc<dyn Host>, config: RuntimeConfig) -> Result<App, ConfigurationError> {
    counter_actions(App::builder(host))
        .root(MOUNT)
        .config(config)
        .state_from(&json!({ "count": 0, "step": 1 }))
        .components(badge_registry())
        .view(counter_markup)
        .build()
}

/// Hash-routed pages sharing one counter and a contact form.
pub fn router(host: Rc<dyn Host>, config: RuntimeConfig) -> Result<App, ConfigurationError> {
    let routes = Routes::new()
        .markup("/", r#"<h2>Home</h2><p>Try #/counter, #/contact or #/about.</p>"#)
        .markup("/about", r#"<h2>About</h2><p>Rendered from a static entry.</p>"#)
        .view("/counter", counter_markup)
        .view("/contact", |state, _| {
            let name = state.get_str("name").unwrap_or("");
            let status = if state.get_bool("sent").unwrap_or(false) {
                format!("<p id=\"sent\">Thanks, {}!</p>", escape_text(name))
            } else {
                String::new()
            };
            format!(
                r#"<h2>Contact</h2>
<form id="contact" data-action="send" data-action-event="submit">
  <input id="name" data-action="name" data-action-event="change" value="{}">
  <button id="send" type="submit">send</button>
</form>{status}"#,
                escape_attr(name)
            )
        })
        .view("404", |state, _| {
            format!(
                "<h2>Not found</h2><p>No page at {}</p>",
                escape_text(state.route().unwrap_or(""))
            )
        });

    counter_actions(App::builder(host))
        .root(MOUNT)
        .config(config)
        .state_from(&json!({ "count": 0, "step": 1, "name": "", "sent": false }))
        .components(badge_registry())
        .action("name", |_: &State, payload: &Payload| {
            delta(json!({ "name": payload.as_str().unwrap_or(""), "sent": false }))
        })
        .action("send", |state: &State, _: &Payload| {
            let named = state.get_str("name").is_some_and(|name| !name.is_empty());
            delta(json!({ "sent": named }))
        })
        .routes(routes)
        .view(|state, helpers| {
            format!(
                r##"<nav><a href="#/">home</a> <a href="#/counter">counter</a> <a href="#/contact">contact</a> <a href="#/about">about</a></nav>
<div id="page" data-route="{}">{}</div>"##,
                escape_attr(state.route().unwrap_or("/")),
                helpers.route()
            )
        })
        .build()
}
