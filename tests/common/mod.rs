//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use markpen::state::delta;
use markpen::{App, AppBuilder, MemoryHost, Payload, State};
use serde_json::json;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Document with a single empty mount element `#app`.
pub const SHELL: &str = r#"<main id="app"></main>"#;

pub fn host() -> Rc<MemoryHost> {
    Rc::new(MemoryHost::new(SHELL))
}

/// Collects every markup string a view produces.
pub type RenderLog = Rc<RefCell<Vec<String>>>;

/// Builder for the `{jumps: 0}` app with a `jump` action, logging renders.
pub fn jump_builder(host: &Rc<MemoryHost>) -> (AppBuilder, RenderLog) {
    let log: RenderLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let builder = App::builder(host.clone())
        .root("#app")
        .state_from(&json!({ "jumps": 0 }))
        .action("jump", |state: &State, _: &Payload| {
            delta(json!({ "jumps": state.get_i64("jumps").unwrap_or(0) + 1 }))
        })
        .view(move |state, _| {
            let markup = format!(
                r#"<p id="jumps">{}</p><button id="jump" data-action="jump">jump</button>"#,
                state.get_i64("jumps").unwrap_or(0)
            );
            sink.borrow_mut().push(markup.clone());
            markup
        });
    (builder, log)
}

pub fn jump_app(host: &Rc<MemoryHost>) -> (App, RenderLog) {
    let (builder, log) = jump_builder(host);
    (builder.build().expect("Failed to build app"), log)
}

/// Markup currently inside `#app`.
pub fn mounted(host: &MemoryHost) -> String {
    host.inner_html(host.query("#app").expect("mount element"))
}

/// Write `content` to a config.toml inside a fresh temp dir.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
