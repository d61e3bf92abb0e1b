mod demo;

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use markpen::logging::init_tracing;
use markpen::{EventKind, MemoryHost, RuntimeConfig};

#[derive(Parser, Debug)]
#[command(name = "markpen")]
#[command(version, about = "Drive a bundled markpen app with scripted events")]
#[command(long_about = r#"Mount one of the bundled apps on an in-memory document, apply
each STEP in order and print the mount element's markup after every step,
followed by the final state as JSON.

STEPS:
    click:SELECTOR
    submit:SELECTOR
    input:SELECTOR=VALUE
    change:SELECTOR=VALUE
    keydown:SELECTOR=KEY
    keyup:SELECTOR=KEY
    nav:FRAGMENT

EXAMPLES:
    markpen counter click:#inc click:#inc input:#step=5 click:#inc
    markpen counter keydown:#step=ArrowUp
    markpen router nav:#/contact change:#name=Ada submit:#contact
    markpen router --fragment '#/missing'
"#)]
struct Cli {
    /// Config file (default: the user config dir's markpen/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Initial location fragment
    #[arg(long, default_value = "", value_name = "FRAGMENT")]
    fragment: String,

    /// App to run
    #[arg(value_enum)]
    demo: Demo,

    /// Scripted steps
    #[arg(value_name = "STEP")]
    steps: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Demo {
    Counter,
    Router,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Click(String),
    Submit(String),
    Input { selector: String, value: String },
    Change { selector: String, value: String },
    Key { kind: EventKind, selector: String, key: String },
    Navigate(String),
}

fn split_assignment(arg: &str) -> Result<(String, String)> {
    let (selector, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected SELECTOR=VALUE, got '{}'", arg))?;
    Ok((selector.to_string(), value.to_string()))
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (verb, arg) = raw
            .split_once(':')
            .ok_or_else(|| anyhow!("step '{}' has no ':'", raw))?;
        let step = match verb {
            "click" => Step::Click(arg.to_string()),
            "submit" => Step::Submit(arg.to_string()),
            "input" => {
                let (selector, value) = split_assignment(arg)?;
                Step::Input { selector, value }
            }
            "change" => {
                let (selector, value) = split_assignment(arg)?;
                Step::Change { selector, value }
            }
            "keydown" | "keyup" => {
                let (selector, key) = split_assignment(arg)?;
                Step::Key {
                    kind: EventKind::parse(verb),
                    selector,
                    key,
                }
            }
            "nav" => Step::Navigate(arg.to_string()),
            other => bail!("unknown step '{}'", other),
        };
        Ok(step)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Click(selector) => write!(f, "click:{}", selector),
            Step::Submit(selector) => write!(f, "submit:{}", selector),
            Step::Input { selector, value } => write!(f, "input:{}={}", selector, value),
            Step::Change { selector, value } => write!(f, "change:{}={}", selector, value),
            Step::Key { kind, selector, key } => write!(f, "{}:{}={}", kind, selector, key),
            Step::Navigate(fragment) => write!(f, "nav:{}", fragment),
        }
    }
}

impl Step {
    fn apply(&self, host: &MemoryHost) -> Result<()> {
        let fired = match self {
            Step::Click(selector) => host.click(selector),
            Step::Submit(selector) => host.submit(selector),
            Step::Input { selector, value } => host.input(selector, value),
            Step::Change { selector, value } => host.change(selector, value),
            Step::Key { kind, selector, key } => host.key(selector, kind.clone(), key),
            Step::Navigate(fragment) => {
                host.navigate(fragment);
                return Ok(());
            }
        };
        fired
            .map(|_| ())
            .with_context(|| format!("'{}': no element matches", self))
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RuntimeConfig> {
    let config = match path {
        Some(path) => RuntimeConfig::load_from(path),
        None => RuntimeConfig::load(),
    };
    config.context("Failed to load configuration")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.log_filter);

    let steps = cli
        .steps
        .iter()
        .map(|raw| raw.parse::<Step>())
        .collect::<Result<Vec<_>>>()?;

    let host = Rc::new(MemoryHost::new(r#"<main id="app"></main>"#).with_fragment(&cli.fragment));
    let app = match cli.demo {
        Demo::Counter => demo::counter(host.clone(), config),
        Demo::Router => demo::router(host.clone(), config),
    }
    .context("Failed to mount app")?;
    tracing::info!(target: "markpen::cli", demo = ?cli.demo, steps = steps.len(), "mounted");

    println!("{}", host.inner_html(app.mount()));
    for step in &steps {
        step.apply(&host)?;
        let jobs = host.run_until_idle();
        tracing::debug!(target: "markpen::cli", %step, jobs, "step done");
        println!("\n$ {}\n{}", step, host.inner_html(app.mount()));
    }

    let state = serde_json::to_string_pretty(&app.state())
        .context("Failed to serialize final state")?;
    println!("\n{}", state);
    app.destroy();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_step_form() {
        assert_eq!("click:#inc".parse::<Step>().unwrap(), Step::Click("#inc".into()));
        assert_eq!(
            "input:#step=5".parse::<Step>().unwrap(),
            Step::Input {
                selector: "#step".into(),
                value: "5".into()
            }
        );
        assert_eq!(
            "keyup:#step=Enter".parse::<Step>().unwrap(),
            Step::Key {
                kind: EventKind::KeyUp,
                selector: "#step".into(),
                key: "Enter".into()
            }
        );
        assert_eq!("nav:#/about".parse::<Step>().unwrap(), Step::Navigate("#/about".into()));
    }

    #[test]
    fn rejects_malformed_steps() {
        assert!("click".parse::<Step>().is_err());
        assert!("input:#step".parse::<Step>().is_err());
        assert!("hover:#x".parse::<Step>().is_err());
    }

    #[test]
    fn display_matches_input() {
        for raw in ["click:#inc", "change:#name=Ada", "keydown:#step=ArrowUp", "nav:#/x"] {
            assert_eq!(raw.parse::<Step>().unwrap().to_string(), raw);
        }
    }

    #[test]
    fn counter_demo_runs_scripted_steps() {
        let host = Rc::new(MemoryHost::new(r#"<main id="app"></main>"#));
        let app = demo::counter(host.clone(), RuntimeConfig::default()).unwrap();
        for raw in ["click:#inc", "input:#step=5", "click:#inc", "keydown:#step=ArrowDown"] {
            raw.parse::<Step>().unwrap().apply(&host).unwrap();
            host.run_until_idle();
        }
        assert_eq!(app.state().get_i64("count"), Some(1));
        assert!(host.inner_html(app.mount()).contains("Count: 1"));
    }

    #[test]
    fn router_demo_follows_navigation() {
        let host = Rc::new(MemoryHost::new(r#"<main id="app"></main>"#).with_fragment("#/nowhere"));
        let app = demo::router(host.clone(), RuntimeConfig::default()).unwrap();
        assert!(host.inner_html(app.mount()).contains("Not found"));

        for raw in ["nav:#/contact", "change:#name=Ada", "submit:#contact"] {
            raw.parse::<Step>().unwrap().apply(&host).unwrap();
            host.run_until_idle();
        }
        assert_eq!(app.state().get_bool("sent"), Some(true));
        assert!(host.text_content(app.mount()).contains("Thanks, Ada!"));
    }
}
