//! Delegated event handling.
//!
//! Listeners are bound once on the mount element. Each event walks from its
//! target up to (not including) the mount, looking for the nearest element
//! with an action marker whose expected event type matches. Marked elements
//! expecting another type are passed over and the walk continues upward.

use crate::config::MarkerNames;
use crate::host::{DomEvent, Host, NodeId};

/// Event type a trigger answers to when it doesn't name one.
pub const DEFAULT_TRIGGER_EVENT: &str = "click";

/// A matched trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub element: NodeId,
    pub action: String,
    /// Explicit value marker, else the element's native value.
    pub value: Option<String>,
}

pub fn find_trigger(
    host: &dyn Host,
    mount: NodeId,
    event: &DomEvent,
    markers: &MarkerNames,
) -> Option<Trigger> {
    let mut current = Some(event.target());
    while let Some(node) = current {
        if node == mount {
            break;
        }
        if let Some(action) = host.attribute(node, &markers.action) {
            let expected = host
                .attribute(node, &markers.event)
                .filter(|expected| !expected.is_empty());
            let expected = expected.as_deref().unwrap_or(DEFAULT_TRIGGER_EVENT);
            if event.kind().as_str() == expected {
                let value = host
                    .attribute(node, &markers.value)
                    .or_else(|| host.native_value(node));
                return Some(Trigger {
                    element: node,
                    action,
                    value,
                });
            }
        }
        current = host.parent(node);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EventKind, MemoryHost};

    fn setup(body: &str) -> (MemoryHost, NodeId) {
        let host = MemoryHost::new(r#"<div id="root"></div>"#);
        let mount = host.query("#root").expect("mount");
        host.set_content(mount, body);
        (host, mount)
    }

    fn trigger_at(host: &MemoryHost, mount: NodeId, selector: &str, kind: EventKind) -> Option<Trigger> {
        let target = host.query(selector).expect("target");
        let event = DomEvent::new(kind, target);
        find_trigger(host, mount, &event, &MarkerNames::default())
    }

    #[test]
    fn nearest_marked_ancestor_matches() {
        let (host, mount) = setup(
            r#"<section data-action="outer"><button data-action="jump"><span id="icon">*</span></button></section>"#,
        );
        let trigger = trigger_at(&host, mount, "#icon", EventKind::Click).expect("trigger");
        assert_eq!(trigger.action, "jump");
        assert_eq!(trigger.value.as_deref(), Some(""));
    }

    #[test]
    fn mismatched_type_is_skipped_and_walk_continues() {
        let (host, mount) = setup(
            r#"<form data-action="save" data-action-event="submit"><input id="q" data-action="typed" data-action-event="input"></form>"#,
        );
        assert!(trigger_at(&host, mount, "#q", EventKind::Click).is_none());
        assert_eq!(
            trigger_at(&host, mount, "#q", EventKind::Input).map(|t| t.action),
            Some("typed".to_string())
        );
        assert_eq!(
            trigger_at(&host, mount, "#q", EventKind::Submit).map(|t| t.action),
            Some("save".to_string())
        );
    }

    #[test]
    fn walk_stops_at_the_mount() {
        let host = MemoryHost::new(r#"<div data-action="outside"><div id="root"></div></div>"#);
        let mount = host.query("#root").expect("mount");
        host.set_content(mount, r#"<p id="plain">text</p>"#);
        assert!(trigger_at(&host, mount, "#plain", EventKind::Click).is_none());
    }

    #[test]
    fn value_precedence() {
        let (host, mount) = setup(
            r#"<input id="explicit" value="native" data-action="a" data-action-value="marked">
               <input id="native" value="typed" data-action="b">
               <li id="item" data-action="c">x</li>
               <span id="none" data-action="d">x</span>"#,
        );
        let value = |selector| trigger_at(&host, mount, selector, EventKind::Click).and_then(|t| t.value);
        assert_eq!(value("#explicit").as_deref(), Some("marked"));
        assert_eq!(value("#native").as_deref(), Some("typed"));
        assert_eq!(value("#item").as_deref(), Some("0"));
        assert_eq!(value("#none"), None);
    }

    #[test]
    fn empty_event_marker_means_click() {
        let (host, mount) = setup(r#"<a id="a" data-action="go" data-action-event="">go</a>"#);
        assert!(trigger_at(&host, mount, "#a", EventKind::Click).is_some());
    }

    #[test]
    fn custom_marker_names() {
        let (host, mount) = setup(r#"<b id="b" x-do="hit" x-val="7">b</b>"#);
        let markers = MarkerNames {
            action: "x-do".to_string(),
            event: "x-on".to_string(),
            value: "x-val".to_string(),
        };
        let event = DomEvent::new(EventKind::Click, host.query("#b").expect("b"));
        let trigger = find_trigger(&host, mount, &event, &markers).expect("trigger");
        assert_eq!(trigger.action, "hit");
        assert_eq!(trigger.value.as_deref(), Some("7"));
    }
}
