//! In-memory document host.
//!
//! Keeps an element arena built from parsed markup, a listener table with
//! bubbling dispatch, a location fragment, and two task queues (microtasks
//! and zero-delay timers). Nothing runs until [`MemoryHost::run_until_idle`]
//! is called, which plays the role of the host event loop.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use scraper::node::{Element, Node as ParsedNode};
use scraper::{Html, Selector};

use super::{DomEvent, EventKind, FragmentListener, Host, Listener, ListenerId, NodeId, Task};
use crate::markup;

const ROOT: NodeId = NodeId(0);

/// Elements that expose a native `value`.
const VALUE_ELEMENTS: &[&str] = &[
    "input", "textarea", "select", "button", "option", "output", "li", "data", "meter", "progress",
];

#[derive(Debug)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

impl NodeKind {
    fn from_parsed(node: &ParsedNode) -> Option<Self> {
        match node {
            ParsedNode::Element(element) => Some(Self::Element(element.clone())),
            ParsedNode::Text(text) => Some(Self::Text(String::from(&**text))),
            ParsedNode::Comment(comment) => Some(Self::Comment(String::from(&**comment))),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Live value set through user input, overriding the `value` attribute.
    value: Option<String>,
}

/// Element arena. Ids are never reused, so a handle to a removed node
/// stays dead instead of aliasing a newer one.
#[derive(Debug)]
struct Document {
    nodes: HashMap<NodeId, Node>,
    next: usize,
}

impl Document {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT,
            Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                value: None,
            },
        );
        Self { nodes, next: 1 }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::name)
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ROOT {
                return true;
            }
            current = self.node(node).and_then(|n| n.parent);
        }
        false
    }

    fn insert(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        self.nodes.insert(
            id,
            Node {
                kind,
                parent: Some(parent),
                children: Vec::new(),
                value: None,
            },
        );
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }
        id
    }

    /// Drop `id` and everything below it.
    fn remove_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                stack.extend(node.children);
            }
        }
    }

    /// Parse `markup` as an HTML fragment and make it the children of `parent`.
    fn replace_children(&mut self, parent: NodeId, markup: &str) {
        let old = match self.nodes.get_mut(&parent) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in old {
            self.remove_subtree(child);
        }

        let fragment = Html::parse_fragment(markup);
        let mut stack = vec![(parent, fragment.root_element().children())];
        while let Some((at, children)) = stack.last_mut() {
            let at = *at;
            let Some(child) = children.next() else {
                stack.pop();
                continue;
            };
            let Some(kind) = NodeKind::from_parsed(child.value()) else {
                continue;
            };
            let id = self.insert(at, kind);
            stack.push((id, child.children()));
        }
    }

    /// Elements below `from` in document order.
    fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(from).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.element(id).is_some() {
                out.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Elements matching `selector`, in document order.
    ///
    /// Matching runs on a scraper tree rebuilt from the element arena; text
    /// and comments are left out of it.
    fn select(&self, selector: &Selector) -> Vec<NodeId> {
        let mut mirror = Html::new_fragment();
        let mut arena_ids = HashMap::new();
        let top = mirror.tree.root().id();
        let mut stack: Vec<(NodeId, _)> = self
            .children(ROOT)
            .iter()
            .rev()
            .map(|&child| (child, top))
            .collect();
        while let Some((node, parent)) = stack.pop() {
            let Some(element) = self.element(node) else {
                continue;
            };
            let Some(mut at) = mirror.tree.get_mut(parent) else {
                continue;
            };
            let id = at.append(ParsedNode::Element(element.clone())).id();
            arena_ids.insert(id, node);
            stack.extend(self.children(node).iter().rev().map(|&child| (child, id)));
        }

        mirror
            .select(selector)
            .filter_map(|found| arena_ids.get(&found.id()).copied())
            .collect()
    }

    fn text_content(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(_) => {}
            NodeKind::Document | NodeKind::Element(_) => {
                for &child in &node.children {
                    self.text_content(child, out);
                }
            }
        }
    }

    /// Attributes serialize in name order.
    fn serialize(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(&markup::escape_text(text)),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Document => self.serialize_children(id, out),
            NodeKind::Element(element) => {
                let tag = element.name();
                let mut attrs: Vec<(&str, &str)> = element.attrs().collect();
                attrs.sort_unstable_by_key(|(name, _)| *name);

                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&markup::escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if markup::is_void(tag) {
                    return;
                }
                self.serialize_children(id, out);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn serialize_children(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            self.serialize(child, out);
        }
    }

    fn number_attribute(&self, id: NodeId, name: &str) -> Option<f64> {
        self.attribute(id, name)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
    }

    fn native_value(&self, id: NodeId) -> Option<String> {
        let tag = self.tag(id)?;
        if !VALUE_ELEMENTS.contains(&tag) {
            return None;
        }
        if let Some(live) = self.node(id).and_then(|node| node.value.as_ref()) {
            return Some(live.clone());
        }
        match tag {
            "textarea" => {
                let mut text = String::new();
                self.text_content(id, &mut text);
                Some(text)
            }
            "option" => Some(match self.attribute(id, "value") {
                Some(value) => value.to_string(),
                None => {
                    let mut text = String::new();
                    self.text_content(id, &mut text);
                    text
                }
            }),
            "select" => {
                let options: Vec<NodeId> = self
                    .descendants(id)
                    .into_iter()
                    .filter(|&option| self.tag(option) == Some("option"))
                    .collect();
                let chosen = options
                    .iter()
                    .copied()
                    .find(|&option| self.attribute(option, "selected").is_some())
                    .or_else(|| options.first().copied());
                Some(chosen.and_then(|option| self.native_value(option)).unwrap_or_default())
            }
            "li" => {
                let ordinal = self
                    .attribute(id, "value")
                    .and_then(|value| value.trim().parse::<i64>().ok())
                    .unwrap_or(0);
                Some(ordinal.to_string())
            }
            "meter" | "progress" => {
                let min = match tag {
                    "meter" => self.number_attribute(id, "min").unwrap_or(0.0),
                    _ => 0.0,
                };
                let max = match self.number_attribute(id, "max") {
                    Some(max) if tag == "meter" => max.max(min),
                    Some(max) if max > 0.0 => max,
                    _ => 1.0_f64.max(min),
                };
                let value = self.number_attribute(id, "value").unwrap_or(0.0);
                Some(value.clamp(min, max).to_string())
            }
            _ => Some(self.attribute(id, "value").unwrap_or_default().to_string()),
        }
    }
}

struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    kind: EventKind,
    callback: Listener,
}

enum Job {
    Task(Task),
    FragmentChanged,
}

/// Single-threaded in-memory document, location and event loop.
pub struct MemoryHost {
    doc: RefCell<Document>,
    listeners: RefCell<Vec<ListenerEntry>>,
    fragment_listeners: RefCell<Vec<(ListenerId, FragmentListener)>>,
    fragment: RefCell<String>,
    microtasks: RefCell<VecDeque<Task>>,
    timers: RefCell<VecDeque<Job>>,
    microtasks_enabled: bool,
    next_listener: Cell<u64>,
}

impl MemoryHost {
    /// Create a document whose body is the given markup.
    pub fn new(markup: &str) -> Self {
        let mut doc = Document::new();
        doc.replace_children(ROOT, markup);
        Self {
            doc: RefCell::new(doc),
            listeners: RefCell::new(Vec::new()),
            fragment_listeners: RefCell::new(Vec::new()),
            fragment: RefCell::new(String::new()),
            microtasks: RefCell::new(VecDeque::new()),
            timers: RefCell::new(VecDeque::new()),
            microtasks_enabled: true,
            next_listener: Cell::new(1),
        }
    }

    /// Disable the microtask facility, forcing schedulers onto timers.
    pub fn without_microtasks(mut self) -> Self {
        self.microtasks_enabled = false;
        self
    }

    /// Start with a location fragment already set, without a change signal.
    pub fn with_fragment(self, fragment: &str) -> Self {
        *self.fragment.borrow_mut() = normalize_fragment(fragment);
        self
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        match Selector::parse(selector) {
            Ok(selector) => self.doc.borrow().select(&selector),
            Err(error) => {
                tracing::debug!(target: "markpen::host", selector, ?error, "unsupported selector");
                Vec::new()
            }
        }
    }

    /// Nodes currently held by the document, including text and comments.
    pub fn node_count(&self) -> usize {
        self.doc.borrow().nodes.len()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.doc.borrow().tag(node).map(str::to_string)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.doc.borrow().serialize_children(node, &mut out);
        out
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.doc.borrow().text_content(node, &mut out);
        out
    }

    /// Set the live value of a form control, as typing would.
    pub fn set_value(&self, node: NodeId, value: &str) {
        if let Some(node) = self.doc.borrow_mut().nodes.get_mut(&node) {
            node.value = Some(value.to_string());
        }
    }

    /// Dispatch an event at `event.target()` and bubble it to the document.
    pub fn fire(&self, event: DomEvent) -> DomEvent {
        let path: Vec<NodeId> = {
            let doc = self.doc.borrow();
            let mut path = Vec::new();
            let mut current = Some(event.target());
            while let Some(node) = current {
                path.push(node);
                current = doc.node(node).and_then(|n| n.parent);
            }
            path
        };

        for node in path {
            let callbacks: Vec<Listener> = self
                .listeners
                .borrow()
                .iter()
                .filter(|entry| entry.node == node && entry.kind == *event.kind())
                .map(|entry| Rc::clone(&entry.callback))
                .collect();
            for callback in callbacks {
                callback(&event);
            }
        }
        event
    }

    /// Fire `kind` at the first element matching `selector`.
    pub fn fire_at(&self, selector: &str, kind: EventKind) -> Option<DomEvent> {
        let target = self.query(selector)?;
        Some(self.fire(DomEvent::new(kind, target)))
    }

    pub fn click(&self, selector: &str) -> Option<DomEvent> {
        self.fire_at(selector, EventKind::Click)
    }

    /// Type `value` into a control and fire `input`.
    pub fn input(&self, selector: &str, value: &str) -> Option<DomEvent> {
        let target = self.query(selector)?;
        self.set_value(target, value);
        Some(self.fire(DomEvent::new(EventKind::Input, target)))
    }

    /// Commit `value` on a control and fire `change`.
    pub fn change(&self, selector: &str, value: &str) -> Option<DomEvent> {
        let target = self.query(selector)?;
        self.set_value(target, value);
        Some(self.fire(DomEvent::new(EventKind::Change, target)))
    }

    pub fn submit(&self, selector: &str) -> Option<DomEvent> {
        self.fire_at(selector, EventKind::Submit)
    }

    /// Fire a keyboard event carrying `key`.
    pub fn key(&self, selector: &str, kind: EventKind, key: &str) -> Option<DomEvent> {
        let target = self.query(selector)?;
        Some(self.fire(DomEvent::new(kind, target).with_key(key)))
    }

    /// Change the location fragment. Listeners hear about it as a queued task.
    pub fn navigate(&self, fragment: &str) {
        let fragment = normalize_fragment(fragment);
        let changed = *self.fragment.borrow() != fragment;
        if changed {
            *self.fragment.borrow_mut() = fragment;
            self.timers.borrow_mut().push_back(Job::FragmentChanged);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len() + self.fragment_listeners.borrow().len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.microtasks.borrow().len() + self.timers.borrow().len()
    }

    /// Run queued work until both queues are empty. Returns the number of jobs run.
    ///
    /// Microtasks drain completely before each timer job, and again after it.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = self.drain_microtasks();
        loop {
            let job = self.timers.borrow_mut().pop_front();
            let Some(job) = job else {
                break;
            };
            match job {
                Job::Task(task) => task(),
                Job::FragmentChanged => self.notify_fragment_listeners(),
            }
            ran += 1;
            ran += self.drain_microtasks();
        }
        ran
    }

    fn drain_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.microtasks.borrow_mut().pop_front();
            let Some(task) = task else {
                break;
            };
            task();
            ran += 1;
        }
        ran
    }

    fn notify_fragment_listeners(&self) {
        let callbacks: Vec<FragmentListener> = self
            .fragment_listeners
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    fn next_listener_id(&self) -> ListenerId {
        let raw = self.next_listener.get();
        self.next_listener.set(raw + 1);
        ListenerId::new(raw)
    }
}

/// `location.hash` always reads back with its leading `#` unless empty.
fn normalize_fragment(fragment: &str) -> String {
    if fragment.is_empty() || fragment == "#" || fragment.starts_with('#') {
        fragment.to_string()
    } else {
        format!("#{fragment}")
    }
}

impl Host for MemoryHost {
    fn resolve(&self, selector: &str) -> Option<NodeId> {
        self.query(selector)
    }

    fn contains(&self, node: NodeId) -> bool {
        let doc = self.doc.borrow();
        doc.tag(node).is_some() && doc.is_connected(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.doc.borrow().node(node).and_then(|n| n.parent)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.doc.borrow().attribute(node, name).map(str::to_string)
    }

    fn native_value(&self, node: NodeId) -> Option<String> {
        self.doc.borrow().native_value(node)
    }

    fn set_content(&self, node: NodeId, markup: &str) {
        let mut doc = self.doc.borrow_mut();
        if doc.node(node).is_none() {
            tracing::warn!(target: "markpen::host", %node, "set_content on unknown node");
            return;
        }
        doc.replace_children(node, markup);
    }

    fn add_listener(&self, node: NodeId, kind: EventKind, listener: Listener) -> ListenerId {
        let id = self.next_listener_id();
        self.listeners.borrow_mut().push(ListenerEntry {
            id,
            node,
            kind,
            callback: listener,
        });
        id
    }

    fn on_fragment_change(&self, listener: FragmentListener) -> ListenerId {
        let id = self.next_listener_id();
        self.fragment_listeners.borrow_mut().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|entry| entry.id != id);
        self.fragment_listeners
            .borrow_mut()
            .retain(|(entry, _)| *entry != id);
    }

    fn location_fragment(&self) -> String {
        self.fragment.borrow().clone()
    }

    fn queue_microtask(&self, task: Task) -> Result<(), Task> {
        if !self.microtasks_enabled {
            return Err(task);
        }
        self.microtasks.borrow_mut().push_back(task);
        Ok(())
    }

    fn set_timeout(&self, task: Task, _delay: Duration) {
        // No clock: timers fire in the order they were set.
        self.timers.borrow_mut().push_back(Job::Task(task));
    }
}
