//! In-memory document
//!
//! `MemoryDom` implements [`Dom`] without a browser. The document is a
//! `scraper::Html` tree, mutated in place through its `ego_tree` arena and
//! queried with `scraper::Selector`. Events, intersection changes, animation
//! frames, idle periods and timers are driven explicitly by the caller
//! through a virtual clock. The page test suite runs on it.
//!
//! ```ignore
//! let dom = MemoryDom::from_html(r#"<button id="back-to-top"></button>"#);
//! let page = Page::init(dom.clone(), PageConfig::default());
//! dom.scroll_window_to(400.0);
//! dom.run_animation_frames();
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use ego_tree::NodeRef;
use html5ever::{ns, Attribute, LocalName, QualName};
use scraper::node::{Element, Text};
use scraper::{CaseSensitivity, ElementRef, Html, Node, Selector, StrTendril};

use super::{
    Dom, Event, EventKind, Handler, IntersectionCallback, IntersectionEntry, IntersectionOptions,
    ListenOptions, ListenerId, ObserverId, PolicyId, ScrollBehavior, Target, Task, TimerId,
};
use crate::error::{Error, Result};

/// Node handle into a [`MemoryDom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(ego_tree::NodeId);

/// A scroll request recorded by [`Dom::scroll_to`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub top: f64,
    pub behavior: ScrollBehavior,
}

/// Element state that lives outside the markup
#[derive(Debug, Default)]
struct NodeState {
    value: Option<String>,
    style: Vec<(String, String)>,
    complete: bool,
    offset_height: f64,
    viewport_top: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetKey {
    Window,
    Node(NodeId),
}

struct ListenerEntry {
    id: u64,
    key: TargetKey,
    kind: EventKind,
    once: bool,
    handler: Option<Handler<NodeId>>,
}

struct ObserverEntry {
    id: u64,
    targets: Vec<NodeId>,
    callback: Option<IntersectionCallback<NodeId>>,
}

struct TimerEntry {
    id: u64,
    due: u64,
    task: Task,
}

struct Inner {
    html: Html,
    document: NodeId,
    body: NodeId,
    state: HashMap<NodeId, NodeState>,
    next_handle: u64,
    listeners: Vec<ListenerEntry>,
    observers: Vec<ObserverEntry>,
    frames: Vec<Task>,
    idle: VecDeque<Task>,
    timers: Vec<TimerEntry>,
    now_ms: u64,
    scroll_y: f64,
    scroll_requests: Vec<ScrollRequest>,
    reduced_motion: bool,
    intersection_supported: bool,
    trusted_types: bool,
    policy_allowlist: Option<Vec<String>>,
    policies: Vec<(u64, String)>,
    trusted_insertions: usize,
}

impl Inner {
    fn new() -> Self {
        let html = Html::parse_document("");
        let document = NodeId(html.tree.root().id());
        let body = html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().name() == "body")
            .map(|element| NodeId(element.id()))
            .unwrap_or(document);

        Self {
            html,
            document,
            body,
            state: HashMap::new(),
            next_handle: 1,
            listeners: Vec::new(),
            observers: Vec::new(),
            frames: Vec::new(),
            idle: VecDeque::new(),
            timers: Vec::new(),
            now_ms: 0,
            scroll_y: 0.0,
            scroll_requests: Vec::new(),
            reduced_motion: false,
            intersection_supported: true,
            trusted_types: false,
            policy_allowlist: None,
            policies: Vec::new(),
            trusted_insertions: 0,
        }
    }

    fn handle(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id.0)
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.node(id).and_then(ElementRef::wrap)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent().map(|parent| NodeId(parent.id()))
    }

    fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.state.get(&id)
    }

    fn state_mut(&mut self, id: NodeId) -> &mut NodeState {
        self.state.entry(id).or_default()
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id.0) {
            node.detach();
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        if self.is_ancestor_or_self(child, parent) {
            tracing::debug!("Refusing to append {:?} inside itself", child);
            return;
        }
        if let Some(mut node) = self.html.tree.get_mut(parent.0) {
            node.append_id(child.0);
        }
    }

    fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        if self.parent(anchor).is_none() || self.is_ancestor_or_self(node, anchor) {
            return;
        }
        if let Some(mut anchor) = self.html.tree.get_mut(anchor.0) {
            anchor.insert_id_after(node.0);
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self
            .node(id)
            .map(|node| node.children().map(|child| NodeId(child.id())).collect())
            .unwrap_or_default();
        for child in children {
            self.detach(child);
        }
    }

    fn push_text(&mut self, parent: NodeId, text: &str) {
        if let Some(mut node) = self.html.tree.get_mut(parent.0) {
            node.append(Node::Text(Text {
                text: StrTendril::from(text),
            }));
        }
    }

    fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        self.element(id)?.value().attr(name).map(str::to_string)
    }

    /// Rebuilds the element so its cached id and class list follow the new
    /// attribute set.
    fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(mut node) = self.html.tree.get_mut(id.0) else {
            return;
        };
        let Node::Element(element) = node.value() else {
            return;
        };

        let mut attrs: Vec<Attribute> = element
            .attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        match attrs.iter_mut().find(|attr| &*attr.name.local == name) {
            Some(attr) => attr.value = StrTendril::from(value),
            None => attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(name)),
                value: StrTendril::from(value),
            }),
        }

        let rebuilt = Element::new(element.name.clone(), attrs);
        *node.value() = Node::Element(rebuilt);
    }

    fn classes(&self, id: NodeId) -> Vec<String> {
        self.element(id)
            .map(|element| element.value().classes().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor
            || self
                .node(node)
                .map_or(false, |node| node.ancestors().any(|a| a.id() == ancestor.0))
    }

    fn select(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("Invalid selector {:?}: {}", selector, err);
                return Vec::new();
            }
        };
        let Some(root) = self.node(root) else {
            return Vec::new();
        };
        root.descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|element| parsed.matches(element))
            .map(|element| NodeId(element.id()))
            .collect()
    }

    /// Parse `markup` as a body fragment and append its nodes to `parent`
    fn import_fragment(&mut self, parent: NodeId, markup: &str) {
        let fragment = Html::parse_fragment(markup);
        let root = self.html.tree.extend_tree(fragment.tree).id();
        let holder = self
            .html
            .tree
            .get(root)
            .and_then(|root| root.children().find(|child| child.value().is_element()))
            .map(|holder| holder.id());

        if let (Some(holder), Some(mut parent)) = (holder, self.html.tree.get_mut(parent.0)) {
            parent.reparent_from_id_append(holder);
        }
    }

    fn text_content(&self, id: NodeId) -> String {
        self.node(id)
            .map(|node| {
                node.descendants()
                    .filter_map(|d| d.value().as_text())
                    .map(|text| &**text)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Document model with a virtual clock
#[derive(Clone)]
pub struct MemoryDom {
    inner: Rc<RefCell<Inner>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Create a document with an empty body
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner::new())),
        }
    }

    /// Create a document whose body contains `markup`
    pub fn from_html(markup: &str) -> Self {
        let dom = Self::new();
        {
            let mut inner = dom.inner.borrow_mut();
            let body = inner.body;
            inner.import_fragment(body, markup);
        }
        dom
    }

    // Capabilities

    pub fn set_reduced_motion(&self, reduced: bool) {
        self.inner.borrow_mut().reduced_motion = reduced;
    }

    pub fn set_intersection_supported(&self, supported: bool) {
        self.inner.borrow_mut().intersection_supported = supported;
    }

    /// Enable trusted types. Markup insertion then requires a policy.
    pub fn set_trusted_types(&self, enabled: bool) {
        self.inner.borrow_mut().trusted_types = enabled;
    }

    /// Restrict the policy names that may be created, as a
    /// `trusted-types` CSP directive does
    pub fn set_policy_allowlist(&self, names: &[&str]) {
        self.inner.borrow_mut().policy_allowlist =
            Some(names.iter().map(|name| name.to_string()).collect());
    }

    /// Register a policy directly, as another script on the page would
    pub fn preregister_policy(&self, name: &str) -> PolicyId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.handle();
        inner.policies.push((id, name.to_string()));
        PolicyId(id)
    }

    // Layout

    pub fn set_layout(&self, node: NodeId, offset_height: f64, viewport_top: f64) {
        let mut inner = self.inner.borrow_mut();
        let state = inner.state_mut(node);
        state.offset_height = offset_height;
        state.viewport_top = viewport_top;
    }

    pub fn set_image_complete(&self, node: NodeId, complete: bool) {
        self.inner.borrow_mut().state_mut(node).complete = complete;
    }

    // Simulation

    /// Dispatch an event. Returns whether a handler prevented the default.
    pub fn dispatch(&self, target: Target<'_, NodeId>, kind: EventKind) -> bool {
        let origin = self.target_key(target);

        let path = {
            let inner = self.inner.borrow();
            match origin {
                TargetKey::Node(node) if kind.bubbles() => {
                    let mut path = Vec::new();
                    let mut current = Some(node);
                    while let Some(id) = current {
                        path.push(TargetKey::Node(id));
                        current = inner.parent(id);
                    }
                    path
                }
                other => vec![other],
            }
        };

        let event = Event::new(match origin {
            TargetKey::Node(node) => Some(node),
            TargetKey::Window => None,
        });

        for key in path {
            let ids: Vec<u64> = self
                .inner
                .borrow()
                .listeners
                .iter()
                .filter(|l| l.key == key && l.kind == kind)
                .map(|l| l.id)
                .collect();
            for id in ids {
                self.invoke_listener(id, &event);
            }
        }

        event.is_default_prevented()
    }

    fn target_key(&self, target: Target<'_, NodeId>) -> TargetKey {
        match target {
            Target::Window => TargetKey::Window,
            Target::Document => TargetKey::Node(self.inner.borrow().document),
            Target::Node(node) => TargetKey::Node(*node),
        }
    }

    fn invoke_listener(&self, id: u64, event: &Event<NodeId>) {
        let (handler, once) = {
            let mut inner = self.inner.borrow_mut();
            let Some(entry) = inner.listeners.iter_mut().find(|l| l.id == id) else {
                return;
            };
            (entry.handler.take(), entry.once)
        };
        let Some(mut handler) = handler else {
            return;
        };

        if once {
            self.inner.borrow_mut().listeners.retain(|l| l.id != id);
        }

        handler(event);

        if !once {
            let mut inner = self.inner.borrow_mut();
            if let Some(entry) = inner.listeners.iter_mut().find(|l| l.id == id) {
                entry.handler = Some(handler);
            }
        }
    }

    /// Click an element. Returns whether a handler prevented the default.
    pub fn click(&self, node: NodeId) -> bool {
        self.dispatch(Target::Node(&node), EventKind::Click)
    }

    /// Submit a form. Returns whether a handler prevented the default.
    pub fn submit(&self, form: NodeId) -> bool {
        self.dispatch(Target::Node(&form), EventKind::Submit)
    }

    /// Finish loading an image and fire its load event
    pub fn load_image(&self, node: NodeId) {
        self.set_image_complete(node, true);
        self.dispatch(Target::Node(&node), EventKind::Load);
    }

    /// Move the window scroll offset and fire a scroll event
    pub fn scroll_window_to(&self, y: f64) {
        self.inner.borrow_mut().scroll_y = y;
        self.dispatch(Target::Window, EventKind::Scroll);
    }

    /// Report an intersection change for `node` to every observer watching
    /// it. Returns the number of callbacks invoked.
    pub fn intersect(&self, node: NodeId, is_intersecting: bool) -> usize {
        let ids: Vec<u64> = self
            .inner
            .borrow()
            .observers
            .iter()
            .filter(|o| o.targets.contains(&node))
            .map(|o| o.id)
            .collect();

        let mut invoked = 0;
        for id in ids {
            let callback = {
                let mut inner = self.inner.borrow_mut();
                inner
                    .observers
                    .iter_mut()
                    .find(|o| o.id == id)
                    .and_then(|o| o.callback.take())
            };
            let Some(mut callback) = callback else {
                continue;
            };

            callback(
                ObserverId(id),
                vec![IntersectionEntry {
                    target: node,
                    is_intersecting,
                }],
            );
            invoked += 1;

            let mut inner = self.inner.borrow_mut();
            if let Some(observer) = inner.observers.iter_mut().find(|o| o.id == id) {
                observer.callback = Some(callback);
            }
        }
        invoked
    }

    /// Run every queued animation-frame callback. Callbacks requested while
    /// running wait for the next frame.
    pub fn run_animation_frames(&self) -> usize {
        let frames = std::mem::take(&mut self.inner.borrow_mut().frames);
        let count = frames.len();
        for task in frames {
            task();
        }
        count
    }

    /// Run one idle period: every idle callback queued before the call.
    pub fn run_idle(&self) -> usize {
        let tasks: Vec<Task> = self.inner.borrow_mut().idle.drain(..).collect();
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    /// Advance the virtual clock, running timers as they come due.
    /// Returns the number of timers fired.
    pub fn advance(&self, ms: u64) -> usize {
        let until = self.inner.borrow().now_ms + ms;
        let mut fired = 0;

        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                let due = inner
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= until)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(index, _)| index);
                due.map(|index| {
                    let timer = inner.timers.remove(index);
                    inner.now_ms = timer.due;
                    timer.task
                })
            };

            match next {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => break,
            }
        }

        self.inner.borrow_mut().now_ms = until;
        fired
    }

    // Inspection

    pub fn now(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    pub fn scroll_requests(&self) -> Vec<ScrollRequest> {
        self.inner.borrow().scroll_requests.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Number of (observer, element) pairs currently observed
    pub fn observed_count(&self) -> usize {
        self.inner
            .borrow()
            .observers
            .iter()
            .map(|o| o.targets.len())
            .sum()
    }

    pub fn pending_idle(&self) -> usize {
        self.inner.borrow().idle.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Number of markup insertions that went through a trusted policy
    pub fn trusted_insertions(&self) -> usize {
        self.inner.borrow().trusted_insertions
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.inner
            .borrow()
            .state(node)?
            .style
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.clone())
    }

    /// Tag name of an element, `#text` or `#document` otherwise
    pub fn tag(&self, node: NodeId) -> String {
        let inner = self.inner.borrow();
        match inner.node(node).map(|n| n.value()) {
            Some(Node::Element(element)) => element.name().to_string(),
            Some(Node::Text(_)) => "#text".to_string(),
            _ => "#document".to_string(),
        }
    }

    /// Element children of `node`
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .map(|node| {
                node.children()
                    .filter(|child| child.value().is_element())
                    .map(|child| NodeId(child.id()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Serialized markup of the children of `node`
    pub fn inner_html(&self, node: NodeId) -> String {
        self.inner
            .borrow()
            .element(node)
            .map(|element| element.inner_html())
            .unwrap_or_default()
    }

    /// Serialized markup of `node` itself
    pub fn outer_html(&self, node: NodeId) -> String {
        self.inner
            .borrow()
            .element(node)
            .map(|element| element.html())
            .unwrap_or_default()
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let document = inner.node(inner.document)?;
        document
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().id() == Some(id))
            .map(|element| NodeId(element.id()))
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        inner.select(inner.document, selector)
    }

    fn query_within(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        self.inner.borrow().select(*root, selector)
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.inner.borrow().body)
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        self.inner.borrow().is_ancestor_or_self(*ancestor, *node)
    }

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::Dom(format!("Invalid tag name: {:?}", tag)));
        }
        let name = QualName::new(
            None,
            ns!(html),
            LocalName::from(tag.to_ascii_lowercase().as_str()),
        );
        let element = Node::Element(Element::new(name, Vec::new()));
        Ok(NodeId(self.inner.borrow_mut().html.tree.orphan(element).id()))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.inner.borrow_mut().append(*parent, *child);
    }

    fn insert_after(&self, anchor: &NodeId, node: &NodeId) {
        self.inner.borrow_mut().insert_after(*anchor, *node);
    }

    fn remove(&self, node: &NodeId) {
        self.inner.borrow_mut().detach(*node);
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let inner = self.inner.borrow();
        inner.is_ancestor_or_self(inner.document, *node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.inner.borrow().attr(*node, name)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.inner.borrow_mut().set_attr(*node, name, value);
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut inner = self.inner.borrow_mut();
        let mut classes = inner.classes(*node);
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            inner.set_attr(*node, "class", &classes.join(" "));
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        let mut inner = self.inner.borrow_mut();
        let classes = inner.classes(*node);
        if classes.iter().any(|c| c == class) {
            let kept: Vec<String> = classes.into_iter().filter(|c| c != class).collect();
            inner.set_attr(*node, "class", &kept.join(" "));
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.inner.borrow().element(*node).map_or(false, |element| {
            element
                .value()
                .has_class(class, CaseSensitivity::CaseSensitive)
        })
    }

    fn set_class_name(&self, node: &NodeId, value: &str) {
        self.inner.borrow_mut().set_attr(*node, "class", value);
    }

    fn text(&self, node: &NodeId) -> String {
        self.inner.borrow().text_content(*node)
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.clear_children(*node);
        if !text.is_empty() {
            inner.push_text(*node, text);
        }
    }

    /// The live value, or the `value` attribute until one is set
    fn value(&self, node: &NodeId) -> String {
        let inner = self.inner.borrow();
        inner
            .state(*node)
            .and_then(|state| state.value.clone())
            .or_else(|| inner.attr(*node, "value"))
            .unwrap_or_default()
    }

    fn set_value(&self, node: &NodeId, value: &str) {
        self.inner.borrow_mut().state_mut(*node).value = Some(value.to_string());
    }

    fn set_style(&self, node: &NodeId, property: &str, value: Option<&str>) {
        let mut inner = self.inner.borrow_mut();
        let style = &mut inner.state_mut(*node).style;
        style.retain(|(k, _)| k != property);
        if let Some(value) = value {
            style.push((property.to_string(), value.to_string()));
        }
    }

    fn image_complete(&self, node: &NodeId) -> bool {
        self.inner
            .borrow()
            .state(*node)
            .map_or(false, |state| state.complete)
    }

    fn offset_height(&self, node: &NodeId) -> f64 {
        self.inner
            .borrow()
            .state(*node)
            .map_or(0.0, |state| state.offset_height)
    }

    fn viewport_top(&self, node: &NodeId) -> f64 {
        self.inner
            .borrow()
            .state(*node)
            .map_or(0.0, |state| state.viewport_top)
    }

    fn scroll_y(&self) -> f64 {
        self.inner.borrow().scroll_y
    }

    /// Records the request and jumps immediately; no scroll event is fired.
    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let mut inner = self.inner.borrow_mut();
        inner.scroll_requests.push(ScrollRequest { top, behavior });
        inner.scroll_y = top;
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.inner.borrow().reduced_motion
    }

    fn listen(
        &self,
        target: Target<'_, NodeId>,
        kind: EventKind,
        options: ListenOptions,
        handler: Handler<NodeId>,
    ) -> ListenerId {
        let key = self.target_key(target);
        let mut inner = self.inner.borrow_mut();
        let id = inner.handle();
        inner.listeners.push(ListenerEntry {
            id,
            key,
            kind,
            once: options.once,
            handler: Some(handler),
        });
        ListenerId(id)
    }

    fn unlisten(&self, id: ListenerId) {
        self.inner.borrow_mut().listeners.retain(|l| l.id != id.0);
    }

    fn create_intersection_observer(
        &self,
        _options: &IntersectionOptions,
        callback: IntersectionCallback<NodeId>,
    ) -> Option<ObserverId> {
        let mut inner = self.inner.borrow_mut();
        if !inner.intersection_supported {
            return None;
        }
        let id = inner.handle();
        inner.observers.push(ObserverEntry {
            id,
            targets: Vec::new(),
            callback: Some(callback),
        });
        Some(ObserverId(id))
    }

    fn observe(&self, observer: ObserverId, node: &NodeId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(entry) = inner.observers.iter_mut().find(|o| o.id == observer.0) {
            if !entry.targets.contains(node) {
                entry.targets.push(*node);
            }
        }
    }

    fn unobserve(&self, observer: ObserverId, node: &NodeId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(entry) = inner.observers.iter_mut().find(|o| o.id == observer.0) {
            entry.targets.retain(|t| t != node);
        }
    }

    fn request_animation_frame(&self, task: Task) {
        self.inner.borrow_mut().frames.push(task);
    }

    fn request_idle(&self, task: Task) {
        self.inner.borrow_mut().idle.push_back(task);
    }

    fn set_timeout(&self, delay_ms: u32, task: Task) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.handle();
        let due = inner.now_ms + u64::from(delay_ms);
        inner.timers.push(TimerEntry { id, due, task });
        TimerId(id)
    }

    fn supports_trusted_types(&self) -> bool {
        self.inner.borrow().trusted_types
    }

    fn create_html_policy(&self, name: &str) -> Result<PolicyId> {
        let mut inner = self.inner.borrow_mut();
        if !inner.trusted_types {
            return Err(Error::TrustPolicy(
                "trusted types are not available".to_string(),
            ));
        }
        if let Some(allowed) = &inner.policy_allowlist {
            if !allowed.iter().any(|n| n == name) {
                return Err(Error::TrustPolicy(format!(
                    "Policy \"{}\" disallowed by the trusted-types directive",
                    name
                )));
            }
        }
        if inner.policies.iter().any(|(_, n)| n == name) {
            return Err(Error::TrustPolicy(format!(
                "Policy with name \"{}\" already exists",
                name
            )));
        }
        let id = inner.handle();
        inner.policies.push((id, name.to_string()));
        Ok(PolicyId(id))
    }

    fn html_policy(&self, name: &str) -> Option<PolicyId> {
        self.inner
            .borrow()
            .policies
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| PolicyId(*id))
    }

    fn set_inner_html(&self, node: &NodeId, markup: &str, policy: Option<PolicyId>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        match policy {
            Some(policy) => {
                if !inner.policies.iter().any(|(id, _)| *id == policy.0) {
                    return Err(Error::TrustPolicy(format!("Unknown policy {:?}", policy)));
                }
                inner.trusted_insertions += 1;
            }
            None if inner.trusted_types => {
                return Err(Error::Dom(
                    "This document requires 'TrustedHTML' assignment".to_string(),
                ));
            }
            None => {}
        }

        inner.clear_children(*node);
        inner.import_fragment(*node, markup);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_from_html_and_queries() {
        let dom = MemoryDom::from_html(
            r##"<nav id="nav"><a class="mobile-link" href="#one">One</a><a href="/two">Two</a></nav>"##,
        );
        let nav = dom.element_by_id("nav").unwrap();
        assert_eq!(dom.tag(nav), "nav");
        assert_eq!(dom.query_all(r##"a[href^="#"]"##).len(), 1);
        assert_eq!(dom.query_within(&nav, "a").len(), 2);
        assert_eq!(dom.text(&nav), "OneTwo");
    }

    #[test]
    fn test_combinator_selectors() {
        let dom = MemoryDom::from_html(
            r#"<section id="blog"><div id="posts"><div class="card"></div></div></section>
               <a id="link"></a><button id="go"></button>"#,
        );
        let ids = |selector: &str| -> Vec<String> {
            dom.query_all(selector)
                .into_iter()
                .filter_map(|node| dom.attribute(&node, "id"))
                .collect()
        };

        assert_eq!(ids("#blog div"), vec!["posts"]);
        assert_eq!(dom.query_all("#blog div").len(), 2);
        assert_eq!(ids("#blog > div"), vec!["posts"]);
        assert_eq!(dom.query_all("#blog > div").len(), 1);
        assert_eq!(ids("a, button"), vec!["link", "go"]);

        let blog = dom.element_by_id("blog").unwrap();
        assert_eq!(dom.query_within(&blog, "div > .card").len(), 1);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let dom = MemoryDom::from_html(r#"<p id="p"></p>"#);
        assert!(dom.query_all("p[").is_empty());
        assert!(dom.query_first(">>").is_none());
    }

    #[test]
    fn test_attribute_changes_reach_lookups() {
        let dom = MemoryDom::from_html(r#"<div id="old" class="a"></div>"#);
        let node = dom.element_by_id("old").unwrap();
        assert!(dom.has_class(&node, "a"));

        dom.set_attribute(&node, "id", "new");
        dom.set_class_name(&node, "b");
        assert_eq!(dom.element_by_id("new"), Some(node));
        assert_eq!(dom.element_by_id("old"), None);
        assert!(!dom.has_class(&node, "a"));
        assert_eq!(dom.query_all("#new.b"), vec![node]);
    }

    #[test]
    fn test_class_operations() {
        let dom = MemoryDom::from_html(r#"<div id="x" class="a b"></div>"#);
        let x = dom.element_by_id("x").unwrap();
        dom.add_class(&x, "c");
        dom.add_class(&x, "c");
        dom.remove_class(&x, "a");
        assert_eq!(dom.attribute(&x, "class").as_deref(), Some("b c"));
        dom.toggle_class(&x, "b", false);
        assert!(!dom.has_class(&x, "b"));
    }

    #[test]
    fn test_created_elements_are_detached_until_appended() {
        let dom = MemoryDom::new();
        let body = dom.body().unwrap();
        let div = dom.create_element("DIV").unwrap();
        assert_eq!(dom.tag(div), "div");
        assert!(!dom.is_connected(&div));
        assert!(dom.query_all("div").is_empty());

        dom.set_text(&div, "a < b");
        dom.append_child(&body, &div);
        assert!(dom.is_connected(&div));
        assert_eq!(dom.outer_html(div), "<div>a &lt; b</div>");

        dom.append_child(&div, &body);
        assert_eq!(dom.children(div).len(), 0);
        assert!(dom.create_element("#text").is_err());
    }

    #[test]
    fn test_click_bubbles_to_document() {
        let dom = MemoryDom::from_html(r#"<div id="outer"><span id="inner">x</span></div>"#);
        let inner = dom.element_by_id("inner").unwrap();
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        dom.listen(
            Target::Document,
            EventKind::Click,
            ListenOptions::default(),
            Box::new(move |_| counter.set(counter.get() + 1)),
        );
        let counter = hits.clone();
        dom.listen(
            Target::Node(&inner),
            EventKind::Click,
            ListenOptions::default(),
            Box::new(move |event| {
                counter.set(counter.get() + 1);
                event.prevent_default();
            }),
        );

        assert!(dom.click(inner));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_once_listener_fires_once() {
        let dom = MemoryDom::from_html(r#"<img id="img">"#);
        let img = dom.element_by_id("img").unwrap();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        dom.listen(
            Target::Node(&img),
            EventKind::Load,
            ListenOptions::once(),
            Box::new(move |_| counter.set(counter.get() + 1)),
        );

        dom.load_image(img);
        dom.load_image(img);
        assert_eq!(hits.get(), 1);
        assert_eq!(dom.listener_count(), 0);
    }

    #[test]
    fn test_unlisten_after_once_listener_fired() {
        let dom = MemoryDom::from_html(r#"<button id="b"></button>"#);
        let button = dom.element_by_id("b").unwrap();
        let fired = dom.listen(
            Target::Node(&button),
            EventKind::Click,
            ListenOptions::once(),
            Box::new(|_| {}),
        );
        let pending = dom.listen(
            Target::Node(&button),
            EventKind::Load,
            ListenOptions::once(),
            Box::new(|_| {}),
        );

        dom.click(button);
        assert_eq!(dom.listener_count(), 1);
        dom.unlisten(fired);
        assert_eq!(dom.listener_count(), 1);
        dom.unlisten(pending);
        assert_eq!(dom.listener_count(), 0);
    }

    #[test]
    fn test_timers_fire_in_order() {
        let dom = MemoryDom::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        dom.set_timeout(300, Box::new(move || l.borrow_mut().push("late")));
        let l = log.clone();
        dom.set_timeout(100, Box::new(move || l.borrow_mut().push("early")));

        assert_eq!(dom.advance(99), 0);
        assert_eq!(dom.advance(250), 2);
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert_eq!(dom.now(), 349);
    }

    #[test]
    fn test_insert_after_and_remove() {
        let dom = MemoryDom::from_html(r#"<form id="f"></form><p id="p"></p>"#);
        let form = dom.element_by_id("f").unwrap();
        let note = dom.create_element("div").unwrap();
        dom.insert_after(&form, &note);
        let body = dom.body().unwrap();
        assert_eq!(dom.children(body)[1], note);
        assert!(dom.is_connected(&note));

        dom.remove(&note);
        assert!(!dom.is_connected(&note));
    }

    #[test]
    fn test_value_follows_attribute_until_set() {
        let dom = MemoryDom::from_html(r#"<input id="email" value="a@b.c">"#);
        let input = dom.element_by_id("email").unwrap();
        assert_eq!(dom.value(&input), "a@b.c");
        dom.set_value(&input, "");
        assert_eq!(dom.value(&input), "");
        assert_eq!(dom.attribute(&input, "value").as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_trusted_types_require_policy() {
        let dom = MemoryDom::from_html(r#"<div id="d"></div>"#);
        dom.set_trusted_types(true);
        let d = dom.element_by_id("d").unwrap();
        assert!(dom.set_inner_html(&d, "<b>x</b>", None).is_err());

        let policy = dom.create_html_policy("p").unwrap();
        assert!(dom.create_html_policy("p").is_err());
        dom.set_inner_html(&d, "<b>x</b>", Some(policy)).unwrap();
        assert_eq!(dom.inner_html(d), "<b>x</b>");
        assert_eq!(dom.trusted_insertions(), 1);
        assert_eq!(dom.query_within(&d, "b").len(), 1);
    }

    #[test]
    fn test_policy_allowlist() {
        let dom = MemoryDom::new();
        dom.set_trusted_types(true);
        dom.set_policy_allowlist(&["allowed"]);
        assert!(dom.create_html_policy("other").is_err());
        assert!(dom.html_policy("other").is_none());
        assert!(dom.create_html_policy("allowed").is_ok());
    }
}
