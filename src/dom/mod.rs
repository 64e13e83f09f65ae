//! Document abstraction
//!
//! Every page component is written against the [`Dom`] trait. The trait
//! covers exactly what the components need from a browser document:
//! element lookup and mutation, layout reads, event subscription,
//! intersection observation, scheduling and trusted HTML insertion.
//!
//! Two implementations exist: [`memory::MemoryDom`], an in-process document
//! with a virtual clock, and `web::WebDom`, backed by `web-sys`.

#[cfg(any(test, feature = "headless"))]
pub mod memory;
#[cfg(feature = "web")]
pub mod web;

use std::cell::Cell;

use crate::error::Result;

/// Handle to a registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Handle to an intersection observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

/// Handle to a trusted HTML policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyId(pub(crate) u64);

/// Handle to a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

/// Events the page components subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Scroll,
    Load,
    Submit,
    DomContentLoaded,
}

impl EventKind {
    /// DOM event type name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Scroll => "scroll",
            EventKind::Load => "load",
            EventKind::Submit => "submit",
            EventKind::DomContentLoaded => "DOMContentLoaded",
        }
    }

    /// Whether the event propagates from the target up to the document
    pub fn bubbles(&self) -> bool {
        matches!(self, EventKind::Click | EventKind::Submit)
    }
}

/// Where a listener is attached
#[derive(Debug, Clone, Copy)]
pub enum Target<'a, N> {
    Window,
    Document,
    Node(&'a N),
}

/// Listener registration flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenOptions {
    /// Remove the listener after its first invocation
    pub once: bool,
    /// The handler never cancels the default action
    pub passive: bool,
}

impl ListenOptions {
    pub fn once() -> Self {
        Self {
            once: true,
            passive: false,
        }
    }

    pub fn passive() -> Self {
        Self {
            once: false,
            passive: true,
        }
    }
}

/// An event delivered to a handler
#[derive(Debug)]
pub struct Event<N> {
    target: Option<N>,
    default_prevented: Cell<bool>,
}

impl<N> Event<N> {
    pub fn new(target: Option<N>) -> Self {
        Self {
            target,
            default_prevented: Cell::new(false),
        }
    }

    /// Element the event was dispatched to
    pub fn target(&self) -> Option<&N> {
        self.target.as_ref()
    }

    /// Cancel the browser's default action
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Event handler callback
pub type Handler<N> = Box<dyn FnMut(&Event<N>)>;

/// Deferred callback for timers, idle time and animation frames
pub type Task = Box<dyn FnOnce()>;

/// Scroll animation style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Auto,
    Smooth,
}

/// Options for an intersection observer
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionOptions {
    pub root_margin: String,
    pub threshold: f64,
}

/// One intersection change reported to an observer callback
#[derive(Debug, Clone)]
pub struct IntersectionEntry<N> {
    pub target: N,
    pub is_intersecting: bool,
}

/// Intersection observer callback
pub type IntersectionCallback<N> = Box<dyn FnMut(ObserverId, Vec<IntersectionEntry<N>>)>;

/// A browser document as seen by the page components.
///
/// Mutating methods that cannot meaningfully fail in a live document are
/// infallible; implementations log and swallow host errors there.
pub trait Dom: Clone + 'static {
    /// Element handle
    type Node: Clone + PartialEq + std::fmt::Debug + 'static;

    // Lookup

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// All attached elements matching `selector`, in document order
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    /// Descendants of `root` matching `selector`, in document order
    fn query_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    fn query_first(&self, selector: &str) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    fn body(&self) -> Option<Self::Node>;

    /// Whether `node` is `ancestor` or one of its descendants
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    // Tree mutation

    fn create_element(&self, tag: &str) -> Result<Self::Node>;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Append several children in one document mutation
    fn append_children(&self, parent: &Self::Node, children: &[Self::Node]) {
        for child in children {
            self.append_child(parent, child);
        }
    }

    /// Insert `node` as the next sibling of `anchor`
    fn insert_after(&self, anchor: &Self::Node, node: &Self::Node);

    fn remove(&self, node: &Self::Node);

    /// Whether `node` is currently part of the document
    fn is_connected(&self, node: &Self::Node) -> bool;

    // Attributes, classes, text

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn add_class(&self, node: &Self::Node, class: &str);

    fn remove_class(&self, node: &Self::Node, class: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Add the class when `force` is true, remove it otherwise
    fn toggle_class(&self, node: &Self::Node, class: &str, force: bool) {
        if force {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    fn set_class_name(&self, node: &Self::Node, value: &str);

    fn text(&self, node: &Self::Node) -> String;

    fn set_text(&self, node: &Self::Node, text: &str);

    /// Current value of a form control
    fn value(&self, node: &Self::Node) -> String;

    fn set_value(&self, node: &Self::Node, value: &str);

    /// Set an inline style property, or remove it when `value` is `None`
    fn set_style(&self, node: &Self::Node, property: &str, value: Option<&str>);

    /// Whether an image element has finished loading
    fn image_complete(&self, node: &Self::Node) -> bool;

    // Layout and scrolling

    fn offset_height(&self, node: &Self::Node) -> f64;

    /// Distance from the viewport top to the element's border box
    fn viewport_top(&self, node: &Self::Node) -> f64;

    fn scroll_y(&self) -> f64;

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior);

    fn prefers_reduced_motion(&self) -> bool;

    // Events

    fn listen(
        &self,
        target: Target<'_, Self::Node>,
        kind: EventKind,
        options: ListenOptions,
        handler: Handler<Self::Node>,
    ) -> ListenerId;

    fn unlisten(&self, id: ListenerId);

    // Intersection observation

    /// Create an observer, or `None` when the document cannot observe
    /// viewport intersection
    fn create_intersection_observer(
        &self,
        options: &IntersectionOptions,
        callback: IntersectionCallback<Self::Node>,
    ) -> Option<ObserverId>;

    fn observe(&self, observer: ObserverId, node: &Self::Node);

    fn unobserve(&self, observer: ObserverId, node: &Self::Node);

    // Scheduling

    fn request_animation_frame(&self, task: Task);

    /// Run `task` when the main thread is idle
    fn request_idle(&self, task: Task);

    fn set_timeout(&self, delay_ms: u32, task: Task) -> TimerId;

    // Trusted HTML

    fn supports_trusted_types(&self) -> bool;

    fn create_html_policy(&self, name: &str) -> Result<PolicyId>;

    /// A policy registered earlier under `name`
    fn html_policy(&self, name: &str) -> Option<PolicyId>;

    /// Replace the children of `node` with parsed `markup`
    fn set_inner_html(&self, node: &Self::Node, markup: &str, policy: Option<PolicyId>)
        -> Result<()>;
}
