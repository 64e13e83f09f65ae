//! Smooth scrolling for in-page anchors

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::Drawer;
use crate::config::NavConfig;
use crate::dom::{Dom, Event, EventKind, ListenOptions, ListenerId, ScrollBehavior, Target};
use crate::helpers::fragment_id;

/// Anchors whose `href` is a fragment
const ANCHOR_SELECTOR: &str = r##"a[href^="#"]"##;

/// Intercepts clicks on fragment links and scrolls the target into view
/// below the sticky header, closing the navigation drawer on the way
pub struct SmoothScroll<D: Dom> {
    dom: D,
    config: NavConfig,
    drawer: Option<Rc<Drawer<D>>>,
    listeners: RefCell<Vec<ListenerId>>,
}

impl<D: Dom> SmoothScroll<D> {
    pub fn new(dom: D, config: NavConfig, drawer: Option<Rc<Drawer<D>>>) -> Rc<Self> {
        Rc::new(Self {
            dom,
            config,
            drawer,
            listeners: RefCell::new(Vec::new()),
        })
    }

    /// Bind a click listener to every fragment anchor in the document.
    /// Returns the number of anchors bound.
    pub fn attach(self: &Rc<Self>) -> usize {
        let anchors = self.dom.query_all(ANCHOR_SELECTOR);
        let mut listeners = self.listeners.borrow_mut();
        for anchor in &anchors {
            let weak: Weak<Self> = Rc::downgrade(self);
            let node = anchor.clone();
            listeners.push(self.dom.listen(
                Target::Node(anchor),
                EventKind::Click,
                ListenOptions::default(),
                Box::new(move |event| {
                    if let Some(this) = weak.upgrade() {
                        this.handle_click(&node, event);
                    }
                }),
            ));
        }
        tracing::debug!("Smooth scrolling bound to {} anchors", anchors.len());
        anchors.len()
    }

    pub fn detach(&self) {
        for id in self.listeners.borrow_mut().drain(..) {
            self.dom.unlisten(id);
        }
    }

    /// Handle a click on `anchor`. Returns whether the click was intercepted.
    pub fn handle_click(&self, anchor: &D::Node, event: &Event<D::Node>) -> bool {
        let Some(id) = self
            .dom
            .attribute(anchor, "href")
            .and_then(|href| fragment_id(&href))
        else {
            return false;
        };
        let Some(target) = self.dom.element_by_id(&id) else {
            tracing::debug!("Anchor target #{} not found", id);
            return false;
        };

        event.prevent_default();
        let top = self.target_offset(&target);
        self.dom.scroll_to(top, ScrollBehavior::Smooth);

        if let Some(drawer) = &self.drawer {
            drawer.close();
        }
        true
    }

    /// Document offset to scroll to so that `target` sits below the header
    pub fn target_offset(&self, target: &D::Node) -> f64 {
        let top = self.dom.scroll_y() + self.dom.viewport_top(target) - self.header_height();
        top.max(0.0)
    }

    fn header_height(&self) -> f64 {
        self.dom
            .query_first(&self.config.header_selector)
            .map(|header| self.dom.offset_height(&header))
            .unwrap_or(self.config.header_fallback_offset)
    }
}
