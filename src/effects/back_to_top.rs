//! Back-to-top button

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::config::BackToTopConfig;
use crate::dom::{Dom, EventKind, ListenOptions, ListenerId, ScrollBehavior, Target};

/// Floating button shown once the page is scrolled past a threshold.
///
/// Scroll events are coalesced: at most one visibility update runs per
/// animation frame.
pub struct BackToTop<D: Dom> {
    dom: D,
    button: D::Node,
    config: BackToTopConfig,
    ticking: Cell<bool>,
    visible: Cell<bool>,
    listeners: RefCell<Vec<ListenerId>>,
}

impl<D: Dom> BackToTop<D> {
    /// Look up the button, or `None` when the page has none
    pub fn find(dom: D, config: BackToTopConfig) -> Option<Rc<Self>> {
        let Some(button) = dom.element_by_id(&config.button_id) else {
            tracing::debug!("No #{} element; back-to-top disabled", config.button_id);
            return None;
        };
        Some(Rc::new(Self {
            dom,
            button,
            config,
            ticking: Cell::new(false),
            visible: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        }))
    }

    /// Apply the initial state and bind the scroll and click listeners.
    /// Calling it again while attached does nothing.
    pub fn attach(self: &Rc<Self>) {
        if !self.listeners.borrow().is_empty() {
            return;
        }
        self.update();

        let weak: Weak<Self> = Rc::downgrade(self);
        let scroll = self.dom.listen(
            Target::Window,
            EventKind::Scroll,
            ListenOptions::passive(),
            Box::new(move |_| {
                if let Some(this) = weak.upgrade() {
                    this.schedule();
                }
            }),
        );

        let dom = self.dom.clone();
        let click = self.dom.listen(
            Target::Node(&self.button),
            EventKind::Click,
            ListenOptions::default(),
            Box::new(move |_| dom.scroll_to(0.0, ScrollBehavior::Smooth)),
        );

        self.listeners.borrow_mut().extend([scroll, click]);
    }

    pub fn detach(&self) {
        for id in self.listeners.borrow_mut().drain(..) {
            self.dom.unlisten(id);
        }
    }

    /// Queue a visibility update for the next animation frame unless one
    /// is already queued
    pub fn schedule(self: &Rc<Self>) {
        if self.ticking.replace(true) {
            return;
        }
        let weak = Rc::downgrade(self);
        self.dom.request_animation_frame(Box::new(move || {
            if let Some(this) = weak.upgrade() {
                this.update();
            }
        }));
    }

    /// Show or hide the button for the current scroll offset
    pub fn update(&self) {
        let show = self.dom.scroll_y() > self.config.threshold;
        for class in &self.config.visible_classes {
            self.dom.toggle_class(&self.button, class, show);
        }
        for class in &self.config.hidden_classes {
            self.dom.toggle_class(&self.button, class, !show);
        }
        self.visible.set(show);
        self.ticking.set(false);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn is_attached(&self) -> bool {
        !self.listeners.borrow().is_empty()
    }
}
