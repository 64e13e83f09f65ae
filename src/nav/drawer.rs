//! Menu drawer
//!
//! A single open/closed controller drives both page layouts: the compact
//! mobile menu under the header and the off-canvas sidebar with its
//! overlay. While open, the body does not scroll.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::config::NavConfig;
use crate::dom::{Dom, EventKind, ListenOptions, ListenerId, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawerState {
    #[default]
    Closed,
    Open,
}

/// Elements making up one drawer
#[derive(Debug, Clone)]
pub struct DrawerParts<N> {
    /// Button toggling the drawer
    pub trigger: N,
    /// The menu or sidebar itself
    pub panel: N,
    pub overlay: Option<N>,
    pub close: Option<N>,
    /// Links that close the drawer when followed
    pub links: Vec<N>,
    /// Icon inside the trigger swapped between open and close glyphs
    pub icon: Option<N>,
}

pub struct Drawer<D: Dom> {
    dom: D,
    parts: DrawerParts<D::Node>,
    config: NavConfig,
    state: Cell<DrawerState>,
    listeners: RefCell<Vec<ListenerId>>,
}

impl<D: Dom> Drawer<D> {
    /// The drawer for this page: the sidebar layout when a sidebar exists,
    /// the mobile menu otherwise
    pub fn find(dom: D, config: NavConfig) -> Option<Rc<Self>> {
        if dom.element_by_id(&config.sidebar_id).is_some() {
            Self::sidebar(dom, config)
        } else {
            Self::mobile_menu(dom, config)
        }
    }

    pub fn mobile_menu(dom: D, config: NavConfig) -> Option<Rc<Self>> {
        let trigger = dom.element_by_id(&config.trigger_id);
        let panel = dom.element_by_id(&config.menu_id);
        let (Some(trigger), Some(panel)) = (trigger, panel) else {
            tracing::debug!("Mobile menu markup not found; navigation toggle disabled");
            return None;
        };

        let links = dom.query_within(&panel, &config.menu_link_selector);
        let icon = dom
            .query_within(&trigger, &config.icon_selector)
            .into_iter()
            .next();
        let parts = DrawerParts {
            trigger,
            panel,
            overlay: None,
            close: None,
            links,
            icon,
        };
        Some(Rc::new(Self::new(dom, parts, config)))
    }

    pub fn sidebar(dom: D, config: NavConfig) -> Option<Rc<Self>> {
        let trigger = dom.element_by_id(&config.trigger_id);
        let panel = dom.element_by_id(&config.sidebar_id);
        let (Some(trigger), Some(panel)) = (trigger, panel) else {
            tracing::debug!("Sidebar markup not found; navigation toggle disabled");
            return None;
        };

        let parts = DrawerParts {
            overlay: dom.element_by_id(&config.overlay_id),
            close: dom.element_by_id(&config.close_id),
            links: dom.query_all(&config.sidebar_link_selector),
            icon: dom
                .query_within(&trigger, &config.icon_selector)
                .into_iter()
                .next(),
            trigger,
            panel,
        };
        Some(Rc::new(Self::new(dom, parts, config)))
    }

    pub fn new(dom: D, parts: DrawerParts<D::Node>, config: NavConfig) -> Self {
        Self {
            dom,
            parts,
            config,
            state: Cell::new(DrawerState::Closed),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Bind the drawer's listeners. Calling it again while attached does
    /// nothing.
    pub fn attach(self: &Rc<Self>) {
        if !self.listeners.borrow().is_empty() {
            return;
        }
        self.dom
            .set_attribute(&self.parts.trigger, "aria-expanded", "false");

        let mut ids = Vec::new();
        ids.push(self.on_click(Target::Node(&self.parts.trigger), |drawer, _| {
            drawer.toggle()
        }));

        let closers = self
            .parts
            .close
            .iter()
            .chain(self.parts.overlay.iter())
            .chain(self.parts.links.iter());
        for node in closers {
            ids.push(self.on_click(Target::Node(node), |drawer, _| drawer.close()));
        }

        ids.push(self.on_click(Target::Document, |drawer, target| {
            if drawer.is_open() && !target.is_some_and(|t| drawer.is_inside(t)) {
                drawer.close();
            }
        }));

        tracing::debug!("Navigation drawer attached ({} listeners)", ids.len());
        *self.listeners.borrow_mut() = ids;
    }

    fn on_click<F>(self: &Rc<Self>, target: Target<'_, D::Node>, f: F) -> ListenerId
    where
        F: Fn(&Self, Option<&D::Node>) + 'static,
    {
        let weak: Weak<Self> = Rc::downgrade(self);
        self.dom.listen(
            target,
            EventKind::Click,
            ListenOptions::default(),
            Box::new(move |event| {
                if let Some(drawer) = weak.upgrade() {
                    f(&drawer, event.target());
                }
            }),
        )
    }

    /// Remove every listener bound by [`attach`](Self::attach)
    pub fn detach(&self) {
        for id in self.listeners.borrow_mut().drain(..) {
            self.dom.unlisten(id);
        }
    }

    fn is_inside(&self, node: &D::Node) -> bool {
        self.dom.contains(&self.parts.trigger, node) || self.dom.contains(&self.parts.panel, node)
    }

    pub fn open(&self) {
        if self.is_open() {
            return;
        }
        self.state.set(DrawerState::Open);
        self.apply(true);
    }

    pub fn close(&self) {
        if !self.is_open() {
            return;
        }
        self.state.set(DrawerState::Closed);
        self.apply(false);
    }

    pub fn toggle(&self) {
        match self.state.get() {
            DrawerState::Open => self.close(),
            DrawerState::Closed => self.open(),
        }
    }

    fn apply(&self, open: bool) {
        let dom = &self.dom;
        let parts = &self.parts;
        let active = &self.config.active_class;

        dom.set_attribute(
            &parts.trigger,
            "aria-expanded",
            if open { "true" } else { "false" },
        );
        dom.toggle_class(&parts.panel, active, open);
        if let Some(overlay) = &parts.overlay {
            dom.toggle_class(overlay, active, open);
        }
        if let Some(icon) = &parts.icon {
            dom.toggle_class(icon, &self.config.open_icon_class, !open);
            dom.toggle_class(icon, &self.config.close_icon_class, open);
        }
        if let Some(body) = dom.body() {
            dom.set_style(&body, "overflow", open.then_some("hidden"));
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.get() == DrawerState::Open
    }

    pub fn state(&self) -> DrawerState {
        self.state.get()
    }

    pub fn parts(&self) -> &DrawerParts<D::Node> {
        &self.parts
    }
}
