//! Lazy image loading hints

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::LazyConfig;
use crate::dom::{Dom, EventKind, ListenOptions, Target};

/// Result of registering an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyState {
    /// The image had already loaded and is marked
    Loaded,
    /// The image will be marked by its load event
    Pending,
}

/// Applies `loading`/`decoding` hints to lazy images and marks them once
/// they have loaded
pub struct LazyImages<D: Dom> {
    dom: D,
    config: LazyConfig,
    pending: Rc<RefCell<Vec<D::Node>>>,
}

impl<D: Dom> LazyImages<D> {
    pub fn new(dom: D, config: LazyConfig) -> Self {
        Self {
            dom,
            config,
            pending: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register every image in the document matching the configured selector
    pub fn scan(&self) -> usize {
        let images = self.dom.query_all(&self.config.selector);
        for image in &images {
            self.register(image);
        }
        tracing::debug!("Registered {} lazy images", images.len());
        images.len()
    }

    /// Register the lazy images below `root`
    pub fn scan_within(&self, root: &D::Node) -> usize {
        let images = self.dom.query_within(root, &self.config.selector);
        for image in &images {
            self.register(image);
        }
        images.len()
    }

    pub fn register(&self, image: &D::Node) -> LazyState {
        let dom = &self.dom;
        if !dom.has_attribute(image, "loading") {
            dom.set_attribute(image, "loading", "lazy");
        }
        if !dom.has_attribute(image, "decoding") {
            dom.set_attribute(image, "decoding", "async");
        }

        let marker = &self.config.marker_attribute;
        let loaded = &self.config.loaded_value;
        if dom.attribute(image, marker).as_deref() == Some(loaded.as_str()) {
            return LazyState::Loaded;
        }
        if dom.image_complete(image) {
            dom.set_attribute(image, marker, loaded);
            return LazyState::Loaded;
        }

        if self.pending.borrow().contains(image) {
            return LazyState::Pending;
        }
        self.pending.borrow_mut().push(image.clone());

        let handler_dom = dom.clone();
        let node = image.clone();
        let marker = marker.clone();
        let loaded = loaded.clone();
        let pending = Rc::clone(&self.pending);
        dom.listen(
            Target::Node(image),
            EventKind::Load,
            ListenOptions::once(),
            Box::new(move |_| {
                handler_dom.set_attribute(&node, &marker, &loaded);
                pending.borrow_mut().retain(|n| *n != node);
            }),
        );

        LazyState::Pending
    }

    /// Number of images still waiting for their load event
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}
