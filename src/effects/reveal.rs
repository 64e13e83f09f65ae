//! Reveal-on-scroll

use std::cell::Cell;
use std::rc::Rc;

use crate::config::RevealConfig;
use crate::dom::{Dom, IntersectionOptions, ObserverId};

/// Adds the visible class to marked elements the first time they scroll
/// into view.
///
/// Without intersection observation, or when the user prefers reduced
/// motion, elements are revealed as soon as they are registered.
pub struct RevealController<D: Dom> {
    dom: D,
    config: RevealConfig,
    observer: Option<ObserverId>,
    revealed: Rc<Cell<usize>>,
}

impl<D: Dom> RevealController<D> {
    pub fn new(dom: D, config: RevealConfig) -> Self {
        let revealed = Rc::new(Cell::new(0));

        let observer = if dom.prefers_reduced_motion() {
            tracing::debug!("Reduced motion requested; reveal animations disabled");
            None
        } else {
            let options = IntersectionOptions {
                root_margin: config.root_margin.clone(),
                threshold: config.threshold,
            };
            let callback_dom = dom.clone();
            let class = config.visible_class.clone();
            let counter = Rc::clone(&revealed);

            let observer = dom.create_intersection_observer(
                &options,
                Box::new(move |observer, entries| {
                    for entry in entries.into_iter().filter(|e| e.is_intersecting) {
                        callback_dom.add_class(&entry.target, &class);
                        callback_dom.unobserve(observer, &entry.target);
                        counter.set(counter.get() + 1);
                    }
                }),
            );
            if observer.is_none() {
                tracing::debug!("Intersection observation unavailable; revealing immediately");
            }
            observer
        };

        Self {
            dom,
            config,
            observer,
            revealed,
        }
    }

    /// Register every element matching the configured selector.
    /// Returns the number of elements found.
    pub fn scan(&self) -> usize {
        let targets = self.dom.query_all(&self.config.selector);
        for target in &targets {
            self.register(target);
        }
        tracing::debug!("Registered {} reveal targets", targets.len());
        targets.len()
    }

    /// Register a single element, typically one inserted after the initial scan
    pub fn register(&self, node: &D::Node) {
        if self.dom.has_class(node, &self.config.visible_class) {
            return;
        }
        match self.observer {
            Some(observer) => self.dom.observe(observer, node),
            None => {
                self.dom.add_class(node, &self.config.visible_class);
                self.revealed.set(self.revealed.get() + 1);
            }
        }
    }

    /// Whether elements wait for intersection before being revealed
    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// Number of elements revealed so far
    pub fn revealed_count(&self) -> usize {
        self.revealed.get()
    }
}
