//! Post feed hydration

use std::cell::Cell;
use std::rc::{Rc, Weak};

use super::{CardRenderer, Post};
use crate::config::{PostsConfig, RenderMode};
use crate::dom::Dom;

/// Progress of a feed hydration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedState {
    /// Cards appended so far
    pub rendered: usize,
    /// Insertion passes run so far
    pub batches: usize,
    pub complete: bool,
}

/// Renders the post list into the feed container
pub struct PostFeed<D: Dom> {
    dom: D,
    container: D::Node,
    renderer: CardRenderer<D>,
    posts: &'static [Post],
    mode: RenderMode,
    state: Cell<FeedState>,
    generation: Cell<u64>,
    weak_self: Weak<Self>,
}

impl<D: Dom> PostFeed<D> {
    /// Look up the feed container, or `None` when the page has none
    pub fn find(
        dom: D,
        config: &PostsConfig,
        renderer: CardRenderer<D>,
        posts: &'static [Post],
    ) -> Option<Rc<Self>> {
        let Some(container) = dom.query_first(&config.container_selector) else {
            tracing::debug!("No {} container; post feed disabled", config.container_selector);
            return None;
        };

        Some(Rc::new_cyclic(|weak_self| Self {
            dom,
            container,
            renderer,
            posts,
            mode: config.render,
            state: Cell::new(FeedState::default()),
            generation: Cell::new(0),
            weak_self: weak_self.clone(),
        }))
    }

    /// Clear the container and render every post into it.
    ///
    /// In idle mode only the first batch is scheduled here; each batch
    /// schedules the next one after appending its cards. Calling `hydrate`
    /// again restarts rendering and abandons batches still queued.
    pub fn hydrate(&self) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.state.set(FeedState::default());

        self.dom.set_attribute(&self.container, "role", "list");
        self.dom.set_text(&self.container, "");

        match self.mode {
            RenderMode::Immediate => {
                let cards = self.renderer.render_all(self.posts);
                self.dom.append_children(&self.container, &cards);
                self.record_batch(cards.len());
                self.finish();
            }
            RenderMode::Idle { batch_size } => {
                if self.posts.is_empty() {
                    self.finish();
                } else {
                    self.schedule_batch(generation, 0, batch_size.max(1));
                }
            }
        }
    }

    fn schedule_batch(&self, generation: u64, start: usize, size: usize) {
        let weak = self.weak_self.clone();
        self.dom.request_idle(Box::new(move || {
            if let Some(feed) = weak.upgrade() {
                feed.render_batch(generation, start, size);
            }
        }));
    }

    fn render_batch(&self, generation: u64, start: usize, size: usize) {
        if generation != self.generation.get() {
            return;
        }

        let end = (start + size).min(self.posts.len());
        let cards = self.renderer.render_all(&self.posts[start..end]);
        self.dom.append_children(&self.container, &cards);
        self.record_batch(cards.len());

        if end < self.posts.len() {
            self.schedule_batch(generation, end, size);
        } else {
            self.finish();
        }
    }

    fn record_batch(&self, rendered: usize) {
        let mut state = self.state.get();
        state.rendered += rendered;
        state.batches += 1;
        self.state.set(state);
    }

    fn finish(&self) {
        let mut state = self.state.get();
        state.complete = true;
        self.state.set(state);
        tracing::info!(
            "Rendered {} of {} posts in {} batch(es)",
            state.rendered,
            self.posts.len(),
            state.batches
        );
    }

    pub fn state(&self) -> FeedState {
        self.state.get()
    }

    pub fn is_complete(&self) -> bool {
        self.state.get().complete
    }

    pub fn container(&self) -> &D::Node {
        &self.container
    }
}
