//! blog-page: client-side behavior for a static blog page
//!
//! This crate wires the interactive parts of the page: the navigation
//! drawer, smooth anchor scrolling, the back-to-top button, lazy images,
//! reveal-on-scroll animations, the post card feed and the newsletter form.
//! Every component is written against the [`dom::Dom`] trait; the `web`
//! feature binds it to the browser and exports the wasm entry point, the
//! `headless` feature provides an in-memory document for tests.

pub mod config;
pub mod content;
pub mod dom;
pub mod effects;
pub mod error;
pub mod helpers;
pub mod nav;
pub mod newsletter;
pub mod policy;

#[cfg(feature = "web")]
mod entry;

use std::rc::Rc;

pub use error::{Error, Result};

use config::PageConfig;
use content::{CardRenderer, PostFeed, POSTS};
use dom::Dom;
use effects::{annotate_icon_buttons, BackToTop, LazyImages, RevealController};
use nav::{Drawer, SmoothScroll};
use newsletter::NewsletterForm;
use policy::HtmlPolicy;

/// The initialized page
///
/// Holds every component so their listeners and scheduled callbacks stay
/// alive. Components whose markup is missing are `None`.
pub struct Page<D: Dom> {
    /// Page configuration
    pub config: PageConfig,
    /// Policy used for card markup
    pub policy: HtmlPolicy,
    /// Number of icon buttons given an accessible label
    pub icon_buttons: usize,
    pub drawer: Option<Rc<Drawer<D>>>,
    pub smooth_scroll: Rc<SmoothScroll<D>>,
    pub back_to_top: Option<Rc<BackToTop<D>>>,
    pub lazy: Rc<LazyImages<D>>,
    pub reveal: Rc<RevealController<D>>,
    pub feed: Option<Rc<PostFeed<D>>>,
    pub newsletter: Option<Rc<NewsletterForm<D>>>,
}

impl<D: Dom> Page<D> {
    /// Read the configuration from the document and initialize the page
    pub fn load(dom: D) -> Self {
        let config = PageConfig::load(&dom);
        Self::init(dom, config)
    }

    /// Run every initializer once, in page order
    pub fn init(dom: D, config: PageConfig) -> Self {
        let policy = HtmlPolicy::create(&dom, &config.trusted_types_policy);

        let icon_buttons = annotate_icon_buttons(&dom, &config.nav);

        let drawer = Drawer::find(dom.clone(), config.nav.clone());
        if let Some(drawer) = &drawer {
            drawer.attach();
        }

        let smooth_scroll = SmoothScroll::new(dom.clone(), config.nav.clone(), drawer.clone());
        smooth_scroll.attach();

        let back_to_top = BackToTop::find(dom.clone(), config.back_to_top.clone());
        if let Some(button) = &back_to_top {
            button.attach();
        }

        let lazy = Rc::new(LazyImages::new(dom.clone(), config.lazy.clone()));
        lazy.scan();

        let reveal = Rc::new(RevealController::new(dom.clone(), config.reveal.clone()));
        reveal.scan();

        let renderer = CardRenderer::new(
            dom.clone(),
            policy,
            Rc::clone(&reveal),
            Rc::clone(&lazy),
            config.posts.featured_category.clone(),
        );
        let feed = PostFeed::find(dom.clone(), &config.posts, renderer, &POSTS);
        if let Some(feed) = &feed {
            feed.hydrate();
        }

        let newsletter = NewsletterForm::find(dom, config.newsletter.clone());
        if let Some(form) = &newsletter {
            form.attach();
        }

        tracing::info!(
            "Page initialized (drawer: {}, back-to-top: {}, feed: {}, newsletter: {})",
            drawer.is_some(),
            back_to_top.is_some(),
            feed.is_some(),
            newsletter.is_some()
        );

        Self {
            config,
            policy,
            icon_buttons,
            drawer,
            smooth_scroll,
            back_to_top,
            lazy,
            reveal,
            feed,
            newsletter,
        }
    }
}
