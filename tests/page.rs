//! Page tests: the full initializer sequence on the in-memory document.
//!
//! Run with: `cargo test --test page`

use std::sync::Once;

use blog_page::config::{PageConfig, RenderMode};
use blog_page::content::POSTS;
use blog_page::dom::memory::{MemoryDom, NodeId};
use blog_page::dom::{Dom, ScrollBehavior};
use blog_page::newsletter::is_valid_email;
use blog_page::Page;
use scraper::{Html, Selector};

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

const PAGE: &str = r##"
<header id="site-header">
  <button id="mobile-menu-button" data-icon-button><i class="fas fa-bars"></i></button>
  <nav id="mobile-menu">
    <a class="mobile-link" href="#blog">Blog</a>
    <a class="mobile-link" href="#newsletter">Newsletter</a>
  </nav>
</header>
<main>
  <section id="hero" data-animate>
    <img id="hero-image" src="img/hero.avif" data-lazy="true" alt="Hero">
  </section>
  <section id="blog">
    <div id="posts" data-dynamic-posts><p>Loading posts</p></div>
  </section>
  <section id="newsletter" data-animate>
    <form id="signup" data-newsletter>
      <input id="email" type="email" name="email">
      <button type="submit">Subscribe</button>
    </form>
  </section>
</main>
<button id="back-to-top" data-icon-button data-icon-label="Back to top"></button>
"##;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("blog_page=debug")
            .with_test_writer()
            .try_init();
    });
}

fn load_page() -> (MemoryDom, Page<MemoryDom>) {
    init_logging();
    let dom = MemoryDom::from_html(PAGE);
    let page = Page::load(dom.clone());
    (dom, page)
}

fn id(dom: &MemoryDom, id: &str) -> NodeId {
    dom.element_by_id(id)
        .unwrap_or_else(|| panic!("missing #{}", id))
}

fn finish_feed(dom: &MemoryDom) -> usize {
    let mut periods = 0;
    while dom.run_idle() > 0 {
        periods += 1;
    }
    periods
}

fn submit(dom: &MemoryDom, email: &str) {
    dom.set_value(&id(dom, "email"), email);
    assert!(dom.submit(id(dom, "signup")), "submit was not intercepted");
}

fn message_count(dom: &MemoryDom) -> usize {
    dom.query_all(".newsletter-message").len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_every_post_renders_verbatim() {
    let (dom, page) = load_page();
    finish_feed(&dom);
    assert!(page.feed.as_ref().unwrap().is_complete());

    let html = Html::parse_fragment(&dom.inner_html(id(&dom, "posts")));
    let articles = Selector::parse("article").unwrap();
    let title = Selector::parse("h3 a").unwrap();
    let excerpt = Selector::parse("p").unwrap();
    let time = Selector::parse("time").unwrap();
    let img = Selector::parse("img").unwrap();

    let cards: Vec<_> = html.select(&articles).collect();
    assert_eq!(cards.len(), POSTS.len());

    for (card, post) in cards.iter().zip(POSTS.iter()) {
        let text = |sel: &Selector| {
            card.select(sel)
                .next()
                .map(|e| e.text().collect::<String>())
                .unwrap_or_default()
        };
        assert_eq!(text(&title), post.title);
        assert_eq!(text(&excerpt), post.excerpt);
        assert_eq!(text(&time), post.date);

        let image = card.select(&img).next().unwrap();
        assert_eq!(image.value().attr("src"), Some(post.image.avif));
        assert_eq!(image.value().attr("alt"), Some(post.title));
    }
}

#[test]
fn test_feed_renders_in_three_idle_batches() {
    let (dom, page) = load_page();
    let posts = id(&dom, "posts");
    assert_eq!(dom.attribute(&posts, "role").as_deref(), Some("list"));
    assert!(dom.children(posts).is_empty());

    assert_eq!(finish_feed(&dom), 3);
    let state = page.feed.as_ref().unwrap().state();
    assert_eq!(state.batches, 3);
    assert_eq!(state.rendered, 6);

    let ids: Vec<String> = dom
        .children(posts)
        .into_iter()
        .filter_map(|card| dom.attribute(&card, "id"))
        .collect();
    let expected: Vec<String> = POSTS.iter().map(|p| p.element_id()).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_immediate_render_mode_from_config() {
    init_logging();
    let markup = format!(
        r#"<script id="page-config" type="application/json">{{"posts":{{"render":{{"mode":"immediate"}}}}}}</script>{}"#,
        PAGE
    );
    let dom = MemoryDom::from_html(&markup);
    let page = Page::load(dom.clone());

    assert_eq!(page.config.posts.render, RenderMode::Immediate);
    assert_eq!(dom.children(id(&dom, "posts")).len(), 6);
    assert_eq!(dom.pending_idle(), 0);
}

#[test]
fn test_combinator_selectors_from_config() {
    init_logging();
    let dom = MemoryDom::from_html(PAGE);
    let mut config = PageConfig::default();
    config.posts.container_selector = "#blog > div".to_string();
    config.nav.icon_button_selector = "header button, #back-to-top".to_string();
    let page = Page::init(dom.clone(), config);

    let feed = page.feed.as_ref().expect("feed container not found");
    assert_eq!(feed.container(), &id(&dom, "posts"));
    finish_feed(&dom);
    assert_eq!(dom.children(id(&dom, "posts")).len(), 6);
    assert_eq!(page.icon_buttons, 2);
}

#[test]
fn test_rendered_cards_reveal_and_load() {
    let (dom, _page) = load_page();
    finish_feed(&dom);

    let card = dom.query_first("article").unwrap();
    assert!(!dom.has_class(&card, "is-visible"));
    dom.intersect(card, true);
    assert!(dom.has_class(&card, "is-visible"));

    let img = dom.query_within(&card, "img")[0];
    assert_eq!(dom.attribute(&img, "loading").as_deref(), Some("lazy"));
    dom.load_image(img);
    assert_eq!(dom.attribute(&img, "data-lazy").as_deref(), Some("loaded"));
}

#[test]
fn test_email_validation() {
    assert!(is_valid_email("user@example.com"));
    assert!(!is_valid_email("user@"));
    assert!(!is_valid_email("user.example.com"));
    assert!(!is_valid_email(""));
}

#[test]
fn test_menu_cycles() {
    let (dom, page) = load_page();
    let trigger = id(&dom, "mobile-menu-button");
    let menu = id(&dom, "mobile-menu");
    let body = dom.body().unwrap();
    let drawer = page.drawer.as_ref().unwrap();

    for _ in 0..3 {
        dom.click(trigger);
        assert!(drawer.is_open());
        assert_eq!(dom.attribute(&trigger, "aria-expanded").as_deref(), Some("true"));
        assert!(dom.has_class(&menu, "active"));
        assert_eq!(dom.style(body, "overflow").as_deref(), Some("hidden"));

        dom.click(trigger);
        assert!(!drawer.is_open());
        assert_eq!(dom.attribute(&trigger, "aria-expanded").as_deref(), Some("false"));
        assert!(!dom.has_class(&menu, "active"));
        assert_eq!(dom.style(body, "overflow"), None);
    }
}

#[test]
fn test_menu_link_scrolls_and_closes() {
    let (dom, page) = load_page();
    dom.set_layout(id(&dom, "site-header"), 80.0, 0.0);
    dom.set_layout(id(&dom, "blog"), 600.0, 900.0);

    dom.click(id(&dom, "mobile-menu-button"));
    let link = dom.query_first(".mobile-link").unwrap();
    assert!(dom.click(link));

    assert!(!page.drawer.as_ref().unwrap().is_open());
    let requests = dom.scroll_requests();
    assert_eq!(requests.last().unwrap().top, 820.0);
    assert_eq!(requests.last().unwrap().behavior, ScrollBehavior::Smooth);
}

#[test]
fn test_outside_click_closes_menu() {
    let (dom, page) = load_page();
    dom.click(id(&dom, "mobile-menu-button"));
    dom.click(id(&dom, "hero"));
    assert!(!page.drawer.as_ref().unwrap().is_open());
}

#[test]
fn test_reveal_happens_once() {
    let (dom, page) = load_page();
    let hero = id(&dom, "hero");

    assert_eq!(dom.intersect(hero, true), 1);
    assert!(dom.has_class(&hero, "is-visible"));
    dom.remove_class(&hero, "is-visible");

    assert_eq!(dom.intersect(hero, true), 0);
    assert!(!dom.has_class(&hero, "is-visible"));
    assert_eq!(page.reveal.revealed_count(), 1);
}

#[test]
fn test_reduced_motion_reveals_everything() {
    init_logging();
    let dom = MemoryDom::from_html(PAGE);
    dom.set_reduced_motion(true);
    let _page = Page::load(dom.clone());
    finish_feed(&dom);

    for node in dom.query_all("[data-animate]") {
        assert!(dom.has_class(&node, "is-visible"));
    }
    assert_eq!(dom.observed_count(), 0);
}

#[test]
fn test_back_to_top_threshold_without_growth() {
    let (dom, page) = load_page();
    let button = id(&dom, "back-to-top");
    let control = page.back_to_top.as_ref().unwrap();
    assert!(dom.has_class(&button, "opacity-0"));

    let listeners = dom.listener_count();
    let observed = dom.observed_count();

    for _ in 0..5 {
        dom.scroll_window_to(0.0);
        dom.run_animation_frames();
        assert!(!control.is_visible());
        assert!(dom.has_class(&button, "invisible"));

        dom.scroll_window_to(301.0);
        dom.run_animation_frames();
        assert!(control.is_visible());
        assert!(dom.has_class(&button, "visible"));
        assert!(!dom.has_class(&button, "invisible"));
    }

    assert_eq!(dom.listener_count(), listeners);
    assert_eq!(dom.observed_count(), observed);

    dom.click(button);
    assert_eq!(dom.scroll_y(), 0.0);
}

#[test]
fn test_icon_buttons_labelled() {
    let (dom, page) = load_page();
    assert_eq!(page.icon_buttons, 2);
    assert_eq!(
        dom.attribute(&id(&dom, "mobile-menu-button"), "aria-label").as_deref(),
        Some("Toggle menu")
    );
    assert_eq!(
        dom.attribute(&id(&dom, "back-to-top"), "aria-label").as_deref(),
        Some("Back to top")
    );
}

#[test]
fn test_newsletter_messages_expire_and_never_stack() {
    let (dom, _page) = load_page();

    submit(&dom, "user@example.com");
    assert_eq!(message_count(&dom), 1);
    assert_eq!(dom.value(&id(&dom, "email")), "");
    dom.advance(5000);
    assert_eq!(message_count(&dom), 0);

    submit(&dom, "user@");
    assert_eq!(dom.value(&id(&dom, "email")), "user@");
    dom.advance(3000);
    assert_eq!(message_count(&dom), 0);

    for email in ["bad", "user@example.com", "also bad", "x@y.z"] {
        submit(&dom, email);
        assert_eq!(message_count(&dom), 1);
        dom.advance(1000);
    }
    dom.advance(5000);
    assert_eq!(message_count(&dom), 0);
}

#[test]
fn test_trusted_types_page() {
    init_logging();
    let dom = MemoryDom::from_html(PAGE);
    dom.set_trusted_types(true);
    let page = Page::load(dom.clone());
    finish_feed(&dom);

    assert!(page.policy.is_trusted());
    assert_eq!(dom.trusted_insertions(), 6);
    assert_eq!(dom.children(id(&dom, "posts")).len(), 6);
}

#[test]
fn test_empty_document() {
    init_logging();
    let dom = MemoryDom::new();
    let page = Page::init(dom.clone(), PageConfig::default());

    assert!(page.drawer.is_none());
    assert!(page.back_to_top.is_none());
    assert!(page.feed.is_none());
    assert!(page.newsletter.is_none());
    assert_eq!(dom.listener_count(), 0);
}
