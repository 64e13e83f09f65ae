//! Post card rendering

use std::rc::Rc;

use super::Post;
use crate::dom::Dom;
use crate::effects::{LazyImages, RevealController};
use crate::error::Result;
use crate::helpers::{html_escape, lazy_image_tag, link_to, source_tag, time_tag};
use crate::policy::HtmlPolicy;

const ARTICLE_CLASS: &str =
    "group bg-white rounded-xl overflow-hidden shadow-md flex flex-col h-full elevated-card";
const IMAGE_CLASS: &str =
    "w-full h-full object-cover transition-transform duration-700 group-hover:scale-105";
const IMAGE_SIZES: &str = "(min-width: 1024px) 33vw, (min-width: 768px) 45vw, 90vw";
const IMAGE_WIDTH: u32 = 640;
const IMAGE_HEIGHT: u32 = 384;

/// Inner markup of the card for `post`.
///
/// Every interpolated value is escaped.
pub fn card_markup(post: &Post, featured_category: &str) -> String {
    let theme = post.badge_theme(featured_category).as_str();

    let mut sources = source_tag(post.image.avif, "image/avif");
    if let Some(webp) = post.image.webp {
        sources.push_str(&source_tag(webp, "image/webp"));
    }
    let image = lazy_image_tag(
        post.image.avif,
        post.title,
        IMAGE_WIDTH,
        IMAGE_HEIGHT,
        IMAGE_CLASS,
        IMAGE_SIZES,
    );

    format!(
        r#"<div class="relative overflow-hidden h-48"><picture>{sources}{image}</picture><div class="absolute inset-0 bg-gradient-to-t from-black/60 to-transparent opacity-0 group-hover:opacity-100 transition-opacity duration-500 flex items-end p-4"><span class="text-white text-sm font-medium">Read more →</span></div></div><div class="p-6 flex-1 flex flex-col"><div class="flex items-center space-x-2 mb-3"><span class="px-3 py-1 bg-{theme}-100 text-{theme}-700 text-xs font-medium rounded-full">{category}</span><span class="text-xs text-gray-600">{read_time}</span></div><h3 id="{title_id}" class="text-xl font-bold text-gray-900 mb-2">{title}</h3><p class="text-gray-600 mb-4 flex-1">{excerpt}</p><div class="flex items-center pt-4 border-t border-gray-100">{date}</div></div>"#,
        sources = sources,
        image = image,
        theme = theme,
        category = html_escape(post.category),
        read_time = html_escape(post.read_time),
        title_id = html_escape(&title_id(post)),
        title = link_to("#", post.title, "hover:underline focus-visible:underline"),
        excerpt = html_escape(post.excerpt),
        date = time_tag(post.date, "text-xs text-gray-500"),
    )
}

fn title_id(post: &Post) -> String {
    format!("{}-title", post.element_id())
}

/// Builds card elements and wires them into the lazy image registrar and
/// the reveal controller
pub struct CardRenderer<D: Dom> {
    dom: D,
    policy: HtmlPolicy,
    reveal: Rc<RevealController<D>>,
    lazy: Rc<LazyImages<D>>,
    featured_category: String,
}

impl<D: Dom> CardRenderer<D> {
    pub fn new(
        dom: D,
        policy: HtmlPolicy,
        reveal: Rc<RevealController<D>>,
        lazy: Rc<LazyImages<D>>,
        featured_category: String,
    ) -> Self {
        Self {
            dom,
            policy,
            reveal,
            lazy,
            featured_category,
        }
    }

    /// Build the `<article>` for one post
    pub fn create_card(&self, post: &Post) -> Result<D::Node> {
        let dom = &self.dom;
        let article = dom.create_element("article")?;
        let id = post.element_id();

        dom.set_class_name(&article, ARTICLE_CLASS);
        dom.set_attribute(&article, "data-animate", "");
        dom.set_attribute(&article, "role", "listitem");
        dom.set_attribute(&article, "id", &id);
        dom.set_attribute(&article, "aria-labelledby", &title_id(post));

        self.policy
            .set_inner_html(dom, &article, &card_markup(post, &self.featured_category))?;

        self.lazy.scan_within(&article);
        self.reveal.register(&article);
        Ok(article)
    }

    /// Build cards for `posts` in order, skipping any that fail
    pub fn render_all(&self, posts: &[Post]) -> Vec<D::Node> {
        posts
            .iter()
            .filter_map(|post| match self.create_card(post) {
                Ok(card) => Some(card),
                Err(e) => {
                    tracing::warn!("Skipping card for {:?}: {}", post.title, e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LazyConfig, RevealConfig};
    use crate::content::POSTS;
    use crate::dom::memory::MemoryDom;
    use scraper::{Html, Selector};

    fn renderer(dom: &MemoryDom) -> CardRenderer<MemoryDom> {
        let policy = HtmlPolicy::create(dom, "blogPolicy");
        CardRenderer::new(
            dom.clone(),
            policy,
            Rc::new(RevealController::new(dom.clone(), RevealConfig::default())),
            Rc::new(LazyImages::new(dom.clone(), LazyConfig::default())),
            "AI & ML".to_string(),
        )
    }

    #[test]
    fn test_card_markup() {
        let html = Html::parse_fragment(&card_markup(&POSTS[0], "AI & ML"));

        let sources = Selector::parse("picture source").unwrap();
        let types: Vec<_> = html
            .select(&sources)
            .filter_map(|s| s.value().attr("type"))
            .collect();
        assert_eq!(types, ["image/avif", "image/webp"]);

        let img = Selector::parse("img[data-lazy]").unwrap();
        let img = html.select(&img).next().unwrap();
        assert_eq!(img.value().attr("src"), Some("img/ai.avif"));
        assert_eq!(img.value().attr("alt"), Some("The Future of AI in Web Development"));

        let badge = Selector::parse("span.rounded-full").unwrap();
        let badge = html.select(&badge).next().unwrap();
        assert!(badge.value().classes().any(|c| c == "bg-primary-100"));
        assert_eq!(badge.text().collect::<String>(), "AI & ML");

        let time = Selector::parse("time").unwrap();
        let time = html.select(&time).next().unwrap();
        assert_eq!(time.value().attr("datetime"), Some("2025-10-18"));
    }

    #[test]
    fn test_single_source_without_webp() {
        let html = Html::parse_fragment(&card_markup(&POSTS[1], "AI & ML"));
        let sources = Selector::parse("source").unwrap();
        assert_eq!(html.select(&sources).count(), 1);

        let badge = Selector::parse("span.bg-secondary-100").unwrap();
        assert_eq!(html.select(&badge).count(), 1);
    }

    #[test]
    fn test_title_is_escaped() {
        let markup = card_markup(&POSTS[3], "AI & ML");
        assert!(markup.contains("Vue.js 4: What&#39;s New"));
        assert!(!markup.contains("What's"));
    }

    #[test]
    fn test_create_card_registers_effects() {
        let dom = MemoryDom::new();
        let cards = renderer(&dom);
        let card = cards.create_card(&POSTS[0]).unwrap();

        assert_eq!(dom.tag(card), "article");
        assert_eq!(
            dom.attribute(&card, "id").as_deref(),
            Some("post-the-future-of-ai-in-web-development")
        );
        assert_eq!(dom.attribute(&card, "role").as_deref(), Some("listitem"));
        assert!(dom.has_attribute(&card, "data-animate"));
        assert_eq!(dom.observed_count(), 1);

        let img = dom.query_within(&card, "img")[0];
        assert_eq!(dom.attribute(&img, "loading").as_deref(), Some("lazy"));
        assert_eq!(dom.listener_count(), 1);

        let title_id = dom.attribute(&card, "aria-labelledby").unwrap();
        let heading = dom.query_within(&card, "h3")[0];
        assert_eq!(dom.attribute(&heading, "id"), Some(title_id));
    }

    #[test]
    fn test_cards_use_trusted_policy() {
        let dom = MemoryDom::new();
        dom.set_trusted_types(true);
        let cards = renderer(&dom);
        assert_eq!(cards.render_all(&POSTS).len(), 6);
        assert_eq!(dom.trusted_insertions(), 6);
    }

    #[test]
    fn test_rejected_markup_skips_cards() {
        let dom = MemoryDom::new();
        dom.set_trusted_types(true);
        let cards = CardRenderer::new(
            dom.clone(),
            HtmlPolicy::Passthrough,
            Rc::new(RevealController::new(dom.clone(), RevealConfig::default())),
            Rc::new(LazyImages::new(dom.clone(), LazyConfig::default())),
            "AI & ML".to_string(),
        );

        assert!(cards.create_card(&POSTS[0]).is_err());
        assert!(cards.render_all(&POSTS).is_empty());
        assert_eq!(dom.trusted_insertions(), 0);
        assert_eq!(dom.observed_count(), 0);
        assert_eq!(dom.listener_count(), 0);
    }
}
