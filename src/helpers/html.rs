//! HTML helper functions

/// Generate a `<source>` tag for a `<picture>` element
///
/// # Examples
/// ```ignore
/// source_tag("img/ai.webp", "image/webp") // -> <source srcset="img/ai.webp" type="image/webp">
/// ```
pub fn source_tag(srcset: &str, mime: &str) -> String {
    format!(
        r#"<source srcset="{}" type="{}">"#,
        html_escape(srcset),
        html_escape(mime)
    )
}

/// Generate a lazily handled image tag
///
/// The image carries `data-lazy="true"` so the lazy image registrar picks
/// it up after insertion.
pub fn lazy_image_tag(
    src: &str,
    alt: &str,
    width: u32,
    height: u32,
    class: &str,
    sizes: &str,
) -> String {
    format!(
        r#"<img src="{}" alt="{}" width="{}" height="{}" data-lazy="true" class="{}" sizes="{}">"#,
        html_escape(src),
        html_escape(alt),
        width,
        height,
        html_escape(class),
        html_escape(sizes)
    )
}

/// Generate an anchor tag with escaped text
///
/// # Examples
/// ```ignore
/// link_to("#", "Title", "hover:underline") // -> <a href="#" class="hover:underline">Title</a>
/// ```
pub fn link_to(href: &str, text: &str, class: &str) -> String {
    format!(
        r#"<a href="{}" class="{}">{}</a>"#,
        html_escape(href),
        html_escape(class),
        html_escape(text)
    )
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("What's <new> & \"hot\""), "What&#39;s &lt;new&gt; &amp; &quot;hot&quot;");
    }

    #[test]
    fn test_source_tag() {
        let tag = source_tag("img/ai.avif", "image/avif");
        assert_eq!(tag, r#"<source srcset="img/ai.avif" type="image/avif">"#);
    }

    #[test]
    fn test_lazy_image_tag() {
        let tag = lazy_image_tag("img/a.avif", "A \"quoted\" title", 640, 384, "w-full", "90vw");
        assert!(tag.contains(r#"data-lazy="true""#));
        assert!(tag.contains(r#"alt="A &quot;quoted&quot; title""#));
        assert!(tag.contains(r#"width="640" height="384""#));
    }

    #[test]
    fn test_link_to() {
        assert_eq!(
            link_to("#", "Vue.js 4: What's New", "x"),
            r##"<a href="#" class="x">Vue.js 4: What&#39;s New</a>"##
        );
    }
}
