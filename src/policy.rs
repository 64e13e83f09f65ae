//! Trusted HTML insertion
//!
//! Markup strings built by the card renderer go through an [`HtmlPolicy`].
//! In documents with trusted types the policy tags the markup as trusted;
//! elsewhere it is a passthrough.

use crate::dom::{Dom, PolicyId};
use crate::error::Result;

/// Wrapper around the document's trusted HTML mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlPolicy {
    /// No trust mechanism; markup is inserted as-is
    Passthrough,
    /// Markup is converted through a registered policy
    Trusted(PolicyId),
}

impl HtmlPolicy {
    /// Create the policy `name`, reusing an already registered policy of the
    /// same name when creation is refused
    pub fn create<D: Dom>(dom: &D, name: &str) -> Self {
        if !dom.supports_trusted_types() {
            return HtmlPolicy::Passthrough;
        }

        match dom.create_html_policy(name) {
            Ok(id) => HtmlPolicy::Trusted(id),
            Err(e) => {
                tracing::debug!("Creating policy {:?} failed ({}), looking it up", name, e);
                match dom.html_policy(name) {
                    Some(id) => HtmlPolicy::Trusted(id),
                    None => {
                        tracing::warn!("No trusted types policy named {:?}; inserting raw markup", name);
                        HtmlPolicy::Passthrough
                    }
                }
            }
        }
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, HtmlPolicy::Trusted(_))
    }

    /// Replace the children of `node` with `markup`
    pub fn set_inner_html<D: Dom>(&self, dom: &D, node: &D::Node, markup: &str) -> Result<()> {
        let policy = match self {
            HtmlPolicy::Passthrough => None,
            HtmlPolicy::Trusted(id) => Some(*id),
        };
        dom.set_inner_html(node, markup, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryDom;

    #[test]
    fn test_passthrough_without_trusted_types() {
        let dom = MemoryDom::from_html(r#"<div id="d"></div>"#);
        let policy = HtmlPolicy::create(&dom, "blogPolicy");
        assert_eq!(policy, HtmlPolicy::Passthrough);

        let d = dom.element_by_id("d").unwrap();
        policy.set_inner_html(&dom, &d, "<p>hi</p>").unwrap();
        assert_eq!(dom.inner_html(d), "<p>hi</p>");
        assert_eq!(dom.trusted_insertions(), 0);
    }

    #[test]
    fn test_trusted_policy_is_created() {
        let dom = MemoryDom::from_html(r#"<div id="d"></div>"#);
        dom.set_trusted_types(true);
        let policy = HtmlPolicy::create(&dom, "blogPolicy");
        assert!(policy.is_trusted());

        let d = dom.element_by_id("d").unwrap();
        policy.set_inner_html(&dom, &d, "<p>hi</p>").unwrap();
        assert_eq!(dom.trusted_insertions(), 1);
    }

    #[test]
    fn test_existing_policy_is_reused() {
        let dom = MemoryDom::new();
        dom.set_trusted_types(true);
        let existing = dom.preregister_policy("blogPolicy");

        assert_eq!(
            HtmlPolicy::create(&dom, "blogPolicy"),
            HtmlPolicy::Trusted(existing)
        );
    }

    #[test]
    fn test_disallowed_policy_falls_back_to_passthrough() {
        let dom = MemoryDom::from_html(r#"<div id="d"></div>"#);
        dom.set_trusted_types(true);
        dom.set_policy_allowlist(&["somethingElse"]);

        let policy = HtmlPolicy::create(&dom, "blogPolicy");
        assert_eq!(policy, HtmlPolicy::Passthrough);

        let d = dom.element_by_id("d").unwrap();
        assert!(policy.set_inner_html(&dom, &d, "<p>hi</p>").is_err());
        assert!(dom.children(d).is_empty());
    }
}
