//! Accessible names for icon-only buttons

use crate::config::NavConfig;
use crate::dom::Dom;

/// Give every icon-only button an accessible name.
///
/// The label comes from `data-icon-label`, then `title`, then the
/// configured fallback. Blank values count as missing. Buttons that already
/// have a non-blank `aria-label` are left alone. Returns the number of
/// buttons labelled.
pub fn annotate_icon_buttons<D: Dom>(dom: &D, config: &NavConfig) -> usize {
    let present = |button: &D::Node, name: &str| {
        dom.attribute(button, name)
            .filter(|value| !value.trim().is_empty())
    };

    let mut labelled = 0;
    for button in dom.query_all(&config.icon_button_selector) {
        if present(&button, "aria-label").is_some() {
            continue;
        }
        let label = present(&button, "data-icon-label")
            .or_else(|| present(&button, "title"))
            .unwrap_or_else(|| config.icon_button_fallback_label.clone());
        dom.set_attribute(&button, "aria-label", &label);
        labelled += 1;
    }
    labelled
}
