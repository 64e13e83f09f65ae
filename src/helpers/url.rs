//! URL helper functions

use percent_encoding::percent_decode_str;

/// Extract the element id an in-page link points at.
///
/// Returns `None` for an empty href, a bare `#`, or anything that is not a
/// fragment link. The fragment is percent-decoded.
///
/// # Examples
/// ```ignore
/// fragment_id("#about")        // -> Some("about")
/// fragment_id("#caf%C3%A9")    // -> Some("café")
/// fragment_id("#")             // -> None
/// ```
pub fn fragment_id(href: &str) -> Option<String> {
    let fragment = href.strip_prefix('#')?;
    if fragment.is_empty() {
        return None;
    }
    let decoded = percent_decode_str(fragment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| fragment.to_string());
    Some(decoded)
}
