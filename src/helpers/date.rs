//! Date helper functions

use chrono::NaiveDate;

/// Display format of post dates ("October 18, 2025")
pub const DISPLAY_DATE_FORMAT: &str = "%B %d, %Y";

/// Parse a display date like "October 5, 2025"
pub fn parse_display_date(display: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(display.trim(), DISPLAY_DATE_FORMAT).ok()
}

/// Generate a `<time>` element that keeps the display text verbatim and
/// adds a machine-readable `datetime` attribute when the text parses.
///
/// # Examples
/// ```ignore
/// time_tag("October 5, 2025", "text-xs") // -> <time datetime="2025-10-05" class="text-xs">October 5, 2025</time>
/// ```
pub fn time_tag(display: &str, class: &str) -> String {
    let datetime = parse_display_date(display)
        .map(|date| format!(r#" datetime="{}""#, date.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        r#"<time{} class="{}">{}</time>"#,
        datetime,
        super::html_escape(class),
        super::html_escape(display)
    )
}
