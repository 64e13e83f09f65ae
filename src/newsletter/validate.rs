use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `local@domain.tld` with no whitespace and a single `@`
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Check the shape of an email address. Surrounding whitespace is ignored.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}
