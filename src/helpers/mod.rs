//! Markup and formatting helpers
//!
//! Small string builders shared by the card renderer and the in-memory
//! document.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
