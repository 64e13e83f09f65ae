//! Visual effects driven by scrolling and loading
//!
//! - [`RevealController`]: one-shot reveal of marked elements as they enter
//!   the viewport
//! - [`LazyImages`]: loading hints and a `loaded` marker for lazy images
//! - [`BackToTop`]: floating button shown past a scroll threshold
//! - [`annotate_icon_buttons`]: accessible labels for icon-only controls

mod back_to_top;
mod icons;
mod lazy;
mod reveal;

pub use back_to_top::BackToTop;
pub use icons::annotate_icon_buttons;
pub use lazy::{LazyImages, LazyState};
pub use reveal::RevealController;
