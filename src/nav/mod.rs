//! Navigation: the menu drawer and in-page anchor scrolling

mod drawer;
mod smooth_scroll;

pub use drawer::{Drawer, DrawerParts, DrawerState};
pub use smooth_scroll::SmoothScroll;
