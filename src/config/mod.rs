//! Configuration module

mod page;

pub use page::BackToTopConfig;
pub use page::LazyConfig;
pub use page::NavConfig;
pub use page::NewsletterConfig;
pub use page::PageConfig;
pub use page::PostsConfig;
pub use page::RenderMode;
pub use page::RevealConfig;
