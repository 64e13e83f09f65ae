//! Blog posts and the card feed

mod card;
mod feed;
mod post;

pub use card::{card_markup, CardRenderer};
pub use feed::{FeedState, PostFeed};
pub use post::{BadgeTheme, ImageSources, Post, POSTS};
