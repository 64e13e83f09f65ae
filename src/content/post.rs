//! Post records

use chrono::NaiveDate;

use crate::helpers::parse_display_date;

/// Cover image in its available encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSources {
    /// Primary AVIF path, also used as the `<img>` fallback `src`
    pub avif: &'static str,
    /// Optional WebP alternative
    pub webp: Option<&'static str>,
}

/// A blog post shown in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Post {
    pub title: &'static str,
    pub excerpt: &'static str,
    /// Publish date as displayed ("October 18, 2025")
    pub date: &'static str,
    pub category: &'static str,
    /// Display string, e.g. "5 min read"
    pub read_time: &'static str,
    pub image: ImageSources,
}

/// Color theme of a category badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTheme {
    Primary,
    Secondary,
}

impl BadgeTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeTheme::Primary => "primary",
            BadgeTheme::Secondary => "secondary",
        }
    }
}

impl Post {
    /// URL-friendly form of the title
    pub fn slug(&self) -> String {
        slug::slugify(self.title)
    }

    /// Id of the card element rendered for this post
    pub fn element_id(&self) -> String {
        format!("post-{}", self.slug())
    }

    /// Parsed publish date, if the display string is a valid date
    pub fn published(&self) -> Option<NaiveDate> {
        parse_display_date(self.date)
    }

    pub fn badge_theme(&self, featured_category: &str) -> BadgeTheme {
        if self.category == featured_category {
            BadgeTheme::Primary
        } else {
            BadgeTheme::Secondary
        }
    }
}

/// Posts rendered into the page feed, newest first
pub static POSTS: [Post; 6] = [
    Post {
        title: "The Future of AI in Web Development",
        excerpt: "Discover how artificial intelligence is revolutionizing the way we build and interact with websites and web applications.",
        date: "October 18, 2025",
        category: "AI & ML",
        read_time: "5 min read",
        image: ImageSources {
            avif: "img/ai.avif",
            webp: Some("img/ai.webp"),
        },
    },
    Post {
        title: "Responsive Design in 2025: Best Practices",
        excerpt: "Explore the latest techniques for creating responsive websites that work flawlessly across all devices and screen sizes.",
        date: "October 15, 2025",
        category: "Web Dev",
        read_time: "7 min read",
        image: ImageSources {
            avif: "img/responsive.avif",
            webp: None,
        },
    },
    Post {
        title: "Getting Started with React 19",
        excerpt: "A comprehensive guide to the new features and improvements in React 19 for modern web development.",
        date: "October 10, 2025",
        category: "Web Dev",
        read_time: "8 min read",
        image: ImageSources {
            avif: "img/react.avif",
            webp: None,
        },
    },
    Post {
        title: "Vue.js 4: What's New",
        excerpt: "Discover the exciting new features and performance improvements in Vue.js 4 and how they can benefit your projects.",
        date: "October 5, 2025",
        category: "Web Dev",
        read_time: "6 min read",
        image: ImageSources {
            avif: "img/vue-js.avif",
            webp: None,
        },
    },
    Post {
        title: "Modern JavaScript: ES2025 Features",
        excerpt: "Stay up-to-date with the latest JavaScript features and syntax improvements in ES2025.",
        date: "September 28, 2025",
        category: "JavaScript",
        read_time: "9 min read",
        image: ImageSources {
            avif: "img/es6.avif",
            webp: None,
        },
    },
    Post {
        title: "Building Scalable Web Applications",
        excerpt: "Learn the best practices and architectural patterns for building highly scalable web applications.",
        date: "September 20, 2025",
        category: "Web Dev",
        read_time: "10 min read",
        image: ImageSources {
            avif: "img/web-app.avif",
            webp: None,
        },
    },
];
