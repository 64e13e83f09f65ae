//! Page configuration (`<script id="page-config" type="application/json">`)

use serde::{Deserialize, Serialize};

use crate::dom::Dom;
use crate::error::Result;

/// Id of the optional JSON data island holding the configuration
pub const CONFIG_ELEMENT_ID: &str = "page-config";

/// Main page configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Name of the trusted types policy used for card markup
    pub trusted_types_policy: String,

    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub lazy: LazyConfig,
    #[serde(default)]
    pub nav: NavConfig,
    #[serde(default)]
    pub back_to_top: BackToTopConfig,
    #[serde(default)]
    pub posts: PostsConfig,
    #[serde(default)]
    pub newsletter: NewsletterConfig,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            trusted_types_policy: "blogPolicy".to_string(),
            reveal: RevealConfig::default(),
            lazy: LazyConfig::default(),
            nav: NavConfig::default(),
            back_to_top: BackToTopConfig::default(),
            posts: PostsConfig::default(),
            newsletter: NewsletterConfig::default(),
        }
    }
}

impl PageConfig {
    /// Parse configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PageConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Load configuration from the page's data island, falling back to the
    /// defaults when it is absent or malformed
    pub fn load<D: Dom>(dom: &D) -> Self {
        let Some(island) = dom.element_by_id(CONFIG_ELEMENT_ID) else {
            return Self::default();
        };

        let json = dom.text(&island);
        if json.trim().is_empty() {
            return Self::default();
        }

        match Self::from_json(&json) {
            Ok(config) => {
                tracing::debug!("Loaded page configuration from #{}", CONFIG_ELEMENT_ID);
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring page configuration: {}", e);
                Self::default()
            }
        }
    }
}

/// Reveal-on-scroll configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub selector: String,
    pub visible_class: String,
    /// Fraction of the element that must be inside the viewport
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: "[data-animate]".to_string(),
            visible_class: "is-visible".to_string(),
            threshold: 0.15,
            root_margin: "0px 0px -10% 0px".to_string(),
        }
    }
}

/// Lazy image configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyConfig {
    pub selector: String,
    /// Attribute stamped with `loaded_value` once the image has loaded
    pub marker_attribute: String,
    pub loaded_value: String,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            selector: "img[data-lazy]".to_string(),
            marker_attribute: "data-lazy".to_string(),
            loaded_value: "loaded".to_string(),
        }
    }
}

/// Navigation configuration: mobile menu, sidebar, anchors, icon buttons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub trigger_id: String,
    pub menu_id: String,
    pub menu_link_selector: String,
    pub sidebar_id: String,
    pub overlay_id: String,
    pub close_id: String,
    pub sidebar_link_selector: String,
    pub active_class: String,
    pub icon_selector: String,
    pub open_icon_class: String,
    pub close_icon_class: String,
    pub header_selector: String,
    /// Header height used when no header element is present
    pub header_fallback_offset: f64,
    pub icon_button_selector: String,
    pub icon_button_fallback_label: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            trigger_id: "mobile-menu-button".to_string(),
            menu_id: "mobile-menu".to_string(),
            menu_link_selector: ".mobile-link".to_string(),
            sidebar_id: "sidebar".to_string(),
            overlay_id: "overlay".to_string(),
            close_id: "close-sidebar".to_string(),
            sidebar_link_selector: ".sidebar-link".to_string(),
            active_class: "active".to_string(),
            icon_selector: "i".to_string(),
            open_icon_class: "fa-bars".to_string(),
            close_icon_class: "fa-times".to_string(),
            header_selector: "header".to_string(),
            header_fallback_offset: 72.0,
            icon_button_selector: "[data-icon-button]".to_string(),
            icon_button_fallback_label: "Toggle menu".to_string(),
        }
    }
}

/// Back-to-top button configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackToTopConfig {
    pub button_id: String,
    /// Scroll offset in pixels above which the button is shown
    pub threshold: f64,
    pub visible_classes: Vec<String>,
    pub hidden_classes: Vec<String>,
}

impl Default for BackToTopConfig {
    fn default() -> Self {
        Self {
            button_id: "back-to-top".to_string(),
            threshold: 300.0,
            visible_classes: vec!["opacity-100".to_string(), "visible".to_string()],
            hidden_classes: vec!["opacity-0".to_string(), "invisible".to_string()],
        }
    }
}

/// How the post feed inserts its cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderMode {
    /// Replace the container contents with every card in one pass
    Immediate,
    /// Append `batch_size` cards per idle period
    Idle {
        #[serde(default = "default_batch_size")]
        batch_size: usize,
    },
}

fn default_batch_size() -> usize {
    2
}

impl Default for RenderMode {
    fn default() -> Self {
        RenderMode::Idle {
            batch_size: default_batch_size(),
        }
    }
}

/// Post feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostsConfig {
    pub container_selector: String,
    #[serde(default)]
    pub render: RenderMode,
    /// Category whose badge uses the primary theme
    pub featured_category: String,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            container_selector: "[data-dynamic-posts]".to_string(),
            render: RenderMode::default(),
            featured_category: "AI & ML".to_string(),
        }
    }
}

/// Newsletter form configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsletterConfig {
    pub form_selector: String,
    pub input_selector: String,
    pub success_message: String,
    pub error_message: String,
    pub success_class: String,
    pub error_class: String,
    pub success_delay_ms: u32,
    pub error_delay_ms: u32,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            form_selector: "form[data-newsletter]".to_string(),
            input_selector: r#"input[type="email"]"#.to_string(),
            success_message: "Thanks for subscribing! Check your inbox to confirm.".to_string(),
            error_message: "Please enter a valid email address.".to_string(),
            success_class: "newsletter-message mt-4 p-3 rounded bg-green-100 text-green-700"
                .to_string(),
            error_class: "newsletter-message mt-4 p-3 rounded bg-red-100 text-red-700".to_string(),
            success_delay_ms: 5000,
            error_delay_ms: 3000,
        }
    }
}
