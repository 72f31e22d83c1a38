//! Component instances and the component type vocabulary.
//!
//! A component instance is a single widget placed on a canvas, either in a
//! zone's ordered list or bound to a layout row slot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{next_timestamp_id, EntityId};

// ---------------------------------------------------------------------------
// Component type constants
// ---------------------------------------------------------------------------

/// Component types understood by the storefront renderer.
pub mod component_types {
    pub const TEXT: &str = "text";
    pub const IMAGE: &str = "image";
    pub const CUSTOM_HTML: &str = "custom-html";
    pub const PRODUCT_CARD: &str = "product-card";
    pub const PRODUCT_GRID: &str = "product-grid";
    pub const NAV_MENU: &str = "nav-menu";
    pub const SEARCH_BAR: &str = "search-bar";
    pub const BANNER: &str = "banner";
    pub const BUTTON: &str = "button";
    pub const SPACER: &str = "spacer";
    pub const VIDEO: &str = "video";
    pub const CATEGORY_LIST: &str = "category-list";
    pub const CART_SUMMARY: &str = "cart-summary";
    pub const FOOTER_LINKS: &str = "footer-links";

    /// All recognised component types.
    pub const ALL: &[&str] = &[
        TEXT,
        IMAGE,
        CUSTOM_HTML,
        PRODUCT_CARD,
        PRODUCT_GRID,
        NAV_MENU,
        SEARCH_BAR,
        BANNER,
        BUTTON,
        SPACER,
        VIDEO,
        CATEGORY_LIST,
        CART_SUMMARY,
        FOOTER_LINKS,
    ];
}

/// Check whether a component type string is recognised.
pub fn is_valid_component_type(component_type: &str) -> bool {
    component_types::ALL.contains(&component_type)
}

/// Validate a component type, returning a descriptive error if unknown.
pub fn validate_component_type(component_type: &str) -> Result<(), CoreError> {
    if is_valid_component_type(component_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown component type '{component_type}'. Must be one of: {}",
            component_types::ALL.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Component instance
// ---------------------------------------------------------------------------

/// Type-specific payload or presentation attributes.
pub type AttributeMap = BTreeMap<String, serde_json::Value>;

/// A widget placed on a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstance {
    /// Stable identity, assigned once at creation and never reused.
    pub id: EntityId,
    /// One of [`component_types::ALL`].
    #[serde(rename = "type")]
    pub component_type: String,
    /// Type-specific payload (text, image URL and alt, product id, ...).
    #[serde(default)]
    pub content: AttributeMap,
    /// CSS-like presentation attributes.
    #[serde(default)]
    pub style: AttributeMap,
    /// Zero-based rank within the owning container.
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub is_custom: bool,
}

impl ComponentInstance {
    /// Create a new component with a fresh timestamp-based id.
    pub fn new(component_type: impl Into<String>) -> Self {
        let component_type = component_type.into();
        let id = format!("{component_type}-{}", next_timestamp_id());
        Self {
            id,
            component_type,
            content: AttributeMap::new(),
            style: AttributeMap::new(),
            order: 0,
            is_custom: false,
        }
    }

    /// Set a content attribute.
    pub fn with_content(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.content.insert(key.into(), value);
        self
    }

    /// Set a style attribute.
    pub fn with_style(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.style.insert(key.into(), value);
        self
    }

    /// Mark the component as operator-authored (custom HTML, etc.).
    pub fn custom(mut self) -> Self {
        self.is_custom = true;
        self
    }
}

/// Rewrite `order` on every component to its zero-based position.
pub fn renumber(components: &mut [ComponentInstance]) {
    for (position, component) in components.iter_mut().enumerate() {
        component.order = position as u32;
    }
}

/// Returns `true` if the `order` values form exactly `0..len`.
pub fn orders_contiguous(components: &[ComponentInstance]) -> bool {
    components
        .iter()
        .enumerate()
        .all(|(position, c)| c.order as usize == position)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
