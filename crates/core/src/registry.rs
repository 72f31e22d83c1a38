//! Static catalog of page types, their zones, and the component types each
//! zone accepts.
//!
//! The registry constrains what can be dropped where. New canvases get
//! their empty zones from [`WidgetRegistry::blank_zones`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::component::component_types as ct;
use crate::error::CoreError;
use crate::zone::{Zone, ZoneLayout};

// ---------------------------------------------------------------------------
// Page type constants
// ---------------------------------------------------------------------------

/// Storefront page types with a predefined zone structure.
pub mod page_types {
    pub const HOME: &str = "home";
    pub const CATEGORY: &str = "category";
    pub const PRODUCT: &str = "product";
    pub const CART: &str = "cart";
    pub const LANDING: &str = "landing";

    pub const ALL: &[&str] = &[HOME, CATEGORY, PRODUCT, CART, LANDING];
}

/// Component types allowed in navigation chrome (headers).
const HEADER_TYPES: &[&str] = &[ct::NAV_MENU, ct::SEARCH_BAR, ct::IMAGE, ct::TEXT, ct::BUTTON];

/// Component types allowed in footers.
const FOOTER_TYPES: &[&str] = &[ct::FOOTER_LINKS, ct::TEXT, ct::IMAGE, ct::CUSTOM_HTML];

/// Component types allowed in secondary sidebars.
const SIDEBAR_TYPES: &[&str] = &[ct::CATEGORY_LIST, ct::TEXT, ct::IMAGE, ct::BANNER, ct::SPACER];

// ---------------------------------------------------------------------------
// Zone specs
// ---------------------------------------------------------------------------

/// Declared shape of one zone on a page type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSpec {
    pub name: String,
    /// Empty means any known component type.
    pub allowed_types: Vec<String>,
    pub layout: ZoneLayout,
    pub grid_columns: Option<u32>,
}

impl ZoneSpec {
    pub fn new(name: &str, allowed: &[&str], layout: ZoneLayout) -> Self {
        Self {
            name: name.to_string(),
            allowed_types: allowed.iter().map(|s| s.to_string()).collect(),
            layout,
            grid_columns: None,
        }
    }

    pub fn grid(name: &str, allowed: &[&str], columns: u32) -> Self {
        Self {
            grid_columns: Some(columns),
            ..Self::new(name, allowed, ZoneLayout::Grid)
        }
    }

    fn blank(&self, page_type: &str) -> Zone {
        Zone {
            name: self.name.clone(),
            page_type: page_type.to_string(),
            components: Vec::new(),
            allowed_types: self.allowed_types.clone(),
            layout: self.layout,
            grid_columns: self.grid_columns,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Page type → ordered zone specs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WidgetRegistry {
    pages: BTreeMap<String, Vec<ZoneSpec>>,
}

impl WidgetRegistry {
    /// An empty registry; see [`WidgetRegistry::builtin`] for the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// The storefront's built-in page structure.
    pub fn builtin() -> Self {
        Self::new()
            .with_page(
                page_types::HOME,
                vec![
                    ZoneSpec::new("header", HEADER_TYPES, ZoneLayout::Row),
                    ZoneSpec::new(
                        "hero",
                        &[ct::BANNER, ct::IMAGE, ct::VIDEO, ct::TEXT, ct::BUTTON],
                        ZoneLayout::Column,
                    ),
                    ZoneSpec::grid(
                        "featured",
                        &[ct::PRODUCT_CARD, ct::PRODUCT_GRID, ct::BANNER, ct::TEXT],
                        4,
                    ),
                    ZoneSpec::new("footer", FOOTER_TYPES, ZoneLayout::Row),
                ],
            )
            .with_page(
                page_types::CATEGORY,
                vec![
                    ZoneSpec::new("header", HEADER_TYPES, ZoneLayout::Row),
                    ZoneSpec::new("mainLeft", SIDEBAR_TYPES, ZoneLayout::Column),
                    ZoneSpec::grid(
                        "mainRight",
                        &[ct::PRODUCT_GRID, ct::PRODUCT_CARD, ct::TEXT, ct::BANNER],
                        3,
                    ),
                    ZoneSpec::new("footer", FOOTER_TYPES, ZoneLayout::Row),
                ],
            )
            .with_page(
                page_types::PRODUCT,
                vec![
                    ZoneSpec::new("header", HEADER_TYPES, ZoneLayout::Row),
                    ZoneSpec::new(
                        "gallery",
                        &[ct::IMAGE, ct::VIDEO],
                        ZoneLayout::Column,
                    ),
                    ZoneSpec::new(
                        "details",
                        &[ct::TEXT, ct::BUTTON, ct::CUSTOM_HTML, ct::SPACER],
                        ZoneLayout::Column,
                    ),
                    ZoneSpec::grid("related", &[ct::PRODUCT_CARD, ct::PRODUCT_GRID], 4),
                    ZoneSpec::new("footer", FOOTER_TYPES, ZoneLayout::Row),
                ],
            )
            .with_page(
                page_types::CART,
                vec![
                    ZoneSpec::new("header", HEADER_TYPES, ZoneLayout::Row),
                    ZoneSpec::new(
                        "summary",
                        &[ct::CART_SUMMARY, ct::TEXT, ct::BUTTON],
                        ZoneLayout::Column,
                    ),
                    ZoneSpec::new("footer", FOOTER_TYPES, ZoneLayout::Row),
                ],
            )
            .with_page(
                page_types::LANDING,
                vec![ZoneSpec::new("body", &[], ZoneLayout::Custom)],
            )
    }

    /// Register (or replace) the zone structure of a page type.
    pub fn with_page(mut self, page_type: &str, zones: Vec<ZoneSpec>) -> Self {
        self.pages.insert(page_type.to_string(), zones);
        self
    }

    /// All registered page types, sorted.
    pub fn page_types(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Zone specs for a page type.
    pub fn zones_for(&self, page_type: &str) -> Result<&[ZoneSpec], CoreError> {
        self.pages.get(page_type).map(Vec::as_slice).ok_or_else(|| {
            CoreError::Validation(format!(
                "Unknown page type '{page_type}'. Must be one of: {}",
                self.pages.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Spec of a single zone, if both page type and zone exist.
    pub fn zone_spec(&self, page_type: &str, zone: &str) -> Option<&ZoneSpec> {
        self.pages.get(page_type)?.iter().find(|z| z.name == zone)
    }

    /// Returns `true` if `component_type` may be dropped into `zone`.
    ///
    /// Zones unknown to the registry accept nothing.
    pub fn allows(&self, page_type: &str, zone: &str, component_type: &str) -> bool {
        match self.zone_spec(page_type, zone) {
            Some(spec) => {
                spec.allowed_types.is_empty() || spec.allowed_types.iter().any(|t| t == component_type)
            }
            None => false,
        }
    }

    /// Empty zones for a new canvas of `page_type`.
    pub fn blank_zones(&self, page_type: &str) -> Result<Vec<Zone>, CoreError> {
        Ok(self
            .zones_for(page_type)?
            .iter()
            .map(|spec| spec.blank(page_type))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
