//! Conversion between canvas zones and backend layout templates.
//!
//! A layout template stores one section per zone listing fragment ids, and
//! a flat fragment list carrying each widget's style and payload.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::catalog::{deserialize_id, deserialize_opt_id};
use crate::component::{renumber, validate_component_type, AttributeMap, ComponentInstance};
use crate::edit::drop_allowed;
use crate::error::CoreError;
use crate::registry::WidgetRegistry;
use crate::types::EntityId;
use crate::zone::Zone;

/// A layout template document as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default, deserialize_with = "deserialize_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(alias = "pageType")]
    pub page_type: String,
    pub structure: LayoutStructure,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutStructure {
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// One zone of the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub fragment_ids: Vec<EntityId>,
}

/// One persisted widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub style: AttributeMap,
    pub widget_id: String,
    #[serde(default)]
    pub order_num: u32,
    #[serde(default)]
    pub content: AttributeMap,
    #[serde(default)]
    pub is_custom: bool,
}

/// Build a template from a canvas's zones.
///
/// `layout_id` is the id of an existing template to overwrite, if any.
pub fn to_layout_document(canvas: &Canvas, layout_id: Option<EntityId>) -> LayoutDocument {
    let sections = canvas
        .zones
        .iter()
        .map(|zone| Section {
            id: zone.name.clone(),
            fragment_ids: zone.components.iter().map(|c| c.id.clone()).collect(),
        })
        .collect();

    let fragments = canvas
        .zones
        .iter()
        .flat_map(|zone| zone.components.iter())
        .map(|c| Fragment {
            id: c.id.clone(),
            name: c.component_type.clone(),
            style: c.style.clone(),
            widget_id: c.component_type.clone(),
            order_num: c.order,
            content: c.content.clone(),
            is_custom: c.is_custom,
        })
        .collect();

    LayoutDocument {
        id: layout_id,
        page_type: canvas.page_type.clone(),
        structure: LayoutStructure { sections },
        fragments,
    }
}

/// Rebuild zones from a template, starting from the registry's blank zones.
///
/// Fragments are placed in the order listed by their section. Each fragment
/// must be a widget type its zone accepts and may appear only once.
pub fn zones_from_template(
    document: &LayoutDocument,
    registry: &WidgetRegistry,
) -> Result<Vec<Zone>, CoreError> {
    let mut zones = registry.blank_zones(&document.page_type)?;
    let fragments: HashMap<&str, &Fragment> = document
        .fragments
        .iter()
        .map(|f| (f.id.as_str(), f))
        .collect();
    let mut placed: HashSet<&str> = HashSet::new();

    for section in &document.structure.sections {
        let zone = zones
            .iter_mut()
            .find(|z| z.name == section.id)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Template section '{}' does not match any '{}' zone",
                    section.id, document.page_type
                ))
            })?;

        for fragment_id in &section.fragment_ids {
            let fragment = fragments.get(fragment_id.as_str()).ok_or_else(|| {
                CoreError::Validation(format!(
                    "Section '{}' references unknown fragment '{fragment_id}'",
                    section.id
                ))
            })?;
            validate_component_type(&fragment.widget_id)?;
            if !drop_allowed(registry, &document.page_type, zone, &fragment.widget_id) {
                return Err(CoreError::Validation(format!(
                    "Zone '{}' does not accept '{}' fragment '{fragment_id}'",
                    zone.name, fragment.widget_id
                )));
            }
            if !placed.insert(fragment.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Fragment '{fragment_id}' is placed more than once"
                )));
            }
            zone.components.push(ComponentInstance {
                id: fragment.id.clone(),
                component_type: fragment.widget_id.clone(),
                content: fragment.content.clone(),
                style: fragment.style.clone(),
                order: 0,
                is_custom: fragment.is_custom,
            });
        }
        renumber(&mut zone.components);
    }

    Ok(zones)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
