//! Structural edit operations on a [`Canvas`].
//!
//! [`apply_edit`] is pure: it never touches its input and returns a new
//! canvas value for the caller to record in the history. Gestures the
//! canvas cannot honour (removing a row's last column, dropping a widget
//! where the zone does not accept it) come back as
//! [`EditOutcome::Refused`] rather than an error, and must not be recorded.

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::component::{validate_component_type, AttributeMap, ComponentInstance};
use crate::error::CoreError;
use crate::layout::LayoutRow;
use crate::registry::WidgetRegistry;
use crate::types::EntityId;
use crate::zone::Zone;

/// A single user-level edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    AddRow {
        column_widths: Vec<u32>,
    },
    RemoveRow {
        row: usize,
    },
    AddColumn {
        row: usize,
    },
    RemoveColumn {
        row: usize,
        column: usize,
    },
    SetSlotWidget {
        row: usize,
        column: usize,
        component: ComponentInstance,
    },
    ClearSlot {
        row: usize,
        column: usize,
    },
    BindFragment {
        row: usize,
        column: usize,
        fragment_id: EntityId,
    },
    AddComponent {
        zone: String,
        component: ComponentInstance,
        #[serde(default)]
        index: Option<usize>,
    },
    RemoveComponent {
        zone: String,
        component_id: EntityId,
    },
    UpdateComponent {
        zone: String,
        component_id: EntityId,
        #[serde(default)]
        content: Option<AttributeMap>,
        #[serde(default)]
        style: Option<AttributeMap>,
    },
    MoveComponent {
        from_zone: String,
        component_id: EntityId,
        to_zone: String,
        index: usize,
    },
}

impl Edit {
    /// Short operation name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddRow { .. } => "add_row",
            Self::RemoveRow { .. } => "remove_row",
            Self::AddColumn { .. } => "add_column",
            Self::RemoveColumn { .. } => "remove_column",
            Self::SetSlotWidget { .. } => "set_slot_widget",
            Self::ClearSlot { .. } => "clear_slot",
            Self::BindFragment { .. } => "bind_fragment",
            Self::AddComponent { .. } => "add_component",
            Self::RemoveComponent { .. } => "remove_component",
            Self::UpdateComponent { .. } => "update_component",
            Self::MoveComponent { .. } => "move_component",
        }
    }
}

/// Result of applying an [`Edit`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The edit produced a new canvas value.
    Applied(Canvas),
    /// The edit was a structural no-op; the canvas is unchanged.
    Refused { reason: String },
}

impl EditOutcome {
    fn refused(reason: impl Into<String>) -> Self {
        Self::Refused {
            reason: reason.into(),
        }
    }
}

/// Apply `edit` to a copy of `canvas`.
pub fn apply_edit(
    canvas: &Canvas,
    edit: &Edit,
    registry: &WidgetRegistry,
) -> Result<EditOutcome, CoreError> {
    let mut next = canvas.clone();

    match edit {
        Edit::AddRow { column_widths } => {
            if column_widths.is_empty() {
                return Err(CoreError::Validation(
                    "A row needs at least one column".into(),
                ));
            }
            next.rows.push(LayoutRow::from_widths(column_widths));
        }

        Edit::RemoveRow { row } => {
            next.row(*row)?;
            next.rows.remove(*row);
        }

        Edit::AddColumn { row } => {
            next.row_mut(*row)?.add_column();
        }

        Edit::RemoveColumn { row, column } => {
            let target = next.row_mut(*row)?;
            if target.columns.len() > 1 {
                check_column(target, *row, *column)?;
            }
            match target.remove_column(*column) {
                Ok(_) => renumber_slots(target),
                Err(refusal) => return Ok(EditOutcome::refused(refusal.reason())),
            }
        }

        Edit::SetSlotWidget {
            row,
            column,
            component,
        } => {
            validate_component_type(&component.component_type)?;
            if canvas_contains(canvas, &component.id) {
                return Err(duplicate_id(&component.id));
            }
            let target = next.row_mut(*row)?;
            check_column(target, *row, *column)?;
            let slot = &mut target.columns[*column];
            slot.component = Some(component.clone());
            slot.fragment_id = None;
            renumber_slots(target);
        }

        Edit::ClearSlot { row, column } => {
            let target = next.row_mut(*row)?;
            check_column(target, *row, *column)?;
            let slot = &mut target.columns[*column];
            if slot.component.is_none() {
                return Ok(EditOutcome::refused("slot is already empty"));
            }
            slot.component = None;
            slot.fragment_id = None;
            renumber_slots(target);
        }

        Edit::BindFragment {
            row,
            column,
            fragment_id,
        } => {
            let target = next.row_mut(*row)?;
            check_column(target, *row, *column)?;
            let slot = &mut target.columns[*column];
            if slot.component.is_none() {
                return Err(CoreError::Validation(format!(
                    "Slot {row}-{column} has no widget to bind a fragment to"
                )));
            }
            slot.fragment_id = Some(fragment_id.clone());
        }

        Edit::AddComponent {
            zone,
            component,
            index,
        } => {
            validate_component_type(&component.component_type)?;
            if canvas_contains(canvas, &component.id) {
                return Err(duplicate_id(&component.id));
            }
            let target = next.zone_mut(zone)?;
            if !drop_allowed(registry, &canvas.page_type, target, &component.component_type) {
                return Ok(EditOutcome::refused(not_allowed(
                    zone,
                    &component.component_type,
                )));
            }
            let index = index.unwrap_or(target.components.len());
            target.insert(index, component.clone());
        }

        Edit::RemoveComponent { zone, component_id } => {
            next.zone_mut(zone)?.remove(component_id)?;
        }

        Edit::UpdateComponent {
            zone,
            component_id,
            content,
            style,
        } => {
            let target = next.zone_mut(zone)?;
            let position = target
                .position_of(component_id)
                .ok_or_else(|| CoreError::not_found("Component", component_id.as_str()))?;
            let component = &mut target.components[position];
            if let Some(content) = content {
                merge_attributes(&mut component.content, content);
            }
            if let Some(style) = style {
                merge_attributes(&mut component.style, style);
            }
        }

        Edit::MoveComponent {
            from_zone,
            component_id,
            to_zone,
            index,
        } => {
            let component_type = {
                let source = next.zone(from_zone)?;
                let position = source
                    .position_of(component_id)
                    .ok_or_else(|| CoreError::not_found("Component", component_id.as_str()))?;
                source.components[position].component_type.clone()
            };
            let destination = next.zone(to_zone)?;
            if !drop_allowed(registry, &canvas.page_type, destination, &component_type) {
                return Ok(EditOutcome::refused(not_allowed(to_zone, &component_type)));
            }

            // Same two-phase algorithm for reorder and cross-zone move.
            let moved = next.zone_mut(from_zone)?.remove(component_id)?;
            next.zone_mut(to_zone)?.insert(*index, moved);
        }
    }

    next.touch();
    Ok(EditOutcome::Applied(next))
}

// ---- helpers ----

fn check_column(row: &LayoutRow, row_index: usize, column: usize) -> Result<(), CoreError> {
    if column < row.columns.len() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Column {column} is out of range (row {row_index} has {} columns)",
            row.columns.len()
        )))
    }
}

/// Renumber slot-bound components in column order.
fn renumber_slots(row: &mut LayoutRow) {
    for (position, component) in row
        .columns
        .iter_mut()
        .filter_map(|c| c.component.as_mut())
        .enumerate()
    {
        component.order = position as u32;
    }
}

pub(crate) fn drop_allowed(registry: &WidgetRegistry, page_type: &str, zone: &Zone, component_type: &str) -> bool {
    match registry.zone_spec(page_type, &zone.name) {
        Some(_) => registry.allows(page_type, &zone.name, component_type),
        None => zone.allows(component_type),
    }
}

fn not_allowed(zone: &str, component_type: &str) -> String {
    format!("zone '{zone}' does not accept '{component_type}' components")
}

fn canvas_contains(canvas: &Canvas, component_id: &str) -> bool {
    let in_zones = canvas
        .zones
        .iter()
        .any(|z| z.position_of(component_id).is_some());
    let in_rows = canvas
        .rows
        .iter()
        .flat_map(|r| r.columns.iter())
        .filter_map(|c| c.component.as_ref())
        .any(|c| c.id == component_id);
    in_zones || in_rows
}

fn duplicate_id(component_id: &str) -> CoreError {
    CoreError::Conflict(format!(
        "Component '{component_id}' is already on this canvas"
    ))
}

/// Overwrite keys from `patch`; a JSON `null` removes the key.
fn merge_attributes(target: &mut AttributeMap, patch: &AttributeMap) {
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::component::orders_contiguous;
    use crate::layout::FULL_WIDTH;

    fn registry() -> WidgetRegistry {
        WidgetRegistry::builtin()
    }

    fn home() -> Canvas {
        Canvas::new("Home", "home", &registry()).unwrap()
    }

    fn applied(canvas: &Canvas, edit: Edit) -> Canvas {
        match apply_edit(canvas, &edit, &registry()).unwrap() {
            EditOutcome::Applied(next) => next,
            EditOutcome::Refused { reason } => panic!("{} refused: {reason}", edit.name()),
        }
    }

    fn with_components(zone: &str, types: &[&str]) -> Canvas {
        let mut canvas = home();
        for t in types {
            canvas = applied(
                &canvas,
                Edit::AddComponent {
                    zone: zone.into(),
                    component: ComponentInstance::new(*t),
                    index: None,
                },
            );
        }
        canvas
    }

    fn ids(canvas: &Canvas, zone: &str) -> Vec<String> {
        canvas
            .zone(zone)
            .unwrap()
            .components
            .iter()
            .map(|c| c.id.clone())
            .collect()
    }

    // -- Rows and columns ---------------------------------------------------

    #[test]
    fn add_row_keeps_caller_widths() {
        let canvas = applied(&home(), Edit::AddRow { column_widths: vec![60, 40] });
        assert_eq!(canvas.rows.len(), 1);
        assert_eq!(canvas.rows[0].columns[0].width, 60);
    }

    #[test]
    fn add_row_without_columns_rejected() {
        let err = apply_edit(&home(), &Edit::AddRow { column_widths: vec![] }, &registry());
        assert_matches!(err, Err(CoreError::Validation(_)));
    }

    #[test]
    fn apply_does_not_mutate_input() {
        let original = home();
        let copy = original.clone();
        let _ = applied(&original, Edit::AddRow { column_widths: vec![100] });
        assert_eq!(original, copy);
    }

    #[test]
    fn remove_row_shifts_later_rows_and_drops_components() {
        let mut canvas = home();
        canvas = applied(&canvas, Edit::AddRow { column_widths: vec![100] });
        canvas = applied(&canvas, Edit::AddRow { column_widths: vec![50, 50] });
        canvas = applied(
            &canvas,
            Edit::SetSlotWidget {
                row: 0,
                column: 0,
                component: ComponentInstance::new("text"),
            },
        );
        canvas = applied(&canvas, Edit::RemoveRow { row: 0 });
        assert_eq!(canvas.rows.len(), 1);
        assert_eq!(canvas.rows[0].columns.len(), 2);
        assert_eq!(canvas.component_count(), 0);
    }

    #[test]
    fn remove_row_out_of_range() {
        let err = apply_edit(&home(), &Edit::RemoveRow { row: 3 }, &registry());
        assert_matches!(err, Err(CoreError::Validation(_)));
    }

    #[test]
    fn column_edits_keep_width_invariant() {
        let mut canvas = applied(&home(), Edit::AddRow { column_widths: vec![100] });
        for _ in 0..5 {
            canvas = applied(&canvas, Edit::AddColumn { row: 0 });
            assert_eq!(canvas.rows[0].total_width(), FULL_WIDTH);
        }
        while canvas.rows[0].columns.len() > 1 {
            canvas = applied(&canvas, Edit::RemoveColumn { row: 0, column: 1 });
            assert_eq!(canvas.rows[0].total_width(), FULL_WIDTH);
        }
        assert_eq!(canvas.rows[0].columns.len(), 1);
    }

    #[test]
    fn wide_rows_accept_more_columns() {
        let widths = crate::layout::even_widths(12);
        let mut canvas = applied(&home(), Edit::AddRow { column_widths: widths });
        canvas = applied(&canvas, Edit::AddColumn { row: 0 });
        assert_eq!(canvas.rows[0].columns.len(), 13);
        assert_eq!(canvas.rows[0].total_width(), FULL_WIDTH);

        let canvas = applied(&home(), Edit::AddRow { column_widths: vec![5; 20] });
        assert_eq!(canvas.rows[0].columns.len(), 20);
    }

    #[test]
    fn remove_last_column_is_refused_and_unchanged() {
        let canvas = applied(&home(), Edit::AddRow { column_widths: vec![100] });
        let outcome =
            apply_edit(&canvas, &Edit::RemoveColumn { row: 0, column: 0 }, &registry()).unwrap();
        assert_matches!(outcome, EditOutcome::Refused { .. });
        assert_eq!(canvas.rows[0].columns.len(), 1);
        assert_eq!(canvas.rows[0].columns[0].width, 100);
    }

    #[test]
    fn remove_column_out_of_range() {
        let canvas = applied(&home(), Edit::AddRow { column_widths: vec![50, 50] });
        let err = apply_edit(&canvas, &Edit::RemoveColumn { row: 0, column: 5 }, &registry());
        assert_matches!(err, Err(CoreError::Validation(_)));
    }

    #[test]
    fn slot_widgets_keep_contiguous_order() {
        let mut canvas = applied(&home(), Edit::AddRow { column_widths: vec![34, 33, 33] });
        for column in [2, 0] {
            canvas = applied(
                &canvas,
                Edit::SetSlotWidget {
                    row: 0,
                    column,
                    component: ComponentInstance::new("image"),
                },
            );
        }
        let orders: Vec<u32> = canvas.rows[0]
            .columns
            .iter()
            .filter_map(|c| c.component.as_ref().map(|c| c.order))
            .collect();
        assert_eq!(orders, vec![0, 1]);

        canvas = applied(&canvas, Edit::ClearSlot { row: 0, column: 0 });
        let remaining = canvas.rows[0].columns[2].component.as_ref().unwrap();
        assert_eq!(remaining.order, 0);
    }

    #[test]
    fn replacing_slot_widget_clears_fragment_id() {
        let mut canvas = applied(&home(), Edit::AddRow { column_widths: vec![100] });
        canvas = applied(
            &canvas,
            Edit::SetSlotWidget {
                row: 0,
                column: 0,
                component: ComponentInstance::new("text"),
            },
        );
        canvas = applied(
            &canvas,
            Edit::BindFragment {
                row: 0,
                column: 0,
                fragment_id: "frag-9".into(),
            },
        );
        assert_eq!(canvas.rows[0].columns[0].fragment_id.as_deref(), Some("frag-9"));

        canvas = applied(
            &canvas,
            Edit::SetSlotWidget {
                row: 0,
                column: 0,
                component: ComponentInstance::new("image"),
            },
        );
        assert!(canvas.rows[0].columns[0].fragment_id.is_none());
    }

    #[test]
    fn clear_empty_slot_refused() {
        let canvas = applied(&home(), Edit::AddRow { column_widths: vec![100] });
        let outcome =
            apply_edit(&canvas, &Edit::ClearSlot { row: 0, column: 0 }, &registry()).unwrap();
        assert_matches!(outcome, EditOutcome::Refused { .. });
    }

    #[test]
    fn bind_fragment_requires_widget() {
        let canvas = applied(&home(), Edit::AddRow { column_widths: vec![100] });
        let err = apply_edit(
            &canvas,
            &Edit::BindFragment {
                row: 0,
                column: 0,
                fragment_id: "f".into(),
            },
            &registry(),
        );
        assert_matches!(err, Err(CoreError::Validation(_)));
    }

    // -- Zones ----------------------------------------------------------------

    #[test]
    fn add_component_at_index() {
        let canvas = with_components("hero", &["banner", "text"]);
        let next = applied(
            &canvas,
            Edit::AddComponent {
                zone: "hero".into(),
                component: ComponentInstance::new("button"),
                index: Some(1),
            },
        );
        let zone = next.zone("hero").unwrap();
        assert_eq!(zone.components[1].component_type, "button");
        assert!(orders_contiguous(&zone.components));
    }

    #[test]
    fn add_disallowed_component_refused() {
        let outcome = apply_edit(
            &home(),
            &Edit::AddComponent {
                zone: "header".into(),
                component: ComponentInstance::new("product-grid"),
                index: None,
            },
            &registry(),
        )
        .unwrap();
        assert_matches!(outcome, EditOutcome::Refused { reason } if reason.contains("header"));
    }

    #[test]
    fn add_unknown_type_rejected() {
        let err = apply_edit(
            &home(),
            &Edit::AddComponent {
                zone: "hero".into(),
                component: ComponentInstance::new("hologram"),
                index: None,
            },
            &registry(),
        );
        assert_matches!(err, Err(CoreError::Validation(_)));
    }

    #[test]
    fn add_duplicate_id_conflicts() {
        let canvas = with_components("hero", &["text"]);
        let existing = canvas.zone("hero").unwrap().components[0].clone();
        let err = apply_edit(
            &canvas,
            &Edit::AddComponent {
                zone: "hero".into(),
                component: existing,
                index: None,
            },
            &registry(),
        );
        assert_matches!(err, Err(CoreError::Conflict(_)));
    }

    #[test]
    fn remove_component_renumbers() {
        let canvas = with_components("hero", &["banner", "text", "button"]);
        let id = ids(&canvas, "hero")[0].clone();
        let next = applied(
            &canvas,
            Edit::RemoveComponent {
                zone: "hero".into(),
                component_id: id,
            },
        );
        let zone = next.zone("hero").unwrap();
        assert_eq!(zone.components.len(), 2);
        assert!(orders_contiguous(&zone.components));
    }

    #[test]
    fn update_component_merges_and_removes_keys() {
        let canvas = with_components("hero", &["text"]);
        let id = ids(&canvas, "hero")[0].clone();
        let mut content = AttributeMap::new();
        content.insert("text".into(), serde_json::json!("Welcome"));
        let next = applied(
            &canvas,
            Edit::UpdateComponent {
                zone: "hero".into(),
                component_id: id.clone(),
                content: Some(content),
                style: None,
            },
        );
        assert_eq!(next.zone("hero").unwrap().components[0].content["text"], "Welcome");

        let mut clear = AttributeMap::new();
        clear.insert("text".into(), serde_json::Value::Null);
        let cleared = applied(
            &next,
            Edit::UpdateComponent {
                zone: "hero".into(),
                component_id: id,
                content: Some(clear),
                style: None,
            },
        );
        assert!(cleared.zone("hero").unwrap().components[0].content.is_empty());
    }

    #[test]
    fn reorder_within_zone() {
        let canvas = with_components("hero", &["banner", "text", "button"]);
        let before = ids(&canvas, "hero");
        let next = applied(
            &canvas,
            Edit::MoveComponent {
                from_zone: "hero".into(),
                component_id: before[0].clone(),
                to_zone: "hero".into(),
                index: 2,
            },
        );
        let after = ids(&next, "hero");
        assert_eq!(after, vec![before[1].clone(), before[2].clone(), before[0].clone()]);
        assert!(orders_contiguous(&next.zone("hero").unwrap().components));
    }

    #[test]
    fn move_across_zones_renumbers_both() {
        let canvas = with_components("hero", &["text", "banner"]);
        let moving = ids(&canvas, "hero")[0].clone();
        let next = applied(
            &canvas,
            Edit::MoveComponent {
                from_zone: "hero".into(),
                component_id: moving.clone(),
                to_zone: "featured".into(),
                index: 0,
            },
        );
        let hero = next.zone("hero").unwrap();
        let featured = next.zone("featured").unwrap();
        assert_eq!(hero.components.len(), 1);
        assert_eq!(featured.components[0].id, moving);
        assert!(orders_contiguous(&hero.components));
        assert!(orders_contiguous(&featured.components));
    }

    #[test]
    fn move_into_disallowed_zone_refused() {
        let canvas = with_components("featured", &["product-grid"]);
        let id = ids(&canvas, "featured")[0].clone();
        let outcome = apply_edit(
            &canvas,
            &Edit::MoveComponent {
                from_zone: "featured".into(),
                component_id: id,
                to_zone: "header".into(),
                index: 0,
            },
            &registry(),
        )
        .unwrap();
        assert_matches!(outcome, EditOutcome::Refused { .. });
    }

    #[test]
    fn move_unknown_component_not_found() {
        let err = apply_edit(
            &home(),
            &Edit::MoveComponent {
                from_zone: "hero".into(),
                component_id: "ghost".into(),
                to_zone: "featured".into(),
                index: 0,
            },
            &registry(),
        );
        assert_matches!(err, Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn edit_deserializes_from_tagged_json() {
        let edit: Edit =
            serde_json::from_str(r#"{"op":"remove_column","row":1,"column":0}"#).unwrap();
        assert_eq!(edit, Edit::RemoveColumn { row: 1, column: 0 });
        assert_eq!(edit.name(), "remove_column");
    }
}
