//! Catalog entities returned by the CMS backend.
//!
//! Stores, categories, products and SKUs all share the `{id, name, ...}`
//! shape; backend-specific fields are carried through untouched.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::EntityId;

/// A browsable catalog entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub type Store = CatalogItem;
pub type Category = CatalogItem;
pub type Product = CatalogItem;
pub type Sku = CatalogItem;

/// A widget the backend offers for a page type / layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataWidget {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub widget_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Accept ids sent either as JSON strings or integers.
pub fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EntityId, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Same as [`deserialize_id`] for optional ids.
pub fn deserialize_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EntityId>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_id")] EntityId);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(id)| id))
}
