//! Read-only catalog, widget and layout lookups proxied to the CMS backend.

use axum::extract::{Path, Query};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use vitrine_core::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Upstream;
use crate::response::DataResponse;

/// Query parameters for `GET /widgets`.
#[derive(Debug, Deserialize)]
pub struct WidgetQuery {
    pub page_type: String,
    pub layout_id: Option<String>,
}

/// Query parameters for `GET /layouts`.
#[derive(Debug, Deserialize)]
pub struct LayoutQuery {
    pub page_type: String,
}

/// GET /api/v1/stores
pub async fn list_stores(Upstream(api): Upstream) -> AppResult<impl IntoResponse> {
    let stores = api.list_stores().await?;
    Ok(Json(DataResponse { data: stores }))
}

/// GET /api/v1/catalogs/{id}/categories
pub async fn list_categories(
    Upstream(api): Upstream,
    Path(catalog_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let categories = api.list_categories(&catalog_id).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/v1/categories/{id}/products
pub async fn list_products(
    Upstream(api): Upstream,
    Path(category_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let products = api.list_products(&category_id).await?;
    Ok(Json(DataResponse { data: products }))
}

/// GET /api/v1/products/{id}/skus
pub async fn list_skus(
    Upstream(api): Upstream,
    Path(product_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let skus = api.list_skus(&product_id).await?;
    Ok(Json(DataResponse { data: skus }))
}

/// GET /api/v1/widgets?page_type=&layout_id=
pub async fn list_widgets(
    Upstream(api): Upstream,
    Query(query): Query<WidgetQuery>,
) -> AppResult<impl IntoResponse> {
    if query.page_type.trim().is_empty() {
        return Err(AppError::BadRequest("page_type must not be empty".into()));
    }
    let widgets = api
        .data_widgets(&query.page_type, query.layout_id.as_deref())
        .await?;
    Ok(Json(DataResponse { data: widgets }))
}

/// GET /api/v1/layouts?page_type=
pub async fn get_layout(
    Upstream(api): Upstream,
    Query(query): Query<LayoutQuery>,
) -> AppResult<impl IntoResponse> {
    let layout = api
        .layout_by_page_type(&query.page_type)
        .await?
        .ok_or_else(|| CoreError::not_found("Layout", query.page_type.as_str()))?;
    Ok(Json(DataResponse { data: layout }))
}
