//! Route definitions for catalog, widget and layout lookups.

use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Catalog routes merged at the API root.
///
/// ```text
/// GET /stores                     -> list_stores
/// GET /catalogs/{id}/categories   -> list_categories
/// GET /categories/{id}/products   -> list_products
/// GET /products/{id}/skus         -> list_skus
/// GET /widgets                    -> list_widgets
/// GET /layouts                    -> get_layout
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stores", get(catalog::list_stores))
        .route("/catalogs/{id}/categories", get(catalog::list_categories))
        .route("/categories/{id}/products", get(catalog::list_products))
        .route("/products/{id}/skus", get(catalog::list_skus))
        .route("/widgets", get(catalog::list_widgets))
        .route("/layouts", get(catalog::get_layout))
}
