//! Bearer token pass-through extractor for Axum handlers.
//!
//! The console does not verify tokens itself; it forwards the caller's
//! `Authorization` header to the CMS backend, which does.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use vitrine_client::api::CmsApi;
use vitrine_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// CMS client carrying the caller's bearer token, if any.
///
/// ```ignore
/// async fn my_handler(Upstream(api): Upstream) -> AppResult<Json<()>> {
///     let stores = api.list_stores().await?;
///     Ok(Json(()))
/// }
/// ```
pub struct Upstream(pub CmsApi);

impl FromRequestParts<AppState> for Upstream {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get("authorization") {
            None => None,
            Some(value) => {
                let value = value.to_str().map_err(|_| {
                    AppError::Core(CoreError::Unauthorized(
                        "Authorization header is not valid text".into(),
                    ))
                })?;
                let token = value.strip_prefix("Bearer ").ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized(
                        "Invalid Authorization format. Expected: Bearer <token>".into(),
                    ))
                })?;
                Some(token.trim().to_string())
            }
        };

        Ok(Upstream(state.cms.authorized(token)))
    }
}
