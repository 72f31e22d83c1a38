//! Handlers for username/password login and the passkey ceremony.
//!
//! Credentials are checked for shape here and then forwarded to the CMS
//! backend, which owns the accounts.

use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use vitrine_client::auth::{
    validate_passkey_options, validate_passkey_request, LoginRequest, PasskeyStep,
};
use vitrine_client::api::CmsApi;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Upstream;
use crate::response::DataResponse;

/// POST /api/v1/auth/login
pub async fn login(
    Upstream(api): Upstream,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let session = api.login(&input).await?;

    tracing::info!(username = %input.username, "User logged in");

    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/auth/passkey/register/options
pub async fn passkey_register_options(
    Upstream(api): Upstream,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    forward_options(&api, PasskeyStep::RegisterOptions, &body).await
}

/// POST /api/v1/auth/passkey/register
pub async fn passkey_register(
    Upstream(api): Upstream,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    forward_credential(&api, PasskeyStep::Register, &body).await
}

/// POST /api/v1/auth/passkey/login/options
pub async fn passkey_login_options(
    Upstream(api): Upstream,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    forward_options(&api, PasskeyStep::LoginOptions, &body).await
}

/// POST /api/v1/auth/passkey/login
pub async fn passkey_login(
    Upstream(api): Upstream,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    forward_credential(&api, PasskeyStep::Login, &body).await
}

// ---- helpers ----

async fn forward_options(
    api: &CmsApi,
    step: PasskeyStep,
    body: &Value,
) -> AppResult<Json<DataResponse<Value>>> {
    let options = api.passkey(step, body).await?;
    validate_passkey_options(&options).map_err(|e| {
        AppError::InternalError(format!("CMS backend sent unusable passkey options: {e}"))
    })?;
    Ok(Json(DataResponse { data: options }))
}

async fn forward_credential(
    api: &CmsApi,
    step: PasskeyStep,
    body: &Value,
) -> AppResult<Json<DataResponse<Value>>> {
    validate_passkey_request(step, body)?;
    let result = api.passkey(step, body).await?;
    tracing::info!(step = step.path(), "Passkey credential accepted");
    Ok(Json(DataResponse { data: result }))
}
