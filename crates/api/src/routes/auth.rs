//! Route definitions for login and passkey exchange.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Auth routes mounted at `/auth`.
///
/// ```text
/// POST /login                     -> login
/// POST /passkey/register/options  -> passkey_register_options
/// POST /passkey/register          -> passkey_register
/// POST /passkey/login/options     -> passkey_login_options
/// POST /passkey/login             -> passkey_login
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route(
            "/passkey/register/options",
            post(auth::passkey_register_options),
        )
        .route("/passkey/register", post(auth::passkey_register))
        .route("/passkey/login/options", post(auth::passkey_login_options))
        .route("/passkey/login", post(auth::passkey_login))
}
