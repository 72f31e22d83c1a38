//! Login and passkey payloads.
//!
//! Passkey challenges and credentials travel as base64url strings without
//! padding. Payloads are checked for well-formed encoding before they are
//! forwarded, so a mangled blob fails here instead of deep in the backend.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors from validating auth payloads.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing field '{0}'")]
    MissingField(String),

    #[error("Field '{field}' is not valid base64url: {source}")]
    InvalidEncoding {
        field: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Username and password are required")]
    MissingCredentials,
}

/// Username/password login.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(())
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Backend answer to a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One leg of the passkey register/login ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasskeyStep {
    RegisterOptions,
    Register,
    LoginOptions,
    Login,
}

impl PasskeyStep {
    /// Backend path for this step.
    pub fn path(self) -> &'static str {
        match self {
            Self::RegisterOptions => "/auth/passkey/register/options",
            Self::Register => "/auth/passkey/register",
            Self::LoginOptions => "/auth/passkey/login/options",
            Self::Login => "/auth/passkey/login",
        }
    }

    /// Credential fields that must be base64url in the request body.
    ///
    /// Options requests carry no binary data.
    fn credential_fields(self) -> &'static [&'static str] {
        match self {
            Self::RegisterOptions | Self::LoginOptions => &[],
            Self::Register => &[
                "rawId",
                "response.clientDataJSON",
                "response.attestationObject",
            ],
            Self::Login => &[
                "rawId",
                "response.clientDataJSON",
                "response.authenticatorData",
                "response.signature",
            ],
        }
    }
}

pub fn encode_b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url, tolerating trailing `=` padding some browsers add.
pub fn decode_b64url(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(value.trim_end_matches('='))
}

/// Check the credential blobs of a passkey request body.
pub fn validate_passkey_request(step: PasskeyStep, payload: &Value) -> Result<(), AuthError> {
    for field in step.credential_fields() {
        check_b64url(payload, field)?;
    }
    Ok(())
}

/// Check the challenge of an options response before handing it to the
/// browser.
pub fn validate_passkey_options(options: &Value) -> Result<(), AuthError> {
    let path = if lookup(options, "publicKey.challenge").is_some() {
        "publicKey.challenge"
    } else {
        "challenge"
    };
    check_b64url(options, path)
}

fn check_b64url(payload: &Value, path: &str) -> Result<(), AuthError> {
    let value = lookup(payload, path)
        .and_then(Value::as_str)
        .ok_or_else(|| AuthError::MissingField(path.to_string()))?;
    decode_b64url(value).map_err(|source| AuthError::InvalidEncoding {
        field: path.to_string(),
        source,
    })?;
    Ok(())
}

/// Resolve a dotted path into a JSON value.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}
