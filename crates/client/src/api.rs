//! REST API client for the CMS backend.
//!
//! Wraps the catalog, layout, widget, page and auth endpoints using
//! [`reqwest`]. Every request carries the caller's bearer token when one
//! was attached with [`CmsApi::authorized`].

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use vitrine_core::canvas::Canvas;
use vitrine_core::catalog::{Category, DataWidget, Product, Sku, Store};
use vitrine_core::composer::ComposeTarget;
use vitrine_core::layout_template::LayoutDocument;

use crate::auth::{LoginRequest, LoginResponse, PasskeyStep};

/// Header carrying the editor revision on canvas writes.
pub const REVISION_HEADER: &str = "X-Canvas-Revision";

/// HTTP client for one CMS backend.
#[derive(Clone)]
pub struct CmsApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

/// Errors from the CMS REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("CMS API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx body did not have the expected shape.
    #[error("Unexpected CMS response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot carry a path.
    #[error("Invalid CMS URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Upstream status code, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::InvalidUrl(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

impl CmsApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// A copy of this client that sends `token` as a bearer credential.
    ///
    /// The underlying connection pool is shared.
    pub fn authorized(&self, token: Option<String>) -> Self {
        Self {
            client: self.client.clone(),
            api_url: self.api_url.clone(),
            token,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- catalog ----

    /// `GET /stores`
    pub async fn list_stores(&self) -> Result<Vec<Store>, ApiError> {
        self.get_json(&["stores"], &[]).await
    }

    /// `GET /catalogs/{id}/categories`
    pub async fn list_categories(&self, catalog_id: &str) -> Result<Vec<Category>, ApiError> {
        self.get_json(&["catalogs", catalog_id, "categories"], &[])
            .await
    }

    /// `GET /categories/{id}/products`
    pub async fn list_products(&self, category_id: &str) -> Result<Vec<Product>, ApiError> {
        self.get_json(&["categories", category_id, "products"], &[])
            .await
    }

    /// `GET /products/{id}/skus`
    pub async fn list_skus(&self, product_id: &str) -> Result<Vec<Sku>, ApiError> {
        self.get_json(&["products", product_id, "skus"], &[])
            .await
    }

    // ---- layouts & widgets ----

    /// Fetch the template stored for a page type. `None` when there is none.
    pub async fn layout_by_page_type(
        &self,
        page_type: &str,
    ) -> Result<Option<LayoutDocument>, ApiError> {
        match self
            .get_json(&["layout-by-page-type"], &[("pageType", page_type)])
            .await
        {
            Ok(document) => Ok(Some(document)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `POST /layouts`
    pub async fn create_layout(&self, document: &LayoutDocument) -> Result<LayoutDocument, ApiError> {
        let response = self
            .request(reqwest::Method::POST, &["layouts"])?
            .json(document)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `PUT /layouts/{id}`
    pub async fn update_layout(
        &self,
        layout_id: &str,
        document: &LayoutDocument,
    ) -> Result<LayoutDocument, ApiError> {
        let response = self
            .request(reqwest::Method::PUT, &["layouts", layout_id])?
            .json(document)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `GET /data_widgets?page_type=&layout_id=`
    pub async fn data_widgets(
        &self,
        page_type: &str,
        layout_id: Option<&str>,
    ) -> Result<Vec<DataWidget>, ApiError> {
        let mut query = vec![("page_type", page_type)];
        if let Some(layout_id) = layout_id {
            query.push(("layout_id", layout_id));
        }
        self.get_json(&["data_widgets"], &query).await
    }

    // ---- pages ----

    /// `GET /cms/pages/{id}`
    pub async fn get_canvas(&self, canvas_id: &str) -> Result<Canvas, ApiError> {
        self.get_json(&["cms", "pages", canvas_id], &[]).await
    }

    /// `PUT /cms/pages/{id}` with the whole canvas.
    ///
    /// `revision` is the editor's local change counter, sent as
    /// [`REVISION_HEADER`] so the backend can order concurrent writes.
    pub async fn put_canvas(&self, canvas: &Canvas, revision: u64) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::PUT, &["cms", "pages", &canvas.id])?
            .header(REVISION_HEADER, revision.to_string())
            .json(canvas)
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- composition ----

    /// Open the compose progress stream.
    ///
    /// Returns the raw response once the backend accepted the request; the
    /// body is an event stream read by [`crate::compose`].
    pub async fn open_compose_stream(
        &self,
        target: &ComposeTarget,
    ) -> Result<reqwest::Response, ApiError> {
        let canvas_param = target.canvas_param();
        let response = self
            .request(reqwest::Method::POST, &["compose", "store"])?
            .query(&[
                ("store_id", target.store_id.as_str()),
                ("canvas_id", canvas_param.as_str()),
            ])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        Self::ensure_success(response).await
    }

    // ---- auth ----

    /// `POST /auth/login`
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post_json(&["auth", "login"], credentials).await
    }

    /// Forward one step of the passkey ceremony and return the backend's
    /// JSON answer unchanged.
    pub async fn passkey(
        &self,
        step: PasskeyStep,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        let segments: Vec<&str> = step.path().trim_start_matches('/').split('/').collect();
        self.post_json(&segments, payload).await
    }

    // ---- private helpers ----

    /// Join path segments onto the base URL. Each segment is
    /// percent-encoded, so ids cannot escape their position in the path.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let builder = self.client.request(method, self.endpoint(segments)?);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self
            .request(reqwest::Method::GET, segments)?
            .query(query)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .request(reqwest::Method::POST, segments)?
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    ///
    /// The body is read as bytes first so shape mismatches surface as
    /// [`ApiError::Decode`] rather than a transport error.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
