//! The authenticated HTTP request pipeline.
//!
//! Every backend call flows through [`ApiClient::request`]: defaults are
//! applied (GET, session cookies, request language), the anti-forgery token
//! is attached for mutating methods, the body is read as text first, and
//! every failure is normalized into [`WeaverError`]. The pipeline never
//! retries; retry policy belongs to callers.

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use classweaver_core::error::{Result, WeaverError};
use classweaver_core::storage::SessionStorage;

use crate::config::ClientConfig;
use crate::csrf::{CSRF_HEADER_NAME, CsrfTokenManager};

/// Storage key of the persisted current-user snapshot.
pub const AUTH_STORAGE_KEY: &str = "classweaver:current-user";

/// Default request language sent unless the caller overrides it.
const DEFAULT_LOCALE: &str = "zh-CN";

/// Request body variants understood by the pipeline.
#[derive(Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Pre-serialized JSON payload.
    Json(String),
    /// Raw multipart form. The content-type header is left for the
    /// transport to set so the boundary parameter is correct.
    Multipart(Form),
}

/// Per-request options: method, body, and header overrides.
pub struct RequestOptions {
    method: Method,
    body: RequestBody,
    headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Attaches a JSON body serialized from `payload`.
    pub fn json(mut self, payload: &impl Serialize) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_string(payload)?);
        Ok(self)
    }

    /// Attaches a multipart form body.
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Sets a header, overriding the pipeline default for that name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Authenticated HTTP client for the ClassWeaver backend.
///
/// Owns the shared cookie jar (session cookie plus CSRF cookie) and the
/// session-scoped storage used for the persisted current-user snapshot.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    csrf: Arc<CsrfTokenManager>,
    storage: Arc<dyn SessionStorage>,
}

impl ApiClient {
    /// Creates a client against the configured backend origin.
    pub fn new(config: &ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let base_url = config.api_base.clone();
        let parsed: Url = base_url
            .parse()
            .map_err(|err| WeaverError::config(format!("invalid api base '{base_url}': {err}")))?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(|err| WeaverError::config(format!("failed to build HTTP client: {err}")))?;

        let csrf = Arc::new(CsrfTokenManager::new(http.clone(), jar, parsed));
        Ok(Self {
            base_url,
            http,
            csrf,
            storage,
        })
    }

    /// Returns the storage this client clears on session invalidation.
    pub fn storage(&self) -> Arc<dyn SessionStorage> {
        self.storage.clone()
    }

    /// Returns the CSRF token manager shared with the transport.
    pub(crate) fn csrf(&self) -> &CsrfTokenManager {
        &self.csrf
    }

    /// Issues one request and parses the JSON response.
    ///
    /// Returns `Ok(None)` for a 204 or empty body. A successful status with
    /// an unparsable body fails with [`WeaverError::InvalidBody`] carrying
    /// the raw text.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<T>> {
        match self.send(path, options).await? {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(err) => {
                    warn!(path, %err, "failed to parse JSON response");
                    Err(WeaverError::invalid_body(raw))
                }
            },
        }
    }

    /// Issues one request, discarding any response body.
    pub async fn request_unit(&self, path: &str, options: RequestOptions) -> Result<()> {
        self.send(path, options).await.map(|_| ())
    }

    /// Issues one request and requires a JSON body in the response.
    pub async fn request_required<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.request(path, options)
            .await?
            .ok_or_else(|| WeaverError::internal(format!("empty response body from {path}")))
    }

    /// Core pipeline: build, send, and normalize one request.
    ///
    /// Returns the raw body text, or `None` for a 204 or empty body.
    async fn send(&self, path: &str, options: RequestOptions) -> Result<Option<String>> {
        let url = format!("{}{}", self.base_url, path);
        let method = options.method.clone();
        let mut headers = options.headers;

        let is_multipart = matches!(options.body, RequestBody::Multipart(_));
        if !is_multipart && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if !headers.contains_key(ACCEPT_LANGUAGE) {
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(DEFAULT_LOCALE));
        }

        let is_mutating =
            method != Method::GET && method != Method::HEAD && method != Method::OPTIONS;
        if is_mutating {
            let token = self.csrf.ensure_token().await;
            let header_name = HeaderName::from_static(CSRF_HEADER_NAME);
            if !token.is_empty() && !headers.contains_key(&header_name) {
                match HeaderValue::from_str(&token) {
                    Ok(value) => {
                        headers.insert(header_name, value);
                    }
                    Err(_) => warn!("csrf token is not a valid header value, skipping"),
                }
            }
        }

        debug!(%method, %url, "issuing request");
        let mut builder = self.http.request(method, &url).headers(headers);
        builder = match options.body {
            RequestBody::Empty => builder,
            RequestBody::Json(payload) => builder.body(payload),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            let message = extract_error_message(&raw, status);
            warn!(%url, status = status.as_u16(), %message, "request failed");
            if status == StatusCode::UNAUTHORIZED {
                // Stale session: drop the persisted snapshot so navigation
                // guards re-check instead of trusting it.
                self.storage.remove_item(AUTH_STORAGE_KEY);
            }
            return Err(WeaverError::http(status.as_u16(), message));
        }

        if status == StatusCode::NO_CONTENT || raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(raw))
    }
}

/// Extracts a human-readable message from an error response.
///
/// Prefers a non-empty `detail` or `error` field of a JSON body, then the
/// raw text, then the status reason. An empty extracted field is treated
/// the same as an absent one.
fn extract_error_message(raw: &str, status: StatusCode) -> String {
    if !raw.is_empty() {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(raw) {
            for field in ["detail", "error"] {
                if let Some(message) = parsed
                    .get(field)
                    .and_then(|value| value.as_str())
                    .filter(|message| !message.is_empty())
                {
                    return message.to_string();
                }
            }
        }
        return raw.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}
