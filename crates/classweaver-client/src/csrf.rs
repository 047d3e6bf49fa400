//! CSRF token acquisition.
//!
//! The backend uses double-submit CSRF protection: the token lives in a
//! cookie and must be echoed in a custom header on mutating requests. The
//! cookie is the single source of truth; a previously returned token is
//! never reused because the cookie may have rotated.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::cookie::get_cookie;

/// Name of the cookie carrying the anti-forgery token.
pub const CSRF_COOKIE_NAME: &str = "csrftoken";

/// Header echoing the token on mutating requests.
pub const CSRF_HEADER_NAME: &str = "x-csrftoken";

const CSRF_PATH: &str = "/api/auth/csrf/";

#[derive(Debug, Deserialize)]
struct CsrfIssueResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: Option<String>,
}

/// Obtains the anti-forgery token, fetching it from the backend only when
/// the cookie is absent.
pub struct CsrfTokenManager {
    http: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl CsrfTokenManager {
    /// Creates a manager sharing the transport client and its cookie jar.
    pub fn new(http: Client, jar: Arc<Jar>, base_url: Url) -> Self {
        Self {
            http,
            jar,
            base_url,
        }
    }

    /// Reads the token cookie from the shared jar, if present and non-empty.
    fn cookie_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        get_cookie(header, CSRF_COOKIE_NAME).filter(|token| !token.is_empty())
    }

    /// Returns the anti-forgery token for the active session.
    ///
    /// An empty string is a soft failure: callers proceed without the
    /// header, since not every endpoint enforces the check.
    pub async fn ensure_token(&self) -> String {
        // Always read the latest cookie to avoid stale tokens
        if let Some(token) = self.cookie_token() {
            return token;
        }

        let url = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), CSRF_PATH);
        debug!(%url, "csrf cookie absent, fetching token");
        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<CsrfIssueResponse>().await {
                    Ok(body) => body
                        .csrf_token
                        .filter(|token| !token.is_empty())
                        // The call sets the cookie as a side effect
                        .or_else(|| self.cookie_token())
                        .unwrap_or_default(),
                    Err(_) => self.cookie_token().unwrap_or_default(),
                }
            }
            _ => self.cookie_token().unwrap_or_default(),
        }
    }
}
