//! HTTP request wrapper for the posts API.
//!
//! `ApiClient` wraps a `reqwest::Client`, a base URL and an optional
//! [`Session`]. Every request goes through [`ApiClient::request`], which:
//!
//! - normalizes the call shape (`url`, `(method, url)`,
//!   `(method, url, body)` or a full [`RequestOptions`]);
//! - resolves relative urls against the base URL;
//! - merges the default `authorization: Bearer <token>` header under the
//!   caller's headers, field by field, so a caller-supplied header always
//!   wins and is sent exactly once;
//! - returns status, headers and body unchanged in an [`ApiResponse`].
//!
//! There is no retry. A failed request fails the caller immediately.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{ContractError, Result};
use crate::session::Session;

/// Base URL used when none is configured. Matches the default port of
/// json-server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Covers TCP handshake only.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout when the caller does not pick one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A single request, fully described.
///
/// Built either directly or from one of the positional shapes via `From`:
///
/// ```ignore
/// client.request("/posts").await?;                                  // GET
/// client.request((Method::DELETE, "/posts/1")).await?;
/// client.request((Method::POST, "/posts", json!({"id": 9}))).await?;
/// client
///     .request(
///         RequestOptions::new(Method::GET, "/posts/100").fail_on_status_code(false),
///     )
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Absolute `http(s)://` url, or a path relative to the base URL.
    pub url: String,
    /// JSON body, sent with `content-type: application/json`.
    pub body: Option<Value>,
    /// Caller headers. These override the defaults per header name.
    pub headers: HeaderMap,
    /// When `true` (the default), a status outside 2xx/3xx is turned into
    /// `ContractError::Api`. Clear it to inspect error responses.
    pub fail_on_status_code: bool,
}

impl RequestOptions {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        RequestOptions {
            method,
            url: url.into(),
            body: None,
            headers: HeaderMap::new(),
            fail_on_status_code: true,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a caller header, replacing any value set earlier for `name`.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn fail_on_status_code(mut self, fail: bool) -> Self {
        self.fail_on_status_code = fail;
        self
    }
}

impl From<&str> for RequestOptions {
    fn from(url: &str) -> Self {
        RequestOptions::new(Method::GET, url)
    }
}

impl From<String> for RequestOptions {
    fn from(url: String) -> Self {
        RequestOptions::new(Method::GET, url)
    }
}

impl From<(Method, &str)> for RequestOptions {
    fn from((method, url): (Method, &str)) -> Self {
        RequestOptions::new(method, url)
    }
}

impl From<(Method, String)> for RequestOptions {
    fn from((method, url): (Method, String)) -> Self {
        RequestOptions::new(method, url)
    }
}

impl From<(Method, &str, Value)> for RequestOptions {
    fn from((method, url, body): (Method, &str, Value)) -> Self {
        RequestOptions::new(method, url).body(body)
    }
}

impl From<(Method, String, Value)> for RequestOptions {
    fn from((method, url, body): (Method, String, Value)) -> Self {
        RequestOptions::new(method, url).body(body)
    }
}

/// A response as received: status, headers and decoded body.
///
/// The body is decoded as JSON when it parses. Anything else (an HTML or
/// plain-text error page) is kept verbatim as `Value::String`, and an
/// empty body becomes `Value::String("")`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
    raw: String,
}

impl ApiResponse {
    pub(crate) fn from_parts(status: StatusCode, headers: HeaderMap, raw: String) -> Self {
        let body = decode_body(&raw);
        ApiResponse {
            status,
            headers,
            body,
            raw,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `content-type` header, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The body text exactly as received.
    pub fn text(&self) -> &str {
        &self.raw
    }

    /// Deserializes the decoded body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.body)?)
    }

    /// `true` for `""`, `null`, `{}` and `[]`.
    pub fn is_body_empty(&self) -> bool {
        match &self.body {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// Any stored record, read only for its `id`. Other fields may be missing
/// or of any type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub(crate) struct RecordId {
    pub id: u64,
}

fn decode_body(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Builds the underlying `reqwest::Client` with explicit timeouts.
fn build_http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()?)
}

/// Applies `overrides` on top of `defaults`, one header name at a time.
///
/// A name present in `overrides` drops every default value for that name
/// before the override values are appended, so the result never carries
/// two conflicting values for one header.
fn merge_headers(mut defaults: HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    for name in overrides.keys() {
        defaults.remove(name);
        for value in overrides.get_all(name) {
            defaults.append(name.clone(), value.clone());
        }
    }
    defaults
}

/// HTTP client for the posts API with default bearer authorization.
///
/// Cloning is cheap: the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Option<Session>,
}

impl ApiClient {
    /// Creates an unauthenticated client with the default request timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(ApiClient {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    /// Returns a client that sends `Bearer <token>` on every request.
    pub fn with_session(self, session: Session) -> Self {
        ApiClient {
            session: Some(session),
            ..self
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(session) = &self.session {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&session.bearer_value())?);
        }
        Ok(headers)
    }

    /// Sends one request and returns the response unchanged.
    ///
    /// # Errors
    ///
    /// - `ContractError::Api` when `fail_on_status_code` is set and the
    ///   status is outside 2xx/3xx.
    /// - `ContractError::InvalidHeader` when the session token cannot be
    ///   encoded as a header value.
    /// - `ContractError::Network` for transport failures.
    pub async fn request(&self, options: impl Into<RequestOptions>) -> Result<ApiResponse> {
        let options = options.into();
        let url = self.resolve_url(&options.url);
        let headers = merge_headers(self.default_headers()?, &options.headers);

        debug!(method = %options.method, %url, "sending request");
        let mut req = self
            .client
            .request(options.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &options.body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let raw = resp.text().await?;
        debug!(method = %options.method, %url, %status, "received response");

        let accepted = status.is_success() || status.is_redirection();
        if options.fail_on_status_code && !accepted {
            return Err(ContractError::Api { status, body: raw });
        }

        Ok(ApiResponse::from_parts(status, resp_headers, raw))
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut options = RequestOptions::new(method, path);
        if let Some(payload) = body {
            options = options.body(serde_json::to_value(payload)?);
        }
        self.request(options).await?.json()
    }

    /// Sends a GET and deserializes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::PATCH, path, Some(body)).await
    }

    /// Sends a DELETE, discarding whatever body comes back.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request((Method::DELETE, path)).await?;
        Ok(())
    }
}
