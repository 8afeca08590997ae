//! Sending shaped requests over HTTP.
//!
//! [`Transport`] is the seam between the data store and the network: it takes
//! a [`RestRequest`] and hands back the raw status and body. [`HttpTransport`]
//! is the `reqwest` implementation; tests use
//! [`StubTransport`](crate::test_support::StubTransport).
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use tabula_core::RequestShaper;
//! use tabula_http::{HttpTransport, Transport, TransportConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TransportConfig::new("https://api.example.com/APP_ID/REST_KEY")
//!     .with_timeout(Duration::from_secs(10));
//! let transport = HttpTransport::with_config(config)?;
//! let raw = transport.execute(&RequestShaper::new("Person").describe()).await?;
//! assert!(raw.is_success());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use tabula_core::{HttpMethod, RestRequest};
use thiserror::Error;
use url::Url;

/// Default user agent for service requests.
pub const DEFAULT_USER_AGENT: &str = "tabula/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Status and body of a completed exchange, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Response with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure to complete an exchange at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Target URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// Connection, TLS or body transfer failure.
    #[error("request to {url} failed: {message}")]
    Network {
        /// Target URL.
        url: String,
        /// Underlying error text.
        message: String,
    },
    /// The request path could not be resolved against the base URL.
    #[error("cannot resolve {path:?} against the base URL: {message}")]
    InvalidPath {
        /// Relative request path.
        path: String,
        /// Parser error text.
        message: String,
    },
}

/// Failure to build an [`HttpTransport`].
#[derive(Debug, Error)]
pub enum TransportBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// The base URL is not an absolute URL.
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// Offending value.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// A configured header name or value is not valid HTTP.
    #[error("invalid header {name:?}")]
    InvalidHeader {
        /// Header name as configured.
        name: String,
    },
}

/// Executes shaped requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// [`TransportError`] when no response was received.
    async fn execute(&self, request: &RestRequest) -> Result<RawResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: &RestRequest) -> Result<RawResponse, TransportError> {
        (**self).execute(request).await
    }
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Service base URL, typically `{host}/{application id}/{REST key}`.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: Vec::new(),
        }
    }
}

impl TransportConfig {
    /// Configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// [`Transport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
    base: Url,
}

impl HttpTransport {
    /// Transport with default configuration.
    ///
    /// # Errors
    ///
    /// As [`HttpTransport::with_config`].
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportBuildError> {
        Self::with_config(TransportConfig::new(base_url))
    }

    /// Transport with explicit configuration.
    ///
    /// # Errors
    ///
    /// [`TransportBuildError`] when the base URL or a header is invalid, or
    /// the client fails to build.
    pub fn with_config(config: TransportConfig) -> Result<Self, TransportBuildError> {
        let base = parse_base(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(header_map(&config.headers)?)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(TransportBuildError::HttpClient)?;
        Ok(Self {
            client,
            config,
            base,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Absolute URL for a request path.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidPath`] when the path does not resolve.
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| TransportError::InvalidPath {
                path: path.to_owned(),
                message: err.to_string(),
            })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        TransportError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &RestRequest) -> Result<RawResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        debug!("{} {url}", request.method);
        let mut builder = self.client.request(method(request.method), url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        debug!("{} {url} -> {status}", request.method);
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

const fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Parse the base URL so that relative paths append to it.
fn parse_base(base_url: &str) -> Result<Url, TransportBuildError> {
    let mut normalised = base_url.trim_end_matches('/').to_owned();
    normalised.push('/');
    Url::parse(&normalised).map_err(|source| TransportBuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        source,
    })
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportBuildError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || TransportBuildError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn config_builder_sets_fields() {
        let config = TransportConfig::new("https://api.example.com/app/key")
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("tabula-test/1")
            .with_header("X-Tenant", "blue");
        assert_eq!(config.base_url, "https://api.example.com/app/key");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "tabula-test/1");
        assert_eq!(config.headers, [("X-Tenant".to_owned(), "blue".to_owned())]);
    }

    #[rstest]
    fn default_config_uses_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.headers.is_empty());
    }

    #[rstest]
    #[case("https://api.example.com/app/key")]
    #[case("https://api.example.com/app/key/")]
    fn paths_append_to_the_base(#[case] base: &str) {
        let transport = HttpTransport::new(base).expect("transport should build");
        let url = transport
            .url_for("data/Person?where=age%3E5")
            .expect("path should resolve");
        assert_eq!(
            url.as_str(),
            "https://api.example.com/app/key/data/Person?where=age%3E5"
        );
    }

    #[rstest]
    fn relative_base_url_is_rejected() {
        let err = HttpTransport::new("not a url").expect_err("base should be rejected");
        assert!(matches!(err, TransportBuildError::InvalidBaseUrl { .. }));
    }

    #[rstest]
    fn invalid_header_is_rejected() {
        let config = TransportConfig::new("https://api.example.com").with_header("bad name", "x");
        let err = HttpTransport::with_config(config).expect_err("header should be rejected");
        assert!(matches!(err, TransportBuildError::InvalidHeader { name } if name == "bad name"));
    }

    #[rstest]
    #[case(200, true)]
    #[case(204, true)]
    #[case(299, true)]
    #[case(199, false)]
    #[case(300, false)]
    #[case(404, false)]
    fn success_range(#[case] status: u16, #[case] expected: bool) {
        assert_eq!(RawResponse::new(status, Vec::new()).is_success(), expected);
    }

    #[rstest]
    #[case(HttpMethod::Get, Method::GET)]
    #[case(HttpMethod::Post, Method::POST)]
    #[case(HttpMethod::Put, Method::PUT)]
    #[case(HttpMethod::Delete, Method::DELETE)]
    fn methods_map_to_reqwest(#[case] verb: HttpMethod, #[case] expected: Method) {
        assert_eq!(method(verb), expected);
    }
}
