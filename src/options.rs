use std::fmt;
use std::time::Duration;

use reqwest::Method;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::headers::NullableHeaders;

pub(crate) const DEFAULT_MAX_RETRIES: u32 = 2;
pub(crate) const DEFAULT_MAX_POLLING_ATTEMPTS: u32 = 5;
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client-wide configuration, immutable once the client is constructed.
#[derive(Clone)]
pub struct ClientOptions {
    /// AIDR API token.
    pub token: String,
    /// Base URL template; every `{SERVICE_NAME}` occurrence is replaced
    /// with the service slug.
    pub base_url_template: String,
    /// Maximum retries after the initial attempt for temporary failures.
    pub max_retries: u32,
    /// Maximum polling attempts after an HTTP 202 `Accepted` response.
    pub max_polling_attempts: u32,
    /// Per-attempt timeout; retried attempts get a fresh budget.
    pub timeout: Duration,
    /// Headers added to every request; removable per call by unsetting.
    pub default_headers: NullableHeaders,
}

impl ClientOptions {
    pub fn new(token: impl Into<String>, base_url_template: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url_template: base_url_template.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            max_polling_attempts: DEFAULT_MAX_POLLING_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
            default_headers: NullableHeaders::new(),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_polling_attempts(mut self, max_polling_attempts: u32) -> Self {
        self.max_polling_attempts = max_polling_attempts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_headers(mut self, default_headers: NullableHeaders) -> Self {
        self.default_headers = default_headers;
        self
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("token", &"<redacted>")
            .field("base_url_template", &self.base_url_template)
            .field("max_retries", &self.max_retries)
            .field("max_polling_attempts", &self.max_polling_attempts)
            .field("timeout", &self.timeout)
            .field("default_headers", &self.default_headers)
            .finish()
    }
}

/// Per-call overrides merged with [`ClientOptions`] at request time.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Query parameters appended to the request URL.
    pub query: Option<Map<String, Value>>,
    /// JSON request body.
    pub body: Option<Value>,
    /// Highest-precedence header source for this call.
    pub headers: Option<NullableHeaders>,
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
    pub max_polling_attempts: Option<u32>,
    pub base_url_template: Option<String>,
    /// Cancels the request, remaining retries, and polling when triggered.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_headers(mut self, headers: NullableHeaders) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_max_polling_attempts(mut self, max_polling_attempts: u32) -> Self {
        self.max_polling_attempts = Some(max_polling_attempts);
        self
    }

    pub fn with_base_url_template(mut self, base_url_template: impl Into<String>) -> Self {
        self.base_url_template = Some(base_url_template.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Fully resolved request: verb, path, and the caller's overrides. Each
/// retry rebuilds the wire request from the same value.
#[derive(Clone, Debug)]
pub(crate) struct FinalRequestOptions {
    pub method: Method,
    pub path: String,
    pub request: RequestOptions,
}
