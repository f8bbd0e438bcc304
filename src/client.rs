use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode,
};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    backoff::{retry_delay, JitterSource},
    headers::{self, NullableHeaders},
    options::{ClientOptions, FinalRequestOptions, RequestOptions},
    parse::{parse_response, ParsedBody},
    url::build_url,
    AidrError, Result,
};

const USER_AGENT: &str = "aidr-rust";

/// Async client for one AIDR service.
///
/// Drives the full request lifecycle: header and URL construction, one
/// sequential HTTP attempt at a time with a per-attempt timeout, retries
/// with exponential backoff and jitter for temporary failures, and polling
/// of `/v1/request/{id}` when the API answers HTTP 202 `Accepted`.
///
/// The client holds no per-call state; clones share the underlying
/// connection pool and may issue concurrent logical requests.
#[derive(Clone, Debug)]
pub struct AidrClient {
    http: reqwest::Client,
    service_name: String,
    options: ClientOptions,
    jitter: JitterSource,
}

impl AidrClient {
    /// Creates a client for the given service slug.
    ///
    /// Fails with [`AidrError::Config`] when the token or the base URL
    /// template is empty.
    pub fn new(service_name: impl Into<String>, options: ClientOptions) -> Result<Self> {
        if options.token.trim().is_empty() {
            return Err(AidrError::Config(
                "client was instantiated without an API token".to_owned(),
            ));
        }
        if options.base_url_template.trim().is_empty() {
            return Err(AidrError::Config(
                "client was instantiated without a base URL template".to_owned(),
            ));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            service_name: service_name.into(),
            options,
            jitter: JitterSource::Uniform,
        })
    }

    /// Replaces the underlying transport with a preconfigured
    /// `reqwest::Client` (proxies, TLS settings, connection limits).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Replaces the backoff jitter source. [`JitterSource::Fixed`] makes
    /// retry and polling delays deterministic.
    pub fn with_jitter(mut self, jitter: JitterSource) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Issues a GET request.
    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<ParsedBody> {
        self.request(FinalRequestOptions {
            method: Method::GET,
            path: path.to_owned(),
            request: options,
        })
        .await
    }

    /// Issues a POST request.
    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<ParsedBody> {
        self.request(FinalRequestOptions {
            method: Method::POST,
            path: path.to_owned(),
            request: options,
        })
        .await
    }

    /// Retrieves an async request's result once, without polling. Returns
    /// the `Accepted` envelope unchanged while the job is still in progress.
    pub async fn get_async_request(&self, request_id: &str) -> Result<ParsedBody> {
        self.get(
            &format!("/v1/request/{request_id}"),
            RequestOptions::new().with_max_polling_attempts(0),
        )
        .await
    }

    async fn request(&self, options: FinalRequestOptions) -> Result<ParsedBody> {
        let response = self.send_with_retry(&options).await?;
        let parsed = parse_response(response).await?;

        if let Some(request_id) = parsed.accepted_request_id() {
            let max_attempts = options
                .request
                .max_polling_attempts
                .unwrap_or(self.options.max_polling_attempts);
            if max_attempts == 0 {
                return Ok(parsed);
            }
            return self
                .poll_async_request(&request_id, max_attempts, options.request.cancel.as_ref())
                .await;
        }

        Ok(parsed)
    }

    /// One logical call: sequential attempts with backoff until a response
    /// is worth handing to the parser.
    async fn send_with_retry(&self, options: &FinalRequestOptions) -> Result<reqwest::Response> {
        let max_retries = options
            .request
            .max_retries
            .unwrap_or(self.options.max_retries);
        let cancel = options.request.cancel.as_ref();
        let mut retries_remaining = max_retries;

        loop {
            let request = self.build_request(options)?;

            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(AidrError::UserAbort);
            }

            debug!(
                method = %options.method,
                path = %options.path,
                retry_count = max_retries - retries_remaining,
                "dispatching request"
            );

            match self.dispatch(request, cancel).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() || !should_retry_status(status) {
                        // Non-retryable statuses are the parser's concern.
                        return Ok(response);
                    }
                    if retries_remaining > 0 {
                        warn!(%status, retries_remaining, "retrying after retryable HTTP status");
                        let delay =
                            retry_delay(retries_remaining, max_retries, self.jitter.sample());
                        retries_remaining -= 1;
                        self.sleep_with_cancel(delay, cancel).await?;
                        continue;
                    }
                    let body = response.text().await.unwrap_or_default();
                    return Err(AidrError::Api {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(AidrError::Connection(err)) => {
                    // The timeout fires as a transport error; a caller abort
                    // mid-flight must not be mistaken for one.
                    if cancel.is_some_and(CancellationToken::is_cancelled) {
                        return Err(AidrError::UserAbort);
                    }
                    if should_retry_transport(&err) && retries_remaining > 0 {
                        warn!(error = %err, retries_remaining, "retrying after transport error");
                        let delay =
                            retry_delay(retries_remaining, max_retries, self.jitter.sample());
                        retries_remaining -= 1;
                        self.sleep_with_cancel(delay, cancel).await?;
                        continue;
                    }
                    return Err(AidrError::Connection(err));
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// One HTTP attempt, bound to the caller's cancellation token.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        cancel: Option<&CancellationToken>,
    ) -> Result<reqwest::Response> {
        let send = request.send();
        let result = match cancel {
            Some(cancel) => tokio::select! {
                _ = cancel.cancelled() => return Err(AidrError::UserAbort),
                result = send => result,
            },
            None => send.await,
        };
        result.map_err(AidrError::Connection)
    }

    /// Re-fetches `/v1/request/{request_id}` until it resolves or attempts
    /// are exhausted.
    ///
    /// Exhaustion is not an error: the last-seen envelope is returned and
    /// callers must inspect its `status`.
    ///
    /// Poll fetches drive the executor directly rather than re-entering
    /// [`AidrClient::get`]: each fetch retries on its own, but never
    /// triggers nested polling.
    async fn poll_async_request(
        &self,
        request_id: &str,
        max_attempts: u32,
        cancel: Option<&CancellationToken>,
    ) -> Result<ParsedBody> {
        let mut poll_request = RequestOptions::new();
        if let Some(cancel) = cancel {
            poll_request = poll_request.with_cancel(cancel.clone());
        }
        let poll_options = FinalRequestOptions {
            method: Method::GET,
            path: format!("/v1/request/{request_id}"),
            request: poll_request,
        };

        let mut last_response = None;

        for attempt in 0..max_attempts {
            debug!(request_id, attempt, "polling async request");

            let response = self.send_with_retry(&poll_options).await?;
            let response = parse_response(response).await?;

            if response.envelope().is_some_and(|envelope| envelope.is_success()) {
                return Ok(response);
            }
            last_response = Some(response);

            if attempt + 1 < max_attempts {
                let delay = retry_delay(
                    max_attempts - attempt - 1,
                    max_attempts,
                    self.jitter.sample(),
                );
                self.sleep_with_cancel(delay, cancel).await?;
            }
        }

        last_response.ok_or_else(|| {
            AidrError::Internal("polling produced no response".to_owned())
        })
    }

    async fn sleep_with_cancel(
        &self,
        delay: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        debug!(delay_ms = delay.as_millis() as u64, "backing off");
        match cancel {
            Some(cancel) => tokio::select! {
                _ = cancel.cancelled() => Err(AidrError::UserAbort),
                _ = sleep(delay) => Ok(()),
            },
            None => {
                sleep(delay).await;
                Ok(())
            }
        }
    }

    /// Resolves URL, headers, body, and timeout for one attempt.
    fn build_request(&self, options: &FinalRequestOptions) -> Result<reqwest::RequestBuilder> {
        let template = options
            .request
            .base_url_template
            .as_deref()
            .unwrap_or(&self.options.base_url_template);
        let url = build_url(
            &options.path,
            options.request.query.as_ref(),
            template,
            &self.service_name,
        )?;
        let timeout = options.request.timeout.unwrap_or(self.options.timeout);

        let builtin = NullableHeaders::from_pairs([
            ("accept", "application/json"),
            ("user-agent", USER_AGENT),
        ]);
        let auth = NullableHeaders::from_pairs([(
            "authorization",
            format!("Bearer {}", self.options.token),
        )]);
        let body_headers = options
            .request
            .body
            .is_some()
            .then(|| NullableHeaders::from_pairs([("content-type", "application/json")]));

        let composed = headers::compose([
            Some(&builtin),
            Some(&auth),
            Some(&self.options.default_headers),
            body_headers.as_ref(),
            options.request.headers.as_ref(),
        ]);

        let mut header_map = HeaderMap::with_capacity(composed.len());
        for (name, value) in &composed {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|err| AidrError::InvalidHeader {
                    name: name.clone(),
                    message: err.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|err| AidrError::InvalidHeader {
                    name: name.clone(),
                    message: err.to_string(),
                })?;
            header_map.insert(header_name, header_value);
        }

        let mut request = self
            .http
            .request(options.method.clone(), url)
            .headers(header_map)
            .timeout(timeout);

        if let Some(body) = &options.request.body {
            let bytes = serde_json::to_vec(body).map_err(|err| {
                AidrError::Internal(format!("request body serialization failed: {err}"))
            })?;
            request = request.body(bytes);
        }

        Ok(request)
    }
}

fn should_retry_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT | StatusCode::CONFLICT | StatusCode::TOO_MANY_REQUESTS
    ) || status.is_server_error()
}

fn should_retry_transport(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{should_retry_status, AidrClient};
    use crate::{AidrError, ClientOptions};

    #[test]
    fn retryable_status_matrix() {
        assert!(should_retry_status(StatusCode::REQUEST_TIMEOUT));
        assert!(should_retry_status(StatusCode::CONFLICT));
        assert!(should_retry_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(should_retry_status(StatusCode::SERVICE_UNAVAILABLE));

        assert!(!should_retry_status(StatusCode::BAD_REQUEST));
        assert!(!should_retry_status(StatusCode::UNAUTHORIZED));
        assert!(!should_retry_status(StatusCode::NOT_FOUND));
        assert!(!should_retry_status(StatusCode::OK));
    }

    #[test]
    fn empty_token_fails_construction() {
        let err = AidrClient::new("aiguard", ClientOptions::new("", "https://api.example.com"))
            .expect_err("must fail");
        assert!(matches!(err, AidrError::Config(_)));
    }

    #[test]
    fn empty_base_url_template_fails_construction() {
        let err = AidrClient::new("aiguard", ClientOptions::new("token", "  "))
            .expect_err("must fail");
        assert!(matches!(err, AidrError::Config(_)));
    }

    #[test]
    fn debug_redacts_token() {
        let client = AidrClient::new(
            "aiguard",
            ClientOptions::new("secret-token", "https://{SERVICE_NAME}.example.com"),
        )
        .expect("must construct");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
