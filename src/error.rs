/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum AidrError {
    /// Missing or empty required configuration, detected at construction.
    #[error("configuration error: {0}")]
    Config(String),
    /// The caller's cancellation token fired before or during a request.
    #[error("request was aborted by the caller")]
    UserAbort,
    /// Network-level failure from `reqwest` with all retries exhausted.
    #[error("connection error")]
    Connection(#[source] reqwest::Error),
    /// Retryable HTTP status (408/409/429 or 5xx) still failing after all
    /// retries, with the raw response body.
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    /// Unsupported query-parameter value type at URL build time.
    #[error("cannot stringify type {0}; expected string, number, boolean, or null")]
    Stringify(String),
    /// Header name or value not representable on the wire.
    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },
    /// The resolved request URL failed to parse.
    #[error("invalid request URL '{url}'")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// Response body advertised as JSON but unparseable.
    #[error("decode error: {0}")]
    Decode(String),
    /// Internal invariant violation; should be unreachable.
    #[error("internal error: {0}")]
    Internal(String),
}
