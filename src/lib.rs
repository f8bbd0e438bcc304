//! `aidr-http` is an async HTTP client core for the AIDR content-safety
//! guardrail API.
//!
//! The crate wraps the request lifecycle shared by all AIDR services:
//! - header composition and templated URL construction
//! - per-attempt timeouts, cancellation, and retries with jittered backoff
//! - transparent polling of HTTP 202 `Accepted` async jobs
//!
//! [`AidrClient`] exposes the `get`/`post` primitives service wrappers
//! build on; [`AiGuard`] is the wrapper for the AI Guard service.

mod backoff;
mod client;
mod error;
mod headers;
mod options;
mod parse;
mod service;
mod url;
mod wire;

pub use backoff::JitterSource;
pub use client::AidrClient;
pub use error::AidrError;
pub use headers::NullableHeaders;
pub use options::{ClientOptions, RequestOptions};
pub use parse::ParsedBody;
pub use service::AiGuard;
pub use wire::{AcceptedDetails, ResponseEnvelope};

pub type Result<T> = std::result::Result<T, AidrError>;
