use reqwest::{header, StatusCode};
use serde_json::Value;

use crate::{wire::ResponseEnvelope, AidrError};

/// Decoded response body.
///
/// HTTP 204 parses to [`ParsedBody::Empty`]; any JSON content type
/// (including `+json` suffixed types) to [`ParsedBody::Json`]; everything
/// else to [`ParsedBody::Text`].
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedBody {
    Empty,
    Json(Value),
    Text(String),
}

impl ParsedBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Views this body as an AIDR response envelope, when it is one.
    pub fn envelope(&self) -> Option<ResponseEnvelope> {
        self.as_json().and_then(ResponseEnvelope::from_value)
    }

    /// Async-job id to poll when the body is an `Accepted` envelope.
    pub(crate) fn accepted_request_id(&self) -> Option<String> {
        let envelope = self.envelope()?;
        envelope.accepted_details().map(|_| envelope.request_id)
    }
}

fn is_json_media_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    media_type == "application/json" || media_type.ends_with("+json")
}

/// Decodes a raw response by status and content type.
pub(crate) async fn parse_response(response: reqwest::Response) -> Result<ParsedBody, AidrError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(ParsedBody::Empty);
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_json_media_type);

    let body = response.text().await.map_err(AidrError::Connection)?;
    if is_json {
        serde_json::from_str(&body)
            .map(ParsedBody::Json)
            .map_err(|err| AidrError::Decode(format!("invalid JSON response: {err}; body: {body}")))
    } else {
        Ok(ParsedBody::Text(body))
    }
}
