use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const STATUS_SUCCESS: &str = "Success";
pub(crate) const STATUS_ACCEPTED: &str = "Accepted";

/// Standard AIDR response envelope carried by every endpoint.
///
/// `status` is `"Success"`, `"Accepted"` (async job enqueued), or an
/// error status string; `result` is the endpoint-specific payload.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ResponseEnvelope {
    pub request_id: String,
    pub request_time: String,
    pub response_time: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// `result` payload of an `Accepted` envelope.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AcceptedDetails {
    pub ttl_mins: u64,
    pub retry_counter: u64,
    pub location: String,
}

impl ResponseEnvelope {
    /// Reads an envelope out of an arbitrary JSON value, if it matches.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Returns the async-job details when this envelope signals an
    /// in-progress request; `None` for every other shape.
    pub fn accepted_details(&self) -> Option<AcceptedDetails> {
        if self.status != STATUS_ACCEPTED {
            return None;
        }
        self.result
            .as_ref()
            .and_then(|result| serde_json::from_value(result.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ResponseEnvelope;

    fn envelope(value: serde_json::Value) -> ResponseEnvelope {
        ResponseEnvelope::from_value(&value).expect("must deserialize")
    }

    #[test]
    fn accepted_envelope_exposes_details() {
        let parsed = envelope(json!({
            "request_id": "prq_abc",
            "request_time": "2024-01-01T00:00:00Z",
            "response_time": "2024-01-01T00:00:01Z",
            "status": "Accepted",
            "result": {
                "ttl_mins": 15,
                "retry_counter": 1,
                "location": "https://aidr.example.com/v1/request/prq_abc"
            }
        }));

        let details = parsed.accepted_details().expect("must be accepted");
        assert_eq!(details.ttl_mins, 15);
        assert_eq!(details.retry_counter, 1);
        assert!(!parsed.is_success());
    }

    #[test]
    fn success_status_is_not_accepted() {
        let parsed = envelope(json!({
            "request_id": "prq_abc",
            "request_time": "2024-01-01T00:00:00Z",
            "response_time": "2024-01-01T00:00:01Z",
            "status": "Success",
            "result": {"detectors": {}}
        }));

        assert!(parsed.is_success());
        assert!(parsed.accepted_details().is_none());
    }

    #[test]
    fn accepted_status_with_malformed_result_is_not_accepted() {
        let parsed = envelope(json!({
            "request_id": "prq_abc",
            "request_time": "2024-01-01T00:00:00Z",
            "response_time": "2024-01-01T00:00:01Z",
            "status": "Accepted",
            "result": {"ttl_mins": 15}
        }));

        assert!(parsed.accepted_details().is_none());
    }

    #[test]
    fn non_envelope_json_is_rejected() {
        assert!(ResponseEnvelope::from_value(&json!({"status": "Success"})).is_none());
        assert!(ResponseEnvelope::from_value(&json!("plain string")).is_none());
    }
}
