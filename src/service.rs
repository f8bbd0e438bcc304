use serde_json::Value;

use crate::{AidrClient, ClientOptions, ParsedBody, RequestOptions, Result};

/// Client for the AIDR AI Guard service (slug `aiguard`).
///
/// Thin wrapper supplying the service name to the shared request engine;
/// request bodies are caller-built JSON values.
#[derive(Clone, Debug)]
pub struct AiGuard {
    client: AidrClient,
}

impl AiGuard {
    pub const SERVICE_NAME: &'static str = "aiguard";

    pub fn new(options: ClientOptions) -> Result<Self> {
        Ok(Self {
            client: AidrClient::new(Self::SERVICE_NAME, options)?,
        })
    }

    /// The underlying engine, for endpoints not wrapped here.
    pub fn client(&self) -> &AidrClient {
        &self.client
    }

    /// Analyzes and redacts chat-completion content to avoid manipulation
    /// of the model, malicious additions, and undesirable data transfers.
    pub async fn guard_chat_completions(
        &self,
        body: Value,
        options: RequestOptions,
    ) -> Result<ParsedBody> {
        self.client
            .post("/v1/guard_chat_completions", options.with_body(body))
            .await
    }

    /// Decrypts or unredacts FPE redactions.
    pub async fn unredact(&self, body: Value, options: RequestOptions) -> Result<ParsedBody> {
        self.client
            .post("/v1/unredact", options.with_body(body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::AiGuard;
    use crate::ClientOptions;

    #[test]
    fn carries_the_aiguard_slug() {
        let service = AiGuard::new(ClientOptions::new(
            "token",
            "https://{SERVICE_NAME}.example.com",
        ))
        .expect("must construct");
        assert_eq!(service.client().service_name(), "aiguard");
    }
}
