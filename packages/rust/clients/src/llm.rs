//! LLM adapter: single-turn prompt completion over the OpenAI chat API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use leadloom_shared::{LeadloomError, Result, RetryPolicy, retry};

use crate::{status_error, transport_error};

/// Default OpenAI API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Client for single-turn completions. No conversation state is kept.
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    policy: RetryPolicy,
}

impl LlmClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model, policy)
    }

    /// Point the client at a different endpoint (tests use a mock server).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LeadloomError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            policy,
        })
    }

    /// Complete `prompt` and return the trimmed model output.
    ///
    /// No validation is performed on output length or content beyond
    /// trimming — the caller owns any post-processing.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        retry(&self.policy, "llm.complete", || self.complete_once(prompt)).await
    }

    async fn complete_once(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error("llm.complete", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("llm.complete", status));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LeadloomError::parse(format!("llm response: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LeadloomError::parse("llm response contained no choices"))?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> LlmClient {
        LlmClient::with_base_url(
            server.uri(),
            "sk-test",
            "gpt-4o-mini",
            RetryPolicy::immediate(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn complete_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(
                serde_json::json!({ "model": "gpt-4o-mini" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "  Acme builds rockets.\n" } }
                ]
            })))
            .mount(&server)
            .await;

        let text = client(&server).complete("Summarize this").await.unwrap();
        assert_eq!(text, "Acme builds rockets.");
    }

    #[tokio::test]
    async fn complete_without_choices_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let err = client(&server).complete("hi").await.unwrap_err();
        assert!(matches!(err, LeadloomError::Parse { .. }));
    }

    #[tokio::test]
    async fn complete_retries_rate_limits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "ok" } }]
            })))
            .mount(&server)
            .await;

        let text = client(&server).complete("hi").await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn auth_failures_are_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).complete("hi").await.unwrap_err();
        assert!(matches!(err, LeadloomError::Network(_)));
    }
}
