//! Gmail adapter: create an unsent draft for manual review.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use leadloom_shared::{LeadloomError, Result, RetryPolicy, retry, validate_email};

use crate::{status_error, transport_error};

/// Default Gmail API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com";

#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: String,
}

/// Client for creating mail drafts. Drafts are never sent automatically.
pub struct GmailClient {
    client: Client,
    base_url: String,
    access_token: String,
    policy: RetryPolicy,
}

impl GmailClient {
    pub fn new(access_token: impl Into<String>, policy: RetryPolicy) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, access_token, policy)
    }

    /// Point the client at a different endpoint (tests use a mock server).
    pub fn with_base_url(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LeadloomError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            policy,
        })
    }

    /// Create a plain-text draft addressed to `recipient`.
    ///
    /// Missing subject/body/recipient or a recipient that fails the
    /// `local@domain` check is an item-fatal validation error. Returns the
    /// draft identifier.
    pub async fn create_draft(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<String> {
        if subject.is_empty() || body.is_empty() || recipient.is_empty() {
            return Err(LeadloomError::validation(
                "missing subject, body, or recipient for mail draft",
            ));
        }
        if !validate_email(recipient) {
            return Err(LeadloomError::validation(format!(
                "invalid recipient email: {recipient}"
            )));
        }

        let raw = encode_rfc822(subject, body, recipient);

        retry(&self.policy, "gmail.create_draft", || {
            self.create_draft_once(&raw)
        })
        .await
    }

    async fn create_draft_once(&self, raw: &str) -> Result<String> {
        let url = format!("{}/gmail/v1/users/me/drafts", self.base_url);
        debug!("creating mail draft");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "message": { "raw": raw } }))
            .send()
            .await
            .map_err(|e| transport_error("gmail.create_draft", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("gmail.create_draft", status));
        }

        let draft: DraftResponse = response
            .json()
            .await
            .map_err(|e| LeadloomError::parse(format!("gmail draft response: {e}")))?;

        Ok(draft.id)
    }
}

/// Build the RFC-822 plain-text message and URL-safe base64 encode it.
fn encode_rfc822(subject: &str, body: &str, to: &str) -> String {
    let message = format!(
        "To: {to}\r\nContent-Type: text/plain; charset=utf-8\r\nSubject: {subject}\r\n\r\n{body}"
    );
    URL_SAFE.encode(message.as_bytes())
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> GmailClient {
        GmailClient::with_base_url(server.uri(), "test-token", RetryPolicy::immediate(5)).unwrap()
    }

    #[test]
    fn rfc822_encoding_roundtrips() {
        let raw = encode_rfc822("Hello Acme", "Hi Jane,\n\nBest", "jane@acme.com");
        let decoded = URL_SAFE.decode(&raw).unwrap();
        let text = String::from_utf8(decoded).unwrap();

        assert!(text.starts_with("To: jane@acme.com\r\n"));
        assert!(text.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(text.contains("Subject: Hello Acme\r\n"));
        // Headers and body separated by a blank line.
        assert!(text.contains("\r\n\r\nHi Jane,"));
    }

    #[tokio::test]
    async fn create_draft_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/drafts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "draft-123",
                "message": { "id": "msg-456" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .create_draft("Subject", "Body", "jane@acme.com")
            .await
            .unwrap();
        assert_eq!(id, "draft-123");
    }

    #[tokio::test]
    async fn create_draft_rejects_invalid_recipient() {
        let server = MockServer::start().await;
        let err = client(&server)
            .create_draft("Subject", "Body", "jane@acme")
            .await
            .unwrap_err();
        assert!(matches!(err, LeadloomError::Validation { .. }));
    }

    #[tokio::test]
    async fn create_draft_rejects_missing_fields() {
        let server = MockServer::start().await;
        let err = client(&server)
            .create_draft("", "Body", "jane@acme.com")
            .await
            .unwrap_err();
        assert!(matches!(err, LeadloomError::Validation { .. }));
    }

    #[tokio::test]
    async fn create_draft_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "draft-9" })),
            )
            .mount(&server)
            .await;

        let id = client(&server)
            .create_draft("Subject", "Body", "jane@acme.com")
            .await
            .unwrap();
        assert_eq!(id, "draft-9");
    }
}
