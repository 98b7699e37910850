//! Google Sheets adapter: worklist read and success/failure row appends.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use leadloom_shared::{LeadloomError, Result, RetryPolicy, retry};

use crate::{status_error, transport_error};

/// Default Sheets API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Response shape of `values.get`.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Client for reading the worklist column and appending result rows.
pub struct SheetsClient {
    client: Client,
    base_url: String,
    access_token: String,
    policy: RetryPolicy,
}

impl SheetsClient {
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

    /// Read a one-column range, returning non-blank trimmed first-column
    /// values in sheet order.
    pub async fn read_column(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<String>> {
        retry(&self.policy, "sheets.read_column", || {
            self.read_column_once(spreadsheet_id, range)
        })
        .await
    }

    async fn read_column_once(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{range}",
            self.base_url
        );
        debug!(spreadsheet_id, range, "reading worklist column");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| transport_error("sheets.read_column", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("sheets.read_column", status));
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| LeadloomError::parse(format!("sheets response: {e}")))?;

        Ok(body
            .values
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect())
    }

    /// Append rows to `range`, inserting new rows rather than overwriting.
    pub async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        retry(&self.policy, "sheets.append_rows", || {
            self.append_rows_once(spreadsheet_id, range, rows)
        })
        .await
    }

    async fn append_rows_once(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{range}:append",
            self.base_url
        );
        debug!(spreadsheet_id, range, rows = rows.len(), "appending rows");

        let response = self
            .client
            .post(&url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "values": rows }))
            .send()
            .await
            .map_err(|e| transport_error("sheets.append_rows", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("sheets.append_rows", status));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{bearer_token, body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> SheetsClient {
        SheetsClient::with_base_url(server.uri(), "test-token", RetryPolicy::immediate(5)).unwrap()
    }

    #[tokio::test]
    async fn read_column_trims_and_drops_blanks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1/values/Sheet1!A:A"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "Sheet1!A1:A5",
                "values": [
                    ["https://a.com"],
                    ["  "],
                    [" https://b.com "],
                    [],
                    ["bad"]
                ]
            })))
            .mount(&server)
            .await;

        let values = client(&server)
            .read_column("sheet-1", "Sheet1!A:A")
            .await
            .unwrap();
        assert_eq!(values, vec!["https://a.com", "https://b.com", "bad"]);
    }

    #[tokio::test]
    async fn read_column_handles_empty_sheet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "range": "Sheet1!A:A" })),
            )
            .mount(&server)
            .await;

        let values = client(&server)
            .read_column("sheet-1", "Sheet1!A:A")
            .await
            .unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn read_column_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [["https://a.com"]]
            })))
            .mount(&server)
            .await;

        let values = client(&server)
            .read_column("sheet-1", "Sheet1!A:A")
            .await
            .unwrap();
        assert_eq!(values, vec!["https://a.com"]);
    }

    #[tokio::test]
    async fn append_rows_sends_insert_semantics() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1/values/Failures!A:A:append"))
            .and(query_param("valueInputOption", "USER_ENTERED"))
            .and(query_param("insertDataOption", "INSERT_ROWS"))
            .and(body_json(serde_json::json!({ "values": [["acme.com"]] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "updates": { "updatedRows": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .append_rows("sheet-1", "Failures!A:A", &[vec!["acme.com".to_string()]])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn append_rows_exhaustion_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(5)
            .mount(&server)
            .await;

        let err = client(&server)
            .append_rows("sheet-1", "Sheet1!B:D", &[vec!["x".to_string()]])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("retries exhausted"));
    }
}
