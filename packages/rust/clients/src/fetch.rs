//! Company-site HTML fetcher.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use leadloom_shared::{LeadloomError, Result, RetryPolicy, retry};

use crate::{status_error, transport_error};

/// Fetches a company page over HTTP, following redirects.
pub struct PageFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl PageFetcher {
    /// Create a fetcher with a 30 s timeout and a redirect limit of 5.
    pub fn new(policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LeadloomError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, policy })
    }

    /// Fetch the page body at `url`, retrying transient failures.
    ///
    /// A terminal non-2xx after retries surfaces as an item-fatal error;
    /// the driver's failure boundary routes it to the failure path.
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        retry(&self.policy, "fetch.page", || self.fetch_once(url)).await
    }

    async fn fetch_once(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| transport_error(&format!("{url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(url.as_str(), status));
        }

        response
            .text()
            .await
            .map_err(|e| transport_error(&format!("{url}: body read failed"), e))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher() -> PageFetcher {
        PageFetcher::new(RetryPolicy::immediate(5)).unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>Acme</body></html>"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let body = fetcher().fetch(&url).await.unwrap();
        assert!(body.contains("Acme"));
    }

    #[tokio::test]
    async fn fetch_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let body = fetcher().fetch(&url).await.unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn fetch_404_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, LeadloomError::Network(_)));
    }

    #[tokio::test]
    async fn fetch_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(5)
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("retries exhausted"));
    }
}
