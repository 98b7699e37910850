//! Hunter domain-search adapter: contact enrichment lookup.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use leadloom_shared::{Contact, LeadloomError, Result, RetryPolicy, retry};

use crate::{status_error, transport_error};

/// Default Hunter API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.hunter.io";

/// One email entry from the domain-search response.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailEntry {
    /// The address itself. Hunter occasionally omits it.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// The `data` object of a domain-search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainSearchData {
    #[serde(default)]
    pub emails: Vec<EmailEntry>,
    #[serde(default)]
    pub organization: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DomainSearchResponse {
    #[serde(default)]
    data: DomainSearchData,
}

impl DomainSearchData {
    /// The primary contact: the first email entry that carries an address.
    ///
    /// Positional selection only — no seniority or confidence ranking.
    pub fn primary_contact(&self) -> Option<Contact> {
        let entry = self.emails.first()?;
        let email = entry.value.clone()?;
        Some(Contact {
            first_name: entry.first_name.clone(),
            last_name: entry.last_name.clone(),
            email,
        })
    }
}

/// Client for the Hunter domain-search API.
pub struct HunterClient {
    client: Client,
    base_url: String,
    api_key: String,
    policy: RetryPolicy,
}

impl HunterClient {
    pub fn new(api_key: impl Into<String>, policy: RetryPolicy) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, policy)
    }

    /// Point the client at a different endpoint (tests use a mock server).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
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
            api_key: api_key.into(),
            policy,
        })
    }

    /// Look up known email addresses for `domain`.
    pub async fn domain_search(&self, domain: &str) -> Result<DomainSearchData> {
        retry(&self.policy, "hunter.domain_search", || {
            self.domain_search_once(domain)
        })
        .await
    }

    async fn domain_search_once(&self, domain: &str) -> Result<DomainSearchData> {
        let url = format!("{}/v2/domain-search", self.base_url);
        debug!(domain, "enrichment lookup");

        let response = self
            .client
            .get(&url)
            .query(&[("domain", domain), ("api_key", &self.api_key)])
            .send()
            .await
            .map_err(|e| transport_error("hunter.domain_search", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("hunter.domain_search", status));
        }

        let body: DomainSearchResponse = response
            .json()
            .await
            .map_err(|e| LeadloomError::parse(format!("hunter response: {e}")))?;

        Ok(body.data)
    }
}
