//! External-service adapters: spreadsheet, mail, enrichment, LLM, page fetch.
//!
//! Every adapter wraps its HTTP round trip with the shared retry helper and
//! classifies responses the same way: connection failures and HTTP 5xx/429
//! are transient (retried), any other non-2xx status is a terminal network
//! error. All adapters take an injectable base URL so tests can point them
//! at a mock server.

pub mod fetch;
pub mod gmail;
pub mod hunter;
pub mod llm;
pub mod sheets;

pub use fetch::PageFetcher;
pub use gmail::GmailClient;
pub use hunter::{DomainSearchData, EmailEntry, HunterClient};
pub use llm::LlmClient;
pub use sheets::SheetsClient;

use leadloom_shared::LeadloomError;

/// User-Agent string for outbound requests.
pub(crate) const USER_AGENT: &str = concat!("Leadloom/", env!("CARGO_PKG_VERSION"));

/// Map a failed HTTP status to the retryable/terminal error split.
pub(crate) fn status_error(context: &str, status: reqwest::StatusCode) -> LeadloomError {
    if status.is_server_error() || status.as_u16() == 429 {
        LeadloomError::Transient(format!("{context}: HTTP {status}"))
    } else {
        LeadloomError::Network(format!("{context}: HTTP {status}"))
    }
}

/// Map a reqwest transport error (connect, timeout, body read) to transient.
pub(crate) fn transport_error(context: &str, e: reqwest::Error) -> LeadloomError {
    LeadloomError::Transient(format!("{context}: {e}"))
}
