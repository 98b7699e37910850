//! Core domain types for an outreach run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contact selected for outreach.
///
/// Chosen as the first entry of the enrichment response's email list —
/// positional tie-break only, no seniority or confidence ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// The contact's email address.
    pub email: String,
}

impl Contact {
    /// Display name assembled from first/last, empty when both are absent.
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{first} {last}").trim().to_string()
    }
}

/// Terminal record for one processed work item.
///
/// Exactly one of `success_logged` / `failure_logged` is true — the
/// driver's branch structure guarantees it. When the per-item failure
/// boundary fired, `failed_stage` and `error` say where and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    /// The company URL as it appeared in the worklist.
    pub company_url: String,
    /// Host derived from the URL, port stripped.
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_body: Option<String>,
    /// Identifier of the created mail draft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_id: Option<String>,
    pub success_logged: bool,
    pub failure_logged: bool,
    /// Pipeline stage at which the item failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the item finished processing.
    pub processed_at: DateTime<Utc>,
}

impl Outcome {
    /// A skeleton outcome for an item that just entered the pipeline.
    pub fn new(company_url: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            company_url: company_url.into(),
            domain: domain.into(),
            contact_email: None,
            contact_name: None,
            subject: None,
            email_body: None,
            draft_id: None,
            success_logged: false,
            failure_logged: false,
            failed_stage: None,
            error: None,
            processed_at: Utc::now(),
        }
    }
}

/// Summary of a completed (or aborted) run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// One outcome per item that entered the pipeline, in worklist order.
    pub outcomes: Vec<Outcome>,
    /// URLs dropped at load time for failing validation.
    pub skipped_invalid: Vec<String>,
    /// Total wall-clock duration of the run.
    #[serde(skip)]
    pub elapsed: std::time::Duration,
}

impl RunReport {
    /// Items that ended on the success path (draft created, success row logged).
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success_logged).count()
    }

    /// Items that ended on the failure path (no contact, or item-fatal error).
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failure_logged).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_full_name_variants() {
        let both = Contact {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            email: "jane@acme.com".into(),
        };
        assert_eq!(both.full_name(), "Jane Doe");

        let first_only = Contact {
            first_name: Some("Jane".into()),
            last_name: None,
            email: "jane@acme.com".into(),
        };
        assert_eq!(first_only.full_name(), "Jane");

        let neither = Contact {
            first_name: None,
            last_name: None,
            email: "info@acme.com".into(),
        };
        assert_eq!(neither.full_name(), "");
    }

    #[test]
    fn outcome_starts_unlogged() {
        let o = Outcome::new("https://acme.com", "acme.com");
        assert!(!o.success_logged);
        assert!(!o.failure_logged);
        assert!(o.failed_stage.is_none());
    }

    #[test]
    fn run_report_counts() {
        let mut report = RunReport::default();
        let mut a = Outcome::new("https://a.com", "a.com");
        a.success_logged = true;
        let mut b = Outcome::new("https://b.com", "b.com");
        b.failure_logged = true;
        report.outcomes = vec![a, b];

        assert_eq!(report.successes(), 1);
        assert_eq!(report.failures(), 1);
    }

    #[test]
    fn outcome_serializes_without_empty_fields() {
        let o = Outcome::new("https://a.com", "a.com");
        let json = serde_json::to_string(&o).expect("serialize");
        assert!(!json.contains("contact_email"));
        assert!(json.contains("success_logged"));
    }
}
