//! Versioned prompt templates for the three generation call sites.
//!
//! Templates are data, not code: the defaults ship embedded, and any of
//! them can be overridden by dropping a same-named `.txt` file into a
//! templates directory — no code change needed. Placeholders are literal
//! `{name}` markers substituted by [`PromptSet`].

use std::path::Path;

use tracing::debug;

use leadloom_shared::{Contact, LeadloomError, Result};

/// Fixed sign-off appended to every generated email body.
///
/// The body template also shows it to the model for style, but the
/// pipeline enforces it post-hoc rather than trusting model free text.
pub const SIGNATURE: &str = "-----\nBest\nKaushalya N\nCo-Founder";

const DEFAULT_SUMMARY: &str = include_str!("../templates/summary.txt");
const DEFAULT_EMAIL_BODY: &str = include_str!("../templates/email_body.txt");
const DEFAULT_SUBJECT: &str = include_str!("../templates/subject.txt");

/// The three prompt templates used by a run.
#[derive(Debug, Clone)]
pub struct PromptSet {
    summary: String,
    email_body: String,
    subject: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::embedded()
    }
}

impl PromptSet {
    /// The embedded default templates.
    pub fn embedded() -> Self {
        Self {
            summary: DEFAULT_SUMMARY.trim_end().to_string(),
            email_body: DEFAULT_EMAIL_BODY.trim_end().to_string(),
            subject: DEFAULT_SUBJECT.trim_end().to_string(),
        }
    }

    /// Load templates from `dir`, falling back to the embedded default for
    /// any file that is absent. Unreadable files are an error.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut set = Self::embedded();
        set.summary = read_override(dir, "summary.txt")?.unwrap_or(set.summary);
        set.email_body = read_override(dir, "email_body.txt")?.unwrap_or(set.email_body);
        set.subject = read_override(dir, "subject.txt")?.unwrap_or(set.subject);
        Ok(set)
    }

    /// Prompt for the ≤75-word company summary.
    pub fn summary_prompt(&self, text: &str) -> String {
        render(&self.summary, &[("text", text)])
    }

    /// Prompt for the outreach email body, style-constrained by the
    /// embedded example emails.
    pub fn email_body_prompt(&self, summary: &str, contact: &Contact) -> String {
        render(
            &self.email_body,
            &[
                ("summary", summary),
                ("first_name", contact.first_name.as_deref().unwrap_or("")),
                ("last_name", contact.last_name.as_deref().unwrap_or("")),
            ],
        )
    }

    /// Prompt for the 3-4 word subject line referencing the company name.
    pub fn subject_prompt(&self, summary: &str, organization: &str, contact_name: &str) -> String {
        render(
            &self.subject,
            &[
                ("summary", summary),
                ("organization", organization),
                ("contact_name", contact_name),
            ],
        )
    }
}

fn read_override(dir: &Path, name: &str) -> Result<Option<String>> {
    let path = dir.join(name);
    if !path.exists() {
        return Ok(None);
    }
    debug!(?path, "using prompt template override");
    let content = std::fs::read_to_string(&path).map_err(|e| LeadloomError::io(&path, e))?;
    Ok(Some(content.trim_end().to_string()))
}

/// Substitute literal `{key}` markers.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Append the fixed signature unless the generated body already carries it.
pub fn ensure_signature(body: &str) -> String {
    let trimmed = body.trim_end();
    if trimmed.ends_with(SIGNATURE) {
        trimmed.to_string()
    } else {
        format!("{trimmed}\n\n{SIGNATURE}")
    }
}
