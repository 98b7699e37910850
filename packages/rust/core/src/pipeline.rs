//! The per-item pipeline and its driver loop.
//!
//! The control flow is a fixed finite-state machine, not a generic graph:
//! `SelectNext → Fetch → Extract → Summarize → Lookup → (Compose → Subject →
//! Draft → LogSuccess | LogFailure) → SelectNext`, terminating when the
//! worklist is empty. Each item gets a fresh [`ItemState`]; nothing carries
//! over between iterations.
//!
//! Any item-fatal error is caught at the loop boundary, recorded as a
//! failure outcome with its failing stage, and the run continues with the
//! next item. Only config errors and the step budget abort the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument, warn};
use url::Url;

use leadloom_clients::{
    DomainSearchData, GmailClient, HunterClient, LlmClient, PageFetcher, SheetsClient,
};
use leadloom_extract::body_text;
use leadloom_prompts::{PromptSet, ensure_signature};
use leadloom_shared::{
    Contact, LeadloomError, Outcome, Result, RunReport, extract_domain,
};

use crate::worklist::{WorkEntry, load_worklist};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Named pipeline stages, used for transition logging and failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SelectNext,
    Fetch,
    Extract,
    Summarize,
    Lookup,
    Compose,
    Subject,
    Draft,
    LogSuccess,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectNext => "select_next",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Summarize => "summarize",
            Self::Lookup => "lookup",
            Self::Compose => "compose",
            Self::Subject => "subject",
            Self::Draft => "draft",
            Self::LogSuccess => "log_success",
        }
    }
}

/// An item-fatal error tagged with the stage that raised it.
struct StageError {
    stage: Stage,
    source: LeadloomError,
}

type StageResult<T> = std::result::Result<T, StageError>;

trait WithStage<T> {
    fn at(self, stage: Stage) -> StageResult<T>;
}

impl<T> WithStage<T> for Result<T> {
    fn at(self, stage: Stage) -> StageResult<T> {
        self.map_err(|source| StageError { stage, source })
    }
}

/// How an item's stage sequence ended.
enum ItemEnd {
    /// Success path completed: draft created, success row appended.
    Drafted,
    /// Enrichment returned no usable contact; route to failure logging.
    NoContact,
}

// ---------------------------------------------------------------------------
// Per-item state
// ---------------------------------------------------------------------------

/// Mutable fields populated as one item moves through the stages.
///
/// Constructed fresh at `SelectNext` and discarded when the item is folded
/// into its [`Outcome`] — there is no cross-iteration reset bookkeeping.
#[derive(Default)]
struct ItemState {
    html: String,
    text: String,
    summary: String,
    lookup: DomainSearchData,
    contact: Option<Contact>,
    email_body: String,
    subject: String,
    draft_id: String,
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag, checked between items.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop after the current item.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when an item is dequeued.
    fn item_started(&self, url: &str, current: usize, total: usize);
    /// Called when an item's outcome is final.
    fn item_finished(&self, outcome: &Outcome);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_started(&self, _url: &str, _current: usize, _total: usize) {}
    fn item_finished(&self, _outcome: &Outcome) {}
    fn done(&self, _report: &RunReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Spreadsheet targets and run-level limits.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Identifier of the worklist spreadsheet.
    pub spreadsheet_id: String,
    /// One-column range of candidate URLs.
    pub worklist_range: String,
    /// Range receiving `[contact_email, contact_name, company_url]` rows.
    pub success_range: String,
    /// Range receiving `[domain]` rows.
    pub failure_range: String,
    /// Maximum stage transitions before the run aborts as fatal.
    pub step_budget: usize,
    /// Optional wall-clock budget, checked between items.
    pub deadline: Option<Duration>,
}

/// The outreach pipeline: one-shot batch job over a bounded worklist.
pub struct Pipeline {
    sheets: SheetsClient,
    gmail: GmailClient,
    hunter: HunterClient,
    llm: LlmClient,
    fetcher: PageFetcher,
    prompts: PromptSet,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        sheets: SheetsClient,
        gmail: GmailClient,
        hunter: HunterClient,
        llm: LlmClient,
        fetcher: PageFetcher,
        prompts: PromptSet,
        config: PipelineConfig,
    ) -> Self {
        Self {
            sheets,
            gmail,
            hunter,
            llm,
            fetcher,
            prompts,
            config,
        }
    }

    /// Run the full pipeline: load the worklist, process every item,
    /// return one outcome per item in worklist order.
    ///
    /// Re-running with the same worklist appends duplicate rows and creates
    /// duplicate drafts — expected behavior, there is no deduplication.
    #[instrument(skip_all, fields(spreadsheet = %self.config.spreadsheet_id))]
    pub async fn run(
        &self,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<RunReport> {
        let start = Instant::now();
        let deadline = self.config.deadline.map(|d| start + d);

        progress.phase("Loading worklist");
        let (mut pending, skipped) = load_worklist(
            &self.sheets,
            &self.config.spreadsheet_id,
            &self.config.worklist_range,
        )
        .await?;

        let total = pending.len();
        let mut report = RunReport {
            skipped_invalid: skipped,
            ..Default::default()
        };
        let mut steps: usize = 0;

        info!(total, "starting outreach run");

        // SELECT_NEXT: strictly decreasing queue length guarantees
        // termination after exactly `total` iterations.
        while let Some(entry) = pending.pop_front() {
            if cancel.is_cancelled() {
                warn!(remaining = pending.len() + 1, "cancellation requested, stopping run");
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(remaining = pending.len() + 1, "wall-clock deadline reached, stopping run");
                break;
            }

            progress.item_started(&entry.raw, total - pending.len(), total);
            let outcome = self.process_item(&entry, &mut steps).await?;
            progress.item_finished(&outcome);
            report.outcomes.push(outcome);
        }

        report.elapsed = start.elapsed();
        progress.done(&report);

        info!(
            processed = report.outcomes.len(),
            successes = report.successes(),
            failures = report.failures(),
            skipped_invalid = report.skipped_invalid.len(),
            elapsed_ms = report.elapsed.as_millis(),
            "run complete"
        );

        Ok(report)
    }

    /// Process one item inside the failure boundary.
    ///
    /// Item-fatal errors become failure outcomes; only the step budget
    /// escapes as a run-fatal error.
    async fn process_item(&self, entry: &WorkEntry, steps: &mut usize) -> Result<Outcome> {
        let domain = extract_domain(entry.url.as_str()).unwrap_or_default();
        // Outcomes carry the cell text as it appeared in the sheet, not
        // the normalized URL.
        let mut outcome = Outcome::new(&entry.raw, &domain);

        // Domain rows fall back to the raw URL when extraction failed, so
        // the failure sheet still names the item.
        let failure_label = if domain.is_empty() {
            entry.raw.clone()
        } else {
            domain.clone()
        };

        let end = if domain.is_empty() {
            Err(StageError {
                stage: Stage::SelectNext,
                source: LeadloomError::validation(format!(
                    "unable to extract domain from URL: {}",
                    entry.raw
                )),
            })
        } else {
            self.run_item_stages(&entry.url, &domain, &mut outcome, steps)
                .await
        };

        match end {
            Ok(ItemEnd::Drafted) => {}
            Ok(ItemEnd::NoContact) => {
                info!(domain = %failure_label, "no contact found, logging failure");
                self.log_failure(&failure_label, &mut outcome).await;
            }
            Err(StageError {
                source: LeadloomError::Budget { message },
                ..
            }) => {
                // Run-fatal: name the item before propagating.
                return Err(LeadloomError::budget(format!(
                    "{message} (item {})",
                    entry.raw
                )));
            }
            Err(e) => {
                warn!(
                    url = %entry.raw,
                    stage = e.stage.as_str(),
                    error = %e.source,
                    "item failed, logging failure and continuing"
                );
                outcome.failed_stage = Some(e.stage.as_str().to_string());
                outcome.error = Some(e.source.to_string());
                self.log_failure(&failure_label, &mut outcome).await;
            }
        }

        outcome.processed_at = Utc::now();
        Ok(outcome)
    }

    /// Drive one item through the stage machine.
    async fn run_item_stages(
        &self,
        url: &Url,
        domain: &str,
        outcome: &mut Outcome,
        steps: &mut usize,
    ) -> StageResult<ItemEnd> {
        let mut item = ItemState::default();
        let mut stage = Stage::Fetch;

        loop {
            self.tick(steps, stage)?;

            stage = match stage {
                Stage::SelectNext => unreachable!("select_next is handled by the driver loop"),

                Stage::Fetch => {
                    item.html = self.fetcher.fetch(url).await.at(stage)?;
                    Stage::Extract
                }

                Stage::Extract => {
                    item.text = body_text(&item.html);
                    Stage::Summarize
                }

                Stage::Summarize => {
                    if item.text.is_empty() {
                        return Err(StageError {
                            stage,
                            source: LeadloomError::validation(
                                "no text content available for summarization",
                            ),
                        });
                    }
                    let prompt = self.prompts.summary_prompt(&item.text);
                    item.summary = self.llm.complete(&prompt).await.at(stage)?;
                    Stage::Lookup
                }

                Stage::Lookup => {
                    item.lookup = self.hunter.domain_search(domain).await.at(stage)?;
                    match item.lookup.primary_contact() {
                        Some(contact) => {
                            outcome.contact_email = Some(contact.email.clone());
                            outcome.contact_name = Some(contact.full_name());
                            item.contact = Some(contact);
                            Stage::Compose
                        }
                        None => return Ok(ItemEnd::NoContact),
                    }
                }

                Stage::Compose => {
                    let contact = item.contact.as_ref().ok_or_else(|| StageError {
                        stage,
                        source: LeadloomError::validation(
                            "no contact available for email body generation",
                        ),
                    })?;
                    let prompt = self.prompts.email_body_prompt(&item.summary, contact);
                    let body = self.llm.complete(&prompt).await.at(stage)?;
                    item.email_body = ensure_signature(&body);
                    outcome.email_body = Some(item.email_body.clone());
                    Stage::Subject
                }

                Stage::Subject => {
                    let organization = item.lookup.organization.as_deref().unwrap_or(domain);
                    let contact_name = outcome.contact_name.as_deref().unwrap_or("");
                    let prompt =
                        self.prompts
                            .subject_prompt(&item.summary, organization, contact_name);
                    item.subject = self.llm.complete(&prompt).await.at(stage)?;
                    outcome.subject = Some(item.subject.clone());
                    Stage::Draft
                }

                Stage::Draft => {
                    let recipient = outcome.contact_email.as_deref().unwrap_or("");
                    item.draft_id = self
                        .gmail
                        .create_draft(&item.subject, &item.email_body, recipient)
                        .await
                        .at(stage)?;
                    outcome.draft_id = Some(item.draft_id.clone());
                    Stage::LogSuccess
                }

                Stage::LogSuccess => {
                    let row = vec![
                        outcome.contact_email.clone().unwrap_or_default(),
                        outcome.contact_name.clone().unwrap_or_default(),
                        outcome.company_url.clone(),
                    ];
                    self.sheets
                        .append_rows(&self.config.spreadsheet_id, &self.config.success_range, &[row])
                        .await
                        .at(stage)?;
                    outcome.success_logged = true;
                    return Ok(ItemEnd::Drafted);
                }
            };
        }
    }

    /// Append a failure row. Append errors degrade to a warning — the
    /// failure boundary must never abort the run itself.
    async fn log_failure(&self, label: &str, outcome: &mut Outcome) {
        let row = vec![label.to_string()];
        match self
            .sheets
            .append_rows(&self.config.spreadsheet_id, &self.config.failure_range, &[row])
            .await
        {
            Ok(()) => outcome.failure_logged = true,
            Err(e) => warn!(domain = label, error = %e, "failed to append failure row"),
        }
    }

    /// Count a stage transition against the global step budget.
    fn tick(&self, steps: &mut usize, stage: Stage) -> StageResult<()> {
        *steps += 1;
        if *steps > self.config.step_budget {
            return Err(StageError {
                stage,
                source: LeadloomError::budget(format!(
                    "step budget of {} exceeded at stage {}",
                    self.config.step_budget,
                    stage.as_str()
                )),
            });
        }
        Ok(())
    }
}
