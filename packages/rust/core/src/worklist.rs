//! Worklist loading: spreadsheet column → validated FIFO queue of URLs.

use std::collections::VecDeque;

use tracing::{info, warn};
use url::Url;

use leadloom_clients::SheetsClient;
use leadloom_shared::{Result, validate_url};

/// One pending worklist entry: the cell string as it appeared in the
/// sheet alongside its parsed form.
///
/// `raw` is what success rows and outcomes report; `Url::as_str` is
/// normalized (trailing slash, lowercased host) and would not match the
/// spreadsheet cell.
#[derive(Debug, Clone)]
pub struct WorkEntry {
    pub raw: String,
    pub url: Url,
}

/// Read the worklist column and keep only syntactically valid absolute
/// HTTP(S) URLs, in sheet order.
///
/// Invalid entries are dropped and reported in a single warning batch.
/// A read failure (after retries) is run-fatal — no worklist, no run.
pub async fn load_worklist(
    sheets: &SheetsClient,
    spreadsheet_id: &str,
    range: &str,
) -> Result<(VecDeque<WorkEntry>, Vec<String>)> {
    let cells = sheets.read_column(spreadsheet_id, range).await?;

    let mut pending: VecDeque<WorkEntry> = VecDeque::new();
    let mut skipped: Vec<String> = Vec::new();

    for cell in cells {
        if validate_url(&cell) {
            if let Ok(url) = Url::parse(&cell) {
                pending.push_back(WorkEntry { raw: cell, url });
                continue;
            }
        }
        skipped.push(cell);
    }

    if !skipped.is_empty() {
        warn!(count = skipped.len(), urls = ?skipped, "skipping invalid worklist URLs");
    }
    info!(pending = pending.len(), skipped = skipped.len(), "worklist loaded");

    Ok((pending, skipped))
}
