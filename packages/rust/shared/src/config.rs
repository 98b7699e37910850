//! Run configuration for Leadloom.
//!
//! Secrets come from environment variables and are a fatal startup error
//! when missing. Tunables live in an optional TOML file at
//! `~/.leadloom/leadloom.toml`; absent file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LeadloomError, Result};
use crate::retry::RetryPolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leadloom.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadloom";

// ---------------------------------------------------------------------------
// Config structs (matching leadloom.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Spreadsheet ranges.
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// LLM settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Backoff policy for external calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Run-level limits.
    #[serde(default)]
    pub run: RunLimitsConfig,
}

/// `[sheets]` section — A1-style ranges within the worklist spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// One-column range holding candidate company URLs.
    #[serde(default = "default_worklist_range")]
    pub worklist_range: String,

    /// Range that receives `[contact_email, contact_name, company_url]` rows.
    #[serde(default = "default_success_range")]
    pub success_range: String,

    /// Range that receives `[domain]` rows for items without a contact.
    #[serde(default = "default_failure_range")]
    pub failure_range: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            worklist_range: default_worklist_range(),
            success_range: default_success_range(),
            failure_range: default_failure_range(),
        }
    }
}

fn default_worklist_range() -> String {
    "Sheet1!A:A".into()
}
fn default_success_range() -> String {
    "Sheet1!B:D".into()
}
fn default_failure_range() -> String {
    "Failures!A:A".into()
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Model used for all three generation call sites.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

/// `[retry]` section — shared exponential backoff policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}
fn default_base_delay_ms() -> u64 {
    1_000
}
fn default_max_delay_ms() -> u64 {
    60_000
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

/// `[run]` section — limits that bound the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLimitsConfig {
    /// Maximum stage transitions before the run aborts as fatal.
    #[serde(default = "default_step_budget")]
    pub step_budget: usize,

    /// Optional wall-clock budget in seconds; the run stops cleanly
    /// between items once exceeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,

    /// Directory of prompt template overrides; embedded defaults otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<String>,
}

impl Default for RunLimitsConfig {
    fn default() -> Self {
        Self {
            step_budget: default_step_budget(),
            deadline_secs: None,
            templates_dir: None,
        }
    }
}

fn default_step_budget() -> usize {
    1_000
}

// ---------------------------------------------------------------------------
// Secrets (environment only — never written to disk)
// ---------------------------------------------------------------------------

/// Required credentials, resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct Secrets {
    /// OAuth access token for the Sheets and Gmail APIs.
    pub google_access_token: String,
    /// Identifier of the worklist spreadsheet.
    pub sheet_id: String,
    /// Hunter domain-search API key.
    pub hunter_api_key: String,
    /// OpenAI API key.
    pub openai_api_key: String,
}

impl Secrets {
    /// Resolve all required variables. Any missing or empty variable is a
    /// run-fatal config error naming the variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            google_access_token: require_env("GOOGLE_ACCESS_TOKEN")?,
            sheet_id: require_env("GOOGLE_SHEET_ID")?,
            hunter_api_key: require_env("HUNTER_API_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(LeadloomError::config(format!(
            "{name} is required. Set the {name} environment variable."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leadloom/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeadloomError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leadloom/leadloom.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeadloomError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LeadloomError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeadloomError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeadloomError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeadloomError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
