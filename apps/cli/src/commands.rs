//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use leadloom_clients::{GmailClient, HunterClient, LlmClient, PageFetcher, SheetsClient};
use leadloom_core::{CancelToken, Pipeline, PipelineConfig, ProgressReporter};
use leadloom_prompts::PromptSet;
use leadloom_shared::{
    AppConfig, Outcome, RetryPolicy, RunReport, Secrets, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Leadloom — draft personalized outreach emails from a spreadsheet worklist.
#[derive(Parser)]
#[command(
    name = "leadloom",
    version,
    about = "Turn a spreadsheet of company URLs into drafted outreach emails.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Process the worklist: fetch, summarize, enrich, draft, log.
    Run {
        /// Wall-clock budget in seconds (overrides the config file).
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Directory of prompt template overrides.
        #[arg(long)]
        templates_dir: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leadloom=info",
        1 => "leadloom=debug",
        _ => "leadloom=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            deadline_secs,
            templates_dir,
        } => cmd_run(deadline_secs, templates_dir.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Run command
// ---------------------------------------------------------------------------

async fn cmd_run(
    deadline_secs: Option<u64>,
    templates_dir: Option<&std::path::Path>,
) -> Result<()> {
    // Secrets are resolved before any network work; missing credentials
    // abort here with the variable named.
    let config = load_config()?;
    let secrets = Secrets::from_env()?;

    let prompts = match templates_dir.or(config.run.templates_dir.as_deref().map(std::path::Path::new)) {
        Some(dir) => PromptSet::from_dir(dir)?,
        None => PromptSet::embedded(),
    };

    let policy = RetryPolicy::from(&config.retry);
    let deadline = deadline_secs
        .or(config.run.deadline_secs)
        .map(Duration::from_secs);

    let pipeline = Pipeline::new(
        SheetsClient::new(&secrets.google_access_token, policy.clone())?,
        GmailClient::new(&secrets.google_access_token, policy.clone())?,
        HunterClient::new(&secrets.hunter_api_key, policy.clone())?,
        LlmClient::new(&secrets.openai_api_key, &config.openai.model, policy.clone())?,
        PageFetcher::new(policy)?,
        prompts,
        PipelineConfig {
            spreadsheet_id: secrets.sheet_id.clone(),
            worklist_range: config.sheets.worklist_range.clone(),
            success_range: config.sheets.success_range.clone(),
            failure_range: config.sheets.failure_range.clone(),
            step_budget: config.run.step_budget,
            deadline,
        },
    );

    info!(
        model = %config.openai.model,
        deadline_secs = ?deadline.map(|d| d.as_secs()),
        "starting outreach run"
    );

    // Ctrl-C requests a clean stop between items.
    let cancel = CancelToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let reporter = CliProgress::new();
    let report = pipeline.run(&reporter, &cancel).await?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("  Outreach run complete");
    println!("  Processed: {}", report.outcomes.len());
    println!("  Drafted:   {}", report.successes());
    println!("  Failures:  {}", report.failures());
    println!("  Skipped:   {} invalid URLs", report.skipped_invalid.len());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());

    let failed: Vec<&Outcome> = report
        .outcomes
        .iter()
        .filter(|o| !o.success_logged)
        .collect();
    if !failed.is_empty() {
        println!();
        for outcome in failed {
            match (&outcome.failed_stage, &outcome.error) {
                (Some(stage), Some(error)) => {
                    println!("  FAILED {} at {stage}: {error}", outcome.company_url);
                }
                _ => println!("  NO CONTACT {}", outcome.company_url),
            }
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_started(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Processing [{current}/{total}] {url}"));
    }

    fn item_finished(&self, outcome: &Outcome) {
        let status = if outcome.success_logged {
            "drafted"
        } else {
            "failed"
        };
        self.spinner
            .set_message(format!("{} {status}", outcome.company_url));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
