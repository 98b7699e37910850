//! Shared types, error model, validation, and configuration for Leadloom.
//!
//! This crate is the foundation depended on by all other Leadloom crates.
//! It provides:
//! - [`LeadloomError`] — the unified error type
//! - Domain types ([`Contact`], [`Outcome`], [`RunReport`])
//! - Validation helpers ([`validate_url`], [`extract_domain`], [`validate_email`])
//! - The centralized backoff helper ([`retry`], [`RetryPolicy`])
//! - Configuration ([`AppConfig`], [`Secrets`], config loading)

pub mod config;
pub mod error;
pub mod retry;
pub mod types;
pub mod validate;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, OpenAiConfig, RetryConfig, RunLimitsConfig, Secrets, SheetsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{LeadloomError, Result};
pub use retry::{RetryPolicy, retry};
pub use types::{Contact, Outcome, RunReport};
pub use validate::{extract_domain, validate_email, validate_url};
