// src/errors/mod.rs
//! User-facing errors with miette diagnostics.
//!
//! Codes are stable: `H1xxx` for template loading, `H2xxx` for configuration
//! and `H3xxx` for campaign aborts.

pub mod campaign;
pub mod config;
pub mod report;
pub mod template;

pub use campaign::CampaignError;
pub use config::ConfigError;
pub use report::print_diagnostic;
pub use template::TemplateError;
