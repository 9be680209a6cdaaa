//! CLI error types.

use consumable_htb_common::error::AdapterError;
use error_stack::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(String),
    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(String),
    /// Adapter failure outside of configuration
    #[error("Adapter error: {0}")]
    Adapter(String),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Toml(err.to_string())
    }
}

impl From<ureq::Error> for CliError {
    fn from(err: ureq::Error) -> Self {
        CliError::Http(err.to_string())
    }
}

impl From<Report<AdapterError>> for CliError {
    fn from(report: Report<AdapterError>) -> Self {
        match report.current_context() {
            AdapterError::Configuration { .. } => CliError::Config(format!("{report:?}")),
            _ => CliError::Adapter(report.current_context().to_string()),
        }
    }
}
