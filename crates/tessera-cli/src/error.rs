//! CLI error types

use tessera_sdk::SdkError;
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid argument or option value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// SDK error
    #[error("{0}")]
    Sdk(#[from] SdkError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// External compiler failed
    #[error("Compiler error: {0}")]
    Compiler(String),

    /// Build record missing an entry or unreadable
    #[error("Build record error: {0}")]
    BuildRecord(String),
}

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(e: toml::ser::Error) -> Self {
        CliError::Config(e.to_string())
    }
}
