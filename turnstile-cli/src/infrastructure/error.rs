use std::path::PathBuf;
use turnstile_core::{ConfigError, TurnError};
use turnstile_runtime::RuntimeError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Turn error: {0}")]
    Turn(#[from] TurnError),

    #[error("Config file not found: {path}")]
    ConfigFileNotFound { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl CliError {
    pub fn config_not_found(path: PathBuf) -> Self {
        CliError::ConfigFileNotFound { path }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::InvalidConfig(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
