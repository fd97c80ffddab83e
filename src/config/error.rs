// ABOUTME: Configuration error types.
// ABOUTME: One variant per missing or invalid connection setting.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SSH_HOST not set in .env or passed as argument")]
    MissingHost,

    #[error("SSH_USER not set in .env or passed as argument")]
    MissingUser,

    #[error("SSH_PASSWORD or SSH_KEY_PATH required in .env or as argument")]
    MissingCredentials,

    #[error("invalid SSH_PORT {value:?}: expected a number between 1 and 65535")]
    InvalidPort { value: String },

    #[error("failed to read settings file {path}: {source}")]
    SettingsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
