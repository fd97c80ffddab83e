// ABOUTME: Application-wide error types for ssh-connect.
// ABOUTME: Wraps configuration and SSH errors and classifies them by kind.

use crate::config::ConfigError;
use thiserror::Error;

/// Broad failure category, used by the CLI to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid setup; fixed by editing configuration.
    Configuration,
    /// Credentials were rejected.
    Authentication,
    /// Network-level failure: DNS, refused connection, timeout.
    Transport,
    /// Remote command or shell failure.
    Command,
    /// Any other SSH-layer failure.
    Protocol,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Transport => "transport",
            ErrorKind::Command => "command",
            ErrorKind::Protocol => "protocol",
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ssh(#[from] crate::ssh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Configuration,
            Error::Ssh(e) => e.kind(),
            Error::Io(_) => ErrorKind::Transport,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
