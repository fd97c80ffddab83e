// ABOUTME: SSH-specific error types.
// ABOUTME: Covers connection, authentication, host key, and command failures.

use crate::error::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Connection(String),

    #[error("timed out connecting to {host}:{port} after {timeout:?}")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: std::time::Duration,
    },

    #[error("authentication failed for user {user}")]
    AuthenticationFailed { user: String },

    #[error("host key for {host}:{port} does not match known_hosts")]
    HostKeyRejected { host: String, port: u16 },

    #[error("failed to load key from {path}: {reason}")]
    KeyLoadFailed { path: PathBuf, reason: String },

    #[error("command execution failed: {0}")]
    CommandFailed(String),

    #[error("command timed out after {0:?}")]
    CommandTimeout(std::time::Duration),

    #[error("failed to start shell: {0}")]
    ShellFailed(String),

    #[error("channel closed unexpectedly before the command finished")]
    ChannelClosed,

    #[error("session is closed")]
    SessionClosed,

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connection(_)
            | Error::ConnectTimeout { .. }
            | Error::Protocol(russh::Error::IO(_)) => ErrorKind::Transport,
            Error::AuthenticationFailed { .. } => ErrorKind::Authentication,
            Error::KeyLoadFailed { .. } => ErrorKind::Configuration,
            Error::CommandFailed(_)
            | Error::CommandTimeout(_)
            | Error::ShellFailed(_)
            | Error::ChannelClosed => ErrorKind::Command,
            Error::HostKeyRejected { .. } | Error::SessionClosed | Error::Protocol(_) => {
                ErrorKind::Protocol
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
