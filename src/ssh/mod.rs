// ABOUTME: SSH client module for remote server connections.
// ABOUTME: Supports password and key-file authentication with trust-on-first-use host keys.

mod client;
mod error;

pub use client::{CommandOutput, Session, SessionConfig};
pub use error::{Error, Result};
