// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet, and JSON output modes, plus setup guidance on errors.

use crate::error::{Error, ErrorKind};
use crate::ssh::CommandOutput;
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with banners and notices
    Normal,
    /// Only remote output and failures
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print an informational message (suppressed in quiet/json mode).
    pub fn notice(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print remote output verbatim, whatever the mode.
    pub fn text(&self, text: &str) {
        println!("{text}");
    }

    /// Print the result of a remote command.
    pub fn command_result(&self, result: &CommandOutput) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => println!("{}", result.combined()),
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "success",
                    kind: None,
                    message: None,
                    result: Some(result),
                    duration_secs: self.start_time.map(|_| self.elapsed_secs()),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print a one-line failure report, with setup guidance for configuration errors.
    pub fn failure(&self, error: &Error) {
        let kind = error.kind();
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                println!("{}", failure_message(error));
                if matches!(error, Error::Config(_)) {
                    println!();
                    print!("{SETUP_TEMPLATE}");
                }
            }
            OutputMode::Json => {
                let message = error.to_string();
                let event = JsonEvent {
                    event: "error",
                    kind: Some(kind.as_str()),
                    message: Some(&message),
                    result: None,
                    duration_secs: self.start_time.map(|_| self.elapsed_secs()),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }
}

/// One-line description of a failure, worded by kind.
pub fn failure_message(error: &Error) -> String {
    match error.kind() {
        ErrorKind::Configuration => format!("Configuration error: {error}"),
        ErrorKind::Authentication => {
            "Authentication failed. Check your credentials in .env".to_string()
        }
        ErrorKind::Transport => format!("Connection error: {error}"),
        ErrorKind::Command | ErrorKind::Protocol => format!("SSH error: {error}"),
    }
}

/// Example settings file listing the recognized keys.
pub const SETUP_TEMPLATE: &str = "Create a .env file with:
  SSH_HOST=your-server.com
  SSH_USER=username
  SSH_KEY_PATH=~/.ssh/id_rsa  # or SSH_PASSWORD=yourpass
";

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(flatten)]
    result: Option<&'a CommandOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
