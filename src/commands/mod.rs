// ABOUTME: Command module aggregator for the ssh-connect CLI.
// ABOUTME: Re-exports the exec and shell command handlers.

mod exec;
mod shell;

pub use exec::exec_command;
pub use shell::shell_command;

use ssh_connect::ssh::Session;

/// Close the session; a failure here only warrants a warning.
async fn close_session(session: &mut Session) {
    if let Err(e) = session.close().await {
        tracing::warn!(
            "SSH disconnect failed for {}: {}",
            session.config().host,
            e
        );
    }
}
