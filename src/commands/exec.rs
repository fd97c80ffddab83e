// ABOUTME: Exec command implementation.
// ABOUTME: Runs one command on the remote host and prints its output.

use super::close_session;
use ssh_connect::config::ConnectionConfig;
use ssh_connect::error::Result;
use ssh_connect::output::{Output, OutputMode};
use ssh_connect::ssh::Session;
use std::time::Duration;

/// Run `command` remotely and print the merged output, or the structured
/// result in JSON mode.
pub async fn exec_command(
    config: ConnectionConfig,
    command: &str,
    timeout: Duration,
    output: &mut Output,
) -> Result<()> {
    let mut session = Session::connect(config.session_config().command_timeout(timeout)).await?;
    tracing::debug!("Running {:?} on {}", command, config.host);

    output.start_timer();
    let result = session.exec_with_timeout(command, timeout).await;
    if let Ok(result) = &result {
        if !result.success() {
            tracing::warn!(
                "Remote command exited with status {}",
                exit_status_label(result.exit_status)
            );
        }
        if output.mode() == OutputMode::Json {
            output.command_result(result);
        } else {
            output.text(&result.combined());
        }
    }

    close_session(&mut session).await;
    result.map(|_| ()).map_err(Into::into)
}

fn exit_status_label(status: Option<u32>) -> String {
    status.map_or_else(|| "unknown".to_string(), |code| code.to_string())
}
