// ABOUTME: Shell command implementation.
// ABOUTME: Relays an interactive remote shell to the local terminal.

use super::close_session;
use ssh_connect::config::ConnectionConfig;
use ssh_connect::error::Result;
use ssh_connect::output::Output;
use ssh_connect::shell::{InputMode, interactive_shell};
use ssh_connect::ssh::Session;

/// Open an interactive shell and relay it until the user leaves.
pub async fn shell_command(
    config: ConnectionConfig,
    mode: InputMode,
    output: &Output,
) -> Result<()> {
    let mut session = Session::connect(config.session_config()).await?;
    tracing::debug!("Input mode: {:?}", mode);

    let result = interactive_shell(&session, mode, output).await;

    close_session(&mut session).await;
    let end = result?;
    tracing::debug!("Shell relay ended: {:?}", end);
    Ok(())
}
