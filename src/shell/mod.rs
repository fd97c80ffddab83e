// ABOUTME: Interactive shell relay between the local terminal and a remote channel.
// ABOUTME: Drains remote output, then polls the keyboard, until `exit`, EOF or Ctrl-C.

mod decode;
mod input;
mod remote;

pub use decode::Utf8Decoder;
pub use input::{BLOCKING_SETTLE, InputEvent, InputMode, Keyboard, POLL_BOUND};
pub use remote::{CHUNK_SIZE, Ready, RemoteShell, ShellChannel};

use crate::error::Result;
use crate::output::Output;
use crate::ssh::Session;
use std::future::Future;
use std::io::{self, Write};

/// Why the relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// The user typed `exit`.
    ExitTyped,
    /// Local input reached end of file.
    InputClosed,
    /// The remote closed the channel.
    RemoteClosed,
    /// Interrupted by Ctrl-C.
    Interrupted,
}

/// True for a line that ends the session: `exit`, any case, surrounding whitespace ignored.
pub fn is_exit_line(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

/// Open a shell on `session` and relay it to this terminal until the user leaves.
pub async fn interactive_shell(
    session: &Session,
    mode: InputMode,
    output: &Output,
) -> Result<RelayEnd> {
    let mut shell = ShellChannel::new(session.open_shell().await?);

    let config = session.config();
    output.notice(&format!("Connected to {}@{}", config.user, config.host));
    output.notice("Type 'exit' to disconnect\n");

    let mut keyboard = Keyboard::stdin();
    let mut stdout = io::stdout();
    let end = relay_until(
        &mut shell,
        &mut keyboard,
        &mut stdout,
        mode,
        tokio::signal::ctrl_c(),
    )
    .await;

    if let Ok(RelayEnd::Interrupted) = end {
        output.notice("\nDisconnected");
    }

    shell.close().await;
    end
}

/// Run [`relay`] until it finishes or `interrupt` resolves.
pub async fn relay_until<R, W, F>(
    remote: &mut R,
    keyboard: &mut Keyboard,
    out: &mut W,
    mode: InputMode,
    interrupt: F,
) -> Result<RelayEnd>
where
    R: RemoteShell + ?Sized,
    W: Write,
    F: Future,
{
    tokio::select! {
        result = relay(remote, keyboard, out, mode) => result,
        _ = interrupt => Ok(RelayEnd::Interrupted),
    }
}

/// Relay remote output to `out` and keyboard lines to `remote`.
///
/// Each pass shows at most one chunk of ready output before asking for
/// input, so a prompt is visible before the user answers it.
pub async fn relay<R, W>(
    remote: &mut R,
    keyboard: &mut Keyboard,
    out: &mut W,
    mode: InputMode,
) -> Result<RelayEnd>
where
    R: RemoteShell + ?Sized,
    W: Write,
{
    let mut decoder = Utf8Decoder::new();
    let end = relay_loop(remote, keyboard, out, mode, &mut decoder).await;

    let tail = decoder.finish();
    if !tail.is_empty() {
        out.write_all(tail.as_bytes())?;
        out.flush()?;
    }
    end
}

async fn relay_loop<R, W>(
    remote: &mut R,
    keyboard: &mut Keyboard,
    out: &mut W,
    mode: InputMode,
    decoder: &mut Utf8Decoder,
) -> Result<RelayEnd>
where
    R: RemoteShell + ?Sized,
    W: Write,
{
    loop {
        if !show_chunk(remote, decoder, out)? {
            return Ok(RelayEnd::RemoteClosed);
        }

        let line = match keyboard.next(mode).await? {
            InputEvent::Idle => continue,
            InputEvent::Closed => return Ok(RelayEnd::InputClosed),
            InputEvent::Line(line) => line,
        };

        if is_exit_line(&line) {
            return Ok(RelayEnd::ExitTyped);
        }

        if line.ends_with('\n') {
            remote.send(line.as_bytes()).await?;
        } else {
            remote.send(format!("{line}\n").as_bytes()).await?;
        }

        if let InputMode::Blocking { settle } = mode {
            tokio::time::sleep(settle).await;
            loop {
                match remote.try_read(CHUNK_SIZE) {
                    Ready::Data(bytes) => write_text(out, &decoder.decode(&bytes))?,
                    Ready::Empty => break,
                    Ready::Closed => return Ok(RelayEnd::RemoteClosed),
                }
            }
        }
    }
}

/// Show one chunk of ready output. Returns false once the remote has closed.
fn show_chunk<R, W>(remote: &mut R, decoder: &mut Utf8Decoder, out: &mut W) -> Result<bool>
where
    R: RemoteShell + ?Sized,
    W: Write,
{
    match remote.try_read(CHUNK_SIZE) {
        Ready::Data(bytes) => {
            write_text(out, &decoder.decode(&bytes))?;
            Ok(true)
        }
        Ready::Empty => Ok(true),
        Ready::Closed => Ok(false),
    }
}

fn write_text<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(text.as_bytes())?;
    out.flush()
}
