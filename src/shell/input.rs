// ABOUTME: Local keyboard input for the interactive shell.
// ABOUTME: Lines are read on a background thread and polled with a bound or awaited.

use std::io::{self, BufRead};
use std::time::Duration;
use tokio::sync::mpsc;

/// How long a readiness poll waits for a line.
pub const POLL_BOUND: Duration = Duration::from_millis(100);

/// Pause after forwarding a line in blocking mode, before draining output.
pub const BLOCKING_SETTLE: Duration = Duration::from_millis(500);

/// Strategy for reading keyboard input, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Wait at most `bound` for a line, then go back to draining output.
    Poll { bound: Duration },
    /// Wait for a full line, then pause for `settle` and drain output.
    Blocking { settle: Duration },
}

impl InputMode {
    pub fn polling() -> Self {
        InputMode::Poll { bound: POLL_BOUND }
    }

    pub fn blocking() -> Self {
        InputMode::Blocking {
            settle: BLOCKING_SETTLE,
        }
    }

    /// Readiness polling where a background reader thread can feed stdin,
    /// blocking reads elsewhere.
    pub fn detect() -> Self {
        if cfg!(any(unix, windows)) {
            Self::polling()
        } else {
            Self::blocking()
        }
    }
}

/// Result of asking the keyboard for input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A line, including its trailing newline if one was typed.
    Line(String),
    /// Nothing arrived within the poll bound.
    Idle,
    /// End of input.
    Closed,
}

/// Line-oriented keyboard input.
pub struct Keyboard {
    lines: mpsc::Receiver<io::Result<String>>,
}

impl Keyboard {
    /// Read lines from the process's standard input.
    pub fn stdin() -> Self {
        Self::from_reader(io::BufReader::new(io::stdin()))
    }

    /// Read lines from any buffered reader on a dedicated thread.
    ///
    /// The thread exits at end of input or once the `Keyboard` is dropped
    /// and the next line arrives.
    pub fn from_reader<R>(mut reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);

        std::thread::spawn(move || {
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.blocking_send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.blocking_send(Err(e));
                        break;
                    }
                }
            }
        });

        Self { lines: rx }
    }

    /// Wait for the next line according to `mode`.
    pub async fn next(&mut self, mode: InputMode) -> io::Result<InputEvent> {
        match mode {
            InputMode::Poll { bound } => self.poll_line(bound).await,
            InputMode::Blocking { .. } => self.read_line().await,
        }
    }

    /// Wait at most `bound` for a line.
    pub async fn poll_line(&mut self, bound: Duration) -> io::Result<InputEvent> {
        match tokio::time::timeout(bound, self.lines.recv()).await {
            Ok(received) => Self::event(received),
            Err(_) => Ok(InputEvent::Idle),
        }
    }

    /// Wait for a line with no bound.
    pub async fn read_line(&mut self) -> io::Result<InputEvent> {
        Self::event(self.lines.recv().await)
    }

    fn event(received: Option<io::Result<String>>) -> io::Result<InputEvent> {
        match received {
            Some(Ok(line)) => Ok(InputEvent::Line(line)),
            Some(Err(e)) => Err(e),
            None => Ok(InputEvent::Closed),
        }
    }
}
