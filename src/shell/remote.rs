// ABOUTME: Remote side of the interactive shell relay.
// ABOUTME: Wraps a russh channel behind a non-blocking, chunked read interface.

use crate::ssh::{Error, Result};
use async_trait::async_trait;
use futures::FutureExt;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

/// Largest chunk of remote output handed out per read.
pub const CHUNK_SIZE: usize = 1024;

/// What a non-blocking read found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ready {
    Data(Vec<u8>),
    Empty,
    Closed,
}

/// A duplex byte stream to a remote shell.
#[async_trait]
pub trait RemoteShell: Send {
    /// Return output the remote has already delivered, at most `max` bytes,
    /// without waiting for more.
    fn try_read(&mut self, max: usize) -> Ready;

    /// Send bytes to the remote shell's input.
    async fn send(&mut self, data: &[u8]) -> Result<()>;
}

/// Interactive shell channel on an SSH session.
pub struct ShellChannel {
    channel: Channel<Msg>,
    pending: Vec<u8>,
    closed: bool,
}

impl ShellChannel {
    pub fn new(channel: Channel<Msg>) -> Self {
        Self {
            channel,
            pending: Vec::new(),
            closed: false,
        }
    }

    /// Move every message russh has already queued into `pending`.
    fn pull_ready(&mut self) {
        while !self.closed {
            match self.channel.wait().now_or_never() {
                None => break,
                Some(Some(ChannelMsg::Data { data })) => self.pending.extend_from_slice(&data),
                Some(Some(ChannelMsg::ExtendedData { data, .. })) => {
                    self.pending.extend_from_slice(&data)
                }
                Some(Some(ChannelMsg::ExitStatus { exit_status })) => {
                    tracing::debug!("Remote shell exited with status {}", exit_status);
                }
                Some(Some(ChannelMsg::Eof | ChannelMsg::Close)) | Some(None) => {
                    tracing::debug!("Remote shell channel closed");
                    self.closed = true;
                }
                Some(Some(_)) => {}
            }
        }
    }

    /// Signal end of input and close the channel. Errors are only logged.
    pub async fn close(self) {
        if let Err(e) = self.channel.eof().await {
            tracing::debug!("Failed to send EOF on shell channel: {}", e);
        }
        if let Err(e) = self.channel.close().await {
            tracing::debug!("Failed to close shell channel: {}", e);
        }
    }
}

#[async_trait]
impl RemoteShell for ShellChannel {
    fn try_read(&mut self, max: usize) -> Ready {
        if self.pending.is_empty() {
            self.pull_ready();
        }
        take_chunk(&mut self.pending, max, self.closed)
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.channel.data(data).await.map_err(Error::Protocol)
    }
}

/// Split off up to `max` bytes of buffered output.
pub(crate) fn take_chunk(pending: &mut Vec<u8>, max: usize, closed: bool) -> Ready {
    if pending.is_empty() {
        return if closed { Ready::Closed } else { Ready::Empty };
    }
    let n = pending.len().min(max);
    Ready::Data(pending.drain(..n).collect())
}
