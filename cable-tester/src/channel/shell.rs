//! Interactive shell channel abstraction.

use std::future::Future;

use bytes::Bytes;
use log::trace;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use crate::error::ChannelError;

/// A PTY-backed interactive shell the CLI session driver writes to and
/// reads from.
///
/// Implemented by [`SshShell`] for real switches; tests drive the CLI
/// protocol through scripted implementations.
pub trait ShellChannel: Send {
    /// Write raw bytes to the shell's stdin.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Wait for the next chunk of output.
    ///
    /// Returns `Ok(None)` once the remote side has closed the stream, and
    /// [`ChannelError::Closed`] if the session went away without closing it.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Option<Bytes>, ChannelError>> + Send;

    /// Close the channel. Safe to call after end-of-stream.
    fn close(&mut self) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// What one channel message means to a reader of the shell.
enum ShellEvent {
    Output(Bytes),
    End,
    Ignore,
}

/// Classify a channel message. The remote closing the channel is a clean
/// end; the stream stopping without that means the session was lost.
fn shell_event(msg: Option<ChannelMsg>) -> Result<ShellEvent, ChannelError> {
    match msg {
        Some(ChannelMsg::Data { data }) | Some(ChannelMsg::ExtendedData { data, .. }) => {
            Ok(ShellEvent::Output(Bytes::copy_from_slice(&data)))
        }
        Some(ChannelMsg::ExitStatus { exit_status }) => {
            trace!("shell exited with status {}", exit_status);
            Ok(ShellEvent::Ignore)
        }
        Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) => Ok(ShellEvent::End),
        None => Err(ChannelError::Closed),
        Some(_) => Ok(ShellEvent::Ignore),
    }
}

/// Interactive shell over a russh session channel.
pub struct SshShell {
    channel: Channel<Msg>,
    eof: bool,
}

impl SshShell {
    pub(crate) fn new(channel: Channel<Msg>) -> Self {
        Self {
            channel,
            eof: false,
        }
    }
}

impl ShellChannel for SshShell {
    async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        if self.eof {
            return Err(ChannelError::Closed);
        }
        self.channel.data(data).await.map_err(ChannelError::Ssh)
    }

    async fn read_chunk(&mut self) -> Result<Option<Bytes>, ChannelError> {
        if self.eof {
            return Ok(None);
        }
        loop {
            let event = shell_event(self.channel.wait().await);
            match event {
                Ok(ShellEvent::Output(chunk)) => return Ok(Some(chunk)),
                Ok(ShellEvent::Ignore) => {}
                Ok(ShellEvent::End) => {
                    self.eof = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.eof = true;
                    return Err(e);
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if self.eof {
            return Ok(());
        }
        self.eof = true;
        self.channel.close().await.map_err(ChannelError::Ssh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_close_is_clean_end() {
        assert!(matches!(shell_event(Some(ChannelMsg::Eof)), Ok(ShellEvent::End)));
        assert!(matches!(shell_event(Some(ChannelMsg::Close)), Ok(ShellEvent::End)));
        assert!(matches!(
            shell_event(Some(ChannelMsg::ExitStatus { exit_status: 0 })),
            Ok(ShellEvent::Ignore)
        ));
    }

    #[test]
    fn test_lost_session_is_error() {
        assert!(matches!(shell_event(None), Err(ChannelError::Closed)));
    }
}
