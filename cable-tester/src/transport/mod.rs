//! SSH transport layer wrapping russh.
//!
//! This module owns the single authenticated connection to a switch:
//! connection setup, authentication, flat-mode exec and opening the
//! PTY-backed shell used by CLI mode.

pub mod config;
mod ssh;

use std::future::Future;
use std::time::Duration;

pub use config::{
    AuthMethod, DEFAULT_SSH_PORT, DEFAULT_USERNAME, HostKeyVerification, SwitchConfig,
};
pub use ssh::SshTransport;

use crate::channel::ShellChannel;
use crate::error::Result;

/// One authenticated connection to a switch.
///
/// [`SshDriver`](crate::driver::SshDriver) owns at most one of these and
/// decides when to throw it away and connect again.
pub trait SwitchTransport: Send + Sized {
    /// Interactive shell opened for CLI mode.
    type Shell: ShellChannel;

    /// Connect and authenticate.
    fn connect(config: &SwitchConfig) -> impl Future<Output = Result<Self>> + Send;

    /// Run one flat-mode command and return its stdout.
    ///
    /// A connection lost before the command finished is an error, never a
    /// short result.
    fn exec(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Open a PTY-backed interactive shell on this connection.
    fn open_shell(&mut self) -> impl Future<Output = Result<Self::Shell>> + Send;

    /// Whether the connection has been closed underneath us.
    fn is_closed(&self) -> bool;

    /// Close the connection gracefully.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}
