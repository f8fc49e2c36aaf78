//! Switch drivers.
//!
//! The driver layer owns the connection to one switch and speaks its two
//! shell modes: flat commands over exec channels and batched CLI sessions
//! over an interactive PTY.

mod builder;
mod cli;
mod session;

pub use builder::DriverBuilder;
pub use cli::run_cli_session;
pub use session::SshDriver;

use std::future::Future;
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};
use crate::model::{PortStatuses, SwitchIdentity};
use crate::parse::{parse_port_count, parse_port_statuses, parse_switch_identity};
use crate::profile::SwitchProfile;

/// Trait for switch drivers.
///
/// The required methods move bytes; the provided ones run the profile's
/// flat-mode info commands and parse what comes back.
pub trait SwitchDriver: Send {
    /// Open the connection to the switch.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection. Calling this with no connection is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Run one flat-mode command and return its stdout.
    ///
    /// Reconnects first if the previous connection was found closed. A
    /// failure while the command runs is returned as-is and leaves the
    /// connection to be rebuilt by the next call.
    fn run_command(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Run a batch of CLI-mode commands in one interactive session and
    /// return the collected transcript.
    ///
    /// `timeout` bounds the read loop after the last command is written.
    fn run_cli_commands(
        &mut self,
        commands: &[String],
        timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Get the switch profile.
    fn profile(&self) -> &SwitchProfile;

    /// Check if the underlying session is still alive.
    fn is_alive(&self) -> bool;

    /// Number of ports, from the highest index in the port table.
    fn port_count(&mut self) -> impl Future<Output = Result<u16>> + Send {
        async move {
            let command = self.profile().port_show_command.clone();
            let timeout = self.profile().command_timeout;
            let output = self.run_command(&command, timeout).await?;
            Ok(parse_port_count(&output))
        }
    }

    /// Switch identity from the system info command.
    ///
    /// A failed command yields the default identity; connection errors
    /// are still returned.
    fn switch_identity(&mut self) -> impl Future<Output = Result<SwitchIdentity>> + Send {
        async move {
            let command = self.profile().system_info_command.clone();
            let timeout = self.profile().command_timeout;
            match self.run_command(&command, timeout).await {
                Ok(output) => Ok(parse_switch_identity(&output)),
                Err(Error::Command(e)) => {
                    debug!("System info unavailable, using defaults: {}", e);
                    Ok(SwitchIdentity::default())
                }
                Err(e) => Err(e),
            }
        }
    }

    /// Current link status of every port in the port table.
    fn port_statuses(&mut self) -> impl Future<Output = Result<PortStatuses>> + Send {
        async move {
            let command = self.profile().port_show_command.clone();
            let timeout = self.profile().command_timeout;
            let output = self.run_command(&command, timeout).await?;
            Ok(parse_port_statuses(&output))
        }
    }
}
