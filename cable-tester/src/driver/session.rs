//! SSH-backed switch driver.

use std::time::Duration;

use log::{debug, info};

use super::SwitchDriver;
use super::cli::run_cli_session;
use crate::error::{CommandError, Error, Result};
use crate::profile::SwitchProfile;
use crate::transport::{SshTransport, SwitchConfig, SwitchTransport};

/// Driver owning one SSH connection to a switch.
///
/// The connection is opened lazily and rebuilt on the next call after it
/// closes or a command fails on it. Nothing is retried in place.
///
/// Generic over the transport so the connection policy can be exercised
/// without a switch; the default is russh.
pub struct SshDriver<T = SshTransport> {
    /// SSH configuration.
    config: SwitchConfig,

    /// Switch profile.
    profile: SwitchProfile,

    /// SSH transport (None when disconnected).
    transport: Option<T>,
}

impl<T: SwitchTransport> SshDriver<T> {
    /// Create a new driver. Does not connect.
    pub fn new(config: SwitchConfig, profile: SwitchProfile) -> Self {
        Self {
            config,
            profile,
            transport: None,
        }
    }

    /// Get the connection settings.
    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    /// Make sure a live transport exists, reconnecting if needed.
    async fn ensure_connected(&mut self) -> Result<&mut T> {
        if self.transport.as_ref().is_some_and(|t| t.is_closed()) {
            debug!("Connection to {} closed, reconnecting", self.config.socket_addr());
            self.transport = None;
        }

        let transport = match self.transport.take() {
            Some(transport) => transport,
            None => T::connect(&self.config).await?,
        };
        Ok(self.transport.insert(transport))
    }

    /// Drop the connection after a failure so the next call reconnects.
    ///
    /// An empty CLI transcript says nothing about the session itself, so
    /// that one case keeps the connection.
    fn invalidate(&mut self, err: &Error) {
        if matches!(err, Error::Command(CommandError::NoOutput { .. })) {
            return;
        }
        if self.transport.take().is_some() {
            debug!("Dropping connection to {} after error: {}", self.config.host, err);
        }
    }
}

impl<T: SwitchTransport> SwitchDriver for SshDriver<T> {
    async fn open(&mut self) -> Result<()> {
        self.ensure_connected().await?;
        info!("Connected to {}", self.config.socket_addr());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }

    async fn run_command(&mut self, command: &str, timeout: Duration) -> Result<String> {
        let transport = self.ensure_connected().await?;

        debug!("Sending command: {}", command);
        let result = transport.exec(command, timeout).await;

        match result {
            Ok(output) => {
                debug!("'{}' returned {} bytes", command, output.len());
                Ok(output)
            }
            Err(e) => {
                self.invalidate(&e);
                Err(e)
            }
        }
    }

    async fn run_cli_commands(&mut self, commands: &[String], timeout: Duration) -> Result<String> {
        let transport = self.ensure_connected().await?;

        let mut shell = match transport.open_shell().await {
            Ok(shell) => shell,
            Err(e) => {
                self.invalidate(&e);
                return Err(e);
            }
        };

        debug!(
            "Running {} CLI commands on {} (read timeout {:?})",
            commands.len(),
            self.config.host,
            timeout
        );
        let result = run_cli_session(&mut shell, &self.profile, commands, timeout).await;

        if let Err(e) = &result {
            self.invalidate(e);
        }
        result
    }

    fn profile(&self) -> &SwitchProfile {
        &self.profile
    }

    fn is_alive(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| !t.is_closed())
    }
}
