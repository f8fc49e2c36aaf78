//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, trace, warn};
use russh::ChannelMsg;
use russh::client::{self, Handle};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use secrecy::ExposeSecret;

use super::SwitchTransport;
use super::config::{AuthMethod, HostKeyVerification, SwitchConfig};
use crate::channel::SshShell;
use crate::error::{CommandError, Result, TransportError};

/// One authenticated SSH connection to a switch.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    host: String,
    terminal_width: u32,
    terminal_height: u32,
}

impl SwitchTransport for SshTransport {
    type Shell = SshShell;

    /// Connect to the switch and authenticate.
    async fn connect(config: &SwitchConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config::default());

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        let mut session = tokio::time::timeout(
            config.connect_timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.connect_timeout))?
        .map_err(|e| {
            // Prefer the detailed error recorded by check_server_key over
            // the generic russh::Error::UnknownKey
            let stored = host_key_error.lock().ok().and_then(|mut slot| slot.take());
            match (stored, e) {
                (Some(hk_err), _) => hk_err,
                (None, russh::Error::IO(source)) => TransportError::ConnectionFailed {
                    host: config.host.clone(),
                    port: config.port,
                    source,
                },
                (None, e) => TransportError::Ssh(e),
            }
        })?;

        Self::authenticate(&mut session, config).await?;

        debug!("Connected to {}", config.socket_addr());

        Ok(Self {
            session,
            host: config.host.clone(),
            terminal_width: config.terminal_width,
            terminal_height: config.terminal_height,
        })
    }

    /// Run one command over a non-interactive exec channel and return stdout.
    ///
    /// stderr is logged and discarded. The whole round trip, channel open
    /// included, is bounded by `timeout`.
    async fn exec(&mut self, command: &str, timeout: Duration) -> Result<String> {
        let round_trip = async {
            let mut channel = self
                .session
                .channel_open_session()
                .await
                .map_err(|e| command_failed(command, e))?;

            channel
                .exec(true, command)
                .await
                .map_err(|e| command_failed(command, e))?;

            let mut output = ExecOutput::default();
            loop {
                let done = output
                    .push(channel.wait().await)
                    .map_err(|e| command_failed(command, e))?;
                if done {
                    break;
                }
            }

            if !output.stderr.is_empty() {
                debug!(
                    "stderr from '{}': {}",
                    command,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }

            Ok::<_, crate::Error>(String::from_utf8_lossy(&output.stdout).into_owned())
        };

        tokio::time::timeout(timeout, round_trip)
            .await
            .map_err(|_| CommandError::Timeout {
                command: command.to_string(),
                timeout,
            })?
    }

    /// Open a PTY-backed interactive shell on this connection.
    async fn open_shell(&mut self) -> Result<SshShell> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(|e| command_failed("<shell>", e))?;

        channel
            .request_pty(
                true,
                "vt100",
                self.terminal_width,
                self.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(|e| command_failed("<pty>", e))?;

        channel
            .request_shell(true)
            .await
            .map_err(|e| command_failed("<shell>", e))?;

        Ok(SshShell::new(channel))
    }

    /// Whether the session's background task has stopped.
    fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// Close the connection.
    async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        debug!("Disconnected from {}", self.host);
        Ok(())
    }
}

impl SshTransport {
    /// Authenticate with the switch.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SwitchConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                // Get the best RSA hash algorithm supported by the switch
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: format!("{}@{}", config.username, config.host),
            }
            .into());
        }

        Ok(())
    }
}

fn command_failed(command: &str, err: impl std::fmt::Display) -> CommandError {
    CommandError::Failed {
        command: command.to_string(),
        message: err.to_string(),
    }
}

/// Output of one exec channel, collected message by message.
#[derive(Default)]
struct ExecOutput {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exited: bool,
}

impl ExecOutput {
    /// Take the next channel message. `Ok(true)` once the command is done.
    ///
    /// The stream ending before EOF or an exit status means the session
    /// went away mid-command.
    fn push(&mut self, msg: Option<ChannelMsg>) -> std::result::Result<bool, &'static str> {
        match msg {
            Some(ChannelMsg::Data { data }) => {
                self.stdout.extend_from_slice(&data);
                trace!("exec stdout: {} bytes (total {})", data.len(), self.stdout.len());
                Ok(false)
            }
            Some(ChannelMsg::ExtendedData { data, ext: 1 }) => {
                self.stderr.extend_from_slice(&data);
                Ok(false)
            }
            Some(ChannelMsg::ExitStatus { exit_status }) => {
                trace!("exec exited with status {}", exit_status);
                self.exited = true;
                Ok(false)
            }
            Some(ChannelMsg::Eof) => Ok(true),
            Some(ChannelMsg::Close) | None if self.exited => Ok(true),
            Some(ChannelMsg::Close) => Err("channel closed before the command finished"),
            None => Err("connection lost before the command finished"),
            Some(_) => Ok(false),
        }
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host-key error surfaced by connect() instead of the
    /// generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, err: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(err);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    Ok(true)
                }
                Err(e) => Ok(self.reject(e)),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => Ok(self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                })),
                Err(e) => Ok(self.reject(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_finishes_on_eof_or_exit_status() {
        let mut output = ExecOutput::default();
        assert_eq!(output.push(Some(ChannelMsg::Eof)), Ok(true));

        let mut output = ExecOutput::default();
        assert_eq!(output.push(Some(ChannelMsg::ExitStatus { exit_status: 0 })), Ok(false));
        assert_eq!(output.push(Some(ChannelMsg::Close)), Ok(true));

        let mut output = ExecOutput::default();
        assert_eq!(output.push(Some(ChannelMsg::ExitStatus { exit_status: 1 })), Ok(false));
        assert_eq!(output.push(None), Ok(true));
    }

    #[test]
    fn test_exec_lost_connection_is_an_error() {
        let mut output = ExecOutput::default();
        assert!(output.push(None).is_err());

        let mut output = ExecOutput::default();
        assert!(output.push(Some(ChannelMsg::Close)).is_err());
    }
}
