//! Builder for creating switch drivers.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::session::SshDriver;
use crate::error::{ConfigError, Result};
use crate::profile::{SwitchProfile, unifi};
use crate::transport::config::{
    AuthMethod, DEFAULT_SSH_PORT, DEFAULT_USERNAME, HostKeyVerification, SwitchConfig,
};

/// Builder for constructing switch drivers.
///
/// # Example
///
/// ```rust,no_run
/// use cable_tester::driver::{DriverBuilder, SwitchDriver};
///
/// # async fn example() -> Result<(), cable_tester::Error> {
/// let mut driver = DriverBuilder::new("192.168.1.2")
///     .username("admin")
///     .password("secret")
///     .build()?;
///
/// driver.open().await?;
/// let ports = driver.port_count().await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: String,
    password: Option<SecretString>,
    private_key: Option<(PathBuf, Option<SecretString>)>,
    profile: Option<SwitchProfile>,
    timeout: Duration,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DriverBuilder {
    /// Create a new driver builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: DEFAULT_USERNAME.to_string(),
            password: None,
            private_key: None,
            profile: None,
            timeout: Duration::from_secs(10),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication (default: "admin").
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        let password: String = password.into();
        self.password = Some(SecretString::from(password));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.private_key = Some((key_path.into(), None));
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        let passphrase: String = passphrase.into();
        let passphrase = SecretString::from(passphrase);
        self.private_key = Some((key_path.into(), Some(passphrase)));
        self
    }

    /// Set the switch profile (default: UniFi).
    pub fn profile(mut self, profile: SwitchProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set terminal dimensions for the CLI-mode PTY.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set host key verification mode.
    ///
    /// Default is [`HostKeyVerification::AcceptNew`].
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Set a custom known_hosts file path.
    ///
    /// Default is `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the driver.
    ///
    /// This creates the driver but does not connect. Exactly one of
    /// [`password`](Self::password) or a private key must have been set.
    pub fn build(self) -> Result<SshDriver> {
        if self.host.trim().is_empty() {
            return Err(invalid("Host is required"));
        }
        if self.username.is_empty() {
            return Err(invalid("Username is required"));
        }

        let auth = match (self.password, self.private_key) {
            (Some(password), None) => AuthMethod::Password(password),
            (None, Some((path, passphrase))) => AuthMethod::PrivateKey { path, passphrase },
            (None, None) => return Err(invalid("A password or private key is required")),
            (Some(_), Some(_)) => {
                return Err(invalid("Only one of password or private key may be set"));
            }
        };

        let config = SwitchConfig {
            host: self.host,
            port: self.port,
            username: self.username,
            auth,
            connect_timeout: self.timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        Ok(SshDriver::new(
            config,
            self.profile.unwrap_or_else(unifi::profile),
        ))
    }
}

fn invalid(message: &str) -> crate::Error {
    ConfigError::InvalidConfig {
        message: message.to_string(),
    }
    .into()
}
