//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default login used by the switch family.
pub const DEFAULT_USERNAME: &str = "admin";

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the switch
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. Switches regenerate their host
    /// key on factory reset, so lab setups often need this.
    Disabled,
}

/// Connection settings for one switch.
#[derive(Debug)]
pub struct SwitchConfig {
    /// Switch hostname or IP address.
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Login name (default: "admin").
    pub username: String,

    /// Credential used to authenticate.
    pub auth: AuthMethod,

    /// Bound on TCP connect plus SSH handshake.
    pub connect_timeout: Duration,

    /// Terminal width for the CLI-mode PTY.
    pub terminal_width: u32,

    /// Terminal height for the CLI-mode PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file. `None` uses `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
}

impl SwitchConfig {
    /// Create a configuration with defaults for everything but the
    /// host and credential.
    pub fn new(host: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: DEFAULT_USERNAME.to_string(),
            auth,
            connect_timeout: Duration::from_secs(10),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method. Exactly one is active per switch.
#[derive(Debug)]
pub enum AuthMethod {
    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}
