//! Error types for cable-tester.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for cable-tester operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors (connect, authenticate)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Command execution errors (flat or CLI mode)
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Cable test run errors
    #[error("Test error: {0}")]
    Test(#[from] TestError),

    /// Invalid driver configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether this error is a permanent authentication problem.
    ///
    /// Bad passwords, unreadable keys and rejected host keys will not fix
    /// themselves on retry.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Error::Transport(
                TransportError::AuthenticationFailed { .. }
                    | TransportError::Key(_)
                    | TransportError::HostKeyUnknown { .. }
                    | TransportError::HostKeyChanged { .. }
            )
        )
    }

    /// Whether the caller may retry with a fresh connection.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(e) => {
                !self.is_authentication() && !matches!(e, TransportError::KnownHosts(_))
            }
            Error::Command(_) => true,
            Error::Test(TestError::Failed { source, .. }) => source.is_transient(),
            Error::Test(_) | Error::Config(_) => false,
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts (strict mode)
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts file could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection attempt timed out
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),
}

/// Command execution errors.
///
/// Any of these leaves the connection marked dead so the next call
/// reconnects, except [`CommandError::NoOutput`].
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command did not finish within its timeout
    #[error("Command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// Connection or channel broke while the command was running
    #[error("Command '{command}' failed: {message}")]
    Failed { command: String, message: String },

    /// CLI session deadline passed without receiving a single byte
    #[error("CLI commands produced no output within {timeout:?}")]
    NoOutput { timeout: Duration },
}

/// Interactive channel errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Channel closed while writing
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Cable test run errors.
#[derive(Error, Debug)]
pub enum TestError {
    /// Diagnostics ran but nothing could be parsed from the output
    #[error("Cable test returned no results for {target}")]
    NoResults { target: String },

    /// An all-ports test was requested before any ports were discovered
    #[error("No ports discovered on switch")]
    NoPorts,

    /// The run failed on a transport or command error
    #[error("Cable test failed: {message}")]
    Failed {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

/// Configuration errors raised while building a driver.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Result type alias using cable-tester's Error.
pub type Result<T> = std::result::Result<T, Error>;
