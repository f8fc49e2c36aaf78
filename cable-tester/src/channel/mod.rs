//! Channel layer for the interactive CLI session.
//!
//! This module holds the byte-level shell abstraction the CLI session
//! driver talks to, and the transcript buffer that strips terminal
//! escape sequences from what the switch sends back.

mod buffer;
mod shell;

pub use buffer::TranscriptBuffer;
pub use shell::{ShellChannel, SshShell};
