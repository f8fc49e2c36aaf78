//! Switch profiles.
//!
//! A profile carries the command vocabulary a switch family understands,
//! which diagnostic dialect it speaks and how fast its CLI may be driven.

mod definition;
mod timing;
pub mod unifi;

pub use definition::{DiagnosticDialect, SwitchProfile};
pub use timing::CliTiming;
