//! Parsers for switch command output.
//!
//! Every parser is a pure function over text that has already had its
//! terminal escape sequences removed. None of them fail: unrecognised
//! input produces an empty or default value and a log line.

mod cable_diag;
mod cable_table;
mod identity;
mod ports;
mod status;

pub use cable_diag::parse_cable_diag;
pub use cable_table::parse_cable_table;
pub use identity::parse_switch_identity;
pub use ports::{format_speed, parse_port_count, parse_port_statuses};
pub use status::normalize_status;

use crate::model::PortResults;
use crate::profile::DiagnosticDialect;

/// Parse cable diagnostic output with the parser for `dialect`.
pub fn parse_cable_results(dialect: DiagnosticDialect, output: &str) -> PortResults {
    match dialect {
        DiagnosticDialect::Cli => parse_cable_diag(output),
        DiagnosticDialect::Legacy => parse_cable_table(output),
    }
}
