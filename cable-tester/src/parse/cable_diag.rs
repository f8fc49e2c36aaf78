//! Parser for the CLI-mode `sh cable-diag` dialect.
//!
//! ```text
//! Port   |  Speed | Local pair | Pair length | Pair status
//! --------+--------+------------+-------------+---------------
//!   gi1   |  auto  |    Pair A  |    24.00    | Normal
//!                       Pair B  |    24.00    | Normal
//!                       Pair C  |     N/A     | Not Supported
//!                       Pair D  |     N/A     | Not Supported
//!   gi25  |  auto  |    Fiber
//! ```
//!
//! Each interface row starts a block; the pair rows that follow belong to
//! it until the next interface row.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::status::{normalize_status, parse_length};
use crate::model::{CablePairResult, CableTestResult, PortResults};

/// Interface cell such as `gi3 |` or `GigabitEthernet1/0/3 |`.
static INTERFACE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:gi|ge|fe|te|xe)[a-z]*(?:\d+/)*(\d+)\s*\|").unwrap());

static PAIR_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bpair\s+([a-d])\s*\|([^|]*)\|(.*)$").unwrap());

struct PortBlock {
    result: CableTestResult,
    fiber: bool,
    matched_pairs: usize,
}

impl PortBlock {
    fn new(port: u16, now: DateTime<Utc>) -> Self {
        Self {
            result: CableTestResult::new(port, now),
            fiber: false,
            matched_pairs: 0,
        }
    }

    fn is_confirmed(&self) -> bool {
        self.fiber || self.matched_pairs > 0
    }
}

/// Parse a CLI cable-diag transcript into per-port results.
///
/// Interface rows with no pair data and no fiber marker produce nothing,
/// so a truncated transcript never yields an all-default entry.
pub fn parse_cable_diag(output: &str) -> PortResults {
    let now = Utc::now();
    let mut results = PortResults::new();
    let mut current: Option<PortBlock> = None;

    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    debug!("Parsing cable diag output, {} lines", lines.len());

    for line in lines {
        if is_table_chrome(line) {
            continue;
        }

        if let Some(port) = interface_port(line) {
            flush(&mut results, current.take());
            debug!("Found port {} in line: {}", port, line);
            current = Some(PortBlock::new(port, now));
        }

        let Some(block) = current.as_mut() else {
            continue;
        };

        if block.fiber {
            continue;
        }

        if line.to_lowercase().contains("fiber") {
            debug!("Port {} is fiber", block.result.port);
            block.result.mark_fiber();
            block.fiber = true;
            continue;
        }

        if let Some((index, pair)) = pair_row(line) {
            block.result.set_pair(index, pair);
            block.matched_pairs += 1;
        }
    }
    flush(&mut results, current);

    if results.is_empty() {
        warn!("Could not parse CLI cable-diag output ({} bytes)", output.len());
        debug!("Unparsed cable-diag output: {:?}", output);
    } else {
        debug!("Parsed {} port results", results.len());
    }
    results
}

fn flush(results: &mut PortResults, block: Option<PortBlock>) {
    if let Some(block) = block {
        if block.is_confirmed() {
            results.insert(block.result.port, block.result);
        } else {
            debug!("Port {} block had no pair data", block.result.port);
        }
    }
}

/// Header, separator and prompt-echo lines carry no data.
fn is_table_chrome(line: &str) -> bool {
    line.starts_with(['-', '='])
        || line.contains("--------")
        || line.to_lowercase().starts_with("port")
}

fn interface_port(line: &str) -> Option<u16> {
    INTERFACE_ROW
        .captures(line)
        .and_then(|caps| caps[1].parse::<u16>().ok())
        .filter(|p| *p > 0)
}

/// Match a `Pair X | length | status` cell group.
fn pair_row(line: &str) -> Option<(usize, CablePairResult)> {
    let caps = PAIR_ROW.captures(line)?;
    let index = match caps[1].to_ascii_uppercase().as_str() {
        "A" => 1,
        "B" => 2,
        "C" => 3,
        "D" => 4,
        _ => return None,
    };
    let length = parse_length(&caps[2]);
    let status = normalize_status(&caps[3]);
    Some((index, CablePairResult::new(status, length)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PairStatus;

    const TRANSCRIPT: &str = "\
(UBNT) >sh cable-diag int gi1
Port   |  Speed | Local pair | Pair length | Pair status
--------+--------+------------+-------------+---------------
  gi1   |  auto  |    Pair A  |    24.00    | Normal
                      Pair B  |    24.00    | Normal
                      Pair C  |     N/A     | Not Supported
                      Pair D  |     N/A     | Not Supported
(UBNT) >sh cable-diag int gi2
Port   |  Speed | Local pair | Pair length | Pair status
--------+--------+------------+-------------+---------------
  gi2   |  auto  |    Pair A  |     3.00    | Open
                      Pair B  |     3.00    | Short
                      Pair C  |    12.00    | Impedance Mismatch
                      Pair D  |    12.00    | Normal
";

    #[test]
    fn test_two_port_transcript() {
        let results = parse_cable_diag(TRANSCRIPT);
        assert_eq!(results.len(), 2);

        let gi1 = &results[&1];
        assert_eq!(gi1.pairs[0], CablePairResult::new(PairStatus::Ok, Some(24.0)));
        assert_eq!(gi1.pairs[1].status, PairStatus::Ok);
        assert_eq!(gi1.pairs[2], CablePairResult::new(PairStatus::NotTested, None));
        assert_eq!(gi1.pairs[3].status, PairStatus::NotTested);

        let gi2 = &results[&2];
        assert_eq!(gi2.pairs[0], CablePairResult::new(PairStatus::Open, Some(3.0)));
        assert_eq!(gi2.pairs[1].status, PairStatus::Short);
        assert_eq!(gi2.pairs[2].status, PairStatus::Unknown);
        assert_eq!(gi2.pairs[2].length_m, None);
        assert_eq!(gi2.pairs[3].length_m, Some(12.0));
    }

    #[test]
    fn test_absent_length() {
        let results = parse_cable_diag(
            "gi3 | auto | Pair A | 24.00 | Normal\n\
             Pair B | N/A | Open",
        );
        let gi3 = &results[&3];
        assert_eq!(gi3.pairs[0].status, PairStatus::Ok);
        assert_eq!(gi3.pairs[0].length_m, Some(24.0));
        assert_eq!(gi3.pairs[1].status, PairStatus::Open);
        assert_eq!(gi3.pairs[1].length_m, None);
        assert_eq!(gi3.pairs[2].status, PairStatus::NotTested);
    }

    #[test]
    fn test_fiber_block_short_circuits_pairs() {
        let results = parse_cable_diag(
            "gi25 | auto | Fiber\n\
             Pair A | 5.00 | Normal\n\
             gi26 | auto | Pair A | 2.00 | Open\n\
             Medium: fiber\n\
             Pair B | 2.00 | Open\n",
        );

        for port in [25, 26] {
            let result = &results[&port];
            assert!(result.is_fiber(), "port {} should be fiber", port);
            assert!(result.pairs.iter().all(|p| p.length_m.is_none()));
        }
    }

    #[test]
    fn test_long_interface_names() {
        let results = parse_cable_diag("GigabitEthernet1/0/7 | 1000 | Pair C | 50.5 | good");
        assert_eq!(results[&7].pairs[2], CablePairResult::new(PairStatus::Ok, Some(50.5)));
    }

    #[test]
    fn test_header_without_pairs_is_dropped() {
        let results = parse_cable_diag("gi4 | auto |\n(UBNT) >exit\n");
        assert!(results.is_empty());
    }

    #[test]
    fn test_garbage_and_empty() {
        assert!(parse_cable_diag("").is_empty());
        assert!(parse_cable_diag("Terminated\n% Invalid input\nPair A | 1 | OK").is_empty());
    }
}
