//! Parser for the legacy flat-mode `cable-test show` dialect.
//!
//! Firmware builds disagree on the layout, so the parser holds an ordered
//! list of strategies and the first one that yields results wins:
//!
//! 1. **rows**: one line per port.
//!    ```text
//!    Port   Pair(A) Status   Length   Pair(B) Status   Length ...
//!    1      OK               45m      OK               45m    ...
//!    ```
//! 2. **blocks**: a port header followed by one line per pair.
//!    ```text
//!    Port 1
//!    Pair A: OK 12m
//!    Pair B: Open 4m
//!    ```

use chrono::{DateTime, Utc};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::status::{is_absent, normalize_status, parse_length};
use crate::model::{CablePairResult, CableTestResult, PairStatus, PortResults};

static ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s+(.*)$").unwrap());
static PORT_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bport\s*(\d+)\b").unwrap());
static BARE_PORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)$").unwrap());
static PAIR_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpair\s*([a-d1-4])\b").unwrap());

/// One parse attempt over the trimmed, non-empty lines of the output.
/// `None` means the layout did not match.
type Strategy = fn(&[&str], DateTime<Utc>) -> Option<PortResults>;

const STRATEGIES: [(&str, Strategy); 2] = [("rows", parse_rows), ("blocks", parse_blocks)];

/// Parse legacy cable-test output into per-port results.
pub fn parse_cable_table(output: &str) -> PortResults {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let now = Utc::now();

    for (name, strategy) in STRATEGIES {
        if let Some(results) = strategy(&lines, now) {
            debug!("Cable table parsed with '{}' strategy: {} ports", name, results.len());
            return results;
        }
    }

    warn!("Could not parse any cable test results ({} bytes)", output.len());
    debug!("Unparsed cable test output: {:?}", output);
    PortResults::new()
}

fn non_empty(results: PortResults) -> Option<PortResults> {
    (!results.is_empty()).then_some(results)
}

fn parse_rows(lines: &[&str], now: DateTime<Utc>) -> Option<PortResults> {
    let mut results = PortResults::new();

    for line in lines {
        if line.starts_with(['-', '=']) || is_column_header(line) {
            continue;
        }
        let Some(caps) = ROW.captures(line) else {
            continue;
        };
        let Ok(port) = caps[1].parse::<u16>() else {
            continue;
        };

        let pairs = extract_pairs(&caps[2]);
        if pairs.is_empty() {
            continue;
        }

        let mut result = CableTestResult::new(port, now);
        for (i, pair) in pairs.into_iter().enumerate() {
            result.set_pair(i + 1, pair);
        }
        results.insert(port, result);
    }

    non_empty(results)
}

fn is_column_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.starts_with("port") && lower.contains("pair") && lower.contains("status")
}

fn parse_blocks(lines: &[&str], now: DateTime<Utc>) -> Option<PortResults> {
    let mut results = PortResults::new();
    let mut current: Option<CableTestResult> = None;

    for line in lines {
        let header = PORT_HEADER
            .captures(line)
            .or_else(|| BARE_PORT.captures(line))
            .and_then(|caps| caps[1].parse::<u16>().ok());
        if let Some(port) = header {
            if let Some(done) = current.take() {
                keep_block(&mut results, done);
            }
            current = Some(
                results
                    .remove(&port)
                    .unwrap_or_else(|| CableTestResult::new(port, now)),
            );
            continue;
        }

        let Some(result) = current.as_mut() else {
            continue;
        };

        let pairs = extract_pairs(line);
        if pairs.is_empty() {
            continue;
        }

        if let Some(index) = pair_label(line) {
            result.set_pair(index, pairs[0]);
            continue;
        }

        for pair in pairs {
            if !result.fill_next_pair(pair) {
                break;
            }
        }
    }
    if let Some(done) = current {
        keep_block(&mut results, done);
    }

    non_empty(results)
}

/// Blocks that never received a pair line are not results.
fn keep_block(results: &mut PortResults, block: CableTestResult) {
    if block.has_data() {
        results.insert(block.port, block);
    } else {
        debug!("Port {} block had no pair data", block.port);
    }
}

fn pair_label(line: &str) -> Option<usize> {
    let caps = PAIR_LABEL.captures(line)?;
    match caps[1].to_ascii_lowercase().as_str() {
        "a" | "1" => Some(1),
        "b" | "2" => Some(2),
        "c" | "3" => Some(3),
        "d" | "4" => Some(4),
        _ => None,
    }
}

fn is_status_token(token: &str) -> bool {
    normalize_status(token) != PairStatus::Unknown
}

/// Scan tokens positionally for up to four `status [length]` groups.
///
/// Handles `OK 45m OK 45m ...`, `OK 45 OK 45 ...` and
/// `Open 15m Short 3m N/A N/A N/A N/A`. A sentinel after a status is
/// consumed as that status's absent length.
fn extract_pairs(text: &str) -> Vec<CablePairResult> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut pairs = Vec::with_capacity(4);
    let mut i = 0;

    while i < tokens.len() && pairs.len() < 4 {
        let token = tokens[i];
        i += 1;
        if !is_status_token(token) {
            continue;
        }
        let status = normalize_status(token);

        let mut length = None;
        if let Some(next) = tokens.get(i) {
            if is_absent(next) {
                i += 1;
            } else if !is_status_token(next) {
                length = parse_length(next);
                if length.is_some() {
                    i += 1;
                }
            }
        }

        pairs.push(CablePairResult::new(status, length));
    }

    pairs
}
