//! Port table parsers.
//!
//! Both parsers read the flat-mode port table, which looks like:
//!
//! ```text
//!    1  U/U    100F  104575713   46802349 ...
//!   14  U/D      0H          0          0 ...
//!  U24  U/U   1000F  329265178  170170901 ...
//! ```
//!
//! The leading index may carry a `U` prefix marking an uplink port.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{PortLinkStatus, PortMedium, PortStatuses};

static PORT_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^U?(\d+)\s+(.*)$").unwrap());

/// Admin/oper pair such as `U/U` or `U/D`.
static LINK_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([UD])/([UD])\b").unwrap());

static LINK_DOWN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:down|disabled|disconnected|notconnect|not\s+connected|no\s+link)\b")
        .unwrap()
});

static LINK_UP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:up|connected|link\s*up)\b").unwrap());

/// Explicit unit, e.g. `2.5 Gbps` or `100Mbps`.
static RATE_WITH_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*([gm])bps\b").unwrap());

/// Bare Mbps with duplex suffix, e.g. `1000F` or `0H`.
static RATE_WITH_DUPLEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d+)[FH]\b").unwrap());

static FIBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:fiber|fibre|optical|sfp)").unwrap());

static COPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:copper|rj-?45|utp)\b|base-?t\b").unwrap());

/// Split a trimmed line into port index and the rest of the row.
fn port_row(line: &str) -> Option<(u16, &str)> {
    let caps = PORT_ROW.captures(line)?;
    let port = caps[1].parse::<u16>().ok().filter(|p| *p > 0)?;
    let rest = caps.get(2).map_or("", |m| m.as_str());
    Some((port, rest))
}

/// Highest port index in the port table, or 0 if no row matched.
pub fn parse_port_count(output: &str) -> u16 {
    let max_port = output
        .lines()
        .filter_map(|line| port_row(line.trim()))
        .map(|(port, _)| port)
        .max()
        .unwrap_or(0);

    if max_port == 0 {
        warn!("Could not determine port count from {} bytes of output", output.len());
        debug!("Unparsed port table: {:?}", output);
    }
    max_port
}

/// Per-port link details from the port table.
///
/// The returned map replaces any previous one; ports missing from the
/// output are simply absent.
pub fn parse_port_statuses(output: &str) -> PortStatuses {
    let mut statuses = PortStatuses::new();

    for line in output.lines() {
        let Some((port, rest)) = port_row(line.trim()) else {
            continue;
        };

        let speed_mbps = parse_speed(rest);
        statuses.insert(
            port,
            PortLinkStatus {
                port,
                connected: parse_connected(rest),
                speed_mbps,
                speed_display: speed_mbps.map(format_speed),
                medium: parse_medium(rest),
            },
        );
    }

    if statuses.is_empty() {
        warn!("No port rows found in port table output");
    }
    statuses
}

fn parse_connected(rest: &str) -> Option<bool> {
    if let Some(caps) = LINK_PAIR.captures(rest) {
        return Some(&caps[1] == "U" && &caps[2] == "U");
    }
    if LINK_DOWN.is_match(rest) {
        return Some(false);
    }
    if LINK_UP.is_match(rest) {
        return Some(true);
    }
    None
}

/// Link rate in Mbps. A zero rate means no link, not 0 Mbps.
fn parse_speed(rest: &str) -> Option<u32> {
    let mbps = if let Some(caps) = RATE_WITH_UNIT.captures(rest) {
        let value = caps[1].parse::<f64>().ok()?;
        let scale = if caps[2].eq_ignore_ascii_case("g") { 1000.0 } else { 1.0 };
        (value * scale).round() as u32
    } else {
        let caps = RATE_WITH_DUPLEX.captures(rest)?;
        caps[1].parse::<u32>().ok()?
    };
    (mbps > 0).then_some(mbps)
}

fn parse_medium(rest: &str) -> PortMedium {
    if FIBER.is_match(rest) {
        PortMedium::Fiber
    } else if COPPER.is_match(rest) {
        PortMedium::Copper
    } else {
        PortMedium::Unknown
    }
}

/// Human readable rate: whole gigabits as Gbps, anything else as Mbps.
pub fn format_speed(mbps: u32) -> String {
    if mbps >= 1000 && mbps % 1000 == 0 {
        format!("{} Gbps", mbps / 1000)
    } else {
        format!("{} Mbps", mbps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORT_TABLE: &str = "\
Port  Link    Rate    TxPackets   RxPackets
----  ----  ------  ----------  ----------
   1  U/U    100F   104575713    46802349
   2  U/U   1000F   329265178   170170901
  14  U/D      0H           0           0
 U24  U/U   1000F   329265178   170170901
";

    #[test]
    fn test_port_count_takes_max_index() {
        assert_eq!(parse_port_count(PORT_TABLE), 24);
    }

    #[test]
    fn test_port_count_no_match() {
        assert_eq!(parse_port_count(""), 0);
        assert_eq!(parse_port_count("permission denied\n"), 0);
        assert_eq!(parse_port_count("Port Link Rate\n---- ----\n"), 0);
    }

    #[test]
    fn test_gigabit_row() {
        let statuses = parse_port_statuses("1  U/U   1000F  329265178  170170901");
        let port = &statuses[&1];
        assert_eq!(port.port, 1);
        assert_eq!(port.connected, Some(true));
        assert_eq!(port.speed_mbps, Some(1000));
        assert_eq!(port.speed_display.as_deref(), Some("1 Gbps"));
    }

    #[test]
    fn test_table_rows() {
        let statuses = parse_port_statuses(PORT_TABLE);
        assert_eq!(statuses.len(), 4);

        assert_eq!(statuses[&1].speed_display.as_deref(), Some("100 Mbps"));

        // Zero rate is "no speed"
        let down = &statuses[&14];
        assert_eq!(down.connected, Some(false));
        assert_eq!(down.speed_mbps, None);
        assert_eq!(down.speed_display, None);

        // Uplink prefix is stripped
        assert_eq!(statuses[&24].connected, Some(true));
    }

    #[test]
    fn test_alternate_dialects() {
        let statuses = parse_port_statuses(
            "3  up    2.5 Gbps  copper\n\
             4  down  -         copper\n\
             25 disabled        SFP+\n\
             26 Up    10Gbps    fiber\n\
             27 ?     ?",
        );

        assert_eq!(statuses[&3].connected, Some(true));
        assert_eq!(statuses[&3].speed_mbps, Some(2500));
        assert_eq!(statuses[&3].speed_display.as_deref(), Some("2500 Mbps"));
        assert_eq!(statuses[&3].medium, PortMedium::Copper);

        assert_eq!(statuses[&4].connected, Some(false));
        assert_eq!(statuses[&25].connected, Some(false));
        assert_eq!(statuses[&25].medium, PortMedium::Fiber);

        assert_eq!(statuses[&26].speed_display.as_deref(), Some("10 Gbps"));
        assert_eq!(statuses[&26].medium, PortMedium::Fiber);

        assert_eq!(statuses[&27].connected, None);
        assert_eq!(statuses[&27].medium, PortMedium::Unknown);
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(parse_port_statuses("").is_empty());
        assert!(parse_port_statuses("\x00\x01 nonsense\n###").is_empty());
    }
}
