//! System info parser.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::SwitchIdentity;

static MAC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[0-9a-fA-F]{2}[:-]){5}[0-9a-fA-F]{2}").unwrap());

/// Cisco-style dotted or bare 12-digit hex.
static MAC_COMPACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([0-9a-fA-F]{4})\.?([0-9a-fA-F]{4})\.?([0-9a-fA-F]{4})\b").unwrap()
});

const HOSTNAME_KEYS: &[&str] = &["hostname", "host name", "system name", "device name"];
const MODEL_KEYS: &[&str] = &["model", "board name", "product"];
const VERSION_KEYS: &[&str] = &["version", "firmware"];
const MAC_KEYS: &[&str] = &["mac"];

#[derive(Clone, Copy)]
enum Field {
    Hostname,
    Model,
    Version,
    Mac,
}

impl Field {
    /// Field a line describes. Earlier fields take precedence when a line
    /// mentions several keywords.
    fn classify(lowered: &str) -> Option<Self> {
        let has = |keys: &[&str]| keys.iter().any(|k| lowered.contains(k));
        if has(HOSTNAME_KEYS) {
            Some(Field::Hostname)
        } else if has(MODEL_KEYS) {
            Some(Field::Model)
        } else if has(VERSION_KEYS) {
            Some(Field::Version)
        } else if has(MAC_KEYS) {
            Some(Field::Mac)
        } else {
            None
        }
    }
}

/// Parse system info output into a [`SwitchIdentity`].
///
/// Fields missing from the output keep their defaults. When a field
/// appears on several lines the first one wins.
pub fn parse_switch_identity(output: &str) -> SwitchIdentity {
    let mut hostname = None;
    let mut model = None;
    let mut version = None;
    let mut mac = None;

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lowered = line.to_lowercase();
        let Some(field) = Field::classify(&lowered) else {
            continue;
        };

        match field {
            Field::Hostname if hostname.is_none() => hostname = value_after_delim(line),
            Field::Model if model.is_none() => model = value_after_delim(line),
            Field::Version if version.is_none() => version = value_after_delim(line),
            // MAC lines do not always follow "key: value", so search the
            // whole line before falling back to the value
            Field::Mac if mac.is_none() => {
                mac = find_mac(line).or_else(|| value_after_delim(line).and_then(|v| find_mac(&v)));
                if mac.is_none() {
                    debug!("Unrecognised MAC line: {:?}", line);
                }
            }
            _ => {}
        }
    }

    let defaults = SwitchIdentity::default();
    SwitchIdentity {
        hostname: hostname.unwrap_or(defaults.hostname),
        model: model.unwrap_or(defaults.model),
        version,
        mac,
    }
}

/// Text after the first `:` or `=`, trimmed. `None` if absent or empty.
fn value_after_delim(line: &str) -> Option<String> {
    let idx = line.find(|c: char| c == ':' || c == '=')?;
    let value = line[idx + 1..].trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn find_mac(text: &str) -> Option<String> {
    if let Some(m) = MAC.find(text) {
        return Some(m.as_str().replace('-', ":").to_lowercase());
    }
    let caps = MAC_COMPACT.captures(text)?;
    let hex = format!("{}{}{}", &caps[1], &caps[2], &caps[3]).to_lowercase();
    let octets: Vec<&str> = (0..6).map(|i| &hex[i * 2..i * 2 + 2]).collect();
    Some(octets.join(":"))
}
