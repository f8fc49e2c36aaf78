//! Pair status normalization shared by every diagnostic parser.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::PairStatus;

static LENGTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*m?$").unwrap());

/// Canonicalize a free-text pair status.
///
/// Case-insensitive and whitespace-insensitive. Never returns
/// [`PairStatus::Fiber`]; that status comes from the medium, not from a
/// status column.
pub fn normalize_status(text: &str) -> PairStatus {
    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.as_str() {
        "ok" | "normal" | "good" => PairStatus::Ok,
        "open" | "disconnect" | "disconnected" => PairStatus::Open,
        "short" => PairStatus::Short,
        "n/a" | "na" | "-" | "" | "not supported" | "not tested" => PairStatus::NotTested,
        _ => PairStatus::Unknown,
    }
}

/// Whether a token is one of the "no value" sentinels.
pub(crate) fn is_absent(token: &str) -> bool {
    matches!(
        token.trim().to_lowercase().as_str(),
        "n/a" | "na" | "-" | ""
    )
}

/// Parse a length such as `24.00`, `45m` or `45 m` into meters.
pub(crate) fn parse_length(text: &str) -> Option<f64> {
    let text = text.trim().to_lowercase();
    if is_absent(&text) {
        return None;
    }
    LENGTH
        .captures(&text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}
