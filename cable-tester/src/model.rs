//! Typed records produced by the parsers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Hostname reported when the system info output has none.
pub const DEFAULT_HOSTNAME: &str = "Unknown Switch";

/// Model reported when the system info output has none.
pub const DEFAULT_MODEL: &str = "Unknown Model";

/// Cable test results keyed by 1-based port number.
pub type PortResults = BTreeMap<u16, CableTestResult>;

/// Link status keyed by 1-based port number.
pub type PortStatuses = BTreeMap<u16, PortLinkStatus>;

/// Identity snapshot of a switch. Replaced wholesale on each fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchIdentity {
    pub hostname: String,
    pub model: String,
    pub version: Option<String>,
    /// Lowercase, colon separated.
    pub mac: Option<String>,
}

impl Default for SwitchIdentity {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            model: DEFAULT_MODEL.to_string(),
            version: None,
            mac: None,
        }
    }
}

/// Physical medium of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortMedium {
    Copper,
    Fiber,
    #[default]
    Unknown,
}

/// Current link details for one port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortLinkStatus {
    pub port: u16,
    /// `None` when the row carried no recognisable link indicator.
    pub connected: Option<bool>,
    pub speed_mbps: Option<u32>,
    /// e.g. "100 Mbps", "1 Gbps".
    pub speed_display: Option<String>,
    pub medium: PortMedium,
}

impl PortLinkStatus {
    /// A status with nothing known beyond the port number.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            connected: None,
            speed_mbps: None,
            speed_display: None,
            medium: PortMedium::Unknown,
        }
    }
}

/// Canonical status of one twisted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PairStatus {
    #[serde(rename = "OK")]
    Ok,
    Open,
    Short,
    #[default]
    #[serde(rename = "Not Tested")]
    NotTested,
    Fiber,
    Unknown,
}

impl PairStatus {
    /// Display label, also accepted back by the normalizer.
    pub fn label(self) -> &'static str {
        match self {
            PairStatus::Ok => "OK",
            PairStatus::Open => "Open",
            PairStatus::Short => "Short",
            PairStatus::NotTested => "Not Tested",
            PairStatus::Fiber => "Fiber",
            PairStatus::Unknown => "Unknown",
        }
    }

    /// Whether a length reading accompanies this status.
    pub fn has_length(self) -> bool {
        matches!(self, PairStatus::Ok | PairStatus::Open | PairStatus::Short)
    }
}

impl fmt::Display for PairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CablePairResult {
    pub status: PairStatus,
    /// Meters. Only kept for OK, Open and Short.
    pub length_m: Option<f64>,
}

impl CablePairResult {
    /// Build a pair result, dropping lengths that the status makes meaningless.
    pub fn new(status: PairStatus, length_m: Option<f64>) -> Self {
        Self {
            status,
            length_m: length_m.filter(|_| status.has_length()),
        }
    }

    /// Pair of a fiber port: no copper to test.
    pub fn fiber() -> Self {
        Self {
            status: PairStatus::Fiber,
            length_m: None,
        }
    }
}

/// Cable diagnostic outcome for one port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CableTestResult {
    pub port: u16,
    /// Pairs 1-4 (A-D).
    pub pairs: [CablePairResult; 4],
    pub tested_at: DateTime<Utc>,
}

impl CableTestResult {
    /// A result with all four pairs not tested.
    pub fn new(port: u16, tested_at: DateTime<Utc>) -> Self {
        Self {
            port,
            pairs: [CablePairResult::default(); 4],
            tested_at,
        }
    }

    /// Pair by 1-based index.
    pub fn pair(&self, index: usize) -> Option<&CablePairResult> {
        index.checked_sub(1).and_then(|i| self.pairs.get(i))
    }

    /// Set a pair by 1-based index. Out of range indices are ignored.
    pub fn set_pair(&mut self, index: usize, pair: CablePairResult) {
        if let Some(slot) = index.checked_sub(1).and_then(|i| self.pairs.get_mut(i)) {
            *slot = pair;
        }
    }

    /// Fill the first pair still at its default. Returns false when all
    /// four are already populated.
    pub fn fill_next_pair(&mut self, pair: CablePairResult) -> bool {
        match self
            .pairs
            .iter_mut()
            .find(|p| p.status == PairStatus::NotTested)
        {
            Some(slot) => {
                *slot = pair;
                true
            }
            None => false,
        }
    }

    /// Mark every pair as fiber.
    pub fn mark_fiber(&mut self) {
        self.pairs = [CablePairResult::fiber(); 4];
    }

    /// Whether this port was identified as fiber.
    pub fn is_fiber(&self) -> bool {
        self.pairs.iter().all(|p| p.status == PairStatus::Fiber)
    }

    /// Whether any pair carries parsed data.
    pub fn has_data(&self) -> bool {
        self.pairs.iter().any(|p| p.status != PairStatus::NotTested)
    }
}
