//! Run status record and published snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{PortResults, PortStatuses, SwitchIdentity};

/// Phase of the most recent cable test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Status of the most recent run, plus the ports whose last diagnostic
/// failed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TestRunStatus {
    pub state: RunState,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Ports targeted while running, ports obtained once completed.
    pub ports_count: u16,
    /// Only set when failed.
    pub error: Option<String>,
    /// Survives across runs until the port is tested again.
    pub failed_ports: BTreeSet<u16>,
}

impl TestRunStatus {
    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub(crate) fn start(&mut self, targeted: u16, now: DateTime<Utc>) {
        self.state = RunState::Running;
        self.started_at = Some(now);
        self.completed_at = None;
        self.ports_count = targeted;
        self.error = None;
    }

    /// Forget earlier failures of ports that this run tested again.
    pub(crate) fn supersede(&mut self, targets: &[u16]) {
        for port in targets {
            self.failed_ports.remove(port);
        }
    }

    pub(crate) fn complete(&mut self, obtained: u16, now: DateTime<Utc>) {
        self.state = RunState::Completed;
        self.completed_at = Some(now);
        self.ports_count = obtained;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, targets: &[u16], message: String, now: DateTime<Utc>) {
        self.state = RunState::Failed;
        self.completed_at = Some(now);
        self.error = Some(message);
        self.failed_ports.extend(targets.iter().copied());
    }
}

/// Everything the tester knows about its switch, published after every
/// state change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TesterSnapshot {
    pub run: TestRunStatus,
    /// Accumulated results; a port's entry is replaced only by a newer
    /// successful test of that port.
    pub results: PortResults,
    pub identity: SwitchIdentity,
    pub port_statuses: PortStatuses,
    pub port_count: u16,
}
