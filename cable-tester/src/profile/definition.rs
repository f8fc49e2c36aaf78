//! Switch profile: the command vocabulary and pacing for a firmware family.

use std::time::Duration;

use super::timing::CliTiming;

/// Placeholder substituted with the port index in per-port templates.
const PORT_PLACEHOLDER: &str = "{port}";

/// Which cable-diagnostic output format a switch produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticDialect {
    /// Per-port `sh cable-diag` tables run inside the nested CLI.
    #[default]
    Cli,

    /// Flat-mode `cable-test run` followed by a `cable-test show` table.
    Legacy,
}

/// Everything the driver needs to know about a switch family's shell.
#[derive(Debug, Clone)]
pub struct SwitchProfile {
    /// Profile name (e.g., "unifi").
    pub name: String,

    /// Flat-mode command dumping the port table.
    pub port_show_command: String,

    /// Flat-mode command printing system identity.
    pub system_info_command: String,

    /// Sentinel entering the nested CLI.
    pub cli_enter_command: String,

    /// Sentinel leaving one CLI layer.
    pub cli_exit_command: String,

    /// CLI-mode cable diagnostic template, `{port}` is substituted.
    pub cable_diag_template: String,

    /// Legacy flat-mode command starting a test on every port.
    pub legacy_run_all_command: String,

    /// Legacy flat-mode template starting a test on one port.
    pub legacy_run_port_template: String,

    /// Legacy flat-mode command printing the last results.
    pub legacy_show_command: String,

    /// Diagnostic dialect this deployment uses.
    pub dialect: DiagnosticDialect,

    /// Timeout for flat-mode commands.
    pub command_timeout: Duration,

    /// CLI pacing and silence detection.
    pub timing: CliTiming,
}

impl SwitchProfile {
    /// Create an empty profile. Every command must be filled in with the
    /// `with_*` methods before use.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port_show_command: String::new(),
            system_info_command: String::new(),
            cli_enter_command: String::new(),
            cli_exit_command: String::new(),
            cable_diag_template: String::new(),
            legacy_run_all_command: String::new(),
            legacy_run_port_template: String::new(),
            legacy_show_command: String::new(),
            dialect: DiagnosticDialect::default(),
            command_timeout: Duration::from_secs(30),
            timing: CliTiming::default(),
        }
    }

    /// Set the port table and system info commands.
    pub fn with_info_commands(
        mut self,
        port_show: impl Into<String>,
        system_info: impl Into<String>,
    ) -> Self {
        self.port_show_command = port_show.into();
        self.system_info_command = system_info.into();
        self
    }

    /// Set the CLI enter/exit sentinels.
    pub fn with_cli_sentinels(mut self, enter: impl Into<String>, exit: impl Into<String>) -> Self {
        self.cli_enter_command = enter.into();
        self.cli_exit_command = exit.into();
        self
    }

    /// Set the per-port CLI diagnostic template.
    pub fn with_cable_diag(mut self, template: impl Into<String>) -> Self {
        self.cable_diag_template = template.into();
        self
    }

    /// Set the legacy flat-mode test commands.
    pub fn with_legacy_commands(
        mut self,
        run_all: impl Into<String>,
        run_port: impl Into<String>,
        show: impl Into<String>,
    ) -> Self {
        self.legacy_run_all_command = run_all.into();
        self.legacy_run_port_template = run_port.into();
        self.legacy_show_command = show.into();
        self
    }

    /// Select the diagnostic dialect.
    pub fn with_dialect(mut self, dialect: DiagnosticDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the flat-mode command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Replace the CLI timing policy.
    pub fn with_timing(mut self, timing: CliTiming) -> Self {
        self.timing = timing;
        self
    }

    /// CLI diagnostic command for one port.
    pub fn cable_diag_command(&self, port: u16) -> String {
        fill_port(&self.cable_diag_template, port)
    }

    /// CLI diagnostic batch for ports `1..=port_count`.
    pub fn cable_diag_batch(&self, port_count: u16) -> Vec<String> {
        (1..=port_count).map(|p| self.cable_diag_command(p)).collect()
    }

    /// Legacy flat-mode command starting a test on `port`, or on every
    /// port when `None`.
    pub fn legacy_run_command(&self, port: Option<u16>) -> String {
        match port {
            Some(p) => fill_port(&self.legacy_run_port_template, p),
            None => self.legacy_run_all_command.clone(),
        }
    }
}

fn fill_port(template: &str, port: u16) -> String {
    template.replace(PORT_PLACEHOLDER, &port.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_substitution() {
        let profile = SwitchProfile::new("test")
            .with_cable_diag("show cable {port}")
            .with_legacy_commands("test all", "test port {port}", "test show");

        assert_eq!(profile.cable_diag_command(7), "show cable 7");
        assert_eq!(profile.legacy_run_command(Some(3)), "test port 3");
        assert_eq!(profile.legacy_run_command(None), "test all");
    }

    #[test]
    fn test_batch_covers_every_port() {
        let profile = SwitchProfile::new("test").with_cable_diag("diag {port}");
        assert_eq!(
            profile.cable_diag_batch(3),
            vec!["diag 1", "diag 2", "diag 3"]
        );
        assert!(profile.cable_diag_batch(0).is_empty());
    }
}
