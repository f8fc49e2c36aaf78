//! UniFi USW switch profile.
//!
//! Flat mode is the BusyBox shell reached over SSH; `cli` drops into the
//! vendor CLI which needs two `exit`s to leave (the second prints
//! "Terminated") and a third to close the outer shell.

use super::definition::{DiagnosticDialect, SwitchProfile};

/// Create the UniFi profile.
pub fn profile() -> SwitchProfile {
    SwitchProfile::new("unifi")
        .with_info_commands("swctrl port show", "info")
        .with_cli_sentinels("cli", "exit")
        .with_cable_diag("sh cable-diag int gi{port}")
        .with_legacy_commands(
            "swctrl cable-test run",
            "swctrl cable-test run port {port}",
            "swctrl cable-test show",
        )
        .with_dialect(DiagnosticDialect::Cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unifi_profile() {
        let profile = profile();
        assert_eq!(profile.name, "unifi");
        assert_eq!(profile.port_show_command, "swctrl port show");
        assert_eq!(profile.cli_enter_command, "cli");
        assert_eq!(profile.cli_exit_command, "exit");
        assert_eq!(profile.cable_diag_command(12), "sh cable-diag int gi12");
        assert_eq!(
            profile.legacy_run_command(Some(4)),
            "swctrl cable-test run port 4"
        );
        assert_eq!(profile.dialect, DiagnosticDialect::Cli);
    }
}
