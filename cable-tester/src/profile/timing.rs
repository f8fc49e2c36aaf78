//! Timing policy for the CLI session.
//!
//! The nested CLI never marks the end of a diagnostic run, so completion
//! is inferred from read silence. Every delay and bound involved lives
//! here rather than in the session code.

use std::time::Duration;

/// Pacing and silence-detection settings for CLI mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliTiming {
    /// Wait after the CLI-entry sentinel while the banner prints.
    pub settle_delay: Duration,

    /// Wait after each command before queueing the next.
    pub command_delay: Duration,

    /// Gap between the three exit sentinels.
    pub exit_delay: Duration,

    /// Silence that triggers a defensive extra exit.
    pub chunk_timeout: Duration,

    /// Overall read deadline for a batch of one command.
    pub single_command_timeout: Duration,

    /// Minimum overall read deadline for larger batches.
    pub batch_floor: Duration,

    /// Additional deadline per command in a batch.
    pub per_command: Duration,

    /// Fixed deadline overhead for larger batches.
    pub batch_overhead: Duration,

    /// Wait between starting a legacy flat-mode test and fetching results.
    pub legacy_result_wait: Duration,
}

impl CliTiming {
    /// Overall read deadline for a batch of `commands` diagnostic commands.
    pub fn batch_timeout(&self, commands: usize) -> Duration {
        if commands <= 1 {
            return self.single_command_timeout;
        }
        let scaled = self.per_command * commands as u32 + self.batch_overhead;
        scaled.max(self.batch_floor)
    }

    /// A policy with every delay set to zero and short bounds.
    ///
    /// Useful against simulators that answer immediately.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            command_delay: Duration::ZERO,
            exit_delay: Duration::ZERO,
            chunk_timeout: Duration::from_millis(200),
            single_command_timeout: Duration::from_secs(2),
            batch_floor: Duration::from_secs(2),
            per_command: Duration::from_millis(100),
            batch_overhead: Duration::from_secs(1),
            legacy_result_wait: Duration::ZERO,
        }
    }
}

impl Default for CliTiming {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            command_delay: Duration::from_millis(500),
            exit_delay: Duration::from_millis(300),
            chunk_timeout: Duration::from_secs(3),
            single_command_timeout: Duration::from_secs(30),
            batch_floor: Duration::from_secs(60),
            per_command: Duration::from_secs(2),
            batch_overhead: Duration::from_secs(10),
            legacy_result_wait: Duration::from_secs(8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_port_uses_fixed_timeout() {
        let timing = CliTiming::default();
        assert_eq!(timing.batch_timeout(1), Duration::from_secs(30));
        assert_eq!(timing.batch_timeout(0), Duration::from_secs(30));
    }

    #[test]
    fn test_batch_timeout_floor_and_scaling() {
        let timing = CliTiming::default();
        // 8 ports: 8*2+10 = 26s, below the floor
        assert_eq!(timing.batch_timeout(8), Duration::from_secs(60));
        // 48 ports: 48*2+10 = 106s
        assert_eq!(timing.batch_timeout(48), Duration::from_secs(106));
    }
}
