//! Nested CLI session protocol.
//!
//! The vendor CLI has no end-of-response marker. The session writes the
//! whole batch up front, queues the exit sentinels behind it, and then
//! reads until the shell closes the stream or the deadline passes:
//!
//! ```text
//! cli            settle
//! <command 1>    command delay
//! ...
//! <command N>    command delay
//! exit           leave CLI layer 1
//! exit           leave CLI layer 2 ("Terminated")
//! exit           close the outer shell
//! read loop      chunk timeout -> re-send exit, EOF -> done
//! ```

use std::time::Duration;

use log::{debug, trace, warn};
use tokio::time::{Instant, sleep, timeout};

use crate::channel::{ShellChannel, TranscriptBuffer};
use crate::error::{ChannelError, CommandError, Result};
use crate::profile::SwitchProfile;

/// Number of exit sentinels needed to fall back out of the CLI and close
/// the shell.
const EXIT_COUNT: usize = 3;

/// Run `commands` in one CLI session on `shell` and return the stripped
/// transcript.
///
/// `read_timeout` bounds the read loop. When it expires the text
/// collected so far is returned; only an empty transcript is an error.
/// The channel is closed before returning, whatever the outcome.
pub async fn run_cli_session<C: ShellChannel>(
    shell: &mut C,
    profile: &SwitchProfile,
    commands: &[String],
    read_timeout: Duration,
) -> Result<String> {
    let result = drive(shell, profile, commands, read_timeout).await;

    if let Err(e) = shell.close().await {
        debug!("Error closing CLI channel: {}", e);
    }
    result
}

async fn drive<C: ShellChannel>(
    shell: &mut C,
    profile: &SwitchProfile,
    commands: &[String],
    read_timeout: Duration,
) -> Result<String> {
    let timing = &profile.timing;

    send_line(shell, &profile.cli_enter_command).await?;
    sleep(timing.settle_delay).await;

    for command in commands {
        debug!("Sending CLI command: {}", command);
        send_line(shell, command).await?;
        sleep(timing.command_delay).await;
    }

    for _ in 0..EXIT_COUNT {
        send_line(shell, &profile.cli_exit_command).await?;
        sleep(timing.exit_delay).await;
    }

    read_transcript(shell, profile, read_timeout).await
}

async fn read_transcript<C: ShellChannel>(
    shell: &mut C,
    profile: &SwitchProfile,
    read_timeout: Duration,
) -> Result<String> {
    let chunk_timeout = profile.timing.chunk_timeout;
    let deadline = Instant::now() + read_timeout;
    let mut buffer = TranscriptBuffer::new();

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let wait = chunk_timeout.min(deadline - now);

        match timeout(wait, shell.read_chunk()).await {
            Ok(Ok(Some(chunk))) if !chunk.is_empty() => {
                buffer.extend(&chunk);
                trace!("CLI read {} bytes (total {})", chunk.len(), buffer.raw_len());
            }
            Ok(Ok(_)) => {
                debug!("CLI session closed after {} bytes", buffer.raw_len());
                return Ok(buffer.into_string());
            }
            Ok(Err(e)) => return Err(channel_failed("<cli read>", e).into()),
            Err(_) => {
                if Instant::now() >= deadline {
                    break;
                }
                // Some builds stall until nudged with another exit
                debug!("No CLI output for {:?}, re-sending exit", wait);
                if let Err(e) = send_line(shell, &profile.cli_exit_command).await {
                    debug!("Extra exit not sent: {}", e);
                }
            }
        }
    }

    if buffer.is_empty() {
        return Err(CommandError::NoOutput {
            timeout: read_timeout,
        }
        .into());
    }

    warn!(
        "CLI read deadline of {:?} reached, returning {} bytes",
        read_timeout,
        buffer.raw_len()
    );
    Ok(buffer.into_string())
}

async fn send_line<C: ShellChannel>(
    shell: &mut C,
    line: &str,
) -> std::result::Result<(), CommandError> {
    let mut data = Vec::with_capacity(line.len() + 1);
    data.extend_from_slice(line.as_bytes());
    data.push(b'\n');
    shell
        .write(&data)
        .await
        .map_err(|e| channel_failed(line, e))
}

fn channel_failed(command: &str, err: ChannelError) -> CommandError {
    CommandError::Failed {
        command: command.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use bytes::Bytes;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::error::Error;
    use crate::profile::unifi;

    enum Step {
        Data(&'static str),
        Stall(Duration),
        Eof,
        Lost,
    }

    /// Scripted shell. Once the script runs out, reads never complete.
    struct FakeShell {
        script: VecDeque<Step>,
        written: Vec<String>,
        closed: bool,
    }

    impl FakeShell {
        fn new(script: Vec<Step>) -> Self {
            Self {
                script: script.into(),
                written: Vec::new(),
                closed: false,
            }
        }

        fn exits_written(&self) -> usize {
            self.written.iter().filter(|w| *w == "exit\n").count()
        }
    }

    impl ShellChannel for FakeShell {
        async fn write(&mut self, data: &[u8]) -> std::result::Result<(), ChannelError> {
            if self.closed {
                return Err(ChannelError::Closed);
            }
            self.written.push(String::from_utf8_lossy(data).into_owned());
            Ok(())
        }

        async fn read_chunk(&mut self) -> std::result::Result<Option<Bytes>, ChannelError> {
            loop {
                match self.script.pop_front() {
                    Some(Step::Data(text)) => return Ok(Some(Bytes::from_static(text.as_bytes()))),
                    Some(Step::Stall(d)) => sleep(d).await,
                    Some(Step::Eof) => return Ok(None),
                    Some(Step::Lost) => return Err(ChannelError::Closed),
                    None => std::future::pending::<()>().await,
                }
            }
        }

        async fn close(&mut self) -> std::result::Result<(), ChannelError> {
            self.closed = true;
            Ok(())
        }
    }

    fn commands(ports: &[u16]) -> Vec<String> {
        let profile = unifi::profile();
        ports.iter().map(|p| profile.cable_diag_command(*p)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentinel_sequence_and_eof() {
        let profile = unifi::profile();
        let mut shell = FakeShell::new(vec![
            Step::Data("(UBNT) >"),
            Step::Data("gi1 | auto | Pair A | 24.00 | Normal\r\n"),
            Step::Eof,
        ]);

        let start = Instant::now();
        let output = assert_ok!(
            run_cli_session(&mut shell, &profile, &commands(&[1]), Duration::from_secs(30)).await
        );

        assert_eq!(
            shell.written,
            vec!["cli\n", "sh cable-diag int gi1\n", "exit\n", "exit\n", "exit\n"]
        );
        assert!(output.contains("gi1 | auto | Pair A | 24.00 | Normal\n"));
        assert!(!output.contains('\r'));
        assert!(shell.closed);

        // settle + one command delay + three exit gaps
        assert!(start.elapsed() >= Duration::from_millis(2400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_written_in_order() {
        let profile = unifi::profile();
        let mut shell = FakeShell::new(vec![Step::Data("x"), Step::Eof]);

        assert_ok!(
            run_cli_session(&mut shell, &profile, &commands(&[1, 2, 3]), Duration::from_secs(60))
                .await
        );

        assert_eq!(
            &shell.written[1..4],
            [
                "sh cable-diag int gi1\n",
                "sh cable-diag int gi2\n",
                "sh cable-diag int gi3\n",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_resends_exit_and_keeps_reading() {
        let profile = unifi::profile();
        let mut shell = FakeShell::new(vec![
            Step::Data("gi2 | auto | Pair A"),
            Step::Stall(Duration::from_secs(5)),
            Step::Data(" | 3.00 | Open\n"),
            Step::Eof,
        ]);

        let output = assert_ok!(
            run_cli_session(&mut shell, &profile, &commands(&[2]), Duration::from_secs(30)).await
        );

        assert_eq!(output, "gi2 | auto | Pair A | 3.00 | Open\n");
        assert_eq!(shell.exits_written(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_returns_partial_transcript() {
        let profile = unifi::profile();
        let mut shell = FakeShell::new(vec![Step::Data("gi1 | auto | Pair A | 24.00 | Normal\n")]);

        let start = Instant::now();
        let output = assert_ok!(
            run_cli_session(&mut shell, &profile, &commands(&[1]), Duration::from_secs(10)).await
        );

        assert!(output.starts_with("gi1"));
        // write phase plus the full read deadline
        assert!(start.elapsed() >= Duration::from_millis(12_400));
        assert!(shell.closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_without_output_is_error() {
        let profile = unifi::profile();
        let mut shell = FakeShell::new(Vec::new());

        let err = assert_err!(
            run_cli_session(&mut shell, &profile, &commands(&[1]), Duration::from_secs(10)).await
        );
        assert!(matches!(
            err,
            Error::Command(CommandError::NoOutput { timeout }) if timeout == Duration::from_secs(10)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_failure_is_command_error() {
        let profile = unifi::profile();
        let mut shell = FakeShell::new(vec![Step::Data("gi1 |"), Step::Lost]);

        let err = assert_err!(
            run_cli_session(&mut shell, &profile, &commands(&[1]), Duration::from_secs(30)).await
        );
        assert!(matches!(err, Error::Command(CommandError::Failed { .. })));
        assert!(err.is_transient());
        assert!(shell.closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_lost_mid_read_discards_partial_transcript() {
        let profile = unifi::profile();
        let mut shell = FakeShell::new(vec![
            Step::Data("gi1 | auto | Pair A | 24.00 | Normal\n"),
            Step::Data("Pair B | 24.00 | Nor"),
            Step::Lost,
        ]);

        let result =
            run_cli_session(&mut shell, &profile, &commands(&[1]), Duration::from_secs(30)).await;

        let err = assert_err!(result);
        assert!(matches!(
            &err,
            Error::Command(CommandError::Failed { command, .. }) if command == "<cli read>"
        ));
        // nothing after the loss is written, not even the nudge exit
        assert_eq!(shell.exits_written(), 3);
        assert!(shell.closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_sequences_stripped() {
        let profile = unifi::profile();
        let mut shell = FakeShell::new(vec![
            Step::Data("Pair A | 24.00 | \x1b[32mNor"),
            Step::Data("mal\x1b[0m\r\n"),
            Step::Eof,
        ]);

        let output = assert_ok!(
            run_cli_session(&mut shell, &profile, &commands(&[1]), Duration::from_secs(30)).await
        );
        assert_eq!(output, "Pair A | 24.00 | Normal\n");
    }
}
