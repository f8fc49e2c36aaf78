//! Cable test orchestration.
//!
//! [`CableTester`] owns a switch driver and the accumulated state for that
//! switch. Every operation takes the same fair lock, so two test requests
//! never share the session, and every state change is published to
//! [`watch`] subscribers as a [`TesterSnapshot`].

mod status;

pub use status::{RunState, TestRunStatus, TesterSnapshot};

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::time::sleep;

use crate::driver::SwitchDriver;
use crate::error::{Result, TestError};
use crate::model::PortResults;
use crate::parse::parse_cable_results;
use crate::profile::DiagnosticDialect;

/// Runs cable tests against one switch and tracks their outcome.
///
/// # Example
///
/// ```rust,no_run
/// use cable_tester::{CableTester, DriverBuilder};
///
/// # async fn example() -> Result<(), cable_tester::Error> {
/// let driver = DriverBuilder::new("192.168.1.2").password("secret").build()?;
/// let tester = CableTester::new(driver);
/// tester.setup(true).await?;
///
/// let results = tester.run_test(Some(3)).await?;
/// for (port, result) in &results {
///     println!("port {}: {:?}", port, result.pairs);
/// }
/// # Ok(())
/// # }
/// ```
pub struct CableTester<D> {
    inner: Mutex<Inner<D>>,
    snapshots: watch::Sender<TesterSnapshot>,
}

struct Inner<D> {
    driver: D,
    state: TesterSnapshot,
}

impl<D: SwitchDriver> CableTester<D> {
    /// Create a tester around `driver`. Nothing is fetched until
    /// [`setup`](Self::setup).
    pub fn new(driver: D) -> Self {
        let state = TesterSnapshot::default();
        let (snapshots, _) = watch::channel(state.clone());
        Self {
            inner: Mutex::new(Inner { driver, state }),
            snapshots,
        }
    }

    /// Use a known port count instead of discovering it during setup.
    pub fn with_port_count(mut self, port_count: u16) -> Self {
        let inner = self.inner.get_mut();
        inner.state.port_count = port_count;
        self.snapshots.send_replace(inner.state.clone());
        self
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<TesterSnapshot> {
        self.snapshots.subscribe()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> TesterSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Connect and load what the switch reports about itself.
    ///
    /// Discovers the port count unless one was given, and fetches the
    /// identity. Port link statuses are only read when `read_port_statuses`
    /// is set. Any connection or command error aborts setup.
    pub async fn setup(&self, read_port_statuses: bool) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        inner.driver.open().await?;

        if inner.state.port_count == 0 {
            inner.state.port_count = inner.driver.port_count().await?;
        }
        inner.state.identity = inner.driver.switch_identity().await?;
        if read_port_statuses {
            inner.state.port_statuses = inner.driver.port_statuses().await?;
        }

        info!(
            "Connected to {} ({}) with {} ports",
            inner.state.identity.hostname, inner.state.identity.model, inner.state.port_count
        );
        self.publish(&inner.state);
        Ok(())
    }

    /// Disconnect from the switch.
    pub async fn shutdown(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.driver.close().await?;
        debug!("Disconnected from {}", inner.state.identity.hostname);
        Ok(())
    }

    /// Re-fetch identity and port statuses without running a test.
    pub async fn refresh_status(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        inner.state.identity = inner.driver.switch_identity().await?;
        inner.state.port_statuses = inner.driver.port_statuses().await?;

        debug!("Refreshed {} port statuses", inner.state.port_statuses.len());
        self.publish(&inner.state);
        Ok(())
    }

    /// Run a cable test on `port`, or on every port when `None`.
    ///
    /// Waits for any run already in flight. Results for the targeted ports
    /// are merged into the accumulated map and returned; rows the switch
    /// reports for other ports are ignored. A run that parses nothing fails
    /// with [`TestError::NoResults`]; a connection or command error fails
    /// with [`TestError::Failed`]. Either way the targeted ports are marked
    /// failed and results for other ports are kept. Dropping the returned
    /// future before it finishes records the run as failed.
    pub async fn run_test(&self, port: Option<u16>) -> Result<PortResults> {
        let inner = self.inner.lock().await;
        let targets: Vec<u16> = match port {
            Some(p) => vec![p],
            None => (1..=inner.state.port_count).collect(),
        };

        let mut run = PendingRun {
            inner,
            snapshots: &self.snapshots,
            targets: targets.clone(),
            settled: false,
        };
        let outcome = self.execute_run(&mut run.inner, port, targets).await;
        run.settled = true;
        outcome
    }

    async fn execute_run(
        &self,
        inner: &mut Inner<D>,
        port: Option<u16>,
        targets: Vec<u16>,
    ) -> Result<PortResults> {
        let target = match port {
            Some(p) => format!("port {}", p),
            None => format!("all {} ports", targets.len()),
        };

        inner.state.run.start(targets.len() as u16, Utc::now());
        self.publish(&inner.state);
        info!("Starting cable test on {}", target);

        if targets.is_empty() {
            let err = TestError::NoPorts;
            error!("Cable test not started: {}", err);
            inner.state.run.fail(&targets, err.to_string(), Utc::now());
            self.publish(&inner.state);
            return Err(err.into());
        }

        let mut results = match fetch_cable_results(&mut inner.driver, port, &targets).await {
            Ok(results) => results,
            Err(e) => {
                error!("Cable test on {} failed: {}", target, e);
                let message = e.to_string();
                inner.state.run.fail(&targets, message.clone(), Utc::now());
                self.publish(&inner.state);
                return Err(TestError::Failed {
                    message,
                    source: Box::new(e),
                }
                .into());
            }
        };

        let reported = results.len();
        results.retain(|p, _| targets.contains(p));
        if results.len() < reported {
            debug!(
                "Ignoring {} results for ports outside {}",
                reported - results.len(),
                target
            );
        }

        // Shares the session, so only after the diagnostics are done
        match inner.driver.port_statuses().await {
            Ok(statuses) => inner.state.port_statuses = statuses,
            Err(e) => warn!("Port status refresh after cable test failed: {}", e),
        }

        inner.state.run.supersede(&targets);

        if results.is_empty() {
            let err = TestError::NoResults { target };
            warn!("{}", err);
            inner.state.run.fail(&targets, err.to_string(), Utc::now());
            self.publish(&inner.state);
            return Err(err.into());
        }

        inner
            .state
            .results
            .extend(results.iter().map(|(port, result)| (*port, result.clone())));
        inner.state.run.complete(results.len() as u16, Utc::now());
        info!("Cable test on {} complete: {} ports", target, results.len());
        self.publish(&inner.state);

        Ok(results)
    }

    fn publish(&self, state: &TesterSnapshot) {
        self.snapshots.send_replace(state.clone());
    }
}

/// A run holding the tester lock. If it is dropped before settling, the
/// caller gave up on it, so the run is recorded as failed instead of
/// staying `Running`.
struct PendingRun<'a, D> {
    inner: MutexGuard<'a, Inner<D>>,
    snapshots: &'a watch::Sender<TesterSnapshot>,
    targets: Vec<u16>,
    settled: bool,
}

impl<D> Drop for PendingRun<'_, D> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!("Cable test cancelled before it finished");
        let state = &mut self.inner.state;
        state
            .run
            .fail(&self.targets, "Cable test cancelled".to_string(), Utc::now());
        self.snapshots.send_replace(state.clone());
    }
}

/// Run the diagnostics for `targets` in the profile's dialect.
async fn fetch_cable_results<D: SwitchDriver>(
    driver: &mut D,
    port: Option<u16>,
    targets: &[u16],
) -> Result<PortResults> {
    let profile = driver.profile();
    let dialect = profile.dialect;

    let output = match dialect {
        DiagnosticDialect::Cli => {
            let commands = match port {
                Some(p) => vec![profile.cable_diag_command(p)],
                None => profile.cable_diag_batch(targets.len() as u16),
            };
            let timeout = profile.timing.batch_timeout(commands.len());
            debug!("Running {} cable-diag commands, timeout {:?}", commands.len(), timeout);
            driver.run_cli_commands(&commands, timeout).await?
        }
        DiagnosticDialect::Legacy => {
            let run = profile.legacy_run_command(port);
            let show = profile.legacy_show_command.clone();
            let timeout = profile.command_timeout;
            let wait = profile.timing.legacy_result_wait;

            driver.run_command(&run, timeout).await?;
            debug!("Waiting {:?} for legacy cable test results", wait);
            sleep(wait).await;
            driver.run_command(&show, timeout).await?
        }
    };

    debug!("Cable test output: {} bytes", output.len());
    Ok(parse_cable_results(dialect, &output))
}
