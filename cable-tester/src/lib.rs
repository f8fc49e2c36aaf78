//! # Cable Tester
//!
//! Async SSH driver for running cable diagnostics on managed Ethernet
//! switches and parsing the results into typed records.
//!
//! The switch firmware has no structured API. Everything goes through its
//! shell, which has a flat command-response mode and a nested CLI mode
//! with no end-of-response marker. This crate drives both and turns their
//! loosely formatted text into [`CableTestResult`]s.
//!
//! ## Features
//!
//! - Async SSH connections via russh, rebuilt on the next call after a failure
//! - Silence-tolerant CLI session driver with a configurable timing policy
//! - Parsers for two cable diagnostic dialects, port tables and system info
//! - Single-flight test orchestration with run status and result merging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cable_tester::{CableTester, DriverBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cable_tester::Error> {
//!     let driver = DriverBuilder::new("192.168.1.2")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     let tester = CableTester::new(driver);
//!     tester.setup(true).await?;
//!
//!     let results = tester.run_test(None).await?;
//!     for (port, result) in &results {
//!         println!("port {}: {:?}", port, result.pairs);
//!     }
//!
//!     tester.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod model;
pub mod parse;
pub mod profile;
pub mod tester;
pub mod transport;

// Re-export main types for convenience
pub use driver::{DriverBuilder, SshDriver, SwitchDriver};
pub use error::Error;
pub use model::{
    CablePairResult, CableTestResult, PairStatus, PortLinkStatus, PortMedium, PortResults,
    PortStatuses, SwitchIdentity,
};
pub use profile::{CliTiming, DiagnosticDialect, SwitchProfile};
pub use tester::{CableTester, RunState, TestRunStatus, TesterSnapshot};
pub use transport::{AuthMethod, HostKeyVerification, SwitchConfig, SwitchTransport};
