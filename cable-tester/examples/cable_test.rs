//! Cable test example: connect to a switch and test one or all ports
//!
//! # Prerequisites
//!
//! - A UniFi switch reachable over SSH
//! - Device credentials (password or SSH key)
//!
//! # Usage
//!
//! Test every port:
//! ```bash
//! cargo run --example cable_test -- --host 192.168.1.2 --password ubnt
//! ```
//!
//! Test port 5 on a legacy firmware build:
//! ```bash
//! cargo run --example cable_test -- --host 192.168.1.2 --key ~/.ssh/id_ed25519 --port-number 5 --legacy
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use cable_tester::profile::{DiagnosticDialect, unifi};
use cable_tester::{CableTester, DriverBuilder, HostKeyVerification};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let dialect = if args.legacy {
        DiagnosticDialect::Legacy
    } else {
        DiagnosticDialect::Cli
    };

    let mut builder = DriverBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .profile(unifi::profile().with_dialect(dialect))
        .timeout(Duration::from_secs(args.timeout));

    if args.insecure {
        builder = builder.host_key_verification(HostKeyVerification::Disabled);
    }

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }

    let tester = CableTester::new(builder.build()?);

    println!("Connecting to {}:{}...", args.host, args.port);
    tester.setup(true).await?;

    let snapshot = tester.snapshot();
    println!(
        "{} ({}) firmware {} - {} ports",
        snapshot.identity.hostname,
        snapshot.identity.model,
        snapshot.identity.version.as_deref().unwrap_or("unknown"),
        snapshot.port_count
    );

    println!("\nRunning cable test...");
    let outcome = tester.run_test(args.port_number).await;

    let snapshot = tester.snapshot();
    match outcome {
        Ok(results) => {
            println!("{}", "-".repeat(60));
            for (port, result) in &results {
                let link = snapshot
                    .port_statuses
                    .get(port)
                    .and_then(|s| s.speed_display.clone())
                    .unwrap_or_else(|| "down".to_string());
                let pairs: Vec<String> = result
                    .pairs
                    .iter()
                    .map(|p| match p.length_m {
                        Some(len) => format!("{} {:.1}m", p.status, len),
                        None => p.status.to_string(),
                    })
                    .collect();
                println!("Port {:>2} [{:>9}]  {}", port, link, pairs.join(" | "));
            }
            println!("{}", "-".repeat(60));
        }
        Err(e) => {
            eprintln!("Cable test failed: {}", e);
            eprintln!("Failed ports: {:?}", snapshot.run.failed_ports);
        }
    }

    tester.shutdown().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    timeout: u64,
    port_number: Option<u16>,
    legacy: bool,
    insecure: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "192.168.1.2".to_string();
        let mut port = 22u16;
        let mut user = "admin".to_string();
        let mut password = None;
        let mut key = None;
        let mut timeout = 10u64;
        let mut port_number = None;
        let mut legacy = false;
        let mut insecure = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(22);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--key" | "-k" => {
                    i += 1;
                    if i < args.len() {
                        key = Some(PathBuf::from(&args[i]));
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(10);
                    }
                }
                "--port-number" | "-n" => {
                    i += 1;
                    if i < args.len() {
                        port_number = args[i].parse().ok();
                    }
                }
                "--legacy" => legacy = true,
                "--insecure" => insecure = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            host,
            port,
            user,
            password,
            key,
            timeout,
            port_number,
            legacy,
            insecure,
        }
    }

    fn print_help() {
        println!(
            r#"cable-tester cable_test example

USAGE:
    cargo run --example cable_test -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>          Switch address [default: 192.168.1.2]
    -p, --port <PORT>          SSH port [default: 22]
    -u, --user <USER>          Username [default: admin]
    -P, --password <PASS>      Password for authentication
    -k, --key <PATH>           Path to SSH private key
    -t, --timeout <SECS>       Connection timeout [default: 10]
    -n, --port-number <N>      Test only this switch port [default: all]
    --legacy                   Use the flat-mode cable-test commands
    --insecure                 Skip host key verification
    --help                     Print this help message
"#
        );
    }
}
