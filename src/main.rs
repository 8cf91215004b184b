// Network State - Daemon Entry Point
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # netstated
//!
//! Follows the connection manager and logs the network state it sees.
//! With `--stub` it runs against a built-in fixture instead of D-Bus.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use network_state::manager::{ManagerClient, ManagerEvent, ShillClient, StubManagerClient};
use network_state::models::{AppConfig, CellularDataPlan, Network, CRATE_VERSION};
use network_state::network_library::{DataPlanObserver, NetworkLibrary, NetworkManagerObserver};
use network_state::services::{
    CertificateResolver, EnrollmentHandler, EnrollmentTicket, InMemoryCertificateStore,
};

/// Human-readable application name.
pub const APP_NAME: &str = "Network State";

/// How often pending certificate enrollments are checked.
const ENROLLMENT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Print version information and exit.
fn print_version() {
    println!("{} {}", APP_NAME, CRATE_VERSION);
    println!("Copyright (C) 2026 Christos A. Daggas");
    println!("License: MIT");
}

/// Print help information and exit.
fn print_help() {
    println!(
        "Usage: {} [OPTIONS]",
        env::args().next().unwrap_or_else(|| "netstated".to_string())
    );
    println!();
    println!("Tracks network devices and services of the connection manager.");
    println!();
    println!("Options:");
    println!("  -h, --help           Show this help message and exit");
    println!("  -v, --version        Show version information and exit");
    println!("  -d, --debug          Enable debug logging");
    println!("  -c, --config <FILE>  Read configuration from FILE");
    println!("      --stub           Use the built-in fixture instead of D-Bus");
    println!("      --write-config   Write the effective configuration and exit");
    println!();
    println!("Environment variables:");
    println!("  RUST_LOG             Set log level (trace, debug, info, warn, error)");
}

/// Logs enrollment URIs. Interactive enrollment is not available in the
/// daemon, so the ticket is released and the attempt abandoned.
struct LoggingEnrollmentHandler;

impl EnrollmentHandler for LoggingEnrollmentHandler {
    fn enroll(&self, uris: &[String], ticket: EnrollmentTicket) {
        for uri in uris {
            info!("Certificate enrollment required: {}", uri);
        }
        drop(ticket);
    }
}

/// Logs a short summary whenever the network list changes.
struct SummaryLogger;

impl NetworkManagerObserver for SummaryLogger {
    fn on_network_manager_changed(&self, library: &NetworkLibrary) {
        let active = [
            library.ethernet_network(),
            library.wifi_network(),
            library.cellular_network(),
            library.virtual_network(),
        ];
        for network in active.into_iter().flatten() {
            debug!(
                "{} is {} ({})",
                network.name(),
                network.state_string(),
                network.ip_address
            );
        }
        info!(
            "{} devices, {} wifi, {} cellular, {} vpn, offline: {}",
            library.devices().count(),
            library.wifi_networks().len(),
            library.cellular_networks().len(),
            library.virtual_networks().len(),
            library.offline_mode()
        );
    }
}

impl DataPlanObserver for SummaryLogger {
    fn on_data_plans_changed(&self, network: &Network, plans: &[CellularDataPlan]) {
        for plan in plans {
            info!(
                "{}: {} ({})",
                network.name(),
                plan.plan_description(),
                plan.usage_info()
            );
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut debug_mode = false;
    let mut stub_mode = false;
    let mut write_config = false;
    let mut config_path: Option<PathBuf> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "-v" | "--version" => {
                print_version();
                return ExitCode::SUCCESS;
            }
            "-d" | "--debug" => debug_mode = true,
            "--stub" => stub_mode = true,
            "--write-config" => write_config = true,
            "-c" | "--config" => match iter.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => {
                    eprintln!("Option {} requires a file argument", arg);
                    return ExitCode::FAILURE;
                }
            },
            _ => {
                eprintln!("Unknown option: {}", arg);
                eprintln!("Try '--help' for more information.");
                return ExitCode::FAILURE;
            }
        }
    }

    let config_path = config_path.unwrap_or_else(AppConfig::default_path);
    let config = match AppConfig::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if write_config {
        return match config.save_to_file(&config_path) {
            Ok(()) => {
                println!("Configuration written to {}", config_path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let log_level = if debug_mode {
        tracing::Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(tracing::Level::INFO)
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .init();

    info!("Starting {} v{}", APP_NAME, CRATE_VERSION);

    // The fixture sender must outlive the loop, or the stream ends at once.
    let mut _fixture_sender = None;
    let (client, mut events): (Rc<dyn ManagerClient>, mpsc::Receiver<ManagerEvent>) =
        if stub_mode || config.manager.use_stub {
            info!("Using the built-in stub connection manager");
            let fixture = StubManagerClient::fixture_events();
            let capacity = config.manager.event_channel_capacity.max(fixture.len());
            let (sender, receiver) = mpsc::channel(capacity);
            for event in fixture {
                if let Err(e) = sender.try_send(event) {
                    warn!("Dropping fixture event: {}", e);
                }
            }
            _fixture_sender = Some(sender);
            (Rc::new(StubManagerClient::new()), receiver)
        } else {
            match ShillClient::connect(&config.manager).await {
                Ok((client, receiver)) => (Rc::new(client), receiver),
                Err(e) => {
                    error!("Cannot reach the connection manager: {}", e);
                    if e.is_manager_unavailable() {
                        info!("Run with --stub to use the built-in fixture");
                    }
                    return ExitCode::FAILURE;
                }
            }
        };

    let store = Arc::new(InMemoryCertificateStore::default());
    let mut resolver = CertificateResolver::new(store);
    if config.certificates.enrollment_enabled {
        resolver = resolver.with_enrollment_handler(Arc::new(LoggingEnrollmentHandler));
    }

    let mut library = NetworkLibrary::new(client, resolver, config.data_plan);
    let summary = Rc::new(SummaryLogger);
    library.add_network_manager_observer(summary.clone());
    library.add_data_plan_observer(summary);
    library.initialize();

    let mut enrollment_poll = tokio::time::interval(ENROLLMENT_POLL_INTERVAL);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => library.handle_event(event),
                None => {
                    warn!("Connection manager event stream closed");
                    break;
                }
            },
            _ = enrollment_poll.tick() => library.process_pending_connections(),
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    ExitCode::SUCCESS
}
