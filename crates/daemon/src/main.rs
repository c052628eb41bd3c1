// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project host daemon entry point.
//!
//! One process per project: keeps the embedding and CoT sidecars alive,
//! monitors their health and the client transport, and answers hot-reload
//! signals from peer host processes.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::time::Duration;

use oj_host_daemon::lifecycle::{Config, DaemonState};
use oj_host_daemon::DaemonError;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let project_root = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        std::env::current_dir()?
    };

    let config = Config::for_project(&project_root)?;

    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!(project = %project_root.display(), "starting ojhostd");

    let mut daemon = match DaemonState::startup(config.clone()).await {
        Ok(d) => d,
        Err(e) => {
            write_startup_error(&config, &e);
            error!("failed to start daemon: {e}");
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;
    let mut sighup = signal(SignalKind::hangup())?;

    info!(project_key = daemon.config.identity.project_key(), "daemon ready");
    println!("READY");

    loop {
        tokio::select! {
            Some(event) = daemon.events.recv() => {
                daemon.log_event(&event);
            }

            _ = sigusr1.recv() => {
                info!("received SIGUSR1, reloading");
                daemon.handle_reload_signal().await;
            }

            _ = sighup.recv() => {
                info!("received SIGHUP, reloading");
                daemon.handle_reload_signal().await;
            }

            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                // tick placeholder: component ticking is driven internally
                // by each ProjectHost's own recursive scheduling loops.
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                daemon.shutdown().await;
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                daemon.shutdown().await;
                break;
            }
        }
    }

    info!("daemon stopped");
    Ok(())
}

/// Startup marker prefix written to the log before tracing is initialised,
/// so a wrapper process can find where the current attempt begins.
pub const STARTUP_MARKER_PREFIX: &str = "--- ojhostd: starting (pid: ";

fn write_startup_marker(config: &Config) -> std::io::Result<()> {
    use std::io::Write;
    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&log_path)?;
    writeln!(file, "{}{})", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

fn write_startup_error(config: &Config, error: &DaemonError) {
    use std::io::Write;
    let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(config.log_path()) else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {error}");
}

fn setup_logging(config: &Config) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = config.log_path();
    let parent = log_path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "log path has no parent"))?;
    std::fs::create_dir_all(parent)?;

    let file_name = log_path
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "log path has no file name"))?;
    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}

