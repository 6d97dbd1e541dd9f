//! pincheck entry point.

mod args;
mod config;
mod device;
mod prompt;
mod report;
mod scheduler;

use std::future::Future;
use std::io;

use clap::Parser;
use pincheck_core::candidate::SPACE_SIZE;
use pincheck_core::error::PinError;
use tracing::{error, info};

use crate::args::Cli;
use crate::config::Config;
use crate::device::executor::{find_attached, DeviceExecutor};
use crate::device::setup::Negotiator;
use crate::device::AdbExecutor;
use crate::report::ConsoleReporter;
use crate::scheduler::AttemptScheduler;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_cli(&cli);

    let code = match run(&config) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };
    std::process::exit(code);
}

/// Run prompts, setup and the scan. Returns the process exit code.
fn run(config: &Config) -> anyhow::Result<i32> {
    let runtime = tokio::runtime::Runtime::new()?;
    let code = runtime.block_on(interruptible(session(config), shutdown_signal()));
    // A prompt may still be blocked on stdin; don't wait for it.
    runtime.shutdown_background();
    code
}

/// Drive `work` to completion unless `interrupt` fires first.
///
/// An interrupt is a clean shutdown. Dropping `work` kills any in-flight adb
/// child.
async fn interruptible<W, I>(work: W, interrupt: I) -> anyhow::Result<i32>
where
    W: Future<Output = anyhow::Result<i32>>,
    I: Future<Output = &'static str>,
{
    tokio::select! {
        code = work => code,
        signal = interrupt => {
            info!("Received {}, stopping", signal);
            Ok(PinError::interrupted().exit_code())
        }
    }
}

async fn session(config: &Config) -> anyhow::Result<i32> {
    if prompt::is_elevated() && !config.assume_yes {
        eprintln!("Warning: Running pincheck as root is not recommended!");
        let proceed = blocking(|| {
            prompt::confirm(&mut io::stdin().lock(), &mut io::stderr(), "Continue anyway?")
        })
        .await?;
        if !proceed {
            return Ok(1);
        }
    }

    let exec = AdbExecutor::new(config.adb.clone(), config.serial.clone());
    match exec.probe_installed().await {
        Ok(version) => info!("Using {} ({})", exec.program().display(), version),
        Err(e) => {
            error!("{}", e);
            return Ok(e.exit_code());
        }
    }

    if !config.assume_yes {
        println!("{}", prompt::READINESS_TEXT);
        let ready = blocking(|| {
            prompt::wait_for_enter(&mut io::stdin().lock(), &mut io::stdout(), "Press Enter when ready...")
        })
        .await?;
        if !ready {
            return Ok(PinError::interrupted().exit_code());
        }
    }

    Ok(scan(&exec, config).await)
}

/// Run a blocking prompt off the async threads so signals stay responsive.
async fn blocking<T, F>(read: F) -> anyhow::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(read).await??)
}

async fn scan<E: DeviceExecutor>(exec: &E, config: &Config) -> i32 {
    // Only a missing or ambiguous device fails here; an unauthorized one
    // is left to the negotiator.
    let device = match find_attached(exec, config.serial.as_deref()).await {
        Ok(device) => device,
        Err(e) => {
            error!("{}", e);
            return e.exit_code();
        }
    };
    info!("Found device {} ({})", device.serial, device.state.as_str());

    if !config.skip_setup && !Negotiator::new(exec).ensure_ready().await {
        error!("{}", PinError::device_not_ready("not authorized"));
        return 1;
    }

    let reporter = ConsoleReporter::new(config.json);
    let scheduler = AttemptScheduler::new(exec, &reporter)
        .with_marker_rule(config.marker_rule.clone())
        .with_serial(config.serial.clone());

    match scheduler.run(SPACE_SIZE).await {
        Ok(summary) => {
            if config.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("{}", PinError::unexpected(e.to_string()));
                        return 1;
                    }
                }
            }
            0
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    }
}

/// First of SIGINT or SIGTERM.
async fn shutdown_signal() -> &'static str {
    tokio::select! {
        _ = sigint() => "SIGINT",
        _ = sigterm() => "SIGTERM",
    }
}

/// Wait for Ctrl+C.
///
/// If the handler cannot be installed, logs a warning and waits indefinitely.
async fn sigint() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Wait for SIGTERM signal (Unix only).
///
/// If signal registration fails, logs a warning and waits indefinitely.
#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(
                "Failed to register SIGTERM handler: {}, only SIGINT will stop pincheck",
                e
            );
            std::future::pending::<()>().await;
        }
    }
}

/// SIGTERM is not available on non-Unix platforms; use a never-completing future.
#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}
