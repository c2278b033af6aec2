// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sdiscd - fleet discovery controller daemon.
//!
//! Loads a config file, runs one discovery sweep across every configured
//! target, persists results, and — with `--serve` — keeps the read API
//! listening afterward until a termination signal arrives.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sdiscd", version, about = "Fleet discovery controller daemon")]
struct Cli {
    /// Path to the controller's TOML config file.
    #[arg(short = 'c', long = "config", default_value = "sdisc.toml")]
    config: PathBuf,

    /// Keep the read API serving after the sweep completes, until a
    /// termination signal arrives.
    #[arg(long)]
    serve: bool,

    /// Directory for rolling log files. Logs to stderr only when omitted.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = setup_logging(cli.log_dir.as_deref());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let config = match sd_cli::Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let db = match sd_cli::facade::open_database(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    info!(targets = config.targets.len(), "starting discovery sweep");
    let summary = sd_cli::facade::run_discovery(&config, db.as_ref()).await;
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        timed_out = summary.timed_out,
        cancelled = summary.cancelled,
        "discovery sweep complete"
    );

    if cli.serve {
        let Some(db) = db else {
            error!("--serve requires [database].enabled = true");
            return ExitCode::FAILURE;
        };
        if let Err(e) = sd_cli::facade::serve(&config, db).await {
            error!(error = %e, "read API server exited with an error");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn setup_logging(log_dir: Option<&std::path::Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("warning: could not create log directory {}: {e}", dir.display());
            }
            let appender = tracing_appender::rolling::daily(dir, "sdiscd.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            None
        }
    }
}
