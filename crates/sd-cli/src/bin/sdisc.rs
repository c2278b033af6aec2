// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sdisc - read-only query client against the fleet discovery database.
//!
//! A thin wrapper over `sd_storage::queries`; never opens a write
//! transaction and never runs migrations.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sdisc", version, about = "Query the fleet discovery inventory")]
struct Cli {
    /// Path to the controller's TOML config file, used only for its
    /// `[database]` table.
    #[arg(short = 'c', long = "config", default_value = "sdisc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print fleet-wide aggregate stats.
    Stats,
    /// List every target with its discovery count and last-discovery time.
    Servers,
    /// Show one target's detail: row, tags, and latest snapshot.
    Server { id: String },
    /// Show discovery history for one target.
    Discoveries { target_id: String },
    /// Show one discovery's detail, including its snapshot if it succeeded.
    Discovery { id: String },
    /// Run an ad-hoc read-only SQL statement.
    Query { sql: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

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
    let (db_config, enabled) = match sd_cli::Config::load_database_only(&cli.config) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };
    if !enabled {
        eprintln!("error: [database].enabled is false in {}", cli.config.display());
        return ExitCode::FAILURE;
    }

    let pool = match sd_storage::connect(&db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("error: failed to connect to database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Stats => sd_storage::queries::aggregate_stats(&pool)
            .await
            .map(|v| print_json(&v)),
        Command::Servers => sd_storage::queries::list_targets(&pool)
            .await
            .map(|v| print_json(&v)),
        Command::Server { id } => match sd_storage::queries::target_detail(&pool, &id).await {
            Ok(Some(detail)) => {
                print_json(&detail);
                Ok(())
            }
            Ok(None) => {
                eprintln!("error: no such target: {id}");
                return ExitCode::FAILURE;
            }
            Err(e) => Err(e),
        },
        Command::Discoveries { target_id } => {
            sd_storage::queries::discovery_history(&pool, &target_id)
                .await
                .map(|v| print_json(&v))
        }
        Command::Discovery { id } => match sd_storage::queries::discovery_detail(&pool, &id).await {
            Ok(Some(detail)) => {
                print_json(&detail);
                Ok(())
            }
            Ok(None) => {
                eprintln!("error: no such discovery: {id}");
                return ExitCode::FAILURE;
            }
            Err(e) => Err(e),
        },
        Command::Query { sql } => sd_storage::query_guard::run_ad_hoc_query(&pool, &sql)
            .await
            .map(|rows| print_json(&rows)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("error: failed to serialize result: {e}"),
    }
}
