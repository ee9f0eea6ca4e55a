mod auth;
mod config;
mod db;
mod error;
mod integrity;
mod ipc;
mod model;
mod seed;
mod stats;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "colegiod")]
#[command(about = "School demo-data generator and dashboard sidecar", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer line-delimited JSON requests on stdin (default)
    Serve,
    /// Wipe the workspace store and generate a full demo school
    Seed {
        #[arg(short, long)]
        workspace: PathBuf,
        /// JSON file with SeedConfig overrides
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Date treated as "today" (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<NaiveDate>,
    },
    /// Print per-table row counts as JSON
    Counts {
        #[arg(short, long)]
        workspace: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("COLEGIOD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            serve();
            Ok(())
        }
        Command::Seed {
            workspace,
            config,
            seed,
            reference_date,
        } => run_seed_command(workspace, config, seed, reference_date),
        Command::Counts { workspace } => print_counts(workspace),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run_seed_command(
    workspace: PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
    reference_date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let mut cfg = match config {
        Some(path) => config::SeedConfig::from_json_file(&path)?,
        None => config::SeedConfig::default(),
    };
    if seed.is_some() {
        cfg.rng_seed = seed;
    }
    if reference_date.is_some() {
        cfg.reference_date = reference_date;
    }

    let mut conn = db::open_db(&workspace)
        .with_context(|| format!("failed to open workspace {}", workspace.to_string_lossy()))?;
    let summary = seed::run_seed(&mut conn, &cfg)?;
    info!(
        seed = summary.rng_seed,
        students = summary.count(db::Entity::Student),
        "seed finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_counts(workspace: PathBuf) -> anyhow::Result<()> {
    let conn = db::open_db(&workspace)
        .with_context(|| format!("failed to open workspace {}", workspace.to_string_lossy()))?;
    let counts = db::entity_counts(&conn)?;
    println!("{}", serde_json::to_string_pretty(&db::counts_json(&counts))?);
    Ok(())
}

fn serve() {
    let mut state = ipc::AppState::default();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    info!("serving on stdin/stdout");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                // Best effort: echo the id back if the line was at least an object with one.
                let id = serde_json::from_str::<serde_json::Value>(&line)
                    .ok()
                    .and_then(|v| v.get("id").and_then(|i| i.as_str()).map(str::to_string))
                    .unwrap_or_default();
                ipc::err(&id, "bad_json", e.to_string(), None)
            }
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
