// println!/eprintln! are the correct output mechanism for CLI tools (not tracing).
#![allow(clippy::print_stdout, clippy::print_stderr)]

//! TaskHub CLI - Run Job
//!
//! Runs one sweep job once, for use from cron or another external scheduler.
//! Notifications are stored; nobody is connected to this process, so no push
//! reaches a live client.
//! Usage: cargo run --bin run_job -- <check-due|daily-summary|cleanup>

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use taskhub_web::AppState;
use taskhub_web::config::Config;
use taskhub_web::db::create_pool;
use taskhub_web::jobs::{JobKind, run_once};
use taskhub_web::store::PgStore;

#[tokio::main]
async fn main() -> ExitCode {
    let Some(kind) = std::env::args().nth(1).as_deref().and_then(JobKind::parse) else {
        eprintln!("Usage: run_job <check-due|daily-summary|cleanup>");
        return ExitCode::FAILURE;
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("taskhub_web={}", config.logging.level).into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pool = match create_pool(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to create database pool: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(config, Arc::new(PgStore::new(pool))) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to initialise: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_once(kind, &*state.store, &state.dispatcher, &state.config.jobs).await {
        Ok(()) => {
            println!("Job {} finished.", kind.as_str());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Job {} failed: {}", kind.as_str(), e);
            ExitCode::FAILURE
        }
    }
}
