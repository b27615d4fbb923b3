/*
Developer blog:
- The web front end had a little heart button on each job card that kept a list of saved jobs in localStorage,
    and every open tab updated when you clicked it in another one. This crate is that list without the browser.
    The interesting part lives in the `saved` crate, this one is just the commands and the job model.
- Each invocation of the binary is its own "tab". They share the data directory, and `watch` follows
    changes made by the others through the file watcher.
- Config comes from <config dir>/JobBoard/SavedJobs.json, then .env / environment overrides on top.
*/
use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use models::app_state::AppState;
use models::error::AppError;
use saved::config::StoreConfig;
use services::cli_app::{CliApp, Commands};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub mod models;
pub mod routes;
pub mod services;

#[derive(Parser)]
#[command(name = "jobboard", version, about = "Keep a list of saved jobs in sync across sessions")]
struct Cli {
    /// Use this config file instead of the one in the user's config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Config file (or the default one), then environment overrides on top.
pub fn load_config(path: Option<&Path>) -> Result<StoreConfig, AppError> {
    let config = match path {
        Some(path) => StoreConfig::load_from(path),
        None => StoreConfig::load(),
    };
    Ok(config.with_env()?)
}

pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    // logs go to stderr so command output stays clean.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let state = AppState::new(config).context("Unable to open saved jobs storage")?;
    CliApp::new(state).run(cli.command).await?;
    Ok(())
}
