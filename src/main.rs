use std::path::PathBuf;

use anyhow::Context;
use axum::extract::FromRef;
use clap::{Parser, Subcommand};

mod clock;
mod commands;
mod config;
mod controllers;
mod db;
mod error;
mod id;
mod models;
mod types;

use config::Config;
use db::Database;
pub(crate) use error::ApiResult;

/// A small pastebin whose pastes expire by time or by view count.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the config file. Defaults to the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Delete pastes that have expired or run out of views, then exit.
    PurgeExpired,
    /// Show a paste's accounting state without counting a view.
    Inspect {
        /// Id of the paste.
        id: String,
    },
}

#[derive(Clone, FromRef)]
pub struct App {
    pub(crate) config: Config,
    pub(crate) database: Database,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let database = Database::connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    let app = App { config, database };

    match cli.command {
        Command::Serve => commands::serve::run(app).await,
        Command::PurgeExpired => commands::purge_expired::run(app).await,
        Command::Inspect { id } => commands::inspect::run(app, &id).await,
    }
}
