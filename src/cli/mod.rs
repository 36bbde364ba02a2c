pub mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::database::{DatabaseManager, Store};

#[derive(Parser)]
#[command(name = "cardstack-api")]
#[command(about = "Cardstack API - digital business card platform server")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides API_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Create an admin account")]
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(config, port).await,
        Commands::CreateAdmin { name, email, password } => {
            commands::create_admin::handle(config, name, email, password, output_format).await
        }
    }
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise the in-memory store
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Store> {
    if config.database.url.is_none() {
        tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on exit)");
        return Ok(Store::memory());
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to PostgreSQL")?;
    Store::postgres(pool).await.context("failed to prepare tables")
}
