#![allow(clippy::missing_errors_doc)]

mod cli;
mod config;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands, MigrateCommands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quckdb=info,quckdb_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch(cli).await
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Seed(args) => cli::seed::run(&cli.mongo_uri, &args).await,
        Commands::Check { style } => cli::check::run(style),
        Commands::Show {
            collection,
            style,
            output,
        } => cli::show::run(collection, style, output.as_deref()),
        Commands::Migrate { command } => match command {
            MigrateCommands::Conversations(args) => {
                cli::migrate::run_conversations(&cli.mongo_uri, &args).await
            }
            MigrateCommands::Messages(args) => {
                cli::migrate::run_messages(&cli.mongo_uri, &args).await
            }
        },
    }
}
