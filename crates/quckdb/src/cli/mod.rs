pub mod check;
pub mod migrate;
pub mod seed;
pub mod show;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quckdb_core::{Collection, FieldStyle};

use crate::config::{DEFAULT_MONGO_URI, DEFAULT_POSTGRES_URI};

#[derive(Parser)]
#[command(
    name = "quckdb",
    about = "Seed and migrate QuckApp development databases",
    version
)]
pub struct Cli {
    /// MongoDB connection URI
    #[arg(long, global = true, env = "QUCKDB_MONGO_URI", default_value = DEFAULT_MONGO_URI)]
    pub mongo_uri: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Insert the development seed data
    Seed(SeedArgs),
    /// Run integrity checks on the seed data without touching a database
    Check {
        /// Field naming convention (camel or snake)
        #[arg(long, default_value = "camel")]
        style: FieldStyle,
    },
    /// Print the documents for one collection as JSON lines
    Show {
        /// Collection name (audit_logs, activity_logs, file_metadata, user_presence)
        collection: Collection,
        /// Field naming convention (camel or snake)
        #[arg(long, default_value = "camel")]
        style: FieldStyle,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// One-shot data migrations
    Migrate {
        #[command(subcommand)]
        command: MigrateCommands,
    },
}

#[derive(Args)]
pub struct SeedArgs {
    /// Target database
    #[arg(long, default_value = "quckapp")]
    pub database: String,
    /// Field naming convention (camel or snake)
    #[arg(long, default_value = "camel")]
    pub style: FieldStyle,
    /// Drop the seeded collections first
    #[arg(long)]
    pub fresh: bool,
    /// Render and count documents without connecting
    #[arg(long)]
    pub dry_run: bool,
    /// Compare collection counts with the dataset afterwards
    #[arg(long)]
    pub verify: bool,
}

#[derive(Subcommand)]
pub enum MigrateCommands {
    /// Copy conversations and participants from MongoDB to PostgreSQL
    Conversations(ConversationsArgs),
    /// Copy messages, reactions and receipts from MongoDB to ScyllaDB
    Messages(MessagesArgs),
}

#[derive(Args)]
pub struct ConversationsArgs {
    /// MongoDB database holding the `conversations` collection
    #[arg(long, default_value = "quckapp_gateway")]
    pub mongo_db: String,
    /// PostgreSQL connection URI
    #[arg(long, env = "QUCKDB_POSTGRES_URI", default_value = DEFAULT_POSTGRES_URI)]
    pub postgres_uri: String,
    /// Conversations per committed batch
    #[arg(long, default_value_t = 500)]
    pub batch_size: u32,
    /// Compare record counts in both databases afterwards
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args)]
pub struct MessagesArgs {
    /// MongoDB database holding the `messages` collection
    #[arg(long, default_value = "quckapp")]
    pub mongo_db: String,
    /// Comma-separated ScyllaDB contact points
    #[arg(
        long,
        env = "QUCKDB_SCYLLA_HOSTS",
        value_delimiter = ',',
        default_value = "localhost"
    )]
    pub scylla_hosts: Vec<String>,
    /// ScyllaDB keyspace
    #[arg(long, default_value = "quckapp")]
    pub scylla_keyspace: String,
    /// Pending statements before a flush
    #[arg(long, default_value_t = 1000)]
    pub batch_size: u32,
    /// Compare record counts in both databases afterwards
    #[arg(long)]
    pub verify: bool,
}
