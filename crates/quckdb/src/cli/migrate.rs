use anyhow::{Context, Result};
use bson::Document;
use tracing::{info, warn};

use quckdb_core::migrate::{
    migrate_conversations, migrate_messages, mongo_counts, mongo_message_count, open_source,
    MessageStats, MessageVerification, MigrationStats, PgConversationSink, ScyllaMessageSink,
    Verification, CONVERSATIONS, MESSAGES,
};
use quckdb_core::MongoStore;

use super::{ConversationsArgs, MessagesArgs};
use crate::config::redact;

pub async fn run_conversations(mongo_uri: &str, args: &ConversationsArgs) -> Result<()> {
    info!("Starting conversation migration");
    info!("  MongoDB URI    : {}", redact(mongo_uri));
    info!("  MongoDB DB     : {}", args.mongo_db);
    info!("  PostgreSQL URI : {}", redact(&args.postgres_uri));
    info!("  Batch size     : {}", args.batch_size);

    let mongo = MongoStore::connect(mongo_uri, &args.mongo_db)
        .await
        .with_context(|| format!("failed to connect to {}", redact(mongo_uri)))?;
    let mut sink = PgConversationSink::connect(&args.postgres_uri)
        .await
        .with_context(|| format!("failed to connect to {}", redact(&args.postgres_uri)))?;
    info!("Connected to PostgreSQL at {}", redact(&args.postgres_uri));

    let outcome = tokio::select! {
        result = copy(&mongo, &mut sink, args) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(result) = outcome else {
        warn!("Migration interrupted by user");
        sink.close().await;
        anyhow::bail!("interrupted");
    };
    let stats = match result {
        Ok(stats) => stats,
        Err(err) => {
            sink.close().await;
            return Err(err.context("migration failed"));
        }
    };

    if args.verify {
        let verification = Verification {
            mongo: mongo_counts(mongo.database()).await?,
            postgres: sink.counts().await?,
        };
        verification.log();
    }

    sink.close().await;
    info!(
        "Done. {} conversations and {} participants migrated successfully.",
        stats.conversations, stats.participants
    );
    Ok(())
}

async fn copy(
    mongo: &MongoStore,
    sink: &mut PgConversationSink,
    args: &ConversationsArgs,
) -> Result<MigrationStats> {
    let estimated = mongo
        .database()
        .collection::<Document>(CONVERSATIONS)
        .estimated_document_count()
        .await?;
    info!("Estimated {estimated} conversations in MongoDB");

    let source = open_source(mongo.database(), CONVERSATIONS, args.batch_size).await?;
    let batch_size = usize::try_from(args.batch_size).unwrap_or(usize::MAX);
    let stats = migrate_conversations(source, sink, batch_size, estimated).await?;
    Ok(stats)
}

pub async fn run_messages(mongo_uri: &str, args: &MessagesArgs) -> Result<()> {
    let hosts: Vec<String> = args
        .scylla_hosts
        .iter()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect();

    info!("Starting message migration");
    info!("  MongoDB URI    : {}", redact(mongo_uri));
    info!("  MongoDB DB     : {}", args.mongo_db);
    info!("  ScyllaDB hosts : {}", hosts.join(","));
    info!("  Keyspace       : {}", args.scylla_keyspace);
    info!("  Batch size     : {}", args.batch_size);

    if hosts.is_empty() {
        anyhow::bail!("no ScyllaDB hosts given");
    }

    let mongo = MongoStore::connect(mongo_uri, &args.mongo_db)
        .await
        .with_context(|| format!("failed to connect to {}", redact(mongo_uri)))?;
    let mut sink = ScyllaMessageSink::connect(&hosts, &args.scylla_keyspace)
        .await
        .with_context(|| format!("failed to connect to ScyllaDB at {}", hosts.join(",")))?;

    let outcome = tokio::select! {
        result = copy_messages(&mongo, &mut sink, args) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(result) = outcome else {
        warn!("Migration interrupted by user");
        anyhow::bail!("interrupted");
    };
    let stats = result.context("migration failed")?;

    if args.verify {
        let verification = MessageVerification {
            mongo: mongo_message_count(mongo.database()).await?,
            scylla: sink.counts().await?,
        };
        verification.log();
    }

    info!(
        "Done. {} messages migrated successfully ({} reactions, {} deliveries, {} read receipts).",
        stats.messages, stats.reactions, stats.deliveries, stats.read_receipts
    );
    Ok(())
}

async fn copy_messages(
    mongo: &MongoStore,
    sink: &mut ScyllaMessageSink,
    args: &MessagesArgs,
) -> Result<MessageStats> {
    let estimated = mongo_message_count(mongo.database()).await?;
    info!("Estimated {estimated} messages in MongoDB");

    let source = open_source(mongo.database(), MESSAGES, args.batch_size).await?;
    let batch_size = usize::try_from(args.batch_size).unwrap_or(usize::MAX);
    let stats = migrate_messages(source, sink, batch_size, estimated).await?;
    Ok(stats)
}
