use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::batch::{Batch, BatchType};
use scylla::frame::value::CqlTimestamp;
use scylla::prepared_statement::PreparedStatement;
use scylla::serialize::row::SerializeRow;
use scylla::{Session, SessionBuilder};
use uuid::Uuid;

use super::message::{
    DeliveryRow, MessageBatch, MessageCounts, MessageRow, MessageSink, ReactionRow, ReadReceiptRow,
};
use crate::Result;

/// Statements per unlogged batch.
const CHUNK: usize = 50;

const INSERT_MESSAGE: &str = r"
    INSERT INTO messages (
        conversation_id, created_at, message_id, sender_id, type, content,
        reply_to_id, mentions, attachments, is_edited, is_deleted, deleted_by,
        deleted_for, edited_at, edit_history, is_forwarded, client_id, metadata
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const INSERT_MESSAGE_BY_SENDER: &str = r"
    INSERT INTO messages_by_sender (
        sender_id, created_at, message_id, conversation_id, content
    ) VALUES (?, ?, ?, ?, ?)
";

const INSERT_REACTION: &str = r"
    INSERT INTO message_reactions (
        conversation_id, message_id, emoji, user_id, created_at
    ) VALUES (?, ?, ?, ?, ?)
";

const INSERT_DELIVERY_RECEIPT: &str = r"
    INSERT INTO delivery_receipts (
        conversation_id, message_id, user_id, delivered_at
    ) VALUES (?, ?, ?, ?)
";

const INSERT_READ_RECEIPT: &str = r"
    INSERT INTO read_receipts (
        conversation_id, user_id, last_read_at, last_read_msg
    ) VALUES (?, ?, ?, ?)
";

fn cql_time(at: Option<DateTime<Utc>>) -> Option<CqlTimestamp> {
    at.map(|t| CqlTimestamp(t.timestamp_millis()))
}

#[derive(scylla::SerializeRow)]
struct MessageValues<'a> {
    conversation_id: Option<&'a str>,
    created_at: Option<CqlTimestamp>,
    message_id: Uuid,
    sender_id: Option<&'a str>,
    #[scylla(rename = "type")]
    kind: Option<&'a str>,
    content: Option<&'a str>,
    reply_to_id: Option<Uuid>,
    mentions: Option<&'a BTreeSet<String>>,
    attachments: Option<&'a str>,
    is_edited: bool,
    is_deleted: bool,
    deleted_by: Option<&'a str>,
    deleted_for: Option<&'a BTreeSet<String>>,
    edited_at: Option<CqlTimestamp>,
    edit_history: Option<&'a str>,
    is_forwarded: bool,
    client_id: Option<&'a str>,
    metadata: Option<BTreeMap<String, String>>,
}

impl<'a> From<&'a MessageRow> for MessageValues<'a> {
    fn from(row: &'a MessageRow) -> Self {
        Self {
            conversation_id: row.conversation_id.as_deref(),
            created_at: cql_time(row.created_at),
            message_id: row.message_id,
            sender_id: row.sender_id.as_deref(),
            kind: row.kind.as_deref(),
            content: row.content.as_deref(),
            reply_to_id: row.reply_to_id,
            mentions: row.mentions.as_ref(),
            attachments: row.attachments.as_deref(),
            is_edited: row.is_edited,
            is_deleted: row.is_deleted,
            deleted_by: row.deleted_by.as_deref(),
            deleted_for: row.deleted_for.as_ref(),
            edited_at: cql_time(row.edited_at),
            edit_history: row.edit_history.as_deref(),
            is_forwarded: false,
            client_id: None,
            metadata: None,
        }
    }
}

#[derive(scylla::SerializeRow)]
struct BySenderValues<'a> {
    sender_id: Option<&'a str>,
    created_at: Option<CqlTimestamp>,
    message_id: Uuid,
    conversation_id: Option<&'a str>,
    content: Option<&'a str>,
}

impl<'a> From<&'a MessageRow> for BySenderValues<'a> {
    fn from(row: &'a MessageRow) -> Self {
        Self {
            sender_id: row.sender_id.as_deref(),
            created_at: cql_time(row.created_at),
            message_id: row.message_id,
            conversation_id: row.conversation_id.as_deref(),
            content: row.content.as_deref(),
        }
    }
}

#[derive(scylla::SerializeRow)]
struct ReactionValues<'a> {
    conversation_id: Option<&'a str>,
    message_id: Uuid,
    emoji: Option<&'a str>,
    user_id: Option<&'a str>,
    created_at: Option<CqlTimestamp>,
}

impl<'a> From<&'a ReactionRow> for ReactionValues<'a> {
    fn from(row: &'a ReactionRow) -> Self {
        Self {
            conversation_id: row.conversation_id.as_deref(),
            message_id: row.message_id,
            emoji: row.emoji.as_deref(),
            user_id: row.user_id.as_deref(),
            created_at: cql_time(row.created_at),
        }
    }
}

#[derive(scylla::SerializeRow)]
struct DeliveryValues<'a> {
    conversation_id: Option<&'a str>,
    message_id: Uuid,
    user_id: Option<&'a str>,
    delivered_at: Option<CqlTimestamp>,
}

impl<'a> From<&'a DeliveryRow> for DeliveryValues<'a> {
    fn from(row: &'a DeliveryRow) -> Self {
        Self {
            conversation_id: row.conversation_id.as_deref(),
            message_id: row.message_id,
            user_id: row.user_id.as_deref(),
            delivered_at: cql_time(row.delivered_at),
        }
    }
}

#[derive(scylla::SerializeRow)]
struct ReadReceiptValues<'a> {
    conversation_id: Option<&'a str>,
    user_id: &'a str,
    last_read_at: CqlTimestamp,
    last_read_msg: Uuid,
}

impl<'a> From<&'a ReadReceiptRow> for ReadReceiptValues<'a> {
    fn from(row: &'a ReadReceiptRow) -> Self {
        Self {
            conversation_id: row.conversation_id.as_deref(),
            user_id: &row.user_id,
            last_read_at: CqlTimestamp(row.last_read_at.timestamp_millis()),
            last_read_msg: row.last_read_msg,
        }
    }
}

/// Writes message batches into a ScyllaDB keyspace with prepared statements,
/// split into unlogged batches of [`CHUNK`] statements.
pub struct ScyllaMessageSink {
    session: Session,
    insert_message: PreparedStatement,
    insert_by_sender: PreparedStatement,
    insert_reaction: PreparedStatement,
    insert_delivery: PreparedStatement,
    insert_read_receipt: PreparedStatement,
}

impl ScyllaMessageSink {
    pub async fn connect(hosts: &[String], keyspace: &str) -> Result<Self> {
        let session = SessionBuilder::new()
            .known_nodes(hosts)
            .use_keyspace(keyspace, false)
            .build()
            .await?;
        tracing::info!("Connected to ScyllaDB keyspace '{}' on {:?}", keyspace, hosts);

        Ok(Self {
            insert_message: session.prepare(INSERT_MESSAGE).await?,
            insert_by_sender: session.prepare(INSERT_MESSAGE_BY_SENDER).await?,
            insert_reaction: session.prepare(INSERT_REACTION).await?,
            insert_delivery: session.prepare(INSERT_DELIVERY_RECEIPT).await?,
            insert_read_receipt: session.prepare(INSERT_READ_RECEIPT).await?,
            session,
        })
    }

    pub async fn counts(&self) -> Result<MessageCounts> {
        Ok(MessageCounts {
            messages: self.count("messages").await?,
            by_sender: self.count("messages_by_sender").await?,
            reactions: self.count("message_reactions").await?,
            read_receipts: self.count("read_receipts").await?,
            deliveries: self.count("delivery_receipts").await?,
        })
    }

    async fn count(&self, table: &str) -> Result<u64> {
        let (n,) = self
            .session
            .query_unpaged(format!("SELECT COUNT(*) FROM {table}"), ())
            .await?
            .single_row_typed::<(i64,)>()?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn execute<R>(&self, statement: &PreparedStatement, rows: &[R]) -> Result<()>
    where
        R: SerializeRow + Sync,
    {
        for chunk in rows.chunks(CHUNK) {
            let mut batch = Batch::new(BatchType::Unlogged);
            for _ in chunk {
                batch.append_statement(statement.clone());
            }
            let values: Vec<&R> = chunk.iter().collect();
            self.session.batch(&batch, values).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSink for ScyllaMessageSink {
    async fn write_batch(&mut self, batch: &MessageBatch) -> Result<()> {
        let messages: Vec<MessageValues<'_>> = batch.messages.iter().map(Into::into).collect();
        let by_sender: Vec<BySenderValues<'_>> = batch.messages.iter().map(Into::into).collect();
        let reactions: Vec<ReactionValues<'_>> = batch.reactions.iter().map(Into::into).collect();
        let deliveries: Vec<DeliveryValues<'_>> =
            batch.deliveries.iter().map(Into::into).collect();

        self.execute(&self.insert_message, &messages).await?;
        self.execute(&self.insert_by_sender, &by_sender).await?;
        self.execute(&self.insert_reaction, &reactions).await?;
        self.execute(&self.insert_delivery, &deliveries).await?;

        tracing::debug!(
            "Flushed {} messages, {} reactions, {} deliveries",
            messages.len(),
            reactions.len(),
            deliveries.len()
        );
        Ok(())
    }

    async fn write_read_receipts(&mut self, receipts: &[ReadReceiptRow]) -> Result<()> {
        let values: Vec<ReadReceiptValues<'_>> = receipts.iter().map(Into::into).collect();
        self.execute(&self.insert_read_receipt, &values).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cql_time_is_millis() {
        let at = DateTime::parse_from_rfc3339("2024-03-01T12:30:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(cql_time(Some(at)), Some(CqlTimestamp(1_709_296_200_250)));
        assert_eq!(cql_time(None), None);
    }

    #[test]
    fn test_message_values_fill_constant_columns() {
        let row = MessageRow {
            conversation_id: Some("conv-1".into()),
            created_at: None,
            message_id: Uuid::nil(),
            sender_id: Some("user-1".into()),
            kind: Some("text".into()),
            content: Some("hi".into()),
            reply_to_id: None,
            mentions: None,
            attachments: None,
            is_edited: false,
            is_deleted: false,
            deleted_by: None,
            deleted_for: None,
            edited_at: None,
            edit_history: None,
        };
        let values = MessageValues::from(&row);
        assert!(!values.is_forwarded);
        assert!(values.client_id.is_none());
        assert!(values.metadata.is_none());

        let by_sender = BySenderValues::from(&row);
        assert_eq!(by_sender.sender_id, Some("user-1"));
        assert_eq!(by_sender.conversation_id, Some("conv-1"));
    }
}
