use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use mongodb::Database;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::convert::{or_default, text, to_timestamp, truthy};
use crate::ids::object_id_to_uuid;
use crate::{Error, Result};

pub const MESSAGES: &str = "messages";

const PROGRESS_EVERY: u64 = 1000;

/// One row of the `messages` table. The same row also feeds
/// `messages_by_sender`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRow {
    pub conversation_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub message_id: Uuid,
    pub sender_id: Option<String>,
    pub kind: Option<String>,
    pub content: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub mentions: Option<BTreeSet<String>>,
    pub attachments: Option<String>,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub deleted_by: Option<String>,
    pub deleted_for: Option<BTreeSet<String>>,
    pub edited_at: Option<DateTime<Utc>>,
    pub edit_history: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionRow {
    pub conversation_id: Option<String>,
    pub message_id: Uuid,
    pub emoji: Option<String>,
    pub user_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryRow {
    pub conversation_id: Option<String>,
    pub message_id: Uuid,
    pub user_id: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Last-read position of one user in one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadReceiptRow {
    pub conversation_id: Option<String>,
    pub user_id: String,
    pub last_read_at: DateTime<Utc>,
    pub last_read_msg: Uuid,
}

/// A source message split into its target rows. Reads stay raw until every
/// message has been seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedMessage {
    pub message: MessageRow,
    pub reactions: Vec<ReactionRow>,
    pub deliveries: Vec<DeliveryRow>,
    pub reads: Vec<(String, DateTime<Utc>)>,
}

/// Non-empty arrays become a set of their string forms; anything else is
/// `None`, which the target stores as null.
#[must_use]
pub fn safe_set(value: Option<&Bson>) -> Option<BTreeSet<String>> {
    let Some(Bson::Array(items)) = value else {
        return None;
    };
    let set: BTreeSet<String> = items.iter().filter_map(|v| text(Some(v))).collect();
    (!set.is_empty()).then_some(set)
}

#[derive(Serialize)]
struct AttachmentJson {
    id: String,
    file_type: Value,
    file_name: Value,
    file_size: Value,
    url: Value,
    thumbnail_url: Value,
}

#[derive(Serialize)]
struct EditJson {
    content: Value,
    edited_at: String,
}

fn json_or(doc: &Document, key: &str, default: Value) -> Value {
    doc.get(key).map_or(default, |v| v.clone().into_relaxed_extjson())
}

fn subdocuments(value: Option<&Bson>) -> impl Iterator<Item = &Document> {
    value
        .and_then(Bson::as_array)
        .into_iter()
        .flatten()
        .filter_map(Bson::as_document)
}

/// Attachments as a JSON array string, keeping only the fields clients read.
pub fn serialize_attachments(value: Option<&Bson>) -> Result<Option<String>> {
    if !truthy(value) {
        return Ok(None);
    }
    let cleaned: Vec<AttachmentJson> = subdocuments(value)
        .map(|att| AttachmentJson {
            id: text(att.get("id")).unwrap_or_default(),
            file_type: json_or(att, "file_type", Value::from("")),
            file_name: json_or(att, "file_name", Value::from("")),
            file_size: json_or(att, "file_size", Value::from(0)),
            url: json_or(att, "url", Value::from("")),
            thumbnail_url: json_or(att, "thumbnail_url", Value::from("")),
        })
        .collect();
    Ok(Some(serde_json::to_string(&cleaned)?))
}

/// Edit history as a JSON array string with RFC 3339 edit times.
pub fn serialize_edit_history(value: Option<&Bson>) -> Result<Option<String>> {
    if !truthy(value) {
        return Ok(None);
    }
    let cleaned: Vec<EditJson> = subdocuments(value)
        .map(|entry| EditJson {
            content: json_or(entry, "content", Value::from("")),
            edited_at: match entry.get("edited_at") {
                Some(Bson::DateTime(dt)) => dt.to_chrono().to_rfc3339(),
                other => text(other).unwrap_or_default(),
            },
        })
        .collect();
    Ok(Some(serde_json::to_string(&cleaned)?))
}

pub fn map_message(doc: &Document) -> Result<MappedMessage> {
    let id = doc.get("_id").ok_or(Error::MissingField("_id"))?;
    let message_id = object_id_to_uuid(id);

    let nothing = Bson::String(String::new());
    let plain = Bson::String("text".to_string());
    let conversation_id = text(Some(or_default(doc, "conversation_id", &nothing)));

    let message = MessageRow {
        conversation_id: conversation_id.clone(),
        created_at: to_timestamp(doc.get("created_at")),
        message_id,
        sender_id: text(Some(or_default(doc, "sender_id", &nothing))),
        kind: text(Some(or_default(doc, "type", &plain))),
        content: text(Some(or_default(doc, "content", &nothing))),
        reply_to_id: doc
            .get("reply_to")
            .filter(|v| truthy(Some(*v)))
            .map(object_id_to_uuid),
        mentions: safe_set(doc.get("mentions")),
        attachments: serialize_attachments(doc.get("attachments"))?,
        is_edited: truthy(doc.get("edited")),
        is_deleted: truthy(doc.get("deleted")),
        deleted_by: text(doc.get("deleted_by")),
        deleted_for: safe_set(doc.get("deleted_for")),
        edited_at: to_timestamp(doc.get("edited_at")),
        edit_history: serialize_edit_history(doc.get("edit_history"))?,
    };

    let reactions = subdocuments(doc.get("reactions"))
        .map(|reaction| ReactionRow {
            conversation_id: conversation_id.clone(),
            message_id,
            emoji: text(Some(or_default(reaction, "emoji", &nothing))),
            user_id: text(Some(or_default(reaction, "user_id", &nothing))),
            created_at: to_timestamp(reaction.get("created_at")),
        })
        .collect();

    let deliveries = subdocuments(doc.get("delivered_to"))
        .map(|delivery| DeliveryRow {
            conversation_id: conversation_id.clone(),
            message_id,
            user_id: text(Some(or_default(delivery, "user_id", &nothing))),
            delivered_at: to_timestamp(delivery.get("delivered_at")),
        })
        .collect();

    // Entries without a user or a read time cannot position a receipt.
    let reads = subdocuments(doc.get("read_by"))
        .filter_map(|entry| {
            let user_id = text(entry.get("user_id")).filter(|u| !u.is_empty())?;
            let read_at = to_timestamp(entry.get("read_at"))?;
            Some((user_id, read_at))
        })
        .collect();

    Ok(MappedMessage {
        message,
        reactions,
        deliveries,
        reads,
    })
}

/// Rows pending one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBatch {
    pub messages: Vec<MessageRow>,
    pub reactions: Vec<ReactionRow>,
    pub deliveries: Vec<DeliveryRow>,
}

impl MessageBatch {
    /// Number of insert statements the batch turns into. Every message is
    /// written twice: once to `messages`, once to `messages_by_sender`.
    #[must_use]
    pub fn statements(&self) -> usize {
        self.messages.len() * 2 + self.reactions.len() + self.deliveries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements() == 0
    }

    fn push(&mut self, mapped: MappedMessage) {
        self.messages.push(mapped.message);
        self.reactions.extend(mapped.reactions);
        self.deliveries.extend(mapped.deliveries);
    }

    fn clear(&mut self) {
        self.messages.clear();
        self.reactions.clear();
        self.deliveries.clear();
    }
}

/// Destination for migrated messages.
#[async_trait]
pub trait MessageSink: Send {
    async fn write_batch(&mut self, batch: &MessageBatch) -> Result<()>;

    async fn write_read_receipts(&mut self, receipts: &[ReadReceiptRow]) -> Result<()>;
}

/// Latest read per (conversation, user). A later message only moves the
/// receipt forward when its read time is strictly newer.
#[derive(Debug, Default)]
struct LatestReads {
    latest: BTreeMap<(Option<String>, String), (DateTime<Utc>, Uuid)>,
}

impl LatestReads {
    fn observe(
        &mut self,
        conversation_id: Option<&str>,
        message_id: Uuid,
        reads: Vec<(String, DateTime<Utc>)>,
    ) {
        for (user_id, read_at) in reads {
            let key = (conversation_id.map(str::to_string), user_id);
            match self.latest.get(&key) {
                Some((seen, _)) if *seen >= read_at => {}
                _ => {
                    self.latest.insert(key, (read_at, message_id));
                }
            }
        }
    }

    fn into_rows(self) -> Vec<ReadReceiptRow> {
        self.latest
            .into_iter()
            .map(|((conversation_id, user_id), (last_read_at, last_read_msg))| ReadReceiptRow {
                conversation_id,
                user_id,
                last_read_at,
                last_read_msg,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageStats {
    pub messages: u64,
    pub reactions: u64,
    pub deliveries: u64,
    pub read_receipts: u64,
    pub batches: u64,
}

/// Stream messages into `sink`, flushing whenever the pending batch reaches
/// `batch_size` statements. Read receipts are written once at the end.
pub async fn migrate_messages<St, K>(
    mut documents: St,
    sink: &mut K,
    batch_size: usize,
    estimated_total: u64,
) -> Result<MessageStats>
where
    St: Stream<Item = Result<Document>> + Unpin,
    K: MessageSink + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut stats = MessageStats::default();
    let mut batch = MessageBatch::default();
    let mut reads = LatestReads::default();

    while let Some(doc) = documents.try_next().await? {
        let mut mapped = map_message(&doc)?;

        reads.observe(
            mapped.message.conversation_id.as_deref(),
            mapped.message.message_id,
            std::mem::take(&mut mapped.reads),
        );
        stats.reactions += mapped.reactions.len() as u64;
        stats.deliveries += mapped.deliveries.len() as u64;
        stats.messages += 1;
        batch.push(mapped);

        if batch.statements() >= batch_size {
            sink.write_batch(&batch).await?;
            stats.batches += 1;
            batch.clear();
        }

        if stats.messages % PROGRESS_EVERY == 0 {
            info!(
                "Progress: {} / ~{} messages migrated",
                stats.messages, estimated_total
            );
        }
    }

    if !batch.is_empty() {
        sink.write_batch(&batch).await?;
        stats.batches += 1;
    }

    let receipts = reads.into_rows();
    info!("Writing {} read receipts", receipts.len());
    if !receipts.is_empty() {
        sink.write_read_receipts(&receipts).await?;
    }
    stats.read_receipts = receipts.len() as u64;

    info!("Migration complete: {} messages migrated", stats.messages);
    Ok(stats)
}

pub async fn mongo_message_count(db: &Database) -> Result<u64> {
    Ok(db
        .collection::<Document>(MESSAGES)
        .estimated_document_count()
        .await?)
}

/// Row counts of the message tables on the target side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageCounts {
    pub messages: u64,
    pub by_sender: u64,
    pub reactions: u64,
    pub read_receipts: u64,
    pub deliveries: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageVerification {
    pub mongo: u64,
    pub scylla: MessageCounts,
}

impl MessageVerification {
    /// Source messages, target messages and the sender index all agree.
    #[must_use]
    pub const fn matches(&self) -> bool {
        self.mongo == self.scylla.messages && self.scylla.messages == self.scylla.by_sender
    }

    pub fn log(&self) {
        info!("--- Verification ---");
        info!("MongoDB messages           : {}", self.mongo);
        info!("ScyllaDB messages          : {}", self.scylla.messages);
        info!("ScyllaDB messages_by_sender: {}", self.scylla.by_sender);
        info!("ScyllaDB message_reactions : {}", self.scylla.reactions);
        info!("ScyllaDB read_receipts     : {}", self.scylla.read_receipts);
        info!("ScyllaDB delivery_receipts : {}", self.scylla.deliveries);

        if self.matches() {
            info!("Message counts MATCH");
        } else {
            warn!(
                "Message count MISMATCH: MongoDB={}, ScyllaDB messages={}, messages_by_sender={}",
                self.mongo, self.scylla.messages, self.scylla.by_sender
            );
        }
    }
}
