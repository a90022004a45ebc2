use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use mongodb::Database;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::convert::{count, int, or_default, safe_str, text, to_timestamp, truthy};
use crate::ids::object_id_to_uuid;
use crate::{Error, Result};

pub const CONVERSATIONS: &str = "conversations";

const PROGRESS_EVERY: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationRow {
    pub id: Uuid,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub created_by: Option<String>,
    pub is_archived: bool,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: Option<String>,
    pub last_message_sender_id: Option<String>,
    pub disappearing_ttl_seconds: Option<i32>,
    pub metadata: Value,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantRow {
    pub conversation_id: Uuid,
    pub user_id: String,
    pub role: Option<String>,
    pub nickname: Option<String>,
    pub is_muted: bool,
    pub muted_until: Option<DateTime<Utc>>,
    pub unread_count: i32,
    pub last_read_at: Option<DateTime<Utc>>,
    pub joined_at: Option<DateTime<Utc>>,
    pub left_at: Option<DateTime<Utc>>,
}

pub fn map_conversation(doc: &Document) -> Result<ConversationRow> {
    let id = doc.get("_id").ok_or(Error::MissingField("_id"))?;
    let empty = Document::new();
    let last_message = doc.get_document("lastMessage").unwrap_or(&empty);

    let metadata = match doc.get("metadata") {
        Some(raw) if truthy(Some(raw)) => raw.clone().into_relaxed_extjson(),
        _ => Value::Object(serde_json::Map::new()),
    };

    let direct = Bson::String("direct".to_string());
    let nobody = Bson::String(String::new());

    Ok(ConversationRow {
        id: object_id_to_uuid(id),
        kind: safe_str(Some(or_default(doc, "type", &direct)), 20),
        name: safe_str(doc.get("name"), 255),
        description: text(doc.get("description")),
        avatar_url: text(doc.get("avatar")),
        created_by: safe_str(Some(or_default(doc, "creator", &nobody)), 100),
        is_archived: truthy(doc.get("isArchived")),
        last_message_at: to_timestamp(last_message.get("createdAt")),
        last_message_preview: text(last_message.get("content")),
        last_message_sender_id: safe_str(last_message.get("senderId"), 100),
        disappearing_ttl_seconds: int(doc.get("disappearingMessagesTimeout")),
        metadata,
        created_at: to_timestamp(doc.get("createdAt")),
        updated_at: to_timestamp(doc.get("updatedAt")),
    })
}

/// `None` for participants without a user id; they cannot be keyed.
#[must_use]
pub fn map_participant(conversation_id: Uuid, participant: &Document) -> Option<ParticipantRow> {
    let user_id = safe_str(participant.get("userId"), 100)?;
    let member = Bson::String("member".to_string());

    Some(ParticipantRow {
        conversation_id,
        user_id,
        role: safe_str(Some(or_default(participant, "role", &member)), 20),
        nickname: safe_str(participant.get("nickname"), 100),
        is_muted: truthy(participant.get("isMuted")),
        muted_until: to_timestamp(participant.get("mutedUntil")),
        unread_count: int(participant.get("unreadCount")).unwrap_or(0),
        last_read_at: to_timestamp(participant.get("lastReadAt")),
        joined_at: to_timestamp(participant.get("joinedAt")),
        left_at: to_timestamp(participant.get("leftAt")),
    })
}

/// Destination for migrated rows. Each call is one committed unit.
#[async_trait]
pub trait ConversationSink: Send {
    async fn write_batch(
        &mut self,
        conversations: &[ConversationRow],
        participants: &[ParticipantRow],
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStats {
    pub conversations: u64,
    pub participants: u64,
    pub batches: u64,
}

/// Stream conversations into `sink`, committing every `batch_size`
/// conversations and once more for the remainder.
pub async fn migrate_conversations<St, K>(
    mut documents: St,
    sink: &mut K,
    batch_size: usize,
    estimated_total: u64,
) -> Result<MigrationStats>
where
    St: Stream<Item = Result<Document>> + Unpin,
    K: ConversationSink + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut stats = MigrationStats::default();
    let mut conv_batch = Vec::new();
    let mut part_batch = Vec::new();

    while let Some(doc) = documents.try_next().await? {
        let row = map_conversation(&doc)?;

        if let Ok(participants) = doc.get_array("participants") {
            for participant in participants.iter().filter_map(Bson::as_document) {
                if let Some(part) = map_participant(row.id, participant) {
                    part_batch.push(part);
                    stats.participants += 1;
                }
            }
        }

        conv_batch.push(row);
        stats.conversations += 1;

        if conv_batch.len() >= batch_size {
            sink.write_batch(&conv_batch, &part_batch).await?;
            stats.batches += 1;
            conv_batch.clear();
            part_batch.clear();
        }

        if stats.conversations % PROGRESS_EVERY == 0 {
            info!(
                "Progress: {} / ~{} conversations ({} participants)",
                stats.conversations, estimated_total, stats.participants
            );
        }
    }

    if !conv_batch.is_empty() || !part_batch.is_empty() {
        sink.write_batch(&conv_batch, &part_batch).await?;
        stats.batches += 1;
    }

    info!(
        "Migration complete: {} conversations, {} participants",
        stats.conversations, stats.participants
    );
    Ok(stats)
}

/// Documents of `collection` in `_id` order.
pub async fn open_source(
    db: &Database,
    collection: &str,
    batch_size: u32,
) -> Result<impl Stream<Item = Result<Document>> + Unpin> {
    let cursor = db
        .collection::<Document>(collection)
        .find(doc! {})
        .sort(doc! { "_id": 1 })
        .batch_size(batch_size)
        .await?;
    Ok(cursor.map_err(Error::from))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversationCounts {
    pub conversations: u64,
    pub participants: u64,
}

/// Counts on the Mongo side. Participants include entries without a user
/// id, which the migration skips.
pub async fn mongo_counts(db: &Database) -> Result<ConversationCounts> {
    let collection = db.collection::<Document>(CONVERSATIONS);
    let conversations = collection.estimated_document_count().await?;

    let pipeline = vec![
        doc! { "$project": { "participant_count": { "$size": { "$ifNull": ["$participants", []] } } } },
        doc! { "$group": { "_id": null, "total": { "$sum": "$participant_count" } } },
    ];
    let mut cursor = collection.aggregate(pipeline).await?;
    let participants = match cursor.try_next().await? {
        Some(result) => count(result.get("total")),
        None => 0,
    };

    Ok(ConversationCounts {
        conversations,
        participants,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub mongo: ConversationCounts,
    pub postgres: ConversationCounts,
}

impl Verification {
    #[must_use]
    pub const fn conversations_match(&self) -> bool {
        self.mongo.conversations == self.postgres.conversations
    }

    #[must_use]
    pub const fn participants_match(&self) -> bool {
        self.mongo.participants == self.postgres.participants
    }

    pub fn log(&self) {
        info!("--- Verification ---");
        info!("MongoDB conversations        : {}", self.mongo.conversations);
        info!("PostgreSQL conversations     : {}", self.postgres.conversations);
        info!("MongoDB total participants   : {}", self.mongo.participants);
        info!("PostgreSQL total participants: {}", self.postgres.participants);

        if self.conversations_match() {
            info!("Conversation counts MATCH");
        } else {
            warn!(
                "Conversation count MISMATCH: MongoDB={}, PostgreSQL={}",
                self.mongo.conversations, self.postgres.conversations
            );
        }
        if self.participants_match() {
            info!("Participant counts MATCH");
        } else {
            warn!(
                "Participant count MISMATCH: MongoDB={}, PostgreSQL={}",
                self.mongo.participants, self.postgres.participants
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use futures::stream;

    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<(Vec<ConversationRow>, Vec<ParticipantRow>)>,
    }

    #[async_trait]
    impl ConversationSink for RecordingSink {
        async fn write_batch(
            &mut self,
            conversations: &[ConversationRow],
            participants: &[ParticipantRow],
        ) -> Result<()> {
            self.batches
                .push((conversations.to_vec(), participants.to_vec()));
            Ok(())
        }
    }

    fn conversation(participants: usize) -> Document {
        let people: Vec<Bson> = (0..participants)
            .map(|i| Bson::Document(doc! { "userId": format!("user-{i}"), "role": "admin" }))
            .collect();
        doc! {
            "_id": ObjectId::new(),
            "type": "group",
            "name": "Launch",
            "creator": "user-0",
            "participants": people,
        }
    }

    #[test]
    fn test_map_conversation_defaults() {
        let oid = ObjectId::new();
        let row = map_conversation(&doc! { "_id": oid }).unwrap();
        assert_eq!(row.id, object_id_to_uuid(&Bson::ObjectId(oid)));
        assert_eq!(row.kind.as_deref(), Some("direct"));
        assert_eq!(row.created_by.as_deref(), Some(""));
        assert!(!row.is_archived);
        assert_eq!(row.metadata, serde_json::json!({}));
        assert!(row.last_message_at.is_none());
    }

    #[test]
    fn test_map_conversation_last_message_and_limits() {
        let now = Utc::now();
        let doc = doc! {
            "_id": "conv-1",
            "type": Bson::Null,
            "name": "x".repeat(300),
            "isArchived": true,
            "disappearingMessagesTimeout": 86_400_i64,
            "metadata": { "pinned": true },
            "lastMessage": {
                "content": "see you",
                "senderId": "user-2",
                "createdAt": bson::DateTime::from_chrono(now),
            },
        };
        let row = map_conversation(&doc).unwrap();
        assert!(row.kind.is_none());
        assert_eq!(row.name.unwrap().chars().count(), 255);
        assert!(row.is_archived);
        assert_eq!(row.disappearing_ttl_seconds, Some(86_400));
        assert_eq!(row.metadata, serde_json::json!({ "pinned": true }));
        assert_eq!(row.last_message_preview.as_deref(), Some("see you"));
        assert_eq!(
            row.last_message_at.unwrap().timestamp_millis(),
            now.timestamp_millis()
        );
    }

    #[test]
    fn test_missing_id_is_an_error() {
        assert!(matches!(
            map_conversation(&doc! { "name": "orphan" }),
            Err(Error::MissingField("_id"))
        ));
    }

    #[test]
    fn test_participant_without_user_is_skipped() {
        let id = Uuid::nil();
        assert!(map_participant(id, &doc! { "role": "member" }).is_none());
        assert!(map_participant(id, &doc! { "userId": Bson::Null }).is_none());

        let row = map_participant(id, &doc! { "userId": "u1", "isMuted": true }).unwrap();
        assert_eq!(row.role.as_deref(), Some("member"));
        assert_eq!(row.unread_count, 0);
        assert!(row.is_muted);
    }

    #[tokio::test]
    async fn test_migration_batches() {
        let docs: Vec<Result<Document>> = (0..5).map(|_| Ok(conversation(2))).collect();
        let mut sink = RecordingSink::default();

        let stats = migrate_conversations(stream::iter(docs), &mut sink, 2, 5)
            .await
            .unwrap();

        assert_eq!(stats.conversations, 5);
        assert_eq!(stats.participants, 10);
        assert_eq!(stats.batches, 3);
        let sizes: Vec<usize> = sink.batches.iter().map(|(c, _)| c.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(sink.batches[0].1.len(), 4);
        assert_eq!(sink.batches[0].1[0].conversation_id, sink.batches[0].0[0].id);
    }

    #[tokio::test]
    async fn test_empty_source_writes_nothing() {
        let docs: Vec<Result<Document>> = Vec::new();
        let mut sink = RecordingSink::default();
        let stats = migrate_conversations(stream::iter(docs), &mut sink, 500, 0)
            .await
            .unwrap();
        assert_eq!(stats, MigrationStats::default());
        assert!(sink.batches.is_empty());
    }

    #[tokio::test]
    async fn test_source_error_stops_migration() {
        let docs: Vec<Result<Document>> = vec![
            Ok(conversation(1)),
            Err(Error::MissingField("_id")),
            Ok(conversation(1)),
        ];
        let mut sink = RecordingSink::default();
        let result = migrate_conversations(stream::iter(docs), &mut sink, 10, 3).await;
        assert!(result.is_err());
        assert!(sink.batches.is_empty());
    }

    #[test]
    fn test_verification_flags() {
        let v = Verification {
            mongo: ConversationCounts {
                conversations: 3,
                participants: 7,
            },
            postgres: ConversationCounts {
                conversations: 3,
                participants: 6,
            },
        };
        assert!(v.conversations_match());
        assert!(!v.participants_match());
    }
}
