use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use super::conversation::{ConversationCounts, ConversationRow, ConversationSink, ParticipantRow};
use crate::Result;

const INSERT_CONVERSATION: &str = r"
    INSERT INTO messaging.conversations (
        id, type, name, description, avatar_url, created_by,
        is_archived, last_message_at, last_message_preview,
        last_message_sender_id, disappearing_ttl_seconds, metadata,
        created_at, updated_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
    ON CONFLICT (id) DO NOTHING
";

const INSERT_PARTICIPANT: &str = r"
    INSERT INTO messaging.participants (
        conversation_id, user_id, role, nickname, is_muted,
        muted_until, unread_count, last_read_at, joined_at, left_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    ON CONFLICT (conversation_id, user_id) DO NOTHING
";

/// Writes conversation batches into the `messaging` schema, one transaction
/// per batch.
pub struct PgConversationSink {
    pool: PgPool,
}

impl PgConversationSink {
    pub async fn connect(uri: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(uri)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn counts(&self) -> Result<ConversationCounts> {
        let conversations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messaging.conversations")
            .fetch_one(&self.pool)
            .await?;
        let participants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messaging.participants")
            .fetch_one(&self.pool)
            .await?;

        Ok(ConversationCounts {
            conversations: u64::try_from(conversations).unwrap_or(0),
            participants: u64::try_from(participants).unwrap_or(0),
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ConversationSink for PgConversationSink {
    async fn write_batch(
        &mut self,
        conversations: &[ConversationRow],
        participants: &[ParticipantRow],
    ) -> Result<()> {
        // Dropping the transaction on error rolls the batch back.
        let mut tx = self.pool.begin().await?;

        for row in conversations {
            sqlx::query(INSERT_CONVERSATION)
                .bind(row.id)
                .bind(&row.kind)
                .bind(&row.name)
                .bind(&row.description)
                .bind(&row.avatar_url)
                .bind(&row.created_by)
                .bind(row.is_archived)
                .bind(row.last_message_at)
                .bind(&row.last_message_preview)
                .bind(&row.last_message_sender_id)
                .bind(row.disappearing_ttl_seconds)
                .bind(Json(&row.metadata))
                .bind(row.created_at)
                .bind(row.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        for row in participants {
            sqlx::query(INSERT_PARTICIPANT)
                .bind(row.conversation_id)
                .bind(&row.user_id)
                .bind(&row.role)
                .bind(&row.nickname)
                .bind(row.is_muted)
                .bind(row.muted_until)
                .bind(row.unread_count)
                .bind(row.last_read_at)
                .bind(row.joined_at)
                .bind(row.left_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(
            "Committed {} conversations, {} participants",
            conversations.len(),
            participants.len()
        );
        Ok(())
    }
}
