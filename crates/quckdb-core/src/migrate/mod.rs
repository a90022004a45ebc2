pub mod convert;
pub mod conversation;
pub mod message;
pub mod postgres;
pub mod scylladb;

pub use conversation::{
    map_conversation, map_participant, migrate_conversations, mongo_counts, open_source,
    ConversationCounts, ConversationRow, ConversationSink, MigrationStats, ParticipantRow,
    Verification, CONVERSATIONS,
};
pub use message::{
    map_message, migrate_messages, mongo_message_count, safe_set, serialize_attachments,
    serialize_edit_history, DeliveryRow, MappedMessage, MessageBatch, MessageCounts, MessageRow,
    MessageSink, MessageStats, MessageVerification, ReactionRow, ReadReceiptRow, MESSAGES,
};
pub use postgres::PgConversationSink;
pub use scylladb::ScyllaMessageSink;
