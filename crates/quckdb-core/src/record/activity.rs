use bson::Document;
use chrono::{DateTime, Utc};

use super::{bson_time, Record};
use crate::collection::{Collection, FieldStyle};

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub actor: String,
    pub kind: String,
    /// Page path or `kind:id` reference the activity happened on.
    pub resource: String,
    pub metadata: Document,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    #[must_use]
    pub fn new(actor: &str, kind: &str, resource: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            actor: actor.to_string(),
            kind: kind.to_string(),
            resource: resource.to_string(),
            metadata: Document::new(),
            timestamp,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Document) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Record for ActivityEntry {
    const COLLECTION: Collection = Collection::ActivityLogs;

    fn to_document(&self, style: FieldStyle) -> Document {
        let mut doc = Document::new();
        doc.insert(style.key("userId", "user_id"), self.actor.as_str());
        doc.insert(style.key("type", "activity_type"), self.kind.as_str());
        doc.insert("resource", self.resource.as_str());
        doc.insert("metadata", self.metadata.clone());
        doc.insert(
            style.key("createdAt", "timestamp"),
            bson_time(self.timestamp),
        );
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_activity_keys_follow_style() {
        let entry = ActivityEntry::new("u2", "reaction", "message:msg-001", Utc::now())
            .with_metadata(doc! { "emoji": "thumbsup" });

        let camel = entry.to_document(FieldStyle::Camel);
        assert_eq!(camel.get_str("type").unwrap(), "reaction");
        assert!(camel.get_datetime("createdAt").is_ok());

        let snake = entry.to_document(FieldStyle::Snake);
        assert_eq!(snake.get_str("activity_type").unwrap(), "reaction");
        assert_eq!(snake.get_str("user_id").unwrap(), "u2");
        assert!(snake.get_datetime("timestamp").is_ok());
        assert_eq!(snake.get_document("metadata").unwrap(), &doc! { "emoji": "thumbsup" });
    }
}
