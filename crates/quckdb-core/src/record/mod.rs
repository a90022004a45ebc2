mod activity;
mod audit;
mod file;
mod presence;

pub use activity::ActivityEntry;
pub use audit::{AuditEntry, Severity};
pub use file::{FileEntry, FileStatus};
pub use presence::{Device, PresenceEntry, PresenceStatus};

use bson::{Bson, Document};
use chrono::{DateTime, Utc};

use crate::collection::{Collection, FieldStyle};

/// A seed record that knows its target collection and how to render itself.
pub trait Record {
    const COLLECTION: Collection;

    fn to_document(&self, style: FieldStyle) -> Document;
}

/// Render a slice of records in the given style.
pub fn render<R: Record>(records: &[R], style: FieldStyle) -> Vec<Document> {
    records.iter().map(|r| r.to_document(style)).collect()
}

fn bson_time(at: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_chrono(at))
}

fn insert_opt(doc: &mut Document, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        doc.insert(key, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_records_target_their_collections() {
        assert_eq!(AuditEntry::COLLECTION, Collection::AuditLogs);
        assert_eq!(ActivityEntry::COLLECTION, Collection::ActivityLogs);
        assert_eq!(FileEntry::COLLECTION, Collection::FileMetadata);
        assert_eq!(PresenceEntry::COLLECTION, Collection::UserPresence);
    }

    #[test]
    fn test_render_preserves_order() {
        let now = Utc::now();
        let entries = vec![
            ActivityEntry::new("a", "search", "global", now),
            ActivityEntry::new("b", "search", "global", now),
        ];
        let docs = render(&entries, FieldStyle::Camel);
        assert_eq!(docs[0].get_str("userId").unwrap(), "a");
        assert_eq!(docs[1].get_str("userId").unwrap(), "b");
    }
}
