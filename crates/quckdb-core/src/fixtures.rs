//! The development dataset.
//!
//! Every timestamp derives from the single `now` passed in, so two builds with
//! the same instant produce identical documents.

use bson::{doc, Document};
use chrono::{DateTime, Duration, Utc};

use crate::collection::{Collection, FieldStyle};
use crate::ids::{ALICE, BOB, CAROL, DAVE, DEV_WORKSPACE, GENERAL_CHANNEL, MEDIA_BUCKET, QUCKBOT};
use crate::record::{
    render, ActivityEntry, AuditEntry, Device, FileEntry, FileStatus, PresenceEntry,
    PresenceStatus, Severity,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SeedSet {
    pub audit_logs: Vec<AuditEntry>,
    pub activity_logs: Vec<ActivityEntry>,
    pub file_metadata: Vec<FileEntry>,
    pub user_presence: Vec<PresenceEntry>,
}

impl SeedSet {
    #[must_use]
    pub fn development(now: DateTime<Utc>) -> Self {
        Self {
            audit_logs: audit_logs(now),
            activity_logs: activity_logs(now),
            file_metadata: file_metadata(now),
            user_presence: user_presence(now),
        }
    }

    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::AuditLogs => self.audit_logs.len(),
            Collection::ActivityLogs => self.activity_logs.len(),
            Collection::FileMetadata => self.file_metadata.len(),
            Collection::UserPresence => self.user_presence.len(),
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        Collection::ALL.iter().map(|c| self.len(*c)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Documents for one collection, rendered in `style`.
    #[must_use]
    pub fn documents(&self, collection: Collection, style: FieldStyle) -> Vec<Document> {
        match collection {
            Collection::AuditLogs => render(&self.audit_logs, style),
            Collection::ActivityLogs => render(&self.activity_logs, style),
            Collection::FileMetadata => render(&self.file_metadata, style),
            Collection::UserPresence => render(&self.user_presence, style),
        }
    }
}

fn audit_logs(now: DateTime<Utc>) -> Vec<AuditEntry> {
    vec![
        AuditEntry::new(Some(ALICE), "user.login", "auth", now)
            .with_resource_id(ALICE)
            .with_client("192.168.1.100", Some("Mozilla/5.0"))
            .with_details(doc! { "method": "password" }),
        AuditEntry::new(Some(ALICE), "workspace.create", "workspace", now)
            .with_resource_id(DEV_WORKSPACE)
            .with_details(doc! { "name": "QuckApp Dev" }),
        AuditEntry::new(Some(ALICE), "channel.create", "channel", now)
            .with_resource_id(GENERAL_CHANNEL)
            .with_details(doc! { "name": "general", "workspaceId": DEV_WORKSPACE }),
        AuditEntry::new(Some(BOB), "user.login", "auth", now)
            .with_resource_id(BOB)
            .with_client("192.168.1.101", None)
            .with_details(doc! { "method": "password" }),
        AuditEntry::new(Some(ALICE), "settings.update", "workspace", now)
            .with_resource_id(DEV_WORKSPACE)
            .with_details(doc! { "field": "description" }),
        AuditEntry::new(Some(CAROL), "user.login", "auth", now)
            .with_resource_id(CAROL)
            .with_client("10.0.0.50", None)
            .with_details(doc! { "method": "oauth", "provider": "google" }),
        // The attempted address lives in the details: there is no session to
        // attribute a client to.
        AuditEntry::new(None, "user.login_failed", "auth", now)
            .with_details(doc! {
                "email": "hacker@evil.com",
                "reason": "invalid_credentials",
                "ip": "203.0.113.50",
            })
            .with_severity(Severity::Warning),
    ]
}

fn activity_logs(now: DateTime<Utc>) -> Vec<ActivityEntry> {
    vec![
        ActivityEntry::new(ALICE, "page_view", &format!("/workspace/{DEV_WORKSPACE}"), now)
            .with_metadata(doc! { "duration": 45_000 }),
        ActivityEntry::new(BOB, "message_sent", &format!("channel:{GENERAL_CHANNEL}"), now)
            .with_metadata(doc! { "length": 128 }),
        ActivityEntry::new(CAROL, "file_upload", "media:file-001", now)
            .with_metadata(doc! { "filename": "design-v2.png", "size": 2_048_576_i64 }),
        ActivityEntry::new(BOB, "reaction", "message:msg-001", now)
            .with_metadata(doc! { "emoji": "thumbsup" }),
        ActivityEntry::new(ALICE, "search", "global", now)
            .with_metadata(doc! { "query": "deployment guide", "results": 5 }),
    ]
}

fn file_metadata(now: DateTime<Utc>) -> Vec<FileEntry> {
    vec![
        FileEntry {
            file_id: "file-001".to_string(),
            owner: CAROL.to_string(),
            workspace_id: DEV_WORKSPACE.to_string(),
            original_filename: "design-v2.png".to_string(),
            stored_filename: "file-001.png".to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 2_048_576,
            storage_key: "uploads/2024/01/design-v2.png".to_string(),
            bucket: MEDIA_BUCKET.to_string(),
            thumbnails: Some(doc! {
                "small": "thumbs/design-v2-128.png",
                "medium": "thumbs/design-v2-256.png",
            }),
            status: FileStatus::Ready,
            metadata: doc! { "width": 1920, "height": 1080 },
            created_at: now,
        },
        FileEntry {
            file_id: "file-002".to_string(),
            owner: ALICE.to_string(),
            workspace_id: DEV_WORKSPACE.to_string(),
            original_filename: "meeting-notes.pdf".to_string(),
            stored_filename: "file-002.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 524_288,
            storage_key: "uploads/2024/01/meeting-notes.pdf".to_string(),
            bucket: MEDIA_BUCKET.to_string(),
            thumbnails: None,
            status: FileStatus::Ready,
            metadata: doc! { "pages": 4 },
            created_at: now,
        },
        FileEntry {
            file_id: "file-003".to_string(),
            owner: BOB.to_string(),
            workspace_id: DEV_WORKSPACE.to_string(),
            original_filename: "demo-recording.mp4".to_string(),
            stored_filename: "file-003.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            size_bytes: 15_728_640,
            storage_key: "uploads/2024/01/demo-recording.mp4".to_string(),
            bucket: MEDIA_BUCKET.to_string(),
            thumbnails: None,
            status: FileStatus::Processing,
            metadata: doc! { "durationSeconds": 312 },
            created_at: now,
        },
    ]
}

fn user_presence(now: DateTime<Utc>) -> Vec<PresenceEntry> {
    vec![
        PresenceEntry::new(ALICE, PresenceStatus::Online, Device::Desktop, now, now)
            .with_custom_status("Working on QuckApp", Some("computer")),
        PresenceEntry::new(
            BOB,
            PresenceStatus::Away,
            Device::Mobile,
            now - Duration::minutes(10),
            now,
        ),
        PresenceEntry::new(CAROL, PresenceStatus::Online, Device::Desktop, now, now)
            .with_custom_status("In a meeting", Some("calendar")),
        PresenceEntry::new(
            DAVE,
            PresenceStatus::Offline,
            Device::Web,
            now - Duration::hours(1),
            now,
        ),
        PresenceEntry::new(QUCKBOT, PresenceStatus::Online, Device::Server, now, now)
            .with_custom_status("Bot is running", Some("robot")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_counts() {
        let set = SeedSet::development(Utc::now());
        assert_eq!(set.len(Collection::AuditLogs), 7);
        assert_eq!(set.len(Collection::ActivityLogs), 5);
        assert_eq!(set.len(Collection::FileMetadata), 3);
        assert_eq!(set.len(Collection::UserPresence), 5);
        assert_eq!(set.total(), 20);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_same_instant_builds_identical_sets() {
        let now = Utc::now();
        assert_eq!(SeedSet::development(now), SeedSet::development(now));
    }

    #[test]
    fn test_presence_offsets() {
        let now = Utc::now();
        let set = SeedSet::development(now);
        let bob = set.user_presence.iter().find(|p| p.user_id == BOB).unwrap();
        assert_eq!(now - bob.last_seen, Duration::minutes(10));
        let dave = set.user_presence.iter().find(|p| p.user_id == DAVE).unwrap();
        assert_eq!(now - dave.last_seen, Duration::hours(1));
    }

    #[test]
    fn test_documents_render_per_collection() {
        let set = SeedSet::development(Utc::now());
        let docs = set.documents(Collection::UserPresence, FieldStyle::Snake);
        assert_eq!(docs.len(), 5);
        assert!(docs.iter().all(|d| d.contains_key("user_id")));
    }
}
