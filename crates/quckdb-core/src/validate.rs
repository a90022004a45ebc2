use serde::Serialize;

use crate::collection::Collection;
use crate::fixtures::SeedSet;
use crate::ids::is_seeded_user;
use crate::{Error, Result};

/// A single failed integrity check, located by collection and record index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub collection: Collection,
    pub index: usize,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.collection, self.index, self.message)
    }
}

/// Run every integrity check and collect all violations.
#[must_use]
pub fn check(set: &SeedSet) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (index, entry) in set.audit_logs.iter().enumerate() {
        if let Some(actor) = &entry.actor {
            if !is_seeded_user(actor) {
                violations.push(Violation {
                    collection: Collection::AuditLogs,
                    index,
                    message: format!("actor {actor} is not a seeded user"),
                });
            }
        }
    }

    for (index, entry) in set.activity_logs.iter().enumerate() {
        if !is_seeded_user(&entry.actor) {
            violations.push(Violation {
                collection: Collection::ActivityLogs,
                index,
                message: format!("actor {} is not a seeded user", entry.actor),
            });
        }
    }

    for (index, file) in set.file_metadata.iter().enumerate() {
        if file.size_bytes <= 0 {
            violations.push(Violation {
                collection: Collection::FileMetadata,
                index,
                message: format!("{} has non-positive size {}", file.file_id, file.size_bytes),
            });
        }
        if file.is_image() {
            if !file.has_both_dimensions() {
                violations.push(Violation {
                    collection: Collection::FileMetadata,
                    index,
                    message: format!("{} is an image without width/height", file.file_id),
                });
            }
        } else if file.has_any_dimension() {
            violations.push(Violation {
                collection: Collection::FileMetadata,
                index,
                message: format!(
                    "{} declares width/height for non-image type {}",
                    file.file_id, file.mime_type
                ),
            });
        }
    }

    for (index, presence) in set.user_presence.iter().enumerate() {
        if !is_seeded_user(&presence.user_id) {
            violations.push(Violation {
                collection: Collection::UserPresence,
                index,
                message: format!("presence for unknown user {}", presence.user_id),
            });
        }
        if presence.last_seen > presence.updated_at {
            violations.push(Violation {
                collection: Collection::UserPresence,
                index,
                message: format!("{} was seen after its last update", presence.user_id),
            });
        }
    }

    violations
}

/// Like [`check`], but fails with [`Error::Integrity`] when anything is off.
pub fn ensure_valid(set: &SeedSet) -> Result<()> {
    let violations = check(set);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Integrity(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use chrono::{Duration, Utc};

    #[test]
    fn test_development_set_is_clean() {
        let set = SeedSet::development(Utc::now());
        assert!(check(&set).is_empty());
        assert!(ensure_valid(&set).is_ok());
    }

    #[test]
    fn test_unknown_actor_flagged() {
        let mut set = SeedSet::development(Utc::now());
        set.audit_logs[0].actor = Some("99999999-0000-0000-0000-000000000000".to_string());
        let violations = check(&set);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].collection, Collection::AuditLogs);
        assert_eq!(violations[0].index, 0);
    }

    #[test]
    fn test_anonymous_actor_allowed() {
        let set = SeedSet::development(Utc::now());
        assert!(set.audit_logs.iter().any(|e| e.actor.is_none()));
        assert!(check(&set).is_empty());
    }

    #[test]
    fn test_file_size_and_dimensions() {
        let mut set = SeedSet::development(Utc::now());
        set.file_metadata[1].size_bytes = 0;
        set.file_metadata[2].metadata = doc! { "width": 640, "height": 480 };
        set.file_metadata[0].metadata = doc! {};

        let violations = check(&set);
        assert_eq!(violations.len(), 3);
        assert!(violations.iter().all(|v| v.collection == Collection::FileMetadata));
    }

    #[test]
    fn test_image_needs_both_dimensions() {
        let mut set = SeedSet::development(Utc::now());
        set.file_metadata[0].metadata = doc! { "width": 1920 };

        let violations = check(&set);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].index, 0);
        assert!(violations[0].message.contains("without width/height"));
    }

    #[test]
    fn test_presence_time_order() {
        let mut set = SeedSet::development(Utc::now());
        set.user_presence[0].last_seen = set.user_presence[0].updated_at + Duration::seconds(1);
        let err = ensure_valid(&set).unwrap_err();
        assert!(matches!(err, Error::Integrity(ref v) if v.len() == 1));
        assert!(err.to_string().contains("1 integrity check"));
    }
}
