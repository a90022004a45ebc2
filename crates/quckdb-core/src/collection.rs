use serde::{Deserialize, Serialize};

/// The four collections populated by the development seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    AuditLogs,
    ActivityLogs,
    FileMetadata,
    UserPresence,
}

impl Collection {
    /// Insert order used by the seeder.
    pub const ALL: [Self; 4] = [
        Self::AuditLogs,
        Self::ActivityLogs,
        Self::FileMetadata,
        Self::UserPresence,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AuditLogs => "audit_logs",
            Self::ActivityLogs => "activity_logs",
            Self::FileMetadata => "file_metadata",
            Self::UserPresence => "user_presence",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audit_logs" => Ok(Self::AuditLogs),
            "activity_logs" => Ok(Self::ActivityLogs),
            "file_metadata" => Ok(Self::FileMetadata),
            "user_presence" => Ok(Self::UserPresence),
            _ => Err(crate::Error::UnknownCollection(s.to_string())),
        }
    }
}

/// Key naming convention used when rendering records to documents.
///
/// The gateway services store `userId`/`createdAt`, the backend services
/// store `user_id`/`timestamp`. Both conventions are live, so the seed can
/// target either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStyle {
    #[default]
    Camel,
    Snake,
}

impl FieldStyle {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Camel => "camel",
            Self::Snake => "snake",
        }
    }

    /// Pick the key for this style.
    #[must_use]
    pub const fn key(self, camel: &'static str, snake: &'static str) -> &'static str {
        match self {
            Self::Camel => camel,
            Self::Snake => snake,
        }
    }
}

impl std::fmt::Display for FieldStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldStyle {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camel" => Ok(Self::Camel),
            "snake" => Ok(Self::Snake),
            _ => Err(crate::Error::InvalidFieldStyle(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names_round_trip() {
        for collection in Collection::ALL {
            let parsed: Collection = collection.as_str().parse().unwrap();
            assert_eq!(parsed, collection);
        }
    }

    #[test]
    fn test_unknown_collection_rejected() {
        let err = "messages".parse::<Collection>().unwrap_err();
        assert!(err.to_string().contains("messages"));
    }

    #[test]
    fn test_field_style_keys() {
        assert_eq!(FieldStyle::Camel.key("userId", "user_id"), "userId");
        assert_eq!(FieldStyle::Snake.key("userId", "user_id"), "user_id");
        assert_eq!(FieldStyle::default(), FieldStyle::Camel);
    }
}
