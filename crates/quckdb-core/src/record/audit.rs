use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{bson_time, insert_opt, Record};
use crate::collection::{Collection, FieldStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            _ => Err(crate::Error::InvalidSeverity(s.to_string())),
        }
    }
}

/// One security-relevant action. A `None` actor marks an anonymous or
/// failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub actor: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub details: Document,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    #[must_use]
    pub fn new(
        actor: Option<&str>,
        action: &str,
        resource_type: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            actor: actor.map(String::from),
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: None,
            ip: None,
            user_agent: None,
            details: Document::new(),
            severity: Severity::Info,
            timestamp,
        }
    }

    #[must_use]
    pub fn with_resource_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn with_client(mut self, ip: &str, user_agent: Option<&str>) -> Self {
        self.ip = Some(ip.to_string());
        self.user_agent = user_agent.map(String::from);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Document) -> Self {
        self.details = details;
        self
    }

    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Record for AuditEntry {
    const COLLECTION: Collection = Collection::AuditLogs;

    fn to_document(&self, style: FieldStyle) -> Document {
        let mut doc = Document::new();
        // Anonymous entries keep an explicit null so queries on the actor
        // field still match them.
        doc.insert(
            style.key("userId", "user_id"),
            self.actor.clone().map_or(Bson::Null, Bson::String),
        );
        doc.insert("action", self.action.as_str());
        doc.insert(style.key("resource", "resource_type"), self.resource_type.as_str());
        insert_opt(
            &mut doc,
            style.key("resourceId", "resource_id"),
            self.resource_id.as_deref(),
        );
        insert_opt(&mut doc, style.key("ip", "ip_address"), self.ip.as_deref());
        insert_opt(
            &mut doc,
            style.key("userAgent", "user_agent"),
            self.user_agent.as_deref(),
        );
        match style {
            FieldStyle::Camel => {
                doc.insert("metadata", self.details.clone());
                doc.insert("createdAt", bson_time(self.timestamp));
            }
            FieldStyle::Snake => {
                doc.insert("details", self.details.clone());
                doc.insert("severity", self.severity.as_str());
                doc.insert("timestamp", bson_time(self.timestamp));
            }
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn login() -> AuditEntry {
        AuditEntry::new(Some("u1"), "user.login", "auth", Utc::now())
            .with_resource_id("u1")
            .with_client("10.0.0.1", Some("Mozilla/5.0"))
            .with_details(doc! { "method": "password" })
    }

    #[test]
    fn test_camel_document_shape() {
        let doc = login().to_document(FieldStyle::Camel);
        assert_eq!(doc.get_str("userId").unwrap(), "u1");
        assert_eq!(doc.get_str("resource").unwrap(), "auth");
        assert_eq!(doc.get_str("userAgent").unwrap(), "Mozilla/5.0");
        assert!(doc.get_datetime("createdAt").is_ok());
        assert!(!doc.contains_key("severity"));
    }

    #[test]
    fn test_snake_document_shape() {
        let doc = login()
            .with_severity(Severity::Warning)
            .to_document(FieldStyle::Snake);
        assert_eq!(doc.get_str("user_id").unwrap(), "u1");
        assert_eq!(doc.get_str("resource_type").unwrap(), "auth");
        assert_eq!(doc.get_str("ip_address").unwrap(), "10.0.0.1");
        assert_eq!(doc.get_str("severity").unwrap(), "warning");
        assert_eq!(doc.get_document("details").unwrap().get_str("method").unwrap(), "password");
        assert!(doc.get_datetime("timestamp").is_ok());
    }

    #[test]
    fn test_anonymous_actor_is_null() {
        let entry = AuditEntry::new(None, "user.login_failed", "auth", Utc::now());
        let doc = entry.to_document(FieldStyle::Camel);
        assert_eq!(doc.get("userId"), Some(&Bson::Null));
        assert!(!doc.contains_key("resourceId"));
        assert!(!doc.contains_key("ip"));
    }
}
