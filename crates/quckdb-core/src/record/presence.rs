use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{bson_time, Record};
use crate::collection::{Collection, FieldStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Away,
    Offline,
}

impl PresenceStatus {
    pub const ALL: [Self; 3] = [Self::Online, Self::Away, Self::Offline];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PresenceStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "away" => Ok(Self::Away),
            "offline" => Ok(Self::Offline),
            _ => Err(crate::Error::InvalidPresenceStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Desktop,
    Mobile,
    Web,
    Server,
}

impl Device {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Web => "web",
            Self::Server => "server",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Device {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            "web" => Ok(Self::Web),
            "server" => Ok(Self::Server),
            _ => Err(crate::Error::InvalidDevice(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresenceEntry {
    pub user_id: String,
    pub status: PresenceStatus,
    pub status_text: Option<String>,
    pub status_emoji: Option<String>,
    pub device: Device,
    pub last_seen: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PresenceEntry {
    #[must_use]
    pub fn new(
        user_id: &str,
        status: PresenceStatus,
        device: Device,
        last_seen: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            status,
            status_text: None,
            status_emoji: None,
            device,
            last_seen,
            updated_at,
        }
    }

    #[must_use]
    pub fn with_custom_status(mut self, text: &str, emoji: Option<&str>) -> Self {
        self.status_text = Some(text.to_string());
        self.status_emoji = emoji.map(String::from);
        self
    }
}

impl Record for PresenceEntry {
    const COLLECTION: Collection = Collection::UserPresence;

    fn to_document(&self, style: FieldStyle) -> Document {
        let mut doc = Document::new();
        doc.insert(style.key("userId", "user_id"), self.user_id.as_str());
        doc.insert("status", self.status.as_str());
        match style {
            FieldStyle::Camel => {
                doc.insert("lastSeen", bson_time(self.last_seen));
                // Gateway clients expect an empty string, never a missing key.
                doc.insert("statusText", self.status_text.as_deref().unwrap_or_default());
                if let Some(emoji) = &self.status_emoji {
                    doc.insert("statusEmoji", emoji.as_str());
                }
                doc.insert("device", self.device.as_str());
            }
            FieldStyle::Snake => {
                doc.insert(
                    "custom_status",
                    self.status_text.clone().map_or(Bson::Null, Bson::String),
                );
                doc.insert(
                    "custom_status_emoji",
                    self.status_emoji.clone().map_or(Bson::Null, Bson::String),
                );
                doc.insert("last_seen", bson_time(self.last_seen));
                doc.insert("device", self.device.as_str());
                doc.insert("updated_at", bson_time(self.updated_at));
            }
        }
        doc
    }
}
