use bson::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{bson_time, Record};
use crate::collection::{Collection, FieldStyle};

/// Processing state of an uploaded file in the media pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Uploading,
    Processing,
    Ready,
    Failed,
}

impl FileStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploading" => Ok(Self::Uploading),
            "processing" => Ok(Self::Processing),
            "ready" => Ok(Self::Ready),
            "failed" => Ok(Self::Failed),
            _ => Err(crate::Error::InvalidFileStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub file_id: String,
    pub owner: String,
    pub workspace_id: String,
    pub original_filename: String,
    pub stored_filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub bucket: String,
    pub thumbnails: Option<Document>,
    pub status: FileStatus,
    /// Type-specific metadata, e.g. `width`/`height` for images.
    pub metadata: Document,
    pub created_at: DateTime<Utc>,
}

impl FileEntry {
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Both `width` and `height` are present in the metadata.
    #[must_use]
    pub fn has_both_dimensions(&self) -> bool {
        self.metadata.contains_key("width") && self.metadata.contains_key("height")
    }

    #[must_use]
    pub fn has_any_dimension(&self) -> bool {
        self.metadata.contains_key("width") || self.metadata.contains_key("height")
    }
}

impl Record for FileEntry {
    const COLLECTION: Collection = Collection::FileMetadata;

    fn to_document(&self, style: FieldStyle) -> Document {
        let mut doc = Document::new();
        doc.insert(style.key("fileId", "file_id"), self.file_id.as_str());
        doc.insert(style.key("userId", "user_id"), self.owner.as_str());
        doc.insert(
            style.key("workspaceId", "workspace_id"),
            self.workspace_id.as_str(),
        );
        match style {
            FieldStyle::Camel => {
                doc.insert("filename", self.original_filename.as_str());
                doc.insert("mimeType", self.mime_type.as_str());
                doc.insert("sizeBytes", self.size_bytes);
                doc.insert("s3Key", self.storage_key.as_str());
                doc.insert("s3Bucket", self.bucket.as_str());
            }
            FieldStyle::Snake => {
                doc.insert("original_filename", self.original_filename.as_str());
                doc.insert("stored_filename", self.stored_filename.as_str());
                doc.insert("mime_type", self.mime_type.as_str());
                doc.insert("size_bytes", self.size_bytes);
                doc.insert("storage_key", self.storage_key.as_str());
                doc.insert("bucket", self.bucket.as_str());
            }
        }
        if let Some(thumbnails) = &self.thumbnails {
            doc.insert("thumbnails", thumbnails.clone());
        }
        if style == FieldStyle::Snake || !self.metadata.is_empty() {
            doc.insert("metadata", self.metadata.clone());
        }
        doc.insert("status", self.status.as_str());
        doc.insert(
            style.key("createdAt", "created_at"),
            bson_time(self.created_at),
        );
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn pdf() -> FileEntry {
        FileEntry {
            file_id: "file-002".to_string(),
            owner: "u1".to_string(),
            workspace_id: "w1".to_string(),
            original_filename: "meeting-notes.pdf".to_string(),
            stored_filename: "f2.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 524_288,
            storage_key: "uploads/f2.pdf".to_string(),
            bucket: "media".to_string(),
            thumbnails: None,
            status: FileStatus::Ready,
            metadata: Document::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_camel_uses_s3_keys() {
        let doc = pdf().to_document(FieldStyle::Camel);
        assert_eq!(doc.get_str("s3Key").unwrap(), "uploads/f2.pdf");
        assert_eq!(doc.get_i64("sizeBytes").unwrap(), 524_288);
        assert!(!doc.contains_key("metadata"));
        assert!(!doc.contains_key("thumbnails"));
    }

    #[test]
    fn test_snake_keeps_both_filenames() {
        let doc = pdf().to_document(FieldStyle::Snake);
        assert_eq!(doc.get_str("original_filename").unwrap(), "meeting-notes.pdf");
        assert_eq!(doc.get_str("stored_filename").unwrap(), "f2.pdf");
        assert_eq!(doc.get_str("status").unwrap(), "ready");
        assert!(doc.get_document("metadata").unwrap().is_empty());
    }

    #[test]
    fn test_image_detection() {
        let mut file = pdf();
        assert!(!file.is_image());
        file.mime_type = "image/png".to_string();
        file.metadata = doc! { "width": 1920, "height": 1080 };
        assert!(file.is_image());
        assert!(file.has_both_dimensions());

        file.metadata = doc! { "height": 1080 };
        assert!(!file.has_both_dimensions());
        assert!(file.has_any_dimension());
    }

    #[test]
    fn test_file_status_parse() {
        assert_eq!("processing".parse::<FileStatus>().unwrap(), FileStatus::Processing);
        assert!("deleted".parse::<FileStatus>().is_err());
    }
}
