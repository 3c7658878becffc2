//! Email attachments

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::domain::communication::errors::EmailError;

/// Largest attachment a provider will accept
pub const MAX_ATTACHMENT_SIZE: usize = 25 * 1024 * 1024;

/// Content types that may be attached to an email
pub const ALLOWED_ATTACHMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/zip",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/webp",
    "text/calendar",
    "text/csv",
    "text/plain",
];

/// A file attached to an email
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    filename: String,
    content_type: String,
    #[serde(with = "base64_bytes")]
    content: Vec<u8>,
}

impl Attachment {
    /// Creates a new attachment, rejecting content over [`MAX_ATTACHMENT_SIZE`]
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Result<Self, EmailError> {
        let filename = filename.into();

        if content.len() > MAX_ATTACHMENT_SIZE {
            return Err(EmailError::AttachmentTooLarge {
                filename,
                size: content.len(),
            });
        }

        Ok(Self {
            filename,
            content_type: content_type.into(),
            content,
        })
    }

    /// The attachment's file name
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The attachment's MIME type
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The raw attachment bytes
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Size of the attachment in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// The attachment bytes encoded for the wire
    pub fn content_base64(&self) -> String {
        STANDARD.encode(&self.content)
    }

    /// Checks size and content type
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.size() > MAX_ATTACHMENT_SIZE {
            return Err(EmailError::AttachmentTooLarge {
                filename: self.filename.clone(),
                size: self.size(),
            });
        }

        let content_type = self.content_type.trim().to_ascii_lowercase();

        if !ALLOWED_ATTACHMENT_TYPES.contains(&content_type.as_str()) {
            return Err(EmailError::InvalidAttachmentType {
                filename: self.filename.clone(),
                content_type: self.content_type.clone(),
            });
        }

        Ok(())
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;

        STANDARD.decode(encoded).map_err(D::Error::custom)
    }
}
