//! Typed message content and constructor helpers.
//!
//! The `content` field of a message value is itself a JSON string, one
//! shape per content kind. Text carries the body inline; image, video,
//! audio and file carry a URI plus media metadata; thumbnails carry a
//! reduced preview tagged with the kind of the original.

use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Content shapes
// ---------------------------------------------------------------------------

/// Content of a `text` message.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// The message body.
    pub text: String,
    /// Optional rendering format (e.g. `"markdown"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Set when this content is itself a thumbnail.
    #[serde(rename = "isThumbnail", skip_serializing_if = "Option::is_none")]
    pub is_thumbnail: Option<bool>,
    /// Identifier of the message this thumbnails.
    #[serde(rename = "thumbnailOf", skip_serializing_if = "Option::is_none")]
    pub thumbnail_of: Option<String>,
    /// Size in bytes of the original payload.
    #[serde(rename = "originalSize", skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,
}

/// File name and MIME type of a media payload.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub filename: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Content of an `image`, `video`, `audio` or `file` message.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MediaContent {
    /// Where the (already encrypted) payload is stored.
    pub uri: String,
    /// File name and MIME type.
    pub metadata: MediaMetadata,
    /// Set when this content is itself a thumbnail.
    #[serde(rename = "isThumbnail", skip_serializing_if = "Option::is_none")]
    pub is_thumbnail: Option<bool>,
    /// Identifier of the message this thumbnails.
    #[serde(rename = "thumbnailOf", skip_serializing_if = "Option::is_none")]
    pub thumbnail_of: Option<String>,
    /// Size in bytes of the original payload.
    #[serde(rename = "originalSize", skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,
}

/// Content of a `thumbnail` message, tagged by the original's kind.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "originalType")]
pub enum ThumbnailContent {
    #[serde(rename = "text")]
    Text {
        #[serde(rename = "thumbnailText")]
        thumbnail_text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
    },
    #[serde(rename = "image")]
    Image {
        #[serde(rename = "thumbnailUri")]
        thumbnail_uri: String,
        #[serde(rename = "thumbnailMimeType")]
        thumbnail_mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
    },
    #[serde(rename = "video")]
    Video {
        #[serde(rename = "thumbnailUri")]
        thumbnail_uri: String,
        #[serde(rename = "thumbnailMimeType")]
        thumbnail_mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
    },
    #[serde(rename = "audio")]
    Audio {
        #[serde(rename = "thumbnailText")]
        thumbnail_text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
    },
    #[serde(rename = "file")]
    File {
        #[serde(rename = "thumbnailText")]
        thumbnail_text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
    },
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

fn to_content_json<T: Serialize>(content: &T) -> Result<String> {
    serde_json::to_string(content).map_err(|e| SealchatError::InvalidMessage {
        reason: format!("content serialization failed: {e}"),
    })
}

/// Builds the content JSON string for a `text` message.
pub fn text_content(text: &str, format: Option<&str>) -> Result<String> {
    to_content_json(&TextContent {
        text: text.to_string(),
        format: format.map(String::from),
        is_thumbnail: None,
        thumbnail_of: None,
        original_size: None,
    })
}

/// Builds the content JSON string for an `image` message.
pub fn image_content(uri: &str, filename: &str, mime_type: &str) -> Result<String> {
    media_content(uri, filename, mime_type)
}

/// Builds the content JSON string for a `video` message.
pub fn video_content(uri: &str, filename: &str, mime_type: &str) -> Result<String> {
    media_content(uri, filename, mime_type)
}

/// Builds the content JSON string for an `audio` message.
pub fn audio_content(uri: &str, filename: &str, mime_type: &str) -> Result<String> {
    media_content(uri, filename, mime_type)
}

/// Builds the content JSON string for a `file` message.
pub fn file_content(uri: &str, filename: &str, mime_type: &str) -> Result<String> {
    media_content(uri, filename, mime_type)
}

fn media_content(uri: &str, filename: &str, mime_type: &str) -> Result<String> {
    to_content_json(&MediaContent {
        uri: uri.to_string(),
        metadata: MediaMetadata {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
        },
        is_thumbnail: None,
        thumbnail_of: None,
        original_size: None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_shape() -> Result<()> {
        let json = text_content("hello", None)?;
        assert_eq!(json, r#"{"text":"hello"}"#);

        let formatted = text_content("# hi", Some("markdown"))?;
        assert_eq!(formatted, r##"{"text":"# hi","format":"markdown"}"##);
        Ok(())
    }

    #[test]
    fn media_content_shape() -> Result<()> {
        let json = image_content("blob://abc", "cat.png", "image/png")?;
        assert_eq!(
            json,
            r#"{"uri":"blob://abc","metadata":{"filename":"cat.png","mimeType":"image/png"}}"#
        );
        Ok(())
    }

    #[test]
    fn media_content_roundtrip() -> Result<()> {
        let json = file_content("blob://doc", "notes.pdf", "application/pdf")?;
        let parsed: MediaContent =
            serde_json::from_str(&json).map_err(|e| sealchat_types::SealchatError::InvalidMessage {
                reason: e.to_string(),
            })?;
        assert_eq!(parsed.metadata.filename, "notes.pdf");
        Ok(())
    }

    #[test]
    fn thumbnail_content_is_tagged_by_original_type() -> Result<()> {
        let thumb = ThumbnailContent::Image {
            thumbnail_uri: "blob://thumb".into(),
            thumbnail_mime_type: "image/webp".into(),
            size: Some(2048),
        };
        let json = to_content_json(&thumb)?;
        assert!(json.starts_with(r#"{"originalType":"image""#));
        Ok(())
    }
}
