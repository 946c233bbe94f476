use serde::{Deserialize, Serialize};

/// The three operations the extraction tool is invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Metadata,
    Audio,
    Video,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata fields extracted from the tool's JSON output.
///
/// Fields the tool did not report serialize as null; `formats` is the count
/// of available formats, not the format list itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub id: Option<String>,
    pub title: Option<String>,
    pub duration: Option<u64>,
    pub uploader: Option<String>,
    pub formats: usize,
}

/// Successful outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Parsed metadata (from a `metadata` operation).
    Metadata(MediaMetadata),
    /// A resolved direct stream URL (from an `audio` or `video` operation).
    /// For combined video+audio formats the tool emits one URL per line;
    /// the payload is the trimmed output as-is.
    StreamUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_as_str() {
        assert_eq!(OperationKind::Metadata.as_str(), "metadata");
        assert_eq!(OperationKind::Audio.as_str(), "audio");
        assert_eq!(OperationKind::Video.as_str(), "video");
    }

    #[test]
    fn test_operation_kind_serde() {
        let json = serde_json::to_string(&OperationKind::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
        let parsed: OperationKind = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(parsed, OperationKind::Video);
    }

    #[test]
    fn test_media_metadata_serializes_missing_fields_as_null() {
        let meta = MediaMetadata {
            id: Some("abc".to_string()),
            title: None,
            duration: Some(125),
            uploader: None,
            formats: 3,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["title"], serde_json::Value::Null);
        assert_eq!(json["duration"], 125);
        assert_eq!(json["formats"], 3);
    }
}
