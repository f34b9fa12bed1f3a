//! File record types.
//!
//! A [`FileRecord`] is one row of the remote catalog: a stable identifier,
//! the intrinsic file fields every record carries, and an open-ended set
//! of annotations keyed by name. Records are decoded straight from source
//! payloads via serde and shared behind `Arc` once cached.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Stable unique identifier assigned by the catalog.
    pub id: String,
    /// File name, without directory components.
    pub name: String,
    /// Full path of the file in its storage system.
    pub path: String,
    /// Size in bytes, when known.
    #[serde(default)]
    pub size: Option<u64>,
    /// Upload timestamp as reported by the catalog, when known.
    #[serde(default)]
    pub uploaded: Option<String>,
    /// Thumbnail path, when the catalog rendered one.
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Annotation values keyed by annotation name.
    #[serde(default)]
    pub annotations: HashMap<String, Value>,
}

impl FileRecord {
    /// Looks up an annotation value by name.
    pub fn annotation(&self, name: &str) -> Option<&Value> {
        self.annotations.get(name)
    }

    /// Returns true if the record carries a non-null value for `name`.
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations
            .get(name)
            .is_some_and(|value| !value.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> FileRecord {
        FileRecord {
            id: "abc123".into(),
            name: "image.czi".into(),
            path: "/allen/programs/imaging/image.czi".into(),
            size: Some(4_096),
            uploaded: Some("2024-03-01 12:00:00".into()),
            thumbnail: None,
            annotations: HashMap::from([
                ("Gene".to_string(), json!("LMNB1")),
                ("Plate".to_string(), json!(3500001)),
                ("Notes".to_string(), Value::Null),
            ]),
        }
    }

    #[test]
    fn test_annotation_lookup() {
        let record = record();
        assert_eq!(record.annotation("Gene"), Some(&json!("LMNB1")));
        assert_eq!(record.annotation("Missing"), None);
    }

    #[test]
    fn test_has_annotation_treats_null_as_absent() {
        let record = record();
        assert!(record.has_annotation("Plate"));
        assert!(!record.has_annotation("Notes"));
        assert!(!record.has_annotation("Missing"));
    }

    #[test]
    fn test_decodes_with_missing_optional_fields() {
        let decoded: FileRecord = serde_json::from_value(json!({
            "id": "f1",
            "name": "a.tiff",
            "path": "/files/a.tiff",
        }))
        .unwrap();
        assert_eq!(decoded.size, None);
        assert!(decoded.annotations.is_empty());
    }
}
