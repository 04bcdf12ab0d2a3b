//! Record schema for an indexed line of source code.
//!
//! A [`Chunk`] is one trimmed, non-blank source line plus denormalized
//! metadata and its embedding. Chunks serialize with camelCase field names
//! so stored payloads stay readable by non-Rust consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a chunk was cut from a class span or from the whole file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkKind {
    Class,
    File,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Class => "Class",
            ChunkKind::File => "File",
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive metadata carried alongside every chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub file_name: String,
    /// Class name for class chunks, bare file name for file chunks.
    pub element_name: String,
    /// Reserved; always empty.
    #[serde(default)]
    pub namespace: String,
    pub last_modified: DateTime<Utc>,
    /// `["class", <name>]` or `["file", <extension>]`.
    pub tags: Vec<String>,
}

/// The unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    /// Path relative to the indexed root.
    pub file_name: String,
    /// 1-based line number within the chunk's source span (class span or file).
    pub line: usize,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Empty until the ingest pipeline embeds the chunk.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Human-readable locator shown in search results.
    pub fn locator(&self) -> String {
        format!("Line {}", self.line)
    }

    pub fn is_embedded(&self) -> bool {
        !self.embedding.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Chunk {
        Chunk {
            id: "c-1".to_string(),
            file_name: "src/Foo.cs".to_string(),
            line: 2,
            content: "int x;".to_string(),
            metadata: ChunkMetadata {
                kind: ChunkKind::Class,
                file_name: "src/Foo.cs".to_string(),
                element_name: "Foo".to_string(),
                namespace: String::new(),
                last_modified: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                tags: vec!["class".to_string(), "Foo".to_string()],
            },
            embedding: vec![0.25, -1.5, 3.0],
        }
    }

    #[test]
    fn serializes_with_camel_case_and_type_tag() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["fileName"], "src/Foo.cs");
        assert_eq!(json["metadata"]["type"], "Class");
        assert_eq!(json["metadata"]["elementName"], "Foo");
        assert_eq!(json["metadata"]["tags"][1], "Foo");
        assert_eq!(json["embedding"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn deserializes_back_to_the_same_chunk() {
        let chunk = sample();
        let text = serde_json::to_string(&chunk).unwrap();
        let back: Chunk = serde_json::from_str(&text).unwrap();
        assert_eq!(back, chunk);
    }

    #[test]
    fn locator_uses_line_number() {
        assert_eq!(sample().locator(), "Line 2");
        assert!(sample().is_embedded());
    }
}
