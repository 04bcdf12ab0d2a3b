//! Line-granular code chunker.
//!
//! Splits a source file into one [`Chunk`] per non-blank, trimmed line.
//! Files whose extension is in the structured set are first scanned for
//! `class <Name>` constructs; each construct contributes the lines of its
//! class span. Only when that pass yields nothing does the chunker fall back
//! to chunking every line of the file.
//!
//! # Class spans
//!
//! A class span runs from the start of the `class` keyword to the first `}`
//! at or after it. This is a deliberately cheap bound rather than a parse:
//! for a class whose first member has a body, the span stops at that
//! member's closing brace and the remaining members are not indexed.
//! Nested braces are not balanced.
//!
//! # Line numbers
//!
//! File chunks carry their 1-based line number in the file. Class chunks
//! carry their 1-based line number within the class span, not the file.
//!
//! # Example
//!
//! ```rust
//! use vectordocs_core::chunk::Chunker;
//! use vectordocs_core::models::ChunkKind;
//!
//! let chunker = Chunker::new();
//! let chunks = chunker.chunk("class Foo\n{\n    int x;\n}", "Foo.cs", ".cs", None);
//! assert_eq!(chunks.len(), 4);
//! assert!(chunks.iter().all(|c| c.metadata.kind == ChunkKind::Class));
//! assert_eq!(chunks[2].content, "int x;");
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::models::{Chunk, ChunkKind, ChunkMetadata};

/// Extensions scanned for class constructs unless configured otherwise.
pub const DEFAULT_STRUCTURED_EXTENSIONS: &[&str] = &[".cs"];

fn class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"class\s+(\w+)").expect("class pattern is a valid regex"))
}

/// Source of chunk identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `{prefix}-{n}` identifiers counting up from a fixed seed.
///
/// Gives byte-identical chunk sequences across runs over the same input.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>, seed: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(seed),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

/// Turns file contents into ordered chunks. Pure apart from id generation
/// and the wall-clock fallback for `lastModified`.
#[derive(Clone)]
pub struct Chunker {
    structured_extensions: Vec<String>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("structured_extensions", &self.structured_extensions)
            .finish_non_exhaustive()
    }
}

impl Chunker {
    pub fn new() -> Self {
        Self {
            structured_extensions: DEFAULT_STRUCTURED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            ids: Arc::new(UuidIds),
        }
    }

    /// Replace the set of extensions scanned for class constructs.
    pub fn with_structured_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.structured_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn structured_extensions(&self) -> &[String] {
        &self.structured_extensions
    }

    pub fn is_structured(&self, extension: &str) -> bool {
        self.structured_extensions.iter().any(|e| e == extension)
    }

    /// Chunk one file.
    ///
    /// `file_path` is the path relative to the indexed root; `extension`
    /// includes the leading dot (`".cs"`), or is empty. `last_modified`
    /// falls back to the current time when absent.
    ///
    /// Never fails: an empty or all-blank file yields no chunks.
    pub fn chunk(
        &self,
        content: &str,
        file_path: &str,
        extension: &str,
        last_modified: Option<DateTime<Utc>>,
    ) -> Vec<Chunk> {
        let modified = last_modified.unwrap_or_else(Utc::now);

        let mut chunks = if self.is_structured(extension) {
            self.class_chunks(content, file_path, modified)
        } else {
            Vec::new()
        };

        if chunks.is_empty() {
            chunks = self.file_chunks(content, file_path, extension, modified);
        }

        chunks
    }

    fn class_chunks(&self, content: &str, file_path: &str, modified: DateTime<Utc>) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for caps in class_pattern().captures_iter(content) {
            let (Some(keyword), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let start = keyword.start();
            let Some(offset) = content[start..].find('}') else {
                continue;
            };
            let span = &content[start..=start + offset];
            let class_name = name.as_str();

            for (line, text) in non_blank_lines(span) {
                chunks.push(self.make_chunk(
                    file_path,
                    line,
                    text,
                    ChunkMetadata {
                        kind: ChunkKind::Class,
                        file_name: file_path.to_string(),
                        element_name: class_name.to_string(),
                        namespace: String::new(),
                        last_modified: modified,
                        tags: vec!["class".to_string(), class_name.to_string()],
                    },
                ));
            }
        }

        chunks
    }

    fn file_chunks(
        &self,
        content: &str,
        file_path: &str,
        extension: &str,
        modified: DateTime<Utc>,
    ) -> Vec<Chunk> {
        let element_name = bare_file_name(file_path);

        non_blank_lines(content)
            .map(|(line, text)| {
                self.make_chunk(
                    file_path,
                    line,
                    text,
                    ChunkMetadata {
                        kind: ChunkKind::File,
                        file_name: file_path.to_string(),
                        element_name: element_name.clone(),
                        namespace: String::new(),
                        last_modified: modified,
                        tags: vec!["file".to_string(), extension.to_string()],
                    },
                )
            })
            .collect()
    }

    fn make_chunk(&self, file_path: &str, line: usize, text: &str, metadata: ChunkMetadata) -> Chunk {
        Chunk {
            id: self.ids.next_id(),
            file_name: file_path.to_string(),
            line,
            content: text.to_string(),
            metadata,
            embedding: Vec::new(),
        }
    }
}

/// `(1-based line number, trimmed text)` for every non-blank line.
fn non_blank_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split('\n')
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn bare_file_name(file_path: &str) -> String {
    Path::new(file_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.to_string())
}

/// Extension of `path` with its leading dot (`"src/Foo.cs"` → `".cs"`),
/// or an empty string when there is none.
pub fn file_extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
