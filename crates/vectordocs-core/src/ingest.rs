//! Batch ingest pipeline.
//!
//! Walks a directory, chunks every matching file, embeds each chunk, and
//! upserts it into a named collection:
//!
//! ```text
//! FileWalker::list_files ─▶ Chunker::chunk ─▶ Embedder::embed ─▶ Collection::upsert
//! ```
//!
//! Every run is a full pass; chunks get fresh ids, so re-ingesting the same
//! tree into the same collection adds a second copy rather than replacing
//! the first.
//!
//! Files are processed in lexical order of their relative path and chunks
//! are persisted strictly one at a time in emission order. The first
//! embedding or store failure aborts the batch with [`Error::Aborted`],
//! carrying the number of chunks already persisted; those chunks stay in
//! the collection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::chunk::{file_extension, Chunker};
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::progress::{IngestProgress, NoProgress, ProgressReporter};
use crate::store::{Collection, VectorStore};

/// Default progress cadence, in chunks.
pub const DEFAULT_PROGRESS_EVERY: usize = 10;

/// Suffix filter over file names, parsed from a comma-separated list.
///
/// Matching is a case-sensitive `ends_with`, so `.js` also accepts
/// `bundle.cjs`. Entries are trimmed; empty entries are dropped.
///
/// ```rust
/// use vectordocs_core::ingest::ExtensionFilter;
///
/// let filter = ExtensionFilter::parse(" .cs , .js,");
/// assert_eq!(filter.suffixes(), &[".cs".to_string(), ".js".to_string()]);
/// assert!(filter.matches("src/App.cs"));
/// assert!(filter.matches("dist/bundle.cjs"));
/// assert!(!filter.matches("README.md"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    suffixes: Vec<String>,
}

impl ExtensionFilter {
    pub fn parse(spec: &str) -> Self {
        Self {
            suffixes: spec
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn matches(&self, path: &str) -> bool {
        self.suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }
}

impl std::fmt::Display for ExtensionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.suffixes.join(","))
    }
}

/// A file discovered under the ingest root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path the walker can open.
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated. Becomes the chunk's `fileName`.
    pub relative_path: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Enumerates and reads files under a root directory.
#[async_trait]
pub trait FileWalker: Send + Sync {
    /// List every file under `root`, recursively, whose relative path
    /// matches `filter`.
    ///
    /// Must fail with [`Error::NotFound`] when `root` does not exist.
    async fn list_files(&self, root: &Path, filter: &ExtensionFilter) -> Result<Vec<SourceFile>>;

    /// Read the full text of a listed file.
    async fn read_to_string(&self, file: &SourceFile) -> anyhow::Result<String>;
}

/// Outcome of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub file_count: usize,
    pub chunk_count: usize,
}

/// Orchestrates walker, chunker, embedder, and store for one-shot ingests.
pub struct Ingestor {
    walker: Arc<dyn FileWalker>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunker: Chunker,
    progress: Arc<dyn ProgressReporter>,
    progress_every: usize,
}

impl Ingestor {
    pub fn new(
        walker: Arc<dyn FileWalker>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            walker,
            embedder,
            store,
            chunker: Chunker::new(),
            progress: Arc::new(NoProgress),
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Report progress every `n` chunks. Zero is treated as one.
    pub fn with_progress_every(mut self, n: usize) -> Self {
        self.progress_every = n.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Ingest every file under `root` matching `extensions` into `collection`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `root` does not exist.
    /// - [`Error::Read`] if a listed file cannot be read; nothing is persisted.
    /// - [`Error::Store`] if the collection cannot be created.
    /// - [`Error::Aborted`] on the first embedding or upsert failure, with
    ///   the count of chunks persisted before it.
    pub async fn ingest(&self, root: &Path, extensions: &str, collection: &str) -> Result<IngestReport> {
        let filter = ExtensionFilter::parse(extensions);
        info!(root = %root.display(), extensions = %filter, collection, "starting ingest");

        let (file_count, chunks) = self.chunk_directory(root, &filter).await?;
        let chunk_count = chunks.len();

        let target = self.store.get_or_create_collection(collection).await?;
        self.upsert_all(target.as_ref(), chunks).await?;

        self.progress.report(IngestProgress::Completed {
            files: file_count,
            chunks: chunk_count,
        });
        info!(collection, files = file_count, chunks = chunk_count, "ingest completed");

        Ok(IngestReport {
            collection: collection.to_string(),
            file_count,
            chunk_count,
        })
    }

    /// Walk and chunk `root` without embedding or persisting anything.
    ///
    /// Returns the number of files matched and every chunk in emission order.
    pub async fn chunk_directory(
        &self,
        root: &Path,
        filter: &ExtensionFilter,
    ) -> Result<(usize, Vec<Chunk>)> {
        let mut files = self.walker.list_files(root, filter).await?;
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        info!(files = files.len(), root = %root.display(), "found files to process");
        self.progress
            .report(IngestProgress::Discovered { files: files.len() });

        let mut chunks = Vec::new();
        for file in &files {
            let content = self
                .walker
                .read_to_string(file)
                .await
                .map_err(|e| Error::Read {
                    path: file.path.clone(),
                    message: format!("{:#}", e),
                })?;
            let extension = file_extension(&file.relative_path);
            let file_chunks =
                self.chunker
                    .chunk(&content, &file.relative_path, &extension, file.last_modified);
            debug!(file = %file.relative_path, chunks = file_chunks.len(), "chunked file");
            chunks.extend(file_chunks);
        }

        self.progress.report(IngestProgress::Chunked {
            files: files.len(),
            chunks: chunks.len(),
        });
        info!(chunks = chunks.len(), "analysis complete");

        Ok((files.len(), chunks))
    }

    async fn upsert_all(&self, collection: &dyn Collection, chunks: Vec<Chunk>) -> Result<()> {
        let total = chunks.len();
        let mut persisted = 0usize;

        for mut chunk in chunks {
            if let Err(e) = self.embed_and_upsert(collection, &mut chunk).await {
                error!(
                    collection = collection.name(),
                    persisted,
                    total,
                    chunk = %chunk.id,
                    error = %e,
                    "ingest aborted"
                );
                return Err(Error::Aborted {
                    persisted,
                    total,
                    source: Box::new(e),
                });
            }

            persisted += 1;
            if persisted % self.progress_every == 0 {
                debug!(persisted, total, "ingest progress");
                self.progress.report(IngestProgress::Upserting {
                    processed: persisted,
                    total,
                });
            }
        }

        Ok(())
    }

    async fn embed_and_upsert(&self, collection: &dyn Collection, chunk: &mut Chunk) -> Result<()> {
        let context = || format!("chunk {} ({}:{})", chunk.id, chunk.file_name, chunk.line);

        let vector = self
            .embedder
            .embed(&chunk.content)
            .await
            .map_err(|e| Error::Embedding {
                context: context(),
                message: format!("{:#}", e),
            })?;

        let dims = self.embedder.dims();
        if vector.len() != dims {
            return Err(Error::Embedding {
                context: context(),
                message: format!("expected {} dimensions, got {}", dims, vector.len()),
            });
        }

        chunk.embedding = vector;
        collection.upsert(chunk).await
    }
}
