//! Wiring from configuration to the running pipeline.
//!
//! One in-memory store is shared by the ingestor and the search service,
//! so searches see whatever the last completed ingest wrote.

use std::sync::Arc;

use anyhow::Result;

use vectordocs_core::chunk::Chunker;
use vectordocs_core::ingest::Ingestor;
use vectordocs_core::progress::ProgressReporter;
use vectordocs_core::search::SearchService;
use vectordocs_core::store::memory::InMemoryStore;
use vectordocs_core::store::VectorStore;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::tools::ToolContext;
use crate::walker::FsWalker;

pub struct Services {
    pub config: Arc<Config>,
    pub store: Arc<dyn VectorStore>,
    pub ingestor: Arc<Ingestor>,
    pub search: Arc<SearchService>,
}

impl Services {
    /// Build the embedder, walker, store, ingestor, and search service
    /// described by `config`.
    pub fn from_config(config: Config, progress: Arc<dyn ProgressReporter>) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let walker = Arc::new(FsWalker::from_config(&config.ingest)?);
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());

        let chunker =
            Chunker::new().with_structured_extensions(config.ingest.structured_extensions.clone());
        let ingestor = Ingestor::new(walker, embedder.clone(), store.clone())
            .with_chunker(chunker)
            .with_progress(progress)
            .with_progress_every(config.ingest.progress_every);
        let search = SearchService::new(embedder, store.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            ingestor: Arc::new(ingestor),
            search: Arc::new(search),
        })
    }

    pub fn tool_context(&self) -> ToolContext {
        ToolContext::new(
            self.config.clone(),
            self.ingestor.clone(),
            self.search.clone(),
        )
    }
}
