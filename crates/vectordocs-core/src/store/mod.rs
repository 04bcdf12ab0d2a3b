//! Storage abstraction for vectordocs.
//!
//! A [`VectorStore`] holds named [`Collection`]s. A collection is keyed by
//! record id and answers nearest-neighbor queries by cosine similarity.
//! The ingest pipeline and the search service only ever talk to these
//! traits, so backends are swapped without touching either.
//!
//! Implementations must be `Send + Sync` and must apply each upsert
//! atomically: a concurrent query sees a record either fully written or
//! not at all.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Chunk;

/// A stored record.
///
/// Collections written by vectordocs only contain [`Record::Chunk`]. A
/// collection shared with other writers may also hold [`Record::Raw`]
/// entries, which readers must interpret themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Chunk(Chunk),
    Raw {
        id: String,
        vector: Vec<f32>,
        payload: serde_json::Value,
    },
}

impl Record {
    pub fn id(&self) -> &str {
        match self {
            Record::Chunk(chunk) => &chunk.id,
            Record::Raw { id, .. } => id,
        }
    }

    pub fn vector(&self) -> &[f32] {
        match self {
            Record::Chunk(chunk) => &chunk.embedding,
            Record::Raw { vector, .. } => vector,
        }
    }
}

impl From<Chunk> for Record {
    fn from(chunk: Chunk) -> Self {
        Record::Chunk(chunk)
    }
}

/// A record returned from a nearest-neighbor query with its similarity.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub record: Record,
    pub score: f32,
}

/// A named group of records inside a [`VectorStore`].
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](Collection::upsert) | Insert a chunk, or overwrite the record with its id |
/// | [`upsert_record`](Collection::upsert_record) | Same, for any [`Record`] |
/// | [`get`](Collection::get) | Fetch a record by id |
/// | [`len`](Collection::len) | Number of stored records |
/// | [`nearest_neighbors`](Collection::nearest_neighbors) | Top-k records, most similar first |
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    async fn upsert_record(&self, record: Record) -> Result<()>;

    async fn upsert(&self, chunk: &Chunk) -> Result<()> {
        self.upsert_record(Record::Chunk(chunk.clone())).await
    }

    async fn get(&self, id: &str) -> Result<Option<Record>>;

    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Return up to `k` records ordered by descending similarity to `query`.
    async fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}

/// A set of independently addressable collections.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return the named collection, creating it empty if absent. Idempotent.
    async fn get_or_create_collection(&self, name: &str) -> Result<Arc<dyn Collection>>;

    /// Return the named collection if it exists.
    async fn get_collection(&self, name: &str) -> Result<Option<Arc<dyn Collection>>>;

    /// Drop the named collection and every record in it. Returns whether it existed.
    async fn delete_collection(&self, name: &str) -> Result<bool>;

    /// Names of all collections, sorted.
    async fn collection_names(&self) -> Result<Vec<String>>;
}
