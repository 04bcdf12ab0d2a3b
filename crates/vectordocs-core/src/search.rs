//! Similarity search over an ingested collection.
//!
//! Embeds the query text, asks the collection for its nearest neighbors,
//! and maps each stored chunk into a display-ready [`SearchHit`]:
//! the chunk's line as text, its file as the name, and `"Line {n}"` as
//! the locator.
//!
//! Records that are not chunks are decoded from their JSON payload when
//! possible; anything else aborts the query with [`Error::Mapping`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::store::{Record, VectorStore};

/// A ranked, human-readable search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// The matching source line.
    pub text: String,
    /// File the line came from, relative to the indexed root.
    pub name: String,
    /// `"Line {n}"`.
    pub link: String,
    /// Cosine similarity to the query.
    pub score: f32,
}

impl SearchHit {
    pub fn from_chunk(chunk: &Chunk, score: f32) -> Self {
        Self {
            text: chunk.content.clone(),
            name: chunk.file_name.clone(),
            link: chunk.locator(),
            score,
        }
    }
}

/// Interpret a stored record as a chunk.
pub fn record_to_chunk(collection: &str, record: Record) -> Result<Chunk> {
    match record {
        Record::Chunk(chunk) => Ok(chunk),
        Record::Raw {
            id,
            vector,
            payload,
        } => {
            let mut chunk: Chunk =
                serde_json::from_value(payload).map_err(|e| Error::Mapping {
                    collection: collection.to_string(),
                    id: id.clone(),
                    reason: e.to_string(),
                })?;
            if chunk.id != id {
                return Err(Error::Mapping {
                    collection: collection.to_string(),
                    id,
                    reason: format!("payload carries id '{}'", chunk.id),
                });
            }
            if !chunk.is_embedded() {
                chunk.embedding = vector;
            }
            Ok(chunk)
        }
    }
}

/// Query-side counterpart of the ingest pipeline.
pub struct SearchService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl SearchService {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Return up to `k` hits for `query` from `collection`, most similar first.
    ///
    /// A blank query or `k == 0` returns no hits without calling the embedder.
    ///
    /// # Errors
    ///
    /// - [`Error::Embedding`] if the query cannot be embedded.
    /// - [`Error::Store`] if the collection does not exist or the query fails.
    /// - [`Error::Mapping`] if a returned record is not a chunk.
    pub async fn search(&self, query: &str, collection: &str, k: usize) -> Result<Vec<SearchHit>> {
        let ranked = self.search_chunks(query, collection, k).await?;
        Ok(ranked
            .iter()
            .map(|(chunk, score)| SearchHit::from_chunk(chunk, *score))
            .collect())
    }

    /// Like [`search`](SearchService::search), returning the full chunks.
    pub async fn search_chunks(
        &self,
        query: &str,
        collection: &str,
        k: usize,
    ) -> Result<Vec<(Chunk, f32)>> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        info!(collection, k, "searching");

        let target = self
            .store
            .get_collection(collection)
            .await?
            .ok_or_else(|| Error::store("query", collection, "collection does not exist"))?;

        let query_vec = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| Error::Embedding {
                context: "search query".to_string(),
                message: format!("{:#}", e),
            })?;

        let neighbors = target.nearest_neighbors(&query_vec, k).await?;
        debug!(collection, hits = neighbors.len(), "nearest neighbors returned");

        neighbors
            .into_iter()
            .map(|n| Ok((record_to_chunk(collection, n.record)?, n.score)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkKind, ChunkMetadata};
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;

    const VOCAB: [&str; 3] = ["foo", "bar", "baz"];

    /// One dimension per vocabulary word, counting occurrences.
    struct VocabEmbedder;

    #[async_trait]
    impl Embedder for VocabEmbedder {
        fn model_name(&self) -> &str {
            "vocab"
        }
        fn dims(&self) -> usize {
            VOCAB.len()
        }
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(VOCAB
                .iter()
                .map(|w| lower.matches(w).count() as f32)
                .collect())
        }
    }

    fn chunk(id: &str, file: &str, line: usize, content: &str) -> Chunk {
        let lower = content.to_lowercase();
        Chunk {
            id: id.to_string(),
            file_name: file.to_string(),
            line,
            content: content.to_string(),
            metadata: ChunkMetadata {
                kind: ChunkKind::File,
                file_name: file.to_string(),
                element_name: file.to_string(),
                namespace: String::new(),
                last_modified: Utc::now(),
                tags: vec!["file".to_string(), ".cs".to_string()],
            },
            embedding: VOCAB
                .iter()
                .map(|w| lower.matches(w).count() as f32)
                .collect(),
        }
    }

    async fn service_with(chunks: Vec<Chunk>) -> (SearchService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let col = store.get_or_create_collection("docs").await.unwrap();
        for c in &chunks {
            col.upsert(c).await.unwrap();
        }
        (SearchService::new(Arc::new(VocabEmbedder), store.clone()), store)
    }

    #[tokio::test]
    async fn maps_chunks_to_hits() {
        let (service, _) = service_with(vec![
            chunk("1", "Foo.cs", 3, "class Foo"),
            chunk("2", "Bar.cs", 7, "class Bar"),
        ])
        .await;
        let hits = service.search("foo", "docs", 1).await.unwrap();
        assert_eq!(
            hits,
            vec![SearchHit {
                text: "class Foo".to_string(),
                name: "Foo.cs".to_string(),
                link: "Line 3".to_string(),
                score: 1.0,
            }]
        );
    }

    #[tokio::test]
    async fn hits_are_ordered_by_descending_score() {
        let (service, _) = service_with(vec![
            chunk("1", "a.cs", 1, "bar baz"),
            chunk("2", "b.cs", 1, "foo bar"),
            chunk("3", "c.cs", 1, "foo"),
            chunk("4", "d.cs", 1, "baz"),
        ])
        .await;
        let hits = service.search("foo", "docs", 10).await.unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].name, "c.cs");
        assert_eq!(hits[1].name, "b.cs");
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn blank_query_returns_nothing() {
        let (service, _) = service_with(vec![chunk("1", "a.cs", 1, "foo")]).await;
        assert!(service.search("   ", "docs", 5).await.unwrap().is_empty());
        assert!(service.search("foo", "docs", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_collection_is_a_store_error() {
        let (service, _) = service_with(Vec::new()).await;
        let err = service.search("foo", "nope", 5).await.unwrap_err();
        assert!(matches!(err, Error::Store { operation: "query", .. }));
    }

    #[tokio::test]
    async fn raw_chunk_payloads_are_decoded() {
        let (service, store) = service_with(Vec::new()).await;
        let stored = chunk("r1", "Raw.cs", 2, "foo from payload");
        let col = store.get_collection("docs").await.unwrap().unwrap();
        col.upsert_record(Record::Raw {
            id: "r1".to_string(),
            vector: stored.embedding.clone(),
            payload: serde_json::to_value(&stored).unwrap(),
        })
        .await
        .unwrap();

        let hits = service.search("foo", "docs", 1).await.unwrap();
        assert_eq!(hits[0].text, "foo from payload");
        assert_eq!(hits[0].link, "Line 2");
    }

    #[tokio::test]
    async fn raw_payload_without_embedding_takes_the_record_vector() {
        let stored = chunk("r1", "Raw.cs", 2, "foo from payload");
        let vector = stored.embedding.clone();
        let mut payload = serde_json::to_value(&stored).unwrap();
        payload.as_object_mut().unwrap().remove("embedding");

        let mapped = record_to_chunk(
            "docs",
            Record::Raw {
                id: "r1".to_string(),
                vector: vector.clone(),
                payload,
            },
        )
        .unwrap();
        assert!(mapped.is_embedded());
        assert_eq!(mapped.embedding, vector);
    }

    #[tokio::test]
    async fn foreign_records_fail_with_mapping_error() {
        let (service, store) = service_with(vec![chunk("1", "a.cs", 1, "bar")]).await;
        let col = store.get_collection("docs").await.unwrap().unwrap();
        col.upsert_record(Record::Raw {
            id: "alien".to_string(),
            vector: vec![1.0, 0.0, 0.0],
            payload: serde_json::json!({ "title": "not a chunk" }),
        })
        .await
        .unwrap();

        let err = service.search("foo", "docs", 5).await.unwrap_err();
        match err {
            Error::Mapping { collection, id, .. } => {
                assert_eq!(collection, "docs");
                assert_eq!(id, "alien");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn mismatched_payload_id_is_rejected() {
        let stored = chunk("inner", "a.cs", 1, "foo");
        let err = record_to_chunk(
            "docs",
            Record::Raw {
                id: "outer".to_string(),
                vector: Vec::new(),
                payload: serde_json::to_value(&stored).unwrap(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("payload carries id 'inner'"));
    }
}
