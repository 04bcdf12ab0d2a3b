//! In-memory [`VectorStore`] implementation.
//!
//! Each collection keeps its records in insertion order behind a
//! `std::sync::RwLock`, with an id index for overwrite-in-place upserts.
//! Nearest-neighbor search is brute-force cosine similarity; ties keep
//! insertion order. A NaN score ranks last as negative infinity.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::error::{Error, Result};

use super::{Collection, Neighbor, Record, VectorStore};

#[derive(Default)]
struct Entries {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

/// A single in-memory collection.
pub struct InMemoryCollection {
    name: String,
    entries: RwLock<Entries>,
}

impl InMemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(Entries::default()),
        }
    }
}

#[async_trait]
impl Collection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert_record(&self, record: Record) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::store("upsert", &self.name, e))?;
        let id = record.id().to_string();
        match entries.index.get(&id).copied() {
            Some(pos) => entries.records[pos] = record,
            None => {
                let pos = entries.records.len();
                entries.records.push(record);
                entries.index.insert(id, pos);
            }
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Record>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::store("get", &self.name, e))?;
        Ok(entries
            .index
            .get(id)
            .map(|&pos| entries.records[pos].clone()))
    }

    async fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::store("len", &self.name, e))?;
        Ok(entries.records.len())
    }

    async fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::store("query", &self.name, e))?;

        let mut scored: Vec<(usize, f32)> = entries
            .records
            .iter()
            .enumerate()
            .map(|(pos, record)| {
                let score = cosine_similarity(query, record.vector());
                (pos, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| Neighbor {
                record: entries.records[pos].clone(),
                score,
            })
            .collect())
    }
}

/// In-memory store. Contents live as long as the process.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Arc<InMemoryCollection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn get_or_create_collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| Error::store("create", name, e))?;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemoryCollection::new(name)))
            .clone();
        let collection: Arc<dyn Collection> = collection;
        Ok(collection)
    }

    async fn get_collection(&self, name: &str) -> Result<Option<Arc<dyn Collection>>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| Error::store("open", name, e))?;
        Ok(collections
            .get(name)
            .map(|c| c.clone() as Arc<dyn Collection>))
    }

    async fn delete_collection(&self, name: &str) -> Result<bool> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| Error::store("delete", name, e))?;
        Ok(collections.remove(name).is_some())
    }

    async fn collection_names(&self) -> Result<Vec<String>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| Error::store("list", "*", e))?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, ChunkKind, ChunkMetadata};
    use chrono::Utc;

    fn chunk(id: &str, content: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            file_name: "Foo.cs".to_string(),
            line: 1,
            content: content.to_string(),
            metadata: ChunkMetadata {
                kind: ChunkKind::File,
                file_name: "Foo.cs".to_string(),
                element_name: "Foo.cs".to_string(),
                namespace: String::new(),
                last_modified: Utc::now(),
                tags: vec!["file".to_string(), ".cs".to_string()],
            },
            embedding,
        }
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let store = InMemoryStore::new();
        let a = store.get_or_create_collection("docs").await.unwrap();
        a.upsert(&chunk("c1", "x", vec![1.0, 0.0])).await.unwrap();
        let b = store.get_or_create_collection("docs").await.unwrap();
        assert_eq!(b.len().await.unwrap(), 1);
        assert_eq!(store.collection_names().await.unwrap(), vec!["docs"]);
    }

    #[tokio::test]
    async fn upsert_overwrites_by_id_in_place() {
        let store = InMemoryStore::new();
        let col = store.get_or_create_collection("docs").await.unwrap();
        col.upsert(&chunk("c1", "old", vec![1.0, 0.0])).await.unwrap();
        col.upsert(&chunk("c2", "other", vec![0.0, 1.0])).await.unwrap();
        col.upsert(&chunk("c1", "new", vec![1.0, 0.0])).await.unwrap();

        assert_eq!(col.len().await.unwrap(), 2);
        match col.get("c1").await.unwrap() {
            Some(Record::Chunk(c)) => assert_eq!(c.content, "new"),
            other => panic!("unexpected record: {:?}", other),
        }
        assert!(col.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn neighbors_are_ordered_most_similar_first() {
        let store = InMemoryStore::new();
        let col = store.get_or_create_collection("docs").await.unwrap();
        col.upsert(&chunk("far", "far", vec![0.0, 1.0])).await.unwrap();
        col.upsert(&chunk("near", "near", vec![1.0, 0.1])).await.unwrap();
        col.upsert(&chunk("mid", "mid", vec![1.0, 1.0])).await.unwrap();

        let hits = col.nearest_neighbors(&[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|n| n.record.id()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn self_query_ranks_first() {
        let store = InMemoryStore::new();
        let col = store.get_or_create_collection("docs").await.unwrap();
        let vectors = [
            vec![0.9, 0.1, 0.0],
            vec![0.2, 0.8, 0.3],
            vec![0.1, 0.1, 0.9],
            vec![0.5, 0.5, 0.5],
        ];
        for (i, v) in vectors.iter().enumerate() {
            col.upsert(&chunk(&format!("c{}", i), "line", v.clone()))
                .await
                .unwrap();
        }
        for (i, v) in vectors.iter().enumerate() {
            let hits = col.nearest_neighbors(v, 1).await.unwrap();
            assert_eq!(hits[0].record.id(), format!("c{}", i));
        }
    }

    #[tokio::test]
    async fn nan_scores_rank_last_and_keep_the_order() {
        let store = InMemoryStore::new();
        let col = store.get_or_create_collection("docs").await.unwrap();
        let vectors = [
            ("a", vec![0.1, 1.0]),
            ("bad1", vec![f32::NAN, 0.0]),
            ("b", vec![1.0, 0.0]),
            ("c", vec![1.0, 1.0]),
            ("bad2", vec![0.0, f32::NAN]),
            ("d", vec![1.0, 0.11]),
            ("e", vec![0.25, 1.0]),
        ];
        for (id, v) in vectors.iter() {
            col.upsert(&chunk(id, "x", v.clone())).await.unwrap();
        }

        let hits = col.nearest_neighbors(&[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|n| n.record.id()).collect();
        assert_eq!(ids, vec!["b", "d", "c", "e", "a", "bad1", "bad2"]);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(hits[6].score, f32::NEG_INFINITY);
    }

    #[tokio::test]
    async fn self_query_ranks_first_for_small_norms() {
        let store = InMemoryStore::new();
        let col = store.get_or_create_collection("docs").await.unwrap();
        col.upsert(&chunk("small", "x", vec![1e-4, 0.0])).await.unwrap();
        col.upsert(&chunk("other", "y", vec![1.0, 1.0])).await.unwrap();

        let hits = col.nearest_neighbors(&[1e-4, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].record.id(), "small");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn k_limits_results() {
        let store = InMemoryStore::new();
        let col = store.get_or_create_collection("docs").await.unwrap();
        for i in 0..5 {
            col.upsert(&chunk(&format!("c{}", i), "x", vec![1.0, i as f32]))
                .await
                .unwrap();
        }
        assert_eq!(col.nearest_neighbors(&[1.0, 0.0], 2).await.unwrap().len(), 2);
        assert!(col.nearest_neighbors(&[1.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn collections_are_independent_and_deletable() {
        let store = InMemoryStore::new();
        let a = store.get_or_create_collection("a").await.unwrap();
        store.get_or_create_collection("b").await.unwrap();
        a.upsert(&chunk("c1", "x", vec![1.0])).await.unwrap();

        let b = store.get_collection("b").await.unwrap().unwrap();
        assert!(b.is_empty().await.unwrap());
        assert!(store.get_collection("c").await.unwrap().is_none());

        assert!(store.delete_collection("a").await.unwrap());
        assert!(!store.delete_collection("a").await.unwrap());
        assert_eq!(store.collection_names().await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn raw_records_share_the_id_space() {
        let store = InMemoryStore::new();
        let col = store.get_or_create_collection("mixed").await.unwrap();
        col.upsert_record(Record::Raw {
            id: "r1".to_string(),
            vector: vec![1.0, 0.0],
            payload: serde_json::json!({ "title": "not a chunk" }),
        })
        .await
        .unwrap();
        col.upsert(&chunk("c1", "x", vec![0.0, 1.0])).await.unwrap();

        let hits = col.nearest_neighbors(&[1.0, 0.0], 2).await.unwrap();
        assert!(matches!(hits[0].record, Record::Raw { .. }));
        assert!(matches!(hits[1].record, Record::Chunk(_)));
    }
}
