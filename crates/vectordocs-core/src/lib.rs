//! # vectordocs core
//!
//! Filesystem-free logic for vectordocs: the chunk model, the line-granular
//! code chunker, the vector store abstraction with an in-memory backend, the
//! batch ingest pipeline, and similarity search.
//!
//! Everything that touches the outside world (directory walking, embedding
//! backends, progress sinks) is reached through a trait, so the pipeline can
//! run against in-memory doubles in tests and against real backends in the
//! `vectordocs` binary.
//!
//! ```text
//! FileWalker ──▶ Chunker ──▶ Embedder ──▶ Collection::upsert
//!                                              │
//! query ──▶ Embedder ──▶ Collection::nearest_neighbors ──▶ SearchHit
//! ```

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod models;
pub mod progress;
pub mod search;
pub mod store;

pub use error::{Error, Result};
