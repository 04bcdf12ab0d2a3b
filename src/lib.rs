//! # vectordocs
//!
//! Index a source tree into line-level semantic chunks and answer
//! similarity queries against them.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────┐   ┌─────────────┐
//! │  FsWalker  │──▶│ Chunker + Embedder   │──▶│ VectorStore │
//! │ (walkdir)  │   │ (Ingestor)           │   │ (in-memory) │
//! └────────────┘   └──────────────────────┘   └──────┬──────┘
//!                                                    │
//!                       ┌────────────────────────────┤
//!                       ▼                            ▼
//!                 ┌──────────┐               ┌──────────────┐
//!                 │   CLI    │               │    Tools     │
//!                 │  (vdocs) │               │ (chat layer) │
//!                 └──────────┘               └──────────────┘
//! ```
//!
//! The chunking, store, ingest, and search logic lives in
//! [`vectordocs_core`]; this crate adds the filesystem walker, remote
//! embedding backends, configuration, progress sinks, and the tool surface.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`walker`] | Filesystem walker |
//! | [`embedding`] | Embedding backends and provider selection |
//! | [`progress`] | Stderr / JSON progress sinks |
//! | [`services`] | Wiring config into an ingestor and search service |
//! | [`tools`] | Callable tools for a chat front-end |

pub mod config;
pub mod embedding;
pub mod progress;
pub mod services;
pub mod tools;
pub mod walker;
