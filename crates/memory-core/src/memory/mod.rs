//! ============================================================================
//! Memory Module - Semantic memory over a vector database
//! ============================================================================
//! Persists free-text memories as Qdrant points and retrieves them by
//! embedding similarity.
//!
//! ## Architecture
//! ```text
//! store(text) → Embed → Ensure Collection → Upsert Point
//! find(query) → Embed → Vector Search → Ranked Messages
//! debug()     → Collection Info + Scroll Sample → Report
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use memory_core::memory::{MemoryService, OpenAiEmbeddings};
//!
//! let embeddings = Arc::new(OpenAiEmbeddings::new(&config.embedding));
//! let service = MemoryService::new(&config, embeddings);
//!
//! service.store("User prefers concise responses", None, Some("notes")).await?;
//! let hits = service.find("how should I respond", Some("notes"), Some("dense")).await?;
//! ```
//! ============================================================================

mod embeddings;
mod manager;
mod response;
mod store;
mod types;

// Re-export public types
pub use embeddings::{EmbeddingProvider, OpenAiEmbeddings};
pub use manager::{MemoryService, FIND_LIMIT};
pub use response::{extract_error_message, VECTOR_NAME_HINT};
pub use store::{VectorStoreClient, SAMPLE_LIMIT};
pub use types::{
    CollectionInspection, Payload, Point, PointId, PointVector, SampledPoint, SearchResult,
    VectorParams, VectorsConfig, DISTANCE_COSINE,
};
