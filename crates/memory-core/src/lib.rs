//! ============================================================================
//! MEMORY-CORE: Semantic memory for agents
//! ============================================================================
//! This crate handles the memory orchestration layer:
//! - Embedding text via an OpenAI-compatible API
//! - Collection provisioning, upserts and search against Qdrant over HTTP
//! - store / find / debug operations and their tool definitions
//! ============================================================================

pub mod config;
pub mod error;
pub mod memory;
pub mod tools;

// Re-export main types for convenience
pub use config::{CollectionMode, EmbeddingConfig, MemoryConfig, VectorStoreConfig};
pub use error::MemoryError;
pub use memory::{EmbeddingProvider, MemoryService, OpenAiEmbeddings, VectorStoreClient};
pub use tools::{ToolDefinition, ToolError, ToolSurface};
