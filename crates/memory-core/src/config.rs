//! ============================================================================
//! Configuration - Explicit settings for every memory component
//! ============================================================================
//! Built once by the binary (flags / environment) and passed by reference into
//! each constructor. Nothing in this crate reads the process environment.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Default Qdrant REST endpoint
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";

/// Default OpenAI-compatible embeddings endpoint
pub const DEFAULT_EMBEDDING_BASE_URL: &str = "https://api.openai.com/v1";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Named vector provisioned and written by `store`; `find` searches it by default
pub const DEFAULT_VECTOR_NAME: &str = "dense";

/// Where the vector store lives and how to authenticate against it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub url: String,
    /// Sent as the `api-key` header when present
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_QDRANT_URL.to_string(),
            api_key: None,
        }
    }
}

/// OpenAI-compatible embedding API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Sent as a bearer token when present (local servers often need none)
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_EMBEDDING_BASE_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

/// How tool calls pick their collection. Chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMode {
    /// Every call targets this collection; tools do not expose a collection argument
    Fixed(String),
    /// Callers name the collection on each call
    CallerSupplied,
}

impl CollectionMode {
    /// Treats an empty name as "not configured"
    pub fn from_default(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.trim().is_empty() => CollectionMode::Fixed(name),
            _ => CollectionMode::CallerSupplied,
        }
    }

    pub fn default_collection(&self) -> Option<&str> {
        match self {
            CollectionMode::Fixed(name) => Some(name.as_str()),
            CollectionMode::CallerSupplied => None,
        }
    }
}

/// Top-level configuration for the memory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub vector_store: VectorStoreConfig,
    pub embedding: EmbeddingConfig,
    pub collection: CollectionMode,
    /// Named vector that `store` provisions and writes. `None` (or an empty
    /// name) uses the collection's unnamed default vector.
    #[serde(default)]
    pub vector_name: Option<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            vector_store: VectorStoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            collection: CollectionMode::CallerSupplied,
            vector_name: Some(DEFAULT_VECTOR_NAME.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_mode_from_default() {
        assert_eq!(
            CollectionMode::from_default(Some("notes".to_string())),
            CollectionMode::Fixed("notes".to_string())
        );
        assert_eq!(CollectionMode::from_default(None), CollectionMode::CallerSupplied);
        assert_eq!(
            CollectionMode::from_default(Some("  ".to_string())),
            CollectionMode::CallerSupplied
        );
    }

    #[test]
    fn test_defaults() {
        let config = MemoryConfig::default();
        assert_eq!(config.vector_store.url, DEFAULT_QDRANT_URL);
        assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert!(config.collection.default_collection().is_none());
        assert_eq!(config.vector_name.as_deref(), Some(DEFAULT_VECTOR_NAME));
    }
}
