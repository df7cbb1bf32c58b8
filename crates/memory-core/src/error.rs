//! ============================================================================
//! Error Types for the Memory Core
//! ============================================================================
//! Every failure a store / find / debug call can surface to the tool boundary.
//! ============================================================================

/// Failures raised by the memory layer.
///
/// The `Display` text is what the tool boundary reports to the caller, so each
/// variant carries the underlying message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// Caller mistake detected before any remote call (e.g. no collection name)
    #[error("{0}")]
    Configuration(String),

    /// The embedding provider failed or returned nothing usable
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// The vector store returned a non-success status or was unreachable
    #[error("Vector store error: {0}")]
    Store(String),
}

impl MemoryError {
    pub fn missing_collection() -> Self {
        MemoryError::Configuration("collection name is required".to_string())
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
