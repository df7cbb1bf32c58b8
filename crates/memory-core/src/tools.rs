//! ============================================================================
//! Tool Surface - store / find / debug as agent-callable tools
//! ============================================================================
//! Two static definition sets, one per collection mode. In fixed-collection
//! mode no schema mentions `collection_name` and supplied values are ignored.
//! ============================================================================

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::CollectionMode;
use crate::error::MemoryError;
use crate::memory::MemoryService;

pub const STORE_TOOL: &str = "store";
pub const FIND_TOOL: &str = "find";
pub const DEBUG_TOOL: &str = "debug";

const STORE_DESCRIPTION: &str = "Keep the memory for later use, when you are asked to remember something. \
    The information is embedded and stored in the vector database; returns the stored ID.";
const FIND_DESCRIPTION: &str = "Look up memories in the vector database. Use this tool when you need to \
    find memories by their content, access memories for further analysis or get some personal \
    information about the user. Returns one result per matching memory, best match first.";
const DEBUG_DESCRIPTION: &str = "Inspect the collection configuration and view a sample of stored \
    points. Useful for debugging collection settings or verifying stored content.";

/// A tool as advertised to the calling agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static FIXED_COLLECTION_TOOLS: Lazy<Vec<ToolDefinition>> = Lazy::new(|| {
    vec![
        ToolDefinition {
            name: STORE_TOOL,
            description: STORE_DESCRIPTION,
            input_schema: json!({
                "type": "object",
                "properties": {
                    "information": {
                        "type": "string",
                        "description": "The text to remember"
                    },
                    "metadata": {
                        "type": "object",
                        "description": "Optional JSON metadata stored alongside the text"
                    }
                },
                "required": ["information"]
            }),
        },
        ToolDefinition {
            name: FIND_TOOL,
            description: FIND_DESCRIPTION,
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for"
                    },
                    "vector_name": {
                        "type": "string",
                        "enum": ["dense", "sparse"],
                        "default": "dense",
                        "description": "Named vector to search (default: dense)"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: DEBUG_TOOL,
            description: DEBUG_DESCRIPTION,
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
    ]
});

static CALLER_COLLECTION_TOOLS: Lazy<Vec<ToolDefinition>> = Lazy::new(|| {
    vec![
        ToolDefinition {
            name: STORE_TOOL,
            description: STORE_DESCRIPTION,
            input_schema: json!({
                "type": "object",
                "properties": {
                    "information": {
                        "type": "string",
                        "description": "The text to remember"
                    },
                    "metadata": {
                        "type": "object",
                        "description": "Optional JSON metadata stored alongside the text"
                    },
                    "collection_name": {
                        "type": "string",
                        "description": "The collection to store the information in"
                    }
                },
                "required": ["information", "collection_name"]
            }),
        },
        ToolDefinition {
            name: FIND_TOOL,
            description: FIND_DESCRIPTION,
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for"
                    },
                    "vector_name": {
                        "type": "string",
                        "enum": ["dense", "sparse"],
                        "default": "dense",
                        "description": "Named vector to search (default: dense)"
                    },
                    "collection_name": {
                        "type": "string",
                        "description": "The collection to search in"
                    }
                },
                "required": ["query", "collection_name"]
            }),
        },
        ToolDefinition {
            name: DEBUG_TOOL,
            description: DEBUG_DESCRIPTION,
            input_schema: json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "The collection to inspect"
                    }
                },
                "required": ["collection_name"]
            }),
        },
    ]
});

/// Errors surfaced by [`ToolSurface::call`]
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error(transparent)]
    Failed(#[from] MemoryError),
}

/// Named vector selectable by `find`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum VectorName {
    #[default]
    Dense,
    Sparse,
}

impl VectorName {
    fn as_str(self) -> &'static str {
        match self {
            VectorName::Dense => "dense",
            VectorName::Sparse => "sparse",
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoreArgs {
    information: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    #[serde(default)]
    collection_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindArgs {
    query: String,
    #[serde(default)]
    vector_name: Option<VectorName>,
    #[serde(default)]
    collection_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DebugArgs {
    #[serde(default)]
    collection_name: Option<String>,
}

/// Decodes tool calls and runs them against a [`MemoryService`]
pub struct ToolSurface {
    service: Arc<MemoryService>,
}

impl ToolSurface {
    pub fn new(service: Arc<MemoryService>) -> Self {
        Self { service }
    }

    /// Tool definitions for a collection mode
    pub fn definitions_for(mode: &CollectionMode) -> &'static [ToolDefinition] {
        match mode {
            CollectionMode::Fixed(_) => FIXED_COLLECTION_TOOLS.as_slice(),
            CollectionMode::CallerSupplied => CALLER_COLLECTION_TOOLS.as_slice(),
        }
    }

    /// Tool definitions for the service's configured mode
    pub fn definitions(&self) -> &'static [ToolDefinition] {
        Self::definitions_for(self.service.collection_mode())
    }

    /// Run a tool; returns one text item per message
    pub async fn call(&self, name: &str, arguments: &Value) -> Result<Vec<String>, ToolError> {
        debug!("Tool call: {}", name);

        match name {
            STORE_TOOL => {
                let args: StoreArgs = decode(name, arguments)?;
                let collection = self.caller_collection(args.collection_name.as_deref());
                let confirmation = self
                    .service
                    .store(&args.information, args.metadata, collection)
                    .await?;
                Ok(vec![confirmation])
            }
            FIND_TOOL => {
                let args: FindArgs = decode(name, arguments)?;
                let collection = self.caller_collection(args.collection_name.as_deref());
                let vector_name = args.vector_name.unwrap_or_default();
                Ok(self
                    .service
                    .find(&args.query, collection, Some(vector_name.as_str()))
                    .await?)
            }
            DEBUG_TOOL => {
                let args: DebugArgs = if arguments.is_null() {
                    DebugArgs::default()
                } else {
                    decode(name, arguments)?
                };
                let collection = self.caller_collection(args.collection_name.as_deref());
                Ok(vec![self.service.debug(collection).await?])
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    /// Fixed-collection mode ignores any caller-supplied name
    fn caller_collection<'a>(&self, supplied: Option<&'a str>) -> Option<&'a str> {
        match self.service.collection_mode() {
            CollectionMode::Fixed(_) => None,
            CollectionMode::CallerSupplied => supplied,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(tool: &str, arguments: &Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments.clone()).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}
