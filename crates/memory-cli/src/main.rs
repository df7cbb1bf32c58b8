// ============================================================================
// qdrant-memory — semantic memory tools over Qdrant
// ============================================================================
// Usage:
//   qdrant-memory store "text" [--metadata JSON]   Embed and store a memory
//   qdrant-memory find "query" [--vector-name N]   Semantic search
//   qdrant-memory debug                            Collection info + samples
//   qdrant-memory tools                            Print tool definitions
//   qdrant-memory serve                            JSON-RPC tool server on stdio
// ============================================================================

mod serve;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use memory_core::{
    CollectionMode, EmbeddingConfig, MemoryConfig, MemoryService, OpenAiEmbeddings, ToolSurface,
    VectorStoreConfig,
};
use serde_json::{Map, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Semantic memory tools backed by Qdrant and an embeddings API
#[derive(Parser)]
#[command(name = "qdrant-memory", version, about = "Store and recall memories by semantic similarity")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

/// Connection settings, read once at startup
#[derive(Args)]
struct Settings {
    /// Qdrant REST endpoint
    #[arg(long, env = "QDRANT_URL", default_value = memory_core::config::DEFAULT_QDRANT_URL, global = true)]
    qdrant_url: String,

    /// Qdrant API key (sent as the api-key header)
    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true, global = true)]
    qdrant_api_key: Option<String>,

    /// Default collection; when set, tools do not take a collection argument
    #[arg(long, env = "COLLECTION_NAME", global = true)]
    collection: Option<String>,

    /// Embedding API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    embedding_api_key: Option<String>,

    /// OpenAI-compatible embeddings base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = memory_core::config::DEFAULT_EMBEDDING_BASE_URL, global = true)]
    embedding_base_url: String,

    /// Embedding model identifier
    #[arg(long, env = "EMBEDDING_MODEL", default_value = memory_core::config::DEFAULT_EMBEDDING_MODEL, global = true)]
    embedding_model: String,

    /// Named vector used when provisioning collections and storing points
    /// (empty for the unnamed default vector)
    #[arg(long, env = "VECTOR_NAME", default_value = memory_core::config::DEFAULT_VECTOR_NAME, global = true)]
    store_vector_name: Option<String>,
}

impl Settings {
    fn into_config(self) -> MemoryConfig {
        MemoryConfig {
            vector_store: VectorStoreConfig {
                url: self.qdrant_url,
                api_key: self.qdrant_api_key,
            },
            embedding: EmbeddingConfig {
                api_key: self.embedding_api_key,
                base_url: self.embedding_base_url,
                model: self.embedding_model,
            },
            collection: CollectionMode::from_default(self.collection),
            vector_name: self.store_vector_name,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Embed and store a piece of information
    Store {
        information: String,

        /// JSON object stored alongside the text
        #[arg(long)]
        metadata: Option<String>,

        /// Target collection (overrides the default)
        #[arg(long)]
        collection_name: Option<String>,
    },

    /// Find stored information similar to a query
    Find {
        query: String,

        /// Named vector to search
        #[arg(long, value_enum, default_value = "dense")]
        vector_name: SearchVector,

        /// Target collection (overrides the default)
        #[arg(long)]
        collection_name: Option<String>,
    },

    /// Show collection configuration and sample points
    Debug {
        /// Target collection (overrides the default)
        #[arg(long)]
        collection_name: Option<String>,
    },

    /// Print the tool definitions for the configured collection mode
    Tools,

    /// Serve the tools as JSON-RPC over stdin/stdout
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchVector {
    Dense,
    Sparse,
}

impl SearchVector {
    fn as_str(self) -> &'static str {
        match self {
            SearchVector::Dense => "dense",
            SearchVector::Sparse => "sparse",
        }
    }
}

fn init_tracing() -> Result<()> {
    // stdout carries tool output and protocol messages; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("memory_core=info".parse()?)
                .add_directive("qdrant_memory=info".parse()?),
        )
        .init();
    Ok(())
}

fn parse_metadata(raw: Option<&str>) -> Result<Option<Map<String, Value>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw).context("--metadata must be valid JSON")? {
        Value::Object(map) => Ok(Some(map)),
        other => anyhow::bail!("--metadata must be a JSON object, got: {}", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so env fallbacks see it
    let dotenv = dotenvy::dotenv();
    init_tracing()?;
    if let Err(e) = dotenv {
        debug!("No .env file loaded: {}", e);
    }

    let cli = Cli::parse();
    let config = cli.settings.into_config();

    let embeddings = Arc::new(OpenAiEmbeddings::new(&config.embedding));
    let service = Arc::new(MemoryService::new(&config, embeddings));

    match cli.command {
        Commands::Store {
            information,
            metadata,
            collection_name,
        } => {
            let metadata = parse_metadata(metadata.as_deref())?;
            let confirmation = service
                .store(&information, metadata, collection_name.as_deref())
                .await?;
            println!("{}", confirmation);
        }
        Commands::Find {
            query,
            vector_name,
            collection_name,
        } => {
            let messages = service
                .find(&query, collection_name.as_deref(), Some(vector_name.as_str()))
                .await?;
            println!("{}", messages.join("\n\n"));
        }
        Commands::Debug { collection_name } => {
            println!("{}", service.debug(collection_name.as_deref()).await?);
        }
        Commands::Tools => {
            let tools = ToolSurface::definitions_for(service.collection_mode());
            println!("{}", serde_json::to_string_pretty(tools)?);
        }
        Commands::Serve => {
            info!(
                "Serving memory tools on stdio (collection: {})",
                config.collection.default_collection().unwrap_or("<caller supplied>")
            );
            serve::run(ToolSurface::new(service)).await?;
        }
    }

    Ok(())
}
