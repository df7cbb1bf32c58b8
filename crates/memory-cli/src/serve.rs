// ============================================================================
// Stdio tool server — line-delimited JSON-RPC 2.0
// ============================================================================
// Methods: initialize, ping, tools/list, tools/call. Notifications (no id)
// never get a response.
// ============================================================================

use anyhow::Result;
use memory_core::{ToolError, ToolSurface};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Read requests from stdin until EOF, answering each on stdout
pub async fn run(surface: ToolSurface) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(request) => handle_request(&surface, &request).await,
            Err(e) => Some(error_response(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            )),
        };

        if let Some(response) = response {
            stdout.write_all(response.to_string().as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    debug!("stdin closed, stopping server");
    Ok(())
}

/// Answer one request; `None` for notifications
pub async fn handle_request(surface: &ToolSurface, request: &Value) -> Option<Value> {
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    let Some(id) = request.get("id").cloned() else {
        match method {
            "notifications/initialized" | "notifications/cancelled" => {}
            other => warn!("Unknown notification: {}", other),
        }
        return None;
    };

    let response = match method {
        "initialize" => success_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "qdrant-memory",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "ping" => success_response(id, json!({})),
        "tools/list" => success_response(id, json!({ "tools": surface.definitions() })),
        "tools/call" => {
            let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
            let name = params.get("name").and_then(Value::as_str).unwrap_or("");
            let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

            match surface.call(name, &arguments).await {
                Ok(messages) => success_response(id, tool_result(&messages, false)),
                Err(ToolError::Failed(e)) => {
                    warn!("Tool {} failed: {}", name, e);
                    success_response(id, tool_result(&[e.to_string()], true))
                }
                Err(e) => error_response(id, INVALID_PARAMS, e.to_string()),
            }
        }
        other => error_response(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
    };

    Some(response)
}

fn tool_result(messages: &[String], is_error: bool) -> Value {
    let content: Vec<Value> = messages
        .iter()
        .map(|text| json!({ "type": "text", "text": text }))
        .collect();
    json!({ "content": content, "isError": is_error })
}

fn success_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::{CollectionMode, MemoryConfig, MemoryService, OpenAiEmbeddings};
    use std::sync::Arc;

    fn surface(collection: CollectionMode) -> ToolSurface {
        let config = MemoryConfig {
            collection,
            ..MemoryConfig::default()
        };
        let embeddings = Arc::new(OpenAiEmbeddings::new(&config.embedding));
        ToolSurface::new(Arc::new(MemoryService::new(&config, embeddings)))
    }

    #[tokio::test]
    async fn test_initialize() {
        let surface = surface(CollectionMode::CallerSupplied);
        let response = handle_request(
            &surface,
            &json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await
        .unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let surface = surface(CollectionMode::CallerSupplied);
        let response = handle_request(
            &surface,
            &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_tools_list_follows_collection_mode() {
        let fixed = surface(CollectionMode::Fixed("notes".to_string()));
        let response = handle_request(
            &fixed,
            &json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"}),
        )
        .await
        .unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 3);
        assert!(tools[0]["inputSchema"]["properties"].get("collection_name").is_none());
    }

    #[tokio::test]
    async fn test_unknown_method_and_tool() {
        let surface = surface(CollectionMode::CallerSupplied);

        let response = handle_request(
            &surface,
            &json!({"jsonrpc": "2.0", "id": 2, "method": "resources/list"}),
        )
        .await
        .unwrap();
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);

        let response = handle_request(
            &surface,
            &json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "forget", "arguments": {}}
            }),
        )
        .await
        .unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_configuration_error_is_a_tool_error_result() {
        let surface = surface(CollectionMode::CallerSupplied);
        let response = handle_request(
            &surface,
            &json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "debug", "arguments": {}}
            }),
        )
        .await
        .unwrap();
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "collection name is required"
        );
    }
}
