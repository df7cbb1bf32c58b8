//! ============================================================================
//! Memory Service - Orchestrates memory storage and retrieval
//! ============================================================================
//! store: embed → ensure collection → upsert
//! find:  embed → search → one message per hit
//! debug: inspect → formatted report (never fails on store errors)
//! ============================================================================

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::embeddings::EmbeddingProvider;
use super::store::VectorStoreClient;
use super::types::{CollectionInspection, Payload, Point, PointId, PointVector, VectorsConfig};
use crate::config::{CollectionMode, MemoryConfig};
use crate::error::{MemoryError, Result};

/// Number of results returned by `find`
pub const FIND_LIMIT: usize = 5;

/// Memory service combining the vector store and an embedding provider
pub struct MemoryService {
    store: VectorStoreClient,
    embeddings: Arc<dyn EmbeddingProvider>,
    collection: CollectionMode,
    vector_name: Option<String>,
}

impl MemoryService {
    pub fn new(config: &MemoryConfig, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store: VectorStoreClient::new(&config.vector_store),
            embeddings,
            collection: config.collection.clone(),
            vector_name: config.vector_name.clone().filter(|n| !n.is_empty()),
        }
    }

    pub fn collection_mode(&self) -> &CollectionMode {
        &self.collection
    }

    /// Explicit non-empty name, else the fixed collection, else a configuration error
    pub fn resolve_collection<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        explicit
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.collection.default_collection())
            .ok_or_else(MemoryError::missing_collection)
    }

    /// Embed and persist `information`, creating the collection on first use
    pub async fn store(
        &self,
        information: &str,
        metadata: Option<Map<String, Value>>,
        collection: Option<&str>,
    ) -> Result<String> {
        let collection = self.resolve_collection(collection)?;
        debug!("Storing memory in {}", collection);

        let vector = self.embeddings.embed(information).await?;
        let vector_name = self.vector_name.as_deref();

        self.store
            .ensure_collection_with(collection, &VectorsConfig::cosine(vector_name, vector.len()))
            .await?;

        let point = Point {
            id: generate_point_id(),
            vector: PointVector::for_name(vector_name, vector),
            payload: Payload::new(information, metadata),
        };
        self.store
            .upsert_points(collection, std::slice::from_ref(&point))
            .await?;

        info!("Stored memory {} in {}", point.id, collection);
        Ok(format!(
            "Information stored successfully in collection '{}' with ID: {}",
            collection, point.id
        ))
    }

    /// Semantic search; one text message per hit, best first
    pub async fn find(
        &self,
        query: &str,
        collection: Option<&str>,
        vector_name: Option<&str>,
    ) -> Result<Vec<String>> {
        let collection = self.resolve_collection(collection)?;
        debug!("Searching {} for: {}", collection, query);

        let vector = self.embeddings.embed(query).await?;
        let results = self
            .store
            .search_points(collection, &vector, FIND_LIMIT, vector_name)
            .await?;

        if results.is_empty() {
            return Ok(vec![format!(
                "No relevant information found for query: \"{}\"",
                query
            )]);
        }

        Ok(results
            .iter()
            .enumerate()
            .map(|(idx, hit)| {
                format!(
                    "Result {} (score: {:.4}, id: {}):\n{}",
                    idx + 1,
                    hit.score,
                    hit.id,
                    pretty(&Value::Object(hit.payload.clone()))
                )
            })
            .collect())
    }

    /// Collection configuration and sample points as one report.
    ///
    /// Only a missing collection name is returned as an error; store failures
    /// become the report text.
    pub async fn debug(&self, collection: Option<&str>) -> Result<String> {
        let collection = self.resolve_collection(collection)?;

        match self.store.inspect(collection).await {
            Ok(inspection) => Ok(render_inspection(collection, &inspection)),
            Err(e) => {
                warn!("Debug inspection of {} failed: {}", collection, e);
                Ok(format!(
                    "Debug inspection failed for collection '{}': {}",
                    collection, e
                ))
            }
        }
    }
}

/// Millisecond timestamp id. Two stores within the same millisecond collide
/// and the second overwrites the first.
fn generate_point_id() -> PointId {
    let millis = chrono::Utc::now().timestamp_millis();
    PointId::Num(u64::try_from(millis).unwrap_or_default())
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn render_inspection(collection: &str, inspection: &CollectionInspection) -> String {
    let mut out = vec![
        format!("Collection Info for \"{}\":", collection),
        pretty(&inspection.info),
        String::new(),
        format!("Sample Data (first {} points):", inspection.samples.len()),
    ];

    for (idx, point) in inspection.samples.iter().enumerate() {
        out.push(format!("\n--- Point {} (ID: {}) ---", idx + 1, point.id));
        let keys: Vec<&str> = point.payload.keys().map(String::as_str).collect();
        out.push(format!("Payload keys: {}", keys.join(", ")));
        out.push(format!(
            "Payload: {}",
            pretty(&Value::Object(point.payload.clone()))
        ));
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorStoreConfig;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Returns the same vector for every text and counts calls
    struct FixedEmbeddings {
        vector: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FixedEmbeddings {
        fn new(vector: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                vector,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbeddings {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector.clone())
        }
    }

    struct FailingEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbeddings {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(MemoryError::Embedding("model overloaded".to_string()))
        }
    }

    fn config(url: String, collection: CollectionMode) -> MemoryConfig {
        MemoryConfig {
            vector_store: VectorStoreConfig { url, api_key: None },
            collection,
            ..MemoryConfig::default()
        }
    }

    fn service(server: &MockServer, embeddings: Arc<dyn EmbeddingProvider>) -> MemoryService {
        MemoryService::new(&config(server.uri(), CollectionMode::CallerSupplied), embeddings)
    }

    #[test]
    fn test_resolve_collection_order() {
        let fixed = MemoryService::new(
            &config(
                "http://localhost:6333".to_string(),
                CollectionMode::Fixed("default".to_string()),
            ),
            FixedEmbeddings::new(vec![1.0]),
        );
        assert_eq!(fixed.resolve_collection(Some("other")).unwrap(), "other");
        assert_eq!(fixed.resolve_collection(Some("")).unwrap(), "default");
        assert_eq!(fixed.resolve_collection(None).unwrap(), "default");

        let open = MemoryService::new(
            &config("http://localhost:6333".to_string(), CollectionMode::CallerSupplied),
            FixedEmbeddings::new(vec![1.0]),
        );
        assert_eq!(open.resolve_collection(None).unwrap_err(), MemoryError::missing_collection());
    }

    #[tokio::test]
    async fn test_missing_collection_fails_before_network() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let embeddings = FixedEmbeddings::new(vec![1.0]);
        let svc = service(&server, embeddings.clone());

        let err = svc.store("X", None, None).await.unwrap_err();
        assert_eq!(err.to_string(), "collection name is required");
        assert!(svc.find("X", None, Some("dense")).await.is_err());
        assert!(svc.debug(None).await.is_err());
        assert_eq!(embeddings.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_unnamed_layout_creates_collection_then_writes() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/C"))
            .and(body_partial_json(json!({"vectors": {"size": 3, "distance": "Cosine"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/collections/C/points"))
            .and(body_partial_json(json!({
                "points": [{
                    "vector": [0.5, 0.25, 0.125],
                    "payload": {"information": "X", "metadata": {"source": "chat"}}
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = config(server.uri(), CollectionMode::CallerSupplied);
        cfg.vector_name = None;
        let svc = MemoryService::new(&cfg, FixedEmbeddings::new(vec![0.5, 0.25, 0.125]));
        let metadata = Map::from_iter([("source".to_string(), json!("chat"))]);
        let confirmation = svc.store("X", Some(metadata), Some("C")).await.unwrap();

        assert!(confirmation.contains("'C'"));
        let id = confirmation.rsplit("ID: ").next().unwrap();
        assert!(id.parse::<u64>().is_ok(), "{}", confirmation);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url.path(), "/collections/C");
        assert_eq!(requests[1].url.path(), "/collections/C/points");

        let body: Value = serde_json::from_slice(&requests[1].body).unwrap();
        let point = &body["points"][0];
        assert_eq!(point["id"].to_string(), id);
        assert!(point["payload"]["stored_at"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_store_defaults_to_dense_named_vector() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/C"))
            .and(body_partial_json(json!({"vectors": {"dense": {"size": 1}}})))
            .respond_with(ResponseTemplate::new(409))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/collections/C/points"))
            .and(body_partial_json(json!({"points": [{"vector": {"dense": [1.0]}}]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = config(server.uri(), CollectionMode::Fixed("C".to_string()));
        let svc = MemoryService::new(&cfg, FixedEmbeddings::new(vec![1.0]));
        svc.store("X", None, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_upsert_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/C"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/collections/C/points"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": {"error": "Wrong input: Vector dimension error"}
            })))
            .mount(&server)
            .await;

        let svc = service(&server, FixedEmbeddings::new(vec![1.0]));
        let err = svc.store("X", None, Some("C")).await.unwrap_err();
        assert_eq!(err, MemoryError::Store("Wrong input: Vector dimension error".to_string()));
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let server = MockServer::start().await;
        let svc = service(&server, Arc::new(FailingEmbeddings));
        let err = svc.store("X", None, Some("C")).await.unwrap_err();
        assert_eq!(err, MemoryError::Embedding("model overloaded".to_string()));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_empty_collection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/C/points/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
            .mount(&server)
            .await;

        let svc = service(&server, FixedEmbeddings::new(vec![1.0]));
        let messages = svc.find("unknown topic", Some("C"), Some("dense")).await.unwrap();
        assert_eq!(
            messages,
            vec!["No relevant information found for query: \"unknown topic\"".to_string()]
        );
    }

    #[tokio::test]
    async fn test_find_formats_each_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/C/points/search"))
            .and(body_partial_json(json!({
                "limit": 5,
                "vector": {"name": "dense", "vector": [1.0]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [
                    {"id": 11, "score": 0.912345, "payload": {"information": "likes tea"}},
                    {"id": 12, "score": 0.5, "payload": {"information": "has a cat"}}
                ]
            })))
            .mount(&server)
            .await;

        let svc = service(&server, FixedEmbeddings::new(vec![1.0]));
        let messages = svc.find("drinks", Some("C"), Some("dense")).await.unwrap();

        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Result 1 (score: 0.9123, id: 11):"));
        assert!(messages[0].contains("\"information\": \"likes tea\""));
        assert!(messages[1].starts_with("Result 2 (score: 0.5000, id: 12):"));
    }

    #[tokio::test]
    async fn test_debug_renders_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/C"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"points_count": 1}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/collections/C/points/scroll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"points": [{"id": 3, "payload": {"information": "x", "stored_at": "t"}}]}
            })))
            .mount(&server)
            .await;

        let svc = service(&server, FixedEmbeddings::new(vec![1.0]));
        let report = svc.debug(Some("C")).await.unwrap();

        assert!(report.starts_with("Collection Info for \"C\":"));
        assert!(report.contains("\"points_count\": 1"));
        assert!(report.contains("Sample Data (first 1 points):"));
        assert!(report.contains("--- Point 1 (ID: 3) ---"));
        assert!(report.contains("Payload keys: information, stored_at"));
    }

    #[tokio::test]
    async fn test_debug_never_fails_on_store_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/C"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": {"error": "Not found: Collection `C` doesn't exist!"}
            })))
            .mount(&server)
            .await;

        let svc = service(&server, FixedEmbeddings::new(vec![1.0]));
        let report = svc.debug(Some("C")).await.unwrap();
        assert!(report.starts_with("Debug inspection failed for collection 'C':"));
        assert!(report.contains("doesn't exist"));
    }
}
