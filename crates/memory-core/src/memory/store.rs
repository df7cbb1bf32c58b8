//! ============================================================================
//! Vector Store Client - Qdrant REST operations
//! ============================================================================
//! Collection provisioning, point upserts, similarity search and sampling.
//! One request per operation, no client-side retry.
//! ============================================================================

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::response::{
    extract_error_message, requires_vector_name, result_items, VECTOR_NAME_HINT,
};
use super::types::{CollectionInspection, Point, SampledPoint, SearchResult, VectorsConfig};
use crate::config::VectorStoreConfig;
use crate::error::{MemoryError, Result};

/// Number of points sampled by [`VectorStoreClient::inspect`]
pub const SAMPLE_LIMIT: usize = 5;

/// Thin client over the Qdrant HTTP API
pub struct VectorStoreClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    vectors: &'a VectorsConfig,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: &'a [Point],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum SearchVector<'a> {
    Plain(&'a [f32]),
    Named { name: &'a str, vector: &'a [f32] },
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    limit: usize,
    with_payload: bool,
    vector: SearchVector<'a>,
}

impl VectorStoreClient {
    pub fn new(config: &VectorStoreConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    /// `{base}/collections/{collection}/{tail..}` with every segment percent-encoded
    fn collection_url(&self, collection: &str, tail: &[&str]) -> Result<Url> {
        let invalid = || MemoryError::Store(format!("Invalid vector store URL: {}", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("collections")
            .push(collection)
            .extend(tail);
        Ok(url)
    }

    fn request(&self, method: Method, collection: &str, tail: &[&str]) -> Result<RequestBuilder> {
        let builder = self
            .client
            .request(method, self.collection_url(collection, tail)?);
        Ok(match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder, action: &str) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| MemoryError::Store(format!("Failed to {}: {}", action, e)))
    }

    /// Create the collection with cosine distance unless it already exists
    pub async fn ensure_collection(&self, name: &str, dimensionality: usize) -> Result<()> {
        self.ensure_collection_with(name, &VectorsConfig::cosine(None, dimensionality))
            .await
    }

    /// Create the collection with an explicit vector layout unless it already exists.
    ///
    /// `409 Conflict` means "already exists" and is not an error; every other
    /// non-success status is.
    pub async fn ensure_collection_with(&self, name: &str, vectors: &VectorsConfig) -> Result<()> {
        debug!("Ensuring collection {} exists", name);

        let response = self
            .send(
                self.request(Method::PUT, name, &[])?
                    .json(&CreateCollectionRequest { vectors }),
                "create collection",
            )
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Collection {} created", name);
            return Ok(());
        }
        if status == StatusCode::CONFLICT {
            debug!("Collection {} already exists", name);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MemoryError::Store(format!(
            "Failed to create collection '{}' ({}): {}",
            name,
            status,
            extract_error_message(&body, &status.to_string())
        )))
    }

    /// Write points, overwriting any existing point with the same id
    pub async fn upsert_points(&self, collection: &str, points: &[Point]) -> Result<()> {
        debug!("Upserting {} point(s) into {}", points.len(), collection);

        let response = self
            .send(
                self.request(Method::PUT, collection, &["points"])?
                    .json(&UpsertRequest { points }),
                "upsert points",
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::Store(extract_error_message(
                &body,
                &status.to_string(),
            )));
        }

        Ok(())
    }

    /// Nearest-neighbour search, results in the store's ranking order.
    ///
    /// `vector_name` targets a named vector field; `None` uses the default one.
    pub async fn search_points(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        vector_name: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        debug!(
            "Searching {} (limit: {}, vector: {})",
            collection,
            limit,
            vector_name.unwrap_or("<default>")
        );

        let vector = match vector_name {
            Some(name) => SearchVector::Named { name, vector },
            None => SearchVector::Plain(vector),
        };
        let request = SearchRequest {
            limit,
            with_payload: true,
            vector,
        };

        let response = self
            .send(
                self.request(Method::POST, collection, &["points", "search"])?
                    .json(&request),
                "search points",
            )
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let mut message = extract_error_message(&body, &status.to_string());
            if vector_name.is_none() && requires_vector_name(&message) {
                message = format!("{} {}", message, VECTOR_NAME_HINT);
            }
            return Err(MemoryError::Store(message));
        }

        let results: Vec<SearchResult> = result_items(&body, None);
        debug!("Found {} result(s) in {}", results.len(), collection);
        Ok(results)
    }

    /// Collection metadata plus the first few points (payload only)
    pub async fn inspect(&self, collection: &str) -> Result<CollectionInspection> {
        let response = self
            .send(
                self.request(Method::GET, collection, &[])?,
                "get collection info",
            )
            .await?;
        let body = Self::success_body(response).await?;
        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let info = match parsed.get("result") {
            Some(result) => result.clone(),
            None => parsed,
        };

        let response = self
            .send(
                self.request(Method::POST, collection, &["points", "scroll"])?
                    .json(&json!({
                        "limit": SAMPLE_LIMIT,
                        "with_payload": true,
                        "with_vector": false,
                    })),
                "scroll points",
            )
            .await?;
        let body = Self::success_body(response).await?;
        let samples: Vec<SampledPoint> = result_items(&body, Some("points"));

        Ok(CollectionInspection { info, samples })
    }

    async fn success_body(response: Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(MemoryError::Store(extract_error_message(
                &body,
                &status.to_string(),
            )));
        }
        Ok(body)
    }
}
