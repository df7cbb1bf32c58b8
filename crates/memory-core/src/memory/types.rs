//! ============================================================================
//! Memory Types - Points, payloads and search results
//! ============================================================================
//! Wire-compatible with the Qdrant REST representation of points.
//! ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Distance metric used for every collection this crate provisions
pub const DISTANCE_COSINE: &str = "Cosine";

/// Point identifier: Qdrant accepts unsigned integers or UUID strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Uuid(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for PointId {
    fn from(n: u64) -> Self {
        PointId::Num(n)
    }
}

/// Vector data for a point: the collection's default vector or named vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointVector {
    Unnamed(Vec<f32>),
    Named(BTreeMap<String, Vec<f32>>),
}

impl PointVector {
    /// Writes `vector` under `name`, or as the default vector when `name` is `None`
    pub fn for_name(name: Option<&str>, vector: Vec<f32>) -> Self {
        match name {
            Some(name) => PointVector::Named(BTreeMap::from([(name.to_string(), vector)])),
            None => PointVector::Unnamed(vector),
        }
    }
}

/// A single stored memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub vector: PointVector,
    pub payload: Payload,
}

/// Payload attached to every stored memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// The remembered text
    pub information: String,
    /// ISO-8601 UTC timestamp of the write
    pub stored_at: String,
    /// Caller-supplied structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Payload {
    pub fn new(information: impl Into<String>, metadata: Option<Map<String, Value>>) -> Self {
        Self {
            information: information.into(),
            stored_at: chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            metadata,
        }
    }
}

/// Vector parameters for one vector space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorParams {
    pub size: usize,
    pub distance: String,
}

impl VectorParams {
    pub fn cosine(size: usize) -> Self {
        Self {
            size,
            distance: DISTANCE_COSINE.to_string(),
        }
    }
}

/// Vector layout requested at collection creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorsConfig {
    Unnamed(VectorParams),
    Named(BTreeMap<String, VectorParams>),
}

impl VectorsConfig {
    pub fn cosine(name: Option<&str>, size: usize) -> Self {
        match name {
            Some(name) => VectorsConfig::Named(BTreeMap::from([(
                name.to_string(),
                VectorParams::cosine(size),
            )])),
            None => VectorsConfig::Unnamed(VectorParams::cosine(size)),
        }
    }
}

/// One hit from a similarity search, in the store's ranking order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: PointId,
    pub score: f32,
    /// Copy of the stored payload (any keys, not only ours)
    #[serde(default)]
    pub payload: Map<String, Value>,
}

/// A point returned by scrolling, without its vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledPoint {
    pub id: PointId,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

/// Collection metadata plus a bounded sample of stored points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInspection {
    pub info: Value,
    pub samples: Vec<SampledPoint>,
}
