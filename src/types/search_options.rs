use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default number of documents requested from the index.
pub const DEFAULT_SEARCH_TOP: u32 = 3;

/// How long the semantic ranker may run before keyword and vector results
/// are returned without it.
pub const DEFAULT_SEMANTIC_MAX_WAIT_MS: u32 = 5000;

/// A vector query issued alongside the keyword query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorQuery {
    /// Always `"vector"` for a pre-computed embedding.
    pub kind: String,

    /// The query embedding.
    pub vector: Vec<f32>,

    /// Number of nearest neighbours to return.
    pub k: u32,

    /// Comma-separated vector fields to search.
    pub fields: String,
}

impl VectorQuery {
    /// Create a nearest-neighbour query over `fields`.
    pub fn new(vector: Vec<f32>, k: u32, fields: impl Into<String>) -> Self {
        Self {
            kind: "vector".to_string(),
            vector,
            k,
            fields: fields.into(),
        }
    }
}

/// Request body for a document search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Keyword query text.
    pub search: String,

    /// Maximum number of documents to return.
    pub top: u32,

    /// `"semantic"` when a semantic configuration is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,

    /// Name of the index's semantic configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_configuration: Option<String>,

    /// `"partial"` returns unranked results when semantic ranking fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_error_handling: Option<String>,

    /// Time budget for semantic ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_max_wait_in_milliseconds: Option<u32>,

    /// Vector queries for hybrid search.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub vector_queries: Vec<VectorQuery>,
}

impl SearchOptions {
    /// Create a keyword search for `search`.
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            top: DEFAULT_SEARCH_TOP,
            query_type: None,
            semantic_configuration: None,
            semantic_error_handling: None,
            semantic_max_wait_in_milliseconds: None,
            vector_queries: Vec::new(),
        }
    }

    /// Set how many documents to return.
    pub fn with_top(mut self, top: u32) -> Self {
        self.top = top;
        self
    }

    /// Rank with the named semantic configuration.
    ///
    /// A slow or throttled ranker degrades to keyword and vector results
    /// after [`DEFAULT_SEMANTIC_MAX_WAIT_MS`].
    pub fn with_semantic_configuration(mut self, name: impl Into<String>) -> Self {
        self.query_type = Some("semantic".to_string());
        self.semantic_configuration = Some(name.into());
        self.semantic_error_handling = Some("partial".to_string());
        self.semantic_max_wait_in_milliseconds = Some(DEFAULT_SEMANTIC_MAX_WAIT_MS);
        self
    }

    /// Add a vector query.
    pub fn with_vector_query(mut self, query: VectorQuery) -> Self {
        self.vector_queries.push(query);
        self
    }
}

/// Response body of a document search.
///
/// Documents are schema-less on this side; each hit is the raw field map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    /// Hits ordered by the service's ranking.
    #[serde(default)]
    pub value: Vec<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn keyword_search_body() {
        let options = SearchOptions::new("speeder bikes");
        assert_eq!(
            to_value(&options).unwrap(),
            json!({"search": "speeder bikes", "top": 3})
        );
    }

    #[test]
    fn hybrid_semantic_search_body() {
        let options = SearchOptions::new("speeder bikes")
            .with_top(5)
            .with_semantic_configuration("default")
            .with_vector_query(VectorQuery::new(vec![0.5], 3, "summary_vector"));
        assert_eq!(
            to_value(&options).unwrap(),
            json!({
                "search": "speeder bikes",
                "top": 5,
                "queryType": "semantic",
                "semanticConfiguration": "default",
                "semanticErrorHandling": "partial",
                "semanticMaxWaitInMilliseconds": 5000,
                "vectorQueries": [{
                    "kind": "vector",
                    "vector": [0.5],
                    "k": 3,
                    "fields": "summary_vector"
                }]
            })
        );
    }
}
