use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A ranked text snippet returned by the search index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedDocument {
    /// The snippet text.
    pub text: String,

    /// The service's relevance score.
    pub score: f64,
}

impl RetrievedDocument {
    /// Create a new `RetrievedDocument`.
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }

    /// Build a document from one search hit.
    ///
    /// Returns `None` when `content_field` is missing or is not a string.
    pub fn from_hit(hit: &Map<String, Value>, content_field: &str) -> Option<Self> {
        let text = hit.get(content_field)?.as_str()?;
        let score = hit
            .get("@search.score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        Some(Self::new(text, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn document_from_hit() {
        let hit = as_map(json!({
            "@search.score": 2.5,
            "title": "Speeder bike",
            "summary": "A fast repulsorlift vehicle."
        }));
        let doc = RetrievedDocument::from_hit(&hit, "summary").unwrap();
        assert_eq!(doc.text, "A fast repulsorlift vehicle.");
        assert_eq!(doc.score, 2.5);
    }

    #[test]
    fn hit_without_field_is_skipped() {
        let hit = as_map(json!({"@search.score": 1.0, "title": "No summary"}));
        assert!(RetrievedDocument::from_hit(&hit, "summary").is_none());

        let hit = as_map(json!({"summary": 42}));
        assert!(RetrievedDocument::from_hit(&hit, "summary").is_none());
    }
}
