//! Retrieval-augmented generation against a document-search index.
//!
//! A [`Retriever`] answers a query with ranked [`RetrievedDocument`]s.  The
//! chat session folds those documents into the system content of the next
//! request only; they are never stored in the conversation.

use crate::client::AzureOpenAI;
use crate::error::Result;
use crate::search::SearchClient;
use crate::types::{
    DEFAULT_SEARCH_TOP, EmbeddingsOptions, RetrievedDocument, SearchOptions, VectorQuery,
};

/// Field holding document text when none is configured.
pub const DEFAULT_CONTENT_FIELD: &str = "summary";

/// Vector field searched when none is configured.
pub const DEFAULT_VECTOR_FIELD: &str = "summary_vector";

/// Source of context documents for a query.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Return documents relevant to `text`, best first.
    async fn query(&self, text: &str) -> Result<Vec<RetrievedDocument>>;
}

/// Embedding settings for hybrid (keyword plus vector) search.
#[derive(Debug, Clone)]
pub struct VectorSearch {
    /// Client used to embed the query.
    pub client: AzureOpenAI,
    /// Embedding deployment name.
    pub deployment: String,
    /// Vector field in the index.
    pub field: String,
    /// Nearest neighbours to request; `None` follows the augmenter's `top`.
    pub k: Option<u32>,
}

impl VectorSearch {
    /// Embed with `deployment` and search the default vector field.
    pub fn new(client: AzureOpenAI, deployment: impl Into<String>) -> Self {
        Self {
            client,
            deployment: deployment.into(),
            field: DEFAULT_VECTOR_FIELD.to_string(),
            k: None,
        }
    }

    /// Search `field` instead of the default vector field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Request exactly `k` nearest neighbours.
    pub fn with_k(mut self, k: u32) -> Self {
        self.k = Some(k);
        self
    }

    fn neighbours(&self, top: u32) -> u32 {
        self.k.unwrap_or(top)
    }
}

/// [`Retriever`] backed by a search index.
#[derive(Debug, Clone)]
pub struct SearchAugmenter {
    client: SearchClient,
    index: String,
    content_field: String,
    top: u32,
    semantic_configuration: Option<String>,
    vector: Option<VectorSearch>,
}

impl SearchAugmenter {
    /// Search `index` with keyword queries, reading text from the default field.
    pub fn new(client: SearchClient, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
            content_field: DEFAULT_CONTENT_FIELD.to_string(),
            top: DEFAULT_SEARCH_TOP,
            semantic_configuration: None,
            vector: None,
        }
    }

    /// Read document text from `field`.
    pub fn with_content_field(mut self, field: impl Into<String>) -> Self {
        self.content_field = field.into();
        self
    }

    /// Request at most `top` documents.
    pub fn with_top(mut self, top: u32) -> Self {
        self.top = top;
        self
    }

    /// Rank with the index's named semantic configuration.
    pub fn with_semantic_configuration(mut self, name: Option<String>) -> Self {
        self.semantic_configuration = name;
        self
    }

    /// Add a vector query built from an embedding of the user's text.
    pub fn with_vector_search(mut self, vector: Option<VectorSearch>) -> Self {
        self.vector = vector;
        self
    }

    /// The index being searched.
    pub fn index(&self) -> &str {
        &self.index
    }

    async fn build_options(&self, text: &str) -> Result<SearchOptions> {
        let mut options = SearchOptions::new(text).with_top(self.top);
        if let Some(name) = &self.semantic_configuration {
            options = options.with_semantic_configuration(name.clone());
        }
        if let Some(vector) = &self.vector {
            let embedding = vector
                .client
                .embeddings(&vector.deployment, &EmbeddingsOptions::single(text))
                .await?
                .into_first()?;
            options = options.with_vector_query(VectorQuery::new(
                embedding,
                vector.neighbours(self.top),
                &vector.field,
            ));
        }
        Ok(options)
    }
}

#[async_trait::async_trait]
impl Retriever for SearchAugmenter {
    async fn query(&self, text: &str) -> Result<Vec<RetrievedDocument>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let options = self.build_options(text).await?;
        let results = self.client.search(&self.index, &options).await?;
        let documents: Vec<RetrievedDocument> = results
            .value
            .iter()
            .filter_map(|hit| RetrievedDocument::from_hit(hit, &self.content_field))
            .collect();
        for (idx, document) in documents.iter().enumerate() {
            tracing::info!(
                rank = idx + 1,
                score = document.score,
                "search result: {}",
                document.text
            );
        }
        tracing::info!(
            index = %self.index,
            hits = results.value.len(),
            documents = documents.len(),
            "search complete"
        );
        Ok(documents)
    }
}

/// Fold retrieved documents into the system content for one request.
///
/// Returns `system` unchanged when there are no documents.
pub fn augment_system_prompt(
    system: Option<&str>,
    documents: &[RetrievedDocument],
) -> Option<String> {
    if documents.is_empty() {
        return system.map(str::to_string);
    }
    let mut content = String::new();
    if let Some(system) = system {
        content.push_str(system);
        content.push_str("\n\n");
    }
    content.push_str("Use the following retrieved documents when they are relevant:\n");
    for document in documents {
        content.push_str("- ");
        content.push_str(document.text.trim());
        content.push('\n');
    }
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augment_without_documents() {
        assert_eq!(augment_system_prompt(None, &[]), None);
        assert_eq!(
            augment_system_prompt(Some("Be brief."), &[]),
            Some("Be brief.".to_string())
        );
    }

    #[test]
    fn augment_with_documents() {
        let documents = vec![
            RetrievedDocument::new("The T-47 airspeeder.\n", 2.0),
            RetrievedDocument::new("The AT-AT walker.", 1.5),
        ];
        assert_eq!(
            augment_system_prompt(Some("Be brief."), &documents).unwrap(),
            "Be brief.\n\nUse the following retrieved documents when they are relevant:\n- The T-47 airspeeder.\n- The AT-AT walker.\n"
        );
        assert_eq!(
            augment_system_prompt(None, &documents[1..]).unwrap(),
            "Use the following retrieved documents when they are relevant:\n- The AT-AT walker.\n"
        );
    }

    #[tokio::test]
    async fn empty_query_skips_the_network() {
        // Port 9 is discard; a request would fail, so success proves no call was made.
        let client = SearchClient::new("http://127.0.0.1:9/", "key").unwrap();
        let augmenter = SearchAugmenter::new(client, "docs");
        assert!(augmenter.query("   ").await.unwrap().is_empty());
    }

    #[test]
    fn builder_settings() {
        let client = SearchClient::new("https://example.search.windows.net", "key").unwrap();
        let augmenter = SearchAugmenter::new(client, "swapi-vehicle-index")
            .with_content_field("body")
            .with_top(5)
            .with_semantic_configuration(Some("default".to_string()));
        assert_eq!(augmenter.index(), "swapi-vehicle-index");
        assert_eq!(augmenter.content_field, "body");
        assert_eq!(augmenter.top, 5);
        assert_eq!(augmenter.semantic_configuration.as_deref(), Some("default"));
        assert!(augmenter.vector.is_none());
    }

    #[test]
    fn vector_neighbours_follow_top_unless_set() {
        let client = AzureOpenAI::new("https://example.openai.azure.com/", "key").unwrap();
        let vector = VectorSearch::new(client, "text-embedding-ada-002");
        assert_eq!(vector.field, DEFAULT_VECTOR_FIELD);
        assert_eq!(vector.neighbours(5), 5);
        assert_eq!(vector.neighbours(DEFAULT_SEARCH_TOP), DEFAULT_SEARCH_TOP);

        let vector = vector.with_k(7).with_field("body_vector");
        assert_eq!(vector.neighbours(5), 7);
        assert_eq!(vector.field, "body_vector");
    }
}
