//! Client for a hosted document-search index.

use std::time::{Duration, Instant};

use reqwest::Client as ReqwestClient;
use url::Url;

use crate::client::{DEFAULT_TIMEOUT, build_http_client, parse_endpoint, post_json};
use crate::error::{Error, Result};
use crate::observability::{
    SEARCH_DOCUMENTS, SEARCH_REQUEST_DURATION, SEARCH_REQUEST_ERRORS, SEARCH_REQUESTS,
};
use crate::types::{SearchOptions, SearchResults};

/// API version sent with every search request.
pub const DEFAULT_SEARCH_API_VERSION: &str = "2023-11-01";

/// Client for Azure Cognitive Search.
#[derive(Debug, Clone)]
pub struct SearchClient {
    api_key: String,
    client: ReqwestClient,
    endpoint: Url,
    api_version: String,
    timeout: Duration,
}

impl SearchClient {
    /// Create a new client for the search service at `endpoint`.
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(endpoint, api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        endpoint: &str,
        api_key: impl Into<String>,
        api_version: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let endpoint = parse_endpoint(endpoint)?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = build_http_client(&api_key, timeout)?;
        Ok(Self {
            api_key,
            client,
            endpoint,
            api_version: api_version.unwrap_or_else(|| DEFAULT_SEARCH_API_VERSION.to_string()),
            timeout,
        })
    }

    /// Run `options` against `index`.
    pub async fn search(&self, index: &str, options: &SearchOptions) -> Result<SearchResults> {
        let url = self.index_url(index)?;
        tracing::debug!(
            index,
            top = options.top,
            vector_queries = options.vector_queries.len(),
            "sending search request"
        );
        SEARCH_REQUESTS.click();
        let start = Instant::now();
        let result: Result<SearchResults> =
            post_json(&self.client, url, &self.api_key, self.timeout, options).await;
        SEARCH_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok(results) => SEARCH_DOCUMENTS.add(results.value.len() as f64),
            Err(_) => SEARCH_REQUEST_ERRORS.click(),
        }
        result
    }

    fn index_url(&self, index: &str) -> Result<Url> {
        if index.trim().is_empty() {
            return Err(Error::configuration(
                "search index name must not be empty",
                Some("search_index".to_string()),
            ));
        }
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url("endpoint cannot carry a path", None))?
            .pop_if_empty()
            .extend(["indexes", index, "docs", "search"]);
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_url() {
        let client = SearchClient::new("https://example.search.windows.net", "key").unwrap();
        assert_eq!(
            client.index_url("swapi-vehicle-index").unwrap().as_str(),
            "https://example.search.windows.net/indexes/swapi-vehicle-index/docs/search?api-version=2023-11-01"
        );
        assert!(client.index_url(" ").unwrap_err().is_configuration());
    }

    #[test]
    fn custom_api_version() {
        let client = SearchClient::with_options(
            "https://example.search.windows.net/",
            "key",
            Some("2024-07-01".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert!(
            client
                .index_url("docs")
                .unwrap()
                .as_str()
                .ends_with("api-version=2024-07-01")
        );
        assert_eq!(client.timeout, Duration::from_secs(5));
    }
}
