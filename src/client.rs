use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{ChatCompletions, ChatCompletionsOptions, Embeddings, EmbeddingsOptions};

/// API version sent with every chat and embeddings request.
pub const DEFAULT_API_VERSION: &str = "2023-05-15";
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for Azure OpenAI deployment endpoints.
#[derive(Debug, Clone)]
pub struct AzureOpenAI {
    api_key: String,
    client: ReqwestClient,
    endpoint: Url,
    api_version: String,
    timeout: Duration,
}

impl AzureOpenAI {
    /// Create a new client for the resource at `endpoint`.
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
            api_version: api_version.unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            timeout,
        })
    }

    /// The resource endpoint this client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Request a chat completion from `deployment`.
    pub async fn chat_completions(
        &self,
        deployment: &str,
        options: &ChatCompletionsOptions,
    ) -> Result<ChatCompletions> {
        let url = self.deployment_url(deployment, "chat/completions")?;
        tracing::debug!(
            deployment,
            messages = options.messages.len(),
            "sending chat completions request"
        );
        let completions: ChatCompletions = self.post(url, options).await?;
        tracing::debug!(
            id = %completions.id,
            choices = completions.choices.len(),
            "received chat completions response"
        );
        Ok(completions)
    }

    /// Embed texts with `deployment`.
    pub async fn embeddings(
        &self,
        deployment: &str,
        options: &EmbeddingsOptions,
    ) -> Result<Embeddings> {
        let url = self.deployment_url(deployment, "embeddings")?;
        tracing::debug!(deployment, inputs = options.input.len(), "sending embeddings request");
        self.post(url, options).await
    }

    async fn post<B, R>(&self, url: Url, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = post_json(&self.client, url, &self.api_key, self.timeout, body).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if result.is_err() {
            CLIENT_REQUEST_ERRORS.click();
        }
        result
    }

    /// Build `{endpoint}/openai/deployments/{deployment}/{operation}?api-version=...`.
    fn deployment_url(&self, deployment: &str, operation: &str) -> Result<Url> {
        if deployment.trim().is_empty() {
            return Err(Error::configuration(
                "deployment name must not be empty",
                Some("deployment".to_string()),
            ));
        }
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url("endpoint cannot carry a path", None))?
            .pop_if_empty()
            .extend(["openai", "deployments", deployment])
            .extend(operation.split('/'));
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

/// Parse and check a service endpoint.
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint.trim())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::configuration(
            format!("endpoint must be an http(s) URL: {endpoint}"),
            Some("endpoint".to_string()),
        ));
    }
    Ok(url)
}

/// Build the reqwest client shared by every call on one service client.
pub(crate) fn build_http_client(api_key: &str, timeout: Duration) -> Result<ReqwestClient> {
    if api_key.trim().is_empty() {
        return Err(Error::configuration(
            "API key must not be empty",
            Some("api_key".to_string()),
        ));
    }
    if HeaderValue::from_str(api_key).is_err() {
        return Err(Error::configuration(
            "API key contains characters that cannot be sent in a header",
            Some("api_key".to_string()),
        ));
    }
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    ReqwestClient::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })
}

/// POST `body` as JSON to `url` and decode a JSON reply.
///
/// Failures to reach the service or non-success statuses are transport
/// errors; a success status with an undecodable body is a protocol error.
pub(crate) async fn post_json<B, R>(
    client: &ReqwestClient,
    url: Url,
    api_key: &str,
    timeout: Duration,
    body: &B,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .header("api-key", api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    Some(timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        })?;

    if !response.status().is_success() {
        return Err(process_error_response(response).await);
    }

    let text = response.text().await.map_err(|e| {
        Error::http_client(
            format!("Failed to read response body: {}", e),
            Some(Box::new(e)),
        )
    })?;
    serde_json::from_str::<R>(&text).map_err(|e| {
        Error::serialization(
            format!("Failed to parse response: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Process API response errors and convert to our Error type
pub(crate) async fn process_error_response(response: Response) -> Error {
    let status = response.status();
    let status_code = status.as_u16();

    let request_id = ["apim-request-id", "x-request-id", "x-ms-request-id"]
        .iter()
        .find_map(|name| response.headers().get(*name))
        .and_then(|val| val.to_str().ok())
        .map(String::from);

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.trim().parse::<u64>().ok());

    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        code: Option<serde_json::Value>,
        message: Option<String>,
    }

    let error_body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            );
        }
    };

    let detail = serde_json::from_str::<ErrorResponse>(&error_body)
        .ok()
        .and_then(|e| e.error);
    // Azure reports codes as either strings ("DeploymentNotFound") or numbers.
    let error_code = detail
        .as_ref()
        .and_then(|d| d.code.as_ref())
        .and_then(|code| match code {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
    let error_message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) if error_body.trim().is_empty() => reason.to_string(),
            _ => error_body.clone(),
        });

    match status_code {
        400 => Error::bad_request(error_message, error_code),
        401 => Error::authentication(error_message),
        403 => Error::permission(error_message),
        404 => Error::not_found(error_message),
        408 => Error::timeout(error_message, None),
        429 => Error::rate_limit(error_message, retry_after),
        500 => Error::internal_server(error_message, request_id),
        502..=504 => Error::service_unavailable(error_message, retry_after),
        _ => Error::api(status_code, error_code, error_message, request_id),
    }
}
