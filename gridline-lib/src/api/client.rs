//! REST client

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use log::warn;
use reqwest::Client;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::ListParams;
use super::PaginatedResult;
use super::Resource;
use super::RetryConfig;
use super::parse_list;
use crate::error::ApiError;
use crate::model::Record;
use crate::model::RowId;

/// Upper bound on pages walked by [`RestClient::fetch_all`].
const MAX_FETCH_ALL_PAGES: usize = 1000;
/// Page size used when walking every page.
const FETCH_ALL_PAGE_SIZE: usize = 100;

/// Client for the dashboard's REST API.
///
/// Cheap to clone; clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use gridline_lib::api::{ListParams, Resource, RestClient};
/// use gridline_lib::model::Record;
///
/// let client = RestClient::builder()
///     .base_url("https://admin.example.com/api")
///     .bearer_token(token)
///     .build()?;
///
/// let page = client.list::<Record>(Resource::Users, &ListParams::new(1, 20)).await?;
/// println!("{} of {}", page.items.len(), page.total);
/// ```
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    base_url: Url,
    http_client: Client,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
    retry: RetryConfig,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> RestClientBuilder<Missing> {
        RestClientBuilder::new()
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// URL of a resource, or of one item when `id` is given.
    pub fn resource_url(&self, resource: Resource, id: Option<&RowId>) -> Result<Url, ApiError> {
        resource_url(&self.inner.base_url, resource, id)
    }

    /// Fetches one page of a resource.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        params: &ListParams,
    ) -> Result<PaginatedResult<T>, ApiError> {
        let url = self.resource_url(resource, None)?;
        let body = self
            .request(Method::GET, url, Some(params.to_query_pairs()), None)
            .await?;
        parse_list(&body).map_err(|e| ApiError::parse_with_body(e.to_string(), body))
    }

    /// Fetches one item.
    pub async fn get<T: DeserializeOwned>(&self, resource: Resource, id: &RowId) -> Result<T, ApiError> {
        let url = self.resource_url(resource, Some(id))?;
        let body = self.request(Method::GET, url, None, None).await?;
        parse_json(&body)
    }

    /// Creates an item and returns the server's JSON answer.
    pub async fn create<B, T>(&self, resource: Resource, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resource_url(resource, None)?;
        let body = self
            .request(Method::POST, url, None, Some(to_body(payload)?))
            .await?;
        parse_json(&body)
    }

    /// Updates an item and returns the server's JSON answer.
    pub async fn update<B, T>(&self, resource: Resource, id: &RowId, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resource_url(resource, Some(id))?;
        let body = self
            .request(Method::PATCH, url, None, Some(to_body(payload)?))
            .await?;
        parse_json(&body)
    }

    /// Deletes an item.
    pub async fn delete(&self, resource: Resource, id: &RowId) -> Result<(), ApiError> {
        let url = self.resource_url(resource, Some(id))?;
        self.request(Method::DELETE, url, None, None).await?;
        Ok(())
    }

    /// Fetches specific rows by id, in one request.
    pub async fn fetch_by_ids(&self, resource: Resource, ids: &[RowId]) -> Result<Vec<Record>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids.iter().map(RowId::to_string).collect::<Vec<_>>().join(",");
        let params = ListParams::new(1, ids.len()).with_filter("ids", joined);
        Ok(self.list::<Record>(resource, &params).await?.items)
    }

    /// Walks every page matching `params`, ignoring its page and limit.
    pub async fn fetch_all(&self, resource: Resource, params: &ListParams) -> Result<Vec<Record>, ApiError> {
        let mut rows = Vec::new();
        let mut query = ListParams {
            limit: FETCH_ALL_PAGE_SIZE,
            ..params.clone()
        };
        for page in 1..=MAX_FETCH_ALL_PAGES {
            query.page = page;
            let result = self.list::<Record>(resource, &query).await?;
            let received = result.items.len();
            rows.extend(result.items);
            if received == 0 || rows.len() >= result.total {
                return Ok(rows);
            }
        }
        warn!(
            "stopped walking {} after {} pages",
            resource, MAX_FETCH_ALL_PAGES
        );
        Ok(rows)
    }

    /// Sends a request and returns the response body.
    ///
    /// GET requests are retried per [`RetryConfig`] on network errors,
    /// timeouts and retryable statuses.
    async fn request(
        &self,
        method: Method,
        url: Url,
        query: Option<Vec<(String, String)>>,
        body: Option<String>,
    ) -> Result<String, ApiError> {
        let retry = &self.inner.retry;
        let retries = if method == Method::GET { retry.max_retries } else { 0 };
        let mut attempt = 0;

        loop {
            let result = self
                .send_once(method.clone(), url.clone(), query.as_deref(), body.clone())
                .await;
            match result {
                Err(e) if e.is_retryable() && attempt < retries => {
                    let delay = retry.delay_for(attempt);
                    debug!("{} {} failed ({}), retrying in {:?}", method, url, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: Url,
        query: Option<&[(String, String)]>,
        body: Option<String>,
    ) -> Result<String, ApiError> {
        let mut request = self
            .inner
            .http_client
            .request(method.clone(), url.clone())
            .header("Accept", "application/json");

        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(token) = &self.inner.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.header("Content-Type", "application/json").body(body);
        }

        debug!("{} {}", method, url);
        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(ApiError::from_body(status.as_u16(), text))
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        match self.inner.timeout {
            Some(timeout) if e.is_timeout() => ApiError::Timeout(timeout),
            _ => ApiError::Network(e),
        }
    }
}

fn resource_url(base: &Url, resource: Resource, id: Option<&RowId>) -> Result<Url, ApiError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(base.to_string()))?;
        segments.pop_if_empty();
        segments.extend(resource.path().split('/'));
        if let Some(id) = id {
            segments.push(&id.to_string());
        }
    }
    Ok(url)
}

fn to_body<B: Serialize + ?Sized>(payload: &B) -> Result<String, ApiError> {
    serde_json::to_string(payload).map_err(|e| ApiError::parse(e.to_string()))
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    // Empty success bodies (204) read as JSON null.
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::parse_with_body(e.to_string(), body))
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`RestClient`].
///
/// The base URL is required before [`build`](RestClientBuilder::build) is
/// available.
pub struct RestClientBuilder<U> {
    base_url: U,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry: RetryConfig,
    http_client: Option<Client>,
}

impl RestClientBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: Missing,
            bearer_token: None,
            timeout: None,
            connect_timeout: None,
            retry: RetryConfig::default(),
            http_client: None,
        }
    }

    /// Sets the API base URL, e.g. `https://admin.example.com/api`.
    pub fn base_url(self, url: impl Into<String>) -> RestClientBuilder<Set<String>> {
        RestClientBuilder {
            base_url: Set(url.into()),
            bearer_token: self.bearer_token,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            retry: self.retry,
            http_client: self.http_client,
        }
    }
}

impl Default for RestClientBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> RestClientBuilder<U> {
    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy for reads.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl RestClientBuilder<Set<String>> {
    /// Builds the [`RestClient`].
    pub fn build(self) -> Result<RestClient, ApiError> {
        let base_url = Url::parse(&self.base_url.0)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.base_url.0, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(self.base_url.0));
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(RestClient {
            inner: Arc::new(RestClientInner {
                base_url,
                http_client,
                bearer_token: self.bearer_token,
                timeout: self.timeout,
                retry: self.retry,
            }),
        })
    }
}
