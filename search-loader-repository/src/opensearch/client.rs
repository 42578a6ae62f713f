//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `BulkSubmitter` and
//! `IndexAdmin` using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials as TransportCredentials,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts},
    BulkParts, CountParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::{BulkSubmitter, IndexAdmin};
use crate::types::{BulkItemFailure, BulkOutcome};
use search_loader_shared::Credentials;

/// Response fields dropped by the cluster before returning a bulk response.
///
/// Per-item status and error survive; ids, versions and shard details do not.
const BULK_FILTER_PATH: &[&str] = &["-took", "-items.index._*", "-items.index.result"];

/// OpenSearch client implementation.
///
/// One handle is built per job invocation and passed explicitly to the
/// components that need it.
///
/// # Example
///
/// ```ignore
/// let credentials = Credentials::new("admin", "admin");
/// let client = OpenSearchClient::new("https://search.example.com:443", Some(&credentials)).await?;
/// let outcome = client.submit("sales_orders_2024-01-09", body).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `credentials` - Basic-auth credentials, or `None` for an open cluster
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub async fn new(url: &str, credentials: Option<&Credentials>) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some(credentials) = credentials {
            builder = builder.auth(TransportCredentials::Basic(
                credentials.username.clone(),
                credentials.password.clone(),
            ));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        info!(
            url = %url,
            authenticated = credentials.is_some(),
            "Created OpenSearch client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }

    /// Read a response body as JSON.
    async fn json_body(response: Response) -> Result<Value, SearchError> {
        response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))
    }

    /// Fail with the response body when the status is not a success.
    async fn ensure_success<F>(
        response: Response,
        what: &str,
        to_error: F,
    ) -> Result<Response, SearchError>
    where
        F: FnOnce(String) -> SearchError,
    {
        let status = response.status_code();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %error_body, "{} request failed", what);
        Err(to_error(format!(
            "{} failed with status {}: {}",
            what, status, error_body
        )))
    }

    /// Collect per-item failures from a (filtered) bulk response body.
    pub(crate) fn parse_bulk_outcome(body: &Value) -> BulkOutcome {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let failures = items
            .iter()
            .enumerate()
            .filter_map(|(position, item)| {
                let action = item.as_object()?.values().next()?;
                let status = action.get("status").and_then(Value::as_u64).unwrap_or(0) as u16;
                let error = action.get("error");
                if error.is_none() && status < 300 {
                    return None;
                }
                let reason = error
                    .and_then(|e| e.get("reason").and_then(Value::as_str).map(str::to_owned))
                    .or_else(|| error.map(Value::to_string))
                    .unwrap_or_else(|| format!("status {}", status));
                Some(BulkItemFailure {
                    position,
                    status,
                    reason,
                })
            })
            .collect::<Vec<_>>();

        // An `errors: true` flag with no identifiable item still means failure.
        let flagged = body.get("errors").and_then(Value::as_bool).unwrap_or(false);
        let failures = if flagged && failures.is_empty() {
            vec![BulkItemFailure {
                position: 0,
                status: 0,
                reason: "bulk response reported errors".to_string(),
            }]
        } else {
            failures
        };

        BulkOutcome {
            items: items.len(),
            failures,
        }
    }

    /// The encoded body as a single newline-delimited element.
    ///
    /// The transport terminates every element with a newline, so the body's
    /// own final newline is dropped to keep the wire bytes identical.
    pub(crate) fn bulk_body(body: &str) -> Vec<String> {
        vec![body.strip_suffix('\n').unwrap_or(body).to_owned()]
    }

    /// Count nodes whose role list includes `data` in a `_cat/nodes` JSON body.
    pub(crate) fn count_data_nodes(nodes: &Value) -> usize {
        nodes
            .as_array()
            .map(|nodes| {
                nodes
                    .iter()
                    .filter_map(|node| node.get("node.roles").and_then(Value::as_str))
                    .filter(|roles| roles.split(',').any(|role| role.trim() == "data"))
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl BulkSubmitter for OpenSearchClient {
    /// Send an encoded bulk body to `index`.
    #[instrument(skip(self, body), fields(body_bytes = body.len()))]
    async fn submit(&self, index: &str, body: &str) -> Result<BulkOutcome, SearchError> {
        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .filter_path(BULK_FILTER_PATH)
            .body(Self::bulk_body(body))
            .send()
            .await
            .map_err(|e| SearchError::bulk_index(e.to_string()))?;

        let response = Self::ensure_success(response, "Bulk", SearchError::BulkIndexError).await?;
        let body = Self::json_body(response).await?;
        let outcome = Self::parse_bulk_outcome(&body);

        debug!(
            index = %index,
            items = outcome.items,
            failed = outcome.failed(),
            "Bulk request completed"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl IndexAdmin for OpenSearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::query(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchError::query(format!(
                "Index exists check for {} returned status {}",
                index, status
            ))),
        }
    }

    #[instrument(skip(self, body))]
    async fn create_index(&self, index: &str, body: Value) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        Self::ensure_success(response, "Index creation", SearchError::IndexCreationError).await?;
        info!(index = %index, "Created index");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::index_deletion(e.to_string()))?;

        Self::ensure_success(response, "Index deletion", SearchError::IndexDeletionError).await?;
        info!(index = %index, "Deleted index");
        Ok(())
    }

    async fn document_count(&self, index: &str) -> Result<u64, SearchError> {
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::query(e.to_string()))?;

        let response = Self::ensure_success(response, "Count", SearchError::QueryError).await?;
        let body = Self::json_body(response).await?;

        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchError::parse(format!("Count response without count: {}", body)))
    }

    async fn data_node_count(&self) -> Result<usize, SearchError> {
        let response = self
            .client
            .cat()
            .nodes()
            .format("json")
            .h(&["name", "node.roles"])
            .send()
            .await
            .map_err(|e| SearchError::query(e.to_string()))?;

        let response = Self::ensure_success(response, "Node listing", SearchError::QueryError).await?;
        let nodes = Self::json_body(response).await?;
        let count = Self::count_data_nodes(&nodes);

        debug!(data_nodes = count, "Counted data nodes");
        Ok(count)
    }
}
