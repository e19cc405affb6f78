//! Resource client and the hosted-backend boundary
//!
//! [`DataSource`] is the seam to the hosted database/function service;
//! [`ResourceClient`] sits on top of it with a result cache keyed by
//! logical resource name plus filter. A successful mutation invalidates
//! every cached query for its resource before returning, so the returned
//! value doubles as the caller's signal to request a fresh read.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::resources::{Resource, SalesSummary};

/// Name of the callable aggregation endpoint
pub const SALES_SUMMARY_FN: &str = "sales-summary";

/// Remote boundary errors
///
/// Tagged failures reported to the caller; surfacing them to the user is
/// the calling layer's policy.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Authentication failed or the session expired
    #[error("Authentication failed")]
    Auth,

    /// The current user has no organization linked
    #[error("No organization linked to the current user")]
    MissingOrganization,

    /// The backend rejected the payload
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// The request never reached the backend
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

/// Result type for remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Query filter for a resource fetch
///
/// Carries equality matches and an optional row limit; anything richer
/// belongs to the hosted query language, not this boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    eq: Vec<(String, String)>,
    limit: Option<u32>,
}

impl Filter {
    /// An unconstrained filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a column to equal a value
    pub fn with_eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    /// Cap the number of returned rows
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Equality matches, in insertion order
    pub fn eq_matches(&self) -> &[(String, String)] {
        &self.eq
    }

    /// Row limit, if any
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Stable cache-key fragment for this filter
    fn cache_suffix(&self) -> String {
        let mut pairs: Vec<&(String, String)> = self.eq.iter().collect();
        pairs.sort();

        let mut suffix = String::new();
        for (column, value) in pairs {
            suffix.push_str(column);
            suffix.push('=');
            suffix.push_str(value);
            suffix.push('&');
        }
        if let Some(limit) = self.limit {
            suffix.push_str(&format!("limit={}", limit));
        }
        suffix
    }
}

/// A mutation against a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOp {
    /// Insert a new row
    Insert,
    /// Update the row with the given id
    Update(String),
    /// Delete the row with the given id
    Delete(String),
}

/// The hosted database/function service boundary
///
/// Implementations own transport, authentication, retries, and backoff;
/// this layer only routes calls and caches results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch rows of a logical resource
    async fn fetch_resource(&self, resource: Resource, filter: Filter) -> Result<Vec<Value>>;

    /// Apply a mutation and return the affected row
    async fn mutate_resource(
        &self,
        resource: Resource,
        op: MutationOp,
        payload: Value,
    ) -> Result<Value>;

    /// Invoke a callable endpoint
    async fn call_function(&self, name: &str, params: Value) -> Result<Value>;
}

fn cache_key(resource: Resource, filter: &Filter) -> String {
    format!("{}?{}", resource.as_str(), filter.cache_suffix())
}

/// Cached client over a [`DataSource`]
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use remote_data::{Filter, Resource, ResourceClient};
/// # async fn example(source: Arc<dyn remote_data::DataSource>) -> Result<(), remote_data::RemoteError> {
/// let client = ResourceClient::new(source);
///
/// let clientes = client
///     .fetch(Resource::Clientes, Filter::new().with_limit(50))
///     .await?;
/// # let _ = clientes;
/// # Ok(())
/// # }
/// ```
pub struct ResourceClient {
    source: Arc<dyn DataSource>,
    cache: RwLock<HashMap<String, Vec<Value>>>,
}

impl ResourceClient {
    /// Create a client over the given source
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch rows, serving repeats of the same query from the cache
    pub async fn fetch(&self, resource: Resource, filter: Filter) -> Result<Vec<Value>> {
        let key = cache_key(resource, &filter);

        if let Some(rows) = self.cache.read().await.get(&key) {
            tracing::debug!(%key, "resource cache hit");
            return Ok(rows.clone());
        }

        let rows = self.source.fetch_resource(resource, filter).await?;
        self.cache.write().await.insert(key, rows.clone());
        Ok(rows)
    }

    /// Fetch rows and decode them into a typed record
    pub async fn fetch_typed<T: DeserializeOwned>(
        &self,
        resource: Resource,
        filter: Filter,
    ) -> Result<Vec<T>> {
        let rows = self.fetch(resource, filter).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(RemoteError::from))
            .collect()
    }

    /// Apply a mutation, invalidating every cached query for the resource
    ///
    /// The returned row is the completion signal: once `mutate` resolves,
    /// a fresh `fetch` is guaranteed to hit the backend.
    pub async fn mutate(
        &self,
        resource: Resource,
        op: MutationOp,
        payload: Value,
    ) -> Result<Value> {
        let row = self.source.mutate_resource(resource, op, payload).await?;
        self.invalidate(resource).await;
        Ok(row)
    }

    /// Drop every cached query for a resource
    pub async fn invalidate(&self, resource: Resource) {
        let prefix = format!("{}?", resource.as_str());
        self.cache
            .write()
            .await
            .retain(|key, _| !key.starts_with(&prefix));
    }

    /// Drop the entire cache
    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    /// Invoke the sales-summary endpoint and decode the triple
    pub async fn sales_summary(&self, params: Value) -> Result<SalesSummary> {
        let value = self.source.call_function(SALES_SUMMARY_FN, params).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Cliente;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({"id": "c1", "nome": "Maria Souza"}),
            json!({"id": "c2", "nome": "João Lima", "empresa": "Lima ME"}),
        ]
    }

    #[tokio::test]
    async fn test_fetch_caches_repeated_queries() {
        let mut mock = MockDataSource::new();
        mock.expect_fetch_resource()
            .times(1)
            .returning(|_, _| Ok(rows()));

        let client = ResourceClient::new(Arc::new(mock));

        let first = client.fetch(Resource::Clientes, Filter::new()).await.unwrap();
        let second = client.fetch(Resource::Clientes, Filter::new()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn test_distinct_filters_are_distinct_queries() {
        let mut mock = MockDataSource::new();
        mock.expect_fetch_resource()
            .times(2)
            .returning(|_, _| Ok(rows()));

        let client = ResourceClient::new(Arc::new(mock));

        client.fetch(Resource::Clientes, Filter::new()).await.unwrap();
        client
            .fetch(Resource::Clientes, Filter::new().with_limit(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_filter_cache_key_is_order_insensitive() {
        let a = Filter::new().with_eq("etapa", "proposta").with_eq("clienteId", "c1");
        let b = Filter::new().with_eq("clienteId", "c1").with_eq("etapa", "proposta");

        assert_eq!(
            cache_key(Resource::Oportunidades, &a),
            cache_key(Resource::Oportunidades, &b)
        );
    }

    #[tokio::test]
    async fn test_mutation_invalidates_resource_cache() {
        let mut mock = MockDataSource::new();
        mock.expect_fetch_resource()
            .times(2)
            .returning(|_, _| Ok(rows()));
        mock.expect_mutate_resource()
            .times(1)
            .returning(|_, _, payload| Ok(payload));

        let client = ResourceClient::new(Arc::new(mock));

        client.fetch(Resource::Clientes, Filter::new()).await.unwrap();
        client
            .mutate(Resource::Clientes, MutationOp::Insert, json!({"nome": "Ana"}))
            .await
            .unwrap();

        // Post-mutation read must go back to the source
        client.fetch(Resource::Clientes, Filter::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_mutation_leaves_other_resources_cached() {
        let mut mock = MockDataSource::new();
        mock.expect_fetch_resource()
            .times(1)
            .withf(|resource, _| *resource == Resource::Produtos)
            .returning(|_, _| Ok(rows()));
        mock.expect_mutate_resource()
            .times(1)
            .returning(|_, _, payload| Ok(payload));

        let client = ResourceClient::new(Arc::new(mock));

        client.fetch(Resource::Produtos, Filter::new()).await.unwrap();
        client
            .mutate(Resource::Vendas, MutationOp::Delete("v1".to_string()), Value::Null)
            .await
            .unwrap();

        // Still served from cache: the mock only allows one produtos fetch
        client.fetch(Resource::Produtos, Filter::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_typed_decodes_rows() {
        let mut mock = MockDataSource::new();
        mock.expect_fetch_resource().returning(|_, _| Ok(rows()));

        let client = ResourceClient::new(Arc::new(mock));
        let clientes: Vec<Cliente> = client
            .fetch_typed(Resource::Clientes, Filter::new())
            .await
            .unwrap();

        assert_eq!(clientes.len(), 2);
        assert_eq!(clientes[1].empresa.as_deref(), Some("Lima ME"));
    }

    #[tokio::test]
    async fn test_remote_errors_propagate_tagged() {
        let mut mock = MockDataSource::new();
        mock.expect_fetch_resource()
            .returning(|_, _| Err(RemoteError::MissingOrganization));

        let client = ResourceClient::new(Arc::new(mock));
        let result = client.fetch(Resource::Vendas, Filter::new()).await;

        assert!(matches!(result, Err(RemoteError::MissingOrganization)));
    }

    #[tokio::test]
    async fn test_failed_mutation_does_not_invalidate() {
        let mut mock = MockDataSource::new();
        mock.expect_fetch_resource()
            .times(1)
            .returning(|_, _| Ok(rows()));
        mock.expect_mutate_resource()
            .returning(|_, _, _| Err(RemoteError::Constraint("nome is required".to_string())));

        let client = ResourceClient::new(Arc::new(mock));

        client.fetch(Resource::Clientes, Filter::new()).await.unwrap();

        let result = client
            .mutate(Resource::Clientes, MutationOp::Insert, json!({}))
            .await;
        assert!(matches!(result, Err(RemoteError::Constraint(_))));

        // Cache untouched: the mock only allows one fetch
        client.fetch(Resource::Clientes, Filter::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_sales_summary_round_trip() {
        let mut mock = MockDataSource::new();
        mock.expect_call_function()
            .withf(|name, _| name == SALES_SUMMARY_FN)
            .returning(|_, _| {
                Ok(json!({
                    "totals": { "totalVendas": 3000.0, "quantidade": 2, "ticketMedio": 1500.0 },
                    "series": [{ "data": "2024-06-01", "valor": 3000.0 }],
                    "period": { "inicio": "2024-06-01", "fim": "2024-06-30" }
                }))
            });

        let client = ResourceClient::new(Arc::new(mock));
        let summary = client.sales_summary(json!({"periodo": "mes"})).await.unwrap();

        assert_eq!(summary.totals.total_vendas, 3000.0);
        assert_eq!(summary.series.len(), 1);
    }
}
