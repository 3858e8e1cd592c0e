//! GraphQL client: a link chain paired with a normalized cache.
//!
//! # Design
//! The client is an explicitly constructed value; callers share it through
//! an `Arc` instead of a process-wide singleton. `from_config` wires the
//! production chain `ErrorLink -> RequestLink -> BatchHttpLink`, while `new`
//! accepts any chain so tests can terminate it with an in-process link.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::batch::{BatchHttpLink, BatchOptions};
use crate::cache::InMemoryCache;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::graphql::Operation;
use crate::http::{ReqwestTransport, Transport};
use crate::link::{ErrorHandler, ErrorLink, HeaderProvider, Link, LinkChain, RequestLink, StaticHeaders};

/// Where a query may be answered from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Serve from the cache when possible, otherwise go to the network.
    #[default]
    CacheFirst,
    /// Always go to the network, then write the result to the cache.
    NetworkOnly,
    /// Always go to the network and leave the cache untouched.
    NoCache,
}

/// Executes operations through a `LinkChain` and keeps their results in an
/// `InMemoryCache`.
#[derive(Debug)]
pub struct GraphQlClient {
    chain: LinkChain,
    cache: InMemoryCache,
}

impl GraphQlClient {
    pub fn new(chain: LinkChain) -> Self {
        Self {
            chain,
            cache: InMemoryCache::new(),
        }
    }

    /// Build the production chain from `config`. Fails with
    /// `ApiError::NoRuntime` outside a tokio runtime because the batching
    /// link spawns its flush task.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let headers = Arc::new(StaticHeaders(config.headers.clone()));
        Self::builder(config).header_provider(headers).build()
    }

    pub fn builder(config: &ClientConfig) -> GraphQlClientBuilder {
        GraphQlClientBuilder {
            config: config.clone(),
            transport: None,
            headers: None,
            on_error: None,
        }
    }

    pub fn cache(&self) -> &InMemoryCache {
        &self.cache
    }

    pub async fn query(&self, operation: Operation, policy: FetchPolicy) -> Result<Value, ApiError> {
        if policy == FetchPolicy::CacheFirst {
            if let Some(data) = self.cache.read(&operation) {
                debug!(operation = %operation.operation_name, "cache hit");
                return Ok(data);
            }
        }
        let write = match policy {
            FetchPolicy::NoCache => CacheWrite::Skip,
            _ => CacheWrite::Root,
        };
        self.execute(operation, write).await
    }

    /// Mutations always hit the network and never read the cache. Their
    /// results only update entities already referenced by cached queries.
    pub async fn mutate(&self, operation: Operation) -> Result<Value, ApiError> {
        self.execute(operation, CacheWrite::Entities).await
    }

    async fn execute(&self, operation: Operation, write: CacheWrite) -> Result<Value, ApiError> {
        let response = self.chain.execute(operation.clone()).await?;
        if response.has_errors() {
            return Err(ApiError::GraphQl {
                messages: response.error_messages(),
            });
        }
        let data = response
            .data
            .ok_or_else(|| ApiError::DeserializationError("response has no data".to_string()))?;
        match write {
            CacheWrite::Root => self.cache.write(&operation, &data),
            CacheWrite::Entities => self.cache.merge(&data),
            CacheWrite::Skip => {}
        }
        Ok(data)
    }
}

#[derive(Clone, Copy)]
enum CacheWrite {
    Root,
    Entities,
    Skip,
}

/// Assembles the production link chain with optional overrides.
pub struct GraphQlClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    headers: Option<Arc<dyn HeaderProvider>>,
    on_error: Option<ErrorHandler>,
}

impl GraphQlClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn header_provider(mut self, headers: Arc<dyn HeaderProvider>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn on_error(mut self, handler: ErrorHandler) -> Self {
        self.on_error = Some(handler);
        self
    }

    pub fn build(self) -> Result<GraphQlClient, ApiError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.config.timeout)?),
        };
        let error_link = match self.on_error {
            Some(handler) => ErrorLink::with_handler(handler),
            None => ErrorLink::new(),
        };
        let request_link = match self.headers {
            Some(provider) => RequestLink::new(provider),
            None => RequestLink::default(),
        };
        let batch_link = BatchHttpLink::new(BatchOptions::from(&self.config), transport)?;

        let chain = LinkChain::from(vec![
            Arc::new(error_link) as Arc<dyn Link>,
            Arc::new(request_link),
            Arc::new(batch_link),
        ]);
        Ok(GraphQlClient::new(chain))
    }
}
