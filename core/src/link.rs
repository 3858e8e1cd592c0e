//! The transport link chain.
//!
//! # Design
//! A chain is an ordered slice of `Link`s. Each link receives the operation
//! plus a `Forward` handle over the links after it, and either forwards
//! (possibly after rewriting the operation) or terminates the chain by
//! answering itself. `BatchHttpLink` is the terminating link in production.
//! A chain that runs out of links fails with `ApiError::UnterminatedChain`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::ApiError;
use crate::graphql::{GraphQlResponse, Operation};

/// One request-processing stage.
#[async_trait]
pub trait Link: Send + Sync {
    async fn request(
        &self,
        operation: Operation,
        forward: Forward<'_>,
    ) -> Result<GraphQlResponse, ApiError>;
}

/// The remainder of the chain after the current link.
#[derive(Clone, Copy)]
pub struct Forward<'a> {
    rest: &'a [Arc<dyn Link>],
}

impl Forward<'_> {
    pub async fn run(self, operation: Operation) -> Result<GraphQlResponse, ApiError> {
        match self.rest.split_first() {
            Some((link, rest)) => link.request(operation, Forward { rest }).await,
            None => Err(ApiError::UnterminatedChain),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}

/// An ordered composition of links.
#[derive(Clone)]
pub struct LinkChain {
    links: Vec<Arc<dyn Link>>,
}

impl LinkChain {
    pub async fn execute(&self, operation: Operation) -> Result<GraphQlResponse, ApiError> {
        Forward { rest: &self.links }.run(operation).await
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl From<Vec<Arc<dyn Link>>> for LinkChain {
    fn from(links: Vec<Arc<dyn Link>>) -> Self {
        Self { links }
    }
}

impl fmt::Debug for LinkChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkChain").field("links", &self.links.len()).finish()
    }
}

// ---------------------------------------------------------------------------
// Request link
// ---------------------------------------------------------------------------

/// Supplies headers for each outgoing operation, e.g. an auth token.
#[async_trait]
pub trait HeaderProvider: Send + Sync {
    async fn headers(&self) -> Result<Vec<(String, String)>, ApiError>;
}

/// A fixed header set.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders(pub Vec<(String, String)>);

#[async_trait]
impl HeaderProvider for StaticHeaders {
    async fn headers(&self) -> Result<Vec<(String, String)>, ApiError> {
        Ok(self.0.clone())
    }
}

/// Attaches headers to the operation context, then forwards.
#[derive(Clone)]
pub struct RequestLink {
    provider: Arc<dyn HeaderProvider>,
}

impl RequestLink {
    pub fn new(provider: Arc<dyn HeaderProvider>) -> Self {
        Self { provider }
    }
}

impl Default for RequestLink {
    fn default() -> Self {
        Self::new(Arc::new(StaticHeaders::default()))
    }
}

#[async_trait]
impl Link for RequestLink {
    async fn request(
        &self,
        mut operation: Operation,
        forward: Forward<'_>,
    ) -> Result<GraphQlResponse, ApiError> {
        for (name, value) in self.provider.headers().await? {
            operation.context.set_header(&name, &value);
        }
        forward.run(operation).await
    }
}

// ---------------------------------------------------------------------------
// Error link
// ---------------------------------------------------------------------------

pub type ErrorHandler = Arc<dyn Fn(&str, &ApiError) + Send + Sync>;

/// Reports transport failures and GraphQL `errors` arrays without altering
/// the result.
#[derive(Clone, Default)]
pub struct ErrorLink {
    handler: Option<ErrorHandler>,
}

impl ErrorLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(handler: ErrorHandler) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    fn report(&self, operation_name: &str, error: &ApiError) {
        warn!(operation = operation_name, %error, "graphql operation failed");
        if let Some(handler) = &self.handler {
            handler(operation_name, error);
        }
    }
}

#[async_trait]
impl Link for ErrorLink {
    async fn request(
        &self,
        operation: Operation,
        forward: Forward<'_>,
    ) -> Result<GraphQlResponse, ApiError> {
        let name = operation.operation_name.clone();
        let result = forward.run(operation).await;
        match &result {
            Ok(response) if response.has_errors() => {
                let error = ApiError::GraphQl {
                    messages: response.error_messages(),
                };
                self.report(&name, &error);
            }
            Ok(_) => {}
            Err(error) => self.report(&name, error),
        }
        result
    }
}
