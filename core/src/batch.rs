//! Batching HTTP link.
//!
//! # Design
//! `BatchHttpLink` terminates the chain. Each operation is queued on an
//! unbounded channel together with a oneshot reply slot. A background task
//! drains the queue: the first operation opens a window of
//! `batch_interval`, and the batch is flushed when the window closes or
//! `batch_max` operations have arrived, whichever is first. Operations whose
//! headers differ are split into separate HTTP requests.
//!
//! The wire format is a JSON array of `{operationName, query, variables}`
//! objects, answered by a JSON array of results in the same order.
//! `build_batch_request` and `parse_batch_response` are pure so the format
//! can be tested without a transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::graphql::{GraphQlResponse, Operation};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::link::{Forward, Link};

/// Batching parameters for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub uri: String,
    pub batch_interval: Duration,
    pub batch_max: usize,
}

impl From<&ClientConfig> for BatchOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            uri: config.uri.clone(),
            batch_interval: config.batch_interval,
            batch_max: config.batch_max.max(1),
        }
    }
}

type Reply = oneshot::Sender<Result<GraphQlResponse, ApiError>>;

struct Pending {
    operation: Operation,
    reply: Reply,
}

/// Terminating link that groups operations into batched HTTP requests.
///
/// The batching task is spawned on the current tokio runtime at
/// construction and stops once every clone of the link is dropped.
#[derive(Clone)]
pub struct BatchHttpLink {
    queue: mpsc::UnboundedSender<Pending>,
}

impl BatchHttpLink {
    /// Fails with `ApiError::NoRuntime` when called outside a tokio runtime.
    pub fn new(options: BatchOptions, transport: Arc<dyn Transport>) -> Result<Self, ApiError> {
        let handle = Handle::try_current().map_err(|_| ApiError::NoRuntime)?;
        let (queue, rx) = mpsc::unbounded_channel();
        handle.spawn(batch_loop(rx, options, transport));
        Ok(Self { queue })
    }
}

#[async_trait]
impl Link for BatchHttpLink {
    async fn request(
        &self,
        operation: Operation,
        _forward: Forward<'_>,
    ) -> Result<GraphQlResponse, ApiError> {
        let (reply, response) = oneshot::channel();
        self.queue
            .send(Pending { operation, reply })
            .map_err(|_| ApiError::Canceled)?;
        response.await.map_err(|_| ApiError::Canceled)?
    }
}

async fn batch_loop(
    mut rx: mpsc::UnboundedReceiver<Pending>,
    options: BatchOptions,
    transport: Arc<dyn Transport>,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        let window = tokio::time::sleep(options.batch_interval);
        tokio::pin!(window);

        while batch.len() < options.batch_max {
            tokio::select! {
                _ = &mut window => break,
                next = rx.recv() => match next {
                    Some(pending) => batch.push(pending),
                    None => break,
                },
            }
        }

        for group in group_by_headers(batch) {
            tokio::spawn(flush(group, options.uri.clone(), transport.clone()));
        }
    }
}

fn group_by_headers(batch: Vec<Pending>) -> Vec<Vec<Pending>> {
    let mut groups: Vec<Vec<Pending>> = Vec::new();
    for pending in batch {
        let headers = &pending.operation.context.headers;
        match groups
            .iter_mut()
            .find(|g| &g[0].operation.context.headers == headers)
        {
            Some(group) => group.push(pending),
            None => groups.push(vec![pending]),
        }
    }
    groups
}

async fn flush(batch: Vec<Pending>, uri: String, transport: Arc<dyn Transport>) {
    let (operations, replies): (Vec<Operation>, Vec<Reply>) =
        batch.into_iter().map(|p| (p.operation, p.reply)).unzip();
    debug!(size = operations.len(), %uri, "flushing graphql batch");

    match round_trip(&uri, &operations, transport.as_ref()).await {
        Ok(responses) => {
            for (reply, response) in replies.into_iter().zip(responses) {
                let _ = reply.send(Ok(response));
            }
        }
        Err(error) => {
            debug!(%error, "graphql batch failed");
            for reply in replies {
                let _ = reply.send(Err(error.clone()));
            }
        }
    }
}

async fn round_trip(
    uri: &str,
    operations: &[Operation],
    transport: &dyn Transport,
) -> Result<Vec<GraphQlResponse>, ApiError> {
    let request = build_batch_request(uri, operations)?;
    let response = transport.execute(request).await?;
    parse_batch_response(response, operations.len())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEntry<'a> {
    operation_name: &'a str,
    query: &'a str,
    variables: &'a Value,
}

/// Build the POST request for a batch. Headers come from the first
/// operation; callers group operations by headers beforehand.
pub fn build_batch_request(uri: &str, operations: &[Operation]) -> Result<HttpRequest, ApiError> {
    let entries: Vec<BatchEntry<'_>> = operations
        .iter()
        .map(|op| BatchEntry {
            operation_name: &op.operation_name,
            query: &op.query,
            variables: &op.variables,
        })
        .collect();
    let body =
        serde_json::to_string(&entries).map_err(|e| ApiError::SerializationError(e.to_string()))?;

    let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
    if let Some(first) = operations.first() {
        headers.extend(
            first
                .context
                .headers
                .iter()
                .filter(|(k, _)| !k.eq_ignore_ascii_case("content-type"))
                .cloned(),
        );
    }

    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: uri.to_string(),
        headers,
        body: Some(body),
    })
}

/// Split a batched response into one result per operation.
pub fn parse_batch_response(
    response: HttpResponse,
    expected: usize,
) -> Result<Vec<GraphQlResponse>, ApiError> {
    check_status(&response)?;
    let results: Vec<GraphQlResponse> = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    if results.len() != expected {
        return Err(ApiError::BatchMismatch {
            expected,
            actual: results.len(),
        });
    }
    Ok(results)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
