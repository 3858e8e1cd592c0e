//! Error types for the todo GraphQL client.
//!
//! # Design
//! `NotFound` keeps its own variant so callers can tell a missing endpoint
//! apart from any other non-2xx status. GraphQL-level failures arrive with a
//! 200 status and an `errors` array, so they get their own variant carrying
//! the server's messages. Batch plumbing failures (`BatchMismatch`,
//! `Canceled`) only happen when the server or the background flush task
//! misbehaves.

use thiserror::Error;

/// Errors produced anywhere between a dispatched intent and the server.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server returned 404 for the GraphQL endpoint.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The HTTP round-trip itself failed (connect, timeout, TLS).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a GraphQL `errors` array.
    #[error("graphql errors: {}", .messages.join("; "))]
    GraphQl { messages: Vec<String> },

    /// A batched response did not contain one result per operation.
    #[error("batch response had {actual} results for {expected} operations")]
    BatchMismatch { expected: usize, actual: usize },

    /// The batch task dropped the operation before answering it.
    #[error("operation canceled before a response arrived")]
    Canceled,

    /// A component that spawns background tasks was built outside a tokio
    /// runtime.
    #[error("no tokio runtime is running")]
    NoRuntime,

    /// The link chain ran out of links without reaching a terminating link.
    #[error("link chain ended without a terminating link")]
    UnterminatedChain,
}

/// Errors raised while reading `ClientConfig` from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}
