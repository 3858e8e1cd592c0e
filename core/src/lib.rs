//! Todo-list client core: state store, async intents, GraphQL transport.
//!
//! # Overview
//! UI code dispatches intents (`ADD`, `DELETE`, `EDIT`, `SEARCH`,
//! `SET_COMPLETED`, `GET_LIST`) through a `Dispatcher`. Each intent marks the
//! store as loading, calls the matching `TodoApi` function, and replaces the
//! todo list with whatever the server returned. The GraphQL API runs over a
//! link chain that attaches headers, reports errors, and batches operations
//! into shared HTTP requests.
//!
//! # Design
//! - The reducer is pure and shares state as `Arc<AppState>`; unchanged
//!   transitions return the same pointer.
//! - `GraphQlClient` is constructed explicitly and injected, never global.
//! - The batching link builds `HttpRequest` values and parses `HttpResponse`
//!   values as plain data; only `Transport` implementations do I/O.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod batch;
pub mod cache;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod graphql;
pub mod http;
pub mod link;
pub mod provider;
pub mod store;
pub mod types;

pub use api::{GraphQlTodoApi, TodoApi};
pub use batch::{BatchHttpLink, BatchOptions};
pub use cache::InMemoryCache;
pub use client::{FetchPolicy, GraphQlClient, GraphQlClientBuilder};
pub use config::ClientConfig;
pub use dispatcher::{DispatchFuture, Dispatcher};
pub use error::{ApiError, ConfigError};
pub use graphql::{GraphQlError, GraphQlResponse, Operation, OperationContext};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use link::{ErrorLink, Forward, HeaderProvider, Link, LinkChain, RequestLink, StaticHeaders};
pub use provider::{Context, Provider};
pub use store::{reduce, Action, AppState, Store};
pub use types::{ListPayload, Todo, TodoListData};
