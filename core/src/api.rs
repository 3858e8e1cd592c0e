//! CRUD functions consumed by the dispatcher.
//!
//! # Design
//! Every operation resolves to the full, refreshed todo list. The GraphQL
//! documents alias their root field to `todoList` so queries and mutations
//! share one response shape, `{ data: { todoList } }`. Queries are fetched
//! network-only: the list shown after an intent must reflect the server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::client::{FetchPolicy, GraphQlClient};
use crate::error::ApiError;
use crate::graphql::Operation;
use crate::types::{ListPayload, TodoListData};

pub const GET_LIST: &str = "query GetList {
  todoList { __typename id content completed }
}";

pub const ADD_TODO: &str = "mutation AddTodo($content: String!) {
  todoList: add(content: $content) { __typename id content completed }
}";

pub const DELETE_TODO: &str = "mutation DeleteTodo($ids: [ID!]!) {
  todoList: deleteTodo(ids: $ids) { __typename id content completed }
}";

pub const EDIT_TODO: &str = "mutation EditTodo($id: ID!, $content: String!) {
  todoList: editTodo(id: $id, content: $content) { __typename id content completed }
}";

pub const SEARCH_TODO: &str = "query SearchTodo($content: String!) {
  todoList: searchTodo(content: $content) { __typename id content completed }
}";

pub const SET_COMPLETED: &str = "mutation SetCompleted($id: ID!, $completed: Boolean!) {
  todoList: setCompleted(id: $id, completed: $completed) { __typename id content completed }
}";

/// The CRUD surface the dispatcher drives.
#[async_trait]
pub trait TodoApi: Send + Sync + 'static {
    async fn get_list(&self) -> Result<ListPayload, ApiError>;
    async fn add(&self, content: &str) -> Result<ListPayload, ApiError>;
    async fn delete_todo(&self, ids: &[Uuid]) -> Result<ListPayload, ApiError>;
    async fn edit_todo(&self, id: Uuid, content: &str) -> Result<ListPayload, ApiError>;
    async fn search_todo(&self, content: &str) -> Result<ListPayload, ApiError>;
    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<ListPayload, ApiError>;
}

/// `TodoApi` over a shared `GraphQlClient`.
#[derive(Debug, Clone)]
pub struct GraphQlTodoApi {
    client: Arc<GraphQlClient>,
}

impl GraphQlTodoApi {
    pub fn new(client: Arc<GraphQlClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<GraphQlClient> {
        &self.client
    }

    async fn query(&self, name: &str, document: &str, variables: Value) -> Result<ListPayload, ApiError> {
        let data = self
            .client
            .query(Operation::new(name, document, variables), FetchPolicy::NetworkOnly)
            .await?;
        into_payload(data)
    }

    async fn mutate(&self, name: &str, document: &str, variables: Value) -> Result<ListPayload, ApiError> {
        let data = self
            .client
            .mutate(Operation::new(name, document, variables))
            .await?;
        into_payload(data)
    }
}

fn into_payload(data: Value) -> Result<ListPayload, ApiError> {
    let data: TodoListData =
        serde_json::from_value(data).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    Ok(ListPayload { data })
}

#[async_trait]
impl TodoApi for GraphQlTodoApi {
    async fn get_list(&self) -> Result<ListPayload, ApiError> {
        self.query("GetList", GET_LIST, json!({})).await
    }

    async fn add(&self, content: &str) -> Result<ListPayload, ApiError> {
        self.mutate("AddTodo", ADD_TODO, json!({ "content": content }))
            .await
    }

    async fn delete_todo(&self, ids: &[Uuid]) -> Result<ListPayload, ApiError> {
        self.mutate("DeleteTodo", DELETE_TODO, json!({ "ids": ids }))
            .await
    }

    async fn edit_todo(&self, id: Uuid, content: &str) -> Result<ListPayload, ApiError> {
        self.mutate("EditTodo", EDIT_TODO, json!({ "id": id, "content": content }))
            .await
    }

    async fn search_todo(&self, content: &str) -> Result<ListPayload, ApiError> {
        self.query("SearchTodo", SEARCH_TODO, json!({ "content": content }))
            .await
    }

    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<ListPayload, ApiError> {
        self.mutate(
            "SetCompleted",
            SET_COMPLETED,
            json!({ "id": id, "completed": completed }),
        )
        .await
    }
}
