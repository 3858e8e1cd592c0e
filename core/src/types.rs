//! Domain DTOs for the todo GraphQL API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates. Every CRUD
//! operation resolves to the same `{ data: { todoList } }` envelope, so a
//! single `ListPayload` type covers all of them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: Uuid,
    pub content: String,
    #[serde(default)]
    pub completed: bool,
}

/// The `data` object of every todo operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoListData {
    pub todo_list: Vec<Todo>,
}

/// The resolved payload of a CRUD call: `{ data: { todoList: [...] } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListPayload {
    pub data: TodoListData,
}

impl ListPayload {
    pub fn new(todo_list: Vec<Todo>) -> Self {
        Self {
            data: TodoListData { todo_list },
        }
    }

    pub fn into_todo_list(self) -> Vec<Todo> {
        self.data.todo_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_reads_camel_case_todo_list() {
        let raw = r#"{"data":{"todoList":[
            {"__typename":"Todo","id":"00000000-0000-0000-0000-000000000001","content":"Buy milk","completed":false}
        ]}}"#;
        let payload: ListPayload = serde_json::from_str(raw).unwrap();
        let list = payload.into_todo_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].content, "Buy milk");
    }

    #[test]
    fn todo_completed_defaults_to_false() {
        let todo: Todo =
            serde_json::from_str(r#"{"id":"00000000-0000-0000-0000-000000000002","content":"x"}"#)
                .unwrap();
        assert!(!todo.completed);
    }

    #[test]
    fn payload_rejects_missing_data() {
        let result: Result<ListPayload, _> = serde_json::from_str(r#"{"todoList":[]}"#);
        assert!(result.is_err());
    }
}
