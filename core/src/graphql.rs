//! GraphQL operation and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-operation context that links may read and rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationContext {
    pub headers: Vec<(String, String)>,
}

impl OperationContext {
    /// Insert or replace a header, matching names case-insensitively.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }
}

/// A query or mutation on its way through the link chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_name: String,
    pub query: String,
    pub variables: Value,
    pub context: OperationContext,
}

impl Operation {
    pub fn new(operation_name: &str, query: &str, variables: Value) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            query: query.to_string(),
            variables,
            context: OperationContext::default(),
        }
    }

    /// Key used by the cache for root results. `serde_json` maps are ordered,
    /// so equal variables always render the same string.
    pub fn cache_key(&self) -> String {
        format!("{}({})", self.operation_name, self.variables)
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphQlError {
    pub message: String,
}

/// The result of one operation as returned by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut ctx = OperationContext::default();
        ctx.set_header("Authorization", "a");
        ctx.set_header("authorization", "b");
        assert_eq!(ctx.headers, vec![("Authorization".to_string(), "b".to_string())]);
    }

    #[test]
    fn cache_key_ignores_variable_insertion_order() {
        let a = Operation::new("EditTodo", "", json!({"id": "1", "content": "x"}));
        let b = Operation::new("EditTodo", "", json!({"content": "x", "id": "1"}));
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn response_without_errors_field_parses() {
        let resp: GraphQlResponse = serde_json::from_str(r#"{"data":{"todoList":[]}}"#).unwrap();
        assert!(!resp.has_errors());
        assert_eq!(resp.data, Some(json!({"todoList": []})));
    }
}
