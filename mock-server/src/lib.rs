use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub content: String,
    pub completed: bool,
}

/// One GraphQL operation as sent by the client. The server routes on
/// `operationName` and never parses `query`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub operation_name: Option<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub variables: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum GraphQlBody {
    Batch(Vec<GraphQlRequest>),
    Single(GraphQlRequest),
}

#[derive(Deserialize)]
struct ContentVars {
    content: String,
}

#[derive(Deserialize)]
struct IdsVars {
    ids: Vec<Uuid>,
}

#[derive(Deserialize)]
struct EditVars {
    id: Uuid,
    content: String,
}

#[derive(Deserialize)]
struct CompletedVars {
    id: Uuid,
    completed: bool,
}

pub type Db = Arc<RwLock<Vec<Todo>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new().route("/graphql", post(graphql)).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn graphql(State(db): State<Db>, Json(body): Json<GraphQlBody>) -> Json<Value> {
    match body {
        GraphQlBody::Single(request) => Json(resolve(&db, request).await),
        GraphQlBody::Batch(requests) => {
            info!(size = requests.len(), "batch received");
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                results.push(resolve(&db, request).await);
            }
            Json(Value::Array(results))
        }
    }
}

/// Execute one operation and render its `{data}` or `{errors}` result.
pub async fn resolve(db: &Db, request: GraphQlRequest) -> Value {
    let name = request.operation_name.unwrap_or_default();
    info!(operation = %name, "resolving");
    match execute(db, &name, request.variables).await {
        Ok(list) => json!({ "data": { "todoList": render(&list) } }),
        Err(message) => json!({ "data": null, "errors": [{ "message": message }] }),
    }
}

async fn execute(db: &Db, name: &str, variables: Value) -> Result<Vec<Todo>, String> {
    match name {
        "GetList" => Ok(db.read().await.clone()),
        "SearchTodo" => {
            let vars: ContentVars = vars(variables)?;
            let needle = vars.content.to_lowercase();
            Ok(db
                .read()
                .await
                .iter()
                .filter(|t| t.content.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }
        "AddTodo" => {
            let vars: ContentVars = vars(variables)?;
            let mut todos = db.write().await;
            todos.push(Todo {
                id: Uuid::new_v4(),
                content: vars.content,
                completed: false,
            });
            Ok(todos.clone())
        }
        "DeleteTodo" => {
            let vars: IdsVars = vars(variables)?;
            let mut todos = db.write().await;
            todos.retain(|t| !vars.ids.contains(&t.id));
            Ok(todos.clone())
        }
        "EditTodo" => {
            let vars: EditVars = vars(variables)?;
            let mut todos = db.write().await;
            let todo = find(&mut todos, vars.id)?;
            todo.content = vars.content;
            Ok(todos.clone())
        }
        "SetCompleted" => {
            let vars: CompletedVars = vars(variables)?;
            let mut todos = db.write().await;
            let todo = find(&mut todos, vars.id)?;
            todo.completed = vars.completed;
            Ok(todos.clone())
        }
        other => Err(format!("unknown operation: {other:?}")),
    }
}

fn vars<T: serde::de::DeserializeOwned>(variables: Value) -> Result<T, String> {
    serde_json::from_value(variables).map_err(|e| format!("invalid variables: {e}"))
}

fn find(todos: &mut [Todo], id: Uuid) -> Result<&mut Todo, String> {
    todos
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| format!("todo {id} not found"))
}

fn render(todos: &[Todo]) -> Value {
    todos
        .iter()
        .map(|t| {
            json!({
                "__typename": "Todo",
                "id": t.id,
                "content": t.content,
                "completed": t.completed,
            })
        })
        .collect()
}
