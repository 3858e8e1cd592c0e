use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn graphql_request(body: &Value) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn op(name: &str, variables: Value) -> Value {
    json!({ "operationName": name, "query": "", "variables": variables })
}

// --- single operations ---

#[tokio::test]
async fn get_list_empty() {
    let resp = app()
        .oneshot(graphql_request(&op("GetList", json!({}))))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "data": { "todoList": [] } }));
}

#[tokio::test]
async fn add_returns_the_full_list() {
    let resp = app()
        .oneshot(graphql_request(&op("AddTodo", json!({ "content": "Buy milk" }))))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let list = body["data"]["todoList"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["content"], "Buy milk");
    assert_eq!(list[0]["completed"], false);
}

#[tokio::test]
async fn unknown_operation_reports_graphql_error() {
    let resp = app()
        .oneshot(graphql_request(&op("Nope", json!({}))))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["data"].is_null());
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_body_returns_422() {
    let resp = app()
        .oneshot(graphql_request(&json!("not an operation")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn non_json_body_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/graphql")
                .body("{}".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(!body_bytes(resp).await.is_empty());
}

// --- batches ---

#[tokio::test]
async fn batch_answers_in_order() {
    let batch = json!([
        op("AddTodo", json!({ "content": "A" })),
        op("AddTodo", json!({ "content": "B" })),
        op("Nope", json!({})),
        op("GetList", json!({})),
    ]);
    let resp = app().oneshot(graphql_request(&batch)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results[0]["data"]["todoList"].as_array().unwrap().len(), 1);
    assert_eq!(results[1]["data"]["todoList"].as_array().unwrap().len(), 2);
    assert!(results[2]["errors"].is_array());
    assert_eq!(results[3]["data"]["todoList"][1]["content"], "B");
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    async fn call(
        app: &mut axum::routing::RouterIntoService<String>,
        body: Value,
    ) -> Value {
        let resp = ServiceExt::ready(app)
            .await
            .unwrap()
            .call(graphql_request(&body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await
    }

    // add
    let body = call(&mut app, op("AddTodo", json!({ "content": "Walk dog" }))).await;
    let id = body["data"]["todoList"][0]["id"].as_str().unwrap().to_string();

    // edit
    let body = call(
        &mut app,
        op("EditTodo", json!({ "id": id, "content": "Walk the dog" })),
    )
    .await;
    assert_eq!(body["data"]["todoList"][0]["content"], "Walk the dog");

    // complete
    let body = call(
        &mut app,
        op("SetCompleted", json!({ "id": id, "completed": true })),
    )
    .await;
    assert_eq!(body["data"]["todoList"][0]["completed"], true);

    // search
    let body = call(&mut app, op("SearchTodo", json!({ "content": "cat" }))).await;
    assert!(body["data"]["todoList"].as_array().unwrap().is_empty());

    // delete
    let body = call(&mut app, op("DeleteTodo", json!({ "ids": [id] }))).await;
    assert!(body["data"]["todoList"].as_array().unwrap().is_empty());

    // edit after delete
    let body = call(
        &mut app,
        op("EditTodo", json!({ "id": id, "content": "gone" })),
    )
    .await;
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .ends_with("not found"));
}
