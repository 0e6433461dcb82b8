//! HTTP API（axum）
//!
//! メモリ上の ToDo コレクションに対する CRUD と完了状態による絞り込みを提供します。

pub mod error;
pub mod handlers;
pub mod shutdown;

use axum::{routing::get, Router};
use infrastructure::{InMemoryTodoRepository, TodoRepository};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// 空のコレクションでルータを構築して返します。
pub fn app() -> Router {
    app_with_state(AppState::default())
}

/// 外部から状態を注入できる版
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api", get(handlers::api_info))
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        // 静的パスは `/todos/:id` より優先してマッチする
        .route("/todos/completed", get(handlers::list_completed))
        .route("/todos/pending", get(handlers::list_pending))
        .route(
            "/todos/:id",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    repo: Arc<dyn TodoRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self { repo }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTodoRepository::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use domain::Todo;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt; // for `oneshot`

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(app: &Router, body: Value) -> Todo {
        let response = send(app, "POST", "/todos", Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_value(json_body(response).await).unwrap()
    }

    #[tokio::test]
    async fn get_health_returns_ok() {
        let app = app();

        let response = send(&app, "GET", "/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn get_api_returns_welcome_message() {
        let app = app();

        let response = send(&app, "GET", "/api", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert!(json["message"].as_str().unwrap().starts_with("Welcome"));
    }

    #[tokio::test]
    async fn post_todos_returns_full_record() {
        let app = app();

        let todo = create(&app, json!({"title": "Buy milk"})).await;

        assert_eq!(todo.id.as_str().len(), 26);
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description, None);
        assert!(!todo.completed);
        assert_eq!(todo.created_at, todo.updated_at);
    }

    #[tokio::test]
    async fn post_todos_accepts_optional_fields() {
        let app = app();

        let todo = create(
            &app,
            json!({"title": "Read", "description": "chapter 3", "completed": true}),
        )
        .await;

        assert_eq!(todo.description.as_deref(), Some("chapter 3"));
        assert!(todo.completed);
    }

    #[tokio::test]
    async fn post_todos_with_bad_input_returns_422() {
        let app = app();

        for body in [
            json!({}),
            json!({"title": 42}),
            json!({"title": "ok", "completed": "yes"}),
            json!({"title": ""}),
        ] {
            let response = send(&app, "POST", "/todos", Some(body.clone())).await;
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
            assert!(json_body(response).await["error"].is_string());
        }

        let malformed = Request::builder()
            .method("POST")
            .uri("/todos")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(malformed).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // 失敗した作成はコレクションに残らない
        let list = json_body(send(&app, "GET", "/todos", None).await).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn get_todos_returns_items_in_insertion_order() {
        let app = app();
        for title in ["A", "B", "C"] {
            create(&app, json!({"title": title})).await;
        }

        let response = send(&app, "GET", "/todos", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let todos: Vec<Todo> = serde_json::from_value(json_body(response).await).unwrap();
        let titles: Vec<String> = todos.into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn get_todo_returns_item_or_404() {
        let app = app();
        let created = create(&app, json!({"title": "Task"})).await;

        let response = send(&app, "GET", &format!("/todos/{}", created.id), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let fetched: Todo = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(fetched, created);

        let missing = send(&app, "GET", "/todos/does-not-exist", None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(missing).await["error"], "Todo not found");
    }

    #[tokio::test]
    async fn create_update_delete_scenario() {
        let app = app();
        let created = create(&app, json!({"title": "Buy milk"})).await;
        assert!(!created.completed);
        assert_eq!(created.created_at, created.updated_at);
        tokio::time::sleep(Duration::from_millis(5)).await;

        let uri = format!("/todos/{}", created.id);
        let response = send(&app, "PUT", &uri, Some(json!({"completed": true}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated: Todo = serde_json::from_value(json_body(response).await).unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > updated.created_at);

        let response = send(&app, "DELETE", &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"message": "Todo deleted successfully"})
        );

        let response = send(&app, "GET", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_applies_only_supplied_fields() {
        let app = app();
        let created = create(&app, json!({"title": "Write", "description": "draft"})).await;
        let uri = format!("/todos/{}", created.id);

        let response = send(&app, "PUT", &uri, Some(json!({"title": "Write report"}))).await;
        let json = json_body(response).await;
        assert_eq!(json["title"], "Write report");
        assert_eq!(json["description"], "draft");
        assert_eq!(json["completed"], false);

        // description は null を明示すると消える
        let response = send(&app, "PUT", &uri, Some(json!({"description": null}))).await;
        let json = json_body(response).await;
        assert!(json["description"].is_null());
        assert_eq!(json["title"], "Write report");

        // 空ボディでも updated_at は更新される
        let response = send(&app, "PUT", &uri, Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn put_and_delete_unknown_id_return_404() {
        let app = app();

        let put = send(&app, "PUT", "/todos/nope", Some(json!({"completed": true}))).await;
        assert_eq!(put.status(), StatusCode::NOT_FOUND);

        let delete = send(&app, "DELETE", "/todos/nope", None).await;
        assert_eq!(delete.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_with_bad_input_returns_422() {
        let app = app();
        let created = create(&app, json!({"title": "Task"})).await;
        let uri = format!("/todos/{}", created.id);

        let response = send(&app, "PUT", &uri, Some(json!({"completed": "done"}))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = send(&app, "PUT", &uri, Some(json!({"title": ""}))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let unchanged = json_body(send(&app, "GET", &uri, None).await).await;
        assert_eq!(unchanged["title"], "Task");
        assert_eq!(unchanged["updated_at"], json!(created.updated_at));
    }

    #[tokio::test]
    async fn completed_and_pending_views_partition_the_list() {
        let app = app();
        let a = create(&app, json!({"title": "A"})).await;
        let b = create(&app, json!({"title": "B", "completed": true})).await;
        let c = create(&app, json!({"title": "C"})).await;
        send(&app, "PUT", &format!("/todos/{}", c.id), Some(json!({"completed": true}))).await;

        let completed: Vec<Todo> =
            serde_json::from_value(json_body(send(&app, "GET", "/todos/completed", None).await).await)
                .unwrap();
        let pending: Vec<Todo> =
            serde_json::from_value(json_body(send(&app, "GET", "/todos/pending", None).await).await)
                .unwrap();

        let completed_ids: Vec<_> = completed.iter().map(|t| t.id.clone()).collect();
        let pending_ids: Vec<_> = pending.iter().map(|t| t.id.clone()).collect();
        assert_eq!(completed_ids, vec![b.id, c.id]);
        assert_eq!(pending_ids, vec![a.id]);
    }

    #[tokio::test]
    async fn put_cannot_change_id() {
        let app = app();
        let created = create(&app, json!({"title": "Task"})).await;
        let uri = format!("/todos/{}", created.id);

        let response = send(
            &app,
            "PUT",
            &uri,
            Some(json!({"id": "01ARZ3NDEKTSV4RRFFQ69G5FAV", "title": "Renamed"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let updated: Todo = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Renamed");
        let missing = send(&app, "GET", "/todos/01ARZ3NDEKTSV4RRFFQ69G5FAV", None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn whitespace_title_is_stored_as_given() {
        let app = app();

        let todo = create(&app, json!({"title": "   "})).await;

        assert_eq!(todo.title, "   ");
    }

    #[tokio::test]
    async fn percent_encoded_route_names_are_treated_as_ids() {
        let app = app();
        create(&app, json!({"title": "A", "completed": true})).await;

        let response = send(&app, "GET", "/todos/%63%6F%6D%70%6C%65%74%65%64", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Todo not found");

        let response = send(&app, "DELETE", "/todos/%70%65%6E%64%69%6E%67", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
