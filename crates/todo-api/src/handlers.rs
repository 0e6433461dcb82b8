use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use domain::{NewTodo, Todo, TodoId, TodoPatch, TodoStatus};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// `{"message": ...}` 形式のレスポンス
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    /// サービスの簡易ステータス
    pub status: &'static str,
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

pub async fn api_info() -> Json<MessageBody> {
    Json(MessageBody {
        message: "Welcome to the Todo List API!",
    })
}

/// GET /todos
pub async fn list_todos(State(state): State<AppState>) -> Json<Vec<Todo>> {
    Json(state.repo.list())
}

/// GET /todos/completed
pub async fn list_completed(State(state): State<AppState>) -> Json<Vec<Todo>> {
    Json(state.repo.list_by_status(TodoStatus::Completed))
}

/// GET /todos/pending
pub async fn list_pending(State(state): State<AppState>) -> Json<Vec<Todo>> {
    Json(state.repo.list_by_status(TodoStatus::Pending))
}

/// GET /todos/{id}
pub async fn get_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Todo>, ApiError> {
    let todo = state.repo.get(&TodoId::from_string(id))?;
    Ok(Json(todo))
}

/// POST /todos
pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<NewTodo>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Json(input) = payload?;
    let todo = state.repo.create(input)?;
    info!(todo_id = %todo.id, "todo created");
    Ok(Json(todo))
}

/// PUT /todos/{id}
///
/// ボディに含まれるフィールドのみ反映する。
pub async fn update_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<TodoPatch>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Json(patch) = payload?;
    let todo = state.repo.update(&TodoId::from_string(id), patch)?;
    info!(todo_id = %todo.id, completed = todo.completed, "todo updated");
    Ok(Json(todo))
}

/// DELETE /todos/{id}
pub async fn delete_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageBody>, ApiError> {
    let id = TodoId::from_string(id);
    state.repo.delete(&id)?;
    info!(todo_id = %id, "todo deleted");
    Ok(Json(MessageBody {
        message: "Todo deleted successfully",
    }))
}
