//! todo-api の HTTP クライアント
//!
//! 各メソッドは 1 回（update のみ 2 回）の HTTP 往復を行い、成功時は
//! レスポンスボディの JSON をそのまま返す。リトライやタイムアウトの独自設定はしない。

use domain::TodoStats;
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use shared::McpConfig;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    /// 接続できない、レスポンスを受け取れない等
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// 2xx 以外のステータス
    #[error("HTTP {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// POST /todos のボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

/// PUT /todos/{id} のボディ。`None` のフィールドは送信しない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateFields {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct TodoClient {
    http: reqwest::Client,
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_config(config: &McpConfig) -> Self {
        Self::new(config.api_base_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn todo_url(&self, todo_id: &str) -> String {
        self.url(&format!("/todos/{}", encode_id(todo_id)))
    }

    pub async fn list(&self) -> Result<Value, ClientError> {
        self.send(self.http.get(self.url("/todos"))).await
    }

    pub async fn get(&self, todo_id: &str) -> Result<Value, ClientError> {
        self.send(self.http.get(self.todo_url(todo_id))).await
    }

    pub async fn create(&self, request: &CreateTodoRequest) -> Result<Value, ClientError> {
        self.send(self.http.post(self.url("/todos")).json(request))
            .await
    }

    /// 部分更新（2 段階）
    ///
    /// 1. 現在のレコードを取得し、失敗したらその時点で返す
    /// 2. 呼び出し側が指定したフィールドだけを PUT する
    pub async fn update(&self, todo_id: &str, fields: &UpdateFields) -> Result<Value, ClientError> {
        self.get(todo_id).await?;

        self.send(self.http.put(self.todo_url(todo_id)).json(fields))
            .await
    }

    pub async fn delete(&self, todo_id: &str) -> Result<Value, ClientError> {
        self.send(self.http.delete(self.todo_url(todo_id))).await
    }

    pub async fn list_completed(&self) -> Result<Value, ClientError> {
        self.send(self.http.get(self.url("/todos/completed"))).await
    }

    pub async fn list_pending(&self) -> Result<Value, ClientError> {
        self.send(self.http.get(self.url("/todos/pending"))).await
    }

    pub async fn mark_complete(&self, todo_id: &str) -> Result<Value, ClientError> {
        self.update(todo_id, &UpdateFields::completed(true)).await
    }

    pub async fn mark_pending(&self, todo_id: &str) -> Result<Value, ClientError> {
        self.update(todo_id, &UpdateFields::completed(false)).await
    }

    /// 全件を取得してローカルで集計
    pub async fn stats(&self) -> Result<TodoStats, ClientError> {
        let todos = self.list().await?;
        let records = todos
            .as_array()
            .ok_or_else(|| ClientError::Decode("expected a JSON array of todos".to_string()))?;
        Ok(TodoStats::from_records(records))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await.map_err(ClientError::Transport)?;
        let status = response.status();
        debug!(url = %response.url(), %status, "todo-api responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status,
                detail: error_detail(status, &body),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// ID をパスセグメント用に全バイト percent-encode する。
/// `completed` や `../health` のような ID が別のルートに解決されないようにする。
fn encode_id(todo_id: &str) -> String {
    todo_id.bytes().map(|b| format!("%{b:02X}")).collect()
}

/// エラーレスポンスから人が読めるメッセージを取り出す
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(text) = json.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("unexpected status").to_string()
    } else {
        body.to_string()
    }
}
