//! MCP ツール定義とディスパッチ
//!
//! 各ツールは `ToolOutcome` を返す。呼び出し側へ例外は伝播させず、
//! 失敗は「どの操作が・なぜ」失敗したかを表すメッセージとして返す。

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{CreateTodoRequest, TodoClient, UpdateFields};
use crate::types::ToolDefinition;

/// ツール呼び出しの失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ToolFailure(String);

impl ToolFailure {
    pub fn new(operation: &str, cause: impl fmt::Display) -> Self {
        Self(format!("{operation}: {cause}"))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// 成功時は API の JSON そのもの、失敗時はメッセージ
pub type ToolOutcome = Result<Value, ToolFailure>;

/// 呼び出し側へ渡す値に変換する（失敗は `{"error": ...}`）
pub fn outcome_value(outcome: ToolOutcome) -> Value {
    match outcome {
        Ok(value) => value,
        Err(failure) => json!({ "error": failure.message() }),
    }
}

#[derive(Debug, Deserialize)]
struct TodoIdArgs {
    todo_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateArgs {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    todo_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T, ToolFailure> {
    // 引数なしの呼び出しは空オブジェクトとして扱う
    let args = if args.is_null() { json!({}) } else { args.clone() };
    serde_json::from_value(args)
        .map_err(|e| ToolFailure::new(&format!("Invalid arguments for {tool}"), e))
}

fn todo_id_schema() -> Value {
    json!({
        "type": "string",
        "description": "ID of the todo"
    })
}

fn no_args_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// tools/list 用のツール定義一覧
pub fn list_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "list",
            description: "Get all todos from the todo list application.",
            input_schema: no_args_schema(),
        },
        ToolDefinition {
            name: "get",
            description: "Get a specific todo by its ID.",
            input_schema: json!({
                "type": "object",
                "properties": { "todo_id": todo_id_schema() },
                "required": ["todo_id"]
            }),
        },
        ToolDefinition {
            name: "create",
            description: "Create a new todo item.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Title of the todo" },
                    "description": { "type": "string", "description": "Optional details", "default": "" },
                    "completed": { "type": "boolean", "description": "Initial completion state", "default": false }
                },
                "required": ["title"]
            }),
        },
        ToolDefinition {
            name: "update",
            description: "Update an existing todo item. Only the supplied fields are changed.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "todo_id": todo_id_schema(),
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "completed": { "type": "boolean" }
                },
                "required": ["todo_id"]
            }),
        },
        ToolDefinition {
            name: "delete",
            description: "Delete a todo item by its ID.",
            input_schema: json!({
                "type": "object",
                "properties": { "todo_id": todo_id_schema() },
                "required": ["todo_id"]
            }),
        },
        ToolDefinition {
            name: "list_completed",
            description: "Get all completed todos.",
            input_schema: no_args_schema(),
        },
        ToolDefinition {
            name: "list_pending",
            description: "Get all pending (incomplete) todos.",
            input_schema: no_args_schema(),
        },
        ToolDefinition {
            name: "mark_complete",
            description: "Mark a todo as completed.",
            input_schema: json!({
                "type": "object",
                "properties": { "todo_id": todo_id_schema() },
                "required": ["todo_id"]
            }),
        },
        ToolDefinition {
            name: "mark_pending",
            description: "Mark a todo as pending (incomplete).",
            input_schema: json!({
                "type": "object",
                "properties": { "todo_id": todo_id_schema() },
                "required": ["todo_id"]
            }),
        },
        ToolDefinition {
            name: "stats",
            description: "Get statistics about todos (total, completed, pending, completion rate).",
            input_schema: no_args_schema(),
        },
    ]
}

/// ツール群。状態は持たず、すべて todo-api へ転送する。
#[derive(Debug, Clone)]
pub struct TodoTools {
    client: TodoClient,
}

impl TodoTools {
    pub fn new(client: TodoClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ToolOutcome {
        self.client
            .list()
            .await
            .map_err(|e| ToolFailure::new("Failed to fetch todos", e))
    }

    pub async fn get(&self, todo_id: &str) -> ToolOutcome {
        self.client
            .get(todo_id)
            .await
            .map_err(|e| ToolFailure::new("Failed to fetch todo", e))
    }

    pub async fn create(&self, title: &str, description: &str, completed: bool) -> ToolOutcome {
        let request = CreateTodoRequest {
            title: title.to_string(),
            description: description.to_string(),
            completed,
        };
        self.client
            .create(&request)
            .await
            .map_err(|e| ToolFailure::new("Failed to create todo", e))
    }

    pub async fn update(&self, todo_id: &str, fields: &UpdateFields) -> ToolOutcome {
        self.client
            .update(todo_id, fields)
            .await
            .map_err(|e| ToolFailure::new("Failed to update todo", e))
    }

    pub async fn delete(&self, todo_id: &str) -> ToolOutcome {
        self.client
            .delete(todo_id)
            .await
            .map_err(|e| ToolFailure::new("Failed to delete todo", e))
    }

    pub async fn list_completed(&self) -> ToolOutcome {
        self.client
            .list_completed()
            .await
            .map_err(|e| ToolFailure::new("Failed to fetch completed todos", e))
    }

    pub async fn list_pending(&self) -> ToolOutcome {
        self.client
            .list_pending()
            .await
            .map_err(|e| ToolFailure::new("Failed to fetch pending todos", e))
    }

    pub async fn mark_complete(&self, todo_id: &str) -> ToolOutcome {
        self.update(todo_id, &UpdateFields::completed(true)).await
    }

    pub async fn mark_pending(&self, todo_id: &str) -> ToolOutcome {
        self.update(todo_id, &UpdateFields::completed(false)).await
    }

    pub async fn stats(&self) -> ToolOutcome {
        let stats = self
            .client
            .stats()
            .await
            .map_err(|e| ToolFailure::new("Failed to get stats", e))?;
        serde_json::to_value(stats).map_err(|e| ToolFailure::new("Failed to get stats", e))
    }

    /// 名前でツールを呼び出す
    pub async fn call(&self, name: &str, args: &Value) -> ToolOutcome {
        info!(tool = name, "tool call");
        let outcome = self.dispatch(name, args).await;
        if let Err(failure) = &outcome {
            warn!(tool = name, error = %failure, "tool call failed");
        }
        outcome
    }

    async fn dispatch(&self, name: &str, args: &Value) -> ToolOutcome {
        match name {
            "list" => self.list().await,
            "get" => {
                let args: TodoIdArgs = parse_args(name, args)?;
                self.get(&args.todo_id).await
            }
            "create" => {
                let args: CreateArgs = parse_args(name, args)?;
                self.create(&args.title, &args.description, args.completed)
                    .await
            }
            "update" => {
                let args: UpdateArgs = parse_args(name, args)?;
                let fields = UpdateFields {
                    title: args.title,
                    description: args.description,
                    completed: args.completed,
                };
                self.update(&args.todo_id, &fields).await
            }
            "delete" => {
                let args: TodoIdArgs = parse_args(name, args)?;
                self.delete(&args.todo_id).await
            }
            "list_completed" => self.list_completed().await,
            "list_pending" => self.list_pending().await,
            "mark_complete" => {
                let args: TodoIdArgs = parse_args(name, args)?;
                self.mark_complete(&args.todo_id).await
            }
            "mark_pending" => {
                let args: TodoIdArgs = parse_args(name, args)?;
                self.mark_pending(&args.todo_id).await
            }
            "stats" => self.stats().await,
            _ => Err(ToolFailure(format!("Unknown tool: {name}"))),
        }
    }
}
