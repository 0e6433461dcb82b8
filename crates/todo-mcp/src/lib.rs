//! todo-api の操作を MCP ツールとして公開するアダプタ
//!
//! 各ツール呼び出しは todo-api への HTTP リクエストに変換され、
//! 成功時はレスポンスの JSON をそのまま、失敗時は `{"error": ...}` を返す。

pub mod client;
pub mod server;
pub mod tools;
pub mod types;

pub use client::{ClientError, CreateTodoRequest, TodoClient, UpdateFields};
pub use tools::{ToolFailure, ToolOutcome, TodoTools};
