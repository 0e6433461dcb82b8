//! MCP stdio サーバ
//!
//! 1 行 1 メッセージの JSON-RPC を読み、ツールへ振り分けて結果を書き戻す。
//! メッセージは受信順に 1 件ずつ処理する。

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::tools::{self, TodoTools};
use crate::types::{
    JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolResult, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};

pub const SERVER_NAME: &str = "todo-mcp-server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// 入力が閉じるまでリクエストを処理する
pub async fn run<R, W>(tools: &TodoTools, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(message) => handle_message(message, tools).await,
            Err(e) => {
                warn!(error = %e, "unparsable message");
                Some(JsonRpcResponse::error(None, PARSE_ERROR, e.to_string()))
            }
        };

        if let Some(response) = response {
            write_response(&mut writer, &response).await?;
        }
    }

    debug!("input closed, shutting down");
    Ok(())
}

/// JSON としては読めたメッセージを処理する。リクエストの形をしていなければ Invalid Request。
async fn handle_message(message: Value, tools: &TodoTools) -> Option<JsonRpcResponse> {
    let id = message.get("id").filter(|id| !id.is_null()).cloned();

    match serde_json::from_value::<JsonRpcRequest>(message) {
        Ok(request) => handle_request(&request, tools).await,
        Err(e) => {
            warn!(error = %e, "invalid request");
            Some(JsonRpcResponse::error(id, INVALID_REQUEST, e.to_string()))
        }
    }
}

/// 1 件のリクエストを処理する。通知（id なし）には応答しない。
pub async fn handle_request(req: &JsonRpcRequest, tools: &TodoTools) -> Option<JsonRpcResponse> {
    let Some(id) = req.id.clone() else {
        debug!(method = %req.method, "notification received");
        return None;
    };
    let id = Some(id);

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(id),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tools::list_tools() })),
        "tools/call" => handle_tools_call(id, &req.params, tools).await,
        _ => JsonRpcResponse::error(
            id,
            METHOD_NOT_FOUND,
            format!("Unknown method: {}", req.method),
        ),
    };
    Some(response)
}

fn handle_initialize(id: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            }
        }),
    )
}

async fn handle_tools_call(id: Option<Value>, params: &Value, tools: &TodoTools) -> JsonRpcResponse {
    let call: ToolCallParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
    };

    let outcome = tools.call(&call.name, &call.arguments).await;
    match serde_json::to_value(ToolResult::from_outcome(outcome)) {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await
}
