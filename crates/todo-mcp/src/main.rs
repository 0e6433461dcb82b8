//! todo-mcp バイナリのエントリポイント
//!
//! stdin/stdout で MCP を話す。ログは stderr へ。

use shared::{init_tracing, LogFormat, McpConfig};
use todo_mcp::{server, TodoClient, TodoTools};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(LogFormat::from_env()?).map_err(|e| anyhow::anyhow!(e))?;

    let config = McpConfig::from_env()?;
    let tools = TodoTools::new(TodoClient::from_config(&config));
    tracing::info!(api_base_url = %config.api_base_url, "todo-mcp starting");

    server::run(&tools, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    Ok(())
}
