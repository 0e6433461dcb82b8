//! todo-api バイナリのエントリポイント

use anyhow::Context;
use shared::{init_tracing, ApiConfig, LogFormat};
use todo_api::{app, shutdown::shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(LogFormat::from_env()?).map_err(|e| anyhow::anyhow!(e))?;

    let config = ApiConfig::from_env()?;
    let addr = config.socket_addr();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server starting");

    // コレクションはここで 1 つだけ生成され、プロセス終了まで生きる
    axum::serve(listener, app())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}
