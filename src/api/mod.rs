mod handlers;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::Panel;
use crate::error::Result;
use crate::storage::watch::ConfigWatcher;

pub use handlers::{AppState, ErrorResponse, ProjectSummary, RenderResponse};
pub use routes::create_router;

/// 启动只读 HTTP 服务，配置文件变化时自动重新加载
pub async fn serve(panel: Panel, addr: SocketAddr) -> Result<()> {
    let config_path = panel.config_path().to_path_buf();
    let state: AppState = Arc::new(RwLock::new(panel));

    let watch_state = state.clone();
    let watcher = ConfigWatcher::spawn(&config_path, move || {
        // 回调运行在 config-watch 线程上，不在 tokio 运行时内
        watch_state.blocking_write().reload();
    })?;
    tracing::info!("reloading config on changes in {:?}", watcher.dir());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("serving rendered patterns on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
