use axum::routing::get;
use axum::Router;

use super::handlers::{list_projects, render_project, render_project_by_index, AppState};

/// 创建 API 路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/projects", get(list_projects))
        .route("/api/v1/projects/{project}/render", get(render_project))
        .route(
            "/api/v1/projects/by-index/{index}/render",
            get(render_project_by_index),
        )
        .with_state(state)
}
