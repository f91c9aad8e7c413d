use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::core::value::usable_values;
use crate::core::{render_with, Panel, Preview};
use crate::error::PanelError;
use crate::models::NormalizedValue;

/// 共享状态类型
pub type AppState = Arc<RwLock<Panel>>;

// ---- 响应结构体 ----

#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub index: usize,
    pub name: String,
    pub description: Option<String>,
    pub envs: Vec<EnvSummary>,
}

#[derive(Debug, Serialize)]
pub struct EnvSummary {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<NormalizedValue>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub project: String,
    pub selection: HashMap<String, String>,
    pub previews: Vec<Preview>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---- PanelError -> HTTP Response ----

impl IntoResponse for PanelError {
    fn into_response(self) -> Response {
        let status = match &self {
            PanelError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            PanelError::EnvironmentNotFound(_) => StatusCode::BAD_REQUEST,
            PanelError::ValueNotFound(_) => StatusCode::BAD_REQUEST,
            PanelError::NotLoaded(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---- 处理器 ----

/// GET /api/v1/projects
pub async fn list_projects(
    State(panel): State<AppState>,
) -> Result<Json<Vec<ProjectSummary>>, PanelError> {
    let panel = panel.read().await;
    if let Some(err) = panel.load_error() {
        return Err(PanelError::NotLoaded(err.to_string()));
    }

    let projects = panel
        .projects()
        .iter()
        .enumerate()
        .map(|(index, p)| ProjectSummary {
            index,
            name: p.name.clone(),
            description: p.description.clone(),
            envs: p
                .envs
                .iter()
                .map(|e| EnvSummary {
                    name: e.name.clone(),
                    description: e.description.clone(),
                    values: usable_values(&e.values),
                })
                .collect(),
        })
        .collect();
    Ok(Json(projects))
}

/// GET /api/v1/projects/{project}/render?<env>=<value>
///
/// 查询参数覆盖对应环境的选择，未指定的环境取第一个可用值。
/// 每个请求独立计算，不修改面板中的选择。重名项目取第一个。
pub async fn render_project(
    State(panel): State<AppState>,
    Path(project): Path<String>,
    Query(overrides): Query<HashMap<String, String>>,
) -> Result<Json<RenderResponse>, PanelError> {
    let panel = panel.read().await;
    let index = panel.find_project(&project)?;
    render_at(&panel, index, &overrides)
}

/// GET /api/v1/projects/by-index/{index}/render?<env>=<value>
///
/// 按 `list_projects` 返回的 index 定位，重名项目也能单独渲染。
pub async fn render_project_by_index(
    State(panel): State<AppState>,
    Path(index): Path<usize>,
    Query(overrides): Query<HashMap<String, String>>,
) -> Result<Json<RenderResponse>, PanelError> {
    let panel = panel.read().await;
    render_at(&panel, index, &overrides)
}

fn render_at(
    panel: &Panel,
    index: usize,
    overrides: &HashMap<String, String>,
) -> Result<Json<RenderResponse>, PanelError> {
    let proj = panel.project(index)?;
    let (selection, previews) = render_with(proj, overrides)?;
    Ok(Json(RenderResponse {
        project: proj.name.clone(),
        selection,
        previews,
    }))
}
