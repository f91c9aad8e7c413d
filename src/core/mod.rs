pub mod selection;
pub mod template;
pub mod url;
pub mod validate;
pub mod value;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PanelError, Result};
use crate::models::{Configuration, NormalizedValue, Project, Template, TemplateKind};
use crate::storage::Storage;
use selection::Selections;
use template::{has_unfilled, substitute};
use self::url::normalize_url;
use value::usable_values;

/// 单个模板的渲染结果
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Preview {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub text: String,
    pub unfilled: bool,
}

/// 渲染单个模板：替换 → url 类型再清理 → 检测未填充占位符
pub fn render_template(template: &Template, selection: &HashMap<String, String>) -> Preview {
    let substituted = substitute(&template.pattern, selection);
    let text = match template.kind {
        TemplateKind::Url => normalize_url(&substituted),
        TemplateKind::Str => substituted,
    };
    let unfilled = has_unfilled(&text);
    Preview {
        name: template.name.clone(),
        kind: template.kind,
        text,
        unfilled,
    }
}

/// 面板状态：当前配置 + 每个项目的选择。
/// 加载失败时保留错误信息用于展示，而不是直接退出。
pub struct Panel {
    config_path: PathBuf,
    storage: Option<Storage>,
    load_error: Option<String>,
    selections: Selections,
}

impl Panel {
    pub fn new(config_path: &Path) -> Self {
        let mut panel = Self {
            config_path: config_path.to_path_buf(),
            storage: None,
            load_error: None,
            selections: Selections::new(),
        };
        panel.load();
        panel
    }

    /// 配置整体重新加载，所有选择清空，下次渲染重新初始化
    pub fn reload(&mut self) {
        self.selections.reset_all();
        self.load();
        tracing::info!("config reloaded from {:?}", self.config_path);
    }

    fn load(&mut self) {
        match Storage::load(&self.config_path) {
            Ok(storage) => {
                self.storage = Some(storage);
                self.load_error = None;
            }
            Err(e) => {
                self.storage = None;
                self.load_error = Some(e.to_string());
            }
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    pub fn configuration(&self) -> Option<&Configuration> {
        self.storage.as_ref().map(|s| s.config())
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn projects(&self) -> &[Project] {
        self.configuration()
            .map(|c| c.projects.as_slice())
            .unwrap_or(&[])
    }

    pub fn project(&self, index: usize) -> Result<&Project> {
        if let Some(err) = &self.load_error {
            return Err(PanelError::NotLoaded(err.clone()));
        }
        self.projects()
            .get(index)
            .ok_or_else(|| PanelError::ProjectNotFound(format!("#{}", index)))
    }

    /// 按名字找项目，返回索引
    pub fn find_project(&self, name: &str) -> Result<usize> {
        self.projects()
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| PanelError::ProjectNotFound(name.to_string()))
    }

    /// 某个环境的可用候选值
    pub fn environment_values(
        &self,
        project_index: usize,
        env_name: &str,
    ) -> Result<Vec<NormalizedValue>> {
        let env = self
            .project(project_index)?
            .env(env_name)
            .ok_or_else(|| PanelError::EnvironmentNotFound(env_name.to_string()))?;
        Ok(usable_values(&env.values))
    }

    /// 当前选择，第一次访问时初始化
    pub fn selection(&mut self, project_index: usize) -> Result<&HashMap<String, String>> {
        self.seed(project_index)?;
        self.selections
            .get(project_index)
            .ok_or_else(|| PanelError::ProjectNotFound(format!("#{}", project_index)))
    }

    pub fn selected(&mut self, project_index: usize, env_name: &str) -> Result<Option<String>> {
        self.seed(project_index)?;
        Ok(self
            .selections
            .selected(project_index, env_name)
            .map(|s| s.to_string()))
    }

    fn seed(&mut self, project_index: usize) -> Result<()> {
        self.project(project_index)?;
        if let Some(project) = self
            .storage
            .as_ref()
            .and_then(|s| s.config().projects.get(project_index))
        {
            self.selections.seed(project_index, project);
        }
        Ok(())
    }

    /// 用户选择某个值，值必须在该环境的候选列表中
    pub fn select(&mut self, project_index: usize, env_name: &str, value: &str) -> Result<()> {
        let values = self.environment_values(project_index, env_name)?;
        if !values.iter().any(|v| v.value == value) {
            return Err(PanelError::ValueNotFound(format!("{}={}", env_name, value)));
        }
        self.seed(project_index)?;
        self.selections.set(project_index, env_name, value);
        tracing::debug!("project #{} selected {}={}", project_index, env_name, value);
        Ok(())
    }

    /// 在候选值之间循环切换（终端里代替下拉框），返回新的值
    pub fn cycle_value(
        &mut self,
        project_index: usize,
        env_name: &str,
        step: isize,
    ) -> Result<String> {
        let values = self.environment_values(project_index, env_name)?;
        if values.is_empty() {
            return Err(PanelError::ValueNotFound(env_name.to_string()));
        }
        let current = self.selected(project_index, env_name)?;
        let len = values.len() as isize;
        let next = match current.and_then(|c| values.iter().position(|v| v.value == c)) {
            Some(idx) => (idx as isize + step).rem_euclid(len) as usize,
            None => 0,
        };
        let value = values[next].value.clone();
        self.select(project_index, env_name, &value)?;
        Ok(value)
    }

    /// 渲染项目下所有模板
    pub fn render_project(&mut self, project_index: usize) -> Result<Vec<Preview>> {
        self.seed(project_index)?;
        let project = self.project(project_index)?;
        let selection = self
            .selections
            .get(project_index)
            .ok_or_else(|| PanelError::ProjectNotFound(format!("#{}", project_index)))?;
        Ok(project
            .patterns
            .iter()
            .map(|t| render_template(t, selection))
            .collect())
    }
}

/// 不修改面板状态的渲染：以每个环境的第一个可用值为底，覆盖传入的值。
/// 传入未知的环境名返回错误。
pub fn render_with(
    project: &Project,
    overrides: &HashMap<String, String>,
) -> Result<(HashMap<String, String>, Vec<Preview>)> {
    if let Some(unknown) = overrides.keys().find(|k| project.env(k).is_none()) {
        return Err(PanelError::EnvironmentNotFound(unknown.clone()));
    }

    let mut selections = Selections::new();
    selections.seed(0, project);
    for (name, value) in overrides {
        selections.set(0, name, value.clone());
    }
    let selection = selections.get(0).cloned().unwrap_or_default();
    let previews = project
        .patterns
        .iter()
        .map(|t| render_template(t, &selection))
        .collect();
    Ok((selection, previews))
}
