use std::collections::HashMap;

use crate::core::value::first_usable;
use crate::models::Project;

/// 每个项目（按索引）的当前选择：环境名 → 选中的值。
/// 只在整体重新加载配置时清空，重新渲染不会丢失用户的选择。
#[derive(Debug, Clone, Default)]
pub struct Selections {
    projects: Vec<HashMap<String, String>>,
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为还没有选择的环境绑定第一个可用值；已有选择保持不变。
    pub fn seed(&mut self, project_index: usize, project: &Project) {
        let selection = self.entry(project_index);
        for env in &project.envs {
            if selection.contains_key(&env.name) {
                continue;
            }
            if let Some(first) = first_usable(&env.values) {
                selection.insert(env.name.clone(), first.value);
            }
        }
    }

    /// 覆盖某个环境的选择
    pub fn set(&mut self, project_index: usize, env_name: &str, value: impl Into<String>) {
        self.entry(project_index)
            .insert(env_name.to_string(), value.into());
    }

    /// 清空所有项目的选择
    pub fn reset_all(&mut self) {
        self.projects.clear();
    }

    pub fn get(&self, project_index: usize) -> Option<&HashMap<String, String>> {
        self.projects.get(project_index)
    }

    pub fn selected(&self, project_index: usize, env_name: &str) -> Option<&str> {
        self.get(project_index)
            .and_then(|s| s.get(env_name))
            .map(|v| v.as_str())
    }

    fn entry(&mut self, project_index: usize) -> &mut HashMap<String, String> {
        if self.projects.len() <= project_index {
            self.projects.resize_with(project_index + 1, HashMap::new);
        }
        &mut self.projects[project_index]
    }
}
