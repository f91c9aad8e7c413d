use std::path::Path;

use crate::core::template::identifiers;
use crate::core::validate::validate_config;
use crate::error::{PanelError, Result};
use crate::models::Configuration;
use crate::storage::DEFAULT_CONFIG_YAML;

/// 存储引擎：YAML 文件 → 校验 → Configuration
pub struct Storage {
    config: Configuration,
    is_default: bool,
}

impl Storage {
    /// 从 YAML 文件加载配置。文件不存在则使用内置示例配置；
    /// 解析或校验失败返回错误，由调用方决定如何展示。
    pub fn load(file_path: &Path) -> Result<Self> {
        let (raw, is_default) = if file_path.exists() {
            (std::fs::read_to_string(file_path)?, false)
        } else {
            tracing::info!("config file {:?} not found, using built-in example", file_path);
            (DEFAULT_CONFIG_YAML.to_string(), true)
        };

        let config = parse_config(&raw).inspect_err(|e| {
            tracing::warn!("failed to load config {:?}: {}", file_path, e);
        })?;

        tracing::debug!(
            "loaded {} project(s) from {:?}",
            config.projects.len(),
            file_path
        );
        warn_unknown_placeholders(&config);

        Ok(Self { config, is_default })
    }

    /// 把内置示例配置写入文件；已存在时需要 force
    pub fn write_default(file_path: &Path, force: bool) -> Result<()> {
        if file_path.exists() && !force {
            return Err(PanelError::AlreadyExists(file_path.display().to_string()));
        }

        // 确保父目录存在
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(file_path, DEFAULT_CONFIG_YAML)?;
        Ok(())
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// 当前是否是内置示例配置（文件不存在）
    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

/// 模板里引用了不存在的环境名时记一条日志，渲染时这些占位符会原样保留
fn warn_unknown_placeholders(config: &Configuration) {
    for project in &config.projects {
        for template in &project.patterns {
            for ident in identifiers(&template.pattern) {
                if project.env(ident).is_none() {
                    tracing::debug!(
                        "project {:?}: pattern {:?} references unknown env {:?}",
                        project.name,
                        template.pattern,
                        ident
                    );
                }
            }
        }
    }
}

/// YAML 文本 → 校验 → 强类型配置。空文档视为没有项目。
pub fn parse_config(raw: &str) -> Result<Configuration> {
    if raw.trim().is_empty() {
        return Ok(Configuration::default());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(raw)?;
    validate_config(&value)?;
    Ok(serde_yaml::from_value(value)?)
}
