use serde_yaml::{Mapping, Value};

use crate::error::{PanelError, Result};

/// 校验解析后的 YAML 结构，返回第一个错误（带路径）。
/// 只检查面板依赖的字段，多余字段忽略。
pub fn validate_config(root: &Value) -> Result<()> {
    let root = root
        .as_mapping()
        .ok_or_else(|| invalid("Root must be a YAML object with a \"projects\" key."))?;

    let projects = get(root, "projects")
        .and_then(Value::as_sequence)
        .ok_or_else(|| invalid("Missing required key: \"projects\" (must be an array)."))?;

    for (pi, project) in projects.iter().enumerate() {
        validate_project(pi, project)?;
    }
    Ok(())
}

fn validate_project(pi: usize, project: &Value) -> Result<()> {
    let label = format!("projects[{}]", pi);
    let project = project
        .as_mapping()
        .ok_or_else(|| invalid(format!("{}: must be an object.", label)))?;

    let name = non_empty_str(project, "name")
        .ok_or_else(|| invalid(format!("{}: \"name\" is required (string).", label)))?;

    if let Some(envs) = get(project, "envs") {
        let envs = envs.as_sequence().ok_or_else(|| {
            invalid(format!("{} (\"{}\"): \"envs\" must be an array.", label, name))
        })?;
        for (ei, env) in envs.iter().enumerate() {
            validate_env(&format!("{}.envs[{}]", label, ei), env)?;
        }
    }

    if let Some(patterns) = get(project, "patterns") {
        let patterns = patterns.as_sequence().ok_or_else(|| {
            invalid(format!("{} (\"{}\"): \"patterns\" must be an array.", label, name))
        })?;
        for (pri, pattern) in patterns.iter().enumerate() {
            validate_pattern(&format!("{}.patterns[{}]", label, pri), pattern)?;
        }
    }
    Ok(())
}

fn validate_env(label: &str, env: &Value) -> Result<()> {
    let env = env
        .as_mapping()
        .ok_or_else(|| invalid(format!("{}: must be an object.", label)))?;

    let name = non_empty_str(env, "name")
        .ok_or_else(|| invalid(format!("{}: \"name\" is required (string).", label)))?;

    let values = get(env, "values")
        .and_then(Value::as_sequence)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            invalid(format!(
                "{} (\"{}\"): \"values\" must be a non-empty array.",
                label, name
            ))
        })?;

    for (vi, value) in values.iter().enumerate() {
        match value {
            Value::Null => {
                return Err(invalid(format!(
                    "{}: values[{}] cannot be null or undefined.",
                    label, vi
                )));
            }
            Value::Mapping(map) => {
                if get(map, "value").is_none() && get(map, "name").is_none() {
                    return Err(invalid(format!(
                        "{}: values[{}] object must have \"value\" or \"name\"",
                        label, vi
                    )));
                }
            }
            Value::Sequence(_) => {
                return Err(invalid(format!(
                    "{}: values[{}] must be a scalar or an object.",
                    label, vi
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_pattern(label: &str, pattern: &Value) -> Result<()> {
    let pattern = pattern
        .as_mapping()
        .ok_or_else(|| invalid(format!("{}: must be an object.", label)))?;

    if non_empty_str(pattern, "pattern").is_none() {
        return Err(invalid(format!("{}: \"pattern\" is required (string).", label)));
    }

    match get(pattern, "type") {
        Some(Value::String(t)) if t == "url" || t == "str" => Ok(()),
        other => Err(invalid(format!(
            "{}: \"type\" must be \"url\" or \"str\" (got: {}).",
            label,
            describe(other)
        ))),
    }
}

fn get<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(key)
}

fn non_empty_str<'a>(map: &'a Mapping, key: &str) -> Option<&'a str> {
    get(map, key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// 错误信息里展示实际拿到的值
fn describe(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(v) => serde_json::to_string(v).unwrap_or_else(|_| "?".to_string()),
    }
}

fn invalid(msg: impl Into<String>) -> PanelError {
    PanelError::Validation(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(yaml: &str) -> Result<()> {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        validate_config(&value)
    }

    fn message(yaml: &str) -> String {
        match check(yaml).unwrap_err() {
            PanelError::Validation(msg) => msg,
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        check(crate::storage::DEFAULT_CONFIG_YAML).unwrap();
        check("projects: []\n").unwrap();
        check("projects:\n  - name: bare\n").unwrap();
    }

    #[test]
    fn test_root_must_be_mapping() {
        assert!(message("- a\n- b\n").contains("Root must be a YAML object"));
        assert!(message("other: 1\n").contains("\"projects\""));
    }

    #[test]
    fn test_project_name_required() {
        let msg = message("projects:\n  - description: x\n");
        assert_eq!(msg, "projects[0]: \"name\" is required (string).");
    }

    #[test]
    fn test_envs_must_be_array() {
        let msg = message("projects:\n  - name: p\n    envs: nope\n");
        assert_eq!(msg, "projects[0] (\"p\"): \"envs\" must be an array.");
    }

    #[test]
    fn test_env_values_non_empty() {
        let msg = message(
            "projects:\n  - name: p\n    envs:\n      - name: host\n        values: []\n",
        );
        assert_eq!(
            msg,
            "projects[0].envs[0] (\"host\"): \"values\" must be a non-empty array."
        );
    }

    #[test]
    fn test_env_value_null() {
        let msg = message(
            "projects:\n  - name: p\n    envs:\n      - name: host\n        values:\n          - a\n          - ~\n",
        );
        assert_eq!(msg, "projects[0].envs[0]: values[1] cannot be null or undefined.");
    }

    #[test]
    fn test_env_value_object_needs_value_or_name() {
        let msg = message(
            "projects:\n  - name: p\n    envs:\n      - name: host\n        values:\n          - label: x\n",
        );
        assert_eq!(
            msg,
            "projects[0].envs[0]: values[0] object must have \"value\" or \"name\""
        );
    }

    #[test]
    fn test_pattern_type() {
        let msg = message(
            "projects:\n  - name: p\n    patterns:\n      - pattern: \"{a}\"\n        type: html\n",
        );
        assert_eq!(
            msg,
            "projects[0].patterns[0]: \"type\" must be \"url\" or \"str\" (got: \"html\")."
        );

        let msg = message("projects:\n  - name: p\n    patterns:\n      - pattern: \"{a}\"\n");
        assert!(msg.ends_with("(got: undefined)."));
    }

    #[test]
    fn test_pattern_required() {
        let msg = message("projects:\n  - name: p\n    patterns:\n      - type: url\n");
        assert_eq!(msg, "projects[0].patterns[0]: \"pattern\" is required (string).");
    }
}
