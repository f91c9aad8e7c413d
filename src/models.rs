use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

/// 完整的面板配置，从 YAML 文件加载
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Configuration {
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// 项目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub envs: Vec<Environment>,
    #[serde(default)]
    pub patterns: Vec<Template>,
}

impl Project {
    pub fn env(&self, name: &str) -> Option<&Environment> {
        self.envs.iter().find(|e| e.name == name)
    }
}

/// 环境变量：名字 + 候选值列表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub values: Vec<RawValue>,
}

/// 模板类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Url,
    Str,
}

impl TemplateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKind::Url => "url",
            TemplateKind::Str => "str",
        }
    }
}

/// 模板（配置里叫 pattern）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub pattern: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// 配置中的原始候选值。
/// 标量（字符串、数字、布尔）统一保存为字符串形式；
/// mapping 只读取 `value` / `name` 两个键，其余忽略。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawValue {
    Scalar(String),
    Labeled {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Null,
}

/// 归一化之后的值：实际替换用的 value + 可选的显示标签
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedValue {
    pub value: String,
    pub label: Option<String>,
}

impl NormalizedValue {
    /// 下拉列表中展示的文本
    pub fn display(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({})", label, self.value),
            None => self.value.clone(),
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawValueVisitor)
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar or a mapping with `value` and/or `name`")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Scalar(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Scalar(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Scalar(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Scalar(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Scalar(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Scalar(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<RawValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawValue::deserialize(deserializer)
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<RawValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut value = None;
        let mut name = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                // `value: null` 视为没有 value 字段，而不是字符串 "null"
                "value" => value = map.next_value::<Option<ScalarText>>()?.map(|s| s.0),
                "name" => name = map.next_value::<Option<ScalarText>>()?.map(|s| s.0),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(RawValue::Labeled { value, name })
    }
}

/// mapping 内部 `value` / `name` 字段：任意标量转字符串
struct ScalarText(String);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScalarTextVisitor;

        impl<'de> Visitor<'de> for ScalarTextVisitor {
            type Value = ScalarText;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<ScalarText, E> {
                Ok(ScalarText(v))
            }
        }

        deserializer.deserialize_any(ScalarTextVisitor)
    }
}
