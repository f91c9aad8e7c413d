use crate::models::{NormalizedValue, RawValue};

/// 原始候选值 → `{ value, label }`。
/// mapping 优先取 `value`，没有则退回 `name`；两者都没有则返回 None。
/// label 只取非空的 `name`。
pub fn normalize_value(raw: &RawValue) -> Option<NormalizedValue> {
    match raw {
        RawValue::Null => None,
        RawValue::Scalar(s) => Some(NormalizedValue {
            value: s.clone(),
            label: None,
        }),
        RawValue::Labeled { value, name } => {
            let value = value.as_ref().or(name.as_ref())?.clone();
            let label = name.as_ref().filter(|n| !n.is_empty()).cloned();
            Some(NormalizedValue { value, label })
        }
    }
}

/// 过滤掉无法归一化的条目，保持原有顺序
pub fn usable_values(values: &[RawValue]) -> Vec<NormalizedValue> {
    values.iter().filter_map(normalize_value).collect()
}

/// 第一个可用值（用于初始化选择）
pub fn first_usable(values: &[RawValue]) -> Option<NormalizedValue> {
    values.iter().find_map(normalize_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labeled(value: Option<&str>, name: Option<&str>) -> RawValue {
        RawValue::Labeled {
            value: value.map(|s| s.to_string()),
            name: name.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_labeled_value() {
        let v =
            normalize_value(&labeled(Some("test.example.com"), Some("Test environment"))).unwrap();
        assert_eq!(v.value, "test.example.com");
        assert_eq!(v.label.as_deref(), Some("Test environment"));
    }

    #[test]
    fn test_scalar_value() {
        let v = normalize_value(&RawValue::Scalar("example.com".to_string())).unwrap();
        assert_eq!(v.value, "example.com");
        assert!(v.label.is_none());
    }

    #[test]
    fn test_name_only_becomes_value_and_label() {
        let v = normalize_value(&labeled(None, Some("prod"))).unwrap();
        assert_eq!(v.value, "prod");
        assert_eq!(v.label.as_deref(), Some("prod"));
    }

    #[test]
    fn test_empty_name_is_not_a_label() {
        let v = normalize_value(&labeled(Some("x"), Some(""))).unwrap();
        assert_eq!(v.value, "x");
        assert!(v.label.is_none());
    }

    #[test]
    fn test_empty_value_is_still_usable() {
        let v = normalize_value(&labeled(Some(""), Some("none"))).unwrap();
        assert_eq!(v.value, "");
        assert_eq!(v.label.as_deref(), Some("none"));
    }

    #[test]
    fn test_absent() {
        assert!(normalize_value(&RawValue::Null).is_none());
        assert!(normalize_value(&labeled(None, None)).is_none());
    }

    #[test]
    fn test_usable_values_keeps_order() {
        let raw = vec![
            labeled(None, None),
            RawValue::Scalar("a".to_string()),
            RawValue::Null,
            labeled(Some("b"), Some("B")),
        ];
        let values = usable_values(&raw);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].value, "a");
        assert_eq!(values[1].value, "b");
        assert_eq!(first_usable(&raw).unwrap().value, "a");
    }

    #[test]
    fn test_first_usable_none() {
        assert!(first_usable(&[RawValue::Null, labeled(None, None)]).is_none());
        assert!(first_usable(&[]).is_none());
    }

    proptest! {
        #[test]
        fn prop_renormalize_is_identity(
            value in ".*",
            label in proptest::option::of(".+"),
        ) {
            let v = NormalizedValue { value, label };
            let again = normalize_value(&RawValue::Labeled {
                value: Some(v.value.clone()),
                name: v.label.clone(),
            });
            prop_assert_eq!(again, Some(v));
        }
    }
}
