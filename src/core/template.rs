//! 占位符替换。
//!
//! 占位符语法固定为 `{` + 至少一个非 `}` 字符 + `}`（等价于正则 `\{[^}]+\}`），
//! 标识符可以包含 `:`、`/`、空格等任意非 `}` 字符，按原样精确匹配。
//! 没有转义机制，也不会对替换进去的值再次展开。

use std::collections::HashMap;

/// 模板切分后的片段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder {
        /// 含花括号的完整 token
        token: &'a str,
        /// 花括号之间的标识符
        ident: &'a str,
    },
}

/// 从左到右切分：遇到 `{` 就找下一个 `}`，中间至少一个字符才算占位符。
pub fn tokenize(input: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while let Some(rel) = input[pos..].find('{') {
        let open = pos + rel;
        let body_start = open + 1;
        match input[body_start..].find('}') {
            // 后面再没有 `}`，剩余部分都是字面量
            None => break,
            // `{}` 不是占位符，从 `}` 处继续找
            Some(0) => pos = body_start,
            Some(len) => {
                let close = body_start + len;
                if literal_start < open {
                    segments.push(Segment::Literal(&input[literal_start..open]));
                }
                segments.push(Segment::Placeholder {
                    token: &input[open..=close],
                    ident: &input[body_start..close],
                });
                pos = close + 1;
                literal_start = pos;
            }
        }
    }

    if literal_start < input.len() {
        segments.push(Segment::Literal(&input[literal_start..]));
    }
    segments
}

/// 用当前选择替换模板中的占位符，没有绑定的占位符原样保留。
pub fn substitute(pattern: &str, selection: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(pattern.len());
    for segment in tokenize(pattern) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder { token, ident } => match selection.get(ident) {
                Some(value) => out.push_str(value),
                None => out.push_str(token),
            },
        }
    }
    out
}

/// 结果里是否还有未填充的占位符
pub fn has_unfilled(result: &str) -> bool {
    tokenize(result)
        .iter()
        .any(|s| matches!(s, Segment::Placeholder { .. }))
}

/// 模板引用的所有标识符（按出现顺序，可能重复）
pub fn identifiers(pattern: &str) -> Vec<&str> {
    tokenize(pattern)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Placeholder { ident, .. } => Some(ident),
            Segment::Literal(_) => None,
        })
        .collect()
}
