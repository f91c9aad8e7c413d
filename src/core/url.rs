use std::sync::LazyLock;

use regex::Regex;

static DUPLICATE_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^:])/{2,}").expect("valid regex"));
static DUPLICATE_AMPERSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&{2,}").expect("valid regex"));
static QUERY_LEADING_AMPERSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?&+").expect("valid regex"));

/// 清理替换后 URL 中空值留下的痕迹，按顺序：
/// 1. 合并重复的 `/`（紧跟在 `:` 后面的不动，保留 `://`）
/// 2. 合并重复的 `&`
/// 3. 去掉 `?` 后面紧跟的 `&`
/// 4. 去掉结尾的 `&`
/// 5. 去掉结尾的 `?`
///
/// 4、5 两步反复执行直到结尾稳定（`a&?` → `a`），保证幂等。
pub fn normalize_url(s: &str) -> String {
    let s = DUPLICATE_SLASHES.replace_all(s, "${1}/");
    let s = DUPLICATE_AMPERSANDS.replace_all(&s, "&");
    let s = QUERY_LEADING_AMPERSANDS.replace_all(&s, "?");

    let mut tail = s.as_ref();
    loop {
        let trimmed = tail.trim_end_matches('&');
        let trimmed = trimmed.strip_suffix('?').unwrap_or(trimmed);
        if trimmed.len() == tail.len() {
            break;
        }
        tail = trimmed;
    }
    tail.to_string()
}
