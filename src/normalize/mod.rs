//! 上游响应的归一化层。
//!
//! 上游 API 的响应结构并不稳定：同一个字段可能出现在多个不同的名字下，
//! 列表也可能被包在多种不同的外层结构里。这个模块把这些猜测集中在一处，
//! 并把字段优先级写成有序的声明式表格，新增一个上游字段只需修改表格。

pub mod envelope;
pub mod episode;
pub mod identifier;
pub mod item;
pub mod playback;

use serde_json::Value;

/// 按顺序在 `fields` 中查找第一个非空字符串值。
pub(crate) fn first_non_empty_str<'a>(raw: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|field| raw.get(*field))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// 按 JavaScript `parseInt` 的宽松语义把一个值解析成整数。
///
/// 字符串取其中第一段连续数字，浮点数向零截断，其它类型返回 `None`。
pub(crate) fn loose_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loose_int() {
        assert_eq!(loose_int(&json!(3)), Some(3));
        assert_eq!(loose_int(&json!(3.9)), Some(3));
        assert_eq!(loose_int(&json!("EP 12")), Some(12));
        assert_eq!(loose_int(&json!("12-13")), Some(12));
        assert_eq!(loose_int(&json!("tanpa angka")), None);
        assert_eq!(loose_int(&json!(null)), None);
        assert_eq!(loose_int(&json!([1])), None);
    }

    #[test]
    fn test_first_non_empty_str_skips_blank_and_non_string() {
        let raw = json!({"title": "  ", "name": 5, "bookName": "Cinta"});
        assert_eq!(
            first_non_empty_str(&raw, &["title", "name", "bookName"]),
            Some("Cinta")
        );
        assert_eq!(first_non_empty_str(&raw, &["missing"]), None);
    }
}
