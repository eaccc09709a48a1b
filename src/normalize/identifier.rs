//! 标识符归一化。
//!
//! 把上游各种形态的原始 ID（数字、字符串、带空白的字符串……）转换成一个经过校验的
//! 字符串，或者直接拒绝。纯函数，不会失败。

use serde_json::Value;

/// 被视为"没有 ID"的字面量。
const REJECTED_TOKENS: &[&str] = &["null", "undefined", "0"];

/// 将任意原始值归一化为有效的 ID。
///
/// # 返回
/// 通过校验时返回去除首尾空白后的字符串，否则返回 `None`。
pub fn normalize(raw: &Value) -> Option<String> {
    let text = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(n),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    normalize_str(&text)
}

/// 与 [`normalize`] 相同，但输入已经是字符串（例如 URL 查询参数）。
pub fn normalize_str(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || REJECTED_TOKENS.contains(&trimmed) {
        return None;
    }
    is_valid(trimmed).then(|| trimmed.to_string())
}

/// 判断一个 ID 是否可用于跳转详情页。
///
/// 非数字的字符串 ID 只要非空即可；能解析为数字的 ID 必须大于 0。
pub fn is_valid(id: &str) -> bool {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
        return false;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => n.is_nan() || n > 0.0,
        Err(_) => true,
    }
}

/// 整数值的浮点数（如 `5.0`）按整数输出，与上游网页的表现保持一致。
fn number_to_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejected_values() {
        for raw in [
            json!(""),
            json!("0"),
            json!("null"),
            json!("undefined"),
            json!("   "),
            json!(" \t\n"),
            json!(-3),
            json!("-3"),
            json!(0),
            json!(0.0),
            json!(null),
            json!({"id": 1}),
            json!([1]),
        ] {
            assert_eq!(normalize(&raw), None, "应当拒绝 {raw}");
        }
    }

    #[test]
    fn test_accepted_values() {
        assert_eq!(normalize(&json!(5)), Some("5".to_string()));
        assert_eq!(normalize(&json!(5.0)), Some("5".to_string()));
        assert_eq!(normalize(&json!("  42 ")), Some("42".to_string()));
        assert_eq!(normalize(&json!("abc-123")), Some("abc-123".to_string()));
        assert_eq!(
            normalize(&json!("41000102341")),
            Some("41000102341".to_string())
        );
    }

    #[test]
    fn test_is_valid_only_rejects_non_positive_numbers() {
        assert!(is_valid("12"));
        assert!(is_valid("x0"));
        assert!(!is_valid("-1"));
        assert!(!is_valid("0.0"));
        assert!(!is_valid(""));
        assert!(!is_valid("undefined"));
    }
}
