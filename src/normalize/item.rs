//! 目录条目映射。
//!
//! 把上游的原始条目映射为 [`CatalogItem`]，每个字段都按下面的优先级表依次回退，
//! 命中第一个即停止，不做合并。每个字段都有最终兜底值，因此映射不会失败。

use serde_json::Value;

use crate::{
    config::{DEFAULT_GENRE, PLACEHOLDER_COVER, PLACEHOLDER_TITLE},
    model::catalog::CatalogItem,
    normalize::{episode::extract_marker_field, first_non_empty_str, identifier},
};

/// ID 字段的优先级。
pub(crate) const ID_FIELDS: &[&str] = &[
    "bookId",
    "book_id",
    "id",
    "_id",
    "contentId",
    "dramaId",
    "bookID",
];

/// 标题字段的优先级。
pub(crate) const TITLE_FIELDS: &[&str] = &[
    "title",
    "name",
    "bookName",
    "dramaName",
    "originalTitle",
    "text",
];

/// 封面字段的优先级。
pub(crate) const COVER_FIELDS: &[&str] = &["cover", "image", "poster", "thumbnail", "img"];

/// 简介字段的优先级。
pub(crate) const SYNOPSIS_FIELDS: &[&str] = &[
    "synopsis",
    "description",
    "desc",
    "introduction",
    "info",
    "summary",
];

const EXCLUSIVE_FIELDS: &[&str] = &["exclusive", "isExclusive"];

/// 使用默认占位图映射单个条目。
pub fn map_item(raw: &Value) -> CatalogItem {
    map_item_with_placeholder(raw, PLACEHOLDER_COVER)
}

/// 映射单个条目，封面缺失时使用 `placeholder_cover`。
pub fn map_item_with_placeholder(raw: &Value, placeholder_cover: &str) -> CatalogItem {
    CatalogItem {
        id: extract_id(raw),
        title: first_non_empty_str(raw, TITLE_FIELDS)
            .unwrap_or(PLACEHOLDER_TITLE)
            .to_string(),
        cover: first_non_empty_str(raw, COVER_FIELDS)
            .unwrap_or(placeholder_cover)
            .to_string(),
        genre: extract_genre(raw),
        episode_number: extract_marker_field(raw),
        synopsis: first_non_empty_str(raw, SYNOPSIS_FIELDS).map(clean_synopsis),
        exclusive: EXCLUSIVE_FIELDS
            .iter()
            .any(|field| raw.get(*field).and_then(Value::as_bool).unwrap_or(false)),
    }
}

/// 映射整个列表。没有有效 ID 的条目会被保留（不可点击），以保证列表完整。
pub fn map_items(list: &[Value], placeholder_cover: &str) -> Vec<CatalogItem> {
    let items: Vec<CatalogItem> = list
        .iter()
        .filter(|raw| raw.is_object())
        .map(|raw| map_item_with_placeholder(raw, placeholder_cover))
        .collect();

    let unclickable = items.iter().filter(|item| !item.is_clickable()).count();
    if unclickable > 0 {
        tracing::debug!(
            "[Mapper] {} 个条目没有有效 ID，将以不可点击的形式展示。",
            unclickable
        );
    }
    items
}

/// 按优先级取出第一个有效的 ID。
pub fn extract_id(raw: &Value) -> Option<String> {
    ID_FIELDS
        .iter()
        .filter_map(|field| raw.get(*field))
        .find_map(identifier::normalize)
}

fn extract_genre(raw: &Value) -> String {
    let genre = match raw.get("genre") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    };

    if genre.is_empty() {
        DEFAULT_GENRE.to_string()
    } else {
        genre
    }
}

/// 上游简介里混有字面量 `\n` 和 `<br>`，统一转换为换行。
fn clean_synopsis(text: &str) -> String {
    let mut cleaned = text.replace("\\n", "\n");
    for tag in ["<br/>", "<br />", "<br>", "<BR/>", "<BR />", "<BR>"] {
        cleaned = cleaned.replace(tag, "\n");
    }
    cleaned.trim().to_string()
}
