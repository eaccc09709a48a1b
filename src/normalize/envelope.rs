//! 外层结构解包。
//!
//! 从结构未知的 API 响应中取出真正需要的列表或单个对象。
//! 查找顺序是固定的优先级：同时存在多个数组时总是命中排在最前面的形态，
//! 扫描对象值时命中第一个数组而不是最长的数组。

use serde_json::Value;

use crate::normalize::{identifier, item::ID_FIELDS};

/// 用于判断一个对象"看起来像一部剧"的字段。
const ENTITY_HINT_FIELDS: &[&str] = &["title", "name", "bookName", "cover", "image"];

/// `data` 下可能直接挂着单个实体的字段。
const NESTED_ENTITY_FIELDS: &[&str] = &["book", "drama"];

/// 顶层可能直接挂着剧集列表的字段。
const EPISODE_LIST_FIELDS: &[&str] = &["chapters", "episodes"];

/// 从响应中取出列表。
///
/// 依次尝试：
/// 1. 响应本身是数组；
/// 2. `data` 是数组；
/// 3. `data.list` 是数组；
/// 4. `list` 是数组；
/// 5. `data` 是对象时，按键的原始顺序返回第一个数组值；
/// 6. 以上都不满足时返回空切片。
pub fn unwrap_list(payload: &Value) -> &[Value] {
    if let Some(list) = payload.as_array() {
        return list;
    }

    let data = payload.get("data");

    if let Some(list) = data.and_then(Value::as_array) {
        return list;
    }
    if let Some(list) = data.and_then(|d| d.get("list")).and_then(Value::as_array) {
        return list;
    }
    if let Some(list) = payload.get("list").and_then(Value::as_array) {
        return list;
    }
    if let Some(list) = data
        .and_then(Value::as_object)
        .and_then(|obj| obj.values().find_map(Value::as_array))
    {
        return list;
    }

    &[]
}

/// 从响应中取出剧集列表。
///
/// 先按 [`unwrap_list`] 查找，找不到时再尝试顶层的 `chapters` / `episodes`。
pub fn unwrap_episode_list(payload: &Value) -> &[Value] {
    let list = unwrap_list(payload);
    if !list.is_empty() {
        return list;
    }
    EPISODE_LIST_FIELDS
        .iter()
        .filter_map(|field| payload.get(*field))
        .find_map(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// 从详情响应中取出单个实体。
///
/// 命中数组形态时返回第一个元素。
pub fn unwrap_single(payload: &Value) -> Option<&Value> {
    match locate_single(payload)? {
        SingleShape::List(list) => list.first(),
        SingleShape::Object(obj) => Some(obj),
    }
}

/// 与 [`unwrap_single`] 相同，但命中数组形态时优先返回 ID 与 `id` 相同的元素。
pub fn unwrap_single_matching<'a>(payload: &'a Value, id: &str) -> Option<&'a Value> {
    match locate_single(payload)? {
        SingleShape::List(list) => list
            .iter()
            .find(|candidate| has_matching_id(candidate, id))
            .or_else(|| list.first()),
        SingleShape::Object(obj) => Some(obj),
    }
}

/// 判断一个原始条目的任一 ID 字段是否与 `id` 相同。
pub fn has_matching_id(raw: &Value, id: &str) -> bool {
    let wanted = id.trim();
    ID_FIELDS
        .iter()
        .filter_map(|field| raw.get(*field))
        .filter_map(identifier::normalize)
        .any(|candidate| candidate == wanted)
}

/// 判断一个值是否为带有标题类字段的对象。
pub fn looks_like_entity(value: &Value) -> bool {
    value.is_object()
        && ENTITY_HINT_FIELDS
            .iter()
            .any(|field| value.get(*field).is_some_and(is_truthy))
}

enum SingleShape<'a> {
    List(&'a [Value]),
    Object(&'a Value),
}

fn non_empty_array(value: Option<&Value>) -> Option<&[Value]> {
    value
        .and_then(Value::as_array)
        .filter(|list| !list.is_empty())
        .map(Vec::as_slice)
}

fn nested_object<'a>(parent: &'a Value) -> Option<&'a Value> {
    NESTED_ENTITY_FIELDS
        .iter()
        .filter_map(|field| parent.get(*field))
        .find(|value| value.is_object())
}

fn locate_single(payload: &Value) -> Option<SingleShape<'_>> {
    if let Some(data) = payload.get("data") {
        if let Some(list) = non_empty_array(Some(data)) {
            return Some(SingleShape::List(list));
        }
        for field in NESTED_ENTITY_FIELDS.iter().chain(&["list"]) {
            if let Some(list) = non_empty_array(data.get(*field)) {
                return Some(SingleShape::List(list));
            }
        }
        if looks_like_entity(data) {
            return Some(SingleShape::Object(data));
        }
        if let Some(obj) = nested_object(data) {
            return Some(SingleShape::Object(obj));
        }
    }

    if let Some(list) = non_empty_array(payload.get("list")) {
        return Some(SingleShape::List(list));
    }
    if let Some(list) = non_empty_array(Some(payload)) {
        return Some(SingleShape::List(list));
    }
    if let Some(obj) = nested_object(payload) {
        return Some(SingleShape::Object(obj));
    }
    if looks_like_entity(payload) {
        return Some(SingleShape::Object(payload));
    }

    None
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
