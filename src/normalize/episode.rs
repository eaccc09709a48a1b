//! 剧集列表归一化：集数标记提取、稳定排序与集数分配。

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{
    model::episode::EpisodeRef,
    normalize::{first_non_empty_str, loose_int},
};

/// 可能携带集数标记的字段，按优先级排列。
const MARKER_FIELDS: &[&str] = &[
    "chapterIndex",
    "index",
    "episodeIndex",
    "episode",
    "chapter",
    "episodeNumber",
    "number",
    "no",
    "num",
];

/// 上游自己的章节索引字段。
const RAW_INDEX_FIELDS: &[&str] = &["chapterIndex", "chapter_index"];

/// 单集标题字段。
const EPISODE_TITLE_FIELDS: &[&str] = &["title", "chapterTitle", "episodeTitle"];

static TITLE_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Episode|Eps|Ep\.?)\s*(\d+)").expect("编译 TITLE_MARKER_REGEX 失败")
});

/// 在标记字段中查找第一个能解析为整数的值。
pub(crate) fn extract_marker_field(raw: &Value) -> Option<i64> {
    MARKER_FIELDS
        .iter()
        .filter_map(|field| raw.get(*field))
        .filter(|value| !value.is_null())
        .find_map(loose_int)
}

/// 尽力提取一个章节的集数标记。
///
/// 先查标记字段，再从标题中匹配 "Episode N" / "Ep. N"，都没有时返回 1。
pub fn extract_marker(raw: &Value) -> i64 {
    if !raw.is_object() {
        return 1;
    }
    if let Some(marker) = extract_marker_field(raw) {
        return marker;
    }
    raw.get("title")
        .and_then(Value::as_str)
        .and_then(|title| TITLE_MARKER_REGEX.captures(title))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

/// 将原始章节列表转换为有序的 [`EpisodeRef`] 列表。
///
/// 按集数标记升序做稳定排序（标记相同时保持原始顺序），
/// 然后按排序后的位置从 1 开始分配 `display_number`。
pub fn build_episode_list(chapters: &[Value]) -> Vec<EpisodeRef> {
    let mut keyed: Vec<(i64, &Value)> = chapters
        .iter()
        .map(|chapter| (extract_marker(chapter), chapter))
        .collect();
    keyed.sort_by_key(|(marker, _)| *marker);

    keyed
        .into_iter()
        .enumerate()
        .map(|(position, (marker, chapter))| EpisodeRef {
            display_number: u32::try_from(position + 1).unwrap_or(u32::MAX),
            raw_index: RAW_INDEX_FIELDS
                .iter()
                .filter_map(|field| chapter.get(*field))
                .find_map(loose_int),
            title: first_non_empty_str(chapter, EPISODE_TITLE_FIELDS).map(String::from),
            marker,
        })
        .collect()
}
