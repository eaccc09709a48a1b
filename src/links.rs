//! 页面之间的链接。
//!
//! 页面之间只通过查询参数传递状态，这里负责生成与解析这些查询参数。

use serde::{Deserialize, Serialize};

use crate::normalize::identifier;

/// 详情页可以接受的 ID 参数名，按优先级排列。
const DETAIL_ID_PARAMS: &[&str] = &["bookId", "id", "contentId", "dramaId"];

/// 指向详情页的链接。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailLink {
    /// 剧集 ID。
    pub series_id: String,
}

impl DetailLink {
    /// 生成 `detail.html?bookId=...`。
    pub fn href(&self) -> String {
        format!("detail.html?bookId={}", urlencoding::encode(&self.series_id))
    }

    /// 从详情页的查询字符串中解析 ID。无效的 ID 会被跳过。
    pub fn from_query(query: &str) -> Option<Self> {
        let params = parse_query(query);
        DETAIL_ID_PARAMS
            .iter()
            .filter_map(|name| query_value(&params, name))
            .find_map(identifier::normalize_str)
            .map(|series_id| Self { series_id })
    }
}

/// 指向播放页的链接。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchLink {
    /// 剧集 ID。
    pub series_id: String,
    /// 集数（从 1 开始）。
    pub display_number: u32,
}

impl WatchLink {
    /// 生成 `watch.html?bookId=...&episode=...`。
    pub fn href(&self) -> String {
        format!(
            "watch.html?bookId={}&episode={}",
            urlencoding::encode(&self.series_id),
            self.display_number
        )
    }

    /// 从播放页的查询字符串中解析。
    ///
    /// `episode` 缺失或无法解析为正整数时视为第 1 集。
    pub fn from_query(query: &str) -> Option<Self> {
        let params = parse_query(query);
        let series_id = query_value(&params, "bookId").and_then(identifier::normalize_str)?;
        let display_number = query_value(&params, "episode")
            .and_then(parse_episode_number)
            .unwrap_or(1);
        Some(Self {
            series_id,
            display_number,
        })
    }
}

/// 指向搜索页的链接。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLink {
    /// 搜索词。
    pub query: String,
}

impl SearchLink {
    /// 生成 `search.html?q=...`。
    pub fn href(&self) -> String {
        format!("search.html?q={}", urlencoding::encode(&self.query))
    }

    /// 从搜索页的查询字符串中解析，空查询返回 `None`。
    pub fn from_query(query: &str) -> Option<Self> {
        let params = parse_query(query);
        query_value(&params, "q")
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| Self {
                query: q.to_string(),
            })
    }
}

/// 把 `?a=1&b=x%20y` 解析为键值对，保留原始顺序。
///
/// 也接受完整的链接（如 `detail.html?bookId=9#top`），只解析 `?` 与 `#` 之间的部分。
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let query = query.split_once('?').map_or(query, |(_, rest)| rest);
    let query = query.split_once('#').map_or(query, |(rest, _)| rest);
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced.clone(),
    }
}

fn query_value<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn parse_episode_number(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|n| *n > 0)
}
