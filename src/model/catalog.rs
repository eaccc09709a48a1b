//! 剧集目录条目与首页栏目相关的数据结构。

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::links::DetailLink;

/// 代表一部剧的标准化目录条目。
///
/// 每次收到上游响应时重新构造，构造后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// 经过校验的剧集 ID。为 `None` 时条目只展示、不可点击。
    pub id: Option<String>,
    /// 标题，保证非空。
    pub title: String,
    /// 封面地址，保证非空。
    pub cover: String,
    /// 类型标签，默认为 "Drama"。
    pub genre: String,
    /// 原始条目中携带的集数标记（如果有）。
    pub episode_number: Option<i64>,
    /// 简介。
    pub synopsis: Option<String>,
    /// 是否为独家内容。
    pub exclusive: bool,
}

impl CatalogItem {
    /// 条目是否可以跳转到详情页。
    pub fn is_clickable(&self) -> bool {
        self.id.is_some()
    }

    /// 生成详情页链接，没有有效 ID 时返回 `None`。
    pub fn detail_link(&self) -> Option<DetailLink> {
        self.id.as_ref().map(|id| DetailLink {
            series_id: id.clone(),
        })
    }

    /// 将简介拆分为非空段落。
    pub fn synopsis_paragraphs(&self) -> Vec<&str> {
        self.synopsis
            .as_deref()
            .map(|text| {
                text.split('\n')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 首页的三个栏目。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum FeedKind {
    /// 推荐
    ForYou,
    /// 最新上线
    New,
    /// 排行榜
    Rank,
}

impl FeedKind {
    /// 该栏目在上游 API 中的路径（第一页）。
    pub fn path(self) -> &'static str {
        match self {
            FeedKind::ForYou => "foryou/1",
            FeedKind::New => "new/1",
            FeedKind::Rank => "rank/1",
        }
    }
}
