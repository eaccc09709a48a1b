//! 单集引用及剧集列表分页。

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EPISODE_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Episode\s*\d+").expect("编译 EPISODE_LABEL_REGEX 失败")
});

/// 一部剧中的一个可播放单元。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    /// 面向用户的集数（从 1 开始），按排序后的位置分配。
    pub display_number: u32,
    /// 上游的章节索引（可能从 0 开始）。
    pub raw_index: Option<i64>,
    /// 单集标题。
    pub title: Option<String>,
    /// 用于排序的集数标记。
    pub marker: i64,
}

impl EpisodeRef {
    /// 请求播放地址时传给上游的章节索引。
    ///
    /// 优先使用上游自己的索引，否则退回 `display_number - 1`。
    pub fn playback_index(&self) -> i64 {
        self.raw_index
            .unwrap_or_else(|| i64::from(self.display_number) - 1)
    }

    /// 生成展示用的标题。
    ///
    /// 上游标题里常常已经带了 "Episode N"，这里会去掉它再统一追加集数，
    /// 避免出现两次。
    pub fn label(&self) -> String {
        let n = self.display_number;
        let title = self.title.as_deref().unwrap_or("").trim();

        if title.contains("Episode") {
            let stripped = EPISODE_LABEL_REGEX.replace(title, "");
            let stripped = stripped.trim();
            if stripped.is_empty() {
                format!("Episode {n}")
            } else {
                format!("{stripped} (Episode {n})")
            }
        } else if title.is_empty() {
            format!("Episode {n}")
        } else {
            title.to_string()
        }
    }
}

/// 剧集列表中的一页。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodePage<'a> {
    /// 当前页码（从 1 开始）。
    pub page: usize,
    /// 总页数，列表为空时为 1。
    pub total_pages: usize,
    /// 当前页包含的剧集。
    pub episodes: &'a [EpisodeRef],
    /// 分页器中需要显示的页码范围（当前页前后各两页）。
    pub window: RangeInclusive<usize>,
}

impl EpisodePage<'_> {
    /// 是否存在上一页。
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// 是否存在下一页。
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// 对已排序的剧集列表分页。超出范围的页码会被钳制到有效区间。
pub fn paginate(episodes: &[EpisodeRef], page: usize, per_page: usize) -> EpisodePage<'_> {
    let per_page = per_page.max(1);
    let total_pages = episodes.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(episodes.len());

    EpisodePage {
        page,
        total_pages,
        episodes: &episodes[start.min(end)..end],
        window: page.saturating_sub(2).max(1)..=(page + 2).min(total_pages),
    }
}
