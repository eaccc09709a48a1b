//! 播放地址与播放进度相关的数据结构。

use serde::{Deserialize, Serialize};

/// 视频流的类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    /// HLS 自适应码流（`.m3u8` 清单）。
    Hls,
    /// 可直接播放的文件（MP4 等）。
    Direct,
}

impl StreamKind {
    /// 根据 URL 判断流类型。
    pub fn detect(url: &str) -> Self {
        if url.contains(".m3u8") || url.contains("m3u8?") {
            StreamKind::Hls
        } else {
            StreamKind::Direct
        }
    }
}

/// 一次播放地址查询的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSource {
    /// 可播放的地址。
    pub url: String,
    /// 流类型。
    pub kind: StreamKind,
}

impl PlaybackSource {
    /// 从地址构造，并自动判断流类型。
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let kind = StreamKind::detect(&url);
        Self { url, kind }
    }
}

/// 某一集的已保存播放位置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackProgress {
    /// 剧集 ID。
    pub series_id: String,
    /// 集数。
    pub display_number: u32,
    /// 已播放秒数。
    pub elapsed_secs: f64,
}

impl PlaybackProgress {
    /// 进度在存储中的键。
    pub fn storage_key(series_id: &str, display_number: u32) -> String {
        format!("progress_{series_id}_{display_number}")
    }

    /// 播放百分比在存储中的键。
    pub fn percent_key(series_id: &str, display_number: u32) -> String {
        format!("progress_{series_id}_{display_number}_percent")
    }
}
