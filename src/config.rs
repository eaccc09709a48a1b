//! 负责处理客户端的持久化配置。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::{CatalogError, Result};

/// 默认的上游 API 地址。
pub const DEFAULT_BASE_URL: &str = "https://restxdb.onrender.com/api";
/// 封面缺失时使用的占位图。
pub const PLACEHOLDER_COVER: &str = "https://via.placeholder.com/300x400?text=No+Image";
/// 标题缺失时使用的占位文本。
pub const PLACEHOLDER_TITLE: &str = "Judul tidak tersedia";
/// 类型缺失时使用的默认标签。
pub const DEFAULT_GENRE: &str = "Drama";

const CONFIG_FILE_NAME: &str = "config.json";

/// 客户端的全部可调参数。
///
/// 所有时长字段都以毫秒保存，便于以 JSON 形式直接编辑。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// 上游 API 的根地址，不带末尾斜杠。
    pub base_url: String,
    /// 附加在每个请求上的 `lang` 参数。
    pub lang: String,
    /// 单个请求的超时时间。
    pub request_timeout_ms: u64,
    /// 搜索输入的防抖静默期。
    pub debounce_ms: u64,
    /// 触发网络请求的最短查询长度（按字符计）。
    pub min_query_chars: usize,
    /// 播放结束后自动跳转下一集前的等待时间。
    pub auto_advance_delay_ms: u64,
    /// 只有播放超过该秒数后才会保存进度。
    pub progress_min_elapsed_secs: f64,
    /// 两次进度写入之间的最短间隔。
    pub progress_write_interval_ms: u64,
    /// 已保存进度占时长的比例达到该值时视为已看完，不再续播。
    pub resume_finished_ratio: f64,
    /// 等待视频就绪时的轮询间隔。
    pub ready_poll_interval_ms: u64,
    /// 等待视频就绪的最长时间。
    pub ready_poll_timeout_ms: u64,
    /// 搜索建议的最大条数。
    pub suggestion_limit: usize,
    /// 推荐列表的最大条数。
    pub similar_limit: usize,
    /// 剧集列表每页的集数。
    pub episodes_per_page: usize,
    /// "最新上线" 栏目的 `pageSize` 参数。
    pub new_feed_page_size: u32,
    /// 封面占位图地址。
    pub placeholder_cover: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: "in".to_string(),
            request_timeout_ms: 10_000,
            debounce_ms: 300,
            min_query_chars: 2,
            auto_advance_delay_ms: 2_000,
            progress_min_elapsed_secs: 10.0,
            progress_write_interval_ms: 5_000,
            resume_finished_ratio: 0.9,
            ready_poll_interval_ms: 100,
            ready_poll_timeout_ms: 5_000,
            suggestion_limit: 5,
            similar_limit: 6,
            episodes_per_page: 50,
            new_feed_page_size: 10,
            placeholder_cover: PLACEHOLDER_COVER.to_string(),
        }
    }
}

impl CatalogConfig {
    /// 单个请求的超时时间。
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 搜索防抖的静默期。
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// 自动跳转下一集前的等待时间。
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    /// 两次进度写入之间的最短间隔。
    pub fn progress_write_interval(&self) -> Duration {
        Duration::from_millis(self.progress_write_interval_ms)
    }

    /// 等待视频就绪时的轮询间隔。
    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms)
    }

    /// 等待视频就绪的最长时间。
    pub fn ready_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_poll_timeout_ms)
    }

    /// 检查配置是否自洽。
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(CatalogError::Config("base_url 不能为空".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(CatalogError::Config(
                "request_timeout_ms 必须大于 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.resume_finished_ratio) {
            return Err(CatalogError::Config(format!(
                "resume_finished_ratio 必须位于 [0, 1] 区间，当前为 {}",
                self.resume_finished_ratio
            )));
        }
        if self.episodes_per_page == 0 {
            return Err(CatalogError::Config(
                "episodes_per_page 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 获取应用配置目录下指定文件的完整路径。
///
/// # 参数
/// * `filename` - 目标配置文件的名称，例如 "config.json"。
pub(crate) fn get_config_file_path(filename: &str) -> std::result::Result<PathBuf, std::io::Error> {
    if let Some(mut config_dir) = dirs::config_dir() {
        config_dir.push("drama-catalog");
        fs::create_dir_all(&config_dir)?;
        config_dir.push(filename);
        Ok(config_dir)
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "无法找到用户配置目录",
        ))
    }
}

/// 从配置目录加载配置，文件不存在时返回默认配置。
pub fn load_config() -> Result<CatalogConfig> {
    let config_path = get_config_file_path(CONFIG_FILE_NAME)?;
    match fs::read_to_string(&config_path) {
        Ok(content) => {
            let config: CatalogConfig = serde_json::from_str(&content)?;
            config.validate()?;
            info!("已从 {:?} 加载配置。", config_path);
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("配置文件不存在，将使用默认配置。");
            Ok(CatalogConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// 将配置序列化为 JSON 并保存到配置目录。
pub fn save_config(config: &CatalogConfig) -> Result<()> {
    config.validate()?;
    let config_path = get_config_file_path(CONFIG_FILE_NAME)?;
    let content = serde_json::to_string_pretty(config)?;
    fs::write(config_path, content)?;
    info!("配置已保存。");
    Ok(())
}
