//! 定义了整个 `drama-catalog` 库的错误类型 `CatalogError`。

use std::io;
use thiserror::Error;

/// `drama-catalog` 库的通用错误枚举。
///
/// 传输、状态码、空响应与非 JSON 响应这几类错误会在解析器边界被吸收，
/// 只有在页面流程需要决定后备策略时才会以 `CatalogError` 的形式出现。
#[derive(Error, Debug)]
pub enum CatalogError {
    /// 网络请求失败 (源自 `reqwest::Error`)
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// JSON 解析失败 (源自 `serde_json::Error`)
    #[error("JSON 解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O 错误 (源自 `io::Error`)
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    /// 上游返回了非成功的状态码
    #[error("API 返回了非成功状态码: {0}")]
    Status(u16),

    /// 上游返回了空响应体
    #[error("API 返回了空响应")]
    EmptyBody,

    /// 请求超时
    #[error("请求在 {0} 毫秒后超时")]
    Timeout(u64),

    /// 请求被取消（通常是被更新的查询取代）
    #[error("请求已被取消")]
    Cancelled,

    /// 播放响应中找不到可播放的地址
    #[error("播放响应中未找到视频地址")]
    MissingPlayUrl,

    /// 当前环境无法播放该格式
    #[error("不支持的播放格式: {0}")]
    UnsupportedFormat(String),

    /// 存储层错误
    #[error("存储错误: {0}")]
    Storage(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

/// `CatalogError` 的 `Result` 类型别名，方便在函数签名中使用。
pub type Result<T> = std::result::Result<T, CatalogError>;
