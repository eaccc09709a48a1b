//! 上游 API 的请求描述与传输层抽象。
//!
//! 这里只描述"要请求什么"，真正的网络访问由实现了 [`Transport`] 的类型完成，
//! 测试中可以替换为内存实现。

pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod models;

use async_trait::async_trait;
use serde_json::Value;

use crate::{error::Result, model::catalog::FeedKind};

/// 请求方法。上游只用到这两种。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST，带 JSON 请求体
    Post,
}

/// 一次对上游 API 的请求。
///
/// `path` 相对于 API 根地址；`lang` 参数由传输层统一追加，不在这里出现。
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// 请求方法。
    pub method: Method,
    /// 相对路径，例如 `book/9`。
    pub path: String,
    /// 额外的查询参数，按顺序追加。
    pub query: Vec<(String, String)>,
    /// POST 请求体。
    pub body: Option<Value>,
}

impl ApiRequest {
    /// 构造一个 GET 请求。
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// 构造一个带 JSON 请求体的 POST 请求。
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// 追加一个查询参数。
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// 用于日志和测试的端点描述，例如 `book?id=9`。
    pub fn endpoint(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.path)
    }
}

/// 上游返回的原始响应。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP 状态码。
    pub status: u16,
    /// 原始响应体。
    pub body: String,
}

impl RawResponse {
    /// 状态码是否为 2xx。
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 传输层：把一个 [`ApiRequest`] 变成一个 [`RawResponse`]。
///
/// 只有网络层面的失败才返回错误；非 2xx 的状态码照常返回，由解析器判断。
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Transport: Send + Sync {
    /// 发送请求。
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// 首页栏目的请求。
pub fn feed(kind: FeedKind, new_feed_page_size: u32) -> ApiRequest {
    let request = ApiRequest::get(kind.path());
    match kind {
        FeedKind::New => request.with_query("pageSize", new_feed_page_size.to_string()),
        FeedKind::ForYou | FeedKind::Rank => request,
    }
}

/// 搜索结果（第一页）的请求。
pub fn search(query: &str) -> ApiRequest {
    ApiRequest::get(format!("search/{}/1", urlencoding::encode(query)))
}

/// 搜索建议的请求。
pub fn suggest(query: &str) -> ApiRequest {
    ApiRequest::get(format!("suggest/{}", urlencoding::encode(query)))
}

/// 详情接口的候选端点，按优先级排列。
pub fn detail_candidates(id: &str) -> Vec<ApiRequest> {
    let encoded = urlencoding::encode(id);
    let mut candidates: Vec<ApiRequest> = ["book", "detail", "info", "drama"]
        .iter()
        .map(|prefix| ApiRequest::get(format!("{prefix}/{encoded}")))
        .collect();
    candidates.extend(
        ["book", "detail", "info"]
            .iter()
            .map(|path| ApiRequest::get(*path).with_query("id", id)),
    );
    candidates
}

/// 剧集列表的候选端点。
///
/// `alternate_id` 是详情响应中条目自己的 ID，与请求 ID 不同时会追加两个候选。
pub fn episode_candidates(id: &str, alternate_id: Option<&str>) -> Vec<ApiRequest> {
    let encoded = urlencoding::encode(id);
    let mut candidates = vec![
        ApiRequest::get(format!("chapters/{encoded}")),
        ApiRequest::get(format!("episodes/{encoded}")),
        ApiRequest::get(format!("book/{encoded}/chapters")),
        ApiRequest::get(format!("drama/{encoded}/episodes")),
        ApiRequest::get(format!("book/{encoded}/episodes")),
        ApiRequest::get("chapters").with_query("id", id),
        ApiRequest::get("episodes").with_query("id", id),
    ];

    if let Some(alt) = alternate_id.filter(|alt| *alt != id) {
        let alt = urlencoding::encode(alt);
        candidates.push(ApiRequest::get(format!("chapters/{alt}")));
        candidates.push(ApiRequest::get(format!("episodes/{alt}")));
    }
    candidates
}
