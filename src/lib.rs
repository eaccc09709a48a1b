#![warn(missing_docs)]

//! # Drama Catalog RS
//!
//! 一个面向短剧目录站点的 Rust 客户端库。上游 API 的响应结构并不稳定，
//! 本库把这些不确定性集中处理，对页面只暴露标准化的数据和明确的页面状态。
//!
//! ## 主要功能
//!
//! - **响应归一化**: 标识符校验、外层结构解包、目录条目与剧集列表映射。
//! - **多端点解析**: 同一份数据按顺序尝试多个候选端点，单个端点失败只记录不抛出。
//! - **页面流程**: 首页栏目、搜索（防抖与建议）、详情（多级后备）、剧集列表。
//! - **播放导航**: 上一集 / 下一集 / 自动连播、进度保存与续播、播放方式选择。
//!
//! ## 示例
//!
//! ```rust,no_run
//! use drama_catalog_rs::{CatalogClient, config::CatalogConfig};
//!
//! async {
//!     let client = CatalogClient::new(CatalogConfig::default()).unwrap();
//!
//!     let home = client.home().await;
//!     if let Some(items) = home.for_you.ready() {
//!         for item in items {
//!             println!("{} -> {:?}", item.title, item.detail_link().map(|l| l.href()));
//!         }
//!     }
//!
//!     let detail = client.detail("?bookId=41000102341").await;
//!     if let Some(detail) = detail.ready() {
//!         let episodes = client.episodes(detail).await;
//!         println!("共 {} 集", episodes.ready().map_or(0, Vec::len));
//!     }
//! };
//! ```
pub mod api;
pub mod config;
pub mod error;
pub mod links;
pub mod model;
pub mod normalize;
pub mod player;
pub mod resolver;
pub mod search;
pub mod storage;
pub mod timer;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

pub use crate::{
    config::CatalogConfig,
    error::{CatalogError, Result},
    model::{
        catalog::{CatalogItem, FeedKind},
        episode::EpisodeRef,
        view::{Affordance, ViewState},
    },
};

use crate::{
    api::{ApiRequest, Transport, http::ReqwestTransport},
    links::DetailLink,
    model::episode::{EpisodePage, paginate},
    normalize::{
        envelope::{has_matching_id, unwrap_episode_list, unwrap_list, unwrap_single_matching},
        episode::build_episode_list,
        first_non_empty_str,
        item::{TITLE_FIELDS, map_item_with_placeholder, map_items},
    },
    player::controller::EpisodeController,
    resolver::Resolver,
    search::SearchSession,
    storage::{KeyValueStore, SelectionCache},
};

/// 建议条目为对象时，取这些字段作为文本。
const SUGGESTION_TEXT_FIELDS: &[&str] = &["title", "name", "text"];

/// 详情实体上可能内嵌剧集列表的字段。
const EMBEDDED_EPISODE_FIELDS: &[&str] = &["chapters", "episodes"];

const LOAD_FAILED_MESSAGE: &str = "Gagal memuat data. Silakan coba lagi.";
const MISSING_ID_MESSAGE: &str = "ID drama tidak ditemukan.";
const DETAIL_NOT_FOUND_MESSAGE: &str = "Tidak dapat menemukan data drama.";

// ==========================================================
//  顶层 API
// ==========================================================

/// 首页三个栏目的状态，彼此独立。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeFeeds {
    /// 推荐。
    pub for_you: ViewState<Vec<CatalogItem>>,
    /// 最新上线。
    pub new_releases: ViewState<Vec<CatalogItem>>,
    /// 排行榜。
    pub rank: ViewState<Vec<CatalogItem>>,
}

/// 详情页的数据。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDetail {
    /// 页面请求的 ID。
    pub requested_id: String,
    /// 标准化后的条目。
    pub item: CatalogItem,
    /// 详情响应中内嵌的原始剧集列表，剧集端点全部失败时作为后备。
    #[serde(skip)]
    pub embedded_chapters: Vec<Value>,
}

/// 顶层客户端，是与本库交互的主要入口点。克隆开销很小。
#[derive(Clone)]
pub struct CatalogClient {
    resolver: Resolver,
    config: Arc<CatalogConfig>,
    selection: SelectionCache,
    progress_store: Arc<dyn KeyValueStore>,
}

impl CatalogClient {
    /// 使用 HTTP 传输层和平台默认的存储创建客户端。
    ///
    /// 原生平台上，最近选择保存在内存中，播放进度保存在用户数据目录；
    /// 浏览器中分别使用 `sessionStorage` 与 `localStorage`。
    pub fn new(config: CatalogConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config));
        let (session_store, progress_store) = default_stores();
        Ok(Self::with_parts(
            config,
            transport,
            session_store,
            progress_store,
        ))
    }

    /// 使用自定义的传输层和存储创建客户端。
    pub fn with_parts(
        config: CatalogConfig,
        transport: Arc<dyn Transport>,
        session_store: Arc<dyn KeyValueStore>,
        progress_store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let resolver = Resolver::new(transport, config.request_timeout());
        Self {
            resolver,
            config: Arc::new(config),
            selection: SelectionCache::new(session_store),
            progress_store,
        }
    }

    /// 当前配置。
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// 底层解析器。
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// 最近选择的快照。
    pub fn selection(&self) -> &SelectionCache {
        &self.selection
    }

    /// 记录用户点击的条目，详情页在 URL 中没有 ID 时会用到它。
    pub fn select(&self, item: &CatalogItem) {
        self.selection.save(item);
    }

    /// 为播放页创建导航控制器。
    pub fn player(&self) -> EpisodeController {
        EpisodeController::new(
            self.resolver.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.progress_store),
        )
    }

    /// 为搜索页创建搜索会话。
    pub fn search_session(&self) -> SearchSession {
        SearchSession::new(self.clone())
    }

    async fn fetch_list(&self, request: &ApiRequest) -> ViewState<Vec<CatalogItem>> {
        match self.resolver.fetch(request).await {
            Ok(payload) => ViewState::from_list(map_items(
                unwrap_list(&payload),
                &self.config.placeholder_cover,
            )),
            Err(e) => {
                tracing::warn!("[Catalog] 加载 {} 失败: {}", request.endpoint(), e);
                ViewState::failed(LOAD_FAILED_MESSAGE, vec![Affordance::Retry])
            }
        }
    }

    /// 加载首页的一个栏目。
    pub async fn feed(&self, kind: FeedKind) -> ViewState<Vec<CatalogItem>> {
        self.fetch_list(&api::feed(kind, self.config.new_feed_page_size))
            .await
    }

    /// 并发加载首页的三个栏目。某个栏目失败不影响其它栏目。
    pub async fn home(&self) -> HomeFeeds {
        let (for_you, new_releases, rank) = futures::join!(
            self.feed(FeedKind::ForYou),
            self.feed(FeedKind::New),
            self.feed(FeedKind::Rank)
        );
        HomeFeeds {
            for_you,
            new_releases,
            rank,
        }
    }

    /// 搜索（第一页）。
    pub async fn search(&self, query: &str) -> ViewState<Vec<CatalogItem>> {
        let query = query.trim();
        if query.is_empty() {
            return ViewState::Empty;
        }
        self.fetch_list(&api::search(query)).await
    }

    /// 搜索建议，最多返回配置的条数。失败时返回空列表。
    pub async fn suggestions(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let payload = match self.resolver.fetch(&api::suggest(query)).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!("[Search] 获取 '{}' 的搜索建议失败: {}", query, e);
                return Vec::new();
            }
        };

        unwrap_list(&payload)
            .iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s.trim()),
                other => first_non_empty_str(other, SUGGESTION_TEXT_FIELDS),
            })
            .filter(|s| !s.is_empty())
            .take(self.config.suggestion_limit)
            .map(String::from)
            .collect()
    }

    /// 搜索页在没有输入时展示的推荐内容。
    pub async fn recommendations(&self) -> ViewState<Vec<CatalogItem>> {
        let limit = self.config.similar_limit;
        self.feed(FeedKind::ForYou).await.map(|mut items| {
            items.truncate(limit);
            items
        })
    }

    /// 根据详情页的查询字符串加载详情。
    ///
    /// 查询参数中没有有效 ID 时使用最近选择的快照。
    pub async fn detail(&self, query: &str) -> ViewState<SeriesDetail> {
        let id = DetailLink::from_query(query)
            .map(|link| link.series_id)
            .or_else(|| {
                let id = self.selection.load()?.id;
                tracing::info!("[Detail] URL 中没有 ID，使用最近选择的快照: {:?}", id);
                id
            });

        match id {
            Some(id) => self.detail_by_id(&id).await,
            None => ViewState::failed(MISSING_ID_MESSAGE, vec![Affordance::BackToSearch]),
        }
    }

    /// 按 ID 加载详情。
    ///
    /// 依次尝试：详情候选端点、在推荐栏目中按 ID 或快照标题查找、最近选择的快照。
    /// 成功时更新最近选择的快照。
    pub async fn detail_by_id(&self, id: &str) -> ViewState<SeriesDetail> {
        tracing::info!("[Detail] 开始加载 {}", id);

        let detail = match self.detail_from_endpoints(id).await {
            Some(detail) => Some(detail),
            None => {
                tracing::info!("[Detail] 所有详情端点都失败，尝试后备方案。");
                self.detail_from_feed(id).await
            }
        }
        .or_else(|| self.detail_from_snapshot(id));

        match detail {
            Some(detail) => {
                self.selection.save(&detail.item);
                ViewState::Ready(detail)
            }
            None => {
                tracing::error!("[Detail] 无法找到 {} 的任何数据。", id);
                ViewState::failed(
                    DETAIL_NOT_FOUND_MESSAGE,
                    vec![Affordance::Retry, Affordance::BackToSearch],
                )
            }
        }
    }

    async fn detail_from_endpoints(&self, id: &str) -> Option<SeriesDetail> {
        let payload = self
            .resolver
            .resolve_where(&api::detail_candidates(id), |p| {
                unwrap_single_matching(p, id).is_some()
            })
            .await?;
        let raw = unwrap_single_matching(&payload, id)?;

        let embedded_chapters = EMBEDDED_EPISODE_FIELDS
            .iter()
            .filter_map(|field| raw.get(*field))
            .find_map(Value::as_array)
            .filter(|list| !list.is_empty())
            .map(Vec::as_slice)
            .unwrap_or_else(|| unwrap_top_level_episodes(&payload))
            .to_vec();

        Some(SeriesDetail {
            requested_id: id.to_string(),
            item: self.map_detail_item(raw, id),
            embedded_chapters,
        })
    }

    async fn detail_from_feed(&self, id: &str) -> Option<SeriesDetail> {
        let payload = match self.resolver.fetch(&api::feed(FeedKind::ForYou, 0)).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("[Detail] 后备栏目加载失败: {}", e);
                return None;
            }
        };

        let snapshot_title = self
            .selection
            .load()
            .map(|snapshot| snapshot.item.title.trim().to_lowercase());

        let raw = unwrap_list(&payload).iter().find(|raw| {
            has_matching_id(raw, id)
                || snapshot_title.as_deref().is_some_and(|wanted| {
                    first_non_empty_str(raw, TITLE_FIELDS)
                        .is_some_and(|title| title.to_lowercase() == wanted)
                })
        })?;

        tracing::info!("[Detail] 在推荐栏目中找到了 {}", id);
        Some(SeriesDetail {
            requested_id: id.to_string(),
            item: self.map_detail_item(raw, id),
            embedded_chapters: Vec::new(),
        })
    }

    fn detail_from_snapshot(&self, id: &str) -> Option<SeriesDetail> {
        let snapshot = self.selection.load()?;
        if snapshot.id.as_deref().is_some_and(|saved| saved != id) {
            tracing::debug!(
                "[Detail] 快照 ID {:?} 与请求的 {} 不一致，不使用快照。",
                snapshot.id,
                id
            );
            return None;
        }

        tracing::info!("[Detail] 使用最近选择的快照展示 {}", id);
        let mut item = snapshot.item;
        item.id.get_or_insert_with(|| id.to_string());
        Some(SeriesDetail {
            requested_id: id.to_string(),
            item,
            embedded_chapters: Vec::new(),
        })
    }

    fn map_detail_item(&self, raw: &Value, id: &str) -> CatalogItem {
        let mut item = map_item_with_placeholder(raw, &self.config.placeholder_cover);
        item.id.get_or_insert_with(|| id.to_string());
        item
    }

    /// 加载剧集列表。
    ///
    /// 第一个返回非空列表的端点胜出；全部失败时使用详情中内嵌的列表。
    pub async fn episodes(&self, detail: &SeriesDetail) -> ViewState<Vec<EpisodeRef>> {
        let candidates = api::episode_candidates(&detail.requested_id, detail.item.id.as_deref());
        let payload = self
            .resolver
            .resolve_where(&candidates, |p| !unwrap_episode_list(p).is_empty())
            .await;

        let chapters: &[Value] = match &payload {
            Some(payload) => unwrap_episode_list(payload),
            None => {
                tracing::info!(
                    "[Detail] 剧集端点全部失败，使用详情中内嵌的 {} 集。",
                    detail.embedded_chapters.len()
                );
                &detail.embedded_chapters
            }
        };

        ViewState::from_list(build_episode_list(chapters))
    }

    /// 按配置的每页集数取剧集列表的第 `page` 页（从 1 开始，越界时钳制）。
    pub fn episode_page<'a>(&self, episodes: &'a [EpisodeRef], page: usize) -> EpisodePage<'a> {
        paginate(episodes, page, self.config.episodes_per_page)
    }
}

fn unwrap_top_level_episodes(payload: &Value) -> &[Value] {
    EMBEDDED_EPISODE_FIELDS
        .iter()
        .filter_map(|field| payload.get(*field))
        .find_map(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(not(target_arch = "wasm32"))]
fn default_stores() -> (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) {
    use crate::storage::{FileStore, MemoryStore};

    let progress: Arc<dyn KeyValueStore> = match FileStore::in_data_dir("progress") {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("[Main] 无法打开进度存储，进度只保存在内存中: {}", e);
            Arc::new(MemoryStore::new())
        }
    };
    (Arc::new(MemoryStore::new()), progress)
}

#[cfg(target_arch = "wasm32")]
fn default_stores() -> (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) {
    use crate::storage::WebStorage;

    (Arc::new(WebStorage::Session), Arc::new(WebStorage::Local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::mock::MockTransport, storage::MemoryStore};
    use serde_json::json;
    use tracing_test::traced_test;

    fn client(mock: &MockTransport) -> CatalogClient {
        CatalogClient::with_parts(
            CatalogConfig::default(),
            Arc::new(mock.clone()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_home_sections_are_independent() {
        let mock = MockTransport::new()
            .json("foryou/1", json!({"data": {"list": [{"bookId": "1", "title": "A"}]}}))
            .raw("new/1?pageSize=10", 500, "")
            .json("rank/1", json!({"data": []}));

        let home = client(&mock).home().await;
        assert_eq!(home.for_you.ready().unwrap()[0].title, "A");
        assert_eq!(
            home.new_releases,
            ViewState::failed(LOAD_FAILED_MESSAGE, vec![Affordance::Retry])
        );
        assert_eq!(home.rank, ViewState::Empty);
    }

    #[tokio::test]
    async fn test_suggestions_accept_strings_and_objects() {
        let mock = MockTransport::new().json(
            "suggest/ci",
            json!({"data": ["Cinta", {"name": "Cincin"}, {"text": "Cita"}, {"x": 1}, "C4", "C5", "C6"]}),
        );
        let suggestions = client(&mock).suggestions("ci").await;
        assert_eq!(suggestions, vec!["Cinta", "Cincin", "Cita", "C4", "C5"]);
    }

    #[tokio::test]
    async fn test_recommendations_are_limited() {
        let list: Vec<_> = (1..=10).map(|i| json!({"bookId": i})).collect();
        let mock = MockTransport::new().json("foryou/1", json!({ "data": list }));
        let items = client(&mock).recommendations().await;
        assert_eq!(items.ready().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_detail_uses_first_working_endpoint_and_saves_snapshot() {
        let mock = MockTransport::new()
            .raw("book/9", 502, "")
            .json(
                "detail/9",
                json!({"data": {"bookId": "9", "bookName": "Cinta", "chapters": [{"chapterIndex": 0}]}}),
            );
        let client = client(&mock);

        let detail = client.detail("?bookId=9").await;
        let detail = detail.ready().unwrap();
        assert_eq!(detail.item.title, "Cinta");
        assert_eq!(detail.embedded_chapters.len(), 1);
        assert_eq!(client.selection().load().unwrap().id.as_deref(), Some("9"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_detail_falls_back_to_feed_by_snapshot_title() {
        let mock = MockTransport::new().json(
            "foryou/1",
            json!({"data": [{"bookId": "77", "title": "  Pernikahan Kontrak "}]}),
        );
        let client = client(&mock);
        client.select(&crate::normalize::item::map_item(
            &json!({"title": "pernikahan kontrak"}),
        ));

        let detail = client.detail("?bookId=abc").await;
        assert_eq!(detail.ready().unwrap().item.id.as_deref(), Some("77"));
        assert!(logs_contain("所有详情端点都失败"));
    }

    #[tokio::test]
    async fn test_detail_falls_back_to_matching_snapshot() {
        let mock = MockTransport::new();
        let client = client(&mock);
        client.select(&crate::normalize::item::map_item(
            &json!({"bookId": "9", "title": "Tersimpan"}),
        ));

        let detail = client.detail("").await;
        assert_eq!(detail.ready().unwrap().item.title, "Tersimpan");

        let detail = client.detail("?bookId=10").await;
        assert_eq!(
            detail,
            ViewState::failed(
                DETAIL_NOT_FOUND_MESSAGE,
                vec![Affordance::Retry, Affordance::BackToSearch]
            )
        );
    }

    #[tokio::test]
    async fn test_detail_without_any_id() {
        let mock = MockTransport::new();
        let detail = client(&mock).detail("?bookId=undefined").await;
        assert_eq!(
            detail,
            ViewState::failed(MISSING_ID_MESSAGE, vec![Affordance::BackToSearch])
        );
        assert!(mock.called_endpoints().is_empty());
    }

    #[tokio::test]
    async fn test_episodes_prefer_first_non_empty_endpoint() {
        let mock = MockTransport::new()
            .json("chapters/9", json!({"data": []}))
            .json(
                "book/9/chapters",
                json!({"data": {"list": [{"episode": 2}, {"episode": 1}]}}),
            );
        let detail = SeriesDetail {
            requested_id: "9".to_string(),
            item: crate::normalize::item::map_item(&json!({"bookId": "9"})),
            embedded_chapters: vec![json!({"episode": 1})],
        };

        let episodes = client(&mock).episodes(&detail).await;
        let episodes = episodes.ready().unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].marker, 1);
        assert_eq!(
            mock.called_endpoints(),
            vec!["chapters/9", "episodes/9", "book/9/chapters"]
        );
    }

    #[tokio::test]
    async fn test_episodes_fall_back_to_embedded_list() {
        let mock = MockTransport::new();
        let detail = SeriesDetail {
            requested_id: "abc".to_string(),
            item: crate::normalize::item::map_item(&json!({"bookId": "9"})),
            embedded_chapters: vec![json!({"episode": 1}), json!({"episode": 2})],
        };

        let client = client(&mock);
        let episodes = client.episodes(&detail).await;
        assert_eq!(episodes.ready().unwrap().len(), 2);
        assert!(mock.called_endpoints().contains(&"episodes/9".to_string()));

        let detail = SeriesDetail {
            embedded_chapters: Vec::new(),
            ..detail
        };
        assert_eq!(client.episodes(&detail).await, ViewState::Empty);
    }

    #[test]
    fn test_episode_page_uses_configured_page_size() {
        let config = CatalogConfig {
            episodes_per_page: 2,
            ..CatalogConfig::default()
        };
        let client = CatalogClient::with_parts(
            config,
            Arc::new(MockTransport::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        );
        let chapters: Vec<Value> = (0..5).map(|i| json!({"chapterIndex": i})).collect();
        let episodes = build_episode_list(&chapters);

        let page = client.episode_page(&episodes, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(
            page.episodes
                .iter()
                .map(|e| e.display_number)
                .collect::<Vec<_>>(),
            vec![3, 4]
        );

        let last = client.episode_page(&episodes, 9);
        assert_eq!(last.page, 3);
        assert_eq!(last.episodes.len(), 1);
        assert!(!last.has_next());
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_home_feeds() {
        let client = CatalogClient::new(CatalogConfig::default()).expect("创建客户端失败");
        let home = client.home().await;
        println!("推荐: {:?}", home.for_you.ready().map(Vec::len));
        println!("最新: {:?}", home.new_releases.ready().map(Vec::len));
        println!("排行: {:?}", home.rank.ready().map(Vec::len));
        assert!(home.for_you.is_ready());
    }
}
